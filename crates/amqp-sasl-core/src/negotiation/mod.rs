pub mod context;
pub mod driver;
pub mod state;


pub use context::*;
pub use driver::*;
pub use state::*;

use crate::{
    framing::FramingError,
    mechanism::RegistryError,
    protocol::{CodecError, SaslCode, Symbol},
};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum NegotiationError {
    #[error("codec error: {0}")]
    Codec(#[from] CodecError),

    #[error("framing error: {0}")]
    Framing(#[from] FramingError),

    #[error("mechanism registry error: {0}")]
    Registry(#[from] RegistryError),

    #[error("no compatible mechanism among {advertised:?}")]
    NoCompatibleMechanism { advertised: Vec<Symbol> },

    #[error("authentication rejected by broker: {code}")]
    Rejected { code: SaslCode, additional_data: Vec<u8> },

    #[error("negotiation already complete")]
    AlreadyComplete,
}
