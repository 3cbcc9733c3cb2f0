use thiserror::Error;

use crate::{
    framing::FramingError,
    mechanism::RegistryError,
    negotiation::NegotiationError,
    protocol::CodecError,
};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SaslError {
    #[error("codec error: {0}")]
    Codec(#[from] CodecError),

    #[error("framing error: {0}")]
    Framing(#[from] FramingError),

    #[error("registry error: {0}")]
    Registry(#[from] RegistryError),

    #[error("negotiation error: {0}")]
    Negotiation(#[from] NegotiationError),
}

impl SaslError {
    /// Whether reconnecting could succeed without new credentials or config.
    pub fn is_transient(&self) -> bool {
        match self {
            SaslError::Framing(e) => e.is_transient(),
            SaslError::Negotiation(NegotiationError::Framing(e)) => e.is_transient(),
            SaslError::Negotiation(NegotiationError::Rejected { code, .. }) => code.is_transient(),
            _ => false,
        }
    }
}
