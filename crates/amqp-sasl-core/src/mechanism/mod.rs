pub mod plain;
pub mod registry;
pub mod traits;


pub use plain::*;
pub use registry::*;
pub use traits::*;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RegistryError {
    #[error("mechanism name is not a valid symbol: {0:?}")]
    InvalidName(String),

    #[error("mechanisms cannot be registered once negotiation has started")]
    RegistrationClosed,
}
