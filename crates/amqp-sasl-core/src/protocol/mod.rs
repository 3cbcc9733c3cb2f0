pub mod composite;
pub mod primitive;
pub mod types;


pub use composite::*;
pub use types::*;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CodecError {
    #[error("cannot encode value: {0}")]
    Encode(String),

    #[error("unexpected composite type: expected {expected:#04x}, got {actual}")]
    UnexpectedType { expected: u64, actual: Descriptor },

    #[error("message truncated")]
    Truncated,

    #[error("malformed encoding: {0}")]
    Malformed(String),
}
