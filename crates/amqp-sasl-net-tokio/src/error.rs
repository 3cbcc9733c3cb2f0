use thiserror::Error;

use amqp_sasl_core::{negotiation::NegotiationError, SaslError};

#[derive(Debug, Error)]
pub enum NetError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("sasl error: {0}")]
    Sasl(#[from] SaslError),

    #[error("peer answered with protocol header {got:02x?}")]
    ProtocolHeaderMismatch { got: [u8; 8] },
}

impl From<NegotiationError> for NetError {
    fn from(e: NegotiationError) -> Self {
        NetError::Sasl(e.into())
    }
}

impl NetError {
    pub fn is_transient(&self) -> bool {
        match self {
            NetError::Io(_) => true,
            NetError::Sasl(e) => e.is_transient(),
            NetError::ProtocolHeaderMismatch { .. } => false,
        }
    }
}
