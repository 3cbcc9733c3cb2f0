mod conn;
mod error;

pub use conn::{connect_tcp, negotiate, AuthenticatedConn, SASL_PROTOCOL_HEADER};
pub use error::NetError;
