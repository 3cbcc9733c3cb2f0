/*
    amqp-sasl-core
        client side of the AMQP 1.0 SASL layer: performative codec,
        frame emission, pluggable mechanisms and the negotiation driver.
 */

pub mod error;

pub mod framing;
pub mod mechanism;
pub mod negotiation;
pub mod protocol;

pub use error::SaslError;
pub use mechanism::{MechanismHandler, MechanismRegistry, PlainMechanism};
pub use negotiation::{NegotiationError, NegotiationState, Negotiator};
