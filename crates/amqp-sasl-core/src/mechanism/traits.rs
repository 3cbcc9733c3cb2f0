use std::fmt;

use async_trait::async_trait;

use crate::negotiation::{NegotiationError, StepContext};
use crate::protocol::Symbol;

/// What a mechanism step hands back to the driver.
pub enum StepResult {
    /// Run this step next.
    Continue(Box<dyn Step>),
    /// The mechanism has nothing more to send; wait for the outcome.
    Done,
}

impl fmt::Debug for StepResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StepResult::Continue(_) => f.write_str("Continue(..)"),
            StepResult::Done => f.write_str("Done"),
        }
    }
}

// One unit of a mechanism's exchange. A step may send an init or response
// frame, read a challenge, and decides whether another step follows.
#[async_trait]
pub trait Step: Send {
    async fn run(self: Box<Self>, ctx: &mut StepContext<'_>) -> Result<StepResult, NegotiationError>;
}

// A named authentication mechanism. The driver knows nothing about how many
// round-trips it needs; it keeps running steps until one returns Done.
pub trait MechanismHandler: Send + Sync {
    fn name(&self) -> Symbol;

    /// First step of a fresh exchange.
    fn begin(&self) -> Box<dyn Step>;
}
