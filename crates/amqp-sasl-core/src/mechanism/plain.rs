use std::fmt;

use async_trait::async_trait;
use zeroize::{Zeroize, ZeroizeOnDrop, Zeroizing};

use crate::mechanism::{MechanismHandler, Step, StepResult};
use crate::negotiation::{NegotiationError, StepContext};
use crate::protocol::{SaslFrameBody, SaslInit, Symbol, MECHANISM_PLAIN};

/// PLAIN: the credentials travel in the initial response, so there is a
/// single step and no challenge.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct PlainMechanism {
    username: String,
    password: String,
}

impl PlainMechanism {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }

    /// `NUL authcid NUL passwd`, with an empty authorization identity.
    pub fn initial_response(&self) -> Zeroizing<Vec<u8>> {
        let mut out = Vec::with_capacity(2 + self.username.len() + self.password.len());
        out.push(0);
        out.extend_from_slice(self.username.as_bytes());
        out.push(0);
        out.extend_from_slice(self.password.as_bytes());
        Zeroizing::new(out)
    }
}

impl fmt::Debug for PlainMechanism {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PlainMechanism").finish_non_exhaustive()
    }
}

impl MechanismHandler for PlainMechanism {
    fn name(&self) -> Symbol {
        Symbol::from(MECHANISM_PLAIN)
    }

    fn begin(&self) -> Box<dyn Step> {
        Box::new(PlainInit {
            initial_response: self.initial_response(),
        })
    }
}

struct PlainInit {
    initial_response: Zeroizing<Vec<u8>>,
}

#[async_trait]
impl Step for PlainInit {
    async fn run(self: Box<Self>, ctx: &mut StepContext<'_>) -> Result<StepResult, NegotiationError> {
        let mut body = SaslFrameBody::Init(SaslInit {
            mechanism: ctx.mechanism().clone(),
            initial_response: self.initial_response.to_vec(),
            hostname: String::new(),
        });

        let sent = ctx.send(&body).await;
        if let SaslFrameBody::Init(init) = &mut body {
            init.initial_response.zeroize();
        }
        sent?;

        Ok(StepResult::Done)
    }
}
