use tracing::{debug, info, warn};

use crate::{
    framing::FrameIo,
    mechanism::{MechanismHandler, MechanismRegistry, RegistryError, StepResult},
    negotiation::{recv, NegotiationError, NegotiationState, StepContext},
    protocol::{SaslMechanisms, SaslOutcome, Symbol},
};

/// Client side of the SASL exchange for one connection.
///
/// Lives only for the handshake. The first error is kept and returned
/// again on any later call; nothing is retried.
#[derive(Debug)]
pub struct Negotiator {
    registry: MechanismRegistry,
    state: NegotiationState,
    started: bool,
    error: Option<NegotiationError>,
    selected: Option<Symbol>,
    outcome: Option<SaslOutcome>,
}

impl Negotiator {
    pub fn new(registry: MechanismRegistry) -> Self {
        Self {
            registry,
            state: NegotiationState::AwaitAdvertisement,
            started: false,
            error: None,
            selected: None,
            outcome: None,
        }
    }

    /// Add a mechanism. Only allowed before [`Negotiator::run`].
    pub fn register_mechanism<H>(&mut self, handler: H) -> Result<(), NegotiationError>
    where
        H: MechanismHandler + 'static,
    {
        if self.started {
            return Err(RegistryError::RegistrationClosed.into());
        }
        Ok(self.registry.register(handler)?)
    }

    pub fn registry(&self) -> &MechanismRegistry {
        &self.registry
    }

    pub fn state(&self) -> NegotiationState {
        self.state
    }

    pub fn error(&self) -> Option<&NegotiationError> {
        self.error.as_ref()
    }

    pub fn selected_mechanism(&self) -> Option<&Symbol> {
        self.selected.as_ref()
    }

    pub fn outcome(&self) -> Option<&SaslOutcome> {
        self.outcome.as_ref()
    }

    /// Drive the exchange to a terminal state over `io`.
    pub async fn run(&mut self, io: &mut dyn FrameIo) -> Result<SaslOutcome, NegotiationError> {
        if let Some(err) = &self.error {
            return Err(err.clone());
        }
        if self.started {
            return Err(NegotiationError::AlreadyComplete);
        }
        self.started = true;

        match self.drive(io).await {
            Ok(outcome) => {
                self.transition(NegotiationState::Succeeded);
                info!(mechanism = ?self.selected.as_ref().map(Symbol::as_str), "sasl authentication succeeded");
                self.outcome = Some(outcome.clone());
                Ok(outcome)
            }
            Err(err) => {
                self.fail(err.clone());
                Err(err)
            }
        }
    }

    async fn drive(&mut self, io: &mut dyn FrameIo) -> Result<SaslOutcome, NegotiationError> {
        let advertisement: SaslMechanisms = recv(io).await?;
        self.transition(NegotiationState::SelectMechanism);

        let (name, handler) = match self.registry.select(&advertisement.mechanisms) {
            Some(found) => found,
            None => {
                warn!(
                    advertised = ?advertisement.mechanisms,
                    registered = ?self.registry.names(),
                    "no compatible sasl mechanism"
                );
                return Err(NegotiationError::NoCompatibleMechanism {
                    advertised: advertisement.mechanisms,
                });
            }
        };
        info!(mechanism = %name, "selected sasl mechanism");
        self.selected = Some(name.clone());
        self.transition(NegotiationState::RunHandler);

        {
            let mut ctx = StepContext::new(&mut *io, &name);
            let mut step = handler.begin();
            loop {
                match step.run(&mut ctx).await? {
                    StepResult::Continue(next) => step = next,
                    StepResult::Done => break,
                }
            }
        }
        self.transition(NegotiationState::AwaitOutcome);

        let outcome: SaslOutcome = recv(io).await?;
        if outcome.code.is_ok() {
            return Ok(outcome);
        }

        warn!(code = %outcome.code, transient = outcome.code.is_transient(), "sasl authentication rejected");
        Err(NegotiationError::Rejected {
            code: outcome.code,
            additional_data: outcome.additional_data,
        })
    }

    fn transition(&mut self, next: NegotiationState) {
        debug!(from = ?self.state, to = ?next, "sasl state transition");
        self.state = next;
    }

    fn fail(&mut self, err: NegotiationError) {
        debug!(error = %err, "sasl negotiation failed");
        if self.error.is_none() {
            self.error = Some(err);
        }
        self.transition(NegotiationState::Failed);
    }
}
