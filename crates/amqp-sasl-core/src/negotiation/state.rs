#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NegotiationState {
    AwaitAdvertisement,
    SelectMechanism,
    RunHandler,
    AwaitOutcome,
    Succeeded,
    Failed,
}

impl NegotiationState {
    pub fn is_terminal(self) -> bool {
        matches!(self, NegotiationState::Succeeded | NegotiationState::Failed)
    }
}
