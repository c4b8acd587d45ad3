/// Device arbiter state machine.
///
/// State transitions:
/// ```text
/// uninitialized → ready ⇄ recording
///                   ↓         ↓
///                 released ←──┘
///                   ↓
///                 ready (re-acquire)
/// ```
///
/// A failed acquisition leaves the arbiter in `Uninitialized`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArbiterState {
    Uninitialized,
    Ready,
    Recording,
    Released,
}

impl ArbiterState {
    pub fn is_recording(&self) -> bool {
        matches!(self, Self::Recording)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_recording_is_recording() {
        assert!(!ArbiterState::Uninitialized.is_recording());
        assert!(!ArbiterState::Released.is_recording());
        assert!(ArbiterState::Recording.is_recording());
        assert!(!ArbiterState::Ready.is_recording());
    }
}
