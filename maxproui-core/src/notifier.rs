//! Print-state change notifier
//!
//! Polled once per tick. When the host's print state differs from the last
//! one seen, the matching screen codes are returned so the panel switches
//! screens. Unchanged states produce nothing.

use maxproui_protocol::ScreenCode;

use crate::traits::{MachineSnapshot, PrintState};

/// Screen codes sent on entering `state`
///
/// Paused sends J05 and then J18; J18 carries its own minimum gap so the
/// panel has time to process J05.
pub fn transition_codes(state: &PrintState) -> &'static [ScreenCode] {
    match state {
        PrintState::Standby => &[ScreenCode::Ready],
        PrintState::Printing => &[ScreenCode::PrintStarted],
        PrintState::Paused => &[ScreenCode::PauseRequested, ScreenCode::PausedAwaitingInput],
        PrintState::Cancelled | PrintState::Complete | PrintState::Error => {
            &[ScreenCode::PrintFinished]
        }
        PrintState::Other(_) => &[],
    }
}

/// Tracks the last print state seen
#[derive(Debug, Clone, Default)]
pub struct StateNotifier {
    previous: PrintState,
}

impl StateNotifier {
    /// Start from standby, so an idle machine sends nothing on the first
    /// tick
    pub fn new() -> Self {
        Self::default()
    }

    pub fn previous(&self) -> &PrintState {
        &self.previous
    }

    /// Compare with the previous state and record the new one
    ///
    /// Returns the codes to send, or `None` if the state did not change or
    /// has no screen.
    pub fn tick(&mut self, snapshot: &MachineSnapshot) -> Option<&'static [ScreenCode]> {
        let state = &snapshot.print_state;
        if *state == self.previous {
            return None;
        }
        self.previous = state.clone();
        let codes = transition_codes(state);
        if codes.is_empty() {
            None
        } else {
            Some(codes)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snapshot(state: PrintState) -> MachineSnapshot {
        MachineSnapshot {
            print_state: state,
            ..Default::default()
        }
    }

    #[test]
    fn test_initial_standby_is_silent() {
        let mut notifier = StateNotifier::new();
        assert_eq!(notifier.tick(&snapshot(PrintState::Standby)), None);
    }

    #[test]
    fn test_printing_then_paused() {
        let mut notifier = StateNotifier::new();
        assert_eq!(
            notifier.tick(&snapshot(PrintState::Printing)),
            Some(&[ScreenCode::PrintStarted][..])
        );
        assert_eq!(notifier.tick(&snapshot(PrintState::Printing)), None);
        assert_eq!(
            notifier.tick(&snapshot(PrintState::Paused)),
            Some(&[ScreenCode::PauseRequested, ScreenCode::PausedAwaitingInput][..])
        );
    }

    #[test]
    fn test_end_states_share_a_screen() {
        for state in [PrintState::Cancelled, PrintState::Complete, PrintState::Error] {
            let mut notifier = StateNotifier::new();
            assert_eq!(
                notifier.tick(&snapshot(state)),
                Some(&[ScreenCode::PrintFinished][..])
            );
        }
    }

    #[test]
    fn test_unknown_state_is_recorded_silently() {
        let mut notifier = StateNotifier::new();
        assert_eq!(notifier.tick(&snapshot(PrintState::from_name("startup"))), None);
        assert_eq!(notifier.previous().name(), "startup");
        // Back to standby is a change
        assert_eq!(
            notifier.tick(&snapshot(PrintState::Standby)),
            Some(&[ScreenCode::Ready][..])
        );
    }
}
