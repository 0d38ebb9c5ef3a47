//! Link state definition

/// Events that can trigger link transitions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum LinkEvent {
    /// Transport to the host opened
    Open,
    /// Host reported ready
    Ready,
    /// Host shut down or the transport dropped
    Lost,
}

/// Link states
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum LinkState {
    /// No transport; everything is dropped
    #[default]
    Disconnected,
    /// Transport open, waiting for the host to become ready
    Connecting,
    /// Frames are processed and replies sent
    Connected,
}

impl LinkState {
    /// Whether inbound frames and outbound replies are allowed
    pub fn is_connected(&self) -> bool {
        matches!(self, LinkState::Connected)
    }

    /// Process an event and return the next state
    pub fn transition(self, event: LinkEvent) -> Self {
        use LinkEvent::*;
        use LinkState::*;

        match (self, event) {
            (Disconnected, Open) => Connecting,
            (Connecting, Ready) => Connected,
            (Connecting, Lost) => Disconnected,
            (Connected, Lost) => Disconnected,

            // Default: stay in current state
            _ => self,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_connect_flow() {
        let state = LinkState::Disconnected;
        let connecting = state.transition(LinkEvent::Open);
        assert_eq!(connecting, LinkState::Connecting);
        let connected = connecting.transition(LinkEvent::Ready);
        assert_eq!(connected, LinkState::Connected);
        assert!(connected.is_connected());
    }

    #[test]
    fn test_lost_from_any_live_state() {
        for state in [LinkState::Connecting, LinkState::Connected] {
            assert_eq!(state.transition(LinkEvent::Lost), LinkState::Disconnected);
        }
    }

    #[test]
    fn test_ready_requires_transport() {
        let state = LinkState::Disconnected.transition(LinkEvent::Ready);
        assert_eq!(state, LinkState::Disconnected);
        assert!(!state.is_connected());
    }

    #[test]
    fn test_repeated_events_are_ignored() {
        let state = LinkState::Connected;
        assert_eq!(state.transition(LinkEvent::Open), LinkState::Connected);
        assert_eq!(state.transition(LinkEvent::Ready), LinkState::Connected);
        assert_eq!(
            LinkState::Disconnected.transition(LinkEvent::Lost),
            LinkState::Disconnected
        );
    }
}
