//! Per-connection state

use alloc::string::String;

use maxproui_protocol::FieldValue;

use crate::notifier::StateNotifier;

/// Menu navigation state, driven by A13 (select), A26 (refresh) and A8
/// (list)
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SelectionContext {
    /// Paging through the special menu instead of storage
    pub special_menu_active: bool,
    /// Last `<...>` selection, kept until the next A13
    pub last_user_selection: Option<FieldValue>,
    /// Storage path chosen for A14 / A15
    pub selected_file: Option<String>,
    /// Set by a confirmed entry that wants the special menu kept open
    pub request_stay_on_page: bool,
    /// One-shot: re-show `last_shown_page_index` on the next list request
    pub show_last_page: bool,
    /// Start index of the last special menu page shown
    pub last_shown_page_index: usize,
    /// A26 arrived; the next list request runs the selected entry first
    pub pending_execute: bool,
}

impl SelectionContext {
    /// Drop special menu paging state on entering or leaving it
    pub(crate) fn reset_navigation(&mut self, special_menu_active: bool) {
        self.special_menu_active = special_menu_active;
        self.request_stay_on_page = false;
        self.show_last_page = false;
        self.last_shown_page_index = 0;
        self.last_user_selection = None;
    }
}

/// One-shot timer flag
///
/// Fires at most once per arming. Cancelling is idempotent and also
/// harmless after it fired.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct OneShot {
    armed: bool,
}

impl OneShot {
    pub fn arm(&mut self) {
        self.armed = true;
    }

    pub fn is_armed(&self) -> bool {
        self.armed
    }

    /// Consume the arming; `true` if the timer should act now
    pub fn fire(&mut self) -> bool {
        core::mem::replace(&mut self.armed, false)
    }

    /// Disarm; `true` if it was still armed
    pub fn cancel(&mut self) -> bool {
        core::mem::replace(&mut self.armed, false)
    }
}

/// State created when the link becomes ready and dropped when it goes
/// away
#[derive(Debug, Clone, Default)]
pub struct SessionContext {
    pub selection: SelectionContext,
    pub notifier: StateNotifier,
    /// Delayed "board reset, ready" greeting
    pub greeting: OneShot,
    /// Choice made in the continue dialog (A41 `O` / `C`)
    pub power_off: Option<bool>,
}

impl SessionContext {
    /// Fresh context with the greeting armed
    pub fn new() -> Self {
        let mut ctx = Self::default();
        ctx.greeting.arm();
        ctx
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_one_shot_fires_once() {
        let mut timer = OneShot::default();
        assert!(!timer.fire());
        timer.arm();
        assert!(timer.fire());
        assert!(!timer.fire());
    }

    #[test]
    fn test_cancel_is_idempotent() {
        let mut timer = OneShot::default();
        timer.arm();
        assert!(timer.cancel());
        assert!(!timer.cancel());
        assert!(!timer.fire());

        timer.arm();
        assert!(timer.fire());
        assert!(!timer.cancel());
    }

    #[test]
    fn test_new_context_arms_greeting() {
        let ctx = SessionContext::new();
        assert!(ctx.greeting.is_armed());
        assert_eq!(ctx.selection, SelectionContext::default());
        assert_eq!(ctx.power_off, None);
    }

    #[test]
    fn test_reset_navigation() {
        let mut selection = SelectionContext {
            request_stay_on_page: true,
            show_last_page: true,
            last_shown_page_index: 8,
            ..Default::default()
        };
        selection.reset_navigation(true);
        assert!(selection.special_menu_active);
        assert!(!selection.show_last_page);
        assert_eq!(selection.last_shown_page_index, 0);
    }
}
