//! Screen codes (`J<nn>`) understood by the panel

/// Unsolicited screen switch / dialog instructions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ScreenCode {
    /// J04: printing from storage
    PrintStarted,
    /// J05: command sent, waiting for the machine (must be followed by
    /// J14, J16 or J18)
    PauseRequested,
    /// J11: print stopped after an emergency stop
    PrintStopped,
    /// J12: machine ready
    Ready,
    /// J14: print finished, cancelled or failed
    PrintFinished,
    /// J17: main board reset
    MainboardReset,
    /// J18: paused, show continue / resume dialog
    PausedAwaitingInput,
    /// J20: open succeeded, print and resume buttons enabled
    OpenSucceeded,
    /// J21: open failed, print and resume buttons disabled
    OpenFailed,
    /// J33: firmware version report
    Version,
    /// J34: continue acknowledged
    ResumeConfirmed,
    /// J35: continue acknowledged, power off requested
    PowerOffConfirmed,
}

// Wire numbers
const J_PRINT_STARTED: u8 = 4;
const J_PAUSE_REQUESTED: u8 = 5;
const J_PRINT_STOPPED: u8 = 11;
const J_READY: u8 = 12;
const J_PRINT_FINISHED: u8 = 14;
const J_MAINBOARD_RESET: u8 = 17;
const J_PAUSED_AWAITING_INPUT: u8 = 18;
const J_OPEN_SUCCEEDED: u8 = 20;
const J_OPEN_FAILED: u8 = 21;
const J_VERSION: u8 = 33;
const J_RESUME_CONFIRMED: u8 = 34;
const J_POWER_OFF_CONFIRMED: u8 = 35;

/// The panel drops J18 if it arrives too soon after J05
const PAUSED_DIALOG_GAP_MS: u32 = 250;

impl ScreenCode {
    /// Wire number (`nn` in `J<nn>`)
    pub fn number(self) -> u8 {
        match self {
            ScreenCode::PrintStarted => J_PRINT_STARTED,
            ScreenCode::PauseRequested => J_PAUSE_REQUESTED,
            ScreenCode::PrintStopped => J_PRINT_STOPPED,
            ScreenCode::Ready => J_READY,
            ScreenCode::PrintFinished => J_PRINT_FINISHED,
            ScreenCode::MainboardReset => J_MAINBOARD_RESET,
            ScreenCode::PausedAwaitingInput => J_PAUSED_AWAITING_INPUT,
            ScreenCode::OpenSucceeded => J_OPEN_SUCCEEDED,
            ScreenCode::OpenFailed => J_OPEN_FAILED,
            ScreenCode::Version => J_VERSION,
            ScreenCode::ResumeConfirmed => J_RESUME_CONFIRMED,
            ScreenCode::PowerOffConfirmed => J_POWER_OFF_CONFIRMED,
        }
    }

    /// Minimum quiet time before this code may be sent, if longer than the
    /// link's default pacing
    pub fn min_gap_ms(self) -> Option<u32> {
        match self {
            ScreenCode::PausedAwaitingInput => Some(PAUSED_DIALOG_GAP_MS),
            _ => None,
        }
    }
}
