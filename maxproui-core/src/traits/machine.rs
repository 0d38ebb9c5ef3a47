//! Printer status

use heapless::String;

/// Longest host print state name kept verbatim
pub const MAX_STATE_NAME_LEN: usize = 16;

/// Print job state as reported by the host
#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PrintState {
    #[default]
    Standby,
    Printing,
    Paused,
    Cancelled,
    Complete,
    Error,
    /// Any state this crate has no screen for
    Other(String<MAX_STATE_NAME_LEN>),
}

impl PrintState {
    /// Map a host state name
    pub fn from_name(name: &str) -> Self {
        match name {
            "standby" => PrintState::Standby,
            "printing" => PrintState::Printing,
            "paused" => PrintState::Paused,
            "cancelled" => PrintState::Cancelled,
            "complete" => PrintState::Complete,
            "error" => PrintState::Error,
            other => {
                let mut s = String::new();
                for c in other.chars() {
                    if s.push(c).is_err() {
                        break;
                    }
                }
                PrintState::Other(s)
            }
        }
    }

    /// Host state name
    pub fn name(&self) -> &str {
        match self {
            PrintState::Standby => "standby",
            PrintState::Printing => "printing",
            PrintState::Paused => "paused",
            PrintState::Cancelled => "cancelled",
            PrintState::Complete => "complete",
            PrintState::Error => "error",
            PrintState::Other(name) => name.as_str(),
        }
    }
}

/// Toolhead position in mm
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Position {
    pub x: f32,
    pub y: f32,
    pub z: f32,
    pub e: f32,
}

/// Point-in-time sensor readings
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct MachineSnapshot {
    /// Hotend temperature (°C)
    pub extruder_current: f32,
    /// Hotend target (°C)
    pub extruder_target: f32,
    /// Bed temperature (°C)
    pub bed_current: f32,
    /// Bed target (°C)
    pub bed_target: f32,
    /// Part fan speed, 0.0 to 1.0
    pub fan_speed: f32,
    /// Print progress, 0 to 100
    pub progress_percent: f32,
    /// Elapsed job time; `None` when no job has run
    pub total_duration_s: Option<f32>,
    pub print_state: PrintState,
}

/// Read access to the printer
pub trait MachineStatus {
    /// Latest sensor readings
    fn snapshot(&self) -> MachineSnapshot;

    /// Current toolhead position
    fn position(&self) -> Position;

    /// Feed rate override as a ratio (1.0 is 100 %)
    fn speed_factor(&self) -> f32;

    /// Host software version string
    fn software_version(&self) -> &str;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_state_names() {
        for name in ["standby", "printing", "paused", "cancelled", "complete", "error"] {
            assert_eq!(PrintState::from_name(name).name(), name);
        }
        assert_eq!(PrintState::from_name("paused"), PrintState::Paused);
    }

    #[test]
    fn test_unknown_state_kept() {
        let state = PrintState::from_name("startup");
        assert!(matches!(state, PrintState::Other(_)));
        assert_eq!(state.name(), "startup");
    }

    #[test]
    fn test_long_unknown_state_is_clipped() {
        let state = PrintState::from_name("a_very_long_state_name_indeed");
        assert_eq!(state.name().len(), MAX_STATE_NAME_LEN);
    }
}
