//! Configuration type definitions

use alloc::string::String;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

#[cfg(feature = "serde")]
fn default_true() -> bool {
    true
}

/// One user-defined special menu entry
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(deny_unknown_fields))]
pub struct MenuItemConfig {
    /// Display name; the lookup key is derived from it
    pub name: String,
    /// Script run when the entry is confirmed
    #[cfg_attr(feature = "serde", serde(default))]
    pub gcode: Option<String>,
    /// Keep the special menu open after running the script
    #[cfg_attr(feature = "serde", serde(default = "default_true"))]
    pub stay_on_page: bool,
    /// Return to the page the entry was chosen from
    #[cfg_attr(feature = "serde", serde(default = "default_true"))]
    pub show_last_page: bool,
}

impl MenuItemConfig {
    /// Entry with default page behaviour
    pub fn new(name: &str, gcode: Option<&str>) -> Self {
        Self {
            name: String::from(name),
            gcode: gcode.map(String::from),
            stay_on_page: true,
            show_last_page: true,
        }
    }
}

/// Preheat temperatures
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(deny_unknown_fields))]
pub struct PreheatPreset {
    /// Hotend target (°C)
    pub hotend: u16,
    /// Bed target (°C)
    pub bed: u16,
}

/// Machine-specific script parameters
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default, deny_unknown_fields))]
pub struct MachineConfig {
    /// Nozzle height (mm) below which heat-up lifts the nozzle first
    pub safe_z: f32,
    /// PLA preheat (A23)
    pub pla: PreheatPreset,
    /// ABS preheat (A24)
    pub abs: PreheatPreset,
    /// Script for the case light button (on)
    pub case_light_on: String,
    /// Script for the case light button (off)
    pub case_light_off: String,
}

impl Default for MachineConfig {
    fn default() -> Self {
        Self {
            safe_z: 10.0,
            pla: PreheatPreset {
                hotend: 200,
                bed: 55,
            },
            abs: PreheatPreset {
                hotend: 230,
                bed: 75,
            },
            case_light_on: String::from("LEDMAX"),
            case_light_off: String::from("LEDOFF"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_machine_defaults() {
        let config = MachineConfig::default();
        assert_eq!(config.safe_z, 10.0);
        assert_eq!(config.pla.hotend, 200);
        assert_eq!(config.abs.bed, 75);
        assert_eq!(config.case_light_on, "LEDMAX");
    }

    #[test]
    fn test_menu_item_defaults() {
        let item = MenuItemConfig::new("Level", Some("BED_MESH_CALIBRATE"));
        assert!(item.stay_on_page);
        assert!(item.show_last_page);
        assert_eq!(item.gcode.as_deref(), Some("BED_MESH_CALIBRATE"));
    }
}
