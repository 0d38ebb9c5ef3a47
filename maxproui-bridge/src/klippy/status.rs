//! Printer status cache

use std::sync::{Arc, Mutex, PoisonError};

use serde_json::Value;

use maxproui_core::traits::{MachineSnapshot, MachineStatus, Position, PrintState};

/// Printer objects polled on every status query, with the fields used
pub const STATUS_OBJECTS: &[(&str, &[&str])] = &[
    ("print_stats", &["state", "total_duration"]),
    ("extruder", &["temperature", "target"]),
    ("heater_bed", &["temperature", "target"]),
    ("fan", &["speed"]),
    ("display_status", &["progress"]),
    ("toolhead", &["position"]),
    ("gcode_move", &["speed_factor"]),
];

/// Last known printer status
#[derive(Debug, Clone)]
pub struct HostStatus {
    snapshot: MachineSnapshot,
    position: Position,
    speed_factor: f32,
    version: String,
}

impl Default for HostStatus {
    fn default() -> Self {
        Self {
            snapshot: MachineSnapshot::default(),
            position: Position::default(),
            speed_factor: 1.0,
            version: String::new(),
        }
    }
}

fn number(obj: &Value, key: &str) -> Option<f32> {
    obj.get(key).and_then(Value::as_f64).map(|v| v as f32)
}

impl HostStatus {
    pub fn set_version(&mut self, version: &str) {
        self.version = version.to_string();
    }

    /// Merge the `status` object of an `objects/query` reply
    pub fn apply(&mut self, status: &Value) {
        let snap = &mut self.snapshot;

        if let Some(stats) = status.get("print_stats") {
            if let Some(state) = stats.get("state").and_then(Value::as_str) {
                snap.print_state = PrintState::from_name(state);
            }
            if let Some(d) = number(stats, "total_duration") {
                snap.total_duration_s = Some(d);
            }
        }
        if let Some(extruder) = status.get("extruder") {
            snap.extruder_current = number(extruder, "temperature").unwrap_or(snap.extruder_current);
            snap.extruder_target = number(extruder, "target").unwrap_or(snap.extruder_target);
        }
        if let Some(bed) = status.get("heater_bed") {
            snap.bed_current = number(bed, "temperature").unwrap_or(snap.bed_current);
            snap.bed_target = number(bed, "target").unwrap_or(snap.bed_target);
        }
        if let Some(fan) = status.get("fan") {
            snap.fan_speed = number(fan, "speed").unwrap_or(snap.fan_speed);
        }
        if let Some(display) = status.get("display_status") {
            if let Some(p) = number(display, "progress") {
                snap.progress_percent = p * 100.0;
            }
        }
        if let Some(pos) = status
            .get("toolhead")
            .and_then(|t| t.get("position"))
            .and_then(Value::as_array)
        {
            let axis = |i: usize| pos.get(i).and_then(Value::as_f64).map(|v| v as f32);
            if let (Some(x), Some(y), Some(z), Some(e)) = (axis(0), axis(1), axis(2), axis(3)) {
                self.position = Position { x, y, z, e };
            }
        }
        if let Some(gcode_move) = status.get("gcode_move") {
            self.speed_factor = number(gcode_move, "speed_factor").unwrap_or(self.speed_factor);
        }
    }
}

impl MachineStatus for HostStatus {
    fn snapshot(&self) -> MachineSnapshot {
        self.snapshot.clone()
    }

    fn position(&self) -> Position {
        self.position
    }

    fn speed_factor(&self) -> f32 {
        self.speed_factor
    }

    fn software_version(&self) -> &str {
        &self.version
    }
}

/// Status shared between the Klipper worker and the session task
#[derive(Debug, Clone, Default)]
pub struct StatusCache(Arc<Mutex<HostStatus>>);

impl StatusCache {
    /// Copy of the latest status
    pub fn current(&self) -> HostStatus {
        self.0.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }

    pub fn update(&self, f: impl FnOnce(&mut HostStatus)) {
        let mut status = self.0.lock().unwrap_or_else(PoisonError::into_inner);
        f(&mut status);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_apply_query() {
        let mut status = HostStatus::default();
        status.apply(&json!({
            "print_stats": {"state": "printing", "total_duration": 125.5},
            "extruder": {"temperature": 210.3, "target": 210.0},
            "heater_bed": {"temperature": 59.9, "target": 60.0},
            "fan": {"speed": 0.5},
            "display_status": {"progress": 0.42},
            "toolhead": {"position": [10.0, 20.0, 0.2, 1234.5]},
            "gcode_move": {"speed_factor": 1.5}
        }));

        let snap = status.snapshot();
        assert_eq!(snap.print_state, PrintState::Printing);
        assert_eq!(snap.total_duration_s, Some(125.5));
        assert_eq!(snap.extruder_target, 210.0);
        assert_eq!(snap.bed_current, 59.9);
        assert_eq!(snap.fan_speed, 0.5);
        assert!((snap.progress_percent - 42.0).abs() < 1e-3);
        assert_eq!(status.position().z, 0.2);
        assert_eq!(status.speed_factor(), 1.5);
    }

    #[test]
    fn test_partial_update_keeps_other_fields() {
        let mut status = HostStatus::default();
        status.apply(&json!({"extruder": {"temperature": 25.0, "target": 0.0}}));
        status.apply(&json!({"fan": {"speed": 1.0}}));
        let snap = status.snapshot();
        assert_eq!(snap.extruder_current, 25.0);
        assert_eq!(snap.fan_speed, 1.0);
        assert_eq!(snap.print_state, PrintState::Standby);
        assert_eq!(status.speed_factor(), 1.0);
    }

    #[test]
    fn test_cache_is_shared() {
        let cache = StatusCache::default();
        let other = cache.clone();
        other.update(|s| s.set_version("v0.12.0"));
        assert_eq!(cache.current().software_version(), "v0.12.0");
    }
}
