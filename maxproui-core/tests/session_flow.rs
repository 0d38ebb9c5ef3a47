//! End-to-end panel conversations against in-memory collaborators

use std::cell::Cell;

use maxproui_core::config::{MachineConfig, MenuItemConfig};
use maxproui_core::traits::{
    FileEntry, MachineSnapshot, MachineStatus, Position, PrintState, ScriptError, ScriptRunner,
};
use maxproui_core::{LinkEvent, MenuCatalog, Session};
use maxproui_protocol::{Reply, ScreenCode};

struct FakeMachine {
    snapshot: MachineSnapshot,
    position: Position,
    speed_factor: f32,
    version: String,
    polls: Cell<usize>,
}

impl Default for FakeMachine {
    fn default() -> Self {
        Self {
            snapshot: MachineSnapshot::default(),
            position: Position {
                z: 50.0,
                ..Default::default()
            },
            speed_factor: 1.0,
            version: String::from("v0.12.0-123"),
            polls: Cell::new(0),
        }
    }
}

impl MachineStatus for FakeMachine {
    fn snapshot(&self) -> MachineSnapshot {
        self.polls.set(self.polls.get() + 1);
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

#[derive(Default)]
struct Recorder {
    scripts: Vec<String>,
    reject: Vec<&'static str>,
}

impl ScriptRunner for Recorder {
    fn run(&mut self, script: &str) -> Result<(), ScriptError> {
        self.scripts.push(script.to_string());
        if self.reject.iter().any(|r| *r == script) {
            Err(ScriptError::Rejected(format!("Unknown command: {}", script)))
        } else {
            Ok(())
        }
    }
}

struct Harness {
    session: Session,
    machine: FakeMachine,
    files: Vec<FileEntry>,
    runner: Recorder,
}

impl Harness {
    fn new(menu: &[(&str, Option<&str>)]) -> Self {
        let items: Vec<MenuItemConfig> = menu
            .iter()
            .map(|(name, gcode)| MenuItemConfig::new(name, *gcode))
            .collect();
        let catalog = MenuCatalog::build(&items).unwrap();
        let mut session = Session::new(catalog, MachineConfig::default());
        session.on_link_event(LinkEvent::Open);
        session.on_link_event(LinkEvent::Ready);
        Self {
            session,
            machine: FakeMachine::default(),
            files: Vec::new(),
            runner: Recorder::default(),
        }
    }

    fn with_files(mut self, names: &[&str]) -> Self {
        self.files = names
            .iter()
            .map(|n| FileEntry {
                path: n.to_string(),
                size: 4096,
            })
            .collect();
        self
    }

    /// Send one request and return the encoded reply lines
    fn send(&mut self, raw: &str) -> Vec<String> {
        let mut out = Vec::new();
        self.session
            .handle_frame(raw, &self.machine, self.files.as_slice(), &mut out)
            .unwrap();
        out.iter().map(|r| r.encode().to_string()).collect()
    }

    fn drain(&mut self) -> Vec<String> {
        while self.session.drain_step(&mut self.runner).is_some() {}
        std::mem::take(&mut self.runner.scripts)
    }
}

#[test]
fn test_temperature_query() {
    let mut h = Harness::new(&[]);
    h.machine.snapshot.extruder_current = 205.7;
    h.machine.snapshot.bed_target = 60.0;
    assert_eq!(h.send("A0"), ["A0V 205\r\n"]);
    assert_eq!(h.send("A3"), ["A3V 60\r\n"]);
}

#[test]
fn test_fan_and_speed_are_percentages() {
    let mut h = Harness::new(&[]);
    h.machine.snapshot.fan_speed = 0.5;
    h.machine.speed_factor = 1.25;
    assert_eq!(h.send("A4"), ["A4V 50\r\n"]);
    assert_eq!(h.send("A20"), ["A20V 125\r\n"]);
}

#[test]
fn test_position_and_progress() {
    let mut h = Harness::new(&[]);
    h.machine.position = Position {
        x: 10.0,
        y: 20.3,
        z: 0.3,
        e: 0.0,
    };
    h.machine.snapshot.progress_percent = 42.9;
    assert_eq!(h.send("A5"), ["A5V X: 10.0 Y: 20.3 Z: 0.3 \r\n"]);
    assert_eq!(h.send("A6"), ["A6V 42\r\n"]);
}

#[test]
fn test_print_time() {
    let mut h = Harness::new(&[]);
    assert_eq!(h.send("A7"), ["A7V 999:999\r\n"]);
    h.machine.snapshot.total_duration_s = Some(3.0 * 3600.0 + 7.0 * 60.0 + 12.0);
    assert_eq!(h.send("A7"), ["A7V 03 H 07 M\r\n"]);
}

#[test]
fn test_fan_speed_script() {
    let mut h = Harness::new(&[]);
    assert_eq!(h.send("A18 S50"), ["\r\n"]);
    h.send("A18");
    assert_eq!(h.drain(), ["M106 S127", "M106 S255"]);
}

#[test]
fn test_first_page_has_special_row() {
    let mut h = Harness::new(&[]).with_files(&["a.gcode", "b.gcode"]);
    assert_eq!(
        h.send("A8 S0"),
        [
            "FN \r\n",
            "<special_menu>\r\n",
            "Special Menu\r\n",
            "a.gcode\r\n",
            "a.gcode\r\n",
            "b.gcode\r\n",
            "b.gcode\r\n",
            "END\r\n",
        ]
    );
}

#[test]
fn test_special_menu_navigation() {
    let mut h = Harness::new(&[("menu1", Some("G28")), ("exit", None)]);
    assert_eq!(h.send("A13 <special_menu>"), ["J21\r\n"]);
    assert!(h.session.selection().unwrap().special_menu_active);

    let page = h.send("A8 S0");
    assert_eq!(page[1], "<menu1>\r\n");
    assert_eq!(page[3], "<exit>\r\n");

    assert_eq!(h.send("A13 <exit>"), ["J21\r\n"]);
    let selection = h.session.selection().unwrap();
    assert!(!selection.special_menu_active);
    assert!(selection.last_user_selection.is_none());
}

#[test]
fn test_long_menu_name_runs_from_its_row_label() {
    let mut h = Harness::new(&[("Calibrate Bed Mesh Quickly", Some("BED_MESH_CALIBRATE"))]);
    h.send("A13 <special_menu>");

    let page = h.send("A8 S0");
    let label = page[1].trim_end().to_string();
    assert_eq!(label, "<calibrate bed mesh quickl");

    // The panel echoes the row label it was given
    assert_eq!(h.send(&format!("A13 {}", label)), ["J21\r\n"]);
    h.send("A26");
    h.send("A8 S0");
    assert_eq!(h.drain(), ["BED_MESH_CALIBRATE"]);
}

#[test]
fn test_refresh_runs_selected_entry_and_stays_on_page() {
    let names: Vec<String> = (0..6).map(|i| format!("menu{}", i)).collect();
    let mut menu: Vec<(&str, Option<&str>)> = names.iter().map(|n| (n.as_str(), None)).collect();
    menu[5].1 = Some("BED_MESH_CALIBRATE");
    let mut h = Harness::new(&menu);

    h.send("A13 <special_menu>");
    h.send("A8 S4");
    assert_eq!(h.send("A13<menu5>"), ["J21\r\n"]);
    assert_eq!(h.send("A26"), ["\r\n"]);
    assert!(h.session.selection().unwrap().pending_execute);

    // The panel always follows A26 with a list request from 0
    let page = h.send("A8S0");
    assert_eq!(page[1], "<menu4>\r\n");
    assert!(!h.session.selection().unwrap().pending_execute);
    assert_eq!(h.drain(), ["BED_MESH_CALIBRATE"]);

    // Only once
    h.send("A8S0");
    assert!(h.drain().is_empty());
}

#[test]
fn test_refresh_without_selection_does_nothing() {
    let mut h = Harness::new(&[("menu1", Some("G28"))]);
    h.send("A26");
    h.send("A8 S0");
    assert!(h.drain().is_empty());
}

#[test]
fn test_file_selection_and_print() {
    let mut h = Harness::new(&[]).with_files(&["Benchy_0.2mm_PLA_4MaxPro_1h23m.gcode"]);
    assert_eq!(h.send("A13 benchy_0.2mm_pla_4maxpro_1"), ["J20\r\n"]);
    assert_eq!(h.send("A14"), ["\r\n"]);
    assert_eq!(
        h.drain(),
        ["SDCARD_PRINT_FILE FILENAME=Benchy_0.2mm_PLA_4MaxPro_1h23m.gcode"]
    );
}

#[test]
fn test_print_without_selection_only_acks() {
    let mut h = Harness::new(&[]);
    assert_eq!(h.send("A14"), ["\r\n"]);
    assert_eq!(h.send("A15"), ["\r\n"]);
    assert!(h.drain().is_empty());
}

#[test]
fn test_guarded_heat_lifts_low_nozzle() {
    let mut h = Harness::new(&[]);
    h.machine.position.z = 2.0;
    h.send("A16 C210");
    h.machine.position.z = 20.0;
    h.send("A16 C215");
    h.send("A16 S200");
    assert_eq!(h.drain(), ["G1 Z10\nM104 S210", "M104 S215", "M104 S200"]);
}

#[test]
fn test_preheat_and_cooldown() {
    let mut h = Harness::new(&[]);
    h.machine.position.z = 1.0;
    h.send("A23");
    h.machine.position.z = 30.0;
    h.send("A24");
    h.send("A25");
    assert_eq!(
        h.drain(),
        [
            "G1 Z10",
            "M104 S200\nM140 S55",
            "M104 S230\nM140 S75",
            "M104 S0\nM140 S0\nG1 Z10",
        ]
    );
}

#[test]
fn test_motion_scripts() {
    let mut h = Harness::new(&[]);
    h.send("A21 Y");
    h.send("A21");
    h.send("A22 X-10 Z1 F3000");
    h.send("A19");
    assert_eq!(
        h.drain(),
        [
            "G28 Y",
            "G28",
            "G91\nG1 X-10 F3000\nG90",
            "G91\nG1 Z1 F3000\nG90",
            "M18\nM84",
        ]
    );
}

#[test]
fn test_job_control() {
    let mut h = Harness::new(&[]);
    assert_eq!(h.send("A9"), ["\r\n"]);
    assert_eq!(h.send("A10"), ["\r\n"]);
    assert_eq!(h.send("A11"), ["\r\n"]);
    assert_eq!(h.send("A12"), ["J11\r\n"]);
    assert_eq!(h.send("A40"), ["\r\n"]);
    assert_eq!(
        h.drain(),
        ["PAUSE", "RESUME", "CANCEL_PRINT", "M112", "FIRMWARE_RESTART"]
    );
}

#[test]
fn test_case_light_and_speed_override() {
    let mut h = Harness::new(&[]);
    h.send("A42 O");
    h.send("A42 T");
    assert_eq!(h.send("A20 S150"), ["\r\n"]);
    assert_eq!(h.drain(), ["LEDMAX", "LEDOFF", "M220 S150"]);
}

#[test]
fn test_version_and_acknowledged_features() {
    let mut h = Harness::new(&[]);
    assert_eq!(h.send("A33"), ["J33 v0.12.0-123\r\n"]);
    for n in 27..=32 {
        assert_eq!(h.send(&format!("A{}", n)), ["\r\n"]);
    }
}

#[test]
fn test_continue_dialog_power_off_choice() {
    let mut h = Harness::new(&[]);
    assert!(h.send("A41 S").is_empty());
    assert!(h.send("A41 O").is_empty());
    assert_eq!(h.send("A41 S"), ["J35 \r\n"]);
    h.send("A41 C");
    assert_eq!(h.send("A41 S"), ["J34 \r\n"]);
}

#[test]
fn test_undefined_and_empty_requests_are_ignored() {
    let mut h = Harness::new(&[]);
    assert!(h.send("").is_empty());
    assert!(h.send("A35").is_empty());
    assert!(h.send("A99").is_empty());
    assert!(h.send("hello").is_empty());
}

#[test]
fn test_failed_script_does_not_block_queue() {
    let mut h = Harness::new(&[]);
    h.runner.reject.push("PAUSE");
    h.send("A9");
    h.send("A10");
    assert_eq!(h.drain(), ["PAUSE", "RESUME"]);
    assert!(!h.session.drain_pending());
}

#[test]
fn test_state_changes_switch_screens() {
    let mut h = Harness::new(&[]);
    let mut out = Vec::new();

    h.session.tick(&h.machine, &mut out);
    assert!(out.is_empty());

    h.machine.snapshot.print_state = PrintState::Printing;
    h.session.tick(&h.machine, &mut out);
    h.session.tick(&h.machine, &mut out);
    h.machine.snapshot.print_state = PrintState::Paused;
    h.session.tick(&h.machine, &mut out);
    h.machine.snapshot.print_state = PrintState::Complete;
    h.session.tick(&h.machine, &mut out);

    assert_eq!(
        out,
        [
            Reply::screen(ScreenCode::PrintStarted),
            Reply::screen(ScreenCode::PauseRequested),
            Reply::screen(ScreenCode::PausedAwaitingInput),
            Reply::screen(ScreenCode::PrintFinished),
        ]
    );
    assert_eq!(out[2].min_gap_ms(), Some(250));
}

#[test]
fn test_tick_is_silent_while_disconnected() {
    let mut h = Harness::new(&[]);
    h.session.on_link_event(LinkEvent::Lost);
    h.machine.snapshot.print_state = PrintState::Printing;
    let mut out = Vec::new();
    h.session.tick(&h.machine, &mut out);
    assert!(out.is_empty());
    assert_eq!(h.machine.polls.get(), 0);
}

#[test]
fn test_queue_survives_link_loss() {
    let mut h = Harness::new(&[]);
    h.send("A9");
    h.session.on_link_event(LinkEvent::Lost);
    assert_eq!(h.drain(), ["PAUSE"]);
}
