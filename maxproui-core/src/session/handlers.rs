//! Per-command handlers
//!
//! Each panel request maps to one handler. Handlers answer immediately and
//! leave any machine action in the dispatch queue.

use alloc::format;
use alloc::string::String;
use alloc::vec::Vec;
use core::fmt::Write;

use maxproui_protocol::{
    Command, FieldValue, HomeTarget, HotendTarget, JogMove, Reply, ScreenCode,
};

use crate::catalog::{MenuCatalog, Navigation};
use crate::config::{MachineConfig, PreheatPreset};
use crate::dispatch::DispatchQueue;
use crate::paging::{resolve_file_label, PageBuilder};
use crate::traits::{FileListing, MachineStatus};

use super::context::SessionContext;

/// Shown by A7 when no job time is known
const UNKNOWN_PRINT_TIME: &str = "999:999";

pub(super) struct Handlers<'a, M: ?Sized, F: ?Sized> {
    pub catalog: &'a MenuCatalog,
    pub config: &'a MachineConfig,
    pub queue: &'a mut DispatchQueue,
    pub ctx: &'a mut SessionContext,
    pub machine: &'a M,
    pub files: &'a F,
    pub out: &'a mut Vec<Reply>,
}

impl<M, F> Handlers<'_, M, F>
where
    M: MachineStatus + ?Sized,
    F: FileListing + ?Sized,
{
    pub fn dispatch(mut self, command: Command) {
        match command {
            Command::GetHotendTemp => {
                let t = self.machine.snapshot().extruder_current;
                self.value(0, t as i32);
            }
            Command::GetHotendTarget => {
                let t = self.machine.snapshot().extruder_target;
                self.value(1, t as i32);
            }
            Command::GetBedTemp => {
                let t = self.machine.snapshot().bed_current;
                self.value(2, t as i32);
            }
            Command::GetBedTarget => {
                let t = self.machine.snapshot().bed_target;
                self.value(3, t as i32);
            }
            Command::GetFanSpeed => {
                let speed = self.machine.snapshot().fan_speed;
                self.value(4, percent(speed));
            }
            Command::GetPosition => {
                let p = self.machine.position();
                self.out.push(Reply::value(
                    5,
                    format_args!("X: {:.1} Y: {:.1} Z: {:.1} ", p.x, p.y, p.z),
                ));
            }
            Command::GetProgress => {
                let progress = self.machine.snapshot().progress_percent;
                self.value(6, progress as i32);
            }
            Command::GetPrintTime => self.print_time(),
            Command::ListPage { start } => self.list_page(start),
            Command::Pause => self.run_and_ack("PAUSE"),
            Command::Resume => self.run_and_ack("RESUME"),
            Command::Stop => self.run_and_ack("CANCEL_PRINT"),
            Command::Kill => {
                self.queue.enqueue("M112");
                self.out.push(Reply::screen(ScreenCode::PrintStopped));
            }
            Command::Select { label } => self.select(&label),
            Command::StartPrint | Command::ResumeFromOutage => {
                if let Some(file) = self.ctx.selection.selected_file.as_deref() {
                    self.queue
                        .enqueue(&format!("SDCARD_PRINT_FILE FILENAME={}", file));
                }
                self.out.push(Reply::Ack);
            }
            Command::SetHotendTemp { target } => {
                match target {
                    Some(HotendTarget::Direct(t)) => {
                        self.queue.enqueue(&format!("M104 S{}", t));
                    }
                    Some(HotendTarget::Guarded(t)) => {
                        let script = if self.below_safe_z() {
                            format!("G1 Z{}\nM104 S{}", self.config.safe_z, t)
                        } else {
                            format!("M104 S{}", t)
                        };
                        self.queue.enqueue(&script);
                    }
                    None => {}
                }
                self.out.push(Reply::Ack);
            }
            Command::SetBedTemp { target } => {
                if let Some(t) = target {
                    self.queue.enqueue(&format!("M140 S{}", t));
                }
                self.out.push(Reply::Ack);
            }
            Command::SetFanSpeed { percent } => {
                let pwm = match percent {
                    Some(p) => ((p as f32 / 100.0) * 255.0) as i32,
                    None => 255,
                };
                self.run_and_ack(&format!("M106 S{}", pwm));
            }
            Command::DisableMotors => self.run_and_ack("M18\nM84"),
            Command::SpeedFactor { set: Some(pct) } => {
                self.run_and_ack(&format!("M220 S{}", pct));
            }
            Command::SpeedFactor { set: None } => {
                let factor = self.machine.speed_factor();
                self.value(20, percent(factor));
            }
            Command::Home(target) => {
                let script = match target {
                    HomeTarget::All => String::from("G28"),
                    HomeTarget::Axis(axis) => format!("G28 {}", axis.letter()),
                };
                self.run_and_ack(&script);
            }
            Command::Jog { moves, feedrate } => {
                for JogMove { axis, distance } in &moves {
                    self.queue
                        .enqueue(&jog_script(axis.letter(), distance, feedrate.as_ref()));
                }
                self.out.push(Reply::Ack);
            }
            Command::PreheatPla => {
                let preset = self.config.pla;
                self.preheat(preset);
            }
            Command::PreheatAbs => {
                let preset = self.config.abs;
                self.preheat(preset);
            }
            Command::Cooldown => {
                let script = format!("M104 S0\nM140 S0\nG1 Z{}", self.config.safe_z);
                self.run_and_ack(&script);
            }
            Command::Refresh => {
                if self.ctx.selection.last_user_selection.is_some() {
                    self.ctx.selection.pending_execute = true;
                }
                self.out.push(Reply::Ack);
            }
            Command::Acknowledge(_) => self.out.push(Reply::Ack),
            Command::Version => {
                let version = self.machine.software_version();
                self.out
                    .push(Reply::screen_with(ScreenCode::Version, version));
            }
            Command::ResetMainboard => self.run_and_ack("FIRMWARE_RESTART"),
            Command::Continue { power_off, confirm } => {
                if power_off.is_some() {
                    self.ctx.power_off = power_off;
                }
                if confirm {
                    // The panel expects these two with an empty payload
                    let code = match self.ctx.power_off {
                        Some(true) => Some(ScreenCode::PowerOffConfirmed),
                        Some(false) => Some(ScreenCode::ResumeConfirmed),
                        None => None,
                    };
                    if let Some(code) = code {
                        self.out.push(Reply::screen_with(code, ""));
                    }
                }
            }
            Command::CaseLight { on } => {
                let script = if on {
                    &self.config.case_light_on
                } else {
                    &self.config.case_light_off
                };
                self.queue.enqueue(script);
                self.out.push(Reply::Ack);
            }
        }
    }

    fn value(&mut self, cmd: u8, value: i32) {
        self.out.push(Reply::value(cmd, format_args!("{}", value)));
    }

    fn run_and_ack(&mut self, script: &str) {
        self.queue.enqueue(script);
        self.out.push(Reply::Ack);
    }

    fn below_safe_z(&self) -> bool {
        self.machine.position().z < self.config.safe_z
    }

    fn print_time(&mut self) {
        match self.machine.snapshot().total_duration_s {
            Some(d) if d > 0.0 => {
                let secs = d as u64;
                self.out.push(Reply::value(
                    7,
                    format_args!("{:02} H {:02} M", secs / 3600, (secs / 60) % 60),
                ));
            }
            _ => self
                .out
                .push(Reply::value(7, format_args!("{}", UNKNOWN_PRINT_TIME))),
        }
    }

    fn preheat(&mut self, preset: PreheatPreset) {
        if self.below_safe_z() {
            self.queue.enqueue(&format!("G1 Z{}", self.config.safe_z));
        }
        self.run_and_ack(&format!("M104 S{}\nM140 S{}", preset.hotend, preset.bed));
    }

    fn list_page(&mut self, start: usize) {
        let page = PageBuilder::new(self.catalog, self.queue).build(
            &mut self.ctx.selection,
            self.files,
            start,
        );
        self.out.extend(page.replies());
    }

    fn select(&mut self, label: &FieldValue) {
        let selection = &mut self.ctx.selection;
        selection.last_user_selection = None;
        selection.selected_file = None;

        if !label.starts_with('<') {
            selection.selected_file = Some(resolve_file_label(self.files, label));
            self.out.push(Reply::screen(ScreenCode::OpenSucceeded));
            return;
        }

        // A user entry sharing a reserved key still navigates
        let navigation = Navigation::from_key(label)
            .or_else(|| self.catalog.resolve(label).and_then(|e| e.navigation()));
        match navigation {
            Some(Navigation::EnterSpecialMenu) => selection.reset_navigation(true),
            Some(Navigation::ExitSpecialMenu) => selection.reset_navigation(false),
            None => selection.last_user_selection = Some(label.clone()),
        }
        self.out.push(Reply::screen(ScreenCode::OpenFailed));
    }
}

/// Ratio (1.0 = 100 %) to a whole percentage
fn percent(ratio: f32) -> i32 {
    let scaled = ratio * 100.0;
    if scaled >= 0.0 {
        (scaled + 0.5) as i32
    } else {
        (scaled - 0.5) as i32
    }
}

fn jog_script(axis: char, distance: &str, feedrate: Option<&FieldValue>) -> String {
    let mut script = format!("G91\nG1 {}{}", axis, distance);
    if let Some(f) = feedrate {
        let _ = write!(script, " F{}", f);
    }
    script.push_str("\nG90");
    script
}
