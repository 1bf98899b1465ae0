//! Debug dump (F3 by default): writes diagnostics, character, camera and
//! animation state plus process memory to a timestamped text file in
//! `./debug-dumps/`.
//!
//! Handy for capturing a bad frame (a camera snap, a stuck attack) without
//! attaching a debugger.
use crate::animation::{AnimationSelector, ClipLibrary};
use crate::camera::OrbitCamera;
use crate::input::{ActionBindings, InputState};
use crate::locomotion::{Character, LocomotionFrame};
use crate::physics::KinematicBody;
use crate::ui::describe_state;
use bevy::diagnostic::{Diagnostic, DiagnosticsStore, FrameTimeDiagnosticsPlugin};
use bevy::prelude::*;
use chrono::{DateTime, Utc};
use std::fmt::Write;
use std::fs;
use std::time::{SystemTime, UNIX_EPOCH};
use sysinfo::{Pid, ProcessExt, System, SystemExt};

const DUMP_DIR: &str = "debug-dumps";

pub struct DebugDumpPlugin;

impl Plugin for DebugDumpPlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(Update, debug_input_system);
    }
}

fn bytes_to_mb(bytes: u64) -> String {
    format!("{:.2} MB", (bytes as f64) / 1024.0 / 1024.0)
}

/// Memory figures in bytes, as sysinfo 0.29 reports them.
#[derive(Debug, Clone, Copy, Default)]
pub struct MemorySnapshot {
    pub process_bytes: u64,
    pub process_virtual_bytes: u64,
    pub total_bytes: u64,
    pub used_bytes: u64,
}

impl MemorySnapshot {
    #[must_use]
    pub fn capture() -> Self {
        let mut sys = System::new_all();
        sys.refresh_all();
        let proc = sys.process(Pid::from(std::process::id() as usize));
        Self {
            process_bytes: proc.map_or(0, |p| p.memory()),
            process_virtual_bytes: proc.map_or(0, |p| p.virtual_memory()),
            total_bytes: sys.total_memory(),
            used_bytes: sys.used_memory(),
        }
    }
}

/// Everything a dump reports, gathered before formatting.
#[derive(Debug, Clone, Default)]
pub struct DumpContents {
    pub human_ts: String,
    pub epoch_secs: u64,
    pub fps: f64,
    pub frame_time_ms: f64,
    pub entity_count: usize,
    pub clip_names: Vec<String>,
    pub character: Option<String>,
    pub input: InputState,
    pub memory: MemorySnapshot,
}

#[must_use]
pub fn format_dump(c: &DumpContents) -> String {
    let mut out = String::new();
    writeln!(out, "Debug dump: {}", c.epoch_secs).ok();
    writeln!(out, "Timestamp: {} (epoch secs: {})", c.human_ts, c.epoch_secs).ok();
    writeln!(out, "FPS: {:.1}, frame_time: {:.4} ms", c.fps, c.frame_time_ms).ok();
    writeln!(out, "Entities: {}", c.entity_count).ok();

    writeln!(out, "\nCharacter:").ok();
    match &c.character {
        Some(state) => {
            for line in state.lines() {
                writeln!(out, "  {line}").ok();
            }
        }
        None => {
            writeln!(out, "  (no character)").ok();
        }
    }

    let i = &c.input;
    writeln!(
        out,
        "\nInput: fwd={} back={} left={} right={} jump={} attack={} mouse=({:.1}, {:.1})",
        i.forward, i.backward, i.strafe_left, i.strafe_right, i.jump_held, i.attack_held, i.mouse_delta.x, i.mouse_delta.y
    )
    .ok();

    if c.clip_names.is_empty() {
        writeln!(out, "Clips: (none loaded)").ok();
    } else {
        writeln!(out, "Clips: {}", c.clip_names.join(", ")).ok();
    }

    let m = &c.memory;
    writeln!(out, "\nProcess memory: {} (virtual {})", bytes_to_mb(m.process_bytes), bytes_to_mb(m.process_virtual_bytes)).ok();
    writeln!(out, "System memory: total={} used={}", bytes_to_mb(m.total_bytes), bytes_to_mb(m.used_bytes)).ok();
    out
}

#[allow(clippy::needless_pass_by_value, clippy::too_many_arguments)]
fn debug_input_system(
    keys: Res<ButtonInput<KeyCode>>,
    buttons: Res<ButtonInput<MouseButton>>,
    bindings: Res<ActionBindings>,
    diagnostics: Res<DiagnosticsStore>,
    input: Res<InputState>,
    entities: Query<Entity>,
    characters: Query<
        (&Transform, &KinematicBody, &LocomotionFrame, Option<&AnimationSelector>),
        With<Character>,
    >,
    cameras: Query<&OrbitCamera>,
    library: Option<Res<ClipLibrary>>,
) {
    if !bindings.dump_debug.just_pressed(&keys, &buttons) {
        return;
    }

    let now = SystemTime::now();
    let epoch_secs = now.duration_since(UNIX_EPOCH).map_or(0, |d| d.as_secs());
    let dt: DateTime<Utc> = DateTime::from(now);

    let mut clip_names: Vec<String> = library
        .as_ref()
        .map(|l| l.clips.keys().cloned().collect())
        .unwrap_or_default();
    clip_names.sort();

    let contents = DumpContents {
        human_ts: dt.format("%Y-%m-%d %H:%M:%S").to_string(),
        epoch_secs,
        fps: diagnostics
            .get(&FrameTimeDiagnosticsPlugin::FPS)
            .and_then(Diagnostic::smoothed)
            .unwrap_or(0.0),
        frame_time_ms: diagnostics
            .get(&FrameTimeDiagnosticsPlugin::FRAME_TIME)
            .and_then(Diagnostic::smoothed)
            .unwrap_or(0.0),
        entity_count: entities.iter().count(),
        clip_names,
        character: characters.get_single().ok().map(|(t, b, f, s)| {
            describe_state(t, b, f, s, cameras.iter().next())
        }),
        input: *input,
        memory: MemorySnapshot::capture(),
    };

    let fname = format!("{DUMP_DIR}/debug-{epoch_secs}.txt");
    if let Err(e) = fs::create_dir_all(DUMP_DIR) {
        error!("debug dump: failed to create dir '{DUMP_DIR}': {e}");
        return;
    }
    if let Err(e) = fs::write(&fname, format_dump(&contents)) {
        error!("debug dump: failed to write {fname}: {e}");
    } else {
        info!("wrote debug dump: {fname}");
    }
}
