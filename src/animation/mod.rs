//! Animation state selection.
//!
//! [`AnimationSelector`] decides which named clip the character should be
//! playing from this frame's locomotion and action input, and asks an
//! [`AnimationDriver`] to cross-fade to it. Selection is by priority:
//!
//! 1. `Attack` while blocking, or on an attack press.
//! 2. `Jump` when a jump fired, held until the clip reports completion.
//! 3. A directional walk when there is walk intent.
//! 4. `Idle`.
//!
//! Play-once clips (`Jump`, `Attack`) finish through the driver's completion
//! event rather than by polling elapsed time.

pub mod clips;

use crate::settings::{AnimationSettings, ClipNames};
use bevy::log::{debug, warn};
use bevy::prelude::*;

pub use clips::{
    attach_character_model, drive_animation, link_animation_player, load_character_gltf, process_character_gltf,
    sync_animation_settings, CapsuleMesh, ClipLibrary,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AnimationState {
    Idle,
    WalkForward,
    WalkBackward,
    StrafeLeft,
    StrafeRight,
    Jump,
    Attack,
}

impl AnimationState {
    #[must_use]
    pub fn clip_name(self, clips: &ClipNames) -> &str {
        match self {
            AnimationState::Idle => &clips.idle,
            AnimationState::WalkForward => &clips.walk_forward,
            AnimationState::WalkBackward => &clips.walk_backward,
            AnimationState::StrafeLeft => &clips.strafe_left,
            AnimationState::StrafeRight => &clips.strafe_right,
            AnimationState::Jump => &clips.jump,
            AnimationState::Attack => &clips.attack,
        }
    }

    #[must_use]
    pub fn loop_mode(self) -> LoopMode {
        match self {
            AnimationState::Jump | AnimationState::Attack => LoopMode::Once,
            _ => LoopMode::Forever,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopMode {
    Forever,
    Once,
}

/// Named-clip playback, implemented by the engine's animation player.
pub trait AnimationDriver {
    fn has_clip(&self, name: &str) -> bool;

    /// Cross-fade to `name` over `blend` seconds. Returns `false` (and leaves
    /// the current clip alone) when no such clip is loaded.
    fn play(&mut self, name: &str, mode: LoopMode, speed: f32, blend: f32) -> bool;

    /// Advance playback and report the play-once clip that finished, if any.
    /// Each finish is reported once.
    fn advance(&mut self, dt: f32) -> Option<String>;

    fn current_clip(&self) -> Option<&str>;

    /// Normalized progress of the current clip in `[0, 1]`.
    fn progress(&self) -> Option<f32>;
}

/// Driver for a character with no loaded clips. Every request is a no-op.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullDriver;

impl AnimationDriver for NullDriver {
    fn has_clip(&self, _name: &str) -> bool {
        false
    }

    fn play(&mut self, _name: &str, _mode: LoopMode, _speed: f32, _blend: f32) -> bool {
        false
    }

    fn advance(&mut self, _dt: f32) -> Option<String> {
        None
    }

    fn current_clip(&self) -> Option<&str> {
        None
    }

    fn progress(&self) -> Option<f32> {
        None
    }
}

/// What the selector looks at each frame.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct AnimationInput {
    /// Locomotion produced a non-zero walk intent.
    pub has_intent: bool,
    pub forward: bool,
    pub backward: bool,
    pub strafe_left: bool,
    pub strafe_right: bool,
    /// A jump fired this frame.
    pub jump_triggered: bool,
    pub attack_pressed: bool,
}

/// Current clip selection for one character.
#[derive(Component, Debug, Clone, Default)]
pub struct AnimationSelector {
    current: Option<AnimationState>,
    /// Clip name handed to the driver for `current`. Completion events are
    /// matched against this, not the live settings, which may be reloaded
    /// mid-clip.
    playing_clip: Option<String>,
    blocking: bool,
    pub settings: AnimationSettings,
}

impl AnimationSelector {
    #[must_use]
    pub fn new(settings: AnimationSettings) -> Self {
        Self { current: None, playing_clip: None, blocking: false, settings }
    }

    #[must_use]
    pub fn current(&self) -> Option<AnimationState> {
        self.current
    }

    /// An attack is playing and movement should be held.
    #[must_use]
    pub fn is_blocking(&self) -> bool {
        self.blocking
    }

    /// Walk state for the held directions, forward first.
    #[must_use]
    pub fn walk_state(input: &AnimationInput) -> Option<AnimationState> {
        if !input.has_intent {
            return None;
        }
        if input.forward {
            Some(AnimationState::WalkForward)
        } else if input.backward {
            Some(AnimationState::WalkBackward)
        } else if input.strafe_left {
            Some(AnimationState::StrafeLeft)
        } else if input.strafe_right {
            Some(AnimationState::StrafeRight)
        } else {
            None
        }
    }

    /// Highest-priority state for this frame.
    #[must_use]
    pub fn target_state<D: AnimationDriver>(&self, input: &AnimationInput, driver: &D) -> AnimationState {
        let clips = &self.settings.clips;
        if self.blocking
            || (input.attack_pressed && driver.has_clip(AnimationState::Attack.clip_name(clips)))
        {
            return AnimationState::Attack;
        }
        if self.current == Some(AnimationState::Jump) || input.jump_triggered {
            return AnimationState::Jump;
        }
        Self::walk_state(input).unwrap_or(AnimationState::Idle)
    }

    fn blend_for(&self, state: AnimationState) -> f32 {
        match state {
            AnimationState::Jump => self.settings.jump_blend_seconds,
            AnimationState::Attack => self.settings.attack_blend_seconds,
            _ => self.settings.locomotion_blend_seconds,
        }
    }

    /// Ask the driver for `state`. Returns whether playback switched.
    fn request<D: AnimationDriver>(&mut self, state: AnimationState, blend: f32, driver: &mut D) -> bool {
        let name = state.clip_name(&self.settings.clips);
        if !driver.play(name, state.loop_mode(), self.settings.playback_speed, blend) {
            return false;
        }
        debug!("animation -> {state:?} ({name})");
        self.playing_clip = Some(name.to_string());
        self.current = Some(state);
        if state == AnimationState::Attack {
            self.blocking = true;
        }
        true
    }

    fn on_finished<D: AnimationDriver>(&mut self, finished: &str, driver: &mut D) {
        if self.playing_clip.as_deref() != Some(finished) {
            return;
        }
        match self.current {
            Some(AnimationState::Attack) => {
                self.blocking = false;
                self.current = None;
                self.playing_clip = None;
                let blend = self.settings.recover_blend_seconds;
                if !self.request(AnimationState::Idle, blend, driver) {
                    warn!("idle clip '{}' missing after attack", self.settings.clips.idle);
                }
            }
            Some(AnimationState::Jump) => {
                self.current = None;
                self.playing_clip = None;
            }
            _ => {}
        }
    }

    /// Advance playback and switch clips if the target state changed.
    /// Returns the newly requested state when a switch happened.
    pub fn update<D: AnimationDriver>(
        &mut self,
        dt: f32,
        input: &AnimationInput,
        driver: &mut D,
    ) -> Option<AnimationState> {
        if let Some(finished) = driver.advance(dt) {
            self.on_finished(&finished, driver);
        }

        let target = self.target_state(input, driver);
        if self.current == Some(target) {
            return None;
        }
        let blend = self.blend_for(target);
        self.request(target, blend, driver).then_some(target)
    }
}
