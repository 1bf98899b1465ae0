//! Clip loading and the engine-side [`AnimationDriver`].
//!
//! The character model is a glTF whose named animations become nodes of one
//! [`AnimationGraph`]. Until the file loads (or if it never does) the
//! character keeps its capsule and the selector runs against [`NullDriver`].

use super::{AnimationDriver, AnimationInput, AnimationSelector, AnimationState, LoopMode, NullDriver};
use crate::input::InputState;
use crate::locomotion::{Character, LocomotionFrame};
use crate::physics::KinematicBody;
use crate::settings::{AnimationSettings, Settings};
use bevy::animation::transition::AnimationTransitions;
use bevy::animation::{ActiveAnimation, RepeatAnimation};
use bevy::asset::LoadState;
use bevy::gltf::Gltf;
use bevy::log::{debug, info, warn};
use bevy::prelude::*;
use bevy::utils::HashMap;
use std::time::Duration;

/// Handle to the character glTF while it loads.
#[derive(Resource, Debug, Clone)]
pub struct CharacterGltf(pub Handle<Gltf>);

#[derive(Debug, Clone, Copy)]
pub struct ClipEntry {
    pub node: AnimationNodeIndex,
    /// Seconds. Zero when the clip asset was not available at build time.
    pub duration: f32,
}

/// Scene and named clips extracted from the character glTF.
#[derive(Resource, Debug, Clone)]
pub struct ClipLibrary {
    pub scene: Handle<Scene>,
    pub graph: Handle<AnimationGraph>,
    pub clips: HashMap<String, ClipEntry>,
}

/// Placeholder body mesh, removed once the model is attached.
#[derive(Component, Debug)]
pub struct CapsuleMesh;

/// Points a character at its spawned model scene.
#[derive(Component, Debug, Clone, Copy)]
pub struct CharacterModel(pub Entity);

/// Points a character at the entity carrying its `AnimationPlayer`.
#[derive(Component, Debug, Clone, Copy)]
pub struct AnimationLink(pub Entity);

#[derive(Debug, Clone)]
pub struct PlayingClip {
    pub name: String,
    pub node: AnimationNodeIndex,
    pub duration: f32,
    pub mode: LoopMode,
}

/// Bookkeeping kept next to the `AnimationPlayer`.
#[derive(Component, Debug, Clone, Default)]
pub struct AnimationPlayback {
    pub current: Option<PlayingClip>,
    finish_reported: bool,
}

/// [`AnimationDriver`] over Bevy's animation player and transitions.
pub struct ClipDriver<'a> {
    pub library: &'a ClipLibrary,
    pub player: &'a mut AnimationPlayer,
    pub transitions: &'a mut AnimationTransitions,
    pub playback: &'a mut AnimationPlayback,
}

impl AnimationDriver for ClipDriver<'_> {
    fn has_clip(&self, name: &str) -> bool {
        self.library.clips.contains_key(name)
    }

    fn play(&mut self, name: &str, mode: LoopMode, speed: f32, blend: f32) -> bool {
        let Some(entry) = self.library.clips.get(name).copied() else {
            return false;
        };
        let fade = Duration::from_secs_f32(blend.max(0.0));
        let active = self.transitions.play(&mut *self.player, entry.node, fade);
        active.replay();
        active.set_speed(speed);
        match mode {
            LoopMode::Forever => {
                active.repeat();
            }
            LoopMode::Once => {
                active.set_repeat(RepeatAnimation::Never);
            }
        }
        self.playback.current = Some(PlayingClip {
            name: name.to_string(),
            node: entry.node,
            duration: entry.duration,
            mode,
        });
        self.playback.finish_reported = false;
        true
    }

    fn advance(&mut self, _dt: f32) -> Option<String> {
        // The player itself is ticked by the engine's animation schedule.
        let current = self.playback.current.as_ref()?;
        if current.mode != LoopMode::Once || self.playback.finish_reported {
            return None;
        }
        let finished = self.player.animation(current.node).map_or(true, ActiveAnimation::is_finished);
        if !finished {
            return None;
        }
        self.playback.finish_reported = true;
        Some(current.name.clone())
    }

    fn current_clip(&self) -> Option<&str> {
        self.playback.current.as_ref().map(|c| c.name.as_str())
    }

    fn progress(&self) -> Option<f32> {
        let current = self.playback.current.as_ref()?;
        if current.duration <= 0.0 {
            return None;
        }
        let active = self.player.animation(current.node)?;
        Some((active.seek_time() / current.duration).clamp(0.0, 1.0))
    }
}

fn model_transform(settings: &AnimationSettings) -> Transform {
    Transform::from_xyz(0.0, settings.model_offset, 0.0).with_scale(Vec3::splat(settings.model_scale))
}

/// Start loading the character glTF named in settings.
#[allow(clippy::needless_pass_by_value)]
pub fn load_character_gltf(mut commands: Commands, asset_server: Res<AssetServer>, settings: Res<Settings>) {
    let path = settings.animation.model_path.clone();
    if path.is_empty() {
        info!("no character model configured, using capsule");
        return;
    }
    info!("loading character model {path}");
    commands.insert_resource(CharacterGltf(asset_server.load(path)));
}

/// Build the [`ClipLibrary`] once the glTF is available.
#[allow(clippy::needless_pass_by_value, clippy::too_many_arguments)]
pub fn process_character_gltf(
    mut commands: Commands,
    handle: Option<Res<CharacterGltf>>,
    asset_server: Res<AssetServer>,
    gltfs: Res<Assets<Gltf>>,
    clips: Res<Assets<AnimationClip>>,
    mut graphs: ResMut<Assets<AnimationGraph>>,
    library: Option<Res<ClipLibrary>>,
    mut gave_up: Local<bool>,
) {
    if library.is_some() || *gave_up {
        return;
    }
    let Some(handle) = handle else { return };

    let Some(gltf) = gltfs.get(&handle.0) else {
        if matches!(asset_server.get_load_state(&handle.0), Some(LoadState::Failed { .. })) {
            warn!("character model failed to load, keeping capsule");
            *gave_up = true;
        }
        return;
    };

    let Some(scene) = gltf.default_scene.clone().or_else(|| gltf.scenes.first().cloned()) else {
        warn!("character model has no scenes, keeping capsule");
        *gave_up = true;
        return;
    };

    let mut graph = AnimationGraph::new();
    let mut entries = HashMap::default();
    for (name, clip) in &gltf.named_animations {
        let node = graph.add_clip(clip.clone(), 1.0, graph.root);
        let duration = clips.get(clip).map_or(0.0, AnimationClip::duration);
        debug!("  clip '{name}' ({duration:.2}s)");
        entries.insert(name.to_string(), ClipEntry { node, duration });
    }
    if entries.is_empty() {
        warn!("character model has no named animations");
    }
    info!("character model ready with {} clips", entries.len());

    commands.insert_resource(ClipLibrary {
        scene,
        graph: graphs.add(graph),
        clips: entries,
    });
}

/// Swap the capsule for the model scene once the library exists.
#[allow(clippy::needless_pass_by_value)]
pub fn attach_character_model(
    mut commands: Commands,
    library: Option<Res<ClipLibrary>>,
    settings: Res<Settings>,
    characters: Query<(Entity, Option<&Children>), (With<Character>, Without<CharacterModel>)>,
    capsules: Query<(), With<CapsuleMesh>>,
) {
    let Some(library) = library else { return };

    for (entity, children) in &characters {
        if let Some(children) = children {
            for &child in children.iter() {
                if capsules.contains(child) {
                    commands.entity(child).despawn_recursive();
                }
            }
        }
        let model = commands
            .spawn((
                SceneBundle {
                    scene: library.scene.clone(),
                    transform: model_transform(&settings.animation),
                    ..default()
                },
                Name::new("character model"),
            ))
            .id();
        commands.entity(entity).add_child(model).insert(CharacterModel(model));
    }
}

fn find_entity_with_component<T: Component>(
    entity: Entity,
    children: &Query<&Children>,
    targets: &Query<Entity, With<T>>,
) -> Option<Entity> {
    if targets.contains(entity) {
        return Some(entity);
    }
    children
        .get(entity)
        .ok()?
        .iter()
        .find_map(|&child| find_entity_with_component(child, children, targets))
}

/// Hook the model's `AnimationPlayer` up to the clip graph once the scene
/// has spawned.
#[allow(clippy::needless_pass_by_value)]
pub fn link_animation_player(
    mut commands: Commands,
    library: Option<Res<ClipLibrary>>,
    characters: Query<(Entity, &CharacterModel), Without<AnimationLink>>,
    children: Query<&Children>,
    players: Query<Entity, With<AnimationPlayer>>,
) {
    let Some(library) = library else { return };

    for (entity, model) in &characters {
        let Some(player) = find_entity_with_component(model.0, &children, &players) else {
            continue;
        };
        debug!("animation player for {entity:?} at {player:?}");
        commands.entity(player).insert((
            library.graph.clone(),
            AnimationTransitions::new(),
            AnimationPlayback::default(),
        ));
        commands.entity(entity).insert(AnimationLink(player));
    }
}

/// Run the selector for every character against its player, or against
/// [`NullDriver`] while no player is linked.
#[allow(clippy::needless_pass_by_value, clippy::type_complexity)]
pub fn drive_animation(
    time: Res<Time>,
    input: Res<InputState>,
    library: Option<Res<ClipLibrary>>,
    mut characters: Query<
        (&mut AnimationSelector, &LocomotionFrame, Option<&AnimationLink>, Option<&mut KinematicBody>),
        With<Character>,
    >,
    mut players: Query<(&mut AnimationPlayer, &mut AnimationTransitions, &mut AnimationPlayback)>,
) {
    let dt = time.delta_seconds();

    for (mut selector, frame, link, body) in &mut characters {
        let anim_input = AnimationInput {
            has_intent: frame.has_intent(),
            forward: input.forward,
            backward: input.backward,
            strafe_left: input.strafe_left,
            strafe_right: input.strafe_right,
            jump_triggered: frame.jumped,
            attack_pressed: input.attack_pressed,
        };

        let linked = match (library.as_deref(), link) {
            (Some(library), Some(link)) => players.get_mut(link.0).ok().map(|p| (library, p)),
            _ => None,
        };
        let started = match linked {
            Some((library, (mut player, mut transitions, mut playback))) => {
                let mut driver = ClipDriver {
                    library,
                    player: &mut player,
                    transitions: &mut transitions,
                    playback: &mut playback,
                };
                selector.update(dt, &anim_input, &mut driver)
            }
            None => selector.update(dt, &anim_input, &mut NullDriver),
        };

        // Attacks root the character from their first frame.
        if let (Some(AnimationState::Attack), Some(mut body)) = (started, body) {
            body.velocity.x = 0.0;
            body.velocity.z = 0.0;
        }
    }
}

/// Push edited animation tuning into selectors and model transforms.
#[allow(clippy::needless_pass_by_value)]
pub fn sync_animation_settings(
    settings: Res<Settings>,
    mut selectors: Query<(&mut AnimationSelector, Option<&CharacterModel>)>,
    mut transforms: Query<&mut Transform, Without<Character>>,
) {
    if !settings.is_changed() {
        return;
    }
    for (mut selector, model) in &mut selectors {
        if selector.settings != settings.animation {
            selector.settings = settings.animation.clone();
        }
        if let Some(mut transform) = model.and_then(|m| transforms.get_mut(m.0).ok()) {
            let wanted = model_transform(&settings.animation);
            if *transform != wanted {
                *transform = wanted;
            }
        }
    }
}
