pub mod animation;
pub mod camera;
pub mod debug;
pub mod input;
pub mod locomotion;
pub mod physics;
pub mod ron;
pub use crate::ron as ron_loader;
pub mod settings;
pub mod ui;
