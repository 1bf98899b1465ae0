pub mod display;
pub mod setup;

pub use display::sync_graphics_settings;
pub use setup::setup;
