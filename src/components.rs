use bevy::prelude::*;

/// Handle of a scripted object living in the level's entity pool.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, PartialOrd, Ord)]
pub struct ObjectId(pub u64);

/// Index into the level's team vector. Players are never removed mid-level,
/// so indices stay valid for the whole session.
pub type PlayerIndex = usize;

/// Lifecycle of a scripted object. `Dead` entities are neither updated nor
/// rendered; the level sweeps them at the end of the frame.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub enum Lifecycle {
    #[default]
    Idle,
    Dead,
}

/// True when the engine runs without a window (tests, CI, tooling).
#[derive(Resource, Clone, Copy, Default)]
pub struct HeadlessMode(pub bool);

/// Engine-wide tunables, loadable from game.json.
#[derive(Resource, Clone, serde::Serialize, serde::Deserialize)]
pub struct GameConfig {
    pub screen_width: f32,
    pub screen_height: f32,
    pub rng_seed: u64,
    pub default_sprite: String,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            screen_width: 426.0,
            screen_height: 240.0,
            rng_seed: 0,
            default_sprite: "SD_QUESTIONMARK".to_string(),
        }
    }
}

/// Logs an unrecoverable script/engine error and aborts. Script errors that
/// reach this point have already been formatted with file and line where
/// available.
pub fn fatal(message: &str) -> ! {
    error!("[Strata] fatal: {}", message);
    panic!("{}", message);
}
