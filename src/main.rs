mod actor;
mod animation;
mod audio;
mod brick;
mod camera;
mod components;
mod events;
mod game_runtime;
mod input;
mod level;
mod objects;
mod player;
mod render;
mod sensors;
mod text;

use bevy::prelude::*;
use components::{GameConfig, HeadlessMode};
use level::AssetsDir;

#[derive(serde::Deserialize, Default)]
struct StartupConfig {
    window_title: Option<String>,
    window_width: Option<f32>,
    window_height: Option<f32>,
    background_color: Option<[f32; 3]>,
    assets_dir: Option<String>,
    screen_width: Option<f32>,
    screen_height: Option<f32>,
    rng_seed: Option<u64>,
}

fn load_startup_config() -> StartupConfig {
    let path = std::env::var("STRATA_GAME_CONFIG")
        .ok()
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| "game.json".to_string());
    match std::fs::read_to_string(&path) {
        Ok(contents) => match serde_json::from_str::<StartupConfig>(&contents) {
            Ok(cfg) => {
                println!("[Strata] Loaded startup config from {}", path);
                cfg
            }
            Err(e) => {
                eprintln!("[Strata] Failed to parse {}: {}", path, e);
                StartupConfig::default()
            }
        },
        Err(_) => StartupConfig::default(),
    }
}

fn main() {
    let args: Vec<String> = std::env::args().collect();
    let headless = args.iter().any(|a| a == "--headless");

    let startup_config = load_startup_config();
    let mut app = App::new();

    app.insert_resource(HeadlessMode(headless));

    let assets_dir = std::env::var("STRATA_ASSETS_DIR")
        .ok()
        .filter(|s| !s.is_empty())
        .or(startup_config.assets_dir)
        .unwrap_or_else(|| "assets".to_string());
    if assets_dir != "assets" {
        println!("[Strata] Using game assets dir: {}", assets_dir);
    }
    app.insert_resource(AssetsDir(assets_dir));

    let mut game_config = GameConfig::default();
    if let Some(width) = startup_config.screen_width {
        game_config.screen_width = width;
    }
    if let Some(height) = startup_config.screen_height {
        game_config.screen_height = height;
    }
    if let Some(seed) = startup_config.rng_seed {
        game_config.rng_seed = seed;
    }

    if headless {
        // Headless mode: no window, no rendering, just the runtime
        app.add_plugins(MinimalPlugins);
        app.add_plugins(bevy::state::app::StatesPlugin);
        println!("[Strata] Starting in HEADLESS mode");
    } else {
        let window_title = startup_config
            .window_title
            .unwrap_or_else(|| "Strata".to_string());
        let window_width = startup_config.window_width.unwrap_or(960.0);
        let window_height = startup_config.window_height.unwrap_or(540.0);

        app.add_plugins(DefaultPlugins.set(WindowPlugin {
            primary_window: Some(Window {
                title: window_title,
                resolution: (window_width, window_height).into(),
                present_mode: bevy::window::PresentMode::AutoVsync,
                ..default()
            }),
            ..default()
        }));
        let bg = startup_config.background_color.unwrap_or([0.1, 0.12, 0.18]);
        app.insert_resource(ClearColor(Color::srgb(bg[0], bg[1], bg[2])));
        app.add_plugins(render::RenderPlugin);
        println!("[Strata] Starting in WINDOWED mode");
    }

    app.insert_resource(game_config)
        .insert_resource(Time::<Fixed>::from_hz(60.0))
        .add_plugins(input::InputPlugin)
        .add_plugins(game_runtime::RuntimeStatePlugin)
        .add_plugins(audio::AudioPlugin)
        .add_plugins(level::LevelPlugin);

    app.run();
}
