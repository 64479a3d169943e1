use std::collections::HashMap;

use bevy::prelude::*;
use serde::{Deserialize, Serialize};

fn default_fps() -> f32 {
    8.0
}

fn default_repeat() -> bool {
    true
}

fn default_frame_size() -> (f32, f32) {
    (32.0, 32.0)
}

/// One animation of a sprite: a run of frames at a fixed rate.
#[derive(Clone, Serialize, Deserialize)]
pub struct AnimationDef {
    pub frame_count: u32,
    #[serde(default = "default_fps")]
    pub fps: f32,
    #[serde(default = "default_repeat")]
    pub repeat: bool,
    #[serde(default = "default_frame_size")]
    pub frame_size: (f32, f32),
    #[serde(default)]
    pub hot_spot: (f32, f32),
}

impl Default for AnimationDef {
    fn default() -> Self {
        Self {
            frame_count: 1,
            fps: default_fps(),
            repeat: default_repeat(),
            frame_size: default_frame_size(),
            hot_spot: (0.0, 0.0),
        }
    }
}

#[derive(Clone, Serialize, Deserialize, Default)]
pub struct SpriteDef {
    #[serde(default)]
    pub animations: HashMap<u32, AnimationDef>,
}

/// All sprite definitions known to the engine, keyed by sprite name.
/// Loaded from sprites.json; tests build small libraries by hand.
#[derive(Resource, Clone, Default)]
pub struct SpriteLibrary {
    pub sprites: HashMap<String, SpriteDef>,
}

impl SpriteLibrary {
    pub fn animation(&self, sprite: &str, anim_id: u32) -> Option<&AnimationDef> {
        self.sprites.get(sprite)?.animations.get(&anim_id)
    }

    pub fn load_json(&mut self, json: &str) -> Result<(), String> {
        let sprites: HashMap<String, SpriteDef> =
            serde_json::from_str(json).map_err(|e| format!("bad sprite definitions: {e}"))?;
        self.sprites.extend(sprites);
        Ok(())
    }
}

/// Playback position over a resolved animation. The definition is copied in
/// on change so cursors never need the library at tick time.
#[derive(Clone)]
pub struct AnimationCursor {
    pub sprite: String,
    pub anim_id: u32,
    pub frame_count: u32,
    pub fps: f32,
    pub repeat: bool,
    pub frame_size: Vec2,
    pub hot_spot: Vec2,
    pub frame_cursor: f32,
    pub speed_factor: f32,
}

impl Default for AnimationCursor {
    fn default() -> Self {
        Self {
            sprite: String::new(),
            anim_id: 0,
            frame_count: 1,
            fps: 8.0,
            repeat: true,
            frame_size: Vec2::new(32.0, 32.0),
            hot_spot: Vec2::ZERO,
            frame_cursor: 0.0,
            speed_factor: 1.0,
        }
    }
}

impl AnimationCursor {
    pub fn change(&mut self, sprite: &str, anim_id: u32, def: &AnimationDef) {
        self.sprite = sprite.to_string();
        self.anim_id = anim_id;
        self.frame_count = def.frame_count.max(1);
        self.fps = def.fps;
        self.repeat = def.repeat;
        self.frame_size = Vec2::new(def.frame_size.0, def.frame_size.1);
        self.hot_spot = Vec2::new(def.hot_spot.0, def.hot_spot.1);
        self.frame_cursor = 0.0;
    }

    pub fn advance(&mut self, dt: f32) {
        self.frame_cursor += self.fps * self.speed_factor * dt;
        let n = self.frame_count as f32;
        if self.frame_cursor >= n {
            if self.repeat {
                self.frame_cursor %= n;
            } else {
                self.frame_cursor = n - 0.001;
            }
        }
    }

    pub fn frame(&self) -> u32 {
        (self.frame_cursor as u32).min(self.frame_count - 1)
    }

    pub fn set_frame(&mut self, frame: u32) {
        self.frame_cursor = frame.min(self.frame_count - 1) as f32;
    }

    /// A non-repeating animation is finished once it sits on its last frame.
    pub fn finished(&self) -> bool {
        !self.repeat && self.frame() == self.frame_count - 1
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn oneshot(frames: u32, fps: f32) -> AnimationCursor {
        let mut cursor = AnimationCursor::default();
        cursor.change(
            "TEST",
            0,
            &AnimationDef {
                frame_count: frames,
                fps,
                repeat: false,
                ..Default::default()
            },
        );
        cursor
    }

    #[test]
    fn advance_steps_frames_at_fps() {
        let mut cursor = oneshot(4, 8.0);
        cursor.advance(1.0 / 8.0);
        assert_eq!(cursor.frame(), 1);
        cursor.advance(1.0 / 8.0);
        assert_eq!(cursor.frame(), 2);
    }

    #[test]
    fn oneshot_finishes_on_last_frame() {
        let mut cursor = oneshot(2, 8.0);
        assert!(!cursor.finished());
        cursor.advance(1.0);
        assert_eq!(cursor.frame(), 1);
        assert!(cursor.finished());
    }

    #[test]
    fn looping_animation_never_finishes() {
        let mut cursor = AnimationCursor::default();
        cursor.change("TEST", 0, &AnimationDef::default());
        cursor.advance(10.0);
        assert!(!cursor.finished());
    }

    #[test]
    fn speed_factor_scales_playback() {
        let mut cursor = oneshot(8, 8.0);
        cursor.speed_factor = 2.0;
        cursor.advance(1.0 / 8.0);
        assert_eq!(cursor.frame(), 2);
    }
}
