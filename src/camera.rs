use bevy::prelude::*;

use crate::components::{ObjectId, PlayerIndex};

/// What the camera tracks.
#[derive(Clone, Copy, PartialEq, Debug)]
pub enum CameraFocus {
    Player(PlayerIndex),
    Object(ObjectId),
}

/// World-space rectangle the camera (and the locked player) are confined to.
#[derive(Clone, Copy, PartialEq, Debug)]
pub struct CameraLock {
    pub min: Vec2,
    pub max: Vec2,
}

#[derive(Clone)]
pub struct CameraState {
    pub position: Vec2,
    pub focus: CameraFocus,
    pub lock: Option<CameraLock>,
    pub screen: Vec2,
}

impl CameraState {
    pub fn new(screen: Vec2) -> Self {
        Self {
            position: screen / 2.0,
            focus: CameraFocus::Player(0),
            lock: None,
            screen,
        }
    }

    pub fn set_focus(&mut self, focus: CameraFocus) {
        self.focus = focus;
    }

    pub fn is_locked(&self) -> bool {
        self.lock.is_some()
    }

    pub fn lock(&mut self, x1: f32, y1: f32, x2: f32, y2: f32) {
        self.lock = Some(CameraLock {
            min: Vec2::new(x1.min(x2), y1.min(y2)),
            max: Vec2::new(x1.max(x2), y1.max(y2)),
        });
    }

    pub fn unlock(&mut self) {
        self.lock = None;
    }

    /// Moves toward the focused point, clamped to the lock rectangle.
    pub fn track(&mut self, target: Vec2) {
        self.position = target;
        if let Some(lock) = self.lock {
            self.position = self.position.clamp(lock.min, lock.max);
        }
    }

    /// The camera used by detach_from_camera entities: a fixed camera at the
    /// center of the screen.
    pub fn screen_center(&self) -> Vec2 {
        self.screen / 2.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lock_normalizes_corners() {
        let mut camera = CameraState::new(Vec2::new(426.0, 240.0));
        camera.lock(200.0, 300.0, 100.0, 100.0);
        let lock = camera.lock.unwrap();
        assert_eq!(lock.min, Vec2::new(100.0, 100.0));
        assert_eq!(lock.max, Vec2::new(200.0, 300.0));
    }

    #[test]
    fn tracking_respects_lock() {
        let mut camera = CameraState::new(Vec2::new(426.0, 240.0));
        camera.lock(0.0, 0.0, 100.0, 100.0);
        camera.track(Vec2::new(500.0, -50.0));
        assert_eq!(camera.position, Vec2::new(100.0, 0.0));
        camera.unlock();
        camera.track(Vec2::new(500.0, -50.0));
        assert_eq!(camera.position, Vec2::new(500.0, -50.0));
    }
}
