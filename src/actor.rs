use bevy::prelude::*;

use crate::animation::AnimationCursor;

/// Spatial and animation handle shared by scripted objects and players:
/// transform, velocity, mirror flags and the current animation cursor.
#[derive(Clone)]
pub struct Actor {
    pub position: Vec2,
    pub spawn_point: Vec2,
    pub speed: Vec2,
    pub scale: Vec2,
    /// Radians, counterclockwise.
    pub angle: f32,
    pub alpha: f32,
    pub visible: bool,
    pub hflip: bool,
    pub vflip: bool,
    pub anim: AnimationCursor,
}

impl Default for Actor {
    fn default() -> Self {
        Self {
            position: Vec2::ZERO,
            spawn_point: Vec2::ZERO,
            speed: Vec2::ZERO,
            scale: Vec2::ONE,
            angle: 0.0,
            alpha: 1.0,
            visible: true,
            hflip: false,
            vflip: false,
            anim: AnimationCursor::default(),
        }
    }
}

impl Actor {
    pub fn at(position: Vec2) -> Self {
        Self {
            position,
            spawn_point: position,
            ..Default::default()
        }
    }

    pub fn hot_spot(&self) -> Vec2 {
        self.anim.hot_spot
    }

    pub fn size(&self) -> Vec2 {
        self.anim.frame_size
    }

    /// Top-left corner of the actor box in world coordinates.
    pub fn top_left(&self) -> Vec2 {
        self.position - self.anim.hot_spot
    }

    pub fn aabb(&self) -> Rect {
        let tl = self.top_left();
        Rect::from_corners(tl, tl + self.size())
    }

    pub fn collides_with(&self, other: &Actor) -> bool {
        rects_overlap(self.aabb(), other.aabb())
    }

    /// Horizontal facing: +1 when looking right, -1 when mirrored.
    pub fn direction(&self) -> f32 {
        if self.hflip {
            -1.0
        } else {
            1.0
        }
    }
}

/// Half-open overlap test; boxes merely touching do not collide.
pub fn rects_overlap(a: Rect, b: Rect) -> bool {
    a.min.x < b.max.x && a.max.x > b.min.x && a.min.y < b.max.y && a.max.y > b.min.y
}

pub fn rotate(v: Vec2, radians: f32) -> Vec2 {
    let (sin, cos) = radians.sin_cos();
    Vec2::new(v.x * cos - v.y * sin, v.x * sin + v.y * cos)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::animation::AnimationDef;

    fn actor_with_box(x: f32, y: f32, w: f32, h: f32) -> Actor {
        let mut actor = Actor::at(Vec2::new(x, y));
        actor.anim.change(
            "TEST",
            0,
            &AnimationDef {
                frame_size: (w, h),
                ..Default::default()
            },
        );
        actor
    }

    #[test]
    fn aabb_accounts_for_hot_spot() {
        let mut actor = actor_with_box(100.0, 50.0, 32.0, 16.0);
        actor.anim.hot_spot = Vec2::new(16.0, 8.0);
        let aabb = actor.aabb();
        assert_eq!(aabb.min, Vec2::new(84.0, 42.0));
        assert_eq!(aabb.max, Vec2::new(116.0, 58.0));
    }

    #[test]
    fn touching_boxes_do_not_collide() {
        let a = actor_with_box(0.0, 0.0, 32.0, 32.0);
        let b = actor_with_box(32.0, 0.0, 32.0, 32.0);
        assert!(!a.collides_with(&b));
        let c = actor_with_box(31.0, 0.0, 32.0, 32.0);
        assert!(a.collides_with(&c));
    }

    #[test]
    fn rotate_quarter_turn() {
        let v = rotate(Vec2::new(1.0, 0.0), std::f32::consts::FRAC_PI_2);
        assert!((v.x - 0.0).abs() < 1e-6);
        assert!((v.y - 1.0).abs() < 1e-6);
    }
}
