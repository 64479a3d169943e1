use bevy::prelude::*;

use crate::actor::rects_overlap;

/// How a brick interacts with moving things. `Passable` bricks are scenery,
/// `Cloud` bricks only push back from above, `Obstacle` bricks are solid.
#[derive(Clone, Copy, PartialEq, Eq, Debug, serde::Serialize, serde::Deserialize)]
pub enum BrickKind {
    Passable,
    Cloud,
    Obstacle,
}

impl BrickKind {
    pub fn is_solid(self) -> bool {
        self == BrickKind::Obstacle
    }

    /// Anything a sensor can rest on or bump into.
    pub fn blocks(self) -> bool {
        self != BrickKind::Passable
    }
}

/// Axis-aligned brick. The collision mask of the original engine reduces to
/// the brick's rectangle here.
#[derive(Clone, Copy, Debug)]
pub struct Brick {
    pub position: Vec2,
    pub size: Vec2,
    pub kind: BrickKind,
}

impl Brick {
    pub fn new(x: f32, y: f32, w: f32, h: f32, kind: BrickKind) -> Self {
        Self {
            position: Vec2::new(x, y),
            size: Vec2::new(w, h),
            kind,
        }
    }

    pub fn aabb(&self) -> Rect {
        Rect::from_corners(self.position, self.position + self.size)
    }

    pub fn left(&self) -> f32 {
        self.position.x
    }

    pub fn right(&self) -> f32 {
        self.position.x + self.size.x
    }

    pub fn top(&self) -> f32 {
        self.position.y
    }

    pub fn bottom(&self) -> f32 {
        self.position.y + self.size.y
    }

    /// Half-open point containment, so a box snapped flush against a brick
    /// edge is no longer "inside" it.
    pub fn contains(&self, point: Vec2) -> bool {
        point.x >= self.left()
            && point.x < self.right()
            && point.y >= self.top()
            && point.y < self.bottom()
    }

    pub fn overlaps(&self, rect: Rect) -> bool {
        rects_overlap(self.aabb(), rect)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn containment_is_half_open() {
        let brick = Brick::new(0.0, 0.0, 16.0, 16.0, BrickKind::Obstacle);
        assert!(brick.contains(Vec2::new(0.0, 0.0)));
        assert!(brick.contains(Vec2::new(15.9, 15.9)));
        assert!(!brick.contains(Vec2::new(16.0, 8.0)));
        assert!(!brick.contains(Vec2::new(8.0, 16.0)));
    }

    #[test]
    fn kind_predicates() {
        assert!(BrickKind::Obstacle.is_solid());
        assert!(!BrickKind::Cloud.is_solid());
        assert!(BrickKind::Cloud.blocks());
        assert!(!BrickKind::Passable.blocks());
    }
}
