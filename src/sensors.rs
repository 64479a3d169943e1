use bevy::prelude::*;

use crate::actor::Actor;
use crate::brick::Brick;

/// The eight probe slots around an actor box. Each slot holds the index of
/// the first blocking brick found at that probe point, if any.
#[derive(Clone, Copy, Default, Debug)]
pub struct Sensors {
    pub up: Option<usize>,
    pub upright: Option<usize>,
    pub right: Option<usize>,
    pub downright: Option<usize>,
    pub down: Option<usize>,
    pub downleft: Option<usize>,
    pub left: Option<usize>,
    pub upleft: Option<usize>,
}

impl Sensors {
    pub fn any(&self) -> bool {
        self.up.is_some()
            || self.upright.is_some()
            || self.right.is_some()
            || self.downright.is_some()
            || self.down.is_some()
            || self.downleft.is_some()
            || self.left.is_some()
            || self.upleft.is_some()
    }
}

fn probe(bricks: &[Brick], point: Vec2) -> Option<usize> {
    bricks
        .iter()
        .position(|brick| brick.kind.blocks() && brick.contains(point))
}

/// Probes the eight cardinal points around the actor box. Passable bricks
/// are invisible to sensors; kind filtering beyond that (obstacle-only
/// walls, any-blocking floors) is up to the caller.
pub fn actor_sensors(actor: &Actor, bricks: &[Brick]) -> Sensors {
    let tl = actor.top_left();
    let size = actor.size();
    let left = tl.x;
    let right = tl.x + size.x;
    let top = tl.y;
    let bottom = tl.y + size.y;
    let cx = tl.x + size.x / 2.0;
    let cy = tl.y + size.y / 2.0;

    Sensors {
        up: probe(bricks, Vec2::new(cx, top - 1.0)),
        upright: probe(bricks, Vec2::new(right - 1.0, top - 1.0)),
        right: probe(bricks, Vec2::new(right, cy)),
        downright: probe(bricks, Vec2::new(right - 1.0, bottom)),
        down: probe(bricks, Vec2::new(cx, bottom)),
        downleft: probe(bricks, Vec2::new(left, bottom)),
        left: probe(bricks, Vec2::new(left - 1.0, cy)),
        upleft: probe(bricks, Vec2::new(left, top - 1.0)),
    }
}

/// True when the actor's bottom edge rests on (or inside) a blocking brick.
pub fn on_ground(actor: &Actor, bricks: &[Brick]) -> bool {
    let sensors = actor_sensors(actor, bricks);
    sensors.down.is_some() || sensors.downleft.is_some() || sensors.downright.is_some()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::animation::AnimationDef;
    use crate::brick::BrickKind;

    fn boxed_actor(x: f32, y: f32) -> Actor {
        let mut actor = Actor::at(Vec2::new(x, y));
        actor.anim.change(
            "TEST",
            0,
            &AnimationDef {
                frame_size: (16.0, 16.0),
                ..Default::default()
            },
        );
        actor
    }

    #[test]
    fn floor_is_seen_by_down_sensors() {
        let actor = boxed_actor(0.0, 0.0);
        let bricks = vec![Brick::new(-8.0, 16.0, 32.0, 16.0, BrickKind::Obstacle)];
        let sensors = actor_sensors(&actor, &bricks);
        assert!(sensors.down.is_some());
        assert!(sensors.downleft.is_some());
        assert!(sensors.downright.is_some());
        assert!(sensors.up.is_none());
        assert!(on_ground(&actor, &bricks));
    }

    #[test]
    fn wall_on_the_right_only_trips_right_probes() {
        let actor = boxed_actor(0.0, 0.0);
        let bricks = vec![Brick::new(16.0, -8.0, 16.0, 32.0, BrickKind::Obstacle)];
        let sensors = actor_sensors(&actor, &bricks);
        assert!(sensors.right.is_some());
        assert!(sensors.left.is_none());
        assert!(sensors.down.is_none());
    }

    #[test]
    fn passable_bricks_are_invisible() {
        let actor = boxed_actor(0.0, 0.0);
        let bricks = vec![Brick::new(-8.0, 16.0, 32.0, 16.0, BrickKind::Passable)];
        assert!(!actor_sensors(&actor, &bricks).any());
    }

    #[test]
    fn cloud_counts_as_ground() {
        let actor = boxed_actor(0.0, 0.0);
        let bricks = vec![Brick::new(-8.0, 16.0, 32.0, 16.0, BrickKind::Cloud)];
        assert!(on_ground(&actor, &bricks));
    }
}
