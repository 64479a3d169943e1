use bevy::prelude::*;
use rand::Rng;

use crate::objects::commands::{Command, Cx, Flow};
use crate::objects::expression::Expr;
use crate::sensors::{actor_sensors, on_ground};

/// Downward acceleration of the `gravity` command, px/s².
pub const GRAVITY_ACCEL: f32 = 0.21875 * 60.0 * 60.0;

/// How far the sticky phase of `gravity` probes for ground below, px.
const STICKY_MAX_OFFSET: i32 = 3;

/// Patrols left and right, turning at walls and platform edges.
pub struct Walk {
    pub speed: Expr,
    pub direction: Option<f32>,
}

impl Command for Walk {
    fn update(&mut self, cx: &mut Cx) -> Flow {
        let speed = cx.eval(&self.speed);
        let mut direction = match self.direction {
            Some(direction) => direction,
            None => {
                // first tick: pick a random patrol direction
                if cx.level.rng.gen_range(0..2) == 0 {
                    -1.0
                } else {
                    1.0
                }
            }
        };

        cx.ent.actor.position.x += direction * speed * cx.dt;

        let actor = &cx.ent.actor;
        let hot_spot = actor.hot_spot();
        let width = actor.size().x;
        let sensors = actor_sensors(actor, &cx.level.active_bricks);

        if let Some(index) = sensors.right {
            if direction > 0.0 {
                let brick = cx.level.active_bricks[index];
                cx.ent.actor.position.x = brick.left() + hot_spot.x - width;
                direction = -1.0;
            }
        }
        if let Some(index) = sensors.left {
            if direction < 0.0 {
                let brick = cx.level.active_bricks[index];
                cx.ent.actor.position.x = brick.right() + hot_spot.x;
                direction = 1.0;
            }
        }

        // stay on the platform
        if sensors.down.is_some() {
            if sensors.downright.is_none() && sensors.downleft.is_some() && direction > 0.0 {
                direction = -1.0;
            } else if sensors.downleft.is_none() && sensors.downright.is_some() && direction < 0.0
            {
                direction = 1.0;
            }
        }

        self.direction = Some(direction);
        Flow::Continue
    }
}

pub struct BulletTrajectory {
    pub speed_x: Expr,
    pub speed_y: Expr,
}

impl Command for BulletTrajectory {
    fn update(&mut self, cx: &mut Cx) -> Flow {
        let velocity = Vec2::new(cx.eval(&self.speed_x), cx.eval(&self.speed_y));
        cx.ent.actor.position += velocity * cx.dt;
        Flow::Continue
    }
}

/// Integrates the derivative of an ellipse around the spawn point, then
/// slides along any wall it ran into.
pub struct EllipticalTrajectory {
    pub amplitude_x: Expr,
    pub amplitude_y: Expr,
    /// Revolutions per second.
    pub angular_speed_x: Expr,
    pub angular_speed_y: Expr,
    /// Degrees.
    pub initial_phase_x: Expr,
    pub initial_phase_y: Expr,
    pub elapsed: f32,
}

impl Command for EllipticalTrajectory {
    fn update(&mut self, cx: &mut Cx) -> Flow {
        self.elapsed += cx.dt;
        let t = self.elapsed;
        let tau = 2.0 * std::f32::consts::PI;
        let amplitude_x = cx.eval(&self.amplitude_x);
        let amplitude_y = cx.eval(&self.amplitude_y);
        let angular_speed_x = cx.eval(&self.angular_speed_x) * tau;
        let angular_speed_y = cx.eval(&self.angular_speed_y) * tau;
        let phase_x = cx.eval(&self.initial_phase_x).to_radians();
        let phase_y = cx.eval(&self.initial_phase_y).to_radians();

        let velocity = Vec2::new(
            -amplitude_x * angular_speed_x * (phase_x + angular_speed_x * t).sin(),
            amplitude_y * angular_speed_y * (phase_y + angular_speed_y * t).cos(),
        );
        cx.ent.actor.position += velocity * cx.dt;

        let actor = &cx.ent.actor;
        let hot_spot = actor.hot_spot();
        let size = actor.size();
        let sensors = actor_sensors(actor, &cx.level.active_bricks);

        if velocity.x > 0.0 {
            if let Some(index) = sensors.right {
                let brick = cx.level.active_bricks[index];
                cx.ent.actor.position.x = brick.left() + hot_spot.x - size.x;
            }
        } else if velocity.x < 0.0 {
            if let Some(index) = sensors.left {
                let brick = cx.level.active_bricks[index];
                cx.ent.actor.position.x = brick.right() + hot_spot.x;
            }
        }
        if velocity.y > 0.0 {
            if let Some(index) = sensors.down {
                let brick = cx.level.active_bricks[index];
                cx.ent.actor.position.y = brick.top() + hot_spot.y - size.y;
            }
        } else if velocity.y < 0.0 {
            if let Some(index) = sensors.up {
                let brick = cx.level.active_bricks[index];
                cx.ent.actor.position.y = brick.bottom() + hot_spot.y;
            }
        }

        Flow::Continue
    }
}

/// Homes toward the observed player, stopping inside a small dead zone.
pub struct MosquitoMovement {
    pub speed: Expr,
}

impl Command for MosquitoMovement {
    fn update(&mut self, cx: &mut Cx) -> Flow {
        let speed = cx.eval(&self.speed);
        let target = cx.observed().actor.position;
        let delta = target - cx.ent.actor.position;
        if delta.length() >= 5.0 {
            cx.ent.actor.position += delta.normalize() * speed * cx.dt;
        }
        Flow::Continue
    }
}

pub struct Gravity;

impl Command for Gravity {
    fn update(&mut self, cx: &mut Cx) -> Flow {
        enum Hit {
            None,
            Floor,
            Ceiling,
        }

        let actor = &cx.ent.actor;
        let aabb = actor.aabb();
        let center_x = (aabb.min.x + aabb.max.x) / 2.0;
        let mut hit = Hit::None;

        for brick in cx.level.active_bricks.iter() {
            if !brick.kind.blocks() || !brick.overlaps(aabb) {
                continue;
            }
            if brick.kind.is_solid() && brick.contains(Vec2::new(center_x, aabb.min.y)) {
                hit = Hit::Ceiling;
                let push = brick.bottom() - aabb.min.y;
                cx.ent.actor.position.y += push;
                break;
            }
            if brick.contains(Vec2::new(center_x, aabb.max.y - 1.0)) {
                hit = Hit::Floor;
                let push = aabb.max.y - brick.top();
                cx.ent.actor.position.y -= push;
                break;
            }
        }

        match hit {
            Hit::Floor => {
                if cx.ent.actor.speed.y > 0.0 {
                    cx.ent.actor.speed.y = 0.0;
                }
            }
            Hit::Ceiling => {
                if cx.ent.actor.speed.y < 0.0 {
                    cx.ent.actor.speed.y = 0.0;
                }
            }
            Hit::None => {
                cx.ent.actor.speed.y += GRAVITY_ACCEL * cx.dt;
            }
        }

        cx.ent.actor.position.y += cx.ent.actor.speed.y * cx.dt;

        // sticky phase: re-anchor on gentle descents instead of going airborne
        if !on_ground(&cx.ent.actor, &cx.level.active_bricks) {
            for offset in 1..=STICKY_MAX_OFFSET {
                cx.ent.actor.position.y += offset as f32;
                if on_ground(&cx.ent.actor, &cx.level.active_bricks) {
                    cx.ent.actor.speed.y = 0.0;
                    break;
                }
                cx.ent.actor.position.y -= offset as f32;
            }
        }

        Flow::Continue
    }
}

pub struct Jump {
    pub strength: Expr,
}

impl Command for Jump {
    fn update(&mut self, cx: &mut Cx) -> Flow {
        let strength = cx.eval(&self.strength);
        let sensors = actor_sensors(&cx.ent.actor, &cx.level.active_bricks);
        if sensors.down.is_some() {
            cx.ent.actor.speed.y = -strength;
        }
        Flow::Continue
    }
}
