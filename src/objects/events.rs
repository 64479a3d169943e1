use bevy::prelude::*;
use rand::Rng;

use crate::camera::CameraFocus;
use crate::components::fatal;
use crate::input::Button;
use crate::objects::commands::{Command, Cx, Flow};
use crate::objects::expression::Expr;
use crate::player::{Player, ShieldKind};
use crate::sensors::{actor_sensors, Sensors};

/// Predicate bound to a target state. When it fires, the entity switches
/// state and the rest of the chain is skipped for this frame.
pub trait EventStrategy: Send + Sync {
    fn should_trigger(&mut self, cx: &mut Cx) -> bool;
}

pub struct OnEvent {
    pub strategy: Box<dyn EventStrategy>,
    pub new_state: String,
}

impl Command for OnEvent {
    fn update(&mut self, cx: &mut Cx) -> Flow {
        if self.strategy.should_trigger(cx) {
            if let Err(e) = cx.ent.vm.set_current_state(&self.new_state) {
                fatal(&format!("object \"{}\": {e}", cx.ent.name));
            }
            Flow::Halt
        } else {
            Flow::Continue
        }
    }
}

pub struct OnAlways;

impl EventStrategy for OnAlways {
    fn should_trigger(&mut self, _cx: &mut Cx) -> bool {
        true
    }
}

/// Fires once the accumulated time reaches the timeout, then starts over.
pub struct OnTimeout {
    pub timeout: Expr,
    pub timer: f32,
}

impl EventStrategy for OnTimeout {
    fn should_trigger(&mut self, cx: &mut Cx) -> bool {
        let timeout = cx.eval(&self.timeout);
        self.timer += cx.dt;
        if self.timer >= timeout {
            self.timer = 0.0;
            return true;
        }
        false
    }
}

/// Fires when any live object with the given name overlaps this one.
pub struct OnCollision {
    pub target_name: String,
}

impl EventStrategy for OnCollision {
    fn should_trigger(&mut self, cx: &mut Cx) -> bool {
        cx.level.pool.iter().any(|other| {
            !other.is_dead()
                && other.name.eq_ignore_ascii_case(&self.target_name)
                && other.actor.collides_with(&cx.ent.actor)
        })
    }
}

pub struct OnAnimationFinished;

impl EventStrategy for OnAnimationFinished {
    fn should_trigger(&mut self, cx: &mut Cx) -> bool {
        cx.ent.actor.anim.finished()
    }
}

const RANDOM_DENOMINATOR: f32 = 100000.0;

pub struct OnRandomEvent {
    pub probability: Expr,
}

impl EventStrategy for OnRandomEvent {
    fn should_trigger(&mut self, cx: &mut Cx) -> bool {
        let probability = cx.eval(&self.probability).clamp(0.0, 1.0);
        let draw = cx.level.rng.gen::<f32>() * RANDOM_DENOMINATOR;
        draw < RANDOM_DENOMINATOR * probability
    }
}

pub struct OnLevelCleared;

impl EventStrategy for OnLevelCleared {
    fn should_trigger(&mut self, cx: &mut Cx) -> bool {
        cx.level.cleared
    }
}

pub struct OnPlayerCollision;

impl EventStrategy for OnPlayerCollision {
    fn should_trigger(&mut self, cx: &mut Cx) -> bool {
        cx.observed().actor.collides_with(&cx.ent.actor)
    }
}

pub struct OnPlayerAttack;

impl EventStrategy for OnPlayerAttack {
    fn should_trigger(&mut self, cx: &mut Cx) -> bool {
        let player = cx.observed();
        player.is_attacking() && player.actor.collides_with(&cx.ent.actor)
    }
}

/// Bounding box in self-local coordinates against the observed player's
/// actor box; dying players don't trigger it.
pub struct OnPlayerRectCollision {
    pub x1: Expr,
    pub y1: Expr,
    pub x2: Expr,
    pub y2: Expr,
    pub validated: bool,
}

impl EventStrategy for OnPlayerRectCollision {
    fn should_trigger(&mut self, cx: &mut Cx) -> bool {
        let x1 = cx.eval(&self.x1);
        let y1 = cx.eval(&self.y1);
        let x2 = cx.eval(&self.x2);
        let y2 = cx.eval(&self.y2);
        if !self.validated {
            if x2 <= x1 || y2 <= y1 {
                fatal(&format!(
                    "object \"{}\": on_player_rect_collision needs x2 > x1 and y2 > y1",
                    cx.ent.name
                ));
            }
            self.validated = true;
        }

        let origin = cx.ent.actor.position;
        let rect = Rect::from_corners(origin + Vec2::new(x1, y1), origin + Vec2::new(x2, y2));
        let player = cx.observed();
        if player.is_dying() {
            return false;
        }
        let player_box = player.actor.aabb();
        crate::actor::rects_overlap(rect, player_box)
    }
}

pub struct OnObservedPlayer {
    pub name: String,
}

impl EventStrategy for OnObservedPlayer {
    fn should_trigger(&mut self, cx: &mut Cx) -> bool {
        cx.observed().name.eq_ignore_ascii_case(&self.name)
    }
}

/// The whole `on_player_<verb>` family: one strategy, many predicates.
pub struct OnPlayerEvent {
    pub predicate: fn(&Player) -> bool,
}

impl EventStrategy for OnPlayerEvent {
    fn should_trigger(&mut self, cx: &mut Cx) -> bool {
        (self.predicate)(cx.observed())
    }
}

pub struct OnPlayerShield {
    pub shield: ShieldKind,
}

impl EventStrategy for OnPlayerShield {
    fn should_trigger(&mut self, cx: &mut Cx) -> bool {
        cx.observed().shield == self.shield
    }
}

#[derive(Clone, Copy)]
pub enum BrickSide {
    Any,
    Floor,
    Ceiling,
    LeftWall,
    RightWall,
}

/// Sensor-driven brick events. Floors count any blocking brick (clouds
/// included); ceilings and walls only count solid obstacles.
pub struct OnBrickCollision {
    pub side: BrickSide,
}

impl OnBrickCollision {
    fn solid(cx: &Cx, slot: Option<usize>) -> bool {
        slot.map(|i| cx.level.active_bricks[i].kind.is_solid())
            .unwrap_or(false)
    }

    fn floor(sensors: &Sensors) -> bool {
        sensors.downleft.is_some() || sensors.down.is_some() || sensors.downright.is_some()
    }
}

impl EventStrategy for OnBrickCollision {
    fn should_trigger(&mut self, cx: &mut Cx) -> bool {
        let sensors = actor_sensors(&cx.ent.actor, &cx.level.active_bricks);
        match self.side {
            BrickSide::Floor => Self::floor(&sensors),
            BrickSide::Ceiling => {
                Self::solid(cx, sensors.upleft)
                    || Self::solid(cx, sensors.up)
                    || Self::solid(cx, sensors.upright)
            }
            BrickSide::LeftWall => Self::solid(cx, sensors.left) || Self::solid(cx, sensors.upleft),
            BrickSide::RightWall => {
                Self::solid(cx, sensors.right) || Self::solid(cx, sensors.upright)
            }
            BrickSide::Any => {
                Self::floor(&sensors)
                    || Self::solid(cx, sensors.up)
                    || Self::solid(cx, sensors.upleft)
                    || Self::solid(cx, sensors.upright)
                    || Self::solid(cx, sensors.left)
                    || Self::solid(cx, sensors.right)
            }
        }
    }
}

#[derive(Clone, Copy)]
pub enum ButtonCheck {
    Down,
    Pressed,
    Up,
}

pub struct OnButton {
    pub button: Button,
    pub check: ButtonCheck,
}

impl EventStrategy for OnButton {
    fn should_trigger(&mut self, cx: &mut Cx) -> bool {
        let input = &cx.observed().input;
        match self.check {
            ButtonCheck::Down => input.button_down(self.button),
            ButtonCheck::Pressed => input.button_pressed(self.button),
            ButtonCheck::Up => input.button_up(self.button),
        }
    }
}

/// on_camera_focus (self's actor) / on_camera_focus_player (the observed
/// player's actor).
pub struct OnCameraFocus {
    pub player: bool,
}

impl EventStrategy for OnCameraFocus {
    fn should_trigger(&mut self, cx: &mut Cx) -> bool {
        if self.player {
            cx.level.camera.focus == CameraFocus::Player(cx.observed_index())
        } else {
            cx.level.camera.focus == CameraFocus::Object(cx.ent.id)
        }
    }
}

pub struct OnCameraLock;

impl EventStrategy for OnCameraLock {
    fn should_trigger(&mut self, cx: &mut Cx) -> bool {
        cx.level.camera.is_locked()
    }
}

pub struct OnMusicPlay;

impl EventStrategy for OnMusicPlay {
    fn should_trigger(&mut self, cx: &mut Cx) -> bool {
        cx.level.audio.music_is_playing()
    }
}
