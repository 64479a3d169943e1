use bevy::prelude::*;

use crate::objects::commands::{Command, Cx, Flow};
use crate::objects::expression::Expr;

pub struct SetAbsolutePosition {
    pub x: Expr,
    pub y: Expr,
}

impl Command for SetAbsolutePosition {
    fn update(&mut self, cx: &mut Cx) -> Flow {
        let position = Vec2::new(cx.eval(&self.x), cx.eval(&self.y));
        cx.ent.actor.position = position;
        Flow::Continue
    }
}

pub struct SetAlpha {
    pub alpha: Expr,
}

impl Command for SetAlpha {
    fn update(&mut self, cx: &mut Cx) -> Flow {
        cx.ent.actor.alpha = cx.eval(&self.alpha).clamp(0.0, 1.0);
        Flow::Continue
    }
}

pub struct SetAngle {
    pub degrees: Expr,
}

impl Command for SetAngle {
    fn update(&mut self, cx: &mut Cx) -> Flow {
        cx.ent.actor.angle = cx.eval(&self.degrees).to_radians();
        Flow::Continue
    }
}

pub struct SetScale {
    pub x: Expr,
    pub y: Expr,
}

impl Command for SetScale {
    fn update(&mut self, cx: &mut Cx) -> Flow {
        let scale = Vec2::new(cx.eval(&self.x).max(0.0), cx.eval(&self.y).max(0.0));
        cx.ent.actor.scale = scale;
        Flow::Continue
    }
}

pub struct SetZindex {
    pub zindex: Expr,
}

impl Command for SetZindex {
    fn update(&mut self, cx: &mut Cx) -> Flow {
        cx.ent.zindex = cx.eval(&self.zindex);
        Flow::Continue
    }
}

pub struct SetVisibility {
    pub visible: bool,
}

impl Command for SetVisibility {
    fn update(&mut self, cx: &mut Cx) -> Flow {
        cx.ent.actor.visible = self.visible;
        Flow::Continue
    }
}

/// look_left / look_right.
pub struct SetLook {
    pub mirrored: bool,
}

impl Command for SetLook {
    fn update(&mut self, cx: &mut Cx) -> Flow {
        cx.ent.actor.hflip = self.mirrored;
        Flow::Continue
    }
}

pub struct LookAtPlayer;

impl Command for LookAtPlayer {
    fn update(&mut self, cx: &mut Cx) -> Flow {
        let player_x = cx.observed().actor.position.x;
        cx.ent.actor.hflip = player_x < cx.ent.actor.position.x;
        Flow::Continue
    }
}

/// Faces where the object moved since last tick.
pub struct LookAtWalkingDirection {
    pub previous_x: Option<f32>,
}

impl Command for LookAtWalkingDirection {
    fn update(&mut self, cx: &mut Cx) -> Flow {
        let x = cx.ent.actor.position.x;
        if let Some(previous_x) = self.previous_x {
            if x > previous_x {
                cx.ent.actor.hflip = false;
            } else if x < previous_x {
                cx.ent.actor.hflip = true;
            }
        }
        self.previous_x = Some(x);
        Flow::Continue
    }
}
