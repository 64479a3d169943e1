use crate::components::fatal;
use crate::objects::commands::{Command, Cx, Flow};
use crate::objects::expression::Expr;

/// Keeps the actor on the given animation, hot-swapping whenever the
/// evaluated id changes.
pub struct SetAnimation {
    pub sprite: String,
    pub anim_id: Expr,
}

impl Command for SetAnimation {
    fn update(&mut self, cx: &mut Cx) -> Flow {
        let anim_id = cx.eval(&self.anim_id).max(0.0) as u32;
        let cursor = &cx.ent.actor.anim;
        if cursor.sprite != self.sprite || cursor.anim_id != anim_id {
            match cx.level.sprites.animation(&self.sprite, anim_id) {
                Some(def) => {
                    let def = def.clone();
                    cx.ent.actor.anim.change(&self.sprite, anim_id, &def);
                }
                None => fatal(&format!(
                    "can't find animation {anim_id} of sprite \"{}\"",
                    self.sprite
                )),
            }
        }
        Flow::Continue
    }
}

pub struct SetAnimationFrame {
    pub frame: Expr,
}

impl Command for SetAnimationFrame {
    fn update(&mut self, cx: &mut Cx) -> Flow {
        let frame = cx.eval(&self.frame).max(0.0) as u32;
        cx.ent.actor.anim.set_frame(frame);
        Flow::Continue
    }
}

pub struct SetAnimationSpeedFactor {
    pub factor: Expr,
}

impl Command for SetAnimationSpeedFactor {
    fn update(&mut self, cx: &mut Cx) -> Flow {
        cx.ent.actor.anim.speed_factor = cx.eval(&self.factor);
        Flow::Continue
    }
}
