use bevy::prelude::*;

use crate::components::{fatal, Lifecycle};
use crate::level::{Level, ITEM_EXPLOSION};
use crate::objects::commands::{Command, Cx, Flow};
use crate::objects::expression::Expr;

/// Spawns another object at self + offset, adopts it under the given child
/// name, and ticks it once so it can run its first-frame setup.
pub struct CreateChild {
    pub object_name: String,
    pub offset_x: Expr,
    pub offset_y: Expr,
    pub child_name: String,
}

impl Command for CreateChild {
    fn update(&mut self, cx: &mut Cx) -> Flow {
        let offset = Vec2::new(cx.eval(&self.offset_x), cx.eval(&self.offset_y));
        let position = cx.ent.actor.position + offset;
        let child_id = match cx.level.create_object(&self.object_name, position) {
            Ok(id) => id,
            Err(e) => fatal(&e),
        };
        if let Some(child) = cx.level.pool.get_mut(child_id) {
            child.created_from_editor = false;
            child.parent = Some(cx.ent.id);
        }
        cx.ent.add_child(&self.child_name, child_id);
        cx.level.tick_object(child_id, cx.dt);
        Flow::Continue
    }
}

pub struct ChangeChildState {
    pub child_name: String,
    pub new_state: String,
}

impl Command for ChangeChildState {
    fn update(&mut self, cx: &mut Cx) -> Flow {
        if let Some(child_id) = cx.ent.child(&self.child_name) {
            switch_and_tick(cx, child_id, &self.new_state);
        }
        Flow::Continue
    }
}

/// Switches another object's state and ticks it once. When the target is
/// detached (it sits mid-tick somewhere up the call stack), the switch and
/// forced tick are deferred until its own tick unwinds.
fn switch_and_tick(cx: &mut Cx, target_id: crate::components::ObjectId, new_state: &str) {
    if let Some(target) = cx.level.pool.get_mut(target_id) {
        if let Err(e) = target.vm.set_current_state(new_state) {
            fatal(&format!("object \"{}\": {e}", target.name));
        }
        cx.level.tick_object(target_id, cx.dt);
    } else {
        cx.level
            .pending_state_changes
            .push((target_id, new_state.to_string()));
    }
}

pub struct ChangeParentState {
    pub new_state: String,
}

impl Command for ChangeParentState {
    fn update(&mut self, cx: &mut Cx) -> Flow {
        if let Some(parent_id) = cx.ent.parent {
            switch_and_tick(cx, parent_id, &self.new_state);
        }
        Flow::Continue
    }
}

/// Finds the nearest live object with the given name and switches its state.
pub struct ChangeClosestObjectState {
    pub object_name: String,
    pub new_state: String,
}

impl Command for ChangeClosestObjectState {
    fn update(&mut self, cx: &mut Cx) -> Flow {
        let origin = cx.ent.actor.position;
        let mut closest: Option<(crate::components::ObjectId, f32)> = None;
        for other in cx.level.pool.iter() {
            if other.is_dead() || !other.name.eq_ignore_ascii_case(&self.object_name) {
                continue;
            }
            let distance = other.actor.position.distance_squared(origin);
            if closest.map(|(_, d)| distance < d).unwrap_or(true) {
                closest = Some((other.id, distance));
            }
        }
        if let Some((target_id, _)) = closest {
            switch_and_tick(cx, target_id, &self.new_state);
        }
        Flow::Continue
    }
}

/// Marks self dead and cuts the chain; the level reclaims the object at the
/// end of the frame.
pub struct Destroy;

impl Command for Destroy {
    fn update(&mut self, cx: &mut Cx) -> Flow {
        cx.ent.lifecycle = Lifecycle::Dead;
        Flow::Halt
    }
}

/// Classic enemy behavior: hurt colliding players, or be defeated by an
/// attacking one (bounce, score, explosion, rescued animal, sfx).
pub struct Enemy {
    pub score: Expr,
}

impl Command for Enemy {
    fn update(&mut self, cx: &mut Cx) -> Flow {
        let score = cx.eval(&self.score) as i32;
        for index in 0..cx.level.team.len() {
            if !cx.level.team[index].actor.collides_with(&cx.ent.actor) {
                continue;
            }
            let attacking = {
                let player = &cx.level.team[index];
                player.is_attacking() || player.invincible
            };
            if attacking {
                let source = cx.ent.actor.clone();
                let position = cx.ent.actor.position;
                cx.level.team[index].bounce(&source);
                cx.level.add_to_score(score);
                cx.level
                    .create_item(ITEM_EXPLOSION, position + Vec2::new(0.0, -15.0));
                cx.level.create_animal(position);
                cx.level.audio.play_sample("destroy", 1.0, 0.0, 1.0);
                cx.ent.lifecycle = Lifecycle::Dead;
            } else {
                let Level {
                    team, collectibles, ..
                } = &mut *cx.level;
                team[index].hit(collectibles);
            }
        }
        Flow::Continue
    }
}

pub struct CreateItem {
    pub item_id: Expr,
    pub offset_x: Expr,
    pub offset_y: Expr,
}

impl Command for CreateItem {
    fn update(&mut self, cx: &mut Cx) -> Flow {
        let item_id = cx.eval(&self.item_id).max(0.0) as u32;
        let offset = Vec2::new(cx.eval(&self.offset_x), cx.eval(&self.offset_y));
        let position = cx.ent.actor.position + offset;
        cx.level.create_item(item_id, position);
        Flow::Continue
    }
}

/// Toggles brick-like collision for this object.
pub struct SetObstacle {
    pub obstacle: bool,
    pub angle: Expr,
}

impl Command for SetObstacle {
    fn update(&mut self, cx: &mut Cx) -> Flow {
        let angle = cx.eval(&self.angle);
        cx.ent.obstacle = self.obstacle;
        cx.ent.obstacle_angle = angle;
        Flow::Continue
    }
}
