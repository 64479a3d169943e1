use bevy::prelude::*;

use crate::actor::rotate;
use crate::components::fatal;
use crate::objects::commands::{Command, Cx, Flow};
use crate::objects::expression::Expr;

/// Pins the object to the observed player at a facing-relative offset.
pub struct AttachToPlayer {
    pub offset_x: Expr,
    pub offset_y: Expr,
}

impl Command for AttachToPlayer {
    fn update(&mut self, cx: &mut Cx) -> Flow {
        let offset = Vec2::new(cx.eval(&self.offset_x), cx.eval(&self.offset_y));
        let player = cx.observed();
        let facing = player.actor.direction();
        let rotated = rotate(Vec2::new(facing * offset.x, offset.y), -player.actor.angle);
        let base = player.actor.position;
        cx.ent.attached_to_player = true;
        cx.ent.attached_to_player_offset = rotated;
        cx.ent.actor.position = base + rotated;
        Flow::Continue
    }
}

pub struct BouncePlayer;

impl Command for BouncePlayer {
    fn update(&mut self, cx: &mut Cx) -> Flow {
        let source = cx.ent.actor.clone();
        cx.observed_mut().bounce(&source);
        Flow::Continue
    }
}

#[derive(Clone, Copy)]
pub enum DamageKind {
    Hit,
    Burn,
    Shock,
    Acid,
    Kill,
}

/// hit_player / burn_player / shock_player / acid_player / kill_player.
pub struct HurtPlayer {
    pub kind: DamageKind,
}

impl Command for HurtPlayer {
    fn update(&mut self, cx: &mut Cx) -> Flow {
        let index = cx.observed_index();
        let level = &mut *cx.level;
        let player = &mut level.team[index];
        match self.kind {
            DamageKind::Hit => player.hit(&mut level.collectibles),
            DamageKind::Burn => player.burn(&mut level.collectibles),
            DamageKind::Shock => player.shock(&mut level.collectibles),
            DamageKind::Acid => player.acid(&mut level.collectibles),
            DamageKind::Kill => player.kill(),
        }
        Flow::Continue
    }
}

pub struct MovePlayer {
    pub speed_x: Expr,
    pub speed_y: Expr,
}

impl Command for MovePlayer {
    fn update(&mut self, cx: &mut Cx) -> Flow {
        let delta = Vec2::new(cx.eval(&self.speed_x), cx.eval(&self.speed_y)) * cx.dt;
        cx.observed_mut().actor.position += delta;
        Flow::Continue
    }
}

/// Places the observed player at self + offset.
pub struct SetPlayerPosition {
    pub offset_x: Expr,
    pub offset_y: Expr,
}

impl Command for SetPlayerPosition {
    fn update(&mut self, cx: &mut Cx) -> Flow {
        let offset = Vec2::new(cx.eval(&self.offset_x), cx.eval(&self.offset_y));
        let base = cx.ent.actor.position;
        cx.observed_mut().actor.position = base + offset;
        Flow::Continue
    }
}

#[derive(Clone, Copy)]
pub enum SpeedAxis {
    X,
    Y,
}

pub struct SetPlayerSpeed {
    pub axis: SpeedAxis,
    pub value: Expr,
}

impl Command for SetPlayerSpeed {
    fn update(&mut self, cx: &mut Cx) -> Flow {
        let value = cx.eval(&self.value);
        let player = cx.observed_mut();
        match self.axis {
            SpeedAxis::X => player.actor.speed.x = value,
            SpeedAxis::Y => player.actor.speed.y = value,
        }
        Flow::Continue
    }
}

pub struct SetPlayerAnimation {
    pub sprite: String,
    pub anim_id: Expr,
}

impl Command for SetPlayerAnimation {
    fn update(&mut self, cx: &mut Cx) -> Flow {
        let anim_id = cx.eval(&self.anim_id).max(0.0) as u32;
        let sprite = self.sprite.clone();
        cx.observed_mut().override_animation(&sprite, anim_id);
        Flow::Continue
    }
}

pub struct SetPlayerInputmap {
    pub name: String,
}

impl Command for SetPlayerInputmap {
    fn update(&mut self, cx: &mut Cx) -> Flow {
        let name = self.name.clone();
        cx.observed_mut().input.change_mapping(&name);
        Flow::Continue
    }
}

/// Switches the active character, subject to the usual safety conditions
/// unless forced. Denied switches just play the deny sample.
pub struct SwitchCharacter {
    /// Empty in the script means "the observed player".
    pub name: Option<String>,
    pub force: bool,
}

impl Command for SwitchCharacter {
    fn update(&mut self, cx: &mut Cx) -> Flow {
        let target = match &self.name {
            Some(name) => {
                match cx
                    .level
                    .team
                    .iter()
                    .position(|p| p.name.eq_ignore_ascii_case(name))
                {
                    Some(index) => index,
                    None => fatal(&format!(
                        "can't switch character: player '{name}' does not exist"
                    )),
                }
            }
            None => cx.observed_index(),
        };

        let level = &mut *cx.level;
        let someone_dying = level.team.iter().any(|p| p.is_dying());
        let active = &level.team[level.active_player];
        let allowed = !someone_dying
            && !level.cleared
            && !active.is_in_the_air()
            && !active.on_movable_platform
            && !active.disable_movement
            && !active.in_locked_area;

        if allowed || self.force {
            level.change_player(target);
        } else {
            level.audio.play_sample("deny", 1.0, 0.0, 1.0);
        }
        Flow::Continue
    }
}

/// enable_player_movement / disable_player_movement.
pub struct PlayerMovement {
    pub enabled: bool,
}

impl Command for PlayerMovement {
    fn update(&mut self, cx: &mut Cx) -> Flow {
        let enabled = self.enabled;
        let player = cx.observed_mut();
        player.disable_movement = !enabled;
        if !enabled {
            player.actor.speed = Vec2::ZERO;
        }
        Flow::Continue
    }
}

#[derive(Clone, Copy)]
pub enum PlayerActionKind {
    Spring,
    Roll,
    EnableRoll,
    DisableRoll,
    Strong,
    Weak,
    EnterWater,
    LeaveWater,
    Breathe,
    Drown,
    ResetUnderwaterTimer,
}

/// The one-shot player pokes: springfy, roll, strength and water ops.
pub struct PlayerAction {
    pub kind: PlayerActionKind,
}

impl Command for PlayerAction {
    fn update(&mut self, cx: &mut Cx) -> Flow {
        let player = cx.observed_mut();
        match self.kind {
            PlayerActionKind::Spring => player.spring(),
            PlayerActionKind::Roll => player.roll(),
            PlayerActionKind::EnableRoll => player.roll_enabled = true,
            PlayerActionKind::DisableRoll => player.roll_enabled = false,
            PlayerActionKind::Strong => player.strong = true,
            PlayerActionKind::Weak => player.strong = false,
            PlayerActionKind::EnterWater => player.enter_water(),
            PlayerActionKind::LeaveWater => player.leave_water(),
            PlayerActionKind::Breathe => player.breathe(),
            PlayerActionKind::Drown => player.drown(),
            PlayerActionKind::ResetUnderwaterTimer => player.reset_underwater_timer(),
        }
        Flow::Continue
    }
}
