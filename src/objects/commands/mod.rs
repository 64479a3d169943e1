pub mod animation_cmds;
pub mod audio_cmds;
pub mod camera_cmds;
pub mod entity_cmds;
pub mod flow;
pub mod input_cmds;
pub mod level_cmds;
pub mod motion;
pub mod observe;
pub mod player_cmds;
pub mod text_cmds;
pub mod transform;

use bevy::prelude::*;

use crate::level::{DrawOp, Level};
use crate::objects::entity::ObjectInstance;
use crate::objects::expression::{EvalEnv, Expr, Host};
use crate::player::Player;

/// Whether the rest of the chain runs this frame. `Halt` is the
/// "do not forward" of the original decorator pattern: a state switch or a
/// `destroy` cuts the command list short.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Flow {
    Continue,
    Halt,
}

/// One command of a state's chain. Commands execute in declaration order;
/// most perform their effect and continue.
pub trait Command: Send + Sync {
    fn update(&mut self, cx: &mut Cx) -> Flow;

    fn render(&self, rx: &mut RenderCx) {
        let _ = rx;
    }
}

pub type CommandChain = Vec<Box<dyn Command>>;

/// Runs a detached chain until a command halts it.
pub fn run_chain(chain: &mut CommandChain, cx: &mut Cx) -> Flow {
    for command in chain.iter_mut() {
        if command.update(cx) == Flow::Halt {
            return Flow::Halt;
        }
    }
    Flow::Continue
}

/// Update context of one command: the ticking entity (detached from the
/// pool) and the rest of the level. Rebuilding the expression environment
/// from these on every evaluation keeps the target-object binding correct
/// across nested ticks.
pub struct Cx<'a> {
    pub dt: f32,
    pub ent: &'a mut ObjectInstance,
    pub level: &'a mut Level,
}

impl Cx<'_> {
    pub fn eval(&mut self, expr: &Expr) -> f32 {
        let Level {
            globals,
            arrays,
            rng,
            team,
            active_player,
            score,
            lives,
            collectibles,
            time,
            camera,
            ..
        } = &mut *self.level;
        let observed = self
            .ent
            .observed_player
            .unwrap_or(*active_player)
            .min(team.len().saturating_sub(1));
        let player = &team[observed];
        let mut env = EvalEnv {
            locals: &mut self.ent.vm.symbols,
            globals,
            arrays,
            rng,
            host: Host {
                actor: &self.ent.actor,
                player,
                dt: self.dt,
                time: *time,
                zindex: self.ent.zindex,
                score: *score,
                lives: *lives,
                collectibles: *collectibles,
                screen: camera.screen,
                team_size: team.len(),
            },
        };
        expr.evaluate(&mut env)
    }

    pub fn eval_int(&mut self, expr: &Expr) -> i32 {
        self.eval(expr) as i32
    }

    /// Index of the player this entity observes (the active player when it
    /// observes nobody in particular).
    pub fn observed_index(&self) -> usize {
        self.ent
            .observed_player
            .unwrap_or(self.level.active_player)
            .min(self.level.team.len().saturating_sub(1))
    }

    pub fn observed(&self) -> &Player {
        &self.level.team[self.observed_index()]
    }

    pub fn observed_mut(&mut self) -> &mut Player {
        let index = self.observed_index();
        &mut self.level.team[index]
    }
}

/// Render context: camera already chosen per the entity's flags, draw ops
/// accumulated for the platform layer.
pub struct RenderCx<'a> {
    pub camera: Vec2,
    pub editor: bool,
    pub ent: &'a ObjectInstance,
    pub level: &'a Level,
    pub out: &'a mut Vec<DrawOp>,
}

impl RenderCx<'_> {
    /// World → screen for the camera this entity renders with.
    pub fn project(&self, world: Vec2) -> Vec2 {
        world - self.camera + self.level.camera.screen / 2.0
    }
}
