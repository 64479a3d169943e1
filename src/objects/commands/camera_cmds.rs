use bevy::prelude::*;

use crate::camera::CameraFocus;
use crate::level::DrawOp;
use crate::objects::commands::{Command, Cx, Flow, RenderCx};
use crate::objects::expression::Expr;

/// Team members that are not the locked player can't cross this band around
/// the locked rectangle.
const LOCK_BORDER: f32 = 30.0;

pub struct RequestCameraFocus;

impl Command for RequestCameraFocus {
    fn update(&mut self, cx: &mut Cx) -> Flow {
        cx.level.camera.set_focus(CameraFocus::Object(cx.ent.id));
        Flow::Continue
    }
}

/// Returns the camera to the active player, but only if this object still
/// holds the focus.
pub struct DropCameraFocus;

impl Command for DropCameraFocus {
    fn update(&mut self, cx: &mut Cx) -> Flow {
        if cx.level.camera.focus == CameraFocus::Object(cx.ent.id) {
            let active = cx.level.active_player;
            cx.level.camera.set_focus(CameraFocus::Player(active));
        }
        Flow::Continue
    }
}

/// Confines the camera (and the observed player) to a rectangle once the
/// player walks into it.
pub struct LockCamera {
    pub x1: Expr,
    pub y1: Expr,
    pub x2: Expr,
    pub y2: Expr,
    pub has_locked_somebody: bool,
    pub last_rect: Option<(f32, f32, f32, f32)>,
}

impl Command for LockCamera {
    fn update(&mut self, cx: &mut Cx) -> Flow {
        let (mut x1, mut y1) = (cx.eval(&self.x1), cx.eval(&self.y1));
        let (mut x2, mut y2) = (cx.eval(&self.x2), cx.eval(&self.y2));
        if x1 > x2 {
            std::mem::swap(&mut x1, &mut x2);
        }
        if y1 > y2 {
            std::mem::swap(&mut y1, &mut y2);
        }
        self.last_rect = Some((x1, y1, x2, y2));

        let origin = cx.ent.actor.position;
        let rx = origin.x + x1;
        let ry = origin.y + y1;
        let rw = x2 - x1;
        let rh = y2 - y1;

        let observed = cx.observed_index();
        for index in 0..cx.level.team.len() {
            if index != observed {
                // only the observed player may enter the area
                let actor = &mut cx.level.team[index].actor;
                if actor.position.x > rx - LOCK_BORDER && actor.position.x < rx {
                    actor.position.x = rx - LOCK_BORDER;
                    actor.speed.x = 0.0;
                }
                if actor.position.x > rx + rw && actor.position.x < rx + rw + LOCK_BORDER {
                    actor.position.x = rx + rw + LOCK_BORDER;
                    actor.speed.x = 0.0;
                }
            } else {
                let inside = {
                    let p = cx.level.team[index].actor.position;
                    p.x < rx + rw && p.x + 1.0 > rx && p.y < ry + rh && p.y + 1.0 > ry
                };
                if inside {
                    self.has_locked_somebody = true;
                    cx.level.team[index].in_locked_area = true;
                    cx.level.camera.lock(rx, ry, rx + rw, ry + rh);
                }
            }
        }

        if self.has_locked_somebody {
            let player = &mut cx.level.team[observed];
            let actor = &mut player.actor;
            if actor.position.x < rx {
                actor.position.x = rx;
                actor.speed.x = actor.speed.x.max(0.0);
                player.at_some_border = true;
            }
            if actor.position.x > rx + rw {
                actor.position.x = rx + rw;
                actor.speed.x = actor.speed.x.min(0.0);
                player.at_some_border = true;
            }
            actor.position.y = actor.position.y.clamp(ry, ry + rh);
        }

        Flow::Continue
    }

    fn render(&self, rx: &mut RenderCx) {
        if !rx.editor {
            return;
        }
        if let Some((x1, y1, x2, y2)) = self.last_rect {
            let origin = rx.ent.actor.position;
            rx.out.push(DrawOp::Rect {
                min: rx.project(origin + Vec2::new(x1, y1)),
                max: rx.project(origin + Vec2::new(x2, y2)),
                color: [1.0, 0.0, 0.0, 1.0],
                zindex: f32::MAX,
            });
        }
    }
}
