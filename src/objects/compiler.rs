use crate::input::Button;
use crate::objects::catalog::ObjectProgram;
use crate::objects::commands::transform::{
    LookAtPlayer, LookAtWalkingDirection, SetAbsolutePosition, SetAlpha, SetAngle, SetLook,
    SetScale, SetVisibility, SetZindex,
};
use crate::objects::commands::{
    animation_cmds::{SetAnimation, SetAnimationFrame, SetAnimationSpeedFactor},
    audio_cmds::{PlayLevelMusic, PlayMusic, PlaySample, SetMusicVolume, StopSample},
    camera_cmds::{DropCameraFocus, LockCamera, RequestCameraFocus},
    entity_cmds::{
        ChangeChildState, ChangeClosestObjectState, ChangeParentState, CreateChild, CreateItem,
        Destroy, Enemy, SetObstacle,
    },
    flow::{Branch, Execute, ExecuteMode, Let, ReturnToPreviousState},
    input_cmds::SimulateButton,
    level_cmds::{
        AddCollectibles, AddLives, AddToScore, AskToLeave, ClearLevel, HideDialogBox, LaunchUrl,
        LoadLevel, NextLevel, Pause, PopQuest, PushQuest, ResetGlobals, RestartLevel, SaveLevel,
        ShowDialogBox,
    },
    motion::{BulletTrajectory, EllipticalTrajectory, Gravity, Jump, MosquitoMovement, Walk},
    observe::{ObserveActivePlayer, ObserveCurrentPlayer, ObserveNextPlayer, ObservePlayer},
    player_cmds::{
        AttachToPlayer, BouncePlayer, DamageKind, HurtPlayer, MovePlayer, PlayerAction,
        PlayerActionKind, PlayerMovement, SetPlayerAnimation, SetPlayerInputmap,
        SetPlayerPosition, SetPlayerSpeed, SpeedAxis, SwitchCharacter,
    },
    text_cmds::{TextAlign, Textout},
    Command,
};
use crate::objects::entity::ObjectInstance;
use crate::objects::events::{
    BrickSide, ButtonCheck, OnAlways, OnAnimationFinished, OnBrickCollision, OnButton,
    OnCameraFocus, OnCameraLock, OnCollision, OnEvent, OnLevelCleared, OnMusicPlay,
    OnObservedPlayer, OnPlayerAttack, OnPlayerCollision, OnPlayerEvent, OnPlayerRectCollision,
    OnPlayerShield, OnRandomEvent, OnTimeout,
};
use crate::objects::expression::Expr;
use crate::objects::script::Statement;
use crate::player::{Player, ShieldKind};

pub const ENGINE_VERSION: &str = "0.2.0";
const DEFAULT_STATE: &str = "main";

/// Compiles a parsed object program into the entity's VM: flags and
/// categories from the object-level clauses, one command chain per state,
/// `main` as the initial state.
pub fn compile(ent: &mut ObjectInstance, program: &ObjectProgram) -> Result<(), String> {
    // first pass registers states so forward references resolve
    for stmt in &program.body {
        if stmt.id.eq_ignore_ascii_case("state") {
            let name = value(stmt, 0)?;
            ent.vm
                .create_state(name)
                .map_err(|e| format!("{}: object \"{}\": {e}", stmt.location(), ent.name))?;
        }
    }

    for stmt in &program.body {
        let id = stmt.id.to_lowercase();
        match id.as_str() {
            "state" => {
                let name = value(stmt, 0)?.to_string();
                let commands = stmt
                    .params
                    .get(1)
                    .and_then(|p| p.as_block())
                    .unwrap_or(&[]);
                let mut chain = Vec::with_capacity(commands.len());
                for command in commands {
                    chain.push(compile_command(command, &ent.name)?);
                }
                let index = ent.vm.state_index(&name).unwrap();
                ent.vm.put_chain(index, chain);
            }
            "requires" => {
                let required = value(stmt, 0)?;
                if version_key(required) > version_key(ENGINE_VERSION) {
                    return Err(format!(
                        "{}: object \"{}\" requires engine {required} (this is {ENGINE_VERSION})",
                        stmt.location(),
                        ent.name
                    ));
                }
            }
            "category" => {
                ent.categories = stmt
                    .params
                    .iter()
                    .filter_map(|p| p.as_value())
                    .map(|s| s.to_string())
                    .collect();
            }
            "annotation" => {
                ent.annotation = stmt
                    .params
                    .iter()
                    .filter_map(|p| p.as_value())
                    .collect::<Vec<_>>()
                    .join(" ");
            }
            "always_active" => ent.always_active = true,
            "hide_unless_in_editor_mode" => ent.hide_unless_in_editor_mode = true,
            "detach_from_camera" => ent.detach_from_camera = true,
            other => {
                return Err(format!(
                    "{}: object \"{}\": unknown keyword '{other}'",
                    stmt.location(),
                    ent.name
                ))
            }
        }
    }

    ent.vm.reset_history();
    ent.vm.set_current_state(DEFAULT_STATE).map_err(|_| {
        format!(
            "object \"{}\" has no \"{DEFAULT_STATE}\" state ({})",
            ent.name,
            program.file
        )
    })
}

fn version_key(version: &str) -> Vec<u32> {
    version
        .split('.')
        .map(|part| part.trim().parse::<u32>().unwrap_or(0))
        .collect()
}

fn error(stmt: &Statement, message: &str) -> String {
    format!("{}: {}: {message}", stmt.location(), stmt.id)
}

fn value<'a>(stmt: &'a Statement, index: usize) -> Result<&'a str, String> {
    stmt.params
        .get(index)
        .and_then(|p| p.as_value())
        .ok_or_else(|| error(stmt, &format!("missing parameter {}", index + 1)))
}

fn value_or<'a>(stmt: &'a Statement, index: usize, default: &'a str) -> &'a str {
    stmt.params
        .get(index)
        .and_then(|p| p.as_value())
        .unwrap_or(default)
}

fn expr(stmt: &Statement, index: usize) -> Result<Expr, String> {
    let source = value(stmt, index)?;
    Expr::parse(source).map_err(|e| error(stmt, &e))
}

fn expr_or(stmt: &Statement, index: usize, default: f32) -> Result<Expr, String> {
    match stmt.params.get(index).and_then(|p| p.as_value()) {
        Some(source) => Expr::parse(source).map_err(|e| error(stmt, &e)),
        None => Ok(Expr::constant(default)),
    }
}

fn bool_param(stmt: &Statement, index: usize, default: bool) -> Result<bool, String> {
    match stmt.params.get(index).and_then(|p| p.as_value()) {
        None => Ok(default),
        Some(word) => match word.to_lowercase().as_str() {
            "true" | "1" => Ok(true),
            "false" | "0" => Ok(false),
            other => Err(error(stmt, &format!("expected true or false, got '{other}'"))),
        },
    }
}

fn arity(stmt: &Statement, min: usize, max: usize) -> Result<(), String> {
    let n = stmt.params.len();
    if n < min || n > max {
        if min == max {
            return Err(error(stmt, &format!("expects {min} parameter(s), got {n}")));
        }
        return Err(error(
            stmt,
            &format!("expects {min} to {max} parameters, got {n}"),
        ));
    }
    Ok(())
}

fn button(stmt: &Statement, index: usize) -> Result<Button, String> {
    let name = value(stmt, index)?;
    Button::from_name(name).ok_or_else(|| error(stmt, &format!("invalid button '{name}'")))
}

fn event(strategy: Box<dyn crate::objects::events::EventStrategy>, state: &str) -> Box<dyn Command> {
    Box::new(OnEvent {
        strategy,
        new_state: state.to_string(),
    })
}

fn player_event(
    stmt: &Statement,
    predicate: fn(&Player) -> bool,
) -> Result<Box<dyn Command>, String> {
    arity(stmt, 1, 1)?;
    Ok(event(
        Box::new(OnPlayerEvent { predicate }),
        value(stmt, 0)?,
    ))
}

fn shield_event(stmt: &Statement, shield: ShieldKind) -> Result<Box<dyn Command>, String> {
    arity(stmt, 1, 1)?;
    Ok(event(Box::new(OnPlayerShield { shield }), value(stmt, 0)?))
}

fn brick_event(stmt: &Statement, side: BrickSide) -> Result<Box<dyn Command>, String> {
    arity(stmt, 1, 1)?;
    Ok(event(Box::new(OnBrickCollision { side }), value(stmt, 0)?))
}

fn button_event(stmt: &Statement, check: ButtonCheck) -> Result<Box<dyn Command>, String> {
    arity(stmt, 2, 2)?;
    let button = button(stmt, 0)?;
    Ok(event(Box::new(OnButton { button, check }), value(stmt, 1)?))
}

fn textout(stmt: &Statement, align: TextAlign) -> Result<Box<dyn Command>, String> {
    arity(stmt, 4, 7)?;
    Ok(Box::new(Textout::new(
        align,
        value(stmt, 0)?.to_string(),
        expr(stmt, 1)?,
        expr(stmt, 2)?,
        value(stmt, 3)?.to_string(),
        expr_or(stmt, 4, 0.0)?,
        expr_or(stmt, 5, 0.0)?,
        expr_or(stmt, 6, f32::INFINITY)?,
    )))
}

fn player_action(stmt: &Statement, kind: PlayerActionKind) -> Result<Box<dyn Command>, String> {
    arity(stmt, 0, 0)?;
    Ok(Box::new(PlayerAction { kind }))
}

fn hurt_player(stmt: &Statement, kind: DamageKind) -> Result<Box<dyn Command>, String> {
    arity(stmt, 0, 0)?;
    Ok(Box::new(HurtPlayer { kind }))
}

/// Builds one command of a state's chain.
fn compile_command(stmt: &Statement, object_name: &str) -> Result<Box<dyn Command>, String> {
    let id = stmt.id.to_lowercase();
    Ok(match id.as_str() {
        // actor basics
        "set_animation" => {
            arity(stmt, 2, 2)?;
            Box::new(SetAnimation {
                sprite: value(stmt, 0)?.to_string(),
                anim_id: expr(stmt, 1)?,
            })
        }
        "set_animation_frame" => {
            arity(stmt, 1, 1)?;
            Box::new(SetAnimationFrame {
                frame: expr(stmt, 0)?,
            })
        }
        "set_animation_speed_factor" => {
            arity(stmt, 1, 1)?;
            Box::new(SetAnimationSpeedFactor {
                factor: expr(stmt, 0)?,
            })
        }
        "set_obstacle" => {
            arity(stmt, 1, 2)?;
            Box::new(SetObstacle {
                obstacle: bool_param(stmt, 0, false)?,
                angle: expr_or(stmt, 1, 0.0)?,
            })
        }
        "set_alpha" => {
            arity(stmt, 1, 1)?;
            Box::new(SetAlpha {
                alpha: expr(stmt, 0)?,
            })
        }
        "set_angle" => {
            arity(stmt, 1, 1)?;
            Box::new(SetAngle {
                degrees: expr(stmt, 0)?,
            })
        }
        "set_scale" => {
            arity(stmt, 2, 2)?;
            Box::new(SetScale {
                x: expr(stmt, 0)?,
                y: expr(stmt, 1)?,
            })
        }
        "set_absolute_position" => {
            arity(stmt, 2, 2)?;
            Box::new(SetAbsolutePosition {
                x: expr(stmt, 0)?,
                y: expr(stmt, 1)?,
            })
        }
        "set_zindex" => {
            arity(stmt, 1, 1)?;
            Box::new(SetZindex {
                zindex: expr(stmt, 0)?,
            })
        }
        "hide" => Box::new(SetVisibility { visible: false }),
        "show" => Box::new(SetVisibility { visible: true }),
        "enemy" => {
            arity(stmt, 1, 1)?;
            Box::new(Enemy {
                score: expr(stmt, 0)?,
            })
        }

        // movement
        "walk" => {
            arity(stmt, 1, 1)?;
            Box::new(Walk {
                speed: expr(stmt, 0)?,
                direction: None,
            })
        }
        "gravity" => {
            arity(stmt, 0, 0)?;
            Box::new(Gravity)
        }
        "jump" => {
            arity(stmt, 1, 1)?;
            Box::new(Jump {
                strength: expr(stmt, 0)?,
            })
        }
        "move" | "bullet_trajectory" => {
            arity(stmt, 2, 2)?;
            Box::new(BulletTrajectory {
                speed_x: expr(stmt, 0)?,
                speed_y: expr(stmt, 1)?,
            })
        }
        "elliptical_trajectory" => {
            arity(stmt, 4, 6)?;
            Box::new(EllipticalTrajectory {
                amplitude_x: expr(stmt, 0)?,
                amplitude_y: expr(stmt, 1)?,
                angular_speed_x: expr(stmt, 2)?,
                angular_speed_y: expr(stmt, 3)?,
                initial_phase_x: expr_or(stmt, 4, 0.0)?,
                initial_phase_y: expr_or(stmt, 5, 0.0)?,
                elapsed: 0.0,
            })
        }
        "mosquito_movement" => {
            arity(stmt, 1, 1)?;
            Box::new(MosquitoMovement {
                speed: expr(stmt, 0)?,
            })
        }
        "look_left" => Box::new(SetLook { mirrored: true }),
        "look_right" => Box::new(SetLook { mirrored: false }),
        "look_at_player" => Box::new(LookAtPlayer),
        "look_at_walking_direction" => Box::new(LookAtWalkingDirection { previous_x: None }),

        // camera
        "lock_camera" => {
            arity(stmt, 4, 4)?;
            Box::new(LockCamera {
                x1: expr(stmt, 0)?,
                y1: expr(stmt, 1)?,
                x2: expr(stmt, 2)?,
                y2: expr(stmt, 3)?,
                has_locked_somebody: false,
                last_rect: None,
            })
        }
        "request_camera_focus" => Box::new(RequestCameraFocus),
        "drop_camera_focus" => Box::new(DropCameraFocus),

        // player interaction
        "move_player" => {
            arity(stmt, 2, 2)?;
            Box::new(MovePlayer {
                speed_x: expr(stmt, 0)?,
                speed_y: expr(stmt, 1)?,
            })
        }
        "kill_player" => hurt_player(stmt, DamageKind::Kill)?,
        "hit_player" => hurt_player(stmt, DamageKind::Hit)?,
        "burn_player" => hurt_player(stmt, DamageKind::Burn)?,
        "shock_player" => hurt_player(stmt, DamageKind::Shock)?,
        "acid_player" => hurt_player(stmt, DamageKind::Acid)?,
        "add_lives" => {
            arity(stmt, 1, 1)?;
            Box::new(AddLives {
                amount: expr(stmt, 0)?,
            })
        }
        "add_rings" | "add_collectibles" => {
            arity(stmt, 1, 1)?;
            Box::new(AddCollectibles {
                amount: expr(stmt, 0)?,
            })
        }
        "add_to_score" => {
            arity(stmt, 1, 1)?;
            Box::new(AddToScore {
                amount: expr(stmt, 0)?,
            })
        }
        "set_player_animation" => {
            arity(stmt, 2, 2)?;
            Box::new(SetPlayerAnimation {
                sprite: value(stmt, 0)?.to_string(),
                anim_id: expr(stmt, 1)?,
            })
        }
        "enable_player_movement" => Box::new(PlayerMovement { enabled: true }),
        "disable_player_movement" => Box::new(PlayerMovement { enabled: false }),
        "set_player_xspeed" => {
            arity(stmt, 1, 1)?;
            Box::new(SetPlayerSpeed {
                axis: SpeedAxis::X,
                value: expr(stmt, 0)?,
            })
        }
        "set_player_yspeed" => {
            arity(stmt, 1, 1)?;
            Box::new(SetPlayerSpeed {
                axis: SpeedAxis::Y,
                value: expr(stmt, 0)?,
            })
        }
        "set_player_position" => {
            arity(stmt, 2, 2)?;
            Box::new(SetPlayerPosition {
                offset_x: expr(stmt, 0)?,
                offset_y: expr(stmt, 1)?,
            })
        }
        "set_player_inputmap" => {
            arity(stmt, 1, 1)?;
            Box::new(SetPlayerInputmap {
                name: value(stmt, 0)?.to_string(),
            })
        }
        "bounce_player" => Box::new(BouncePlayer),
        "observe_player" => {
            arity(stmt, 1, 1)?;
            Box::new(ObservePlayer {
                name: value(stmt, 0)?.to_string(),
            })
        }
        "observe_current_player" => Box::new(ObserveCurrentPlayer),
        "observe_active_player" => Box::new(ObserveActivePlayer),
        "observe_all_players" | "observe_next_player" => Box::new(ObserveNextPlayer),
        "attach_to_player" => {
            arity(stmt, 0, 2)?;
            Box::new(AttachToPlayer {
                offset_x: expr_or(stmt, 0, 0.0)?,
                offset_y: expr_or(stmt, 1, 0.0)?,
            })
        }
        "springfy_player" => player_action(stmt, PlayerActionKind::Spring)?,
        "roll_player" => player_action(stmt, PlayerActionKind::Roll)?,
        "enable_player_roll" => player_action(stmt, PlayerActionKind::EnableRoll)?,
        "disable_player_roll" => player_action(stmt, PlayerActionKind::DisableRoll)?,
        "strong_player" => player_action(stmt, PlayerActionKind::Strong)?,
        "weak_player" => player_action(stmt, PlayerActionKind::Weak)?,
        "player_enter_water" => player_action(stmt, PlayerActionKind::EnterWater)?,
        "player_leave_water" => player_action(stmt, PlayerActionKind::LeaveWater)?,
        "player_breathe" => player_action(stmt, PlayerActionKind::Breathe)?,
        "player_drown" => player_action(stmt, PlayerActionKind::Drown)?,
        "player_reset_underwater_timer" => {
            player_action(stmt, PlayerActionKind::ResetUnderwaterTimer)?
        }
        "switch_character" => {
            arity(stmt, 0, 2)?;
            let name = value_or(stmt, 0, "");
            Box::new(SwitchCharacter {
                name: if name.is_empty() {
                    None
                } else {
                    Some(name.to_string())
                },
                force: bool_param(stmt, 1, false)?,
            })
        }
        "simulate_button_down" => {
            arity(stmt, 1, 1)?;
            Box::new(SimulateButton {
                button: button(stmt, 0)?,
                down: true,
            })
        }
        "simulate_button_up" => {
            arity(stmt, 1, 1)?;
            Box::new(SimulateButton {
                button: button(stmt, 0)?,
                down: false,
            })
        }

        // entity manipulation
        "create_item" => {
            arity(stmt, 3, 3)?;
            Box::new(CreateItem {
                item_id: expr(stmt, 0)?,
                offset_x: expr(stmt, 1)?,
                offset_y: expr(stmt, 2)?,
            })
        }
        "change_closest_object_state" => {
            arity(stmt, 2, 2)?;
            Box::new(ChangeClosestObjectState {
                object_name: value(stmt, 0)?.to_string(),
                new_state: value(stmt, 1)?.to_string(),
            })
        }
        "create_child" => {
            arity(stmt, 1, 4)?;
            Box::new(CreateChild {
                object_name: value(stmt, 0)?.to_string(),
                offset_x: expr_or(stmt, 1, 0.0)?,
                offset_y: expr_or(stmt, 2, 0.0)?,
                child_name: value_or(stmt, 3, "\u{1}").to_string(),
            })
        }
        "change_child_state" => {
            arity(stmt, 2, 2)?;
            Box::new(ChangeChildState {
                child_name: value(stmt, 0)?.to_string(),
                new_state: value(stmt, 1)?.to_string(),
            })
        }
        "change_parent_state" => {
            arity(stmt, 1, 1)?;
            Box::new(ChangeParentState {
                new_state: value(stmt, 0)?.to_string(),
            })
        }
        "destroy" => {
            arity(stmt, 0, 0)?;
            Box::new(Destroy)
        }

        // text
        "textout" => textout(stmt, TextAlign::Left)?,
        "textout_centre" => textout(stmt, TextAlign::Centre)?,
        "textout_right" => textout(stmt, TextAlign::Right)?,

        // control flow
        "execute" => {
            arity(stmt, 1, 5)?;
            let state_name = value(stmt, 0)?.to_string();
            let mode = match stmt.params.len() {
                1 => ExecuteMode::Always,
                3 => {
                    let keyword = value(stmt, 1)?.to_lowercase();
                    let condition = expr(stmt, 2)?;
                    match keyword.as_str() {
                        "if" => ExecuteMode::If(condition),
                        "unless" => ExecuteMode::Unless(condition),
                        "while" => ExecuteMode::While(condition),
                        other => {
                            return Err(error(
                                stmt,
                                &format!("expected if, unless or while, got '{other}'"),
                            ))
                        }
                    }
                }
                5 => {
                    let keyword = value(stmt, 1)?.to_lowercase();
                    if keyword != "for" {
                        return Err(error(stmt, &format!("expected for, got '{keyword}'")));
                    }
                    ExecuteMode::For {
                        init: expr(stmt, 2)?,
                        condition: expr(stmt, 3)?,
                        step: expr(stmt, 4)?,
                    }
                }
                _ => return Err(error(stmt, "invalid syntax")),
            };
            Box::new(Execute { state_name, mode })
        }
        "change_state" => {
            arity(stmt, 1, 1)?;
            event(Box::new(OnAlways), value(stmt, 0)?)
        }
        "return_to_previous_state" => {
            arity(stmt, 0, 0)?;
            Box::new(ReturnToPreviousState)
        }
        "let" => {
            arity(stmt, 1, 1)?;
            Box::new(Let {
                expr: expr(stmt, 0)?,
            })
        }
        "if" => {
            arity(stmt, 2, 2)?;
            Box::new(Branch {
                condition: expr(stmt, 0)?,
                new_state: value(stmt, 1)?.to_string(),
                negate: false,
            })
        }
        "unless" => {
            arity(stmt, 2, 2)?;
            Box::new(Branch {
                condition: expr(stmt, 0)?,
                new_state: value(stmt, 1)?.to_string(),
                negate: true,
            })
        }
        "reset_globals" => {
            arity(stmt, 0, 0)?;
            Box::new(ResetGlobals)
        }

        // events
        "on_timeout" => {
            arity(stmt, 2, 2)?;
            event(
                Box::new(OnTimeout {
                    timeout: expr(stmt, 0)?,
                    timer: 0.0,
                }),
                value(stmt, 1)?,
            )
        }
        "on_collision" => {
            arity(stmt, 2, 2)?;
            event(
                Box::new(OnCollision {
                    target_name: value(stmt, 0)?.to_string(),
                }),
                value(stmt, 1)?,
            )
        }
        "on_animation_finished" => {
            arity(stmt, 1, 1)?;
            event(Box::new(OnAnimationFinished), value(stmt, 0)?)
        }
        "on_random_event" => {
            arity(stmt, 2, 2)?;
            event(
                Box::new(OnRandomEvent {
                    probability: expr(stmt, 0)?,
                }),
                value(stmt, 1)?,
            )
        }
        "on_level_cleared" => {
            arity(stmt, 1, 1)?;
            event(Box::new(OnLevelCleared), value(stmt, 0)?)
        }
        "on_player_collision" => {
            arity(stmt, 1, 1)?;
            event(Box::new(OnPlayerCollision), value(stmt, 0)?)
        }
        "on_player_attack" => {
            arity(stmt, 1, 1)?;
            event(Box::new(OnPlayerAttack), value(stmt, 0)?)
        }
        "on_player_rect_collision" => {
            arity(stmt, 5, 5)?;
            event(
                Box::new(OnPlayerRectCollision {
                    x1: expr(stmt, 0)?,
                    y1: expr(stmt, 1)?,
                    x2: expr(stmt, 2)?,
                    y2: expr(stmt, 3)?,
                    validated: false,
                }),
                value(stmt, 4)?,
            )
        }
        "on_observed_player" => {
            arity(stmt, 2, 2)?;
            event(
                Box::new(OnObservedPlayer {
                    name: value(stmt, 0)?.to_string(),
                }),
                value(stmt, 1)?,
            )
        }
        "on_player_stop" => player_event(stmt, Player::is_stopped)?,
        "on_player_walk" => player_event(stmt, Player::is_walking)?,
        "on_player_run" => player_event(stmt, Player::is_running)?,
        "on_player_jump" => player_event(stmt, Player::is_jumping)?,
        "on_player_spring" => player_event(stmt, Player::is_springing)?,
        "on_player_roll" => player_event(stmt, Player::is_rolling)?,
        "on_player_push" => player_event(stmt, Player::is_pushing)?,
        "on_player_gethit" => player_event(stmt, Player::is_getting_hit)?,
        "on_player_death" => player_event(stmt, Player::is_dying)?,
        "on_player_brake" => player_event(stmt, Player::is_braking)?,
        "on_player_ledge" => player_event(stmt, Player::is_at_ledge)?,
        "on_player_drown" => player_event(stmt, Player::is_drowning)?,
        "on_player_breathe" => player_event(stmt, Player::is_breathing)?,
        "on_player_duck" => player_event(stmt, Player::is_ducking)?,
        "on_player_lookup" => player_event(stmt, Player::is_looking_up)?,
        "on_player_wait" => player_event(stmt, Player::is_waiting)?,
        "on_player_win" => player_event(stmt, Player::is_winning)?,
        "on_player_in_the_air" => player_event(stmt, Player::is_in_the_air)?,
        "on_player_underwater" => player_event(stmt, Player::is_underwater)?,
        "on_player_speedshoes" => player_event(stmt, Player::is_ultrafast)?,
        "on_player_invincible" => player_event(stmt, Player::is_invincible)?,
        "on_no_shield" => shield_event(stmt, ShieldKind::None)?,
        "on_shield" => shield_event(stmt, ShieldKind::Generic)?,
        "on_fire_shield" => shield_event(stmt, ShieldKind::Fire)?,
        "on_thunder_shield" => shield_event(stmt, ShieldKind::Thunder)?,
        "on_water_shield" => shield_event(stmt, ShieldKind::Water)?,
        "on_acid_shield" => shield_event(stmt, ShieldKind::Acid)?,
        "on_wind_shield" => shield_event(stmt, ShieldKind::Wind)?,
        "on_brick_collision" => brick_event(stmt, BrickSide::Any)?,
        "on_floor_collision" => brick_event(stmt, BrickSide::Floor)?,
        "on_ceiling_collision" => brick_event(stmt, BrickSide::Ceiling)?,
        "on_left_wall_collision" => brick_event(stmt, BrickSide::LeftWall)?,
        "on_right_wall_collision" => brick_event(stmt, BrickSide::RightWall)?,
        "on_button_down" => button_event(stmt, ButtonCheck::Down)?,
        "on_button_pressed" => button_event(stmt, ButtonCheck::Pressed)?,
        "on_button_up" => button_event(stmt, ButtonCheck::Up)?,
        "on_camera_focus" => {
            arity(stmt, 1, 1)?;
            event(Box::new(OnCameraFocus { player: false }), value(stmt, 0)?)
        }
        "on_camera_focus_player" => {
            arity(stmt, 1, 1)?;
            event(Box::new(OnCameraFocus { player: true }), value(stmt, 0)?)
        }
        "on_camera_lock" => {
            arity(stmt, 1, 1)?;
            event(Box::new(OnCameraLock), value(stmt, 0)?)
        }
        "on_music_play" => {
            arity(stmt, 1, 1)?;
            event(Box::new(OnMusicPlay), value(stmt, 0)?)
        }

        // dialogs, level and session
        "show_dialog_box" => {
            arity(stmt, 2, 2)?;
            Box::new(ShowDialogBox {
                title: value(stmt, 0)?.to_string(),
                message: value(stmt, 1)?.to_string(),
            })
        }
        "hide_dialog_box" => Box::new(HideDialogBox),
        "clear_level" => Box::new(ClearLevel),
        "next_level" => Box::new(NextLevel),
        "ask_to_leave" => Box::new(AskToLeave),
        "pause" => Box::new(Pause),
        "restart_level" => Box::new(RestartLevel),
        "save_level" => Box::new(SaveLevel),
        "load_level" => {
            arity(stmt, 1, 1)?;
            Box::new(LoadLevel {
                path: value(stmt, 0)?.to_string(),
            })
        }
        "push_quest" => {
            arity(stmt, 1, 1)?;
            Box::new(PushQuest {
                path: value(stmt, 0)?.to_string(),
            })
        }
        "pop_quest" => Box::new(PopQuest),

        // audio
        "play_sample" => {
            arity(stmt, 1, 5)?;
            Box::new(PlaySample {
                name: value(stmt, 0)?.to_string(),
                volume: expr_or(stmt, 1, 1.0)?,
                pan: expr_or(stmt, 2, 0.0)?,
                frequency: expr_or(stmt, 3, 1.0)?,
                // parameter 5 (loop) is deprecated and ignored
            })
        }
        "stop_sample" => {
            arity(stmt, 1, 1)?;
            Box::new(StopSample {
                name: value(stmt, 0)?.to_string(),
            })
        }
        "play_music" => {
            arity(stmt, 1, 2)?;
            Box::new(PlayMusic {
                name: value(stmt, 0)?.to_string(),
                looping: expr_or(stmt, 1, 1.0)?,
            })
        }
        "play_level_music" => Box::new(PlayLevelMusic),
        "set_music_volume" => {
            arity(stmt, 1, 1)?;
            Box::new(SetMusicVolume {
                volume: expr(stmt, 0)?,
            })
        }

        // misc
        "launch_url" => {
            arity(stmt, 1, 1)?;
            Box::new(LaunchUrl {
                url: value(stmt, 0)?.to_string(),
            })
        }

        other => {
            return Err(format!(
                "{}: object \"{object_name}\": unknown command '{other}'",
                stmt.location()
            ))
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::ObjectId;
    use crate::objects::catalog::ObjectCatalog;
    use bevy::prelude::Vec2;

    fn compile_source(source: &str) -> Result<ObjectInstance, String> {
        let catalog = ObjectCatalog::from_sources(&[("test.obj", source)])?;
        let program = catalog.find("test").expect("object 'test' in source");
        let mut ent = ObjectInstance::new(ObjectId(1), &program.name, Vec2::ZERO);
        compile(&mut ent, program)?;
        Ok(ent)
    }

    #[test]
    fn compiles_states_and_flags() {
        let ent = compile_source(
            r#"
object "test"
{
    requires 0.1.5
    category enemy flying
    annotation A buzzing thing
    always_active
    detach_from_camera

    state "main"
    {
        walk 60
        on_timeout 2 "rest"
    }

    state "rest"
    {
        on_timeout 1 "main"
    }
}
"#,
        )
        .unwrap();
        assert!(ent.always_active);
        assert!(ent.detach_from_camera);
        assert!(!ent.hide_unless_in_editor_mode);
        assert_eq!(ent.categories, vec!["enemy", "flying"]);
        assert_eq!(ent.annotation, "A buzzing thing");
        assert_eq!(ent.vm.current_state(), "main");
        assert!(ent.vm.state_index("rest").is_some());
    }

    #[test]
    fn missing_main_state_is_an_error() {
        let err = compile_source("object \"test\" { state \"idle\" { } }").unwrap_err();
        assert!(err.contains("main"), "{err}");
    }

    #[test]
    fn unknown_command_reports_location() {
        let err = compile_source(
            "object \"test\" { state \"main\" { frobnicate 1 2 } }",
        )
        .unwrap_err();
        assert!(err.contains("frobnicate"), "{err}");
        assert!(err.contains("test.obj:1"), "{err}");
    }

    #[test]
    fn wrong_arity_is_an_error() {
        let err = compile_source("object \"test\" { state \"main\" { set_scale 1 } }")
            .unwrap_err();
        assert!(err.contains("set_scale"), "{err}");
    }

    #[test]
    fn bad_button_name_is_an_error() {
        let err = compile_source(
            "object \"test\" { state \"main\" { on_button_down start \"x\" } }",
        )
        .unwrap_err();
        assert!(err.contains("invalid button"), "{err}");
    }

    #[test]
    fn malformed_expression_reports_location() {
        let err = compile_source(
            "object \"test\" { state \"main\" { set_alpha \"1 +\" } }",
        )
        .unwrap_err();
        assert!(err.contains("test.obj:1"), "{err}");
    }

    #[test]
    fn future_engine_requirement_is_an_error() {
        let err = compile_source("object \"test\" { requires 99.0.0 }").unwrap_err();
        assert!(err.contains("requires engine"), "{err}");
    }

    #[test]
    fn duplicate_state_is_an_error() {
        let err = compile_source(
            "object \"test\" { state \"main\" { } state \"MAIN\" { } }",
        )
        .unwrap_err();
        assert!(err.contains("redefine"), "{err}");
    }

    #[test]
    fn execute_variants_parse() {
        let ent = compile_source(
            r#"
object "test"
{
    state "main"
    {
        execute "work"
        execute "work" if "$i > 0"
        execute "work" unless "$i > 0"
        execute "work" while "$i < 5"
        execute "work" for "$i = 0" "$i < 5" "$i = $i + 1"
    }
    state "work" { let "$j = $j + 1" }
}
"#,
        )
        .unwrap();
        assert_eq!(ent.vm.current_state(), "main");
    }

    #[test]
    fn execute_with_bad_keyword_is_an_error() {
        let err = compile_source(
            "object \"test\" { state \"main\" { execute \"x\" until \"1\" } state \"x\" { } }",
        )
        .unwrap_err();
        assert!(err.contains("expected if, unless or while"), "{err}");
    }
}
