use crate::components::fatal;
use crate::objects::commands::{Command, Cx, Flow};

/// Pins observation to a named player; fatal when no such player exists.
pub struct ObservePlayer {
    pub name: String,
}

impl Command for ObservePlayer {
    fn update(&mut self, cx: &mut Cx) -> Flow {
        match cx
            .level
            .team
            .iter()
            .position(|p| p.name.eq_ignore_ascii_case(&self.name))
        {
            Some(index) => cx.ent.observed_player = Some(index),
            None => fatal(&format!(
                "object \"{}\" can't observe player \"{}\": player does not exist",
                cx.ent.name, self.name
            )),
        }
        Flow::Continue
    }
}

/// Pins observation to whoever is active right now.
pub struct ObserveCurrentPlayer;

impl Command for ObserveCurrentPlayer {
    fn update(&mut self, cx: &mut Cx) -> Flow {
        cx.ent.observed_player = Some(cx.level.active_player);
        Flow::Continue
    }
}

/// Follows the active player, whoever that becomes.
pub struct ObserveActivePlayer;

impl Command for ObserveActivePlayer {
    fn update(&mut self, cx: &mut Cx) -> Flow {
        cx.ent.observed_player = None;
        Flow::Continue
    }
}

/// Rotates observation through the team, one player per tick.
pub struct ObserveNextPlayer;

impl Command for ObserveNextPlayer {
    fn update(&mut self, cx: &mut Cx) -> Flow {
        let next = (cx.observed_index() + 1) % cx.level.team.len();
        cx.ent.observed_player = Some(next);
        Flow::Continue
    }
}
