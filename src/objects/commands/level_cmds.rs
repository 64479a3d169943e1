use crate::level::LevelRequest;
use crate::objects::commands::{Command, Cx, Flow};
use crate::objects::expression::Expr;

pub struct AddToScore {
    pub amount: Expr,
}

impl Command for AddToScore {
    fn update(&mut self, cx: &mut Cx) -> Flow {
        let amount = cx.eval_int(&self.amount);
        cx.level.add_to_score(amount);
        Flow::Continue
    }
}

pub struct AddLives {
    pub amount: Expr,
}

impl Command for AddLives {
    fn update(&mut self, cx: &mut Cx) -> Flow {
        let amount = cx.eval_int(&self.amount);
        cx.level.lives += amount;
        Flow::Continue
    }
}

pub struct AddCollectibles {
    pub amount: Expr,
}

impl Command for AddCollectibles {
    fn update(&mut self, cx: &mut Cx) -> Flow {
        let amount = cx.eval_int(&self.amount);
        cx.level.collectibles = (cx.level.collectibles + amount).max(0);
        Flow::Continue
    }
}

pub struct ClearLevel;

impl Command for ClearLevel {
    fn update(&mut self, cx: &mut Cx) -> Flow {
        cx.level.clear_level();
        Flow::Continue
    }
}

pub struct RestartLevel;

impl Command for RestartLevel {
    fn update(&mut self, cx: &mut Cx) -> Flow {
        cx.level.request(LevelRequest::Restart);
        Flow::Continue
    }
}

pub struct NextLevel;

impl Command for NextLevel {
    fn update(&mut self, cx: &mut Cx) -> Flow {
        cx.level.request(LevelRequest::NextLevel);
        Flow::Continue
    }
}

pub struct LoadLevel {
    pub path: String,
}

impl Command for LoadLevel {
    fn update(&mut self, cx: &mut Cx) -> Flow {
        cx.level.request(LevelRequest::LoadLevel(self.path.clone()));
        Flow::Continue
    }
}

pub struct AskToLeave;

impl Command for AskToLeave {
    fn update(&mut self, cx: &mut Cx) -> Flow {
        cx.level.request(LevelRequest::AskToLeave);
        Flow::Continue
    }
}

pub struct Pause;

impl Command for Pause {
    fn update(&mut self, cx: &mut Cx) -> Flow {
        cx.level.request(LevelRequest::Pause);
        Flow::Continue
    }
}

pub struct PushQuest {
    pub path: String,
}

impl Command for PushQuest {
    fn update(&mut self, cx: &mut Cx) -> Flow {
        cx.level.push_quest(&self.path);
        Flow::Continue
    }
}

pub struct PopQuest;

impl Command for PopQuest {
    fn update(&mut self, cx: &mut Cx) -> Flow {
        cx.level.pop_quest();
        Flow::Continue
    }
}

/// Persists the level. Children spawned at runtime by this object belong to
/// it logically, so they are temporarily marked as editor objects for the
/// snapshot and restored right after.
pub struct SaveLevel;

impl Command for SaveLevel {
    fn update(&mut self, cx: &mut Cx) -> Flow {
        let descendants = cx.level.pool.descendants_of(cx.ent.id, &cx.ent.children);
        let mut saved_flags = Vec::with_capacity(descendants.len());
        for id in &descendants {
            if let Some(child) = cx.level.pool.get_mut(*id) {
                saved_flags.push(child.created_from_editor);
                child.created_from_editor = true;
            } else {
                saved_flags.push(false);
            }
        }
        let self_flag = cx.ent.created_from_editor;
        cx.ent.created_from_editor = true;

        cx.level.persist(Some(cx.ent));

        cx.ent.created_from_editor = self_flag;
        for (id, flag) in descendants.iter().zip(saved_flags) {
            if let Some(child) = cx.level.pool.get_mut(*id) {
                child.created_from_editor = flag;
            }
        }
        Flow::Continue
    }
}

/// Wipes the global symbol table and every script array.
pub struct ResetGlobals;

impl Command for ResetGlobals {
    fn update(&mut self, cx: &mut Cx) -> Flow {
        cx.level.globals.clear();
        cx.level.arrays.clear();
        Flow::Continue
    }
}

pub struct ShowDialogBox {
    pub title: String,
    pub message: String,
}

impl Command for ShowDialogBox {
    fn update(&mut self, cx: &mut Cx) -> Flow {
        cx.level.call_dialogbox(&self.title, &self.message);
        Flow::Continue
    }
}

pub struct HideDialogBox;

impl Command for HideDialogBox {
    fn update(&mut self, cx: &mut Cx) -> Flow {
        cx.level.hide_dialogbox();
        Flow::Continue
    }
}

pub struct LaunchUrl {
    pub url: String,
}

impl Command for LaunchUrl {
    fn update(&mut self, cx: &mut Cx) -> Flow {
        cx.level.request(LevelRequest::LaunchUrl(self.url.clone()));
        Flow::Continue
    }
}
