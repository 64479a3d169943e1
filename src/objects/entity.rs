use bevy::prelude::*;

use crate::actor::Actor;
use crate::components::{Lifecycle, ObjectId, PlayerIndex};
use crate::objects::catalog::ROOT_CATEGORY;
use crate::objects::vm::ObjectVm;

/// A scripted game-world object: an actor driven by a per-object state
/// machine, wired into the level's parent/child forest.
pub struct ObjectInstance {
    pub id: ObjectId,
    pub name: String,
    pub lifecycle: Lifecycle,
    pub actor: Actor,
    pub vm: ObjectVm,
    pub annotation: String,
    pub categories: Vec<String>,
    pub zindex: f32,
    pub obstacle: bool,
    pub obstacle_angle: f32,
    pub always_active: bool,
    pub hide_unless_in_editor_mode: bool,
    pub detach_from_camera: bool,
    pub preserve: bool,
    pub created_from_editor: bool,
    pub attached_to_player: bool,
    pub attached_to_player_offset: Vec2,
    pub parent: Option<ObjectId>,
    /// Insertion-ordered name → child association. A child appears in
    /// exactly one parent's list.
    pub children: Vec<(String, ObjectId)>,
    /// `None` observes whichever player is currently active.
    pub observed_player: Option<PlayerIndex>,
}

impl std::fmt::Debug for ObjectInstance {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ObjectInstance")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("lifecycle", &self.lifecycle)
            .field("categories", &self.categories)
            .field("zindex", &self.zindex)
            .field("obstacle", &self.obstacle)
            .field("always_active", &self.always_active)
            .field("parent", &self.parent)
            .field("children", &self.children)
            .field("observed_player", &self.observed_player)
            .finish_non_exhaustive()
    }
}

impl ObjectInstance {
    pub fn new(id: ObjectId, name: &str, position: Vec2) -> Self {
        Self {
            id,
            name: name.to_string(),
            lifecycle: Lifecycle::Idle,
            actor: Actor::at(position),
            vm: ObjectVm::new(),
            annotation: String::new(),
            categories: Vec::new(),
            zindex: 0.5,
            obstacle: false,
            obstacle_angle: 0.0,
            always_active: false,
            hide_unless_in_editor_mode: false,
            detach_from_camera: false,
            preserve: true,
            created_from_editor: true,
            attached_to_player: false,
            attached_to_player_offset: Vec2::ZERO,
            parent: None,
            children: Vec::new(),
            observed_player: None,
        }
    }

    pub fn is_dead(&self) -> bool {
        self.lifecycle == Lifecycle::Dead
    }

    pub fn child(&self, name: &str) -> Option<ObjectId> {
        self.children
            .iter()
            .find(|(child_name, _)| child_name == name)
            .map(|(_, id)| *id)
    }

    pub fn add_child(&mut self, name: &str, child: ObjectId) {
        self.children.push((name.to_string(), child));
    }

    pub fn remove_child(&mut self, child: ObjectId) {
        self.children.retain(|(_, id)| *id != child);
    }

    /// Every object belongs to the root category; other tags are matched
    /// case-insensitively.
    pub fn belongs_to_category(&self, category: &str) -> bool {
        category == ROOT_CATEGORY
            || self
                .categories
                .iter()
                .any(|c| c.eq_ignore_ascii_case(category))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn instance() -> ObjectInstance {
        ObjectInstance::new(ObjectId(1), "Test", Vec2::ZERO)
    }

    #[test]
    fn creation_defaults() {
        let ent = instance();
        assert_eq!(ent.zindex, 0.5);
        assert!(ent.preserve);
        assert!(ent.created_from_editor);
        assert!(!ent.is_dead());
        assert!(ent.observed_player.is_none());
    }

    #[test]
    fn children_are_found_by_name() {
        let mut ent = instance();
        ent.add_child("left", ObjectId(2));
        ent.add_child("right", ObjectId(3));
        assert_eq!(ent.child("left"), Some(ObjectId(2)));
        assert_eq!(ent.child("missing"), None);
        ent.remove_child(ObjectId(2));
        assert_eq!(ent.child("left"), None);
        assert_eq!(ent.child("right"), Some(ObjectId(3)));
    }

    #[test]
    fn category_matching() {
        let mut ent = instance();
        ent.categories.push("Enemy".to_string());
        assert!(ent.belongs_to_category("*"));
        assert!(ent.belongs_to_category("enemy"));
        assert!(!ent.belongs_to_category("pickup"));
    }
}
