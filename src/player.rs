use bevy::prelude::*;

use crate::actor::Actor;
use crate::input::InputState;

/// What the player character is doing right now. The character state machine
/// proper lives outside this crate; scripted objects only observe it and
/// poke the handful of reactions below.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub enum Activity {
    #[default]
    Stopped,
    Walking,
    Running,
    Jumping,
    Springing,
    Rolling,
    Pushing,
    GettingHit,
    Dying,
    Braking,
    LedgeBalancing,
    Drowning,
    Breathing,
    Ducking,
    LookingUp,
    Waiting,
    Winning,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub enum ShieldKind {
    #[default]
    None,
    Generic,
    Fire,
    Thunder,
    Water,
    Acid,
    Wind,
}

/// A playable character in the current level session.
#[derive(Clone)]
pub struct Player {
    pub name: String,
    pub actor: Actor,
    pub input: InputState,
    pub activity: Activity,
    pub shield: ShieldKind,
    pub grounded: bool,
    pub underwater: bool,
    pub breath_time: f32,
    pub invincible: bool,
    pub ultrafast: bool,
    pub strong: bool,
    pub roll_enabled: bool,
    pub disable_movement: bool,
    pub in_locked_area: bool,
    pub at_some_border: bool,
    pub on_movable_platform: bool,
    pub animation_override: Option<(String, u32)>,
}

impl Player {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            actor: Actor::default(),
            input: InputState::default(),
            activity: Activity::Stopped,
            shield: ShieldKind::None,
            grounded: true,
            underwater: false,
            breath_time: 0.0,
            invincible: false,
            ultrafast: false,
            strong: false,
            roll_enabled: true,
            disable_movement: false,
            in_locked_area: false,
            at_some_border: false,
            on_movable_platform: false,
            animation_override: None,
        }
    }

    // --- predicates, the observation surface of `on_player_*` events ---

    pub fn is_stopped(&self) -> bool {
        self.activity == Activity::Stopped
    }

    pub fn is_walking(&self) -> bool {
        self.activity == Activity::Walking
    }

    pub fn is_running(&self) -> bool {
        self.activity == Activity::Running
    }

    pub fn is_jumping(&self) -> bool {
        self.activity == Activity::Jumping
    }

    pub fn is_springing(&self) -> bool {
        self.activity == Activity::Springing
    }

    pub fn is_rolling(&self) -> bool {
        self.activity == Activity::Rolling
    }

    pub fn is_pushing(&self) -> bool {
        self.activity == Activity::Pushing
    }

    pub fn is_getting_hit(&self) -> bool {
        self.activity == Activity::GettingHit
    }

    pub fn is_dying(&self) -> bool {
        self.activity == Activity::Dying
    }

    pub fn is_braking(&self) -> bool {
        self.activity == Activity::Braking
    }

    pub fn is_at_ledge(&self) -> bool {
        self.activity == Activity::LedgeBalancing
    }

    pub fn is_drowning(&self) -> bool {
        self.activity == Activity::Drowning
    }

    pub fn is_breathing(&self) -> bool {
        self.activity == Activity::Breathing
    }

    pub fn is_ducking(&self) -> bool {
        self.activity == Activity::Ducking
    }

    pub fn is_looking_up(&self) -> bool {
        self.activity == Activity::LookingUp
    }

    pub fn is_waiting(&self) -> bool {
        self.activity == Activity::Waiting
    }

    pub fn is_winning(&self) -> bool {
        self.activity == Activity::Winning
    }

    pub fn is_in_the_air(&self) -> bool {
        !self.grounded
    }

    pub fn is_underwater(&self) -> bool {
        self.underwater
    }

    pub fn is_ultrafast(&self) -> bool {
        self.ultrafast
    }

    pub fn is_invincible(&self) -> bool {
        self.invincible
    }

    pub fn is_attacking(&self) -> bool {
        self.invincible || matches!(self.activity, Activity::Jumping | Activity::Rolling)
    }

    pub fn is_frozen(&self) -> bool {
        self.disable_movement
    }

    // --- reactions driven by scripted objects ---

    /// Plain damage. Shields absorb one hit; collectibles absorb the next;
    /// otherwise the player dies. Invincible or already-hit players shrug
    /// it off.
    pub fn hit(&mut self, collectibles: &mut i32) {
        if self.invincible || self.is_getting_hit() || self.is_dying() {
            return;
        }
        if self.shield != ShieldKind::None {
            self.shield = ShieldKind::None;
            self.activity = Activity::GettingHit;
        } else if *collectibles > 0 {
            *collectibles = 0;
            self.activity = Activity::GettingHit;
        } else {
            self.kill();
        }
    }

    pub fn burn(&mut self, collectibles: &mut i32) {
        if self.shield != ShieldKind::Fire && self.shield != ShieldKind::Water {
            self.hit(collectibles);
        }
    }

    pub fn shock(&mut self, collectibles: &mut i32) {
        if self.shield != ShieldKind::Thunder {
            self.hit(collectibles);
        }
    }

    pub fn acid(&mut self, collectibles: &mut i32) {
        if self.shield != ShieldKind::Acid {
            self.hit(collectibles);
        }
    }

    pub fn kill(&mut self) {
        if !self.is_dying() {
            self.activity = Activity::Dying;
            self.actor.speed = Vec2::new(0.0, -420.0);
        }
    }

    /// Rebound off the given actor, as when stomping an enemy.
    pub fn bounce(&mut self, source: &Actor) {
        let _ = source;
        self.actor.speed.y = -self.actor.speed.y.abs().max(180.0);
        self.grounded = false;
        if self.activity == Activity::Springing {
            self.activity = Activity::Jumping;
        }
    }

    pub fn spring(&mut self) {
        self.activity = Activity::Springing;
        self.grounded = false;
    }

    pub fn roll(&mut self) {
        self.activity = Activity::Rolling;
    }

    pub fn enter_water(&mut self) {
        self.underwater = true;
        self.breath_time = 0.0;
    }

    pub fn leave_water(&mut self) {
        self.underwater = false;
        self.breath_time = 0.0;
    }

    pub fn breathe(&mut self) {
        self.breath_time = 0.0;
        if self.underwater {
            self.activity = Activity::Breathing;
        }
    }

    pub fn drown(&mut self) {
        if self.underwater && !self.is_dying() {
            self.activity = Activity::Drowning;
        }
    }

    pub fn reset_underwater_timer(&mut self) {
        self.breath_time = 0.0;
    }

    pub fn override_animation(&mut self, sprite: &str, anim_id: u32) {
        self.animation_override = Some((sprite.to_string(), anim_id));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shield_absorbs_one_hit() {
        let mut player = Player::new("Surge");
        player.shield = ShieldKind::Generic;
        let mut collectibles = 10;
        player.hit(&mut collectibles);
        assert_eq!(player.shield, ShieldKind::None);
        assert_eq!(collectibles, 10);
        assert!(!player.is_dying());
    }

    #[test]
    fn collectibles_absorb_a_shieldless_hit() {
        let mut player = Player::new("Surge");
        let mut collectibles = 10;
        player.hit(&mut collectibles);
        assert_eq!(collectibles, 0);
        assert!(!player.is_dying());
    }

    #[test]
    fn bare_hit_kills() {
        let mut player = Player::new("Surge");
        let mut collectibles = 0;
        player.hit(&mut collectibles);
        assert!(player.is_dying());
    }

    #[test]
    fn fire_and_water_shields_block_burn() {
        for shield in [ShieldKind::Fire, ShieldKind::Water] {
            let mut player = Player::new("Surge");
            player.shield = shield;
            let mut collectibles = 0;
            player.burn(&mut collectibles);
            assert!(!player.is_dying());
            assert_eq!(player.shield, shield);
        }
        let mut player = Player::new("Surge");
        player.shield = ShieldKind::Thunder;
        let mut collectibles = 0;
        player.burn(&mut collectibles);
        assert_eq!(player.shield, ShieldKind::None);
    }

    #[test]
    fn thunder_shield_blocks_shock() {
        let mut player = Player::new("Surge");
        player.shield = ShieldKind::Thunder;
        let mut collectibles = 0;
        player.shock(&mut collectibles);
        assert_eq!(player.shield, ShieldKind::Thunder);
    }

    #[test]
    fn attacking_means_jumping_rolling_or_invincible() {
        let mut player = Player::new("Surge");
        assert!(!player.is_attacking());
        player.activity = Activity::Rolling;
        assert!(player.is_attacking());
        player.activity = Activity::Stopped;
        player.invincible = true;
        assert!(player.is_attacking());
    }

    #[test]
    fn bounce_sends_the_player_upwards() {
        let mut player = Player::new("Surge");
        player.actor.speed.y = 120.0;
        player.bounce(&Actor::default());
        assert!(player.actor.speed.y < 0.0);
        assert!(player.is_in_the_air());
    }
}
