//! End-to-end scenarios: scripts from strings, in-memory levels, fixed
//! ticks.

use std::sync::Arc;

use bevy::prelude::Vec2;

use crate::animation::{AnimationDef, SpriteDef, SpriteLibrary};
use crate::brick::{Brick, BrickKind};
use crate::camera::CameraFocus;
use crate::components::GameConfig;
use crate::level::{Level, ITEM_ANIMAL, ITEM_EXPLOSION};
use crate::objects::catalog::ObjectCatalog;
use crate::player::Activity;
use crate::sensors::on_ground;
use crate::text::FontLibrary;

const DT: f32 = 1.0 / 60.0;

fn sprite_library() -> SpriteLibrary {
    let mut library = SpriteLibrary::default();
    let mut def = SpriteDef::default();
    def.animations.insert(
        0,
        AnimationDef {
            frame_count: 1,
            frame_size: (16.0, 16.0),
            ..Default::default()
        },
    );
    library.sprites.insert("SD_QUESTIONMARK".to_string(), def);
    library
}

fn build_level(source: &str) -> Level {
    let catalog = ObjectCatalog::from_sources(&[("test.obj", source)]).unwrap();
    Level::new(
        Arc::new(catalog),
        Arc::new(sprite_library()),
        Arc::new(FontLibrary::default()),
        GameConfig::default(),
    )
}

#[test]
fn enemy_defeat_rewards_and_destroys() {
    let mut level = build_level("object \"baddie\" { state \"main\" { enemy 100 } }");
    level.team[0].actor.position = Vec2::new(50.0, 50.0);
    level.team[0].activity = Activity::Rolling;
    level.create_object("baddie", Vec2::new(50.0, 50.0)).unwrap();

    level.update(DT);

    assert_eq!(level.score, 100);
    assert!(level.pool.is_empty(), "defeated enemy must be swept");
    assert!(level
        .items
        .iter()
        .any(|i| i.id == ITEM_EXPLOSION && i.position == Vec2::new(50.0, 35.0)));
    assert!(level
        .items
        .iter()
        .any(|i| i.id == ITEM_ANIMAL && i.position == Vec2::new(50.0, 50.0)));
    assert!(level.audio.sample_played_on("destroy", 1));
    assert!(level.team[0].actor.speed.y < 0.0, "player bounces off");
}

#[test]
fn enemy_hurts_a_player_that_is_not_attacking() {
    let mut level = build_level("object \"baddie\" { state \"main\" { enemy 100 } }");
    level.team[0].actor.position = Vec2::new(50.0, 50.0);
    let id = level.create_object("baddie", Vec2::new(50.0, 50.0)).unwrap();

    level.update(DT);

    assert_eq!(level.score, 0);
    assert!(level.pool.get(id).is_some());
    assert!(level.team[0].is_dying(), "no shield, no collectibles");
}

#[test]
fn observed_player_is_killed_on_contact() {
    let source = r#"
object "trap"
{
    state "main"
    {
        observe_player "Tails"
        on_player_collision "die"
    }
    state "die"
    {
        kill_player
        destroy
    }
}
"#;
    let mut level = build_level(source).with_team(&["Surge", "Tails"]);
    level.team[0].actor.position = Vec2::new(1000.0, 0.0);
    level.team[1].actor.position = Vec2::new(4.0, 4.0);
    level.create_object("trap", Vec2::ZERO).unwrap();

    level.update(DT); // observe + event fires
    level.update(DT); // die state runs

    assert!(level.team[1].is_dying());
    assert!(!level.team[0].is_dying());
    assert!(level.pool.is_empty());
}

#[test]
fn lock_camera_locks_the_observed_player() {
    let source = "object \"cage\" { state \"main\" { lock_camera 0 0 200 200 } }";
    let mut level = build_level(source).with_team(&["Surge", "Tails"]);
    level.team[0].actor.position = Vec2::new(150.0, 150.0);
    level.team[1].actor.position = Vec2::new(85.0, 150.0); // inside the border band
    level.create_object("cage", Vec2::new(100.0, 100.0)).unwrap();

    level.update(DT);

    assert!(level.camera.is_locked());
    assert!(level.team[0].in_locked_area);
    // the other team member is pushed out of the 30px border
    assert_eq!(level.team[1].actor.position.x, 70.0);
    assert_eq!(level.team[1].actor.speed.x, 0.0);
}

#[test]
fn execute_while_runs_until_condition_fails() {
    let source = r#"
object "looper"
{
    state "main"
    {
        let "$i = 0"
        execute "b" while "$i < 5"
    }
    state "b" { let "$i = $i + 1" }
}
"#;
    let mut level = build_level(source);
    let id = level.create_object("looper", Vec2::ZERO).unwrap();

    level.update(DT);

    assert_eq!(level.pool.get(id).unwrap().vm.symbols.get("i"), 5.0);
}

#[test]
fn execute_while_breaks_when_the_state_switches_underneath() {
    let source = r#"
object "breaker"
{
    state "main"
    {
        execute "b" while "1"
    }
    state "b"
    {
        let "$i = $i + 1"
        change_state "out"
    }
    state "out" { }
}
"#;
    let mut level = build_level(source);
    let id = level.create_object("breaker", Vec2::ZERO).unwrap();

    level.update(DT);

    let ent = level.pool.get(id).unwrap();
    assert_eq!(ent.vm.symbols.get("i"), 1.0, "loop exits after one pass");
    assert_eq!(ent.vm.current_state(), "out");
}

#[test]
fn execute_for_accumulates() {
    let source = r#"
object "summer"
{
    state "main"
    {
        execute "b" for "$i = 0" "$i < 3" "$i = $i + 1"
        change_state "done"
    }
    state "b" { let "$sum = $sum + $i" }
    state "done" { }
}
"#;
    let mut level = build_level(source);
    let id = level.create_object("summer", Vec2::ZERO).unwrap();

    level.update(DT);

    assert_eq!(level.pool.get(id).unwrap().vm.symbols.get("sum"), 3.0);
}

#[test]
fn timeout_chain_adds_a_life_then_dies() {
    let source = r#"
object "bonus"
{
    state "main" { on_timeout 1.0 "b" }
    state "b" { add_lives 1; destroy }
}
"#;
    let mut level = build_level(source);
    level.create_object("bonus", Vec2::ZERO).unwrap();

    level.update(0.5);
    assert_eq!(level.lives, 3);
    level.update(0.5); // timeout fires, state switches
    assert_eq!(level.lives, 3);
    level.update(0.5); // state b runs
    assert_eq!(level.lives, 4);
    assert!(level.pool.is_empty());
}

#[test]
fn create_child_ticks_each_child_exactly_once() {
    let source = r#"
object "parent"
{
    state "main"
    {
        create_child "Spark" 10 0 "left"
        create_child "Spark" -10 0 "right"
        change_state "idle"
    }
    state "idle" { }
}
object "Spark"
{
    state "main"
    {
        let "$n = $n + 1"
        change_state "done"
    }
    state "done" { }
}
"#;
    let mut level = build_level(source);
    let parent_id = level.create_object("parent", Vec2::new(100.0, 0.0)).unwrap();

    level.update(DT);

    let parent = level.pool.get(parent_id).unwrap();
    let left = parent.child("left").expect("left child exists");
    let right = parent.child("right").expect("right child exists");
    for (child_id, expected_x) in [(left, 110.0), (right, 90.0)] {
        let child = level.pool.get(child_id).unwrap();
        assert_eq!(child.vm.symbols.get("n"), 1.0, "ticked exactly once");
        assert_eq!(child.actor.position.x, expected_x);
        assert_eq!(child.parent, Some(parent_id));
        assert!(!child.created_from_editor);
    }
}

#[test]
fn destroying_a_child_detaches_it_from_the_parent() {
    let source = r#"
object "parent"
{
    state "main"
    {
        create_child "mayfly" 0 0 "c"
        change_state "idle"
    }
    state "idle" { }
}
object "mayfly" { state "main" { destroy } }
"#;
    let mut level = build_level(source);
    let parent_id = level.create_object("parent", Vec2::ZERO).unwrap();

    level.update(DT);

    assert!(level.pool.get(parent_id).unwrap().children.is_empty());
    assert_eq!(level.pool.len(), 1);
}

#[test]
fn event_switch_skips_the_rest_of_the_chain() {
    let source = r#"
object "jumpy"
{
    state "main"
    {
        change_state "other"
        add_to_score 50
    }
    state "other" { }
}
"#;
    let mut level = build_level(source);
    let id = level.create_object("jumpy", Vec2::ZERO).unwrap();

    level.update(DT);

    assert_eq!(level.score, 0, "commands after a taken event must not run");
    assert_eq!(level.pool.get(id).unwrap().vm.current_state(), "other");
}

#[test]
fn destroy_halts_the_chain() {
    let source = "object \"gone\" { state \"main\" { destroy; add_to_score 50 } }";
    let mut level = build_level(source);
    level.create_object("gone", Vec2::ZERO).unwrap();

    level.update(DT);

    assert_eq!(level.score, 0);
    assert!(level.pool.is_empty());
}

#[test]
fn walk_reverses_and_snaps_at_walls() {
    let mut level = build_level("object \"patrol\" { state \"main\" { walk 120 } }");
    level.bricks = vec![
        Brick::new(-16.0, -8.0, 16.0, 32.0, BrickKind::Obstacle),
        Brick::new(16.0, -8.0, 16.0, 32.0, BrickKind::Obstacle),
    ];
    let id = level.create_object("patrol", Vec2::ZERO).unwrap();

    // the 16px actor sits in a 16px slot; whichever direction it walks it
    // must be snapped back flush every tick
    for _ in 0..3 {
        level.update(DT);
        assert_eq!(level.pool.get(id).unwrap().actor.position.x, 0.0);
    }
}

#[test]
fn gravity_sticky_keeps_a_descending_actor_grounded() {
    let mut level = build_level("object \"roller\" { state \"main\" { gravity } }");
    // floor 1px below the actor's feet, as after stepping off a small ledge
    level.bricks = vec![Brick::new(0.0, 17.0, 48.0, 16.0, BrickKind::Obstacle)];
    let id = level.create_object("roller", Vec2::new(8.0, 0.0)).unwrap();

    level.update(DT);

    let ent = level.pool.get(id).unwrap();
    assert_eq!(ent.actor.speed.y, 0.0);
    assert!(on_ground(&ent.actor, &level.active_bricks));
}

#[test]
fn attach_to_player_follows_position_and_facing() {
    let mut level = build_level("object \"orb\" { state \"main\" { attach_to_player 10 5 } }");
    level.team[0].actor.position = Vec2::new(200.0, 100.0);
    let id = level.create_object("orb", Vec2::ZERO).unwrap();

    level.update(DT);
    {
        let ent = level.pool.get(id).unwrap();
        assert!(ent.attached_to_player);
        assert_eq!(ent.actor.position, Vec2::new(210.0, 105.0));
    }

    // mirrored player flips the x offset
    level.team[0].actor.hflip = true;
    level.update(DT);
    assert_eq!(
        level.pool.get(id).unwrap().actor.position,
        Vec2::new(190.0, 105.0)
    );
}

#[test]
fn textout_publishes_tagged_length() {
    let source =
        "object \"hud\" { state \"main\" { textout menu 0 0 \"<color=red>Hi</color>\" } }";
    let mut level = build_level(source);
    level.create_object("hud", Vec2::ZERO).unwrap();

    level.update(DT);

    assert_eq!(level.globals.get("_STRLEN"), 2.0);
}

#[test]
fn textout_interpolates_variables() {
    let source = r#"
object "hud"
{
    state "main"
    {
        let "$v = 3.5"
        textout menu 0 0 "x=$v"
    }
}
"#;
    let mut level = build_level(source);
    level.create_object("hud", Vec2::ZERO).unwrap();

    level.update(DT);

    // "x=3.5" has five visible characters
    assert_eq!(level.globals.get("_STRLEN"), 5.0);
}

#[test]
fn fixed_seed_runs_are_deterministic() {
    let source = r#"
object "wanderer"
{
    state "main"
    {
        walk 60
        on_random_event 0.1 "pause"
    }
    state "pause" { on_timeout 0.1 "main" }
}
"#;
    let run = |seed: u64| {
        let catalog = ObjectCatalog::from_sources(&[("test.obj", source)]).unwrap();
        let config = GameConfig {
            rng_seed: seed,
            ..Default::default()
        };
        let mut level = Level::new(
            Arc::new(catalog),
            Arc::new(sprite_library()),
            Arc::new(FontLibrary::default()),
            config,
        );
        let id = level.create_object("wanderer", Vec2::ZERO).unwrap();
        for _ in 0..30 {
            level.update(DT);
        }
        let ent = level.pool.get(id).unwrap();
        (ent.actor.position, ent.vm.current_state().to_string())
    };

    assert_eq!(run(7), run(7));
}

#[test]
fn child_can_redirect_its_parent_on_first_tick() {
    let source = r#"
object "parent"
{
    state "main"
    {
        create_child "pinger" 0 0 "p"
        change_state "wait"
    }
    state "wait" { }
    state "pinged" { add_to_score 1 }
}
object "pinger" { state "main" { change_parent_state "pinged"; destroy } }
"#;
    let mut level = build_level(source);
    let parent_id = level.create_object("parent", Vec2::ZERO).unwrap();

    level.update(DT);

    let parent = level.pool.get(parent_id).unwrap();
    assert_eq!(parent.vm.current_state(), "pinged");
    assert_eq!(level.score, 1, "redirected parent got its forced tick");
}

#[test]
fn return_to_previous_state_goes_back() {
    let source = r#"
object "flipflop"
{
    state "main" { change_state "work" }
    state "work" { return_to_previous_state }
}
"#;
    let mut level = build_level(source);
    let id = level.create_object("flipflop", Vec2::ZERO).unwrap();

    level.update(DT);
    assert_eq!(level.pool.get(id).unwrap().vm.current_state(), "work");
    level.update(DT);
    assert_eq!(level.pool.get(id).unwrap().vm.current_state(), "main");
}

#[test]
fn simulated_button_press_fires_button_events() {
    let source = r#"
object "driver"
{
    state "main"
    {
        simulate_button_down fire1
        on_button_pressed fire1 "hit"
    }
    state "hit" { add_to_score 5; destroy }
}
"#;
    let mut level = build_level(source);
    level.create_object("driver", Vec2::ZERO).unwrap();

    level.update(DT);
    level.update(DT);

    assert_eq!(level.score, 5);
}

#[test]
fn mosquito_homes_toward_the_observed_player() {
    let mut level =
        build_level("object \"bug\" { state \"main\" { mosquito_movement 60 } }");
    level.team[0].actor.position = Vec2::new(100.0, 0.0);
    let id = level.create_object("bug", Vec2::ZERO).unwrap();

    level.update(DT);

    let x = level.pool.get(id).unwrap().actor.position.x;
    assert!((x - 1.0).abs() < 1e-4, "moved speed*dt toward the player");
}

#[test]
fn switch_character_switches_when_allowed() {
    let source =
        "object \"switcher\" { state \"main\" { switch_character \"Tails\"; destroy } }";
    let mut level = build_level(source).with_team(&["Surge", "Tails"]);
    level.create_object("switcher", Vec2::ZERO).unwrap();

    level.update(DT);

    assert_eq!(level.active_player, 1);
}

#[test]
fn switch_character_denied_in_the_air() {
    let source =
        "object \"switcher\" { state \"main\" { switch_character \"Tails\"; destroy } }";
    let mut level = build_level(source).with_team(&["Surge", "Tails"]);
    level.team[0].grounded = false;
    level.create_object("switcher", Vec2::ZERO).unwrap();

    level.update(DT);

    assert_eq!(level.active_player, 0);
    assert!(level.audio.sample_played_on("deny", 1));
}

#[test]
fn camera_focus_request_targets_the_object() {
    let source = "object \"eye\" { state \"main\" { request_camera_focus } }";
    let mut level = build_level(source);
    let id = level.create_object("eye", Vec2::new(70.0, 30.0)).unwrap();

    level.update(DT);

    assert_eq!(level.camera.focus, CameraFocus::Object(id));
    assert_eq!(level.camera.position, Vec2::new(70.0, 30.0));
}

#[test]
fn transform_commands_clamp_their_inputs() {
    let source = r#"
object "shape"
{
    state "main"
    {
        set_alpha 2
        set_scale -1 2
        set_angle 90
        set_zindex -3
    }
}
"#;
    let mut level = build_level(source);
    let id = level.create_object("shape", Vec2::ZERO).unwrap();

    level.update(DT);

    let ent = level.pool.get(id).unwrap();
    assert_eq!(ent.actor.alpha, 1.0);
    assert_eq!(ent.actor.scale, Vec2::new(0.0, 2.0));
    assert!((ent.actor.angle - std::f32::consts::FRAC_PI_2).abs() < 1e-6);
    assert_eq!(ent.zindex, -3.0);
}

#[test]
fn observe_event_pair_reacts_to_the_named_player() {
    let source = r#"
object "watcher"
{
    state "main"
    {
        observe_player "Tails"
        on_observed_player "Tails" "found"
    }
    state "found" { add_to_score 1; destroy }
}
"#;
    let mut level = build_level(source).with_team(&["Surge", "Tails"]);
    level.create_object("watcher", Vec2::ZERO).unwrap();

    level.update(DT);
    level.update(DT);

    assert_eq!(level.score, 1);
}

#[test]
#[should_panic]
fn invalid_player_rect_is_fatal() {
    let source =
        "object \"bad\" { state \"main\" { on_player_rect_collision 10 10 0 0 \"x\" } state \"x\" { } }";
    let mut level = build_level(source);
    level.create_object("bad", Vec2::ZERO).unwrap();
    level.update(DT);
}

#[test]
#[should_panic]
fn observing_a_missing_player_is_fatal() {
    let source = "object \"lost\" { state \"main\" { observe_player \"Nobody\" } }";
    let mut level = build_level(source);
    level.create_object("lost", Vec2::ZERO).unwrap();
    level.update(DT);
}

#[test]
fn reset_globals_wipes_globals_and_arrays() {
    let source = r#"
object "wiper"
{
    state "main"
    {
        let "$_mark = 7"
        let "$arr = new_array(4)"
        reset_globals
        destroy
    }
}
"#;
    let mut level = build_level(source);
    level.create_object("wiper", Vec2::ZERO).unwrap();

    level.update(DT);

    assert_eq!(level.globals.get("_mark"), 0.0);
    assert!(level.globals.is_empty());
}

#[test]
fn save_level_snapshots_runtime_children_too() {
    let source = r#"
object "saver"
{
    state "main"
    {
        create_child "prop" 5 0 "deco"
        save_level
        change_state "idle"
    }
    state "idle" { }
}
object "prop" { state "main" { } }
"#;
    let mut level = build_level(source);
    level.create_object("saver", Vec2::ZERO).unwrap();

    level.update(DT);

    let snapshot = level.snapshot.as_ref().expect("level persisted");
    // the spawned child counts as an editor object for the snapshot...
    assert_eq!(snapshot.objects.len(), 2);
    // ...but its runtime flag is restored afterwards
    let child_flags: Vec<bool> = level
        .pool
        .iter()
        .filter(|e| e.name == "prop")
        .map(|e| e.created_from_editor)
        .collect();
    assert_eq!(child_flags, vec![false]);
}
