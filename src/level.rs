use std::collections::HashMap;
use std::sync::Arc;

use bevy::prelude::*;
use rand::rngs::SmallRng;
use rand::SeedableRng;

use crate::animation::SpriteLibrary;
use crate::audio::AudioBoard;
use crate::brick::{Brick, BrickKind};
use crate::camera::{CameraFocus, CameraState};
use crate::components::{GameConfig, ObjectId};
use crate::events::GameEventBus;
use crate::input::Button;
use crate::objects::catalog::ObjectCatalog;
use crate::objects::commands::{run_chain, Cx, RenderCx};
use crate::objects::compiler::compile;
use crate::objects::entity::ObjectInstance;
use crate::objects::symbols::{ArrayStore, SymbolTable};
use crate::player::Player;
use crate::text::FontLibrary;

/// Item ids the runtime spawns by itself.
pub const ITEM_EXPLOSION: u32 = 38;
pub const ITEM_ANIMAL: u32 = 39;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Item {
    pub id: u32,
    pub position: Vec2,
}

/// Session-level operations that outlive the current frame; drained by the
/// app shell after the tick.
#[derive(Clone, Debug, PartialEq)]
pub enum LevelRequest {
    LoadLevel(String),
    Restart,
    NextLevel,
    AskToLeave,
    Pause,
    LaunchUrl(String),
}

#[derive(Clone, Debug, PartialEq)]
pub struct DialogBox {
    pub title: String,
    pub message: String,
}

#[derive(Clone, Debug)]
pub struct PersistedObject {
    pub name: String,
    pub position: Vec2,
}

#[derive(Clone, Debug, Default)]
pub struct LevelSnapshot {
    pub frame: u64,
    pub objects: Vec<PersistedObject>,
}

/// Camera-space drawing primitive produced by the render pass and consumed
/// by the platform layer.
#[derive(Clone, Debug)]
pub enum DrawOp {
    Sprite {
        sprite: String,
        anim_id: u32,
        frame: u32,
        position: Vec2,
        size: Vec2,
        scale: Vec2,
        angle: f32,
        alpha: f32,
        hflip: bool,
        vflip: bool,
        zindex: f32,
    },
    Text {
        position: Vec2,
        text: String,
        font: String,
        zindex: f32,
    },
    Rect {
        min: Vec2,
        max: Vec2,
        color: [f32; 4],
        zindex: f32,
    },
}

/// The level's entity arena. Objects are addressed by id; iteration follows
/// creation order, which is also the tick order.
#[derive(Default)]
pub struct ObjectPool {
    slots: HashMap<u64, ObjectInstance>,
    order: Vec<ObjectId>,
    next_id: u64,
}

impl ObjectPool {
    pub fn allocate_id(&mut self) -> ObjectId {
        self.next_id += 1;
        ObjectId(self.next_id)
    }

    pub fn insert(&mut self, ent: ObjectInstance) {
        self.order.push(ent.id);
        self.slots.insert(ent.id.0, ent);
    }

    pub fn get(&self, id: ObjectId) -> Option<&ObjectInstance> {
        self.slots.get(&id.0)
    }

    pub fn get_mut(&mut self, id: ObjectId) -> Option<&mut ObjectInstance> {
        self.slots.get_mut(&id.0)
    }

    /// Detaches an object for its tick; `put_back` reinserts it.
    pub fn take(&mut self, id: ObjectId) -> Option<ObjectInstance> {
        self.slots.remove(&id.0)
    }

    pub fn put_back(&mut self, ent: ObjectInstance) {
        self.slots.insert(ent.id.0, ent);
    }

    pub fn remove(&mut self, id: ObjectId) -> Option<ObjectInstance> {
        self.order.retain(|other| *other != id);
        self.slots.remove(&id.0)
    }

    pub fn ids(&self) -> Vec<ObjectId> {
        self.order.clone()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ObjectInstance> {
        self.order.iter().filter_map(|id| self.slots.get(&id.0))
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Transitive children of an object whose own children list is supplied
    /// by the caller (the object itself may be detached for its tick).
    pub fn descendants_of(
        &self,
        root: ObjectId,
        children: &[(String, ObjectId)],
    ) -> Vec<ObjectId> {
        let mut out = Vec::new();
        let mut queue: Vec<ObjectId> = children.iter().map(|(_, id)| *id).collect();
        while let Some(id) = queue.pop() {
            if id == root || out.contains(&id) {
                continue;
            }
            out.push(id);
            if let Some(child) = self.get(id) {
                queue.extend(child.children.iter().map(|(_, id)| *id));
            }
        }
        out
    }
}

/// One playable level session: geometry, items, the team, the scripted
/// object pool, and the global script state. Ticked at a fixed rate; every
/// mutation happens on the main thread inside `update`.
#[derive(Resource)]
pub struct Level {
    pub config: GameConfig,
    pub time: f32,
    pub frame: u64,
    pub bricks: Vec<Brick>,
    /// `bricks` plus the synthetic bricks of obstacle objects, rebuilt at
    /// the start of every frame.
    pub active_bricks: Vec<Brick>,
    pub items: Vec<Item>,
    pub team: Vec<Player>,
    pub active_player: usize,
    pub pool: ObjectPool,
    pub globals: SymbolTable,
    pub arrays: ArrayStore,
    pub rng: SmallRng,
    pub score: i32,
    pub lives: i32,
    pub collectibles: i32,
    pub cleared: bool,
    pub camera: CameraState,
    pub audio: AudioBoard,
    pub bus: GameEventBus,
    pub dialog: Option<DialogBox>,
    pub quest_stack: Vec<String>,
    pub requests: Vec<LevelRequest>,
    /// State switches aimed at an object that is currently mid-tick higher
    /// up the call stack; applied (with the forced tick) as soon as that
    /// object's own tick unwinds.
    pub pending_state_changes: Vec<(ObjectId, String)>,
    pub snapshot: Option<LevelSnapshot>,
    pub device_held: Vec<Button>,
    pub catalog: Arc<ObjectCatalog>,
    pub sprites: Arc<SpriteLibrary>,
    pub fonts: Arc<FontLibrary>,
}

impl Level {
    pub fn new(
        catalog: Arc<ObjectCatalog>,
        sprites: Arc<SpriteLibrary>,
        fonts: Arc<FontLibrary>,
        config: GameConfig,
    ) -> Self {
        let screen = Vec2::new(config.screen_width, config.screen_height);
        let rng = SmallRng::seed_from_u64(config.rng_seed);
        Self {
            config,
            time: 0.0,
            frame: 0,
            bricks: Vec::new(),
            active_bricks: Vec::new(),
            items: Vec::new(),
            team: vec![Player::new("Surge")],
            active_player: 0,
            pool: ObjectPool::default(),
            globals: SymbolTable::default(),
            arrays: ArrayStore::default(),
            rng,
            score: 0,
            lives: 3,
            collectibles: 0,
            cleared: false,
            camera: CameraState::new(screen),
            audio: AudioBoard::default(),
            bus: GameEventBus::default(),
            dialog: None,
            quest_stack: Vec::new(),
            requests: Vec::new(),
            pending_state_changes: Vec::new(),
            snapshot: None,
            device_held: Vec::new(),
            catalog,
            sprites,
            fonts,
        }
    }

    pub fn with_team(mut self, names: &[&str]) -> Self {
        self.team = names.iter().map(|name| Player::new(name)).collect();
        self.active_player = 0;
        self
    }

    pub fn current_player(&self) -> &Player {
        &self.team[self.active_player]
    }

    pub fn change_player(&mut self, index: usize) {
        if index < self.team.len() && index != self.active_player {
            self.active_player = index;
            let name = self.team[index].name.clone();
            self.bus.emit("player_changed", serde_json::json!({ "name": name }));
        }
    }

    pub fn has_been_cleared(&self) -> bool {
        self.cleared
    }

    pub fn clear_level(&mut self) {
        if !self.cleared {
            self.cleared = true;
            self.bus.emit("level_cleared", serde_json::Value::Null);
        }
    }

    pub fn add_to_score(&mut self, amount: i32) {
        self.score += amount;
    }

    /// Spawns a scripted object: allocate, compile against the cached parse
    /// tree, insert. Fails when the name is not in the catalog or the
    /// script is broken.
    pub fn create_object(&mut self, name: &str, position: Vec2) -> Result<ObjectId, String> {
        let program = self
            .catalog
            .find(name)
            .cloned()
            .ok_or_else(|| format!("can't spawn object \"{name}\": it does not exist"))?;
        let id = self.pool.allocate_id();
        let mut ent = ObjectInstance::new(id, &program.name, position);
        if let Some(def) = self.sprites.animation(&self.config.default_sprite, 0) {
            let def = def.clone();
            ent.actor
                .anim
                .change(&self.config.default_sprite, 0, &def);
        }
        compile(&mut ent, &program)?;
        self.pool.insert(ent);
        Ok(id)
    }

    pub fn create_item(&mut self, id: u32, position: Vec2) {
        self.items.push(Item { id, position });
        self.bus
            .emit("item_created", serde_json::json!({ "id": id }));
    }

    pub fn create_animal(&mut self, position: Vec2) {
        self.items.push(Item {
            id: ITEM_ANIMAL,
            position,
        });
        self.bus.emit("animal_rescued", serde_json::Value::Null);
    }

    pub fn push_quest(&mut self, path: &str) {
        self.quest_stack.push(path.to_string());
        self.bus
            .emit("quest_pushed", serde_json::json!({ "path": path }));
    }

    pub fn pop_quest(&mut self) {
        if self.quest_stack.pop().is_some() {
            self.bus.emit("quest_popped", serde_json::Value::Null);
        }
    }

    pub fn call_dialogbox(&mut self, title: &str, message: &str) {
        self.dialog = Some(DialogBox {
            title: title.to_string(),
            message: message.to_string(),
        });
    }

    pub fn hide_dialogbox(&mut self) {
        self.dialog = None;
    }

    pub fn request(&mut self, request: LevelRequest) {
        self.requests.push(request);
    }

    /// Serializes the editor-placed objects (plus `extra`, normally the
    /// object currently being ticked) into the save snapshot.
    pub fn persist(&mut self, extra: Option<&ObjectInstance>) {
        let mut objects: Vec<PersistedObject> = self
            .pool
            .iter()
            .filter(|ent| ent.created_from_editor && !ent.is_dead())
            .map(|ent| PersistedObject {
                name: ent.name.clone(),
                position: ent.actor.position,
            })
            .collect();
        if let Some(ent) = extra {
            if ent.created_from_editor && !ent.is_dead() {
                objects.push(PersistedObject {
                    name: ent.name.clone(),
                    position: ent.actor.position,
                });
            }
        }
        self.snapshot = Some(LevelSnapshot {
            frame: self.frame,
            objects,
        });
        self.bus.emit("level_saved", serde_json::Value::Null);
    }

    fn refresh_obstacle_bricks(&mut self) {
        self.active_bricks.clear();
        self.active_bricks.extend_from_slice(&self.bricks);
        for ent in self.pool.iter() {
            if ent.obstacle && !ent.is_dead() {
                self.active_bricks.push(Brick {
                    position: ent.actor.top_left(),
                    size: ent.actor.size(),
                    kind: BrickKind::Obstacle,
                });
            }
        }
    }

    /// Runs one scheduled (or forced) tick of a single object: detach it,
    /// run the current state's chain, advance its animation, reattach.
    pub fn tick_object(&mut self, id: ObjectId, dt: f32) {
        let Some(mut ent) = self.pool.take(id) else {
            return;
        };
        if ent.is_dead() {
            self.pool.put_back(ent);
            return;
        }
        let state_index = ent.vm.current_index();
        let mut chain = ent.vm.take_chain(state_index);
        {
            let mut cx = Cx {
                dt,
                ent: &mut ent,
                level: self,
            };
            run_chain(&mut chain, &mut cx);
        }
        ent.vm.put_chain(state_index, chain);
        ent.actor.anim.advance(dt);
        self.pool.put_back(ent);

        // state changes requested by nested ticks while this object was
        // detached land now, each with its forced tick
        loop {
            let pending = self
                .pending_state_changes
                .iter()
                .position(|(target, _)| *target == id);
            let Some(index) = pending else { break };
            let (_, state) = self.pending_state_changes.remove(index);
            if let Some(ent) = self.pool.get_mut(id) {
                if let Err(e) = ent.vm.set_current_state(&state) {
                    crate::components::fatal(&format!("object \"{}\": {e}", ent.name));
                }
            }
            self.tick_object(id, dt);
        }
    }

    /// One fixed-rate frame of the scripted runtime: input edges, obstacle
    /// map, every live object in list order, camera, dead sweep.
    pub fn update(&mut self, dt: f32) {
        self.time += dt;
        self.frame += 1;
        self.bus.frame = self.frame;
        self.audio.frame = self.frame;

        for player in &mut self.team {
            player.input.begin_frame();
        }
        let held = std::mem::take(&mut self.device_held);
        for button in &held {
            self.team[self.active_player].input.feed(*button, true);
        }

        self.refresh_obstacle_bricks();

        for id in self.pool.ids() {
            if self.is_in_active_region(id) {
                self.tick_object(id, dt);
            }
        }

        self.track_camera();
        self.sweep_dead();
    }

    /// Objects far outside the camera region sleep, unless the script
    /// declared them always_active. The region is one screen of margin
    /// around the camera.
    fn is_in_active_region(&self, id: ObjectId) -> bool {
        let Some(ent) = self.pool.get(id) else {
            return false;
        };
        if ent.always_active {
            return true;
        }
        let margin = self.camera.screen;
        let delta = (ent.actor.position - self.camera.position).abs();
        delta.x <= margin.x && delta.y <= margin.y
    }

    fn track_camera(&mut self) {
        let target = match self.camera.focus {
            CameraFocus::Player(index) => self
                .team
                .get(index)
                .map(|player| player.actor.position)
                .unwrap_or(self.camera.position),
            CameraFocus::Object(id) => match self.pool.get(id) {
                Some(ent) if !ent.is_dead() => ent.actor.position,
                _ => self.team[self.active_player].actor.position,
            },
        };
        self.camera.track(target);
    }

    /// Reclaims dead objects: orphan their children, detach from parents.
    /// Children are not destroyed with their parent.
    fn sweep_dead(&mut self) {
        let dead: Vec<ObjectId> = self
            .pool
            .iter()
            .filter(|ent| ent.is_dead())
            .map(|ent| ent.id)
            .collect();
        for id in dead {
            let Some(ent) = self.pool.remove(id) else {
                continue;
            };
            for (_, child_id) in &ent.children {
                if let Some(child) = self.pool.get_mut(*child_id) {
                    child.parent = None;
                }
            }
            if let Some(parent_id) = ent.parent {
                if let Some(parent) = self.pool.get_mut(parent_id) {
                    parent.remove_child(id);
                }
            }
            self.bus
                .emit("object_destroyed", serde_json::json!({ "name": ent.name }));
        }
    }

    /// Produces this frame's draw list. Hidden-outside-editor objects are
    /// skipped; camera-detached ones use the fixed screen-center camera.
    pub fn render(&self, editor: bool) -> Vec<DrawOp> {
        let mut out = Vec::new();
        for ent in self.pool.iter() {
            if ent.is_dead() {
                continue;
            }
            if ent.hide_unless_in_editor_mode && !editor {
                continue;
            }
            let camera = if ent.detach_from_camera && !editor {
                self.camera.screen_center()
            } else {
                self.camera.position
            };
            let mut rx = RenderCx {
                camera,
                editor,
                ent,
                level: self,
                out: &mut out,
            };
            for command in ent.vm.chain(ent.vm.current_index()).iter() {
                command.render(&mut rx);
            }
            if ent.actor.visible {
                let position = rx.project(ent.actor.top_left());
                out.push(DrawOp::Sprite {
                    sprite: ent.actor.anim.sprite.clone(),
                    anim_id: ent.actor.anim.anim_id,
                    frame: ent.actor.anim.frame(),
                    position,
                    size: ent.actor.size(),
                    scale: ent.actor.scale,
                    angle: ent.actor.angle,
                    alpha: ent.actor.alpha,
                    hflip: ent.actor.hflip,
                    vflip: ent.actor.vflip,
                    zindex: ent.zindex,
                });
            }
        }
        out
    }
}

/// Directory the engine reads game data from (objects/, sprites.json,
/// fonts.json).
#[derive(Resource, Clone)]
pub struct AssetsDir(pub String);

pub struct LevelPlugin;

impl Plugin for LevelPlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(Startup, setup_level).add_systems(
            FixedUpdate,
            (feed_device_input, tick_level)
                .chain()
                .run_if(crate::game_runtime::gameplay_systems_enabled)
                .run_if(resource_exists::<Level>),
        );
        app.add_systems(Update, drain_level_requests.run_if(resource_exists::<Level>));
    }
}

fn setup_level(mut commands: Commands, assets: Res<AssetsDir>, config: Res<GameConfig>) {
    use crate::components::fatal;
    let root = std::path::Path::new(&assets.0);

    let catalog =
        ObjectCatalog::load_dir(&root.join("objects")).unwrap_or_else(|e| fatal(&e));
    info!("[Strata] {} object script(s) loaded", catalog.len());

    let mut sprites = SpriteLibrary::default();
    if let Ok(json) = std::fs::read_to_string(root.join("sprites.json")) {
        sprites.load_json(&json).unwrap_or_else(|e| fatal(&e));
    }
    let mut fonts = FontLibrary::default();
    if let Ok(json) = std::fs::read_to_string(root.join("fonts.json")) {
        fonts.load_json(&json).unwrap_or_else(|e| fatal(&e));
    }

    let level = Level::new(
        Arc::new(catalog),
        Arc::new(sprites),
        Arc::new(fonts),
        config.clone(),
    );
    commands.insert_resource(level);
}

fn feed_device_input(mut level: ResMut<Level>, device: Option<Res<crate::input::DeviceInput>>) {
    if let Some(device) = device {
        level.device_held = device.held.clone();
    }
}

fn tick_level(mut level: ResMut<Level>, time: Res<Time>) {
    let dt = time.delta_secs();
    level.update(dt);
}

fn drain_level_requests(
    mut level: ResMut<Level>,
    mut next: ResMut<NextState<crate::game_runtime::EngineFlowState>>,
) {
    let requests: Vec<LevelRequest> = level.requests.drain(..).collect();
    for request in requests {
        match request {
            LevelRequest::Pause => next.set(crate::game_runtime::EngineFlowState::Paused),
            LevelRequest::LaunchUrl(url) => info!("[Strata] open url: {url}"),
            LevelRequest::LoadLevel(path) => info!("[Strata] load level: {path}"),
            LevelRequest::Restart => info!("[Strata] restart level"),
            LevelRequest::NextLevel => info!("[Strata] jump to next level"),
            LevelRequest::AskToLeave => info!("[Strata] player asked to leave"),
        }
    }
}
