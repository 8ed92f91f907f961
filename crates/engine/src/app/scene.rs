use super::geometry::{rects_colliding, Rect, Vec2};
use super::input::{ActionStates, InputAction};
use super::rendering::Viewport;

#[derive(Debug, Clone, Copy, Default)]
pub struct InputSnapshot {
    quit_requested: bool,
    pause_pressed: bool,
    actions: ActionStates,
    cursor_position_px: Option<Vec2>,
    window_width: u32,
    window_height: u32,
}

impl InputSnapshot {
    pub fn empty() -> Self {
        Self::default()
    }

    pub(crate) fn new(
        quit_requested: bool,
        pause_pressed: bool,
        actions: ActionStates,
        cursor_position_px: Option<Vec2>,
        window_width: u32,
        window_height: u32,
    ) -> Self {
        Self {
            quit_requested,
            pause_pressed,
            actions,
            cursor_position_px,
            window_width,
            window_height,
        }
    }

    pub fn quit_requested(&self) -> bool {
        self.quit_requested
    }

    /// Edge-triggered: true only on the tick following the key-down
    /// transition, never while the key is held.
    pub fn pause_pressed(&self) -> bool {
        self.pause_pressed
    }

    pub fn is_down(&self, action: InputAction) -> bool {
        self.actions.is_down(action)
    }

    pub fn with_action_down(mut self, action: InputAction, is_down: bool) -> Self {
        self.actions.set(action, is_down);
        self
    }

    pub fn with_pause_pressed(mut self, pause_pressed: bool) -> Self {
        self.pause_pressed = pause_pressed;
        self
    }

    pub fn with_cursor_position_px(mut self, cursor_position_px: Option<Vec2>) -> Self {
        self.cursor_position_px = cursor_position_px;
        self
    }

    pub fn with_window_size(mut self, window_size: (u32, u32)) -> Self {
        self.window_width = window_size.0;
        self.window_height = window_size.1;
        self
    }

    pub fn cursor_position_px(&self) -> Option<Vec2> {
        self.cursor_position_px
    }

    pub fn window_size(&self) -> (u32, u32) {
        (self.window_width, self.window_height)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EntityId(pub u64);

/// How an entity is rasterized: a sprite when the key resolves, otherwise the
/// fill color (also the fallback when the sprite fails to load).
#[derive(Debug, Clone, Copy)]
pub struct Renderable {
    pub color: [u8; 4],
    pub sprite_key: Option<&'static str>,
}

impl Default for Renderable {
    fn default() -> Self {
        Self {
            color: [255, 255, 255, 255],
            sprite_key: None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Entity {
    pub id: EntityId,
    pub name: &'static str,
    pub rect: Rect,
    pub depth: i32,
    pub rotation_degrees: f32,
    pub renderable: Renderable,
    pub collidable: bool,
    applied_spawn_order: u64,
}

impl Entity {
    /// Draw order: ascending depth, spawn order as deterministic tiebreak.
    pub(crate) fn draw_order_key(&self) -> (i32, u64) {
        (self.depth, self.applied_spawn_order)
    }
}

/// Everything needed to create an entity. `Default` gives a 1×1 unnamed
/// white rect at the origin so call sites override only what they care about.
#[derive(Debug, Clone)]
pub struct EntityDesc {
    pub name: &'static str,
    pub rect: Rect,
    pub depth: i32,
    pub rotation_degrees: f32,
    pub renderable: Renderable,
    pub collidable: bool,
}

impl Default for EntityDesc {
    fn default() -> Self {
        Self {
            name: "",
            rect: Rect::new(Vec2::ZERO, Vec2::new(1.0, 1.0)),
            depth: 0,
            rotation_degrees: 0.0,
            renderable: Renderable::default(),
            collidable: false,
        }
    }
}

#[derive(Debug, Default)]
pub struct EntityIdAllocator {
    next: u64,
}

impl EntityIdAllocator {
    pub fn allocate(&mut self) -> EntityId {
        let id = EntityId(self.next);
        self.next = self.next.saturating_add(1);
        id
    }
}

/// The simulation context: entity registry plus the scene-global state the
/// scheduler threads through every phase (tick counter, pause flag,
/// viewport bounds).
///
/// Spawns and despawns requested mid-tick are queued and only take effect at
/// [`World::apply_pending`], so the collision pair scan never observes a
/// collection mutating under it. Membership is the lifecycle gate: an entity
/// exists iff it is in the applied registry.
#[derive(Debug)]
pub struct World {
    allocator: EntityIdAllocator,
    entities: Vec<Entity>,
    pending_spawns: Vec<Entity>,
    pending_despawns: Vec<EntityId>,
    next_applied_spawn_order: u64,
    viewport: Viewport,
    tick_counter: u64,
    paused: bool,
}

impl World {
    pub fn new(viewport: Viewport) -> Self {
        Self {
            allocator: EntityIdAllocator::default(),
            entities: Vec::new(),
            pending_spawns: Vec::new(),
            pending_despawns: Vec::new(),
            next_applied_spawn_order: 0,
            viewport,
            tick_counter: 0,
            paused: false,
        }
    }

    pub fn spawn(&mut self, desc: EntityDesc) -> EntityId {
        let id = self.allocator.allocate();
        self.pending_spawns.push(Entity {
            id,
            name: desc.name,
            rect: desc.rect,
            depth: desc.depth,
            rotation_degrees: desc.rotation_degrees,
            renderable: desc.renderable,
            collidable: desc.collidable,
            applied_spawn_order: 0,
        });
        id
    }

    /// Queues removal. Returns false (a no-op) when the id is neither live
    /// nor pending; removing an absent entity is not an error.
    pub fn despawn(&mut self, id: EntityId) -> bool {
        let exists_now = self.entities.iter().any(|entity| entity.id == id);
        let pending_spawn = self.pending_spawns.iter().any(|entity| entity.id == id);
        if !exists_now && !pending_spawn {
            return false;
        }
        self.pending_despawns.push(id);
        true
    }

    pub fn apply_pending(&mut self) {
        if !self.pending_despawns.is_empty() {
            self.pending_despawns.sort_by_key(|id| id.0);
            self.pending_despawns.dedup();
            let pending = &self.pending_despawns;
            self.entities.retain(|entity| {
                pending
                    .binary_search_by_key(&entity.id.0, |id| id.0)
                    .is_err()
            });
            self.pending_spawns.retain(|entity| {
                pending
                    .binary_search_by_key(&entity.id.0, |id| id.0)
                    .is_err()
            });
            self.pending_despawns.clear();
        }

        for mut entity in self.pending_spawns.drain(..) {
            entity.applied_spawn_order = self.next_applied_spawn_order;
            self.next_applied_spawn_order = self.next_applied_spawn_order.saturating_add(1);
            self.entities.push(entity);
        }
    }

    pub fn entity_count(&self) -> usize {
        self.entities.len()
    }

    pub fn entities(&self) -> &[Entity] {
        &self.entities
    }

    pub fn entity_ids(&self) -> Vec<EntityId> {
        self.entities.iter().map(|entity| entity.id).collect()
    }

    pub fn find_entity(&self, id: EntityId) -> Option<&Entity> {
        self.entities.iter().find(|entity| entity.id == id)
    }

    pub fn find_entity_mut(&mut self, id: EntityId) -> Option<&mut Entity> {
        self.entities.iter_mut().find(|entity| entity.id == id)
    }

    /// First applied entity whose name tag matches. Linear scan; used for
    /// singletons like the player.
    pub fn find_by_name(&self, name: &str) -> Option<&Entity> {
        self.entities.iter().find(|entity| entity.name == name)
    }

    pub fn view_rect(&self) -> Rect {
        Rect::new(
            Vec2::ZERO,
            Vec2::new(self.viewport.width as f32, self.viewport.height as f32),
        )
    }

    /// Removes every entity whose rect no longer touches the viewport.
    /// Deliberately bypasses destruction hooks: a drifted-off entity just
    /// ceases to exist. Returns how many were dropped.
    pub fn purge_offscreen(&mut self) -> usize {
        let view_rect = self.view_rect();
        let before = self.entities.len();
        self.entities
            .retain(|entity| rects_colliding(entity.rect, view_rect));
        before - self.entities.len()
    }

    /// All unordered pairs (i < j in registry order) of collidable entities
    /// whose rects overlap. O(n²) over collidable entities; fine at arcade
    /// entity counts.
    pub fn colliding_pairs(&self) -> Vec<(EntityId, EntityId)> {
        let collidable: Vec<&Entity> = self
            .entities
            .iter()
            .filter(|entity| entity.collidable)
            .collect();
        let mut pairs = Vec::new();
        for i in 0..collidable.len() {
            for j in (i + 1)..collidable.len() {
                if rects_colliding(collidable[i].rect, collidable[j].rect) {
                    pairs.push((collidable[i].id, collidable[j].id));
                }
            }
        }
        pairs
    }

    pub fn tick_counter(&self) -> u64 {
        self.tick_counter
    }

    pub fn advance_tick(&mut self) -> u64 {
        self.tick_counter = self.tick_counter.saturating_add(1);
        self.tick_counter
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    pub fn toggle_paused(&mut self) -> bool {
        self.paused = !self.paused;
        self.paused
    }
}

/// Live values the scene exposes to the HUD overlay each frame.
#[derive(Debug, Clone, Default)]
pub struct HudSnapshot {
    pub shields: Option<i32>,
    pub cursor_position: Option<Vec2>,
    pub cursor_hit: Option<&'static str>,
    pub extra_lines: Vec<String>,
}

pub trait Scene {
    fn load(&mut self, world: &mut World);
    fn update(&mut self, input: &InputSnapshot, world: &mut World);
    fn unload(&mut self, world: &mut World);
    fn hud_snapshot(&self, world: &World) -> Option<HudSnapshot> {
        let _ = world;
        None
    }
}
