#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum EntityKind {
    Player,
    Enemy,
    Beam,
    PowerUp(PowerUpKind),
    Asteroid,
    Star,
    Effect,
    Cursor,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum PowerUpKind {
    SpeedUp,
    WidthUp,
    HealthUp,
}

impl EntityKind {
    /// Registry name tag, also what the debug cursor reports on contact.
    fn name(self) -> &'static str {
        match self {
            Self::Player => "player",
            Self::Enemy => "enemy",
            Self::Beam => "beam",
            Self::PowerUp(PowerUpKind::SpeedUp) => "speed_up",
            Self::PowerUp(PowerUpKind::WidthUp) => "width_up",
            Self::PowerUp(PowerUpKind::HealthUp) => "health_up",
            Self::Asteroid => "asteroid",
            Self::Star => "star",
            Self::Effect => "effect",
            Self::Cursor => "cursor",
        }
    }
}

const POWER_UP_KINDS: [PowerUpKind; 3] = [
    PowerUpKind::SpeedUp,
    PowerUpKind::WidthUp,
    PowerUpKind::HealthUp,
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Dir {
    Up,
    Down,
    Left,
    Right,
}

impl Dir {
    fn vector(self) -> Vec2 {
        match self {
            Self::Up => Vec2::new(0.0, -1.0),
            Self::Down => Vec2::new(0.0, 1.0),
            Self::Left => Vec2::new(-1.0, 0.0),
            Self::Right => Vec2::new(1.0, 0.0),
        }
    }
}

/// Numeric attributes shared by every kind.
#[derive(Debug, Clone, Copy)]
struct Stats {
    speed: f32,
    health: i32,
    damage: i32,
}

/// Kind-specific mutable extension carried alongside the base stats.
#[derive(Debug, Clone, Copy)]
enum KindState {
    Player {
        beam_cooldown: u32,
        default_cooldown: u32,
        beam_width: f32,
    },
    Enemy {
        beam_cooldown: u32,
        flight_vector: Vec2,
    },
    Beam {
        fired_by: EntityKind,
        dir: Dir,
    },
    PowerUp,
    Asteroid {
        degrees_per_tick: f32,
    },
    Star,
    Effect {
        target: Option<EntityId>,
        snap: SnapPoint,
        target_snap: SnapPoint,
        expansion_per_tick: Option<Vec2>,
        degrees_per_tick: f32,
        age: u32,
        lifetime: u32,
    },
    Cursor,
}

/// Gameplay-side record for one live entity, keyed by its registry id.
#[derive(Debug, Clone, Copy)]
struct EntityRuntime {
    kind: EntityKind,
    stats: Stats,
    state: KindState,
}

/// Immutable blueprint an entity is instantiated from: base attributes plus
/// the kind extension's starting values. Inheritance between templates is an
/// explicit merge: a child constructor starts from its parent's template and
/// overwrites fields; per-spawn [`SpawnOverrides`] win over both.
#[derive(Debug, Clone)]
struct EntityTemplate {
    kind: EntityKind,
    name: &'static str,
    rect: Rect,
    depth: i32,
    rotation_degrees: f32,
    color: [u8; 4],
    sprite_key: Option<&'static str>,
    collidable: bool,
    stats: Stats,
    state: KindState,
}

#[derive(Debug, Clone, Default)]
struct SpawnOverrides {
    pos: Option<Vec2>,
    size: Option<Vec2>,
    depth: Option<i32>,
    color: Option<[u8; 4]>,
    state: Option<KindState>,
}

/// Caller-supplied overrides have the highest precedence: they land after
/// the template (and any inherited fields) have been resolved.
fn apply_overrides(template: &mut EntityTemplate, overrides: &SpawnOverrides) {
    if let Some(pos) = overrides.pos {
        template.rect.pos = pos;
    }
    if let Some(size) = overrides.size {
        template.rect.size = size;
    }
    if let Some(depth) = overrides.depth {
        template.depth = depth;
    }
    if let Some(color) = overrides.color {
        template.color = color;
    }
    if let Some(state) = overrides.state {
        template.state = state;
    }
}

fn player_template() -> EntityTemplate {
    EntityTemplate {
        kind: EntityKind::Player,
        name: "player",
        rect: Rect::new(
            Vec2::new(200.0 - PLAYER_SIZE / 2.0, 350.0),
            Vec2::new(PLAYER_SIZE, PLAYER_SIZE),
        ),
        depth: DEPTH_SHIP,
        rotation_degrees: 0.0,
        color: PLAYER_COLOR,
        sprite_key: Some("player"),
        collidable: true,
        stats: Stats {
            speed: PLAYER_SPEED,
            health: PLAYER_START_HEALTH,
            damage: 1,
        },
        state: KindState::Player {
            beam_cooldown: 0,
            default_cooldown: PLAYER_DEFAULT_BEAM_COOLDOWN,
            beam_width: 0.0,
        },
    }
}

fn enemy_template() -> EntityTemplate {
    EntityTemplate {
        kind: EntityKind::Enemy,
        name: "enemy",
        // The inverted height is deliberate: bounds are min/max-normalized
        // everywhere, so the rect still collides and draws correctly.
        rect: Rect::new(Vec2::new(33.0, 33.0), ENEMY_SIZE),
        depth: DEPTH_SHIP,
        rotation_degrees: 0.0,
        color: PLAYER_COLOR,
        sprite_key: Some("enemy"),
        collidable: true,
        stats: Stats {
            speed: ENEMY_SPEED,
            health: ENEMY_START_HEALTH,
            damage: 1,
        },
        state: KindState::Enemy {
            beam_cooldown: ENEMY_START_BEAM_COOLDOWN,
            flight_vector: Vec2::ZERO,
        },
    }
}

fn beam_template() -> EntityTemplate {
    EntityTemplate {
        kind: EntityKind::Beam,
        name: "beam",
        rect: Rect::new(Vec2::ZERO, BEAM_SIZE),
        depth: DEPTH_BEAM,
        rotation_degrees: 0.0,
        color: BEAM_DEFAULT_COLOR,
        sprite_key: None,
        collidable: true,
        stats: Stats {
            speed: BEAM_SPEED,
            health: 1,
            damage: BEAM_DAMAGE,
        },
        state: KindState::Beam {
            fired_by: EntityKind::Enemy,
            dir: Dir::Down,
        },
    }
}

/// Parent template the three power-ups inherit from. Never spawned directly.
fn collectable_template() -> EntityTemplate {
    EntityTemplate {
        kind: EntityKind::PowerUp(PowerUpKind::SpeedUp),
        name: "collectable",
        rect: Rect::new(Vec2::ZERO, Vec2::new(COLLECTABLE_SIZE, COLLECTABLE_SIZE)),
        depth: DEPTH_POWER_UP,
        rotation_degrees: 0.0,
        color: COLLECTABLE_COLOR,
        sprite_key: None,
        collidable: false,
        stats: Stats {
            speed: COLLECTABLE_SPEED,
            health: 1,
            damage: 0,
        },
        state: KindState::PowerUp,
    }
}

fn power_up_template(kind: PowerUpKind) -> EntityTemplate {
    // Parent fields first, child fields overwrite.
    let mut template = collectable_template();
    template.kind = EntityKind::PowerUp(kind);
    template.name = EntityKind::PowerUp(kind).name();
    template.sprite_key = Some(match kind {
        PowerUpKind::SpeedUp => "speed_up",
        PowerUpKind::WidthUp => "width_up",
        PowerUpKind::HealthUp => "health_up",
    });
    template.collidable = true;
    template
}

fn asteroid_template() -> EntityTemplate {
    EntityTemplate {
        kind: EntityKind::Asteroid,
        name: "asteroid",
        rect: Rect::new(Vec2::ZERO, Vec2::new(33.0, 33.0)),
        depth: DEPTH_ASTEROID,
        rotation_degrees: 0.0,
        color: ASTEROID_COLOR,
        sprite_key: Some("asteroid"),
        collidable: true,
        stats: Stats {
            speed: 1.0,
            health: ASTEROID_START_HEALTH,
            damage: ASTEROID_CONTACT_DAMAGE,
        },
        state: KindState::Asteroid {
            degrees_per_tick: 1.0,
        },
    }
}

fn star_template() -> EntityTemplate {
    EntityTemplate {
        kind: EntityKind::Star,
        name: "star",
        rect: Rect::new(Vec2::ZERO, Vec2::new(STAR_SIZE, STAR_SIZE)),
        depth: DEPTH_STAR,
        rotation_degrees: 0.0,
        color: STAR_COLOR,
        sprite_key: None,
        collidable: false,
        stats: Stats {
            speed: STAR_SPEED,
            health: 1,
            damage: 0,
        },
        state: KindState::Star,
    }
}

fn effect_template() -> EntityTemplate {
    EntityTemplate {
        kind: EntityKind::Effect,
        name: "effect",
        rect: Rect::new(Vec2::ZERO, Vec2::new(EFFECT_SIZE, EFFECT_SIZE)),
        depth: DEPTH_EFFECT,
        rotation_degrees: 0.0,
        color: EFFECT_COLOR,
        sprite_key: None,
        collidable: false,
        stats: Stats {
            speed: 0.0,
            health: 1,
            damage: 0,
        },
        state: KindState::Effect {
            target: None,
            snap: SnapPoint::Center,
            target_snap: SnapPoint::Center,
            expansion_per_tick: None,
            degrees_per_tick: 1.0,
            age: 0,
            lifetime: EFFECT_DEFAULT_LIFETIME,
        },
    }
}

fn cursor_template() -> EntityTemplate {
    EntityTemplate {
        kind: EntityKind::Cursor,
        name: "cursor",
        rect: Rect::new(Vec2::ZERO, Vec2::new(CURSOR_SIZE, CURSOR_SIZE)),
        depth: DEPTH_CURSOR,
        rotation_degrees: 0.0,
        color: CURSOR_COLOR,
        sprite_key: None,
        collidable: true,
        stats: Stats {
            speed: 0.0,
            health: 1,
            damage: 0,
        },
        state: KindState::Cursor,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct CollisionEvent {
    first: EntityId,
    second: EntityId,
}

/// Pending collision pairs for the current tick. The scan records, the
/// dispatch drains; nothing reacts while the pair scan is still running.
#[derive(Debug, Default)]
struct CollisionQueue {
    pending: Vec<CollisionEvent>,
    last_tick_pair_count: u32,
}

impl CollisionQueue {
    fn record(&mut self, first: EntityId, second: EntityId) {
        self.pending.push(CollisionEvent { first, second });
    }

    fn drain(&mut self) -> Vec<CollisionEvent> {
        let events = std::mem::take(&mut self.pending);
        self.last_tick_pair_count = events.len() as u32;
        events
    }

    #[cfg(test)]
    fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    fn last_tick_pair_count(&self) -> u32 {
        self.last_tick_pair_count
    }
}
