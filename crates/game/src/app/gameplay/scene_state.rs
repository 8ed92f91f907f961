struct RaidScene {
    seed: u64,
    rng: Pcg32,
    slowdown_divisor: u64,
    drop_percent: u32,
    runtime_by_entity: HashMap<EntityId, EntityRuntime>,
    /// Guard so `on_destroy` fires exactly once per entity, however many
    /// reactions try to kill it within the same tick.
    destroyed_this_tick: HashSet<EntityId>,
    collision_queue: CollisionQueue,
    player_id: Option<EntityId>,
    cursor_id: Option<EntityId>,
    cursor_hit: Option<&'static str>,
    spawned_hostiles: u64,
    spawned_stars: u64,
}

impl RaidScene {
    fn new(seed: u64, slowdown_divisor: u64, drop_percent: u32) -> Self {
        Self {
            seed,
            rng: Pcg32::seed_from_u64(seed),
            slowdown_divisor: slowdown_divisor.max(1),
            drop_percent: drop_percent.min(100),
            runtime_by_entity: HashMap::new(),
            destroyed_this_tick: HashSet::new(),
            collision_queue: CollisionQueue::default(),
            player_id: None,
            cursor_id: None,
            cursor_hit: None,
            spawned_hostiles: 0,
            spawned_stars: 0,
        }
    }

    /// Template resolution order: inherited fields are already merged into
    /// the template, caller overrides land on top, then the kind's creation
    /// hook gets the final word (e.g. asteroid size/spin randomization).
    fn spawn_from_template(
        &mut self,
        world: &mut World,
        template: EntityTemplate,
        overrides: SpawnOverrides,
    ) -> EntityId {
        let mut template = template;
        apply_overrides(&mut template, &overrides);
        on_creation(&mut template, &mut self.rng);

        let runtime = EntityRuntime {
            kind: template.kind,
            stats: template.stats,
            state: template.state,
        };
        let id = world.spawn(EntityDesc {
            name: template.name,
            rect: template.rect,
            depth: template.depth,
            rotation_degrees: template.rotation_degrees,
            renderable: Renderable {
                color: template.color,
                sprite_key: template.sprite_key,
            },
            collidable: template.collidable,
        });
        self.runtime_by_entity.insert(id, runtime);
        id
    }

    /// Fires the destruction hook, then queues removal. Re-entrant destroys
    /// of the same id within a tick are no-ops.
    fn destroy_entity(&mut self, world: &mut World, id: EntityId) {
        if !self.destroyed_this_tick.insert(id) {
            return;
        }
        on_destroy(self, world, id);
        world.despawn(id);
    }

    /// Drops gameplay records for entities no longer in the registry
    /// (despawned or purged off-screen).
    fn prune_dead_runtime(&mut self, world: &World) {
        let live: HashSet<EntityId> = world.entity_ids().into_iter().collect();
        self.runtime_by_entity.retain(|id, _| live.contains(id));
    }

    fn shields(&self) -> Option<i32> {
        self.player_id
            .and_then(|id| self.runtime_by_entity.get(&id))
            .map(|runtime| runtime.stats.health.max(0))
    }
}
