impl Scene for RaidScene {
    fn load(&mut self, world: &mut World) {
        self.runtime_by_entity.clear();
        self.destroyed_this_tick.clear();
        self.collision_queue = CollisionQueue::default();
        self.cursor_hit = None;
        self.spawned_hostiles = 0;
        self.spawned_stars = 0;

        let view_rect = world.view_rect();
        let player_spawn = Vec2::new(
            view_rect.size.x / 2.0 - PLAYER_SIZE / 2.0,
            view_rect.size.y - 50.0,
        );
        let player_id = self.spawn_from_template(
            world,
            player_template(),
            SpawnOverrides {
                pos: Some(player_spawn),
                ..SpawnOverrides::default()
            },
        );
        let cursor_id =
            self.spawn_from_template(world, cursor_template(), SpawnOverrides::default());
        world.apply_pending();
        self.player_id = Some(player_id);
        self.cursor_id = Some(cursor_id);

        info!(
            seed = self.seed,
            entity_count = world.entity_count(),
            sys = RAID_SYSTEM_ORDER_TEXT,
            "scene_loaded"
        );
    }

    fn update(&mut self, input: &InputSnapshot, world: &mut World) {
        if input.pause_pressed() {
            let paused = world.toggle_paused();
            info!(paused, tick = world.tick_counter(), "pause_toggled");
        }
        if world.is_paused() {
            return;
        }

        let tick = world.advance_tick();
        if self.slowdown_divisor > 1 && tick % self.slowdown_divisor != 0 {
            return;
        }

        self.cursor_hit = None;
        self.destroyed_this_tick.clear();
        run_systems_once(self, input, world);
    }

    fn unload(&mut self, world: &mut World) {
        info!(
            entity_count = world.entity_count(),
            tick = world.tick_counter(),
            "scene_unload"
        );
        self.runtime_by_entity.clear();
        self.destroyed_this_tick.clear();
        self.collision_queue = CollisionQueue::default();
        self.player_id = None;
        self.cursor_id = None;
        self.cursor_hit = None;
        self.spawned_hostiles = 0;
        self.spawned_stars = 0;
    }

    fn hud_snapshot(&self, world: &World) -> Option<HudSnapshot> {
        Some(HudSnapshot {
            shields: self.shields(),
            cursor_position: self
                .cursor_id
                .and_then(|id| world.find_entity(id))
                .map(|entity| entity.rect.pos),
            cursor_hit: self.cursor_hit,
            extra_lines: vec![
                format!("SYS {RAID_SYSTEM_ORDER_TEXT}"),
                format!("PAIRS {}", self.collision_queue.last_tick_pair_count()),
                format!("SPAWNS {}/{}", self.spawned_hostiles, self.spawned_stars),
            ],
        })
    }
}
