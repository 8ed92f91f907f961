#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RaidSystemId {
    Update,
    Collision,
    Purge,
    Spawner,
}

const RAID_SYSTEM_ORDER: [RaidSystemId; 4] = [
    RaidSystemId::Update,
    RaidSystemId::Collision,
    RaidSystemId::Purge,
    RaidSystemId::Spawner,
];

/// One simulation tick after the pause/slow-motion gates: every entity's
/// update hook, the two-phase collision pass, the off-screen purge, then the
/// periodic spawners. Registry mutations land at the apply points between
/// systems, never mid-scan.
fn run_systems_once(scene: &mut RaidScene, input: &InputSnapshot, world: &mut World) {
    for system_id in RAID_SYSTEM_ORDER {
        match system_id {
            RaidSystemId::Update => {
                run_update_system(scene, input, world);
                world.apply_pending();
            }
            RaidSystemId::Collision => {
                run_collision_system(scene, world);
                world.apply_pending();
            }
            RaidSystemId::Purge => {
                run_purge_system(scene, world);
            }
            RaidSystemId::Spawner => {
                run_spawner_system(scene, world);
                world.apply_pending();
            }
        }
    }
}

fn run_update_system(scene: &mut RaidScene, input: &InputSnapshot, world: &mut World) {
    // Entities spawned by an update hook join the registry at the next apply
    // point; they are not visited until the following tick.
    for id in world.entity_ids() {
        let Some(mut runtime) = scene.runtime_by_entity.get(&id).copied() else {
            continue;
        };
        match runtime.kind {
            EntityKind::Player => update_player(scene, world, input, id, &mut runtime),
            EntityKind::Enemy => update_enemy(scene, world, id, &mut runtime),
            EntityKind::Beam => update_beam(world, id, &runtime),
            EntityKind::PowerUp(_) => update_power_up(world, id, &runtime),
            EntityKind::Asteroid => update_asteroid(scene, world, id, &mut runtime),
            EntityKind::Star => update_star(world, id, &runtime),
            EntityKind::Effect => update_effect(scene, world, id, &mut runtime),
            EntityKind::Cursor => update_cursor(world, input, id),
        }
        scene.runtime_by_entity.insert(id, runtime);
    }
}

fn update_player(
    scene: &mut RaidScene,
    world: &mut World,
    input: &InputSnapshot,
    id: EntityId,
    runtime: &mut EntityRuntime,
) {
    if runtime.stats.health <= 0 {
        scene.destroy_entity(world, id);
        return;
    }

    let KindState::Player {
        mut beam_cooldown,
        default_cooldown,
        beam_width,
    } = runtime.state
    else {
        return;
    };

    let view_rect = world.view_rect();
    for (action, dir) in [
        (InputAction::MoveUp, Dir::Up),
        (InputAction::MoveDown, Dir::Down),
        (InputAction::MoveLeft, Dir::Left),
        (InputAction::MoveRight, Dir::Right),
    ] {
        if !input.is_down(action) {
            continue;
        }
        let step = dir.vector() * runtime.stats.speed;
        if let Some(entity) = world.find_entity_mut(id) {
            let moved = entity.rect.translated(step);
            // A step that would leave the viewport is cancelled outright.
            if rect_within(moved, view_rect) {
                entity.rect = moved;
            }
        }
    }

    if input.is_down(InputAction::Shoot) && beam_cooldown == 0 {
        if let Some(player_rect) = world.find_entity(id).map(|entity| entity.rect) {
            for snap in [SnapPoint::N, SnapPoint::W, SnapPoint::E] {
                if beam_width == 0.0 && snap != SnapPoint::N {
                    continue; // side beams only fire once the beam is widened
                }
                fire_beam(
                    scene,
                    world,
                    player_rect,
                    snap,
                    beam_width,
                    EntityKind::Player,
                    Dir::Up,
                    PLAYER_BEAM_COLOR,
                    DEPTH_PLAYER_BEAM,
                );
            }
            beam_cooldown = default_cooldown;
        }
    }

    beam_cooldown = beam_cooldown.saturating_sub(1);
    runtime.state = KindState::Player {
        beam_cooldown,
        default_cooldown,
        beam_width,
    };
}

fn update_enemy(
    scene: &mut RaidScene,
    world: &mut World,
    id: EntityId,
    runtime: &mut EntityRuntime,
) {
    let KindState::Enemy {
        mut beam_cooldown,
        mut flight_vector,
    } = runtime.state
    else {
        return;
    };

    if let Some(entity) = world.find_entity_mut(id) {
        entity.rect = entity.rect.translated(flight_vector);
    }

    if runtime.stats.health <= 0 {
        scene.destroy_entity(world, id);
        return;
    }

    if let Some(entity) = world.find_entity_mut(id) {
        entity.renderable.color = enemy_color_for_health(runtime.stats.health);
    }

    if beam_cooldown == 0 {
        if let Some(enemy_rect) = world.find_entity(id).map(|entity| entity.rect) {
            // Hold fire until the enemy has cleared the top strip.
            if enemy_rect.pos.y > ENEMY_MIN_FIRING_ALTITUDE {
                fire_beam(
                    scene,
                    world,
                    enemy_rect,
                    SnapPoint::S,
                    0.0,
                    EntityKind::Enemy,
                    Dir::Down,
                    ENEMY_BEAM_COLOR,
                    DEPTH_BEAM,
                );
            }
        }
        beam_cooldown = scene
            .rng
            .gen_range(ENEMY_BEAM_COOLDOWN_MIN..=ENEMY_BEAM_COOLDOWN_MAX);
        flight_vector = enemy_flight_choice(&mut scene.rng);
    }

    beam_cooldown = beam_cooldown.saturating_sub(1);
    runtime.state = KindState::Enemy {
        beam_cooldown,
        flight_vector,
    };
}

fn update_beam(world: &mut World, id: EntityId, runtime: &EntityRuntime) {
    let KindState::Beam { dir, .. } = runtime.state else {
        return;
    };
    if let Some(entity) = world.find_entity_mut(id) {
        entity.rect = entity.rect.translated(dir.vector() * runtime.stats.speed);
    }
}

fn update_power_up(world: &mut World, id: EntityId, runtime: &EntityRuntime) {
    // Sway sideways while sinking, synced to the global tick.
    let phase = world.tick_counter() as f32 / COLLECTABLE_DRIFT_PERIOD;
    let flight_vector = Vec2::new(phase.cos(), runtime.stats.speed);
    if let Some(entity) = world.find_entity_mut(id) {
        entity.rect = entity.rect.translated(flight_vector);
    }
}

fn update_asteroid(
    scene: &mut RaidScene,
    world: &mut World,
    id: EntityId,
    runtime: &mut EntityRuntime,
) {
    let KindState::Asteroid { degrees_per_tick } = runtime.state else {
        return;
    };

    if let Some(entity) = world.find_entity_mut(id) {
        entity.rotation_degrees = (entity.rotation_degrees + degrees_per_tick).rem_euclid(360.0);
        entity.rect = entity.rect.translated(Dir::Down.vector());
    }

    if runtime.stats.health <= 0 {
        scene.destroy_entity(world, id);
    }
}

fn update_star(world: &mut World, id: EntityId, runtime: &EntityRuntime) {
    if let Some(entity) = world.find_entity_mut(id) {
        entity.rect = entity
            .rect
            .translated(Dir::Down.vector() * runtime.stats.speed);
    }
}

fn update_effect(
    scene: &mut RaidScene,
    world: &mut World,
    id: EntityId,
    runtime: &mut EntityRuntime,
) {
    let KindState::Effect {
        target,
        snap,
        target_snap,
        expansion_per_tick,
        degrees_per_tick,
        mut age,
        lifetime,
    } = runtime.state
    else {
        return;
    };

    if let Some(target_id) = target {
        match world.find_entity(target_id).map(|entity| entity.rect) {
            Some(target_rect) => {
                if let Some(entity) = world.find_entity_mut(id) {
                    let offset = snap_offset(entity.rect, snap, target_rect, target_snap);
                    entity.rect = entity.rect.translated(offset);
                }
            }
            None => {
                // Dangling handle: the tracked entity is gone, so is the effect.
                scene.destroy_entity(world, id);
                return;
            }
        }
    }

    if let Some(entity) = world.find_entity_mut(id) {
        if let Some(expansion) = expansion_per_tick {
            entity.rect.size = entity.rect.size + expansion;
            entity.rect.pos = entity.rect.pos - expansion * 0.5;
        }
        if degrees_per_tick != 0.0 {
            entity.rotation_degrees =
                (entity.rotation_degrees + degrees_per_tick).rem_euclid(360.0);
        }
    }

    age = age.saturating_add(1);
    if age > lifetime {
        scene.destroy_entity(world, id);
        return;
    }
    runtime.state = KindState::Effect {
        target,
        snap,
        target_snap,
        expansion_per_tick,
        degrees_per_tick,
        age,
        lifetime,
    };
}

fn update_cursor(world: &mut World, input: &InputSnapshot, id: EntityId) {
    let Some(cursor_px) = input.cursor_position_px() else {
        return;
    };
    let view_rect = world.view_rect();
    let position = cursor_view_position(cursor_px, input.window_size(), view_rect);
    if let Some(entity) = world.find_entity_mut(id) {
        entity.rect.pos = position;
    }
}

#[allow(clippy::too_many_arguments)]
fn fire_beam(
    scene: &mut RaidScene,
    world: &mut World,
    host_rect: Rect,
    host_snap: SnapPoint,
    spread: f32,
    fired_by: EntityKind,
    dir: Dir,
    color: [u8; 4],
    depth: i32,
) -> EntityId {
    let template = beam_template();
    // The beam's trailing edge lands on the host's anchor point.
    let beam_snap = match dir {
        Dir::Up => SnapPoint::S,
        Dir::Down => SnapPoint::N,
        Dir::Left => SnapPoint::E,
        Dir::Right => SnapPoint::W,
    };
    let offset = snap_offset(template.rect, beam_snap, host_rect, host_snap);
    let spread_offset = compass_vector(host_snap) * Vec2::new(spread, 0.0);
    let pos = template.rect.pos + offset + spread_offset;
    scene.spawn_from_template(
        world,
        template,
        SpawnOverrides {
            pos: Some(pos),
            depth: Some(depth),
            color: Some(color),
            state: Some(KindState::Beam { fired_by, dir }),
            ..SpawnOverrides::default()
        },
    )
}

/// Scan phase records every overlapping collidable pair; only after the scan
/// completes does the drain dispatch reactions, first recorded side first.
/// A member destroyed by an earlier pair in the same drain still gets its
/// later reactions: despawns are deferred, so reacting on a dying entity is
/// a harmless re-decrement or a guarded re-destroy.
fn run_collision_system(scene: &mut RaidScene, world: &mut World) {
    for (first, second) in world.colliding_pairs() {
        scene.collision_queue.record(first, second);
    }

    let events = scene.collision_queue.drain();
    for event in &events {
        dispatch_collision(scene, world, event.first, event.second);
        dispatch_collision(scene, world, event.second, event.first);
    }
}

fn dispatch_collision(scene: &mut RaidScene, world: &mut World, me: EntityId, other: EntityId) {
    let Some(mut runtime) = scene.runtime_by_entity.get(&me).copied() else {
        return;
    };
    let Some(other_kind) = scene.runtime_by_entity.get(&other).map(|entry| entry.kind) else {
        return;
    };

    match runtime.kind {
        EntityKind::Player => {
            if other_kind == EntityKind::Enemy {
                runtime.stats.health -= SHIP_CONTACT_DAMAGE;
            }
        }
        EntityKind::Enemy => {
            if other_kind == EntityKind::Player {
                runtime.stats.health -= SHIP_CONTACT_DAMAGE;
            }
        }
        EntityKind::Beam => on_collision_beam(scene, world, me, other, other_kind, &runtime),
        EntityKind::PowerUp(kind) => on_collision_power_up(scene, world, me, other, other_kind, kind),
        EntityKind::Asteroid => on_collision_asteroid(scene, world, me, other, other_kind),
        EntityKind::Cursor => {
            scene.cursor_hit = Some(other_kind.name());
        }
        EntityKind::Star | EntityKind::Effect => {}
    }

    scene.runtime_by_entity.insert(me, runtime);
}

fn on_collision_beam(
    scene: &mut RaidScene,
    world: &mut World,
    me: EntityId,
    other: EntityId,
    other_kind: EntityKind,
    runtime: &EntityRuntime,
) {
    let KindState::Beam { fired_by, .. } = runtime.state else {
        return;
    };
    if other_kind == fired_by {
        return; // no friendly fire
    }
    if matches!(
        other_kind,
        EntityKind::Player | EntityKind::Enemy | EntityKind::Asteroid
    ) {
        damage_entity(scene, other, runtime.stats.damage);
        scene.destroy_entity(world, me);
    }
}

fn on_collision_asteroid(
    scene: &mut RaidScene,
    world: &mut World,
    me: EntityId,
    other: EntityId,
    other_kind: EntityKind,
) {
    if matches!(other_kind, EntityKind::Player | EntityKind::Enemy) {
        damage_entity(scene, other, ASTEROID_CONTACT_DAMAGE);
        scene.destroy_entity(world, me);
    }
}

fn on_collision_power_up(
    scene: &mut RaidScene,
    world: &mut World,
    me: EntityId,
    other: EntityId,
    other_kind: EntityKind,
    kind: PowerUpKind,
) {
    if other_kind != EntityKind::Player {
        return;
    }
    if let Some(player) = scene.runtime_by_entity.get_mut(&other) {
        match kind {
            PowerUpKind::HealthUp => {
                player.stats.health = (player.stats.health + 1).min(PLAYER_MAX_HEALTH);
            }
            PowerUpKind::SpeedUp => {
                if let KindState::Player {
                    default_cooldown, ..
                } = &mut player.state
                {
                    *default_cooldown =
                        default_cooldown.saturating_sub(5).max(PLAYER_MIN_BEAM_COOLDOWN);
                }
            }
            PowerUpKind::WidthUp => {
                if let KindState::Player { beam_width, .. } = &mut player.state {
                    *beam_width = (*beam_width + BEAM_WIDTH_STEP).min(BEAM_WIDTH_MAX);
                }
            }
        }
    }
    scene.destroy_entity(world, me);
}

fn damage_entity(scene: &mut RaidScene, id: EntityId, amount: i32) {
    if let Some(target) = scene.runtime_by_entity.get_mut(&id) {
        target.stats.health -= amount;
    }
}

fn run_purge_system(scene: &mut RaidScene, world: &mut World) {
    let removed = world.purge_offscreen();
    if removed > 0 {
        debug!(removed, "purged_offscreen");
    }
    scene.prune_dead_runtime(world);
}

fn run_spawner_system(scene: &mut RaidScene, world: &mut World) {
    let tick = world.tick_counter();
    let view_rect = world.view_rect();

    if tick % ENEMY_SPAWN_PERIOD == 0 {
        let template = if scene.rng.gen_bool(0.5) {
            enemy_template()
        } else {
            asteroid_template()
        };
        let x = spawn_column(&mut scene.rng, view_rect, template.rect.size.x.abs());
        scene.spawn_from_template(
            world,
            template,
            SpawnOverrides {
                pos: Some(Vec2::new(x, 0.0)),
                ..SpawnOverrides::default()
            },
        );
        scene.spawned_hostiles = scene.spawned_hostiles.saturating_add(1);
    }

    if tick % STAR_SPAWN_PERIOD == 0 {
        let x = spawn_column(&mut scene.rng, view_rect, ENEMY_SIZE.x.abs());
        scene.spawn_from_template(
            world,
            star_template(),
            SpawnOverrides {
                pos: Some(Vec2::new(x, 0.0)),
                ..SpawnOverrides::default()
            },
        );
        scene.spawned_stars = scene.spawned_stars.saturating_add(1);
    }
}

fn on_creation(template: &mut EntityTemplate, rng: &mut Pcg32) {
    if template.kind == EntityKind::Asteroid {
        let size = rng.gen_range(ASTEROID_MIN_SIZE..=ASTEROID_MAX_SIZE) as f32;
        template.rect.size = Vec2::new(size, size);
        template.state = KindState::Asteroid {
            degrees_per_tick: rng.gen_range(-ASTEROID_MAX_SPIN..=ASTEROID_MAX_SPIN) as f32,
        };
    }
}

fn on_destroy(scene: &mut RaidScene, world: &mut World, id: EntityId) {
    let Some(runtime) = scene.runtime_by_entity.get(&id).copied() else {
        return;
    };
    let Some(last_rect) = world.find_entity(id).map(|entity| entity.rect) else {
        return;
    };

    match runtime.kind {
        EntityKind::Player | EntityKind::Beam | EntityKind::Asteroid => {
            spawn_explosion(scene, world, last_rect);
        }
        EntityKind::Enemy => {
            if scene.rng.gen_range(0..100) < scene.drop_percent {
                let kind = POWER_UP_KINDS[scene.rng.gen_range(0..POWER_UP_KINDS.len())];
                let template = power_up_template(kind);
                let offset = snap_offset(
                    template.rect,
                    SnapPoint::Center,
                    last_rect,
                    SnapPoint::Center,
                );
                let pos = template.rect.pos + offset;
                scene.spawn_from_template(
                    world,
                    template,
                    SpawnOverrides {
                        pos: Some(pos),
                        ..SpawnOverrides::default()
                    },
                );
            }
            spawn_explosion(scene, world, last_rect);
        }
        _ => {}
    }
}

fn spawn_explosion(scene: &mut RaidScene, world: &mut World, at: Rect) {
    let mut template = effect_template();
    template.sprite_key = Some("explosion");
    let size = Vec2::new(EXPLOSION_START_SIZE, EXPLOSION_START_SIZE);
    let pos = at.center() - size * 0.5;
    let spin = scene.rng.gen_range(-EXPLOSION_MAX_SPIN..=EXPLOSION_MAX_SPIN) as f32;
    scene.spawn_from_template(
        world,
        template,
        SpawnOverrides {
            pos: Some(pos),
            size: Some(size),
            state: Some(KindState::Effect {
                target: None,
                snap: SnapPoint::Center,
                target_snap: SnapPoint::Center,
                expansion_per_tick: Some(EXPLOSION_EXPANSION_PER_TICK),
                degrees_per_tick: spin,
                age: 0,
                lifetime: EXPLOSION_LIFETIME,
            }),
            ..SpawnOverrides::default()
        },
    );
}
