use super::*;
use engine::Viewport;

fn test_world() -> World {
    World::new(Viewport {
        width: 400,
        height: 400,
    })
}

fn test_scene() -> RaidScene {
    RaidScene::new(7, 1, 33)
}

fn loaded_scene() -> (RaidScene, World) {
    let mut scene = test_scene();
    let mut world = test_world();
    scene.load(&mut world);
    (scene, world)
}

fn idle_input() -> InputSnapshot {
    InputSnapshot::empty().with_window_size((400, 400))
}

fn input_with(actions: &[InputAction]) -> InputSnapshot {
    let mut snapshot = idle_input();
    for action in actions {
        snapshot = snapshot.with_action_down(*action, true);
    }
    snapshot
}

fn count_named(world: &World, name: &str) -> usize {
    world
        .entities()
        .iter()
        .filter(|entity| entity.name == name)
        .count()
}

fn count_power_ups(world: &World) -> usize {
    count_named(world, "speed_up") + count_named(world, "width_up") + count_named(world, "health_up")
}

fn set_player_pos(world: &mut World, id: EntityId, pos: Vec2) {
    world.find_entity_mut(id).expect("player").rect.pos = pos;
}

fn player_state(scene: &RaidScene) -> (u32, u32, f32) {
    let id = scene.player_id.expect("player id");
    let runtime = scene.runtime_by_entity.get(&id).expect("player runtime");
    let KindState::Player {
        beam_cooldown,
        default_cooldown,
        beam_width,
    } = runtime.state
    else {
        panic!("player runtime has the wrong kind state");
    };
    (beam_cooldown, default_cooldown, beam_width)
}

#[test]
fn power_up_templates_inherit_collectable_defaults() {
    let template = power_up_template(PowerUpKind::SpeedUp);
    // Inherited from the collectable parent.
    assert_eq!(template.stats.speed, COLLECTABLE_SPEED);
    assert_eq!(template.rect.size, Vec2::new(COLLECTABLE_SIZE, COLLECTABLE_SIZE));
    assert_eq!(template.depth, DEPTH_POWER_UP);
    // Overwritten by the child.
    assert_eq!(template.kind, EntityKind::PowerUp(PowerUpKind::SpeedUp));
    assert_eq!(template.name, "speed_up");
    assert_eq!(template.sprite_key, Some("speed_up"));
    assert!(template.collidable);
    assert!(!collectable_template().collidable);
}

#[test]
fn spawn_overrides_win_over_template_and_inherited_fields() {
    let mut scene = test_scene();
    let mut world = test_world();
    let id = scene.spawn_from_template(
        &mut world,
        power_up_template(PowerUpKind::WidthUp),
        SpawnOverrides {
            pos: Some(Vec2::new(40.0, 50.0)),
            color: Some([9, 9, 9, 255]),
            ..SpawnOverrides::default()
        },
    );
    world.apply_pending();

    let entity = world.find_entity(id).expect("spawned");
    assert_eq!(entity.rect.pos, Vec2::new(40.0, 50.0));
    assert_eq!(entity.renderable.color, [9, 9, 9, 255]);
    // Fields without an override keep the template values.
    assert_eq!(entity.depth, DEPTH_POWER_UP);
    assert_eq!(entity.rect.size, Vec2::new(COLLECTABLE_SIZE, COLLECTABLE_SIZE));
}

#[test]
fn player_movement_is_cancelled_at_the_viewport_edge() {
    let (mut scene, mut world) = loaded_scene();
    let player_id = scene.player_id.expect("player id");
    set_player_pos(&mut world, player_id, Vec2::new(0.0, 0.0));

    scene.update(&input_with(&[InputAction::MoveRight]), &mut world);
    assert_eq!(
        world.find_entity(player_id).expect("player").rect.pos,
        Vec2::new(1.0, 0.0)
    );

    set_player_pos(&mut world, player_id, Vec2::new(0.0, 0.0));
    scene.update(&input_with(&[InputAction::MoveLeft]), &mut world);
    assert_eq!(
        world.find_entity(player_id).expect("player").rect.pos,
        Vec2::new(0.0, 0.0)
    );
}

#[test]
fn shooting_spawns_a_snapped_nose_beam_and_arms_the_cooldown() {
    let (mut scene, mut world) = loaded_scene();
    let player_id = scene.player_id.expect("player id");
    let player_rect = world.find_entity(player_id).expect("player").rect;

    scene.update(&input_with(&[InputAction::Shoot]), &mut world);

    assert_eq!(count_named(&world, "beam"), 1);
    let beam = world.find_by_name("beam").expect("beam");
    // The beam's S anchor sits on the player's N anchor (before the beam's
    // first own update tick).
    let expected_pos = player_rect.snap_point(SnapPoint::N) - Vec2::new(BEAM_SIZE.x / 2.0, BEAM_SIZE.y);
    assert_eq!(beam.rect.pos, expected_pos);
    assert_eq!(beam.depth, DEPTH_PLAYER_BEAM);
    assert_eq!(beam.renderable.color, PLAYER_BEAM_COLOR);

    let (beam_cooldown, default_cooldown, _) = player_state(&scene);
    assert_eq!(default_cooldown, PLAYER_DEFAULT_BEAM_COOLDOWN);
    assert_eq!(beam_cooldown, PLAYER_DEFAULT_BEAM_COOLDOWN - 1);

    // Held trigger during cooldown fires nothing further.
    scene.update(&input_with(&[InputAction::Shoot]), &mut world);
    assert_eq!(count_named(&world, "beam"), 1);
}

#[test]
fn widened_beam_adds_offset_side_beams() {
    let (mut scene, mut world) = loaded_scene();
    let player_id = scene.player_id.expect("player id");
    if let Some(runtime) = scene.runtime_by_entity.get_mut(&player_id) {
        if let KindState::Player { beam_width, .. } = &mut runtime.state {
            *beam_width = 6.0;
        }
    }
    let player_rect = world.find_entity(player_id).expect("player").rect;

    scene.update(&input_with(&[InputAction::Shoot]), &mut world);
    assert_eq!(count_named(&world, "beam"), 3);

    let west_pos = player_rect.snap_point(SnapPoint::W)
        - Vec2::new(BEAM_SIZE.x / 2.0, BEAM_SIZE.y)
        + Vec2::new(-6.0, 0.0);
    assert!(
        world
            .entities()
            .iter()
            .any(|entity| entity.name == "beam" && entity.rect.pos == west_pos),
        "expected a west beam offset by the beam width"
    );
}

#[test]
fn beams_never_damage_their_own_shooter() {
    let mut scene = test_scene();
    let mut world = test_world();
    let player_id = scene.spawn_from_template(
        &mut world,
        player_template(),
        SpawnOverrides {
            pos: Some(Vec2::new(100.0, 100.0)),
            ..SpawnOverrides::default()
        },
    );
    let beam_id = scene.spawn_from_template(
        &mut world,
        beam_template(),
        SpawnOverrides {
            pos: Some(Vec2::new(110.0, 110.0)),
            state: Some(KindState::Beam {
                fired_by: EntityKind::Player,
                dir: Dir::Up,
            }),
            ..SpawnOverrides::default()
        },
    );
    world.apply_pending();

    run_collision_system(&mut scene, &mut world);
    world.apply_pending();

    let player = scene.runtime_by_entity.get(&player_id).expect("player");
    assert_eq!(player.stats.health, PLAYER_START_HEALTH);
    assert!(world.find_entity(beam_id).is_some(), "beam passes through");
}

#[test]
fn beam_kill_chain_drops_a_power_up_snapped_to_the_enemy_center() {
    // Forced "always drop" branch.
    let mut scene = RaidScene::new(11, 1, 100);
    let mut world = test_world();
    let enemy_id = scene.spawn_from_template(
        &mut world,
        enemy_template(),
        SpawnOverrides {
            pos: Some(Vec2::new(100.0, 100.0)),
            ..SpawnOverrides::default()
        },
    );
    scene.spawn_from_template(
        &mut world,
        beam_template(),
        SpawnOverrides {
            pos: Some(Vec2::new(110.0, 80.0)),
            state: Some(KindState::Beam {
                fired_by: EntityKind::Player,
                dir: Dir::Up,
            }),
            ..SpawnOverrides::default()
        },
    );
    world.apply_pending();
    let enemy_center = world.find_entity(enemy_id).expect("enemy").rect.center();

    run_collision_system(&mut scene, &mut world);
    world.apply_pending();
    assert_eq!(
        scene.runtime_by_entity.get(&enemy_id).expect("enemy").stats.health,
        0
    );
    // The beam died on impact and left an explosion.
    assert_eq!(count_named(&world, "beam"), 0);
    assert_eq!(count_named(&world, "effect"), 1);

    // The enemy notices its depleted health on its next update.
    run_update_system(&mut scene, &idle_input(), &mut world);
    world.apply_pending();

    assert!(world.find_entity(enemy_id).is_none());
    assert_eq!(count_power_ups(&world), 1);
    let power_up = world
        .entities()
        .iter()
        .find(|entity| {
            matches!(entity.name, "speed_up" | "width_up" | "health_up")
        })
        .expect("dropped power-up");
    assert_eq!(power_up.rect.center(), enemy_center);
    assert_eq!(count_named(&world, "effect"), 2);
}

#[test]
fn destroy_fires_on_destroy_exactly_once() {
    let mut scene = RaidScene::new(3, 1, 0);
    let mut world = test_world();
    let enemy_id = scene.spawn_from_template(
        &mut world,
        enemy_template(),
        SpawnOverrides {
            pos: Some(Vec2::new(100.0, 100.0)),
            ..SpawnOverrides::default()
        },
    );
    world.apply_pending();

    scene.destroy_entity(&mut world, enemy_id);
    scene.destroy_entity(&mut world, enemy_id);
    world.apply_pending();

    assert!(world.find_entity(enemy_id).is_none());
    assert_eq!(count_named(&world, "effect"), 1);
}

#[test]
fn pair_recorded_before_a_same_drain_destruction_still_dispatches() {
    let mut scene = RaidScene::new(5, 1, 0);
    let mut world = test_world();
    let player_id = scene.spawn_from_template(
        &mut world,
        player_template(),
        SpawnOverrides {
            pos: Some(Vec2::new(100.0, 100.0)),
            ..SpawnOverrides::default()
        },
    );
    let enemy_id = scene.spawn_from_template(
        &mut world,
        enemy_template(),
        SpawnOverrides {
            pos: Some(Vec2::new(110.0, 140.0)),
            ..SpawnOverrides::default()
        },
    );
    let asteroid_id = scene.spawn_from_template(
        &mut world,
        asteroid_template(),
        SpawnOverrides {
            pos: Some(Vec2::new(105.0, 105.0)),
            ..SpawnOverrides::default()
        },
    );
    world.apply_pending();
    // Make sure all three mutually overlap whatever size the creation hook
    // rolled for the asteroid.
    world
        .find_entity_mut(asteroid_id)
        .expect("asteroid")
        .rect
        .size = Vec2::new(60.0, 60.0);

    run_collision_system(&mut scene, &mut world);
    world.apply_pending();

    // The asteroid destroyed itself reacting to the first pair, yet the
    // later recorded pair still dispatched and damaged the enemy too.
    assert!(world.find_entity(asteroid_id).is_none());
    let enemy = scene.runtime_by_entity.get(&enemy_id).expect("enemy");
    assert_eq!(
        enemy.stats.health,
        ENEMY_START_HEALTH - SHIP_CONTACT_DAMAGE - ASTEROID_CONTACT_DAMAGE
    );
    let player = scene.runtime_by_entity.get(&player_id).expect("player");
    assert_eq!(
        player.stats.health,
        PLAYER_START_HEALTH - SHIP_CONTACT_DAMAGE - ASTEROID_CONTACT_DAMAGE
    );
    // Exactly one explosion despite two reactions destroying the asteroid.
    assert_eq!(count_named(&world, "effect"), 1);
    // The pending queue is empty once the drain completes.
    assert!(scene.collision_queue.is_empty());
    assert_eq!(scene.collision_queue.last_tick_pair_count(), 3);
}

#[test]
fn pause_freezes_the_tick_body_and_resume_continues_counting() {
    let (mut scene, mut world) = loaded_scene();
    for _ in 0..3 {
        scene.update(&idle_input(), &mut world);
    }
    assert_eq!(world.tick_counter(), 3);
    let player_id = scene.player_id.expect("player id");
    let frozen_pos = world.find_entity(player_id).expect("player").rect.pos;
    let frozen_count = world.entity_count();

    scene.update(&idle_input().with_pause_pressed(true), &mut world);
    assert!(world.is_paused());
    for _ in 0..5 {
        scene.update(&input_with(&[InputAction::MoveRight]), &mut world);
    }
    assert_eq!(world.tick_counter(), 3);
    assert_eq!(world.entity_count(), frozen_count);
    assert_eq!(
        world.find_entity(player_id).expect("player").rect.pos,
        frozen_pos
    );

    // Resume: the counter continues from where it stopped, not from zero.
    // The unpausing update already runs a full tick (tick 4).
    scene.update(&idle_input().with_pause_pressed(true), &mut world);
    assert!(!world.is_paused());
    assert_eq!(world.tick_counter(), 4);
    scene.update(&idle_input(), &mut world);
    assert_eq!(world.tick_counter(), 5);
    assert_eq!(scene.spawned_stars, 1);
}

#[test]
fn a_hundred_ticks_spawn_one_hostile_and_twenty_stars() {
    let (mut scene, mut world) = loaded_scene();
    for _ in 0..100 {
        scene.update(&idle_input(), &mut world);
    }
    assert_eq!(scene.spawned_hostiles, 1);
    assert_eq!(scene.spawned_stars, 20);
    assert_eq!(
        count_named(&world, "enemy") + count_named(&world, "asteroid"),
        1
    );
}

#[test]
fn slow_motion_divisor_gates_the_tick_body() {
    let mut scene = RaidScene::new(7, 2, 33);
    let mut world = test_world();
    scene.load(&mut world);
    for _ in 0..10 {
        scene.update(&idle_input(), &mut world);
    }
    // The counter ran to 10, but the body only ran on even ticks, so the
    // only star spawn landed on tick 10 (tick 5 was gated off).
    assert_eq!(world.tick_counter(), 10);
    assert_eq!(scene.spawned_stars, 1);
}

#[test]
fn power_up_effects_apply_their_clamps() {
    let mut scene = test_scene();
    let mut world = test_world();
    let player_id = scene.spawn_from_template(
        &mut world,
        player_template(),
        SpawnOverrides {
            pos: Some(Vec2::new(100.0, 100.0)),
            ..SpawnOverrides::default()
        },
    );
    world.apply_pending();
    scene.player_id = Some(player_id);

    let collect = |scene: &mut RaidScene, world: &mut World, kind: PowerUpKind| {
        scene.spawn_from_template(
            world,
            power_up_template(kind),
            SpawnOverrides {
                pos: Some(Vec2::new(105.0, 105.0)),
                ..SpawnOverrides::default()
            },
        );
        world.apply_pending();
        run_collision_system(scene, world);
        world.apply_pending();
    };

    collect(&mut scene, &mut world, PowerUpKind::SpeedUp);
    let (_, default_cooldown, _) = player_state(&scene);
    assert_eq!(default_cooldown, PLAYER_DEFAULT_BEAM_COOLDOWN - 5);
    assert_eq!(count_power_ups(&world), 0, "power-up consumed");

    for _ in 0..5 {
        collect(&mut scene, &mut world, PowerUpKind::WidthUp);
    }
    let (_, _, beam_width) = player_state(&scene);
    assert_eq!(beam_width, BEAM_WIDTH_MAX);

    // Health is restored one shield at a time, capped at the maximum.
    if let Some(player) = scene.runtime_by_entity.get_mut(&player_id) {
        player.stats.health = PLAYER_MAX_HEALTH - 1;
    }
    collect(&mut scene, &mut world, PowerUpKind::HealthUp);
    collect(&mut scene, &mut world, PowerUpKind::HealthUp);
    let player = scene.runtime_by_entity.get(&player_id).expect("player");
    assert_eq!(player.stats.health, PLAYER_MAX_HEALTH);
}

#[test]
fn effects_follow_live_targets_and_die_on_dangling_handles() {
    let mut scene = test_scene();
    let mut world = test_world();
    let enemy_id = scene.spawn_from_template(
        &mut world,
        enemy_template(),
        SpawnOverrides {
            pos: Some(Vec2::new(200.0, 200.0)),
            ..SpawnOverrides::default()
        },
    );
    let effect_id = scene.spawn_from_template(
        &mut world,
        effect_template(),
        SpawnOverrides {
            pos: Some(Vec2::new(0.0, 0.0)),
            state: Some(KindState::Effect {
                target: Some(enemy_id),
                snap: SnapPoint::Center,
                target_snap: SnapPoint::Center,
                expansion_per_tick: None,
                degrees_per_tick: 0.0,
                age: 0,
                lifetime: 1000,
            }),
            ..SpawnOverrides::default()
        },
    );
    world.apply_pending();

    run_update_system(&mut scene, &idle_input(), &mut world);
    world.apply_pending();
    let enemy_center = world.find_entity(enemy_id).expect("enemy").rect.center();
    let effect_center = world.find_entity(effect_id).expect("effect").rect.center();
    assert_eq!(effect_center, enemy_center);

    // Target disappears; on its next update the follower self-terminates.
    world.despawn(enemy_id);
    world.apply_pending();
    run_update_system(&mut scene, &idle_input(), &mut world);
    world.apply_pending();
    assert!(world.find_entity(effect_id).is_none());
}

#[test]
fn explosions_expand_around_their_center_and_expire() {
    let mut scene = test_scene();
    let mut world = test_world();
    let at = Rect::new(Vec2::new(90.0, 90.0), Vec2::new(20.0, 20.0));
    spawn_explosion(&mut scene, &mut world, at);
    world.apply_pending();

    let effect_id = world.find_by_name("effect").expect("explosion").id;
    let before = world.find_entity(effect_id).expect("effect").rect;
    assert_eq!(before.center(), at.center());

    run_update_system(&mut scene, &idle_input(), &mut world);
    world.apply_pending();
    let after = world.find_entity(effect_id).expect("effect").rect;
    assert_eq!(after.size, before.size + EXPLOSION_EXPANSION_PER_TICK);
    let center_drift = after.center() - at.center();
    assert!(center_drift.x.abs() < 1e-3 && center_drift.y.abs() < 1e-3);

    for _ in 0..=EXPLOSION_LIFETIME {
        run_update_system(&mut scene, &idle_input(), &mut world);
        world.apply_pending();
    }
    assert!(world.find_entity(effect_id).is_none());
}

#[test]
fn purge_drops_offscreen_entities_and_their_runtime_records() {
    let mut scene = test_scene();
    let mut world = test_world();
    let offscreen_id = scene.spawn_from_template(
        &mut world,
        beam_template(),
        SpawnOverrides {
            pos: Some(Vec2::new(200.0, -100.0)),
            ..SpawnOverrides::default()
        },
    );
    let onscreen_id = scene.spawn_from_template(
        &mut world,
        star_template(),
        SpawnOverrides {
            pos: Some(Vec2::new(200.0, 200.0)),
            ..SpawnOverrides::default()
        },
    );
    world.apply_pending();

    run_purge_system(&mut scene, &mut world);

    assert!(world.find_entity(offscreen_id).is_none());
    assert!(world.find_entity(onscreen_id).is_some());
    assert!(!scene.runtime_by_entity.contains_key(&offscreen_id));
    assert!(scene.runtime_by_entity.contains_key(&onscreen_id));
    // No destruction hook ran: purge leaves no explosion behind.
    assert_eq!(count_named(&world, "effect"), 0);
}

#[test]
fn cursor_tracks_the_mouse_and_reports_what_it_touches() {
    let (mut scene, mut world) = loaded_scene();
    // Window twice the viewport size: positions scale down by half.
    let input = idle_input()
        .with_window_size((800, 800))
        .with_cursor_position_px(Some(Vec2::new(400.0, 400.0)));
    scene.update(&input, &mut world);

    let cursor = world.find_by_name("cursor").expect("cursor");
    assert_eq!(cursor.rect.pos, Vec2::new(200.0, 200.0));

    scene.spawn_from_template(
        &mut world,
        enemy_template(),
        SpawnOverrides {
            pos: Some(Vec2::new(190.0, 220.0)),
            ..SpawnOverrides::default()
        },
    );
    world.apply_pending();
    scene.update(&input, &mut world);

    let hud = scene.hud_snapshot(&world).expect("hud");
    assert_eq!(hud.cursor_hit, Some("enemy"));
    assert_eq!(hud.cursor_position, Some(Vec2::new(200.0, 200.0)));
}

#[test]
fn asteroid_creation_randomizes_size_and_spin() {
    let mut scene = test_scene();
    let mut world = test_world();
    let id = scene.spawn_from_template(
        &mut world,
        asteroid_template(),
        SpawnOverrides {
            pos: Some(Vec2::new(100.0, 100.0)),
            ..SpawnOverrides::default()
        },
    );
    world.apply_pending();

    let entity = world.find_entity(id).expect("asteroid");
    let size = entity.rect.size;
    assert_eq!(size.x, size.y);
    assert!((ASTEROID_MIN_SIZE as f32..=ASTEROID_MAX_SIZE as f32).contains(&size.x));

    let KindState::Asteroid { degrees_per_tick } =
        scene.runtime_by_entity.get(&id).expect("runtime").state
    else {
        panic!("asteroid runtime has the wrong kind state");
    };
    assert!((-(ASTEROID_MAX_SPIN as f32)..=ASTEROID_MAX_SPIN as f32).contains(&degrees_per_tick));

    let pos_before = world.find_entity(id).expect("asteroid").rect.pos;
    run_update_system(&mut scene, &idle_input(), &mut world);
    world.apply_pending();
    let entity = world.find_entity(id).expect("asteroid");
    assert_eq!(entity.rect.pos, pos_before + Vec2::new(0.0, 1.0));
    assert_eq!(
        entity.rotation_degrees,
        degrees_per_tick.rem_euclid(360.0)
    );
}

#[test]
fn enemy_tint_washes_out_as_health_drops() {
    let healthy = enemy_color_for_health(10);
    let hurt = enemy_color_for_health(1);
    assert_eq!(healthy, [128, 128, 128, 255]);
    assert!(hurt[0] > hurt[1]);
    assert_eq!(hurt[1], hurt[2]);
}

#[test]
fn hud_shields_follow_player_health_and_never_go_negative() {
    let (mut scene, world) = loaded_scene();
    let hud = scene.hud_snapshot(&world).expect("hud");
    assert_eq!(hud.shields, Some(PLAYER_START_HEALTH));

    let player_id = scene.player_id.expect("player id");
    if let Some(player) = scene.runtime_by_entity.get_mut(&player_id) {
        player.stats.health = -4;
    }
    let hud = scene.hud_snapshot(&world).expect("hud");
    assert_eq!(hud.shields, Some(0));
}

#[test]
fn seeded_scenes_replay_identically() {
    let run = |seed: u64| {
        let mut scene = RaidScene::new(seed, 1, 33);
        let mut world = test_world();
        scene.load(&mut world);
        for _ in 0..250 {
            scene.update(&input_with(&[InputAction::Shoot]), &mut world);
        }
        let mut names: Vec<(&'static str, i32)> = world
            .entities()
            .iter()
            .map(|entity| (entity.name, entity.rect.pos.x as i32))
            .collect();
        names.sort_unstable();
        (world.tick_counter(), world.entity_count(), names)
    };

    assert_eq!(run(42), run(42));
    assert_ne!(run(42).2, run(43).2);
}
