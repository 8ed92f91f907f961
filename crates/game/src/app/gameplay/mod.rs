use std::collections::{HashMap, HashSet};

use engine::{
    rect_within, snap_offset, EntityDesc, EntityId, HudSnapshot, InputAction, InputSnapshot, Rect,
    Renderable, Scene, SnapPoint, Vec2, World,
};
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;
use tracing::{debug, info};

use crate::app::config::RaidSettings;

const PLAYER_SIZE: f32 = 33.0;
const PLAYER_SPEED: f32 = 1.0;
const PLAYER_START_HEALTH: i32 = 10;
const PLAYER_MAX_HEALTH: i32 = 10;
const PLAYER_DEFAULT_BEAM_COOLDOWN: u32 = 100;
const PLAYER_MIN_BEAM_COOLDOWN: u32 = 5;
const SHIP_CONTACT_DAMAGE: i32 = 5;

const BEAM_SIZE: Vec2 = Vec2::new(3.0, 33.0);
const BEAM_SPEED: f32 = 5.0;
const BEAM_DAMAGE: i32 = 1;
const BEAM_WIDTH_STEP: f32 = 3.0;
const BEAM_WIDTH_MAX: f32 = 12.0;

const ENEMY_SIZE: Vec2 = Vec2::new(33.0, -33.0);
const ENEMY_SPEED: f32 = 1.0;
const ENEMY_START_HEALTH: i32 = 1;
const ENEMY_START_BEAM_COOLDOWN: u32 = 100;
const ENEMY_BEAM_COOLDOWN_MIN: u32 = 100;
const ENEMY_BEAM_COOLDOWN_MAX: u32 = 300;
const ENEMY_MIN_FIRING_ALTITUDE: f32 = 13.0;

const ASTEROID_MIN_SIZE: i32 = 33;
const ASTEROID_MAX_SIZE: i32 = 70;
const ASTEROID_START_HEALTH: i32 = 10;
const ASTEROID_CONTACT_DAMAGE: i32 = 10;
const ASTEROID_MAX_SPIN: i32 = 3;

const COLLECTABLE_SIZE: f32 = 24.0;
const COLLECTABLE_SPEED: f32 = 0.77;
const COLLECTABLE_DRIFT_PERIOD: f32 = 100.0;

const STAR_SIZE: f32 = 3.0;
const STAR_SPEED: f32 = 2.0;

const EFFECT_SIZE: f32 = 33.0;
const EFFECT_DEFAULT_LIFETIME: u32 = 20;
const EXPLOSION_START_SIZE: f32 = 3.0;
const EXPLOSION_LIFETIME: u32 = 37;
const EXPLOSION_EXPANSION_PER_TICK: Vec2 = Vec2::new(1.33, 1.33);
const EXPLOSION_MAX_SPIN: i32 = 2;

const CURSOR_SIZE: f32 = 3.0;

const ENEMY_SPAWN_PERIOD: u64 = 100;
const STAR_SPAWN_PERIOD: u64 = 5;

const DEPTH_STAR: i32 = -100;
const DEPTH_ASTEROID: i32 = -5;
const DEPTH_SHIP: i32 = 1;
const DEPTH_PLAYER_BEAM: i32 = 4;
const DEPTH_BEAM: i32 = 5;
const DEPTH_POWER_UP: i32 = 10;
const DEPTH_EFFECT: i32 = 20;
const DEPTH_CURSOR: i32 = 30;

const PLAYER_COLOR: [u8; 4] = [200, 0, 0, 255];
const PLAYER_BEAM_COLOR: [u8; 4] = [0, 255, 0, 204];
const ENEMY_BEAM_COLOR: [u8; 4] = [51, 204, 255, 255];
const BEAM_DEFAULT_COLOR: [u8; 4] = [0, 0, 200, 77];
const ASTEROID_COLOR: [u8; 4] = [200, 0, 0, 255];
const COLLECTABLE_COLOR: [u8; 4] = [0, 255, 255, 255];
const STAR_COLOR: [u8; 4] = [85, 85, 85, 255];
const EFFECT_COLOR: [u8; 4] = [255, 0, 0, 255];
const CURSOR_COLOR: [u8; 4] = [0, 255, 255, 255];

const RAID_SYSTEM_ORDER_TEXT: &str = "Update>Collision>Purge>Spawner";

include!("types.rs");
include!("systems.rs");
include!("scene_state.rs");
include!("scene_impl.rs");
include!("util.rs");

pub(crate) fn build_scene(settings: &RaidSettings, seed: u64) -> Box<dyn Scene> {
    Box::new(RaidScene::new(seed, settings.slowdown, settings.drop_percent))
}

#[cfg(test)]
mod tests {
    include!("tests.rs");
}
