use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use image::ImageReader;
use pixels::{Error, Pixels, SurfaceTexture};
use tracing::warn;
use winit::window::Window;

use crate::app::tools::draw_overlay;
use crate::app::{geometry::Rect, Entity, OverlayData, World};

use super::Viewport;

const CLEAR_COLOR: [u8; 4] = [0, 0, 0, 255];

struct LoadedSprite {
    width: u32,
    height: u32,
    rgba: Vec<u8>,
}

/// Pixel source for one entity draw: either its fill color or a sprite
/// stretched over its rect.
enum DrawSource<'a> {
    Fill([u8; 4]),
    Sprite(&'a LoadedSprite),
}

pub struct Renderer {
    window: Arc<Window>,
    pixels: Pixels<'static>,
    viewport: Viewport,
    asset_root: PathBuf,
    sprite_cache: HashMap<&'static str, Option<LoadedSprite>>,
    warned_missing_sprite_keys: HashSet<&'static str>,
    draw_indices: Vec<usize>,
}

impl Renderer {
    pub fn new(window: Arc<Window>, viewport: Viewport, asset_root: PathBuf) -> Result<Self, Error> {
        let size = window.inner_size();
        let pixels = Self::build_pixels(Arc::clone(&window), viewport, size.width, size.height)?;
        Ok(Self {
            window,
            pixels,
            viewport,
            asset_root,
            sprite_cache: HashMap::new(),
            warned_missing_sprite_keys: HashSet::new(),
            draw_indices: Vec::new(),
        })
    }

    /// The framebuffer stays at viewport resolution; only the presentation
    /// surface follows the window.
    pub fn resize_surface(&mut self, width: u32, height: u32) -> Result<(), Error> {
        if width == 0 || height == 0 {
            return Ok(());
        }
        self.pixels = Self::build_pixels(Arc::clone(&self.window), self.viewport, width, height)?;
        Ok(())
    }

    fn build_pixels(
        window: Arc<Window>,
        viewport: Viewport,
        surface_width: u32,
        surface_height: u32,
    ) -> Result<Pixels<'static>, Error> {
        let surface = SurfaceTexture::new(surface_width.max(1), surface_height.max(1), window);
        Pixels::new(viewport.width, viewport.height, surface)
    }

    pub fn render_world(
        &mut self,
        world: &World,
        overlay: Option<&OverlayData>,
    ) -> Result<(), Error> {
        let width = self.viewport.width;
        let height = self.viewport.height;
        if width == 0 || height == 0 {
            return Ok(());
        }

        let asset_root = self.asset_root.as_path();
        let sprite_cache = &mut self.sprite_cache;
        let warned_missing_sprite_keys = &mut self.warned_missing_sprite_keys;
        let frame = self.pixels.frame_mut();

        for chunk in frame.chunks_exact_mut(4) {
            chunk.copy_from_slice(&CLEAR_COLOR);
        }

        collect_sorted_draw_indices(world, &mut self.draw_indices);
        for entity_index in self.draw_indices.iter().copied() {
            let entity = &world.entities()[entity_index];
            draw_entity(
                frame,
                width,
                height,
                entity,
                sprite_cache,
                warned_missing_sprite_keys,
                asset_root,
            );
        }

        if let Some(data) = overlay {
            draw_overlay(frame, width, height, data);
        }

        self.pixels.render()
    }
}

/// Back-to-front by ascending depth; spawn order breaks ties so the order is
/// deterministic across frames.
fn collect_sorted_draw_indices(world: &World, out: &mut Vec<usize>) {
    out.clear();
    out.extend(0..world.entities().len());
    out.sort_by_key(|index| world.entities()[*index].draw_order_key());
}

fn draw_entity(
    frame: &mut [u8],
    width: u32,
    height: u32,
    entity: &Entity,
    sprite_cache: &mut HashMap<&'static str, Option<LoadedSprite>>,
    warned_missing_sprite_keys: &mut HashSet<&'static str>,
    asset_root: &Path,
) {
    let source = match entity.renderable.sprite_key {
        Some(key) => {
            match resolve_cached_sprite(sprite_cache, warned_missing_sprite_keys, asset_root, key) {
                Some(sprite) => DrawSource::Sprite(sprite),
                None => DrawSource::Fill(entity.renderable.color),
            }
        }
        None => DrawSource::Fill(entity.renderable.color),
    };

    draw_rect_with_source(
        frame,
        width,
        height,
        entity.rect,
        entity.rotation_degrees,
        &source,
    );
}

/// Rasterizes `rect` filled from `source`, rotated about its own center by
/// `rotation_degrees`. The rotation never leaks into the next draw: it is a
/// parameter, not renderer state.
fn draw_rect_with_source(
    frame: &mut [u8],
    width: u32,
    height: u32,
    rect: Rect,
    rotation_degrees: f32,
    source: &DrawSource<'_>,
) {
    let bounds = rect.bounds();
    let rect_width = bounds.right - bounds.left;
    let rect_height = bounds.bottom - bounds.top;
    if rect_width <= 0.0 || rect_height <= 0.0 {
        return;
    }

    let theta = rotation_degrees.rem_euclid(360.0).to_radians();
    if theta == 0.0 {
        draw_axis_aligned(frame, width, height, bounds.left, bounds.top, rect_width, rect_height, source);
        return;
    }

    let center_x = (bounds.left + bounds.right) * 0.5;
    let center_y = (bounds.top + bounds.bottom) * 0.5;
    let half_diagonal = 0.5 * (rect_width * rect_width + rect_height * rect_height).sqrt();

    let start_x = ((center_x - half_diagonal).floor() as i32).max(0);
    let end_x = ((center_x + half_diagonal).ceil() as i32).min(width as i32);
    let start_y = ((center_y - half_diagonal).floor() as i32).max(0);
    let end_y = ((center_y + half_diagonal).ceil() as i32).min(height as i32);

    for py in start_y..end_y {
        for px in start_x..end_x {
            let dx = px as f32 + 0.5 - center_x;
            let dy = py as f32 + 0.5 - center_y;
            let Some((u, v)) = rotated_local_uv(dx, dy, theta, rect_width, rect_height) else {
                continue;
            };
            let color = sample_source(source, u, v);
            if color[3] == 0 {
                continue;
            }
            write_pixel_rgba_clipped(frame, width as usize, px, py, color);
        }
    }
}

fn draw_axis_aligned(
    frame: &mut [u8],
    width: u32,
    height: u32,
    left: f32,
    top: f32,
    rect_width: f32,
    rect_height: f32,
    source: &DrawSource<'_>,
) {
    let start_x = (left.round() as i32).max(0);
    let start_y = (top.round() as i32).max(0);
    let end_x = ((left + rect_width).round() as i32).min(width as i32);
    let end_y = ((top + rect_height).round() as i32).min(height as i32);
    if start_x >= end_x || start_y >= end_y {
        return;
    }

    for py in start_y..end_y {
        for px in start_x..end_x {
            let u = (px as f32 + 0.5 - left) / rect_width;
            let v = (py as f32 + 0.5 - top) / rect_height;
            let color = sample_source(source, u, v);
            if color[3] == 0 {
                continue;
            }
            write_pixel_rgba_clipped(frame, width as usize, px, py, color);
        }
    }
}

/// Maps a pixel offset from the rect center into normalized (u, v) over the
/// unrotated rect, or None when the pixel falls outside the rotated rect.
fn rotated_local_uv(
    dx: f32,
    dy: f32,
    theta: f32,
    rect_width: f32,
    rect_height: f32,
) -> Option<(f32, f32)> {
    let (sin, cos) = theta.sin_cos();
    let local_x = cos * dx + sin * dy;
    let local_y = -sin * dx + cos * dy;
    let half_w = rect_width * 0.5;
    let half_h = rect_height * 0.5;
    if local_x.abs() > half_w || local_y.abs() > half_h {
        return None;
    }
    Some(((local_x + half_w) / rect_width, (local_y + half_h) / rect_height))
}

fn sample_source(source: &DrawSource<'_>, u: f32, v: f32) -> [u8; 4] {
    match source {
        DrawSource::Fill(color) => *color,
        DrawSource::Sprite(sprite) => {
            let src_x = ((u * sprite.width as f32).floor() as u32).min(sprite.width - 1) as usize;
            let src_y = ((v * sprite.height as f32).floor() as u32).min(sprite.height - 1) as usize;
            let offset = (src_y * sprite.width as usize + src_x) * 4;
            match sprite.rgba.get(offset..offset + 4) {
                Some(texel) => [texel[0], texel[1], texel[2], texel[3]],
                None => [0, 0, 0, 0],
            }
        }
    }
}

fn write_pixel_rgba_clipped(frame: &mut [u8], width: usize, x: i32, y: i32, color: [u8; 4]) {
    if x < 0 || y < 0 {
        return;
    }
    let x = x as usize;
    let y = y as usize;
    let Some(pixel_offset) = y.checked_mul(width).and_then(|row| row.checked_add(x)) else {
        return;
    };
    let Some(byte_offset) = pixel_offset.checked_mul(4) else {
        return;
    };
    let Some(end) = byte_offset.checked_add(4) else {
        return;
    };
    if end > frame.len() {
        return;
    }
    frame[byte_offset..end].copy_from_slice(&color);
}

fn resolve_cached_sprite<'a>(
    cache: &'a mut HashMap<&'static str, Option<LoadedSprite>>,
    warned_missing_sprite_keys: &mut HashSet<&'static str>,
    asset_root: &Path,
    key: &'static str,
) -> Option<&'a LoadedSprite> {
    if !cache.contains_key(key) {
        let sprite = match resolve_sprite_image_path(asset_root, key) {
            Ok(path) => match load_sprite_rgba(&path) {
                Ok(sprite) => Some(sprite),
                Err(reason) => {
                    warn_sprite_load_once(
                        warned_missing_sprite_keys,
                        key,
                        Some(path.as_path()),
                        reason.as_str(),
                    );
                    None
                }
            },
            Err(reason) => {
                warn_sprite_load_once(warned_missing_sprite_keys, key, None, reason.as_str());
                None
            }
        };
        cache.insert(key, sprite);
    }
    cache.get(key).and_then(Option::as_ref)
}

fn resolve_sprite_image_path(asset_root: &Path, key: &str) -> Result<PathBuf, String> {
    if !is_valid_sprite_key(key) {
        return Err(format!("invalid_key:{key}"));
    }
    Ok(asset_root
        .join("base")
        .join("sprites")
        .join(format!("{key}.png")))
}

fn is_valid_sprite_key(key: &str) -> bool {
    !key.is_empty()
        && key
            .chars()
            .all(|ch| ch.is_ascii_lowercase() || ch.is_ascii_digit() || ch == '_')
}

fn load_sprite_rgba(path: &Path) -> Result<LoadedSprite, String> {
    let reader = ImageReader::open(path).map_err(|error| format!("file_open_failed:{error}"))?;
    let decoded = reader
        .decode()
        .map_err(|error| format!("decode_failed:{error}"))?;
    let image = decoded.to_rgba8();
    if image.width() == 0 || image.height() == 0 {
        return Err("empty_image".to_string());
    }
    Ok(LoadedSprite {
        width: image.width(),
        height: image.height(),
        rgba: image.into_raw(),
    })
}

fn warn_sprite_load_once(
    warned_keys: &mut HashSet<&'static str>,
    key: &'static str,
    resolved_path: Option<&Path>,
    reason: &str,
) {
    if !warned_keys.insert(key) {
        return;
    }
    let path_display = resolved_path
        .map(|path| path.display().to_string())
        .unwrap_or_else(|| "<unresolved>".to_string());
    warn!(
        sprite_key = key,
        path = %path_display,
        reason = reason,
        "renderer_sprite_load_failed_using_fill_color"
    );
}
