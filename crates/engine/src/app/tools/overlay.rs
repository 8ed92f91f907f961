use crate::app::{HudSnapshot, LoopMetricsSnapshot};

const GLYPH_WIDTH: i32 = 3;
const GLYPH_HEIGHT: i32 = 5;
const TEXT_SCALE: i32 = 2;
const GLYPH_ADVANCE: i32 = (GLYPH_WIDTH + 1) * TEXT_SCALE;
const LINE_ADVANCE: i32 = (GLYPH_HEIGHT + 2) * TEXT_SCALE;

const STATS_STRIP_HEIGHT: i32 = 33;
const STATS_STRIP_COLOR: [u8; 4] = [51, 51, 51, 255];
const SHIELDS_HEALTHY_COLOR: [u8; 4] = [0, 119, 0, 255];
const SHIELDS_CRITICAL_COLOR: [u8; 4] = [220, 40, 40, 255];
const SHIELDS_SHADOW_COLOR: [u8; 4] = [255, 255, 255, 255];
const SHIELDS_HEALTHY_THRESHOLD: i32 = 3;

const PANEL_TEXT_COLOR: [u8; 4] = [244, 248, 252, 255];
const PANEL_BG_COLOR: [u8; 4] = [10, 12, 16, 210];
const PANEL_BORDER_COLOR: [u8; 4] = [92, 106, 126, 255];
const PANEL_PADDING: i32 = 4 * TEXT_SCALE;

/// Everything the overlay shows for one frame: loop metrics plus whatever
/// live values the scene published.
#[derive(Debug, Clone)]
pub(crate) struct OverlayData {
    pub metrics: LoopMetricsSnapshot,
    pub tick: u64,
    pub paused: bool,
    pub entity_count: usize,
    pub show_debug_panel: bool,
    pub hud: Option<HudSnapshot>,
}

pub(crate) fn draw_overlay(frame: &mut [u8], width: u32, height: u32, data: &OverlayData) {
    if width == 0 || height == 0 {
        return;
    }

    draw_stats_strip(frame, width, height, data);

    if data.show_debug_panel {
        draw_debug_panel(frame, width, height, data);
    }
}

/// The in-game stats strip across the top of the viewport: shield bar, and a
/// pause marker when the sim is held.
fn draw_stats_strip(frame: &mut [u8], width: u32, height: u32, data: &OverlayData) {
    draw_filled_rect(
        frame,
        width,
        height,
        0,
        0,
        width as i32,
        STATS_STRIP_HEIGHT,
        STATS_STRIP_COLOR,
    );

    let text_y = (STATS_STRIP_HEIGHT - GLYPH_HEIGHT * TEXT_SCALE) / 2;
    if let Some(shields) = data.hud.as_ref().and_then(|hud| hud.shields) {
        let bars = shields.clamp(0, 10) as usize;
        let line = format!("SHIELDS: {}", "|".repeat(bars));
        let color = if shields > SHIELDS_HEALTHY_THRESHOLD {
            SHIELDS_HEALTHY_COLOR
        } else {
            SHIELDS_CRITICAL_COLOR
        };
        // Shadow first, one pixel off, then the colored text on top.
        draw_text(frame, width, height, 5 + 1, text_y + 1, &line, SHIELDS_SHADOW_COLOR);
        draw_text(frame, width, height, 5, text_y, &line, color);
    }

    if data.paused {
        let label = "PAUSED";
        let label_width = label.len() as i32 * GLYPH_ADVANCE;
        let x = width as i32 - label_width - 5;
        draw_text(frame, width, height, x, text_y, label, PANEL_TEXT_COLOR);
    }
}

fn draw_debug_panel(frame: &mut [u8], width: u32, height: u32, data: &OverlayData) {
    let lines = build_debug_lines(data);
    if lines.is_empty() {
        return;
    }

    let longest_line_chars = lines
        .iter()
        .map(|line| line.chars().count() as i32)
        .max()
        .unwrap_or(0);
    let panel_width = longest_line_chars * GLYPH_ADVANCE + PANEL_PADDING * 2;
    let panel_height = lines.len() as i32 * LINE_ADVANCE + PANEL_PADDING * 2;
    let panel_left = 4;
    let panel_top = STATS_STRIP_HEIGHT + 4;

    draw_filled_rect(
        frame,
        width,
        height,
        panel_left,
        panel_top,
        panel_width,
        panel_height,
        PANEL_BG_COLOR,
    );
    draw_rect_outline(
        frame,
        width,
        height,
        panel_left,
        panel_top,
        panel_width,
        panel_height,
        PANEL_BORDER_COLOR,
    );

    let mut y = panel_top + PANEL_PADDING;
    for line in lines {
        draw_text(
            frame,
            width,
            height,
            panel_left + PANEL_PADDING,
            y,
            &line,
            PANEL_TEXT_COLOR,
        );
        y += LINE_ADVANCE;
    }
}

fn build_debug_lines(data: &OverlayData) -> Vec<String> {
    let mut lines = vec![
        format!(
            "FPS {:.0} TPS {:.0} {:.2}MS",
            data.metrics.fps, data.metrics.tps, data.metrics.frame_time_ms
        ),
        format!("TICK {}", data.tick),
        format!("ENTITIES {}", data.entity_count),
    ];

    if let Some(hud) = data.hud.as_ref() {
        if let Some(cursor) = hud.cursor_position {
            lines.push(format!("CURSOR {:.0},{:.0}", cursor.x, cursor.y));
        }
        if let Some(hit) = hud.cursor_hit {
            lines.push(format!("HIT {hit}"));
        }
        lines.extend(hud.extra_lines.iter().cloned());
    }

    lines
}

fn draw_text(
    frame: &mut [u8],
    width: u32,
    height: u32,
    mut x: i32,
    y: i32,
    text: &str,
    color: [u8; 4],
) {
    for ch in text.chars() {
        let glyph = glyph_for(ch.to_ascii_uppercase());
        draw_glyph(frame, width, height, x, y, glyph, color);
        x += GLYPH_ADVANCE;
    }
}

fn draw_glyph(frame: &mut [u8], width: u32, height: u32, x: i32, y: i32, glyph: Glyph, color: [u8; 4]) {
    if width == 0 || height == 0 {
        return;
    }

    let width_i32 = width as i32;
    let height_i32 = height as i32;

    for (row_index, row_bits) in glyph.rows.iter().enumerate() {
        let glyph_y = y + row_index as i32 * TEXT_SCALE;
        for col in 0..GLYPH_WIDTH {
            if (row_bits & (1 << (GLYPH_WIDTH - 1 - col))) == 0 {
                continue;
            }
            let glyph_x = x + col * TEXT_SCALE;
            for sy in 0..TEXT_SCALE {
                let pixel_y = glyph_y + sy;
                if pixel_y < 0 || pixel_y >= height_i32 {
                    continue;
                }
                for sx in 0..TEXT_SCALE {
                    let pixel_x = glyph_x + sx;
                    if pixel_x < 0 || pixel_x >= width_i32 {
                        continue;
                    }
                    write_pixel_rgba(
                        frame,
                        width as usize,
                        pixel_x as usize,
                        pixel_y as usize,
                        color,
                    );
                }
            }
        }
    }
}

fn write_pixel_rgba(frame: &mut [u8], width: usize, x: usize, y: usize, color: [u8; 4]) {
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

#[allow(clippy::too_many_arguments)]
fn draw_filled_rect(
    frame: &mut [u8],
    width: u32,
    height: u32,
    x: i32,
    y: i32,
    rect_width: i32,
    rect_height: i32,
    color: [u8; 4],
) {
    let start_x = x.max(0);
    let start_y = y.max(0);
    let end_x = (x + rect_width).min(width as i32);
    let end_y = (y + rect_height).min(height as i32);
    if end_x <= start_x || end_y <= start_y {
        return;
    }

    let width_usize = width as usize;
    for py in start_y..end_y {
        for px in start_x..end_x {
            write_pixel_rgba(frame, width_usize, px as usize, py as usize, color);
        }
    }
}

#[allow(clippy::too_many_arguments)]
fn draw_rect_outline(
    frame: &mut [u8],
    width: u32,
    height: u32,
    x: i32,
    y: i32,
    rect_width: i32,
    rect_height: i32,
    color: [u8; 4],
) {
    if rect_width <= 1 || rect_height <= 1 {
        return;
    }
    draw_filled_rect(frame, width, height, x, y, rect_width, 1, color);
    draw_filled_rect(frame, width, height, x, y + rect_height - 1, rect_width, 1, color);
    draw_filled_rect(frame, width, height, x, y, 1, rect_height, color);
    draw_filled_rect(frame, width, height, x + rect_width - 1, y, 1, rect_height, color);
}

#[derive(Debug, Clone, Copy)]
struct Glyph {
    rows: [u8; GLYPH_HEIGHT as usize],
}

const SPACE_GLYPH: Glyph = Glyph {
    rows: [0, 0, 0, 0, 0],
};

/// Fallback for characters the 3x5 face does not cover.
const BLOCK_GLYPH: Glyph = Glyph {
    rows: [0b111, 0b111, 0b111, 0b111, 0b111],
};

fn glyph_for(ch: char) -> Glyph {
    let rows = match ch {
        ' ' => return SPACE_GLYPH,
        '0' => [0b111, 0b101, 0b101, 0b101, 0b111],
        '1' => [0b010, 0b110, 0b010, 0b010, 0b111],
        '2' => [0b111, 0b001, 0b111, 0b100, 0b111],
        '3' => [0b111, 0b001, 0b111, 0b001, 0b111],
        '4' => [0b101, 0b101, 0b111, 0b001, 0b001],
        '5' => [0b111, 0b100, 0b111, 0b001, 0b111],
        '6' => [0b111, 0b100, 0b111, 0b101, 0b111],
        '7' => [0b111, 0b001, 0b001, 0b010, 0b010],
        '8' => [0b111, 0b101, 0b111, 0b101, 0b111],
        '9' => [0b111, 0b101, 0b111, 0b001, 0b111],
        'A' => [0b010, 0b101, 0b111, 0b101, 0b101],
        'B' => [0b110, 0b101, 0b110, 0b101, 0b110],
        'C' => [0b011, 0b100, 0b100, 0b100, 0b011],
        'D' => [0b110, 0b101, 0b101, 0b101, 0b110],
        'E' => [0b111, 0b100, 0b110, 0b100, 0b111],
        'F' => [0b111, 0b100, 0b110, 0b100, 0b100],
        'G' => [0b011, 0b100, 0b101, 0b101, 0b011],
        'H' => [0b101, 0b101, 0b111, 0b101, 0b101],
        'I' => [0b111, 0b010, 0b010, 0b010, 0b111],
        'J' => [0b001, 0b001, 0b001, 0b101, 0b010],
        'K' => [0b101, 0b101, 0b110, 0b101, 0b101],
        'L' => [0b100, 0b100, 0b100, 0b100, 0b111],
        'M' => [0b101, 0b111, 0b101, 0b101, 0b101],
        'N' => [0b110, 0b101, 0b101, 0b101, 0b101],
        'O' => [0b010, 0b101, 0b101, 0b101, 0b010],
        'P' => [0b110, 0b101, 0b110, 0b100, 0b100],
        'Q' => [0b010, 0b101, 0b101, 0b110, 0b011],
        'R' => [0b110, 0b101, 0b110, 0b101, 0b101],
        'S' => [0b011, 0b100, 0b010, 0b001, 0b110],
        'T' => [0b111, 0b010, 0b010, 0b010, 0b010],
        'U' => [0b101, 0b101, 0b101, 0b101, 0b111],
        'V' => [0b101, 0b101, 0b101, 0b101, 0b010],
        'W' => [0b101, 0b101, 0b101, 0b111, 0b101],
        'X' => [0b101, 0b101, 0b010, 0b101, 0b101],
        'Y' => [0b101, 0b101, 0b010, 0b010, 0b010],
        'Z' => [0b111, 0b001, 0b010, 0b100, 0b111],
        ':' => [0b000, 0b010, 0b000, 0b010, 0b000],
        '.' => [0b000, 0b000, 0b000, 0b000, 0b010],
        ',' => [0b000, 0b000, 0b000, 0b010, 0b100],
        '-' => [0b000, 0b000, 0b111, 0b000, 0b000],
        '|' => [0b010, 0b010, 0b010, 0b010, 0b010],
        '/' => [0b001, 0b001, 0b010, 0b100, 0b100],
        '(' => [0b001, 0b010, 0b010, 0b010, 0b001],
        ')' => [0b100, 0b010, 0b010, 0b010, 0b100],
        '%' => [0b101, 0b001, 0b010, 0b100, 0b101],
        '+' => [0b000, 0b010, 0b111, 0b010, 0b000],
        '=' => [0b000, 0b111, 0b000, 0b111, 0b000],
        '>' => [0b100, 0b010, 0b001, 0b010, 0b100],
        '<' => [0b001, 0b010, 0b100, 0b010, 0b001],
        '_' => [0b000, 0b000, 0b000, 0b000, 0b111],
        _ => return BLOCK_GLYPH,
    };
    Glyph { rows }
}
