/// Unit direction associated with a compass anchor; `Center` is zero.
fn compass_vector(point: SnapPoint) -> Vec2 {
    match point {
        SnapPoint::N => Vec2::new(0.0, -1.0),
        SnapPoint::S => Vec2::new(0.0, 1.0),
        SnapPoint::W => Vec2::new(-1.0, 0.0),
        SnapPoint::E => Vec2::new(1.0, 0.0),
        SnapPoint::NW => Vec2::new(-1.0, -1.0),
        SnapPoint::NE => Vec2::new(1.0, -1.0),
        SnapPoint::SW => Vec2::new(-1.0, 1.0),
        SnapPoint::SE => Vec2::new(1.0, 1.0),
        SnapPoint::Center => Vec2::ZERO,
    }
}

/// Enemies drift downward or diagonally-downward, or hold position.
fn enemy_flight_choice(rng: &mut Pcg32) -> Vec2 {
    const CHOICES: [Vec2; 4] = [
        Vec2::new(0.0, 1.0),
        Vec2::new(-1.0, 1.0),
        Vec2::new(1.0, 1.0),
        Vec2::ZERO,
    ];
    CHOICES[rng.gen_range(0..CHOICES.len())]
}

/// Red tint that washes out as the enemy takes damage: hue 0 with
/// saturation (10 - health) * 5 percent at half lightness.
fn enemy_color_for_health(health: i32) -> [u8; 4] {
    let saturation = ((10 - health).clamp(0, 20) as f32 * 5.0 / 100.0).min(1.0);
    let red = 0.5 + saturation * 0.5;
    let grey = 0.5 - saturation * 0.5;
    [
        (red * 255.0).round() as u8,
        (grey * 255.0).round() as u8,
        (grey * 255.0).round() as u8,
        255,
    ]
}

/// Window-pixel cursor position mapped into viewport coordinates.
fn cursor_view_position(cursor_px: Vec2, window_size: (u32, u32), view_rect: Rect) -> Vec2 {
    let (window_width, window_height) = window_size;
    if window_width == 0 || window_height == 0 {
        return cursor_px;
    }
    Vec2::new(
        cursor_px.x * view_rect.size.x / window_width as f32,
        cursor_px.y * view_rect.size.y / window_height as f32,
    )
}

/// Random spawn x such that an entity of the given width starts on-screen.
fn spawn_column(rng: &mut Pcg32, view_rect: Rect, entity_width: f32) -> f32 {
    let max = ((view_rect.size.x + 1.0 - entity_width) as i32).max(1);
    rng.gen_range(0..max) as f32
}
