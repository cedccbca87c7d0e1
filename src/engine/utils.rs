use crate::constants::CELL_SIZE;
use crate::types::Vec2;

/// Cell containing a continuous coordinate (floor division).
pub(crate) fn cell_of(x: f32, y: f32) -> Vec2 {
    Vec2 {
        x: (x / CELL_SIZE).floor() as i32,
        y: (y / CELL_SIZE).floor() as i32,
    }
}

pub(crate) fn cell_origin(cell: Vec2) -> (f32, f32) {
    (cell.x as f32 * CELL_SIZE, cell.y as f32 * CELL_SIZE)
}

/// Nearest cell alignment on one axis, rounding halves up.
pub(crate) fn snap_axis(value: f32) -> f32 {
    (value / CELL_SIZE + 0.5).floor() * CELL_SIZE
}

pub(crate) fn distance(ax: f32, ay: f32, bx: f32, by: f32) -> f32 {
    let dx = ax - bx;
    let dy = ay - by;
    (dx * dx + dy * dy).sqrt()
}
