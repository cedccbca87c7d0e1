use crate::constants::CELL_SIZE;
use crate::maze::Maze;
use crate::types::Direction;

use super::utils::{cell_of, cell_origin, snap_axis};

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct StepOutcome {
    pub x: f32,
    pub y: f32,
    pub moved: bool,
}

/// Whether a cell-sized box with its top-left corner at `(x, y)` overlaps a
/// wall.
pub fn check_blocked(maze: &Maze, x: f32, y: f32) -> bool {
    let left = (x / CELL_SIZE).floor() as i32;
    let right = ((x + CELL_SIZE - 1.0) / CELL_SIZE).floor() as i32;
    let top = (y / CELL_SIZE).floor() as i32;
    let bottom = ((y + CELL_SIZE - 1.0) / CELL_SIZE).floor() as i32;

    if top < 0 || bottom >= maze.height() || left < 0 || right >= maze.width() {
        return !maze.in_tunnel_band(y);
    }

    if maze.in_gate(left, right, top, bottom) {
        return false;
    }

    maze.is_wall(left, top)
        || maze.is_wall(right, top)
        || maze.is_wall(left, bottom)
        || maze.is_wall(right, bottom)
}

/// Horizontal wraparound for agents travelling through the tunnel band.
/// The band test uses the agent's position before the move.
pub fn wrap_tunnel(maze: &Maze, current_y: f32, proposed_x: f32) -> f32 {
    if !maze.in_tunnel_band(current_y) {
        return proposed_x;
    }
    let right_edge = maze.pixel_width();
    if proposed_x < -CELL_SIZE {
        right_edge
    } else if proposed_x > right_edge {
        -CELL_SIZE
    } else {
        proposed_x
    }
}

pub fn resolve_step(maze: &Maze, x: f32, y: f32, dir: Direction, speed: f32) -> StepOutcome {
    let (dx, dy) = dir.delta();
    let new_x = x + dx * speed;
    let new_y = y + dy * speed;
    let wrapped_x = wrap_tunnel(maze, y, new_x);

    if !check_blocked(maze, wrapped_x, new_y) {
        return StepOutcome {
            x: wrapped_x,
            y: new_y,
            moved: true,
        };
    }

    StepOutcome {
        x: snap_axis(x),
        y: snap_axis(y),
        moved: false,
    }
}

pub fn snap_to_grid(x: f32, y: f32) -> (f32, f32) {
    (snap_axis(x), snap_axis(y))
}

/// Top-left corner of the cell containing `(x, y)`.
pub fn floor_to_grid(x: f32, y: f32) -> (f32, f32) {
    cell_origin(cell_of(x, y))
}
