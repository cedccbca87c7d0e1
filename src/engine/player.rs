use crate::constants::CELL_SIZE;
use crate::maze::Maze;
use crate::types::{Direction, PlayerView, Vec2};

use super::motion::{check_blocked, resolve_step};
use super::utils::{cell_of, snap_axis};

#[derive(Clone, Debug)]
pub(crate) struct Player {
    pub x: f32,
    pub y: f32,
    pub dir: Direction,
    pub next_dir: Direction,
    pub moved: bool,
}

/// Read-only copy of the player handed to hunter decisions.
#[derive(Clone, Copy, Debug)]
pub(crate) struct PlayerSnapshot {
    pub x: f32,
    pub y: f32,
    pub dir: Direction,
    pub cell: Vec2,
}

impl Player {
    pub fn spawn(cell: Vec2) -> Self {
        Self {
            x: cell.x as f32 * CELL_SIZE,
            y: cell.y as f32 * CELL_SIZE,
            dir: Direction::Left,
            next_dir: Direction::Left,
            moved: false,
        }
    }

    pub fn snapshot(&self) -> PlayerSnapshot {
        PlayerSnapshot {
            x: self.x,
            y: self.y,
            dir: self.dir,
            cell: cell_of(self.x, self.y),
        }
    }

    pub fn view(&self) -> PlayerView {
        PlayerView {
            x: self.x,
            y: self.y,
            dir: self.dir,
            next_dir: self.next_dir,
            moved: self.moved,
        }
    }

    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }

    /// One motion sub-step: honor a queued turn at a cell alignment, then
    /// advance along the current direction.
    pub fn advance(&mut self, maze: &Maze, speed: f32) {
        if self.next_dir != self.dir {
            let center_x = snap_axis(self.x);
            let center_y = snap_axis(self.y);
            // Strictly closer than one step, otherwise a blocked turn re-snaps every step.
            if (self.x - center_x).abs() < speed && (self.y - center_y).abs() < speed {
                self.x = center_x;
                self.y = center_y;
                let (dx, dy) = self.next_dir.delta();
                let next_x = center_x + dx * CELL_SIZE;
                let next_y = center_y + dy * CELL_SIZE;
                if !check_blocked(maze, next_x, next_y) {
                    self.dir = self.next_dir;
                }
            }
        }

        let outcome = resolve_step(maze, self.x, self.y, self.dir, speed);
        self.x = outcome.x;
        self.y = outcome.y;
        self.moved = outcome.moved && self.dir != Direction::None;
    }
}
