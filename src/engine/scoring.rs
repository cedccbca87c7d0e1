use std::collections::BTreeSet;

use crate::config::SimConfig;
use crate::constants::CELL_SIZE;
use crate::error::{SimError, SimResult};
use crate::maze::Maze;
use crate::types::{GameOverReason, RuntimeEvent, Vec2};

use super::hunters::Hunter;
use super::player::Player;
use super::schedule::{Deferred, Schedule};
use super::utils::{cell_of, distance};

/// Score, collectibles and power-up state for one game.
#[derive(Clone, Debug)]
pub(crate) struct Board {
    pub dots: BTreeSet<(i32, i32)>,
    pub power_pellets: BTreeSet<(i32, i32)>,
    pub score: u32,
    pub high_score: u32,
    pub powered: bool,
    /// Bumped on every pellet; only the matching expiry ends the power-up.
    pub power_generation: u64,
}

impl Board {
    pub fn new(maze: &Maze, high_score: u32) -> Self {
        Self {
            dots: maze.dot_cells(),
            power_pellets: maze.power_pellet_cells(),
            score: 0,
            high_score,
            powered: false,
            power_generation: 0,
        }
    }

    pub fn award(&mut self, points: u32) {
        self.score = self.score.saturating_add(points);
        self.high_score = self.high_score.max(self.score);
    }

    pub fn is_cleared(&self) -> bool {
        self.dots.is_empty() && self.power_pellets.is_empty()
    }

    /// Returns whether `generation` was the governing activation.
    pub fn expire_power(&mut self, generation: u64) -> bool {
        if !self.powered || generation != self.power_generation {
            return false;
        }
        self.powered = false;
        true
    }

    /// Proximity checks after a motion sub-step. Returns the game-over
    /// reason when this resolution ends the game.
    pub fn resolve(
        &mut self,
        player: &Player,
        hunters: &mut [Hunter],
        schedule: &mut Schedule,
        now_ms: u64,
        config: &SimConfig,
        events: &mut Vec<RuntimeEvent>,
    ) -> SimResult<Option<GameOverReason>> {
        if !player.is_finite() {
            return Err(SimError::NonFinitePosition {
                agent: "player".to_string(),
                x: player.x,
                y: player.y,
            });
        }

        let center_x = player.x + CELL_SIZE / 2.0;
        let center_y = player.y + CELL_SIZE / 2.0;

        let eaten = take_within_reach(&mut self.dots, center_x, center_y);
        if !eaten.is_empty() {
            self.award(config.dot_score.saturating_mul(eaten.len() as u32));
            events.push(RuntimeEvent::Chomp { count: eaten.len() });
        }

        for cell in take_within_reach(&mut self.power_pellets, center_x, center_y) {
            self.award(config.power_pellet_score);
            self.powered = true;
            self.power_generation += 1;
            schedule.push(
                now_ms.saturating_add(config.power_duration_ms),
                Deferred::PowerUpExpiry {
                    generation: self.power_generation,
                },
            );
            events.push(RuntimeEvent::PowerPelletCollected {
                x: cell.x,
                y: cell.y,
            });
        }

        for hunter in hunters.iter_mut() {
            if distance(hunter.x, hunter.y, player.x, player.y) >= CELL_SIZE {
                continue;
            }
            if self.powered {
                self.award(config.hunter_score);
                hunter.send_home();
                schedule.push(
                    now_ms.saturating_add(config.siren_resume_delay_ms),
                    Deferred::SirenResume,
                );
                events.push(RuntimeEvent::HunterEaten {
                    hunter_id: hunter.id().to_string(),
                });
            } else {
                events.push(RuntimeEvent::PlayerCaught {
                    hunter_id: hunter.id().to_string(),
                });
                return Ok(Some(GameOverReason::Caught));
            }
        }

        if self.is_cleared() {
            events.push(RuntimeEvent::MazeCleared);
            return Ok(Some(GameOverReason::Cleared));
        }
        Ok(None)
    }
}

/// Removes and returns the items whose cell center lies strictly within half
/// a cell of `(x, y)`. Only the 3x3 block around the point can qualify.
fn take_within_reach(items: &mut BTreeSet<(i32, i32)>, x: f32, y: f32) -> Vec<Vec2> {
    let origin = cell_of(x, y);
    let mut taken = Vec::new();
    for dy in -1..=1 {
        for dx in -1..=1 {
            let key = (origin.x + dx, origin.y + dy);
            if !items.contains(&key) {
                continue;
            }
            let item_x = key.0 as f32 * CELL_SIZE + CELL_SIZE / 2.0;
            let item_y = key.1 as f32 * CELL_SIZE + CELL_SIZE / 2.0;
            if distance(item_x, item_y, x, y) < CELL_SIZE / 2.0 {
                items.remove(&key);
                taken.push(Vec2 { x: key.0, y: key.1 });
            }
        }
    }
    taken
}
