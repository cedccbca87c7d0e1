use crate::config::SimConfig;
use crate::error::{SimError, SimResult};
use crate::maze::Maze;
use crate::rng::{RandomSource, Rng};
use crate::types::{
    Direction, GameOverReason, GhostMode, HunterView, RuntimeEvent, Snapshot, Vec2,
};

mod hunters;
mod mode;
pub mod motion;
mod player;
mod schedule;
mod scoring;
mod utils;

pub use self::hunters::{default_roster, HunterSpec};

use self::hunters::{Hunter, HunterContext};
use self::mode::ModeCoordinator;
use self::player::Player;
use self::schedule::{Deferred, Schedule};
use self::scoring::Board;

#[derive(Clone, Debug)]
pub struct GameEngineOptions {
    pub seed: u32,
    pub config: SimConfig,
    /// Best score carried in from storage.
    pub high_score: u32,
}

impl Default for GameEngineOptions {
    fn default() -> Self {
        Self {
            seed: 1,
            config: SimConfig::default(),
            high_score: 0,
        }
    }
}

pub struct GameEngine {
    pub config: SimConfig,
    maze: Maze,
    roster: Vec<HunterSpec>,

    rng: Box<dyn RandomSource + Send>,
    player: Player,
    hunters: Vec<Hunter>,
    board: Board,
    mode: ModeCoordinator,
    schedule: Schedule,
    events: Vec<RuntimeEvent>,

    motion_buffer_ms: u64,
    clock_ms: u64,
    tick_counter: u64,
    games_started: u64,
    ended: bool,
    end_reason: Option<GameOverReason>,
}

impl GameEngine {
    /// The classic maze with the four default hunters.
    pub fn new(options: GameEngineOptions) -> SimResult<Self> {
        let maze = Maze::classic()?;
        let roster = default_roster(&maze);
        Self::with_setup(maze, roster, options)
    }

    pub fn with_setup(
        maze: Maze,
        roster: Vec<HunterSpec>,
        options: GameEngineOptions,
    ) -> SimResult<Self> {
        options.config.validate()?;
        let player = Player::spawn(maze.player_start());
        let hunters = roster.iter().cloned().map(Hunter::spawn).collect();
        let board = Board::new(&maze, options.high_score);

        tracing::info!(
            seed = options.seed,
            hunters = roster.len(),
            dots = board.dots.len(),
            power_pellets = board.power_pellets.len(),
            "game engine ready"
        );

        Ok(Self {
            config: options.config,
            maze,
            roster,
            rng: Box::new(Rng::new(options.seed)),
            player,
            hunters,
            board,
            mode: ModeCoordinator::default(),
            schedule: Schedule::default(),
            events: Vec::new(),
            motion_buffer_ms: 0,
            clock_ms: 0,
            tick_counter: 0,
            games_started: 1,
            ended: false,
            end_reason: None,
        })
    }

    /// Starts a new game on the same maze. The high score survives.
    pub fn reset(&mut self) {
        self.player = Player::spawn(self.maze.player_start());
        self.hunters = self.roster.iter().cloned().map(Hunter::spawn).collect();
        self.board = Board::new(&self.maze, self.board.high_score);
        self.mode = ModeCoordinator::default();
        self.schedule.clear();
        self.events.clear();
        self.motion_buffer_ms = 0;
        self.clock_ms = 0;
        self.tick_counter = 0;
        self.games_started += 1;
        self.ended = false;
        self.end_reason = None;
        tracing::info!(game = self.games_started, "new game started");
    }

    pub fn maze(&self) -> &Maze {
        &self.maze
    }

    pub fn is_ended(&self) -> bool {
        self.ended
    }

    pub fn end_reason(&self) -> Option<GameOverReason> {
        self.end_reason
    }

    pub fn score(&self) -> u32 {
        self.board.score
    }

    pub fn high_score(&self) -> u32 {
        self.board.high_score
    }

    pub fn clock_ms(&self) -> u64 {
        self.clock_ms
    }

    pub fn mode(&self) -> GhostMode {
        self.mode.mode()
    }

    pub fn is_powered_up(&self) -> bool {
        self.board.powered
    }

    pub fn remaining_collectibles(&self) -> usize {
        self.board.dots.len() + self.board.power_pellets.len()
    }

    pub fn hunter_view(&self, index: usize) -> SimResult<HunterView> {
        self.hunters
            .get(index)
            .map(|hunter| hunter.view(self.board.powered))
            .ok_or(SimError::MissingHunter(index))
    }

    /// Queues a turn for the player. `None` and `Direction::None` leave the
    /// queued turn untouched.
    pub fn set_direction(&mut self, dir: Option<Direction>) {
        if self.ended {
            return;
        }
        if let Some(dir) = dir.filter(|dir| *dir != Direction::None) {
            self.player.next_dir = dir;
        }
    }

    /// Advances the simulation by one frame. A no-op once the game is over.
    pub fn step(&mut self, dt_ms: u64) -> SimResult<()> {
        if self.ended {
            return Ok(());
        }
        let dt_ms = dt_ms.min(self.config.max_frame_ms);
        self.tick_counter += 1;
        self.clock_ms = self.clock_ms.saturating_add(dt_ms);

        self.fire_due_effects();
        self.mode.advance(
            dt_ms,
            self.clock_ms,
            &self.config,
            &mut self.hunters,
            &mut self.events,
        );
        for hunter in &mut self.hunters {
            hunter.expire_signal(self.clock_ms);
        }

        let step_ms = self.config.motion_step_ms;
        self.motion_buffer_ms = self.motion_buffer_ms.saturating_add(dt_ms);
        let mut substeps = 0;
        let mut moved = false;
        while self.motion_buffer_ms >= step_ms && substeps < self.config.max_substeps_per_tick {
            self.motion_buffer_ms -= step_ms;
            substeps += 1;

            self.player.advance(&self.maze, self.config.player_speed);
            moved |= self.player.moved;
            self.update_hunters();
            self.resolve()?;
            if self.ended {
                self.player.moved = moved;
                return Ok(());
            }
        }
        if substeps == 0 {
            self.refresh_hunter_phases();
            self.resolve()?;
        }
        if self.motion_buffer_ms >= step_ms {
            self.motion_buffer_ms %= step_ms;
        }
        self.player.moved = moved;
        Ok(())
    }

    pub fn build_snapshot(&mut self, include_events: bool) -> Snapshot {
        let powered = self.board.powered;
        Snapshot {
            tick: self.tick_counter,
            now_ms: self.clock_ms,
            score: self.board.score,
            high_score: self.board.high_score,
            powered_up: powered,
            mode: self.mode.mode(),
            mode_elapsed_ms: self.mode.elapsed_ms(),
            game_over: self.ended,
            end_reason: self.end_reason,
            player: self.player.view(),
            hunters: self.hunters.iter().map(|h| h.view(powered)).collect(),
            dots: self.board.dots.iter().map(|&(x, y)| Vec2 { x, y }).collect(),
            power_pellets: self
                .board
                .power_pellets
                .iter()
                .map(|&(x, y)| Vec2 { x, y })
                .collect(),
            events: if include_events {
                std::mem::take(&mut self.events)
            } else {
                Vec::new()
            },
        }
    }

    #[cfg(test)]
    pub(crate) fn force_player_position(&mut self, x: f32, y: f32) {
        self.player.x = x;
        self.player.y = y;
    }

    fn fire_due_effects(&mut self) {
        for effect in self.schedule.drain_due(self.clock_ms) {
            match effect {
                Deferred::PowerUpExpiry { generation } => {
                    if self.board.expire_power(generation) {
                        tracing::debug!(generation, "power-up ended");
                        self.events.push(RuntimeEvent::PowerUpEnded);
                        self.events.push(RuntimeEvent::SirenResumed);
                    }
                }
                Deferred::SirenResume => {
                    if self.board.powered {
                        self.events.push(RuntimeEvent::SirenResumed);
                    }
                }
            }
        }
    }

    fn refresh_hunter_phases(&mut self) {
        let ctx = HunterContext {
            maze: &self.maze,
            player: self.player.snapshot(),
            mode: self.mode.mode(),
            powered: self.board.powered,
            clock_ms: self.clock_ms,
            speed: self.config.hunter_speed,
            scared_speed: self.config.hunter_scared_speed,
        };
        for hunter in &mut self.hunters {
            hunter.refresh_phase(&ctx);
        }
    }

    fn update_hunters(&mut self) {
        let ctx = HunterContext {
            maze: &self.maze,
            player: self.player.snapshot(),
            mode: self.mode.mode(),
            powered: self.board.powered,
            clock_ms: self.clock_ms,
            speed: self.config.hunter_speed,
            scared_speed: self.config.hunter_scared_speed,
        };
        for hunter in &mut self.hunters {
            if let Err(err) = hunter.update(&ctx, self.rng.as_mut()) {
                tracing::warn!(hunter = hunter.id(), error = %err, "hunter update failed, snapping to grid");
                hunter.recover();
            }
        }
    }

    fn resolve(&mut self) -> SimResult<()> {
        let outcome = self.board.resolve(
            &self.player,
            &mut self.hunters,
            &mut self.schedule,
            self.clock_ms,
            &self.config,
            &mut self.events,
        )?;
        if let Some(reason) = outcome {
            self.ended = true;
            self.end_reason = Some(reason);
            tracing::info!(
                reason = ?reason,
                score = self.board.score,
                clock_ms = self.clock_ms,
                "game over"
            );
        }
        Ok(())
    }
}
