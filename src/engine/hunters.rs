use crate::constants::{
    AMBUSH_LEAD_CELLS, AMBUSH_LEAD_CELLS_WITH_SIGHT, CELL_SIZE, PATROL_ENGAGE_CELLS,
    PATROL_RETREAT_CELLS, WANDER_MAX_ATTEMPTS, WANDER_RADIUS_CELLS, WANDER_REROLL_CHANCE,
};
use crate::error::{SimError, SimResult};
use crate::maze::Maze;
use crate::rng::RandomSource;
use crate::types::{BehaviorVariant, Direction, GhostMode, HunterPhase, HunterView, Point, Vec2};

use super::motion::{check_blocked, floor_to_grid, resolve_step, snap_to_grid};
use super::player::PlayerSnapshot;
use super::utils::{cell_of, cell_origin, distance};

/// Static description of one hunter: where it lives and how it hunts.
#[derive(Clone, Debug, PartialEq)]
pub struct HunterSpec {
    pub id: String,
    pub behavior: BehaviorVariant,
    pub home: Vec2,
    pub exit_delay_ms: u64,
    /// In `(0, 1]`; biases targeting and reversal chances.
    pub aggression: f32,
    pub scatter_target: Vec2,
}

/// The four hunters of the classic game, staggered out of the house.
pub fn default_roster(maze: &Maze) -> Vec<HunterSpec> {
    let right = maze.width() - 1;
    let bottom = maze.height() - 1;
    vec![
        HunterSpec {
            id: "red".to_string(),
            behavior: BehaviorVariant::Chase,
            home: Vec2 { x: 14, y: 14 },
            exit_delay_ms: 0,
            aggression: 1.0,
            scatter_target: Vec2 { x: right, y: 0 },
        },
        HunterSpec {
            id: "pink".to_string(),
            behavior: BehaviorVariant::Ambush,
            home: Vec2 { x: 13, y: 14 },
            exit_delay_ms: 500,
            aggression: 0.9,
            scatter_target: Vec2 { x: 0, y: 0 },
        },
        HunterSpec {
            id: "cyan".to_string(),
            behavior: BehaviorVariant::Random,
            home: Vec2 { x: 14, y: 15 },
            exit_delay_ms: 1_000,
            aggression: 0.8,
            scatter_target: Vec2 { x: right, y: bottom },
        },
        HunterSpec {
            id: "orange".to_string(),
            behavior: BehaviorVariant::Patrol,
            home: Vec2 { x: 15, y: 14 },
            exit_delay_ms: 1_500,
            aggression: 0.7,
            scatter_target: Vec2 { x: 0, y: bottom },
        },
    ]
}

/// Shared, read-only state a hunter decision may look at.
pub(crate) struct HunterContext<'a> {
    pub maze: &'a Maze,
    pub player: PlayerSnapshot,
    pub mode: GhostMode,
    pub powered: bool,
    pub clock_ms: u64,
    pub speed: f32,
    pub scared_speed: f32,
}

#[derive(Clone, Copy, Debug, Default)]
pub(crate) struct Signal {
    pub active: bool,
    pub started_at_ms: u64,
    pub duration_ms: u64,
}

#[derive(Clone, Debug)]
pub(crate) struct Hunter {
    pub spec: HunterSpec,
    pub x: f32,
    pub y: f32,
    pub dir: Direction,
    pub last_dir: Direction,
    /// Granted by a mode flip; lets the next roaming decision reverse.
    pub reversal_permitted: bool,
    pub signal: Signal,
    pub wander_target: Option<Point>,
    pub phase: HunterPhase,
    /// Set once the hunter has been sent home; skips the exit delay.
    released: bool,
}

impl Hunter {
    pub fn spawn(spec: HunterSpec) -> Self {
        let (x, y) = cell_origin(spec.home);
        Self {
            spec,
            x,
            y,
            dir: Direction::Up,
            last_dir: Direction::Up,
            reversal_permitted: false,
            signal: Signal::default(),
            wander_target: None,
            phase: HunterPhase::Holding,
            released: false,
        }
    }

    pub fn id(&self) -> &str {
        &self.spec.id
    }

    pub fn view(&self, powered: bool) -> HunterView {
        HunterView {
            id: self.spec.id.clone(),
            behavior: self.spec.behavior,
            x: self.x,
            y: self.y,
            dir: self.dir,
            phase: self.phase,
            scared: powered,
            signaling: self.signal.active,
        }
    }

    pub fn start_signal(&mut self, now_ms: u64, duration_ms: u64) {
        self.signal = Signal {
            active: true,
            started_at_ms: now_ms,
            duration_ms,
        };
    }

    pub fn clear_signal(&mut self) {
        self.signal.active = false;
    }

    pub fn expire_signal(&mut self, now_ms: u64) {
        if self.signal.active
            && now_ms.saturating_sub(self.signal.started_at_ms) >= self.signal.duration_ms
        {
            self.signal.active = false;
        }
    }

    /// Back to the home cell after being eaten. The hunter roams from there
    /// rather than waiting out its exit delay again.
    pub fn send_home(&mut self) {
        let (x, y) = cell_origin(self.spec.home);
        self.x = x;
        self.y = y;
        self.dir = Direction::Up;
        self.last_dir = Direction::Up;
        self.wander_target = None;
        self.phase = HunterPhase::Roaming;
        self.released = true;
    }

    /// Snap a hunter whose update failed back onto the grid.
    pub fn recover(&mut self) {
        let (x, y) = snap_to_grid(self.x, self.y);
        if x.is_finite() && y.is_finite() {
            self.x = x;
            self.y = y;
        } else {
            let (home_x, home_y) = cell_origin(self.spec.home);
            self.x = home_x;
            self.y = home_y;
        }
    }

    pub fn update(&mut self, ctx: &HunterContext, rng: &mut dyn RandomSource) -> SimResult<()> {
        self.ensure_finite()?;
        self.refresh_phase(ctx);
        match self.phase {
            HunterPhase::Holding => {}
            HunterPhase::Scared => self.flee(ctx, rng),
            HunterPhase::HouseExit => self.exit_house(ctx),
            HunterPhase::Roaming => self.roam(ctx, rng),
        }
        self.ensure_finite()
    }

    fn ensure_finite(&self) -> SimResult<()> {
        if self.x.is_finite() && self.y.is_finite() {
            return Ok(());
        }
        Err(SimError::NonFinitePosition {
            agent: self.spec.id.clone(),
            x: self.x,
            y: self.y,
        })
    }

    /// Re-evaluate the phase. Also runs on ticks too short for a motion
    /// sub-step, so releases happen on time.
    pub fn refresh_phase(&mut self, ctx: &HunterContext) {
        let next = self.select_phase(ctx);
        // aligned once on entry; later ticks keep sub-cell progress
        if next == HunterPhase::HouseExit && self.phase != HunterPhase::HouseExit {
            let (x, y) = floor_to_grid(self.x, self.y);
            self.x = x;
            self.y = y;
        }
        self.phase = next;
    }

    fn select_phase(&self, ctx: &HunterContext) -> HunterPhase {
        if !self.released && ctx.clock_ms < self.spec.exit_delay_ms {
            HunterPhase::Holding
        } else if ctx.powered {
            HunterPhase::Scared
        } else if ctx.maze.in_house(self.x, self.y) {
            HunterPhase::HouseExit
        } else {
            HunterPhase::Roaming
        }
    }

    fn exit_house(&mut self, ctx: &HunterContext) {
        self.dir = Direction::Up;
        self.last_dir = Direction::Up;

        let next_y = self.y - ctx.speed;
        if !check_blocked(ctx.maze, self.x, next_y) {
            self.y = next_y;
            return;
        }

        let center_x = ctx.maze.house_center_x();
        if (self.x - center_x).abs() <= ctx.speed {
            self.x = center_x;
        } else if self.x < center_x {
            self.dir = Direction::Right;
            self.last_dir = Direction::Right;
            self.x += ctx.speed;
        } else {
            self.dir = Direction::Left;
            self.last_dir = Direction::Left;
            self.x -= ctx.speed;
        }
    }

    fn roam(&mut self, ctx: &HunterContext, rng: &mut dyn RandomSource) {
        let cell = cell_of(self.x, self.y);
        let valid = valid_directions(ctx.maze, cell);
        let at_intersection = valid.len() > 2;
        let current_valid = valid.contains(&self.dir);

        if (self.at_center(cell) && at_intersection) || !current_valid {
            self.snap_to(cell);
            self.choose_direction(ctx, rng, cell, &valid);
        }
        self.advance(ctx.maze, ctx.speed);
    }

    fn flee(&mut self, ctx: &HunterContext, rng: &mut dyn RandomSource) {
        let cell = cell_of(self.x, self.y);
        let valid = valid_directions(ctx.maze, cell);
        let other_paths = valid.iter().filter(|dir| **dir != self.dir).count();
        let current_valid = valid.contains(&self.dir);

        if (self.at_center(cell) && other_paths > 1) || !current_valid {
            self.snap_to(cell);
            self.choose_scared_direction(ctx, rng, cell, &valid);
        }
        self.advance(ctx.maze, ctx.scared_speed);
    }

    fn at_center(&self, cell: Vec2) -> bool {
        let (x, y) = cell_origin(cell);
        (self.x - x).abs() < 1.0 && (self.y - y).abs() < 1.0
    }

    fn snap_to(&mut self, cell: Vec2) {
        let (x, y) = cell_origin(cell);
        self.x = x;
        self.y = y;
    }

    fn advance(&mut self, maze: &Maze, speed: f32) {
        let outcome = resolve_step(maze, self.x, self.y, self.dir, speed);
        self.x = outcome.x;
        self.y = outcome.y;
    }

    fn has_sight(&self, ctx: &HunterContext) -> bool {
        ctx.maze
            .has_line_of_sight(cell_of(self.x, self.y), ctx.player.cell)
    }

    fn choose_direction(
        &mut self,
        ctx: &HunterContext,
        rng: &mut dyn RandomSource,
        cell: Vec2,
        valid: &[Direction],
    ) {
        let target = self.target(ctx, rng, cell);
        let sight = self.has_sight(ctx);
        let permitted = std::mem::take(&mut self.reversal_permitted);

        let mut candidates = Vec::with_capacity(valid.len());
        for &dir in valid {
            let allowed = !dir.is_reverse_of(self.last_dir)
                || valid.len() == 1
                || (sight && rng.bool(self.spec.aggression * 0.2))
                || ctx.powered
                || permitted;
            if allowed {
                candidates.push(dir);
            }
        }

        let pursuit_weight = 1.0 - self.spec.aggression * 0.5;
        let best = pick_best(&candidates, |dir| {
            let (x, y) = neighbor_origin(cell, dir);
            let mut score = 0.0;
            if dir == self.dir {
                score += CELL_SIZE * 8.0;
            }
            score -= distance(x, y, target.x, target.y) * pursuit_weight;
            score + rng.next_f32() * (CELL_SIZE / 128.0)
        });

        if let Some(dir) = best {
            self.last_dir = self.dir;
            self.dir = dir;
        }
    }

    fn choose_scared_direction(
        &mut self,
        ctx: &HunterContext,
        rng: &mut dyn RandomSource,
        cell: Vec2,
        valid: &[Direction],
    ) {
        let candidates: Vec<Direction> = valid
            .iter()
            .copied()
            .filter(|dir| !dir.is_reverse_of(self.last_dir) || valid.len() == 1)
            .collect();

        let best = pick_best(&candidates, |dir| {
            let (x, y) = neighbor_origin(cell, dir);
            let mut score = 0.0;
            if dir == self.dir {
                score += CELL_SIZE * 4.0;
            }
            score += distance(x, y, ctx.player.x, ctx.player.y);
            score + rng.next_f32() * (CELL_SIZE / 16.0)
        });

        if let Some(dir) = best {
            self.last_dir = self.dir;
            self.dir = dir;
        }
    }

    fn target(&mut self, ctx: &HunterContext, rng: &mut dyn RandomSource, cell: Vec2) -> Point {
        let player = Point {
            x: ctx.player.x,
            y: ctx.player.y,
        };
        let sight = self.has_sight(ctx);

        if !ctx.powered && sight {
            return player;
        }
        if ctx.mode == GhostMode::Scatter && rng.bool(self.spec.aggression) {
            return player;
        }

        match self.spec.behavior {
            BehaviorVariant::Chase => player,
            BehaviorVariant::Ambush => {
                let lead = if sight {
                    AMBUSH_LEAD_CELLS_WITH_SIGHT
                } else {
                    AMBUSH_LEAD_CELLS
                };
                let (dx, dy) = ctx.player.dir.delta();
                let ahead = Point {
                    x: player.x + dx * lead * CELL_SIZE,
                    y: player.y + dy * lead * CELL_SIZE,
                };
                let ahead_cell = cell_of(ahead.x, ahead.y);
                if ctx.maze.is_open_cell(ahead_cell.x, ahead_cell.y) {
                    ahead
                } else {
                    player
                }
            }
            BehaviorVariant::Random => {
                if rng.bool(self.spec.aggression) || sight {
                    return player;
                }
                let wander = match self.wander_target {
                    Some(target) if !rng.bool(WANDER_REROLL_CHANCE) => target,
                    _ => random_target(ctx.maze, cell, rng),
                };
                self.wander_target = Some(wander);
                wander
            }
            BehaviorVariant::Patrol => {
                let gap = distance(self.x, self.y, player.x, player.y);
                if sight || gap <= PATROL_ENGAGE_CELLS * CELL_SIZE {
                    player
                } else if gap > PATROL_RETREAT_CELLS * CELL_SIZE {
                    player
                } else {
                    let (x, y) = cell_origin(self.spec.scatter_target);
                    Point { x, y }
                }
            }
        }
    }
}

/// Unblocked neighbor directions in probe order.
pub(crate) fn valid_directions(maze: &Maze, cell: Vec2) -> Vec<Direction> {
    Direction::PROBE_ORDER
        .iter()
        .copied()
        .filter(|dir| {
            let (x, y) = neighbor_origin(cell, *dir);
            !check_blocked(maze, x, y)
        })
        .collect()
}

fn neighbor_origin(cell: Vec2, dir: Direction) -> (f32, f32) {
    let (dx, dy) = dir.cell_delta();
    cell_origin(Vec2 {
        x: cell.x + dx,
        y: cell.y + dy,
    })
}

/// Highest score wins; the earliest candidate keeps exact ties.
fn pick_best(candidates: &[Direction], mut score: impl FnMut(Direction) -> f32) -> Option<Direction> {
    let mut best: Option<(Direction, f32)> = None;
    for &dir in candidates {
        let value = score(dir);
        if best.map_or(true, |(_, top)| value > top) {
            best = Some((dir, value));
        }
    }
    best.map(|(dir, _)| dir)
}

fn random_target(maze: &Maze, cell: Vec2, rng: &mut dyn RandomSource) -> Point {
    let radius = WANDER_RADIUS_CELLS as f32;
    for _ in 0..WANDER_MAX_ATTEMPTS {
        let offset_x = (rng.next_f32() * radius * 2.0 - radius).floor() as i32;
        let offset_y = (rng.next_f32() * radius * 2.0 - radius).floor() as i32;
        let candidate = Vec2 {
            x: cell.x + offset_x,
            y: cell.y + offset_y,
        };
        if maze.is_open_cell(candidate.x, candidate.y) {
            let (x, y) = cell_origin(candidate);
            return Point { x, y };
        }
    }
    let (x, y) = cell_origin(cell);
    Point { x, y }
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;
    use crate::maze::MazeGeometry;
    use crate::rng::ScriptedRng;

    fn spec(behavior: BehaviorVariant, home: Vec2) -> HunterSpec {
        HunterSpec {
            id: "h".to_string(),
            behavior,
            home,
            exit_delay_ms: 0,
            aggression: 1.0,
            scatter_target: Vec2 { x: 0, y: 0 },
        }
    }

    fn player_at(cell: Vec2, dir: Direction) -> PlayerSnapshot {
        PlayerSnapshot {
            x: cell.x as f32 * CELL_SIZE,
            y: cell.y as f32 * CELL_SIZE,
            dir,
            cell,
        }
    }

    fn context(maze: &Maze, player: PlayerSnapshot) -> HunterContext<'_> {
        HunterContext {
            maze,
            player,
            mode: GhostMode::Chase,
            powered: false,
            clock_ms: 10_000,
            speed: 2.0,
            scared_speed: 1.0,
        }
    }

    // A plus-shaped crossing at (3, 3) with long arms.
    fn crossing() -> Maze {
        Maze::parse(
            &[
                "#######", "###.###", "###.###", "#..P..#", "###.###", "###.###", "#######",
            ],
            MazeGeometry::plain(),
        )
        .expect("maze parses")
    }

    #[test]
    fn holds_until_exit_delay_then_moves_on_the_boundary() {
        let maze = Maze::classic().expect("classic maze parses");
        let player = player_at(maze.player_start(), Direction::Left);
        let mut hunter = Hunter::spawn(HunterSpec {
            exit_delay_ms: 500,
            ..spec(BehaviorVariant::Chase, Vec2 { x: 13, y: 14 })
        });
        let mut rng = ScriptedRng::constant(0.5);

        let mut ctx = context(&maze, player);
        ctx.clock_ms = 499;
        hunter.update(&ctx, &mut rng).expect("update");
        assert_eq!(hunter.phase, HunterPhase::Holding);
        assert_eq!((hunter.x, hunter.y), (13.0 * CELL_SIZE, 14.0 * CELL_SIZE));

        ctx.clock_ms = 500;
        hunter.update(&ctx, &mut rng).expect("update");
        assert_eq!(hunter.phase, HunterPhase::HouseExit);
        assert_eq!(hunter.y, 14.0 * CELL_SIZE - 2.0);
        assert_eq!(hunter.dir, Direction::Up);
    }

    #[test]
    fn house_exit_climbs_through_the_gate() {
        let maze = Maze::classic().expect("classic maze parses");
        let player = player_at(maze.player_start(), Direction::Left);
        let mut hunter = Hunter::spawn(spec(BehaviorVariant::Chase, Vec2 { x: 14, y: 15 }));
        let mut rng = ScriptedRng::constant(0.5);
        let ctx = context(&maze, player);

        for _ in 0..60 {
            hunter.update(&ctx, &mut rng).expect("update");
        }
        assert!(!maze.in_house(hunter.x, hunter.y));
        assert!(hunter.y <= 11.0 * CELL_SIZE + 2.0);
        assert_eq!(hunter.phase, HunterPhase::Roaming);
    }

    #[test]
    fn house_exit_shuffles_toward_center_when_blocked_above() {
        let maze = Maze::parse(
            &["#######", "#.....#", "###.###", "#..P..#", "#######"],
            MazeGeometry {
                house: Some(crate::maze::CellRect {
                    min_col: 1,
                    max_col: 5,
                    min_row: 3,
                    max_row: 3,
                }),
                house_center_col: 3,
                ..MazeGeometry::plain()
            },
        )
        .expect("maze parses");
        let player = player_at(Vec2 { x: 1, y: 1 }, Direction::Left);
        let mut hunter = Hunter::spawn(spec(BehaviorVariant::Chase, Vec2 { x: 1, y: 3 }));
        let mut rng = ScriptedRng::constant(0.5);
        let ctx = context(&maze, player);

        hunter.update(&ctx, &mut rng).expect("update");
        assert_eq!(hunter.phase, HunterPhase::HouseExit);
        assert_eq!(hunter.dir, Direction::Right);
        assert_eq!(hunter.last_dir, Direction::Right);
        assert_eq!((hunter.x, hunter.y), (CELL_SIZE + 2.0, 3.0 * CELL_SIZE));

        let mut updates = 1;
        while maze.in_house(hunter.x, hunter.y) && updates < 200 {
            let before = hunter.x;
            hunter.update(&ctx, &mut rng).expect("update");
            updates += 1;
            if hunter.y == 3.0 * CELL_SIZE {
                assert_eq!(hunter.x, before + 2.0);
            }
        }
        assert!(!maze.in_house(hunter.x, hunter.y));
        assert_eq!(hunter.x, 3.0 * CELL_SIZE);
        assert_eq!(updates, 21);
    }

    #[test]
    fn house_exit_shuffles_left_one_step_at_a_time() {
        let maze = Maze::parse(
            &["#######", "#.....#", "###.###", "#..P..#", "#######"],
            MazeGeometry {
                house: Some(crate::maze::CellRect {
                    min_col: 1,
                    max_col: 5,
                    min_row: 3,
                    max_row: 3,
                }),
                house_center_col: 3,
                ..MazeGeometry::plain()
            },
        )
        .expect("maze parses");
        let player = player_at(Vec2 { x: 1, y: 1 }, Direction::Left);
        let mut hunter = Hunter::spawn(spec(BehaviorVariant::Chase, Vec2 { x: 5, y: 3 }));
        let mut rng = ScriptedRng::constant(0.5);
        let ctx = context(&maze, player);

        hunter.update(&ctx, &mut rng).expect("update");
        assert_eq!(hunter.dir, Direction::Left);
        assert_eq!(hunter.x, 5.0 * CELL_SIZE - 2.0);
        hunter.update(&ctx, &mut rng).expect("update");
        assert_eq!(hunter.x, 5.0 * CELL_SIZE - 4.0);

        for _ in 0..19 {
            hunter.update(&ctx, &mut rng).expect("update");
        }
        assert_eq!(hunter.x, 3.0 * CELL_SIZE);
        assert!(hunter.y < 3.0 * CELL_SIZE);
        assert!(!maze.in_house(hunter.x, hunter.y));
    }

    #[test]
    fn forced_decision_heads_for_visible_player() {
        let maze = crossing();
        let player = player_at(Vec2 { x: 3, y: 1 }, Direction::Left);
        let mut hunter = Hunter::spawn(spec(BehaviorVariant::Chase, Vec2 { x: 3, y: 3 }));
        hunter.dir = Direction::None;
        hunter.last_dir = Direction::Left;
        let mut rng = ScriptedRng::constant(0.9);

        hunter.update(&context(&maze, player), &mut rng).expect("update");
        assert_eq!(hunter.dir, Direction::Up);
        assert_eq!(hunter.last_dir, Direction::None);
        assert_eq!(hunter.y, 3.0 * CELL_SIZE - 2.0);
    }

    #[test]
    fn current_direction_bonus_outweighs_small_detours() {
        let maze = crossing();
        // not aligned with the hunter, so no sight line
        let player = player_at(Vec2 { x: 1, y: 3 }, Direction::Left);
        let mut hunter = Hunter::spawn(spec(BehaviorVariant::Chase, Vec2 { x: 3, y: 3 }));
        hunter.dir = Direction::Down;
        hunter.last_dir = Direction::Down;
        let ctx = HunterContext {
            player: PlayerSnapshot {
                cell: Vec2 { x: 0, y: 0 },
                ..player
            },
            ..context(&maze, player)
        };
        let mut rng = ScriptedRng::constant(0.0);

        hunter.update(&ctx, &mut rng).expect("update");
        assert_eq!(hunter.dir, Direction::Down);
    }

    #[test]
    fn mode_flip_permission_allows_one_reversal() {
        // T-junction: the corridor above (3, 1) is a wall
        let maze = Maze::parse(
            &["#######", "#.....#", "###P###", "###.###", "#######"],
            MazeGeometry::plain(),
        )
        .expect("maze parses");
        let player = player_at(Vec2 { x: 3, y: 3 }, Direction::Left);
        let ctx = context(&maze, player);
        // sight exception never fires with a high draw
        let mut rng = ScriptedRng::constant(0.9);

        let mut permitted = Hunter::spawn(spec(BehaviorVariant::Chase, Vec2 { x: 3, y: 1 }));
        permitted.reversal_permitted = true;
        permitted.update(&ctx, &mut rng).expect("update");
        assert_eq!(permitted.dir, Direction::Down);
        assert_eq!(permitted.y, CELL_SIZE + 2.0);
        assert!(!permitted.reversal_permitted);

        let mut plain = Hunter::spawn(spec(BehaviorVariant::Chase, Vec2 { x: 3, y: 1 }));
        plain.update(&ctx, &mut rng).expect("update");
        // right and left tie exactly; the earlier probe wins
        assert_eq!(plain.dir, Direction::Right);
    }

    #[test]
    fn scared_hunter_flees_without_reversing() {
        let maze = crossing();
        let player = player_at(Vec2 { x: 1, y: 3 }, Direction::Right);
        let mut hunter = Hunter::spawn(spec(BehaviorVariant::Chase, Vec2 { x: 3, y: 3 }));
        hunter.dir = Direction::None;
        hunter.last_dir = Direction::Left;
        let ctx = HunterContext {
            powered: true,
            ..context(&maze, player)
        };
        let mut rng = ScriptedRng::constant(0.0);

        hunter.update(&ctx, &mut rng).expect("update");
        assert_eq!(hunter.phase, HunterPhase::Scared);
        // right would be farthest but reverses the last move; down and up tie
        assert_eq!(hunter.dir, Direction::Down);
        assert_eq!(hunter.y, 3.0 * CELL_SIZE + 1.0);
    }

    #[test]
    fn ambush_leads_the_player_and_falls_back_on_walls() {
        let maze = crossing();
        let mut hunter = Hunter::spawn(spec(BehaviorVariant::Ambush, Vec2 { x: 1, y: 3 }));
        let mut rng = ScriptedRng::constant(0.9);

        let facing_open = player_at(Vec2 { x: 3, y: 5 }, Direction::Up);
        let target = hunter.target(&context(&maze, facing_open), &mut rng, Vec2 { x: 1, y: 3 });
        assert_eq!(target, Point { x: 3.0 * CELL_SIZE, y: 3.0 * CELL_SIZE });

        let facing_wall = player_at(Vec2 { x: 3, y: 5 }, Direction::Left);
        let target = hunter.target(&context(&maze, facing_wall), &mut rng, Vec2 { x: 1, y: 3 });
        assert_eq!(target, Point { x: 3.0 * CELL_SIZE, y: 5.0 * CELL_SIZE });
    }

    #[test]
    fn random_hunter_keeps_wander_target_until_reroll() {
        let maze = crossing();
        let player = player_at(Vec2 { x: 3, y: 5 }, Direction::Up);
        let mut hunter = Hunter::spawn(HunterSpec {
            aggression: 0.5,
            ..spec(BehaviorVariant::Random, Vec2 { x: 1, y: 3 })
        });
        hunter.x = CELL_SIZE;
        hunter.y = 3.0 * CELL_SIZE;
        // 0.9: no chase; offsets floor(0.9 * 16 - 8) = 6 leave the maze, so
        // all ten samples miss and the own cell is used
        let mut rng = ScriptedRng::constant(0.9);
        let ctx = context(&maze, player);

        let first = hunter.target(&ctx, &mut rng, Vec2 { x: 1, y: 3 });
        assert_eq!(first, Point { x: CELL_SIZE, y: 3.0 * CELL_SIZE });
        assert_eq!(rng.draws(), 1 + 20);

        hunter.wander_target = Some(Point { x: 2.0 * CELL_SIZE, y: 3.0 * CELL_SIZE });
        let kept = hunter.target(&ctx, &mut rng, Vec2 { x: 1, y: 3 });
        assert_eq!(kept, Point { x: 2.0 * CELL_SIZE, y: 3.0 * CELL_SIZE });
    }

    #[test]
    fn patrol_engages_nearby_player() {
        let maze = crossing();
        let player = player_at(Vec2 { x: 3, y: 5 }, Direction::Up);
        let mut hunter = Hunter::spawn(HunterSpec {
            scatter_target: Vec2 { x: 5, y: 3 },
            ..spec(BehaviorVariant::Patrol, Vec2 { x: 1, y: 3 })
        });
        let mut rng = ScriptedRng::constant(0.9);
        let target = hunter.target(&context(&maze, player), &mut rng, Vec2 { x: 1, y: 3 });
        assert_eq!(target, Point { x: 3.0 * CELL_SIZE, y: 5.0 * CELL_SIZE });
    }

    #[test]
    fn scatter_mode_may_still_chase_the_player() {
        let maze = crossing();
        let player = player_at(Vec2 { x: 3, y: 5 }, Direction::Up);
        let mut hunter = Hunter::spawn(HunterSpec {
            aggression: 0.5,
            ..spec(BehaviorVariant::Random, Vec2 { x: 1, y: 3 })
        });
        let ctx = HunterContext {
            mode: GhostMode::Scatter,
            ..context(&maze, player)
        };
        let mut rng = ScriptedRng::constant(0.1);
        let target = hunter.target(&ctx, &mut rng, Vec2 { x: 1, y: 3 });
        assert_eq!(target, Point { x: 3.0 * CELL_SIZE, y: 5.0 * CELL_SIZE });
        assert_eq!(rng.draws(), 1);
    }

    #[test]
    fn sent_home_hunter_skips_holding() {
        let maze = Maze::classic().expect("classic maze parses");
        let player = player_at(maze.player_start(), Direction::Left);
        let mut hunter = Hunter::spawn(HunterSpec {
            exit_delay_ms: 5_000,
            ..spec(BehaviorVariant::Chase, Vec2 { x: 14, y: 14 })
        });
        hunter.x = 100.0;
        hunter.send_home();
        assert_eq!((hunter.x, hunter.y), (14.0 * CELL_SIZE, 14.0 * CELL_SIZE));
        assert_eq!(hunter.phase, HunterPhase::Roaming);

        let mut ctx = context(&maze, player);
        ctx.clock_ms = 0;
        let mut rng = ScriptedRng::constant(0.5);
        hunter.update(&ctx, &mut rng).expect("update");
        assert_eq!(hunter.phase, HunterPhase::HouseExit);
    }

    #[test]
    fn non_finite_position_is_reported_and_recovered() {
        let maze = crossing();
        let player = player_at(Vec2 { x: 3, y: 5 }, Direction::Up);
        let mut hunter = Hunter::spawn(spec(BehaviorVariant::Chase, Vec2 { x: 1, y: 3 }));
        hunter.x = f32::NAN;
        let mut rng = ScriptedRng::constant(0.5);

        let err = hunter
            .update(&context(&maze, player), &mut rng)
            .expect_err("nan position must fail");
        assert!(matches!(err, SimError::NonFinitePosition { .. }));

        hunter.recover();
        assert_eq!((hunter.x, hunter.y), (CELL_SIZE, 3.0 * CELL_SIZE));

        hunter.x = 41.0;
        hunter.y = 59.0;
        hunter.recover();
        assert_eq!((hunter.x, hunter.y), (40.0, 60.0));
    }

    #[test]
    fn signal_expires_after_its_duration() {
        let mut hunter = Hunter::spawn(spec(BehaviorVariant::Chase, Vec2 { x: 1, y: 1 }));
        hunter.start_signal(1_000, 2_000);
        hunter.expire_signal(2_999);
        assert!(hunter.signal.active);
        hunter.expire_signal(3_000);
        assert!(!hunter.signal.active);
    }

    proptest! {
        #[test]
        fn roaming_decision_never_reverses_without_an_exception(
            cell_index in 0usize..1_000,
            last in 0usize..4,
            aggression in 0.05f32..=1.0,
            draw in 0.2f32..0.99,
        ) {
            let maze = Maze::classic().expect("classic maze parses");
            let open: Vec<Vec2> = (0..maze.height())
                .flat_map(|y| (0..maze.width()).map(move |x| Vec2 { x, y }))
                .filter(|cell| maze.is_open_cell(cell.x, cell.y))
                .collect();
            let cell = open[cell_index % open.len()];
            let valid = valid_directions(&maze, cell);
            prop_assume!(valid.len() > 1);

            let last_dir = Direction::PROBE_ORDER[last];
            let mut hunter = Hunter::spawn(HunterSpec {
                aggression,
                ..spec(BehaviorVariant::Chase, cell)
            });
            hunter.dir = last_dir;
            hunter.last_dir = last_dir;
            let player = player_at(maze.player_start(), Direction::Left);
            let mut rng = ScriptedRng::constant(draw);

            hunter.choose_direction(&context(&maze, player), &mut rng, cell, &valid);
            prop_assert!(!hunter.dir.is_reverse_of(last_dir));
            prop_assert!(valid.contains(&hunter.dir));
        }
    }
}
