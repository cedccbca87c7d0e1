pub const TICK_RATE: u32 = 60;
pub const TICK_MS: u64 = 1000 / TICK_RATE as u64;

/// Length of one motion sub-step. Agent speeds are expressed per sub-step.
pub const MOTION_STEP_MS: u64 = 16;
/// Upper bound applied to every caller-supplied frame delta.
pub const MAX_FRAME_MS: u64 = 50;
pub const MAX_SUBSTEPS_PER_TICK: u32 = 4;

pub const CELL_SIZE: f32 = 20.0;
pub const GRID_WIDTH: i32 = 28;
pub const GRID_HEIGHT: i32 = 31;

pub const PLAYER_SPEED: f32 = 2.0;
pub const HUNTER_SPEED: f32 = 2.0;
pub const HUNTER_SCARED_SPEED: f32 = 1.0;

pub const DOT_SCORE: u32 = 10;
pub const POWER_PELLET_SCORE: u32 = 50;
pub const HUNTER_SCORE: u32 = 200;

pub const POWER_DURATION_MS: u64 = 10_000;
pub const SIREN_RESUME_DELAY_MS: u64 = 400;

pub const SCATTER_DURATION_MS: u64 = 3_000;
pub const CHASE_DURATION_MS: u64 = 20_000;
pub const MODE_WARNING_MS: u64 = 2_000;
pub const SIGNAL_DURATION_MS: u64 = 2_000;

pub const TUNNEL_ROW: i32 = 14;
pub const GATE_ROW: i32 = 12;
pub const GATE_MIN_COL: i32 = 13;
pub const GATE_MAX_COL: i32 = 15;
pub const HOUSE_MIN_COL: i32 = 13;
pub const HOUSE_MAX_COL: i32 = 15;
pub const HOUSE_MIN_ROW: i32 = 14;
pub const HOUSE_MAX_ROW: i32 = 15;
pub const HOUSE_CENTER_COL: i32 = 14;

pub const AMBUSH_LEAD_CELLS_WITH_SIGHT: f32 = 4.0;
pub const AMBUSH_LEAD_CELLS: f32 = 2.0;
pub const WANDER_RADIUS_CELLS: i32 = 8;
pub const WANDER_MAX_ATTEMPTS: u32 = 10;
pub const WANDER_REROLL_CHANCE: f32 = 0.1;
pub const PATROL_ENGAGE_CELLS: f32 = 8.0;
pub const PATROL_RETREAT_CELLS: f32 = 6.0;

/// `#` wall, `.` dot, `o` power pellet, `P` player start, space empty.
/// `S` is a player start that also holds a dot.
/// The door cells on row 12 are walls; the gate region lets agents through.
pub const CLASSIC_LAYOUT: [&str; 31] = [
    "############################",
    "#............##............#",
    "#.####.#####.##.#####.####.#",
    "#o####.#####.##.#####.####o#",
    "#.####.#####.##.#####.####.#",
    "#..........................#",
    "#.####.##.########.##.####.#",
    "#.####.##.########.##.####.#",
    "#......##....##....##......#",
    "######.##### ## #####.######",
    "     #.##### ## #####.#     ",
    "     #.##          ##.#     ",
    "     #.## ######## ##.#     ",
    "######.## #      # ##.######",
    "      .   #      #   .      ",
    "######.## #      # ##.######",
    "     #.## ######## ##.#     ",
    "     #.##     P    ##.#     ",
    "     #.## ######## ##.#     ",
    "######.## ######## ##.######",
    "#............##............#",
    "#.####.#####.##.#####.####.#",
    "#.####.#####.##.#####.####.#",
    "#o..##.......  .......##..o#",
    "###.##.##.########.##.##.###",
    "###.##.##.########.##.##.###",
    "#......##....##....##......#",
    "#.##########.##.##########.#",
    "#.##########.##.##########.#",
    "#..........................#",
    "############################",
];
