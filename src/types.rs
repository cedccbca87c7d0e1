use serde::Serialize;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
    None,
}

impl Direction {
    /// Order in which hunters enumerate neighbor cells.
    pub const PROBE_ORDER: [Direction; 4] = [
        Direction::Right,
        Direction::Left,
        Direction::Down,
        Direction::Up,
    ];

    pub fn parse_move(value: &str) -> Option<Self> {
        match value {
            "up" => Some(Self::Up),
            "down" => Some(Self::Down),
            "left" => Some(Self::Left),
            "right" => Some(Self::Right),
            "none" => Some(Self::None),
            _ => None,
        }
    }

    pub fn delta(self) -> (f32, f32) {
        match self {
            Self::Up => (0.0, -1.0),
            Self::Down => (0.0, 1.0),
            Self::Left => (-1.0, 0.0),
            Self::Right => (1.0, 0.0),
            Self::None => (0.0, 0.0),
        }
    }

    pub fn cell_delta(self) -> (i32, i32) {
        match self {
            Self::Up => (0, -1),
            Self::Down => (0, 1),
            Self::Left => (-1, 0),
            Self::Right => (1, 0),
            Self::None => (0, 0),
        }
    }

    pub fn opposite(self) -> Self {
        match self {
            Self::Up => Self::Down,
            Self::Down => Self::Up,
            Self::Left => Self::Right,
            Self::Right => Self::Left,
            Self::None => Self::None,
        }
    }

    /// `None` reverses `None` the same way a zero vector negates to itself.
    pub fn is_reverse_of(self, other: Direction) -> bool {
        self == other.opposite()
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CellKind {
    Empty,
    Wall,
    Dot,
    PowerPellet,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BehaviorVariant {
    Chase,
    Ambush,
    Random,
    Patrol,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum GhostMode {
    Scatter,
    Chase,
}

impl GhostMode {
    pub fn toggled(self) -> Self {
        match self {
            Self::Scatter => Self::Chase,
            Self::Chase => Self::Scatter,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum HunterPhase {
    Holding,
    HouseExit,
    Roaming,
    Scared,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum GameOverReason {
    Caught,
    Cleared,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct Vec2 {
    pub x: i32,
    pub y: i32,
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

#[derive(Clone, Debug, Serialize)]
pub struct PlayerView {
    pub x: f32,
    pub y: f32,
    pub dir: Direction,
    #[serde(rename = "nextDir")]
    pub next_dir: Direction,
    pub moved: bool,
}

#[derive(Clone, Debug, Serialize)]
pub struct HunterView {
    pub id: String,
    pub behavior: BehaviorVariant,
    pub x: f32,
    pub y: f32,
    pub dir: Direction,
    pub phase: HunterPhase,
    pub scared: bool,
    pub signaling: bool,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RuntimeEvent {
    Chomp {
        count: usize,
    },
    PowerPelletCollected {
        x: i32,
        y: i32,
    },
    PowerUpEnded,
    HunterEaten {
        #[serde(rename = "hunterId")]
        hunter_id: String,
    },
    SirenResumed,
    PlayerCaught {
        #[serde(rename = "hunterId")]
        hunter_id: String,
    },
    ModeWarningStarted {
        mode: GhostMode,
    },
    ModeChanged {
        mode: GhostMode,
    },
    MazeCleared,
}

#[derive(Clone, Debug, Serialize)]
pub struct Snapshot {
    pub tick: u64,
    #[serde(rename = "nowMs")]
    pub now_ms: u64,
    pub score: u32,
    #[serde(rename = "highScore")]
    pub high_score: u32,
    #[serde(rename = "poweredUp")]
    pub powered_up: bool,
    pub mode: GhostMode,
    #[serde(rename = "modeElapsedMs")]
    pub mode_elapsed_ms: u64,
    #[serde(rename = "gameOver")]
    pub game_over: bool,
    #[serde(rename = "endReason")]
    pub end_reason: Option<GameOverReason>,
    pub player: PlayerView,
    pub hunters: Vec<HunterView>,
    pub dots: Vec<Vec2>,
    #[serde(rename = "powerPellets")]
    pub power_pellets: Vec<Vec2>,
    pub events: Vec<RuntimeEvent>,
}
