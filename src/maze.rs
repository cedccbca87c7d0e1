use std::collections::BTreeSet;

use crate::constants::{
    CELL_SIZE, CLASSIC_LAYOUT, GATE_MAX_COL, GATE_MIN_COL, GATE_ROW, HOUSE_CENTER_COL,
    HOUSE_MAX_COL, HOUSE_MAX_ROW, HOUSE_MIN_COL, HOUSE_MIN_ROW, TUNNEL_ROW,
};
use crate::error::{SimError, SimResult};
use crate::types::{CellKind, Vec2};

/// Inclusive rectangle of cells.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CellRect {
    pub min_col: i32,
    pub max_col: i32,
    pub min_row: i32,
    pub max_row: i32,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MazeGeometry {
    pub tunnel_row: Option<i32>,
    /// Hunter-house door; never blocks movement.
    pub gate: Option<CellRect>,
    pub house: Option<CellRect>,
    pub house_center_col: i32,
}

impl MazeGeometry {
    pub fn classic() -> Self {
        Self {
            tunnel_row: Some(TUNNEL_ROW),
            gate: Some(CellRect {
                min_col: GATE_MIN_COL,
                max_col: GATE_MAX_COL,
                min_row: GATE_ROW,
                max_row: GATE_ROW,
            }),
            house: Some(CellRect {
                min_col: HOUSE_MIN_COL,
                max_col: HOUSE_MAX_COL,
                min_row: HOUSE_MIN_ROW,
                max_row: HOUSE_MAX_ROW,
            }),
            house_center_col: HOUSE_CENTER_COL,
        }
    }

    /// No tunnel, gate or house.
    pub fn plain() -> Self {
        Self {
            tunnel_row: None,
            gate: None,
            house: None,
            house_center_col: 0,
        }
    }
}

#[derive(Clone, Debug)]
pub struct Maze {
    width: i32,
    height: i32,
    cells: Vec<CellKind>,
    geometry: MazeGeometry,
    player_start: Vec2,
}

impl Maze {
    pub fn classic() -> SimResult<Self> {
        Self::parse(&CLASSIC_LAYOUT, MazeGeometry::classic())
    }

    pub fn parse(rows: &[&str], geometry: MazeGeometry) -> SimResult<Self> {
        let height = rows.len();
        let width = rows.first().map(|row| row.chars().count()).unwrap_or(0);
        if height == 0 || width == 0 {
            return Err(SimError::InvalidMaze("layout is empty".to_string()));
        }

        let mut cells = Vec::with_capacity(width * height);
        let mut player_start = None;
        for (y, row) in rows.iter().enumerate() {
            if row.chars().count() != width {
                return Err(SimError::InvalidMaze(format!(
                    "row {y} has {} cells, expected {width}",
                    row.chars().count()
                )));
            }
            for (x, ch) in row.chars().enumerate() {
                let kind = match ch {
                    '#' => CellKind::Wall,
                    '.' => CellKind::Dot,
                    'o' => CellKind::PowerPellet,
                    ' ' => CellKind::Empty,
                    'P' | 'S' => {
                        if player_start.is_some() {
                            return Err(SimError::InvalidMaze(
                                "more than one player start".to_string(),
                            ));
                        }
                        player_start = Some(Vec2 {
                            x: x as i32,
                            y: y as i32,
                        });
                        if ch == 'S' {
                            CellKind::Dot
                        } else {
                            CellKind::Empty
                        }
                    }
                    other => {
                        return Err(SimError::InvalidMaze(format!(
                            "unknown tile {other:?} at ({x}, {y})"
                        )));
                    }
                };
                cells.push(kind);
            }
        }

        let Some(player_start) = player_start else {
            return Err(SimError::InvalidMaze("missing player start".to_string()));
        };

        Ok(Self {
            width: width as i32,
            height: height as i32,
            cells,
            geometry,
            player_start,
        })
    }

    pub fn width(&self) -> i32 {
        self.width
    }

    pub fn height(&self) -> i32 {
        self.height
    }

    pub fn pixel_width(&self) -> f32 {
        self.width as f32 * CELL_SIZE
    }

    pub fn player_start(&self) -> Vec2 {
        self.player_start
    }

    pub fn geometry(&self) -> &MazeGeometry {
        &self.geometry
    }

    pub fn in_bounds(&self, x: i32, y: i32) -> bool {
        x >= 0 && y >= 0 && x < self.width && y < self.height
    }

    pub fn cell_kind(&self, x: i32, y: i32) -> Option<CellKind> {
        if !self.in_bounds(x, y) {
            return None;
        }
        self.cells.get((y * self.width + x) as usize).copied()
    }

    /// Out-of-bounds cells are not walls.
    pub fn is_wall(&self, x: i32, y: i32) -> bool {
        self.cell_kind(x, y) == Some(CellKind::Wall)
    }

    pub fn is_open_cell(&self, x: i32, y: i32) -> bool {
        matches!(self.cell_kind(x, y), Some(kind) if kind != CellKind::Wall)
    }

    pub fn has_line_of_sight(&self, from: Vec2, to: Vec2) -> bool {
        if from.y == to.y {
            let (start, end) = (from.x.min(to.x), from.x.max(to.x));
            return ((start + 1)..end).all(|x| !self.is_wall(x, from.y));
        }
        if from.x == to.x {
            let (start, end) = (from.y.min(to.y), from.y.max(to.y));
            return ((start + 1)..end).all(|y| !self.is_wall(from.x, y));
        }
        false
    }

    pub fn dot_cells(&self) -> BTreeSet<(i32, i32)> {
        self.cells_of_kind(CellKind::Dot)
    }

    pub fn power_pellet_cells(&self) -> BTreeSet<(i32, i32)> {
        self.cells_of_kind(CellKind::PowerPellet)
    }

    fn cells_of_kind(&self, kind: CellKind) -> BTreeSet<(i32, i32)> {
        let mut out = BTreeSet::new();
        for y in 0..self.height {
            for x in 0..self.width {
                if self.cell_kind(x, y) == Some(kind) {
                    out.insert((x, y));
                }
            }
        }
        out
    }

    pub fn in_tunnel_band(&self, y: f32) -> bool {
        match self.geometry.tunnel_row {
            Some(row) => {
                y >= row as f32 * CELL_SIZE && y <= (row + 1) as f32 * CELL_SIZE
            }
            None => false,
        }
    }

    /// Whether a box spanning the given corner cells touches the gate rows
    /// while staying inside its columns.
    pub fn in_gate(&self, left: i32, right: i32, top: i32, bottom: i32) -> bool {
        let Some(gate) = self.geometry.gate else {
            return false;
        };
        let row_hit = (gate.min_row..=gate.max_row).contains(&top)
            || (gate.min_row..=gate.max_row).contains(&bottom);
        row_hit && left >= gate.min_col && right <= gate.max_col
    }

    /// Continuous-coordinate test against the house rectangle.
    pub fn in_house(&self, x: f32, y: f32) -> bool {
        let Some(house) = self.geometry.house else {
            return false;
        };
        x >= house.min_col as f32 * CELL_SIZE
            && x <= house.max_col as f32 * CELL_SIZE
            && y >= house.min_row as f32 * CELL_SIZE
            && y <= house.max_row as f32 * CELL_SIZE
    }

    pub fn house_center_x(&self) -> f32 {
        self.geometry.house_center_col as f32 * CELL_SIZE
    }
}
