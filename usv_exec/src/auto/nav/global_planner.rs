//! Plans minimum cost paths through an [`OccupancyGrid`], using an A* algorithm.
//!
//! Movement is 8-connected: orthogonal steps cost one cell size and diagonal steps `sqrt(2)` cell
//! sizes. The heuristic is the octile distance, which is exact on an obstacle-free grid and never
//! larger than the true cost otherwise. It is multiplied by a tie-break factor a hair above one so
//! that, among nodes of equal f-cost, those closer to the goal are expanded first.
//!
//! Per-cell search state lives in an arena the size of the grid which is reset, not reallocated,
//! at the start of every search.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use std::collections::HashSet;
use std::f64::consts::SQRT_2;

use log::{debug, trace};
use nalgebra::Vector2;
use ndarray::Array2;
use ordered_float::OrderedFloat;
use serde::{Deserialize, Serialize};

use crate::auto::{
    map::{CellIdx, OccupancyGrid},
    path::Path,
};

use super::open_set::OpenSet;

// ------------------------------------------------------------------------------------------------
// CONSTANTS
// ------------------------------------------------------------------------------------------------

/// Neighbour offsets, in the order they are relaxed.
const NEIGHBOUR_OFFSETS: [(i32, i32); 8] = [
    (-1, -1),
    (0, -1),
    (1, -1),
    (-1, 0),
    (1, 0),
    (-1, 1),
    (0, 1),
    (1, 1),
];

// -----------------------------------------------------------------------------------------------
// STRUCTS
// -----------------------------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct GlobalPlanner {
    params: GlobalPlannerParams,

    /// Per-cell search state, indexed `[x, y]` like the grid
    nodes: Array2<SearchNode>,

    open: OpenSet<CellIdx, OrderedFloat<f64>>,

    last_report: Option<SearchReport>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GlobalPlannerParams {
    /// Largest ring radius, in cells, searched when a blocked start (or goal) cell is corrected
    pub correction_radius_cells: i32,

    /// If true a blocked goal is corrected with the same ring search as the start, otherwise a
    /// blocked goal fails the search
    pub correct_goal: bool,

    /// Multiplier applied to the octile heuristic to order equal-cost nodes
    pub heuristic_tie_break: f64,
}

/// Summary of the last search, kept for diagnostics.
#[derive(Debug, Clone, Serialize)]
pub struct SearchReport {
    /// Requested start cell
    pub requested_start: CellIdx,

    /// Start cell actually searched from, after correction
    pub start: Option<CellIdx>,

    /// Requested goal cell
    pub requested_goal: CellIdx,

    /// Goal cell actually searched towards, after correction
    pub goal: Option<CellIdx>,

    /// Number of nodes popped from the open set
    pub num_expanded: usize,

    /// Cost of the path found, if any
    pub path_cost_m: Option<f64>,

    /// Number of cells in the path found, zero on failure
    pub path_num_cells: usize,
}

#[derive(Debug, Clone, Copy)]
pub(crate) struct SearchNode {
    pub(crate) g_cost: f64,
    pub(crate) f_cost: f64,
    pub(crate) parent: Option<CellIdx>,
    pub(crate) closed: bool,
    pub(crate) in_open: bool,
}

// -----------------------------------------------------------------------------------------------
// ENUMS
// -----------------------------------------------------------------------------------------------

/// Reasons a search can fail. None of these are fatal, the caller decides whether to retry.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum PlanError {
    #[error("The occupancy grid is not ready")]
    GridNotReady,

    #[error("No walkable cell within the correction radius of start cell {0:?}")]
    NoValidStart(CellIdx),

    #[error("Goal cell {0:?} is not walkable")]
    NoValidGoal(CellIdx),

    #[error("Goal {goal:?} cannot be reached from {start:?} ({num_expanded} nodes expanded)")]
    UnreachableGoal {
        start: CellIdx,
        goal: CellIdx,
        num_expanded: usize,
    },

    #[error("Path reconstruction failed: {0}")]
    InternalInconsistency(String),
}

// -----------------------------------------------------------------------------------------------
// IMPLS
// -----------------------------------------------------------------------------------------------

impl GlobalPlanner {
    pub fn new(params: GlobalPlannerParams) -> Self {
        Self {
            params,
            nodes: Array2::from_elem((0, 0), SearchNode::default()),
            open: OpenSet::new(),
            last_report: None,
        }
    }

    /// Plan between two world positions, converting both to cells first.
    pub fn plan(
        &mut self,
        grid: &OccupancyGrid,
        start_m: &Vector2<f64>,
        goal_m: &Vector2<f64>,
    ) -> Result<Path, PlanError> {
        let start = grid.world_to_grid(start_m);
        let goal = grid.world_to_grid(goal_m);

        self.find_path(grid, start, goal)
    }

    /// Find the minimum cost path between two cells.
    ///
    /// A blocked or out of range start is replaced by the nearest walkable cell found by
    /// [`find_valid_cell`]. The search always runs to completion or failure, it never returns a
    /// partial path.
    pub fn find_path(
        &mut self,
        grid: &OccupancyGrid,
        start: CellIdx,
        goal: CellIdx,
    ) -> Result<Path, PlanError> {
        let mut report = SearchReport {
            requested_start: start,
            start: None,
            requested_goal: goal,
            goal: None,
            num_expanded: 0,
            path_cost_m: None,
            path_num_cells: 0,
        };

        let result = self.search(grid, start, goal, &mut report);

        if let Ok(ref path) = result {
            report.path_cost_m = Some(path.cost_m);
            report.path_num_cells = path.cells.len();
        }
        self.last_report = Some(report);

        result
    }

    /// The octile-distance heuristic between two cells, including the tie-break factor.
    pub fn heuristic(&self, grid: &OccupancyGrid, from: &CellIdx, to: &CellIdx) -> f64 {
        octile_distance(from, to, grid.cell_size_m()) * self.params.heuristic_tie_break
    }

    /// Report of the most recent search.
    pub fn last_report(&self) -> Option<&SearchReport> {
        self.last_report.as_ref()
    }

    pub fn params(&self) -> &GlobalPlannerParams {
        &self.params
    }

    fn search(
        &mut self,
        grid: &OccupancyGrid,
        start: CellIdx,
        goal: CellIdx,
        report: &mut SearchReport,
    ) -> Result<Path, PlanError> {
        if !grid.is_ready() {
            return Err(PlanError::GridNotReady);
        }

        let radius = self.params.correction_radius_cells;

        let start = find_valid_cell(grid, &start, radius).ok_or(PlanError::NoValidStart(start))?;
        if start != report.requested_start {
            debug!(
                "Start cell {:?} is blocked, using {:?} instead",
                report.requested_start, start
            );
        }
        report.start = Some(start);

        let goal = if grid.is_walkable(&goal) {
            goal
        } else if self.params.correct_goal {
            let corrected =
                find_valid_cell(grid, &goal, radius).ok_or(PlanError::NoValidGoal(goal))?;
            debug!("Goal cell {:?} is blocked, using {:?} instead", goal, corrected);
            corrected
        } else {
            return Err(PlanError::NoValidGoal(goal));
        };
        report.goal = Some(goal);

        self.reset(grid);

        let cell_size_m = grid.cell_size_m();
        let tie_break = self.params.heuristic_tie_break;

        {
            let node = &mut self.nodes[node_index(&start)];
            node.g_cost = 0.0;
            node.f_cost = octile_distance(&start, &goal, cell_size_m) * tie_break;
            node.in_open = true;
            self.open.push(start, OrderedFloat(node.f_cost));
        }

        while let Some((current, _)) = self.open.pop() {
            let current_g = {
                let node = &mut self.nodes[node_index(&current)];
                node.in_open = false;
                node.closed = true;
                node.g_cost
            };
            report.num_expanded += 1;

            if current == goal {
                let cells = reconstruct_path(&self.nodes, &start, &goal, grid.num_cells())?;

                debug!(
                    "Path from {:?} to {:?} found: {} cells, cost {:.3} m, {} nodes expanded",
                    start,
                    goal,
                    cells.len(),
                    current_g,
                    report.num_expanded
                );

                return Ok(Path::from_cells(cells, grid, current_g));
            }

            for (dx, dy) in NEIGHBOUR_OFFSETS.iter() {
                let neighbour = CellIdx::new(current.x + dx, current.y + dy);

                // Also rejects cells outside the grid
                if !grid.is_walkable(&neighbour) {
                    continue;
                }

                let node = &mut self.nodes[node_index(&neighbour)];
                if node.closed {
                    continue;
                }

                let step_m = if *dx != 0 && *dy != 0 {
                    SQRT_2 * cell_size_m
                } else {
                    cell_size_m
                };
                let tentative_g = current_g + step_m;

                if tentative_g < node.g_cost {
                    node.g_cost = tentative_g;
                    node.f_cost =
                        tentative_g + octile_distance(&neighbour, &goal, cell_size_m) * tie_break;
                    node.parent = Some(current);

                    if node.in_open {
                        self.open.decrease_key(neighbour, OrderedFloat(node.f_cost));
                    } else {
                        node.in_open = true;
                        self.open.push(neighbour, OrderedFloat(node.f_cost));
                    }
                }
            }
        }

        trace!("Open set exhausted after {} expansions", report.num_expanded);

        Err(PlanError::UnreachableGoal {
            start,
            goal,
            num_expanded: report.num_expanded,
        })
    }

    /// Reset every search node, only reallocating if the grid dimensions changed.
    fn reset(&mut self, grid: &OccupancyGrid) {
        let dim = (grid.width(), grid.height());

        if self.nodes.dim() == dim {
            self.nodes.fill(SearchNode::default());
        } else {
            trace!("Allocating search nodes for a {:?} grid", dim);
            self.nodes = Array2::from_elem(dim, SearchNode::default());
            self.open = OpenSet::with_capacity(grid.num_cells() / 4);
        }

        self.open.clear();
    }
}

impl Default for SearchNode {
    fn default() -> Self {
        Self {
            g_cost: f64::INFINITY,
            f_cost: f64::INFINITY,
            parent: None,
            closed: false,
            in_open: false,
        }
    }
}

impl Default for GlobalPlannerParams {
    fn default() -> Self {
        Self {
            correction_radius_cells: 2,
            correct_goal: false,
            heuristic_tie_break: 1.0001,
        }
    }
}

// -----------------------------------------------------------------------------------------------
// FUNCTIONS
// -----------------------------------------------------------------------------------------------

/// Octile distance between two cells: the cost of the shortest 8-connected path with no
/// obstacles.
pub fn octile_distance(from: &CellIdx, to: &CellIdx, cell_size_m: f64) -> f64 {
    let dx = (from.x - to.x).abs() as f64;
    let dy = (from.y - to.y).abs() as f64;

    (dx + dy + (SQRT_2 - 2.0) * dx.min(dy)) * cell_size_m
}

/// Find the walkable cell nearest to `cell`.
///
/// The cell itself is returned if walkable. Otherwise square rings of increasing radius up to
/// `max_radius` are scanned, each edge in a fixed order:
///
/// - top: `y = cy - r`, `x` from `cx - r` to `cx + r`
/// - right: `x = cx + r`, `y` from `cy - r + 1` to `cy + r`
/// - bottom: `y = cy + r`, `x` from `cx + r - 1` down to `cx - r`
/// - left: `x = cx - r`, `y` from `cy + r - 1` down to `cy - r + 1`
pub fn find_valid_cell(grid: &OccupancyGrid, cell: &CellIdx, max_radius: i32) -> Option<CellIdx> {
    if grid.is_walkable(cell) {
        return Some(*cell);
    }

    for r in 1..=max_radius {
        let ring = (-r..=r)
            .map(|dx| (dx, -r))
            .chain((-r + 1..=r).map(|dy| (r, dy)))
            .chain((-r..r).rev().map(|dx| (dx, r)))
            .chain((-r + 1..r).rev().map(|dy| (-r, dy)));

        for (dx, dy) in ring {
            let candidate = CellIdx::new(cell.x + dx, cell.y + dy);
            if grid.is_walkable(&candidate) {
                return Some(candidate);
            }
        }
    }

    None
}

/// Walk parent pointers from the goal back to the start.
///
/// Fails if a pointer is missing, a cell repeats, or the chain is longer than the grid.
pub(crate) fn reconstruct_path(
    nodes: &Array2<SearchNode>,
    start: &CellIdx,
    goal: &CellIdx,
    num_cells: usize,
) -> Result<Vec<CellIdx>, PlanError> {
    let mut cells = vec![*goal];
    let mut visited = HashSet::new();
    visited.insert(*goal);

    let mut current = *goal;
    while current != *start {
        if cells.len() > num_cells {
            return Err(PlanError::InternalInconsistency(format!(
                "parent chain from {:?} is longer than the grid",
                goal
            )));
        }

        let parent = nodes
            .get(node_index(&current))
            .and_then(|n| n.parent)
            .ok_or_else(|| {
                PlanError::InternalInconsistency(format!("cell {:?} has no parent", current))
            })?;

        if !visited.insert(parent) {
            return Err(PlanError::InternalInconsistency(format!(
                "cell {:?} repeats in the parent chain",
                parent
            )));
        }

        cells.push(parent);
        current = parent;
    }

    cells.reverse();

    Ok(cells)
}

/// Arena index of a cell, which must be inside the grid.
fn node_index(cell: &CellIdx) -> [usize; 2] {
    [cell.x as usize, cell.y as usize]
}

// -----------------------------------------------------------------------------------------------
// TESTS
// -----------------------------------------------------------------------------------------------
