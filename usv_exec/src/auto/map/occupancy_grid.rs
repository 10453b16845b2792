//! # Occupancy Grid
//!
//! A dense walkability map over the vessel's operating area. Cells are stored in a single
//! [`ndarray::Array2`] indexed `[x, y]`, owned and mutated only by [`OccupancyGrid`]. The planners
//! take shared references to it.
//!
//! Populating a large grid does not fit in one control cycle, so the grid is built cooperatively:
//! the caller invokes [`OccupancyGrid::build_step`] once per cycle with a cell budget until it
//! reports [`BuildStatus::Done`], then runs a full [`OccupancyGrid::refresh`].

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use log::{debug, info};
use nalgebra::{Point2, Vector2, Vector3};
use ndarray::Array2;
use serde::{Deserialize, Serialize};

use super::obstacles::ObstacleField;

// ------------------------------------------------------------------------------------------------
// TYPES
// ------------------------------------------------------------------------------------------------

/// Index of a cell in the grid.
///
/// Signed so that requests for cells outside the grid can be represented (and rejected).
pub type CellIdx = Point2<i32>;

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// Parameters for the occupancy grid
#[derive(Debug, Clone, Deserialize)]
pub struct OccupancyGridParams {
    /// The area the vessel is allowed to operate in. There is no sensible default, so a missing
    /// area is a configuration error.
    pub operating_area: Option<OperatingArea>,

    /// Side length of each (square) cell
    pub cell_size_m: f64,

    /// Height of the water plane, used for the Z coordinate of cell centres
    pub reference_height_m: f64,

    /// Clearance added to half the cell size when testing a cell for obstacles
    pub refresh_margin_m: f64,

    /// Number of cells a view-bounded refresh extends beyond the requested bounds on each side
    pub view_margin_cells: usize,

    /// Number of cells initialised per call to `build_step` by the navigation manager
    pub build_budget_cells: usize,
}

/// Rectangular operating area in the water plane.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct OperatingArea {
    /// Centre of the area
    pub centre_m: Vector2<f64>,

    /// Extent of the area along X and Y
    pub size_m: Vector2<f64>,
}

/// A single grid cell.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Cell {
    /// Index of this cell
    pub idx: CellIdx,

    /// Whether the vessel may enter this cell
    pub walkable: bool,

    /// World position of the cell centre, at the grid's reference height
    pub centre_m: Vector3<f64>,
}

/// Inclusive rectangle of cells.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CellBounds {
    pub min: CellIdx,
    pub max: CellIdx,
}

/// Dense walkability map of the operating area.
#[derive(Debug, Clone)]
pub struct OccupancyGrid {
    params: OccupancyGridParams,

    /// World position of the corner of cell (0, 0)
    origin_m: Vector2<f64>,

    /// Number of cells along X
    width: usize,

    /// Number of cells along Y
    height: usize,

    /// The cell arena, `None` until the build has completed
    cells: Option<Array2<Cell>>,

    /// Cells initialised so far while the build is in progress, in `x * height + y` order
    pending: Vec<Cell>,
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

/// Result of one budgeted build step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuildStatus {
    /// More cells remain to be initialised
    InProgress { remaining: usize },

    /// Every cell has been initialised and the grid is ready
    Done,
}

#[derive(Debug, thiserror::Error)]
pub enum GridError {
    #[error("Missing configuration item: {0}")]
    MissingConfig(&'static str),

    #[error("Cell size must be positive and finite, found {0}")]
    InvalidCellSize(f64),

    #[error("Operating area must have a positive, finite size, found {0:?}")]
    InvalidAreaSize(Vector2<f64>),

    #[error("The grid has not finished building")]
    NotReady,

    #[error("Cell {0:?} is outside the grid")]
    OutsideGrid(CellIdx),

    #[error("Cell arena has an unexpected shape: {0}")]
    ShapeError(ndarray::ShapeError),
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl OccupancyGrid {
    /// Create a new, unbuilt grid covering the operating area.
    ///
    /// Fails if the operating area is not configured or the geometry is degenerate.
    pub fn new(params: OccupancyGridParams) -> Result<Self, GridError> {
        let area = params
            .operating_area
            .ok_or(GridError::MissingConfig("operating_area"))?;

        if !(params.cell_size_m.is_finite() && params.cell_size_m > 0.0) {
            return Err(GridError::InvalidCellSize(params.cell_size_m));
        }
        if !(area.size_m.iter().all(|s| s.is_finite() && *s > 0.0)) {
            return Err(GridError::InvalidAreaSize(area.size_m));
        }

        let origin_m = area.centre_m - area.size_m / 2.0;
        let width = (area.size_m[0] / params.cell_size_m).ceil() as usize;
        let height = (area.size_m[1] / params.cell_size_m).ceil() as usize;

        debug!(
            "New {}x{} occupancy grid with origin {:?} and {} m cells",
            width, height, origin_m, params.cell_size_m
        );

        Ok(Self {
            params,
            origin_m,
            width,
            height,
            cells: None,
            pending: Vec::with_capacity(width * height),
        })
    }

    /// Initialise up to `budget` more cells (at least one per call).
    ///
    /// All cells start walkable. Once the final cell is initialised the grid becomes ready, and
    /// the caller is expected to run a full [`OccupancyGrid::refresh`].
    pub fn build_step(&mut self, budget: usize) -> Result<BuildStatus, GridError> {
        if self.cells.is_some() {
            return Ok(BuildStatus::Done);
        }

        let total = self.num_cells();
        let end = total.min(self.pending.len().saturating_add(budget.max(1)));

        for i in self.pending.len()..end {
            let idx = CellIdx::new((i / self.height) as i32, (i % self.height) as i32);
            let centre_m = self.cell_centre(&idx);
            self.pending.push(Cell {
                idx,
                walkable: true,
                centre_m,
            });
        }

        if self.pending.len() < total {
            return Ok(BuildStatus::InProgress {
                remaining: total - self.pending.len(),
            });
        }

        let cells = std::mem::take(&mut self.pending);
        self.cells = Some(
            Array2::from_shape_vec((self.width, self.height), cells)
                .map_err(GridError::ShapeError)?,
        );

        info!("Occupancy grid built ({} cells)", total);

        Ok(BuildStatus::Done)
    }

    /// Run the build to completion in one call.
    pub fn build_all(&mut self) -> Result<(), GridError> {
        while let BuildStatus::InProgress { .. } = self.build_step(self.num_cells())? {}
        Ok(())
    }

    /// Discard every cell and start the build again from scratch.
    ///
    /// The grid is not ready until [`OccupancyGrid::build_step`] has run to completion again.
    pub fn reset(&mut self) {
        self.cells = None;
        self.pending.clear();

        info!("Occupancy grid reset, rebuilding {} cells", self.num_cells());
    }

    /// Returns true once the build has completed.
    pub fn is_ready(&self) -> bool {
        self.cells.is_some()
    }

    /// Recompute walkability from the obstacle field.
    ///
    /// A cell is walkable if no obstacle lies within half a cell plus the refresh margin of its
    /// centre. If `view` is given only that rectangle, grown by `view_margin_cells` and clipped to
    /// the grid, is recomputed. Returns the number of cells whose walkability changed.
    pub fn refresh(
        &mut self,
        obstacles: &dyn ObstacleField,
        view: Option<CellBounds>,
    ) -> Result<usize, GridError> {
        let check_radius_m = self.params.cell_size_m / 2.0 + self.params.refresh_margin_m;

        let bounds = match view {
            Some(v) => v.expanded(self.params.view_margin_cells as i32),
            None => CellBounds {
                min: CellIdx::new(0, 0),
                max: CellIdx::new(self.width as i32 - 1, self.height as i32 - 1),
            },
        };
        let min = self.clamp_cell(&bounds.min);
        let max = self.clamp_cell(&bounds.max);

        let cells = self.cells.as_mut().ok_or(GridError::NotReady)?;
        let mut num_changed = 0;

        for x in min.x..=max.x {
            for y in min.y..=max.y {
                let cell = &mut cells[[x as usize, y as usize]];
                let centre_m = Vector2::new(cell.centre_m[0], cell.centre_m[1]);
                let walkable = !obstacles.any_within(&centre_m, check_radius_m);

                if walkable != cell.walkable {
                    cell.walkable = walkable;
                    num_changed += 1;
                }
            }
        }

        debug!(
            "Refreshed cells {:?} to {:?}, {} changed",
            (min.x, min.y),
            (max.x, max.y),
            num_changed
        );

        Ok(num_changed)
    }

    /// Convert a world position into the cell containing it.
    ///
    /// Positions outside the grid map to the nearest edge cell.
    pub fn world_to_grid(&self, position_m: &Vector2<f64>) -> CellIdx {
        let rel = (position_m - self.origin_m) / self.params.cell_size_m;

        self.clamp_cell(&CellIdx::new(
            to_index(rel[0].floor()),
            to_index(rel[1].floor()),
        ))
    }

    /// World position of the centre of a cell (clamped into the grid), at the reference height.
    pub fn grid_to_world(&self, cell: &CellIdx) -> Vector3<f64> {
        self.cell_centre(&self.clamp_cell(cell))
    }

    /// Planar world position of the centre of a cell (clamped into the grid).
    pub fn grid_to_world2(&self, cell: &CellIdx) -> Vector2<f64> {
        let centre = self.grid_to_world(cell);
        Vector2::new(centre[0], centre[1])
    }

    /// Returns false for cells outside the grid, and for every cell before the build completes.
    pub fn is_walkable(&self, cell: &CellIdx) -> bool {
        self.get(cell).map(|c| c.walkable).unwrap_or(false)
    }

    /// Get a cell if it is inside the grid and the grid is built.
    pub fn get(&self, cell: &CellIdx) -> Option<&Cell> {
        if !self.in_bounds(cell) {
            return None;
        }

        self.cells
            .as_ref()
            .map(|c| &c[[cell.x as usize, cell.y as usize]])
    }

    /// Force the walkability of a single cell, for instance from an external hazard report.
    pub fn set_walkable(&mut self, cell: &CellIdx, walkable: bool) -> Result<(), GridError> {
        if !self.in_bounds(cell) {
            return Err(GridError::OutsideGrid(*cell));
        }

        let cells = self.cells.as_mut().ok_or(GridError::NotReady)?;
        cells[[cell.x as usize, cell.y as usize]].walkable = walkable;

        Ok(())
    }

    pub fn in_bounds(&self, cell: &CellIdx) -> bool {
        cell.x >= 0 && cell.y >= 0 && (cell.x as usize) < self.width && (cell.y as usize) < self.height
    }

    /// Clamp a cell index into `[0, width) x [0, height)`.
    pub fn clamp_cell(&self, cell: &CellIdx) -> CellIdx {
        CellIdx::new(
            cell.x.max(0).min(self.width as i32 - 1),
            cell.y.max(0).min(self.height as i32 - 1),
        )
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn num_cells(&self) -> usize {
        self.width * self.height
    }

    pub fn cell_size_m(&self) -> f64 {
        self.params.cell_size_m
    }

    pub fn origin_m(&self) -> Vector2<f64> {
        self.origin_m
    }

    pub fn params(&self) -> &OccupancyGridParams {
        &self.params
    }

    /// Centre of a cell without clamping.
    fn cell_centre(&self, cell: &CellIdx) -> Vector3<f64> {
        let cs = self.params.cell_size_m;
        Vector3::new(
            self.origin_m[0] + cell.x as f64 * cs + cs / 2.0,
            self.origin_m[1] + cell.y as f64 * cs + cs / 2.0,
            self.params.reference_height_m,
        )
    }
}

impl CellBounds {
    pub fn new(min: CellIdx, max: CellIdx) -> Self {
        Self { min, max }
    }

    /// Grow the bounds by `margin` cells on every side.
    pub fn expanded(&self, margin: i32) -> Self {
        Self {
            min: CellIdx::new(self.min.x - margin, self.min.y - margin),
            max: CellIdx::new(self.max.x + margin, self.max.y + margin),
        }
    }
}

impl Default for OccupancyGridParams {
    fn default() -> Self {
        Self {
            operating_area: None,
            cell_size_m: 1.0,
            reference_height_m: 0.05,
            refresh_margin_m: 0.1,
            view_margin_cells: 5,
            build_budget_cells: 200,
        }
    }
}

// ------------------------------------------------------------------------------------------------
// FUNCTIONS
// ------------------------------------------------------------------------------------------------

/// Convert a floored coordinate to an index, saturating non-finite and huge values.
fn to_index(value: f64) -> i32 {
    if value.is_nan() {
        0
    } else {
        value.max(i32::MIN as f64).min(i32::MAX as f64) as i32
    }
}

// ------------------------------------------------------------------------------------------------
// TESTS
// ------------------------------------------------------------------------------------------------
