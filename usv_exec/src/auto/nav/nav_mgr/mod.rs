//! # Navigation Manager
//!
//! Runs the planners once per control tick and produces the helm command for that tick.
//!
//! The manager owns the occupancy grid, the current global path and the re-plan schedule. Each
//! tick it:
//!  - builds the grid a slice at a time until it is ready, holding the vessel stopped,
//!  - applies any queued grid refresh before searching, so no search sees a half updated grid,
//!  - re-plans the global path when due, swapping in the new path only once it is complete and
//!    keeping the old one if the search fails,
//!  - scans for obstacles and hands control to the local planner while any are admitted,
//!    otherwise to the action proposer or the waypoint follower.

// -----------------------------------------------------------------------------------------------
// MODULES
// -----------------------------------------------------------------------------------------------

pub mod params;
mod replan;

// -----------------------------------------------------------------------------------------------
// IMPORTS
// -----------------------------------------------------------------------------------------------

use log::{debug, info, trace, warn};
use nalgebra::{Vector2, Vector3};
use serde::Serialize;

use comms_if::tc::helm::HelmCmd;

use crate::auto::{
    loc::Pose,
    map::{BuildStatus, CellBounds, CellIdx, GridError, ObstacleSet, OccupancyGrid},
    path::Path,
    per::{admit_obstacles, group_obstacles, RangeSensor},
    traj_ctrl::{WaypointFollower, WaypointFollowerParams},
};

use super::{
    action_proposer::ActionProposer,
    global_planner::{GlobalPlanner, GlobalPlannerParams, PlanError, SearchReport},
    local_planner::{LocalPlanner, LocalPlannerParams, WaypointTracker},
};

pub use params::NavMgrParams;
pub use replan::ReplanSchedule;

// -----------------------------------------------------------------------------------------------
// STRUCTS
// -----------------------------------------------------------------------------------------------

pub struct NavMgr {
    params: NavMgrParams,

    grid: OccupancyGrid,
    static_obstacles: ObstacleSet,

    global_planner: GlobalPlanner,
    local_planner: LocalPlanner,
    follower: WaypointFollower,
    tracker: WaypointTracker,

    goal_m: Option<Vector2<f64>>,
    path: Option<Path>,

    schedule: ReplanSchedule,

    /// Queued grid refresh, `Some(None)` for the whole grid
    pending_refresh: Option<Option<CellBounds>>,

    avoiding: bool,

    last_plan_error: Option<PlanError>,

    /// Time since the manager was created
    time_s: f64,
}

/// Vessel state for one tick
#[derive(Debug, Clone, Copy)]
pub struct NavInput {
    pub pose: Pose,

    /// Velocity in the world frame
    pub velocity_ms: Vector3<f64>,

    /// Time since the previous tick
    pub dt_s: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct NavMgrOutput {
    pub cmd: HelmCmd,

    pub mode: NavMode,

    /// True on the tick a new global path was swapped in
    pub path_replaced: bool,

    /// Number of obstacles admitted for avoidance this tick
    pub num_admitted: usize,
}

// -----------------------------------------------------------------------------------------------
// ENUMS
// -----------------------------------------------------------------------------------------------

/// Where the command for a tick came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum NavMode {
    /// Grid still building, holding stopped
    BuildingGrid,

    /// Following the tracked waypoint with the waypoint follower
    Following,

    /// Command supplied by the action proposer
    Proposed,

    /// Local planner avoiding admitted obstacles
    Avoiding,

    /// Waypoint follower steering back to the global path after avoiding
    Returning,

    /// Within tolerance of the goal, holding stopped
    Arrived,
}

#[derive(Debug, thiserror::Error)]
pub enum NavMgrError {
    #[error("Expected {0} to be set before stepping")]
    MissingDependency(&'static str),

    #[error("Occupancy grid error: {0}")]
    GridError(GridError),
}

// -----------------------------------------------------------------------------------------------
// IMPLS
// -----------------------------------------------------------------------------------------------

impl NavMgr {
    /// Create a new manager.
    ///
    /// The grid may be unbuilt, in which case it is built over the first ticks.
    pub fn new(
        params: NavMgrParams,
        grid: OccupancyGrid,
        static_obstacles: ObstacleSet,
        local_params: LocalPlannerParams,
        global_params: GlobalPlannerParams,
        follower_params: WaypointFollowerParams,
    ) -> Self {
        let tracker = WaypointTracker::new(local_params.waypoint_arrival_m);

        Self {
            params,
            grid,
            static_obstacles,
            global_planner: GlobalPlanner::new(global_params),
            local_planner: LocalPlanner::new(local_params),
            follower: WaypointFollower::new(follower_params),
            tracker,
            goal_m: None,
            path: None,
            schedule: ReplanSchedule::new(),
            pending_refresh: None,
            avoiding: false,
            last_plan_error: None,
            time_s: 0.0,
        }
    }

    /// Set a new goal and request a path to it.
    ///
    /// The vessel keeps following any existing path until the new one is ready.
    pub fn set_goal(&mut self, goal_m: Vector2<f64>) {
        info!("New goal: ({:.2}, {:.2})", goal_m[0], goal_m[1]);
        self.goal_m = Some(goal_m);
        self.schedule.request(self.time_s, 0.0);
    }

    /// Replace the static obstacles the grid is built from. Takes effect at the next refresh.
    pub fn set_static_obstacles(&mut self, static_obstacles: ObstacleSet) {
        self.static_obstacles = static_obstacles;
    }

    /// Queue a grid refresh for the start of the next tick, `None` for the whole grid.
    pub fn request_refresh(&mut self, view: Option<CellBounds>) {
        self.pending_refresh = match (self.pending_refresh.take(), view) {
            (Some(Some(a)), Some(b)) => Some(Some(CellBounds::new(
                CellIdx::new(a.min.x.min(b.min.x), a.min.y.min(b.min.y)),
                CellIdx::new(a.max.x.max(b.max.x), a.max.y.max(b.max.y)),
            ))),
            (None, v) => Some(v),
            _ => Some(None),
        };
    }

    /// Throw the grid away and build it again over the following ticks.
    ///
    /// The vessel is held stopped until the rebuild completes, after which the grid is refreshed
    /// in full and a path is planned on it. The current path is kept until then.
    pub fn reset_grid(&mut self) {
        info!("Resetting the occupancy grid");
        self.grid.reset();
        self.pending_refresh = None;
        self.avoiding = false;
    }

    /// Report a collision, re-planning after the collision debounce delay.
    pub fn notify_collision(&mut self) {
        warn!("Collision reported, re-planning");
        self.schedule
            .request(self.time_s, self.params.collision_replan_delay_s);
    }

    pub fn is_grid_ready(&self) -> bool {
        self.grid.is_ready()
    }

    pub fn path_available(&self) -> bool {
        self.path.as_ref().map(|p| !p.is_empty()).unwrap_or(false)
    }

    pub fn global_path(&self) -> Option<&Path> {
        self.path.as_ref()
    }

    pub fn is_avoiding(&self) -> bool {
        self.avoiding
    }

    pub fn is_replan_pending(&self) -> bool {
        self.schedule.is_pending()
    }

    pub fn grid(&self) -> &OccupancyGrid {
        &self.grid
    }

    pub fn goal(&self) -> Option<Vector2<f64>> {
        self.goal_m
    }

    /// The error from the latest failed re-plan, cleared by the next success.
    pub fn last_plan_error(&self) -> Option<&PlanError> {
        self.last_plan_error.as_ref()
    }

    pub fn last_search_report(&self) -> Option<&SearchReport> {
        self.global_planner.last_report()
    }

    /// Step the manager, producing exactly one command.
    pub fn step(
        &mut self,
        input: &NavInput,
        sensor: &mut dyn RangeSensor,
        proposer: Option<&mut dyn ActionProposer>,
    ) -> Result<NavMgrOutput, NavMgrError> {
        let goal_m = self.goal_m.ok_or(NavMgrError::MissingDependency("goal"))?;

        self.time_s += input.dt_s;

        let pose = &input.pose;
        let position_m = pose.position2();

        // Build the grid before anything else
        if !self.grid.is_ready() {
            self.build_grid()?;
            return Ok(NavMgrOutput::stop(NavMode::BuildingGrid));
        }

        // Refresh before searching so the planner sees a consistent grid
        if let Some(view) = self.pending_refresh.take() {
            let num_changed = self.grid.refresh(&self.static_obstacles, view)?;
            debug!("Grid refreshed, {} cells changed", num_changed);
            self.schedule.request(self.time_s, 0.0);
        }

        let mut path_replaced = false;
        if self.schedule.take_due(self.time_s) {
            path_replaced = self.replan(&position_m, &goal_m);
        }

        if (goal_m - position_m).norm() < self.params.goal_tolerance_m {
            self.avoiding = false;
            return Ok(NavMgrOutput {
                path_replaced,
                ..NavMgrOutput::stop(NavMode::Arrived)
            });
        }

        sensor.complete_scan(pose, input.dt_s);
        let admitted = admit_obstacles(
            &sensor.returns(),
            &self.grid,
            self.local_planner.params().safe_distance_m,
        );
        let obstacles = group_obstacles(
            &admitted,
            &position_m,
            self.local_planner.params().obstacle_join_distance_m,
        );

        let waypoint_m = self
            .tracker
            .update(self.path.as_ref(), &position_m, &goal_m);

        let return_threshold_m = self.local_planner.params().return_to_path_threshold_m;
        let off_path = self
            .path
            .as_ref()
            .map(|p| !p.is_close_to(&position_m, return_threshold_m))
            .unwrap_or(false);

        let (cmd, mode) = if !obstacles.is_empty() {
            if !self.avoiding {
                info!(
                    "{} obstacles admitted ({} returns), avoiding",
                    obstacles.len(),
                    admitted.len()
                );
                self.avoiding = true;
                self.follower.reset();
            }
            let plan = self
                .local_planner
                .plan(pose, &input.velocity_ms, &waypoint_m, &obstacles);
            (plan.cmd, NavMode::Avoiding)
        } else if self.avoiding && off_path {
            // Avoidance lasts until the vessel is back near the path
            (
                self.follower.get_cmd(pose, &waypoint_m, input.dt_s),
                NavMode::Returning,
            )
        } else {
            if self.avoiding {
                info!("Clear of obstacles and back on the path");
                self.avoiding = false;
            }

            match proposer {
                Some(p) => (p.propose(pose, &input.velocity_ms), NavMode::Proposed),
                None => (
                    self.follower.get_cmd(pose, &waypoint_m, input.dt_s),
                    NavMode::Following,
                ),
            }
        };

        // Lost the path, plan a new one from here
        if let Some(ref path) = self.path {
            if !path.is_close_to(&position_m, self.params.lost_path_distance_m)
                && !self.schedule.is_pending()
            {
                info!("More than {} m from the path, re-planning", self.params.lost_path_distance_m);
                self.schedule.request(self.time_s, 0.0);
            }
        }

        trace!("Nav output: {:?} {:?}", mode, cmd);

        Ok(NavMgrOutput {
            cmd: cmd.clamp_linear(self.local_planner.params().max_linear_ms),
            mode,
            path_replaced,
            num_admitted: obstacles.len(),
        })
    }

    fn build_grid(&mut self) -> Result<(), NavMgrError> {
        let budget = self.grid.params().build_budget_cells;

        match self.grid.build_step(budget)? {
            BuildStatus::InProgress { remaining } => {
                trace!("Building grid, {} cells remaining", remaining);
            }
            BuildStatus::Done => {
                let num_blocked = self.grid.refresh(&self.static_obstacles, None)?;
                info!("Grid ready, {} cells blocked", num_blocked);
                self.schedule.request(self.time_s, 0.0);
            }
        }

        Ok(())
    }

    /// Run the global planner to completion. Returns true if a new path was swapped in.
    fn replan(&mut self, position_m: &Vector2<f64>, goal_m: &Vector2<f64>) -> bool {
        match self.global_planner.plan(&self.grid, position_m, goal_m) {
            Ok(path) => {
                info!(
                    "New global path: {} cells, cost {:.2}",
                    path.cells.len(),
                    path.cost_m
                );
                self.path = Some(path);
                self.tracker.reset();
                self.last_plan_error = None;
                true
            }
            Err(e) => {
                warn!(
                    "Global planning failed ({}), keeping the current path and retrying in {} s",
                    e, self.params.replan_retry_delay_s
                );
                self.last_plan_error = Some(e);
                self.schedule
                    .request(self.time_s, self.params.replan_retry_delay_s);
                false
            }
        }
    }
}

impl NavMgrOutput {
    fn stop(mode: NavMode) -> Self {
        Self {
            cmd: HelmCmd::stop(),
            mode,
            path_replaced: false,
            num_admitted: 0,
        }
    }
}

impl From<GridError> for NavMgrError {
    fn from(e: GridError) -> Self {
        Self::GridError(e)
    }
}

// -----------------------------------------------------------------------------------------------
// TESTS
// -----------------------------------------------------------------------------------------------
