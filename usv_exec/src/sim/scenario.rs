//! # Scenarios
//!
//! A scenario file describes a run of the simulation: where the vessel starts, where it should go
//! and what is in the water.
//!
//! ```toml
//! vessel_radius_m = 0.5
//! goal_m = [40.0, 10.0]
//!
//! [start]
//! position_m = [2.0, 2.0]
//! heading_rad = 0.0
//!
//! [[static_obstacles]]
//! type = "box"
//! min_m = [10.0, 0.0]
//! max_m = [14.0, 12.0]
//!
//! [[moving_obstacles]]
//! centre_m = [30.0, 2.0]
//! radius_m = 1.0
//! velocity_ms = [0.0, 0.5]
//! ```

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use std::path::Path;

use nalgebra::Vector2;
use serde::Deserialize;

use util::params::{load_file, LoadError};

use super::{MovingObstacle, SimWorld};
use crate::auto::{
    loc::Pose,
    map::{ObstacleSet, ObstacleShape, OperatingArea},
};

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
pub struct Scenario {
    pub start: Option<ScenarioStart>,

    pub goal_m: Option<Vector2<f64>>,

    /// Overrides the operating area from the occupancy grid parameters
    #[serde(default)]
    pub operating_area: Option<OperatingArea>,

    #[serde(default = "default_vessel_radius")]
    pub vessel_radius_m: f64,

    #[serde(default)]
    pub static_obstacles: Vec<ObstacleShape>,

    #[serde(default)]
    pub moving_obstacles: Vec<MovingObstacle>,
}

#[derive(Debug, Clone, Copy, Deserialize)]
pub struct ScenarioStart {
    pub position_m: Vector2<f64>,

    #[serde(default)]
    pub heading_rad: f64,
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum ScenarioError {
    #[error("Could not load the scenario: {0}")]
    LoadError(LoadError),

    #[error("The scenario doesn't specify the {0}")]
    MissingDependency(&'static str),
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl Scenario {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ScenarioError> {
        load_file(path).map_err(ScenarioError::LoadError)
    }

    pub fn start_pose(&self) -> Result<Pose, ScenarioError> {
        self.start
            .map(|s| Pose::from_planar(s.position_m[0], s.position_m[1], s.heading_rad))
            .ok_or(ScenarioError::MissingDependency("start"))
    }

    pub fn goal(&self) -> Result<Vector2<f64>, ScenarioError> {
        self.goal_m.ok_or(ScenarioError::MissingDependency("goal"))
    }

    pub fn static_obstacle_set(&self) -> ObstacleSet {
        ObstacleSet::new(self.static_obstacles.clone())
    }

    /// Build the simulation world with the vessel at the start pose.
    pub fn build_world(&self) -> Result<SimWorld, ScenarioError> {
        Ok(SimWorld::new(
            self.static_obstacle_set(),
            self.moving_obstacles.clone(),
            self.start_pose()?,
            self.vessel_radius_m,
        ))
    }
}

// ------------------------------------------------------------------------------------------------
// FUNCTIONS
// ------------------------------------------------------------------------------------------------

fn default_vessel_radius() -> f64 {
    0.5
}

// ------------------------------------------------------------------------------------------------
// TESTS
// ------------------------------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;

    const SCENARIO: &str = r#"
goal_m = [40.0, 10.0]

[start]
position_m = [2.0, 2.0]

[[static_obstacles]]
type = "box"
min_m = [10.0, 0.0]
max_m = [14.0, 12.0]

[[static_obstacles]]
type = "circle"
centre_m = [20.0, 20.0]
radius_m = 2.0

[[moving_obstacles]]
centre_m = [30.0, 2.0]
radius_m = 1.0
velocity_ms = [0.0, 0.5]
"#;

    fn write(name: &str, contents: &str) -> std::path::PathBuf {
        let path = std::env::temp_dir().join(name);
        std::fs::write(&path, contents).unwrap();
        path
    }

    #[test]
    fn test_load() {
        let path = write("usv_scenario_test_load.toml", SCENARIO);
        let scenario = Scenario::load(&path).unwrap();

        assert_eq!(scenario.goal().unwrap(), Vector2::new(40.0, 10.0));
        assert_eq!(scenario.static_obstacles.len(), 2);
        assert_eq!(scenario.vessel_radius_m, 0.5);
        assert!(scenario.operating_area.is_none());

        let world = scenario.build_world().unwrap();
        assert_eq!(world.pose().position2(), Vector2::new(2.0, 2.0));
        assert_eq!(world.lidar_targets().len(), 3);
    }

    #[test]
    fn test_missing_start() {
        let path = write(
            "usv_scenario_test_missing.toml",
            "goal_m = [1.0, 1.0]\n",
        );
        let scenario = Scenario::load(&path).unwrap();

        assert!(matches!(
            scenario.start_pose(),
            Err(ScenarioError::MissingDependency("start"))
        ));
        assert!(matches!(
            scenario.build_world(),
            Err(ScenarioError::MissingDependency("start"))
        ));
        assert!(scenario.goal().is_ok());
    }

    #[test]
    fn test_harbour_scenario() {
        use crate::auto::{
            map::{OccupancyGrid, OccupancyGridParams},
            nav::{
                GlobalPlannerParams, LocalPlannerParams, NavInput, NavMgr, NavMgrParams, NavMode,
            },
            per::{SimLidar, SimLidarParams},
            traj_ctrl::WaypointFollowerParams,
        };

        let root = Path::new(env!("CARGO_MANIFEST_DIR")).join("..");
        let params_dir = root.join("params");
        let dt_s = 0.1;

        let scenario = Scenario::load(root.join("scenarios/harbour.toml")).unwrap();
        let grid_params: OccupancyGridParams =
            load_file(params_dir.join("occupancy_grid.toml")).unwrap();
        let local_params: LocalPlannerParams =
            load_file(params_dir.join("local_planner.toml")).unwrap();
        let global_params: GlobalPlannerParams =
            load_file(params_dir.join("global_planner.toml")).unwrap();
        let nav_mgr_params: NavMgrParams = load_file(params_dir.join("nav_mgr.toml")).unwrap();
        let follower_params: WaypointFollowerParams =
            load_file(params_dir.join("waypoint_follower.toml")).unwrap();
        let lidar_params: SimLidarParams = load_file(params_dir.join("sim_lidar.toml")).unwrap();

        let mut mgr = NavMgr::new(
            nav_mgr_params,
            OccupancyGrid::new(grid_params).unwrap(),
            scenario.static_obstacle_set(),
            local_params,
            global_params,
            follower_params,
        );
        mgr.set_goal(scenario.goal().unwrap());

        let mut world = scenario.build_world().unwrap();
        let mut lidar = SimLidar::new(lidar_params);

        let mut num_avoiding = 0;
        let mut collided = false;
        let mut arrived = false;

        for _ in 0..3000 {
            lidar.set_targets(world.lidar_targets());
            let inp = NavInput {
                pose: world.pose(),
                velocity_ms: world.velocity_ms(),
                dt_s,
            };
            let out = mgr.step(&inp, &mut lidar, None).unwrap();

            match out.mode {
                NavMode::Arrived => {
                    arrived = true;
                    break;
                }
                NavMode::Avoiding => num_avoiding += 1,
                _ => (),
            }

            world.step(&out.cmd, dt_s);
            collided |= world.in_collision();
        }

        assert!(num_avoiding > 0);
        assert!(!collided);
        assert!(arrived);
    }
}
