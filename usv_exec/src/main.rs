//! Main USV executable entry point.
//!
//! Runs the autonomy against a simulated scenario.
//!
//! # Architecture
//!
//! The general execution methodology consists of:
//!
//!     - Initialise the session, logging and all modules
//!     - Main loop, once per tick:
//!         - Sensing: update the lidar targets from the world, or feed the next recorded scan
//!         - Navigation: grid build and refresh, global and local planning
//!         - Simulation: move the world on by one tick under the helm command
//!         - Archive the vessel state
//!     - Save the run summary

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use std::path::PathBuf;

use color_eyre::{
    eyre::{eyre, WrapErr},
    Result,
};
use log::{debug, info, warn};
use serde::Serialize;
use structopt::StructOpt;

use usv_lib::{
    auto::{
        map::{OccupancyGrid, OccupancyGridParams},
        nav::{
            GlobalPlannerParams, LocalPlannerParams, NavInput, NavMgr, NavMgrParams, NavMode,
        },
        per::{ExternalLidar, RangeSensor, ScanReplay, SimLidar, SimLidarParams},
        traj_ctrl::WaypointFollowerParams,
    },
    sim::Scenario,
};
use util::{
    logger::{logger_init, LevelFilter},
    params,
    session::Session,
};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

#[derive(Debug, StructOpt)]
#[structopt(name = "usv_exec", about = "Run the USV autonomy through a simulated scenario")]
struct Opt {
    /// Path to the scenario file
    #[structopt(parse(from_os_str))]
    scenario: PathBuf,

    /// Give up if the goal hasn't been reached after this long
    #[structopt(long, default_value = "600")]
    max_time_s: f64,

    /// Length of one control tick
    #[structopt(long, default_value = "0.1")]
    dt_s: f64,

    /// Replay lidar scans from this file (one JSON scan per line, one line per tick) instead of
    /// simulating the lidar
    #[structopt(long, parse(from_os_str))]
    lidar_replay: Option<PathBuf>,
}

/// Where the lidar returns come from
enum Lidar {
    Sim(SimLidar),
    Replay {
        lidar: ExternalLidar,
        replay: ScanReplay,
    },
}

/// One row of the trajectory archive
#[derive(Debug, Serialize)]
struct TrajectoryRecord {
    time_s: f64,
    x_m: f64,
    y_m: f64,
    heading_rad: f64,
    linear_ms: f64,
    angular_rads: f64,
    mode: NavMode,
    num_admitted: usize,
    in_collision: bool,
}

#[derive(Debug, Serialize)]
struct RunSummary {
    arrived: bool,
    time_s: f64,
    num_ticks: usize,
    num_collisions: usize,
    num_path_replacements: usize,
    distance_travelled_m: f64,
    final_position_m: [f64; 2],
    goal_m: [f64; 2],
}

// ---------------------------------------------------------------------------
// FUNCTIONS
// ---------------------------------------------------------------------------

/// Executable main function, entry point.
fn main() -> Result<()> {
    color_eyre::install()?;

    let opt = Opt::from_args();

    // ---- EARLY INITIALISATION ----

    // Initialise session
    let session = Session::new("usv_exec", "sessions").wrap_err("Failed to create the session")?;

    // Initialise logger
    logger_init(LevelFilter::Debug, &session).wrap_err("Failed to initialise logging")?;

    // Log information on this execution.
    info!("USV Executable\n");
    info!("Session directory: {:?}", session.session_root);
    debug!("Options: {:?}\n", opt);

    if !(opt.dt_s > 0.0) {
        return Err(eyre!("Tick length must be positive, found {}", opt.dt_s));
    }

    // ---- LOAD PARAMETERS ----

    let mut grid_params: OccupancyGridParams =
        params::load("occupancy_grid.toml").wrap_err("Could not load occupancy grid params")?;
    let global_params: GlobalPlannerParams =
        params::load("global_planner.toml").wrap_err("Could not load global planner params")?;
    let local_params: LocalPlannerParams =
        params::load("local_planner.toml").wrap_err("Could not load local planner params")?;
    let nav_mgr_params: NavMgrParams =
        params::load("nav_mgr.toml").wrap_err("Could not load nav manager params")?;
    let follower_params: WaypointFollowerParams = params::load("waypoint_follower.toml")
        .wrap_err("Could not load waypoint follower params")?;
    let lidar_params: SimLidarParams =
        params::load("sim_lidar.toml").wrap_err("Could not load sim lidar params")?;

    info!("Parameters loaded");

    // ---- LOAD SCENARIO ----

    let scenario = Scenario::load(&opt.scenario)
        .wrap_err_with(|| format!("Could not load scenario {:?}", opt.scenario))?;
    let goal_m = scenario.goal().wrap_err("Invalid scenario")?;
    let mut world = scenario.build_world().wrap_err("Invalid scenario")?;

    if let Some(area) = scenario.operating_area {
        grid_params.operating_area = Some(area);
    }

    info!(
        "Scenario loaded: {} static and {} moving obstacles, goal at ({:.2}, {:.2})\n",
        scenario.static_obstacles.len(),
        scenario.moving_obstacles.len(),
        goal_m[0],
        goal_m[1]
    );

    // ---- INITIALISE MODULES ----

    let grid = OccupancyGrid::new(grid_params).wrap_err("Failed to create the occupancy grid")?;

    let mut nav_mgr = NavMgr::new(
        nav_mgr_params,
        grid,
        scenario.static_obstacle_set(),
        local_params,
        global_params,
        follower_params,
    );
    nav_mgr.set_goal(goal_m);

    let mut lidar = match opt.lidar_replay {
        Some(ref path) => {
            let text = std::fs::read_to_string(path)
                .wrap_err_with(|| format!("Could not read the lidar replay {:?}", path))?;
            let replay = ScanReplay::from_json_lines(&text, lidar_params.num_samples)
                .wrap_err_with(|| format!("Invalid lidar replay {:?}", path))?;
            info!("Replaying {} lidar scans from {:?}", replay.remaining(), path);

            Lidar::Replay {
                lidar: ExternalLidar::new(lidar_params.num_samples, lidar_params.max_range_m),
                replay,
            }
        }
        None => Lidar::Sim(SimLidar::new(lidar_params)),
    };

    let mut traj_writer = csv::Writer::from_path(session.path("trajectory.csv"))
        .wrap_err("Failed to create the trajectory archive")?;

    info!("Module initialisation complete\n");

    // ---- MAIN LOOP ----

    let mut num_ticks = 0usize;
    let mut num_collisions = 0usize;
    let mut num_path_replacements = 0usize;
    let mut distance_travelled_m = 0f64;
    let mut in_collision = false;
    let mut arrived = false;
    let mut replay_finished = false;

    while world.time_s() < opt.max_time_s {
        let sensor: &mut dyn RangeSensor = match lidar {
            Lidar::Sim(ref mut sim) => {
                sim.set_targets(world.lidar_targets());
                sim
            }
            Lidar::Replay {
                ref mut lidar,
                ref mut replay,
            } => {
                // Once the recording runs out the water is treated as clear
                if !replay.feed(lidar) && !replay_finished {
                    warn!("Lidar replay finished at t = {:.1} s", world.time_s());
                    lidar.clear();
                    replay_finished = true;
                }
                lidar
            }
        };

        let input = NavInput {
            pose: world.pose(),
            velocity_ms: world.velocity_ms(),
            dt_s: opt.dt_s,
        };

        let output = nav_mgr
            .step(&input, sensor, None)
            .wrap_err("Navigation failed")?;

        if output.path_replaced {
            num_path_replacements += 1;
            if let Some(path) = nav_mgr.global_path() {
                session
                    .save_with_timestamp("paths/global_path.json", path)
                    .wrap_err("Failed to archive the global path")?;
            }
            if let Some(report) = nav_mgr.last_search_report() {
                debug!("Search report: {:?}", report);
            }
        }

        if output.mode == NavMode::Arrived {
            info!("Arrived at the goal after {:.1} s", world.time_s());
            arrived = true;
        }

        let prev_position_m = world.pose().position2();
        world.step(&output.cmd, opt.dt_s);
        distance_travelled_m += (world.pose().position2() - prev_position_m).norm();
        num_ticks += 1;

        // Count each contact once, and let the navigation manager re-plan around it
        let now_in_collision = world.in_collision();
        if now_in_collision && !in_collision {
            warn!("Collision at t = {:.1} s", world.time_s());
            num_collisions += 1;
            nav_mgr.notify_collision();
        }
        in_collision = now_in_collision;

        let pose = world.pose();
        traj_writer
            .serialize(TrajectoryRecord {
                time_s: world.time_s(),
                x_m: pose.position_m[0],
                y_m: pose.position_m[1],
                heading_rad: pose.get_heading(),
                linear_ms: output.cmd.linear_ms,
                angular_rads: output.cmd.angular_rads,
                mode: output.mode,
                num_admitted: output.num_admitted,
                in_collision,
            })
            .wrap_err("Failed to archive the trajectory")?;

        if arrived {
            break;
        }
    }

    traj_writer
        .flush()
        .wrap_err("Failed to flush the trajectory archive")?;

    // ---- SHUTDOWN ----

    if !arrived {
        warn!("Did not reach the goal within {} s", opt.max_time_s);
    }

    let final_position_m = world.pose().position2();
    let summary = RunSummary {
        arrived,
        time_s: world.time_s(),
        num_ticks,
        num_collisions,
        num_path_replacements,
        distance_travelled_m,
        final_position_m: [final_position_m[0], final_position_m[1]],
        goal_m: [goal_m[0], goal_m[1]],
    };

    info!("Run summary: {:#?}", summary);

    session
        .save("summary.json", &summary)
        .wrap_err("Failed to save the run summary")?;

    info!("End of execution");

    Ok(())
}
