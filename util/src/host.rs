//! Host platform utility functions

use std::env;
use std::path::PathBuf;

/// Name of the environment variable pointing at the root of the software checkout.
pub const SW_ROOT_ENV: &str = "USV_SW_ROOT";

/// Get the software root directory from the `USV_SW_ROOT` environment variable.
pub fn get_usv_sw_root() -> Result<PathBuf, env::VarError> {
    env::var(SW_ROOT_ENV).map(PathBuf::from)
}
