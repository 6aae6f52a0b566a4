//! Layered configuration.
//!
//! Tiers, lowest priority first, merged field by field:
//! 1. **Defaults** - built into the binary
//! 2. **Project** - `$CWD/wise-tasks/config.yaml`
//! 3. **User** - `~/.wise-tasks/config.yaml`
//! 4. **Environment** - see below
//!
//! ## Environment Variables
//! - `WISE_TASKS_CONFIG_PATH` - Explicit config file (replaces tiers 2 and 3)
//! - `WISE_TASKS_DB_PATH` - Database path
//! - `WISE_TASKS_HOST` / `WISE_TASKS_PORT` - Bind address
//! - `WISE_TASKS_TOKEN_SECRET` - Session token secret
//! - `WISE_TASKS_USER_DIR` - User config dir (default: `~/.wise-tasks`)
//! - `WISE_TASKS_PROJECT_DIR` - Project config dir (default: `./wise-tasks`)

mod loader;
mod merge;
mod types;

pub use loader::{ConfigLoader, ConfigPaths, ConfigTier, EnvOverrides};
pub use merge::{deep_merge, deep_merge_all};
pub use types::*;
