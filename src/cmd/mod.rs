//! CLI command implementations.
//!
//! Each submodule owns one or more related `Commands` variants:
//!
//! | Module     | Commands handled          |
//! |------------|---------------------------|
//! | `serve`    | `Serve`                   |
//! | `database` | `InitDb`, `CreateUser`    |
//! | `seed`     | `Seed`                    |
//! | `config`   | `Config`                  |

pub mod config;
pub mod database;
pub mod seed;
pub mod serve;

pub use config::cmd_config;
pub use database::{cmd_create_user, cmd_init_db};
pub use seed::cmd_seed;
pub use serve::cmd_serve;
