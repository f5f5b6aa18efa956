use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use tracing_appender::non_blocking::WorkerGuard;

use kanban::config::KanbanConfig;

mod cmd;

#[derive(Parser)]
#[command(name = "kanban")]
#[command(version, about = "Sprint-tracking kanban board service")]
pub struct Cli {
    /// Path to kanban.toml. Defaults to .kanban/kanban.toml, then the user config directory.
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// SQLite database path. Overrides [database] path and KANBAN_DB_PATH.
    #[arg(long, global = true)]
    pub db_path: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the board HTTP server
    Serve {
        /// Port to serve on
        #[arg(short, long)]
        port: Option<u16>,

        /// Address to bind
        #[arg(long)]
        host: Option<String>,

        /// Enable dev mode (permissive CORS for a separately served frontend)
        #[arg(long)]
        dev: bool,

        /// Open a browser once the server is up
        #[arg(long)]
        open: bool,
    },
    /// Create the database and run migrations
    InitDb,
    /// Create a user
    CreateUser {
        username: String,
        email: String,
        #[arg(long, default_value = "")]
        first_name: String,
        #[arg(long, default_value = "")]
        last_name: String,
    },
    /// Create test users, a board and tickets around an existing user
    Seed {
        /// Email of the user who will own the seeded board
        email: String,
    },
    /// View or validate configuration
    Config {
        #[command(subcommand)]
        command: Option<ConfigCommands>,
    },
}

#[derive(Subcommand, Clone, Copy)]
pub enum ConfigCommands {
    /// Show effective configuration
    Show,
    /// Validate configuration and show any warnings
    Validate,
    /// Initialize a default kanban.toml file
    Init,
}

/// Loaded configuration plus the logging guard that must outlive the command.
struct Runtime {
    config: KanbanConfig,
    db_path: PathBuf,
    _log_guard: Option<WorkerGuard>,
}

impl Runtime {
    fn load(config: Option<&Path>, db_path: Option<PathBuf>) -> Result<Self> {
        let config = KanbanConfig::load(config)?;
        let log_guard = kanban::logging::init_logging(&config.toml.log)?;
        let db_path = db_path.unwrap_or_else(|| config.db_path().to_path_buf());
        Ok(Self {
            config,
            db_path,
            _log_guard: log_guard,
        })
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config_path = cli.config.as_deref();

    match cli.command {
        // Config commands report on the file itself, so they run before it drives logging.
        Commands::Config { command } => cmd::cmd_config(config_path, command)?,
        Commands::Serve {
            port,
            host,
            dev,
            open,
        } => {
            let rt = Runtime::load(config_path, cli.db_path)?;
            let mut server = rt.config.server_config();
            server.db_path = rt.db_path;
            if let Some(port) = port {
                server.port = port;
            }
            if let Some(host) = host {
                server.host = host;
            }
            server.dev_mode |= dev;
            cmd::cmd_serve(server, open).await?;
        }
        Commands::InitDb => {
            let rt = Runtime::load(config_path, cli.db_path)?;
            cmd::cmd_init_db(&rt.db_path)?;
        }
        Commands::CreateUser {
            username,
            email,
            first_name,
            last_name,
        } => {
            let rt = Runtime::load(config_path, cli.db_path)?;
            cmd::cmd_create_user(&rt.db_path, &username, &email, &first_name, &last_name)?;
        }
        Commands::Seed { email } => {
            let rt = Runtime::load(config_path, cli.db_path)?;
            cmd::cmd_seed(&rt.db_path, &email)?;
        }
    }

    Ok(())
}
