//! Database setup commands (`kanban init-db` and `kanban create-user`).

use anyhow::Result;
use console::style;
use std::path::Path;

use kanban::board::server::open_database;

pub fn cmd_init_db(db_path: &Path) -> Result<()> {
    open_database(db_path)?;
    println!("Database initialized at {}", db_path.display());
    Ok(())
}

pub fn cmd_create_user(
    db_path: &Path,
    username: &str,
    email: &str,
    first_name: &str,
    last_name: &str,
) -> Result<()> {
    let db = open_database(db_path)?;
    let user = db.create_user(username, email, first_name, last_name)?;
    println!(
        "{} Created user {} (id {})",
        style("✓").green(),
        style(&user.username).bold(),
        user.id
    );
    Ok(())
}
