//! Test data command (`kanban seed`).

use anyhow::Result;
use console::style;
use std::path::Path;

use kanban::board::seed::seed_test_data;
use kanban::board::server::open_database;

fn success(line: String) {
    println!("{}", style(line).green());
}

pub fn cmd_seed(db_path: &Path, email: &str) -> Result<()> {
    let db = open_database(db_path)?;
    let report = seed_test_data(&db, email, &mut rand::thread_rng())?;

    let names: Vec<_> = report.test_users.iter().map(|u| u.full_name()).collect();
    success(format!("Created test users: {}", names.join(", ")));
    success(format!(
        "Created board: {} (id {})",
        report.board.name, report.board.id
    ));

    for (user, tickets) in &report.tickets {
        let titles: Vec<_> = tickets.iter().map(|t| t.title.as_str()).collect();
        success(format!(
            "Created tickets by user {}: {}",
            user.full_name(),
            titles.join(", ")
        ));
    }

    let members: Vec<_> = report.members.iter().map(|u| u.full_name()).collect();
    success(format!("Created memberships: {}", members.join(", ")));
    success("Created test data".to_string());
    Ok(())
}
