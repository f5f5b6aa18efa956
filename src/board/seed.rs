//! Demo data for local development.

use anyhow::{Result, bail};
use rand::Rng;
use rand::seq::SliceRandom;

use super::db::BoardDb;
use super::models::{BasicStatus, Board, NewTicket, Ticket, User};

pub const TEST_USER_COUNT: usize = 10;
pub const TICKETS_PER_USER: usize = 3;

const FIRST_NAMES: &[&str] = &[
    "Ada", "Grace", "Linus", "Barbara", "Ken", "Margaret", "Dennis", "Frances", "Alan", "Radia",
];
const LAST_NAMES: &[&str] = &[
    "Lovelace", "Hopper", "Torvalds", "Liskov", "Thompson", "Hamilton", "Ritchie", "Allen",
    "Turing", "Perlman",
];
const VERBS: &[&str] = &["Fix", "Add", "Refactor", "Document", "Test", "Remove", "Speed up"];
const NOUNS: &[&str] = &[
    "login page",
    "sprint report",
    "search index",
    "export job",
    "email digest",
    "settings form",
    "audit log",
];

/// Everything `seed_test_data` created.
#[derive(Debug)]
pub struct SeedReport {
    pub board: Board,
    pub test_users: Vec<User>,
    /// Tickets grouped by author, the developer first.
    pub tickets: Vec<(User, Vec<Ticket>)>,
    /// Every member of the board, the developer first.
    pub members: Vec<User>,
}

/// Populate a fresh board around the existing user with `email`.
///
/// Creates ten test users, a board with To do / In progress / Done columns
/// owned by the developer, memberships for everyone, and three tickets per
/// user in a randomly chosen column.
pub fn seed_test_data<R: Rng>(db: &BoardDb, email: &str, rng: &mut R) -> Result<SeedReport> {
    let Some(developer) = db.find_user_by_email(email)? else {
        bail!("No user with email '{}'", email);
    };

    let user_offset = db.list_users()?.len();
    let mut test_users = Vec::with_capacity(TEST_USER_COUNT);
    for i in 0..TEST_USER_COUNT {
        let first = FIRST_NAMES[i % FIRST_NAMES.len()];
        let last = LAST_NAMES.choose(rng).copied().unwrap_or("User");
        let n = user_offset + i + 1;
        let username = format!("{}.{}{}", first.to_lowercase(), last.to_lowercase(), n);
        let email = format!("{}@example.com", username);
        test_users.push(db.create_user(&username, &email, first, last)?);
    }

    let board_name = format!("Test board {}", db.list_boards()?.len() + 1);
    let board = db.create_board(&board_name, developer.id)?;
    if let Some(blocked) = db.status_by_name(board.id, BasicStatus::BLOCKED)? {
        db.delete_statuses(board.id, &[blocked.id])?;
    }
    let statuses = db.list_statuses(board.id)?;

    let mut members = vec![developer.clone()];
    for user in &test_users {
        db.add_member(board.id, user.id)?;
        members.push(user.clone());
    }

    let mut tickets = Vec::with_capacity(members.len());
    for user in &members {
        let status_id = statuses.choose(rng).map(|s| s.id);
        let mut created = Vec::with_capacity(TICKETS_PER_USER);
        for _ in 0..TICKETS_PER_USER {
            let title = format!(
                "{} {}",
                VERBS.choose(rng).copied().unwrap_or("Fix"),
                NOUNS.choose(rng).copied().unwrap_or("bug"),
            );
            created.push(db.create_ticket(&NewTicket {
                board_id: board.id,
                title,
                description: format!("Seeded ticket #{}", rng.gen_range(1000..10000)),
                status_id,
                sprint_id: None,
                assignee_id: None,
                author_id: Some(user.id),
            })?);
        }
        tickets.push((user.clone(), created));
    }

    tracing::info!(
        board_id = board.id,
        users = test_users.len(),
        "Seeded test data"
    );

    Ok(SeedReport {
        board,
        test_users,
        tickets,
        members,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn developer_db() -> (BoardDb, User) {
        let db = BoardDb::new_in_memory().unwrap();
        let dev = db
            .create_user("dev", "dev@example.com", "Dana", "Dev")
            .unwrap();
        (db, dev)
    }

    #[test]
    fn test_seed_creates_board_users_and_tickets() -> Result<()> {
        let (db, dev) = developer_db();
        let mut rng = StdRng::seed_from_u64(7);
        let report = seed_test_data(&db, "dev@example.com", &mut rng)?;

        assert_eq!(report.test_users.len(), TEST_USER_COUNT);
        assert_eq!(db.list_users()?.len(), TEST_USER_COUNT + 1);

        let names: Vec<_> = db
            .list_statuses(report.board.id)?
            .into_iter()
            .map(|s| s.name)
            .collect();
        assert_eq!(names, ["To do", "In progress", "Done"]);

        let memberships = db.list_memberships(report.board.id)?;
        assert_eq!(memberships.len(), TEST_USER_COUNT + 1);
        let owners: Vec<_> = memberships.iter().filter(|m| m.is_owner).collect();
        assert_eq!(owners.len(), 1);
        assert_eq!(owners[0].user_id, dev.id);

        let tickets = db.list_tickets(report.board.id)?;
        assert_eq!(tickets.len(), (TEST_USER_COUNT + 1) * TICKETS_PER_USER);
        assert!(tickets.iter().all(|t| t.status_id.is_some()));
        assert_eq!(report.tickets[0].0.id, dev.id);
        assert!(
            report.tickets[0]
                .1
                .iter()
                .all(|t| t.author_id == Some(dev.id))
        );
        Ok(())
    }

    #[test]
    fn test_seed_twice_keeps_usernames_unique() -> Result<()> {
        let (db, _) = developer_db();
        let mut rng = StdRng::seed_from_u64(1);
        let first = seed_test_data(&db, "dev@example.com", &mut rng)?;
        let second = seed_test_data(&db, "dev@example.com", &mut rng)?;
        assert_ne!(first.board.id, second.board.id);
        assert_eq!(db.list_users()?.len(), 2 * TEST_USER_COUNT + 1);
        Ok(())
    }

    #[test]
    fn test_seed_unknown_email_fails_without_writes() {
        let (db, _) = developer_db();
        let mut rng = StdRng::seed_from_u64(3);
        let err = seed_test_data(&db, "nobody@example.com", &mut rng).unwrap_err();
        assert!(err.to_string().contains("nobody@example.com"));
        assert_eq!(db.list_users().unwrap().len(), 1);
        assert!(db.list_boards().unwrap().is_empty());
    }
}
