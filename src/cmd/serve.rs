//! Board server command (`kanban serve`).

use anyhow::Result;
use kanban::board::server::{ServerConfig, start_server};

pub async fn cmd_serve(config: ServerConfig, open: bool) -> Result<()> {
    // Skip in dev mode (the frontend is served separately)
    if open && !config.dev_mode {
        let url = config.browse_url();
        tokio::spawn(async move {
            // Small delay to let the server start binding
            tokio::time::sleep(tokio::time::Duration::from_millis(500)).await;
            if let Err(e) = open::that(&url) {
                eprintln!("Failed to open browser: {}", e);
            }
        });
    }

    start_server(config).await
}
