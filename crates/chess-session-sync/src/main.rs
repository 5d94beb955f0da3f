//! Terminal client for a shared chess board session.

use chess_session_core::{StandardChess, User};
use chess_session_sync::commands::{parse_command, render, Command, HELP};
use chess_session_sync::{HttpSnapshotStore, SessionStore, SnapshotStore, SyncConfig, SyncEngine};
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let config = SyncConfig::from_env()?;
    info!(
        "Joining session {} at {}",
        config.session_id, config.snapshot_url
    );

    let store: Arc<dyn SnapshotStore> = Arc::new(HttpSnapshotStore::from_config(&config)?);
    let session = SessionStore::open(config.session_id, StandardChess::new(), store).await;
    let sync = SyncEngine::new(session.clone()).start(config.poll_interval);

    println!("{}", render(&session.snapshot()));

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        let command = match parse_command(&line) {
            Ok(command) => command,
            Err(e) => {
                println!("{}", e);
                continue;
            }
        };

        match command {
            Command::Move {
                from,
                to,
                promotion,
            } => {
                if !session.apply_move(&from, &to, promotion) {
                    println!("Illegal move");
                }
            }
            Command::Undo => session.undo(),
            Command::Reset => session.reset(),
            Command::Load(fen) => session.load(&fen),
            Command::Join { name, seat } => session.upsert_user(User::new(name, seat)),
            Command::Leave(name) => session.remove_user(&name),
            Command::Sync => {
                let outcome = sync.sync().await;
                info!(?outcome, "Manual sync");
            }
            Command::Show => {}
            Command::Help => {
                println!("{}", HELP);
                continue;
            }
            Command::Quit => break,
        }

        println!("{}", render(&session.snapshot()));
    }

    sync.shutdown();
    info!("Left session {}", session.id());
    Ok(())
}
