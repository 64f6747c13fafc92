pub mod config;
pub mod connection_manager;
pub mod database;
pub mod database_manager;
pub mod game_manager;
pub mod mailroom;
pub mod resolver;
pub mod store;

use tokio::join;
use tokio::net::TcpListener;
use tokio::sync::mpsc;
use tracing::info;

use crate::connection_manager::handle_listen_server;
use crate::database_manager::DatabaseManager;
use crate::game_manager::{GameManager, GameSettings};
use crate::mailroom::Mailroom;
use crate::store::Store;

/// Runs the database, game and mail actors and serves websocket clients on
/// `listener` until one of them stops.
pub async fn run<S: Store>(
    listener: TcpListener,
    store: S,
    settings: GameSettings,
) -> anyhow::Result<()> {
    let (db_tx, db_rx) = mpsc::channel(32);
    let mut db_manager = DatabaseManager::new(store, db_rx);
    let db_task = tokio::spawn(async move {
        db_manager.manage().await;
    });

    let (game_tx, game_rx) = mpsc::channel(32);
    let mut game_manager = GameManager::new(
        game_rx,
        database_manager::DatabaseHandle::new(db_tx),
        settings,
    );
    let game_task = tokio::spawn(async move {
        game_manager.manage().await;
    });

    let (mail_tx, mail_rx) = mpsc::channel(32);
    let mut mailroom = Mailroom::new(mail_rx);
    let mail_task = tokio::spawn(async move {
        mailroom.manage().await;
    });

    let addr = listener.local_addr()?;
    info!(%addr, "game service listening");
    let listen_server_task = tokio::spawn(async move {
        handle_listen_server(listener, game_tx, mail_tx).await;
    });

    let (res1, res2, res3, res4) = join!(db_task, game_task, mail_task, listen_server_task);
    res1?;
    res2?;
    res3?;
    res4?;
    Ok(())
}
