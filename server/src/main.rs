use clap::Parser;
use rps_server::config::Config;
use rps_server::database::DatabaseConnection;
use rps_server::store::MemoryStore;
use tokio::net::TcpListener;
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::parse();
    tracing_subscriber::fmt()
        .with_max_level(config.log_level)
        .init();

    let listener = TcpListener::bind(config.listen).await?;
    let settings = config.game_settings();

    if config.memory_store {
        info!("keeping game state in memory");
        rps_server::run(listener, MemoryStore::new(), settings).await
    } else {
        let database = DatabaseConnection::connect(&config.database_settings()).await?;
        info!(endpoint = %config.database, "game state stored in SurrealDB");
        rps_server::run(listener, database, settings).await
    }
}
