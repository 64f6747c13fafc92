use std::net::SocketAddr;

use clap::Parser;
use common::PlayerId;

use crate::database::DatabaseSettings;
use crate::game_manager::GameSettings;

#[derive(Parser, Debug, Clone)]
#[command(author, version, about = "Rock-paper-scissors game service", long_about = None)]
pub struct Config {
    /// Address the websocket listener binds to.
    #[arg(long, default_value = "127.0.0.1:6379")]
    pub listen: SocketAddr,

    /// SurrealDB endpoint, `mem://` for the embedded engine or `ws://host:port`.
    #[arg(long, default_value = "mem://")]
    pub database: String,

    #[arg(long, default_value = "rps")]
    pub namespace: String,

    #[arg(long, default_value = "rps_bot")]
    pub database_name: String,

    /// Root user to sign in with (remote databases only).
    #[arg(long, requires = "db_password")]
    pub db_user: Option<String>,

    #[arg(long, requires = "db_user")]
    pub db_password: Option<String>,

    /// Keep balances and matches in process memory instead of SurrealDB.
    #[arg(long, default_value_t = false)]
    pub memory_store: bool,

    /// Chat id of the bot; invitations from it are rejected.
    #[arg(long, default_value_t = 0)]
    pub bot_id: PlayerId,

    /// Prefix of invite links, the inviter's id is appended.
    #[arg(long, default_value = "https://t.me/sifa_games_bot?start=")]
    pub invite_base: String,

    #[arg(long, default_value = "info")]
    pub log_level: tracing::Level,
}

impl Config {
    pub fn database_settings(&self) -> DatabaseSettings {
        DatabaseSettings {
            endpoint: self.database.clone(),
            namespace: self.namespace.clone(),
            database: self.database_name.clone(),
            credentials: self.db_user.clone().zip(self.db_password.clone()),
        }
    }

    pub fn game_settings(&self) -> GameSettings {
        GameSettings {
            bot_id: self.bot_id,
            invite_base: self.invite_base.clone(),
        }
    }
}
