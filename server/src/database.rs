use common::{Move, PlayerId};
use serde::{Deserialize, Serialize};
use surrealdb::engine::any::{self, Any};
use surrealdb::opt::auth::Root;
use surrealdb::sql::statements::{BeginStatement, CommitStatement};
use surrealdb::sql::{Id, Thing};
use surrealdb::{Connection, Surreal};
use tracing::debug;

use crate::store::{MoveReceipt, PendingMatch, Store, STARTING_BALANCE};

const BALANCE_TABLE: &str = "balance";
const MATCH_TABLE: &str = "pending_match";

#[derive(Debug, Clone)]
pub struct DatabaseSettings {
    /// `mem://` for the embedded engine, `ws://host:port` for a server.
    pub endpoint: String,
    pub namespace: String,
    pub database: String,
    pub credentials: Option<(String, String)>,
}

impl DatabaseSettings {
    pub fn in_memory() -> Self {
        Self {
            endpoint: "mem://".into(),
            namespace: "rps".into(),
            database: "rps_bot".into(),
            credentials: None,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone)]
struct BalanceRow {
    balance: i64,
}

fn record_id(table: &str, player: PlayerId) -> Thing {
    Thing {
        tb: table.into(),
        id: Id::Number(player),
    }
}

pub struct DatabaseConnection<C: Connection> {
    connection: Surreal<C>,
}

impl DatabaseConnection<Any> {
    pub async fn connect(settings: &DatabaseSettings) -> anyhow::Result<Self> {
        let db = any::connect(settings.endpoint.as_str()).await?;

        if let Some((username, password)) = &settings.credentials {
            db.signin(Root {
                username: username.as_str(),
                password: password.as_str(),
            })
            .await?;
        }

        db.use_ns(settings.namespace.as_str())
            .use_db(settings.database.as_str())
            .await?;

        debug!(endpoint = %settings.endpoint, "connected to database");
        Ok(Self { connection: db })
    }
}

impl<C: Connection> DatabaseConnection<C> {
    pub fn from_surreal(connection: Surreal<C>) -> Self {
        Self { connection }
    }
}

impl<C: Connection> Store for DatabaseConnection<C> {
    async fn balance(&self, player: PlayerId) -> anyhow::Result<i64> {
        let mut response = self
            .connection
            .query("SELECT balance FROM balance WHERE id = $id")
            .bind(("id", record_id(BALANCE_TABLE, player)))
            .await?;
        let row: Option<BalanceRow> = response.take(0)?;
        Ok(row.map(|row| row.balance).unwrap_or(STARTING_BALANCE))
    }

    async fn adjust_balance(&mut self, player: PlayerId, delta: i64) -> anyhow::Result<()> {
        self.connection
            .query("UPDATE $id SET balance = (balance ?? $initial) + $delta")
            .bind(("id", record_id(BALANCE_TABLE, player)))
            .bind(("initial", STARTING_BALANCE))
            .bind(("delta", delta))
            .await?
            .check()?;
        Ok(())
    }

    async fn pending_match(&self, player: PlayerId) -> anyhow::Result<Option<PendingMatch>> {
        let mut response = self
            .connection
            .query("SELECT * FROM pending_match WHERE id = $id")
            .bind(("id", record_id(MATCH_TABLE, player)))
            .await?;
        Ok(response.take(0)?)
    }

    async fn put_match(&mut self, player: PlayerId, record: PendingMatch) -> anyhow::Result<()> {
        self.connection
            .query("UPDATE $id CONTENT $record")
            .bind(("id", record_id(MATCH_TABLE, player)))
            .bind(("record", record))
            .await?
            .check()?;
        Ok(())
    }

    async fn open_match(&mut self, player: PlayerId, opponent: PlayerId) -> anyhow::Result<()> {
        self.connection
            .query(BeginStatement)
            .query("UPDATE $player CONTENT $player_record;")
            .query("UPDATE $opponent CONTENT $opponent_record;")
            .query(CommitStatement)
            .bind(("player", record_id(MATCH_TABLE, player)))
            .bind(("player_record", PendingMatch::new(opponent)))
            .bind(("opponent", record_id(MATCH_TABLE, opponent)))
            .bind(("opponent_record", PendingMatch::new(player)))
            .await?
            .check()?;
        Ok(())
    }

    async fn delete_match(&mut self, player: PlayerId) -> anyhow::Result<()> {
        self.connection
            .query("DELETE $id")
            .bind(("id", record_id(MATCH_TABLE, player)))
            .await?
            .check()?;
        Ok(())
    }

    async fn submit_move(&mut self, player: PlayerId, choice: Move) -> anyhow::Result<MoveReceipt> {
        let Some(own) = self.pending_match(player).await? else {
            return Ok(MoveReceipt::NoMatch);
        };
        let opponent = own.opponent;

        let opponent_move = self
            .pending_match(opponent)
            .await?
            .filter(|theirs| theirs.opponent == player)
            .and_then(|theirs| theirs.pending_move);

        match opponent_move {
            Some(opponent_move) => {
                self.connection
                    .query(BeginStatement)
                    .query("DELETE $player;")
                    .query("DELETE $opponent;")
                    .query(CommitStatement)
                    .bind(("player", record_id(MATCH_TABLE, player)))
                    .bind(("opponent", record_id(MATCH_TABLE, opponent)))
                    .await?
                    .check()?;
                Ok(MoveReceipt::Settle {
                    opponent,
                    own_move: choice,
                    opponent_move,
                })
            }
            None => {
                self.put_match(
                    player,
                    PendingMatch {
                        opponent,
                        pending_move: Some(choice),
                    },
                )
                .await?;
                Ok(MoveReceipt::Waiting { opponent })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn embedded() -> DatabaseConnection<Any> {
        DatabaseConnection::connect(&DatabaseSettings::in_memory())
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn ledger_defaults_and_accumulates() {
        let mut db = embedded().await;
        assert_eq!(db.balance(5).await.unwrap(), STARTING_BALANCE);

        db.adjust_balance(5, 20).await.unwrap();
        db.adjust_balance(5, -10).await.unwrap();
        assert_eq!(db.balance(5).await.unwrap(), 1010);
        assert_eq!(db.balance(6).await.unwrap(), STARTING_BALANCE);
    }

    #[tokio::test]
    async fn match_records_round_trip() {
        let mut db = embedded().await;
        assert_eq!(db.pending_match(1).await.unwrap(), None);

        db.open_match(1, 2).await.unwrap();
        assert_eq!(db.pending_match(1).await.unwrap(), Some(PendingMatch::new(2)));
        assert_eq!(db.pending_match(2).await.unwrap(), Some(PendingMatch::new(1)));

        let replaced = PendingMatch {
            opponent: 3,
            pending_move: Some(Move::Paper),
        };
        db.put_match(1, replaced).await.unwrap();
        assert_eq!(db.pending_match(1).await.unwrap(), Some(replaced));

        db.delete_match(1).await.unwrap();
        db.delete_match(1).await.unwrap();
        assert_eq!(db.pending_match(1).await.unwrap(), None);
    }

    #[tokio::test]
    async fn settlement_is_claimed_once() {
        let mut db = embedded().await;
        db.open_match(1, 2).await.unwrap();

        assert_eq!(
            db.submit_move(1, Move::Rock).await.unwrap(),
            MoveReceipt::Waiting { opponent: 2 }
        );
        assert_eq!(
            db.pending_match(1).await.unwrap().unwrap().pending_move,
            Some(Move::Rock)
        );
        assert_eq!(
            db.submit_move(2, Move::Scissors).await.unwrap(),
            MoveReceipt::Settle {
                opponent: 1,
                own_move: Move::Scissors,
                opponent_move: Move::Rock,
            }
        );
        assert_eq!(db.pending_match(1).await.unwrap(), None);
        assert_eq!(db.pending_match(2).await.unwrap(), None);
        assert_eq!(db.submit_move(2, Move::Rock).await.unwrap(), MoveReceipt::NoMatch);
    }
}
