use std::collections::HashMap;
use std::future::Future;

use common::{Move, PlayerId};
use serde::{Deserialize, Serialize};

/// Balance of a player the ledger has never seen.
pub const STARTING_BALANCE: i64 = 1000;

/// One side of a match between two invited players.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct PendingMatch {
    pub opponent: PlayerId,
    #[serde(rename = "move", default, skip_serializing_if = "Option::is_none")]
    pub pending_move: Option<Move>,
}

impl PendingMatch {
    pub fn new(opponent: PlayerId) -> Self {
        Self {
            opponent,
            pending_move: None,
        }
    }
}

/// What happened when a player submitted a move in a match.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveReceipt {
    NoMatch,
    Waiting {
        opponent: PlayerId,
    },
    /// Both moves are known and both match records are already gone.
    Settle {
        opponent: PlayerId,
        own_move: Move,
        opponent_move: Move,
    },
}

/// Ledger and match table operations. Implementations are owned by the
/// database actor, so each call runs to completion before the next starts.
pub trait Store: Send + Sync + 'static {
    fn balance(&self, player: PlayerId) -> impl Future<Output = anyhow::Result<i64>> + Send;

    fn adjust_balance(
        &mut self,
        player: PlayerId,
        delta: i64,
    ) -> impl Future<Output = anyhow::Result<()>> + Send;

    fn pending_match(
        &self,
        player: PlayerId,
    ) -> impl Future<Output = anyhow::Result<Option<PendingMatch>>> + Send;

    /// Upserts the player's record, discarding whatever was there.
    fn put_match(
        &mut self,
        player: PlayerId,
        record: PendingMatch,
    ) -> impl Future<Output = anyhow::Result<()>> + Send;

    /// Writes both sides of a fresh match as one unit.
    fn open_match(
        &mut self,
        player: PlayerId,
        opponent: PlayerId,
    ) -> impl Future<Output = anyhow::Result<()>> + Send;

    fn delete_match(&mut self, player: PlayerId)
        -> impl Future<Output = anyhow::Result<()>> + Send;

    /// Records the move and, if the opponent already moved, claims the
    /// settlement by deleting both records before returning.
    fn submit_move(
        &mut self,
        player: PlayerId,
        choice: Move,
    ) -> impl Future<Output = anyhow::Result<MoveReceipt>> + Send;
}

/// Store kept entirely in process memory.
#[derive(Debug, Default)]
pub struct MemoryStore {
    balances: HashMap<PlayerId, i64>,
    matches: HashMap<PlayerId, PendingMatch>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Store for MemoryStore {
    async fn balance(&self, player: PlayerId) -> anyhow::Result<i64> {
        Ok(self
            .balances
            .get(&player)
            .copied()
            .unwrap_or(STARTING_BALANCE))
    }

    async fn adjust_balance(&mut self, player: PlayerId, delta: i64) -> anyhow::Result<()> {
        *self.balances.entry(player).or_insert(STARTING_BALANCE) += delta;
        Ok(())
    }

    async fn pending_match(&self, player: PlayerId) -> anyhow::Result<Option<PendingMatch>> {
        Ok(self.matches.get(&player).copied())
    }

    async fn put_match(&mut self, player: PlayerId, record: PendingMatch) -> anyhow::Result<()> {
        self.matches.insert(player, record);
        Ok(())
    }

    async fn open_match(&mut self, player: PlayerId, opponent: PlayerId) -> anyhow::Result<()> {
        self.matches.insert(player, PendingMatch::new(opponent));
        self.matches.insert(opponent, PendingMatch::new(player));
        Ok(())
    }

    async fn delete_match(&mut self, player: PlayerId) -> anyhow::Result<()> {
        self.matches.remove(&player);
        Ok(())
    }

    async fn submit_move(&mut self, player: PlayerId, choice: Move) -> anyhow::Result<MoveReceipt> {
        let Some(own) = self.matches.get_mut(&player) else {
            return Ok(MoveReceipt::NoMatch);
        };
        own.pending_move = Some(choice);
        let opponent = own.opponent;

        let opponent_move = self
            .matches
            .get(&opponent)
            .filter(|theirs| theirs.opponent == player)
            .and_then(|theirs| theirs.pending_move);
        match opponent_move {
            Some(opponent_move) => {
                self.matches.remove(&player);
                self.matches.remove(&opponent);
                Ok(MoveReceipt::Settle {
                    opponent,
                    own_move: choice,
                    opponent_move,
                })
            }
            None => Ok(MoveReceipt::Waiting { opponent }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn unknown_players_start_with_default_balance() {
        let store = MemoryStore::new();
        assert_eq!(store.balance(42).await.unwrap(), STARTING_BALANCE);
    }

    #[tokio::test]
    async fn adjustments_accumulate_from_default() {
        let mut store = MemoryStore::new();
        store.adjust_balance(1, 20).await.unwrap();
        store.adjust_balance(1, -10).await.unwrap();
        assert_eq!(store.balance(1).await.unwrap(), 1010);

        store.adjust_balance(2, -1500).await.unwrap();
        assert_eq!(store.balance(2).await.unwrap(), -500);
    }

    #[tokio::test]
    async fn put_match_replaces_stale_record() {
        let mut store = MemoryStore::new();
        store.open_match(1, 2).await.unwrap();
        store
            .put_match(
                1,
                PendingMatch {
                    opponent: 3,
                    pending_move: Some(Move::Rock),
                },
            )
            .await
            .unwrap();
        let record = store.pending_match(1).await.unwrap().unwrap();
        assert_eq!(record.opponent, 3);
        assert_eq!(record.pending_move, Some(Move::Rock));

        store.delete_match(1).await.unwrap();
        store.delete_match(1).await.unwrap();
        assert_eq!(store.pending_match(1).await.unwrap(), None);
    }

    #[tokio::test]
    async fn second_move_claims_settlement_once() {
        let mut store = MemoryStore::new();
        store.open_match(1, 2).await.unwrap();

        assert_eq!(
            store.submit_move(1, Move::Rock).await.unwrap(),
            MoveReceipt::Waiting { opponent: 2 }
        );
        assert_eq!(
            store.submit_move(2, Move::Scissors).await.unwrap(),
            MoveReceipt::Settle {
                opponent: 1,
                own_move: Move::Scissors,
                opponent_move: Move::Rock,
            }
        );
        assert_eq!(store.pending_match(1).await.unwrap(), None);
        assert_eq!(store.pending_match(2).await.unwrap(), None);
        assert_eq!(store.submit_move(1, Move::Rock).await.unwrap(), MoveReceipt::NoMatch);
    }

    #[tokio::test]
    async fn opponent_in_another_match_does_not_settle() {
        let mut store = MemoryStore::new();
        store.open_match(1, 2).await.unwrap();
        store
            .put_match(
                2,
                PendingMatch {
                    opponent: 3,
                    pending_move: Some(Move::Paper),
                },
            )
            .await
            .unwrap();
        assert_eq!(
            store.submit_move(1, Move::Rock).await.unwrap(),
            MoveReceipt::Waiting { opponent: 2 }
        );
    }
}
