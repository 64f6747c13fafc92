use common::{Move, PlayerId};
use tokio::sync::{mpsc, oneshot};
use tracing::debug;

use crate::store::{MoveReceipt, PendingMatch, Store};

pub type Responder<T> = oneshot::Sender<anyhow::Result<T>>;

pub enum DatabaseRequest {
    GetBalance {
        player: PlayerId,
        responder: Responder<i64>,
    },
    AdjustBalance {
        player: PlayerId,
        delta: i64,
        responder: Responder<()>,
    },
    GetMatch {
        player: PlayerId,
        responder: Responder<Option<PendingMatch>>,
    },
    OpenMatch {
        player: PlayerId,
        opponent: PlayerId,
        responder: Responder<()>,
    },
    DeleteMatch {
        player: PlayerId,
        responder: Responder<()>,
    },
    SubmitMove {
        player: PlayerId,
        choice: Move,
        responder: Responder<MoveReceipt>,
    },
}

/// Owns the store and answers requests one at a time.
pub struct DatabaseManager<S: Store> {
    store: S,
    work_queue: mpsc::Receiver<DatabaseRequest>,
}

impl<S: Store> DatabaseManager<S> {
    pub fn new(store: S, work_queue: mpsc::Receiver<DatabaseRequest>) -> Self {
        Self { store, work_queue }
    }

    pub async fn manage(&mut self) {
        while let Some(request) = self.work_queue.recv().await {
            // a dropped responder only means the caller gave up waiting
            match request {
                DatabaseRequest::GetBalance { player, responder } => {
                    let _ = responder.send(self.store.balance(player).await);
                }
                DatabaseRequest::AdjustBalance {
                    player,
                    delta,
                    responder,
                } => {
                    debug!(player, delta, "adjusting balance");
                    let _ = responder.send(self.store.adjust_balance(player, delta).await);
                }
                DatabaseRequest::GetMatch { player, responder } => {
                    let _ = responder.send(self.store.pending_match(player).await);
                }
                DatabaseRequest::OpenMatch {
                    player,
                    opponent,
                    responder,
                } => {
                    let _ = responder.send(self.store.open_match(player, opponent).await);
                }
                DatabaseRequest::DeleteMatch { player, responder } => {
                    let _ = responder.send(self.store.delete_match(player).await);
                }
                DatabaseRequest::SubmitMove {
                    player,
                    choice,
                    responder,
                } => {
                    let _ = responder.send(self.store.submit_move(player, choice).await);
                }
            }
        }
        debug!("database work queue closed");
    }
}

/// Cloneable front for the database actor.
#[derive(Clone)]
pub struct DatabaseHandle {
    database_requester: mpsc::Sender<DatabaseRequest>,
}

impl DatabaseHandle {
    pub fn new(database_requester: mpsc::Sender<DatabaseRequest>) -> Self {
        Self { database_requester }
    }

    /// Spawns a database actor around `store` and returns its handle.
    pub fn spawn<S: Store>(store: S) -> Self {
        let (db_tx, db_rx) = mpsc::channel(32);
        let mut db_manager = DatabaseManager::new(store, db_rx);
        tokio::spawn(async move {
            db_manager.manage().await;
        });
        Self::new(db_tx)
    }

    async fn request<T>(
        &self,
        build: impl FnOnce(Responder<T>) -> DatabaseRequest,
    ) -> anyhow::Result<T> {
        let (resp_tx, resp_rx) = oneshot::channel();
        self.database_requester.send(build(resp_tx)).await?;
        resp_rx.await?
    }

    pub async fn balance(&self, player: PlayerId) -> anyhow::Result<i64> {
        self.request(|responder| DatabaseRequest::GetBalance { player, responder })
            .await
    }

    pub async fn adjust_balance(&self, player: PlayerId, delta: i64) -> anyhow::Result<()> {
        self.request(|responder| DatabaseRequest::AdjustBalance {
            player,
            delta,
            responder,
        })
        .await
    }

    pub async fn pending_match(&self, player: PlayerId) -> anyhow::Result<Option<PendingMatch>> {
        self.request(|responder| DatabaseRequest::GetMatch { player, responder })
            .await
    }

    pub async fn open_match(&self, player: PlayerId, opponent: PlayerId) -> anyhow::Result<()> {
        self.request(|responder| DatabaseRequest::OpenMatch {
            player,
            opponent,
            responder,
        })
        .await
    }

    pub async fn delete_match(&self, player: PlayerId) -> anyhow::Result<()> {
        self.request(|responder| DatabaseRequest::DeleteMatch { player, responder })
            .await
    }

    pub async fn submit_move(&self, player: PlayerId, choice: Move) -> anyhow::Result<MoveReceipt> {
        self.request(|responder| DatabaseRequest::SubmitMove {
            player,
            choice,
            responder,
        })
        .await
    }
}
