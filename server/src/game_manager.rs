use common::network::Event;
use common::{Action, Move, Outcome, PlayerId, Reply, Selector};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::database_manager::{DatabaseHandle, Responder};
use crate::resolver::{resolve, LOSS_PAYOUT, WIN_PAYOUT};
use crate::store::MoveReceipt;

pub const CURRENCY: &str = "SIFA";
/// Balances below this may not start a bot game.
pub const BOT_GAME_MIN_BALANCE: i64 = 10;
pub const TOP_UP_AMOUNT: i64 = 500;

#[derive(Debug, Clone)]
pub struct GameSettings {
    /// Chat id of the bot itself, which can never be invited.
    pub bot_id: PlayerId,
    /// Invite links are this prefix followed by the inviter's id.
    pub invite_base: String,
}

/// A reply addressed to one player.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Delivery {
    pub recipient: PlayerId,
    pub reply: Reply,
}

impl Delivery {
    pub fn new(recipient: PlayerId, reply: Reply) -> Self {
        Self { recipient, reply }
    }
}

/// Where a player stands in a match against another player.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchState {
    Idle,
    AwaitingOwnMove { opponent: PlayerId },
    AwaitingOpponentMove { opponent: PlayerId, own_move: Move },
}

pub enum GameRequest {
    HandleEvent {
        player: PlayerId,
        event: Event,
        responder: Responder<Vec<Delivery>>,
    },
    MatchState {
        player: PlayerId,
        responder: Responder<MatchState>,
    },
}

pub struct GameManager<R: Rng = StdRng> {
    work_queue: mpsc::Receiver<GameRequest>,
    database: DatabaseHandle,
    settings: GameSettings,
    rng: R,
}

impl GameManager<StdRng> {
    pub fn new(
        work_queue: mpsc::Receiver<GameRequest>,
        database: DatabaseHandle,
        settings: GameSettings,
    ) -> Self {
        Self::with_rng(work_queue, database, settings, StdRng::from_entropy())
    }
}

//NOTE: no event may take the actor down, failures go back to the caller
impl<R: Rng> GameManager<R> {
    pub fn with_rng(
        work_queue: mpsc::Receiver<GameRequest>,
        database: DatabaseHandle,
        settings: GameSettings,
        rng: R,
    ) -> Self {
        Self {
            work_queue,
            database,
            settings,
            rng,
        }
    }

    pub async fn manage(&mut self) {
        while let Some(request) = self.work_queue.recv().await {
            match request {
                GameRequest::HandleEvent {
                    player,
                    event,
                    responder,
                } => {
                    responder.send(self.handle_event(player, event).await).ok();
                }
                GameRequest::MatchState { player, responder } => {
                    responder.send(self.match_state(player).await).ok();
                }
            }
        }
    }

    pub async fn handle_event(
        &mut self,
        player: PlayerId,
        event: Event,
    ) -> anyhow::Result<Vec<Delivery>> {
        match event {
            Event::Start { payload } => self.start(player, payload.as_deref()).await,
            Event::Press { selector } => match selector.parse::<Selector>() {
                Ok(selector) => self.press(player, selector).await,
                Err(err) => {
                    warn!(player, %err, "ignoring unknown selector");
                    Ok(vec![])
                }
            },
        }
    }

    pub async fn match_state(&self, player: PlayerId) -> anyhow::Result<MatchState> {
        let Some(own) = self.database.pending_match(player).await? else {
            return Ok(MatchState::Idle);
        };
        Ok(match own.pending_move {
            None => MatchState::AwaitingOwnMove {
                opponent: own.opponent,
            },
            Some(own_move) => MatchState::AwaitingOpponentMove {
                opponent: own.opponent,
                own_move,
            },
        })
    }

    async fn press(&mut self, player: PlayerId, selector: Selector) -> anyhow::Result<Vec<Delivery>> {
        debug!(player, %selector, "button pressed");
        match selector {
            Selector::PlayVsBot => self.play_vs_bot(player).await,
            Selector::AddFunds => self.add_funds(player).await,
            Selector::BackToMenu => Ok(vec![self.main_menu(player).await?]),
            Selector::BotMove(choice) => self.bot_move(player, choice).await,
            Selector::PvpMove(choice) => self.pvp_move(player, choice).await,
        }
    }

    async fn start(&mut self, player: PlayerId, payload: Option<&str>) -> anyhow::Result<Vec<Delivery>> {
        let Some(inviter) = payload.and_then(parse_referrer) else {
            return Ok(vec![self.main_menu(player).await?]);
        };

        if inviter == player || inviter == self.settings.bot_id {
            info!(player, inviter, "rejected invitation");
            return Ok(vec![Delivery::new(
                player,
                Reply::message("Invalid invitation! 😅"),
            )]);
        }

        self.database.open_match(player, inviter).await?;
        info!(player, inviter, "match opened");

        Ok(vec![
            Delivery::new(
                player,
                Reply::message(format!(
                    "🎮 You accepted the invitation from player {inviter}! The game begins."
                )),
            ),
            Delivery::new(player, move_prompt(Selector::PvpMove)),
            Delivery::new(
                inviter,
                Reply::message(format!(
                    "🎮 Player {player} accepted your invitation! The game begins."
                )),
            ),
            Delivery::new(inviter, move_prompt(Selector::PvpMove)),
        ])
    }

    async fn main_menu(&self, player: PlayerId) -> anyhow::Result<Delivery> {
        let balance = self.database.balance(player).await?;
        let invite_link = format!("{}{}", self.settings.invite_base, player);
        Ok(Delivery::new(
            player,
            Reply::message(format!(
                "👋 Welcome to SIFA Games!\n\nYour current balance: {balance} {CURRENCY}"
            ))
            .with_action(Action::callback("🎮 Play vs bot", Selector::PlayVsBot))
            .with_action(Action::callback("💳 Add funds", Selector::AddFunds))
            .with_action(Action::link("👥 Invite a friend", invite_link)),
        ))
    }

    async fn add_funds(&mut self, player: PlayerId) -> anyhow::Result<Vec<Delivery>> {
        self.database.adjust_balance(player, TOP_UP_AMOUNT).await?;
        let balance = self.database.balance(player).await?;
        Ok(vec![Delivery::new(
            player,
            Reply::edit(format!(
                "💳 Your balance was topped up by {TOP_UP_AMOUNT} {CURRENCY}!\nCurrent balance: {balance} {CURRENCY}"
            ))
            .with_action(menu_action()),
        )])
    }

    async fn play_vs_bot(&mut self, player: PlayerId) -> anyhow::Result<Vec<Delivery>> {
        if self.database.balance(player).await? < BOT_GAME_MIN_BALANCE {
            return Ok(vec![Delivery::new(
                player,
                Reply::alert(format!("Not enough {CURRENCY}!")),
            )]);
        }
        Ok(vec![Delivery::new(player, move_prompt(Selector::BotMove))])
    }

    async fn bot_move(&mut self, player: PlayerId, choice: Move) -> anyhow::Result<Vec<Delivery>> {
        let bot_choice = Move::ALL[self.rng.gen_range(0..Move::ALL.len())];
        let (outcome, delta) = resolve(choice, bot_choice);
        self.database.adjust_balance(player, delta).await?;
        let balance = self.database.balance(player).await?;
        debug!(player, %choice, %bot_choice, delta, "bot game resolved");

        Ok(vec![Delivery::new(
            player,
            Reply::edit(format!(
                "Your choice: {}\nBot's choice: {}\n\n{}\nBalance: {balance} {CURRENCY}",
                choice.emoji(),
                bot_choice.emoji(),
                outcome_text(outcome),
            ))
            .with_action(Action::callback("🎮 Play again", Selector::PlayVsBot))
            .with_action(menu_action()),
        )])
    }

    async fn pvp_move(&mut self, player: PlayerId, choice: Move) -> anyhow::Result<Vec<Delivery>> {
        match self.database.submit_move(player, choice).await? {
            MoveReceipt::NoMatch => Ok(vec![Delivery::new(
                player,
                Reply::edit("You have no active match.").with_action(menu_action()),
            )]),
            MoveReceipt::Waiting { opponent } => {
                debug!(player, opponent, "waiting for opponent");
                Ok(vec![Delivery::new(
                    player,
                    Reply::edit("Waiting for your opponent's move..."),
                )])
            }
            MoveReceipt::Settle {
                opponent,
                own_move,
                opponent_move,
            } => {
                let (own_outcome, own_delta) = resolve(own_move, opponent_move);
                let (their_outcome, their_delta) = resolve(opponent_move, own_move);
                self.database.adjust_balance(player, own_delta).await?;
                self.database.adjust_balance(opponent, their_delta).await?;
                info!(player, opponent, own_delta, their_delta, "match settled");

                let own_balance = self.database.balance(player).await?;
                let their_balance = self.database.balance(opponent).await?;
                Ok(vec![
                    Delivery::new(
                        player,
                        settlement_reply(own_move, opponent_move, own_outcome, own_balance),
                    ),
                    Delivery::new(
                        opponent,
                        settlement_reply(opponent_move, own_move, their_outcome, their_balance),
                    ),
                ])
            }
        }
    }
}

/// Deep-link payloads are inviter ids; anything else opens the menu.
fn parse_referrer(payload: &str) -> Option<PlayerId> {
    let payload = payload.trim();
    if payload.is_empty() || !payload.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    payload.parse().ok()
}

fn move_prompt(selector: fn(Move) -> Selector) -> Reply {
    Move::ALL.into_iter().fold(
        Reply::message("Choose your gesture:"),
        |reply, choice| reply.with_action(Action::callback(choice.label(), selector(choice))),
    )
}

fn menu_action() -> Action {
    Action::callback("🔙 Menu", Selector::BackToMenu)
}

fn outcome_text(outcome: Outcome) -> String {
    match outcome {
        Outcome::Win => format!("You won +{WIN_PAYOUT} {CURRENCY}! 🎉"),
        Outcome::Loss => format!("You lost {} {CURRENCY} 😢", -LOSS_PAYOUT),
        Outcome::Draw => "Draw!".to_string(),
    }
}

fn settlement_reply(own: Move, other: Move, outcome: Outcome, balance: i64) -> Reply {
    Reply::message(format!(
        "Your choice: {}\nOpponent's choice: {}\n\n{}\nBalance: {balance} {CURRENCY}",
        own.emoji(),
        other.emoji(),
        outcome_text(outcome),
    ))
    .with_action(menu_action())
}
