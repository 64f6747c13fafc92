use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

pub mod network;

/// Stable numeric id the chat transport assigns to a user.
pub type PlayerId = i64;

#[derive(Serialize, Deserialize, Debug, PartialEq, Eq, Clone, Copy, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Move {
    Rock,
    Paper,
    Scissors,
}

impl Move {
    pub const ALL: [Move; 3] = [Move::Rock, Move::Paper, Move::Scissors];

    /// The one move this move defeats.
    pub fn beats(self) -> Move {
        match self {
            Move::Rock => Move::Scissors,
            Move::Scissors => Move::Paper,
            Move::Paper => Move::Rock,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Move::Rock => "rock",
            Move::Paper => "paper",
            Move::Scissors => "scissors",
        }
    }

    pub fn emoji(self) -> &'static str {
        match self {
            Move::Rock => "✊",
            Move::Paper => "✋",
            Move::Scissors => "✌️",
        }
    }

    pub fn label(self) -> String {
        let name = self.name();
        let mut chars = name.chars();
        let capitalised: String = chars
            .next()
            .map(|first| first.to_ascii_uppercase())
            .into_iter()
            .chain(chars)
            .collect();
        format!("{} {}", self.emoji(), capitalised)
    }
}

impl fmt::Display for Move {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Move {
    type Err = ParseSelectorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Move::ALL
            .into_iter()
            .find(|candidate| candidate.name() == s)
            .ok_or_else(|| ParseSelectorError::UnknownMove(s.to_string()))
    }
}

#[derive(Serialize, Deserialize, Debug, PartialEq, Eq, Clone, Copy)]
#[serde(rename_all = "lowercase")]
pub enum Outcome {
    Win,
    Draw,
    Loss,
}

#[derive(Error, Debug, PartialEq, Eq)]
pub enum ParseSelectorError {
    #[error("unknown move `{0}`")]
    UnknownMove(String),
    #[error("unknown selector `{0}`")]
    UnknownSelector(String),
}

/// Callback data carried by a reply button and sent back when it is pressed.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum Selector {
    PlayVsBot,
    AddFunds,
    BackToMenu,
    BotMove(Move),
    PvpMove(Move),
}

const BOT_MOVE_PREFIX: &str = "bot_move_";
const PVP_MOVE_PREFIX: &str = "pvp_move_";

impl fmt::Display for Selector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Selector::PlayVsBot => f.write_str("play_vs_bot"),
            Selector::AddFunds => f.write_str("add_funds"),
            Selector::BackToMenu => f.write_str("back_to_menu"),
            Selector::BotMove(choice) => write!(f, "{BOT_MOVE_PREFIX}{choice}"),
            Selector::PvpMove(choice) => write!(f, "{PVP_MOVE_PREFIX}{choice}"),
        }
    }
}

impl FromStr for Selector {
    type Err = ParseSelectorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "play_vs_bot" => Ok(Selector::PlayVsBot),
            "add_funds" => Ok(Selector::AddFunds),
            "back_to_menu" => Ok(Selector::BackToMenu),
            _ => {
                if let Some(choice) = s.strip_prefix(BOT_MOVE_PREFIX) {
                    Ok(Selector::BotMove(choice.parse()?))
                } else if let Some(choice) = s.strip_prefix(PVP_MOVE_PREFIX) {
                    Ok(Selector::PvpMove(choice.parse()?))
                } else {
                    Err(ParseSelectorError::UnknownSelector(s.to_string()))
                }
            }
        }
    }
}

// How the chat front end should present a reply
#[derive(Serialize, Deserialize, Debug, PartialEq, Eq, Clone, Copy)]
pub enum ReplyKind {
    Message,
    Edit,
    Alert,
}

#[derive(Serialize, Deserialize, Debug, PartialEq, Eq, Clone)]
pub enum Action {
    Callback { label: String, selector: String },
    Link { label: String, url: String },
}

impl Action {
    pub fn callback(label: impl Into<String>, selector: Selector) -> Self {
        Action::Callback {
            label: label.into(),
            selector: selector.to_string(),
        }
    }

    pub fn link(label: impl Into<String>, url: impl Into<String>) -> Self {
        Action::Link {
            label: label.into(),
            url: url.into(),
        }
    }
}

#[derive(Serialize, Deserialize, Debug, PartialEq, Eq, Clone)]
pub struct Reply {
    pub kind: ReplyKind,
    pub text: String,
    pub actions: Vec<Action>,
}

impl Reply {
    pub fn message(text: impl Into<String>) -> Self {
        Self {
            kind: ReplyKind::Message,
            text: text.into(),
            actions: vec![],
        }
    }

    pub fn edit(text: impl Into<String>) -> Self {
        Self {
            kind: ReplyKind::Edit,
            text: text.into(),
            actions: vec![],
        }
    }

    pub fn alert(text: impl Into<String>) -> Self {
        Self {
            kind: ReplyKind::Alert,
            text: text.into(),
            actions: vec![],
        }
    }

    pub fn with_action(mut self, action: Action) -> Self {
        self.actions.push(action);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn selectors_use_callback_data_strings() {
        assert_eq!(Selector::PlayVsBot.to_string(), "play_vs_bot");
        assert_eq!(Selector::BackToMenu.to_string(), "back_to_menu");
        assert_eq!(Selector::BotMove(Move::Paper).to_string(), "bot_move_paper");
        assert_eq!(
            "pvp_move_scissors".parse::<Selector>(),
            Ok(Selector::PvpMove(Move::Scissors))
        );
        assert_eq!("add_funds".parse::<Selector>(), Ok(Selector::AddFunds));
    }

    #[test]
    fn bad_selectors_are_rejected() {
        assert_eq!(
            "bot_move_lizard".parse::<Selector>(),
            Err(ParseSelectorError::UnknownMove("lizard".into()))
        );
        assert_eq!(
            "spin_wheel".parse::<Selector>(),
            Err(ParseSelectorError::UnknownSelector("spin_wheel".into()))
        );
    }

    #[test]
    fn every_move_beats_exactly_one_other() {
        for choice in Move::ALL {
            let beaten: Vec<_> = Move::ALL.iter().filter(|other| choice.beats() == **other).collect();
            let beaten_by: Vec<_> = Move::ALL.iter().filter(|other| other.beats() == choice).collect();
            assert_eq!(beaten.len(), 1);
            assert_eq!(beaten_by.len(), 1);
            assert_ne!(*beaten[0], choice);
            assert_ne!(*beaten_by[0], *beaten[0]);
        }
    }

    #[test]
    fn move_labels() {
        assert_eq!(Move::Rock.label(), "✊ Rock");
        assert_eq!(Move::Scissors.label(), "✌️ Scissors");
    }
}
