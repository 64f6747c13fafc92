//! Outcome and payout of a single game.

use common::{Move, Outcome};

pub const WIN_PAYOUT: i64 = 20;
pub const LOSS_PAYOUT: i64 = -10;
pub const DRAW_PAYOUT: i64 = 0;

/// Outcome and balance change for the player who threw `own` against `other`.
///
/// Win and loss payouts are independent constants, so a decisive game adds
/// `WIN_PAYOUT + LOSS_PAYOUT` chips to the economy.
pub fn resolve(own: Move, other: Move) -> (Outcome, i64) {
    if own == other {
        (Outcome::Draw, DRAW_PAYOUT)
    } else if own.beats() == other {
        (Outcome::Win, WIN_PAYOUT)
    } else {
        (Outcome::Loss, LOSS_PAYOUT)
    }
}
