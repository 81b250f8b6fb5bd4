use borsh::{BorshDeserialize, BorshSerialize};
use solana_program::{msg, pubkey::Pubkey};

use crate::{entropy, error::LotteryError, ledger::Ledger, state::Lottery};

/// Notification raised once per successful payout, ahead of the transfer
#[derive(BorshSerialize, BorshDeserialize, Clone, Copy, Debug, PartialEq, Eq)]
pub enum LotteryEvent {
    WinnerPicked { winner: Pubkey, amount: u64 },
}

/// Result of a settled round
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Payout {
    pub winner: Pubkey,
    pub amount: u64,
}

/// Picks the winner among `entrants` and pays out the whole pool. Returns
/// `None` without touching the ledger when there is nobody to pay.
///
/// The winner is recorded and the event emitted before the transfer. If the
/// transfer fails the error is returned as `PayoutFailed` and the caller is
/// expected to roll back `lottery`.
pub fn settle<L: Ledger>(
    lottery: &mut Lottery,
    entrants: &[Pubkey],
    ledger: &mut L,
) -> Result<Option<Payout>, LotteryError> {
    if entrants.is_empty() {
        return Ok(None);
    }

    let amount = ledger.pool_balance();
    let index = entropy::winner_index(ledger.entropy(), ledger.now(), entrants);
    let winner = entrants[index];
    msg!("Drew entrant {} of {}: {}", index, entrants.len(), winner);

    lottery.last_winner = Some(winner);
    lottery.rounds_completed = lottery.rounds_completed.saturating_add(1);
    ledger.emit(&LotteryEvent::WinnerPicked { winner, amount });

    ledger.transfer(&winner, amount).map_err(|e| {
        msg!("Transfer of {} lamports to {} failed: {}", amount, winner, e);
        LotteryError::PayoutFailed
    })?;

    Ok(Some(Payout { winner, amount }))
}
