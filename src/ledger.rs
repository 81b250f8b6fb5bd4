use solana_program::{clock::UnixTimestamp, pubkey::Pubkey};

use crate::{error::LotteryError, payout::LotteryEvent};

/// Host services the round logic depends on.
///
/// Every call against the lottery runs to completion or not at all: when an
/// operation returns an error, the host discards its emitted events and
/// transfers along with any state changes.
pub trait Ledger {
    /// Current ledger time
    fn now(&self) -> UnixTimestamp;

    /// Low-assurance entropy value supplied by the ledger
    fn entropy(&self) -> u64;

    /// Value currently held for the pool
    fn pool_balance(&self) -> u64;

    /// Whether `recipient` can currently be paid
    fn can_pay(&self, recipient: &Pubkey) -> bool;

    /// Moves `amount` from the pool to `recipient`
    fn transfer(&mut self, recipient: &Pubkey, amount: u64) -> Result<(), LotteryError>;

    /// Publishes a notification
    fn emit(&mut self, event: &LotteryEvent);
}
