// Read-only views over the lottery.
use borsh::{BorshDeserialize, BorshSerialize};
use solana_program::{clock::UnixTimestamp, pubkey::Pubkey};

use crate::{ledger::Ledger, state::Lottery};

/// Round status as published by the `GetRoundStatus` instruction
#[derive(BorshSerialize, BorshDeserialize, Clone, Copy, Debug, PartialEq, Eq)]
pub struct RoundStatusView {
    pub active: bool,
    pub end_time: UnixTimestamp,
}

impl Lottery {
    /// Snapshot of the entrant list in entry order.
    pub fn players(&self) -> Vec<Pubkey> {
        self.players.clone()
    }

    /// `(active, end_time)` of the current round.
    pub fn current_round_status(&self) -> (bool, UnixTimestamp) {
        (self.is_active(), self.round_end_time)
    }

    pub fn round_status_view(&self) -> RoundStatusView {
        let (active, end_time) = self.current_round_status();
        RoundStatusView { active, end_time }
    }

    pub fn last_winner(&self) -> Option<Pubkey> {
        self.last_winner
    }

    pub fn pool_balance<L: Ledger>(&self, ledger: &L) -> u64 {
        ledger.pool_balance()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        ledger::test_ledger::TestLedger,
        state::{MIN_CONTRIBUTION, ROUND_DURATION},
    };

    #[test]
    fn test_players_is_a_snapshot() {
        let mut lottery = Lottery::new(Pubkey::new_unique(), 1);
        let entrant = Pubkey::new_unique();
        lottery.enter(&entrant, MIN_CONTRIBUTION + 1).unwrap();

        let mut snapshot = lottery.players();
        snapshot.clear();
        assert_eq!(lottery.players(), vec![entrant]);
    }

    #[test]
    fn test_queries_are_repeatable() {
        let manager = Pubkey::new_unique();
        let mut lottery = Lottery::new(manager, 1);
        let mut ledger = TestLedger::at(50);
        lottery.enter(&Pubkey::new_unique(), MIN_CONTRIBUTION + 1).unwrap();
        ledger.deposit(MIN_CONTRIBUTION + 1);
        lottery.start_new_round(&manager, &ledger).unwrap();

        let before = lottery.clone();
        for _ in 0..3 {
            assert_eq!(lottery.current_round_status(), (true, 50 + ROUND_DURATION));
            assert_eq!(lottery.players(), before.players);
            assert_eq!(lottery.last_winner(), None);
            assert_eq!(lottery.pool_balance(&ledger), MIN_CONTRIBUTION + 1);
        }
        assert_eq!(lottery, before);
    }

    #[test]
    fn test_status_view_encoding() {
        let lottery = Lottery::new(Pubkey::new_unique(), 1);
        let view = lottery.round_status_view();
        let bytes = view.try_to_vec().unwrap();
        assert_eq!(bytes.len(), 9);
        assert_eq!(RoundStatusView::try_from_slice(&bytes).unwrap(), view);
    }
}
