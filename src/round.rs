// Round lifecycle: Idle -> Active on start, Active -> Idle on end.
use solana_program::{msg, pubkey::Pubkey};

use crate::{
    access,
    error::LotteryError,
    ledger::Ledger,
    payout::{self, Payout},
    state::{Lottery, RoundStatus, MAX_PLAYERS, MIN_CONTRIBUTION, ROUND_DURATION},
};

impl Lottery {
    /// Adds `caller` to the entrant list. The contribution itself is held by
    /// the host as part of the pool balance.
    pub fn enter(&mut self, caller: &Pubkey, contribution: u64) -> Result<(), LotteryError> {
        if self.is_active() {
            msg!("Entries are closed while a round is running");
            return Err(LotteryError::RoundInProgress);
        }
        if contribution <= MIN_CONTRIBUTION {
            msg!(
                "Contribution of {} lamports does not exceed the minimum of {}",
                contribution,
                MIN_CONTRIBUTION
            );
            return Err(LotteryError::InsufficientContribution);
        }
        if self.players.len() >= MAX_PLAYERS {
            return Err(LotteryError::LotteryFull);
        }

        self.players.push(*caller);
        msg!("Entrant {} joined, {} in total", caller, self.players.len());
        Ok(())
    }

    pub fn start_new_round<L: Ledger>(
        &mut self,
        caller: &Pubkey,
        ledger: &L,
    ) -> Result<(), LotteryError> {
        access::authorize(caller, &self.manager)?;
        if self.is_active() {
            return Err(LotteryError::RoundInProgress);
        }
        if self.players.len() < self.minimum_entrants as usize {
            msg!(
                "Round needs {} entrants, has {}",
                self.minimum_entrants,
                self.players.len()
            );
            return Err(LotteryError::InsufficientEntrants);
        }

        self.round_end_time = ledger.now().saturating_add(ROUND_DURATION);
        self.status = RoundStatus::Active;
        msg!("Round started, ends at {}", self.round_end_time);
        Ok(())
    }

    /// Ends the running round, paying the pool to a drawn entrant when there
    /// is one. On failure the lottery is left exactly as it was.
    pub fn end_round<L: Ledger>(
        &mut self,
        caller: &Pubkey,
        ledger: &mut L,
    ) -> Result<Option<Payout>, LotteryError> {
        access::authorize(caller, &self.manager)?;
        if !self.is_active() {
            return Err(LotteryError::RoundNotActive);
        }
        let now = ledger.now();
        if now < self.round_end_time {
            msg!("Round ends at {}, now {}", self.round_end_time, now);
            return Err(LotteryError::RoundStillActive);
        }

        // every entrant must be payable before the draw, so leaving one out
        // cannot be used to re-roll it
        if let Some(missing) = self.players.iter().find(|player| !ledger.can_pay(player)) {
            msg!("Entrant account {} was not supplied", missing);
            return Err(LotteryError::MissingEntrantAccount);
        }

        let snapshot = self.clone();
        let result = self.close_round(ledger);
        if result.is_err() {
            *self = snapshot;
        }
        result
    }

    fn close_round<L: Ledger>(&mut self, ledger: &mut L) -> Result<Option<Payout>, LotteryError> {
        let entrants = std::mem::take(&mut self.players);
        self.status = RoundStatus::Idle;

        let payout = payout::settle(self, &entrants, ledger)?;
        match &payout {
            Some(payout) => {
                msg!("Round closed, {} lamports paid to {}", payout.amount, payout.winner)
            }
            None => msg!("Round closed without entrants"),
        }
        Ok(payout)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{ledger::test_ledger::TestLedger, payout::LotteryEvent};

    const START: i64 = 1_700_000_000;
    const STAKE: u64 = MIN_CONTRIBUTION + 1;

    fn setup(minimum_entrants: u32) -> (Lottery, Pubkey, TestLedger) {
        let manager = Pubkey::new_unique();
        (Lottery::new(manager, minimum_entrants), manager, TestLedger::at(START))
    }

    fn enter_all(lottery: &mut Lottery, ledger: &mut TestLedger, count: usize) -> Vec<Pubkey> {
        (0..count)
            .map(|_| {
                let entrant = Pubkey::new_unique();
                lottery.enter(&entrant, STAKE).unwrap();
                ledger.deposit(STAKE);
                entrant
            })
            .collect()
    }

    #[test]
    fn test_full_round_scenario() {
        let (mut lottery, manager, mut ledger) = setup(2);
        let entrants = enter_all(&mut lottery, &mut ledger, 3);

        lottery.start_new_round(&manager, &ledger).unwrap();
        assert_eq!(
            lottery.current_round_status(),
            (true, START + ROUND_DURATION)
        );

        ledger.now = START + ROUND_DURATION;
        let payout = ledger
            .call(|ledger| lottery.end_round(&manager, ledger))
            .unwrap()
            .unwrap();

        assert!(entrants.contains(&payout.winner));
        assert_eq!(payout.amount, 3 * STAKE);
        assert_eq!(lottery.last_winner, Some(payout.winner));
        assert!(lottery.players().is_empty());
        assert_eq!(lottery.status, RoundStatus::Idle);
        assert_eq!(ledger.pool, 0);
        assert_eq!(ledger.events.len(), 1);
    }

    #[test]
    fn test_enter_rejects_minimum_contribution() {
        let (mut lottery, _, _) = setup(1);
        let entrant = Pubkey::new_unique();
        assert_eq!(
            lottery.enter(&entrant, MIN_CONTRIBUTION),
            Err(LotteryError::InsufficientContribution)
        );
        assert_eq!(lottery.enter(&entrant, 0), Err(LotteryError::InsufficientContribution));
        assert!(lottery.players.is_empty());
    }

    #[test]
    fn test_enter_rejected_while_active() {
        let (mut lottery, manager, mut ledger) = setup(1);
        enter_all(&mut lottery, &mut ledger, 1);
        lottery.start_new_round(&manager, &ledger).unwrap();

        let before = lottery.clone();
        assert_eq!(
            lottery.enter(&Pubkey::new_unique(), STAKE),
            Err(LotteryError::RoundInProgress)
        );
        assert_eq!(lottery, before);
    }

    #[test]
    fn test_enter_respects_capacity() {
        let (mut lottery, _, mut ledger) = setup(1);
        enter_all(&mut lottery, &mut ledger, MAX_PLAYERS);
        assert_eq!(
            lottery.enter(&Pubkey::new_unique(), STAKE),
            Err(LotteryError::LotteryFull)
        );
        assert_eq!(lottery.players.len(), MAX_PLAYERS);
    }

    #[test]
    fn test_same_identity_may_enter_twice() {
        let (mut lottery, _, _) = setup(2);
        let entrant = Pubkey::new_unique();
        lottery.enter(&entrant, STAKE).unwrap();
        lottery.enter(&entrant, STAKE).unwrap();
        assert_eq!(lottery.players, vec![entrant, entrant]);
    }

    #[test]
    fn test_start_requires_quorum() {
        for minimum in 0..4u32 {
            for count in 0..4usize {
                let (mut lottery, manager, mut ledger) = setup(minimum);
                enter_all(&mut lottery, &mut ledger, count);
                let result = lottery.start_new_round(&manager, &ledger);
                if count < minimum as usize {
                    assert_eq!(result, Err(LotteryError::InsufficientEntrants));
                    assert!(!lottery.is_active());
                } else {
                    assert_eq!(result, Ok(()));
                    assert!(lottery.is_active());
                }
            }
        }
    }

    #[test]
    fn test_start_rejected_while_active() {
        let (mut lottery, manager, mut ledger) = setup(1);
        enter_all(&mut lottery, &mut ledger, 1);
        lottery.start_new_round(&manager, &ledger).unwrap();

        ledger.now += 100;
        assert_eq!(
            lottery.start_new_round(&manager, &ledger),
            Err(LotteryError::RoundInProgress)
        );
        assert_eq!(lottery.round_end_time, START + ROUND_DURATION);
    }

    #[test]
    fn test_non_manager_is_denied() {
        let (mut lottery, manager, mut ledger) = setup(1);
        enter_all(&mut lottery, &mut ledger, 2);
        let stranger = Pubkey::new_unique();

        let before = lottery.clone();
        assert_eq!(
            lottery.start_new_round(&stranger, &ledger),
            Err(LotteryError::AccessDenied)
        );
        assert_eq!(lottery, before);

        lottery.start_new_round(&manager, &ledger).unwrap();
        ledger.now = START + ROUND_DURATION;
        let before = lottery.clone();
        assert_eq!(
            lottery.end_round(&stranger, &mut ledger),
            Err(LotteryError::AccessDenied)
        );
        assert_eq!(lottery, before);
        assert!(ledger.attempts.is_empty());
    }

    #[test]
    fn test_end_rejected_while_idle() {
        let (mut lottery, manager, mut ledger) = setup(1);
        assert_eq!(
            lottery.end_round(&manager, &mut ledger),
            Err(LotteryError::RoundNotActive)
        );
    }

    #[test]
    fn test_end_rejected_before_deadline() {
        let (mut lottery, manager, mut ledger) = setup(1);
        enter_all(&mut lottery, &mut ledger, 2);
        lottery.start_new_round(&manager, &ledger).unwrap();

        ledger.now = START + ROUND_DURATION - 1;
        let before = lottery.clone();
        assert_eq!(
            lottery.end_round(&manager, &mut ledger),
            Err(LotteryError::RoundStillActive)
        );
        assert_eq!(lottery, before);
        assert!(ledger.attempts.is_empty());
    }

    #[test]
    fn test_empty_round_closes_without_payout() {
        let (mut lottery, manager, mut ledger) = setup(0);
        let previous = Pubkey::new_unique();
        lottery.last_winner = Some(previous);

        lottery.start_new_round(&manager, &ledger).unwrap();
        ledger.now = START + ROUND_DURATION;
        let outcome = ledger
            .call(|ledger| lottery.end_round(&manager, ledger))
            .unwrap();

        assert_eq!(outcome, None);
        assert_eq!(lottery.last_winner, Some(previous));
        assert_eq!(lottery.status, RoundStatus::Idle);
        assert!(ledger.attempts.is_empty());
        assert!(ledger.events.is_empty());
    }

    #[test]
    fn test_failed_payout_rolls_back_everything() {
        let (mut lottery, manager, mut ledger) = setup(2);
        let entrants = enter_all(&mut lottery, &mut ledger, 3);
        lottery.start_new_round(&manager, &ledger).unwrap();
        ledger.now = START + ROUND_DURATION + 10;
        ledger.rejected.extend(entrants.iter().copied());

        let before = lottery.clone();
        let result = ledger.call(|ledger| lottery.end_round(&manager, ledger));

        assert_eq!(result, Err(LotteryError::PayoutFailed));
        assert_eq!(lottery, before);
        assert!(lottery.is_active());
        assert_eq!(lottery.players, entrants);
        assert!(ledger.events.is_empty());
        assert_eq!(ledger.pool, 3 * STAKE);
        assert_eq!(ledger.attempts.len(), 1);

        // manager retries once the recipient accepts funds
        ledger.rejected.clear();
        let payout = ledger
            .call(|ledger| lottery.end_round(&manager, ledger))
            .unwrap()
            .unwrap();
        assert_eq!(payout.amount, 3 * STAKE);
        assert_eq!(
            ledger.events,
            vec![LotteryEvent::WinnerPicked {
                winner: payout.winner,
                amount: 3 * STAKE
            }]
        );
        assert!(!lottery.is_active());
    }

    #[test]
    fn test_lottery_cycles_across_rounds() {
        let (mut lottery, manager, mut ledger) = setup(1);
        for round in 1..=3u64 {
            let entrants = enter_all(&mut lottery, &mut ledger, 2);
            lottery.start_new_round(&manager, &ledger).unwrap();
            ledger.now += ROUND_DURATION;
            ledger.slot += 1;
            let payout = ledger
                .call(|ledger| lottery.end_round(&manager, ledger))
                .unwrap()
                .unwrap();
            assert!(entrants.contains(&payout.winner));
            assert_eq!(payout.amount, 2 * STAKE);
            assert_eq!(lottery.rounds_completed, round);
        }
        assert_eq!(ledger.events.len(), 3);
    }

    #[test]
    fn test_unreachable_entrant_blocks_the_draw() {
        let (mut lottery, manager, mut ledger) = setup(2);
        let entrants = enter_all(&mut lottery, &mut ledger, 2);
        lottery.start_new_round(&manager, &ledger).unwrap();
        ledger.now = START + ROUND_DURATION;
        ledger.unreachable.insert(entrants[1]);

        let before = lottery.clone();
        for slot in 1..5 {
            ledger.slot = slot;
            let result = ledger.call(|ledger| lottery.end_round(&manager, ledger));
            assert_eq!(result, Err(LotteryError::MissingEntrantAccount));
        }
        assert_eq!(lottery, before);
        assert!(ledger.attempts.is_empty());
        assert!(ledger.events.is_empty());

        ledger.unreachable.clear();
        let payout = ledger
            .call(|ledger| lottery.end_round(&manager, ledger))
            .unwrap()
            .unwrap();
        assert!(entrants.contains(&payout.winner));
    }
}
