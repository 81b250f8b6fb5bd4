// Round Lottery Program - Instruction Processor
use borsh::BorshSerialize;
use solana_program::{
    account_info::{next_account_info, AccountInfo},
    clock::{Clock, UnixTimestamp},
    entrypoint::ProgramResult,
    log::sol_log_data,
    msg,
    program::{invoke, invoke_signed, set_return_data},
    program_error::ProgramError,
    program_pack::{IsInitialized, Pack},
    pubkey::Pubkey,
    rent::Rent,
    system_instruction,
    sysvar::Sysvar,
};

use crate::{
    error::LotteryError,
    instruction::LotteryInstruction,
    ledger::Ledger,
    payout::LotteryEvent,
    state::Lottery,
    utils::{self, LOTTERY_SEED},
};

/// Ledger backed by the accounts of the current instruction.
///
/// The pool is whatever the lottery account holds above its rent reserve.
/// Transfers can only reach writable accounts passed with the instruction.
struct AccountLedger<'a, 'b> {
    clock: Clock,
    rent_reserve: u64,
    lottery_info: &'b AccountInfo<'a>,
    accounts: &'b [AccountInfo<'a>],
}

impl<'a, 'b> AccountLedger<'a, 'b> {
    fn load(
        lottery_info: &'b AccountInfo<'a>,
        accounts: &'b [AccountInfo<'a>],
    ) -> Result<Self, ProgramError> {
        Ok(Self {
            clock: Clock::get()?,
            rent_reserve: Rent::get()?.minimum_balance(lottery_info.data_len()),
            lottery_info,
            accounts,
        })
    }

    fn recipient_info(&self, recipient: &Pubkey) -> Option<&'b AccountInfo<'a>> {
        self.accounts
            .iter()
            .find(|info| info.key == recipient && info.is_writable)
    }
}

impl<'a, 'b> Ledger for AccountLedger<'a, 'b> {
    fn now(&self) -> UnixTimestamp {
        self.clock.unix_timestamp
    }

    fn entropy(&self) -> u64 {
        self.clock.slot
    }

    fn pool_balance(&self) -> u64 {
        self.lottery_info.lamports().saturating_sub(self.rent_reserve)
    }

    fn can_pay(&self, recipient: &Pubkey) -> bool {
        self.recipient_info(recipient).is_some()
    }

    fn transfer(&mut self, recipient: &Pubkey, amount: u64) -> Result<(), LotteryError> {
        let recipient_info = self.recipient_info(recipient).ok_or_else(|| {
            msg!("Winner account {} was not passed as writable", recipient);
            LotteryError::PayoutFailed
        })?;

        let remaining = self
            .lottery_info
            .lamports()
            .checked_sub(amount)
            .ok_or(LotteryError::PayoutFailed)?;
        let credited = recipient_info
            .lamports()
            .checked_add(amount)
            .ok_or(LotteryError::PayoutFailed)?;

        **self
            .lottery_info
            .try_borrow_mut_lamports()
            .map_err(|_| LotteryError::PayoutFailed)? = remaining;
        **recipient_info
            .try_borrow_mut_lamports()
            .map_err(|_| LotteryError::PayoutFailed)? = credited;
        Ok(())
    }

    fn emit(&mut self, event: &LotteryEvent) {
        match event {
            LotteryEvent::WinnerPicked { winner, amount } => {
                msg!(
                    "Winner picked: {} receives {} SOL",
                    winner,
                    utils::lamports_to_sol(*amount)
                );
            }
        }
        if let Ok(bytes) = event.try_to_vec() {
            sol_log_data(&[&bytes]);
        }
    }
}

/// Program state handler.
pub struct Processor;

impl Processor {
    pub fn process(
        program_id: &Pubkey,
        accounts: &[AccountInfo],
        instruction_data: &[u8],
    ) -> ProgramResult {
        let instruction = LotteryInstruction::unpack(instruction_data)?;

        match instruction {
            LotteryInstruction::Initialize { minimum_entrants } => {
                msg!("Instruction: Initialize");
                Self::process_initialize(program_id, accounts, minimum_entrants)
            }
            LotteryInstruction::Enter { amount } => {
                msg!("Instruction: Enter");
                Self::process_enter(program_id, accounts, amount)
            }
            LotteryInstruction::StartNewRound => {
                msg!("Instruction: Start New Round");
                Self::process_start_new_round(program_id, accounts)
            }
            LotteryInstruction::EndRound => {
                msg!("Instruction: End Round");
                Self::process_end_round(program_id, accounts)
            }
            LotteryInstruction::GetPlayers => {
                let lottery = Self::load_lottery(program_id, accounts)?;
                Self::publish(&lottery.players())
            }
            LotteryInstruction::GetRoundStatus => {
                let lottery = Self::load_lottery(program_id, accounts)?;
                Self::publish(&lottery.round_status_view())
            }
            LotteryInstruction::GetLastWinner => {
                let lottery = Self::load_lottery(program_id, accounts)?;
                Self::publish(&lottery.last_winner())
            }
        }
    }

    fn process_initialize(
        program_id: &Pubkey,
        accounts: &[AccountInfo],
        minimum_entrants: u32,
    ) -> ProgramResult {
        let account_info_iter = &mut accounts.iter();
        let manager_info = next_account_info(account_info_iter)?;
        let lottery_info = next_account_info(account_info_iter)?;
        let system_program_info = next_account_info(account_info_iter)?;

        if !manager_info.is_signer {
            msg!("Manager must sign the transaction");
            return Err(ProgramError::MissingRequiredSignature);
        }

        let (expected_lottery, bump_seed) =
            utils::find_lottery_address(program_id, manager_info.key);
        if *lottery_info.key != expected_lottery {
            msg!("Invalid lottery account address");
            return Err(LotteryError::InvalidLotteryAccount.into());
        }

        if lottery_info.owner == program_id {
            let existing = Lottery::unpack_unchecked(&lottery_info.data.borrow())?;
            if existing.is_initialized() {
                msg!("Lottery account is already initialized");
                return Err(ProgramError::AccountAlreadyInitialized);
            }
        } else {
            let bump = [bump_seed];
            let seeds: &[&[u8]] = &[LOTTERY_SEED, manager_info.key.as_ref(), &bump];
            let rent_lamports = Rent::get()?.minimum_balance(Lottery::LEN);
            let accounts = [
                manager_info.clone(),
                lottery_info.clone(),
                system_program_info.clone(),
            ];

            if lottery_info.lamports() == 0 {
                invoke_signed(
                    &system_instruction::create_account(
                        manager_info.key,
                        lottery_info.key,
                        rent_lamports,
                        Lottery::LEN as u64,
                        program_id,
                    ),
                    &accounts,
                    &[seeds],
                )?;
            } else {
                // anyone can fund the address ahead of us, which makes
                // create_account fail, so top up and claim it instead
                let shortfall = rent_lamports.saturating_sub(lottery_info.lamports());
                if shortfall > 0 {
                    invoke(
                        &system_instruction::transfer(manager_info.key, lottery_info.key, shortfall),
                        &accounts,
                    )?;
                }
                invoke_signed(
                    &system_instruction::allocate(lottery_info.key, Lottery::LEN as u64),
                    &accounts,
                    &[seeds],
                )?;
                invoke_signed(
                    &system_instruction::assign(lottery_info.key, program_id),
                    &accounts,
                    &[seeds],
                )?;
            }
        }

        let lottery = Lottery::new(*manager_info.key, minimum_entrants);
        Lottery::pack(lottery, &mut lottery_info.data.borrow_mut())?;

        msg!(
            "Lottery initialized: Manager={}, MinimumEntrants={}",
            manager_info.key,
            minimum_entrants
        );
        Ok(())
    }

    fn process_enter(program_id: &Pubkey, accounts: &[AccountInfo], amount: u64) -> ProgramResult {
        let account_info_iter = &mut accounts.iter();
        let entrant_info = next_account_info(account_info_iter)?;
        let lottery_info = next_account_info(account_info_iter)?;
        let system_program_info = next_account_info(account_info_iter)?;

        if !entrant_info.is_signer {
            msg!("Entrant must sign the transaction");
            return Err(ProgramError::MissingRequiredSignature);
        }
        Self::check_owner(program_id, lottery_info)?;

        let mut lottery = Lottery::unpack(&lottery_info.data.borrow())?;
        lottery.enter(entrant_info.key, amount)?;

        invoke(
            &system_instruction::transfer(entrant_info.key, lottery_info.key, amount),
            &[
                entrant_info.clone(),
                lottery_info.clone(),
                system_program_info.clone(),
            ],
        )?;

        Lottery::pack(lottery, &mut lottery_info.data.borrow_mut())?;
        msg!(
            "Entered with {} SOL",
            utils::lamports_to_sol(amount)
        );
        Ok(())
    }

    fn process_start_new_round(program_id: &Pubkey, accounts: &[AccountInfo]) -> ProgramResult {
        let account_info_iter = &mut accounts.iter();
        let manager_info = next_account_info(account_info_iter)?;
        let lottery_info = next_account_info(account_info_iter)?;

        if !manager_info.is_signer {
            msg!("Manager must sign the transaction");
            return Err(ProgramError::MissingRequiredSignature);
        }
        Self::check_owner(program_id, lottery_info)?;

        let mut lottery = Lottery::unpack(&lottery_info.data.borrow())?;
        let ledger = AccountLedger::load(lottery_info, accounts)?;
        lottery.start_new_round(manager_info.key, &ledger)?;

        Lottery::pack(lottery, &mut lottery_info.data.borrow_mut())?;
        Ok(())
    }

    fn process_end_round(program_id: &Pubkey, accounts: &[AccountInfo]) -> ProgramResult {
        let account_info_iter = &mut accounts.iter();
        let manager_info = next_account_info(account_info_iter)?;
        let lottery_info = next_account_info(account_info_iter)?;

        if !manager_info.is_signer {
            msg!("Manager must sign the transaction");
            return Err(ProgramError::MissingRequiredSignature);
        }
        Self::check_owner(program_id, lottery_info)?;

        let mut lottery = Lottery::unpack(&lottery_info.data.borrow())?;
        let mut ledger = AccountLedger::load(lottery_info, accounts)?;
        if lottery.end_round(manager_info.key, &mut ledger)?.is_none() {
            msg!("No entrants, nothing paid out");
        }

        Lottery::pack(lottery, &mut lottery_info.data.borrow_mut())?;
        Ok(())
    }

    fn load_lottery(program_id: &Pubkey, accounts: &[AccountInfo]) -> Result<Lottery, ProgramError> {
        let account_info_iter = &mut accounts.iter();
        let lottery_info = next_account_info(account_info_iter)?;
        Self::check_owner(program_id, lottery_info)?;
        Lottery::unpack(&lottery_info.data.borrow())
    }

    fn check_owner(program_id: &Pubkey, lottery_info: &AccountInfo) -> ProgramResult {
        if lottery_info.owner != program_id {
            msg!("Lottery account must be owned by this program");
            return Err(ProgramError::IncorrectProgramId);
        }
        Ok(())
    }

    fn publish<T: BorshSerialize>(value: &T) -> ProgramResult {
        let bytes = value
            .try_to_vec()
            .map_err(|e| ProgramError::BorshIoError(e.to_string()))?;
        set_return_data(&bytes);
        Ok(())
    }
}
