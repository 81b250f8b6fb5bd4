// Round Lottery Program
// Entrants join while the lottery is idle, the manager runs a timed round and
// the whole pool goes to one drawn entrant when the round ends.

// Round logic
pub mod access;
pub mod entropy;
pub mod error;
pub mod ledger;
pub mod payout;
pub mod query;
pub mod round;
pub mod state;

// Program surface
pub mod instruction;
pub mod processor;
pub mod utils;

#[cfg(not(feature = "no-entrypoint"))]
pub mod entrypoint;

use solana_program::{account_info::AccountInfo, entrypoint::ProgramResult, pubkey::Pubkey};

pub fn process_instruction(
    program_id: &Pubkey,
    accounts: &[AccountInfo],
    instruction_data: &[u8],
) -> ProgramResult {
    processor::Processor::process(program_id, accounts, instruction_data)
}
