// Round Lottery Program - Instructions
use solana_program::{
    instruction::{AccountMeta, Instruction},
    program_error::ProgramError,
    pubkey::Pubkey,
    system_program,
};
use std::mem::size_of;

use crate::error::LotteryError;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum LotteryInstruction {
    /// Create the lottery account for a manager
    ///
    /// Accounts expected:
    /// 0. `[signer, writable]` The manager, pays for the lottery account
    /// 1. `[writable]` The lottery account (PDA of `["lottery", manager]`)
    /// 2. `[]` The system program
    Initialize {
        /// Entrants required before a round can start
        minimum_entrants: u32,
    },

    /// Join the lottery while no round is running
    ///
    /// Accounts expected:
    /// 0. `[signer, writable]` The entrant, pays the contribution
    /// 1. `[writable]` The lottery account
    /// 2. `[]` The system program
    Enter {
        /// Contribution in lamports, must exceed 0.01 SOL
        amount: u64,
    },

    /// Start a round (manager only)
    ///
    /// Accounts expected:
    /// 0. `[signer]` The manager
    /// 1. `[writable]` The lottery account
    StartNewRound,

    /// End the round and pay the drawn winner (manager only)
    ///
    /// Accounts expected:
    /// 0. `[signer]` The manager
    /// 1. `[writable]` The lottery account
    /// 2.. `[writable]` Every distinct entrant account; the drawn one receives the pool
    EndRound,

    /// Publish the entrant list as return data
    ///
    /// Accounts expected:
    /// 0. `[]` The lottery account
    GetPlayers,

    /// Publish `(active, end_time)` as return data
    ///
    /// Accounts expected:
    /// 0. `[]` The lottery account
    GetRoundStatus,

    /// Publish the last winner as return data
    ///
    /// Accounts expected:
    /// 0. `[]` The lottery account
    GetLastWinner,
}

impl LotteryInstruction {
    /// Unpacks a byte buffer into a LotteryInstruction
    pub fn unpack(input: &[u8]) -> Result<Self, ProgramError> {
        let (tag, rest) = input
            .split_first()
            .ok_or(LotteryError::InvalidInstruction)?;

        Ok(match tag {
            0 => {
                let (minimum_entrants, _) = Self::unpack_u32(rest)?;
                Self::Initialize { minimum_entrants }
            }
            1 => {
                let (amount, _) = Self::unpack_u64(rest)?;
                Self::Enter { amount }
            }
            2 => Self::StartNewRound,
            3 => Self::EndRound,
            4 => Self::GetPlayers,
            5 => Self::GetRoundStatus,
            6 => Self::GetLastWinner,
            _ => return Err(LotteryError::InvalidInstruction.into()),
        })
    }

    /// Packs a LotteryInstruction into a byte buffer
    pub fn pack(&self) -> Vec<u8> {
        let mut buf = Vec::with_capacity(size_of::<Self>());
        match *self {
            Self::Initialize { minimum_entrants } => {
                buf.push(0);
                buf.extend_from_slice(&minimum_entrants.to_le_bytes());
            }
            Self::Enter { amount } => {
                buf.push(1);
                buf.extend_from_slice(&amount.to_le_bytes());
            }
            Self::StartNewRound => buf.push(2),
            Self::EndRound => buf.push(3),
            Self::GetPlayers => buf.push(4),
            Self::GetRoundStatus => buf.push(5),
            Self::GetLastWinner => buf.push(6),
        }
        buf
    }

    fn unpack_u32(input: &[u8]) -> Result<(u32, &[u8]), ProgramError> {
        let value = input
            .get(..4)
            .and_then(|slice| slice.try_into().ok())
            .map(u32::from_le_bytes)
            .ok_or(LotteryError::InvalidInstruction)?;
        Ok((value, &input[4..]))
    }

    fn unpack_u64(input: &[u8]) -> Result<(u64, &[u8]), ProgramError> {
        let value = input
            .get(..8)
            .and_then(|slice| slice.try_into().ok())
            .map(u64::from_le_bytes)
            .ok_or(LotteryError::InvalidInstruction)?;
        Ok((value, &input[8..]))
    }
}

/// Create initialize instruction
pub fn initialize(
    program_id: &Pubkey,
    manager: &Pubkey,
    lottery_account: &Pubkey,
    minimum_entrants: u32,
) -> Result<Instruction, ProgramError> {
    let data = LotteryInstruction::Initialize { minimum_entrants }.pack();

    let accounts = vec![
        AccountMeta::new(*manager, true),
        AccountMeta::new(*lottery_account, false),
        AccountMeta::new_readonly(system_program::id(), false),
    ];

    Ok(Instruction {
        program_id: *program_id,
        accounts,
        data,
    })
}

/// Create enter instruction
pub fn enter(
    program_id: &Pubkey,
    entrant: &Pubkey,
    lottery_account: &Pubkey,
    amount: u64,
) -> Result<Instruction, ProgramError> {
    let data = LotteryInstruction::Enter { amount }.pack();

    let accounts = vec![
        AccountMeta::new(*entrant, true),
        AccountMeta::new(*lottery_account, false),
        AccountMeta::new_readonly(system_program::id(), false),
    ];

    Ok(Instruction {
        program_id: *program_id,
        accounts,
        data,
    })
}

/// Create start_new_round instruction
pub fn start_new_round(
    program_id: &Pubkey,
    manager: &Pubkey,
    lottery_account: &Pubkey,
) -> Result<Instruction, ProgramError> {
    let data = LotteryInstruction::StartNewRound.pack();

    let accounts = vec![
        AccountMeta::new_readonly(*manager, true),
        AccountMeta::new(*lottery_account, false),
    ];

    Ok(Instruction {
        program_id: *program_id,
        accounts,
        data,
    })
}

/// Create end_round instruction. Every entrant must be listed, otherwise the
/// program refuses to draw.
pub fn end_round(
    program_id: &Pubkey,
    manager: &Pubkey,
    lottery_account: &Pubkey,
    entrants: &[Pubkey],
) -> Result<Instruction, ProgramError> {
    let data = LotteryInstruction::EndRound.pack();

    let mut accounts = vec![
        AccountMeta::new_readonly(*manager, true),
        AccountMeta::new(*lottery_account, false),
    ];
    for entrant in entrants {
        match accounts.iter_mut().find(|meta| meta.pubkey == *entrant) {
            // the manager may have entered too
            Some(meta) => meta.is_writable = true,
            None => accounts.push(AccountMeta::new(*entrant, false)),
        }
    }

    Ok(Instruction {
        program_id: *program_id,
        accounts,
        data,
    })
}

/// Create a read-only query instruction
pub fn query(
    program_id: &Pubkey,
    lottery_account: &Pubkey,
    query: LotteryInstruction,
) -> Result<Instruction, ProgramError> {
    match query {
        LotteryInstruction::GetPlayers
        | LotteryInstruction::GetRoundStatus
        | LotteryInstruction::GetLastWinner => {}
        _ => return Err(LotteryError::InvalidInstruction.into()),
    }

    Ok(Instruction {
        program_id: *program_id,
        accounts: vec![AccountMeta::new_readonly(*lottery_account, false)],
        data: query.pack(),
    })
}
