use solana_program::{msg, pubkey::Pubkey};

use crate::error::LotteryError;

/// Fails with `AccessDenied` unless the caller is the manager.
pub fn authorize(caller: &Pubkey, manager: &Pubkey) -> Result<(), LotteryError> {
    if caller != manager {
        msg!("Caller {} is not the lottery manager", caller);
        return Err(LotteryError::AccessDenied);
    }
    Ok(())
}
