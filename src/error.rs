// Round Lottery Program - Errors
use solana_program::{decode_error::DecodeError, program_error::ProgramError};
use thiserror::Error;

/// Errors that may be returned by the lottery program
#[derive(Error, Debug, Copy, Clone, PartialEq, Eq)]
pub enum LotteryError {
    /// Caller is not the manager fixed at initialization
    #[error("Only the lottery manager can perform this action")]
    AccessDenied,

    /// A round is running, so the entrant list is frozen
    #[error("A round is already in progress")]
    RoundInProgress,

    /// No round is running
    #[error("No round is active")]
    RoundNotActive,

    /// The round deadline has not passed yet
    #[error("Round has not reached its end time")]
    RoundStillActive,

    /// Contribution at or below the minimum
    #[error("Contribution must exceed the minimum entry amount")]
    InsufficientContribution,

    /// Fewer entrants than the configured quorum
    #[error("Not enough entrants to start a round")]
    InsufficientEntrants,

    /// The winner could not be paid
    #[error("Prize transfer to the winner failed")]
    PayoutFailed,

    /// Entrant list has reached account capacity
    #[error("Lottery has reached its entrant capacity")]
    LotteryFull,

    /// Invalid instruction data passed
    #[error("Invalid instruction data")]
    InvalidInstruction,

    /// Lottery account is not the expected program address
    #[error("Lottery account does not match its program address")]
    InvalidLotteryAccount,

    /// An entrant's account was not supplied writable to end the round
    #[error("Every entrant account must be passed to end the round")]
    MissingEntrantAccount,
}

impl From<LotteryError> for ProgramError {
    fn from(e: LotteryError) -> Self {
        ProgramError::Custom(e as u32)
    }
}

impl<T> DecodeError<T> for LotteryError {
    fn type_of() -> &'static str {
        "Lottery Error"
    }
}
