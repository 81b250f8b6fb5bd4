use arrayref::{array_mut_ref, array_ref, array_refs, mut_array_refs};
use solana_program::{
    clock::UnixTimestamp,
    program_error::ProgramError,
    program_pack::{IsInitialized, Pack, Sealed},
    pubkey::Pubkey,
};

/// Length of a round: 24 hours
pub const ROUND_DURATION: UnixTimestamp = 24 * 60 * 60;

/// Contributions must be strictly above 0.01 SOL
pub const MIN_CONTRIBUTION: u64 = 10_000_000;

/// Entrant capacity of a lottery account. Every entrant account is passed
/// to `EndRound`, so this is bounded by the keys one transaction can carry.
pub const MAX_PLAYERS: usize = 24;

const PLAYERS_LEN: usize = 32 * MAX_PLAYERS;

/// Round state of the lottery
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RoundStatus {
    /// Collecting entrants
    Idle,
    /// Round running, entrant list frozen until it is ended
    Active,
}

impl TryFrom<u8> for RoundStatus {
    type Error = &'static str;

    fn try_from(val: u8) -> Result<Self, Self::Error> {
        match val {
            0 => Ok(RoundStatus::Idle),
            1 => Ok(RoundStatus::Active),
            _ => Err("Invalid round status"),
        }
    }
}

impl From<RoundStatus> for u8 {
    fn from(status: RoundStatus) -> Self {
        match status {
            RoundStatus::Idle => 0,
            RoundStatus::Active => 1,
        }
    }
}

/// Lottery account data
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Lottery {
    /// Is the account initialized
    pub is_initialized: bool,
    /// Manager allowed to start and end rounds, fixed at initialization
    pub manager: Pubkey,
    /// Entrants required before a round can start
    pub minimum_entrants: u32,
    /// Current round state
    pub status: RoundStatus,
    /// Deadline of the current round, meaningful only while active
    pub round_end_time: UnixTimestamp,
    /// Most recently paid winner
    pub last_winner: Option<Pubkey>,
    /// Number of rounds that ended with a payout
    pub rounds_completed: u64,
    /// Entrants in insertion order
    pub players: Vec<Pubkey>,
}

impl Lottery {
    pub fn new(manager: Pubkey, minimum_entrants: u32) -> Self {
        Self {
            is_initialized: true,
            manager,
            minimum_entrants,
            status: RoundStatus::Idle,
            round_end_time: 0,
            last_winner: None,
            rounds_completed: 0,
            players: Vec::new(),
        }
    }

    pub fn is_active(&self) -> bool {
        self.status == RoundStatus::Active
    }
}

impl Sealed for Lottery {}

impl IsInitialized for Lottery {
    fn is_initialized(&self) -> bool {
        self.is_initialized
    }
}

impl Pack for Lottery {
    const LEN: usize = 1 + 32 + 4 + 1 + 8 + 1 + 32 + 8 + 4 + PLAYERS_LEN;

    fn unpack_from_slice(src: &[u8]) -> Result<Self, ProgramError> {
        let src = array_ref![src, 0, Lottery::LEN];
        let (
            is_initialized,
            manager,
            minimum_entrants,
            status,
            round_end_time,
            has_last_winner,
            last_winner,
            rounds_completed,
            player_count,
            players,
        ) = array_refs![src, 1, 32, 4, 1, 8, 1, 32, 8, 4, PLAYERS_LEN];

        let status =
            RoundStatus::try_from(status[0]).map_err(|_| ProgramError::InvalidAccountData)?;

        let player_count = u32::from_le_bytes(*player_count) as usize;
        if player_count > MAX_PLAYERS {
            return Err(ProgramError::InvalidAccountData);
        }
        let players = players
            .chunks_exact(32)
            .take(player_count)
            .map(|chunk| Pubkey::new_from_array(*array_ref![chunk, 0, 32]))
            .collect();

        Ok(Lottery {
            is_initialized: is_initialized[0] != 0,
            manager: Pubkey::new_from_array(*manager),
            minimum_entrants: u32::from_le_bytes(*minimum_entrants),
            status,
            round_end_time: UnixTimestamp::from_le_bytes(*round_end_time),
            last_winner: match has_last_winner[0] {
                0 => None,
                _ => Some(Pubkey::new_from_array(*last_winner)),
            },
            rounds_completed: u64::from_le_bytes(*rounds_completed),
            players,
        })
    }

    fn pack_into_slice(&self, dst: &mut [u8]) {
        let dst = array_mut_ref![dst, 0, Lottery::LEN];
        let (
            is_initialized_dst,
            manager_dst,
            minimum_entrants_dst,
            status_dst,
            round_end_time_dst,
            has_last_winner_dst,
            last_winner_dst,
            rounds_completed_dst,
            player_count_dst,
            players_dst,
        ) = mut_array_refs![dst, 1, 32, 4, 1, 8, 1, 32, 8, 4, PLAYERS_LEN];

        is_initialized_dst[0] = self.is_initialized as u8;
        manager_dst.copy_from_slice(self.manager.as_ref());
        *minimum_entrants_dst = self.minimum_entrants.to_le_bytes();
        status_dst[0] = self.status.into();
        *round_end_time_dst = self.round_end_time.to_le_bytes();
        match self.last_winner {
            Some(winner) => {
                has_last_winner_dst[0] = 1;
                last_winner_dst.copy_from_slice(winner.as_ref());
            }
            None => {
                has_last_winner_dst[0] = 0;
                *last_winner_dst = [0u8; 32];
            }
        }
        *rounds_completed_dst = self.rounds_completed.to_le_bytes();

        let count = self.players.len().min(MAX_PLAYERS);
        *player_count_dst = (count as u32).to_le_bytes();
        players_dst.fill(0);
        for (slot, player) in players_dst.chunks_exact_mut(32).zip(&self.players[..count]) {
            slot.copy_from_slice(player.as_ref());
        }
    }
}
