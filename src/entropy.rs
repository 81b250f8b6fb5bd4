// Pseudo-random winner draw.
//
// Every input is public when the closing transaction is built: the slot, the
// clock and the entrant list. Whoever orders that transaction can predict the
// draw, so this must not be treated as secure randomness.
use solana_program::{clock::UnixTimestamp, keccak, pubkey::Pubkey};

/// Hashes the entropy value, the timestamp and the entrant list into a
/// 256-bit big-endian value.
pub fn draw(entropy: u64, now: UnixTimestamp, entrants: &[Pubkey]) -> [u8; 32] {
    let entropy_bytes = entropy.to_be_bytes();
    let now_bytes = now.to_be_bytes();
    let mut inputs: Vec<&[u8]> = Vec::with_capacity(entrants.len() + 2);
    inputs.push(&entropy_bytes);
    inputs.push(&now_bytes);
    inputs.extend(entrants.iter().map(|entrant| entrant.as_ref()));
    keccak::hashv(&inputs).to_bytes()
}

/// Reduces a 256-bit big-endian value modulo `modulus`.
pub fn reduce(value: &[u8; 32], modulus: u64) -> u64 {
    if modulus == 0 {
        return 0;
    }
    let modulus = modulus as u128;
    value
        .iter()
        .fold(0u128, |acc, byte| ((acc << 8) | *byte as u128) % modulus) as u64
}

/// Index of the winning entrant. Callers guarantee `entrants` is non-empty.
pub fn winner_index(entropy: u64, now: UnixTimestamp, entrants: &[Pubkey]) -> usize {
    let value = draw(entropy, now, entrants);
    reduce(&value, entrants.len() as u64) as usize
}
