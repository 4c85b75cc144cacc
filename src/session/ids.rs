//! Short session identifier generation

use rand::Rng;

/// Alphabet for session identifiers: lowercase letters plus digits 2-9.
/// `0` and `1` are excluded as too easy to confuse with `o` and `l` when
/// identifiers are typed or read aloud.
pub const ID_ALPHABET: &str = "abcdefghijklmnopqrstuvwxyz23456789";

/// Length of a session identifier
pub const ID_LENGTH: usize = 8;

/// Draw a random identifier from the alphabet
///
/// Uniqueness against live sessions is enforced by the caller, which holds
/// the session map lock while retrying.
pub fn generate_session_id() -> String {
    let mut rng = rand::thread_rng();
    let alphabet = ID_ALPHABET.as_bytes();
    (0..ID_LENGTH)
        .map(|_| alphabet[rng.gen_range(0..alphabet.len())] as char)
        .collect()
}
