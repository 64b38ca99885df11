//! Session code generation: 8 chars drawn from the Crockford-style alphabet
//! `A-Z2-7`, rejecting the visually ambiguous digits 0/1 and letters I/L/O/U.

use rand::Rng;

const ALPHABET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ234567";

pub fn generate(rng: &mut impl Rng) -> String {
    (0..relay_protocol::validate::SESSION_CODE_LEN)
        .map(|_| {
            let idx = rng.gen_range(0..ALPHABET.len());
            ALPHABET[idx] as char
        })
        .collect()
}
