//! Fixed-width word encoding shared by typed-data hashing and the
//! position-created event payload.
//!
//! Every value occupies one 32-byte word:
//! - `u64`: big-endian in the last 8 bytes
//! - [`Decimal`]: its 16-byte canonical serialization in the last 16 bytes
//! - addresses / asset ids / hashes: the raw 32 bytes

use rust_decimal::Decimal;

use crate::constants::WORD_SIZE;
use crate::{OpenborrowError, Result};

/// One encoded word.
pub type Word = [u8; WORD_SIZE];

#[must_use]
pub fn word_u64(value: u64) -> Word {
    let mut word = [0u8; WORD_SIZE];
    word[WORD_SIZE - 8..].copy_from_slice(&value.to_be_bytes());
    word
}

#[must_use]
pub fn word_decimal(value: Decimal) -> Word {
    let mut word = [0u8; WORD_SIZE];
    word[WORD_SIZE - 16..].copy_from_slice(&value.serialize());
    word
}

/// Read a `u64` word, rejecting non-zero high bytes.
pub fn read_u64(word: &Word) -> Result<u64> {
    if word[..WORD_SIZE - 8].iter().any(|b| *b != 0) {
        return Err(OpenborrowError::Serialization(
            "u64 word has non-zero high bytes".into(),
        ));
    }
    let mut bytes = [0u8; 8];
    bytes.copy_from_slice(&word[WORD_SIZE - 8..]);
    Ok(u64::from_be_bytes(bytes))
}

/// Read a decimal word, rejecting non-zero padding.
pub fn read_decimal(word: &Word) -> Result<Decimal> {
    if word[..WORD_SIZE - 16].iter().any(|b| *b != 0) {
        return Err(OpenborrowError::Serialization(
            "decimal word has non-zero padding".into(),
        ));
    }
    let mut bytes = [0u8; 16];
    bytes.copy_from_slice(&word[WORD_SIZE - 16..]);
    Ok(Decimal::deserialize(bytes))
}

/// Split a payload into words. The payload length must be an exact multiple
/// of the word size and equal `expected` words.
pub fn split_words(payload: &[u8], expected: usize) -> Result<Vec<Word>> {
    if payload.len() != expected * WORD_SIZE {
        return Err(OpenborrowError::Serialization(format!(
            "expected {} bytes, got {}",
            expected * WORD_SIZE,
            payload.len()
        )));
    }
    Ok(payload
        .chunks_exact(WORD_SIZE)
        .map(|chunk| {
            let mut word = [0u8; WORD_SIZE];
            word.copy_from_slice(chunk);
            word
        })
        .collect())
}
