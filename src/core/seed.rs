//! Deterministic draw generation.
//!
//! The seed key for one second is
//! `DDMMYYYY(birth) DDMMYYYY(target) DDMMYYYYHHMMSS(timestamp) favourites`
//! with no separators. The key is hashed with SHA-256 and the digest seeds a
//! ChaCha20 stream; five values are then sampled from `0..100`.
//! Reproducing a draw elsewhere requires the same three steps:
//!
//! 1. SHA-256 of the UTF-8 key, used as the 32-byte seed.
//! 2. ChaCha20 (20 rounds, zero stream and nonce), read as little-endian
//!    `u32` words in keystream order.
//! 3. For each number, take words `v` until `(v * 100) mod 2^32 >= 96`
//!    (96 = `2^32 mod 100`), then emit `(v * 100) >> 32`. The product is
//!    computed in 64 bits. This is Lemire's multiply-and-reject method.

use chrono::{NaiveDate, NaiveDateTime};
use rand::{RngCore, SeedableRng};
use rand_chacha::ChaCha20Rng;
use sha2::{Digest, Sha256};

use crate::core::input::concat_favorites;
use crate::models::{Draw, ScanRequest, UserProfile};

pub const DRAW_SIZE: usize = 5;

/// Last year whose dates still format as four digits in a seed key
pub const MAX_YEAR: i32 = 9999;

const RANGE: u32 = 100;
/// Low words below this would over-represent some outputs
const REJECT_BELOW: u32 = ((1u64 << 32) % RANGE as u64) as u32;

/// Build the seed key for one second
pub fn seed_key(
    birth_date: NaiveDate,
    target_date: NaiveDate,
    timestamp: NaiveDateTime,
    favorites: &str,
) -> String {
    format!(
        "{}{}{}{}",
        birth_date.format("%d%m%Y"),
        target_date.format("%d%m%Y"),
        timestamp.format("%d%m%Y%H%M%S"),
        favorites
    )
}

/// Five numbers in `0..=99` derived from a seed key
pub fn numbers_for_key(key: &str) -> [u8; DRAW_SIZE] {
    let mut seed = [0u8; 32];
    seed.copy_from_slice(&Sha256::digest(key.as_bytes()));
    let mut rng = ChaCha20Rng::from_seed(seed);
    std::array::from_fn(|_| below_hundred(&mut rng))
}

#[inline]
fn below_hundred<R: RngCore>(rng: &mut R) -> u8 {
    loop {
        let product = u64::from(rng.next_u32()) * u64::from(RANGE);
        if (product as u32) >= REJECT_BELOW {
            return (product >> 32) as u8;
        }
    }
}

/// Produces draws for one (profile, request) pair.
///
/// The date prefix and favourites suffix are formatted once; only the
/// timestamp part changes per second.
#[derive(Debug, Clone)]
pub struct SeedGenerator {
    prefix: String,
    suffix: String,
}

impl SeedGenerator {
    pub fn new(profile: &UserProfile, request: &ScanRequest) -> Self {
        Self {
            prefix: format!(
                "{}{}",
                profile.birth_date.format("%d%m%Y"),
                request.target_date.format("%d%m%Y")
            ),
            suffix: concat_favorites(&request.favorites),
        }
    }

    pub fn key_for(&self, timestamp: NaiveDateTime) -> String {
        format!(
            "{}{}{}",
            self.prefix,
            timestamp.format("%d%m%Y%H%M%S"),
            self.suffix
        )
    }

    pub fn draw(&self, timestamp: NaiveDateTime) -> Draw {
        Draw {
            timestamp,
            numbers: numbers_for_key(&self.key_for(timestamp)),
        }
    }
}
