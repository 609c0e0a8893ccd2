//! Persisted checkpoint record.
//!
//! A checkpoint holds a token generated *after* forward-secrecy
//! rotation. It commits to future seeding but is never the active
//! secret.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use zeroize::Zeroize;

/// Tamper-detection checksum: sum of token bytes plus the counter.
///
/// Detects corruption, not forgery.
pub fn checksum(token: &[u8], reseed_counter: u64) -> u64 {
    token
        .iter()
        .fold(0u64, |acc, &b| acc.wrapping_add(u64::from(b)))
        .wrapping_add(reseed_counter)
}

/// A verified checkpoint.
pub struct Checkpoint {
    token: Vec<u8>,
    reseed_counter: u64,
    timestamp: DateTime<Utc>,
}

impl Checkpoint {
    /// Token bytes committed for the next boot.
    #[inline]
    pub fn token(&self) -> &[u8] {
        &self.token
    }

    /// DRBG reseed counter when the checkpoint was written.
    #[inline]
    pub fn reseed_counter(&self) -> u64 {
        self.reseed_counter
    }

    /// Write time.
    #[inline]
    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }
}

impl Drop for Checkpoint {
    fn drop(&mut self) {
        self.token.zeroize();
    }
}

impl std::fmt::Debug for Checkpoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Checkpoint")
            .field("token_len", &self.token.len())
            .field("reseed_counter", &self.reseed_counter)
            .field("timestamp", &self.timestamp)
            .finish()
    }
}

/// On-disk layout.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CheckpointRecord {
    /// Hex-encoded token.
    pub token_hex: String,
    /// DRBG reseed counter at write time.
    pub reseed_counter: u64,
    /// Write time, RFC 3339 on disk.
    pub timestamp: DateTime<Utc>,
    /// Sum of token bytes plus `reseed_counter`.
    pub checksum: u64,
}

impl CheckpointRecord {
    /// Seals a token and counter into a record stamped with the current time.
    pub fn seal(token: &[u8], reseed_counter: u64) -> Self {
        Self {
            token_hex: hex::encode(token),
            reseed_counter,
            timestamp: Utc::now(),
            checksum: checksum(token, reseed_counter),
        }
    }

    /// Decodes and verifies the record.
    ///
    /// Any malformed field or checksum mismatch yields `None`; partial
    /// data is never trusted.
    pub fn verify(&self) -> Option<Checkpoint> {
        let token = match hex::decode(&self.token_hex) {
            Ok(token) => token,
            Err(e) => {
                tracing::warn!(error = %e, "Checkpoint token is not valid hex");
                return None;
            }
        };

        if checksum(&token, self.reseed_counter) != self.checksum {
            tracing::warn!("Checkpoint checksum mismatch; treating state as corrupted");
            return None;
        }

        Some(Checkpoint {
            token,
            reseed_counter: self.reseed_counter,
            timestamp: self.timestamp,
        })
    }
}
