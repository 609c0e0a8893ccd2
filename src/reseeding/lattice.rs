//! Module-LWR lattice primitives.
//!
//! The public matrix `A` and secret vector `s` live in `Z_q^(k·n)`.
//! Output is `⌊(p/q) · (A·s mod q)⌋`: the rounding step discards the
//! low-order bits an attacker would need to invert the product.

use rand_chacha::ChaCha20Rng;
use rand_core::{RngCore, SeedableRng};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use zeroize::{Zeroize, Zeroizing};

/// Errors in lattice construction.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum LatticeError {
    /// Parameters outside the supported range.
    #[error("invalid lattice parameters: {0}")]
    InvalidParams(String),
    /// Explicit matrix has the wrong number of entries.
    #[error("matrix has {got} entries, expected {expected}")]
    DimensionMismatch {
        /// Entry count for an `n x n` matrix.
        expected: usize,
        /// Entry count supplied.
        got: usize,
    },
    /// Explicit matrix entry is not reduced mod `q`.
    #[error("matrix entry {index} = {value} is not reduced mod {q}")]
    EntryOutOfRange {
        /// Row-major index of the entry.
        index: usize,
        /// Offending value.
        value: u16,
        /// Public modulus.
        q: u32,
    },
}

/// Lattice dimensions and moduli.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LwrParams {
    /// Module rank.
    pub k: usize,
    /// Ring degree.
    pub n: usize,
    /// Modulus of `A` and `s`.
    pub q: u32,
    /// Rounding modulus.
    pub p: u32,
}

impl Default for LwrParams {
    fn default() -> Self {
        Self {
            k: 3,
            n: 256,
            q: 3329,
            p: 1024,
        }
    }
}

impl LwrParams {
    /// Length of the secret vector (`k·n`).
    #[inline]
    pub fn dimension(&self) -> usize {
        self.k * self.n
    }

    /// Bytes in a serialized vector at 2 bytes per coefficient.
    #[inline]
    pub fn vector_bytes(&self) -> usize {
        self.dimension() * 2
    }

    /// Checks that coefficients fit 16 bits and `2 <= p <= q`.
    pub fn validate(&self) -> Result<(), LatticeError> {
        if self.k == 0 || self.n == 0 {
            return Err(LatticeError::InvalidParams("k and n must be non-zero".into()));
        }
        if !(2..=65536).contains(&self.q) {
            return Err(LatticeError::InvalidParams(format!(
                "q = {} must lie in 2..=65536",
                self.q
            )));
        }
        if self.p < 2 || self.p > self.q {
            return Err(LatticeError::InvalidParams(format!(
                "p = {} must lie in 2..=q ({})",
                self.p, self.q
            )));
        }
        Ok(())
    }
}

/// Public `k·n × k·n` matrix over `Z_q`, row-major.
///
/// Immutable after construction. Not secret.
#[derive(Clone, PartialEq, Eq)]
pub struct LatticeMatrix {
    dim: usize,
    q: u32,
    entries: Vec<u16>,
}

impl LatticeMatrix {
    /// Derives the matrix deterministically from a public seed.
    ///
    /// Uses a ChaCha20 stream and rejection-samples 16-bit draws so
    /// every entry is uniform mod `q`.
    pub fn derive(params: &LwrParams, seed: u64) -> Result<Self, LatticeError> {
        params.validate()?;

        let dim = params.dimension();
        let q = params.q;
        let bound = (65536 / q) * q;
        let mut rng = ChaCha20Rng::seed_from_u64(seed);
        let mut entries = Vec::with_capacity(dim * dim);

        while entries.len() < dim * dim {
            let word = rng.next_u32();
            for candidate in [word & 0xFFFF, word >> 16] {
                if candidate < bound && entries.len() < dim * dim {
                    entries.push((candidate % q) as u16);
                }
            }
        }

        tracing::debug!(dim, q, seed, "Derived public lattice matrix");

        Ok(Self { dim, q, entries })
    }

    /// Wraps explicit row-major entries, e.g. a fixed test matrix.
    pub fn from_entries(params: &LwrParams, entries: Vec<u16>) -> Result<Self, LatticeError> {
        params.validate()?;

        let dim = params.dimension();
        if entries.len() != dim * dim {
            return Err(LatticeError::DimensionMismatch {
                expected: dim * dim,
                got: entries.len(),
            });
        }
        if let Some((index, &value)) = entries
            .iter()
            .enumerate()
            .find(|&(_, &v)| u32::from(v) >= params.q)
        {
            return Err(LatticeError::EntryOutOfRange {
                index,
                value,
                q: params.q,
            });
        }

        Ok(Self {
            dim,
            q: params.q,
            entries,
        })
    }

    /// Row/column count.
    #[inline]
    pub fn dim(&self) -> usize {
        self.dim
    }

    /// Modulus.
    #[inline]
    pub fn q(&self) -> u32 {
        self.q
    }

    /// Entry at `(row, col)`.
    #[cfg(test)]
    pub(crate) fn entry(&self, row: usize, col: usize) -> u16 {
        self.entries[row * self.dim + col]
    }

    /// Computes `A·s mod q`.
    pub fn mul_vec(&self, s: &[u16]) -> Vec<u32> {
        debug_assert_eq!(s.len(), self.dim);
        let q = u64::from(self.q);

        self.entries
            .chunks_exact(self.dim)
            .map(|row| {
                let acc: u64 = row
                    .iter()
                    .zip(s)
                    .map(|(&a, &x)| u64::from(a) * u64::from(x))
                    .sum();
                (acc % q) as u32
            })
            .collect()
    }
}

impl std::fmt::Debug for LatticeMatrix {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LatticeMatrix")
            .field("dim", &self.dim)
            .field("q", &self.q)
            .finish_non_exhaustive()
    }
}

/// Applies LWR rounding `⌊p·v / q⌋` to each component.
pub fn round_compress(v: &[u32], q: u32, p: u32) -> Vec<u16> {
    v.iter()
        .map(|&x| ((u64::from(x) * u64::from(p)) / u64::from(q)) as u16)
        .collect()
}

/// Serializes coefficients as 2 little-endian bytes each.
pub fn serialize_coefficients(coeffs: &[u16]) -> Vec<u8> {
    coeffs.iter().flat_map(|c| c.to_le_bytes()).collect()
}

/// The DRBG's secret vector `s`.
///
/// Zeroized whenever it is dropped, which includes every wholesale
/// replacement during `update`.
pub struct SecretStateVector {
    coeffs: Vec<u16>,
}

impl SecretStateVector {
    /// All-zero vector of the given length (the Unseeded state).
    pub fn zeros(dimension: usize) -> Self {
        Self {
            coeffs: vec![0; dimension],
        }
    }

    /// Builds a vector from conditioner output, two bytes per
    /// coefficient reduced mod `q`.
    ///
    /// Plain modular reduction of 16-bit words is slightly non-uniform
    /// unless `q` divides 65536.
    pub fn from_conditioned(bytes: &[u8], q: u32) -> Self {
        let coeffs = bytes
            .chunks_exact(2)
            .map(|pair| (u32::from(u16::from_le_bytes([pair[0], pair[1]])) % q) as u16)
            .collect();
        Self { coeffs }
    }

    #[inline]
    pub(crate) fn coefficients(&self) -> &[u16] {
        &self.coeffs
    }

    /// Raw serialization fed back into `update`.
    pub(crate) fn to_bytes(&self) -> Zeroizing<Vec<u8>> {
        Zeroizing::new(serialize_coefficients(&self.coeffs))
    }
}

impl Drop for SecretStateVector {
    fn drop(&mut self) {
        self.coeffs.zeroize();
    }
}

impl std::fmt::Debug for SecretStateVector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SecretStateVector")
            .field("len", &self.coeffs.len())
            .finish_non_exhaustive()
    }
}
