//! Module-LWR deterministic random bit generator.
//!
//! # Update
//!
//! The new secret is derived by conditioning the serialized current
//! secret together with caller-provided data:
//!
//! ```text
//! s' = XOF(bytes(s) || provided, UPDATE_DOMAIN) mod q
//! ```
//!
//! Disclosure of an old secret does not reveal the new one without
//! also knowing `provided`.
//!
//! # Generate
//!
//! ```text
//! v   = A·s mod q
//! y   = ⌊(p/q)·v⌋
//! out = XOF(bytes(y), OUTPUT_DOMAIN)[..num_bytes]
//! s   = rotate(s)
//! ```
//!
//! The rotation runs after every output so that the output never
//! discloses the secret used to produce it.

use super::lattice::{
    round_compress, serialize_coefficients, LatticeError, LatticeMatrix, LwrParams,
    SecretStateVector,
};
use crate::conditioning::Conditioner;
use thiserror::Error;
use zeroize::Zeroizing;

/// Domain separator for secret-state updates.
const UPDATE_DOMAIN: &[u8] = b"lwr-drbg-update-v1";

/// Domain separator for output whitening.
const OUTPUT_DOMAIN: &[u8] = b"lwr-drbg-output-v1";

/// Fixed input mixed into the state after every output.
const ROTATE_INPUT: &[u8] = b"lwr-drbg-forward-secrecy-rotate-v1";

/// Default public matrix seed. Sharing it across devices is fine since
/// the matrix is public.
pub const DEFAULT_MATRIX_SEED: u64 = 42;

/// Default hard limit on generate calls between reseeds.
pub const DEFAULT_RESEED_INTERVAL: u64 = 1 << 16;

/// Errors from the DRBG core.
#[derive(Debug, Error)]
pub enum DrbgError {
    /// `generate` called before the first `update`.
    #[error("DRBG has not been seeded")]
    Unseeded,
    /// Public matrix shape or modulus disagrees with the parameters.
    #[error("matrix is {matrix}x{matrix} but parameters need {expected}x{expected}")]
    MatrixMismatch {
        /// Dimension of the supplied matrix.
        matrix: usize,
        /// Dimension the parameters call for.
        expected: usize,
    },
    /// Invalid lattice parameters.
    #[error("lattice error: {0}")]
    Lattice(#[from] LatticeError),
}

/// Outcome of a generate call.
///
/// `ReseedRequired` is a control signal, not an error: the caller must
/// call `update` before retrying. Nothing is reseeded implicitly.
#[must_use]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Generation {
    /// Whitened output of exactly the requested length.
    Output(Vec<u8>),
    /// The reseed counter exceeded the interval.
    ReseedRequired,
}

impl Generation {
    /// Returns the output bytes, if any.
    pub fn into_output(self) -> Option<Vec<u8>> {
        match self {
            Generation::Output(bytes) => Some(bytes),
            Generation::ReseedRequired => None,
        }
    }
}

/// Seeding state of the core.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DrbgState {
    /// No seed material absorbed yet.
    Unseeded,
    /// At least one `update` has run.
    Seeded,
}

/// Lattice-based DRBG core.
///
/// Owns the secret vector exclusively. The public matrix is fixed at
/// construction and never reseeded.
pub struct LwrDrbgCore {
    params: LwrParams,
    matrix: LatticeMatrix,
    secret: SecretStateVector,
    conditioner: Conditioner,
    /// Generate calls since the last `update`, starting at 1.
    reseed_counter: u64,
    reseed_interval: u64,
    state: DrbgState,
}

impl LwrDrbgCore {
    /// Creates an unseeded core around an explicit public matrix.
    pub fn new(
        params: LwrParams,
        matrix: LatticeMatrix,
        conditioner: Conditioner,
        reseed_interval: u64,
    ) -> Result<Self, DrbgError> {
        params.validate()?;
        if matrix.dim() != params.dimension() || matrix.q() != params.q {
            return Err(DrbgError::MatrixMismatch {
                matrix: matrix.dim(),
                expected: params.dimension(),
            });
        }

        Ok(Self {
            params,
            matrix,
            secret: SecretStateVector::zeros(params.dimension()),
            conditioner,
            reseed_counter: 0,
            reseed_interval,
            state: DrbgState::Unseeded,
        })
    }

    /// Creates an unseeded core, deriving the matrix from `matrix_seed`.
    pub fn with_matrix_seed(
        params: LwrParams,
        matrix_seed: u64,
        conditioner: Conditioner,
        reseed_interval: u64,
    ) -> Result<Self, DrbgError> {
        let matrix = LatticeMatrix::derive(&params, matrix_seed)?;
        Self::new(params, matrix, conditioner, reseed_interval)
    }

    /// Absorbs seed material and resets the reseed counter to 1.
    ///
    /// Valid from either state; always leaves the core Seeded.
    pub fn update(&mut self, provided_data: &[u8]) {
        self.mix(provided_data);
        self.reseed_counter = 1;

        if self.state == DrbgState::Unseeded {
            tracing::debug!(dimension = self.params.dimension(), "DRBG seeded");
        }
        self.state = DrbgState::Seeded;
    }

    /// Replaces the secret with a conditioned mix of itself and `data`.
    /// Leaves the counter untouched.
    fn mix(&mut self, data: &[u8]) {
        let mut input =
            Zeroizing::new(Vec::with_capacity(self.params.vector_bytes() + data.len()));
        input.extend_from_slice(&self.secret.to_bytes());
        input.extend_from_slice(data);

        let material = Zeroizing::new(self.conditioner.condition(
            &input,
            UPDATE_DOMAIN,
            self.params.vector_bytes() * 8,
        ));

        // The previous vector is zeroized as it drops
        self.secret = SecretStateVector::from_conditioned(&material, self.params.q);
    }

    /// Produces exactly `num_bytes` pseudorandom bytes, then rotates
    /// the secret and increments the reseed counter.
    ///
    /// Returns [`Generation::ReseedRequired`] without touching the
    /// state once the counter exceeds the reseed interval.
    pub fn generate(&mut self, num_bytes: usize) -> Result<Generation, DrbgError> {
        if self.state == DrbgState::Unseeded {
            return Err(DrbgError::Unseeded);
        }
        if self.reseed_counter > self.reseed_interval {
            tracing::debug!(
                reseed_counter = self.reseed_counter,
                reseed_interval = self.reseed_interval,
                "Reseed required"
            );
            return Ok(Generation::ReseedRequired);
        }

        let v = Zeroizing::new(self.matrix.mul_vec(self.secret.coefficients()));
        let y = Zeroizing::new(round_compress(&v, self.params.q, self.params.p));
        let raw = Zeroizing::new(serialize_coefficients(&y));

        let output = self.conditioner.condition(&raw, OUTPUT_DOMAIN, num_bytes * 8);

        self.mix(ROTATE_INPUT);
        self.reseed_counter += 1;

        tracing::trace!(num_bytes, reseed_counter = self.reseed_counter, "DRBG output generated");

        Ok(Generation::Output(output))
    }

    /// Current reseed counter.
    pub fn reseed_counter(&self) -> u64 {
        self.reseed_counter
    }

    /// Hard reseed interval.
    pub fn reseed_interval(&self) -> u64 {
        self.reseed_interval
    }

    /// Whether the core has been seeded.
    pub fn state(&self) -> DrbgState {
        self.state
    }

    /// Lattice parameters.
    pub fn params(&self) -> &LwrParams {
        &self.params
    }

    /// The public matrix.
    pub fn matrix(&self) -> &LatticeMatrix {
        &self.matrix
    }
}

impl std::fmt::Debug for LwrDrbgCore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LwrDrbgCore")
            .field("params", &self.params)
            .field("state", &self.state)
            .field("reseed_counter", &self.reseed_counter)
            .field("reseed_interval", &self.reseed_interval)
            .finish_non_exhaustive()
    }
}
