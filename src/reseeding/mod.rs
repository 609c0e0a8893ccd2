//! Lattice-based pseudorandom core with mandatory reseeding.
//!
//! This module provides the Module-LWR DRBG: the public matrix, the
//! secret state vector, and the update/generate state machine with its
//! reseed-interval guard and forward-secrecy rotation.

mod drbg;
mod lattice;

pub use drbg::{
    DrbgError, DrbgState, Generation, LwrDrbgCore, DEFAULT_MATRIX_SEED, DEFAULT_RESEED_INTERVAL,
};
pub use lattice::{round_compress, LatticeError, LatticeMatrix, LwrParams, SecretStateVector};
