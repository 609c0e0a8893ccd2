//! Entropy conditioning via extendable-output functions.
//!
//! This module whitens raw samples and DRBG intermediates into
//! uniformly distributed output of any requested length. Every caller
//! supplies its own domain-separation tag.

mod xof;

pub use xof::{Conditioner, XofAlgorithm};
