//! Public generator API.
//!
//! [`MobileRng`] ties the entropy source, the DRBG core and the
//! checkpoint store together behind a small, panic-free interface.

mod orchestrator;
mod status;

pub use orchestrator::MobileRng;
pub use status::{GenerateStatus, HealthStatus, RngStats, MODULE_NAME};
