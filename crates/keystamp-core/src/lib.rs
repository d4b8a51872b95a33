//! # Keystamp Core
//!
//! Foundation primitives shared by the signing and token crates:
//!
//! - [`clock`] - injectable wall clock ([`Clock`], [`SystemClock`], [`ManualClock`])
//! - [`random`] - alphanumeric random strings for nonces and token ids
//!
//! Nothing in this crate holds process-wide state; every consumer receives its
//! clock as a constructor argument.

pub mod clock;
pub mod random;

pub use clock::{Clock, ManualClock, SharedClock, SystemClock};
pub use random::random_alphanumeric;
