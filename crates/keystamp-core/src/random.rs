//! Random string generation

use rand::Rng;
use rand::distr::Alphanumeric;

/// Generate `len` characters drawn uniformly from `[A-Za-z0-9]`
///
/// Uses the thread-local CSPRNG.
pub fn random_alphanumeric(len: usize) -> String {
    rand::rng()
        .sample_iter(&Alphanumeric)
        .take(len)
        .map(char::from)
        .collect()
}
