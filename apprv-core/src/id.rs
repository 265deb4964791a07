//! Random identifier generation.
//!
//! Identifiers are drawn from a 62-symbol alphabet by reducing each secure
//! random byte modulo 62. Since 256 mod 62 = 8, the first eight symbols are
//! slightly more likely than the rest. That is fine for opaque,
//! collision-resistant ids and not fine for secrets.

use thiserror::Error;

/// Symbols an identifier is built from, in index order.
pub const ALPHABET: &[u8; 62] = b"abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

/// Length of event identifiers.
pub const EVENT_ID_LENGTH: usize = 16;

/// The random source could not supply the requested bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("secure random source failed to supply {requested} bytes")]
pub struct EntropyError {
    pub requested: usize,
}

/// A source of cryptographically secure random bytes.
pub trait EntropySource: Send + Sync {
    /// Fill `dest` completely or fail.
    fn fill(&self, dest: &mut [u8]) -> Result<(), EntropyError>;
}

/// The operating system's CSPRNG.
#[derive(Debug, Clone)]
pub struct SystemEntropy {
    rng: ring::rand::SystemRandom,
}

impl SystemEntropy {
    pub fn new() -> Self {
        Self {
            rng: ring::rand::SystemRandom::new(),
        }
    }
}

impl Default for SystemEntropy {
    fn default() -> Self {
        Self::new()
    }
}

impl EntropySource for SystemEntropy {
    fn fill(&self, dest: &mut [u8]) -> Result<(), EntropyError> {
        ring::rand::SecureRandom::fill(&self.rng, dest).map_err(|_| EntropyError {
            requested: dest.len(),
        })
    }
}

/// Generate an identifier of exactly `length` characters.
///
/// No uniqueness check is made against existing records.
pub fn generate_id(source: &dyn EntropySource, length: usize) -> Result<String, EntropyError> {
    let mut bytes = vec![0u8; length];
    source.fill(&mut bytes)?;
    Ok(bytes
        .iter()
        .map(|byte| char::from(ALPHABET[usize::from(*byte) % ALPHABET.len()]))
        .collect())
}

#[cfg(test)]
pub(crate) mod testing {
    use super::{EntropyError, EntropySource};

    /// Replays a fixed byte sequence, cycling when it runs out.
    pub struct FixedEntropy(pub Vec<u8>);

    impl EntropySource for FixedEntropy {
        fn fill(&self, dest: &mut [u8]) -> Result<(), EntropyError> {
            for (slot, byte) in dest.iter_mut().zip(self.0.iter().cycle()) {
                *slot = *byte;
            }
            Ok(())
        }
    }

    pub struct FailingEntropy;

    impl EntropySource for FailingEntropy {
        fn fill(&self, dest: &mut [u8]) -> Result<(), EntropyError> {
            Err(EntropyError {
                requested: dest.len(),
            })
        }
    }
}
