//! Short code generation
//!
//! An allocator only proposes candidates. It never reserves a code, so the
//! caller must insert the candidate and retry when the store reports a
//! conflict.

use rand::{distr::Alphanumeric, Rng};

use crate::config::ConfigError;

/// Default number of characters in a generated code
pub const DEFAULT_CODE_LENGTH: usize = 6;

/// Upper bound on code length, fixed by the storage column
pub const MAX_CODE_LENGTH: usize = 10;

/// Produces candidate short codes.
///
/// Implementations must be callable from many tasks at once without
/// coordinating with each other.
pub trait Allocator: Send + Sync + 'static {
    /// Returns a candidate code. Uniqueness is not guaranteed.
    fn allocate(&self) -> String;
}

/// Draws each character independently and uniformly from `[A-Za-z0-9]`.
#[derive(Debug, Clone, Copy)]
pub struct RandomAllocator {
    length: usize,
}

impl RandomAllocator {
    pub fn new(length: usize) -> Result<Self, ConfigError> {
        if length == 0 || length > MAX_CODE_LENGTH {
            return Err(ConfigError::Invalid {
                key: "CODE_LENGTH",
                reason: format!("must be between 1 and {MAX_CODE_LENGTH}, got {length}"),
            });
        }
        Ok(Self { length })
    }

    pub fn length(&self) -> usize {
        self.length
    }
}

impl Default for RandomAllocator {
    fn default() -> Self {
        Self {
            length: DEFAULT_CODE_LENGTH,
        }
    }
}

impl Allocator for RandomAllocator {
    fn allocate(&self) -> String {
        // thread-local generator, nothing shared between callers
        rand::rng()
            .sample_iter(&Alphanumeric)
            .take(self.length)
            .map(char::from)
            .collect()
    }
}

/// Checks that `code` could have been produced by an allocator:
/// 1 to [`MAX_CODE_LENGTH`] ASCII letters or digits.
pub fn is_valid_code(code: &str) -> bool {
    !code.is_empty()
        && code.len() <= MAX_CODE_LENGTH
        && code.bytes().all(|b| b.is_ascii_alphanumeric())
}
