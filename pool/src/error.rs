//! Error types for pool operations

use thiserror::Error;

/// Error type for pool operations.
///
/// Both variants are local contract violations detected at the call boundary.
/// The pool never retries or self-heals either case; exhaustion is absorbed by
/// growth and is not an error.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// `release` was called without a context. The free list is untouched.
    #[error("release called without a context")]
    NullContext,
    /// A slice was requested beyond the arena's fixed slice size.
    #[error("slice length exceeded: {0} > {1}")]
    CapacityExceeded(usize, usize), // requested, limit
}
