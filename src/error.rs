//! Error types for fallible collection operations.

use thiserror::Error;

/// The error type returned by fallible collection operations.
///
/// Every variant represents a programming error at the call site: the
/// operation is aborted, the collection it was called on is left valid and
/// unchanged, and the caller is expected to fix the offending call. There is
/// no retry or recovery path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum Error {
    /// An index was outside the valid range of a [`List`](crate::List).
    #[error("index {index} out of bounds for list of length {len}")]
    IndexOutOfRange {
        /// The offending index.
        index: usize,
        /// The length of the list at the time of the call.
        len: usize,
    },

    /// A slice range had `start > end`.
    #[error("invalid slice range [{start}..{end}]")]
    InvalidSlice {
        /// The requested start bound (inclusive).
        start: usize,
        /// The requested end bound (exclusive).
        end: usize,
    },
}
