use thiserror::Error;

/// Crate-wide result alias.
pub type Result<T> = std::result::Result<T, CompressError>;

/// Every fallible outcome this crate's public API can produce.
///
/// `NotCompressible` and `Overflow` are routine control flow inside the
/// analyzer/encoder escalation loops; the rest indicate a caller precondition
/// violation or a fatal allocator condition.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CompressError {
    /// A column's value range cannot be narrowed profitably; the tile stays
    /// in its current (uncompressed) layout for that column.
    #[error("column is not compressible")]
    NotCompressible,

    /// A cast during range analysis or dictionary coding did not fit the
    /// candidate target type. Escalation loops catch this internally; it
    /// only escapes to a caller if escalation is exhausted.
    #[error("value does not fit target type")]
    Overflow,

    /// The allocator could not satisfy a request. Fatal: raised only after
    /// the tile's previous backing buffer has already been released, so the
    /// tile must be treated as unusable once this propagates.
    #[error("allocator failed to satisfy request of {requested_bytes} bytes")]
    AllocatorFailure { requested_bytes: usize },

    /// A mutation was attempted on a sealed tile's narrowed or
    /// dictionary-encoded column.
    #[error("column {column} is sealed and cannot be written")]
    WriteToSealed { column: usize },

    /// A `_fast` accessor presented a byte offset with no entry in the
    /// rewritten schema's offset table.
    #[error("no column registered at byte offset {offset}")]
    UnknownColumnOffset { offset: usize },

    /// `compress()` was invoked a second time on an already-sealed tile.
    /// Unused by the default (idempotent no-op) policy; kept for callers
    /// that opt into strict single-shot semantics.
    #[error("tile is already sealed")]
    AlreadySealed,
}
