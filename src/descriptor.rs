//! Per-column compression descriptor.
//!
//! Collapses what would otherwise be four parallel maps
//! (`compressed_column_map`, `exponent_column_map`, `dictionary_map`, plus
//! the type/base pair) into a single enum keyed by column id: each invariant
//! about a compressed column becomes local to one match arm instead of
//! spread across maps that can individually go stale.

use crate::value::{TypeId, Value};

/// How a single column's rows are physically stored after `compress()`.
#[derive(Debug, Clone, PartialEq)]
pub enum ColumnDescriptor {
    /// Column was not narrowed or dictionary-encoded; stored verbatim.
    Passthrough,
    /// Numeric column narrowed to `compressed_type`; every stored value is
    /// `original - base`. `scale` is reserved for a future decimal
    /// scaled-integer representation and is never populated today.
    NumericDelta {
        base: Value,
        compressed_type: TypeId,
        scale: Option<i32>,
    },
    /// String column replaced by indices into `entries`. `code_type` is the
    /// narrowest integer type the stored indices were cast to; it is
    /// redundant with the rewritten schema's column width but kept here too
    /// so the descriptor alone is enough to materialise a read.
    Dictionary { entries: Vec<Value>, code_type: TypeId },
}

impl ColumnDescriptor {
    pub fn numeric_delta(base: Value, compressed_type: TypeId) -> Self {
        ColumnDescriptor::NumericDelta { base, compressed_type, scale: None }
    }

    pub fn is_passthrough(&self) -> bool {
        matches!(self, ColumnDescriptor::Passthrough)
    }
}
