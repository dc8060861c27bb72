//! ColumnCompressor: materialise a numeric column's delta-encoded vector
//! under the type `RangeAnalyzer` chose, escalating once more if an
//! individual element overflows during materialisation.
//!
//! `RangeAnalyzer` only checks the sorted column's min and max; monotonicity
//! of subtraction in the source type means every other element's delta is
//! bounded between those two, so this escalation retry is a defensive
//! second pass rather than the common case.

use tracing::debug;

use crate::error::{CompressError, Result};
use crate::value::{TypeId, Value};

fn rank(type_id: TypeId) -> u8 {
    match type_id {
        TypeId::TinyInt => 0,
        TypeId::SmallInt => 1,
        TypeId::Integer => 2,
        TypeId::BigInt => 3,
        TypeId::Varchar => u8::MAX,
    }
}

/// Materialise `stored[i] = (values[i] - base) cast target_type` for every
/// row, escalating `target_type` if any element overflows. Returns the
/// stored vector and the type it was finally materialised under.
pub fn compress_column(
    values: &[Value],
    base: &Value,
    mut target_type: TypeId,
    source_type: TypeId,
) -> Result<(Vec<Value>, TypeId)> {
    loop {
        let mut stored = Vec::with_capacity(values.len());
        let mut overflowed = false;
        for v in values {
            match v.subtract(base).and_then(|d| d.cast_as(target_type)) {
                Ok(casted) => stored.push(casted),
                Err(_) => {
                    overflowed = true;
                    break;
                }
            }
        }
        if !overflowed {
            return Ok((stored, target_type));
        }

        debug!(?target_type, "materialisation overflowed, escalating");
        target_type = match target_type.widen() {
            Some(next) if rank(next) < rank(source_type) => next,
            _ => return Err(CompressError::NotCompressible),
        };
    }
}
