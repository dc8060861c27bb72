//! DictionaryEncoder: for a `Varchar` column, build the sorted set of
//! unique values and replace each row with its index into that set.
//!
//! Follows the same spirit as an overflow-pointer scheme — a column's wide
//! payload is replaced with a narrow indirection — but the indirection
//! here is a dictionary index rather than a page pointer, and resolution
//! never leaves the tile.

use crate::error::{CompressError, Result};
use crate::value::{TypeId, Value};

/// Result of a successful dictionary encode: the sorted unique entries and
/// the per-row codes (in input order), plus the integer type the codes are
/// stored under.
#[derive(Debug, Clone)]
pub struct DictionaryResult {
    pub entries: Vec<Value>,
    pub codes: Vec<Value>,
    pub code_type: TypeId,
}

fn value_cmp(a: &Value, b: &Value) -> std::cmp::Ordering {
    if a.compare_less_than(b) {
        std::cmp::Ordering::Less
    } else if b.compare_less_than(a) {
        std::cmp::Ordering::Greater
    } else {
        std::cmp::Ordering::Equal
    }
}

/// Narrowest integer type whose non-negative range can index `len` entries,
/// capped at `max_code_bits` of width.
fn narrowest_code_type(len: usize, max_code_bits: u32) -> Result<TypeId> {
    let candidates = [TypeId::TinyInt, TypeId::SmallInt, TypeId::Integer, TypeId::BigInt];
    let max_index = len.saturating_sub(1) as i128;
    for t in candidates {
        let width_bits = (t.fixed_width().unwrap() * 8) as u32;
        if width_bits > max_code_bits {
            continue;
        }
        let hi = match t {
            TypeId::TinyInt => i8::MAX as i128,
            TypeId::SmallInt => i16::MAX as i128,
            TypeId::Integer => i32::MAX as i128,
            TypeId::BigInt => i64::MAX as i128,
            TypeId::Varchar => unreachable!(),
        };
        if max_index <= hi {
            return Ok(t);
        }
    }
    Err(CompressError::NotCompressible)
}

/// Build the dictionary and code column for `values`. `max_code_bits` bounds
/// how wide a code column this encoder may choose (see
/// [`crate::config::CompressionConfig::max_dictionary_code_bits`]).
pub fn encode(values: &[Value], max_code_bits: u32) -> Result<DictionaryResult> {
    if values.is_empty() {
        return Err(CompressError::NotCompressible);
    }

    let mut entries = values.to_vec();
    entries.sort_by(value_cmp);
    entries.dedup_by(|a, b| value_cmp(a, b) == std::cmp::Ordering::Equal);

    let code_type = narrowest_code_type(entries.len(), max_code_bits)?;

    let mut codes = Vec::with_capacity(values.len());
    for v in values {
        let idx = entries
            .binary_search_by(|probe| value_cmp(probe, v))
            .expect("value must be present in its own dictionary");
        codes.push(Value::BigInt(idx as i64).cast_as(code_type)?);
    }

    Ok(DictionaryResult { entries, codes, code_type })
}

/// Decode `code` back to its logical value via the dictionary. `code` must
/// be a valid index, per invariant 4 — out-of-range indices are a bug in
/// the caller (a torn or corrupted descriptor), not a recoverable input.
pub fn decode(entries: &[Value], code: i64) -> Value {
    entries[code as usize].clone()
}
