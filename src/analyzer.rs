//! RangeAnalyzer: for a numeric column, choose a base value and the
//! narrowest integer type that represents every row's delta from that base.
//!
//! The escalation loop follows a common try-cheap-then-retry-expensive
//! shape: every cast here returns a `Result` the loop inspects, rather
//! than throwing and catching across the escalation boundary.

use tracing::debug;

use crate::error::{CompressError, Result};
use crate::value::{TypeId, Value};

/// Outcome of a successful analysis: the value every row's delta is taken
/// against, and the narrowest type that holds every delta.
#[derive(Debug, Clone, PartialEq)]
pub struct RangeResult {
    pub base: Value,
    pub target_type: TypeId,
}

fn rank(type_id: TypeId) -> u8 {
    match type_id {
        TypeId::TinyInt => 0,
        TypeId::SmallInt => 1,
        TypeId::Integer => 2,
        TypeId::BigInt => 3,
        TypeId::Varchar => u8::MAX,
    }
}

fn sorted_by_value(values: &[Value]) -> Vec<Value> {
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| {
        if a.compare_less_than(b) {
            std::cmp::Ordering::Less
        } else if b.compare_less_than(a) {
            std::cmp::Ordering::Greater
        } else {
            std::cmp::Ordering::Equal
        }
    });
    sorted
}

/// Analyze `values` (the column's logical values, in insertion order) for
/// `source_type` and return a `(base, target_type)` pair, or
/// [`CompressError::NotCompressible`] if no narrower type fits.
pub fn analyze(values: &[Value], source_type: TypeId) -> Result<RangeResult> {
    if values.is_empty() {
        return Err(CompressError::NotCompressible);
    }
    // TinyInt is already the narrowest representable integer; there is
    // nothing strictly narrower to escalate from.
    if rank(source_type) == 0 {
        return Err(CompressError::NotCompressible);
    }

    let sorted = sorted_by_value(values);
    let base = sorted[sorted.len() / 2].clone();
    let min = sorted.first().unwrap();
    let max = sorted.last().unwrap();

    let mut candidate = TypeId::narrowest_integer();
    loop {
        if rank(candidate) >= rank(source_type) {
            debug!(?source_type, "range analysis exhausted escalation, not compressible");
            return Err(CompressError::NotCompressible);
        }

        let fits = min
            .subtract(&base)
            .and_then(|d| d.cast_as(candidate))
            .is_ok()
            && max
                .subtract(&base)
                .and_then(|d| d.cast_as(candidate))
                .is_ok();

        if fits {
            return Ok(RangeResult { base, target_type: candidate });
        }

        debug!(?candidate, "candidate width overflowed, escalating");
        candidate = candidate
            .widen()
            .expect("candidate rank below source rank always has a wider type");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vals(xs: &[i32]) -> Vec<Value> {
        xs.iter().map(|&x| Value::Integer(x)).collect()
    }

    #[test]
    fn empty_column_fails() {
        assert_eq!(analyze(&[], TypeId::Integer), Err(CompressError::NotCompressible));
    }

    #[test]
    fn tinyint_source_has_no_narrower_target() {
        let values = vec![Value::TinyInt(1), Value::TinyInt(2)];
        assert_eq!(analyze(&values, TypeId::TinyInt), Err(CompressError::NotCompressible));
    }

    #[test]
    fn fits_tinyint_with_small_spread() {
        let values: Vec<Value> = (0..25).map(|i| Value::Integer(i)).collect();
        let result = analyze(&values, TypeId::Integer).unwrap();
        assert_eq!(result.target_type, TypeId::TinyInt);
        assert_eq!(result.base, Value::Integer(12));
    }

    #[test]
    fn escalates_to_smallint_when_tinyint_overflows() {
        let values: Vec<Value> = (0..2500).map(|i| Value::Integer(i * 10)).collect();
        let result = analyze(&values, TypeId::Integer).unwrap();
        assert_eq!(result.target_type, TypeId::SmallInt);
        // Median index floor(2500/2) = 1250, whose value is 12500.
        assert_eq!(result.base, Value::Integer(12500));
    }

    #[test]
    fn all_equal_picks_narrowest() {
        let values = vals(&[42, 42, 42, 42]);
        let result = analyze(&values, TypeId::Integer).unwrap();
        assert_eq!(result.target_type, TypeId::TinyInt);
        assert_eq!(result.base, Value::Integer(42));
    }

    #[test]
    fn single_row_extreme_value_still_narrows() {
        let values = vec![Value::Integer(i32::MAX)];
        let result = analyze(&values, TypeId::Integer).unwrap();
        assert_eq!(result.target_type, TypeId::TinyInt);
        assert_eq!(result.base, Value::Integer(i32::MAX));
    }

    #[test]
    fn bigint_extreme_spread_not_compressible() {
        let values = vec![Value::BigInt(i64::MIN), Value::BigInt(i64::MAX)];
        assert_eq!(analyze(&values, TypeId::BigInt), Err(CompressError::NotCompressible));
    }
}
