//! Typed scalars and the arithmetic/cast capability the compression layer
//! needs: comparison, subtraction, addition, and cast-with-overflow-signal.
//!
//! Integer types form a widening chain `TinyInt < SmallInt < Integer <
//! BigInt`; `Varchar` never participates in numeric narrowing and is only
//! ever compared or dictionary-coded.

use crate::error::{CompressError, Result};

/// Discriminant for a [`Value`]'s logical type, independent of its current
/// physical (possibly narrowed) storage width.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TypeId {
    TinyInt,
    SmallInt,
    Integer,
    BigInt,
    Varchar,
}

impl TypeId {
    /// Fixed storage width in bytes, or `None` for the variable-length
    /// `Varchar` type.
    pub fn fixed_width(self) -> Option<usize> {
        match self {
            TypeId::TinyInt => Some(1),
            TypeId::SmallInt => Some(2),
            TypeId::Integer => Some(4),
            TypeId::BigInt => Some(8),
            TypeId::Varchar => None,
        }
    }

    /// The next wider integer type, or `None` once `BigInt` is reached.
    pub fn widen(self) -> Option<TypeId> {
        match self {
            TypeId::TinyInt => Some(TypeId::SmallInt),
            TypeId::SmallInt => Some(TypeId::Integer),
            TypeId::Integer => Some(TypeId::BigInt),
            TypeId::BigInt => None,
            TypeId::Varchar => None,
        }
    }

    /// The narrowest integer type strictly narrower than `self`'s source
    /// role when used as the starting point of an escalation loop.
    pub fn narrowest_integer() -> TypeId {
        TypeId::TinyInt
    }

    pub fn is_integer(self) -> bool {
        !matches!(self, TypeId::Varchar)
    }

    fn bounds(self) -> (i64, i64) {
        match self {
            TypeId::TinyInt => (i8::MIN as i64, i8::MAX as i64),
            TypeId::SmallInt => (i16::MIN as i64, i16::MAX as i64),
            TypeId::Integer => (i32::MIN as i64, i32::MAX as i64),
            TypeId::BigInt => (i64::MIN, i64::MAX),
            TypeId::Varchar => (0, 0),
        }
    }
}

/// A discriminated scalar. Numeric variants always carry their value widened
/// to the variant's native Rust integer type; `Varchar` carries an owned
/// `String` so dictionary encoding can consume it without re-allocating per
/// comparison.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    TinyInt(i8),
    SmallInt(i16),
    Integer(i32),
    BigInt(i64),
    Varchar(String),
}

impl Value {
    pub fn type_id(&self) -> TypeId {
        match self {
            Value::TinyInt(_) => TypeId::TinyInt,
            Value::SmallInt(_) => TypeId::SmallInt,
            Value::Integer(_) => TypeId::Integer,
            Value::BigInt(_) => TypeId::BigInt,
            Value::Varchar(_) => TypeId::Varchar,
        }
    }

    /// Widen a numeric value to `i128` for overflow-safe arithmetic.
    /// Callers must only invoke this on numeric variants.
    fn as_i128(&self) -> i128 {
        match self {
            Value::TinyInt(v) => *v as i128,
            Value::SmallInt(v) => *v as i128,
            Value::Integer(v) => *v as i128,
            Value::BigInt(v) => *v as i128,
            Value::Varchar(_) => {
                debug_assert!(false, "Varchar has no numeric representation");
                0
            }
        }
    }

    /// Typed less-than. Both operands must share a type id; this is a
    /// column-homogeneity precondition enforced by the caller, not a
    /// recoverable error.
    pub fn compare_less_than(&self, other: &Value) -> bool {
        debug_assert_eq!(
            self.type_id(),
            other.type_id(),
            "compare_less_than across mismatched types"
        );
        match (self, other) {
            (Value::Varchar(a), Value::Varchar(b)) => a < b,
            _ => self.as_i128() < other.as_i128(),
        }
    }

    /// Compute `self - other`, both assumed the same numeric type. The
    /// result is returned as a `BigInt` carrying the widened delta; if the
    /// difference does not fit `i64` this is itself an overflow (an extreme
    /// spread relative to a `BigInt`-typed column), reported the same way a
    /// failed cast would be.
    pub fn subtract(&self, other: &Value) -> Result<Value> {
        debug_assert_eq!(self.type_id(), other.type_id(), "subtract type mismatch");
        let delta = self.as_i128() - other.as_i128();
        i64::try_from(delta)
            .map(Value::BigInt)
            .map_err(|_| CompressError::Overflow)
    }

    /// Reconstruct a logical value of `self`'s type from a base value and a
    /// narrower stored delta: `self + delta`. Used on the read path to
    /// materialise `base_value + stored(r,c)`.
    pub fn add(&self, delta: &Value) -> Result<Value> {
        let sum = self.as_i128() + delta.as_i128();
        Value::from_i128_as(sum, self.type_id())
    }

    /// Cast a numeric value to `target`, failing with [`CompressError::Overflow`]
    /// if `target` cannot represent the magnitude.
    pub fn cast_as(&self, target: TypeId) -> Result<Value> {
        if let Value::Varchar(_) = self {
            debug_assert!(false, "cast_as called on Varchar");
            return Err(CompressError::Overflow);
        }
        Value::from_i128_as(self.as_i128(), target)
    }

    fn from_i128_as(v: i128, target: TypeId) -> Result<Value> {
        let (lo, hi) = target.bounds();
        if v < lo as i128 || v > hi as i128 {
            return Err(CompressError::Overflow);
        }
        Ok(match target {
            TypeId::TinyInt => Value::TinyInt(v as i8),
            TypeId::SmallInt => Value::SmallInt(v as i16),
            TypeId::Integer => Value::Integer(v as i32),
            TypeId::BigInt => Value::BigInt(v as i64),
            TypeId::Varchar => unreachable!("numeric cast never targets Varchar"),
        })
    }

    /// Byte width of this value's current physical representation.
    /// `Varchar` has no fixed width; callers needing storage width must
    /// consult the schema's inline/overflow policy instead.
    pub fn inline_width(&self) -> Option<usize> {
        self.type_id().fixed_width()
    }
}
