//! CompressedTile: the public capability this crate exposes. Wraps an owned
//! [`Tile`] plus per-column compression descriptors; intercepts reads to
//! materialise logical values and refuses writes to narrowed or
//! dictionary-encoded columns once sealed.
//!
//! A C++ storage layer would express "a subtype whose reads are
//! intercepted" through inheritance (`CompressedTile : Tile`); here it's a
//! thin wrapper holding an owned `Tile` as a field, not a supertype —
//! mutations route through this wrapper's policy check before ever
//! reaching the inner `Tile`.

use std::collections::HashMap;

use tracing::{info_span, warn};

use crate::analyzer;
use crate::compressor;
use crate::config::CompressionConfig;
use crate::descriptor::ColumnDescriptor;
use crate::dictionary;
use crate::error::{CompressError, Result};
use crate::rewriter::{self, StoredColumns};
use crate::schema::Schema;
use crate::tile::Tile;
use crate::value::{TypeId, Value};

/// `Empty`/`Populated`/`Sealed` state machine. `Empty` and `Populated` are not
/// distinguished in this representation (an empty tile is just a
/// `Populated` one with zero allocated rows); `is_sealed` alone carries the
/// terminal transition.
pub struct CompressedTile {
    tile: Tile,
    is_sealed: bool,
    /// The column's type at construction time, before any narrowing. Kept
    /// separately from `tile.schema()` because that schema is replaced by
    /// the narrowed one on seal, but `get_value`'s contract is to keep
    /// returning the *original* type id.
    original_schema: Schema,
    descriptors: Vec<ColumnDescriptor>,
    offset_to_column: HashMap<usize, usize>,
    config: CompressionConfig,
}

impl CompressedTile {
    pub fn new(tile: Tile, config: CompressionConfig) -> Self {
        let original_schema = tile.schema().clone();
        let n = original_schema.num_columns();
        CompressedTile {
            tile,
            is_sealed: false,
            original_schema,
            descriptors: vec![ColumnDescriptor::Passthrough; n],
            offset_to_column: HashMap::new(),
            config,
        }
    }

    pub fn is_sealed(&self) -> bool {
        self.is_sealed
    }

    pub fn is_usable(&self) -> bool {
        self.tile.is_usable()
    }

    /// The column shapes as originally declared, independent of any
    /// narrowing applied by `compress()`.
    pub fn schema(&self) -> &Schema {
        &self.original_schema
    }

    pub fn get_allocated_tuple_count(&self) -> usize {
        self.tile.get_allocated_tuple_count()
    }

    // -- read path ------------------------------------------------------

    pub fn get_value(&self, row: usize, col: usize) -> Result<Value> {
        let raw = self.tile.get_value(row, col)?;
        if !self.is_sealed {
            return Ok(raw);
        }
        self.materialize(col, raw)
    }

    pub fn get_value_fast(&self, row: usize, off: usize, type_id: TypeId, len: usize) -> Result<Value> {
        if !self.is_sealed {
            return self.tile.get_value_fast(row, off, type_id, len);
        }
        let col = *self
            .offset_to_column
            .get(&off)
            .ok_or(CompressError::UnknownColumnOffset { offset: off })?;
        let raw = self.tile.get_value(row, col)?;
        self.materialize(col, raw)
    }

    fn materialize(&self, col: usize, raw: Value) -> Result<Value> {
        match &self.descriptors[col] {
            ColumnDescriptor::Passthrough => Ok(raw),
            ColumnDescriptor::NumericDelta { base, .. } => base.add(&raw),
            ColumnDescriptor::Dictionary { entries, .. } => {
                let idx = match raw {
                    Value::TinyInt(c) => c as i64,
                    Value::SmallInt(c) => c as i64,
                    Value::Integer(c) => c as i64,
                    Value::BigInt(c) => c,
                    Value::Varchar(_) => {
                        debug_assert!(false, "dictionary code column must be numeric");
                        return Err(CompressError::UnknownColumnOffset { offset: col });
                    }
                };
                Ok(dictionary::decode(entries, idx))
            }
        }
    }

    // -- write path -------------------------------------------------------

    pub fn insert_tuple(&mut self, row: usize, tuple: &[Value]) -> Result<()> {
        if self.is_sealed {
            let column = self
                .descriptors
                .iter()
                .position(|d| !d.is_passthrough())
                .unwrap_or(0);
            warn!(row, column, "insert_tuple refused: tile is sealed");
            return Err(CompressError::WriteToSealed { column });
        }
        self.tile.insert_tuple(row, tuple)
    }

    pub fn set_value(&mut self, value: &Value, row: usize, col: usize) -> Result<()> {
        if self.is_sealed && !self.descriptors[col].is_passthrough() {
            warn!(row, col, "set_value refused: column is sealed");
            return Err(CompressError::WriteToSealed { column: col });
        }
        self.tile.set_value(value, row, col)
    }

    pub fn set_value_fast(&mut self, value: &Value, row: usize, off: usize, len: usize) -> Result<()> {
        if !self.is_sealed {
            return self.tile.set_value_fast(value, row, off, len);
        }
        let col = *self
            .offset_to_column
            .get(&off)
            .ok_or(CompressError::UnknownColumnOffset { offset: off })?;
        if !self.descriptors[col].is_passthrough() {
            warn!(row, col, "set_value_fast refused: column is sealed");
            return Err(CompressError::WriteToSealed { column: col });
        }
        self.tile.set_value_fast(value, row, off, len)
    }

    // -- compression ------------------------------------------------------

    /// Analyze and narrow every column, then rewrite the tile's physical
    /// layout. A no-op if the tile is already sealed (idempotent, per the
    /// Open Question resolution recorded in DESIGN.md). If no column turns
    /// out to be profitably compressible, the tile stays unsealed.
    pub fn compress(&mut self) -> Result<()> {
        if self.is_sealed {
            return Ok(());
        }

        let n = self.original_schema.num_columns();
        let row_count = self.tile.get_allocated_tuple_count();
        let _span = info_span!("compress", column_count = n, row_count).entered();

        if row_count < self.config.min_rows_to_attempt {
            return Ok(());
        }

        let mut descriptors = vec![ColumnDescriptor::Passthrough; n];
        let mut stored: StoredColumns = vec![None; n];
        let mut any_compressed = false;

        for col in 0..n {
            let source_type = self.original_schema.column(col).type_id;
            let mut values = Vec::with_capacity(row_count);
            for row in 0..row_count {
                values.push(self.tile.get_value(row, col)?);
            }

            if source_type == TypeId::Varchar {
                match dictionary::encode(&values, self.config.max_dictionary_code_bits) {
                    Ok(result) => {
                        descriptors[col] = ColumnDescriptor::Dictionary {
                            entries: result.entries,
                            code_type: result.code_type,
                        };
                        stored[col] = Some(result.codes);
                        any_compressed = true;
                    }
                    Err(CompressError::NotCompressible) => {
                        tracing::debug!(col, "column not dictionary-compressible");
                    }
                    Err(e) => return Err(e),
                }
                continue;
            }

            match analyzer::analyze(&values, source_type) {
                Ok(range) => {
                    match compressor::compress_column(&values, &range.base, range.target_type, source_type) {
                        Ok((materialized, final_type)) => {
                            descriptors[col] = ColumnDescriptor::numeric_delta(range.base, final_type);
                            stored[col] = Some(materialized);
                            any_compressed = true;
                        }
                        Err(CompressError::NotCompressible) => {
                            tracing::debug!(col, "column narrowing materialisation exhausted");
                        }
                        Err(e) => return Err(e),
                    }
                }
                Err(CompressError::NotCompressible) => {
                    tracing::debug!(col, "column not narrowable");
                }
                Err(e) => return Err(e),
            }
        }

        if !any_compressed {
            return Ok(());
        }

        let offset_to_column = rewriter::rewrite(&mut self.tile, &descriptors, &stored)?;
        self.descriptors = descriptors;
        self.offset_to_column = offset_to_column;
        self.is_sealed = true;
        Ok(())
    }

    // -- introspection used by tests and predicate pushdown ---------------

    pub fn base_value(&self, col: usize) -> Option<&Value> {
        match &self.descriptors[col] {
            ColumnDescriptor::NumericDelta { base, .. } => Some(base),
            _ => None,
        }
    }

    pub fn compressed_type(&self, col: usize) -> Option<TypeId> {
        match &self.descriptors[col] {
            ColumnDescriptor::NumericDelta { compressed_type, .. } => Some(*compressed_type),
            ColumnDescriptor::Dictionary { code_type, .. } => Some(*code_type),
            ColumnDescriptor::Passthrough => None,
        }
    }

    pub fn dictionary_entries(&self, col: usize) -> Option<&[Value]> {
        match &self.descriptors[col] {
            ColumnDescriptor::Dictionary { entries, .. } => Some(entries),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::allocator::{BackendType, HeapAllocator};
    use crate::schema::Column;

    fn make_tile(columns: Vec<Column>, rows: usize) -> Tile {
        Tile::new(
            Schema::new(columns),
            rows,
            BackendType::Heap,
            Box::new(HeapAllocator::new()),
        )
        .unwrap()
    }

    fn two_int_columns_scenario(n: usize) -> CompressedTile {
        let tile = make_tile(
            vec![
                Column::fixed("id", TypeId::Integer),
                Column::fixed("year", TypeId::Integer),
            ],
            n,
        );
        let mut ct = CompressedTile::new(tile, CompressionConfig::default_config());
        for i in 0..n {
            ct.insert_tuple(i, &[Value::Integer(i as i32), Value::Integer(i as i32 * 10)])
                .unwrap();
        }
        ct
    }

    // Integer narrowing fits TINYINT.
    #[test]
    fn scenario_integer_narrowing_fits_tinyint() {
        let mut ct = two_int_columns_scenario(25);
        ct.compress().unwrap();
        assert!(ct.is_sealed());
        assert_eq!(ct.compressed_type(0), Some(TypeId::TinyInt));
        assert_eq!(ct.base_value(0), Some(&Value::Integer(12)));
        assert_eq!(ct.compressed_type(1), Some(TypeId::TinyInt));
        assert_eq!(ct.base_value(1), Some(&Value::Integer(120)));
        for i in 0..25 {
            assert_eq!(ct.get_value(i, 0).unwrap(), Value::Integer(i as i32));
            assert_eq!(ct.get_value(i, 1).unwrap(), Value::Integer(i as i32 * 10));
        }
    }

    // Overflow-driven escalation.
    #[test]
    fn scenario_overflow_escalation_to_smallint() {
        let mut ct = two_int_columns_scenario(2500);
        ct.compress().unwrap();
        assert_eq!(ct.compressed_type(1), Some(TypeId::SmallInt));
        for i in (0..2500).step_by(137) {
            assert_eq!(ct.get_value(i, 1).unwrap(), Value::Integer(i as i32 * 10));
        }
    }

    // Single-row extreme-value column still narrows and round-trips.
    #[test]
    fn scenario_single_row_extreme_value_still_narrows() {
        let tile = make_tile(vec![Column::fixed("v", TypeId::Integer)], 1);
        let mut ct = CompressedTile::new(tile, CompressionConfig::default_config());
        ct.insert_tuple(0, &[Value::Integer(i32::MAX)]).unwrap();
        ct.compress().unwrap();
        assert!(ct.is_sealed());
        assert_eq!(ct.compressed_type(0), Some(TypeId::TinyInt));
        assert_eq!(ct.get_value(0, 0).unwrap(), Value::Integer(i32::MAX));
    }

    // String dictionary.
    #[test]
    fn scenario_string_dictionary() {
        let tile = make_tile(vec![Column::varchar("label", 8)], 1000);
        let mut ct = CompressedTile::new(tile, CompressionConfig::default_config());
        let choices = ["A", "B", "C"];
        for i in 0..1000 {
            ct.insert_tuple(i, &[Value::Varchar(choices[i % 3].to_string())]).unwrap();
        }
        ct.compress().unwrap();
        assert!(ct.is_sealed());
        let entries = ct.dictionary_entries(0).unwrap();
        assert_eq!(
            entries,
            &[
                Value::Varchar("A".into()),
                Value::Varchar("B".into()),
                Value::Varchar("C".into())
            ]
        );
        for i in 0..1000 {
            assert_eq!(
                ct.get_value(i, 0).unwrap(),
                Value::Varchar(choices[i % 3].to_string())
            );
        }
    }

    // Write refusal after sealing.
    #[test]
    fn scenario_write_refusal_after_seal() {
        let mut ct = two_int_columns_scenario(25);
        ct.compress().unwrap();
        let before = ct.get_value(3, 0).unwrap();
        let err = ct.set_value(&Value::Integer(42), 3, 0).unwrap_err();
        assert_eq!(err, CompressError::WriteToSealed { column: 0 });
        assert_eq!(ct.get_value(3, 0).unwrap(), before);
    }

    #[test]
    fn passthrough_column_remains_writable_after_seal() {
        // A column whose values defeat narrowing (extreme spread across a
        // BigInt source) stays Passthrough even after compress() succeeds
        // on its sibling, stays writable.
        let tile = make_tile(
            vec![
                Column::fixed("narrow_me", TypeId::Integer),
                Column::fixed("wide_spread", TypeId::BigInt),
            ],
            2,
        );
        let mut ct = CompressedTile::new(tile, CompressionConfig::default_config());
        ct.insert_tuple(0, &[Value::Integer(1), Value::BigInt(i64::MIN)]).unwrap();
        ct.insert_tuple(1, &[Value::Integer(2), Value::BigInt(i64::MAX)]).unwrap();
        ct.compress().unwrap();
        assert!(ct.is_sealed());
        assert_eq!(ct.compressed_type(1), None);
        ct.set_value(&Value::BigInt(7), 0, 1).unwrap();
        assert_eq!(ct.get_value(0, 1).unwrap(), Value::BigInt(7));
    }

    #[test]
    fn insert_tuple_refused_when_sealed() {
        let mut ct = two_int_columns_scenario(5);
        ct.compress().unwrap();
        let err = ct.insert_tuple(5, &[Value::Integer(1), Value::Integer(2)]).unwrap_err();
        assert!(matches!(err, CompressError::WriteToSealed { .. }));
    }

    #[test]
    fn compress_is_idempotent_no_op_when_called_twice() {
        let mut ct = two_int_columns_scenario(10);
        ct.compress().unwrap();
        let before = (0..10).map(|i| ct.get_value(i, 0).unwrap()).collect::<Vec<_>>();
        ct.compress().unwrap();
        let after = (0..10).map(|i| ct.get_value(i, 0).unwrap()).collect::<Vec<_>>();
        assert_eq!(before, after);
        assert!(ct.is_sealed());
    }

    #[test]
    fn repeated_reads_are_idempotent() {
        let mut ct = two_int_columns_scenario(25);
        ct.compress().unwrap();
        let first = ct.get_value(10, 1).unwrap();
        for _ in 0..10 {
            assert_eq!(ct.get_value(10, 1).unwrap(), first);
        }
    }

    #[test]
    fn get_value_fast_matches_get_value_after_seal() {
        let mut ct = two_int_columns_scenario(25);
        ct.compress().unwrap();
        // After narrowing every column to TinyInt the rewritten schema's
        // offsets are 0 and 1.
        let fast = ct.get_value_fast(4, 1, TypeId::TinyInt, 1).unwrap();
        assert_eq!(fast, ct.get_value(4, 1).unwrap());
    }

    #[test]
    fn unknown_offset_is_rejected() {
        let mut ct = two_int_columns_scenario(25);
        ct.compress().unwrap();
        let err = ct.get_value_fast(0, 99, TypeId::TinyInt, 1).unwrap_err();
        assert_eq!(err, CompressError::UnknownColumnOffset { offset: 99 });
    }

    #[test]
    fn not_compressible_tile_never_seals() {
        let tile = make_tile(vec![Column::fixed("v", TypeId::BigInt)], 2);
        let mut ct = CompressedTile::new(tile, CompressionConfig::default_config());
        ct.insert_tuple(0, &[Value::BigInt(i64::MIN)]).unwrap();
        ct.insert_tuple(1, &[Value::BigInt(i64::MAX)]).unwrap();
        ct.compress().unwrap();
        assert!(!ct.is_sealed());
        // Still mutable and still readable as a plain tile.
        ct.set_value(&Value::BigInt(5), 0, 0).unwrap();
        assert_eq!(ct.get_value(0, 0).unwrap(), Value::BigInt(5));
    }

    // Narrowing is observable in storage width.
    #[test]
    fn narrowed_column_storage_width_matches_compressed_type() {
        let mut ct = two_int_columns_scenario(25);
        ct.compress().unwrap();
        assert_eq!(ct.tile.tuple_length(), 2); // two TinyInt columns, 1 byte each
    }

    // Base centrality.
    #[test]
    fn base_splits_rows_almost_evenly() {
        let mut ct = two_int_columns_scenario(25);
        ct.compress().unwrap();
        let base = ct.base_value(0).unwrap().clone();
        let (mut below, mut above) = (0, 0);
        for i in 0..25 {
            let v = Value::Integer(i as i32);
            if v.compare_less_than(&base) {
                below += 1;
            } else if base.compare_less_than(&v) {
                above += 1;
            }
        }
        assert!((below as i64 - above as i64).abs() <= 1);
    }
}
