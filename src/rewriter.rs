//! TileRewriter: rebuild a tile's schema and backing buffer around the
//! per-column compression decisions, and repopulate every row.
//!
//! Follows the same evict/release-before-acquire discipline a buffer pool
//! manager uses when swapping a page's frame, applied here to a whole
//! tile's buffer instead of one page: the old buffer is released before the
//! new one is requested (see `Tile::reallocate_for`), so the tile is never
//! observably holding two buffers at once.

use std::collections::HashMap;

use tracing::info;

use crate::descriptor::ColumnDescriptor;
use crate::error::Result;
use crate::schema::{Column, Schema};
use crate::tile::Tile;
use crate::value::Value;

/// Per-column stored values to write into the rewritten tile: `None` for a
/// passthrough column (its original bytes are copied verbatim), `Some` for
/// a narrowed or dictionary-encoded column.
pub type StoredColumns = Vec<Option<Vec<Value>>>;

/// Rebuild `tile`'s schema and buffer according to `descriptors`, writing
/// `stored` in place of each compressed column's original values. Returns
/// the `offset -> column` reverse map built from the new schema.
///
/// Preconditions: at least one entry in `descriptors` is not
/// [`ColumnDescriptor::Passthrough`] (checked by the caller, which skips the
/// rewrite entirely otherwise).
pub fn rewrite(
    tile: &mut Tile,
    descriptors: &[ColumnDescriptor],
    stored: &StoredColumns,
) -> Result<HashMap<usize, usize>> {
    let row_count = tile.get_allocated_tuple_count();
    let num_slots = tile.num_tuple_slots();
    let old_schema = tile.schema().clone();

    // Snapshot passthrough columns' raw bytes before the old buffer is
    // released; a passthrough column keeps its original type and width, so
    // a verbatim byte copy is enough — no need to decode through `Value`.
    // Everything else comes from `stored`.
    let mut passthrough_bytes: Vec<Option<Vec<Box<[u8]>>>> = vec![None; old_schema.num_columns()];
    for (col, descriptor) in descriptors.iter().enumerate() {
        if descriptor.is_passthrough() {
            let off = old_schema.get_offset(col);
            let len = old_schema.column(col).length;
            let mut rows = Vec::with_capacity(row_count);
            for row in 0..row_count {
                rows.push(tile.raw_slice(row, off, len).to_vec().into_boxed_slice());
            }
            passthrough_bytes[col] = Some(rows);
        }
    }

    // Step 1: build the new schema, substituting compressed columns.
    let new_columns: Vec<Column> = old_schema
        .columns()
        .iter()
        .enumerate()
        .map(|(col, original)| match &descriptors[col] {
            ColumnDescriptor::Passthrough => original.clone(),
            ColumnDescriptor::NumericDelta { compressed_type, .. } => {
                Column::fixed(original.name.clone(), *compressed_type)
            }
            ColumnDescriptor::Dictionary { code_type, .. } => {
                Column::fixed(original.name.clone(), *code_type)
            }
        })
        .collect();
    let new_schema = Schema::new(new_columns);

    info!(
        old_tuple_length = old_schema.get_length(),
        new_tuple_length = new_schema.get_length(),
        row_count,
        "rewriting tile layout"
    );

    // Steps 2-4: release the old buffer and allocate the new one, zeroed.
    tile.reallocate_for(new_schema.clone(), num_slots)?;

    // Step 5: repopulate by column.
    for col in 0..new_schema.num_columns() {
        let off = new_schema.get_offset(col);
        let len = new_schema.column(col).length;
        match &descriptors[col] {
            ColumnDescriptor::Passthrough => {
                let rows = passthrough_bytes[col].take().expect("snapshotted above");
                for (row, bytes) in rows.into_iter().enumerate() {
                    tile.raw_slice_mut(row, off, len).copy_from_slice(&bytes);
                }
            }
            ColumnDescriptor::NumericDelta { .. } | ColumnDescriptor::Dictionary { .. } => {
                let values = stored[col].as_ref().expect("compressed column must have stored values");
                for (row, value) in values.iter().enumerate() {
                    tile.set_value_fast(value, row, off, len)?;
                }
            }
        }
    }

    // Step 6: build offset_to_column from the final schema.
    let mut offset_to_column = HashMap::with_capacity(new_schema.num_columns());
    for col in 0..new_schema.num_columns() {
        offset_to_column.insert(new_schema.get_offset(col), col);
    }

    Ok(offset_to_column)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::allocator::{BackendType, HeapAllocator};
    use crate::value::TypeId;

    fn tile_with_two_int_columns(rows: &[(i32, i32)]) -> Tile {
        let schema = Schema::new(vec![
            Column::fixed("id", TypeId::Integer),
            Column::fixed("year", TypeId::Integer),
        ]);
        let mut tile = Tile::new(schema, rows.len(), BackendType::Heap, Box::new(HeapAllocator::new())).unwrap();
        for (i, (a, b)) in rows.iter().enumerate() {
            tile.insert_tuple(i, &[Value::Integer(*a), Value::Integer(*b)]).unwrap();
        }
        tile
    }

    #[test]
    fn rewrite_narrows_both_columns_and_preserves_values() {
        let rows: Vec<(i32, i32)> = (0..25).map(|i| (i, i * 10)).collect();
        let mut tile = tile_with_two_int_columns(&rows);

        let id_base = Value::Integer(12);
        let id_stored: Vec<Value> = rows
            .iter()
            .map(|(a, _)| Value::TinyInt((*a - 12) as i8))
            .collect();
        let year_base = Value::Integer(120);
        let year_stored: Vec<Value> = rows
            .iter()
            .map(|(_, b)| Value::TinyInt((*b - 120) as i8))
            .collect();

        let descriptors = vec![
            ColumnDescriptor::numeric_delta(id_base.clone(), TypeId::TinyInt),
            ColumnDescriptor::numeric_delta(year_base.clone(), TypeId::TinyInt),
        ];
        let stored = vec![Some(id_stored), Some(year_stored)];

        let offset_to_column = rewrite(&mut tile, &descriptors, &stored).unwrap();

        assert_eq!(tile.tuple_length(), 2);
        assert_eq!(offset_to_column.len(), 2);
        assert_eq!(offset_to_column[&0], 0);
        assert_eq!(offset_to_column[&1], 1);

        for (row, (a, _b)) in rows.iter().enumerate() {
            let raw = tile.get_value(row, 0).unwrap();
            assert_eq!(raw, Value::TinyInt((*a - 12) as i8));
        }
    }

    #[test]
    fn rewrite_keeps_passthrough_column_intact() {
        let rows: Vec<(i32, i32)> = vec![(1, 100), (2, 200), (3, 300)];
        let mut tile = tile_with_two_int_columns(&rows);

        let descriptors = vec![
            ColumnDescriptor::Passthrough,
            ColumnDescriptor::numeric_delta(Value::Integer(200), TypeId::TinyInt),
        ];
        let stored = vec![
            None,
            Some(vec![Value::TinyInt(-100), Value::TinyInt(0), Value::TinyInt(100)]),
        ];

        rewrite(&mut tile, &descriptors, &stored).unwrap();

        assert_eq!(tile.get_value(0, 0).unwrap(), Value::Integer(1));
        assert_eq!(tile.get_value(1, 0).unwrap(), Value::Integer(2));
        assert_eq!(tile.get_value(2, 0).unwrap(), Value::Integer(3));
    }
}
