//! Fixed-slot column store: a contiguous byte buffer of `num_tuple_slots *
//! tuple_length` bytes, addressed row-major by `(row, column)` or directly
//! by `(row, offset, type)`.
//!
//! Uses the same little-endian `read_u*`/`write_u*` helper style a
//! slotted-page module would, but there is no slot array and no
//! free-space bookkeeping here — every row occupies a fixed
//! `tuple_length`-byte slot, so there is nothing to compact and no
//! tombstones. `Varchar` columns stay inline behind a `u16` length prefix
//! (see `schema::Column::varchar`); this crate never spills values out to
//! an overflow pool.

use crate::allocator::{BackendType, StorageManager};
use crate::error::{CompressError, Result};
use crate::schema::Schema;
use crate::value::{TypeId, Value};

fn read_i8(buf: &[u8], off: usize) -> i8 {
    buf[off] as i8
}

fn write_i8(buf: &mut [u8], off: usize, val: i8) {
    buf[off] = val as u8;
}

fn read_i16(buf: &[u8], off: usize) -> i16 {
    i16::from_le_bytes([buf[off], buf[off + 1]])
}

fn write_i16(buf: &mut [u8], off: usize, val: i16) {
    buf[off..off + 2].copy_from_slice(&val.to_le_bytes());
}

fn read_i32(buf: &[u8], off: usize) -> i32 {
    i32::from_le_bytes(buf[off..off + 4].try_into().unwrap())
}

fn write_i32(buf: &mut [u8], off: usize, val: i32) {
    buf[off..off + 4].copy_from_slice(&val.to_le_bytes());
}

fn read_i64(buf: &[u8], off: usize) -> i64 {
    i64::from_le_bytes(buf[off..off + 8].try_into().unwrap())
}

fn write_i64(buf: &mut [u8], off: usize, val: i64) {
    buf[off..off + 8].copy_from_slice(&val.to_le_bytes());
}

fn read_varchar(buf: &[u8], off: usize, slot_len: usize) -> String {
    let n = read_i16(buf, off).max(0) as usize;
    let start = off + 2;
    String::from_utf8_lossy(&buf[start..start + n.min(slot_len - 2)]).into_owned()
}

fn write_varchar(buf: &mut [u8], off: usize, slot_len: usize, s: &str) {
    let capacity = slot_len - 2;
    let bytes = s.as_bytes();
    let n = bytes.len().min(capacity);
    write_i16(buf, off, n as i16);
    buf[off + 2..off + 2 + n].copy_from_slice(&bytes[..n]);
    // Zero any trailing capacity left over from a previously wider value.
    for b in &mut buf[off + 2 + n..off + 2 + capacity] {
        *b = 0;
    }
}

/// Read a [`Value`] of `type_id` out of `buf` at byte offset `off`, where
/// the column's declared slot width is `slot_len` (only meaningful for
/// `Varchar`, which needs it to bound the payload).
fn read_value_at(buf: &[u8], off: usize, type_id: TypeId, slot_len: usize) -> Value {
    match type_id {
        TypeId::TinyInt => Value::TinyInt(read_i8(buf, off)),
        TypeId::SmallInt => Value::SmallInt(read_i16(buf, off)),
        TypeId::Integer => Value::Integer(read_i32(buf, off)),
        TypeId::BigInt => Value::BigInt(read_i64(buf, off)),
        TypeId::Varchar => Value::Varchar(read_varchar(buf, off, slot_len)),
    }
}

/// Write `value` into `buf` at byte offset `off`, where the column's
/// declared slot width is `slot_len`.
fn write_value_at(buf: &mut [u8], off: usize, slot_len: usize, value: &Value) {
    match value {
        Value::TinyInt(v) => write_i8(buf, off, *v),
        Value::SmallInt(v) => write_i16(buf, off, *v),
        Value::Integer(v) => write_i32(buf, off, *v),
        Value::BigInt(v) => write_i64(buf, off, *v),
        Value::Varchar(s) => write_varchar(buf, off, slot_len, s),
    }
}

/// A fixed-capacity, row-major slab of `num_tuple_slots` tuples under
/// `schema`. Owns its backing buffer through an injected [`StorageManager`]
/// and never looks up the allocator from ambient state.
pub struct Tile {
    data: Option<Box<[u8]>>,
    schema: Schema,
    num_tuple_slots: usize,
    allocated_tuple_count: usize,
    backend: BackendType,
    allocator: Box<dyn StorageManager>,
}

impl Tile {
    /// Allocate a fresh, zeroed tile with room for `num_tuple_slots` rows of
    /// `schema`'s tuple length.
    pub fn new(
        schema: Schema,
        num_tuple_slots: usize,
        backend: BackendType,
        mut allocator: Box<dyn StorageManager>,
    ) -> Result<Self> {
        let tile_size = schema.get_length() * num_tuple_slots;
        let data = allocator.allocate(backend, tile_size)?;
        Ok(Tile {
            data: Some(data),
            schema,
            num_tuple_slots,
            allocated_tuple_count: 0,
            backend,
            allocator,
        })
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    pub fn tuple_length(&self) -> usize {
        self.schema.get_length()
    }

    pub fn num_tuple_slots(&self) -> usize {
        self.num_tuple_slots
    }

    pub fn tile_size(&self) -> usize {
        self.tuple_length() * self.num_tuple_slots
    }

    pub fn column_count(&self) -> usize {
        self.schema.num_columns()
    }

    pub fn backend_type(&self) -> BackendType {
        self.backend
    }

    pub fn get_allocated_tuple_count(&self) -> usize {
        self.allocated_tuple_count
    }

    /// `false` once the buffer has been released without a replacement
    /// allocation succeeding — the torn state an `AllocatorFailure` during
    /// `reallocate_for` leaves behind. No read or write method may be
    /// called once this returns `false`.
    pub fn is_usable(&self) -> bool {
        self.data.is_some()
    }

    fn data(&self) -> &[u8] {
        self.data.as_deref().expect("tile buffer accessed after release")
    }

    fn data_mut(&mut self) -> &mut [u8] {
        self.data.as_deref_mut().expect("tile buffer accessed after release")
    }

    fn row_base(&self, row: usize) -> usize {
        row * self.tuple_length()
    }

    /// Write a full tuple into `row`, one value per schema column in order.
    pub fn insert_tuple(&mut self, row: usize, tuple: &[Value]) -> Result<()> {
        debug_assert_eq!(tuple.len(), self.schema.num_columns());
        for (col, value) in tuple.iter().enumerate() {
            self.set_value(value, row, col)?;
        }
        if row >= self.allocated_tuple_count {
            self.allocated_tuple_count = row + 1;
        }
        Ok(())
    }

    pub fn get_value(&self, row: usize, col: usize) -> Result<Value> {
        let off = self.schema.get_offset(col);
        let len = self.schema.column(col).length;
        let type_id = self.schema.column(col).type_id;
        let base = self.row_base(row);
        Ok(read_value_at(self.data(), base + off, type_id, len))
    }

    pub fn get_value_fast(&self, row: usize, off: usize, type_id: TypeId, len: usize) -> Result<Value> {
        let base = self.row_base(row);
        Ok(read_value_at(self.data(), base + off, type_id, len))
    }

    pub fn set_value(&mut self, value: &Value, row: usize, col: usize) -> Result<()> {
        let off = self.schema.get_offset(col);
        let len = self.schema.column(col).length;
        let base = self.row_base(row);
        write_value_at(self.data_mut(), base + off, len, value);
        Ok(())
    }

    pub fn set_value_fast(&mut self, value: &Value, row: usize, off: usize, len: usize) -> Result<()> {
        let base = self.row_base(row);
        write_value_at(self.data_mut(), base + off, len, value);
        Ok(())
    }

    /// Release the backing buffer and allocate a fresh, zeroed one sized for
    /// `new_schema`, in that order, matching `TileRewriter`'s step 3/4: the
    /// old handle is nulled out before the new allocation is requested so
    /// the tile is never observably double-owned.
    pub fn reallocate_for(&mut self, new_schema: Schema, new_num_tuple_slots: usize) -> Result<()> {
        let old = self.data.take();
        self.allocator.release(self.backend, old);
        let tile_size = new_schema.get_length() * new_num_tuple_slots;
        let fresh = self.allocator.allocate(self.backend, tile_size).map_err(|e| {
            // Allocator failure is fatal: the old buffer is already gone, so
            // there is nothing to restore. Propagate as-is.
            e
        })?;
        self.data = Some(fresh);
        self.schema = new_schema;
        self.num_tuple_slots = new_num_tuple_slots;
        Ok(())
    }

    /// Raw byte access to a row's slot, used by `TileRewriter` to copy a
    /// passthrough column's bytes verbatim without decoding through `Value`.
    pub fn raw_slice(&self, row: usize, off: usize, len: usize) -> &[u8] {
        let base = self.row_base(row);
        &self.data()[base + off..base + off + len]
    }

    pub fn raw_slice_mut(&mut self, row: usize, off: usize, len: usize) -> &mut [u8] {
        let base = self.row_base(row);
        &mut self.data_mut()[base + off..base + off + len]
    }
}

impl Drop for Tile {
    fn drop(&mut self) {
        if let Some(buf) = self.data.take() {
            self.allocator.release(self.backend, Some(buf));
        }
    }
}

impl std::fmt::Debug for Tile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Tile")
            .field("schema", &self.schema.info())
            .field("num_tuple_slots", &self.num_tuple_slots)
            .field("allocated_tuple_count", &self.allocated_tuple_count)
            .field("backend", &self.backend)
            .finish()
    }
}
