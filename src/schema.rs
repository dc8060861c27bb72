//! Column metadata: per-column type/length/name/inlined flag, and the
//! derivation of byte offsets and tuple length from an ordered column list.
//!
//! `Column`/`Schema` mirror a slotted-page schema module in shape, but the
//! per-column "type" here is this crate's [`TypeId`] rather than a
//! page-format tag, and variable-length columns are always stored inline
//! behind a two-byte length prefix — an overflow-pool indirection is out of
//! scope for a compression layer that only ever materialises whole
//! [`Value`]s, never raw tuple bytes, across the row boundary.

use crate::value::TypeId;

/// One column's physical shape.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Column {
    pub name: String,
    pub type_id: TypeId,
    /// Byte width of the column's slot. For `Varchar` this includes the
    /// 2-byte length prefix plus the declared maximum payload length.
    pub length: usize,
    /// Whether the column's value lives entirely in-slab. Always `true` in
    /// this implementation; retained so the field matches the external
    /// contract this crate exposes to hypothetical out-of-line storage.
    pub inlined: bool,
}

impl Column {
    pub fn fixed(name: impl Into<String>, type_id: TypeId) -> Self {
        let length = type_id
            .fixed_width()
            .expect("fixed() requires a fixed-width type; use Column::varchar for Varchar");
        Column {
            name: name.into(),
            type_id,
            length,
            inlined: true,
        }
    }

    /// A `Varchar` column whose slot holds a `u16` length prefix followed by
    /// up to `max_len` bytes of UTF-8 payload.
    pub fn varchar(name: impl Into<String>, max_len: u16) -> Self {
        Column {
            name: name.into(),
            type_id: TypeId::Varchar,
            length: 2 + max_len as usize,
            inlined: true,
        }
    }
}

/// An ordered list of columns with derived per-column byte offsets.
///
/// Two schemas are structurally equivalent only by comparing column type and
/// length, per the consumed `Schema` contract — column names and the
/// `inlined` flag are metadata, not part of physical compatibility.
#[derive(Debug, Clone)]
pub struct Schema {
    columns: Vec<Column>,
    offsets: Vec<usize>,
    tuple_length: usize,
}

impl Schema {
    pub fn new(columns: Vec<Column>) -> Self {
        let mut offsets = Vec::with_capacity(columns.len());
        let mut cursor = 0usize;
        for col in &columns {
            offsets.push(cursor);
            cursor += col.length;
        }
        Schema {
            columns,
            offsets,
            tuple_length: cursor,
        }
    }

    pub fn num_columns(&self) -> usize {
        self.columns.len()
    }

    pub fn column(&self, idx: usize) -> &Column {
        &self.columns[idx]
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn get_offset(&self, idx: usize) -> usize {
        self.offsets[idx]
    }

    pub fn is_inlined(&self, idx: usize) -> bool {
        self.columns[idx].inlined
    }

    pub fn get_length(&self) -> usize {
        self.tuple_length
    }

    /// Locate the column whose slot begins at `offset`, used to rebuild
    /// `offset_to_column` after a rewrite.
    pub fn column_at_offset(&self, offset: usize) -> Option<usize> {
        self.offsets.iter().position(|&o| o == offset)
    }

    /// Debug-only structural description, analogous to a page schema's
    /// `GetInfo()`.
    pub fn info(&self) -> String {
        let mut s = String::from("Schema[");
        for (i, col) in self.columns.iter().enumerate() {
            if i > 0 {
                s.push_str(", ");
            }
            s.push_str(&format!("{}:{:?}@{}", col.name, col.type_id, self.offsets[i]));
        }
        s.push(']');
        s
    }

    /// Structural equivalence: same column count, and each column's type and
    /// byte length match pairwise. Names and `inlined` flags are ignored.
    pub fn structurally_equivalent(&self, other: &Schema) -> bool {
        self.columns.len() == other.columns.len()
            && self
                .columns
                .iter()
                .zip(other.columns.iter())
                .all(|(a, b)| a.type_id == b.type_id && a.length == b.length)
    }
}
