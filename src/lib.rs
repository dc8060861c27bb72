//! Columnar compression layer for an in-memory analytic storage tile.
//!
//! A [`tile::Tile`] is a fixed-size, row-major slab holding a bounded
//! number of tuples under a [`schema::Schema`]. [`compressed_tile::CompressedTile`]
//! wraps one, and its [`compressed_tile::CompressedTile::compress`] method
//! rewrites each amenable numeric column into a base value plus a narrower
//! delta type, and each amenable string column into a sorted dictionary
//! plus an integer code column — then seals the tile against further
//! writes on the columns it touched.
//!
//! ```
//! use tile_compress::allocator::{BackendType, HeapAllocator};
//! use tile_compress::compressed_tile::CompressedTile;
//! use tile_compress::config::CompressionConfig;
//! use tile_compress::schema::{Column, Schema};
//! use tile_compress::tile::Tile;
//! use tile_compress::value::{TypeId, Value};
//!
//! let schema = Schema::new(vec![Column::fixed("id", TypeId::Integer)]);
//! let tile = Tile::new(schema, 4, BackendType::Heap, Box::new(HeapAllocator::new())).unwrap();
//! let mut compressed = CompressedTile::new(tile, CompressionConfig::default_config());
//! for i in 0..4 {
//!     compressed.insert_tuple(i, &[Value::Integer(100 + i as i32)]).unwrap();
//! }
//! compressed.compress().unwrap();
//! assert_eq!(compressed.get_value(0, 0).unwrap(), Value::Integer(100));
//! ```

pub mod allocator;
pub mod analyzer;
pub mod compressed_tile;
pub mod compressor;
pub mod config;
pub mod descriptor;
pub mod dictionary;
pub mod error;
pub mod rewriter;
pub mod schema;
pub mod tile;
pub mod value;

pub use compressed_tile::CompressedTile;
pub use error::{CompressError, Result};
