//! Compression-layer configuration.
//!
//! A small plain struct constructed with a `Default`-style constructor and
//! validated by clamping out-of-range fields rather than returning an
//! error for them.

/// Knobs owned by this crate's compression layer. Unlike `EngineConfig`
/// there is no page size or disk capacity to carry — a `Tile`'s shape is
/// fixed by its schema and row count, not by this config.
#[derive(Debug, Clone)]
pub struct CompressionConfig {
    /// Widest dictionary code allowed, in bits. A column whose unique-value
    /// count needs more bits than this to index falls back to passthrough.
    pub max_dictionary_code_bits: u32,
    /// Minimum row count at which the analyzer is even attempted. A
    /// single-row column must still be analyzed, so this defaults to 1;
    /// raising it lets a caller skip narrow tiles cheaply.
    pub min_rows_to_attempt: usize,
}

impl CompressionConfig {
    pub fn default_config() -> Self {
        CompressionConfig {
            max_dictionary_code_bits: 32,
            min_rows_to_attempt: 1,
        }
    }

    /// Clamp fields to legal ranges in place. Mirrors
    /// `EngineConfig::validate`'s clamp-don't-error stance; there is no
    /// invalid combination of these two fields, so this never fails.
    pub fn validate(&mut self) {
        self.max_dictionary_code_bits = self.max_dictionary_code_bits.clamp(1, 64);
        self.min_rows_to_attempt = self.min_rows_to_attempt.max(1);
    }
}

impl Default for CompressionConfig {
    fn default() -> Self {
        Self::default_config()
    }
}
