//! Weighted median-cut palette reduction.
//!
//! Colors from any number of palettes or pixel buffers are collected in a
//! [`ColorPool`], then reduced in one pass to at most 256 palette entries.
//! Every ingested color gets an entry in the resulting index map, so several
//! source palettes can be merged into one shared palette:
//!
//! ```
//! use zenmedian::ColorPool;
//!
//! let mut pool = ColorPool::new();
//! let first = pool.add_color_batch(&[0, 0, 0, 255, 255, 255], 2, 3)?;
//! let second = pool.add_color_batch(&[0, 0, 0, 0, 128, 128, 128, 0], 2, 4)?;
//! let result = pool.reduce(2)?;
//!
//! assert_eq!(result.palette_len(), 2);
//! assert_eq!(result.indices()[first], result.indices()[second]);
//! # Ok::<(), zenmedian::QuantizeError>(())
//! ```
#![forbid(unsafe_code)]
#![cfg_attr(not(feature = "std"), no_std)]

extern crate alloc;

mod dedup;
pub mod error;
mod median_cut;
mod palette;
mod pool;
mod sort;

pub use error::QuantizeError;
pub use pool::ColorPool;

use alloc::vec::Vec;
use core::ops::Range;

use crate::palette::Synthesized;
use crate::pool::ColorList;

/// Largest palette an index map of bytes can address.
pub const MAX_COLORS: usize = 256;

/// Configuration for palette reduction.
#[derive(Debug, Clone)]
pub struct QuantizeConfig {
    /// Maximum number of palette colors (1..=256).
    pub max_colors: usize,
    /// Collapse identical colors before partitioning.
    pub dedupe: bool,
    /// Re-run the reduced palette through the pipeline so its order is
    /// canonical rather than partition order.
    pub resort: bool,
}

impl Default for QuantizeConfig {
    fn default() -> Self {
        Self {
            max_colors: MAX_COLORS,
            dedupe: true,
            resort: true,
        }
    }
}

impl QuantizeConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn max_colors(mut self, n: usize) -> Self {
        self.max_colors = n;
        self
    }

    pub fn dedupe(mut self, enabled: bool) -> Self {
        self.dedupe = enabled;
        self
    }

    pub fn resort(mut self, enabled: bool) -> Self {
        self.resort = enabled;
        self
    }
}

/// Reduction result.
#[derive(Debug, Clone)]
pub struct QuantizeResult {
    palette: Vec<[u8; 3]>,
    indices: Vec<u8>,
    batches: Vec<Range<usize>>,
}

impl QuantizeResult {
    /// Palette entries, one RGB triple each.
    pub fn palette(&self) -> &[[u8; 3]] {
        &self.palette
    }

    /// Palette as consecutive RGB bytes.
    pub fn palette_bytes(&self) -> &[u8] {
        self.palette.as_flattened()
    }

    /// Number of colors in the palette. Never more than the requested width.
    pub fn palette_len(&self) -> usize {
        self.palette.len()
    }

    /// Palette index of every ingested color, by ingestion order.
    pub fn indices(&self) -> &[u8] {
        &self.indices
    }

    /// Number of batches that were added to the pool.
    pub fn batch_count(&self) -> usize {
        self.batches.len()
    }

    /// The slice of the index map covering batch `n`, in the order that
    /// batch's colors were given. `None` if there is no such batch.
    pub fn batch_indices(&self, n: usize) -> Option<&[u8]> {
        let range = self.batches.get(n)?.clone();
        self.indices.get(range)
    }

    /// Consume the result, returning `(palette, indices)`.
    pub fn into_parts(self) -> (Vec<[u8; 3]>, Vec<u8>) {
        (self.palette, self.indices)
    }
}

/// Reduce RGB pixels to a palette. `indices()` of the result holds one
/// palette index per pixel.
pub fn quantize(
    pixels: &[rgb::RGB8],
    config: &QuantizeConfig,
) -> Result<QuantizeResult, QuantizeError> {
    validate_config(config)?;
    let mut pool = ColorPool::new();
    pool.add_rgb(pixels)?;
    run_pipeline(pool, config)
}

/// Reduce RGBA pixels to a palette. Alpha does not take part in
/// quantization and is not present in the palette.
pub fn quantize_rgba(
    pixels: &[rgb::RGBA8],
    config: &QuantizeConfig,
) -> Result<QuantizeResult, QuantizeError> {
    validate_config(config)?;
    let mut pool = ColorPool::new();
    pool.add_rgba(pixels)?;
    run_pipeline(pool, config)
}

/// Validate `config`, then reduce `pool`.
pub(crate) fn reduce_pool(
    pool: ColorPool,
    config: &QuantizeConfig,
) -> Result<QuantizeResult, QuantizeError> {
    validate_config(config)?;
    run_pipeline(pool, config)
}

/// Run the whole pipeline on a pool: dedupe, partition or exact palette,
/// synthesis, then the optional canonical re-sort. `config` must already be
/// validated.
fn run_pipeline(
    pool: ColorPool,
    config: &QuantizeConfig,
) -> Result<QuantizeResult, QuantizeError> {
    if pool.is_empty() {
        return Err(QuantizeError::EmptyPool);
    }

    let ColorPool {
        mut records,
        active,
        batches,
    } = pool;
    let total = records.len();

    let (head, zeros, distinct) = if config.dedupe {
        let deduped = dedup::remove_duplicates(&mut records, active.head);
        (deduped.head, deduped.zeros, total - deduped.duplicates)
    } else {
        (active.head, ColorList::default(), total)
    };
    log::debug!(
        "reducing {total} colors in {} batches, {distinct} distinct, to at most {}",
        batches.len(),
        config.max_colors
    );

    if distinct <= config.max_colors {
        log::trace!("all {distinct} distinct colors fit, skipping median cut");
        let exact = palette::exact(&mut records, head, zeros, distinct)?;
        return Ok(QuantizeResult {
            palette: exact.palette,
            indices: exact.indices,
            batches,
        });
    }

    let Some(head) = head else {
        return Err(QuantizeError::EmptyPool);
    };
    let groups = median_cut::median_cut(&mut records, head, config.max_colors)?;
    let mut synthesized = palette::from_groups(&records, &groups, zeros)?;
    drop(records);

    if config.resort {
        resort(&mut synthesized, config)?;
    }

    Ok(QuantizeResult {
        palette: synthesized.palette,
        indices: synthesized.indices,
        batches,
    })
}

/// Feed a synthesized palette back through the pipeline and remap the index
/// map onto the canonically ordered result. Synthesized duplicates collapse
/// into one entry here.
fn resort(synthesized: &mut Synthesized, config: &QuantizeConfig) -> Result<(), QuantizeError> {
    let width = synthesized.palette.len();
    let mut pool = ColorPool::new();
    pool.add_color_batch(synthesized.palette.as_flattened(), width, 3)?;
    let sorted = run_pipeline(
        pool,
        &QuantizeConfig {
            max_colors: width,
            resort: false,
            ..config.clone()
        },
    )?;

    if sorted.palette.len() < width {
        log::debug!(
            "re-sort collapsed {} duplicate palette entries",
            width - sorted.palette.len()
        );
    }
    for index in synthesized.indices.iter_mut() {
        *index = sorted.indices[usize::from(*index)];
    }
    synthesized.palette = sorted.palette;
    Ok(())
}

fn validate_config(config: &QuantizeConfig) -> Result<(), QuantizeError> {
    if config.max_colors == 0 || config.max_colors > MAX_COLORS {
        return Err(QuantizeError::InvalidMaxColors(config.max_colors));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reduce(colors: &[[u8; 3]], config: &QuantizeConfig) -> QuantizeResult {
        let mut pool = ColorPool::new();
        pool.add_color_batch(colors.as_flattened(), colors.len(), 3)
            .unwrap();
        pool.reduce_with(config).unwrap()
    }

    #[test]
    fn resort_orders_partitioned_palette() {
        let colors: Vec<[u8; 3]> = (0..=255u8).map(|k| [255 - k, 0, 0]).collect();
        let result = reduce(&colors, &QuantizeConfig::new().max_colors(4));
        assert_eq!(result.palette_len(), 4);
        let reds: Vec<u8> = result.palette().iter().map(|c| c[0]).collect();
        assert!(reds.windows(2).all(|w| w[0] < w[1]), "{reds:?}");
    }

    #[test]
    fn partition_order_without_resort() {
        let colors: Vec<[u8; 3]> = (0..=255u8).map(|k| [k, k, k]).collect();
        let sorted = reduce(&colors, &QuantizeConfig::new().max_colors(8));
        let raw = reduce(&colors, &QuantizeConfig::new().max_colors(8).resort(false));

        // Same colors either way; only the order may differ.
        let mut a = sorted.palette().to_vec();
        let mut b = raw.palette().to_vec();
        a.sort_unstable();
        b.sort_unstable();
        assert_eq!(a, b);
        for (i, &idx) in raw.indices().iter().enumerate() {
            let color = raw.palette()[usize::from(idx)];
            assert_eq!(sorted.palette()[usize::from(sorted.indices()[i])], color);
        }
    }

    #[test]
    fn without_dedupe_every_record_is_its_own_color() {
        let colors = [[4, 4, 4], [4, 4, 4], [8, 8, 8]];
        let result = reduce(&colors, &QuantizeConfig::new().max_colors(3).dedupe(false));
        assert_eq!(result.palette_len(), 3);
        assert!(result.indices().iter().all(|&i| usize::from(i) < 3));
    }

    #[test]
    fn without_dedupe_zero_weight_group_stops_partitioning() {
        let colors = [[0, 0, 0], [0, 0, 0], [0, 0, 0], [0, 0, 0], [255, 0, 0]];
        let result = reduce(&colors, &QuantizeConfig::new().max_colors(3).dedupe(false));
        assert_eq!(result.palette(), &[[0, 0, 0], [255, 0, 0]]);
        assert_eq!(result.indices(), &[0, 0, 0, 0, 1]);
    }

    #[test]
    fn dedupe_order_breaks_red_ties() {
        // (2, 2, 0) and (2, 1, 1) tie on red; blue-major dedupe order puts
        // (2, 2, 0) first, so it stays with (0, 2, 2) when the group is cut.
        let colors = [[2, 2, 0], [9, 9, 1], [2, 1, 1], [0, 2, 2]];
        let result = reduce(&colors, &QuantizeConfig::new().max_colors(3).resort(false));
        assert_eq!(result.palette(), &[[1, 2, 1], [9, 9, 1], [2, 1, 1]]);
        assert_eq!(result.indices(), &[0, 1, 2, 0]);
    }

    #[test]
    fn median_reached_exactly_is_not_a_cut() {
        let colors = [[0, 0, 0], [2, 0, 0], [2, 0, 1], [4, 0, 0]];
        let result = reduce(&colors, &QuantizeConfig::new().max_colors(2).resort(false));
        assert_eq!(result.palette(), &[[1, 0, 0], [4, 0, 0]]);
        assert_eq!(result.indices(), &[0, 0, 0, 1]);
    }

    #[test]
    fn equal_sizes_split_the_first_group() {
        let colors = [[2, 0, 0], [6, 0, 0], [34, 0, 0], [38, 0, 0]];
        let result = reduce(&colors, &QuantizeConfig::new().max_colors(3).resort(false));
        assert_eq!(result.palette(), &[[2, 0, 0], [36, 0, 0], [6, 0, 0]]);
        assert_eq!(result.indices(), &[0, 2, 1, 1]);
    }

    #[test]
    fn rejects_bad_width() {
        let mut pool = ColorPool::new();
        pool.add_color_batch(&[1, 2, 3], 1, 3).unwrap();
        assert_eq!(
            pool.clone().reduce(0).unwrap_err(),
            QuantizeError::InvalidMaxColors(0)
        );
        assert_eq!(
            pool.reduce(257).unwrap_err(),
            QuantizeError::InvalidMaxColors(257)
        );
    }

    #[test]
    fn rejects_empty_pool() {
        assert_eq!(
            ColorPool::new().reduce(16).unwrap_err(),
            QuantizeError::EmptyPool
        );
    }
}
