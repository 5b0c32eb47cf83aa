extern crate alloc;
use alloc::vec::Vec;
use core::ops::Range;

use crate::error::QuantizeError;
use crate::{QuantizeConfig, QuantizeResult};

/// One axis of an RGB triple.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Channel {
    Red = 0,
    Green = 1,
    Blue = 2,
}

impl Channel {
    #[inline]
    pub(crate) fn index(self) -> usize {
        self as usize
    }
}

/// A color in the pool's arena.
///
/// The record's original index is its slot in the arena. `next` threads the
/// record into exactly one list (the active list, a group chain, or the
/// zero-list); `canonical` is set once the record is found to duplicate an
/// earlier distinct color.
#[derive(Debug, Clone)]
pub(crate) struct ColorRecord {
    pub(crate) rgb: [u8; 3],
    pub(crate) next: Option<usize>,
    pub(crate) canonical: Option<usize>,
}

impl ColorRecord {
    #[inline]
    pub(crate) fn channel(&self, channel: Channel) -> u8 {
        self.rgb[channel.index()]
    }
}

/// Head and tail of a singly linked list threaded through the arena.
#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct ColorList {
    pub(crate) head: Option<usize>,
    pub(crate) tail: Option<usize>,
}

impl ColorList {
    pub(crate) fn push_back(&mut self, records: &mut [ColorRecord], slot: usize) {
        records[slot].next = None;
        match self.tail {
            Some(tail) => records[tail].next = Some(slot),
            None => self.head = Some(slot),
        }
        self.tail = Some(slot);
    }
}

/// Walks a chain of records starting at `head`, yielding arena slots.
pub(crate) struct Chain<'a> {
    records: &'a [ColorRecord],
    cursor: Option<usize>,
}

impl Iterator for Chain<'_> {
    type Item = usize;

    fn next(&mut self) -> Option<usize> {
        let slot = self.cursor?;
        self.cursor = self.records[slot].next;
        Some(slot)
    }
}

pub(crate) fn chain(records: &[ColorRecord], head: Option<usize>) -> Chain<'_> {
    Chain {
        records,
        cursor: head,
    }
}

/// A collection of colors waiting to be reduced to a palette.
///
/// Colors are added in batches; every color gets the next sequential index,
/// so a batch's colors occupy `start..start + len` in the index map returned
/// by [`ColorPool::reduce`].
#[derive(Debug, Clone, Default)]
pub struct ColorPool {
    pub(crate) records: Vec<ColorRecord>,
    pub(crate) active: ColorList,
    pub(crate) batches: Vec<Range<usize>>,
}

impl ColorPool {
    pub fn new() -> Self {
        Self::default()
    }

    /// Total number of colors ingested so far.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Index ranges of every batch, in ingestion order.
    pub fn batches(&self) -> &[Range<usize>] {
        &self.batches
    }

    /// Add `count` colors read from `colors`, each `stride` bytes apart.
    ///
    /// Bytes 0, 1 and 2 of every record are taken as R, G and B; anything
    /// past the third byte is ignored. Returns the index of the first color
    /// of this batch.
    pub fn add_color_batch(
        &mut self,
        colors: &[u8],
        count: usize,
        stride: usize,
    ) -> Result<usize, QuantizeError> {
        validate_batch(colors.len(), count, stride)?;
        self.add_batch(
            colors
                .chunks(stride)
                .take(count)
                .map(|chunk| [chunk[0], chunk[1], chunk[2]]),
        )
    }

    /// Add a batch of RGB pixels. Equivalent to a stride-3 batch.
    pub fn add_rgb(&mut self, pixels: &[rgb::RGB8]) -> Result<usize, QuantizeError> {
        self.add_batch(pixels.iter().map(|p| [p.r, p.g, p.b]))
    }

    /// Add a batch of RGBA pixels; alpha is ignored.
    pub fn add_rgba(&mut self, pixels: &[rgb::RGBA8]) -> Result<usize, QuantizeError> {
        self.add_batch(pixels.iter().map(|p| [p.r, p.g, p.b]))
    }

    /// Reduce every ingested color to a palette of at most `max_colors`
    /// entries, with duplicate elimination and canonical re-sort enabled.
    pub fn reduce(self, max_colors: usize) -> Result<QuantizeResult, QuantizeError> {
        self.reduce_with(&QuantizeConfig::new().max_colors(max_colors))
    }

    /// Reduce the pool using an explicit configuration. Consumes the pool.
    pub fn reduce_with(self, config: &QuantizeConfig) -> Result<QuantizeResult, QuantizeError> {
        crate::reduce_pool(self, config)
    }

    /// Append one batch of colors and record its index range.
    fn add_batch(
        &mut self,
        colors: impl ExactSizeIterator<Item = [u8; 3]>,
    ) -> Result<usize, QuantizeError> {
        let start = self.records.len();
        self.reserve(colors.len())?;
        for color in colors {
            self.push(color);
        }
        self.batches.push(start..self.records.len());
        Ok(start)
    }

    fn reserve(&mut self, additional: usize) -> Result<(), QuantizeError> {
        self.records
            .try_reserve(additional)
            .map_err(|_| QuantizeError::OutOfMemory)?;
        self.batches
            .try_reserve(1)
            .map_err(|_| QuantizeError::OutOfMemory)
    }

    fn push(&mut self, rgb: [u8; 3]) {
        let slot = self.records.len();
        self.records.push(ColorRecord {
            rgb,
            next: None,
            canonical: None,
        });
        self.active.push_back(&mut self.records, slot);
    }
}

fn validate_batch(len: usize, count: usize, stride: usize) -> Result<(), QuantizeError> {
    if stride < 3 {
        return Err(QuantizeError::InvalidStride(stride));
    }
    if count == 0 {
        return Ok(());
    }
    let needed = (count - 1)
        .checked_mul(stride)
        .and_then(|n| n.checked_add(3));
    match needed {
        Some(needed) if needed <= len => Ok(()),
        _ => Err(QuantizeError::BufferTooShort { len, count, stride }),
    }
}
