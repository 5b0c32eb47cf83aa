extern crate alloc;
use alloc::vec::Vec;

use crate::error::QuantizeError;
use crate::median_cut::Group;
use crate::pool::{Channel, ColorList, ColorRecord, chain};
use crate::sort::sort_by_channels;

/// Output order when every distinct color fits in the palette: green is
/// primary, then blue, then red.
const EXACT_ORDER: [Channel; 3] = [Channel::Red, Channel::Blue, Channel::Green];

/// Palette entries plus the index of every ingested color into them.
#[derive(Debug, Clone)]
pub(crate) struct Synthesized {
    pub(crate) palette: Vec<[u8; 3]>,
    pub(crate) indices: Vec<u8>,
}

/// Build one palette entry per group.
///
/// Groups wider than one step on their dominant channel get the rounded mean
/// of their members; narrower groups reuse their first member's color so
/// tight regions don't produce new near-duplicates. Group `i` becomes palette
/// entry `i`.
pub(crate) fn from_groups(
    records: &[ColorRecord],
    groups: &[Group],
    zeros: ColorList,
) -> Result<Synthesized, QuantizeError> {
    let mut palette = Vec::new();
    palette
        .try_reserve_exact(groups.len())
        .map_err(|_| QuantizeError::OutOfMemory)?;
    let mut indices = zeroed(records.len())?;

    for (i, group) in groups.iter().enumerate() {
        let mut count = 0u64;
        let mut sum = [0u64; 3];
        for slot in chain(records, Some(group.head)) {
            indices[slot] = i as u8;
            count += 1;
            for (s, &v) in sum.iter_mut().zip(&records[slot].rgb) {
                *s += u64::from(v);
            }
        }

        let color = if group.size > 1 {
            sum.map(|s| ((s + count / 2) / count) as u8)
        } else {
            records[group.head].rgb
        };
        palette.push(color);
    }

    resolve_duplicates(records, zeros, &mut indices);
    Ok(Synthesized { palette, indices })
}

/// Use every distinct color as-is, in a deterministic channel order.
pub(crate) fn exact(
    records: &mut [ColorRecord],
    head: Option<usize>,
    zeros: ColorList,
    distinct: usize,
) -> Result<Synthesized, QuantizeError> {
    let mut palette = Vec::new();
    palette
        .try_reserve_exact(distinct)
        .map_err(|_| QuantizeError::OutOfMemory)?;
    let mut indices = zeroed(records.len())?;

    let head = sort_by_channels(records, head, &EXACT_ORDER);
    for (i, slot) in chain(records, head).enumerate() {
        indices[slot] = i as u8;
        palette.push(records[slot].rgb);
    }

    resolve_duplicates(records, zeros, &mut indices);
    Ok(Synthesized { palette, indices })
}

/// Give every duplicate the palette index of its canonical color.
fn resolve_duplicates(records: &[ColorRecord], zeros: ColorList, indices: &mut [u8]) {
    for slot in chain(records, zeros.head) {
        if let Some(canonical) = records[slot].canonical {
            indices[slot] = indices[canonical];
        }
    }
}

fn zeroed(len: usize) -> Result<Vec<u8>, QuantizeError> {
    let mut v = Vec::new();
    v.try_reserve_exact(len)
        .map_err(|_| QuantizeError::OutOfMemory)?;
    v.resize(len, 0);
    Ok(v)
}
