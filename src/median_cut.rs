extern crate alloc;
use alloc::vec::Vec;

use crate::error::QuantizeError;
use crate::pool::{Channel, ColorRecord, chain};
use crate::sort::sort_by_channel;

/// A partition of color space: one chain of records plus cached statistics
/// about its widest channel.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Group {
    pub(crate) head: usize,
    /// Channel with the largest range.
    pub(crate) channel: Channel,
    /// max - min along `channel`.
    pub(crate) size: u8,
    /// Sum of `channel` values over the group.
    pub(crate) weight: u64,
    /// Channel the chain is currently ordered by, if any.
    sorted_by: Option<Channel>,
}

impl Group {
    fn new(records: &[ColorRecord], head: usize, sorted_by: Option<Channel>) -> Self {
        let mut min = records[head].rgb;
        let mut max = min;
        let mut sum = [0u64; 3];
        for slot in chain(records, Some(head)) {
            let rgb = records[slot].rgb;
            for c in 0..3 {
                min[c] = min[c].min(rgb[c]);
                max[c] = max[c].max(rgb[c]);
                sum[c] += u64::from(rgb[c]);
            }
        }

        // Red wins ties; green and blue must be strictly wider to take over.
        let mut channel = Channel::Red;
        let mut size = max[0] - min[0];
        for candidate in [Channel::Green, Channel::Blue] {
            let c = candidate.index();
            if max[c] - min[c] > size {
                size = max[c] - min[c];
                channel = candidate;
            }
        }

        Self {
            head,
            channel,
            size,
            weight: sum[channel.index()],
            sorted_by,
        }
    }

    /// Split the chain at its weighted median along `self.channel`.
    ///
    /// Records are consumed while the running sum is `<= weight / 2`. The
    /// record that pushes the sum past the median opens the new group, unless
    /// it is the head, which then stays alone. Returns the head of the new
    /// chain, or `None` when no split is possible.
    fn cut(&self, records: &mut [ColorRecord]) -> Option<usize> {
        let median = self.weight / 2;
        let mut accumulated = 0u64;
        let mut before_last: Option<usize> = None;
        let mut last: Option<usize> = None;
        let mut cursor = Some(self.head);

        while accumulated <= median {
            let Some(slot) = cursor else {
                break;
            };
            accumulated += u64::from(records[slot].channel(self.channel));
            before_last = last;
            last = Some(slot);
            cursor = records[slot].next;
        }

        if accumulated <= median {
            // ran off the end without crossing the median
            return None;
        }

        let last = last?;
        match before_last {
            None => {
                records[last].next = None;
                cursor
            }
            Some(prev) => {
                records[prev].next = None;
                Some(last)
            }
        }
    }
}

/// Partition the chain starting at `head` into at most `max_groups` groups.
///
/// Repeatedly picks the group with the widest dominant channel, sorts it by
/// that channel if needed, and cuts it at its weighted median. Stops early
/// as soon as a cut yields nothing, so fewer groups may be returned.
pub(crate) fn median_cut(
    records: &mut [ColorRecord],
    head: usize,
    max_groups: usize,
) -> Result<Vec<Group>, QuantizeError> {
    let mut groups = Vec::new();
    groups
        .try_reserve_exact(max_groups)
        .map_err(|_| QuantizeError::OutOfMemory)?;
    groups.push(Group::new(records, head, None));

    while groups.len() < max_groups {
        // First group with the largest size wins.
        let mut i = 0;
        for (n, group) in groups.iter().enumerate() {
            if group.size > groups[i].size {
                i = n;
            }
        }

        let channel = groups[i].channel;
        if groups[i].sorted_by != Some(channel) {
            if let Some(sorted) = sort_by_channel(records, Some(groups[i].head), channel) {
                groups[i].head = sorted;
            }
            groups[i].sorted_by = Some(channel);
        }

        let Some(tail) = groups[i].cut(records) else {
            log::debug!(
                "median cut exhausted at {} of {} groups",
                groups.len(),
                max_groups
            );
            break;
        };

        let sorted_by = groups[i].sorted_by;
        groups[i] = Group::new(records, groups[i].head, sorted_by);
        groups.push(Group::new(records, tail, sorted_by));
    }

    Ok(groups)
}
