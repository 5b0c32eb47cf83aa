use crate::pool::{Channel, ColorList, ColorRecord};
use crate::sort::sort_by_channels;

/// Key order for duplicate detection: blue is primary, then green, then red.
const DEDUP_ORDER: [Channel; 3] = [Channel::Red, Channel::Green, Channel::Blue];

/// Outcome of duplicate elimination.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Deduped {
    /// Head of the active list, now holding only distinct colors.
    pub(crate) head: Option<usize>,
    /// Records removed as duplicates; each carries its canonical index.
    pub(crate) zeros: ColorList,
    pub(crate) duplicates: usize,
}

/// Sort the active list by all three channels, then move every record whose
/// color equals the preceding distinct record's into the zero-list.
///
/// The canonical index stored on a duplicate is the original index of the
/// distinct record it matched.
pub(crate) fn remove_duplicates(records: &mut [ColorRecord], head: Option<usize>) -> Deduped {
    let head = sort_by_channels(records, head, &DEDUP_ORDER);
    let mut zeros = ColorList::default();
    let mut duplicates = 0;

    let Some(first) = head else {
        return Deduped {
            head,
            zeros,
            duplicates,
        };
    };

    let mut distinct = first;
    let mut cursor = records[first].next;
    while let Some(slot) = cursor {
        cursor = records[slot].next;
        if records[slot].rgb == records[distinct].rgb {
            records[distinct].next = cursor;
            records[slot].canonical = Some(distinct);
            zeros.push_back(records, slot);
            duplicates += 1;
        } else {
            distinct = slot;
        }
    }

    Deduped {
        head,
        zeros,
        duplicates,
    }
}
