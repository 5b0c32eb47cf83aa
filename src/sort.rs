use crate::pool::{Channel, ColorRecord};

/// A byte-sized radix.
const RADIX: usize = u8::MAX as usize + 1;

/// Stable counting sort of the chain starting at `head` by one channel.
///
/// Records are distributed into 256 buckets in one pass (keeping their
/// relative order), then the non-empty buckets are linked back together in
/// ascending value order. Returns the new head.
pub(crate) fn sort_by_channel(
    records: &mut [ColorRecord],
    head: Option<usize>,
    channel: Channel,
) -> Option<usize> {
    let mut first = [None::<usize>; RADIX];
    let mut last = [0usize; RADIX];

    let mut cursor = head;
    while let Some(slot) = cursor {
        cursor = records[slot].next;
        records[slot].next = None;
        let value = usize::from(records[slot].channel(channel));
        match first[value] {
            Some(_) => records[last[value]].next = Some(slot),
            None => first[value] = Some(slot),
        }
        last[value] = slot;
    }

    let mut sorted = None;
    let mut tail: Option<usize> = None;
    for (value, bucket) in first.iter().enumerate() {
        let Some(bucket_head) = *bucket else {
            continue;
        };
        match tail {
            Some(t) => records[t].next = Some(bucket_head),
            None => sorted = Some(bucket_head),
        }
        tail = Some(last[value]);
    }
    sorted
}

/// Sort by several channels in turn. The last channel becomes the primary key
/// since each pass is stable.
pub(crate) fn sort_by_channels(
    records: &mut [ColorRecord],
    mut head: Option<usize>,
    channels: &[Channel],
) -> Option<usize> {
    for &channel in channels {
        head = sort_by_channel(records, head, channel);
    }
    head
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{ColorPool, chain};

    fn pool_of(colors: &[[u8; 3]]) -> ColorPool {
        let mut pool = ColorPool::new();
        pool.add_color_batch(colors.as_flattened(), colors.len(), 3)
            .unwrap();
        pool
    }

    #[test]
    fn sorts_ascending_by_channel() {
        let mut pool = pool_of(&[[5, 0, 0], [1, 0, 0], [255, 0, 0], [0, 0, 0]]);
        let head = sort_by_channel(&mut pool.records, pool.active.head, Channel::Red);
        let order: Vec<usize> = chain(&pool.records, head).collect();
        assert_eq!(order, vec![3, 1, 0, 2]);
    }

    #[test]
    fn equal_values_keep_their_order() {
        let mut pool = pool_of(&[[9, 1, 0], [3, 2, 0], [9, 3, 0], [3, 4, 0], [9, 5, 0]]);
        let head = sort_by_channel(&mut pool.records, pool.active.head, Channel::Red);
        let order: Vec<usize> = chain(&pool.records, head).collect();
        assert_eq!(order, vec![1, 3, 0, 2, 4]);
    }

    #[test]
    fn later_pass_is_primary_key() {
        let mut pool = pool_of(&[[2, 0, 1], [1, 0, 1], [0, 0, 0], [3, 0, 0]]);
        let head = sort_by_channels(
            &mut pool.records,
            pool.active.head,
            &[Channel::Red, Channel::Blue],
        );
        let order: Vec<usize> = chain(&pool.records, head).collect();
        // blue first, red breaks ties
        assert_eq!(order, vec![2, 3, 1, 0]);
    }

    #[test]
    fn empty_chain_stays_empty() {
        let mut pool = ColorPool::new();
        assert_eq!(
            sort_by_channel(&mut pool.records, None, Channel::Green),
            None
        );
    }

    #[test]
    fn single_record() {
        let mut pool = pool_of(&[[1, 2, 3]]);
        let head = sort_by_channel(&mut pool.records, pool.active.head, Channel::Blue);
        assert_eq!(chain(&pool.records, head).collect::<Vec<_>>(), vec![0]);
    }
}
