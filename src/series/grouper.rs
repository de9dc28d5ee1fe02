use crate::types::record::{RawRecord, StreamKey};
use std::collections::BTreeMap;

/// Partitions records into streams by `(indicator, operatorKey, pointKey, directionKey)`.
///
/// Every record lands in exactly one group. Groups come out ordered by key;
/// records keep their input order within a group.
pub fn group_by_stream<I>(records: I) -> BTreeMap<StreamKey, Vec<RawRecord>>
where
    I: IntoIterator<Item = RawRecord>,
{
    let mut groups: BTreeMap<StreamKey, Vec<RawRecord>> = BTreeMap::new();
    for record in records {
        groups.entry(record.stream_key()).or_default().push(record);
    }
    groups
}
