use crate::domain::{SessionRecord, SortDirection, SortKey};
use std::cmp::Ordering;

pub fn compare_by_key(a: &SessionRecord, b: &SessionRecord, key: SortKey) -> Ordering {
    match key {
        SortKey::SessionId => a.session_id.cmp(&b.session_id),
        SortKey::SessionType => a.session_type.label().cmp(b.session_type.label()),
        SortKey::User => a.user.cmp(&b.user),
        SortKey::SourceIp => a.source_ip.cmp(&b.source_ip),
        SortKey::AppName => a.app_name.cmp(&b.app_name),
        SortKey::ProcName => a.proc_name.cmp(&b.proc_name),
        SortKey::InstanceNo => a.instance_no.cmp(&b.instance_no),
        SortKey::NodeIp => a.node_ip.cmp(&b.node_ip),
        SortKey::Status => a.status.cmp(&b.status),
        SortKey::CreatedAt => a.created_at.cmp(&b.created_at),
        SortKey::EndedAt => a.ended_at.cmp(&b.ended_at),
    }
}

// Not a stable sort: records comparing equal on `key` may land in any order.
pub fn sort_records(records: &mut [SessionRecord], key: SortKey, direction: SortDirection) {
    records.sort_unstable_by(|a, b| match direction {
        SortDirection::Asc => compare_by_key(a, b, key),
        SortDirection::Desc => compare_by_key(b, a, key),
    });
}

pub fn merge_batch(
    existing: Vec<SessionRecord>,
    batch: Vec<SessionRecord>,
    key: SortKey,
    direction: SortDirection,
) -> Vec<SessionRecord> {
    let mut merged = existing;
    merged.extend(batch);
    sort_records(&mut merged, key, direction);
    merged
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::SessionType;
    use std::collections::BTreeSet;

    fn record(session_id: i64, user: &str, created_at: i64) -> SessionRecord {
        SessionRecord {
            session_id,
            session_type: SessionType::Enter,
            user: user.to_string(),
            source_ip: "10.0.0.1".to_string(),
            app_name: "console".to_string(),
            proc_name: "web".to_string(),
            instance_no: 0,
            node_ip: "192.168.1.2".to_string(),
            status: "running".to_string(),
            created_at,
            ended_at: 0,
        }
    }

    fn users(records: &[SessionRecord]) -> Vec<&str> {
        records.iter().map(|record| record.user.as_str()).collect()
    }

    #[test]
    fn sorts_users_descending_then_ascending() {
        let mut records = vec![
            record(1, "bob", 10),
            record(2, "alice", 20),
            record(3, "carol", 30),
        ];
        sort_records(&mut records, SortKey::User, SortDirection::Desc);
        assert_eq!(users(&records), vec!["carol", "bob", "alice"]);
        sort_records(&mut records, SortKey::User, SortDirection::Asc);
        assert_eq!(users(&records), vec!["alice", "bob", "carol"]);
    }

    #[test]
    fn sorts_numeric_keys_numerically() {
        let mut records = vec![record(9, "a", 300), record(100, "b", 100), record(20, "c", 200)];
        sort_records(&mut records, SortKey::SessionId, SortDirection::Asc);
        let ids: Vec<i64> = records.iter().map(|record| record.session_id).collect();
        assert_eq!(ids, vec![9, 20, 100]);

        sort_records(&mut records, SortKey::CreatedAt, SortDirection::Desc);
        let created: Vec<i64> = records.iter().map(|record| record.created_at).collect();
        assert_eq!(created, vec![300, 200, 100]);
    }

    #[test]
    fn merge_keeps_every_record_and_interleaves() {
        let existing = vec![record(10, "a", 1), record(8, "a", 1), record(6, "a", 1)];
        let batch = vec![record(9, "a", 1), record(7, "a", 1)];
        let merged = merge_batch(existing, batch, SortKey::SessionId, SortDirection::Desc);
        assert_eq!(merged.len(), 5);
        let ids: Vec<i64> = merged.iter().map(|record| record.session_id).collect();
        assert_eq!(ids, vec![10, 9, 8, 7, 6]);
    }

    #[test]
    fn merge_is_deterministic_for_identical_inputs() {
        let existing = vec![record(3, "x", 5), record(1, "y", 7)];
        let batch = vec![record(2, "z", 6)];
        let first = merge_batch(
            existing.clone(),
            batch.clone(),
            SortKey::CreatedAt,
            SortDirection::Asc,
        );
        let second = merge_batch(existing, batch, SortKey::CreatedAt, SortDirection::Asc);
        assert_eq!(first, second);
    }

    #[test]
    fn ties_keep_the_full_record_set_in_unspecified_order() {
        // The comparator is not stable; equal keys only guarantee set equality.
        let existing = vec![record(1, "same", 9), record(2, "same", 9)];
        let batch = vec![record(3, "same", 9)];
        let merged = merge_batch(existing, batch, SortKey::User, SortDirection::Desc);
        let ids: BTreeSet<i64> = merged.iter().map(|record| record.session_id).collect();
        assert_eq!(ids, BTreeSet::from([1, 2, 3]));
    }
}
