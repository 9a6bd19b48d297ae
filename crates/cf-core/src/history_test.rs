use super::*;

fn record(id: &str, env: &str, seq: i64, status: RecordStatus) -> AppliedRecord {
    AppliedRecord {
        change_id: ChangeId::try_new(id).unwrap(),
        environment: env.to_string(),
        checksum: format!("sum-{id}"),
        sequence_number: seq,
        applied_at: Utc::now(),
        status,
        changelog_path: "master-changelogs.yaml".to_string(),
        source_path: id.to_string(),
        description: String::new(),
    }
}

#[test]
fn test_status_round_trip() {
    for status in [
        RecordStatus::Success,
        RecordStatus::Pending,
        RecordStatus::Failed,
    ] {
        assert_eq!(RecordStatus::parse(status.as_str()), Some(status));
    }
    assert_eq!(RecordStatus::parse("SUCCESS"), Some(RecordStatus::Success));
    assert_eq!(RecordStatus::parse("mark_ran"), None);
}

#[test]
fn test_history_table_names() {
    let plain = HistoryTable::new("changelog_state").unwrap();
    assert_eq!(plain.lock_table(), "changelog_state_lock");
    assert_eq!(plain.schema(), None);
    assert_eq!(plain.table(), "changelog_state");

    let qualified = HistoryTable::new("ops.changelog_state").unwrap();
    assert_eq!(qualified.schema(), Some("ops"));
    assert_eq!(qualified.table(), "changelog_state");
    assert_eq!(qualified.lock_table(), "ops.changelog_state_lock");

    assert!(HistoryTable::new("x; drop").is_err());
}

#[test]
fn test_ledger_scoped_to_environment() {
    let ledger = Ledger::new(
        "dev",
        vec![
            record("a.sql", "dev", 1, RecordStatus::Success),
            record("b.sql", "prd", 1, RecordStatus::Success),
        ],
    );
    assert_eq!(ledger.len(), 1);
    assert!(ledger.applied("a.sql").is_some());
    assert!(ledger.applied("b.sql").is_none());
}

#[test]
fn test_ledger_ignores_non_success() {
    let ledger = Ledger::new(
        "dev",
        vec![
            record("a.sql", "dev", 1, RecordStatus::Failed),
            record("b.sql", "dev", 2, RecordStatus::Pending),
        ],
    );
    assert!(ledger.applied("a.sql").is_none());
    assert!(ledger.applied("b.sql").is_none());
    assert!(ledger.applied_ids().is_empty());
    assert_eq!(ledger.next_sequence(), 3);
}

#[test]
fn test_ledger_first_success_wins() {
    let mut second = record("a.sql", "dev", 2, RecordStatus::Success);
    second.checksum = "other".to_string();
    let ledger = Ledger::new(
        "dev",
        vec![record("a.sql", "dev", 1, RecordStatus::Success), second],
    );
    assert_eq!(ledger.applied("a.sql").unwrap().sequence_number, 1);
    assert_eq!(ledger.applied_ids().len(), 1);
}

#[test]
fn test_next_sequence_empty() {
    assert_eq!(Ledger::new("dev", vec![]).next_sequence(), 1);
}
