// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use diesel::prelude::*;
use tally_audit::AuditEntry;
use tally_domain::AuditAction;

use super::{BASE_TIME, at, create_test_entry, create_test_persistence};
use crate::{BackendConnection, PersistenceError};

#[test]
fn test_insert_assigns_increasing_ids() {
    let mut persistence = create_test_persistence();

    let first = persistence
        .insert_audit_entry(&create_test_entry(AuditAction::Create, None, "r-1", 0))
        .unwrap();
    let second = persistence
        .insert_audit_entry(&create_test_entry(AuditAction::Create, None, "r-2", 1))
        .unwrap();

    assert!(second > first);
}

#[test]
fn test_stored_entry_reads_back_unchanged() {
    let mut persistence = create_test_persistence();
    let entry = create_test_entry(AuditAction::Update, Some(4), "r-9", 0);

    let id = persistence.insert_audit_entry(&entry).unwrap();
    let stored: AuditEntry = persistence.get_audit_entry(id).unwrap().unwrap();

    assert_eq!(stored.id(), Some(id));
    assert_eq!(stored.action(), AuditAction::Update);
    assert_eq!(stored.session_id(), Some(4));
    assert_eq!(stored.result_id(), Some("r-9"));
    assert_eq!(stored.old_data(), entry.old_data());
    assert_eq!(stored.new_data(), entry.new_data());
    assert_eq!(stored.timestamp(), BASE_TIME);
    assert_eq!(stored.user_id(), "admin-1");
    assert_eq!(stored.ip_address(), Some("10.0.0.7"));
}

#[test]
fn test_missing_entry_is_none() {
    let mut persistence = create_test_persistence();
    assert!(persistence.get_audit_entry(404).unwrap().is_none());
}

#[test]
fn test_session_entries_are_oldest_first() {
    let mut persistence = create_test_persistence();
    persistence
        .insert_audit_entry(&create_test_entry(AuditAction::Create, Some(1), "r-late", 5))
        .unwrap();
    persistence
        .insert_audit_entry(&create_test_entry(AuditAction::Create, Some(1), "r-early", 1))
        .unwrap();
    persistence
        .insert_audit_entry(&create_test_entry(AuditAction::Create, Some(2), "r-other", 0))
        .unwrap();

    let entries = persistence.list_session_entries(1).unwrap();
    let ids: Vec<Option<&str>> = entries.iter().map(AuditEntry::result_id).collect();

    assert_eq!(ids, vec![Some("r-early"), Some("r-late")]);
}

#[test]
fn test_create_entries_are_limited_to_sessions() {
    let mut persistence = create_test_persistence();
    persistence
        .insert_audit_entry(&create_test_entry(AuditAction::Create, Some(1), "r-1", 0))
        .unwrap();
    persistence
        .insert_audit_entry(&create_test_entry(AuditAction::Create, Some(2), "r-2", 0))
        .unwrap();
    persistence
        .insert_audit_entry(&create_test_entry(AuditAction::Update, Some(1), "r-1", 3))
        .unwrap();
    persistence
        .insert_audit_entry(&create_test_entry(AuditAction::Create, None, "r-3", 0))
        .unwrap();

    let entries = persistence.list_create_entries(&[1]).unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].result_id(), Some("r-1"));

    assert!(persistence.list_create_entries(&[]).unwrap().is_empty());
}

#[test]
fn test_change_entries_are_newest_first() {
    let mut persistence = create_test_persistence();
    persistence
        .insert_audit_entry(&create_test_entry(AuditAction::Update, None, "r-1", 1))
        .unwrap();
    persistence
        .insert_audit_entry(&create_test_entry(AuditAction::Delete, None, "r-2", 9))
        .unwrap();
    persistence
        .insert_audit_entry(&create_test_entry(AuditAction::Create, None, "r-3", 20))
        .unwrap();

    let changes = persistence.list_change_entries().unwrap();
    let actions: Vec<AuditAction> = changes.iter().map(AuditEntry::action).collect();
    assert_eq!(actions, vec![AuditAction::Delete, AuditAction::Update]);

    let deletes = persistence.list_entries_by_action(AuditAction::Delete).unwrap();
    assert_eq!(deletes.len(), 1);
    assert_eq!(deletes[0].timestamp(), at(9));
}

#[test]
fn test_malformed_rows_are_skipped() {
    let mut persistence = create_test_persistence();
    persistence
        .insert_audit_entry(&create_test_entry(AuditAction::Update, None, "r-ok", 0))
        .unwrap();

    let BackendConnection::Sqlite(conn) = &mut persistence.conn else {
        panic!("expected SQLite backend");
    };
    diesel::sql_query(
        "INSERT INTO audit_entries (action, old_data, new_data, recorded_at, user_id) \
         VALUES ('update', 'not json', '{}', '2026-03-07T15:01:00.000000Z', 'admin-1')",
    )
    .execute(conn)
    .unwrap();

    let changes = persistence.list_change_entries().unwrap();
    assert_eq!(changes.len(), 1);
    assert_eq!(changes[0].result_id(), Some("r-ok"));
}

#[test]
fn test_rolled_back_transaction_discards_audit_row() {
    let mut persistence = create_test_persistence();

    let outcome: Result<i64, PersistenceError> = persistence.transaction(|tx| {
        tx.insert_audit_entry(&create_test_entry(AuditAction::Delete, None, "r-1", 0))?;
        Err(PersistenceError::QueryFailed(String::from("caller aborted")))
    });

    assert!(outcome.is_err());
    assert!(persistence.list_change_entries().unwrap().is_empty());
}

#[test]
fn test_committed_transaction_keeps_audit_row() {
    let mut persistence = create_test_persistence();

    let id = persistence
        .transaction(|tx| tx.insert_audit_entry(&create_test_entry(AuditAction::Delete, None, "r-1", 0)))
        .unwrap();

    assert!(persistence.get_audit_entry(id).unwrap().is_some());
}
