// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use serde_json::json;
use tally_audit::SessionClosure;
use tally_domain::{AuditAction, EntryMethod};

use super::helpers::{
    at, create_session_request, create_test_persistence, open_test_session, record_request,
};
use crate::{
    ApiError, EndSessionRequest, UpdateFilePathRequest, create_session, end_session,
    get_event_sessions, record, update_file_path,
};

fn assert_invalid_field(result: Result<impl std::fmt::Debug, ApiError>, expected: &str) {
    match result {
        Err(ApiError::InvalidInput { field, .. }) => assert_eq!(field, expected),
        other => panic!("expected invalid input for {expected}, got {other:?}"),
    }
}

#[test]
fn test_record_create_is_stored() {
    let mut persistence = create_test_persistence();
    let request = record_request(
        "create",
        None,
        None,
        Some(json!({"event_id": "evt-1", "competitor_name": "Jane Doe", "score": 120.0})),
    );

    let entry = record(&mut persistence, request, at(0)).unwrap();
    let id = entry.id().unwrap();

    let stored = persistence.get_audit_entry(id).unwrap().unwrap();
    assert_eq!(stored.action(), AuditAction::Create);
    assert_eq!(stored.new_data(), entry.new_data());
    assert_eq!(stored.timestamp(), at(0));
}

#[test]
fn test_record_rejects_presence_violations_without_writing() {
    let mut persistence = create_test_persistence();

    let with_old = record_request("create", None, Some(json!({"score": 1})), Some(json!({"score": 2})));
    assert_invalid_field(record(&mut persistence, with_old, at(0)), "oldData");

    let without_new = record_request("update", None, Some(json!({"score": 1})), None);
    assert_invalid_field(record(&mut persistence, without_new, at(0)), "newData");

    let delete_with_new = record_request("delete", None, Some(json!({"score": 1})), Some(json!({"score": 2})));
    assert_invalid_field(record(&mut persistence, delete_with_new, at(0)), "newData");

    assert!(persistence.get_audit_entry(1).unwrap().is_none());
}

#[test]
fn test_record_rejects_unknown_action() {
    let mut persistence = create_test_persistence();
    let request = record_request("rename", None, None, Some(json!({"score": 1})));
    assert_invalid_field(record(&mut persistence, request, at(0)), "action");
}

#[test]
fn test_record_rejects_non_object_snapshot() {
    let mut persistence = create_test_persistence();
    let request = record_request("create", None, None, Some(json!([1, 2, 3])));
    assert_invalid_field(record(&mut persistence, request, at(0)), "newData");
}

#[test]
fn test_record_rejects_blank_actor() {
    let mut persistence = create_test_persistence();
    let mut request = record_request("create", None, None, Some(json!({"score": 1})));
    request.user_id = String::from("  ");
    assert_invalid_field(record(&mut persistence, request, at(0)), "userId");
}

#[test]
fn test_record_rolls_back_with_caller_transaction() {
    let mut persistence = create_test_persistence();

    let outcome: Result<(), ApiError> = persistence.transaction(|tx| {
        let request = record_request("delete", None, Some(json!({"event_id": "evt-1"})), None);
        record(tx, request, at(0))?;
        Err(ApiError::Internal {
            message: String::from("result delete failed"),
        })
    });

    assert!(outcome.is_err());
    assert!(persistence.list_change_entries().unwrap().is_empty());
}

#[test]
fn test_import_session_lifecycle() {
    let mut persistence = create_test_persistence();
    let session = open_test_session(&mut persistence, "evt-1", "excel", 0);
    assert_eq!(session.result_count, 0);
    assert!(session.session_end.is_none());

    let closure = end_session(
        &mut persistence,
        session.id,
        EndSessionRequest { result_count: 40 },
        at(3),
    )
    .unwrap();
    assert_eq!(closure, SessionClosure::Closed { result_count: 40 });

    let summaries = get_event_sessions(&mut persistence, "evt-1", at(4));
    assert_eq!(summaries.len(), 1);
    assert_eq!(summaries[0].session.result_count, 40);
    assert_eq!(summaries[0].session.entry_method, EntryMethod::Excel);
    assert_eq!(summaries[0].session.session_end, Some(at(3)));
}

#[test]
fn test_second_end_session_keeps_first_count() {
    let mut persistence = create_test_persistence();
    let session = open_test_session(&mut persistence, "evt-1", "manual", 0);

    end_session(&mut persistence, session.id, EndSessionRequest { result_count: 5 }, at(1)).unwrap();
    let again = end_session(&mut persistence, session.id, EndSessionRequest { result_count: 9 }, at(2)).unwrap();

    assert_eq!(again, SessionClosure::AlreadyClosed { result_count: 5 });
    let stored = persistence.get_entry_session(session.id).unwrap().unwrap();
    assert_eq!(stored.result_count, 5);
}

#[test]
fn test_end_session_on_unknown_session_is_noop() {
    let mut persistence = create_test_persistence();
    let outcome = end_session(&mut persistence, 99, EndSessionRequest { result_count: 1 }, at(0)).unwrap();
    assert_eq!(outcome, SessionClosure::NotFound);
}

#[test]
fn test_end_session_rejects_negative_count() {
    let mut persistence = create_test_persistence();
    let session = open_test_session(&mut persistence, "evt-1", "manual", 0);
    assert_invalid_field(
        end_session(&mut persistence, session.id, EndSessionRequest { result_count: -2 }, at(1)),
        "resultCount",
    );
}

#[test]
fn test_create_session_validates_input() {
    let mut persistence = create_test_persistence();

    let unknown_method = create_session_request("evt-1", "fax");
    assert_invalid_field(create_session(&mut persistence, unknown_method, at(0)), "entryMethod");

    let blank_event = create_session_request(" ", "manual");
    assert_invalid_field(create_session(&mut persistence, blank_event, at(0)), "eventId");
}

#[test]
fn test_update_file_path_respects_attach_window() {
    let mut persistence = create_test_persistence();
    let session = open_test_session(&mut persistence, "evt-1", "excel", 0);
    let request = UpdateFilePathRequest {
        file_path: String::from("audit-logs/uploads/evt-1/1.xlsx"),
    };

    let open = update_file_path(&mut persistence, session.id, &request, at(1)).unwrap();
    assert_eq!(open.file_path.as_deref(), Some("audit-logs/uploads/evt-1/1.xlsx"));

    end_session(&mut persistence, session.id, EndSessionRequest { result_count: 2 }, at(10)).unwrap();
    assert!(update_file_path(&mut persistence, session.id, &request, at(25)).is_ok());
    assert_invalid_field(
        update_file_path(&mut persistence, session.id, &request, at(26)),
        "filePath",
    );
}

#[test]
fn test_update_file_path_on_unknown_session_is_not_found() {
    let mut persistence = create_test_persistence();
    let request = UpdateFilePathRequest {
        file_path: String::from("x.csv"),
    };

    let result = update_file_path(&mut persistence, 404, &request, at(0));
    assert!(matches!(result, Err(ApiError::ResourceNotFound { .. })));
}
