// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use std::fs;
use std::path::Path;

use serde_json::json;
use tally_audit::SessionClosure;
use tally_domain::Snapshot;

use super::helpers::{
    at, create_session_request, create_test_persistence, open_test_session, unique_temp_dir,
};
use crate::{
    ApiError, ArtifactStore, EndSessionRequest, UpdateFilePathRequest, attach_upload,
    complete_manual_entry, content_type_for, create_session, end_session, get_session_file_path,
    resolve_and_stream, sanitize_component, update_file_path,
};

#[test]
fn test_upload_is_saved_linked_and_streamed() {
    let mut persistence = create_test_persistence();
    let store = ArtifactStore::new(unique_temp_dir("upload"));
    let mut request = create_session_request("evt-1", "excel");
    request.original_filename = Some(String::from("spring results.xlsx"));
    let session = create_session(&mut persistence, request, at(0)).unwrap();

    let linked = attach_upload(&mut persistence, &store, session.id, b"sheet-bytes", "spring results.xlsx", at(0))
        .unwrap();

    let expected: std::path::PathBuf = store
        .root()
        .join("uploads")
        .join("evt-1")
        .join(format!("{}_2026-03-07T15-00-00-000Z.xlsx", session.id));
    assert_eq!(linked.file_path.as_deref(), expected.to_str());
    assert_eq!(fs::read(&expected).unwrap(), b"sheet-bytes");

    let reported = get_session_file_path(&mut persistence, session.id).unwrap();
    assert_eq!(reported.file_path, linked.file_path);

    let download = resolve_and_stream(&mut persistence, &store, session.id).unwrap();
    assert_eq!(download.bytes, b"sheet-bytes");
    assert_eq!(download.filename, "spring results.xlsx");
    assert_eq!(
        download.content_type,
        "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet"
    );

    fs::remove_dir_all(store.root()).unwrap();
}

#[test]
fn test_manual_entry_snapshot_is_written_and_session_closed() {
    let mut persistence = create_test_persistence();
    let store = ArtifactStore::new(unique_temp_dir("manual"));
    let session = open_test_session(&mut persistence, "evt-1", "manual", 0);
    let rows = vec![
        Snapshot::from_value(json!({
            "mecaId": "70123",
            "competitor_name": "Jane Doe",
            "competitionClass": "Street 1",
            "format": "SPL",
            "score": 122.5,
            "placement": 1,
            "pointsEarned": 5,
        }))
        .unwrap(),
        Snapshot::from_value(json!({"competitor_name": "Sam Roe", "notes": "late, but ok"})).unwrap(),
    ];

    let closure = complete_manual_entry(&mut persistence, &store, session.id, &rows, at(4)).unwrap();
    assert_eq!(closure, SessionClosure::Closed { result_count: 2 });

    let stored = persistence.get_entry_session(session.id).unwrap().unwrap();
    assert_eq!(stored.result_count, 2);
    let file_path = stored.file_path.unwrap();
    assert!(file_path.ends_with(&format!("manual_{}_2026-03-07T15-04-00-000Z.csv", session.id)));

    let contents = fs::read_to_string(&file_path).unwrap();
    let lines: Vec<&str> = contents.lines().collect();
    assert_eq!(
        lines[0],
        "Member ID,Name,Class,Format,Score,Placement,Points,Wattage,Frequency,Vehicle Info,Notes"
    );
    assert_eq!(lines[1], "70123,Jane Doe,Street 1,SPL,122.5,1,5,,,,");
    assert_eq!(lines[2], ",Sam Roe,,,,,,,,,\"late, but ok\"");

    let download = resolve_and_stream(&mut persistence, &store, session.id).unwrap();
    assert_eq!(download.content_type, "text/csv");

    fs::remove_dir_all(store.root()).unwrap();
}

#[test]
fn test_download_not_found_cases() {
    let mut persistence = create_test_persistence();
    let store = ArtifactStore::new(unique_temp_dir("missing"));

    let unknown = resolve_and_stream(&mut persistence, &store, 404);
    assert!(matches!(unknown, Err(ApiError::ResourceNotFound { .. })));

    let session = open_test_session(&mut persistence, "evt-1", "manual", 0);
    let no_path = resolve_and_stream(&mut persistence, &store, session.id);
    assert!(matches!(no_path, Err(ApiError::ResourceNotFound { .. })));

    let gone = store.root().join("gone.xlsx");
    update_file_path(
        &mut persistence,
        session.id,
        &UpdateFilePathRequest {
            file_path: gone.to_string_lossy().into_owned(),
        },
        at(1),
    )
    .unwrap();
    let missing_file = resolve_and_stream(&mut persistence, &store, session.id);
    assert!(matches!(missing_file, Err(ApiError::ResourceNotFound { .. })));
}

#[test]
fn test_linked_file_outside_store_root_is_not_served() {
    let mut persistence = create_test_persistence();
    let store = ArtifactStore::new(unique_temp_dir("confined"));
    fs::create_dir_all(store.root()).unwrap();
    let outside_dir = unique_temp_dir("outside");
    fs::create_dir_all(&outside_dir).unwrap();
    let secret = outside_dir.join("secret.txt");
    fs::write(&secret, b"not for download").unwrap();

    let session = open_test_session(&mut persistence, "evt-1", "termlab", 0);
    update_file_path(
        &mut persistence,
        session.id,
        &UpdateFilePathRequest {
            file_path: secret.to_string_lossy().into_owned(),
        },
        at(1),
    )
    .unwrap();

    let absolute = resolve_and_stream(&mut persistence, &store, session.id);
    assert!(matches!(absolute, Err(ApiError::ResourceNotFound { .. })));

    let escape = format!(
        "../{}/secret.txt",
        outside_dir.file_name().unwrap().to_string_lossy()
    );
    update_file_path(
        &mut persistence,
        session.id,
        &UpdateFilePathRequest { file_path: escape },
        at(2),
    )
    .unwrap();
    let relative = resolve_and_stream(&mut persistence, &store, session.id);
    assert!(matches!(relative, Err(ApiError::ResourceNotFound { .. })));

    fs::remove_dir_all(store.root()).unwrap();
    fs::remove_dir_all(&outside_dir).unwrap();
}

#[test]
fn test_relative_path_inside_store_root_is_served() {
    let mut persistence = create_test_persistence();
    let store = ArtifactStore::new(unique_temp_dir("relative"));
    fs::create_dir_all(store.root().join("uploads")).unwrap();
    fs::write(store.root().join("uploads").join("termlab.txt"), b"scores").unwrap();

    let session = open_test_session(&mut persistence, "evt-1", "termlab", 0);
    update_file_path(
        &mut persistence,
        session.id,
        &UpdateFilePathRequest {
            file_path: String::from("uploads/termlab.txt"),
        },
        at(1),
    )
    .unwrap();

    let download = resolve_and_stream(&mut persistence, &store, session.id).unwrap();
    assert_eq!(download.bytes, b"scores");
    assert_eq!(download.filename, "termlab.txt");
    assert_eq!(download.content_type, "text/plain");

    fs::remove_dir_all(store.root()).unwrap();
}

#[test]
fn test_upload_records_client_filename_when_session_has_none() {
    let mut persistence = create_test_persistence();
    let store = ArtifactStore::new(unique_temp_dir("named"));
    let session = open_test_session(&mut persistence, "evt-1", "excel", 0);
    assert_eq!(session.original_filename, None);

    let linked = attach_upload(
        &mut persistence,
        &store,
        session.id,
        b"sheet-bytes",
        "exports/Spring Results.xlsx",
        at(0),
    )
    .unwrap();
    assert_eq!(linked.original_filename.as_deref(), Some("Spring Results.xlsx"));

    let stored = persistence.get_entry_session(session.id).unwrap().unwrap();
    assert_eq!(stored.original_filename.as_deref(), Some("Spring Results.xlsx"));

    let download = resolve_and_stream(&mut persistence, &store, session.id).unwrap();
    assert_eq!(download.filename, "Spring Results.xlsx");

    fs::remove_dir_all(store.root()).unwrap();
}

#[test]
fn test_upload_keeps_filename_given_at_session_start() {
    let mut persistence = create_test_persistence();
    let store = ArtifactStore::new(unique_temp_dir("keepname"));
    let mut request = create_session_request("evt-1", "excel");
    request.original_filename = Some(String::from("opened.xlsx"));
    let session = create_session(&mut persistence, request, at(0)).unwrap();

    let linked = attach_upload(&mut persistence, &store, session.id, b"x", "renamed.xlsx", at(0)).unwrap();

    assert_eq!(linked.original_filename.as_deref(), Some("opened.xlsx"));
    let download = resolve_and_stream(&mut persistence, &store, session.id).unwrap();
    assert_eq!(download.filename, "opened.xlsx");

    fs::remove_dir_all(store.root()).unwrap();
}

#[test]
fn test_upload_after_attach_window_is_rejected() {
    let mut persistence = create_test_persistence();
    let store = ArtifactStore::new(unique_temp_dir("late"));
    let session = open_test_session(&mut persistence, "evt-1", "excel", 0);
    end_session(&mut persistence, session.id, EndSessionRequest { result_count: 1 }, at(1)).unwrap();

    let result = attach_upload(&mut persistence, &store, session.id, b"x", "late.csv", at(30));

    assert!(matches!(result, Err(ApiError::InvalidInput { .. })));
    assert!(!store.root().exists());
}

#[test]
fn test_path_components_are_sanitized() {
    assert_eq!(sanitize_component("evt-1_A"), "evt-1_A");
    assert_eq!(sanitize_component("evt/../1 a"), "evt____1_a");
    assert_eq!(sanitize_component(""), "unknown");
}

#[test]
fn test_content_types_follow_extension() {
    assert_eq!(content_type_for(Path::new("a/b.CSV")), "text/csv");
    assert_eq!(content_type_for(Path::new("a/b.xls")), "application/vnd.ms-excel");
    assert_eq!(content_type_for(Path::new("a/b")), "application/octet-stream");
}
