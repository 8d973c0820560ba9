// SPDX-FileCopyrightText: 2026 KidsTunes Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Request record queries.
//!
//! Rows are decoded by column name. Status changes are written as a single
//! `UPDATE ... WHERE id = ? AND status = ?`, so two callers racing on the same
//! record cannot both win.

use std::str::FromStr;

use kidstunes_core::types::{ApprovalRef, NewRequest, OriginRef, Request, RequestId, RequestUpdate};
use kidstunes_core::{KidsTunesError, RequestStatus};
use rusqlite::types::{Type, Value};
use rusqlite::{OptionalExtension, Row, params, params_from_iter};
use tracing::debug;

use crate::database::Database;

const SELECT_COLUMNS: &str = "SELECT id, requester_id, requester_name, original_query,
        origin_channel_id, origin_message_id, refined_query, artist, song, album,
        status, approval_message_ref, source_url, source_title, file_path,
        error_message, created_at, updated_at
     FROM requests";

fn request_from_row(row: &Row<'_>) -> Result<Request, rusqlite::Error> {
    let status: String = row.get("status")?;
    let status = RequestStatus::from_str(&status).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(
            row.as_ref().column_index("status").unwrap_or(0),
            Type::Text,
            Box::new(e),
        )
    })?;

    let origin_channel: Option<String> = row.get("origin_channel_id")?;
    let origin_message: Option<String> = row.get("origin_message_id")?;
    let origin = match (origin_channel, origin_message) {
        (Some(channel_id), Some(message_id)) => Some(OriginRef {
            channel_id,
            message_id,
        }),
        _ => None,
    };

    Ok(Request {
        id: RequestId(row.get("id")?),
        requester_id: row.get("requester_id")?,
        requester_name: row.get("requester_name")?,
        original_query: row.get("original_query")?,
        origin,
        refined_query: row.get("refined_query")?,
        artist: row.get("artist")?,
        song: row.get("song")?,
        album: row.get("album")?,
        status,
        approval_ref: row
            .get::<_, Option<String>>("approval_message_ref")?
            .map(ApprovalRef),
        source_url: row.get("source_url")?,
        source_title: row.get("source_title")?,
        file_path: row.get("file_path")?,
        error_message: row.get("error_message")?,
        created_at: row.get("created_at")?,
        updated_at: row.get("updated_at")?,
    })
}

/// Insert a new `pending` record. Returns the assigned id.
pub async fn insert(db: &Database, request: &NewRequest) -> Result<RequestId, KidsTunesError> {
    let requester_id = request.requester_id.clone();
    let requester_name = request.requester_name.clone();
    let original_query = request.original_query.clone();
    let (origin_channel, origin_message) = match &request.origin {
        Some(origin) => (
            Some(origin.channel_id.clone()),
            Some(origin.message_id.clone()),
        ),
        None => (None, None),
    };
    let refined_query = request.resolution.refined_query.clone();
    let artist = request.resolution.artist.clone();
    let song = request.resolution.song.clone();
    let album = request.album().to_string();

    db.connection()
        .call(move |conn| -> Result<RequestId, rusqlite::Error> {
            conn.execute(
                "INSERT INTO requests (requester_id, requester_name, original_query,
                     origin_channel_id, origin_message_id, refined_query, artist, song,
                     album, status)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, 'pending')",
                params![
                    requester_id,
                    requester_name,
                    original_query,
                    origin_channel,
                    origin_message,
                    refined_query,
                    artist,
                    song,
                    album,
                ],
            )?;
            Ok(RequestId(conn.last_insert_rowid()))
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Fetch a record by id.
pub async fn get(db: &Database, id: RequestId) -> Result<Option<Request>, KidsTunesError> {
    db.connection()
        .call(move |conn| -> Result<Option<Request>, rusqlite::Error> {
            conn.query_row(
                &format!("{SELECT_COLUMNS} WHERE id = ?1"),
                params![id.0],
                request_from_row,
            )
            .optional()
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Fetch the record tied to an approval message.
pub async fn get_by_approval_ref(
    db: &Database,
    approval_ref: &ApprovalRef,
) -> Result<Option<Request>, KidsTunesError> {
    let approval_ref = approval_ref.0.clone();
    db.connection()
        .call(move |conn| -> Result<Option<Request>, rusqlite::Error> {
            conn.query_row(
                &format!("{SELECT_COLUMNS} WHERE approval_message_ref = ?1"),
                params![approval_ref],
                request_from_row,
            )
            .optional()
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Fetch every record pointing at `file_path`.
pub async fn get_by_file_path(
    db: &Database,
    file_path: &str,
) -> Result<Vec<Request>, KidsTunesError> {
    let file_path = file_path.to_string();
    db.connection()
        .call(move |conn| -> Result<Vec<Request>, rusqlite::Error> {
            let mut stmt = conn.prepare(&format!(
                "{SELECT_COLUMNS} WHERE file_path = ?1 ORDER BY id ASC"
            ))?;
            let rows = stmt.query_map(params![file_path], request_from_row)?;
            rows.collect::<Result<Vec<_>, _>>()
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// List records in `status`, oldest first.
pub async fn list_by_status(
    db: &Database,
    status: RequestStatus,
) -> Result<Vec<Request>, KidsTunesError> {
    let status = status.to_string();
    db.connection()
        .call(move |conn| -> Result<Vec<Request>, rusqlite::Error> {
            let mut stmt = conn.prepare(&format!(
                "{SELECT_COLUMNS} WHERE status = ?1 ORDER BY id ASC"
            ))?;
            let rows = stmt.query_map(params![status], request_from_row)?;
            rows.collect::<Result<Vec<_>, _>>()
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Set the approval reference once. Returns `false` if the record already has
/// one or does not exist.
pub async fn attach_approval_ref(
    db: &Database,
    id: RequestId,
    approval_ref: &ApprovalRef,
) -> Result<bool, KidsTunesError> {
    let approval_ref = approval_ref.0.clone();
    db.connection()
        .call(move |conn| -> Result<bool, rusqlite::Error> {
            let changed = conn.execute(
                "UPDATE requests SET approval_message_ref = ?2,
                 updated_at = strftime('%Y-%m-%dT%H:%M:%fZ', 'now')
                 WHERE id = ?1 AND approval_message_ref IS NULL",
                params![id.0, approval_ref],
            )?;
            Ok(changed == 1)
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Apply a partial update.
///
/// Returns `Ok(false)` when nothing was written: the update was empty, the
/// record does not exist, the requested status edge is not in the lifecycle
/// graph, or the persisted status no longer matches `from`.
pub async fn update(
    db: &Database,
    id: RequestId,
    update: &RequestUpdate,
) -> Result<bool, KidsTunesError> {
    if update.is_empty() {
        return Ok(false);
    }

    let completes = update.status.is_some_and(|change| {
        change.from == RequestStatus::Downloading && change.to == RequestStatus::Complete
    });
    if update.file_path.is_some() && !completes {
        return Err(KidsTunesError::Internal(format!(
            "request {id}: file_path may only be written with downloading -> complete"
        )));
    }

    if let Some(change) = update.status
        && !change.from.can_transition_to(change.to)
    {
        debug!(request_id = %id, from = %change.from, to = %change.to, "ignoring invalid transition");
        return Ok(false);
    }

    let mut assignments: Vec<&'static str> = Vec::new();
    let mut values: Vec<Value> = Vec::new();

    if let Some(change) = update.status {
        assignments.push("status = ?");
        values.push(Value::Text(change.to.to_string()));
    }
    for (column, value) in [
        ("source_url = ?", &update.source_url),
        ("source_title = ?", &update.source_title),
        ("file_path = ?", &update.file_path),
        ("error_message = ?", &update.error_message),
    ] {
        if let Some(value) = value {
            assignments.push(column);
            values.push(Value::Text(value.clone()));
        }
    }

    let mut sql = format!(
        "UPDATE requests SET {}, updated_at = strftime('%Y-%m-%dT%H:%M:%fZ', 'now') WHERE id = ?",
        assignments.join(", ")
    );
    values.push(Value::Integer(id.0));
    if let Some(change) = update.status {
        sql.push_str(" AND status = ?");
        values.push(Value::Text(change.from.to_string()));
    }

    db.connection()
        .call(move |conn| -> Result<bool, rusqlite::Error> {
            let changed = conn.execute(&sql, params_from_iter(values.iter()))?;
            Ok(changed == 1)
        })
        .await
        .map_err(crate::database::map_tr_err)
}

#[cfg(test)]
mod tests {
    use super::*;
    use kidstunes_core::types::Resolution;
    use tempfile::tempdir;

    async fn setup_db() -> (Database, tempfile::TempDir) {
        let dir = tempdir().unwrap();
        let path = dir.path().join("requests.db");
        let db = Database::open(path.to_str().unwrap()).await.unwrap();
        (db, dir)
    }

    fn new_request(query: &str) -> NewRequest {
        NewRequest {
            requester_id: "42".to_string(),
            requester_name: "kid".to_string(),
            original_query: query.to_string(),
            origin: Some(OriginRef {
                channel_id: "c1".to_string(),
                message_id: "m1".to_string(),
            }),
            resolution: Resolution::passthrough(query),
        }
    }

    #[tokio::test]
    async fn insert_and_get_round_trip() {
        let (db, _dir) = setup_db().await;
        let id = insert(&db, &new_request("no one like the lord")).await.unwrap();

        let request = get(&db, id).await.unwrap().unwrap();
        assert_eq!(request.id, id);
        assert_eq!(request.status, RequestStatus::Pending);
        assert_eq!(request.album, "Singles");
        assert_eq!(request.refined_query.as_deref(), Some("no one like the lord"));
        assert_eq!(request.origin.as_ref().unwrap().message_id, "m1");
        assert!(request.approval_ref.is_none());
        assert!(request.created_at.ends_with('Z'));
    }

    #[tokio::test]
    async fn get_missing_returns_none() {
        let (db, _dir) = setup_db().await;
        assert!(get(&db, RequestId(999)).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn approval_ref_is_set_once() {
        let (db, _dir) = setup_db().await;
        let id = insert(&db, &new_request("q")).await.unwrap();
        let first = ApprovalRef("approval-1".to_string());
        let second = ApprovalRef("approval-2".to_string());

        assert!(attach_approval_ref(&db, id, &first).await.unwrap());
        assert!(!attach_approval_ref(&db, id, &second).await.unwrap());
        assert!(!attach_approval_ref(&db, RequestId(999), &second).await.unwrap());

        let found = get_by_approval_ref(&db, &first).await.unwrap().unwrap();
        assert_eq!(found.id, id);
        assert!(get_by_approval_ref(&db, &second).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn conditional_update_applies_once() {
        let (db, _dir) = setup_db().await;
        let id = insert(&db, &new_request("q")).await.unwrap();
        let claim = RequestUpdate::transition(RequestStatus::Pending, RequestStatus::Approved);

        assert!(update(&db, id, &claim).await.unwrap());
        assert!(!update(&db, id, &claim).await.unwrap());

        let reject = RequestUpdate::transition(RequestStatus::Pending, RequestStatus::Rejected);
        assert!(!update(&db, id, &reject).await.unwrap());
        assert_eq!(get(&db, id).await.unwrap().unwrap().status, RequestStatus::Approved);
    }

    #[tokio::test]
    async fn invalid_edge_is_a_no_op() {
        let (db, _dir) = setup_db().await;
        let id = insert(&db, &new_request("q")).await.unwrap();
        let jump = RequestUpdate::transition(RequestStatus::Pending, RequestStatus::Downloading);
        assert!(!update(&db, id, &jump).await.unwrap());
        assert_eq!(get(&db, id).await.unwrap().unwrap().status, RequestStatus::Pending);
    }

    #[tokio::test]
    async fn file_path_without_completion_is_a_contract_violation() {
        let (db, _dir) = setup_db().await;
        let id = insert(&db, &new_request("q")).await.unwrap();
        let bad = RequestUpdate {
            file_path: Some("/tmp/x.mp3".to_string()),
            ..RequestUpdate::default()
        };
        let err = update(&db, id, &bad).await.unwrap_err();
        assert!(matches!(err, KidsTunesError::Internal(_)));
    }

    #[tokio::test]
    async fn full_download_path_updates_fields() {
        let (db, _dir) = setup_db().await;
        let id = insert(&db, &new_request("q")).await.unwrap();

        for change in [
            RequestUpdate::transition(RequestStatus::Pending, RequestStatus::Approved),
            RequestUpdate::transition(RequestStatus::Approved, RequestStatus::Downloading),
            RequestUpdate::source("https://example.com/watch?v=1", "Some Title"),
            RequestUpdate::complete("/out/Unknown Artist/Singles/Unknown Song.mp3"),
        ] {
            assert!(update(&db, id, &change).await.unwrap());
        }

        let request = get(&db, id).await.unwrap().unwrap();
        assert_eq!(request.status, RequestStatus::Complete);
        assert_eq!(request.source_title.as_deref(), Some("Some Title"));
        assert_eq!(
            request.file_path.as_deref(),
            Some("/out/Unknown Artist/Singles/Unknown Song.mp3")
        );

        let by_path = get_by_file_path(&db, "/out/Unknown Artist/Singles/Unknown Song.mp3")
            .await
            .unwrap();
        assert_eq!(by_path.len(), 1);
        assert_eq!(by_path[0].id, id);
    }

    #[tokio::test]
    async fn failure_records_message_and_retry_keeps_it() {
        let (db, _dir) = setup_db().await;
        let id = insert(&db, &new_request("q")).await.unwrap();
        update(&db, id, &RequestUpdate::transition(RequestStatus::Pending, RequestStatus::Approved))
            .await
            .unwrap();
        update(&db, id, &RequestUpdate::transition(RequestStatus::Approved, RequestStatus::Downloading))
            .await
            .unwrap();
        assert!(update(&db, id, &RequestUpdate::failed("no results")).await.unwrap());
        assert!(update(&db, id, &RequestUpdate::transition(RequestStatus::Failed, RequestStatus::Approved))
            .await
            .unwrap());

        let request = get(&db, id).await.unwrap().unwrap();
        assert_eq!(request.status, RequestStatus::Approved);
        assert_eq!(request.error_message.as_deref(), Some("no results"));
    }

    #[tokio::test]
    async fn list_by_status_filters_and_orders() {
        let (db, _dir) = setup_db().await;
        let a = insert(&db, &new_request("a")).await.unwrap();
        let b = insert(&db, &new_request("b")).await.unwrap();
        let c = insert(&db, &new_request("c")).await.unwrap();
        update(&db, b, &RequestUpdate::transition(RequestStatus::Pending, RequestStatus::Rejected))
            .await
            .unwrap();

        let pending = list_by_status(&db, RequestStatus::Pending).await.unwrap();
        let ids: Vec<RequestId> = pending.iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![a, c]);
        assert_eq!(list_by_status(&db, RequestStatus::Rejected).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn updated_at_moves_on_mutation() {
        let (db, _dir) = setup_db().await;
        let id = insert(&db, &new_request("q")).await.unwrap();
        let before = get(&db, id).await.unwrap().unwrap();
        tokio::time::sleep(std::time::Duration::from_millis(5)).await;
        update(&db, id, &RequestUpdate::transition(RequestStatus::Pending, RequestStatus::Approved))
            .await
            .unwrap();
        let after = get(&db, id).await.unwrap().unwrap();
        assert_eq!(after.created_at, before.created_at);
        assert!(after.updated_at > before.updated_at);
    }
}
