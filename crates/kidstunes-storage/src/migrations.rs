// SPDX-FileCopyrightText: 2026 KidsTunes Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Schema management: embedded refinery migrations followed by an ordered list
//! of additive, idempotent schema changes.
//!
//! Refinery owns the versioned base schema. Everything after it is expressed as
//! [`SchemaChange`]s that check the live schema before acting, so applying the
//! list to a database that already has a column or index is a no-op.

use kidstunes_core::KidsTunesError;
use tracing::debug;

use crate::database::storage_err;

mod embedded {
    use refinery::embed_migrations;
    embed_migrations!("migrations");
}

/// One additive schema change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchemaChange {
    /// Add a column to a table unless it already exists.
    AddColumn {
        table: &'static str,
        column: &'static str,
        definition: &'static str,
    },
    /// Create an index unless it already exists.
    CreateIndex {
        name: &'static str,
        sql: &'static str,
    },
}

/// Additive changes applied in order after the versioned migrations.
pub const SCHEMA_CHANGES: &[SchemaChange] = &[
    SchemaChange::AddColumn {
        table: "requests",
        column: "refined_query",
        definition: "TEXT",
    },
    SchemaChange::AddColumn {
        table: "requests",
        column: "artist",
        definition: "TEXT",
    },
    SchemaChange::AddColumn {
        table: "requests",
        column: "song",
        definition: "TEXT",
    },
    SchemaChange::AddColumn {
        table: "requests",
        column: "album",
        definition: "TEXT NOT NULL DEFAULT 'Singles'",
    },
    SchemaChange::AddColumn {
        table: "requests",
        column: "origin_channel_id",
        definition: "TEXT",
    },
    SchemaChange::AddColumn {
        table: "requests",
        column: "origin_message_id",
        definition: "TEXT",
    },
    SchemaChange::CreateIndex {
        name: "idx_requests_approval_ref",
        sql: "CREATE UNIQUE INDEX IF NOT EXISTS idx_requests_approval_ref
              ON requests(approval_message_ref)
              WHERE approval_message_ref IS NOT NULL",
    },
    SchemaChange::CreateIndex {
        name: "idx_requests_file_path",
        sql: "CREATE INDEX IF NOT EXISTS idx_requests_file_path ON requests(file_path)",
    },
];

/// Run all pending migrations against the given connection.
///
/// Refinery tracks applied migrations in its own `refinery_schema_history` table.
pub fn run_migrations(conn: &mut rusqlite::Connection) -> Result<(), KidsTunesError> {
    embedded::migrations::runner()
        .run(conn)
        .map_err(|e| KidsTunesError::Storage {
            source: Box::new(e),
        })?;
    apply_schema_changes(conn, SCHEMA_CHANGES).map_err(storage_err)?;
    Ok(())
}

/// Apply `changes` in order, skipping any that are already present.
pub fn apply_schema_changes(
    conn: &rusqlite::Connection,
    changes: &[SchemaChange],
) -> Result<(), rusqlite::Error> {
    for change in changes {
        match *change {
            SchemaChange::AddColumn {
                table,
                column,
                definition,
            } => {
                if column_exists(conn, table, column)? {
                    continue;
                }
                conn.execute_batch(&format!(
                    "ALTER TABLE {table} ADD COLUMN {column} {definition};"
                ))?;
                debug!(table, column, "added column");
            }
            SchemaChange::CreateIndex { name, sql } => {
                conn.execute_batch(sql)?;
                debug!(index = name, "ensured index");
            }
        }
    }
    Ok(())
}

/// Whether `table` currently has a column named `column`.
pub fn column_exists(
    conn: &rusqlite::Connection,
    table: &str,
    column: &str,
) -> Result<bool, rusqlite::Error> {
    let mut stmt = conn.prepare(&format!("PRAGMA table_info({table})"))?;
    let mut rows = stmt.query([])?;
    while let Some(row) = rows.next()? {
        let name: String = row.get("name")?;
        if name == column {
            return Ok(true);
        }
    }
    Ok(false)
}
