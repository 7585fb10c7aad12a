// src/db/layouts.rs

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use rusqlite::{params, OptionalExtension};

use crate::db::connection::Database;
use crate::domain::layout::{ColumnId, LayoutPreferences};
use crate::domain::query::StatusFilter;
use crate::errors::ServerError;

/// Stored preferences for `user_id`, or the defaults when none were saved.
/// Orders that are no longer valid permutations fall back to the default.
pub fn load_layout(db: &Database, user_id: &str) -> Result<LayoutPreferences, ServerError> {
    let row = db.with_conn(|conn| {
        conn.query_row(
            "select column_order, status_tab_order, hidden_columns
             from layout_preferences where user_id = ?",
            params![user_id],
            |r| {
                Ok((
                    r.get::<_, String>(0)?,
                    r.get::<_, String>(1)?,
                    r.get::<_, String>(2)?,
                ))
            },
        )
        .optional()
        .map_err(|e| ServerError::DbError(format!("load layout failed: {e}")))
    })?;

    let Some((columns, tabs, hidden)) = row else {
        return Ok(LayoutPreferences::default());
    };

    // A row we cannot decode is treated like a missing one.
    let decoded = (|| -> Result<LayoutPreferences, serde_json::Error> {
        Ok(LayoutPreferences {
            column_order: serde_json::from_str::<Vec<ColumnId>>(&columns)?,
            status_tab_order: serde_json::from_str::<Vec<StatusFilter>>(&tabs)?,
            hidden_columns: serde_json::from_str::<BTreeSet<ColumnId>>(&hidden)?,
        })
    })();

    match decoded {
        Ok(prefs) => Ok(prefs.normalized()),
        Err(e) => {
            tracing::warn!(user_id, error = %e, "stored layout unreadable, using defaults");
            Ok(LayoutPreferences::default())
        }
    }
}

/// Upserts the preferences for `user_id`. Invalid orders are rejected.
pub fn save_layout(
    db: &Database,
    user_id: &str,
    prefs: &LayoutPreferences,
    now: DateTime<Utc>,
) -> Result<(), ServerError> {
    if !prefs.is_valid() {
        return Err(ServerError::Validation(
            "column and tab orders must list every symbol exactly once".into(),
        ));
    }

    let columns = serde_json::to_string(&prefs.column_order)?;
    let tabs = serde_json::to_string(&prefs.status_tab_order)?;
    let hidden = serde_json::to_string(&prefs.hidden_columns)?;

    db.with_conn(|conn| {
        conn.execute(
            "insert into layout_preferences
                 (user_id, column_order, status_tab_order, hidden_columns, updated_at)
             values (?1, ?2, ?3, ?4, ?5)
             on conflict(user_id) do update set
                 column_order = excluded.column_order,
                 status_tab_order = excluded.status_tab_order,
                 hidden_columns = excluded.hidden_columns,
                 updated_at = excluded.updated_at",
            params![user_id, columns, tabs, hidden, now],
        )
        .map_err(|e| ServerError::DbError(format!("save layout failed: {e}")))?;
        Ok(())
    })
}
