// src/db/leads.rs
//
// The lead store. Every mutation runs inside one transaction; `list_leads`
// is a single SELECT and therefore a consistent snapshot.

use chrono::{DateTime, Utc};
use rusqlite::types::Type;
use rusqlite::{params, Connection, ErrorCode, OptionalExtension, Row};
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::db::connection::Database;
use crate::domain::bulk::{BulkReport, Outcome};
use crate::domain::lead::{
    dedupe_tags, format_phone, Lead, LeadDraft, LeadStatus, Note, PropertyType, Temperature,
};
use crate::domain::session::SessionContext;
use crate::errors::ServerError;

/// Audit mode includes soft-deleted leads.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Visibility {
    ActiveOnly,
    IncludeDeleted,
}

const LEAD_COLUMNS: &str = "id, brokerage_id, assigned_agent_id, \
    first_name, last_name, email, phone, \
    status, temperature, source, tags, \
    property_type, property_address, budget, estimated_deal_value, \
    secondary_contact, dob, wedding_anniversary, home_anniversary, notes, \
    created_at, updated_at, is_deleted, deleted_at";

// ---------------------------------------------------------------------------
// Create / update / delete
// ---------------------------------------------------------------------------

/// Validates, fills defaults and inserts a new lead.
pub fn create_lead(
    db: &Database,
    ctx: &SessionContext,
    draft: &LeadDraft,
    now: DateTime<Utc>,
) -> Result<Lead, ServerError> {
    ensure_required(&draft.missing_required_fields())?;

    let lead = Lead::from_draft(draft, ctx, now);
    db.with_conn(|conn| insert_lead(conn, &lead))?;

    tracing::info!(lead_id = %lead.id, brokerage = %lead.brokerage_id, "lead created");
    Ok(lead)
}

/// Replaces the stored record with `lead`. See [`update_lead_checked`].
pub fn update_lead(db: &Database, lead: &Lead, now: DateTime<Utc>) -> Result<Lead, ServerError> {
    update_lead_checked(db, lead, None, now)
}

/// Replaces the stored record matching `lead.id`.
///
/// `created_at`, the journal and the soft-delete fields stay as stored; the
/// deal value is re-derived and `updated_at` becomes `now`. When
/// `expected_updated_at` is given and differs from the stored version the
/// write is refused with `Conflict`.
pub fn update_lead_checked(
    db: &Database,
    lead: &Lead,
    expected_updated_at: Option<DateTime<Utc>>,
    now: DateTime<Utc>,
) -> Result<Lead, ServerError> {
    let missing: Vec<&str> = [
        ("first_name", &lead.first_name),
        ("last_name", &lead.last_name),
        ("email", &lead.email),
        ("phone", &lead.phone),
    ]
    .into_iter()
    .filter(|(_, v)| v.trim().is_empty())
    .map(|(k, _)| k)
    .collect();
    ensure_required(&missing)?;

    db.with_conn(|conn| {
        let tx = conn.transaction()?;

        let stored = fetch_lead(&tx, &lead.id)?
            .ok_or_else(|| ServerError::LeadNotFound(lead.id.clone()))?;

        if let Some(expected) = expected_updated_at {
            if stored.updated_at != expected {
                return Err(ServerError::Conflict(format!(
                    "lead {} was modified at {}",
                    lead.id, stored.updated_at
                )));
            }
        }

        let mut next = lead.clone();
        next.created_at = stored.created_at;
        next.notes = stored.notes;
        next.is_deleted = stored.is_deleted;
        next.deleted_at = stored.deleted_at;
        next.phone = format_phone(&next.phone);
        next.tags = dedupe_tags(next.tags.iter().map(String::as_str));
        next.set_budget(next.budget);
        next.updated_at = now;

        write_lead(&tx, &next)?;
        tx.commit()?;
        Ok(next)
    })
}

/// Marks a lead deleted. A second call is a no-op that keeps the first `deleted_at`.
pub fn soft_delete_lead(db: &Database, id: &str, now: DateTime<Utc>) -> Result<(), ServerError> {
    let outcome = db.with_conn(|conn| {
        let tx = conn.transaction()?;
        let outcome = soft_delete_in(&tx, id, now)?;
        tx.commit()?;
        Ok(outcome)
    })?;

    match outcome {
        Outcome::NotFound => Err(ServerError::LeadNotFound(id.to_string())),
        Outcome::Applied => {
            tracing::info!(lead_id = id, "lead soft-deleted");
            Ok(())
        }
        Outcome::Unchanged => Ok(()),
    }
}

/// Undo for soft-delete.
pub fn restore_lead(db: &Database, id: &str, now: DateTime<Utc>) -> Result<Lead, ServerError> {
    db.with_conn(|conn| {
        let tx = conn.transaction()?;
        let mut lead =
            fetch_lead(&tx, id)?.ok_or_else(|| ServerError::LeadNotFound(id.to_string()))?;

        if lead.is_deleted {
            lead.is_deleted = false;
            lead.deleted_at = None;
            lead.updated_at = now;
            write_lead(&tx, &lead)?;
        }

        tx.commit()?;
        Ok(lead)
    })
}

// ---------------------------------------------------------------------------
// Single-field mutations on active leads
// ---------------------------------------------------------------------------

pub fn toggle_tag(db: &Database, id: &str, tag: &str, now: DateTime<Utc>) -> Result<Lead, ServerError> {
    let tag = non_empty(tag, "tag")?;
    modify_active(db, id, now, |lead| {
        lead.toggle_tag(tag);
        Ok(())
    })
    .map(|(lead, _)| lead)
}

pub fn set_status(
    db: &Database,
    id: &str,
    status: LeadStatus,
    now: DateTime<Utc>,
) -> Result<Lead, ServerError> {
    modify_active(db, id, now, |lead| {
        lead.status = status;
        Ok(())
    })
    .map(|(lead, _)| lead)
}

/// Appends a journal entry.
pub fn add_note(
    db: &Database,
    id: &str,
    author_name: &str,
    content: &str,
    now: DateTime<Utc>,
) -> Result<Note, ServerError> {
    let content = non_empty(content, "content")?;
    let author = match author_name.trim() {
        "" => "Agent",
        a => a,
    };

    modify_active(db, id, now, |lead| {
        let note = Note::new(author, content, now);
        lead.notes.push(note.clone());
        Ok(note)
    })
    .map(|(_, note)| note)
}

/// Loads an active lead, lets `f` change it, stamps `updated_at` and writes
/// it back in one transaction.
fn modify_active<T>(
    db: &Database,
    id: &str,
    now: DateTime<Utc>,
    f: impl FnOnce(&mut Lead) -> Result<T, ServerError>,
) -> Result<(Lead, T), ServerError> {
    db.with_conn(|conn| {
        let tx = conn.transaction()?;
        let mut lead = fetch_lead(&tx, id)?
            .filter(|l| !l.is_deleted)
            .ok_or_else(|| ServerError::LeadNotFound(id.to_string()))?;

        let out = f(&mut lead)?;
        lead.updated_at = now;

        write_lead(&tx, &lead)?;
        tx.commit()?;
        Ok((lead, out))
    })
}

// ---------------------------------------------------------------------------
// Reads
// ---------------------------------------------------------------------------

pub fn get_lead(db: &Database, id: &str, visibility: Visibility) -> Result<Lead, ServerError> {
    db.with_conn(|conn| fetch_lead(conn, id))?
        .filter(|l| visibility == Visibility::IncludeDeleted || !l.is_deleted)
        .ok_or_else(|| ServerError::LeadNotFound(id.to_string()))
}

/// Snapshot of the collection in insertion order.
pub fn list_leads(db: &Database, visibility: Visibility) -> Result<Vec<Lead>, ServerError> {
    let sql = match visibility {
        Visibility::ActiveOnly => {
            format!("select {LEAD_COLUMNS} from leads where is_deleted = 0 order by rowid")
        }
        Visibility::IncludeDeleted => format!("select {LEAD_COLUMNS} from leads order by rowid"),
    };

    db.with_conn(|conn| {
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt.query_map([], row_to_lead)?;

        let mut out = Vec::new();
        for r in rows {
            out.push(r?);
        }
        Ok(out)
    })
}

// ---------------------------------------------------------------------------
// Batch writes
// ---------------------------------------------------------------------------

/// Adds `tag` to every active lead in `ids` that lacks it. One transaction:
/// either the whole batch commits or nothing does.
pub fn apply_tag_many(
    db: &Database,
    ids: &[String],
    tag: &str,
    now: DateTime<Utc>,
) -> Result<BulkReport, ServerError> {
    let tag = non_empty(tag, "tag")?;

    db.with_conn(|conn| {
        let tx = conn.transaction()?;
        let mut report = BulkReport::default();

        for id in ids {
            let lead = fetch_lead(&tx, id)?.filter(|l| !l.is_deleted);
            let outcome = match lead {
                None => Outcome::NotFound,
                Some(mut lead) => {
                    if lead.add_tag(tag) {
                        lead.updated_at = now;
                        write_lead(&tx, &lead)?;
                        Outcome::Applied
                    } else {
                        Outcome::Unchanged
                    }
                }
            };
            report.push(id, outcome);
        }

        tx.commit()?;
        Ok(report)
    })
}

/// Soft-deletes every lead in `ids` with one shared `deleted_at`.
pub fn soft_delete_many(
    db: &Database,
    ids: &[String],
    now: DateTime<Utc>,
) -> Result<BulkReport, ServerError> {
    db.with_conn(|conn| {
        let tx = conn.transaction()?;
        let mut report = BulkReport::default();

        for id in ids {
            let outcome = soft_delete_in(&tx, id, now)?;
            report.push(id, outcome);
        }

        tx.commit()?;
        Ok(report)
    })
}

/// Inserts already-built leads (CSV import) in one transaction.
pub fn insert_leads(db: &Database, leads: &[Lead]) -> Result<(), ServerError> {
    db.with_conn(|conn| {
        let tx = conn.transaction()?;
        for lead in leads {
            insert_lead(&tx, lead)?;
        }
        tx.commit()?;
        Ok(())
    })
}

// ---------------------------------------------------------------------------
// Row plumbing
// ---------------------------------------------------------------------------

fn soft_delete_in(conn: &Connection, id: &str, now: DateTime<Utc>) -> Result<Outcome, ServerError> {
    let Some(mut lead) = fetch_lead(conn, id)? else {
        return Ok(Outcome::NotFound);
    };
    if lead.is_deleted {
        return Ok(Outcome::Unchanged);
    }

    lead.is_deleted = true;
    lead.deleted_at = Some(now);
    lead.updated_at = now;
    write_lead(conn, &lead)?;
    Ok(Outcome::Applied)
}

fn fetch_lead(conn: &Connection, id: &str) -> Result<Option<Lead>, ServerError> {
    let sql = format!("select {LEAD_COLUMNS} from leads where id = ?");
    conn.query_row(&sql, params![id], row_to_lead)
        .optional()
        .map_err(|e| ServerError::DbError(format!("lead lookup failed: {e}")))
}

fn insert_lead(conn: &Connection, lead: &Lead) -> Result<(), ServerError> {
    let sql = format!(
        "insert into leads ({LEAD_COLUMNS}) values \
         (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17, ?18, ?19, ?20, ?21, ?22, ?23, ?24)"
    );
    let budget = budget_to_sql(lead.budget)?;
    let deal_value = budget_to_sql(lead.estimated_deal_value)?;

    conn.execute(
        &sql,
        params![
            lead.id,
            lead.brokerage_id,
            lead.assigned_agent_id,
            lead.first_name,
            lead.last_name,
            lead.email,
            lead.phone,
            lead.status.as_str(),
            lead.temperature.as_str(),
            lead.source,
            to_json(&lead.tags)?,
            lead.property_type.as_str(),
            lead.property_address,
            budget,
            deal_value,
            lead.secondary_contact.as_ref().map(to_json).transpose()?,
            lead.dob,
            lead.wedding_anniversary,
            lead.home_anniversary,
            to_json(&lead.notes)?,
            lead.created_at,
            lead.updated_at,
            lead.is_deleted,
            lead.deleted_at,
        ],
    )
    .map_err(|e| match e {
        rusqlite::Error::SqliteFailure(err, _) if err.code == ErrorCode::ConstraintViolation => {
            ServerError::Conflict(format!("lead id {} already exists", lead.id))
        }
        e => ServerError::DbError(format!("insert lead failed: {e}")),
    })?;
    Ok(())
}

fn write_lead(conn: &Connection, lead: &Lead) -> Result<(), ServerError> {
    let budget = budget_to_sql(lead.budget)?;
    let deal_value = budget_to_sql(lead.estimated_deal_value)?;

    let changed = conn
        .execute(
            r#"
            update leads set
                brokerage_id = ?2, assigned_agent_id = ?3,
                first_name = ?4, last_name = ?5, email = ?6, phone = ?7,
                status = ?8, temperature = ?9, source = ?10, tags = ?11,
                property_type = ?12, property_address = ?13,
                budget = ?14, estimated_deal_value = ?15,
                secondary_contact = ?16, dob = ?17,
                wedding_anniversary = ?18, home_anniversary = ?19, notes = ?20,
                created_at = ?21, updated_at = ?22, is_deleted = ?23, deleted_at = ?24
            where id = ?1
            "#,
            params![
                lead.id,
                lead.brokerage_id,
                lead.assigned_agent_id,
                lead.first_name,
                lead.last_name,
                lead.email,
                lead.phone,
                lead.status.as_str(),
                lead.temperature.as_str(),
                lead.source,
                to_json(&lead.tags)?,
                lead.property_type.as_str(),
                lead.property_address,
                budget,
                deal_value,
                lead.secondary_contact.as_ref().map(to_json).transpose()?,
                lead.dob,
                lead.wedding_anniversary,
                lead.home_anniversary,
                to_json(&lead.notes)?,
                lead.created_at,
                lead.updated_at,
                lead.is_deleted,
                lead.deleted_at,
            ],
        )
        .map_err(|e| ServerError::DbError(format!("update lead failed: {e}")))?;

    if changed == 0 {
        return Err(ServerError::LeadNotFound(lead.id.clone()));
    }
    Ok(())
}

fn row_to_lead(row: &Row<'_>) -> rusqlite::Result<Lead> {
    Ok(Lead {
        id: row.get(0)?,
        brokerage_id: row.get(1)?,
        assigned_agent_id: row.get(2)?,
        first_name: row.get(3)?,
        last_name: row.get(4)?,
        email: row.get(5)?,
        phone: row.get(6)?,
        status: symbol_col(row, 7, LeadStatus::parse)?,
        temperature: symbol_col(row, 8, Temperature::parse)?,
        source: row.get(9)?,
        tags: json_col(row, 10)?,
        property_type: symbol_col(row, 11, PropertyType::parse)?,
        property_address: row.get(12)?,
        budget: unsigned_col(row, 13)?,
        estimated_deal_value: unsigned_col(row, 14)?,
        secondary_contact: match row.get::<_, Option<String>>(15)? {
            Some(_) => Some(json_col(row, 15)?),
            None => None,
        },
        dob: row.get(16)?,
        wedding_anniversary: row.get(17)?,
        home_anniversary: row.get(18)?,
        notes: json_col(row, 19)?,
        created_at: row.get(20)?,
        updated_at: row.get(21)?,
        is_deleted: row.get(22)?,
        deleted_at: row.get(23)?,
    })
}

fn symbol_col<T>(row: &Row<'_>, idx: usize, parse: fn(&str) -> Option<T>) -> rusqlite::Result<T> {
    let raw: String = row.get(idx)?;
    parse(&raw).ok_or_else(|| {
        rusqlite::Error::FromSqlConversionFailure(
            idx,
            Type::Text,
            format!("unknown symbol '{raw}'").into(),
        )
    })
}

fn json_col<T: DeserializeOwned>(row: &Row<'_>, idx: usize) -> rusqlite::Result<T> {
    let raw: String = row.get(idx)?;
    serde_json::from_str(&raw)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

fn unsigned_col(row: &Row<'_>, idx: usize) -> rusqlite::Result<u64> {
    let raw: i64 = row.get(idx)?;
    u64::try_from(raw)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Integer, Box::new(e)))
}

fn budget_to_sql(value: u64) -> Result<i64, ServerError> {
    i64::try_from(value).map_err(|_| ServerError::Validation(format!("budget {value} is too large")))
}

fn to_json<T: Serialize>(value: &T) -> Result<String, ServerError> {
    serde_json::to_string(value).map_err(|e| ServerError::DbError(format!("encode failed: {e}")))
}

fn ensure_required(missing: &[&str]) -> Result<(), ServerError> {
    if missing.is_empty() {
        Ok(())
    } else {
        Err(ServerError::Validation(format!(
            "missing required fields: {}",
            missing.join(", ")
        )))
    }
}

fn non_empty<'a>(value: &'a str, field: &str) -> Result<&'a str, ServerError> {
    match value.trim() {
        "" => Err(ServerError::Validation(format!("{field} must not be empty"))),
        v => Ok(v),
    }
}
