// src/spreadsheets/csv_import.rs
//
// Lenient CSV import. Headers are matched through an alias table, missing
// values are filled with placeholders, and rows that cannot be mapped are
// reported as skipped instead of failing the whole file.

use chrono::{DateTime, Utc};
use csv::{ReaderBuilder, StringRecord, Trim};
use serde::Serialize;

use crate::db::connection::Database;
use crate::db::leads::insert_leads;
use crate::domain::ids::short_suffix;
use crate::domain::lead::{Lead, LeadDraft, LeadStatus, PropertyType, Temperature, MAX_BUDGET};
use crate::domain::session::SessionContext;
use crate::errors::ServerError;

pub const IMPORT_FIRST_NAME: &str = "Imported";
pub const IMPORT_LAST_NAME: &str = "Lead";
pub const IMPORT_PHONE: &str = "(000) 000-0000";
pub const IMPORT_SOURCE: &str = "CSV Import";
pub const IMPORT_TAG: &str = "Imported";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "result", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RowResult {
    Imported { id: String },
    Skipped { reason: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RowOutcome {
    /// 1-based line in the input where the row starts.
    pub line: u64,
    #[serde(flatten)]
    pub result: RowResult,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ImportReport {
    pub imported: Vec<Lead>,
    pub outcomes: Vec<RowOutcome>,
}

impl ImportReport {
    pub fn imported_count(&self) -> usize {
        self.imported.len()
    }

    pub fn skipped_count(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|o| matches!(o.result, RowResult::Skipped { .. }))
            .count()
    }

    fn skip(&mut self, line: u64, reason: impl Into<String>) {
        let reason = reason.into();
        tracing::warn!(line, reason = %reason, "import row skipped");
        self.outcomes.push(RowOutcome {
            line,
            result: RowResult::Skipped { reason },
        });
    }
}

/// Parses `raw`, then writes every accepted lead in one transaction.
pub fn import_leads(
    db: &Database,
    ctx: &SessionContext,
    raw: &str,
    max_bytes: usize,
    now: DateTime<Utc>,
) -> Result<ImportReport, ServerError> {
    if raw.len() > max_bytes {
        return Err(ServerError::PayloadTooLarge {
            size: raw.len(),
            limit: max_bytes,
        });
    }

    let report = parse_leads(raw, ctx, now)?;
    insert_leads(db, &report.imported)?;

    tracing::info!(
        imported = report.imported_count(),
        skipped = report.skipped_count(),
        brokerage = %ctx.brokerage_id,
        "csv import finished"
    );
    Ok(report)
}

/// Maps a CSV blob to new leads without touching the store.
pub fn parse_leads(
    raw: &str,
    ctx: &SessionContext,
    now: DateTime<Utc>,
) -> Result<ImportReport, ServerError> {
    let mut reader = ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .trim(Trim::All)
        .from_reader(raw.as_bytes());

    let mut records = reader.records();
    let header = match records.next() {
        Some(h) => h?,
        None => return Err(ServerError::BadRequest("CSV input has no header row".into())),
    };
    let columns = ColumnMap::from_header(&header);

    let mut report = ImportReport::default();
    let mut row_number = 0usize;

    for record in records {
        let record = match record {
            Ok(r) => r,
            Err(e) => {
                let line = e.position().map(|p| p.line()).unwrap_or(0);
                report.skip(line, format!("unreadable row: {e}"));
                continue;
            }
        };
        let line = record.position().map(|p| p.line()).unwrap_or(0);

        if record.len() > header.len() {
            report.skip(
                line,
                format!("row has {} fields, header has {}", record.len(), header.len()),
            );
            continue;
        }
        if record.iter().all(|v| unquote(v).is_empty()) {
            report.skip(line, "blank row");
            continue;
        }

        row_number += 1;
        let draft = match columns.draft_for(&record, row_number) {
            Ok(draft) => draft,
            Err(reason) => {
                report.skip(line, reason);
                continue;
            }
        };
        let lead = Lead::from_draft(&draft, ctx, now);

        report.outcomes.push(RowOutcome {
            line,
            result: RowResult::Imported {
                id: lead.id.clone(),
            },
        });
        report.imported.push(lead);
    }

    Ok(report)
}

/// Column index per lead field, resolved once from the header row.
#[derive(Debug, Default)]
struct ColumnMap {
    first_name: Option<usize>,
    last_name: Option<usize>,
    full_name: Option<usize>,
    email: Option<usize>,
    phone: Option<usize>,
    status: Option<usize>,
    temperature: Option<usize>,
    source: Option<usize>,
    tags: Option<usize>,
    budget: Option<usize>,
    address: Option<usize>,
    property_type: Option<usize>,
}

impl ColumnMap {
    fn from_header(header: &StringRecord) -> Self {
        let keys: Vec<String> = header.iter().map(normalize_key).collect();
        let find = |aliases: &[&str]| keys.iter().position(|k| aliases.contains(&k.as_str()));

        Self {
            first_name: find(&["firstname", "first", "givenname"]),
            last_name: find(&["lastname", "last", "surname", "familyname"]),
            full_name: find(&["name", "fullname", "contactname"]),
            email: find(&["email", "emailaddress", "e-mail"]),
            phone: find(&["phone", "phonenumber", "mobile", "cell"]),
            status: find(&["status", "stage"]),
            temperature: find(&["temperature", "temp", "priority"]),
            source: find(&["source", "leadsource"]),
            tags: find(&["tags", "labels"]),
            budget: find(&["budget", "pricerange", "maxbudget"]),
            address: find(&["address", "propertyaddress"]),
            property_type: find(&["propertytype", "type"]),
        }
    }

    fn draft_for(&self, record: &StringRecord, row_number: usize) -> Result<LeadDraft, String> {
        let cell = |idx: Option<usize>| -> String {
            idx.and_then(|i| record.get(i))
                .map(unquote)
                .unwrap_or_default()
        };
        let or_default = |value: String, fallback: &str| -> String {
            if value.is_empty() {
                fallback.to_string()
            } else {
                value
            }
        };

        let (mut first, mut last) = (cell(self.first_name), cell(self.last_name));
        if self.first_name.is_none() && self.last_name.is_none() {
            let full = cell(self.full_name);
            match full.split_once(' ') {
                Some((f, l)) => {
                    first = f.trim().to_string();
                    last = l.trim().to_string();
                }
                None => first = full,
            }
        }

        let email = cell(self.email);
        let email = if email.is_empty() {
            format!("imported.{row_number}.{}@placeholder.invalid", short_suffix())
        } else {
            email
        };

        let tags = match self.tags {
            Some(_) => split_tags(&cell(self.tags)),
            None => vec![IMPORT_TAG.to_string()],
        };

        let budget = parse_budget(&cell(self.budget))?;

        Ok(LeadDraft {
            first_name: or_default(first, IMPORT_FIRST_NAME),
            last_name: or_default(last, IMPORT_LAST_NAME),
            email,
            phone: or_default(cell(self.phone), IMPORT_PHONE),
            status: LeadStatus::parse(&cell(self.status)).unwrap_or(LeadStatus::New),
            temperature: Temperature::parse(&cell(self.temperature))
                .unwrap_or(Temperature::Normal),
            source: or_default(cell(self.source), IMPORT_SOURCE),
            tags,
            property_type: PropertyType::parse(&cell(self.property_type))
                .unwrap_or(PropertyType::Primary),
            property_address: cell(self.address),
            budget,
            ..LeadDraft::default()
        })
    }
}

/// `" First Name "` -> `firstname`
fn normalize_key(raw: &str) -> String {
    raw.trim_start_matches('\u{feff}')
        .trim()
        .trim_matches('"')
        .chars()
        .filter(|c| !c.is_whitespace())
        .collect::<String>()
        .to_lowercase()
}

/// Trims and strips one level of surrounding quotes the parser left behind
/// (e.g. `a, "b"` where the quote does not open the field).
fn unquote(raw: &str) -> String {
    let v = raw.trim();
    if v.len() >= 2 && v.starts_with('"') && v.ends_with('"') {
        v[1..v.len() - 1].replace("\"\"", "\"").trim().to_string()
    } else {
        v.to_string()
    }
}

fn split_tags(raw: &str) -> Vec<String> {
    raw.split([';', ','])
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(String::from)
        .collect()
}

/// Digits of the whole-number part: `$450,000.00` -> 450000. No digits -> 0.
/// Amounts the store cannot hold are an error.
fn parse_budget(raw: &str) -> Result<u64, String> {
    let whole = raw.split('.').next().unwrap_or("");
    let digits: String = whole.chars().filter(char::is_ascii_digit).collect();
    if digits.is_empty() {
        return Ok(0);
    }
    match digits.parse::<u64>() {
        Ok(budget) if budget <= MAX_BUDGET => Ok(budget),
        _ => Err(format!("budget {} is out of range", raw.trim())),
    }
}
