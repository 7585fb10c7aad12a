// src/domain/lead.rs

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::ids::{new_lead_id, new_note_id};
use crate::domain::session::SessionContext;

/// Pipeline stage. Any value may be set at any time; there is no transition order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LeadStatus {
    New,
    Contacted,
    Active,
    InEscrow,
    Closed,
}

impl LeadStatus {
    /// Declaration order, which is also the canonical status-tab order.
    pub const ALL: [LeadStatus; 5] = [
        LeadStatus::New,
        LeadStatus::Contacted,
        LeadStatus::Active,
        LeadStatus::InEscrow,
        LeadStatus::Closed,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            LeadStatus::New => "NEW",
            LeadStatus::Contacted => "CONTACTED",
            LeadStatus::Active => "ACTIVE",
            LeadStatus::InEscrow => "IN_ESCROW",
            LeadStatus::Closed => "CLOSED",
        }
    }

    /// Lenient parse: case-insensitive, spaces and dashes accepted for underscores.
    pub fn parse(raw: &str) -> Option<Self> {
        let key = normalize_symbol(raw);
        LeadStatus::ALL.into_iter().find(|s| s.as_str() == key)
    }
}

/// Agent-assigned urgency.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Temperature {
    Hot,
    Warm,
    Normal,
    Cold,
}

impl Temperature {
    pub const ALL: [Temperature; 4] = [
        Temperature::Hot,
        Temperature::Warm,
        Temperature::Normal,
        Temperature::Cold,
    ];

    /// HOT=3, WARM=2, NORMAL=1, COLD=0
    pub fn weight(self) -> u8 {
        match self {
            Temperature::Hot => 3,
            Temperature::Warm => 2,
            Temperature::Normal => 1,
            Temperature::Cold => 0,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Temperature::Hot => "HOT",
            Temperature::Warm => "WARM",
            Temperature::Normal => "NORMAL",
            Temperature::Cold => "COLD",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        let key = normalize_symbol(raw);
        Temperature::ALL.into_iter().find(|t| t.as_str() == key)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PropertyType {
    Primary,
    Secondary,
    Investment,
}

impl PropertyType {
    pub const ALL: [PropertyType; 3] = [
        PropertyType::Primary,
        PropertyType::Secondary,
        PropertyType::Investment,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            PropertyType::Primary => "PRIMARY",
            PropertyType::Secondary => "SECONDARY",
            PropertyType::Investment => "INVESTMENT",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        let key = normalize_symbol(raw);
        PropertyType::ALL.into_iter().find(|p| p.as_str() == key)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Relationship {
    Spouse,
    Partner,
    Fiance,
    Other,
}

fn normalize_symbol(raw: &str) -> String {
    raw.trim().to_uppercase().replace([' ', '-'], "_")
}

/// Spouse / partner attached to a lead.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SecondaryContact {
    pub first_name: String,
    pub last_name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub relationship: Option<Relationship>,
    pub birthday: Option<NaiveDate>,
}

impl SecondaryContact {
    pub fn full_name(&self) -> String {
        join_name(&self.first_name, &self.last_name)
    }
}

/// One journal entry. The journal is append-only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Note {
    pub id: String,
    pub author_name: String,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

impl Note {
    pub fn new(author_name: &str, content: &str, now: DateTime<Utc>) -> Self {
        Self {
            id: new_note_id(),
            author_name: author_name.trim().to_string(),
            content: content.trim().to_string(),
            created_at: now,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Lead {
    // === Identity & ownership ===
    pub id: String,
    pub brokerage_id: String,
    pub assigned_agent_id: String,

    // === Contact ===
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    /// Stored as `(NNN) NNN-NNNN` when the input had ten digits.
    pub phone: String,

    // === Classification ===
    pub status: LeadStatus,
    pub temperature: Temperature,
    pub source: String,
    pub tags: Vec<String>,

    // === Transaction ===
    pub property_type: PropertyType,
    pub property_address: String,
    pub budget: u64,
    /// Always `estimated_deal_value(budget)`.
    pub estimated_deal_value: u64,

    #[serde(default)]
    pub secondary_contact: Option<SecondaryContact>,

    // === Milestones ===
    #[serde(default)]
    pub dob: Option<NaiveDate>,
    #[serde(default)]
    pub wedding_anniversary: Option<NaiveDate>,
    #[serde(default)]
    pub home_anniversary: Option<NaiveDate>,

    /// Append order (oldest first). Use `notes_newest_first` for display.
    #[serde(default)]
    pub notes: Vec<Note>,

    // === Lifecycle ===
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub is_deleted: bool,
    pub deleted_at: Option<DateTime<Utc>>,
}

impl Lead {
    /// Builds a new record from form or import input. Missing id and
    /// timestamps are assigned here; ownership falls back to the session.
    pub fn from_draft(draft: &LeadDraft, ctx: &SessionContext, now: DateTime<Utc>) -> Self {
        let created_at = draft.created_at.unwrap_or(now);
        let mut lead = Lead {
            id: draft
                .id
                .as_deref()
                .map(str::trim)
                .filter(|id| !id.is_empty())
                .map(String::from)
                .unwrap_or_else(new_lead_id),
            brokerage_id: ctx.brokerage_id.clone(),
            assigned_agent_id: ctx.agent_id.clone(),
            first_name: String::new(),
            last_name: String::new(),
            email: String::new(),
            phone: String::new(),
            status: LeadStatus::New,
            temperature: Temperature::Normal,
            source: DEFAULT_SOURCE.to_string(),
            tags: Vec::new(),
            property_type: PropertyType::Primary,
            property_address: String::new(),
            budget: 0,
            estimated_deal_value: 0,
            secondary_contact: None,
            dob: None,
            wedding_anniversary: None,
            home_anniversary: None,
            notes: Vec::new(),
            created_at,
            updated_at: draft.updated_at.unwrap_or(now),
            is_deleted: false,
            deleted_at: None,
        };
        draft.apply_to(&mut lead);
        lead
    }

    pub fn full_name(&self) -> String {
        join_name(&self.first_name, &self.last_name)
    }

    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.iter().any(|t| t == tag)
    }

    pub fn has_tag_ignore_case(&self, tag: &str) -> bool {
        let wanted = tag.to_lowercase();
        self.tags.iter().any(|t| t.to_lowercase() == wanted)
    }

    /// Appends `tag` unless already present. Returns true when the set changed.
    pub fn add_tag(&mut self, tag: &str) -> bool {
        let tag = tag.trim();
        if tag.is_empty() || self.has_tag(tag) {
            return false;
        }
        self.tags.push(tag.to_string());
        true
    }

    /// Removes `tag` if present, otherwise adds it.
    pub fn toggle_tag(&mut self, tag: &str) {
        let tag = tag.trim();
        if self.has_tag(tag) {
            self.tags.retain(|t| t != tag);
        } else {
            self.add_tag(tag);
        }
    }

    pub fn set_budget(&mut self, budget: u64) {
        self.budget = budget;
        self.estimated_deal_value = estimated_deal_value(budget);
    }

    pub fn notes_newest_first(&self) -> Vec<&Note> {
        let mut notes: Vec<&Note> = self.notes.iter().collect();
        notes.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        notes
    }
}

/// Input for creating (or replacing the editable fields of) a lead.
/// Everything the store owns (lifecycle flags, derived values) is absent.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LeadDraft {
    pub id: Option<String>,
    pub brokerage_id: Option<String>,
    pub assigned_agent_id: Option<String>,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: String,
    pub status: LeadStatus,
    pub temperature: Temperature,
    pub source: String,
    pub tags: Vec<String>,
    pub property_type: PropertyType,
    pub property_address: String,
    pub budget: u64,
    pub secondary_contact: Option<SecondaryContact>,
    pub dob: Option<NaiveDate>,
    pub wedding_anniversary: Option<NaiveDate>,
    pub home_anniversary: Option<NaiveDate>,
    pub created_at: Option<DateTime<Utc>>,
    /// Version the caller last read; used for optimistic update checks.
    pub updated_at: Option<DateTime<Utc>>,
}

impl Default for LeadDraft {
    fn default() -> Self {
        Self {
            id: None,
            brokerage_id: None,
            assigned_agent_id: None,
            first_name: String::new(),
            last_name: String::new(),
            email: String::new(),
            phone: String::new(),
            status: LeadStatus::New,
            temperature: Temperature::Normal,
            source: DEFAULT_SOURCE.to_string(),
            tags: Vec::new(),
            property_type: PropertyType::Primary,
            property_address: String::new(),
            budget: 0,
            secondary_contact: None,
            dob: None,
            wedding_anniversary: None,
            home_anniversary: None,
            created_at: None,
            updated_at: None,
        }
    }
}

pub const DEFAULT_SOURCE: &str = "Manual Entry";

impl LeadDraft {
    /// Required contact fields that are blank after trimming.
    pub fn missing_required_fields(&self) -> Vec<&'static str> {
        [
            ("first_name", &self.first_name),
            ("last_name", &self.last_name),
            ("email", &self.email),
            ("phone", &self.phone),
        ]
        .into_iter()
        .filter(|(_, v)| v.trim().is_empty())
        .map(|(k, _)| k)
        .collect()
    }

    /// Copies the editable fields onto an existing lead, leaving identity,
    /// ownership (unless given), journal and lifecycle fields alone.
    pub fn apply_to(&self, lead: &mut Lead) {
        if let Some(b) = &self.brokerage_id {
            lead.brokerage_id = b.clone();
        }
        if let Some(a) = &self.assigned_agent_id {
            lead.assigned_agent_id = a.clone();
        }
        lead.first_name = self.first_name.trim().to_string();
        lead.last_name = self.last_name.trim().to_string();
        lead.email = self.email.trim().to_string();
        lead.phone = format_phone(&self.phone);
        lead.status = self.status;
        lead.temperature = self.temperature;
        lead.source = match self.source.trim() {
            "" => DEFAULT_SOURCE.to_string(),
            s => s.to_string(),
        };
        lead.tags = dedupe_tags(self.tags.iter().map(String::as_str));
        lead.property_type = self.property_type;
        lead.property_address = self.property_address.trim().to_string();
        lead.set_budget(self.budget);
        lead.secondary_contact = self.secondary_contact.clone();
        lead.dob = self.dob;
        lead.wedding_anniversary = self.wedding_anniversary;
        lead.home_anniversary = self.home_anniversary;
    }
}

/// Largest budget the store can hold (SQLite integers are signed).
pub const MAX_BUDGET: u64 = i64::MAX as u64;

/// 3% of budget, rounded half-up. Widened so `budget * 3` never overflows.
pub fn estimated_deal_value(budget: u64) -> u64 {
    ((u128::from(budget) * 3 + 50) / 100) as u64
}

/// Formats ten-digit numbers (optionally prefixed by country code 1) as
/// `(NNN) NNN-NNNN`. Anything else is returned trimmed.
pub fn format_phone(raw: &str) -> String {
    let digits: String = raw.chars().filter(|c| c.is_ascii_digit()).collect();
    let digits = match digits.len() {
        11 if digits.starts_with('1') => &digits[1..],
        10 => digits.as_str(),
        _ => return raw.trim().to_string(),
    };
    format!("({}) {}-{}", &digits[0..3], &digits[3..6], &digits[6..10])
}

/// Trims, drops empties and removes exact duplicates, keeping first occurrence.
pub fn dedupe_tags<'a>(tags: impl IntoIterator<Item = &'a str>) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    for tag in tags {
        let tag = tag.trim();
        if !tag.is_empty() && !out.iter().any(|t| t == tag) {
            out.push(tag.to_string());
        }
    }
    out
}

fn join_name(first: &str, last: &str) -> String {
    match (first.trim(), last.trim()) {
        ("", l) => l.to_string(),
        (f, "") => f.to_string(),
        (f, l) => format!("{f} {l}"),
    }
}
