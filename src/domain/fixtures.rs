// src/domain/fixtures.rs
// Test-only lead builders shared by the domain and service tests.

use chrono::{DateTime, Duration, TimeZone, Utc};

use crate::domain::lead::{Lead, LeadStatus, PropertyType, Temperature};

pub fn base_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap()
}

/// `base_time()` shifted by `minutes`.
pub fn at(minutes: i64) -> DateTime<Utc> {
    base_time() + Duration::minutes(minutes)
}

pub fn lead(id: &str, first: &str, last: &str) -> Lead {
    Lead {
        id: id.to_string(),
        brokerage_id: "brk_test".into(),
        assigned_agent_id: "agent_test".into(),
        first_name: first.to_string(),
        last_name: last.to_string(),
        email: format!("{}.{}@example.com", first.to_lowercase(), last.to_lowercase()),
        phone: "(555) 000-0000".into(),
        status: LeadStatus::New,
        temperature: Temperature::Normal,
        source: "Website".into(),
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
        created_at: base_time(),
        updated_at: base_time(),
        is_deleted: false,
        deleted_at: None,
    }
}

/// Lead whose `created_at`/`updated_at` sit `minutes` after the base time.
pub fn lead_at(id: &str, first: &str, last: &str, minutes: i64) -> Lead {
    let mut l = lead(id, first, last);
    l.created_at = at(minutes);
    l.updated_at = at(minutes);
    l
}

pub fn ids(leads: &[Lead]) -> Vec<&str> {
    leads.iter().map(|l| l.id.as_str()).collect()
}
