// src/domain/query.rs

use std::cmp::Ordering;
use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::domain::lead::{Lead, LeadStatus, Temperature};

/// Status tab selection. `All` disables the status predicate.
/// Serialized as the tab symbol (`"ALL"`, `"NEW"`, ...).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum StatusFilter {
    #[default]
    All,
    Only(LeadStatus),
}

impl StatusFilter {
    pub fn parse(raw: &str) -> Option<Self> {
        if raw.trim().eq_ignore_ascii_case("all") {
            return Some(StatusFilter::All);
        }
        LeadStatus::parse(raw).map(StatusFilter::Only)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            StatusFilter::All => "ALL",
            StatusFilter::Only(s) => s.as_str(),
        }
    }
}

impl From<StatusFilter> for String {
    fn from(f: StatusFilter) -> Self {
        f.as_str().to_string()
    }
}

impl TryFrom<String> for StatusFilter {
    type Error = String;

    fn try_from(raw: String) -> Result<Self, Self::Error> {
        StatusFilter::parse(&raw).ok_or_else(|| format!("unknown status tab: {raw}"))
    }
}

/// All predicates are ANDed together.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LeadFilter {
    pub status: StatusFilter,
    /// OR semantics: match if `lead.source` is ANY of these. Empty = no filter.
    pub sources: BTreeSet<String>,
    /// OR semantics: match if the lead carries ANY of these tags. Empty = no filter.
    pub tags: BTreeSet<String>,
    /// Case-insensitive substring over name, email, spouse name/email and address.
    pub search_term: String,
}

impl LeadFilter {
    pub fn matches(&self, lead: &Lead) -> bool {
        self.matches_status(lead)
            && self.matches_sources(lead)
            && self.matches_tags(lead)
            && self.matches_search(lead)
    }

    fn matches_status(&self, lead: &Lead) -> bool {
        match self.status {
            StatusFilter::All => true,
            StatusFilter::Only(status) => lead.status == status,
        }
    }

    fn matches_sources(&self, lead: &Lead) -> bool {
        self.sources.is_empty() || self.sources.contains(&lead.source)
    }

    fn matches_tags(&self, lead: &Lead) -> bool {
        self.tags.is_empty() || lead.tags.iter().any(|t| self.tags.contains(t))
    }

    fn matches_search(&self, lead: &Lead) -> bool {
        let term = self.search_term.trim().to_lowercase();
        if term.is_empty() {
            return true;
        }

        let mut haystacks = vec![lead.full_name(), lead.email.clone(), lead.property_address.clone()];
        if let Some(sc) = &lead.secondary_contact {
            haystacks.push(sc.full_name());
            haystacks.extend(sc.email.clone());
        }

        haystacks.iter().any(|h| h.to_lowercase().contains(&term))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SortOption {
    TempDesc,
    TempAsc,
    WarmFirst,
    NormalFirst,
    NameAsc,
    NameDesc,
    BudgetAsc,
    BudgetDesc,
    #[default]
    NewestAdded,
    OldestAdded,
    RecentlyUpdated,
    SourceAsc,
    SourceDesc,
    StatusAsc,
    StatusDesc,
    BuyersFirst,
    SellersFirst,
    InvestorsFirst,
    PastClientsFirst,
}

pub const PAST_CLIENT_SOURCE: &str = "Past Client";

impl SortOption {
    pub const ALL: [SortOption; 19] = [
        SortOption::TempDesc,
        SortOption::TempAsc,
        SortOption::WarmFirst,
        SortOption::NormalFirst,
        SortOption::NameAsc,
        SortOption::NameDesc,
        SortOption::BudgetAsc,
        SortOption::BudgetDesc,
        SortOption::NewestAdded,
        SortOption::OldestAdded,
        SortOption::RecentlyUpdated,
        SortOption::SourceAsc,
        SortOption::SourceDesc,
        SortOption::StatusAsc,
        SortOption::StatusDesc,
        SortOption::BuyersFirst,
        SortOption::SellersFirst,
        SortOption::InvestorsFirst,
        SortOption::PastClientsFirst,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            SortOption::TempDesc => "TEMP_DESC",
            SortOption::TempAsc => "TEMP_ASC",
            SortOption::WarmFirst => "WARM_FIRST",
            SortOption::NormalFirst => "NORMAL_FIRST",
            SortOption::NameAsc => "NAME_ASC",
            SortOption::NameDesc => "NAME_DESC",
            SortOption::BudgetAsc => "BUDGET_ASC",
            SortOption::BudgetDesc => "BUDGET_DESC",
            SortOption::NewestAdded => "NEWEST_ADDED",
            SortOption::OldestAdded => "OLDEST_ADDED",
            SortOption::RecentlyUpdated => "RECENTLY_UPDATED",
            SortOption::SourceAsc => "SOURCE_ASC",
            SortOption::SourceDesc => "SOURCE_DESC",
            SortOption::StatusAsc => "STATUS_ASC",
            SortOption::StatusDesc => "STATUS_DESC",
            SortOption::BuyersFirst => "BUYERS_FIRST",
            SortOption::SellersFirst => "SELLERS_FIRST",
            SortOption::InvestorsFirst => "INVESTORS_FIRST",
            SortOption::PastClientsFirst => "PAST_CLIENTS_FIRST",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        let key = raw.trim().to_uppercase();
        SortOption::ALL.into_iter().find(|s| s.as_str() == key)
    }
}

/// Filter, then stable-sort. Soft-deleted leads never appear.
pub fn query(leads: &[Lead], filter: &LeadFilter, sort: SortOption) -> Vec<Lead> {
    let mut out: Vec<Lead> = leads
        .iter()
        .filter(|l| !l.is_deleted && filter.matches(l))
        .cloned()
        .collect();

    sort_leads(&mut out, sort);

    tracing::debug!(
        total = leads.len(),
        matched = out.len(),
        sort = sort.as_str(),
        "lead query"
    );
    out
}

/// `sort_by` is a stable sort: leads with equal keys keep their input order.
pub fn sort_leads(leads: &mut [Lead], sort: SortOption) {
    leads.sort_by(|a, b| compare(a, b, sort));
}

fn compare(a: &Lead, b: &Lead, sort: SortOption) -> Ordering {
    let weight = |l: &Lead| l.temperature.weight();

    match sort {
        SortOption::TempDesc => weight(b).cmp(&weight(a)),
        SortOption::TempAsc => weight(a).cmp(&weight(b)),
        SortOption::WarmFirst => temperature_first(a, b, Temperature::Warm),
        SortOption::NormalFirst => temperature_first(a, b, Temperature::Normal),
        SortOption::NameAsc => name_key(a).cmp(&name_key(b)),
        SortOption::NameDesc => name_key(b).cmp(&name_key(a)),
        SortOption::BudgetAsc => a.budget.cmp(&b.budget),
        SortOption::BudgetDesc => b.budget.cmp(&a.budget),
        SortOption::NewestAdded => b.created_at.cmp(&a.created_at),
        SortOption::OldestAdded => a.created_at.cmp(&b.created_at),
        SortOption::RecentlyUpdated => b.updated_at.cmp(&a.updated_at),
        SortOption::SourceAsc => a.source.cmp(&b.source),
        SortOption::SourceDesc => b.source.cmp(&a.source),
        SortOption::StatusAsc => a.status.as_str().cmp(b.status.as_str()),
        SortOption::StatusDesc => b.status.as_str().cmp(a.status.as_str()),
        SortOption::BuyersFirst => group_first(a, b, |l| l.has_tag_ignore_case("buyer")),
        SortOption::SellersFirst => group_first(a, b, |l| l.has_tag_ignore_case("seller")),
        SortOption::InvestorsFirst => group_first(a, b, |l| l.has_tag_ignore_case("investor")),
        SortOption::PastClientsFirst => group_first(a, b, |l| l.source == PAST_CLIENT_SOURCE),
    }
}

fn temperature_first(a: &Lead, b: &Lead, target: Temperature) -> Ordering {
    (b.temperature == target)
        .cmp(&(a.temperature == target))
        .then(b.temperature.weight().cmp(&a.temperature.weight()))
}

/// Members of the group first, newest first within each side.
fn group_first(a: &Lead, b: &Lead, in_group: impl Fn(&Lead) -> bool) -> Ordering {
    in_group(b)
        .cmp(&in_group(a))
        .then(b.created_at.cmp(&a.created_at))
}

fn name_key(lead: &Lead) -> String {
    format!("{} {}", lead.first_name, lead.last_name).to_lowercase()
}

/// Distinct sources of active leads, sorted. Feeds the source filter.
pub fn source_vocabulary(leads: &[Lead]) -> Vec<String> {
    leads
        .iter()
        .filter(|l| !l.is_deleted)
        .map(|l| l.source.clone())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}
