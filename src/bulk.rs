// src/bulk.rs
//
// Bulk actions over the current selection. A batch either commits in full
// (selection cleared) or not at all (selection kept so the agent can retry).

use chrono::{DateTime, Utc};

use crate::db::connection::Database;
use crate::db::leads;
use crate::domain::bulk::{BulkReport, Outcome};
use crate::domain::selection::SelectionSet;
use crate::errors::ServerError;

pub struct BulkMutator<'a> {
    db: &'a Database,
}

impl<'a> BulkMutator<'a> {
    pub fn new(db: &'a Database) -> Self {
        Self { db }
    }

    /// Adds `tag` to every selected lead that lacks it.
    pub fn apply_tag(
        &self,
        selection: &mut SelectionSet,
        tag: &str,
        now: DateTime<Utc>,
    ) -> Result<BulkReport, ServerError> {
        let ids = selection.ids();
        let report = leads::apply_tag_many(self.db, &ids, tag, now).inspect_err(|e| {
            tracing::warn!(error = %e, count = ids.len(), "bulk tag failed, selection kept");
        })?;

        tracing::info!(
            tag,
            applied = report.count(Outcome::Applied),
            unchanged = report.count(Outcome::Unchanged),
            not_found = report.count(Outcome::NotFound),
            "bulk tag applied"
        );
        selection.clear();
        Ok(report)
    }

    /// Soft-deletes every selected lead.
    pub fn soft_delete(
        &self,
        selection: &mut SelectionSet,
        now: DateTime<Utc>,
    ) -> Result<BulkReport, ServerError> {
        let ids = selection.ids();
        let report = leads::soft_delete_many(self.db, &ids, now).inspect_err(|e| {
            tracing::warn!(error = %e, count = ids.len(), "bulk delete failed, selection kept");
        })?;

        tracing::info!(
            deleted = report.count(Outcome::Applied),
            not_found = report.count(Outcome::NotFound),
            "bulk delete applied"
        );
        selection.clear();
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::leads::{create_lead, get_lead, Visibility};
    use crate::domain::fixtures::at;
    use crate::domain::lead::LeadDraft;
    use crate::tests::utils::{init_test_db, session};

    fn seed(db: &Database, first: &str) -> String {
        let draft = LeadDraft {
            first_name: first.into(),
            last_name: "Test".into(),
            email: format!("{first}@example.com"),
            phone: "5550001111".into(),
            ..LeadDraft::default()
        };
        create_lead(db, &session(), &draft, at(0)).unwrap().id
    }

    #[test]
    fn successful_tag_clears_selection() {
        let db = init_test_db();
        let a = seed(&db, "ann");
        let b = seed(&db, "bo");
        let mut selection = SelectionSet::from_ids([a.clone(), b.clone()]);

        let report = BulkMutator::new(&db)
            .apply_tag(&mut selection, "Open House", at(1))
            .unwrap();

        assert_eq!(report.count(Outcome::Applied), 2);
        assert!(selection.is_empty());
        assert!(get_lead(&db, &a, Visibility::ActiveOnly)
            .unwrap()
            .has_tag("Open House"));
    }

    #[test]
    fn failed_tag_keeps_selection() {
        let db = init_test_db();
        let a = seed(&db, "ann");
        let mut selection = SelectionSet::from_ids([a]);

        let err = BulkMutator::new(&db)
            .apply_tag(&mut selection, "   ", at(1))
            .unwrap_err();

        assert!(matches!(err, ServerError::Validation(_)));
        assert_eq!(selection.len(), 1);
    }

    #[test]
    fn bulk_delete_hides_all_selected() {
        let db = init_test_db();
        let a = seed(&db, "ann");
        let b = seed(&db, "bo");
        let keep = seed(&db, "cy");
        let mut selection = SelectionSet::from_ids([a.clone(), b.clone()]);

        let report = BulkMutator::new(&db).soft_delete(&mut selection, at(2)).unwrap();

        assert_eq!(report.count(Outcome::Applied), 2);
        assert!(selection.is_empty());
        let active = leads::list_leads(&db, Visibility::ActiveOnly).unwrap();
        assert_eq!(active.len(), 1);
        assert_eq!(active[0].id, keep);
    }
}
