// src/domain/session.rs
use serde::{Deserialize, Serialize};

/// Who is acting. Passed into create and import so ownership defaults come
/// from the caller instead of constants.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionContext {
    pub brokerage_id: String,
    pub agent_id: String,
    /// Owner of persisted layout preferences.
    pub user_id: String,
}

impl SessionContext {
    pub fn new(
        brokerage_id: impl Into<String>,
        agent_id: impl Into<String>,
        user_id: impl Into<String>,
    ) -> Self {
        Self {
            brokerage_id: brokerage_id.into(),
            agent_id: agent_id.into(),
            user_id: user_id.into(),
        }
    }
}
