// src/insights.rs
//
// Follow-up advice for a lead from an external text service. Any failure
// degrades to a placeholder.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::config::InsightsConfig;
use crate::domain::lead::Lead;
use crate::errors::ServerError;

pub const PLACEHOLDER_ADVICE: &str =
    "Insights are unavailable right now. Review recent notes and follow up based on the lead's status.";

/// The most recent notes sent along with the prompt.
const NOTE_CONTEXT: usize = 3;

/// What the advice service is told about a lead.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AdviceContext {
    pub lead_name: String,
    pub status: String,
    pub temperature: String,
    pub source: String,
    pub budget: u64,
    pub tags: Vec<String>,
    pub recent_notes: Vec<String>,
}

impl AdviceContext {
    pub fn for_lead(lead: &Lead) -> Self {
        Self {
            lead_name: lead.full_name(),
            status: lead.status.as_str().to_string(),
            temperature: lead.temperature.as_str().to_string(),
            source: lead.source.clone(),
            budget: lead.budget,
            tags: lead.tags.clone(),
            recent_notes: lead
                .notes_newest_first()
                .into_iter()
                .take(NOTE_CONTEXT)
                .map(|n| n.content.clone())
                .collect(),
        }
    }
}

pub trait AdviceService: Send + Sync {
    fn get_advice(&self, context: &AdviceContext) -> Result<String, ServerError>;
}

/// Used when no endpoint is configured.
pub struct DisabledAdvice;

impl AdviceService for DisabledAdvice {
    fn get_advice(&self, _context: &AdviceContext) -> Result<String, ServerError> {
        Err(ServerError::InsightError("insights are not configured".into()))
    }
}

#[derive(Debug, Deserialize)]
struct AdviceReply {
    advice: String,
}

pub struct HttpAdviceService {
    client: reqwest::blocking::Client,
    endpoint: String,
    api_key: Option<String>,
}

impl HttpAdviceService {
    pub fn new(endpoint: String, api_key: Option<String>, timeout: Duration) -> Result<Self, ServerError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ServerError::InsightError(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            endpoint,
            api_key,
        })
    }
}

impl AdviceService for HttpAdviceService {
    fn get_advice(&self, context: &AdviceContext) -> Result<String, ServerError> {
        let body = json!({
            "task": "lead_follow_up",
            "context": context,
        });

        let mut request = self
            .client
            .post(&self.endpoint)
            .header("Content-Type", "application/json")
            .json(&body);
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }

        let response = request
            .send()
            .map_err(|e| ServerError::InsightError(format!("Failed to send advice request: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().unwrap_or_else(|_| "(no body)".to_string());
            return Err(ServerError::InsightError(format!(
                "Advice API error: {} - {}",
                status, text
            )));
        }

        let reply: AdviceReply = response
            .json()
            .map_err(|e| ServerError::InsightError(format!("Unreadable advice reply: {}", e)))?;

        match reply.advice.trim() {
            "" => Err(ServerError::InsightError("empty advice".into())),
            advice => Ok(advice.to_string()),
        }
    }
}

/// The configured provider: HTTP when an endpoint is set, otherwise disabled.
pub fn advice_service_from_config(config: &InsightsConfig) -> Box<dyn AdviceService> {
    let Some(endpoint) = config.endpoint.clone().filter(|e| !e.trim().is_empty()) else {
        return Box::new(DisabledAdvice);
    };

    match HttpAdviceService::new(
        endpoint,
        config.api_key.clone(),
        Duration::from_secs(config.timeout_secs),
    ) {
        Ok(service) => Box::new(service),
        Err(e) => {
            tracing::warn!(error = %e, "insights disabled");
            Box::new(DisabledAdvice)
        }
    }
}

/// Never fails: errors are logged and replaced by [`PLACEHOLDER_ADVICE`].
pub fn advice_or_placeholder(service: &dyn AdviceService, context: &AdviceContext) -> String {
    match service.get_advice(context) {
        Ok(advice) => advice,
        Err(e) => {
            tracing::warn!(error = %e, lead = %context.lead_name, "advice unavailable");
            PLACEHOLDER_ADVICE.to_string()
        }
    }
}
