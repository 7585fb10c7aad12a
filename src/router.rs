use std::collections::BTreeSet;
use std::io::Read;

use astra::Request;
use chrono::Utc;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::json;

use crate::bulk::BulkMutator;
use crate::config::AppConfig;
use crate::db::connection::Database;
use crate::db::layouts::{load_layout, save_layout};
use crate::db::leads::{self, Visibility};
use crate::domain::board::LeadBoard;
use crate::domain::layout::LayoutPreferences;
use crate::domain::lead::{Lead, LeadDraft, LeadStatus};
use crate::domain::pagination::page_size_or_default;
use crate::domain::query::{query, source_vocabulary, LeadFilter, SortOption, StatusFilter};
use crate::domain::selection::SelectionSet;
use crate::domain::session::SessionContext;
use crate::errors::ServerError;
use crate::insights::{advice_or_placeholder, advice_service_from_config, AdviceContext, AdviceService};
use crate::responses::{attachment_response, json_response, json_response_with_status, ResultResp};
use crate::spreadsheets::{
    check_export_size, export_filename, export_leads_xlsx, import_leads, to_csv,
    to_excel_document, EXCEL_CONTENT_TYPE,
};

// JSON bodies are small; imports have their own configured limit.
const MAX_JSON_BYTES: usize = 256 * 1024;

pub const BROKERAGE_HEADER: &str = "X-Brokerage-Id";
pub const AGENT_HEADER: &str = "X-Agent-Id";
pub const USER_HEADER: &str = "X-User-Id";

/// Everything a request handler needs. Shared read-only across workers.
pub struct AppState {
    pub db: Database,
    pub config: AppConfig,
    pub advice: Box<dyn AdviceService>,
}

impl AppState {
    pub fn new(db: Database, config: AppConfig) -> Self {
        let advice = advice_service_from_config(&config.insights);
        Self { db, config, advice }
    }
}

pub fn handle(mut req: Request, state: &AppState) -> ResultResp {
    let method = req.method().as_str().to_string();
    let path = req.uri().path().to_string();
    let segments: Vec<&str> = path.trim_matches('/').split('/').collect();
    let ctx = session_from_headers(&req, &state.config);
    let db = &state.db;

    tracing::debug!(%method, %path, "request");

    match (method.as_str(), segments.as_slice()) {
        // --- collection ---
        ("GET", ["leads"]) => list_page(&req, state),
        ("POST", ["leads"]) => {
            let draft: LeadDraft = read_json(&mut req)?;
            let lead = leads::create_lead(db, &ctx, &draft, Utc::now())?;
            json_response_with_status(201, &lead)
        }
        ("GET", ["sources"]) => {
            let all = leads::list_leads(db, Visibility::ActiveOnly)?;
            json_response(&source_vocabulary(&all))
        }

        // --- bulk, import, export (before the `{id}` routes) ---
        ("POST", ["leads", "bulk", "tag"]) => {
            let body: BulkTagBody = read_json(&mut req)?;
            let mut selection = SelectionSet::from_ids(body.ids);
            let report = BulkMutator::new(db).apply_tag(&mut selection, &body.tag, Utc::now())?;
            json_response(&report)
        }
        ("POST", ["leads", "bulk", "delete"]) => {
            let body: BulkIdsBody = read_json(&mut req)?;
            let mut selection = SelectionSet::from_ids(body.ids);
            let report = BulkMutator::new(db).soft_delete(&mut selection, Utc::now())?;
            json_response(&report)
        }
        ("POST", ["leads", "import"]) => {
            let limit = state.config.limits.max_import_bytes;
            let raw = read_text(&mut req, limit)?;
            let report = import_leads(db, &ctx, &raw, limit, Utc::now())?;
            json_response(&json!({
                "imported": report.imported_count(),
                "skipped": report.skipped_count(),
                "outcomes": report.outcomes,
            }))
        }
        ("GET", ["leads", "export.csv"]) => {
            let rows = export_rows(&req, state)?;
            let filename = export_filename(Utc::now().date_naive(), "csv");
            attachment_response(to_csv(&rows)?, mime::TEXT_CSV_UTF_8.as_ref(), &filename)
        }
        ("GET", ["leads", "export.xls"]) => {
            let rows = export_rows(&req, state)?;
            let filename = export_filename(Utc::now().date_naive(), "xls");
            attachment_response(to_excel_document(&rows), EXCEL_CONTENT_TYPE, &filename)
        }
        ("GET", ["leads", "export.xlsx"]) => {
            let rows = export_rows(&req, state)?;
            let filename = export_filename(Utc::now().date_naive(), "xlsx");
            export_leads_xlsx(&rows, &filename)
        }

        // --- single lead ---
        ("GET", ["leads", id]) => {
            let params = QueryParams::from_request(&req);
            let visibility = if params.flag("audit") {
                Visibility::IncludeDeleted
            } else {
                Visibility::ActiveOnly
            };
            json_response(&leads::get_lead(db, id, visibility)?)
        }
        ("POST", ["leads", id]) => {
            let draft: LeadDraft = read_json(&mut req)?;
            let mut lead = leads::get_lead(db, id, Visibility::IncludeDeleted)?;
            draft.apply_to(&mut lead);
            let updated = leads::update_lead_checked(db, &lead, draft.updated_at, Utc::now())?;
            json_response(&updated)
        }
        ("POST", ["leads", id, "delete"]) => {
            leads::soft_delete_lead(db, id, Utc::now())?;
            json_response(&leads::get_lead(db, id, Visibility::IncludeDeleted)?)
        }
        ("POST", ["leads", id, "restore"]) => json_response(&leads::restore_lead(db, id, Utc::now())?),
        ("POST", ["leads", id, "tags"]) => {
            let body: TagBody = read_json(&mut req)?;
            json_response(&leads::toggle_tag(db, id, &body.tag, Utc::now())?)
        }
        ("POST", ["leads", id, "status"]) => {
            let body: StatusBody = read_json(&mut req)?;
            json_response(&leads::set_status(db, id, body.status, Utc::now())?)
        }
        ("POST", ["leads", id, "notes"]) => {
            let body: NoteBody = read_json(&mut req)?;
            let note = leads::add_note(db, id, &body.author_name, &body.content, Utc::now())?;
            json_response_with_status(201, &note)
        }
        ("GET", ["leads", id, "insight"]) => {
            let lead = leads::get_lead(db, id, Visibility::ActiveOnly)?;
            let advice = advice_or_placeholder(state.advice.as_ref(), &AdviceContext::for_lead(&lead));
            json_response(&json!({ "lead_id": lead.id, "advice": advice }))
        }

        // --- layout preferences ---
        ("GET", ["layout"]) => json_response(&load_layout(db, &ctx.user_id)?),
        ("POST", ["layout"]) => {
            let prefs: LayoutPreferences = read_json(&mut req)?;
            save_layout(db, &ctx.user_id, &prefs, Utc::now())?;
            json_response(&prefs)
        }
        ("POST", ["layout", "columns", "move"]) => {
            let body: MoveBody = read_json(&mut req)?;
            update_layout(db, &ctx, |prefs| prefs.move_column(body.from, body.to))
        }
        ("POST", ["layout", "tabs", "move"]) => {
            let body: MoveBody = read_json(&mut req)?;
            update_layout(db, &ctx, |prefs| prefs.move_tab(body.from, body.to))
        }
        ("POST", ["layout", "reset"]) => update_layout(db, &ctx, LayoutPreferences::reset_to_default),

        _ => Err(ServerError::NotFound),
    }
}

// ---------------------------------------------------------------------------
// Handlers with more than a couple of steps
// ---------------------------------------------------------------------------

fn list_page(req: &Request, state: &AppState) -> ResultResp {
    let params = QueryParams::from_request(req);
    let (filter, sort) = params.filter_and_sort()?;
    let page_size = page_size_or_default(
        params
            .parse_usize("page_size")?
            .or(Some(state.config.limits.default_page_size)),
    );

    let all = leads::list_leads(&state.db, Visibility::ActiveOnly)?;

    let mut board = LeadBoard::new(filter, sort, page_size);
    board.go_to_page(params.parse_usize("page")?.unwrap_or(1));
    json_response(&board.view(&all))
}

/// Filtered and sorted active leads, refused above the export row limit.
fn export_rows(req: &Request, state: &AppState) -> Result<Vec<Lead>, ServerError> {
    let params = QueryParams::from_request(req);
    let (filter, sort) = params.filter_and_sort()?;

    let all = leads::list_leads(&state.db, Visibility::ActiveOnly)?;
    let rows = query(&all, &filter, sort);
    check_export_size(rows.len(), state.config.limits.max_export_rows)?;

    tracing::info!(rows = rows.len(), "lead export");
    Ok(rows)
}

fn update_layout(
    db: &Database,
    ctx: &SessionContext,
    change: impl FnOnce(&mut LayoutPreferences),
) -> ResultResp {
    let mut prefs = load_layout(db, &ctx.user_id)?;
    change(&mut prefs);
    save_layout(db, &ctx.user_id, &prefs, Utc::now())?;
    json_response(&prefs)
}

// ---------------------------------------------------------------------------
// Request plumbing
// ---------------------------------------------------------------------------

#[derive(Deserialize)]
struct BulkTagBody {
    ids: Vec<String>,
    tag: String,
}

#[derive(Deserialize)]
struct BulkIdsBody {
    ids: Vec<String>,
}

#[derive(Deserialize)]
struct TagBody {
    tag: String,
}

#[derive(Deserialize)]
struct StatusBody {
    status: LeadStatus,
}

#[derive(Deserialize)]
struct NoteBody {
    #[serde(default)]
    author_name: String,
    content: String,
}

#[derive(Deserialize)]
struct MoveBody {
    from: usize,
    to: usize,
}

/// Config defaults, overridden per request by the session headers.
fn session_from_headers(req: &Request, config: &AppConfig) -> SessionContext {
    let mut ctx = config.default_session();
    let header = |name: &str| {
        req.headers()
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .map(String::from)
    };

    if let Some(b) = header(BROKERAGE_HEADER) {
        ctx.brokerage_id = b;
    }
    if let Some(a) = header(AGENT_HEADER) {
        ctx.agent_id = a;
    }
    if let Some(u) = header(USER_HEADER) {
        ctx.user_id = u;
    }
    ctx
}

/// Reads at most `limit` bytes; anything longer is refused.
fn read_body(req: &mut Request, limit: usize) -> Result<Vec<u8>, ServerError> {
    let mut buf = Vec::new();
    req.body_mut()
        .reader()
        .take(limit as u64 + 1)
        .read_to_end(&mut buf)
        .map_err(|e| ServerError::BadRequest(format!("Failed to read body: {e}")))?;

    if buf.len() > limit {
        return Err(ServerError::PayloadTooLarge {
            size: buf.len(),
            limit,
        });
    }
    Ok(buf)
}

fn read_text(req: &mut Request, limit: usize) -> Result<String, ServerError> {
    String::from_utf8(read_body(req, limit)?)
        .map_err(|_| ServerError::BadRequest("Body is not valid UTF-8".into()))
}

fn read_json<T: DeserializeOwned>(req: &mut Request) -> Result<T, ServerError> {
    let bytes = read_body(req, MAX_JSON_BYTES)?;
    Ok(serde_json::from_slice(&bytes)?)
}

/// Decoded query string. Keys may repeat (`source`, `tag`).
struct QueryParams {
    pairs: Vec<(String, String)>,
}

impl QueryParams {
    fn from_request(req: &Request) -> Self {
        let pairs = req
            .uri()
            .query()
            .map(|q| url::form_urlencoded::parse(q.as_bytes()).into_owned().collect())
            .unwrap_or_default();
        Self { pairs }
    }

    fn first(&self, key: &str) -> Option<&str> {
        self.pairs
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    fn all(&self, key: &str) -> BTreeSet<String> {
        self.pairs
            .iter()
            .filter(|(k, v)| k == key && !v.trim().is_empty())
            .map(|(_, v)| v.clone())
            .collect()
    }

    fn flag(&self, key: &str) -> bool {
        matches!(self.first(key), Some("1" | "true" | "yes"))
    }

    fn parse_usize(&self, key: &str) -> Result<Option<usize>, ServerError> {
        match self.first(key).map(str::trim).filter(|v| !v.is_empty()) {
            None => Ok(None),
            Some(v) => v
                .parse()
                .map(Some)
                .map_err(|_| ServerError::BadRequest(format!("{key} must be a number"))),
        }
    }

    fn filter_and_sort(&self) -> Result<(LeadFilter, SortOption), ServerError> {
        let status = match self.first("status") {
            None | Some("") => StatusFilter::All,
            Some(raw) => StatusFilter::parse(raw)
                .ok_or_else(|| ServerError::BadRequest(format!("unknown status: {raw}")))?,
        };
        let sort = match self.first("sort") {
            None | Some("") => SortOption::default(),
            Some(raw) => SortOption::parse(raw)
                .ok_or_else(|| ServerError::BadRequest(format!("unknown sort: {raw}")))?,
        };

        let filter = LeadFilter {
            status,
            sources: self.all("source"),
            tags: self.all("tag"),
            search_term: self.first("q").unwrap_or_default().to_string(),
        };
        Ok((filter, sort))
    }
}
