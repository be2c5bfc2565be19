use std::collections::BTreeMap;
use std::future::Future;
use std::io::{self, BufRead, Write};
use std::sync::Arc;
use std::time::Instant;

use parking_lot::Mutex;
use serde::Deserialize;
use serde_json::{json, Value};
use techcompare_engine::{
    build_narrative_provider, shared_catalog, ComparisonError, ComparisonOrchestrator,
    ComparisonResult, CriterionType, NarrativeProvider, NewCriterion, NewTechnology,
    OrchestratorConfig, PersistentCatalogStore, StorageError, UserConstraints,
};
use tokio::runtime::Runtime;
use tracing::{debug, info, warn};

use crate::cache::{CacheKey, ComparisonCache};
use crate::config::{narrative_config_from_env, ServerConfig};
use crate::protocol::{
    JsonRpcRequest, JsonRpcResponse, INVALID_PARAMS, INVALID_REQUEST, METHOD_NOT_FOUND,
    NOT_FOUND, PARSE_ERROR, STORAGE_FAILURE,
};

const DEFAULT_MCP_PROTOCOL_VERSION: &str = "2024-11-05";
const DEFAULT_LIST_LIMIT: usize = 20;
const MAX_LIST_LIMIT: usize = 200;
const MAX_FRAME_BYTES: usize = 4 * 1024 * 1024;

pub struct McpServer {
    orchestrator: ComparisonOrchestrator,
    cache: Mutex<ComparisonCache>,
    runtime: Runtime,
}

impl McpServer {
    /// Builds the server from `TECHCOMPARE_*` variables. A misconfigured
    /// narrative provider is logged and skipped; a broken catalog is fatal.
    pub fn from_env() -> Result<Self, String> {
        let config = ServerConfig::from_env();
        let narrator = match narrative_config_from_env(config.narrative_timeout) {
            Ok(Some(cfg)) => match build_narrative_provider(cfg) {
                Ok(provider) => Some(provider),
                Err(err) => {
                    warn!(error = %err, "narrative provider init failed; summaries disabled");
                    None
                }
            },
            Ok(None) => None,
            Err(err) => {
                warn!(error = %err, "narrative provider misconfigured; summaries disabled");
                None
            }
        };
        Self::with_config(config, narrator)
    }

    pub fn with_db_path(db_path: impl Into<String>) -> Result<Self, String> {
        Self::with_config(ServerConfig::with_db_path(db_path), None)
    }

    pub fn with_config(
        config: ServerConfig,
        narrator: Option<Arc<dyn NarrativeProvider>>,
    ) -> Result<Self, String> {
        let store = PersistentCatalogStore::open(&config.db_path).map_err(|e| e.to_string())?;
        let orchestrator_config = OrchestratorConfig {
            narrative_timeout: config.narrative_timeout,
            ..OrchestratorConfig::default()
        };
        let narrative = narrator.as_ref().map(|n| n.name());
        let mut orchestrator =
            ComparisonOrchestrator::with_config(shared_catalog(store), orchestrator_config);
        if let Some(narrator) = narrator {
            orchestrator = orchestrator.with_narrator(narrator);
        }
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(2)
            .enable_all()
            .build()
            .map_err(|e| format!("tokio runtime init failed: {e}"))?;

        info!(
            db = %config.db_path,
            cache_capacity = config.cache_capacity,
            narrative = narrative.unwrap_or("none"),
            "techcompare server ready"
        );
        Ok(Self {
            orchestrator,
            cache: Mutex::new(ComparisonCache::new(config.cache_capacity)),
            runtime,
        })
    }

    pub fn handle_request(&self, request: JsonRpcRequest) -> Option<JsonRpcResponse> {
        if request.jsonrpc != "2.0" {
            return Some(JsonRpcResponse::error(
                request.id.unwrap_or(Value::Null),
                INVALID_REQUEST,
                "invalid jsonrpc version",
            ));
        }

        let Some(id) = request.id else {
            debug!(method = %request.method, "ignoring notification");
            return None;
        };

        let response = match request.method.as_str() {
            "initialize" => {
                let protocol_version = request
                    .params
                    .get("protocolVersion")
                    .and_then(Value::as_str)
                    .unwrap_or(DEFAULT_MCP_PROTOCOL_VERSION);
                JsonRpcResponse::success(
                    id,
                    json!({
                        "protocolVersion": protocol_version,
                        "serverInfo": {
                            "name": "techcompare-mcp",
                            "version": env!("CARGO_PKG_VERSION")
                        },
                        "capabilities": {
                            "tools": {"listChanged": false}
                        }
                    }),
                )
            }
            "ping" => JsonRpcResponse::success(id, json!({})),
            "tools/list" => JsonRpcResponse::success(id, tools_list_result()),
            "tools/call" => self.handle_tools_call(id, request.params),
            _ => JsonRpcResponse::error(id, METHOD_NOT_FOUND, "method not found"),
        };

        Some(response)
    }

    fn handle_tools_call(&self, id: Value, params: Value) -> JsonRpcResponse {
        let parsed: ToolsCallParams = match serde_json::from_value(params) {
            Ok(v) => v,
            Err(err) => {
                return JsonRpcResponse::error(
                    id,
                    INVALID_PARAMS,
                    format!("invalid params: {err}"),
                );
            }
        };

        let start = Instant::now();
        let response = match parsed.name.as_str() {
            "compare_technologies" => self.exec_compare_technologies(id, parsed.arguments),
            "compare_technologies_by_name" => self.exec_compare_by_name(id, parsed.arguments),
            "score_technology" => self.exec_score_technology(id, parsed.arguments),
            "technology_upsert" => self.exec_technology_upsert(id, parsed.arguments),
            "technology_delete" => self.exec_technology_delete(id, parsed.arguments),
            "technology_list" => self.exec_technology_list(id, parsed.arguments),
            "criterion_upsert" => self.exec_criterion_upsert(id, parsed.arguments),
            "criterion_delete" => self.exec_criterion_delete(id, parsed.arguments),
            "criteria_list" => self.exec_criteria_list(id, parsed.arguments),
            "comparison_cache_stats" => self.exec_cache_stats(id),
            _ => JsonRpcResponse::error(id, METHOD_NOT_FOUND, "unknown tool"),
        };
        debug!(
            tool = %parsed.name,
            latency_ms = start.elapsed().as_secs_f64() * 1000.0,
            error = response.error.is_some(),
            "tool call finished"
        );
        response
    }

    /// Serves from the cache when allowed, otherwise runs the comparison and
    /// stores it unless the catalog changed while it ran.
    fn compare_cached<F, Fut>(
        &self,
        key: CacheKey,
        use_cache: bool,
        run: F,
    ) -> Result<(ComparisonResult, bool), ComparisonError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<ComparisonResult, ComparisonError>>,
    {
        let generation = if use_cache {
            let mut cache = self.cache.lock();
            if let Some(hit) = cache.get(&key) {
                return Ok((hit, true));
            }
            Some(cache.generation())
        } else {
            None
        };

        let result = self.runtime.block_on(run())?;

        if let Some(generation) = generation {
            let mut cache = self.cache.lock();
            if cache.generation() == generation {
                cache.insert(key, result.clone());
            }
        }
        Ok((result, false))
    }

    fn catalog_changed(&self, tool: &str, record: &str) {
        let mut cache = self.cache.lock();
        let dropped = cache.stats().entries;
        cache.invalidate_all();
        info!(tool, record, dropped, "catalog changed; comparison cache cleared");
    }

    fn exec_compare_technologies(&self, id: Value, arguments: Option<Value>) -> JsonRpcResponse {
        let args: CompareByIdInput = match parse_args(arguments) {
            Ok(v) => v,
            Err(resp) => return with_id(resp, id),
        };
        let constraints = args.preferences.into_constraints();
        let key = CacheKey::by_ids(&args.technology_ids, &constraints);
        let outcome = self.compare_cached(key, args.use_cache, || {
            self.orchestrator
                .generate_comparison(&args.technology_ids, constraints.clone())
        });
        comparison_response(id, outcome)
    }

    fn exec_compare_by_name(&self, id: Value, arguments: Option<Value>) -> JsonRpcResponse {
        let args: CompareByNameInput = match parse_args(arguments) {
            Ok(v) => v,
            Err(resp) => return with_id(resp, id),
        };
        let constraints = args.preferences.into_constraints();
        let key = CacheKey::by_names(&args.technology_names, &constraints);
        let outcome = self.compare_cached(key, args.use_cache, || {
            self.orchestrator
                .generate_comparison_by_names(&args.technology_names, constraints.clone())
        });
        comparison_response(id, outcome)
    }

    fn exec_score_technology(&self, id: Value, arguments: Option<Value>) -> JsonRpcResponse {
        let args: ScoreInput = match parse_args(arguments) {
            Ok(v) => v,
            Err(resp) => return with_id(resp, id),
        };
        let constraints = args.preferences.into_constraints();
        match self
            .orchestrator
            .score_technology(&args.technology_id, &constraints)
        {
            Ok(score) => {
                let text = format!(
                    "{} scored {:.1}/100",
                    score.technology.name, score.overall_score
                );
                JsonRpcResponse::tool_result(id, json!(score), text)
            }
            Err(err) => comparison_error(id, &err),
        }
    }

    fn exec_technology_upsert(&self, id: Value, arguments: Option<Value>) -> JsonRpcResponse {
        let args: TechnologyUpsertInput = match parse_args(arguments) {
            Ok(v) => v,
            Err(resp) => return with_id(resp, id),
        };
        let outcome = self.orchestrator.catalog().write().upsert_technology(NewTechnology {
            id: args.id,
            name: args.name,
            category: args.category,
            metrics: args.metrics,
            tags: args.tags,
        });
        match outcome {
            Ok(technology) => {
                self.catalog_changed("technology_upsert", &technology.id);
                let text = format!("saved {} as {}", technology.name, technology.id);
                JsonRpcResponse::tool_result(id, json!(technology), text)
            }
            Err(err) => storage_error(id, &err),
        }
    }

    fn exec_technology_delete(&self, id: Value, arguments: Option<Value>) -> JsonRpcResponse {
        let args: DeleteInput = match parse_args(arguments) {
            Ok(v) => v,
            Err(resp) => return with_id(resp, id),
        };
        let outcome = self.orchestrator.catalog().write().delete_technology(&args.id);
        match outcome {
            Ok(deleted) => {
                if deleted {
                    self.catalog_changed("technology_delete", &args.id);
                }
                JsonRpcResponse::tool_result(
                    id,
                    json!({"deleted": deleted, "id": args.id}),
                    if deleted { "deleted" } else { "not found" },
                )
            }
            Err(err) => storage_error(id, &err),
        }
    }

    fn exec_technology_list(&self, id: Value, arguments: Option<Value>) -> JsonRpcResponse {
        let args: ListInput = match parse_args_optional(arguments) {
            Ok(v) => v,
            Err(resp) => return with_id(resp, id),
        };
        let limit = args
            .limit
            .unwrap_or(DEFAULT_LIST_LIMIT)
            .clamp(1, MAX_LIST_LIMIT);
        let items = self.orchestrator.catalog().read().list_technologies(limit);
        let text = format!("listed {} technologies", items.len());
        JsonRpcResponse::tool_result(
            id,
            json!({"count": items.len(), "limit": limit, "items": items}),
            text,
        )
    }

    fn exec_criterion_upsert(&self, id: Value, arguments: Option<Value>) -> JsonRpcResponse {
        let args: CriterionUpsertInput = match parse_args(arguments) {
            Ok(v) => v,
            Err(resp) => return with_id(resp, id),
        };
        let Some(kind) = CriterionType::parse(&args.criterion_type) else {
            return JsonRpcResponse::error(
                id,
                INVALID_PARAMS,
                format!("unknown criterion type: {}", args.criterion_type),
            );
        };
        let outcome = self.orchestrator.catalog().write().upsert_criterion(NewCriterion {
            id: args.id,
            name: args.name,
            description: args.description,
            weight: args.weight,
            kind,
            active: args.active.unwrap_or(true),
        });
        match outcome {
            Ok(criterion) => {
                self.catalog_changed("criterion_upsert", &criterion.id);
                let text = format!("saved criterion {} as {}", criterion.name, criterion.id);
                JsonRpcResponse::tool_result(id, json!(criterion), text)
            }
            Err(err) => storage_error(id, &err),
        }
    }

    fn exec_criterion_delete(&self, id: Value, arguments: Option<Value>) -> JsonRpcResponse {
        let args: DeleteInput = match parse_args(arguments) {
            Ok(v) => v,
            Err(resp) => return with_id(resp, id),
        };
        let outcome = self.orchestrator.catalog().write().delete_criterion(&args.id);
        match outcome {
            Ok(deleted) => {
                if deleted {
                    self.catalog_changed("criterion_delete", &args.id);
                }
                JsonRpcResponse::tool_result(
                    id,
                    json!({"deleted": deleted, "id": args.id}),
                    if deleted { "deleted" } else { "not found" },
                )
            }
            Err(err) => storage_error(id, &err),
        }
    }

    fn exec_criteria_list(&self, id: Value, arguments: Option<Value>) -> JsonRpcResponse {
        let args: CriteriaListInput = match parse_args_optional(arguments) {
            Ok(v) => v,
            Err(resp) => return with_id(resp, id),
        };
        let mut items = self.orchestrator.catalog().read().list_criteria();
        if args.active_only.unwrap_or(false) {
            items.retain(|c| c.active);
        }
        let total_weight: f64 = items.iter().filter(|c| c.active).map(|c| c.weight).sum();
        let text = format!("listed {} criteria", items.len());
        JsonRpcResponse::tool_result(
            id,
            json!({"count": items.len(), "activeWeight": total_weight, "items": items}),
            text,
        )
    }

    fn exec_cache_stats(&self, id: Value) -> JsonRpcResponse {
        let stats = self.cache.lock().stats();
        let text = format!(
            "cache {}/{} entries, {} hits, {} misses",
            stats.entries, stats.capacity, stats.hits, stats.misses
        );
        let catalog = self.orchestrator.catalog().read().stats();
        JsonRpcResponse::tool_result(id, json!({"cache": stats, "catalog": catalog}), text)
    }

    pub fn serve_stdio(&self) -> io::Result<()> {
        let stdin = io::stdin();
        let mut reader = io::BufReader::new(stdin.lock());
        let mut stdout = io::stdout();

        while let Some(incoming) = read_stdio_message(&mut reader)? {
            let (payload, frame) = match incoming {
                Incoming::Message { payload, frame } => (payload, frame),
                Incoming::Malformed { reason, frame } => {
                    let response = JsonRpcResponse::error(
                        Value::Null,
                        PARSE_ERROR,
                        format!("invalid stdio frame: {reason}"),
                    );
                    write_stdio_response(&mut stdout, &response, frame)?;
                    continue;
                }
            };

            let request: JsonRpcRequest = match serde_json::from_slice(&payload) {
                Ok(v) => v,
                Err(err) => {
                    let response = JsonRpcResponse::error(
                        Value::Null,
                        PARSE_ERROR,
                        format!("parse error: {err}"),
                    );
                    write_stdio_response(&mut stdout, &response, frame)?;
                    continue;
                }
            };

            if let Some(response) = self.handle_request(request) {
                write_stdio_response(&mut stdout, &response, frame)?;
            }
        }

        debug!("stdin closed; stopping");
        Ok(())
    }
}

fn comparison_response(
    id: Value,
    outcome: Result<(ComparisonResult, bool), ComparisonError>,
) -> JsonRpcResponse {
    match outcome {
        Ok((result, cached)) => {
            let ranking: Vec<String> = result.ranking().into_iter().map(str::to_string).collect();
            let text = format!(
                "compared {} technologies; leader: {}",
                result.technology_scores.len(),
                ranking.first().map_or("none", String::as_str)
            );
            JsonRpcResponse::tool_result(
                id,
                json!({"cached": cached, "ranking": ranking, "comparison": result}),
                text,
            )
        }
        Err(err) => comparison_error(id, &err),
    }
}

fn comparison_error(id: Value, err: &ComparisonError) -> JsonRpcResponse {
    match err {
        ComparisonError::InvalidInput(_) => {
            JsonRpcResponse::error(id, INVALID_PARAMS, err.to_string())
        }
        ComparisonError::NotFound(_) => JsonRpcResponse::error(id, NOT_FOUND, err.to_string()),
        ComparisonError::Storage(inner) => storage_error(id, inner),
    }
}

fn storage_error(id: Value, err: &StorageError) -> JsonRpcResponse {
    let code = match err {
        StorageError::InvalidInput(_) => INVALID_PARAMS,
        StorageError::NotFound(_) => NOT_FOUND,
        StorageError::Io(_) | StorageError::Serde(_) => STORAGE_FAILURE,
    };
    JsonRpcResponse::error(id, code, err.to_string())
}

fn with_id(mut response: JsonRpcResponse, id: Value) -> JsonRpcResponse {
    response.id = id;
    response
}

fn parse_args<T: for<'de> Deserialize<'de>>(
    arguments: Option<Value>,
) -> Result<T, JsonRpcResponse> {
    let Some(args) = arguments else {
        return Err(JsonRpcResponse::error(
            Value::Null,
            INVALID_PARAMS,
            "missing tool arguments",
        ));
    };
    serde_json::from_value(args).map_err(|err| {
        JsonRpcResponse::error(
            Value::Null,
            INVALID_PARAMS,
            format!("invalid tool arguments: {err}"),
        )
    })
}

fn parse_args_optional<T: for<'de> Deserialize<'de> + Default>(
    arguments: Option<Value>,
) -> Result<T, JsonRpcResponse> {
    match arguments {
        Some(Value::Null) | None => Ok(T::default()),
        Some(v) => parse_args(Some(v)),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum StdioFrame {
    LineDelimited,
    ContentLength,
}

enum Incoming {
    Message { payload: Vec<u8>, frame: StdioFrame },
    Malformed { reason: String, frame: StdioFrame },
}

/// Next message from stdin: either a bare JSON line or a `Content-Length`
/// framed body. `None` at end of input.
fn read_stdio_message<R: BufRead>(reader: &mut R) -> io::Result<Option<Incoming>> {
    let mut line = String::new();
    loop {
        line.clear();
        if reader.read_line(&mut line)? == 0 {
            return Ok(None);
        }
        let trimmed = line.trim_end_matches(['\r', '\n']).trim_start();
        if trimmed.is_empty() {
            continue;
        }
        if !is_stdio_header_line(trimmed) {
            return Ok(Some(Incoming::Message {
                payload: trimmed.as_bytes().to_vec(),
                frame: StdioFrame::LineDelimited,
            }));
        }

        let header = trimmed.to_string();
        let length = match read_remaining_headers(reader, &header) {
            Ok(length) => length,
            Err(err) => {
                return Ok(Some(Incoming::Malformed {
                    reason: err.to_string(),
                    frame: StdioFrame::ContentLength,
                }));
            }
        };
        if length > MAX_FRAME_BYTES {
            // Body bytes are not consumed; any that follow are read as lines.
            return Ok(Some(Incoming::Malformed {
                reason: format!("content-length {length} exceeds {MAX_FRAME_BYTES} bytes"),
                frame: StdioFrame::ContentLength,
            }));
        }
        let mut body = vec![0_u8; length];
        return Ok(Some(match reader.read_exact(&mut body) {
            Ok(()) => Incoming::Message {
                payload: body,
                frame: StdioFrame::ContentLength,
            },
            Err(err) => Incoming::Malformed {
                reason: format!("body: {err}"),
                frame: StdioFrame::ContentLength,
            },
        }));
    }
}

fn is_stdio_header_line(line: &str) -> bool {
    let lower = line.to_ascii_lowercase();
    lower.starts_with("content-length:") || lower.starts_with("content-type:")
}

fn read_remaining_headers<R: BufRead>(reader: &mut R, first_line: &str) -> io::Result<usize> {
    let mut content_length = parse_content_length(first_line);
    let mut header_line = String::new();
    loop {
        header_line.clear();
        if reader.read_line(&mut header_line)? == 0 {
            return Err(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                "unexpected eof while reading frame headers",
            ));
        }
        let trimmed = header_line.trim_end_matches(['\r', '\n']);
        if trimmed.is_empty() {
            break;
        }
        if let Some(v) = parse_content_length(trimmed) {
            content_length = Some(v);
        }
    }
    content_length
        .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidData, "missing content-length header"))
}

fn parse_content_length(line: &str) -> Option<usize> {
    let (name, value) = line.split_once(':')?;
    if !name.trim().eq_ignore_ascii_case("content-length") {
        return None;
    }
    value.trim().parse::<usize>().ok()
}

fn write_stdio_response(
    stdout: &mut io::Stdout,
    response: &JsonRpcResponse,
    frame: StdioFrame,
) -> io::Result<()> {
    let serialized = serde_json::to_vec(response)?;
    match frame {
        StdioFrame::LineDelimited => {
            stdout.write_all(&serialized)?;
            stdout.write_all(b"\n")?;
        }
        StdioFrame::ContentLength => {
            write!(stdout, "Content-Length: {}\r\n\r\n", serialized.len())?;
            stdout.write_all(&serialized)?;
        }
    }
    stdout.flush()
}

#[derive(Debug, Deserialize)]
struct ToolsCallParams {
    name: String,
    arguments: Option<Value>,
}

const fn default_true() -> bool {
    true
}

#[derive(Debug, Default, Deserialize)]
struct PreferenceInput {
    #[serde(default)]
    priority_tags: Vec<String>,
    project_type: Option<String>,
    team_size: Option<String>,
    timeline: Option<String>,
}

impl PreferenceInput {
    fn into_constraints(self) -> UserConstraints {
        UserConstraints {
            priority_tags: self.priority_tags.into_iter().collect(),
            project_type: self.project_type,
            team_size: self.team_size,
            timeline: self.timeline,
        }
    }
}

#[derive(Debug, Deserialize)]
struct CompareByIdInput {
    technology_ids: Vec<String>,
    #[serde(flatten)]
    preferences: PreferenceInput,
    #[serde(default = "default_true")]
    use_cache: bool,
}

#[derive(Debug, Deserialize)]
struct CompareByNameInput {
    technology_names: Vec<String>,
    #[serde(flatten)]
    preferences: PreferenceInput,
    #[serde(default = "default_true")]
    use_cache: bool,
}

#[derive(Debug, Deserialize)]
struct ScoreInput {
    technology_id: String,
    #[serde(flatten)]
    preferences: PreferenceInput,
}

#[derive(Debug, Deserialize)]
struct TechnologyUpsertInput {
    id: Option<String>,
    name: String,
    #[serde(default)]
    category: String,
    #[serde(default)]
    metrics: BTreeMap<String, f64>,
    #[serde(default)]
    tags: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct CriterionUpsertInput {
    id: Option<String>,
    name: String,
    description: Option<String>,
    weight: f64,
    #[serde(alias = "type")]
    criterion_type: String,
    active: Option<bool>,
}

#[derive(Debug, Deserialize)]
struct DeleteInput {
    id: String,
}

#[derive(Debug, Default, Deserialize)]
struct ListInput {
    limit: Option<usize>,
}

#[derive(Debug, Default, Deserialize)]
struct CriteriaListInput {
    active_only: Option<bool>,
}

fn tools_list_result() -> Value {
    let preference_props = json!({
        "priority_tags": {"type": "array", "items": {"type": "string"}},
        "project_type": {"type": "string"},
        "team_size": {"type": "string"},
        "timeline": {"type": "string"}
    });
    let criterion_types: Vec<&str> = CriterionType::ALL.iter().map(|k| k.as_str()).collect();
    let with_preferences = |extra: Value| {
        let mut props = preference_props.clone();
        if let (Some(target), Value::Object(source)) = (props.as_object_mut(), extra) {
            target.extend(source);
        }
        props
    };

    json!({
        "tools": [
            {
                "name": "compare_technologies",
                "description": "Compare 2-5 technologies by id: scores, radar series and KPIs.",
                "inputSchema": {
                    "type": "object",
                    "required": ["technology_ids"],
                    "properties": with_preferences(json!({
                        "technology_ids": {
                            "type": "array",
                            "items": {"type": "string"},
                            "minItems": 2,
                            "maxItems": 5
                        },
                        "use_cache": {"type": "boolean"}
                    }))
                }
            },
            {
                "name": "compare_technologies_by_name",
                "description": "Compare 2-5 catalog technologies by case-insensitive name.",
                "inputSchema": {
                    "type": "object",
                    "required": ["technology_names"],
                    "properties": with_preferences(json!({
                        "technology_names": {
                            "type": "array",
                            "items": {"type": "string"},
                            "minItems": 2,
                            "maxItems": 5
                        },
                        "use_cache": {"type": "boolean"}
                    }))
                }
            },
            {
                "name": "score_technology",
                "description": "Score a single technology against the active criteria.",
                "inputSchema": {
                    "type": "object",
                    "required": ["technology_id"],
                    "properties": with_preferences(json!({
                        "technology_id": {"type": "string"}
                    }))
                }
            },
            {
                "name": "technology_upsert",
                "description": "Create a technology, or update it by id or case-insensitive name.",
                "inputSchema": {
                    "type": "object",
                    "required": ["name"],
                    "properties": {
                        "id": {"type": "string"},
                        "name": {"type": "string"},
                        "category": {"type": "string"},
                        "metrics": {"type": "object", "additionalProperties": {"type": "number"}},
                        "tags": {"type": "array", "items": {"type": "string"}}
                    }
                }
            },
            {
                "name": "technology_delete",
                "description": "Delete a technology by id.",
                "inputSchema": {
                    "type": "object",
                    "required": ["id"],
                    "properties": {"id": {"type": "string"}}
                }
            },
            {
                "name": "technology_list",
                "description": "List catalog technologies, most recent first.",
                "inputSchema": {
                    "type": "object",
                    "properties": {
                        "limit": {"type": "integer", "minimum": 1, "maximum": MAX_LIST_LIMIT}
                    }
                }
            },
            {
                "name": "criterion_upsert",
                "description": "Create or update an evaluation criterion (weight 0-10).",
                "inputSchema": {
                    "type": "object",
                    "required": ["name", "weight", "criterion_type"],
                    "properties": {
                        "id": {"type": "string"},
                        "name": {"type": "string"},
                        "description": {"type": "string"},
                        "weight": {"type": "number", "minimum": 0, "maximum": 10},
                        "criterion_type": {
                            "type": "string",
                            "enum": criterion_types
                        },
                        "active": {"type": "boolean"}
                    }
                }
            },
            {
                "name": "criterion_delete",
                "description": "Delete a criterion by id.",
                "inputSchema": {
                    "type": "object",
                    "required": ["id"],
                    "properties": {"id": {"type": "string"}}
                }
            },
            {
                "name": "criteria_list",
                "description": "List evaluation criteria.",
                "inputSchema": {
                    "type": "object",
                    "properties": {"active_only": {"type": "boolean"}}
                }
            },
            {
                "name": "comparison_cache_stats",
                "description": "Comparison cache counters and catalog size.",
                "inputSchema": {"type": "object", "properties": {}}
            }
        ]
    })
}
