//! Axum-based gateway for the ZacAI assistant. Config-driven via CoreConfig.
//!
//! `--verify` runs a pre-flight check; `--chat` starts an interactive terminal session
//! instead of the HTTP server.

mod handlers;

use axum::{
    http::Method,
    response::sse::{Event, Sse},
    extract::{Query, State},
    routing::{get, post},
    Router,
};
use std::path::{Path as StdPath, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::broadcast;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tracing::field::Visit;
use tracing_subscriber::layer::Context;
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use zacai_core::{Category, CoreConfig, KnowledgeDocument, SessionRegistry, SledVault};

const VAULT_DIR: &str = "zacai_knowledge";

/// One broadcast log line, tagged with the session it was emitted for (if any).
#[derive(Debug, Clone)]
pub(crate) struct LogLine {
    pub(crate) session: Option<String>,
    pub(crate) text: String,
}

impl LogLine {
    /// With no filter every line passes; otherwise only lines tagged with that session.
    fn visible_to(&self, session: Option<&str>) -> bool {
        match session {
            None => true,
            Some(wanted) => self.session.as_deref() == Some(wanted),
        }
    }
}

/// Session tag stored on a `session` span's extensions.
struct SessionTag(String);

/// Pulls the `message` and `session` fields out of an event or span.
#[derive(Default)]
struct ChatFields {
    message: String,
    session: Option<String>,
}

impl Visit for ChatFields {
    fn record_str(&mut self, field: &tracing::field::Field, value: &str) {
        match field.name() {
            "message" => self.message = value.to_string(),
            "session" => self.session = Some(value.to_string()),
            _ => {}
        }
    }
    fn record_debug(&mut self, field: &tracing::field::Field, value: &dyn std::fmt::Debug) {
        match field.name() {
            "message" => self.message = format!("{:?}", value),
            "session" => self.session = Some(format!("{:?}", value)),
            _ => {}
        }
    }
}

/// Broadcasts each tracing event as a [`LogLine`] for the SSE log stream. Events emitted
/// inside a `session` span (or carrying a `session` field) are tagged with that session.
#[derive(Clone)]
struct LogBroadcastLayer {
    tx: broadcast::Sender<LogLine>,
}

impl LogBroadcastLayer {
    fn new(tx: broadcast::Sender<LogLine>) -> Self {
        Self { tx }
    }
}

impl<S> tracing_subscriber::Layer<S> for LogBroadcastLayer
where
    S: tracing::Subscriber + for<'a> LookupSpan<'a>,
{
    fn on_new_span(
        &self,
        attrs: &tracing::span::Attributes<'_>,
        id: &tracing::span::Id,
        ctx: Context<'_, S>,
    ) {
        let mut fields = ChatFields::default();
        attrs.record(&mut fields);
        if let (Some(session), Some(span)) = (fields.session, ctx.span(id)) {
            span.extensions_mut().insert(SessionTag(session));
        }
    }

    fn on_event(&self, event: &tracing::Event<'_>, ctx: Context<'_, S>) {
        let mut fields = ChatFields::default();
        event.record(&mut fields);
        let session = fields.session.or_else(|| {
            ctx.event_scope(event)?.find_map(|span| {
                let extensions = span.extensions();
                let tag = extensions.get::<SessionTag>().map(|tag| tag.0.clone());
                tag
            })
        });
        let meta = event.metadata();
        let text = match &session {
            Some(id) => format!("{} [{}] [session:{}] {}", meta.level(), meta.target(), id, fields.message),
            None => format!("{} [{}] {}", meta.level(), meta.target(), fields.message),
        };
        let _ = self.tx.send(LogLine { session, text });
    }
}

fn vault_path(config: &CoreConfig) -> PathBuf {
    StdPath::new(&config.storage_path).join(VAULT_DIR)
}

/// Pre-flight check: config loads, every category tree is readable, port is free.
fn run_verify() -> Result<(), String> {
    let config = CoreConfig::load().map_err(|e| format!("Config load failed: {}", e))?;

    let path = vault_path(&config);
    print!("Checking {}... ", path.display());
    let vault = SledVault::open_path(&path).map_err(|e| format!("vault LOCKED or inaccessible: {}", e))?;
    vault.verify().map_err(|e| format!("category tree failed: {}", e))?;
    let counts: Vec<String> = Category::all()
        .into_iter()
        .map(|c| format!("{}={}", c.tree_name(), vault.count(c).unwrap_or(0)))
        .collect();
    drop(vault);
    println!("OK ({})", counts.join(", "));

    let port = config.port;
    print!("Checking port {}... ", port);
    let addr = std::net::SocketAddr::from(([127, 0, 0, 1], port));
    match std::net::TcpListener::bind(addr) {
        Ok(listener) => {
            drop(listener);
            println!("OK (available)");
        }
        Err(e) => {
            return Err(format!("Port {} BLOCKED: {}", port, e));
        }
    }

    println!("\n✅ SUCCESS: All systems GO. Ready to start gateway.");
    Ok(())
}

/// Interactive terminal mode. Lines starting with `/` are commands; everything else is a query.
async fn run_chat(sessions: Arc<SessionRegistry>, app_name: &str) -> std::io::Result<()> {
    let orchestrator = sessions.get_or_open(None).await;
    println!("{} ready. Commands: /export <file>, /import <file>, /status, /quit", app_name);

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let (command, arg) = match line.split_once(' ') {
            Some((c, a)) => (c, a.trim()),
            None => (line, ""),
        };
        match command {
            "/quit" | "/exit" => break,
            "/status" => {
                for s in orchestrator.status().await {
                    println!("  {:<12} {:>5} entries ({} seed)", s.name, s.entry_count, s.seed_count);
                }
            }
            "/export" if !arg.is_empty() => match orchestrator.export().await.to_json() {
                Ok(json) => match tokio::fs::write(arg, json).await {
                    Ok(()) => println!("Exported knowledge to {}", arg),
                    Err(e) => println!("Export failed: {}", e),
                },
                Err(e) => println!("Export failed: {}", e),
            },
            "/import" if !arg.is_empty() => {
                let parsed = tokio::fs::read_to_string(arg)
                    .await
                    .map_err(|e| e.to_string())
                    .and_then(|json| KnowledgeDocument::from_json(&json).map_err(|e| e.to_string()));
                match parsed {
                    Ok(doc) => {
                        let report = orchestrator.import(doc).await;
                        println!(
                            "Imported: {} inserted, {} updated, {} unchanged",
                            report.inserted, report.updated, report.unchanged
                        );
                    }
                    Err(e) => println!("Import failed: {}", e),
                }
            }
            _ => {
                let reply = orchestrator.submit(line).await;
                println!("{}", reply.text);
                println!("  [{} · confidence {:.2}]", reply.pathway, reply.confidence);
                for step in &reply.trace {
                    println!("    - {}", step);
                }
            }
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() {
    // Load .env file if present (before any env::var calls)
    if let Err(e) = dotenvy::dotenv() {
        eprintln!("[zacai-gateway] .env not loaded: {} (using system environment)", e);
    }

    let args: Vec<String> = std::env::args().collect();
    if args.iter().any(|a| a == "--verify") {
        match run_verify() {
            Ok(()) => std::process::exit(0),
            Err(e) => {
                eprintln!("❌ PRE-FLIGHT FAILED: {}", e);
                std::process::exit(1);
            }
        }
    }
    let chat_mode = args.iter().any(|a| a == "--chat");

    let (log_tx, _) = broadcast::channel(1000);
    let log_layer = LogBroadcastLayer::new(log_tx.clone());

    // Terminal mode keeps stdout for replies.
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| if chat_mode { "warn".into() } else { "info".into() }),
        ))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(log_layer)
        .init();

    let config = match CoreConfig::load() {
        Ok(config) => Arc::new(config),
        Err(e) => {
            eprintln!("[zacai-gateway] config load failed: {}", e);
            std::process::exit(1);
        }
    };
    let path = vault_path(&config);
    let db = match sled::open(&path) {
        Ok(db) => db,
        Err(e) => {
            eprintln!("[zacai-gateway] cannot open {}: {}", path.display(), e);
            std::process::exit(1);
        }
    };

    let registry = Arc::new(zacai_skills::default_registry(&config));
    let sessions = Arc::new(
        SessionRegistry::new(Some(db), registry, config.assistant_settings())
            .with_capacity(config.max_sessions),
    );

    if chat_mode {
        if let Err(e) = run_chat(sessions, &config.app_name).await {
            eprintln!("[zacai-gateway] terminal session ended: {}", e);
            std::process::exit(1);
        }
        return;
    }

    let app = build_app(AppState {
        config: Arc::clone(&config),
        sessions,
        log_tx,
    });

    let addr = std::net::SocketAddr::from(([127, 0, 0, 1], config.port));
    let listener = match tokio::net::TcpListener::bind(addr).await {
        Ok(listener) => listener,
        Err(e) => {
            eprintln!("[zacai-gateway] cannot bind {}: {}", addr, e);
            std::process::exit(1);
        }
    };
    tracing::info!(target: "zacai::gateway", "{} listening on {}", config.app_name, addr);
    if let Err(e) = axum::serve(listener, app).await {
        tracing::error!(target: "zacai::gateway", error = %e, "Server stopped");
    }
}

fn build_app(state: AppState) -> Router {
    // CORS: allow Backend/API (8001-8099) and Frontend/UI (3001-3099) port ranges.
    let cors = CorsLayer::new()
        .allow_origin(AllowOrigin::predicate(|origin: &axum::http::HeaderValue, _| {
            let s = origin.to_str().unwrap_or("");
            let port = s
                .rsplit(':')
                .next()
                .and_then(|p| p.parse::<u16>().ok())
                .unwrap_or(0);
            (3001..=3099).contains(&port) || (8001..=8099).contains(&port)
        }))
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers(tower_http::cors::Any)
        .expose_headers(tower_http::cors::Any);

    Router::new()
        .route("/api/v1/health", get(health))
        .route("/api/v1/status", get(status))
        .route("/api/v1/logs", get(logs_stream))
        .route("/api/v1/chat", post(handlers::chat::chat))
        .route("/api/v1/history", get(handlers::chat::history))
        .route("/api/v1/feedback", post(handlers::chat::feedback))
        .route("/api/v1/export", get(handlers::knowledge::export))
        .route("/api/v1/import", post(handlers::knowledge::import))
        .route("/api/v1/kb-status", get(handlers::knowledge::kb_status))
        .with_state(state)
        .layer(cors)
}

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) config: Arc<CoreConfig>,
    pub(crate) sessions: Arc<SessionRegistry>,
    pub(crate) log_tx: broadcast::Sender<LogLine>,
}

/// GET /api/v1/health – liveness check for UI and scripts.
async fn health() -> axum::Json<serde_json::Value> {
    axum::Json(serde_json::json!({ "status": "ok" }))
}

/// GET /api/v1/status – app identity and runtime knobs from config.
async fn status(State(state): State<AppState>) -> axum::Json<serde_json::Value> {
    axum::Json(serde_json::json!({
        "app_name": state.config.app_name,
        "port": state.config.port,
        "online_lookups": state.config.online_lookups,
        "lookup_timeout_ms": state.config.lookup_timeout_ms,
        "min_confidence": state.config.min_confidence,
        "sessions": state.sessions.len(),
        "max_sessions": state.sessions.capacity(),
    }))
}

/// GET /api/v1/logs – Server-Sent Events stream of gateway logs (tracing output).
/// `?session_id=` narrows the stream to one session's lines.
async fn logs_stream(
    State(state): State<AppState>,
    Query(q): Query<handlers::SessionQuery>,
) -> Sse<impl futures_util::Stream<Item = Result<Event, std::convert::Infallible>> + Send + 'static> {
    use async_stream::stream;
    let filter = q.session_id.map(|s| s.trim().to_string()).filter(|s| !s.is_empty());
    let mut rx = state.log_tx.subscribe();
    let stream = stream! {
        loop {
            match rx.recv().await {
                Ok(line) if line.visible_to(filter.as_deref()) => yield Ok(Event::default().data(line.text)),
                Ok(_) => {}
                Err(broadcast::error::RecvError::Lagged(n)) => {
                    yield Ok(Event::default().data(format!("... {} log lines dropped", n)));
                }
                Err(broadcast::error::RecvError::Closed) => break,
            }
        }
    };
    Sse::new(stream).keep_alive(
        axum::response::sse::KeepAlive::new()
            .interval(Duration::from_secs(15))
            .text("keepalive"),
    )
}
