//! FlowPilot client - command-line entry point.
//!
//! `flowpilot-client [WORKFLOW_ID]` checks the server, then starts the given
//! workflow or resumes the stored session. `flowpilot-client --screen ID` fetches
//! and renders one screen schema from the screens URL. `flowpilot-client --offline`
//! renders a canned screen without any server.

use std::sync::Arc;

use anyhow::Context as _;
use serde_json::json;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use flowpilot_client::application::services::{
    ScreenCache, ScreenResult, SessionStore, WorkflowManager, WorkflowSessionRepository,
};
use flowpilot_client::infrastructure::{
    FileStorage, HttpScreenSource, HttpWorkflowApi, RetryingWorkflowApi, StaticScreenSource,
    SystemClock,
};
use flowpilot_client::ClientConfig;
use flowpilot_domain::{context_to_json, Context, SchemaNode, ScreenSchema, WorkflowState};

/// Completion marker used by the demo flows
const COMPLETION_STATE: &str = "complete";

const OFFLINE_SCREEN_ID: &str = "welcome";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "flowpilot_client=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    if args.iter().any(|arg| arg == "--offline") {
        return run_offline().await;
    }

    let config = ClientConfig::from_env()?;
    if let Some(position) = args.iter().position(|arg| arg == "--screen") {
        let screen_id = args
            .get(position + 1)
            .context("--screen needs a screen id")?;
        return run_screen(&config, screen_id).await;
    }
    let workflow_id = args.into_iter().find(|arg| !arg.starts_with("--"));

    tracing::info!(base_url = %config.base_url, "Starting FlowPilot client");

    let storage = Arc::new(FileStorage::open(config.storage_path.clone()));
    let transport = Arc::new(
        HttpWorkflowApi::new(&config.base_url, config.timeouts)
            .context("Failed to set up workflow transport")?,
    );
    let api = Arc::new(RetryingWorkflowApi::new(transport, config.retry));
    let sessions = Arc::new(SessionStore::new(storage));
    let repository = Arc::new(WorkflowSessionRepository::new(api, sessions));
    let manager = WorkflowManager::new(repository, Arc::new(SystemClock::new()));

    let status = manager
        .health_check()
        .await
        .context("Workflow server health check failed")?;
    tracing::info!(status = %status, "Workflow server is reachable");

    let state = match workflow_id {
        Some(workflow_id) => manager
            .start_workflow(Some(workflow_id), Context::new())
            .await
            .context("Failed to start workflow")?,
        None => match manager.restore_session(None).await {
            Some(restored) => restored.context("Failed to restore session")?,
            None => anyhow::bail!("No stored session; pass a workflow id to start one"),
        },
    };

    print_state(&state)
}

fn print_state(state: &WorkflowState) -> anyhow::Result<()> {
    println!("session:  {}", state.session_id);
    if !state.workflow_id.is_empty() {
        println!("workflow: {}", state.workflow_id);
    }
    println!("state:    {} ({})", state.current_state, state.state_type);

    let classification = if state.is_error {
        "error"
    } else if state.is_completed(COMPLETION_STATE) {
        "completed"
    } else if state.state_type.is_interactive() {
        "waiting for user input"
    } else if state.state_type.is_transient() {
        "processing on server"
    } else {
        "system state"
    };
    println!("status:   {classification}");

    if let Some(screen) = &state.screen {
        println!("screen:   {}", screen.title.as_deref().unwrap_or("(untitled)"));
    }

    let visible = serde_json::to_string_pretty(&context_to_json(&state.visible_context()))?;
    println!("context:  {visible}");
    Ok(())
}

async fn run_offline() -> anyhow::Result<()> {
    let source = StaticScreenSource::new().with_screen(demo_screen()?);
    let cache = ScreenCache::new(Arc::new(source), Arc::new(SystemClock::new()));
    render_screen(&cache, OFFLINE_SCREEN_ID).await
}

async fn run_screen(config: &ClientConfig, screen_id: &str) -> anyhow::Result<()> {
    tracing::info!(screens_url = %config.screens_url, screen_id = %screen_id, "Fetching screen");
    let source = HttpScreenSource::new(&config.screens_url, config.timeouts)
        .context("Failed to set up screen source")?;
    let cache = ScreenCache::with_retry(
        Arc::new(source),
        Arc::new(SystemClock::new()),
        config.retry,
    );
    render_screen(&cache, screen_id).await
}

async fn render_screen(cache: &ScreenCache, screen_id: &str) -> anyhow::Result<()> {
    let mut results = cache.stream_screen(screen_id, true);
    let result = results.wait_for(ScreenResult::is_terminal).await?.clone();

    match result {
        ScreenResult::Success { schema, .. } => {
            println!("{} ({})", schema.document.name, schema.screen.id);
            for section in schema.screen.sections.iter() {
                print_node(section, 1);
            }
            Ok(())
        }
        ScreenResult::Error(e) => Err(anyhow::anyhow!("Screen {screen_id} failed: {e}")),
        ScreenResult::Idle | ScreenResult::Loading => {
            anyhow::bail!("Screen {screen_id} did not finish loading")
        }
    }
}

fn print_node(node: &SchemaNode, depth: usize) {
    let label = node
        .content_text()
        .or_else(|| node.data_text())
        .map(|text| format!(" \"{text}\""))
        .unwrap_or_default();
    let action = node
        .parsed_action()
        .map(|action| format!(" -> {}", action.kind()))
        .unwrap_or_default();
    let id = node.id.as_deref().unwrap_or("-");
    println!("{}{} [{id}]{label}{action}", "  ".repeat(depth), node.node_type);
    for child in &node.children {
        print_node(child, depth + 1);
    }
}

fn demo_screen() -> anyhow::Result<ScreenSchema> {
    let schema = serde_json::from_value(json!({
        "document": {"documentId": "demo", "name": "Welcome", "exportedAt": "2025-01-01T00:00:00Z"},
        "screen": {
            "id": OFFLINE_SCREEN_ID,
            "type": "screen",
            "sections": {
                "topBar": {"id": "top", "type": "app_bar", "content": "FlowPilot"},
                "body": {
                    "id": "body",
                    "type": "column",
                    "children": [
                        {"id": "headline", "type": "text", "content": "Welcome aboard"},
                        {"id": "subtitle", "type": "text", "content": "Your flow is driven by the server"},
                        {
                            "id": "start",
                            "type": "button",
                            "content": "Get started",
                            "action": {"type": "navigate", "screenId": "signup"}
                        },
                        {
                            "id": "help",
                            "type": "button",
                            "content": "Help",
                            "action": {"type": "open_url", "url": "https://example.com/help"}
                        }
                    ]
                }
            }
        }
    }))?;
    Ok(schema)
}
