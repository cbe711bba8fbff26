//! Echo App Example
//!
//! A small demonstration of boltwire: two components declare Slack handlers,
//! the module discovers and attaches them at bootstrap, and a few synthetic
//! activities are routed through the built-in client.
//!
//! # Usage
//!
//! ```bash
//! cargo run --package echo-app -- --message "echo hello there"
//! ```

use std::sync::atomic::{AtomicUsize, Ordering};

use anyhow::Result;
use boltwire::module::{LoggingBuilder, SlackEnv};
use boltwire::prelude::*;
use boltwire_core::{ShortcutKind, ViewKind};
use clap::Parser;
use tracing::{info, warn};

#[derive(Debug, Parser)]
#[command(about = "Routes synthetic Slack activity through boltwire handlers")]
struct Args {
    /// Message text to dispatch.
    #[arg(long, default_value = "echo hello from boltwire")]
    message: String,

    /// Log level for both the host subscriber and the client.
    #[arg(long, default_value = "info")]
    log_level: LogLevel,

    /// Read tokens from SLACK_* variables instead of the built-in demo values.
    #[arg(long)]
    from_env: bool,
}

// ============================================================================
// Components
// ============================================================================

/// Echoes messages and answers `/ping`.
#[derive(Default)]
struct Echo {
    replies: AtomicUsize,
}

#[slack_handlers]
impl Echo {
    #[message(regex(r"^echo (.+)$"))]
    async fn echo(&self, args: ListenerArgs) -> Result<(), BoxError> {
        let text = args.matches().get(1).ok_or("echo without text")?;
        self.replies.fetch_add(1, Ordering::Relaxed);
        info!(reply = %text, "echo");
        Ok(())
    }

    #[command("/ping")]
    async fn ping(&self, args: ListenerArgs) {
        args.ack();
        self.replies.fetch_add(1, Ordering::Relaxed);
        info!("Pong!");
    }

    #[event("app_mention")]
    async fn mention(&self, args: ListenerArgs) {
        let user = args.payload()["user"].as_str().unwrap_or("someone");
        info!(user, "mentioned");
    }
}

/// Handles the feedback shortcut and its modal.
struct Feedback;

#[slack_handlers]
impl Feedback {
    #[shortcut(callback_id = "give_feedback", kind = "shortcut")]
    async fn open(&self, args: ListenerArgs) {
        args.ack();
        info!("opening feedback modal");
    }

    #[view("feedback_modal")]
    async fn submit(&self, args: ListenerArgs) {
        args.ack();
        info!("feedback submitted");
    }

    #[action(regex("^rate_[1-5]$"))]
    async fn rate(&self, args: ListenerArgs) {
        args.ack();
        info!(payload = %args.payload(), "rating received");
    }
}

// ============================================================================
// Main Entry Point
// ============================================================================

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    LoggingBuilder::new()
        .with_log_level(args.log_level)
        .directive("boltwire_module=debug")
        .init();

    let container = Arc::new(Container::new());
    if !args.from_env {
        container.register(SlackEnv {
            bot_token: Some("xoxb-demo".into()),
            signing_secret: Some("demo-secret".into()),
            ..Default::default()
        });
    }
    let echo = container.register(Echo::default());
    container.register(Feedback);

    let module = SlackModule::for_root(SlackOptions::new().log_level(args.log_level))
        .init(Arc::clone(&container))
        .await?;
    module.on_application_bootstrap().await?;

    let service = container.resolve::<SlackService>()?;
    let activity = [
        Incoming::message(args.message),
        Incoming::command("/ping", ""),
        Incoming::event(
            "app_mention",
            serde_json::json!({ "type": "app_mention", "user": "U024BE7LH", "text": "<@U0LAN0Z89> hi" }),
        ),
        Incoming::shortcut("give_feedback", ShortcutKind::Global),
        Incoming::block_action("rate_4", "rating"),
        Incoming::view("feedback_modal", ViewKind::Submission),
    ];

    for incoming in activity {
        let category = incoming.category();
        match service.dispatch(incoming).await {
            Ok(outcome) if outcome.matched == 0 => warn!(%category, "no handler matched"),
            Ok(outcome) => info!(%category, matched = outcome.matched, acked = outcome.acked, "dispatched"),
            Err(err) => warn!(%category, error = %err, "handler failed"),
        }
    }

    info!(replies = echo.replies.load(Ordering::Relaxed), "done");
    Ok(())
}
