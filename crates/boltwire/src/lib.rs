//! # boltwire
//!
//! Declarative Slack handler registration for dependency-injected services.
//!
//! ## Overview
//!
//! Components mark their handler methods with one category marker each.
//! At bootstrap the module finds those methods on every registered
//! component, binds them to their instances and attaches them to a single
//! shared Slack client.
//!
//! ```text
//! ┌──────────────┐     ┌────────────────┐     ┌──────────────┐     ┌─────────────┐
//! │  Container   │────▶│ ExplorerService│────▶│ SlackService │────▶│ SlackClient │
//! │ (components) │     │  (discovery)   │     │(registration)│     │   (App)     │
//! └──────────────┘     └────────────────┘     └──────────────┘     └─────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use boltwire::prelude::*;
//!
//! #[derive(Default)]
//! struct Greeter;
//!
//! #[slack_handlers]
//! impl Greeter {
//!     #[message("hello")]
//!     async fn hello(&self, args: ListenerArgs) {
//!         args.ack();
//!     }
//!
//!     #[command("/deploy")]
//!     async fn deploy(&self, args: ListenerArgs) -> Result<(), BoxError> {
//!         args.ack();
//!         Ok(())
//!     }
//! }
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let container = Arc::new(Container::new());
//!     container.register(Greeter);
//!
//!     let module = SlackModule::for_root(SlackOptions::new()).init(container).await?;
//!     module.on_application_bootstrap().await?;
//!     Ok(())
//! }
//! ```
//!
//! Code generated by `#[slack_handlers]` refers to `boltwire_core`, so crates
//! using the macro depend on `boltwire-core` directly as well.
//!
//! ## Features
//!
//! - `json-log`: JSON output for [`LoggingBuilder`](module::LoggingBuilder)

pub use boltwire_core as core;
pub use boltwire_macros::slack_handlers;
pub use boltwire_module as module;

/// Prelude module for convenient imports.
///
/// ```rust,ignore
/// use boltwire::prelude::*;
/// ```
pub mod prelude {
    // Annotation
    pub use boltwire_macros::slack_handlers;

    // Module assembly
    pub use boltwire_module::{
        Container, Injectable, Injected, OnApplicationBootstrap, SlackModule,
        SlackModuleAsyncOptions, SlackOptionsFactory, SlackService,
    };

    // Handler signatures
    pub use boltwire_core::{BoxError, ListenerArgs};

    // Options and matchers
    pub use boltwire_core::{LogLevel, MessagePattern, Pattern, SlackOptions};

    // Client
    pub use boltwire_core::{App, Incoming, SlackClient};

    pub use std::sync::Arc;
}
