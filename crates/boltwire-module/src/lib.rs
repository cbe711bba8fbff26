//! boltwire module - wires Slack handlers into a host container.
//!
//! This crate provides:
//! - A typed provider [`Container`] standing in for the host's injector
//! - Options resolution, immediate or deferred ([`SlackModuleAsyncOptions`])
//! - Handler discovery ([`ExplorerService`]) and registration ([`SlackService`])
//! - The composition root ([`SlackModule`]) and its bootstrap hook
//! - Environment defaults ([`SlackEnv`]) and logging setup
//!
//! ```ignore
//! use boltwire_module::{Container, OnApplicationBootstrap, SlackModule};
//! use boltwire_core::SlackOptions;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let container = Arc::new(Container::new());
//!     container.register(Greeter::default());
//!
//!     let module = SlackModule::for_root(SlackOptions::new().token("xoxb-…"))
//!         .init(container)
//!         .await?;
//!     module.on_application_bootstrap().await?;
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod container;
pub mod error;
pub mod explorer;
pub mod logger;
pub mod logging;
pub mod module;
pub mod options;
pub mod service;

// Re-exports
pub use config::SlackEnv;
pub use container::{Container, Dependency, Injected, ProviderEntry};
pub use error::{ContainerError, ModuleError, ModuleResult};
pub use explorer::{DiscoveredHandlers, ExplorerService, HandlerDescriptor};
pub use logger::{LoggerProxy, SLACK_LOGGER_NAME};
pub use logging::{LogFormat, LogOutput, LoggingBuilder};
pub use module::{ClientFactory, DynamicModule, OnApplicationBootstrap, SlackModule, merge_options};
pub use options::{Injectable, SlackModuleAsyncOptions, SlackOptionsFactory};
pub use service::SlackService;
