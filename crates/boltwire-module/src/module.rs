//! Module assembly and bootstrap.
//!
//! # Lifecycle
//!
//! ```text
//! for_root / for_root_async ──▶ DynamicModule ──init──▶ SlackModule ──bootstrap──▶ handlers attached
//! ```
//!
//! `init` resolves the options, merges them over the environment, builds the
//! client and registers the [`SlackService`] in the container. Bootstrap
//! discovers handlers on every container provider and attaches them.

use std::sync::Arc;

use async_trait::async_trait;
use boltwire_core::{App, AppOptions, AppResult, BoxedClient, Category, Logger, SlackOptions};
use parking_lot::Mutex;
use tracing::{debug, info, warn};

use crate::config::SlackEnv;
use crate::container::Container;
use crate::error::ModuleResult;
use crate::explorer::ExplorerService;
use crate::logger::{LoggerProxy, SLACK_LOGGER_NAME};
use crate::options::{ModuleOptions, SlackModuleAsyncOptions};
use crate::service::SlackService;

/// Builds a client from resolved options.
pub type ClientFactory = Box<dyn FnOnce(AppOptions) -> AppResult<BoxedClient> + Send>;

/// Notified once every provider of the host is in place.
#[async_trait]
pub trait OnApplicationBootstrap {
    async fn on_application_bootstrap(&self) -> ModuleResult<()>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ModuleState {
    Uninitialized,
    Bootstrapped,
}

// =============================================================================
// DynamicModule
// =============================================================================

/// A module definition, not yet initialized.
pub struct DynamicModule {
    options: ModuleOptions,
    client_factory: ClientFactory,
}

impl DynamicModule {
    fn new(options: ModuleOptions) -> Self {
        Self {
            options,
            client_factory: Box::new(|options| Ok(Arc::new(App::new(options)?) as BoxedClient)),
        }
    }

    /// Replaces the client constructor (the built-in [`App`] by default).
    pub fn with_client_factory<F>(mut self, factory: F) -> Self
    where
        F: FnOnce(AppOptions) -> AppResult<BoxedClient> + Send + 'static,
    {
        self.client_factory = Box::new(factory);
        self
    }

    /// Resolves options, builds the client, and registers [`SlackService`]
    /// in `container`.
    pub async fn init(self, container: Arc<Container>) -> ModuleResult<SlackModule> {
        let options = self.options.resolve(&container).await?;

        let env = match container.get::<SlackEnv>() {
            Some(env) => (*env).clone(),
            None => SlackEnv::load()?,
        };

        let proxy = LoggerProxy::new();
        proxy.set_name(SLACK_LOGGER_NAME);

        let app_options = merge_options(options, &env, Arc::new(proxy));
        debug!(
            socket_mode = app_options.socket_mode,
            log_level = %app_options.log_level,
            "Creating Slack client"
        );

        let client = (self.client_factory)(app_options)?;
        let service = Arc::new(SlackService::new(client));
        container.register_arc(Arc::clone(&service));

        Ok(SlackModule {
            container,
            service,
            state: Mutex::new(ModuleState::Uninitialized),
        })
    }
}

impl std::fmt::Debug for DynamicModule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let options = match &self.options {
            ModuleOptions::Immediate(options) => format!("{options:?}"),
            ModuleOptions::Deferred(options) => format!("{options:?}"),
        };
        f.debug_struct("DynamicModule")
            .field("options", &options)
            .finish_non_exhaustive()
    }
}

/// Merges options over environment defaults.
///
/// Options win field by field. Socket mode falls back to the environment,
/// the log level to `debug`, and the logger to `proxy`.
pub fn merge_options(options: SlackOptions, env: &SlackEnv, proxy: Arc<dyn Logger>) -> AppOptions {
    AppOptions {
        token: options.token.or_else(|| env.bot_token.clone()),
        signing_secret: options
            .signing_secret
            .or_else(|| env.signing_secret.clone()),
        socket_mode: options.socket_mode.unwrap_or(env.socket_mode),
        app_token: options.app_token.or_else(|| env.app_token.clone()),
        log_level: options.log_level.unwrap_or_default(),
        logger: options.logger.unwrap_or(proxy),
        extra: options.extra,
    }
}

// =============================================================================
// SlackModule
// =============================================================================

/// The initialized Slack module.
pub struct SlackModule {
    container: Arc<Container>,
    service: Arc<SlackService>,
    state: Mutex<ModuleState>,
}

impl SlackModule {
    /// Module definition with options known up front.
    pub fn for_root(options: SlackOptions) -> DynamicModule {
        DynamicModule::new(ModuleOptions::Immediate(options))
    }

    /// Module definition with options resolved during `init`.
    pub fn for_root_async(options: SlackModuleAsyncOptions) -> DynamicModule {
        DynamicModule::new(ModuleOptions::Deferred(options))
    }

    pub fn service(&self) -> &Arc<SlackService> {
        &self.service
    }

    pub fn container(&self) -> &Arc<Container> {
        &self.container
    }

    pub fn is_bootstrapped(&self) -> bool {
        *self.state.lock() == ModuleState::Bootstrapped
    }
}

#[async_trait]
impl OnApplicationBootstrap for SlackModule {
    /// Discovers handlers and attaches them to the client.
    ///
    /// Runs once; later notifications are ignored. A failed registration
    /// leaves the module bootstrapped with the handlers attached so far.
    async fn on_application_bootstrap(&self) -> ModuleResult<()> {
        {
            let mut state = self.state.lock();
            if *state == ModuleState::Bootstrapped {
                warn!("Slack module already bootstrapped, ignoring notification");
                return Ok(());
            }
            *state = ModuleState::Bootstrapped;
        }

        let handlers = ExplorerService::new(Arc::clone(&self.container)).explore();

        self.service.register_messages(&handlers.messages)?;
        self.service.register_actions(&handlers.actions)?;
        self.service.register_commands(&handlers.commands)?;
        self.service.register_events(&handlers.events)?;
        self.service.register_shortcuts(&handlers.shortcuts)?;
        self.service.register_views(&handlers.views)?;

        info!(
            handlers = handlers.len(),
            commands = handlers.count(Category::Command),
            events = handlers.count(Category::Event),
            "Slack handlers registered"
        );
        Ok(())
    }
}

impl std::fmt::Debug for SlackModule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SlackModule")
            .field("container", &self.container)
            .field("state", &*self.state.lock())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ModuleError;
    use boltwire_core::LogLevel;

    fn env() -> SlackEnv {
        SlackEnv {
            bot_token: Some("xoxb-env".into()),
            signing_secret: Some("env-secret".into()),
            socket_mode: true,
            app_token: Some("xapp-env".into()),
        }
    }

    #[test]
    fn test_merge_prefers_options() {
        let options = SlackOptions::new().token("t").signing_secret("s");
        let merged = merge_options(options, &env(), Arc::new(LoggerProxy::new()));

        assert_eq!(merged.token.as_deref(), Some("t"));
        assert_eq!(merged.signing_secret.as_deref(), Some("s"));
        assert!(merged.socket_mode);
        assert_eq!(merged.app_token.as_deref(), Some("xapp-env"));
        assert_eq!(merged.log_level, LogLevel::Debug);
    }

    #[test]
    fn test_merge_without_env() {
        let options = SlackOptions::new()
            .socket_mode(false)
            .log_level(LogLevel::Warn)
            .extra("processBeforeResponse", true);
        let merged = merge_options(options, &SlackEnv::default(), Arc::new(LoggerProxy::new()));

        assert_eq!(merged.token, None);
        assert!(!merged.socket_mode);
        assert_eq!(merged.log_level, LogLevel::Warn);
        assert_eq!(merged.extra["processBeforeResponse"], true);
    }

    #[test]
    fn test_merge_keeps_custom_logger() {
        let custom: Arc<dyn Logger> = Arc::new(LoggerProxy::named("custom"));
        let options = SlackOptions::new().logger(custom);
        let merged = merge_options(options, &env(), Arc::new(LoggerProxy::new()));
        assert_eq!(merged.logger.name(), "custom");
    }

    #[tokio::test]
    async fn test_init_registers_service_and_names_logger() {
        let container = Arc::new(Container::new());
        container.register(env());

        let logger_name = Arc::new(Mutex::new(String::new()));
        let seen = Arc::clone(&logger_name);
        let module = SlackModule::for_root(SlackOptions::new())
            .with_client_factory(move |options| {
                *seen.lock() = options.logger.name();
                Ok(Arc::new(App::new(options)?) as BoxedClient)
            })
            .init(Arc::clone(&container))
            .await
            .unwrap();

        assert_eq!(*logger_name.lock(), "Slack");
        assert!(container.contains::<SlackService>());
        assert!(!module.is_bootstrapped());
        // The proxy is internal and never exported.
        assert!(!container.contains::<LoggerProxy>());
    }

    #[tokio::test]
    async fn test_init_surfaces_client_errors() {
        let container = Arc::new(Container::new());
        container.register(SlackEnv::default());

        let result = SlackModule::for_root(SlackOptions::new().token("t"))
            .init(container)
            .await;
        assert!(matches!(result, Err(ModuleError::Client(_))));
    }
}
