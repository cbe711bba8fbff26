//! Deferred options resolution.
//!
//! [`SlackModuleAsyncOptions`] describes how the module obtains its
//! [`SlackOptions`] when they are not known up front. There are three
//! shapes, each with its own constructor:
//!
//! | Constructor | Resolution |
//! |-------------|------------|
//! | [`use_factory`](SlackModuleAsyncOptions::use_factory) | resolve declared dependencies, call the factory, await it |
//! | [`use_existing`](SlackModuleAsyncOptions::use_existing) | resolve a registered [`SlackOptionsFactory`], await `create_options` |
//! | [`use_class`](SlackModuleAsyncOptions::use_class) | build the factory through [`Injectable`], register it, await `create_options` |
//!
//! ```rust,ignore
//! let options = SlackModuleAsyncOptions::use_factory(|deps: Injected| async move {
//!     let config = deps.get::<AppConfig>()?;
//!     Ok::<_, BoxError>(SlackOptions::new().token(config.slack_token.clone()))
//! })
//! .inject::<AppConfig>();
//! ```

use std::any::Any;
use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;
use boltwire_core::{BoxError, SlackOptions};
use futures::future::BoxFuture;
use tracing::debug;

use crate::container::{Container, Dependency, Injected, ProviderEntry};
use crate::error::{ContainerError, ModuleError, ModuleResult};

/// A provider able to produce Slack options.
#[async_trait]
pub trait SlackOptionsFactory: Send + Sync {
    async fn create_options(&self) -> Result<SlackOptions, BoxError>;
}

/// A type the module can construct from the container.
pub trait Injectable: Sized {
    fn inject(container: &Container) -> Result<Self, ContainerError>;
}

type FactoryFn =
    Box<dyn FnOnce(Injected) -> BoxFuture<'static, Result<SlackOptions, BoxError>> + Send>;

type ResolveFactoryFn = fn(&Container) -> Result<Arc<dyn SlackOptionsFactory>, ContainerError>;

enum OptionsSource {
    Factory {
        factory: FactoryFn,
        inject: Vec<Dependency>,
    },
    Existing(ResolveFactoryFn),
    Class(ResolveFactoryFn),
}

/// Deferred Slack options.
pub struct SlackModuleAsyncOptions {
    source: OptionsSource,
    imports: Vec<ProviderEntry>,
}

impl SlackModuleAsyncOptions {
    /// Options produced by an async factory.
    ///
    /// The factory receives the dependencies declared with
    /// [`inject`](Self::inject), already resolved.
    pub fn use_factory<F, Fut, E>(factory: F) -> Self
    where
        F: FnOnce(Injected) -> Fut + Send + 'static,
        Fut: Future<Output = Result<SlackOptions, E>> + Send + 'static,
        E: Into<BoxError>,
    {
        let factory: FactoryFn = Box::new(
            move |injected| -> BoxFuture<'static, Result<SlackOptions, BoxError>> {
                let options = factory(injected);
                Box::pin(async move { options.await.map_err(Into::into) })
            },
        );
        Self::new(OptionsSource::Factory {
            factory,
            inject: Vec::new(),
        })
    }

    /// Options produced by an already registered [`SlackOptionsFactory`].
    pub fn use_existing<T>() -> Self
    where
        T: SlackOptionsFactory + Any,
    {
        Self::new(OptionsSource::Existing(resolve_existing::<T>))
    }

    /// Options produced by a [`SlackOptionsFactory`] the module constructs.
    ///
    /// The constructed instance is registered in the container.
    pub fn use_class<T>() -> Self
    where
        T: SlackOptionsFactory + Injectable + Any,
    {
        Self::new(OptionsSource::Class(construct_class::<T>))
    }

    fn new(source: OptionsSource) -> Self {
        Self {
            source,
            imports: Vec::new(),
        }
    }

    /// Declares a dependency handed to the factory.
    ///
    /// Only factory options take dependencies; the other shapes resolve
    /// what they need from the container themselves.
    pub fn inject<T: Any + Send + Sync>(mut self) -> Self {
        if let OptionsSource::Factory { inject, .. } = &mut self.source {
            inject.push(Dependency::of::<T>());
        }
        self
    }

    /// Registers `value` in the container before the options are resolved.
    pub fn import<T: Any + Send + Sync>(mut self, value: T) -> Self {
        self.imports.push(ProviderEntry::new(Arc::new(value)));
        self
    }

    /// Dependencies the factory declared, in order.
    pub fn dependencies(&self) -> &[Dependency] {
        match &self.source {
            OptionsSource::Factory { inject, .. } => inject,
            OptionsSource::Existing(_) | OptionsSource::Class(_) => &[],
        }
    }

    pub(crate) async fn resolve(self, container: &Container) -> ModuleResult<SlackOptions> {
        for import in self.imports {
            debug!(provider = import.type_name, "Registering imported provider");
            container.insert(import);
        }

        let factory = match self.source {
            OptionsSource::Factory { factory, inject } => {
                let injected = Injected::resolve(container, &inject)?;
                debug!(dependencies = injected.len(), "Resolving Slack options from factory");
                return factory(injected).await.map_err(ModuleError::OptionsFactory);
            }
            OptionsSource::Existing(resolve) | OptionsSource::Class(resolve) => resolve(container)?,
        };

        factory
            .create_options()
            .await
            .map_err(ModuleError::OptionsFactory)
    }
}

impl std::fmt::Debug for SlackModuleAsyncOptions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let shape = match &self.source {
            OptionsSource::Factory { .. } => "factory",
            OptionsSource::Existing(_) => "existing",
            OptionsSource::Class(_) => "class",
        };
        f.debug_struct("SlackModuleAsyncOptions")
            .field("source", &shape)
            .field("inject", &self.dependencies())
            .field("imports", &self.imports)
            .finish()
    }
}

fn resolve_existing<T>(container: &Container) -> Result<Arc<dyn SlackOptionsFactory>, ContainerError>
where
    T: SlackOptionsFactory + Any,
{
    Ok(container.resolve::<T>()?)
}

fn construct_class<T>(container: &Container) -> Result<Arc<dyn SlackOptionsFactory>, ContainerError>
where
    T: SlackOptionsFactory + Injectable + Any,
{
    let instance = Arc::new(T::inject(container)?);
    container.register_arc(Arc::clone(&instance));
    Ok(instance)
}

/// Where the module takes its options from.
pub(crate) enum ModuleOptions {
    Immediate(SlackOptions),
    Deferred(SlackModuleAsyncOptions),
}

impl ModuleOptions {
    pub(crate) async fn resolve(self, container: &Container) -> ModuleResult<SlackOptions> {
        match self {
            Self::Immediate(options) => Ok(options),
            Self::Deferred(options) => options.resolve(container).await,
        }
    }
}
