//! Handler discovery.
//!
//! [`ExplorerService`] pairs every container provider with the handler sets
//! `#[slack_handlers]` contributed for its type and sorts the marked methods
//! by category.

use std::fmt;
use std::sync::Arc;

use boltwire_core::{
    ActionConstraints, Category, HandlerMetadata, Instance, InvokeFn, Listener, MessagePattern,
    Pattern, ShortcutConstraints, ViewConstraints, bind, handler_sets_for,
};
use tracing::{debug, trace};

use crate::container::Container;

/// A discovered handler method bound to its owning instance.
#[derive(Clone)]
pub struct HandlerDescriptor<M> {
    /// Owning type as written in the `impl` block.
    pub owner: &'static str,
    pub method: &'static str,
    pub instance: Instance,
    pub metadata: M,
    invoke: InvokeFn,
}

impl<M> HandlerDescriptor<M> {
    /// Binds the method to its instance.
    pub fn listener(&self) -> Listener {
        bind(Arc::clone(&self.instance), self.invoke)
    }
}

impl<M: fmt::Debug> fmt::Debug for HandlerDescriptor<M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HandlerDescriptor")
            .field("owner", &self.owner)
            .field("method", &self.method)
            .field("metadata", &self.metadata)
            .finish_non_exhaustive()
    }
}

/// Discovered handlers, one collection per category.
#[derive(Debug, Clone, Default)]
pub struct DiscoveredHandlers {
    pub messages: Vec<HandlerDescriptor<MessagePattern>>,
    pub actions: Vec<HandlerDescriptor<ActionConstraints>>,
    pub commands: Vec<HandlerDescriptor<Pattern>>,
    pub events: Vec<HandlerDescriptor<Pattern>>,
    pub shortcuts: Vec<HandlerDescriptor<ShortcutConstraints>>,
    pub views: Vec<HandlerDescriptor<ViewConstraints>>,
}

impl DiscoveredHandlers {
    /// Number of handlers in `category`.
    pub fn count(&self, category: Category) -> usize {
        match category {
            Category::Message => self.messages.len(),
            Category::Action => self.actions.len(),
            Category::Command => self.commands.len(),
            Category::Event => self.events.len(),
            Category::Shortcut => self.shortcuts.len(),
            Category::View => self.views.len(),
        }
    }

    pub fn len(&self) -> usize {
        Category::ALL.iter().map(|c| self.count(*c)).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Finds handler methods on the instances of a [`Container`].
pub struct ExplorerService {
    container: Arc<Container>,
}

impl ExplorerService {
    pub fn new(container: Arc<Container>) -> Self {
        Self { container }
    }

    /// Collects every marked method of every provider.
    ///
    /// Providers are visited in registration order and methods in
    /// declaration order within an impl block. The order between several
    /// `#[slack_handlers]` blocks of one type is unspecified.
    pub fn explore(&self) -> DiscoveredHandlers {
        let mut found = DiscoveredHandlers::default();

        for provider in self.container.providers() {
            for set in handler_sets_for(provider.type_id) {
                trace!(owner = set.owner_name, handlers = set.handlers.len(), "Exploring provider");

                for entry in set.handlers {
                    let instance = Arc::clone(&provider.instance);
                    macro_rules! push {
                        ($collection:ident, $metadata:expr) => {
                            found.$collection.push(HandlerDescriptor {
                                owner: set.owner_name,
                                method: entry.method,
                                instance,
                                metadata: $metadata,
                                invoke: entry.invoke,
                            })
                        };
                    }

                    match (entry.metadata)() {
                        HandlerMetadata::Message(m) => push!(messages, m),
                        HandlerMetadata::Action(m) => push!(actions, m),
                        HandlerMetadata::Command(m) => push!(commands, m),
                        HandlerMetadata::Event(m) => push!(events, m),
                        HandlerMetadata::Shortcut(m) => push!(shortcuts, m),
                        HandlerMetadata::View(m) => push!(views, m),
                    }
                }
            }
        }

        debug!(
            messages = found.messages.len(),
            actions = found.actions.len(),
            commands = found.commands.len(),
            events = found.events.len(),
            shortcuts = found.shortcuts.len(),
            views = found.views.len(),
            "Discovered Slack handlers"
        );
        found
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use boltwire_core::linkme::distributed_slice;
    use boltwire_core::{
        Ack, BoxFuture, HANDLER_REGISTRY, HandlerEntry, HandlerSet, ListenerArgs, ListenerResult,
    };
    use serde_json::Value;
    use std::any::TypeId;

    struct Probe;
    struct Plain;

    fn ok(_instance: Instance, _args: ListenerArgs) -> BoxFuture<'static, ListenerResult> {
        Box::pin(async { Ok(()) })
    }

    static PROBE_HANDLERS: [HandlerEntry; 3] = [
        HandlerEntry {
            method: "on_deploy",
            metadata: || HandlerMetadata::Command(Pattern::exact("/deploy")),
            invoke: ok,
        },
        HandlerEntry {
            method: "on_mention",
            metadata: || HandlerMetadata::Event(Pattern::exact("app_mention")),
            invoke: ok,
        },
        HandlerEntry {
            method: "on_rollback",
            metadata: || HandlerMetadata::Command(Pattern::exact("/rollback")),
            invoke: ok,
        },
    ];

    #[distributed_slice(HANDLER_REGISTRY)]
    #[linkme(crate = boltwire_core::linkme)]
    static PROBE: HandlerSet = HandlerSet {
        owner: TypeId::of::<Probe>,
        owner_name: "Probe",
        handlers: &PROBE_HANDLERS,
    };

    #[test]
    fn test_explore_groups_by_category_in_order() {
        let container = Arc::new(Container::new());
        container.register(Plain);
        container.register(Probe);

        let found = ExplorerService::new(container).explore();
        let commands: Vec<_> = found.commands.iter().map(|h| h.method).collect();
        assert_eq!(commands, ["on_deploy", "on_rollback"]);
        assert_eq!(found.count(Category::Event), 1);
        assert_eq!(found.len(), 3);
    }

    #[test]
    fn test_explore_ignores_unregistered_types() {
        let container = Arc::new(Container::new());
        container.register(Plain);
        assert!(ExplorerService::new(container).explore().is_empty());
    }

    #[tokio::test]
    async fn test_descriptor_listener_is_bound() {
        let container = Arc::new(Container::new());
        container.register(Probe);

        let found = ExplorerService::new(container).explore();
        let listener = found.events[0].listener();
        let args = ListenerArgs::new(Category::Event, Arc::new(Value::Null), Ack::default());
        tokio_test::assert_ok!(listener(args).await);
    }
}
