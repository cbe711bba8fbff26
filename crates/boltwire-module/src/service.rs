//! Handler registration.

use boltwire_core::{
    ActionConstraints, AppResult, BoxedClient, Category, DispatchOutcome, Incoming, Listener,
    MessagePattern, Pattern, ShortcutConstraints, SlackClient, ViewConstraints,
};
use tracing::debug;

use crate::explorer::HandlerDescriptor;

/// Attaches discovered handlers to the Slack client.
///
/// This is the provider the module exports; hosts resolve it from the
/// container to reach the client.
pub struct SlackService {
    client: BoxedClient,
}

impl SlackService {
    pub fn new(client: BoxedClient) -> Self {
        Self { client }
    }

    pub fn client(&self) -> &BoxedClient {
        &self.client
    }

    pub fn register_messages(
        &self,
        handlers: &[HandlerDescriptor<MessagePattern>],
    ) -> AppResult<()> {
        self.register(Category::Message, handlers, |client, pattern, listener| {
            client.message(pattern, listener)
        })
    }

    pub fn register_actions(
        &self,
        handlers: &[HandlerDescriptor<ActionConstraints>],
    ) -> AppResult<()> {
        self.register(Category::Action, handlers, |client, constraints, listener| {
            client.action(constraints, listener)
        })
    }

    pub fn register_commands(&self, handlers: &[HandlerDescriptor<Pattern>]) -> AppResult<()> {
        self.register(Category::Command, handlers, |client, name, listener| {
            client.command(name, listener)
        })
    }

    pub fn register_events(&self, handlers: &[HandlerDescriptor<Pattern>]) -> AppResult<()> {
        self.register(Category::Event, handlers, |client, event_type, listener| {
            client.event(event_type, listener)
        })
    }

    pub fn register_shortcuts(
        &self,
        handlers: &[HandlerDescriptor<ShortcutConstraints>],
    ) -> AppResult<()> {
        self.register(Category::Shortcut, handlers, |client, constraints, listener| {
            client.shortcut(constraints, listener)
        })
    }

    pub fn register_views(&self, handlers: &[HandlerDescriptor<ViewConstraints>]) -> AppResult<()> {
        self.register(Category::View, handlers, |client, constraints, listener| {
            client.view(constraints, listener)
        })
    }

    /// Routes incoming activity through the client.
    pub async fn dispatch(&self, incoming: Incoming) -> AppResult<DispatchOutcome> {
        self.client.dispatch(incoming).await
    }

    /// Registers `handlers` in order, stopping at the first client error.
    fn register<M, F>(&self, category: Category, handlers: &[HandlerDescriptor<M>], slot: F) -> AppResult<()>
    where
        M: Clone,
        F: Fn(&dyn SlackClient, M, Listener) -> AppResult<()>,
    {
        for handler in handlers {
            debug!(
                %category,
                owner = handler.owner,
                method = handler.method,
                "Registering Slack handler"
            );
            slot(self.client.as_ref(), handler.metadata.clone(), handler.listener())?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::container::Container;
    use crate::explorer::ExplorerService;
    use async_trait::async_trait;
    use boltwire_core::linkme::distributed_slice;
    use boltwire_core::{
        AppError, BoxFuture, HANDLER_REGISTRY, HandlerEntry, HandlerMetadata, HandlerSet, Instance,
        ListenerArgs, ListenerResult,
    };
    use parking_lot::Mutex;
    use std::any::TypeId;
    use std::sync::Arc;

    /// Records every registration; fails once `fail_after` calls were made.
    #[derive(Default)]
    struct RecordingClient {
        calls: Mutex<Vec<String>>,
        fail_after: Option<usize>,
    }

    impl RecordingClient {
        fn record(&self, call: String) -> AppResult<()> {
            let mut calls = self.calls.lock();
            if self.fail_after.is_some_and(|limit| calls.len() >= limit) {
                return Err(AppError::initialization("registration refused"));
            }
            calls.push(call);
            Ok(())
        }
    }

    #[async_trait]
    impl SlackClient for RecordingClient {
        fn message(&self, pattern: MessagePattern, _: Listener) -> AppResult<()> {
            self.record(format!("message {pattern:?}"))
        }
        fn action(&self, constraints: ActionConstraints, _: Listener) -> AppResult<()> {
            self.record(format!("action {constraints:?}"))
        }
        fn command(&self, name: Pattern, _: Listener) -> AppResult<()> {
            self.record(format!("command {}", name.as_str()))
        }
        fn event(&self, event_type: Pattern, _: Listener) -> AppResult<()> {
            self.record(format!("event {}", event_type.as_str()))
        }
        fn shortcut(&self, constraints: ShortcutConstraints, _: Listener) -> AppResult<()> {
            self.record(format!("shortcut {constraints:?}"))
        }
        fn view(&self, constraints: ViewConstraints, _: Listener) -> AppResult<()> {
            self.record(format!("view {constraints:?}"))
        }
        async fn dispatch(&self, _incoming: Incoming) -> AppResult<DispatchOutcome> {
            Ok(DispatchOutcome::default())
        }
    }

    struct Ops;

    fn ok(_instance: Instance, _args: ListenerArgs) -> BoxFuture<'static, ListenerResult> {
        Box::pin(async { Ok(()) })
    }

    static OPS_HANDLERS: [HandlerEntry; 3] = [
        HandlerEntry {
            method: "deploy",
            metadata: || HandlerMetadata::Command(Pattern::exact("/deploy")),
            invoke: ok,
        },
        HandlerEntry {
            method: "status",
            metadata: || HandlerMetadata::Command(Pattern::exact("/status")),
            invoke: ok,
        },
        HandlerEntry {
            method: "rollback",
            metadata: || HandlerMetadata::Command(Pattern::exact("/rollback")),
            invoke: ok,
        },
    ];

    #[distributed_slice(HANDLER_REGISTRY)]
    #[linkme(crate = boltwire_core::linkme)]
    static OPS: HandlerSet = HandlerSet {
        owner: TypeId::of::<Ops>,
        owner_name: "Ops",
        handlers: &OPS_HANDLERS,
    };

    fn discovered_commands() -> Vec<HandlerDescriptor<Pattern>> {
        let container = Arc::new(Container::new());
        container.register(Ops);
        ExplorerService::new(container).explore().commands
    }

    #[test]
    fn test_empty_registrations_do_not_touch_client() {
        let client = Arc::new(RecordingClient {
            fail_after: Some(0),
            ..Default::default()
        });
        let service = SlackService::new(client.clone());

        assert!(service.register_messages(&[]).is_ok());
        assert!(service.register_actions(&[]).is_ok());
        assert!(service.register_commands(&[]).is_ok());
        assert!(service.register_events(&[]).is_ok());
        assert!(service.register_shortcuts(&[]).is_ok());
        assert!(service.register_views(&[]).is_ok());
        assert!(client.calls.lock().is_empty());
    }

    #[test]
    fn test_registers_in_discovery_order() {
        let client = Arc::new(RecordingClient::default());
        let service = SlackService::new(client.clone());

        service.register_commands(&discovered_commands()).unwrap();
        assert_eq!(
            *client.calls.lock(),
            ["command /deploy", "command /status", "command /rollback"]
        );
    }

    #[test]
    fn test_first_error_aborts() {
        let client = Arc::new(RecordingClient {
            fail_after: Some(1),
            ..Default::default()
        });
        let service = SlackService::new(client.clone());

        let err = service.register_commands(&discovered_commands()).unwrap_err();
        assert!(matches!(err, AppError::Initialization(_)));
        assert_eq!(client.calls.lock().len(), 1);
    }
}
