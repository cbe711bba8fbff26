//! The dispatch API a Slack client exposes to the registration layer.

use std::sync::Arc;

use async_trait::async_trait;

use crate::app::{DispatchOutcome, Incoming};
use crate::error::AppResult;
use crate::listener::Listener;
use crate::pattern::{
    ActionConstraints, MessagePattern, Pattern, ShortcutConstraints, ViewConstraints,
};

/// A chat-platform client that routes incoming activity to listeners.
///
/// Registration is synchronous and happens once, during bootstrap; dispatch
/// happens for every incoming activity afterwards. [`App`](crate::App) is the
/// built-in implementation.
#[async_trait]
pub trait SlackClient: Send + Sync {
    /// Listens to messages whose text matches `pattern`.
    fn message(&self, pattern: MessagePattern, listener: Listener) -> AppResult<()>;

    /// Listens to interactive actions.
    fn action(&self, constraints: ActionConstraints, listener: Listener) -> AppResult<()>;

    /// Listens to a slash command.
    fn command(&self, name: Pattern, listener: Listener) -> AppResult<()>;

    /// Listens to an Events API event type.
    fn event(&self, event_type: Pattern, listener: Listener) -> AppResult<()>;

    /// Listens to global or message shortcuts.
    fn shortcut(&self, constraints: ShortcutConstraints, listener: Listener) -> AppResult<()>;

    /// Listens to view submissions or closures.
    fn view(&self, constraints: ViewConstraints, listener: Listener) -> AppResult<()>;

    /// Routes one incoming activity to every matching listener.
    async fn dispatch(&self, incoming: Incoming) -> AppResult<DispatchOutcome>;
}

/// A shared, type-erased client.
pub type BoxedClient = Arc<dyn SlackClient>;
