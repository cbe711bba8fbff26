//! Handler metadata and the link-time handler registry.
//!
//! `#[slack_handlers]` turns every marked method of an `impl` block into a
//! [`HandlerEntry`] and contributes one [`HandlerSet`] per block to
//! [`HANDLER_REGISTRY`]. Discovery later asks the registry which sets belong
//! to the types it finds in the host container.
//!
//! # Manual registration
//!
//! The macro is a convenience; a set can be contributed by hand:
//!
//! ```rust,ignore
//! use boltwire_core::{HANDLER_REGISTRY, HandlerEntry, HandlerMetadata, HandlerSet};
//! use boltwire_core::linkme::distributed_slice;
//!
//! static GREETER_HANDLERS: [HandlerEntry; 1] = [HandlerEntry {
//!     method: "hello",
//!     metadata: || HandlerMetadata::Message("hello".into()),
//!     invoke: |instance, args| Box::pin(async move { /* … */ Ok(()) }),
//! }];
//!
//! #[distributed_slice(HANDLER_REGISTRY)]
//! static GREETER: HandlerSet = HandlerSet {
//!     owner: std::any::TypeId::of::<Greeter>,
//!     owner_name: "Greeter",
//!     handlers: &GREETER_HANDLERS,
//! };
//! ```

use std::any::{Any, TypeId};
use std::fmt;
use std::sync::Arc;

use futures::future::BoxFuture;
use linkme::distributed_slice;

use crate::listener::{ListenerArgs, ListenerResult};
use crate::pattern::{
    ActionConstraints, MessagePattern, Pattern, ShortcutConstraints, ViewConstraints,
};

/// A type-erased component instance owned by the host container.
pub type Instance = Arc<dyn Any + Send + Sync>;

/// Calls a handler method on a type-erased instance.
pub type InvokeFn = fn(Instance, ListenerArgs) -> BoxFuture<'static, ListenerResult>;

// =============================================================================
// Category
// =============================================================================

/// Class of Slack activity a handler listens to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Category {
    Message,
    Action,
    Command,
    Event,
    Shortcut,
    View,
}

impl Category {
    /// Every category, in registration order.
    pub const ALL: [Category; 6] = [
        Self::Message,
        Self::Action,
        Self::Command,
        Self::Event,
        Self::Shortcut,
        Self::View,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Message => "message",
            Self::Action => "action",
            Self::Command => "command",
            Self::Event => "event",
            Self::Shortcut => "shortcut",
            Self::View => "view",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// HandlerMetadata
// =============================================================================

/// Category marker plus its matcher, as attached to a handler method.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HandlerMetadata {
    Message(MessagePattern),
    Action(ActionConstraints),
    /// Slash command name, e.g. `/deploy`.
    Command(Pattern),
    /// Events API type, e.g. `app_mention`.
    Event(Pattern),
    Shortcut(ShortcutConstraints),
    View(ViewConstraints),
}

impl HandlerMetadata {
    pub fn category(&self) -> Category {
        match self {
            Self::Message(_) => Category::Message,
            Self::Action(_) => Category::Action,
            Self::Command(_) => Category::Command,
            Self::Event(_) => Category::Event,
            Self::Shortcut(_) => Category::Shortcut,
            Self::View(_) => Category::View,
        }
    }
}

// =============================================================================
// Registry
// =============================================================================

/// One marked method.
pub struct HandlerEntry {
    /// Method name, for logs.
    pub method: &'static str,
    /// Builds the matcher metadata.
    pub metadata: fn() -> HandlerMetadata,
    /// Calls the method on an instance of the owning type.
    pub invoke: InvokeFn,
}

impl fmt::Debug for HandlerEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HandlerEntry")
            .field("method", &self.method)
            .field("metadata", &(self.metadata)())
            .finish()
    }
}

/// The marked methods of one `impl` block, in declaration order.
pub struct HandlerSet {
    /// `TypeId` of the owning type.
    pub owner: fn() -> TypeId,
    /// Owning type as written in the `impl` block.
    pub owner_name: &'static str,
    pub handlers: &'static [HandlerEntry],
}

impl fmt::Debug for HandlerSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HandlerSet")
            .field("owner", &self.owner_name)
            .field("handlers", &self.handlers)
            .finish()
    }
}

/// Every handler set linked into the binary.
#[distributed_slice]
pub static HANDLER_REGISTRY: [HandlerSet];

/// Returns the handler sets contributed for `owner`.
pub fn handler_sets_for(owner: TypeId) -> impl Iterator<Item = &'static HandlerSet> {
    HANDLER_REGISTRY
        .iter()
        .filter(move |set| (set.owner)() == owner)
}
