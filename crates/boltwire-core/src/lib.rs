//! # boltwire core
//!
//! Types shared by every layer of boltwire:
//!
//! - **Options**: [`SlackOptions`] as supplied by the host, [`AppOptions`] as
//!   handed to client construction, and [`LogLevel`].
//! - **Logging capability**: the [`Logger`] trait the client logs through.
//! - **Matchers**: [`Pattern`] and the per-category constraint types.
//! - **Handler registry**: [`HandlerSet`] entries collected at link time into
//!   [`HANDLER_REGISTRY`] by the `#[slack_handlers]` macro.
//! - **Client**: the [`SlackClient`] dispatch API and the in-process [`App`].
//!
//! ```text
//! ┌──────────────────┐     ┌───────────────┐     ┌────────────┐
//! │ #[slack_handlers]│────▶│ HANDLER_      │────▶│ SlackClient│
//! │  impl Component  │     │ REGISTRY      │     │  (App)     │
//! └──────────────────┘     └───────────────┘     └────────────┘
//! ```

extern crate self as boltwire_core;

pub mod app;
pub mod client;
pub mod error;
pub mod handler;
pub mod listener;
pub mod logger;
pub mod options;
pub mod pattern;

pub use app::{App, DispatchOutcome, Incoming};
pub use client::{BoxedClient, SlackClient};
pub use error::{AppError, AppResult};
pub use handler::{
    Category, HANDLER_REGISTRY, HandlerEntry, HandlerMetadata, HandlerSet, Instance, InvokeFn,
    handler_sets_for,
};
pub use listener::{
    Ack, BoxError, IntoListenerResult, Listener, ListenerArgs, ListenerResult, bind, from_fn,
};
pub use logger::Logger;
pub use options::{AppOptions, LogLevel, SlackOptions};
pub use pattern::{
    ActionConstraints, MessagePattern, Pattern, ShortcutConstraints, ShortcutKind,
    ViewConstraints, ViewKind,
};

pub use futures::future::BoxFuture;

// Used by code generated from `#[slack_handlers]`.
#[doc(hidden)]
pub use linkme;
