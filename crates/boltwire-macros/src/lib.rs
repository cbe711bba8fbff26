//! Procedural macros for boltwire.
//!
//! This crate provides:
//!
//! - `#[slack_handlers]` - Registers the marked methods of an `impl` block as
//!   Slack handlers
//!
//! # Handler markers
//!
//! Inside a `#[slack_handlers]` block, each handler method carries exactly one
//! category marker:
//!
//! ```rust,ignore
//! use boltwire::prelude::*;
//!
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
//!         Ok(())
//!     }
//!
//!     // Not a handler: no marker.
//!     fn helper(&self) {}
//! }
//! ```

mod handlers;

use proc_macro::TokenStream;
use syn::{ItemImpl, parse_macro_input};

/// Registers the marked methods of an inherent `impl` block as Slack handlers.
///
/// Markers are stripped from the emitted code. The block itself is left
/// unchanged otherwise and one handler set is added to the link-time
/// registry in `boltwire-core`, keyed by the `Self` type.
///
/// # Markers
///
/// | Marker | Arguments |
/// |--------|-----------|
/// | `#[message]` | optional pattern |
/// | `#[action]` | pattern (action id), `action_id`, `block_id`, `callback_id`, `kind` |
/// | `#[command]` | pattern (command name), required |
/// | `#[event]` | pattern (event type), required |
/// | `#[shortcut]` | pattern (callback id), `callback_id`, `kind = "shortcut" \| "message_action"` |
/// | `#[view]` | pattern (callback id), `callback_id`, `kind = "view_submission" \| "view_closed"` |
///
/// A pattern is a string literal (matched literally) or `regex("...")`.
///
/// # Handler methods
///
/// A marked method must be `async fn name(&self, args: ListenerArgs)` and
/// return `()` or `Result<(), E>` where `E: Into<BoxError>`.
#[proc_macro_attribute]
pub fn slack_handlers(attr: TokenStream, item: TokenStream) -> TokenStream {
    if !attr.is_empty() {
        return syn::Error::new(
            proc_macro2::Span::call_site(),
            "#[slack_handlers] takes no arguments",
        )
        .into_compile_error()
        .into();
    }

    let input = parse_macro_input!(item as ItemImpl);

    match handlers::expand(input) {
        Ok(tokens) => tokens.into(),
        Err(err) => err.to_compile_error().into(),
    }
}
