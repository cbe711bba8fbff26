//! The built-in, in-process Slack client.
//!
//! [`App`] keeps one route table for all six categories and routes already
//! classified [`Incoming`] activity to the listeners whose matchers accept it.
//! Transport and request verification are left to whatever feeds it.
//!
//! # Matching rules
//!
//! | category | literal pattern | regex pattern |
//! |----------|-----------------|---------------|
//! | message  | text contains it | matches anywhere in the text |
//! | command, event, ids | equal | matches |
//!
//! Messages are also events of type `message`, so an event listener for
//! `"message"` sees them, and a message listener sees `message` events.

use std::sync::Arc;

use async_trait::async_trait;
use futures::future::join_all;
use parking_lot::RwLock;
use regex::Regex;
use serde_json::{Map, Value, json};

use crate::client::SlackClient;
use crate::error::{AppError, AppResult};
use crate::handler::Category;
use crate::listener::{Ack, BoxError, Listener, ListenerArgs};
use crate::logger::Logger;
use crate::options::AppOptions;
use crate::pattern::{
    ActionConstraints, MessagePattern, Pattern, ShortcutConstraints, ShortcutKind,
    ViewConstraints, ViewKind,
};

// =============================================================================
// Incoming
// =============================================================================

/// One classified unit of incoming Slack activity.
#[derive(Debug, Clone)]
pub enum Incoming {
    Message {
        text: String,
        payload: Value,
    },
    Action {
        action_id: String,
        block_id: Option<String>,
        callback_id: Option<String>,
        kind: String,
        payload: Value,
    },
    Command {
        command: String,
        payload: Value,
    },
    Event {
        event_type: String,
        payload: Value,
    },
    Shortcut {
        callback_id: String,
        kind: ShortcutKind,
        payload: Value,
    },
    View {
        callback_id: String,
        kind: ViewKind,
        payload: Value,
    },
}

impl Incoming {
    pub fn message(text: impl Into<String>) -> Self {
        let text = text.into();
        Self::Message {
            payload: json!({ "type": "message", "text": text }),
            text,
        }
    }

    /// A `block_actions` interaction on a single element.
    pub fn block_action(action_id: impl Into<String>, block_id: impl Into<String>) -> Self {
        let action_id = action_id.into();
        let block_id = block_id.into();
        Self::Action {
            payload: json!({
                "type": "block_actions",
                "actions": [{ "action_id": action_id, "block_id": block_id }],
            }),
            action_id,
            block_id: Some(block_id),
            callback_id: None,
            kind: "block_actions".to_string(),
        }
    }

    pub fn command(command: impl Into<String>, text: impl Into<String>) -> Self {
        let command = command.into();
        Self::Command {
            payload: json!({ "command": command, "text": text.into() }),
            command,
        }
    }

    pub fn event(event_type: impl Into<String>, payload: Value) -> Self {
        Self::Event {
            event_type: event_type.into(),
            payload,
        }
    }

    pub fn shortcut(callback_id: impl Into<String>, kind: ShortcutKind) -> Self {
        let callback_id = callback_id.into();
        Self::Shortcut {
            payload: json!({ "type": kind.as_str(), "callback_id": callback_id }),
            callback_id,
            kind,
        }
    }

    pub fn view(callback_id: impl Into<String>, kind: ViewKind) -> Self {
        let callback_id = callback_id.into();
        Self::View {
            payload: json!({
                "type": kind.as_str(),
                "view": { "callback_id": callback_id },
            }),
            callback_id,
            kind,
        }
    }

    /// Replaces the payload handed to listeners.
    pub fn with_payload(mut self, value: Value) -> Self {
        match &mut self {
            Self::Message { payload, .. }
            | Self::Action { payload, .. }
            | Self::Command { payload, .. }
            | Self::Event { payload, .. }
            | Self::Shortcut { payload, .. }
            | Self::View { payload, .. } => *payload = value,
        }
        self
    }

    pub fn category(&self) -> Category {
        match self {
            Self::Message { .. } => Category::Message,
            Self::Action { .. } => Category::Action,
            Self::Command { .. } => Category::Command,
            Self::Event { .. } => Category::Event,
            Self::Shortcut { .. } => Category::Shortcut,
            Self::View { .. } => Category::View,
        }
    }

    pub fn payload(&self) -> &Value {
        match self {
            Self::Message { payload, .. }
            | Self::Action { payload, .. }
            | Self::Command { payload, .. }
            | Self::Event { payload, .. }
            | Self::Shortcut { payload, .. }
            | Self::View { payload, .. } => payload,
        }
    }

    fn message_text(&self) -> Option<&str> {
        match self {
            Self::Message { text, .. } => Some(text),
            Self::Event {
                event_type,
                payload,
            } if event_type == "message" => payload.get("text").and_then(Value::as_str),
            _ => None,
        }
    }

    fn event_type(&self) -> Option<&str> {
        match self {
            Self::Message { .. } => Some("message"),
            Self::Event { event_type, .. } => Some(event_type),
            _ => None,
        }
    }
}

/// Result of routing one [`Incoming`] activity.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DispatchOutcome {
    /// Number of listeners that ran.
    pub matched: usize,
    /// Whether any listener acknowledged the activity.
    pub acked: bool,
}

// =============================================================================
// Compiled matchers
// =============================================================================

enum CompiledPattern {
    Exact(String),
    Regex(Regex),
}

impl CompiledPattern {
    fn compile(pattern: &Pattern) -> AppResult<Self> {
        match pattern {
            Pattern::Exact(text) => Ok(Self::Exact(text.to_string())),
            Pattern::Regex(source) => Regex::new(source)
                .map(Self::Regex)
                .map_err(|source_err| AppError::InvalidPattern {
                    pattern: source.to_string(),
                    source: source_err,
                }),
        }
    }

    fn compile_opt(pattern: Option<&Pattern>) -> AppResult<Option<Self>> {
        pattern.map(Self::compile).transpose()
    }

    /// Whole-value match; returns regex captures.
    fn test(&self, value: &str) -> Option<Vec<String>> {
        match self {
            Self::Exact(expected) => (expected == value).then(Vec::new),
            Self::Regex(re) => captures(re, value),
        }
    }

    /// Text search; a literal only needs to appear somewhere in `text`.
    fn find(&self, text: &str) -> Option<Vec<String>> {
        match self {
            Self::Exact(needle) => text.contains(needle.as_str()).then(Vec::new),
            Self::Regex(re) => captures(re, text),
        }
    }
}

fn captures(re: &Regex, value: &str) -> Option<Vec<String>> {
    re.captures(value).map(|caps| {
        caps.iter()
            .map(|m| m.map(|m| m.as_str().to_string()).unwrap_or_default())
            .collect()
    })
}

/// An unset constraint accepts anything; a set one needs a value to match.
fn check(pattern: &Option<CompiledPattern>, value: Option<&str>) -> Option<Vec<String>> {
    match pattern {
        None => Some(Vec::new()),
        Some(p) => value.and_then(|v| p.test(v)),
    }
}

enum Matcher {
    Message(Option<CompiledPattern>),
    Action {
        action_id: Option<CompiledPattern>,
        block_id: Option<CompiledPattern>,
        callback_id: Option<CompiledPattern>,
        kind: Option<String>,
    },
    Command(CompiledPattern),
    Event(CompiledPattern),
    Shortcut {
        callback_id: Option<CompiledPattern>,
        kind: Option<ShortcutKind>,
    },
    View {
        callback_id: Option<CompiledPattern>,
        kind: ViewKind,
    },
}

impl Matcher {
    fn matches(&self, incoming: &Incoming) -> Option<Vec<String>> {
        match (self, incoming) {
            (Self::Message(pattern), _) => {
                if incoming.event_type()? != "message" {
                    return None;
                }
                match pattern {
                    None => Some(Vec::new()),
                    Some(p) => p.find(incoming.message_text()?),
                }
            }
            (Self::Event(pattern), _) => pattern.test(incoming.event_type()?),
            (Self::Command(pattern), Incoming::Command { command, .. }) => pattern.test(command),
            (
                Self::Action {
                    action_id: want_action,
                    block_id: want_block,
                    callback_id: want_callback,
                    kind: want_kind,
                },
                Incoming::Action {
                    action_id,
                    block_id,
                    callback_id,
                    kind,
                    ..
                },
            ) => {
                if want_kind.as_ref().is_some_and(|k| k != kind) {
                    return None;
                }
                check(want_block, block_id.as_deref())?;
                check(want_callback, callback_id.as_deref())?;
                check(want_action, Some(action_id.as_str()))
            }
            (
                Self::Shortcut {
                    callback_id: want_callback,
                    kind: want_kind,
                },
                Incoming::Shortcut {
                    callback_id, kind, ..
                },
            ) => {
                if want_kind.is_some_and(|k| k != *kind) {
                    return None;
                }
                check(want_callback, Some(callback_id.as_str()))
            }
            (
                Self::View {
                    callback_id: want_callback,
                    kind: want_kind,
                },
                Incoming::View {
                    callback_id, kind, ..
                },
            ) => {
                if want_kind != kind {
                    return None;
                }
                check(want_callback, Some(callback_id.as_str()))
            }
            _ => None,
        }
    }
}

struct Route {
    category: Category,
    matcher: Matcher,
    listener: Listener,
}

// =============================================================================
// App
// =============================================================================

/// In-process Slack client.
///
/// ```rust,ignore
/// let app = App::new(options)?;
/// app.command(Pattern::exact("/ping"), listener)?;
/// let outcome = app.dispatch(Incoming::command("/ping", "")).await?;
/// assert_eq!(outcome.matched, 1);
/// ```
pub struct App {
    token: Option<String>,
    socket_mode: bool,
    log_level: crate::options::LogLevel,
    extra: Map<String, Value>,
    logger: Arc<dyn Logger>,
    routes: RwLock<Vec<Route>>,
}

impl App {
    /// Creates a client, rejecting configurations a Slack app cannot run with.
    ///
    /// - Socket Mode needs an app token.
    /// - HTTP mode needs a signing secret.
    /// - A bot token is needed unless OAuth (`clientId`) or a custom
    ///   `authorize` function is configured through pass-through options.
    pub fn new(options: AppOptions) -> AppResult<Self> {
        if options.socket_mode && options.app_token.is_none() {
            return Err(AppError::initialization(
                "an app token is required when socket mode is enabled",
            ));
        }
        if !options.socket_mode && options.signing_secret.is_none() {
            return Err(AppError::initialization(
                "a signing secret is required when socket mode is disabled",
            ));
        }
        if options.token.is_none()
            && !options.extra.contains_key("clientId")
            && !options.extra.contains_key("authorize")
        {
            return Err(AppError::initialization(
                "a bot token is required unless clientId or authorize is configured",
            ));
        }

        options.logger.set_level(options.log_level);
        options.logger.debug(&format!(
            "initializing app (socket mode: {})",
            options.socket_mode
        ));

        Ok(Self {
            token: options.token,
            socket_mode: options.socket_mode,
            log_level: options.log_level,
            extra: options.extra,
            logger: options.logger,
            routes: RwLock::new(Vec::new()),
        })
    }

    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    pub fn socket_mode(&self) -> bool {
        self.socket_mode
    }

    pub fn log_level(&self) -> crate::options::LogLevel {
        self.log_level
    }

    /// Pass-through options the app was created with.
    pub fn extra(&self) -> &Map<String, Value> {
        &self.extra
    }

    pub fn logger(&self) -> &Arc<dyn Logger> {
        &self.logger
    }

    /// Number of registered listeners across all categories.
    pub fn listener_count(&self) -> usize {
        self.routes.read().len()
    }

    fn add_route(&self, category: Category, matcher: Matcher, listener: Listener) {
        self.routes.write().push(Route {
            category,
            matcher,
            listener,
        });
        self.logger.debug(&format!("registered {category} listener"));
    }
}

#[async_trait]
impl SlackClient for App {
    fn message(&self, pattern: MessagePattern, listener: Listener) -> AppResult<()> {
        let matcher = Matcher::Message(CompiledPattern::compile_opt(pattern.0.as_ref())?);
        self.add_route(Category::Message, matcher, listener);
        Ok(())
    }

    fn action(&self, constraints: ActionConstraints, listener: Listener) -> AppResult<()> {
        let matcher = Matcher::Action {
            action_id: CompiledPattern::compile_opt(constraints.action_id.as_ref())?,
            block_id: CompiledPattern::compile_opt(constraints.block_id.as_ref())?,
            callback_id: CompiledPattern::compile_opt(constraints.callback_id.as_ref())?,
            kind: constraints.kind.map(|k| k.into_owned()),
        };
        self.add_route(Category::Action, matcher, listener);
        Ok(())
    }

    fn command(&self, name: Pattern, listener: Listener) -> AppResult<()> {
        let matcher = Matcher::Command(CompiledPattern::compile(&name)?);
        self.add_route(Category::Command, matcher, listener);
        Ok(())
    }

    fn event(&self, event_type: Pattern, listener: Listener) -> AppResult<()> {
        let matcher = Matcher::Event(CompiledPattern::compile(&event_type)?);
        self.add_route(Category::Event, matcher, listener);
        Ok(())
    }

    fn shortcut(&self, constraints: ShortcutConstraints, listener: Listener) -> AppResult<()> {
        let matcher = Matcher::Shortcut {
            callback_id: CompiledPattern::compile_opt(constraints.callback_id.as_ref())?,
            kind: constraints.kind,
        };
        self.add_route(Category::Shortcut, matcher, listener);
        Ok(())
    }

    fn view(&self, constraints: ViewConstraints, listener: Listener) -> AppResult<()> {
        let matcher = Matcher::View {
            callback_id: CompiledPattern::compile_opt(constraints.callback_id.as_ref())?,
            kind: constraints.kind,
        };
        self.add_route(Category::View, matcher, listener);
        Ok(())
    }

    async fn dispatch(&self, incoming: Incoming) -> AppResult<DispatchOutcome> {
        let ack = Ack::default();
        let payload = Arc::new(incoming.payload().clone());

        // Collect first so the route lock is not held while listeners run.
        let calls: Vec<_> = {
            let routes = self.routes.read();
            routes
                .iter()
                .filter_map(|route| {
                    route.matcher.matches(&incoming).map(|matches| {
                        let args = ListenerArgs::new(route.category, Arc::clone(&payload), ack.clone())
                            .with_matches(matches);
                        (Arc::clone(&route.listener), args)
                    })
                })
                .collect()
        };

        if calls.is_empty() {
            self.logger.debug(&format!(
                "no listener matched incoming {}",
                incoming.category()
            ));
            return Ok(DispatchOutcome::default());
        }

        let matched = calls.len();
        let results = join_all(calls.into_iter().map(|(listener, args)| listener(args))).await;

        let mut errors: Vec<BoxError> = results.into_iter().filter_map(Result::err).collect();
        for err in &errors {
            self.logger.error(&format!(
                "{} listener failed: {err}",
                incoming.category()
            ));
        }

        let outcome = DispatchOutcome {
            matched,
            acked: ack.is_acked(),
        };
        match errors.len() {
            0 => Ok(outcome),
            1 => Err(AppError::Listener(errors.remove(0))),
            _ => Err(AppError::MultipleListeners(errors)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::listener::from_fn;
    use crate::options::LogLevel;
    use parking_lot::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Default)]
    struct RecordingLogger {
        lines: Mutex<Vec<String>>,
        level: Mutex<Option<LogLevel>>,
    }

    impl Logger for RecordingLogger {
        fn debug(&self, msg: &str) {
            self.lines.lock().push(format!("debug {msg}"));
        }
        fn info(&self, msg: &str) {
            self.lines.lock().push(format!("info {msg}"));
        }
        fn warn(&self, msg: &str) {
            self.lines.lock().push(format!("warn {msg}"));
        }
        fn error(&self, msg: &str) {
            self.lines.lock().push(format!("error {msg}"));
        }
        fn set_level(&self, level: LogLevel) {
            *self.level.lock() = Some(level);
        }
        fn level(&self) -> LogLevel {
            self.level.lock().unwrap_or_default()
        }
        fn set_name(&self, _name: &str) {}
        fn name(&self) -> String {
            "test".to_string()
        }
    }

    fn options() -> AppOptions {
        AppOptions {
            token: Some("xoxb-test".to_string()),
            signing_secret: Some("secret".to_string()),
            socket_mode: false,
            app_token: None,
            log_level: LogLevel::Info,
            logger: Arc::new(RecordingLogger::default()),
            extra: Map::new(),
        }
    }

    fn counting(counter: &Arc<AtomicUsize>) -> Listener {
        let counter = Arc::clone(counter);
        from_fn(move |_args| {
            let counter = Arc::clone(&counter);
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
                Ok(())
            }
        })
    }

    fn failing(message: &'static str) -> Listener {
        from_fn(move |_args| async move { Err(BoxError::from(message)) })
    }

    #[test]
    fn test_new_requires_app_token_in_socket_mode() {
        let mut opts = options();
        opts.socket_mode = true;
        assert!(matches!(App::new(opts), Err(AppError::Initialization(_))));
    }

    #[test]
    fn test_new_requires_signing_secret_over_http() {
        let mut opts = options();
        opts.signing_secret = None;
        assert!(matches!(App::new(opts), Err(AppError::Initialization(_))));
    }

    #[test]
    fn test_new_accepts_oauth_without_token() {
        let mut opts = options();
        opts.token = None;
        opts.extra.insert("clientId".into(), Value::from("123.456"));
        assert!(App::new(opts).is_ok());
    }

    #[test]
    fn test_new_sets_logger_level() {
        let logger = Arc::new(RecordingLogger::default());
        let mut opts = options();
        opts.logger = logger.clone();
        opts.log_level = LogLevel::Warn;
        App::new(opts).unwrap();
        assert_eq!(logger.level(), LogLevel::Warn);
    }

    #[test]
    fn test_invalid_regex_fails_registration() {
        let app = App::new(options()).unwrap();
        let counter = Arc::new(AtomicUsize::new(0));
        let result = app.command(Pattern::regex("/deploy("), counting(&counter));
        assert!(matches!(result, Err(AppError::InvalidPattern { .. })));
        assert_eq!(app.listener_count(), 0);
    }

    #[tokio::test]
    async fn test_message_literal_matches_substring() {
        let app = App::new(options()).unwrap();
        let counter = Arc::new(AtomicUsize::new(0));
        app.message("hello".into(), counting(&counter)).unwrap();

        let outcome = app.dispatch(Incoming::message("well hello there")).await.unwrap();
        assert_eq!(outcome.matched, 1);

        let outcome = app.dispatch(Incoming::message("goodbye")).await.unwrap();
        assert_eq!(outcome.matched, 0);
        assert_eq!(counter.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_message_regex_exposes_captures() {
        let app = App::new(options()).unwrap();
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        app.message(
            Pattern::regex(r"^deploy (\w+)$").into(),
            from_fn(move |args: ListenerArgs| {
                sink.lock().extend(args.matches().iter().cloned());
                async { Ok(()) }
            }),
        )
        .unwrap();

        app.dispatch(Incoming::message("deploy staging")).await.unwrap();
        assert_eq!(*seen.lock(), ["deploy staging", "staging"]);
    }

    #[tokio::test]
    async fn test_message_event_listener_sees_messages() {
        let app = App::new(options()).unwrap();
        let counter = Arc::new(AtomicUsize::new(0));
        app.event(Pattern::exact("message"), counting(&counter)).unwrap();
        app.message(MessagePattern::any(), counting(&counter)).unwrap();

        let outcome = app.dispatch(Incoming::message("hi")).await.unwrap();
        assert_eq!(outcome.matched, 2);

        let event = Incoming::event("message", serde_json::json!({ "text": "hi" }));
        let outcome = app.dispatch(event).await.unwrap();
        assert_eq!(outcome.matched, 2);
    }

    #[tokio::test]
    async fn test_catch_all_message_fires_without_text() {
        let app = App::new(options()).unwrap();
        let any = Arc::new(AtomicUsize::new(0));
        let literal = Arc::new(AtomicUsize::new(0));
        app.message(MessagePattern::any(), counting(&any)).unwrap();
        app.message("hello".into(), counting(&literal)).unwrap();

        let file_share = Incoming::event(
            "message",
            serde_json::json!({ "type": "message", "subtype": "file_share" }),
        );
        let outcome = app.dispatch(file_share).await.unwrap();
        assert_eq!(outcome.matched, 1);
        assert_eq!(any.load(Ordering::SeqCst), 1);
        assert_eq!(literal.load(Ordering::SeqCst), 0);

        let mention = Incoming::event("app_mention", serde_json::json!({ "text": "hello" }));
        assert_eq!(app.dispatch(mention).await.unwrap().matched, 0);
    }

    #[tokio::test]
    async fn test_action_constraints_must_all_match() {
        let app = App::new(options()).unwrap();
        let counter = Arc::new(AtomicUsize::new(0));
        app.action(
            ActionConstraints {
                action_id: Some(Pattern::exact("approve")),
                block_id: Some(Pattern::exact("review")),
                ..Default::default()
            },
            counting(&counter),
        )
        .unwrap();

        let hit = app.dispatch(Incoming::block_action("approve", "review")).await.unwrap();
        let miss = app.dispatch(Incoming::block_action("approve", "other")).await.unwrap();
        assert_eq!((hit.matched, miss.matched), (1, 0));
    }

    #[tokio::test]
    async fn test_view_constraint_ignores_closed_views_by_default() {
        let app = App::new(options()).unwrap();
        let counter = Arc::new(AtomicUsize::new(0));
        app.view("survey".into(), counting(&counter)).unwrap();

        app.dispatch(Incoming::view("survey", ViewKind::Closed)).await.unwrap();
        app.dispatch(Incoming::view("survey", ViewKind::Submission)).await.unwrap();
        assert_eq!(counter.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_shortcut_kind_filter() {
        let app = App::new(options()).unwrap();
        let counter = Arc::new(AtomicUsize::new(0));
        app.shortcut(
            ShortcutConstraints {
                callback_id: Some(Pattern::exact("open")),
                kind: Some(ShortcutKind::Message),
            },
            counting(&counter),
        )
        .unwrap();

        app.dispatch(Incoming::shortcut("open", ShortcutKind::Global)).await.unwrap();
        app.dispatch(Incoming::shortcut("open", ShortcutKind::Message)).await.unwrap();
        assert_eq!(counter.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_ack_is_reported() {
        let app = App::new(options()).unwrap();
        app.command(
            Pattern::exact("/ping"),
            from_fn(|args: ListenerArgs| {
                args.ack();
                async { Ok(()) }
            }),
        )
        .unwrap();

        let outcome = app.dispatch(Incoming::command("/ping", "")).await.unwrap();
        assert!(outcome.acked);
    }

    #[tokio::test]
    async fn test_listener_failures_are_collected() {
        let app = App::new(options()).unwrap();
        let counter = Arc::new(AtomicUsize::new(0));
        app.event(Pattern::exact("app_mention"), failing("first")).unwrap();
        app.event(Pattern::exact("app_mention"), counting(&counter)).unwrap();

        let result = app
            .dispatch(Incoming::event("app_mention", Value::Null))
            .await;
        assert!(matches!(result, Err(AppError::Listener(_))));
        assert_eq!(counter.load(Ordering::SeqCst), 1);

        app.event(Pattern::exact("app_mention"), failing("second")).unwrap();
        let result = app
            .dispatch(Incoming::event("app_mention", Value::Null))
            .await;
        assert!(matches!(result, Err(AppError::MultipleListeners(errs)) if errs.len() == 2));
    }
}
