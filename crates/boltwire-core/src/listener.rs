//! Listener functions and the arguments they receive.

use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use futures::future::BoxFuture;
use serde_json::Value;

use crate::handler::{Category, Instance, InvokeFn};

/// Boxed error returned by listeners.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Outcome of a single listener call.
pub type ListenerResult = Result<(), BoxError>;

/// A handler bound to its owning instance, ready to be registered on a client.
pub type Listener = Arc<dyn Fn(ListenerArgs) -> BoxFuture<'static, ListenerResult> + Send + Sync>;

/// Binds a registry thunk to the instance that owns the method.
pub fn bind(instance: Instance, invoke: InvokeFn) -> Listener {
    Arc::new(move |args| invoke(Arc::clone(&instance), args))
}

/// Wraps an async closure as a [`Listener`].
pub fn from_fn<F, Fut>(f: F) -> Listener
where
    F: Fn(ListenerArgs) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = ListenerResult> + Send + 'static,
{
    Arc::new(move |args| -> BoxFuture<'static, ListenerResult> { Box::pin(f(args)) })
}

// =============================================================================
// Ack
// =============================================================================

/// Acknowledgement handle shared by every listener of one activity.
#[derive(Debug, Clone, Default)]
pub struct Ack(Arc<AtomicBool>);

impl Ack {
    /// Acknowledges the activity.
    pub fn ack(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_acked(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

// =============================================================================
// ListenerArgs
// =============================================================================

/// Arguments passed to every listener call.
#[derive(Debug, Clone)]
pub struct ListenerArgs {
    category: Category,
    payload: Arc<Value>,
    matches: Vec<String>,
    ack: Ack,
}

impl ListenerArgs {
    pub fn new(category: Category, payload: Arc<Value>, ack: Ack) -> Self {
        Self {
            category,
            payload,
            matches: Vec::new(),
            ack,
        }
    }

    /// Attaches regex captures (index 0 is the whole match).
    pub fn with_matches(mut self, matches: Vec<String>) -> Self {
        self.matches = matches;
        self
    }

    pub fn category(&self) -> Category {
        self.category
    }

    /// The raw activity payload.
    pub fn payload(&self) -> &Value {
        &self.payload
    }

    /// Regex captures produced by the matcher, empty for literal matches.
    pub fn matches(&self) -> &[String] {
        &self.matches
    }

    /// Message text, when the payload has one.
    pub fn text(&self) -> Option<&str> {
        self.payload.get("text").and_then(Value::as_str)
    }

    pub fn ack(&self) {
        self.ack.ack();
    }

    pub fn is_acked(&self) -> bool {
        self.ack.is_acked()
    }
}

// =============================================================================
// IntoListenerResult
// =============================================================================

/// Return types accepted from handler methods.
pub trait IntoListenerResult {
    fn into_listener_result(self) -> ListenerResult;
}

impl IntoListenerResult for () {
    fn into_listener_result(self) -> ListenerResult {
        Ok(())
    }
}

impl<E> IntoListenerResult for Result<(), E>
where
    E: Into<BoxError>,
{
    fn into_listener_result(self) -> ListenerResult {
        self.map_err(Into::into)
    }
}

#[doc(hidden)]
pub fn owner_mismatch(owner: &'static str) -> BoxError {
    format!("handler instance is not a `{owner}`").into()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;

    struct Counter(AtomicUsize);

    fn bump(instance: Instance, _args: ListenerArgs) -> BoxFuture<'static, ListenerResult> {
        Box::pin(async move {
            match instance.downcast::<Counter>() {
                Ok(counter) => {
                    counter.0.fetch_add(1, Ordering::SeqCst);
                    Ok(())
                }
                Err(_) => Err(owner_mismatch("Counter")),
            }
        })
    }

    #[tokio::test]
    async fn test_bind_calls_owner() {
        let counter = Arc::new(Counter(AtomicUsize::new(0)));
        let listener = bind(counter.clone(), bump);

        let args = ListenerArgs::new(Category::Event, Arc::new(Value::Null), Ack::default());
        tokio_test::assert_ok!(listener(args.clone()).await);
        tokio_test::assert_ok!(listener(args).await);

        assert_eq!(counter.0.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_bind_reports_wrong_owner() {
        let listener = bind(Arc::new(42_u32), bump);
        let args = ListenerArgs::new(Category::Event, Arc::new(Value::Null), Ack::default());
        tokio_test::assert_err!(listener(args).await);
    }

    #[test]
    fn test_ack_is_shared_between_clones() {
        let args = ListenerArgs::new(Category::Action, Arc::new(Value::Null), Ack::default());
        let other = args.clone();
        other.ack();
        assert!(args.is_acked());
    }

    #[test]
    fn test_into_listener_result() {
        assert!(().into_listener_result().is_ok());
        let failed: Result<(), std::io::Error> = Err(std::io::Error::other("boom"));
        assert!(failed.into_listener_result().is_err());
    }
}
