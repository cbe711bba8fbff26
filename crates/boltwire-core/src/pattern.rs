//! Matcher metadata attached to handler methods.
//!
//! Patterns are plain data here: regular expressions are kept as source text
//! and only compiled when a client registers the listener, so a malformed
//! expression is reported by the registration call that uses it.

use std::borrow::Cow;
use std::fmt;

/// A string or regular-expression matcher.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Pattern {
    /// Literal text.
    Exact(Cow<'static, str>),
    /// Regular expression source.
    Regex(Cow<'static, str>),
}

impl Pattern {
    pub fn exact(text: impl Into<Cow<'static, str>>) -> Self {
        Self::Exact(text.into())
    }

    pub fn regex(source: impl Into<Cow<'static, str>>) -> Self {
        Self::Regex(source.into())
    }

    /// Returns the literal text or the regex source.
    pub fn as_str(&self) -> &str {
        match self {
            Self::Exact(s) | Self::Regex(s) => s,
        }
    }
}

impl fmt::Display for Pattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Exact(s) => write!(f, "{s:?}"),
            Self::Regex(s) => write!(f, "/{s}/"),
        }
    }
}

impl From<&'static str> for Pattern {
    fn from(text: &'static str) -> Self {
        Self::Exact(Cow::Borrowed(text))
    }
}

impl From<String> for Pattern {
    fn from(text: String) -> Self {
        Self::Exact(Cow::Owned(text))
    }
}

// =============================================================================
// Per-category constraints
// =============================================================================

/// Message matcher. `None` matches every message.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MessagePattern(pub Option<Pattern>);

impl MessagePattern {
    pub fn any() -> Self {
        Self(None)
    }
}

impl From<Pattern> for MessagePattern {
    fn from(pattern: Pattern) -> Self {
        Self(Some(pattern))
    }
}

/// Constraints for interactive actions (buttons, menus, ...).
///
/// Every field that is set must match.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ActionConstraints {
    pub action_id: Option<Pattern>,
    pub block_id: Option<Pattern>,
    pub callback_id: Option<Pattern>,
    /// Payload type, e.g. `block_actions` or `interactive_message`.
    pub kind: Option<Cow<'static, str>>,
}

impl From<Pattern> for ActionConstraints {
    fn from(action_id: Pattern) -> Self {
        Self {
            action_id: Some(action_id),
            ..Self::default()
        }
    }
}

/// Kind of shortcut payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShortcutKind {
    /// Global shortcut (`shortcut`).
    Global,
    /// Message shortcut (`message_action`).
    Message,
}

impl ShortcutKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Global => "shortcut",
            Self::Message => "message_action",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "shortcut" => Some(Self::Global),
            "message_action" => Some(Self::Message),
            _ => None,
        }
    }
}

/// Constraints for global and message shortcuts.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ShortcutConstraints {
    pub callback_id: Option<Pattern>,
    /// `None` accepts both kinds.
    pub kind: Option<ShortcutKind>,
}

impl From<Pattern> for ShortcutConstraints {
    fn from(callback_id: Pattern) -> Self {
        Self {
            callback_id: Some(callback_id),
            kind: None,
        }
    }
}

/// Kind of view payload.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum ViewKind {
    #[default]
    Submission,
    Closed,
}

impl ViewKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Submission => "view_submission",
            Self::Closed => "view_closed",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "view_submission" => Some(Self::Submission),
            "view_closed" => Some(Self::Closed),
            _ => None,
        }
    }
}

/// Constraints for modal view submissions and closures.
///
/// A bare callback id only matches submissions.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ViewConstraints {
    pub callback_id: Option<Pattern>,
    pub kind: ViewKind,
}

impl From<Pattern> for ViewConstraints {
    fn from(callback_id: Pattern) -> Self {
        Self {
            callback_id: Some(callback_id),
            kind: ViewKind::Submission,
        }
    }
}

// A bare string constrains the primary id of each matcher.
macro_rules! impl_from_text {
    ($($ty:ty),*) => {
        $(
            impl From<&'static str> for $ty {
                fn from(text: &'static str) -> Self {
                    Pattern::from(text).into()
                }
            }

            impl From<String> for $ty {
                fn from(text: String) -> Self {
                    Pattern::from(text).into()
                }
            }
        )*
    };
}

impl_from_text!(MessagePattern, ActionConstraints, ShortcutConstraints, ViewConstraints);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bare_view_constraint_defaults_to_submission() {
        let c = ViewConstraints::from("modal");
        assert_eq!(c.kind, ViewKind::Submission);
        assert_eq!(c.callback_id, Some(Pattern::exact("modal")));
    }

    #[test]
    fn test_pattern_display() {
        assert_eq!(Pattern::exact("hi").to_string(), "\"hi\"");
        assert_eq!(Pattern::regex("^hi$").to_string(), "/^hi$/");
    }
}
