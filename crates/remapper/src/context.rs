//! Read-only evaluation context supplied by the caller.
//!
//! The engine only ever reads from a [`Context`]. Callers (a block runtime, an
//! action pipeline, a view renderer) build one per evaluation, either through
//! the builder methods or from a [`ContextConfig`] document.

use crate::error::ConfigError;
use crate::messages::MessageCache;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

/// Static information about the app owning the evaluated definition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AppMetadata {
    pub id: Option<i64>,
    pub url: String,
    /// The app's default locale.
    pub locale: String,
}

impl Default for AppMetadata {
    fn default() -> Self {
        AppMetadata {
            id: None,
            url: String::new(),
            locale: "en".to_string(),
        }
    }
}

/// The authenticated actor, shaped like an OpenID Connect userinfo response.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UserInfo {
    pub sub: String,
    pub name: Option<String>,
    pub email: Option<String>,
    pub email_verified: bool,
    pub locale: Option<String>,
    pub zoneinfo: Option<String>,
    pub properties: Map<String, Value>,
}

/// Locale-specific message lookup.
pub trait MessageCatalog: Send + Sync {
    /// Returns the message registered under `id`, or `fallback` when there is
    /// none.
    fn message(&self, id: &str, fallback: &str) -> String;
}

/// A catalog that knows no messages.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoMessages;

impl MessageCatalog for NoMessages {
    fn message(&self, _id: &str, fallback: &str) -> String {
        fallback.to_string()
    }
}

/// A catalog backed by a fixed map of message ids to templates.
#[derive(Debug, Clone, Default)]
pub struct StaticMessages {
    messages: HashMap<String, String>,
}

impl StaticMessages {
    pub fn new(messages: HashMap<String, String>) -> Self {
        StaticMessages { messages }
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for StaticMessages {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        StaticMessages {
            messages: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

impl MessageCatalog for StaticMessages {
    fn message(&self, id: &str, fallback: &str) -> String {
        self.messages
            .get(id)
            .cloned()
            .unwrap_or_else(|| fallback.to_string())
    }
}

/// Everything an expression may observe besides its input.
#[derive(Clone)]
pub struct Context {
    pub app: AppMetadata,
    pub user: Option<UserInfo>,
    pub messages: Arc<dyn MessageCatalog>,
    /// Parameters of the current page.
    pub page: Value,
    /// App-level variables.
    pub variables: Map<String, Value>,
    /// The instant `date.now` reports. Never read from the system clock.
    pub now: DateTime<Utc>,
    /// Optional formatter cache shared between evaluations.
    pub formatters: Option<Arc<MessageCache>>,
}

impl Context {
    pub fn new(app: AppMetadata) -> Self {
        Context {
            app,
            user: None,
            messages: Arc::new(NoMessages),
            page: Value::Null,
            variables: Map::new(),
            now: DateTime::<Utc>::default(),
            formatters: None,
        }
    }

    pub fn with_user(mut self, user: UserInfo) -> Self {
        self.user = Some(user);
        self
    }

    pub fn with_messages(mut self, messages: Arc<dyn MessageCatalog>) -> Self {
        self.messages = messages;
        self
    }

    pub fn with_page(mut self, page: Value) -> Self {
        self.page = page;
        self
    }

    pub fn with_variables(mut self, variables: Map<String, Value>) -> Self {
        self.variables = variables;
        self
    }

    pub fn at(mut self, now: DateTime<Utc>) -> Self {
        self.now = now;
        self
    }

    pub fn with_formatters(mut self, cache: Arc<MessageCache>) -> Self {
        self.formatters = Some(cache);
        self
    }

    /// The user's locale if they have one, the app default otherwise.
    pub fn locale(&self) -> &str {
        self.user
            .as_ref()
            .and_then(|u| u.locale.as_deref())
            .unwrap_or(&self.app.locale)
    }
}

impl Default for Context {
    fn default() -> Self {
        Context::new(AppMetadata::default())
    }
}

impl std::fmt::Debug for Context {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Context")
            .field("app", &self.app)
            .field("user", &self.user)
            .field("page", &self.page)
            .field("variables", &self.variables)
            .field("now", &self.now)
            .finish_non_exhaustive()
    }
}

/// Serialized form of a [`Context`], as read by the command line tools.
///
/// ```json
/// {
///   "app": { "id": 1, "url": "https://app.example", "locale": "nl" },
///   "user": { "sub": "42", "name": "Alex", "locale": "en-GB" },
///   "messages": { "greeting": "Hello {name}" },
///   "page": { "id": "7" },
///   "variables": { "theme": "dark" },
///   "now": "2024-01-01T12:00:00Z"
/// }
/// ```
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ContextConfig {
    pub app: AppMetadata,
    pub user: Option<UserInfo>,
    pub messages: HashMap<String, String>,
    pub page: Value,
    pub variables: Map<String, Value>,
    /// RFC 3339 timestamp. The current time is used when absent.
    pub now: Option<String>,
}

impl ContextConfig {
    pub fn from_json(text: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(text)?)
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_json(&text)
    }

    pub fn into_context(self) -> Result<Context, ConfigError> {
        let now = match self.now {
            Some(now) => DateTime::parse_from_rfc3339(&now)?.with_timezone(&Utc),
            None => Utc::now(),
        };
        let mut context = Context::new(self.app)
            .with_messages(Arc::new(StaticMessages::new(self.messages)))
            .with_page(self.page)
            .with_variables(self.variables)
            .at(now);
        context.user = self.user;
        Ok(context)
    }
}
