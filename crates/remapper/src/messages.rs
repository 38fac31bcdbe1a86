//! Message templates and the explicit formatter cache.
//!
//! Templates use ICU-style placeholders: `{name}` is replaced by the value of
//! `name`, anything after a comma (`{count, number}`) is ignored. An apostrophe
//! quotes braces (`'{'`), and `''` produces a single apostrophe.

use crate::context::Context;
use parking_lot::RwLock;
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::sync::Arc;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    Text(String),
    Arg(String),
}

/// A parsed message template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Template {
    segments: Vec<Segment>,
}

impl Template {
    pub fn parse(source: &str) -> Template {
        let mut segments = Vec::new();
        let mut text = String::new();
        let mut chars = source.chars().peekable();
        while let Some(c) = chars.next() {
            match c {
                '\'' => match chars.peek() {
                    Some('\'') => {
                        chars.next();
                        text.push('\'');
                    }
                    Some('{') | Some('}') => {
                        for quoted in chars.by_ref() {
                            if quoted == '\'' {
                                break;
                            }
                            text.push(quoted);
                        }
                    }
                    _ => text.push('\''),
                },
                '{' => {
                    let mut arg = String::new();
                    let mut closed = false;
                    for inner in chars.by_ref() {
                        if inner == '}' {
                            closed = true;
                            break;
                        }
                        arg.push(inner);
                    }
                    if !closed {
                        // Unterminated placeholder, keep it verbatim.
                        text.push('{');
                        text.push_str(&arg);
                        continue;
                    }
                    if !text.is_empty() {
                        segments.push(Segment::Text(std::mem::take(&mut text)));
                    }
                    let name = arg.split(',').next().unwrap_or_default().trim();
                    segments.push(Segment::Arg(name.to_string()));
                }
                _ => text.push(c),
            }
        }
        if !text.is_empty() {
            segments.push(Segment::Text(text));
        }
        Template { segments }
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// Renders the template. Missing or `null` arguments render as nothing.
    pub fn format(&self, values: &Map<String, Value>) -> String {
        let mut out = String::new();
        for segment in &self.segments {
            match segment {
                Segment::Text(text) => out.push_str(text),
                Segment::Arg(name) => match values.get(name) {
                    None | Some(Value::Null) => {}
                    Some(Value::String(s)) => out.push_str(s),
                    Some(other) => out.push_str(&other.to_string()),
                },
            }
        }
        out
    }
}

/// Parsed templates keyed by `(locale, template)`.
///
/// Owned by the caller and shared read-mostly between evaluations; the engine
/// never keeps one of its own.
#[derive(Debug, Default)]
pub struct MessageCache {
    templates: RwLock<HashMap<(String, String), Arc<Template>>>,
}

impl MessageCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get_or_parse(&self, locale: &str, source: &str) -> Arc<Template> {
        let key = (locale.to_string(), source.to_string());
        if let Some(template) = self.templates.read().get(&key) {
            return Arc::clone(template);
        }
        let mut templates = self.templates.write();
        Arc::clone(
            templates
                .entry(key)
                .or_insert_with(|| Arc::new(Template::parse(source))),
        )
    }

    pub fn len(&self) -> usize {
        self.templates.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Formats `source` with `values`, going through the context's formatter
/// cache when it has one.
pub fn format_message(ctx: &Context, source: &str, values: &Map<String, Value>) -> String {
    match &ctx.formatters {
        Some(cache) => cache.get_or_parse(ctx.locale(), source).format(values),
        None => Template::parse(source).format(values),
    }
}
