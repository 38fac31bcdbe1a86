//! `remap`: evaluate a remapper against a JSON document.
//!
//! Usage:
//!   remap '<remapper>' [context.json]
//!
//! The input document is read from stdin; empty input is `null`. The optional
//! second argument is a context configuration file (app, user, messages,
//! page, variables, now). Set `RUST_LOG=remapper=debug` to see operator
//! fallbacks.

use remapper::{remap, validate, Context, ContextConfig};
use serde_json::Value;
use std::io::{self, Read, Write};
use tracing_subscriber::EnvFilter;

fn fail(message: impl std::fmt::Display) -> ! {
    eprintln!("{message}");
    std::process::exit(1);
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .init();

    let args: Vec<String> = std::env::args().collect();
    let expression: Value = match args.get(1) {
        Some(source) => serde_json::from_str(source).unwrap_or_else(|e| fail(e)),
        None => fail("First argument must be a remapper."),
    };
    if let Err(errors) = validate(&expression) {
        for error in errors.iter() {
            eprintln!("{error}");
        }
        std::process::exit(2);
    }

    let context = match args.get(2) {
        Some(path) => ContextConfig::from_path(path)
            .and_then(ContextConfig::into_context)
            .unwrap_or_else(|e| fail(e)),
        None => Context::default().at(chrono::Utc::now()),
    };

    let mut buf = String::new();
    if let Err(e) = io::stdin().read_to_string(&mut buf) {
        fail(e);
    }
    let input: Value = if buf.trim().is_empty() {
        Value::Null
    } else {
        serde_json::from_str(buf.trim()).unwrap_or_else(|e| fail(e))
    };

    let result = remap(&expression, &input, &context);
    let mut stdout = io::stdout().lock();
    let written = serde_json::to_writer(&mut stdout, &result)
        .map_err(io::Error::from)
        .and_then(|()| stdout.write_all(b"\n"));
    if let Err(e) = written {
        fail(e);
    }
}
