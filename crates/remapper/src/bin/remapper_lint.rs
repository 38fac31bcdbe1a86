//! `remapper-lint`: structurally validate a remapper.
//!
//! Usage:
//!   remapper-lint < remapper.json
//!
//! Prints one `path: code: message` line per problem and exits with status 1
//! when any were found.

use remapper::validate;
use serde_json::Value;
use std::io::{self, Read};

fn main() {
    let mut buf = String::new();
    if let Err(e) = io::stdin().read_to_string(&mut buf) {
        eprintln!("{e}");
        std::process::exit(1);
    }

    let document: Value = match serde_json::from_str(buf.trim()) {
        Ok(document) => document,
        Err(e) => {
            eprintln!("{e}");
            std::process::exit(1);
        }
    };

    match validate(&document) {
        Ok(()) => {}
        Err(errors) => {
            for error in errors.iter() {
                println!("{}: {}: {}", error.path, error.code, error.message);
            }
            std::process::exit(1);
        }
    }
}
