//! Console output helpers for CLI commands.

use serde::Serialize;

/// Print a value as pretty JSON on stdout.
pub fn print_json<T: Serialize>(value: &T) {
    match serde_json::to_string_pretty(value) {
        Ok(json) => println!("{json}"),
        Err(e) => print_error(&format!("Failed to render output: {e}")),
    }
}

/// Print a key-value pair
pub fn print_kv(key: &str, value: &str) {
    println!("  {key:<20} {value}");
}

/// Print a success message
pub fn print_success(msg: &str) {
    println!("OK  {msg}");
}

/// Print an error message
pub fn print_error(msg: &str) {
    eprintln!("ERR {msg}");
}
