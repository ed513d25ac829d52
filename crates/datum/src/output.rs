//! Styled console output helpers shared by the command modules.

use console::style;

/// Emit a machine-readable payload on stdout.
pub fn print_json(value: &serde_json::Value) {
    match serde_json::to_string_pretty(value) {
        Ok(body) => println!("{body}"),
        Err(_) => println!("{value}"),
    }
}

/// An error line on stderr, in the `✗` house style.
pub fn error_line(message: &str) {
    eprintln!();
    eprintln!("{} {message}", style("✗").red().bold());
    eprintln!();
}

/// A success line on stdout.
pub fn success_line(message: &str) {
    println!("  {}  {message}", style("✓").green());
}

pub fn muted(message: &str) -> String {
    style(message).dim().to_string()
}

pub fn bold(message: &str) -> String {
    style(message).bold().to_string()
}
