//! Terminal output
//!
//! stdout carries JSON only; everything meant for a human goes to stderr.

use colored::Colorize;
use declarative::{Diagnostic, Diagnostics, Severity};

/// Print an info message
pub fn info(msg: &str) {
    eprintln!("{} {}", "ℹ".blue(), msg);
}

/// Print a success message
pub fn success(msg: &str) {
    eprintln!("{} {}", "✓".green(), msg);
}

/// Print an error message
pub fn error(msg: &str) {
    eprintln!("{} {}", "✗".red(), msg);
}

/// Print a dim/muted message
pub fn dim(msg: &str) {
    eprintln!("  {}", msg.dimmed());
}

/// Render one diagnostic as a plain-text block
pub fn format_diagnostic(diag: &Diagnostic) -> String {
    let label = match diag.severity {
        Severity::Error => "Error",
        Severity::Warning => "Warning",
    };
    let mut out = format!("{label}: {}", diag.summary);
    if let Some(attribute) = &diag.attribute {
        out.push_str(&format!("\n  with {attribute}"));
    }
    if !diag.detail.is_empty() {
        out.push_str(&format!("\n  {}", diag.detail));
    }
    out
}

/// Print a diagnostic
pub fn diagnostic(diag: &Diagnostic) {
    let text = format_diagnostic(diag);
    let (head, rest) = text.split_once('\n').unwrap_or((&text, ""));
    match diag.severity {
        Severity::Error => eprintln!("{} {}", "✗".red(), head.red().bold()),
        Severity::Warning => eprintln!("{} {}", "⚠".yellow(), head.yellow().bold()),
    }
    for line in rest.lines() {
        eprintln!("{}", line.dimmed());
    }
}

/// Print every diagnostic, warnings included unless `quiet`
pub fn diagnostics(diags: &Diagnostics, quiet: bool) {
    for diag in diags {
        if quiet && !diag.is_error() {
            continue;
        }
        diagnostic(diag);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_error_with_attribute() {
        let diag = Diagnostic::error("Missing Notion secret", "Set NOTION_SECRET.").with_attribute("notion_secret");
        assert_eq!(
            format_diagnostic(&diag),
            "Error: Missing Notion secret\n  with notion_secret\n  Set NOTION_SECRET."
        );
    }

    #[test]
    fn test_format_warning_without_detail() {
        let diag = Diagnostic::warning("Database not deleted", "");
        assert_eq!(format_diagnostic(&diag), "Warning: Database not deleted");
    }
}
