use std::path::Path;

use {
    anyhow::Result,
    chatbridge_config::{Severity, ValidationResult, validate},
};

/// ANSI color codes.
const RED: &str = "\x1b[31m";
const YELLOW: &str = "\x1b[33m";
const CYAN: &str = "\x1b[36m";
const BOLD: &str = "\x1b[1m";
const RESET: &str = "\x1b[0m";

pub fn check(config: Option<&Path>, verbose: bool) -> Result<()> {
    let result = validate(config);

    if let Some(ref path) = result.config_path {
        eprintln!("Checking {}\n", path.display());
    }

    let report = render_report(&result, verbose, true);
    eprint!("{report}");

    if result.has_errors() {
        std::process::exit(1);
    }

    Ok(())
}

fn render_report(result: &ValidationResult, verbose: bool, color: bool) -> String {
    let mut out = String::new();
    let mut shown = 0;
    for d in &result.diagnostics {
        if d.severity == Severity::Info && !verbose {
            continue;
        }

        let (code, label) = match d.severity {
            Severity::Error => (RED, "error"),
            Severity::Warning => (YELLOW, "warning"),
            Severity::Info => (CYAN, "info"),
        };
        let label = if color {
            format!("{BOLD}{code}{label}{RESET}")
        } else {
            label.to_string()
        };

        if d.path.is_empty() {
            out.push_str(&format!("  {label} {}\n", d.message));
        } else {
            out.push_str(&format!("  {label} {}: {}\n", d.path, d.message));
        }
        shown += 1;
    }

    let errors = result.count(Severity::Error);
    let warnings = result.count(Severity::Warning);

    if shown > 0 {
        out.push('\n');
    }

    if errors == 0 && warnings == 0 {
        out.push_str("No issues found.\n");
    } else {
        out.push_str(&format!("{errors} error(s), {warnings} warning(s)\n"));
    }
    out
}
