//! Configuration validation engine.
//!
//! Validates config files against the known schema, detects unknown or
//! misspelled fields, and reports settings the bridge cannot run with.

use std::{
    collections::{HashMap, HashSet},
    path::{Path, PathBuf},
};

use {
    chatbridge_channels::MentionMode,
    chatbridge_common::Platform,
    secrecy::ExposeSecret,
};

use crate::{
    env_subst::{has_placeholder, substitute_env},
    loader::{find_config_file, parse_config, parse_config_value},
    schema::BridgeConfig,
};

/// Severity level for a diagnostic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    Error,
    Warning,
    Info,
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Error => write!(f, "error"),
            Self::Warning => write!(f, "warning"),
            Self::Info => write!(f, "info"),
        }
    }
}

/// A single validation diagnostic.
#[derive(Debug, Clone)]
pub struct Diagnostic {
    pub severity: Severity,
    /// Category: "syntax", "unknown-field", "type-error", "missing",
    /// "placeholder", "range", "identity", "emoji", "hint", "file-ref"
    pub category: &'static str,
    /// Dotted path, e.g. "b.bot_user_id"
    pub path: String,
    pub message: String,
}

impl Diagnostic {
    fn new(
        severity: Severity,
        category: &'static str,
        path: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            severity,
            category,
            path: path.into(),
            message: message.into(),
        }
    }
}

/// Result of validating a configuration file.
#[derive(Debug, Clone)]
pub struct ValidationResult {
    pub diagnostics: Vec<Diagnostic>,
    pub config_path: Option<PathBuf>,
}

impl ValidationResult {
    /// Returns `true` if any diagnostic is an error.
    #[must_use]
    pub fn has_errors(&self) -> bool {
        self.diagnostics
            .iter()
            .any(|d| d.severity == Severity::Error)
    }

    /// Count diagnostics by severity.
    #[must_use]
    pub fn count(&self, severity: Severity) -> usize {
        self.diagnostics
            .iter()
            .filter(|d| d.severity == severity)
            .count()
    }
}

// ── Schema tree for unknown-field detection ─────────────────────────────────

/// Expected shape of the configuration.
enum KnownKeys {
    /// A struct with fixed field names.
    Struct(HashMap<&'static str, KnownKeys>),
    /// An array of typed items.
    Array(Box<KnownKeys>),
    /// Scalar value, stop recursion.
    Leaf,
}

/// Mirrors every field in `schema.rs`.
fn build_schema_map() -> KnownKeys {
    use KnownKeys::{Array, Leaf, Struct};

    let platform = || {
        Struct(HashMap::from([
            ("name", Leaf),
            ("markup", Leaf),
            ("emoji_style", Leaf),
            ("channel", Leaf),
            ("bot_user_id", Leaf),
            ("token", Leaf),
            ("mention_mode", Leaf),
            ("ignore_bots", Leaf),
        ]))
    };

    Struct(HashMap::from([
        ("a", platform()),
        ("b", platform()),
        ("history", Struct(HashMap::from([("capacity", Leaf)]))),
        ("dispatch", Struct(HashMap::from([("queue_depth", Leaf)]))),
        (
            "identities",
            Array(Box::new(Struct(HashMap::from([
                ("a", Leaf),
                ("b", Leaf),
                ("name", Leaf),
            ])))),
        ),
        (
            "emoji",
            Struct(HashMap::from([
                ("builtin", Leaf),
                (
                    "aliases",
                    Array(Box::new(Struct(HashMap::from([("a", Leaf), ("b", Leaf)])))),
                ),
            ])),
        ),
        ("metrics", Struct(HashMap::from([("enabled", Leaf)]))),
    ]))
}

// ── Levenshtein distance ────────────────────────────────────────────────────

fn levenshtein(a: &str, b: &str) -> usize {
    let b_chars: Vec<char> = b.chars().collect();
    if a.is_empty() {
        return b_chars.len();
    }
    if b_chars.is_empty() {
        return a.chars().count();
    }

    let mut prev: Vec<usize> = (0..=b_chars.len()).collect();
    let mut curr = vec![0; b_chars.len() + 1];

    for (i, ca) in a.chars().enumerate() {
        curr[0] = i + 1;
        for (j, cb) in b_chars.iter().enumerate() {
            let cost = usize::from(ca != *cb);
            curr[j + 1] = (prev[j] + cost).min(prev[j + 1] + 1).min(curr[j] + 1);
        }
        std::mem::swap(&mut prev, &mut curr);
    }
    prev[b_chars.len()]
}

/// Closest candidate within `max_distance` edits, if any.
fn suggest<'a>(needle: &str, candidates: &[&'a str], max_distance: usize) -> Option<&'a str> {
    let mut best: Option<(&'a str, usize)> = None;
    for &candidate in candidates {
        let d = levenshtein(needle, candidate);
        if d > 0 && d <= max_distance && best.as_ref().is_none_or(|(_, bd)| d < *bd) {
            best = Some((candidate, d));
        }
    }
    best.map(|(s, _)| s)
}

// ── Core validation ─────────────────────────────────────────────────────────

/// Validate a config file at the given path, or discover the default config
/// file location if `path` is `None`.
#[must_use]
pub fn validate(path: Option<&Path>) -> ValidationResult {
    let config_path = path.map(Path::to_path_buf).or_else(find_config_file);

    let Some(actual_path) = config_path else {
        return ValidationResult {
            diagnostics: vec![Diagnostic::new(
                Severity::Error,
                "file-ref",
                "",
                "no config file found; the bridge needs both platforms configured",
            )],
            config_path: None,
        };
    };

    match std::fs::read_to_string(&actual_path) {
        Ok(content) => {
            let mut result = validate_str(&content, &actual_path);
            result.config_path = Some(actual_path);
            result
        },
        Err(e) => ValidationResult {
            diagnostics: vec![Diagnostic::new(
                Severity::Error,
                "syntax",
                "",
                format!("failed to read config file: {e}"),
            )],
            config_path: Some(actual_path),
        },
    }
}

/// Validate raw config text. `path` only selects the format by extension.
#[must_use]
pub fn validate_str(raw: &str, path: &Path) -> ValidationResult {
    let mut diagnostics = Vec::new();
    let content = substitute_env(raw);

    // 1. Syntax
    let value = match parse_config_value(&content, path) {
        Ok(v) => v,
        Err(e) => {
            diagnostics.push(Diagnostic::new(
                Severity::Error,
                "syntax",
                "",
                e.to_string(),
            ));
            return ValidationResult {
                diagnostics,
                config_path: None,
            };
        },
    };

    // 2. Unknown fields
    check_unknown_fields(&value, &build_schema_map(), "", &mut diagnostics);

    // 3. Types, then semantics on what parsed
    match parse_config(&content, path) {
        Ok(config) => diagnostics.extend(check_semantics(&config)),
        Err(e) => diagnostics.push(Diagnostic::new(
            Severity::Error,
            "type-error",
            "",
            e.to_string(),
        )),
    }

    ValidationResult {
        diagnostics,
        config_path: None,
    }
}

fn join_path(prefix: &str, key: &str) -> String {
    if prefix.is_empty() {
        key.to_string()
    } else {
        format!("{prefix}.{key}")
    }
}

fn check_unknown_fields(
    value: &serde_json::Value,
    schema: &KnownKeys,
    prefix: &str,
    diagnostics: &mut Vec<Diagnostic>,
) {
    match (value, schema) {
        (serde_json::Value::Object(table), KnownKeys::Struct(fields)) => {
            let known_keys: Vec<&str> = fields.keys().copied().collect();
            for (key, child_value) in table {
                let path = join_path(prefix, key);
                if let Some(child_schema) = fields.get(key.as_str()) {
                    check_unknown_fields(child_value, child_schema, &path, diagnostics);
                    continue;
                }
                let level = if prefix.is_empty() {
                    " at top level"
                } else {
                    ""
                };
                let msg = match suggest(key, &known_keys, 3) {
                    Some(s) => format!("unknown field{level} (did you mean \"{s}\"?)"),
                    None => format!("unknown field{level}"),
                };
                diagnostics.push(Diagnostic::new(
                    Severity::Error,
                    "unknown-field",
                    path,
                    msg,
                ));
            }
        },
        (serde_json::Value::Array(arr), KnownKeys::Array(item_schema)) => {
            for (i, item) in arr.iter().enumerate() {
                let path = format!("{prefix}[{i}]");
                check_unknown_fields(item, item_schema, &path, diagnostics);
            }
        },
        // Leaf or type mismatch; type errors are reported by the typed parse.
        _ => {},
    }
}

/// Checks on a successfully parsed config.
#[must_use]
pub fn check_semantics(config: &BridgeConfig) -> Vec<Diagnostic> {
    let mut diagnostics = Vec::new();

    for platform in Platform::ALL {
        let side = platform.as_str();
        let cfg = config.platform(platform);

        if cfg.channel.trim().is_empty() {
            diagnostics.push(Diagnostic::new(
                Severity::Error,
                "missing",
                format!("{side}.channel"),
                "bridged channel is not set",
            ));
        } else if has_placeholder(&cfg.channel) {
            diagnostics.push(Diagnostic::new(
                Severity::Error,
                "placeholder",
                format!("{side}.channel"),
                "environment variable in channel is not set",
            ));
        }

        let token = cfg.token.expose_secret();
        if token.trim().is_empty() {
            diagnostics.push(Diagnostic::new(
                Severity::Error,
                "missing",
                format!("{side}.token"),
                "bot token is not set",
            ));
        } else if has_placeholder(token) {
            diagnostics.push(Diagnostic::new(
                Severity::Error,
                "placeholder",
                format!("{side}.token"),
                "environment variable in token is not set",
            ));
        }

        if cfg.bot_user_id.is_none() {
            diagnostics.push(Diagnostic::new(
                Severity::Error,
                "missing",
                format!("{side}.bot_user_id"),
                "bot user id is required to suppress the bridge's own messages",
            ));
        }
    }

    if config.history.capacity == 0 {
        diagnostics.push(Diagnostic::new(
            Severity::Error,
            "range",
            "history.capacity",
            "capacity must be at least 1",
        ));
    }
    if config.dispatch.queue_depth == 0 {
        diagnostics.push(Diagnostic::new(
            Severity::Error,
            "range",
            "dispatch.queue_depth",
            "queue depth must be at least 1",
        ));
    }

    let mut seen_a = HashSet::new();
    let mut seen_b = HashSet::new();
    for (i, entry) in config.identities.iter().enumerate() {
        if !seen_a.insert(&entry.a) {
            diagnostics.push(Diagnostic::new(
                Severity::Warning,
                "identity",
                format!("identities[{i}].a"),
                format!("user {} is mapped more than once; the first row wins", entry.a),
            ));
        }
        if !seen_b.insert(&entry.b) {
            diagnostics.push(Diagnostic::new(
                Severity::Warning,
                "identity",
                format!("identities[{i}].b"),
                format!("user {} is mapped more than once; the first row wins", entry.b),
            ));
        }
    }

    for (i, alias) in config.emoji.aliases.iter().enumerate() {
        if alias.a.trim().is_empty() || alias.b.trim().is_empty() {
            diagnostics.push(Diagnostic::new(
                Severity::Error,
                "emoji",
                format!("emoji.aliases[{i}]"),
                "emoji alias names must not be empty",
            ));
        }
    }

    if config.a.markup == config.b.markup {
        diagnostics.push(Diagnostic::new(
            Severity::Info,
            "hint",
            "b.markup",
            format!("both platforms use {:?} markup", config.a.markup),
        ));
    }

    if config.a.mention_mode == MentionMode::None && config.b.mention_mode == MentionMode::None
    {
        diagnostics.push(Diagnostic::new(
            Severity::Warning,
            "hint",
            "",
            "mention_mode is \"none\" on both platforms; no new messages will be relayed",
        ));
    }

    diagnostics
}
