use crate::utils::text::truncate_utf8_prefix;
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;
use std::collections::{BTreeMap, HashSet};

const DEFAULT_REDACTION: &str = "[REDACTED]";

static SENSITIVE_HEADER_KEYS: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    [
        "authorization",
        "proxy-authorization",
        "x-api-key",
        "x-ms-authorization-auxiliary",
    ]
    .into_iter()
    .collect()
});

static INLINE_PATTERNS: Lazy<Vec<(Regex, &'static str)>> = Lazy::new(|| {
    vec![
        (
            Regex::new(r"\b(Bearer)\s+([A-Za-z0-9._~+/=-]{10,})").expect("bearer redaction regex"),
            "$1 ***REDACTED***",
        ),
        (
            Regex::new(r"\beyJ[a-zA-Z0-9_-]{10,}\.[a-zA-Z0-9_-]{10,}\.[a-zA-Z0-9_-]{10,}\b")
                .expect("jwt redaction regex"),
            "***REDACTED***",
        ),
        (
            Regex::new(r#"\b(access_token|client_secret|refresh_token)\b\s*([:=])\s*([^\s"'&]+)"#)
                .expect("secret redaction regex"),
            "$1$2***REDACTED***",
        ),
    ]
});

pub fn redact_text(value: &str, max_length: usize) -> String {
    let mut out = value.to_string();
    for (re, replacement) in INLINE_PATTERNS.iter() {
        if re.is_match(&out) {
            out = re.replace_all(&out, *replacement).to_string();
        }
    }
    if out.len() <= max_length {
        return out;
    }
    format!("{}...", truncate_utf8_prefix(&out, max_length))
}

pub fn redact_headers(headers: &BTreeMap<String, String>) -> Value {
    let mut out = serde_json::Map::new();
    for (key, value) in headers {
        let masked = if SENSITIVE_HEADER_KEYS.contains(key.trim().to_lowercase().as_str()) {
            DEFAULT_REDACTION.to_string()
        } else {
            redact_text(value, usize::MAX)
        };
        out.insert(key.clone(), Value::String(masked));
    }
    Value::Object(out)
}
