use serde_json::Value as Json;
use thiserror::Error;

/// Definition-time failures. Fatal for the declaration being compiled.
#[derive(Debug, Error)]
pub enum FrontendError {
    #[error("parse error at byte {offset}: {message} (near `{fragment}`)")]
    Parse {
        offset: usize,
        fragment: String,
        message: String,
    },

    #[error("cannot resolve `{name}`")]
    NameResolution { name: String },

    #[error("module `{0}` is not available for import")]
    UnknownImport(String),

    #[error("unsupported: {0}")]
    Unsupported(String),

    #[error("duplicate {what} `{name}`")]
    Duplicate { what: &'static str, name: String },

    #[error("alias `{0}` expands to itself")]
    AliasCycle(String),
}

impl FrontendError {
    pub(crate) fn parse(offset: usize, fragment: impl Into<String>, message: impl Into<String>) -> Self {
        FrontendError::Parse { offset, fragment: fragment.into(), message: message.into() }
    }

    pub(crate) fn unresolved(name: impl Into<String>) -> Self {
        FrontendError::NameResolution { name: name.into() }
    }
}

/// Runtime failures of the codecs. Fatal for the value being read or written.
#[derive(Debug, Error)]
pub enum CodecError {
    /// The JSON shape does not match the expected IR type. No coercion is attempted.
    #[error("expected {expected}, found {found}")]
    Conversion { expected: String, found: Json },

    /// A record, variant or table row whose key set is not exactly the declared one.
    #[error("schema mismatch in {context}: {message}")]
    SchemaMismatch { context: String, message: String },

    #[error("unknown tag `{tag}` for sum type `{sum}`")]
    UnknownTag { sum: String, tag: String },

    #[error("nesting deeper than the limit of {limit}")]
    DepthLimit { limit: usize },

    #[error("non-finite float {0} has no JSON encoding")]
    NonFinite(f64),

    /// A dynamic value handed to a type-directed writer does not fit the type.
    #[error("value {found} does not have type {expected}")]
    ValueMismatch { expected: String, found: String },

    #[error("no declaration named `{0}`")]
    UnknownType(String),

    #[error("unsupported: {0}")]
    Unsupported(String),

    #[error("{kind}[{row}].{field}: {reason}")]
    BadCell {
        kind: String,
        row: usize,
        field: String,
        reason: String,
    },

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

impl CodecError {
    pub fn conversion(expected: impl ToString, found: &Json) -> Self {
        CodecError::Conversion { expected: expected.to_string(), found: found.clone() }
    }

    pub fn mismatch(context: impl Into<String>, message: impl Into<String>) -> Self {
        CodecError::SchemaMismatch { context: context.into(), message: message.into() }
    }

    /// Describe the difference between a declared key set and the keys present.
    pub fn key_set<'a>(
        context: impl Into<String>,
        expected: impl IntoIterator<Item = &'a str>,
        found: &serde_json::Map<String, Json>,
    ) -> Self {
        let expected: Vec<&str> = expected.into_iter().collect();
        let missing: Vec<&str> = expected.iter().copied()
            .filter(|k| !found.contains_key(*k))
            .collect();
        let extra: Vec<&str> = found.keys()
            .map(String::as_str)
            .filter(|k| !expected.contains(k))
            .collect();
        let mut parts = Vec::new();
        if !missing.is_empty() { parts.push(format!("missing {missing:?}")); }
        if !extra.is_empty() { parts.push(format!("unexpected {extra:?}")); }
        CodecError::mismatch(context, parts.join("; "))
    }
}
