use serde::Serialize;
use serde_json::{json, Value};
use thiserror::Error;
use warp::http::StatusCode;

/// Location of an offending value, e.g. `["body", "person", "age"]`.
pub type Loc = Vec<String>;

/// Builds a [`Loc`] from string segments.
pub fn loc(segments: &[&str]) -> Loc {
    segments.iter().map(|s| (*s).to_string()).collect()
}

/// The four ways a request can fail validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ViolationKind {
    MissingRequiredField,
    ConstraintViolation,
    FormatViolation,
    MalformedInput,
}

/// A single field-level problem found while validating a request.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Violation {
    pub loc: Loc,
    pub msg: String,
    #[serde(rename = "type")]
    pub code: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ctx: Option<Value>,
    #[serde(skip)]
    pub kind: ViolationKind,
}

impl Violation {
    pub fn missing(loc: Loc) -> Self {
        Self {
            loc,
            msg: "field required".to_string(),
            code: "value_error.missing".to_string(),
            ctx: None,
            kind: ViolationKind::MissingRequiredField,
        }
    }

    pub fn constraint(loc: Loc, code: &str, msg: impl Into<String>) -> Self {
        Self {
            loc,
            msg: msg.into(),
            code: code.to_string(),
            ctx: None,
            kind: ViolationKind::ConstraintViolation,
        }
    }

    pub fn format(loc: Loc, code: &str, msg: impl Into<String>) -> Self {
        Self {
            loc,
            msg: msg.into(),
            code: code.to_string(),
            ctx: None,
            kind: ViolationKind::FormatViolation,
        }
    }

    pub fn malformed(loc: Loc, code: &str, msg: impl Into<String>) -> Self {
        Self {
            loc,
            msg: msg.into(),
            code: code.to_string(),
            ctx: None,
            kind: ViolationKind::MalformedInput,
        }
    }

    /// Attach structured context such as the violated limit.
    pub fn with_ctx(mut self, ctx: Value) -> Self {
        self.ctx = Some(ctx);
        self
    }

    /// Dotted form of the location, handy for logs.
    pub fn path(&self) -> String {
        self.loc.join(".")
    }
}

/// A request-scoped rejection carrying every violation found in one pass.
#[derive(Debug, Clone, Default, PartialEq, Error)]
#[error("{} validation error(s): {}", .violations.len(), summarize(.violations))]
pub struct ValidationFailure {
    violations: Vec<Violation>,
}

fn summarize(violations: &[Violation]) -> String {
    violations
        .iter()
        .map(|v| format!("{} ({})", v.path(), v.msg))
        .collect::<Vec<_>>()
        .join("; ")
}

impl ValidationFailure {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_violations(violations: Vec<Violation>) -> Self {
        Self { violations }
    }

    pub fn single(violation: Violation) -> Self {
        Self {
            violations: vec![violation],
        }
    }

    pub fn push(&mut self, violation: Violation) {
        self.violations.push(violation);
    }

    pub fn extend(&mut self, other: ValidationFailure) {
        self.violations.extend(other.violations);
    }

    pub fn is_empty(&self) -> bool {
        self.violations.is_empty()
    }

    pub fn len(&self) -> usize {
        self.violations.len()
    }

    pub fn violations(&self) -> &[Violation] {
        &self.violations
    }

    /// Whether any violation of `kind` sits at exactly `loc`.
    pub fn has(&self, kind: ViolationKind, loc: &[&str]) -> bool {
        self.violations
            .iter()
            .any(|v| v.kind == kind && v.loc.iter().map(String::as_str).eq(loc.iter().copied()))
    }

    /// `Ok(value)` when nothing was collected, otherwise the failure itself.
    pub fn into_result<T>(self, value: T) -> Result<T, ValidationFailure> {
        if self.is_empty() {
            Ok(value)
        } else {
            Err(self)
        }
    }

    /// Client-facing body: `{"detail": [{"loc": .., "msg": .., "type": ..}]}`.
    pub fn to_json(&self) -> Value {
        json!({ "detail": self.violations })
    }
}

impl From<Violation> for ValidationFailure {
    fn from(violation: Violation) -> Self {
        Self::single(violation)
    }
}

/// Errors that reach a client or stop the service from starting.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Validation failed: {0}")]
    Validation(#[from] ValidationFailure),

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl ApiError {
    /// HTTP status used when this error reaches a client.
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            Self::Config(_) | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Body returned to the client for this error.
    pub fn to_json(&self) -> Value {
        match self {
            Self::Validation(failure) => failure.to_json(),
            other => json!({ "detail": other.to_string() }),
        }
    }
}

pub type ApiResult<T> = Result<T, ApiError>;
