//! Request Validator & Shaper
//!
//! Turns untyped request data (path and query strings, raw JSON bodies) into
//! the typed models of [`crate::models`], or a [`ValidationFailure`] that lists
//! every violated constraint. Validation is pure and holds no state, so a
//! single validator is shared by every request.

use {
    crate::constraints::{
        check_field, check_object, check_params, coerce_param, FieldRule,
        DETAIL_QUERY_RULES, LOCATION_RULES, PERSON_ID_RULE, PERSON_RULES,
    },
    crate::error::{loc, Loc, ValidationFailure, Violation},
    crate::formats::FormatCheckers,
    crate::models::{Greeting, Person, PersonDetailQuery, PersonIdPath, PersonUpdate},
    serde::de::DeserializeOwned,
    serde_json::Value,
    std::collections::HashMap,
    tracing::{debug, trace},
};

/// Payload of `GET /`.
pub const GREETING: &str = "Hello World, I'm using Python and FastAPI 🐍";

/// Validates and shapes every request the service accepts.
///
/// Cheap to copy; the only configuration is the set of format checks.
#[derive(Debug, Clone, Copy, Default)]
pub struct RequestValidator {
    formats: FormatCheckers,
}

impl RequestValidator {
    /// Create a validator with the default format checks.
    pub fn new() -> Self {
        Self::default()
    }

    /// Use custom format capabilities instead of the library defaults.
    pub fn with_formats(formats: FormatCheckers) -> Self {
        Self { formats }
    }

    /// The fixed greeting. There is nothing to validate.
    pub fn validate_home(&self) -> Greeting {
        Greeting {
            message: GREETING.to_string(),
        }
    }

    /// Validate a Person body and echo it back.
    ///
    /// # Returns
    ///
    /// The Person with lax scalars converted (`"23"` becomes `23`), or every
    /// violation found in the body.
    pub fn validate_create_person(&self, body: &Value) -> Result<Person, ValidationFailure> {
        let mut violations = Vec::new();
        let shaped = check_object(PERSON_RULES, body, &loc(&["body"]), &self.formats, &mut violations);
        self.finish(&shaped, loc(&["body"]), violations)
    }

    /// Validate the `name` and `age` query parameters.
    pub fn validate_show_person(
        &self,
        name: Option<&str>,
        age: Option<&str>,
    ) -> Result<PersonDetailQuery, ValidationFailure> {
        let mut params = HashMap::new();
        if let Some(name) = name {
            params.insert("name".to_string(), name.to_string());
        }
        if let Some(age) = age {
            params.insert("age".to_string(), age.to_string());
        }
        self.validate_detail_query(&params)
    }

    /// Same as [`Self::validate_show_person`], straight from a decoded query map.
    pub fn validate_detail_query(
        &self,
        params: &HashMap<String, String>,
    ) -> Result<PersonDetailQuery, ValidationFailure> {
        let mut violations = Vec::new();
        let shaped = check_params(DETAIL_QUERY_RULES, params, "query", &self.formats, &mut violations);
        self.finish(&shaped, loc(&["query"]), violations)
    }

    /// Validate the `{person_id}` path segment of `GET /person/detail/{person_id}`.
    pub fn validate_person_detail(&self, person_id: &str) -> Result<PersonIdPath, ValidationFailure> {
        let mut violations = Vec::new();
        let person_id = self.check_person_id(person_id, &mut violations);
        ValidationFailure::from_violations(violations).into_result(PersonIdPath { person_id })
    }

    /// Validate the path id and both bodies independently, reporting the
    /// union of their violations.
    pub fn validate_update_person(
        &self,
        person_id: &str,
        person: Option<&Value>,
        location: Option<&Value>,
    ) -> Result<PersonUpdate, ValidationFailure> {
        let mut violations = Vec::new();
        let person_id = self.check_person_id(person_id, &mut violations);

        let person_loc = loc(&["body", "person"]);
        let location_loc = loc(&["body", "location"]);
        let person = check_embedded(PERSON_RULES, person, &person_loc, &self.formats, &mut violations);
        let location =
            check_embedded(LOCATION_RULES, location, &location_loc, &self.formats, &mut violations);

        if !violations.is_empty() {
            return Err(ValidationFailure::from_violations(violations));
        }

        // Both bodies were checked present above.
        let (Some(person), Some(location)) = (person, location) else {
            return Err(Violation::missing(loc(&["body"])).into());
        };
        Ok(PersonUpdate {
            person_id,
            person: shape(&person, person_loc)?,
            location: shape(&location, location_loc)?,
        })
    }

    /// Split an embedded `{"person": .., "location": ..}` body and validate it.
    pub fn validate_update_request(
        &self,
        person_id: &str,
        body: &Value,
    ) -> Result<PersonUpdate, ValidationFailure> {
        let Some(object) = body.as_object() else {
            let mut violations = Vec::new();
            self.check_person_id(person_id, &mut violations);
            violations.push(Violation::malformed(
                loc(&["body"]),
                "type_error.dict",
                "value is not a valid dict",
            ));
            return Err(ValidationFailure::from_violations(violations));
        };
        self.validate_update_person(person_id, object.get("person"), object.get("location"))
    }

    /// Decode a raw request body.
    ///
    /// An empty body counts as a missing required body; undecodable bytes are
    /// malformed input.
    pub fn parse_body(&self, raw: &[u8]) -> Result<Value, ValidationFailure> {
        if raw.iter().all(u8::is_ascii_whitespace) {
            return Err(Violation::missing(loc(&["body"])).into());
        }
        serde_json::from_slice(raw).map_err(|e| {
            debug!(error = %e, "Request body is not valid JSON");
            Violation::malformed(loc(&["body"]), "value_error.jsondecode", e.to_string())
                .with_ctx(serde_json::json!({ "line": e.line(), "column": e.column() }))
                .into()
        })
    }

    fn check_person_id(&self, raw: &str, violations: &mut Vec<Violation>) -> i64 {
        let value = coerce_param(&PERSON_ID_RULE, raw);
        check_field(
            &PERSON_ID_RULE,
            Some(&value),
            loc(&["path", PERSON_ID_RULE.name]),
            &self.formats,
            violations,
        );
        value.as_i64().unwrap_or_default()
    }

    fn finish<T: DeserializeOwned>(
        &self,
        value: &Value,
        at: Loc,
        violations: Vec<Violation>,
    ) -> Result<T, ValidationFailure> {
        if !violations.is_empty() {
            trace!(count = violations.len(), "Collected violations");
            return Err(ValidationFailure::from_violations(violations));
        }
        shape(value, at)
    }
}

/// Check one embedded body, returning its coerced form when present.
fn check_embedded(
    rules: &[FieldRule],
    value: Option<&Value>,
    at: &Loc,
    formats: &FormatCheckers,
    violations: &mut Vec<Violation>,
) -> Option<Value> {
    match value {
        Some(value) => Some(check_object(rules, value, at, formats, violations)),
        None => {
            violations.push(Violation::missing(at.clone()));
            None
        }
    }
}

/// Build the typed model from a value that already passed its rule table.
fn shape<T: DeserializeOwned>(value: &Value, at: Loc) -> Result<T, ValidationFailure> {
    serde_json::from_value(value.clone())
        .map_err(|e| Violation::malformed(at, "type_error", e.to_string()).into())
}
