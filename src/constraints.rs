//! Declarative field constraints
//!
//! Every model the service accepts is described by a static table of
//! [`FieldRule`]s. A single generic routine interprets those tables against
//! raw JSON values (bodies) or raw strings (query and path parameters) and
//! collects every violation it finds.

use {
    crate::error::{Loc, Violation},
    crate::formats::{Format, FormatCheckers},
    crate::models::HAIR_COLORS,
    serde_json::{json, Map, Value},
    std::collections::HashMap,
};

/// A rule attached to a single field value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Constraint {
    /// Text whose length in characters lies in `[min_len, max_len]`.
    Text { min_len: usize, max_len: usize },
    /// Integer with an optional exclusive lower bound and inclusive upper bound.
    Integer { gt: Option<i64>, le: Option<i64> },
    Boolean,
    /// Exact, case-sensitive membership in a literal set.
    OneOf(&'static [&'static str]),
    /// Text accepted by a pluggable format check.
    Format(Format),
}

/// A named field, whether it must be present, and the rule its value obeys.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldRule {
    pub name: &'static str,
    pub required: bool,
    pub constraint: Constraint,
}

impl FieldRule {
    /// Create a rule for a field that must be present and non-null.
    pub const fn required(name: &'static str, constraint: Constraint) -> Self {
        Self {
            name,
            required: true,
            constraint,
        }
    }

    /// Create a rule for a field that may be absent or `null`.
    pub const fn optional(name: &'static str, constraint: Constraint) -> Self {
        Self {
            name,
            required: false,
            constraint,
        }
    }
}

const NAME: Constraint = Constraint::Text {
    min_len: 1,
    max_len: 50,
};

const PLACE: Constraint = Constraint::Text {
    min_len: 1,
    max_len: 75,
};

const POSITIVE: Constraint = Constraint::Integer {
    gt: Some(0),
    le: None,
};

/// Fields of a Person body, in reporting order.
pub const PERSON_RULES: &[FieldRule] = &[
    FieldRule::required("first_name", NAME),
    FieldRule::required("last_name", NAME),
    FieldRule::required(
        "age",
        Constraint::Integer {
            gt: Some(0),
            le: Some(115),
        },
    ),
    FieldRule::optional("hair_color", Constraint::OneOf(HAIR_COLORS)),
    FieldRule::optional("is_married", Constraint::Boolean),
    FieldRule::required("email", Constraint::Format(Format::Email)),
    FieldRule::required("payment_card_number", Constraint::Format(Format::PaymentCard)),
    FieldRule::optional("favorite_color", Constraint::Format(Format::Color)),
];

/// Fields of a Location body.
pub const LOCATION_RULES: &[FieldRule] = &[
    FieldRule::required("city", PLACE),
    FieldRule::required("state", PLACE),
    FieldRule::required("country", PLACE),
];

/// Query parameters of `GET /person/detail`.
pub const DETAIL_QUERY_RULES: &[FieldRule] = &[
    FieldRule::optional("name", NAME),
    FieldRule::required("age", POSITIVE),
];

/// The `{person_id}` path segment.
pub const PERSON_ID_RULE: FieldRule = FieldRule::required("person_id", POSITIVE);

fn child(prefix: &[String], name: &str) -> Loc {
    let mut loc = prefix.to_vec();
    loc.push(name.to_string());
    loc
}

/// Check one value against one rule. `None` means the field was absent.
pub fn check_field(
    rule: &FieldRule,
    value: Option<&Value>,
    loc: Loc,
    formats: &FormatCheckers,
    out: &mut Vec<Violation>,
) {
    let value = match value {
        None if rule.required => {
            out.push(Violation::missing(loc));
            return;
        }
        None => return,
        Some(Value::Null) if rule.required => {
            out.push(Violation::constraint(
                loc,
                "type_error.none.not_allowed",
                "none is not an allowed value",
            ));
            return;
        }
        Some(Value::Null) => return,
        Some(value) => value,
    };

    match rule.constraint {
        Constraint::Text { min_len, max_len } => {
            let Some(text) = value.as_str() else {
                out.push(Violation::constraint(loc, "type_error.str", "str type expected"));
                return;
            };
            let len = text.chars().count();
            if len < min_len {
                out.push(
                    Violation::constraint(
                        loc,
                        "value_error.any_str.min_length",
                        format!("ensure this value has at least {min_len} characters"),
                    )
                    .with_ctx(json!({ "limit_value": min_len })),
                );
            } else if len > max_len {
                out.push(
                    Violation::constraint(
                        loc,
                        "value_error.any_str.max_length",
                        format!("ensure this value has at most {max_len} characters"),
                    )
                    .with_ctx(json!({ "limit_value": max_len })),
                );
            }
        }
        Constraint::Integer { gt, le } => {
            let Some(number) = value.as_i64() else {
                out.push(Violation::constraint(
                    loc,
                    "type_error.integer",
                    "value is not a valid integer",
                ));
                return;
            };
            match (gt, le) {
                (Some(bound), _) if number <= bound => out.push(
                    Violation::constraint(
                        loc,
                        "value_error.number.not_gt",
                        format!("ensure this value is greater than {bound}"),
                    )
                    .with_ctx(json!({ "limit_value": bound })),
                ),
                (_, Some(bound)) if number > bound => out.push(
                    Violation::constraint(
                        loc,
                        "value_error.number.not_le",
                        format!("ensure this value is less than or equal to {bound}"),
                    )
                    .with_ctx(json!({ "limit_value": bound })),
                ),
                _ => {}
            }
        }
        Constraint::Boolean => {
            if !value.is_boolean() {
                out.push(Violation::constraint(
                    loc,
                    "type_error.bool",
                    "value could not be parsed to a boolean",
                ));
            }
        }
        Constraint::OneOf(allowed) => {
            let accepted = value.as_str().is_some_and(|s| allowed.contains(&s));
            if !accepted {
                let permitted = allowed
                    .iter()
                    .map(|v| format!("'{v}'"))
                    .collect::<Vec<_>>()
                    .join(", ");
                out.push(
                    Violation::constraint(
                        loc,
                        "type_error.enum",
                        format!("value is not a valid enumeration member; permitted: {permitted}"),
                    )
                    .with_ctx(json!({ "enum_values": allowed })),
                );
            }
        }
        Constraint::Format(format) => {
            let Some(text) = value.as_str() else {
                out.push(Violation::constraint(loc, "type_error.str", "str type expected"));
                return;
            };
            if !formats.check(format, text) {
                out.push(Violation::format(loc, format.error_code(), format.error_message()));
            }
        }
    }
}

/// Check a JSON value that should be an object against a rule table.
///
/// Unknown keys are ignored. A non-object value is reported once at `prefix`.
///
/// # Returns
///
/// The object with every ruled field replaced by its coerced form (see
/// [`coerce_value`]), ready for shaping once no violation was collected.
pub fn check_object(
    rules: &[FieldRule],
    value: &Value,
    prefix: &[String],
    formats: &FormatCheckers,
    out: &mut Vec<Violation>,
) -> Value {
    let Some(object) = value.as_object() else {
        out.push(Violation::malformed(
            prefix.to_vec(),
            "type_error.dict",
            "value is not a valid dict",
        ));
        return value.clone();
    };
    check_map(rules, object, prefix, formats, out)
}

fn check_map(
    rules: &[FieldRule],
    object: &Map<String, Value>,
    prefix: &[String],
    formats: &FormatCheckers,
    out: &mut Vec<Violation>,
) -> Value {
    let mut shaped = object.clone();
    for rule in rules {
        let value = object.get(rule.name).map(|value| coerce_value(rule, value));
        check_field(rule, value.as_ref(), child(prefix, rule.name), formats, out);
        if let Some(value) = value {
            shaped.insert(rule.name.to_string(), value);
        }
    }
    Value::Object(shaped)
}

/// Lax conversion of a JSON body value towards the type its rule expects.
///
/// Numeric strings and integral floats become integers; boolean words and
/// `0`/`1` become booleans. Text, enumerations and formats are left alone.
/// Anything that does not convert is returned as is so [`check_field`]
/// reports the type error.
pub fn coerce_value(rule: &FieldRule, value: &Value) -> Value {
    match (rule.constraint, value) {
        (Constraint::Integer { .. } | Constraint::Boolean, Value::String(raw)) => {
            coerce_param(rule, raw)
        }
        (Constraint::Integer { .. }, Value::Number(number)) if number.as_i64().is_none() => number
            .as_f64()
            .filter(|f| f.fract() == 0.0 && *f >= i64::MIN as f64 && *f < i64::MAX as f64)
            .map(|f| Value::from(f as i64))
            .unwrap_or_else(|| value.clone()),
        (Constraint::Boolean, Value::Number(number)) => match number.as_i64() {
            Some(0) => Value::Bool(false),
            Some(1) => Value::Bool(true),
            _ => value.clone(),
        },
        _ => value.clone(),
    }
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "true" | "t" | "1" | "yes" | "y" | "on" => Some(true),
        "false" | "f" | "0" | "no" | "n" | "off" => Some(false),
        _ => None,
    }
}

/// Turn a raw query or path string into the JSON value its rule expects.
///
/// Strings that cannot be read as the rule's type are kept as strings so the
/// regular check reports the type error.
pub fn coerce_param(rule: &FieldRule, raw: &str) -> Value {
    match rule.constraint {
        Constraint::Integer { .. } => raw
            .trim()
            .parse::<i64>()
            .map(Value::from)
            .unwrap_or_else(|_| Value::String(raw.to_string())),
        Constraint::Boolean => parse_bool(raw)
            .map(Value::Bool)
            .unwrap_or_else(|| Value::String(raw.to_string())),
        _ => Value::String(raw.to_string()),
    }
}

/// Check string parameters (query or path) against a rule table and return
/// them as a JSON object ready for shaping.
pub fn check_params(
    rules: &[FieldRule],
    params: &HashMap<String, String>,
    source: &str,
    formats: &FormatCheckers,
    out: &mut Vec<Violation>,
) -> Value {
    let prefix = vec![source.to_string()];
    let mut shaped = Map::new();
    for rule in rules {
        let value = params.get(rule.name).map(|raw| coerce_param(rule, raw));
        check_field(rule, value.as_ref(), child(&prefix, rule.name), formats, out);
        shaped.insert(rule.name.to_string(), value.unwrap_or(Value::Null));
    }
    Value::Object(shaped)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{loc, ViolationKind};

    fn run(rule: &FieldRule, value: Option<Value>) -> Vec<Violation> {
        let mut out = Vec::new();
        check_field(
            rule,
            value.as_ref(),
            loc(&["body", rule.name]),
            &FormatCheckers::default(),
            &mut out,
        );
        out
    }

    #[test]
    fn test_text_bounds_are_inclusive() {
        let rule = FieldRule::required("first_name", NAME);

        assert!(run(&rule, Some(json!("A"))).is_empty());
        assert!(run(&rule, Some(json!("x".repeat(50)))).is_empty());

        let too_short = run(&rule, Some(json!("")));
        assert_eq!(too_short[0].code, "value_error.any_str.min_length");
        assert_eq!(too_short[0].kind, ViolationKind::ConstraintViolation);

        let too_long = run(&rule, Some(json!("x".repeat(51))));
        assert_eq!(too_long[0].code, "value_error.any_str.max_length");
        assert_eq!(too_long[0].ctx, Some(json!({ "limit_value": 50 })));
    }

    #[test]
    fn test_text_length_counts_characters() {
        let rule = FieldRule::required("city", PLACE);
        assert!(run(&rule, Some(json!("é".repeat(75)))).is_empty());
    }

    #[test]
    fn test_integer_bounds() {
        let age = PERSON_RULES[2];
        assert_eq!(age.name, "age");

        assert!(run(&age, Some(json!(1))).is_empty());
        assert!(run(&age, Some(json!(115))).is_empty());
        assert_eq!(run(&age, Some(json!(0)))[0].code, "value_error.number.not_gt");
        assert_eq!(run(&age, Some(json!(-3)))[0].code, "value_error.number.not_gt");
        assert_eq!(run(&age, Some(json!(116)))[0].code, "value_error.number.not_le");
        assert_eq!(run(&age, Some(json!(23.5)))[0].code, "type_error.integer");
        assert_eq!(run(&age, Some(json!("23")))[0].code, "type_error.integer");
    }

    #[test]
    fn test_missing_and_null() {
        let required = FieldRule::required("email", Constraint::Format(Format::Email));
        let missing = run(&required, None);
        assert_eq!(missing[0].kind, ViolationKind::MissingRequiredField);
        assert_eq!(missing[0].loc, loc(&["body", "email"]));

        let null = run(&required, Some(Value::Null));
        assert_eq!(null[0].code, "type_error.none.not_allowed");

        let optional = FieldRule::optional("is_married", Constraint::Boolean);
        assert!(run(&optional, None).is_empty());
        assert!(run(&optional, Some(Value::Null)).is_empty());
    }

    #[test]
    fn test_enumeration_is_exact() {
        let rule = FieldRule::optional("hair_color", Constraint::OneOf(HAIR_COLORS));
        for color in HAIR_COLORS {
            assert!(run(&rule, Some(json!(color))).is_empty(), "{color} should be accepted");
        }
        for rejected in ["Red", "purple", "", " red"] {
            let out = run(&rule, Some(json!(rejected)));
            assert_eq!(out[0].code, "type_error.enum", "{rejected:?} should be rejected");
        }
        assert_eq!(run(&rule, Some(json!(3)))[0].code, "type_error.enum");
    }

    #[test]
    fn test_check_field_does_not_convert_types() {
        let rule = FieldRule::optional("is_married", Constraint::Boolean);
        assert!(run(&rule, Some(json!(false))).is_empty());
        assert_eq!(run(&rule, Some(json!("true")))[0].code, "type_error.bool");
    }

    #[test]
    fn test_check_object_coerces_lax_scalars() {
        let body = json!({
            "first_name": "Facundo",
            "last_name": "García",
            "age": "23",
            "is_married": "true",
            "email": "facundo@example.com",
            "payment_card_number": "4111111111111111"
        });

        let mut out = Vec::new();
        let shaped = check_object(PERSON_RULES, &body, &loc(&["body"]), &FormatCheckers::default(), &mut out);
        assert!(out.is_empty(), "{out:?}");
        assert_eq!(shaped["age"], json!(23));
        assert_eq!(shaped["is_married"], json!(true));
        assert_eq!(shaped["first_name"], "Facundo");
    }

    #[test]
    fn test_coerce_value() {
        let age = PERSON_RULES[2];
        let married = FieldRule::optional("is_married", Constraint::Boolean);
        let hair = FieldRule::optional("hair_color", Constraint::OneOf(HAIR_COLORS));

        assert_eq!(coerce_value(&age, &json!(" 42 ")), json!(42));
        assert_eq!(coerce_value(&age, &json!(42.0)), json!(42));
        assert_eq!(coerce_value(&age, &json!(42.5)), json!(42.5));
        assert_eq!(coerce_value(&age, &json!("forty")), json!("forty"));
        assert_eq!(coerce_value(&married, &json!("No")), json!(false));
        assert_eq!(coerce_value(&married, &json!(1)), json!(true));
        assert_eq!(coerce_value(&married, &json!(2)), json!(2));
        assert_eq!(coerce_value(&hair, &json!("Red")), json!("Red"));
    }

    #[test]
    fn test_format_checks_use_pluggable_functions() {
        let formats = FormatCheckers {
            email: |s: &str| s == "ok",
            ..FormatCheckers::default()
        };
        let rule = FieldRule::required("email", Constraint::Format(Format::Email));

        let mut out = Vec::new();
        check_field(&rule, Some(&json!("ok")), loc(&["body", "email"]), &formats, &mut out);
        assert!(out.is_empty());

        check_field(
            &rule,
            Some(&json!("someone@example.com")),
            loc(&["body", "email"]),
            &formats,
            &mut out,
        );
        assert_eq!(out[0].kind, ViolationKind::FormatViolation);
        assert_eq!(out[0].code, "value_error.email");
    }

    #[test]
    fn test_check_object_reports_every_field() {
        let mut out = Vec::new();
        check_object(
            LOCATION_RULES,
            &json!({ "city": "", "country": "x".repeat(76) }),
            &loc(&["body", "location"]),
            &FormatCheckers::default(),
            &mut out,
        );

        let paths: Vec<String> = out.iter().map(Violation::path).collect();
        assert_eq!(
            paths,
            vec!["body.location.city", "body.location.state", "body.location.country"]
        );
    }

    #[test]
    fn test_check_object_rejects_non_objects() {
        let mut out = Vec::new();
        check_object(
            PERSON_RULES,
            &json!([1, 2, 3]),
            &loc(&["body"]),
            &FormatCheckers::default(),
            &mut out,
        );
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].kind, ViolationKind::MalformedInput);
    }

    #[test]
    fn test_check_params_coerces_strings() {
        let mut params = HashMap::new();
        params.insert("age".to_string(), "23".to_string());

        let mut out = Vec::new();
        let shaped = check_params(
            DETAIL_QUERY_RULES,
            &params,
            "query",
            &FormatCheckers::default(),
            &mut out,
        );
        assert!(out.is_empty());
        assert_eq!(shaped, json!({ "name": null, "age": 23 }));

        params.insert("age".to_string(), "abc".to_string());
        params.insert("name".to_string(), String::new());
        let mut out = Vec::new();
        check_params(DETAIL_QUERY_RULES, &params, "query", &FormatCheckers::default(), &mut out);
        let codes: Vec<&str> = out.iter().map(|v| v.code.as_str()).collect();
        assert_eq!(codes, vec!["value_error.any_str.min_length", "type_error.integer"]);
    }

    #[test]
    fn test_coerce_param() {
        assert_eq!(coerce_param(&PERSON_ID_RULE, " 42 "), json!(42));
        assert_eq!(coerce_param(&PERSON_ID_RULE, "4x"), json!("4x"));
        let flag = FieldRule::optional("flag", Constraint::Boolean);
        assert_eq!(coerce_param(&flag, "Yes"), json!(true));
        assert_eq!(coerce_param(&flag, "off"), json!(false));
    }
}
