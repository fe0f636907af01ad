//! Request and response shapes
//!
//! These types are only ever built from input that already passed the
//! constraint tables in [`crate::constraints`]; the `schemars` attributes
//! mirror those tables for the published schemas.

use {
    schemars::JsonSchema,
    serde::{Deserialize, Serialize},
    serde_json::{json, Value},
};

/// Literal values accepted for `hair_color`, in declaration order.
pub const HAIR_COLORS: &[&str] = &["red", "blonde", "brown", "black", "white", "gray"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum HairColor {
    Red,
    Blonde,
    Brown,
    Black,
    White,
    Gray,
}

impl HairColor {
    pub const ALL: [HairColor; 6] = [
        HairColor::Red,
        HairColor::Blonde,
        HairColor::Brown,
        HairColor::Black,
        HairColor::White,
        HairColor::Gray,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            HairColor::Red => "red",
            HairColor::Blonde => "blonde",
            HairColor::Brown => "brown",
            HairColor::Black => "black",
            HairColor::White => "white",
            HairColor::Gray => "gray",
        }
    }
}

impl std::fmt::Display for HairColor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct Location {
    #[schemars(length(min = 1, max = 75))]
    pub city: String,
    #[schemars(length(min = 1, max = 75))]
    pub state: String,
    #[schemars(length(min = 1, max = 75))]
    pub country: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct Person {
    #[schemars(length(min = 1, max = 50))]
    pub first_name: String,
    #[schemars(length(min = 1, max = 50))]
    pub last_name: String,
    /// Strictly positive, at most 115.
    #[schemars(range(min = 1, max = 115))]
    pub age: i64,
    #[serde(default)]
    pub hair_color: Option<HairColor>,
    #[serde(default)]
    pub is_married: Option<bool>,
    pub email: String,
    /// Digits only, checksum-valid.
    pub payment_card_number: String,
    /// A CSS color name, hex value or `rgb()`/`hsl()` form, echoed as sent.
    #[serde(default)]
    pub favorite_color: Option<String>,
}

/// Query parameters of `GET /person/detail`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct PersonDetailQuery {
    #[serde(default)]
    #[schemars(length(min = 1, max = 50))]
    pub name: Option<String>,
    #[schemars(range(min = 1))]
    pub age: i64,
}

/// Path parameter of `GET /person/detail/{person_id}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct PersonIdPath {
    #[schemars(range(min = 1))]
    pub person_id: i64,
}

/// Response of `PUT /person/{person_id}`.
///
/// The person key is serialized as `"person:"`, trailing colon included;
/// clients of the service depend on it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersonUpdate {
    pub person_id: i64,
    #[serde(rename = "person:")]
    pub person: Person,
    pub location: Location,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Greeting {
    pub message: String,
}

/// JSON Schemas of the body models and parameter sets, keyed by model name.
pub fn model_schemas() -> Value {
    json!({
        "Person": schemars::schema_for!(Person),
        "Location": schemars::schema_for!(Location),
        "PersonDetailQuery": schemars::schema_for!(PersonDetailQuery),
        "PersonIdPath": schemars::schema_for!(PersonIdPath),
    })
}
