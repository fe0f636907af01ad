//! Person Service Tests
//!
//! Route-level tests driven through `warp::test`, without binding a socket.


#[cfg(test)]
pub(crate) mod support {
    use crate::config::RequestLimits;
    use crate::health::HealthChecker;
    use crate::http::person_routes;
    use crate::validator::RequestValidator;
    use serde_json::{json, Value};
    use std::sync::Arc;
    use warp::{Filter, Reply};

    pub fn routes() -> impl Filter<Extract = impl Reply, Error = std::convert::Infallible> + Clone {
        routes_with_limits(RequestLimits::default())
    }

    pub fn routes_with_limits(
        limits: RequestLimits,
    ) -> impl Filter<Extract = impl Reply, Error = std::convert::Infallible> + Clone {
        person_routes(
            RequestValidator::new(),
            limits,
            Arc::new(HealthChecker::new("person-service-test", "0.0.0-test")),
        )
    }

    pub fn valid_person() -> Value {
        json!({
            "first_name": "Facundo",
            "last_name": "García Martoni",
            "age": 23,
            "hair_color": "black",
            "is_married": false,
            "email": "facundo@example.com",
            "payment_card_number": "4111111111111111",
            "favorite_color": "rebeccapurple"
        })
    }

    pub fn valid_location() -> Value {
        json!({
            "city": "Buenos Aires",
            "state": "Buenos Aires",
            "country": "Argentina"
        })
    }

    pub fn body_json(response: &warp::http::Response<warp::hyper::body::Bytes>) -> Value {
        serde_json::from_slice(response.body()).expect("response body is JSON")
    }

    /// `loc` entries of every reported violation, joined with dots.
    pub fn violation_paths(body: &Value) -> Vec<String> {
        body["detail"]
            .as_array()
            .expect("detail is a list")
            .iter()
            .map(|v| {
                v["loc"]
                    .as_array()
                    .expect("loc is a list")
                    .iter()
                    .map(|s| s.as_str().unwrap_or_default().to_string())
                    .collect::<Vec<_>>()
                    .join(".")
            })
            .collect()
    }
}
