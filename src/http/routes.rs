//! Person Routes
//!
//! Warp filters for every endpoint. Filters only extract raw strings and
//! bytes; all checking happens in [`RequestValidator`], and both outcomes are
//! turned into replies here.

use {
    super::response::{create_error_response, ResponseBuilder},
    crate::config::RequestLimits,
    crate::error::{ApiError, ValidationFailure},
    crate::health::HealthChecker,
    crate::logging,
    crate::models::model_schemas,
    crate::validator::RequestValidator,
    futures_util::{Stream, StreamExt},
    serde::Serialize,
    std::{collections::HashMap, convert::Infallible, sync::Arc, time::Instant},
    warp::{
        http::StatusCode,
        hyper::body::{Buf, Bytes},
        reject::Reject,
        reply::Response,
        Filter, Rejection, Reply,
    },
};

/// The body, declared or actually read, exceeds `max_body_size`.
#[derive(Debug)]
pub struct BodyTooLarge {
    pub limit: u64,
}

impl Reject for BodyTooLarge {}

/// The connection failed while the body was being read.
#[derive(Debug)]
pub struct BodyReadFailed;

impl Reject for BodyReadFailed {}

/// All service routes with rejections rendered as JSON.
pub fn person_routes(
    validator: RequestValidator,
    limits: RequestLimits,
    health: Arc<HealthChecker>,
) -> impl Filter<Extract = impl Reply, Error = Infallible> + Clone {
    let home = warp::path::end()
        .and(warp::get())
        .and(with_validator(validator))
        .and_then(handle_home);

    let create = warp::path!("person" / "new")
        .and(warp::post())
        .and(raw_body(limits))
        .and(with_validator(validator))
        .and_then(handle_create_person);

    let show = warp::path!("person" / "detail")
        .and(warp::get())
        .and(warp::query::<HashMap<String, String>>())
        .and(with_validator(validator))
        .and_then(handle_show_person);

    let detail = warp::path!("person" / "detail" / String)
        .and(warp::get())
        .and(with_validator(validator))
        .and_then(handle_person_detail);

    let update = warp::path!("person" / String)
        .and(warp::put())
        .and(raw_body(limits))
        .and(with_validator(validator))
        .and_then(handle_update_person);

    let health_route = warp::path!("health")
        .and(warp::get())
        .and(warp::any().map(move || health.clone()))
        .map(|health: Arc<HealthChecker>| ResponseBuilder::new().json(&health.get_json_status()));

    let schemas = warp::path!("schemas")
        .and(warp::get())
        .map(|| ResponseBuilder::new().json(&model_schemas()));

    home.or(create)
        .or(show)
        .or(detail)
        .or(update)
        .or(health_route)
        .or(schemas)
        .recover(handle_rejection)
}

fn with_validator(
    validator: RequestValidator,
) -> impl Filter<Extract = (RequestValidator,), Error = Infallible> + Clone {
    warp::any().map(move || validator)
}

/// The raw request body, capped at `max_body_size`.
///
/// A declared `Content-Length` over the limit is refused before reading.
/// Bodies without one (empty or chunked) are read up to the limit, so a
/// missing body reaches the validator and is reported there.
fn raw_body(limits: RequestLimits) -> impl Filter<Extract = (Bytes,), Error = Rejection> + Clone {
    let limit = limits.max_body_size;
    warp::header::optional::<u64>("content-length")
        .and_then(move |declared: Option<u64>| async move {
            match declared {
                Some(length) if length > limit => Err(warp::reject::custom(BodyTooLarge { limit })),
                _ => Ok(()),
            }
        })
        .untuple_one()
        .and(warp::body::stream())
        .and_then(move |stream| read_limited(stream, limit))
}

async fn read_limited<S, B>(stream: S, limit: u64) -> Result<Bytes, Rejection>
where
    S: Stream<Item = Result<B, warp::Error>>,
    B: Buf,
{
    futures_util::pin_mut!(stream);
    let mut body = Vec::new();
    while let Some(chunk) = stream.next().await {
        let mut chunk = chunk.map_err(|e| {
            tracing::debug!(error = %e, "Failed to read request body");
            warp::reject::custom(BodyReadFailed)
        })?;
        if (body.len() + chunk.remaining()) as u64 > limit {
            return Err(warp::reject::custom(BodyTooLarge { limit }));
        }
        while chunk.has_remaining() {
            let bytes = chunk.chunk();
            let read = bytes.len();
            body.extend_from_slice(bytes);
            chunk.advance(read);
        }
    }
    Ok(Bytes::from(body))
}

/// Run one validation inside a request span and render its outcome.
fn respond<T: Serialize>(
    method: &str,
    route: &str,
    validate: impl FnOnce() -> Result<T, ValidationFailure>,
) -> Response {
    let request_id = logging::generate_request_id();
    let span = logging::request_span(method, route, &request_id);
    let _guard = span.enter();

    let start = Instant::now();
    logging::log_request_received(route);
    let builder = ResponseBuilder::new().with_request_id(&request_id);

    match validate() {
        Ok(shaped) => {
            logging::log_request_validated(route, start.elapsed());
            builder.json(&shaped)
        }
        Err(failure) => {
            logging::log_validation_failure(route, &failure, start.elapsed());
            builder.build_error(&ApiError::from(failure))
        }
    }
}

async fn handle_home(validator: RequestValidator) -> Result<Response, Rejection> {
    Ok(respond("GET", "/", || Ok(validator.validate_home())))
}

async fn handle_create_person(body: Bytes, validator: RequestValidator) -> Result<Response, Rejection> {
    Ok(respond("POST", "/person/new", || {
        let body = validator.parse_body(&body)?;
        validator.validate_create_person(&body)
    }))
}

async fn handle_show_person(
    query: HashMap<String, String>,
    validator: RequestValidator,
) -> Result<Response, Rejection> {
    Ok(respond("GET", "/person/detail", || {
        validator.validate_detail_query(&query)
    }))
}

async fn handle_person_detail(
    person_id: String,
    validator: RequestValidator,
) -> Result<Response, Rejection> {
    Ok(respond("GET", "/person/detail/{person_id}", || {
        validator.validate_person_detail(&person_id)
    }))
}

async fn handle_update_person(
    person_id: String,
    body: Bytes,
    validator: RequestValidator,
) -> Result<Response, Rejection> {
    Ok(respond("PUT", "/person/{person_id}", || {
        match validator.parse_body(&body) {
            Ok(body) => validator.validate_update_request(&person_id, &body),
            Err(body_failure) => {
                // A broken body must not hide a bad path parameter.
                let mut failure = validator
                    .validate_person_detail(&person_id)
                    .err()
                    .unwrap_or_default();
                failure.extend(body_failure);
                Err(failure)
            }
        }
    }))
}

/// Render routing rejections as `{"detail": ..}` JSON.
pub async fn handle_rejection(err: Rejection) -> Result<Response, Infallible> {
    // Body and query problems outrank the method mismatches other routes
    // report for the same path.
    let (status, detail) = if err.find::<BodyTooLarge>().is_some() {
        (StatusCode::PAYLOAD_TOO_LARGE, "Request body too large")
    } else if err.find::<BodyReadFailed>().is_some() {
        (StatusCode::BAD_REQUEST, "Could not read request body")
    } else if err.find::<warp::reject::InvalidHeader>().is_some() {
        (StatusCode::BAD_REQUEST, "Invalid Content-Length header")
    } else if err.find::<warp::reject::InvalidQuery>().is_some() {
        (StatusCode::BAD_REQUEST, "Invalid query string")
    } else if err.find::<warp::reject::MethodNotAllowed>().is_some() {
        (StatusCode::METHOD_NOT_ALLOWED, "Method Not Allowed")
    } else if err.is_not_found() {
        (StatusCode::NOT_FOUND, "Not Found")
    } else {
        tracing::error!(rejection = ?err, "Unhandled rejection");
        let error = ApiError::Internal("unhandled rejection".to_string());
        logging::log_rejection(error.status_code().as_u16(), &error.to_string());
        return Ok(ResponseBuilder::new().build_error(&error));
    };

    logging::log_rejection(status.as_u16(), detail);
    Ok(create_error_response(status, detail))
}
