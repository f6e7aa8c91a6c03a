use axum::{
    Json, Router,
    body::Body,
    extract::{
        Query, State,
        rejection::{JsonRejection, QueryRejection},
    },
    http::{HeaderValue, StatusCode, header::VARY},
    middleware,
    response::Response,
    routing::post,
};
use serde::Deserialize;

use crate::gateway::{Gateway, GraphRequest, GraphResponse};

pub const GRAPHQL_PATH: &str = "/graphql";

/// Build the HTTP router: `POST`, `GET` and `OPTIONS` on `/graphql`, with
/// allow-all CORS headers on every response.
pub fn router(gateway: Gateway) -> Router {
    Router::new()
        .route(
            GRAPHQL_PATH,
            post(graphql_post).get(graphql_get).options(preflight),
        )
        .layer(middleware::map_response(with_cors_headers))
        .with_state(gateway)
}

async fn graphql_post(
    State(gateway): State<Gateway>,
    request: Result<Json<GraphRequest>, JsonRejection>,
) -> Json<GraphResponse> {
    match request {
        Ok(Json(request)) => Json(gateway.execute(request).await),
        Err(rejection) => Json(gateway.malformed(format!("invalid request body: {rejection}"))),
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct GetParams {
    operation_name: String,
    #[serde(default)]
    variables: Option<String>,
}

async fn graphql_get(
    State(gateway): State<Gateway>,
    params: Result<Query<GetParams>, QueryRejection>,
) -> Json<GraphResponse> {
    let Query(params) = match params {
        Ok(params) => params,
        Err(rejection) => {
            return Json(gateway.malformed(format!("invalid query string: {rejection}")));
        }
    };
    let variables = match params.variables.as_deref() {
        None | Some("") => None,
        Some(raw) => match serde_json::from_str(raw) {
            Ok(vars) => Some(vars),
            Err(e) => return Json(gateway.malformed(format!("invalid variables: {e}"))),
        },
    };
    let request = GraphRequest {
        operation_name: params.operation_name,
        variables,
    };
    Json(gateway.execute_query(request).await)
}

async fn preflight() -> StatusCode {
    StatusCode::NO_CONTENT
}

async fn with_cors_headers(mut resp: Response<Body>) -> Response<Body> {
    let headers = resp.headers_mut();
    headers.insert("Access-Control-Allow-Origin", HeaderValue::from_static("*"));
    headers.insert(
        "Access-Control-Allow-Methods",
        HeaderValue::from_static("GET,POST,OPTIONS"),
    );
    headers.insert(
        "Access-Control-Allow-Headers",
        HeaderValue::from_static("*"),
    );
    headers.append(VARY, HeaderValue::from_static("Origin"));
    resp
}
