//! In-memory stand-in for one platform service (`/v2.0/networks`).
//!
//! Behaves like the real services where the client core cares: every route
//! wants an `X-Auth-Token`, listings page with `limit`/`marker` and publish
//! `networks_links`, and errors come back in the inconsistent body shapes the
//! platform is known for. Two extra routes misbehave on purpose:
//! `/v2.0/looping` always links to itself, `/v2.0/maintenance` answers 503
//! with plain text.

use std::sync::Arc;

use axum::{
    extract::{Path, Query, Request, State},
    http::{header, StatusCode},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tokio::{net::TcpListener, sync::RwLock};
use uuid::Uuid;

pub const AUTH_HEADER: &str = "x-auth-token";

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Network {
    pub id: Uuid,
    pub name: String,
    pub admin_state_up: bool,
    pub status: String,
    pub description: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct ListParams {
    pub limit: Option<usize>,
    pub marker: Option<Uuid>,
    pub name: Option<String>,
}

pub type Db = Arc<RwLock<Vec<Network>>>;

pub fn app() -> Router {
    let db: Db = Arc::new(RwLock::new(Vec::new()));
    Router::new()
        .route("/v2.0/networks", get(list_networks).post(create_network))
        .route(
            "/v2.0/networks/{id}",
            get(get_network).put(update_network).delete(delete_network),
        )
        .route("/v2.0/looping", get(looping))
        .route("/v2.0/maintenance", get(maintenance))
        .layer(middleware::from_fn(require_token))
        .with_state(db)
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    axum::serve(listener, app()).await
}

async fn require_token(request: Request, next: Next) -> Response {
    let authorized = request
        .headers()
        .get(AUTH_HEADER)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|token| !token.is_empty());
    if !authorized {
        return (StatusCode::UNAUTHORIZED, Json(json!("Authentication required"))).into_response();
    }
    next.run(request).await
}

fn not_found(id: Uuid) -> Response {
    (
        StatusCode::NOT_FOUND,
        Json(json!({"message": format!("Network {id} could not be found.")})),
    )
        .into_response()
}

fn bad_request(cause: &str) -> Response {
    (StatusCode::BAD_REQUEST, Json(json!({"cause": cause}))).into_response()
}

fn conflict(name: &str) -> Response {
    (
        StatusCode::CONFLICT,
        Json(json!({"errors": [{
            "errorCode": "NET-0409",
            "errorMessage": format!("Network name {name} is already in use."),
        }]})),
    )
        .into_response()
}

/// The `{"network": {...}}` object of a request body.
fn network_fields(body: &Value) -> Result<&serde_json::Map<String, Value>, Response> {
    body.get("network")
        .and_then(Value::as_object)
        .ok_or_else(|| bad_request("request body must contain a network object"))
}

async fn list_networks(State(db): State<Db>, Query(params): Query<ListParams>) -> Response {
    let networks = db.read().await;
    let filtered: Vec<&Network> = networks
        .iter()
        .filter(|n| params.name.as_ref().map_or(true, |name| &n.name == name))
        .collect();

    let start = match params.marker {
        None => 0,
        Some(marker) => match filtered.iter().position(|n| n.id == marker) {
            Some(index) => index + 1,
            None => return bad_request(&format!("marker {marker} not found")),
        },
    };
    let remaining = &filtered[start..];
    let limit = params.limit.unwrap_or(remaining.len()).max(1);
    let page: Vec<&Network> = remaining.iter().take(limit).copied().collect();

    let mut links = Vec::new();
    if remaining.len() > page.len() {
        if let Some(last) = page.last() {
            let href = next_href(limit, last.id, params.name.as_deref());
            links.push(json!({"rel": "next", "href": href}));
        }
    }

    Json(json!({"networks": page, "networks_links": links})).into_response()
}

async fn create_network(State(db): State<Db>, Json(body): Json<Value>) -> Response {
    let fields = match network_fields(&body) {
        Ok(fields) => fields,
        Err(response) => return response,
    };
    let Some(name) = fields.get("name").and_then(Value::as_str) else {
        return bad_request("name is required");
    };

    let mut networks = db.write().await;
    if networks.iter().any(|n| n.name == name) {
        return conflict(name);
    }
    let network = Network {
        id: Uuid::new_v4(),
        name: name.to_string(),
        admin_state_up: fields
            .get("admin_state_up")
            .and_then(Value::as_bool)
            .unwrap_or(true),
        status: "ACTIVE".to_string(),
        description: fields
            .get("description")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string(),
    };
    networks.push(network.clone());
    (StatusCode::CREATED, Json(json!({"network": network}))).into_response()
}

async fn get_network(State(db): State<Db>, Path(id): Path<Uuid>) -> Response {
    let networks = db.read().await;
    match networks.iter().find(|n| n.id == id) {
        Some(network) => Json(json!({"network": network})).into_response(),
        None => not_found(id),
    }
}

async fn update_network(
    State(db): State<Db>,
    Path(id): Path<Uuid>,
    Json(body): Json<Value>,
) -> Response {
    let fields = match network_fields(&body) {
        Ok(fields) => fields,
        Err(response) => return response,
    };

    let mut networks = db.write().await;
    if let Some(name) = fields.get("name").and_then(Value::as_str) {
        if networks.iter().any(|n| n.name == name && n.id != id) {
            return conflict(name);
        }
    }
    let Some(network) = networks.iter_mut().find(|n| n.id == id) else {
        return not_found(id);
    };
    if let Some(name) = fields.get("name").and_then(Value::as_str) {
        network.name = name.to_string();
    }
    if let Some(up) = fields.get("admin_state_up").and_then(Value::as_bool) {
        network.admin_state_up = up;
    }
    if let Some(description) = fields.get("description").and_then(Value::as_str) {
        network.description = description.to_string();
    }
    Json(json!({"network": network})).into_response()
}

async fn delete_network(State(db): State<Db>, Path(id): Path<Uuid>) -> Response {
    let mut networks = db.write().await;
    match networks.iter().position(|n| n.id == id) {
        Some(index) => {
            networks.remove(index);
            StatusCode::NO_CONTENT.into_response()
        }
        None => not_found(id),
    }
}

async fn looping() -> Json<Value> {
    Json(json!({
        "looping": [{"id": "loop"}],
        "looping_links": [{"rel": "next", "href": "/v2.0/looping?marker=loop"}],
    }))
}

async fn maintenance() -> Response {
    (
        StatusCode::SERVICE_UNAVAILABLE,
        [(header::CONTENT_TYPE, "text/plain")],
        "Service is down for maintenance",
    )
        .into_response()
}

fn next_href(limit: usize, marker: Uuid, name: Option<&str>) -> String {
    let mut query = url::form_urlencoded::Serializer::new(String::new());
    query
        .append_pair("limit", &limit.to_string())
        .append_pair("marker", &marker.to_string());
    if let Some(name) = name {
        query.append_pair("name", name);
    }
    format!("/v2.0/networks?{}", query.finish())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn network_serializes_to_json() {
        let network = Network {
            id: Uuid::nil(),
            name: "net1".to_string(),
            admin_state_up: true,
            status: "ACTIVE".to_string(),
            description: String::new(),
        };
        let json = serde_json::to_value(&network).unwrap();
        assert_eq!(json["id"], "00000000-0000-0000-0000-000000000000");
        assert_eq!(json["name"], "net1");
        assert_eq!(json["admin_state_up"], true);
    }

    #[test]
    fn list_params_are_all_optional() {
        let params: ListParams = serde_json::from_str("{}").unwrap();
        assert!(params.limit.is_none());
        assert!(params.marker.is_none());
        assert!(params.name.is_none());
    }

    #[test]
    fn network_fields_requires_wrapper_object() {
        assert!(network_fields(&json!({"name": "flat"})).is_err());
        assert!(network_fields(&json!({"network": {"name": "a"}})).is_ok());
    }

    #[test]
    fn next_href_encodes_name_filter() {
        assert_eq!(
            next_href(2, Uuid::nil(), Some("a b&c")),
            "/v2.0/networks?limit=2&marker=00000000-0000-0000-0000-000000000000&name=a+b%26c"
        );
        assert_eq!(
            next_href(1, Uuid::nil(), None),
            "/v2.0/networks?limit=1&marker=00000000-0000-0000-0000-000000000000"
        );
    }
}
