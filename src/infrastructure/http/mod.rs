//! HTTP admin API routes

mod import_routes;
mod suggestion_routes;
mod world_routes;

use axum::{
    http::StatusCode,
    routing::{get, post},
    Router,
};
use std::sync::Arc;

use crate::domain::errors::WorldError;
use crate::infrastructure::state::AppState;

/// Map a service error to a status code and message
pub(crate) fn error_response(err: WorldError) -> (StatusCode, String) {
    let status = match &err {
        WorldError::NotFound(_) => StatusCode::NOT_FOUND,
        WorldError::AlreadyExists(_) | WorldError::InvalidState { .. } => StatusCode::CONFLICT,
        WorldError::ValidationFailure(_) => StatusCode::UNPROCESSABLE_ENTITY,
        WorldError::InvalidName(_) | WorldError::InvalidCategory { .. } => StatusCode::BAD_REQUEST,
        WorldError::RemoteApi(_) => StatusCode::BAD_GATEWAY,
        WorldError::RemoteNotConfigured => StatusCode::SERVICE_UNAVAILABLE,
        WorldError::Io(_) | WorldError::RegistryUnavailable => {
            tracing::error!(error = %err, "Request failed");
            StatusCode::INTERNAL_SERVER_ERROR
        }
    };
    (status, err.to_string())
}

/// Create all API routes
pub fn create_routes() -> Router<Arc<AppState>> {
    Router::new()
        // World routes
        .route(
            "/api/worlds",
            get(world_routes::list_worlds).post(world_routes::create_world),
        )
        .route(
            "/api/worlds/{name}",
            get(world_routes::get_world).delete(world_routes::delete_world),
        )
        .route("/api/worlds/{name}/exists", get(world_routes::world_exists))
        .route("/api/worlds/{name}/load", post(world_routes::load_world))
        .route("/api/worlds/{name}/unload", post(world_routes::unload_world))
        .route(
            "/api/worlds/{name}/spawn",
            get(world_routes::get_spawn).put(world_routes::set_spawn),
        )
        .route("/api/worlds/{name}/export", post(world_routes::export_world))
        // Import routes
        .route("/api/imports/remote", post(import_routes::import_remote))
        .route("/api/imports/url", post(import_routes::import_url))
        .route("/api/categories", get(import_routes::list_categories))
        // Suggestion routes
        .route("/api/suggestions/maps", get(suggestion_routes::suggest_maps))
        .route(
            "/api/suggestions/worlds",
            get(suggestion_routes::suggest_worlds),
        )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::ports::outbound::{MockBlobTransferPort, MockRemoteContentPort};
    use crate::infrastructure::config::AppConfig;
    use axum::body::{to_bytes, Body};
    use axum::http::{Method, Request};
    use serde_json::{json, Value};
    use tempfile::TempDir;
    use tower::ServiceExt;

    struct TestApp {
        _temp: TempDir,
        router: Router,
    }

    impl TestApp {
        async fn new(configure: impl FnOnce(&mut AppConfig)) -> Self {
            let temp = TempDir::new().unwrap();
            let mut config = AppConfig::default();
            config.storage.worlds_root = temp.path().join("worlds");
            config.storage.staging_root = temp.path().join("staging");
            configure(&mut config);

            let (state, _task) = AppState::with_clients(
                config,
                Arc::new(MockRemoteContentPort::new()),
                Arc::new(MockBlobTransferPort::new()),
            )
            .await
            .unwrap();
            Self {
                _temp: temp,
                router: create_routes().with_state(Arc::new(state)),
            }
        }

        async fn send(&self, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
            let request = Request::builder()
                .method(method)
                .uri(uri)
                .header("content-type", "application/json");
            let body = match body {
                Some(value) => Body::from(value.to_string()),
                None => Body::empty(),
            };
            let response = self
                .router
                .clone()
                .oneshot(request.body(body).unwrap())
                .await
                .unwrap();

            let status = response.status();
            let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
            let value = serde_json::from_slice(&bytes)
                .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned()));
            (status, value)
        }
    }

    #[tokio::test]
    async fn test_world_lifecycle_over_http() {
        let app = TestApp::new(|_| {}).await;

        let (status, body) = app
            .send(Method::POST, "/api/worlds", Some(json!({"name": "Alpha Complex"})))
            .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body, json!({"name": "alpha_complex", "state": "loaded"}));

        let (status, _) = app
            .send(Method::POST, "/api/worlds", Some(json!({"name": "alpha complex"})))
            .await;
        assert_eq!(status, StatusCode::CONFLICT);

        let (status, _) = app.send(Method::DELETE, "/api/worlds/alpha_complex", None).await;
        assert_eq!(status, StatusCode::CONFLICT);

        let (status, body) = app
            .send(Method::POST, "/api/worlds/alpha_complex/unload", None)
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["state"], "unloaded");

        let (status, body) = app.send(Method::GET, "/api/worlds?loaded_only=false", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body.as_array().unwrap().len(), 1);

        let (status, _) = app.send(Method::DELETE, "/api/worlds/alpha_complex", None).await;
        assert_eq!(status, StatusCode::NO_CONTENT);

        let (status, _) = app.send(Method::GET, "/api/worlds/alpha_complex", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (status, body) = app
            .send(Method::GET, "/api/worlds/Alpha%20Complex/exists", None)
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({"name": "alpha_complex", "exists": false}));
    }

    #[tokio::test]
    async fn test_spawn_roundtrip_over_http() {
        let app = TestApp::new(|_| {}).await;
        app.send(Method::POST, "/api/worlds", Some(json!({"name": "quintus"})))
            .await;

        let (status, body) = app.send(Method::GET, "/api/worlds/quintus/spawn", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["y"], 64.0);

        let (status, body) = app
            .send(
                Method::PUT,
                "/api/worlds/quintus/spawn",
                Some(json!({"x": 10.5, "y": 70.0, "z": -3.0, "yaw": 90.0})),
            )
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["world"], "quintus");

        let (_, body) = app.send(Method::GET, "/api/worlds/quintus/spawn", None).await;
        assert_eq!(body["x"], 10.5);
        assert_eq!(body["yaw"], 90.0);
    }

    #[tokio::test]
    async fn test_import_errors_map_to_status() {
        let app = TestApp::new(|_| {}).await;
        let (status, _) = app
            .send(
                Method::POST,
                "/api/imports/remote",
                Some(json!({"category": "CTF", "map": "Quintus"})),
            )
            .await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);

        let app = TestApp::new(|config| {
            config.remote.token = "secret".to_string();
            config.remote.organization = "acme".to_string();
            config.remote.repository = "maps".to_string();
        })
        .await;
        let (status, body) = app
            .send(
                Method::POST,
                "/api/imports/remote",
                Some(json!({"category": "Parkour", "map": "Quintus"})),
            )
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body.as_str().unwrap().contains("CTF"));

        let (status, _) = app
            .send(
                Method::POST,
                "/api/imports/url",
                Some(json!({"world_name": "quintus", "url": "not a url"})),
            )
            .await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[tokio::test]
    async fn test_suggestions_and_categories() {
        let app = TestApp::new(|_| {}).await;
        for name in ["quintus", "quarry", "alpha"] {
            app.send(Method::POST, "/api/worlds", Some(json!({"name": name})))
                .await;
        }

        let (status, body) = app
            .send(Method::GET, "/api/suggestions/worlds?prefix=QU", None)
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!(["quarry", "quintus"]));

        // Without a repository configured no lookup is made
        let (status, body) = app
            .send(Method::GET, "/api/suggestions/maps?category=CTF&prefix=a", None)
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!([]));

        let (_, body) = app.send(Method::GET, "/api/categories", None).await;
        assert_eq!(body.as_array().unwrap().len(), 11);
    }
}
