//! API routes for dbkeeper

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::trace::TraceLayer;

use crate::handlers;
use crate::state::AppState;

/// Create the API router
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(handlers::index))
        .route("/backup", post(handlers::backup))
        .route("/restore", post(handlers::restore_handler))
        .route("/logs", get(handlers::logs))
        .route("/health", get(handlers::health_check))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use axum::{
        body::Body,
        http::{Request, StatusCode},
    };
    use dbkeeper_db::{
        AuditError, AuditLog, AuditRecord, AuditResult, MemoryAuditStore, NewAuditEntry,
    };
    use std::sync::Arc;
    use tower::ServiceExt;

    struct BrokenAudit;

    #[async_trait]
    impl AuditLog for BrokenAudit {
        async fn record(&self, _entry: NewAuditEntry) -> AuditResult<AuditRecord> {
            Err(AuditError::InvalidValue("offline".into()))
        }

        async fn list(&self) -> AuditResult<Vec<AuditRecord>> {
            Err(AuditError::InvalidValue("offline".into()))
        }
    }

    fn get_request(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    #[tokio::test]
    async fn test_health_endpoint() {
        let app = create_router(AppState::new(Arc::new(MemoryAuditStore::new()), "backups"));
        let response = app.oneshot(get_request("/health")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_index_is_html() {
        let app = create_router(AppState::new(Arc::new(MemoryAuditStore::new()), "backups"));
        let response = app.oneshot(get_request("/")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let content_type = response.headers()["content-type"].to_str().unwrap();
        assert!(content_type.starts_with("text/html"));
    }

    #[tokio::test]
    async fn test_logs_failure_is_500() {
        let app = create_router(AppState::new(Arc::new(BrokenAudit), "backups"));
        let response = app.oneshot(get_request("/logs")).await.unwrap();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[tokio::test]
    async fn test_backup_redirects_even_when_audit_fails() {
        let app = create_router(AppState::new(Arc::new(BrokenAudit), "backups"));
        let request = Request::builder()
            .method("POST")
            .uri("/backup")
            .header("content-type", "application/x-www-form-urlencoded")
            .body(Body::from("dbType=oracle&databasename=shop"))
            .unwrap();
        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(response.headers()["location"], "/");
    }
}
