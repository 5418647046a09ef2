mod handlers;

use std::sync::Arc;

use axum::{
    routing::{get, post},
    Router,
};
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::config::PipelineSettings;
use crate::integrations::IntegrationClient;
use crate::pipeline::Orchestrator;
use crate::store::Store;
use crate::workflow::IntegratedWorkflow;

/// Shared state handed to every handler.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn Store>,
    pub workflow: IntegratedWorkflow,
    pub orchestrator: Arc<Orchestrator>,
}

impl AppState {
    pub fn new(
        store: Arc<dyn Store>,
        integrations: IntegrationClient,
        settings: PipelineSettings,
    ) -> Self {
        Self {
            workflow: IntegratedWorkflow::new(store.clone()),
            orchestrator: Arc::new(Orchestrator::new(store.clone(), integrations, settings)),
            store,
        }
    }
}

pub fn create_router(state: AppState) -> Router {
    let api = Router::new()
        // Features
        .route(
            "/features",
            get(handlers::list_features).post(handlers::create_feature),
        )
        .route("/features/stats", get(handlers::feature_stats))
        .route(
            "/features/{id}",
            get(handlers::get_feature)
                .put(handlers::update_feature)
                .delete(handlers::delete_feature),
        )
        // Generation
        .route("/v0/generate", post(handlers::generate))
        .route("/workflow/generate", post(handlers::generate_workflow))
        .route(
            "/v0/cursor-integration",
            get(handlers::cursor_integration_docs).post(handlers::cursor_integration),
        )
        // Master workflow
        .route(
            "/orchestrator/execute",
            get(handlers::orchestrator_docs).post(handlers::execute_orchestrator),
        );

    Router::new()
        .nest("/api", api)
        .route("/health", get(handlers::health))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CorsLayer::permissive()),
        )
        .with_state(state)
}
