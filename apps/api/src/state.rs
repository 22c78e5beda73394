use std::sync::Arc;

use crate::llm_client::ModelProvider;
use crate::plan::schema::PlanGuard;
use crate::store::PlanStore;

/// Shared application state injected into all route handlers via Axum extractors.
/// Config is consumed at startup and does not travel with requests.
#[derive(Clone)]
pub struct AppState {
    /// Selected model provider. Swap via LLM_PROVIDER env.
    pub llm: Arc<dyn ModelProvider>,
    /// Compiled diet-plan schema validator.
    pub guard: Arc<PlanGuard>,
    pub store: PlanStore,
}
