//! Axum route handlers for the Plan API.

use axum::{
    extract::{Path, State},
    http::header,
    response::IntoResponse,
    Json,
};
use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::info;

use crate::errors::AppError;
use crate::plan::generator::{generate_plan, PlanRequest};
use crate::render::pdf::render_plan;
use crate::state::AppState;
use crate::store::is_safe_filename;

#[derive(Debug, Serialize)]
pub struct GeneratePlanResponse {
    pub message: String,
    pub filename: String,
    pub meals: usize,
    pub generated_at: DateTime<Utc>,
}

/// POST /api/v1/plans/generate
///
/// Full pipeline: prompt build → model call → structured extraction →
/// PDF render → store. Returns the stored filename for the download route.
pub async fn handle_generate(
    State(state): State<AppState>,
    Json(request): Json<PlanRequest>,
) -> Result<Json<GeneratePlanResponse>, AppError> {
    for (field, value) in [
        ("gender", &request.gender),
        ("activity_level", &request.activity_level),
        ("goals", &request.goals),
    ] {
        if value.trim().is_empty() {
            return Err(AppError::Validation(format!("{field} cannot be empty")));
        }
    }

    info!(
        "Generating diet plan via {} ({})",
        state.llm.name(),
        state.llm.model()
    );
    let plan = generate_plan(state.llm.as_ref(), &state.guard, &request).await?;

    let bytes = render_plan(&plan).map_err(|e| AppError::Render(e.to_string()))?;
    let filename = state.store.save(&bytes).await?;

    Ok(Json(GeneratePlanResponse {
        message: "Diet plan generated successfully".to_string(),
        filename,
        meals: plan.meals.len(),
        generated_at: Utc::now(),
    }))
}

/// GET /api/v1/plans/:filename/download
///
/// Serves a stored plan as a PDF download attachment.
pub async fn handle_download(
    State(state): State<AppState>,
    Path(filename): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    if !is_safe_filename(&filename) {
        return Err(AppError::Validation("invalid plan filename".to_string()));
    }

    let bytes = state
        .store
        .read(&filename)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Plan {filename} not found")))?;

    let headers = [
        (header::CONTENT_TYPE, "application/pdf".to_string()),
        (
            header::CONTENT_DISPOSITION,
            format!("attachment; filename=\"{filename}\""),
        ),
    ];
    Ok((headers, bytes))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_response_serializes_expected_fields() {
        let response = GeneratePlanResponse {
            message: "Diet plan generated successfully".to_string(),
            filename: "diet_plan_test.pdf".to_string(),
            meals: 5,
            generated_at: Utc::now(),
        };
        let value = serde_json::to_value(&response).unwrap();
        assert_eq!(value["filename"], "diet_plan_test.pdf");
        assert_eq!(value["meals"], 5);
        assert!(value["generated_at"].is_string());
    }
}
