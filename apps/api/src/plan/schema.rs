//! Diet-plan schema — typed record, JSON Schema validation, and structured
//! extraction of free-form model output.
//!
//! The model is instructed to return the whole plan nested under a top-level
//! `diet_plan` key. `PlanGuard::extract` strips code fences, parses, validates
//! against the fixed schema, and deserializes into `DietPlan`. Callers retry
//! the model call with the reported errors when extraction fails.

use jsonschema::Validator;
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use thiserror::Error;
use tracing::warn;

/// The plan always describes 5 daily meals (breakfast, morning snack, lunch,
/// afternoon snack, dinner). A different count is logged, not rejected.
pub const EXPECTED_MEALS: usize = 5;
/// The prompt asks for 3 lifestyle tips.
pub const EXPECTED_TIPS: usize = 3;

#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("model output is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("model output failed schema validation: {}", errors.join("; "))]
    Schema { errors: Vec<String> },
}

// ────────────────────────────────────────────────────────────────────────────
// Typed record
// ────────────────────────────────────────────────────────────────────────────

/// Top-level envelope the model returns.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlanEnvelope {
    pub diet_plan: DietPlan,
}

/// A complete personalized diet plan.
/// All nutrition amounts are strings — the model annotates units inline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DietPlan {
    pub calories: String,
    pub macronutrients: String,
    pub water_intake: String,
    pub fiber_intake: String,
    pub supplementation: String,
    pub meal_plan: MealPlanOverview,
    pub meals: Vec<Meal>,
    pub tips: Vec<String>,
    pub notes: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MealPlanOverview {
    pub overview: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Meal {
    pub meal: String,
    pub recipe_name: String,
    pub ingredients: Vec<Ingredient>,
    pub instructions: String,
}

/// One ingredient with its macronutrient values in grams.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Ingredient {
    pub name: String,
    pub protein_g: String,
    pub carbs_g: String,
    pub fat_g: String,
}

// ────────────────────────────────────────────────────────────────────────────
// Schema
// ────────────────────────────────────────────────────────────────────────────

/// The fixed output schema the model must satisfy.
static PLAN_SCHEMA: Lazy<Value> = Lazy::new(|| {
    json!({
        "type": "object",
        "required": ["diet_plan"],
        "properties": {
            "diet_plan": {
                "type": "object",
                "required": [
                    "calories",
                    "macronutrients",
                    "water_intake",
                    "fiber_intake",
                    "supplementation",
                    "meal_plan",
                    "meals",
                    "tips",
                    "notes"
                ],
                "properties": {
                    "calories": { "type": "string" },
                    "macronutrients": { "type": "string" },
                    "water_intake": { "type": "string" },
                    "fiber_intake": { "type": "string" },
                    "supplementation": { "type": "string" },
                    "meal_plan": {
                        "type": "object",
                        "required": ["overview"],
                        "properties": {
                            "overview": { "type": "string" }
                        }
                    },
                    "meals": {
                        "type": "array",
                        "items": {
                            "type": "object",
                            "required": ["meal", "recipe_name", "ingredients", "instructions"],
                            "properties": {
                                "meal": { "type": "string" },
                                "recipe_name": { "type": "string" },
                                "ingredients": {
                                    "type": "array",
                                    "items": {
                                        "type": "object",
                                        "required": ["name", "protein_g", "carbs_g", "fat_g"],
                                        "properties": {
                                            "name": { "type": "string" },
                                            "protein_g": { "type": "string" },
                                            "carbs_g": { "type": "string" },
                                            "fat_g": { "type": "string" }
                                        }
                                    }
                                },
                                "instructions": { "type": "string" }
                            }
                        }
                    },
                    "tips": {
                        "type": "array",
                        "items": { "type": "string" }
                    },
                    "notes": { "type": "string" }
                }
            }
        }
    })
});

// ────────────────────────────────────────────────────────────────────────────
// Guard
// ────────────────────────────────────────────────────────────────────────────

/// Compiled schema validator plus extraction logic.
/// Built once at startup and shared through `AppState`.
pub struct PlanGuard {
    validator: Validator,
}

impl PlanGuard {
    pub fn new() -> anyhow::Result<Self> {
        let validator = jsonschema::validator_for(&PLAN_SCHEMA)
            .map_err(|e| anyhow::anyhow!("diet plan schema failed to compile: {e}"))?;
        Ok(Self { validator })
    }

    /// Coerces raw model output into a validated `DietPlan`.
    ///
    /// Steps: strip markdown fences → parse JSON → validate against the fixed
    /// schema → deserialize the `diet_plan` record. Meal and tip counts that
    /// differ from the prompt's ask are warned about but accepted.
    pub fn extract(&self, raw: &str) -> Result<DietPlan, ExtractError> {
        let text = strip_json_fences(raw);
        let value: Value = serde_json::from_str(text)?;

        let errors: Vec<String> = self
            .validator
            .iter_errors(&value)
            .map(|e| format!("at '{}': {e}", e.instance_path))
            .collect();
        if !errors.is_empty() {
            return Err(ExtractError::Schema { errors });
        }

        let envelope: PlanEnvelope = serde_json::from_value(value)?;
        let plan = envelope.diet_plan;

        if plan.meals.len() != EXPECTED_MEALS {
            warn!(
                "Plan has {} meals (expected {}) — rendering as-is",
                plan.meals.len(),
                EXPECTED_MEALS
            );
        }
        if plan.tips.len() != EXPECTED_TIPS {
            warn!(
                "Plan has {} tips (expected {}) — rendering as-is",
                plan.tips.len(),
                EXPECTED_TIPS
            );
        }

        Ok(plan)
    }
}

/// Strips ```json ... ``` or ``` ... ``` code fences from LLM output.
pub fn strip_json_fences(text: &str) -> &str {
    let text = text.trim();
    if let Some(stripped) = text.strip_prefix("```json") {
        stripped
            .trim_start()
            .strip_suffix("```")
            .map(|s| s.trim())
            .unwrap_or(stripped.trim_start())
    } else if let Some(stripped) = text.strip_prefix("```") {
        stripped
            .trim_start()
            .strip_suffix("```")
            .map(|s| s.trim())
            .unwrap_or(stripped.trim_start())
    } else {
        text
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────
