//! Plan generation — orchestrates the prompt → model → structured extraction
//! loop.
//!
//! Flow: build prompt → priming exchange + request → model call →
//! guard extraction. A failed extraction feeds the validation errors back to
//! the model and retries within a bounded budget.

use serde::Deserialize;
use tracing::{info, warn};

use crate::errors::AppError;
use crate::llm_client::{ChatMessage, ModelProvider};
use crate::plan::prompts::{
    PLAN_PRIMING_ASSISTANT, PLAN_PRIMING_USER, PLAN_PROMPT_TEMPLATE, PLAN_REPAIR_TEMPLATE,
    PLAN_SYSTEM,
};
use crate::plan::schema::{DietPlan, PlanGuard};

/// Max repair retries when model output fails parsing or schema validation.
const MAX_EXTRACTION_RETRIES: u32 = 2;

/// Request body for plan generation — the seven intake fields.
/// Type coercion happens in serde; no cross-field validation by design.
#[derive(Debug, Clone, Deserialize)]
pub struct PlanRequest {
    pub age: u32,
    pub gender: String,
    pub weight_kg: f64,
    pub height_cm: f64,
    pub activity_level: String,
    pub goals: String,
    #[serde(default)]
    pub dietary_restrictions: String,
}

/// Runs the generation loop and returns a validated plan.
///
/// On extraction failure the raw output and the validation errors are appended
/// to the conversation so the model can repair its own response.
pub async fn generate_plan(
    llm: &dyn ModelProvider,
    guard: &PlanGuard,
    request: &PlanRequest,
) -> Result<DietPlan, AppError> {
    let prompt = build_plan_prompt(request);

    let mut messages = vec![
        ChatMessage::user(PLAN_PRIMING_USER),
        ChatMessage::assistant(PLAN_PRIMING_ASSISTANT),
        ChatMessage::user(prompt),
    ];

    for attempt in 0..=MAX_EXTRACTION_RETRIES {
        let raw = llm
            .complete(PLAN_SYSTEM, &messages)
            .await
            .map_err(|e| AppError::Llm(format!("Plan generation call failed: {e}")))?;

        match guard.extract(&raw) {
            Ok(plan) => {
                info!(
                    "Plan extracted on attempt {}: {} meals, {} tips",
                    attempt + 1,
                    plan.meals.len(),
                    plan.tips.len()
                );
                return Ok(plan);
            }
            Err(e) => {
                warn!(
                    "Extraction attempt {}/{} failed: {e}",
                    attempt + 1,
                    MAX_EXTRACTION_RETRIES + 1
                );
                messages.push(ChatMessage::assistant(raw));
                messages.push(ChatMessage::user(
                    PLAN_REPAIR_TEMPLATE.replace("{errors}", &e.to_string()),
                ));
            }
        }
    }

    Err(AppError::Llm(format!(
        "Plan extraction failed after {} attempts: model output never matched the diet plan schema",
        MAX_EXTRACTION_RETRIES + 1
    )))
}

/// Fills the plan prompt template with the intake fields.
fn build_plan_prompt(request: &PlanRequest) -> String {
    let restrictions = if request.dietary_restrictions.trim().is_empty() {
        "none"
    } else {
        request.dietary_restrictions.trim()
    };

    PLAN_PROMPT_TEMPLATE
        .replace("{age}", &request.age.to_string())
        .replace("{weight_kg}", &request.weight_kg.to_string())
        .replace("{height_cm}", &request.height_cm.to_string())
        .replace("{gender}", request.gender.trim())
        .replace("{activity_level}", request.activity_level.trim())
        .replace("{dietary_restrictions}", restrictions)
        .replace("{goals}", request.goals.trim())
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::collections::VecDeque;
    use std::sync::Mutex;

    use async_trait::async_trait;
    use crate::llm_client::{LlmError, Role};

    /// Provider that replays a scripted sequence of completions and records
    /// every conversation it was sent.
    struct ScriptedProvider {
        responses: Mutex<VecDeque<String>>,
        calls: Mutex<Vec<Vec<ChatMessage>>>,
    }

    impl ScriptedProvider {
        fn new(responses: &[&str]) -> Self {
            Self {
                responses: Mutex::new(responses.iter().map(|s| s.to_string()).collect()),
                calls: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl ModelProvider for ScriptedProvider {
        async fn complete(
            &self,
            _system: &str,
            messages: &[ChatMessage],
        ) -> Result<String, LlmError> {
            self.calls.lock().unwrap().push(messages.to_vec());
            self.responses
                .lock()
                .unwrap()
                .pop_front()
                .ok_or(LlmError::EmptyContent)
        }

        fn name(&self) -> &'static str {
            "scripted"
        }

        fn model(&self) -> &'static str {
            "scripted-model"
        }
    }

    /// Minimal output that satisfies the plan schema.
    const VALID_OUTPUT: &str = r#"{
        "diet_plan": {
            "calories": "2000 kcal",
            "macronutrients": "30/45/25",
            "water_intake": "2000 ml",
            "fiber_intake": "25 g",
            "supplementation": "none",
            "meal_plan": {"overview": "Light meals."},
            "meals": [
                {
                    "meal": "BREAKFAST",
                    "recipe_name": "Scrambled eggs",
                    "ingredients": [
                        {"name": "Eggs", "protein_g": "13.0", "carbs_g": "1.0", "fat_g": "10.0"}
                    ],
                    "instructions": "Whisk and cook on low heat."
                }
            ],
            "tips": ["Eat slowly"],
            "notes": "None."
        }
    }"#;

    fn sample_request() -> PlanRequest {
        PlanRequest {
            age: 31,
            gender: "female".to_string(),
            weight_kg: 64.5,
            height_cm: 168.0,
            activity_level: "moderate".to_string(),
            goals: "lose fat, keep muscle".to_string(),
            dietary_restrictions: "lactose intolerant".to_string(),
        }
    }

    #[test]
    fn test_prompt_interpolates_all_fields() {
        let prompt = build_plan_prompt(&sample_request());
        assert!(prompt.contains("Age: 31"));
        assert!(prompt.contains("Weight: 64.5 kg"));
        assert!(prompt.contains("Height: 168 cm"));
        assert!(prompt.contains("Gender: female"));
        assert!(prompt.contains("Activity level: moderate"));
        assert!(prompt.contains("Dietary restrictions: lactose intolerant"));
        assert!(prompt.contains("Goals: lose fat, keep muscle"));
    }

    #[test]
    fn test_prompt_leaves_no_placeholders() {
        let prompt = build_plan_prompt(&sample_request());
        for placeholder in [
            "{age}",
            "{weight_kg}",
            "{height_cm}",
            "{gender}",
            "{activity_level}",
            "{dietary_restrictions}",
            "{goals}",
        ] {
            assert!(!prompt.contains(placeholder), "leftover {placeholder}");
        }
    }

    #[test]
    fn test_empty_restrictions_becomes_none() {
        let mut request = sample_request();
        request.dietary_restrictions = "  ".to_string();
        let prompt = build_plan_prompt(&request);
        assert!(prompt.contains("Dietary restrictions: none"));
    }

    #[test]
    fn test_plan_request_deserialization_defaults_restrictions() {
        let json = serde_json::json!({
            "age": 40,
            "gender": "male",
            "weight_kg": 82.0,
            "height_cm": 180.0,
            "activity_level": "sedentary",
            "goals": "gain muscle"
        });
        let request: PlanRequest = serde_json::from_value(json).unwrap();
        assert_eq!(request.age, 40);
        assert!(request.dietary_restrictions.is_empty());
    }

    #[tokio::test]
    async fn test_generate_plan_repairs_after_invalid_output() {
        let provider = ScriptedProvider::new(&["I cannot produce JSON today.", VALID_OUTPUT]);
        let guard = PlanGuard::new().unwrap();

        let plan = generate_plan(&provider, &guard, &sample_request())
            .await
            .unwrap();
        assert_eq!(plan.calories, "2000 kcal");

        let calls = provider.calls.lock().unwrap();
        assert_eq!(calls.len(), 2);
        // First call: priming exchange + request.
        assert_eq!(calls[0].len(), 3);
        // Second call: the raw assistant turn followed by the repair message.
        assert_eq!(calls[1].len(), 5);
        assert_eq!(calls[1][3].role, Role::Assistant);
        assert_eq!(calls[1][3].content, "I cannot produce JSON today.");
        assert_eq!(calls[1][4].role, Role::User);
        assert!(calls[1][4].content.contains("could not be parsed"));
        assert!(calls[1][4].content.contains("not valid JSON"));
    }

    #[tokio::test]
    async fn test_generate_plan_feeds_schema_errors_into_repair() {
        let provider = ScriptedProvider::new(&[r#"{"diet_plan": {}}"#, VALID_OUTPUT]);
        let guard = PlanGuard::new().unwrap();

        generate_plan(&provider, &guard, &sample_request())
            .await
            .unwrap();

        let calls = provider.calls.lock().unwrap();
        assert!(calls[1][4].content.contains("calories"));
    }

    #[tokio::test]
    async fn test_generate_plan_errors_when_budget_exhausted() {
        let provider = ScriptedProvider::new(&["nope", "still nope", "{}"]);
        let guard = PlanGuard::new().unwrap();

        let err = generate_plan(&provider, &guard, &sample_request())
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Llm(_)));
        assert!(err.to_string().contains("3 attempts"));
        assert_eq!(provider.calls.lock().unwrap().len(), 3);
    }

    #[test]
    fn test_plan_request_rejects_non_numeric_age() {
        let json = serde_json::json!({
            "age": "forty",
            "gender": "male",
            "weight_kg": 82.0,
            "height_cm": 180.0,
            "activity_level": "sedentary",
            "goals": "gain muscle"
        });
        let result: Result<PlanRequest, _> = serde_json::from_value(json);
        assert!(result.is_err());
    }
}
