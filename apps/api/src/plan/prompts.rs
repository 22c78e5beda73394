// All LLM prompt constants for the plan module.

/// System prompt — enforces JSON-only output.
pub const PLAN_SYSTEM: &str =
    "You are a professional nutritionist specialized in creating personalized meal plans. \
    You must respond only with valid JSON in the specified format. \
    Do NOT include any text outside the JSON object. \
    Do NOT use markdown code fences.";

/// Fixed priming exchange sent before the request itself.
pub const PLAN_PRIMING_USER: &str = "Generate a diet plan based on the provided information.";
pub const PLAN_PRIMING_ASSISTANT: &str =
    "I'll generate a personalized diet plan based on the information you provide. \
    The plan will be in JSON format as specified.";

/// Plan generation prompt template. Replace: {age}, {weight_kg}, {height_cm},
/// {gender}, {activity_level}, {dietary_restrictions}, {goals}.
pub const PLAN_PROMPT_TEMPLATE: &str = r#"You are a professional nutritionist specialized in creating personalized meal plans. Your task is to provide a nutrition plan based on the following information:

- Age: {age}
- Weight: {weight_kg} kg
- Height: {height_cm} cm
- Gender: {gender}
- Activity level: {activity_level}
- Dietary restrictions: {dietary_restrictions}
- Goals: {goals}

The nutrition plan must:

- Match the daily caloric needs calculated from the information provided.
- Include the macronutrient distribution (protein, carbohydrates and fat) recommended for the stated goal.
- Detail a meal plan of 5 daily meals: breakfast, morning snack, lunch, afternoon snack and dinner.
- Provide a recipe for each meal, including ingredients and preparation instructions.
- Present each ingredient with its nutritional values (protein, carbohydrates, fat) in grams.
- Include 3 additional tips to help reach the goals.

Return EXACTLY the following JSON format:

{
    "diet_plan": {
        "calories": "daily amount in kcal",
        "macronutrients": "macro distribution",
        "water_intake": "daily amount in ml",
        "fiber_intake": "daily amount in grams",
        "supplementation": "recommended supplements",
        "meal_plan": {
            "overview": "description of the meal plan"
        },
        "meals": [
            {
                "meal": "BREAKFAST",
                "recipe_name": "Name of the recipe",
                "ingredients": [
                    {
                        "name": "Name of the ingredient",
                        "protein_g": "value in grams",
                        "carbs_g": "value in grams",
                        "fat_g": "value in grams"
                    }
                ],
                "instructions": "preparation steps"
            }
        ],
        "tips": [
            "tip 1",
            "tip 2",
            "tip 3"
        ],
        "notes": "additional notes"
    }
}

The "meals" array must contain exactly 5 entries, with "meal" set to, in order: "BREAKFAST", "MORNING SNACK", "LUNCH", "AFTERNOON SNACK", "DINNER".

Make sure to follow the requested format strictly and fill every field with accurate information."#;

/// Repair prompt sent after a failed extraction. Replace: {errors}.
pub const PLAN_REPAIR_TEMPLATE: &str = r#"Your previous response could not be parsed as the requested JSON. The validation errors were:

{errors}

Respond again with ONLY the corrected JSON object, in exactly the format requested above. Do not include apologies, explanations, or code fences."#;
