//! PDF renderer — walks a `DietPlan` and emits a paginated A4 document.
//!
//! Layout: title, general information block, meal plan overview, one block per
//! meal (ingredients with macros in fixed order, then instructions), tips,
//! closing notes. Text-only with the built-in Helvetica faces; line wrapping
//! is approximated from average glyph width, which is plenty for body text.

use std::io::BufWriter;

use printpdf::{
    BuiltinFont, IndirectFontRef, Mm, PdfDocument, PdfDocumentReference, PdfLayerReference,
};
use thiserror::Error;

use crate::plan::schema::DietPlan;

const PAGE_WIDTH_MM: f32 = 210.0;
const PAGE_HEIGHT_MM: f32 = 297.0;
const MARGIN_MM: f32 = 20.0;

const TITLE_SIZE: f32 = 16.0;
const HEADING_SIZE: f32 = 13.0;
const BODY_SIZE: f32 = 11.0;

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("PDF generation failed: {0}")]
    Pdf(String),
}

/// Renders the plan into PDF bytes.
pub fn render_plan(plan: &DietPlan) -> Result<Vec<u8>, RenderError> {
    let (doc, page, layer) = PdfDocument::new(
        "Personalized Diet Plan",
        Mm(PAGE_WIDTH_MM),
        Mm(PAGE_HEIGHT_MM),
        "Layer 1",
    );
    let regular = doc
        .add_builtin_font(BuiltinFont::Helvetica)
        .map_err(|e| RenderError::Pdf(e.to_string()))?;
    let bold = doc
        .add_builtin_font(BuiltinFont::HelveticaBold)
        .map_err(|e| RenderError::Pdf(e.to_string()))?;

    let mut cursor = PageCursor::new(&doc, doc.get_page(page).get_layer(layer), regular, bold);

    cursor.title("Personalized Diet Plan");

    cursor.heading("General Information");
    cursor.body(&format!("Daily calories: {}", plan.calories));
    cursor.body(&format!("Macronutrients: {}", plan.macronutrients));
    cursor.body(&format!("Water intake: {}", plan.water_intake));
    cursor.body(&format!("Fiber intake: {}", plan.fiber_intake));
    cursor.body(&format!("Supplementation: {}", plan.supplementation));

    cursor.heading("Meal Plan");
    cursor.body(&plan.meal_plan.overview);

    for meal in &plan.meals {
        cursor.subheading(&format!("{} - {}", meal.meal, meal.recipe_name));
        cursor.body("Ingredients:");
        for ingredient in &meal.ingredients {
            cursor.body(&format!(
                "- {}: protein {} g, carbs {} g, fat {} g",
                ingredient.name, ingredient.protein_g, ingredient.carbs_g, ingredient.fat_g
            ));
        }
        cursor.body(&format!("Instructions: {}", meal.instructions));
    }

    cursor.heading("Nutrition and Lifestyle Tips");
    for tip in &plan.tips {
        cursor.body(&format!("- {tip}"));
    }

    cursor.heading("Additional Notes");
    cursor.body(&plan.notes);

    let mut buf: Vec<u8> = Vec::new();
    {
        let mut writer = BufWriter::new(&mut buf);
        doc.save(&mut writer)
            .map_err(|e| RenderError::Pdf(e.to_string()))?;
    }
    Ok(buf)
}

/// Write cursor over the document: tracks the y position, wraps long lines,
/// and starts a fresh page when the bottom margin is reached.
struct PageCursor<'a> {
    doc: &'a PdfDocumentReference,
    layer: PdfLayerReference,
    regular: IndirectFontRef,
    bold: IndirectFontRef,
    y: f32,
}

impl<'a> PageCursor<'a> {
    fn new(
        doc: &'a PdfDocumentReference,
        layer: PdfLayerReference,
        regular: IndirectFontRef,
        bold: IndirectFontRef,
    ) -> Self {
        Self {
            doc,
            layer,
            regular,
            bold,
            y: PAGE_HEIGHT_MM - MARGIN_MM,
        }
    }

    fn title(&mut self, text: &str) {
        // Rough centering from average glyph width (Helvetica ~0.5em).
        let width_mm = text.chars().count() as f32 * TITLE_SIZE * 0.5 * 0.3528;
        let x = ((PAGE_WIDTH_MM - width_mm) / 2.0).max(MARGIN_MM);
        self.ensure_room(12.0);
        self.layer
            .use_text(text, TITLE_SIZE, Mm(x), Mm(self.y), &self.bold);
        self.y -= 12.0;
    }

    fn heading(&mut self, text: &str) {
        self.y -= 4.0; // extra space before a section
        self.ensure_room(8.0);
        self.layer
            .use_text(text, HEADING_SIZE, Mm(MARGIN_MM), Mm(self.y), &self.bold);
        self.y -= 8.0;
    }

    fn subheading(&mut self, text: &str) {
        self.y -= 2.0;
        for line in wrap(text, max_chars_per_line(BODY_SIZE)) {
            self.ensure_room(7.0);
            self.layer
                .use_text(line, BODY_SIZE, Mm(MARGIN_MM), Mm(self.y), &self.bold);
            self.y -= 7.0;
        }
    }

    fn body(&mut self, text: &str) {
        for line in wrap(text, max_chars_per_line(BODY_SIZE)) {
            self.ensure_room(6.0);
            self.layer
                .use_text(line, BODY_SIZE, Mm(MARGIN_MM), Mm(self.y), &self.regular);
            self.y -= 6.0;
        }
    }

    fn ensure_room(&mut self, needed: f32) {
        if self.y - needed < MARGIN_MM {
            let (page, layer) = self
                .doc
                .add_page(Mm(PAGE_WIDTH_MM), Mm(PAGE_HEIGHT_MM), "Layer 1");
            self.layer = self.doc.get_page(page).get_layer(layer);
            self.y = PAGE_HEIGHT_MM - MARGIN_MM;
        }
    }
}

/// Usable characters per line for the given font size, from the usable width
/// and Helvetica's ~0.5em average advance.
fn max_chars_per_line(font_size: f32) -> usize {
    let usable_mm = PAGE_WIDTH_MM - 2.0 * MARGIN_MM;
    let char_mm = font_size * 0.5 * 0.3528; // pt → mm
    (usable_mm / char_mm) as usize
}

/// Greedy word wrap. Words longer than the budget get a line of their own.
fn wrap(text: &str, max_chars: usize) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current = String::new();

    for word in text.split_whitespace() {
        if current.is_empty() {
            current.push_str(word);
        } else if current.chars().count() + 1 + word.chars().count() <= max_chars {
            current.push(' ');
            current.push_str(word);
        } else {
            lines.push(std::mem::take(&mut current));
            current.push_str(word);
        }
    }
    if !current.is_empty() {
        lines.push(current);
    }
    if lines.is_empty() {
        lines.push(String::new());
    }
    lines
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plan::schema::{Ingredient, Meal, MealPlanOverview};

    fn sample_plan() -> DietPlan {
        DietPlan {
            calories: "2200 kcal".to_string(),
            macronutrients: "30% protein, 45% carbs, 25% fat".to_string(),
            water_intake: "2500 ml".to_string(),
            fiber_intake: "30 g".to_string(),
            supplementation: "Whey protein".to_string(),
            meal_plan: MealPlanOverview {
                overview: "Five balanced meals spread across the day.".to_string(),
            },
            meals: vec![Meal {
                meal: "BREAKFAST".to_string(),
                recipe_name: "Oatmeal with banana".to_string(),
                ingredients: vec![Ingredient {
                    name: "Rolled oats".to_string(),
                    protein_g: "5.5".to_string(),
                    carbs_g: "27.0".to_string(),
                    fat_g: "3.0".to_string(),
                }],
                instructions: "Cook the oats in water.".to_string(),
            }],
            tips: vec!["Drink water before meals".to_string()],
            notes: "Adjust portions to hunger levels.".to_string(),
        }
    }

    #[test]
    fn test_render_produces_pdf_bytes() {
        let bytes = render_plan(&sample_plan()).unwrap();
        assert!(bytes.starts_with(b"%PDF"));
        assert!(bytes.len() > 500);
    }

    #[test]
    fn test_render_long_plan_spans_pages() {
        let mut plan = sample_plan();
        let meal = plan.meals[0].clone();
        plan.meals = std::iter::repeat(meal).take(40).collect();
        let bytes = render_plan(&plan).unwrap();
        assert!(bytes.starts_with(b"%PDF"));
    }

    #[test]
    fn test_render_wraps_overlong_meal_heading() {
        let mut plan = sample_plan();
        plan.meals[0].recipe_name =
            "Slow-roasted free-range chicken thighs with quinoa tabbouleh, charred broccolini, \
             preserved lemon yogurt and a toasted almond crumble"
                .to_string();
        let heading = format!("{} - {}", plan.meals[0].meal, plan.meals[0].recipe_name);
        assert!(wrap(&heading, max_chars_per_line(BODY_SIZE)).len() > 1);
        let bytes = render_plan(&plan).unwrap();
        assert!(bytes.starts_with(b"%PDF"));
    }

    #[test]
    fn test_wrap_splits_on_word_boundaries() {
        let lines = wrap("one two three four five", 9);
        assert_eq!(lines, vec!["one two", "three", "four five"]);
    }

    #[test]
    fn test_wrap_keeps_short_text_on_one_line() {
        assert_eq!(wrap("short", 80), vec!["short"]);
    }

    #[test]
    fn test_wrap_handles_overlong_word() {
        let lines = wrap("supercalifragilistic oats", 10);
        assert_eq!(lines[0], "supercalifragilistic");
        assert_eq!(lines[1], "oats");
    }

    #[test]
    fn test_wrap_empty_text_yields_blank_line() {
        assert_eq!(wrap("", 80), vec![String::new()]);
    }

    #[test]
    fn test_max_chars_scales_down_with_font_size() {
        assert!(max_chars_per_line(16.0) < max_chars_per_line(11.0));
    }
}
