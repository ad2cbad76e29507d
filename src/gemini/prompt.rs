use serde_json::json;

/// Seasonings the model may use without them being listed
pub const BASIC_SEASONINGS: [&str; 5] = ["salt", "pepper", "oil/olive oil", "garlic", "onion"];

/// Number of recipes requested per call
pub const RECIPES_PER_CALL: usize = 3;

/// Build the generation prompt for a normalized ingredient list
pub fn build_prompt(ingredients: &[String]) -> String {
    let list = ingredients
        .iter()
        .map(|i| i.trim())
        .filter(|i| !i.is_empty())
        .collect::<Vec<_>>()
        .join(", ");

    let examples = json!([
        {
            "name": "Grilled Chicken with Tomato Rice",
            "description": "Healthy and quick main course with lean protein and vegetables.",
            "prepTime": "25 min",
            "difficulty": "Easy",
            "servings": 2,
            "ingredients": ["300g chicken", "1 cup rice", "2 tomatoes", "salt", "pepper"],
            "steps": [
                "1. Season the chicken with salt, pepper and olive oil.",
                "2. Grill the chicken over medium heat for 10-12 minutes.",
                "3. Cook the rice and saute it with tomato and seasonings."
            ],
            "tip": "Let the chicken rest for 3 minutes before slicing to keep it juicy."
        },
        {
            "name": "Sweet Pumpkin Pie",
            "description": "Classic warm dessert, comforting for any occasion.",
            "prepTime": "50 min",
            "difficulty": "Medium",
            "servings": 6,
            "ingredients": ["500g pumpkin", "200g flour", "100g sugar", "2 eggs", "butter"],
            "steps": [
                "1. Cook the pumpkin until soft and mash it.",
                "2. Mix with sugar, eggs and melted butter.",
                "3. Pour into a lined pan and bake at 180C for 35-40 minutes."
            ],
            "tip": "A dense pumpkin variety gives a smoother puree."
        }
    ]);
    let examples = serde_json::to_string_pretty(&examples).unwrap_or_default();

    format!(
        r#"You are a creative and experienced chef. Create EXACTLY {count} creative recipes using ONLY the ingredients provided plus basic universal seasonings ({seasonings}).

AVAILABLE INGREDIENTS: {list}

ANY KIND OF RECIPE IS WELCOME:
- Main courses, sides, desserts, appetizers, drinks, salads
- Cuisines from any region (Asian, Mediterranean, Brazilian, Mexican, etc)
- Vegetarian, meat based, sweet, savory, fried, grilled, baked

MANDATORY RULES:
1. Use ONLY the listed ingredients (plus basic seasonings).
2. Create VARIED recipes, do not repeat preparation techniques.
3. Include AT LEAST 3 detailed preparation steps.
4. Return ONLY valid JSON, no explanations, no markdown, no code fences.
5. EXACT expected structure:

[
  {{
    "name": "Recipe name",
    "description": "Short description (max 80 characters)",
    "prepTime": "Time in minutes or hours (e.g. 25 min, 1 hour)",
    "difficulty": "Easy | Medium | Hard",
    "servings": integer number of servings,
    "ingredients": ["quantity + ingredient", "e.g. 300g chicken", "2 tomatoes", ...],
    "steps": ["1. Detailed step...", "2. Next step...", "3. Continuing..."],
    "tip": "Useful tip, plating suggestion or optional variation"
  }}
]

OUTPUT EXAMPLES (FOLLOW THE FORMAT ONLY, DO NOT COPY THE CONTENT):
{examples}

NOW GENERATE {count} CREATIVE AND DIFFERENT RECIPES:"#,
        count = RECIPES_PER_CALL,
        seasonings = BASIC_SEASONINGS.join(", "),
        list = list,
        examples = examples,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prompt_lists_ingredients() {
        let prompt = build_prompt(&[
            "tomato".to_string(),
            "  ".to_string(),
            " chicken ".to_string(),
        ]);

        assert!(prompt.contains("AVAILABLE INGREDIENTS: tomato, chicken\n"));
        assert!(prompt.contains("EXACTLY 3"));
        assert!(prompt.contains("salt, pepper, oil/olive oil, garlic, onion"));
        assert!(prompt.contains("Sweet Pumpkin Pie"));
    }
}
