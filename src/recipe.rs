//! Recipe record and validation of model output against it

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

/// Effort level of a recipe
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
}

impl Difficulty {
    pub const ALL: [Difficulty; 3] = [Difficulty::Easy, Difficulty::Medium, Difficulty::Hard];

    pub fn as_str(&self) -> &'static str {
        match self {
            Difficulty::Easy => "Easy",
            Difficulty::Medium => "Medium",
            Difficulty::Hard => "Hard",
        }
    }

    fn parse(value: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|d| d.as_str() == value)
    }
}

/// One generated dish
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Recipe {
    /// Assigned by the service after generation; empty until then
    #[serde(default)]
    pub id: String,
    pub name: String,
    pub description: String,
    pub prep_time: String,
    pub difficulty: Difficulty,
    pub servings: u32,
    pub ingredients: Vec<String>,
    pub steps: Vec<String>,
    pub tip: String,
}

/// Minimum number of preparation steps a recipe must carry
pub const MIN_STEPS: usize = 3;

/// A single schema violation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationIssue {
    /// Location of the offending value, e.g. `[1].steps[0]`
    pub path: String,
    pub message: String,
}

impl fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.path, self.message)
    }
}

/// Every violation found in a payload
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    pub issues: Vec<ValidationIssue>,
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self.issues.iter().map(|i| i.to_string()).collect();
        write!(f, "{}", parts.join("; "))
    }
}

impl std::error::Error for ValidationError {}

struct Checker {
    issues: Vec<ValidationIssue>,
}

impl Checker {
    fn fail(&mut self, path: String, message: impl Into<String>) {
        self.issues.push(ValidationIssue {
            path,
            message: message.into(),
        });
    }

    fn field<'v>(&mut self, obj: &'v Map<String, Value>, base: &str, key: &str) -> Option<&'v Value> {
        let value = obj.get(key);
        if value.is_none() || value == Some(&Value::Null) {
            self.fail(format!("{}.{}", base, key), "is required");
            return None;
        }
        value
    }

    fn string(&mut self, obj: &Map<String, Value>, base: &str, key: &str) -> Option<String> {
        let value = self.field(obj, base, key)?;
        match value.as_str() {
            Some(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
            Some(_) => {
                self.fail(format!("{}.{}", base, key), "must not be empty");
                None
            }
            None => {
                self.fail(format!("{}.{}", base, key), "expected a string");
                None
            }
        }
    }

    fn string_list(
        &mut self,
        obj: &Map<String, Value>,
        base: &str,
        key: &str,
        min_len: usize,
    ) -> Option<Vec<String>> {
        let path = format!("{}.{}", base, key);
        let items = match self.field(obj, base, key)?.as_array() {
            Some(items) => items,
            None => {
                self.fail(path, "expected an array of strings");
                return None;
            }
        };

        let mut out = Vec::with_capacity(items.len());
        let mut ok = true;
        for (i, item) in items.iter().enumerate() {
            match item.as_str() {
                Some(s) if !s.trim().is_empty() => out.push(s.trim().to_string()),
                Some(_) => {
                    self.fail(format!("{}[{}]", path, i), "must not be empty");
                    ok = false;
                }
                None => {
                    self.fail(format!("{}[{}]", path, i), "expected a string");
                    ok = false;
                }
            }
        }

        if items.len() < min_len {
            self.fail(
                path,
                format!("expected at least {} items, got {}", min_len, items.len()),
            );
            ok = false;
        }

        ok.then_some(out)
    }

    fn servings(&mut self, obj: &Map<String, Value>, base: &str) -> Option<u32> {
        let value = self.field(obj, base, "servings")?;
        let path = format!("{}.servings", base);

        // Integral floats such as 2.0 are accepted; JSON does not distinguish them.
        let n = match value {
            Value::Number(n) => n
                .as_u64()
                .or_else(|| n.as_f64().filter(|f| f.fract() == 0.0 && *f >= 0.0).map(|f| f as u64)),
            _ => {
                self.fail(path, "expected an integer");
                return None;
            }
        };

        match n {
            Some(n) if n >= 1 && n <= u32::MAX as u64 => Some(n as u32),
            Some(_) => {
                self.fail(path, "must be a positive integer");
                None
            }
            None => {
                self.fail(path, "expected a positive integer");
                None
            }
        }
    }

    fn difficulty(&mut self, obj: &Map<String, Value>, base: &str) -> Option<Difficulty> {
        let value = self.field(obj, base, "difficulty")?;
        let path = format!("{}.difficulty", base);
        match value.as_str().map(str::trim) {
            Some(s) => match Difficulty::parse(s) {
                Some(d) => Some(d),
                None => {
                    self.fail(path, format!("expected one of Easy, Medium, Hard, got {:?}", s));
                    None
                }
            },
            None => {
                self.fail(path, "expected a string");
                None
            }
        }
    }

    fn recipe(&mut self, index: usize, value: &Value) -> Option<Recipe> {
        let base = format!("[{}]", index);
        let obj = match value.as_object() {
            Some(obj) => obj,
            None => {
                self.fail(base, "expected an object");
                return None;
            }
        };

        // Evaluate every field before combining so all violations are reported.
        let name = self.string(obj, &base, "name");
        let description = self.string(obj, &base, "description");
        let prep_time = self.string(obj, &base, "prepTime");
        let difficulty = self.difficulty(obj, &base);
        let servings = self.servings(obj, &base);
        let ingredients = self.string_list(obj, &base, "ingredients", 1);
        let steps = self.string_list(obj, &base, "steps", MIN_STEPS);
        let tip = self.string(obj, &base, "tip");

        Some(Recipe {
            id: String::new(),
            name: name?,
            description: description?,
            prep_time: prep_time?,
            difficulty: difficulty?,
            servings: servings?,
            ingredients: ingredients?,
            steps: steps?,
            tip: tip?,
        })
    }
}

/// Validate a parsed model payload as a non-empty array of recipes.
///
/// String fields are trimmed. The returned recipes have an empty `id`.
pub fn validate_recipes(value: &Value) -> Result<Vec<Recipe>, ValidationError> {
    let mut checker = Checker { issues: Vec::new() };

    let items = match value.as_array() {
        Some(items) => items,
        None => {
            checker.fail("$".to_string(), "expected an array of recipes");
            return Err(ValidationError {
                issues: checker.issues,
            });
        }
    };

    if items.is_empty() {
        checker.fail("$".to_string(), "expected at least one recipe");
    }

    let recipes: Vec<Recipe> = items
        .iter()
        .enumerate()
        .filter_map(|(i, item)| checker.recipe(i, item))
        .collect();

    if checker.issues.is_empty() {
        Ok(recipes)
    } else {
        Err(ValidationError {
            issues: checker.issues,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn valid_recipe() -> Value {
        json!({
            "name": "Grilled Chicken with Tomato Rice",
            "description": "Quick, healthy main course.",
            "prepTime": "25 min",
            "difficulty": "Easy",
            "servings": 2,
            "ingredients": ["300g chicken", "1 cup rice", "2 tomatoes"],
            "steps": ["Season the chicken.", "Grill it.", "Cook the rice with tomato."],
            "tip": "Rest the chicken before slicing."
        })
    }

    fn paths(err: &ValidationError) -> Vec<&str> {
        err.issues.iter().map(|i| i.path.as_str()).collect()
    }

    #[test]
    fn test_valid_payload() {
        let recipes = validate_recipes(&json!([valid_recipe(), valid_recipe()])).unwrap();

        assert_eq!(recipes.len(), 2);
        assert_eq!(recipes[0].difficulty, Difficulty::Easy);
        assert_eq!(recipes[0].servings, 2);
        assert_eq!(recipes[0].steps.len(), 3);
        assert!(recipes[0].id.is_empty());
    }

    #[test]
    fn test_integral_float_servings() {
        let mut recipe = valid_recipe();
        recipe["servings"] = json!(4.0);

        let recipes = validate_recipes(&json!([recipe])).unwrap();
        assert_eq!(recipes[0].servings, 4);
    }

    #[test]
    fn test_not_an_array() {
        let err = validate_recipes(&valid_recipe()).unwrap_err();
        assert_eq!(paths(&err), vec!["$"]);
    }

    #[test]
    fn test_empty_array() {
        let err = validate_recipes(&json!([])).unwrap_err();
        assert_eq!(paths(&err), vec!["$"]);
    }

    #[test]
    fn test_reports_every_violation() {
        let mut bad = valid_recipe();
        bad["difficulty"] = json!("Trivial");
        bad["servings"] = json!(0);
        bad["steps"] = json!(["only one"]);
        bad.as_object_mut().unwrap().remove("tip");
        bad["name"] = json!("   ");

        let err = validate_recipes(&json!([valid_recipe(), bad])).unwrap_err();
        let mut found = paths(&err);
        found.sort();

        assert_eq!(
            found,
            vec![
                "[1].difficulty",
                "[1].name",
                "[1].servings",
                "[1].steps",
                "[1].tip"
            ]
        );
    }

    #[test]
    fn test_wrong_types() {
        let mut bad = valid_recipe();
        bad["servings"] = json!("two");
        bad["ingredients"] = json!("chicken");
        bad["steps"] = json!(["a", 2, "c"]);

        let err = validate_recipes(&json!([bad, "not a recipe"])).unwrap_err();
        let found = paths(&err);

        assert!(found.contains(&"[0].servings"));
        assert!(found.contains(&"[0].ingredients"));
        assert!(found.contains(&"[0].steps[1]"));
        assert!(found.contains(&"[1]"));
    }

    #[test]
    fn test_serializes_camel_case() {
        let mut recipe = validate_recipes(&json!([valid_recipe()])).unwrap().remove(0);
        recipe.id = "grilled-1".to_string();

        let value = serde_json::to_value(&recipe).unwrap();
        assert_eq!(value["prepTime"], "25 min");
        assert_eq!(value["difficulty"], "Easy");
        assert_eq!(value["id"], "grilled-1");
    }
}
