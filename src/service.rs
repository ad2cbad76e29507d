//! Recipe generation, favorites and account operations

use chrono::Utc;
use serde_json::Value;
use std::sync::Arc;

use crate::cache::{cache_key, CacheStats, RecipeCache};
use crate::error::Error;
use crate::gemini::RecipeGenerator;
use crate::recipe::Recipe;
use crate::store::{Favorite, UserDataStore};

/// Upper bound on ingredients per generation request
pub const MAX_INGREDIENTS: usize = 20;

/// Fallback slug for names without any ASCII alphanumerics
const DEFAULT_SLUG: &str = "recipe";

/// Lowercase, map every non `[a-z0-9]` char to `-`, collapse runs and trim
/// the edges
pub fn slugify(name: &str) -> String {
    let mut slug = String::with_capacity(name.len());
    for c in name.to_lowercase().chars() {
        if c.is_ascii_lowercase() || c.is_ascii_digit() {
            slug.push(c);
        } else if !slug.ends_with('-') {
            slug.push('-');
        }
    }
    slug.trim_matches('-').to_string()
}

fn recipe_id(name: &str, millis: i64, index: usize) -> String {
    let slug = slugify(name);
    let slug = if slug.is_empty() { DEFAULT_SLUG } else { &slug };
    format!("{}-{}-{}", slug, millis, index)
}

fn check_ingredients(ingredients: &[String]) -> Result<(), Error> {
    if ingredients.is_empty() {
        return Err(Error::invalid_input("At least one ingredient is required"));
    }
    if ingredients.len() > MAX_INGREDIENTS {
        return Err(Error::invalid_input(format!(
            "Maximum {} ingredients allowed",
            MAX_INGREDIENTS
        )));
    }
    if let Some(pos) = ingredients.iter().position(|i| i.trim().is_empty()) {
        return Err(Error::invalid_input(format!(
            "Ingredient {} must not be empty",
            pos
        )));
    }
    Ok(())
}

/// Orchestrates the generator, the cache and the user data store
#[derive(Clone)]
pub struct RecipeService {
    generator: Arc<dyn RecipeGenerator>,
    cache: RecipeCache,
    store: Arc<dyn UserDataStore>,
}

impl RecipeService {
    pub fn new(
        generator: Arc<dyn RecipeGenerator>,
        cache: RecipeCache,
        store: Arc<dyn UserDataStore>,
    ) -> Self {
        Self {
            generator,
            cache,
            store,
        }
    }

    /// Return recipes for the ingredient list, from cache when possible.
    ///
    /// A miss calls the generator once, assigns ids and stores the batch.
    /// Nothing is cached when generation fails.
    pub async fn generate_recipes(
        &self,
        ingredients: &[String],
        user_id: Option<&str>,
    ) -> Result<Vec<Recipe>, Error> {
        let user = user_id.unwrap_or("anonymous");
        check_ingredients(ingredients)?;

        let key = cache_key(ingredients);
        if let Some(recipes) = self.cache.get(&key).await {
            tracing::info!(user_id = user, key = %key, "Returning cached recipes");
            return Ok(recipes);
        }

        let normalized: Vec<String> = ingredients
            .iter()
            .map(|i| i.trim().to_lowercase())
            .filter(|i| !i.is_empty())
            .collect();

        tracing::info!(
            user_id = user,
            ingredients = %normalized.join(", "),
            "Generating recipes"
        );

        let recipes = self.generator.generate(&normalized).await.map_err(|e| {
            tracing::error!(
                user_id = user,
                operation = "generate_recipes",
                kind = e.kind(),
                error = %e,
                "Recipe generation failed"
            );
            e
        })?;

        let millis = Utc::now().timestamp_millis();
        let recipes: Vec<Recipe> = recipes
            .into_iter()
            .enumerate()
            .map(|(index, mut recipe)| {
                recipe.id = recipe_id(&recipe.name, millis, index);
                recipe
            })
            .collect();

        self.cache
            .set(&key, recipes.clone(), self.cache.default_ttl())
            .await;

        Ok(recipes)
    }

    /// Delete every favorite, then the identity itself
    pub async fn delete_user_account(&self, user_id: &str) -> Result<(), Error> {
        let result = async {
            self.store.delete_all_favorites_for_user(user_id).await?;
            self.store.delete_identity(user_id).await
        }
        .await;

        match &result {
            Ok(()) => tracing::info!(user_id, "Account deleted"),
            Err(e) => tracing::error!(
                user_id,
                operation = "delete_user_account",
                error = %e,
                "Account deletion failed"
            ),
        }
        result
    }

    pub async fn add_favorite(
        &self,
        user_id: &str,
        recipe_id: &str,
        recipe_data: Value,
    ) -> Result<Favorite, Error> {
        if recipe_id.trim().is_empty() {
            return Err(Error::invalid_input("recipeId must not be empty"));
        }
        if !recipe_data.is_object() {
            return Err(Error::invalid_input("recipeData must be an object"));
        }

        tracing::info!(user_id, recipe_id, "Adding favorite");
        self.store
            .upsert_favorite(user_id, recipe_id, recipe_data)
            .await
            .map_err(|e| log_store_error(user_id, "add_favorite", e))
    }

    pub async fn remove_favorite(&self, user_id: &str, recipe_id: &str) -> Result<(), Error> {
        if recipe_id.trim().is_empty() {
            return Err(Error::invalid_input("recipeId must not be empty"));
        }

        tracing::info!(user_id, recipe_id, "Removing favorite");
        self.store
            .delete_favorite(user_id, recipe_id)
            .await
            .map_err(|e| log_store_error(user_id, "remove_favorite", e))
    }

    pub async fn list_favorites(&self, user_id: &str) -> Result<Vec<Favorite>, Error> {
        let favorites = self
            .store
            .list_favorites(user_id)
            .await
            .map_err(|e| log_store_error(user_id, "list_favorites", e))?;
        tracing::debug!(user_id, count = favorites.len(), "Fetched favorites");
        Ok(favorites)
    }

    pub async fn is_favorite(&self, user_id: &str, recipe_id: &str) -> Result<bool, Error> {
        if recipe_id.trim().is_empty() {
            return Err(Error::invalid_input("recipeId must not be empty"));
        }

        self.store
            .favorite_exists(user_id, recipe_id)
            .await
            .map_err(|e| log_store_error(user_id, "is_favorite", e))
    }

    pub async fn clear_cache(&self) {
        self.cache.reset().await;
    }

    pub async fn cache_stats(&self) -> CacheStats {
        self.cache.stats().await
    }
}

fn log_store_error(user_id: &str, operation: &'static str, e: Error) -> Error {
    tracing::error!(user_id, operation, error = %e, "Store operation failed");
    e
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::recipe::Difficulty;
    use crate::store::MemoryStore;
    use async_trait::async_trait;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    struct CountingGenerator {
        calls: AtomicUsize,
        seen: Mutex<Vec<Vec<String>>>,
        names: Vec<&'static str>,
        fail_with: Option<Error>,
    }

    impl CountingGenerator {
        fn new(names: Vec<&'static str>) -> Self {
            Self {
                calls: AtomicUsize::new(0),
                seen: Mutex::new(Vec::new()),
                names,
                fail_with: None,
            }
        }

        fn failing(err: Error) -> Self {
            Self {
                fail_with: Some(err),
                ..Self::new(vec![])
            }
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl RecipeGenerator for CountingGenerator {
        async fn generate(&self, ingredients: &[String]) -> Result<Vec<Recipe>, Error> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.seen.lock().unwrap().push(ingredients.to_vec());
            if let Some(err) = &self.fail_with {
                return Err(err.clone());
            }
            Ok(self
                .names
                .iter()
                .map(|name| Recipe {
                    id: String::new(),
                    name: name.to_string(),
                    description: "d".to_string(),
                    prep_time: "10 min".to_string(),
                    difficulty: Difficulty::Hard,
                    servings: 2,
                    ingredients: ingredients.to_vec(),
                    steps: vec!["a".into(), "b".into(), "c".into()],
                    tip: "t".to_string(),
                })
                .collect())
        }
    }

    fn service(generator: Arc<CountingGenerator>) -> RecipeService {
        RecipeService::new(
            generator,
            RecipeCache::default(),
            Arc::new(MemoryStore::new()),
        )
    }

    fn strings(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_slugify() {
        assert_eq!(slugify("Frango Grelhado!"), "frango-grelhado");
        assert_eq!(slugify("  --Tomato & Basil--  "), "tomato-basil");
        assert_eq!(slugify("Pão de Queijo"), "p-o-de-queijo");
        assert_eq!(recipe_id("???", 1, 0), "recipe-1-0");
    }

    #[tokio::test]
    async fn test_cache_hit_skips_generator() {
        let generator = Arc::new(CountingGenerator::new(vec!["A", "B", "C"]));
        let service = service(generator.clone());

        let first = service
            .generate_recipes(&strings(&["Tomato", "chicken"]), Some("u1"))
            .await
            .unwrap();
        let second = service
            .generate_recipes(&strings(&[" CHICKEN ", "tomato"]), Some("u2"))
            .await
            .unwrap();

        assert_eq!(generator.calls(), 1);
        assert_eq!(first, second);
        assert_eq!(
            generator.seen.lock().unwrap()[0],
            strings(&["tomato", "chicken"])
        );
    }

    #[tokio::test]
    async fn test_ids_unique_with_duplicate_names() {
        let generator = Arc::new(CountingGenerator::new(vec!["Soup", "Soup", "Soup"]));
        let recipes = service(generator)
            .generate_recipes(&strings(&["water"]), None)
            .await
            .unwrap();

        let mut ids: Vec<&str> = recipes.iter().map(|r| r.id.as_str()).collect();
        assert!(ids.iter().all(|id| id.starts_with("soup-")));
        ids.sort();
        ids.dedup();
        assert_eq!(ids.len(), 3);
    }

    #[tokio::test]
    async fn test_invalid_input_before_generation() {
        let generator = Arc::new(CountingGenerator::new(vec!["A"]));
        let service = service(generator.clone());

        let too_many: Vec<String> = (0..21).map(|i| format!("item{}", i)).collect();
        for input in [vec![], too_many, strings(&["egg", "  "])] {
            let err = service.generate_recipes(&input, None).await.unwrap_err();
            assert!(matches!(err, Error::InvalidInput(_)));
        }

        assert_eq!(generator.calls(), 0);
        assert_eq!(service.cache_stats().await.entries, 0);
    }

    #[tokio::test]
    async fn test_failure_is_not_cached() {
        let generator = Arc::new(CountingGenerator::failing(Error::malformed("no array")));
        let service = service(generator.clone());

        for _ in 0..2 {
            let err = service
                .generate_recipes(&strings(&["egg"]), None)
                .await
                .unwrap_err();
            assert!(matches!(err, Error::MalformedResponse(_)));
        }

        assert_eq!(generator.calls(), 2);
        assert_eq!(service.cache_stats().await.entries, 0);
    }

    #[tokio::test]
    async fn test_clear_cache_forces_regeneration() {
        let generator = Arc::new(CountingGenerator::new(vec!["A"]));
        let service = service(generator.clone());
        let input = strings(&["egg"]);

        service.generate_recipes(&input, None).await.unwrap();
        service.clear_cache().await;
        service.generate_recipes(&input, None).await.unwrap();

        assert_eq!(generator.calls(), 2);
    }

    #[tokio::test]
    async fn test_add_favorite_validates_input() {
        let service = service(Arc::new(CountingGenerator::new(vec![])));

        let err = service
            .add_favorite("u1", "  ", json!({}))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::InvalidInput(_)));

        let err = service
            .add_favorite("u1", "r1", json!("not an object"))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::InvalidInput(_)));
    }

    #[tokio::test]
    async fn test_favorites_roundtrip() {
        let service = service(Arc::new(CountingGenerator::new(vec![])));

        service
            .add_favorite("u1", "r1", json!({ "name": "Old" }))
            .await
            .unwrap();
        service
            .add_favorite("u1", "r1", json!({ "name": "New" }))
            .await
            .unwrap();

        let favorites = service.list_favorites("u1").await.unwrap();
        assert_eq!(favorites.len(), 1);
        assert_eq!(favorites[0].recipe_data["name"], "New");
        assert!(service.is_favorite("u1", "r1").await.unwrap());

        service.remove_favorite("u1", "r1").await.unwrap();
        assert!(!service.is_favorite("u1", "r1").await.unwrap());
    }
}
