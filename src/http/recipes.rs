use axum::{
    extract::{rejection::JsonRejection, Path, State},
    Extension, Json,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use super::{auth::AuthUser, error::ApiError, AppState};
use crate::recipe::Recipe;
use crate::store::Favorite;

/// Ingredients used by the smoke test route
const TEST_INGREDIENTS: [&str; 3] = ["tomato", "chicken", "onion"];

#[derive(Debug, Deserialize)]
pub struct GenerateRecipesRequest {
    pub ingredients: Vec<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateMetadata {
    pub ingredients_count: usize,
    pub recipes_generated: usize,
    pub timestamp: String,
}

#[derive(Debug, Serialize)]
pub struct GenerateRecipesResponse {
    pub success: bool,
    pub recipes: Vec<Recipe>,
    pub metadata: GenerateMetadata,
}

pub async fn generate_recipes(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    body: Result<Json<GenerateRecipesRequest>, JsonRejection>,
) -> Result<Json<GenerateRecipesResponse>, ApiError> {
    let Json(body) = body?;

    let recipes = state
        .service
        .generate_recipes(&body.ingredients, Some(&user.id))
        .await?;

    Ok(Json(GenerateRecipesResponse {
        success: true,
        metadata: GenerateMetadata {
            ingredients_count: body.ingredients.len(),
            recipes_generated: recipes.len(),
            timestamp: Utc::now().to_rfc3339(),
        },
        recipes,
    }))
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TestRecipesResponse {
    pub success: bool,
    pub message: &'static str,
    pub test_recipes: Vec<Recipe>,
    pub timestamp: String,
}

/// Generate for a fixed ingredient list; any failure is a plain 503
pub async fn test_generation(
    State(state): State<AppState>,
) -> Result<Json<TestRecipesResponse>, ApiError> {
    let ingredients: Vec<String> = TEST_INGREDIENTS.iter().map(|i| i.to_string()).collect();

    let recipes = state
        .service
        .generate_recipes(&ingredients, None)
        .await
        .map_err(|e| {
            tracing::error!(error = %e, "Test recipe generation failed");
            ApiError::ServiceUnavailable("Recipe generation service is not available")
        })?;

    Ok(Json(TestRecipesResponse {
        success: true,
        message: "Recipe generation service is working",
        test_recipes: recipes,
        timestamp: Utc::now().to_rfc3339(),
    }))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddFavoriteRequest {
    pub recipe_id: String,
    pub recipe_data: Value,
}

#[derive(Debug, Serialize)]
pub struct FavoriteMutationResponse {
    pub success: bool,
    pub message: &'static str,
    pub data: Value,
}

pub async fn add_favorite(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    body: Result<Json<AddFavoriteRequest>, JsonRejection>,
) -> Result<Json<FavoriteMutationResponse>, ApiError> {
    let Json(body) = body?;

    let favorite = state
        .service
        .add_favorite(&user.id, &body.recipe_id, body.recipe_data)
        .await?;

    Ok(Json(FavoriteMutationResponse {
        success: true,
        message: "Recipe added to favorites",
        data: serde_json::to_value(favorite).unwrap_or(Value::Null),
    }))
}

pub async fn remove_favorite(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(recipe_id): Path<String>,
) -> Result<Json<FavoriteMutationResponse>, ApiError> {
    state.service.remove_favorite(&user.id, &recipe_id).await?;

    Ok(Json(FavoriteMutationResponse {
        success: true,
        message: "Recipe removed from favorites",
        data: json!({ "recipeId": recipe_id }),
    }))
}

#[derive(Debug, Serialize)]
pub struct ListFavoritesResponse {
    pub success: bool,
    pub favorites: Vec<Favorite>,
    pub count: usize,
}

pub async fn list_favorites(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<ListFavoritesResponse>, ApiError> {
    let favorites = state.service.list_favorites(&user.id).await?;

    Ok(Json(ListFavoritesResponse {
        success: true,
        count: favorites.len(),
        favorites,
    }))
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckFavoriteResponse {
    pub success: bool,
    pub recipe_id: String,
    pub is_favorite: bool,
}

pub async fn check_favorite(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(recipe_id): Path<String>,
) -> Result<Json<CheckFavoriteResponse>, ApiError> {
    let is_favorite = state.service.is_favorite(&user.id, &recipe_id).await?;

    Ok(Json(CheckFavoriteResponse {
        success: true,
        recipe_id,
        is_favorite,
    }))
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub success: bool,
    pub message: &'static str,
}

pub async fn delete_account(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<MessageResponse>, ApiError> {
    state.service.delete_user_account(&user.id).await?;

    Ok(Json(MessageResponse {
        success: true,
        message: "Account deleted successfully",
    }))
}
