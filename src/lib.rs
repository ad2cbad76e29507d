//! ChefIA recipe backend
//!
//! Turns an ingredient list into validated recipes generated by Gemini,
//! caches the results, and keeps per-user favorites in Supabase.

pub mod cache;
pub mod config;
pub mod error;
pub mod fetch;
pub mod gemini;
pub mod http;
pub mod recipe;
pub mod service;
pub mod store;

pub use crate::error::Error;

/// A prelude module for convenient imports
pub mod prelude {
    pub use crate::cache::{cache_key, CacheStats, RecipeCache};
    pub use crate::config::{CacheOptions, Config, GeminiOptions, RateLimitOptions, SupabaseOptions};
    pub use crate::error::Error;
    pub use crate::gemini::{GeminiClient, RecipeGenerator};
    pub use crate::recipe::{validate_recipes, Difficulty, Recipe};
    pub use crate::service::RecipeService;
    pub use crate::store::{Favorite, MemoryStore, SupabaseStore, UserDataStore};
}
