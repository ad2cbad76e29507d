//! Persistence of per-user favorites and identities

mod memory;
mod supabase;

pub use memory::MemoryStore;
pub use supabase::SupabaseStore;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::Error;

/// Name of the remote favorites table
pub const FAVORITES_TABLE: &str = "favorites";

/// A recipe saved by a user
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Favorite {
    pub user_id: String,
    pub recipe_id: String,
    /// Snapshot of the recipe as the client sent it
    pub recipe_data: Value,
    pub created_at: DateTime<Utc>,
}

impl Favorite {
    pub fn new(user_id: &str, recipe_id: &str, recipe_data: Value) -> Self {
        Self {
            user_id: user_id.to_string(),
            recipe_id: recipe_id.to_string(),
            recipe_data,
            created_at: Utc::now(),
        }
    }
}

/// Storage of favorites and user identities.
///
/// Implementations translate their own failures into
/// [`Error::Persistence`].
#[async_trait]
pub trait UserDataStore: Send + Sync {
    /// Create the favorite, or replace the one with the same user and recipe
    async fn upsert_favorite(
        &self,
        user_id: &str,
        recipe_id: &str,
        recipe_data: Value,
    ) -> Result<Favorite, Error>;

    async fn delete_favorite(&self, user_id: &str, recipe_id: &str) -> Result<(), Error>;

    /// All favorites of a user, newest first
    async fn list_favorites(&self, user_id: &str) -> Result<Vec<Favorite>, Error>;

    async fn favorite_exists(&self, user_id: &str, recipe_id: &str) -> Result<bool, Error>;

    async fn delete_all_favorites_for_user(&self, user_id: &str) -> Result<(), Error>;

    /// Remove the user from the identity provider
    async fn delete_identity(&self, user_id: &str) -> Result<(), Error>;
}
