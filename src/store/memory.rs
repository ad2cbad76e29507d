use async_trait::async_trait;
use serde_json::Value;
use std::collections::{HashMap, HashSet};
use tokio::sync::RwLock;

use super::{Favorite, UserDataStore};
use crate::error::Error;

/// In-process store with the same semantics as the Supabase one
#[derive(Debug, Default)]
pub struct MemoryStore {
    favorites: RwLock<HashMap<(String, String), Favorite>>,
    deleted_identities: RwLock<HashSet<String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether `delete_identity` has been called for the user
    pub async fn is_identity_deleted(&self, user_id: &str) -> bool {
        self.deleted_identities.read().await.contains(user_id)
    }
}

#[async_trait]
impl UserDataStore for MemoryStore {
    async fn upsert_favorite(
        &self,
        user_id: &str,
        recipe_id: &str,
        recipe_data: Value,
    ) -> Result<Favorite, Error> {
        let favorite = Favorite::new(user_id, recipe_id, recipe_data);
        self.favorites.write().await.insert(
            (user_id.to_string(), recipe_id.to_string()),
            favorite.clone(),
        );
        Ok(favorite)
    }

    async fn delete_favorite(&self, user_id: &str, recipe_id: &str) -> Result<(), Error> {
        self.favorites
            .write()
            .await
            .remove(&(user_id.to_string(), recipe_id.to_string()));
        Ok(())
    }

    async fn list_favorites(&self, user_id: &str) -> Result<Vec<Favorite>, Error> {
        let mut favorites: Vec<Favorite> = self
            .favorites
            .read()
            .await
            .values()
            .filter(|f| f.user_id == user_id)
            .cloned()
            .collect();
        favorites.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(favorites)
    }

    async fn favorite_exists(&self, user_id: &str, recipe_id: &str) -> Result<bool, Error> {
        Ok(self
            .favorites
            .read()
            .await
            .contains_key(&(user_id.to_string(), recipe_id.to_string())))
    }

    async fn delete_all_favorites_for_user(&self, user_id: &str) -> Result<(), Error> {
        self.favorites
            .write()
            .await
            .retain(|(owner, _), _| owner != user_id);
        Ok(())
    }

    async fn delete_identity(&self, user_id: &str) -> Result<(), Error> {
        let mut deleted = self.deleted_identities.write().await;
        if !deleted.insert(user_id.to_string()) {
            return Err(Error::persistence(format!("user {} not found", user_id)));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_upsert_replaces() {
        let store = MemoryStore::new();
        store
            .upsert_favorite("u1", "r1", json!({ "v": 1 }))
            .await
            .unwrap();
        store
            .upsert_favorite("u1", "r1", json!({ "v": 2 }))
            .await
            .unwrap();

        let favorites = store.list_favorites("u1").await.unwrap();
        assert_eq!(favorites.len(), 1);
        assert_eq!(favorites[0].recipe_data["v"], 2);
    }

    #[tokio::test]
    async fn test_scoped_per_user() {
        let store = MemoryStore::new();
        store.upsert_favorite("u1", "r1", json!({})).await.unwrap();
        store.upsert_favorite("u2", "r1", json!({})).await.unwrap();

        store.delete_all_favorites_for_user("u1").await.unwrap();

        assert!(!store.favorite_exists("u1", "r1").await.unwrap());
        assert!(store.favorite_exists("u2", "r1").await.unwrap());
    }

    #[tokio::test]
    async fn test_delete_identity_twice_fails() {
        let store = MemoryStore::new();
        store.delete_identity("u1").await.unwrap();

        assert!(store.is_identity_deleted("u1").await);
        assert!(store.delete_identity("u1").await.is_err());
    }
}
