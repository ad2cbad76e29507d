use async_trait::async_trait;
use chefia_auth::AdminAuth;
use chefia_postgrest::{PostgrestClient, PostgrestError, SortOrder};
use reqwest::Client;
use serde_json::Value;

use super::{Favorite, UserDataStore, FAVORITES_TABLE};
use crate::config::SupabaseOptions;
use crate::error::Error;

/// PostgREST error code for "no rows" on single-row reads
const NO_ROWS: &str = "PGRST116";

/// Favorites in the Supabase `favorites` table, identities in GoTrue.
///
/// Every call is made with the service role key.
#[derive(Debug, Clone)]
pub struct SupabaseStore {
    url: String,
    service_role_key: String,
    http_client: Client,
    admin: AdminAuth,
}

impl SupabaseStore {
    pub fn new(options: &SupabaseOptions, http_client: Client) -> Self {
        Self {
            url: options.url.clone(),
            service_role_key: options.service_role_key.clone(),
            admin: AdminAuth::new(&options.url, &options.service_role_key, http_client.clone()),
            http_client,
        }
    }

    fn favorites(&self) -> Result<PostgrestClient, Error> {
        let client = PostgrestClient::new(
            &self.url,
            &self.service_role_key,
            FAVORITES_TABLE,
            self.http_client.clone(),
        )?
        .with_auth(&self.service_role_key)?;
        Ok(client)
    }
}

#[async_trait]
impl UserDataStore for SupabaseStore {
    async fn upsert_favorite(
        &self,
        user_id: &str,
        recipe_id: &str,
        recipe_data: Value,
    ) -> Result<Favorite, Error> {
        let favorite = Favorite::new(user_id, recipe_id, recipe_data);

        let stored = self
            .favorites()?
            .on_conflict("user_id,recipe_id")
            .upsert(&favorite)
            .await?;

        // `return=representation` answers with the written rows
        match stored {
            Value::Array(mut rows) if !rows.is_empty() => {
                serde_json::from_value(rows.swap_remove(0)).map_err(|e| {
                    Error::persistence(format!("unexpected favorites row: {}", e))
                })
            }
            _ => Ok(favorite),
        }
    }

    async fn delete_favorite(&self, user_id: &str, recipe_id: &str) -> Result<(), Error> {
        self.favorites()?
            .eq("user_id", user_id)
            .eq("recipe_id", recipe_id)
            .delete()
            .await?;
        Ok(())
    }

    async fn list_favorites(&self, user_id: &str) -> Result<Vec<Favorite>, Error> {
        let rows = self
            .favorites()?
            .select("user_id,recipe_id,recipe_data,created_at")
            .eq("user_id", user_id)
            .order("created_at", SortOrder::Descending)
            .execute::<Favorite>()
            .await?;
        Ok(rows)
    }

    async fn favorite_exists(&self, user_id: &str, recipe_id: &str) -> Result<bool, Error> {
        let result = self
            .favorites()?
            .select("recipe_id")
            .eq("user_id", user_id)
            .eq("recipe_id", recipe_id)
            .limit(1)
            .execute::<Value>()
            .await;

        match result {
            Ok(rows) => Ok(!rows.is_empty()),
            Err(e @ PostgrestError::ApiError { .. }) if e.code() == Some(NO_ROWS) => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    async fn delete_all_favorites_for_user(&self, user_id: &str) -> Result<(), Error> {
        self.favorites()?.eq("user_id", user_id).delete().await?;
        Ok(())
    }

    async fn delete_identity(&self, user_id: &str) -> Result<(), Error> {
        self.admin.delete_user(user_id).await?;
        Ok(())
    }
}
