// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Firestore client wrapper with typed operations.
//!
//! Provides high-level operations for:
//! - Spots (climbing directory, coarse latitude/type filters)
//! - Users and the unique-email index
//! - Gear items (always scoped to an owner)
//! - Gear catalog entries

use crate::db::collections;
use crate::error::AppError;
use crate::models::spot::CRAG_TYPE;
use crate::models::{ClimbingSpot, EmailClaim, GearItem, GearSpec, User};
use firestore::errors::FirestoreError;
use futures_util::{stream, StreamExt};
use std::collections::HashMap;

const MAX_CONCURRENT_DB_OPS: usize = 50;
// Firestore limits batch/transaction writes to 500 operations.
// We use a safe limit of 400 to allow headroom.
const BATCH_SIZE: usize = 400;

/// Document ID for an email claim. Emails may contain `/`, which Firestore
/// does not allow in IDs.
fn email_doc_id(email: &str) -> String {
    urlencoding::encode(email).into_owned()
}

/// Firestore database client.
#[derive(Clone)]
pub struct FirestoreDb {
    client: Option<firestore::FirestoreDb>,
}

impl FirestoreDb {
    /// Create a new Firestore client.
    ///
    /// For local development with emulator, set FIRESTORE_EMULATOR_HOST.
    pub async fn new(project_id: &str, database_id: &str) -> Result<Self, AppError> {
        let options = firestore::FirestoreDbOptions::new(project_id.to_string())
            .with_database_id(database_id.to_string());

        // If the emulator environment variable is set, use unauthenticated connection
        // to avoid local credential warnings and leakage.
        if std::env::var("FIRESTORE_EMULATOR_HOST").is_ok() {
            return Self::create_emulator_client(options).await;
        }

        let client = firestore::FirestoreDb::with_options(options)
            .await
            .map_err(|e| AppError::Database(format!("Failed to connect to Firestore: {}", e)))?;

        tracing::info!(
            project = project_id,
            database = database_id,
            "Connected to Firestore"
        );

        Ok(Self {
            client: Some(client),
        })
    }

    /// Create a Firestore client for the emulator with unauthenticated access.
    async fn create_emulator_client(
        options: firestore::FirestoreDbOptions,
    ) -> Result<Self, AppError> {
        tracing::info!("Using unauthenticated connection for Firestore Emulator");

        let token_source = gcloud_sdk::ExternalJwtFunctionSource::new(|| async {
            Ok(gcloud_sdk::Token {
                token_type: "Bearer".to_string(),
                token: gcloud_sdk::SecretValue::new(
                    "eyJhbGciOiJub25lIn0.eyJ1aWQiOiJ0ZXN0In0."
                        .to_string()
                        .into(),
                ),
                expiry: chrono::Utc::now() + chrono::Duration::hours(1),
            })
        });

        let project = options.google_project_id.clone();
        let client = firestore::FirestoreDb::with_options_token_source(
            options,
            gcloud_sdk::GCP_DEFAULT_SCOPES.clone(),
            gcloud_sdk::TokenSourceType::ExternalSource(Box::new(token_source)),
        )
        .await
        .map_err(|e| {
            AppError::Database(format!("Failed to connect to Firestore Emulator: {}", e))
        })?;

        tracing::info!(
            project = %project,
            "Connected to Firestore (Emulator/Unauthenticated)"
        );

        Ok(Self {
            client: Some(client),
        })
    }

    /// Create a mock Firestore client for testing (offline mode).
    ///
    /// All database operations will return an error if called.
    pub fn new_mock() -> Self {
        Self { client: None }
    }

    /// Helper to get the client or return an error if offline.
    fn get_client(&self) -> Result<&firestore::FirestoreDb, AppError> {
        self.client
            .as_ref()
            .ok_or_else(|| AppError::Database("Database not connected (offline mode)".to_string()))
    }

    async fn delete_doc(&self, collection: &str, id: &str) -> Result<(), AppError> {
        self.get_client()?
            .fluent()
            .delete()
            .from(collection)
            .document_id(id)
            .execute()
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    // ─── Spot Operations ─────────────────────────────────────────

    pub async fn get_spot(&self, id: &str) -> Result<Option<ClimbingSpot>, AppError> {
        self.get_client()?
            .fluent()
            .select()
            .by_id_in(collections::SPOTS)
            .obj()
            .one(id)
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Create or replace a spot.
    pub async fn upsert_spot(&self, spot: &ClimbingSpot) -> Result<(), AppError> {
        let _: () = self
            .get_client()?
            .fluent()
            .update()
            .in_col(collections::SPOTS)
            .document_id(&spot.id)
            .object(spot)
            .execute()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    /// Delete a spot. Returns whether it existed.
    pub async fn delete_spot(&self, id: &str) -> Result<bool, AppError> {
        if self.get_spot(id).await?.is_none() {
            return Ok(false);
        }
        self.delete_doc(collections::SPOTS, id).await?;
        Ok(true)
    }

    /// Every spot, up to `limit` documents when given.
    pub async fn list_spots(&self, limit: Option<u32>) -> Result<Vec<ClimbingSpot>, AppError> {
        let query = self.get_client()?.fluent().select().from(collections::SPOTS);
        let query = match limit {
            Some(limit) => query.limit(limit),
            None => query,
        };
        query
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Spots whose latitude lies in `[min_lat, max_lat]`.
    ///
    /// This is the store-side half of bbox and proximity queries; callers
    /// apply the exact longitude/distance test in process.
    pub async fn list_spots_in_lat_band(
        &self,
        min_lat: f64,
        max_lat: f64,
        crags_only: bool,
    ) -> Result<Vec<ClimbingSpot>, AppError> {
        self.get_client()?
            .fluent()
            .select()
            .from(collections::SPOTS)
            .filter(|q| {
                q.for_all([
                    q.field("latitude").greater_than_or_equal(min_lat),
                    q.field("latitude").less_than_or_equal(max_lat),
                    crags_only.then(|| q.field("type").eq(CRAG_TYPE)).flatten(),
                ])
            })
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Every spot of type "falaise".
    pub async fn list_crags(&self) -> Result<Vec<ClimbingSpot>, AppError> {
        self.get_client()?
            .fluent()
            .select()
            .from(collections::SPOTS)
            .filter(|q| q.field("type").eq(CRAG_TYPE))
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    // ─── User Operations ─────────────────────────────────────────

    pub async fn get_user(&self, id: &str) -> Result<Option<User>, AppError> {
        self.get_client()?
            .fluent()
            .select()
            .by_id_in(collections::USERS)
            .obj()
            .one(id)
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Look up a user by (lower-cased) email.
    pub async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        let users: Vec<User> = self
            .get_client()?
            .fluent()
            .select()
            .from(collections::USERS)
            .filter(|q| q.field("email").eq(email))
            .limit(1)
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(users.into_iter().next())
    }

    /// Create or update a user.
    pub async fn upsert_user(&self, user: &User) -> Result<(), AppError> {
        let _: () = self
            .get_client()?
            .fluent()
            .update()
            .in_col(collections::USERS)
            .document_id(&user.id)
            .object(user)
            .execute()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    /// Every user. Filtering and paging happen in the handler.
    pub async fn list_users(&self) -> Result<Vec<User>, AppError> {
        self.get_client()?
            .fluent()
            .select()
            .from(collections::USERS)
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Emails of the given users, keyed by user ID. Unknown IDs are skipped.
    pub async fn get_user_emails(
        &self,
        user_ids: Vec<String>,
    ) -> Result<HashMap<String, String>, AppError> {
        let results: Vec<Result<Option<User>, AppError>> = stream::iter(user_ids)
            .map(|id| async move { self.get_user(&id).await })
            .buffer_unordered(MAX_CONCURRENT_DB_OPS)
            .collect()
            .await;

        let mut emails = HashMap::new();
        for user in results {
            if let Some(user) = user? {
                emails.insert(user.id, user.email);
            }
        }
        Ok(emails)
    }

    /// Delete a user document. Returns whether it existed.
    pub async fn delete_user(&self, id: &str) -> Result<bool, AppError> {
        if self.get_user(id).await?.is_none() {
            return Ok(false);
        }
        self.delete_doc(collections::USERS, id).await?;
        Ok(true)
    }

    // ─── Unique Email Index ──────────────────────────────────────

    /// Claim `email` for `user_id`.
    ///
    /// The claim is a create-if-absent write, so two concurrent claims for
    /// the same email cannot both succeed. An existing claim is
    /// `Conflict("email_taken")`.
    pub async fn claim_email(&self, email: &str, user_id: &str) -> Result<(), AppError> {
        let claim = EmailClaim {
            user_id: user_id.to_string(),
        };
        let result: Result<EmailClaim, FirestoreError> = self
            .get_client()?
            .fluent()
            .insert()
            .into(collections::USER_EMAILS)
            .document_id(email_doc_id(email))
            .object(&claim)
            .execute()
            .await;

        match result {
            Ok(_) => Ok(()),
            Err(FirestoreError::DataConflictError(_)) => Err(AppError::Conflict("email_taken")),
            Err(e) => Err(AppError::Database(e.to_string())),
        }
    }

    /// Drop the claim on `email`.
    pub async fn release_email(&self, email: &str) -> Result<(), AppError> {
        self.delete_doc(collections::USER_EMAILS, &email_doc_id(email))
            .await
    }

    // ─── Gear Operations ─────────────────────────────────────────

    /// Get a gear item owned by `owner_id`.
    ///
    /// Ownership is part of the lookup filter: another user's item is
    /// indistinguishable from a missing one.
    pub async fn get_gear(&self, id: &str, owner_id: &str) -> Result<Option<GearItem>, AppError> {
        let items: Vec<GearItem> = self
            .get_client()?
            .fluent()
            .select()
            .from(collections::USER_GEAR)
            .filter(|q| {
                q.for_all([
                    q.field("id").eq(id),
                    q.field("owner_id").eq(owner_id),
                ])
            })
            .limit(1)
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(items.into_iter().next())
    }

    /// Create or replace a gear item.
    pub async fn upsert_gear(&self, item: &GearItem) -> Result<(), AppError> {
        let _: () = self
            .get_client()?
            .fluent()
            .update()
            .in_col(collections::USER_GEAR)
            .document_id(&item.id)
            .object(item)
            .execute()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    /// Delete a gear item owned by `owner_id`. Returns whether it existed.
    pub async fn delete_gear(&self, id: &str, owner_id: &str) -> Result<bool, AppError> {
        if self.get_gear(id, owner_id).await?.is_none() {
            return Ok(false);
        }
        self.delete_doc(collections::USER_GEAR, id).await?;
        Ok(true)
    }

    /// All items of one owner, optionally restricted to an exact category label.
    pub async fn list_gear_for_owner(
        &self,
        owner_id: &str,
        category: Option<&str>,
    ) -> Result<Vec<GearItem>, AppError> {
        self.get_client()?
            .fluent()
            .select()
            .from(collections::USER_GEAR)
            .filter(|q| {
                q.for_all([
                    q.field("owner_id").eq(owner_id),
                    category.and_then(|c| q.field("category").eq(c)),
                ])
            })
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Every gear item of every user (maintenance reports).
    pub async fn list_all_gear(&self) -> Result<Vec<GearItem>, AppError> {
        self.get_client()?
            .fluent()
            .select()
            .from(collections::USER_GEAR)
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Delete every item of one owner. Returns the number deleted.
    pub async fn delete_gear_for_owner(&self, owner_id: &str) -> Result<usize, AppError> {
        let items = self.list_gear_for_owner(owner_id, None).await?;
        self.batch_delete(&items, collections::USER_GEAR, |g: &GearItem| g.id.clone())
            .await?;
        tracing::debug!(owner_id, count = items.len(), "Deleted gear items");
        Ok(items.len())
    }

    // ─── Gear Catalog Operations ─────────────────────────────────

    pub async fn get_gear_spec(&self, id: &str) -> Result<Option<GearSpec>, AppError> {
        self.get_client()?
            .fluent()
            .select()
            .by_id_in(collections::GEAR_SPECS)
            .obj()
            .one(id)
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    pub async fn upsert_gear_spec(&self, spec: &GearSpec) -> Result<(), AppError> {
        let _: () = self
            .get_client()?
            .fluent()
            .update()
            .in_col(collections::GEAR_SPECS)
            .document_id(&spec.id)
            .object(spec)
            .execute()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    /// Delete a catalog entry. Returns whether it existed.
    pub async fn delete_gear_spec(&self, id: &str) -> Result<bool, AppError> {
        if self.get_gear_spec(id).await?.is_none() {
            return Ok(false);
        }
        self.delete_doc(collections::GEAR_SPECS, id).await?;
        Ok(true)
    }

    /// Catalog entries, optionally for one exact category.
    pub async fn list_gear_specs(&self, category: Option<&str>) -> Result<Vec<GearSpec>, AppError> {
        let query = self
            .get_client()?
            .fluent()
            .select()
            .from(collections::GEAR_SPECS);
        let query = match category {
            Some(c) => query.filter(|q| q.field("category").eq(c)),
            None => query,
        };
        query
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    // ─── Helper Methods ────────────────────────────────────────────

    /// Helper to batch delete documents using transactions.
    async fn batch_delete<T, F>(
        &self,
        items: &[T],
        collection: &str,
        id_extractor: F,
    ) -> Result<(), AppError>
    where
        F: Fn(&T) -> String,
    {
        let client = self.get_client()?;

        for chunk in items.chunks(BATCH_SIZE) {
            let mut transaction = client
                .begin_transaction()
                .await
                .map_err(|e| AppError::Database(format!("Failed to begin transaction: {}", e)))?;

            for item in chunk {
                let doc_id = id_extractor(item);
                client
                    .fluent()
                    .delete()
                    .from(collection)
                    .document_id(&doc_id)
                    .add_to_transaction(&mut transaction)
                    .map_err(|e| {
                        AppError::Database(format!(
                            "Failed to add deletion to transaction for {}: {}",
                            collection, e
                        ))
                    })?;
            }

            transaction.commit().await.map_err(|e| {
                AppError::Database(format!("Failed to commit batch deletion: {}", e))
            })?;
        }

        Ok(())
    }

    // ─── Account Deletion ──────────────────────────────────────────

    /// Delete a user with their email claim and all their gear.
    ///
    /// The steps are not transactional: gear created concurrently with the
    /// deletion may survive it. Returns the number of documents deleted.
    pub async fn delete_user_data(&self, user: &User) -> Result<usize, AppError> {
        let mut deleted_count = self.delete_gear_for_owner(&user.id).await?;

        self.release_email(&user.email).await?;
        deleted_count += 1;

        self.delete_doc(collections::USERS, &user.id).await?;
        deleted_count += 1;

        tracing::info!(user_id = %user.id, deleted_count, "User data deletion complete");
        Ok(deleted_count)
    }
}
