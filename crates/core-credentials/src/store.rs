//! Credential Store (C1) — encrypted-at-rest OAuth token storage.

use core_models::{App, Credential, CredentialSummary, TokenSet};
use sqlx::{PgPool, Row};
use tracing::info;
use uuid::Uuid;

use crate::encryption::{decrypt_json, encrypt_json};
use crate::error::CredentialError;

/// Wraps a Postgres pool and the master key; every token that crosses
/// into the `credential` table is encrypted first, never in plaintext.
pub struct CredentialStore {
    pool: PgPool,
    key: [u8; 32],
}

/// What actually gets encrypted: the access/refresh tokens and any
/// provider-specific metadata. `expires_at` stays plaintext so the
/// dispatcher (C3) can check expiry without decrypting.
#[derive(serde::Serialize, serde::Deserialize)]
struct EncryptedPayload {
    access_token: String,
    refresh_token: Option<String>,
    metadata: serde_json::Value,
}

impl CredentialStore {
    pub fn new(pool: PgPool, key: [u8; 32]) -> Self {
        Self { pool, key }
    }

    fn row_to_credential(&self, row: sqlx::postgres::PgRow) -> Result<Credential, CredentialError> {
        let id: Uuid = row.get("id");
        let user_id: Uuid = row.get("user_id");
        let app_str: String = row.get("app");
        let app = App::from_str(&app_str).unwrap_or(App::Webhook);
        let expires_at = row.get("expires_at");
        let created_at = row.get("created_at");
        let updated_at = row.get("updated_at");
        let encrypted: Vec<u8> = row.get("secret_encrypted");

        let payload: EncryptedPayload = decrypt_json(&encrypted, &self.key)?;

        Ok(Credential {
            id,
            user_id,
            app,
            access_token: payload.access_token,
            refresh_token: payload.refresh_token,
            expires_at,
            metadata: payload.metadata,
            created_at,
            updated_at,
        })
    }

    fn row_to_summary(&self, row: sqlx::postgres::PgRow) -> CredentialSummary {
        let app_str: String = row.get("app");
        CredentialSummary {
            id: row.get("id"),
            user_id: row.get("user_id"),
            app: App::from_str(&app_str).unwrap_or(App::Webhook),
            expires_at: row.get("expires_at"),
            created_at: row.get("created_at"),
            updated_at: row.get("updated_at"),
        }
    }

    /// Insert a new credential, or replace the existing one for this
    /// (user, app) pair — at most one row per pair (§3).
    pub async fn save(
        &self,
        user_id: Uuid,
        app: App,
        tokens: TokenSet,
    ) -> Result<Credential, CredentialError> {
        let payload = EncryptedPayload {
            access_token: tokens.access_token,
            refresh_token: tokens.refresh_token,
            metadata: tokens.metadata,
        };
        let encrypted = encrypt_json(&payload, &self.key)?;
        let id = Uuid::new_v4();

        let row = sqlx::query(
            r#"
            INSERT INTO credential (id, user_id, app, secret_encrypted, expires_at)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (user_id, app) DO UPDATE SET
                secret_encrypted = EXCLUDED.secret_encrypted,
                expires_at = EXCLUDED.expires_at,
                updated_at = NOW()
            RETURNING id, user_id, app, secret_encrypted, expires_at, created_at, updated_at
            "#,
        )
        .bind(id)
        .bind(app.as_str())
        .bind(&encrypted)
        .bind(tokens.expires_at)
        .fetch_one(&self.pool)
        .await?;

        info!(user_id = %user_id, app = app.as_str(), "credential saved");
        self.row_to_credential(row)
    }

    /// Non-sensitive projection (§4.1): no `access_token`/`refresh_token`/
    /// `metadata` ever leaves the database for this query, so callers that
    /// only need connection status can't casually obtain a live token.
    pub async fn load(&self, user_id: Uuid, app: App) -> Result<Option<CredentialSummary>, CredentialError> {
        let row = sqlx::query(
            r#"
            SELECT id, user_id, app, expires_at, created_at, updated_at
            FROM credential
            WHERE user_id = $1 AND app = $2
            "#,
        )
        .bind(user_id)
        .bind(app.as_str())
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|r| self.row_to_summary(r)))
    }

    /// Full projection including decrypted `access_token`/`refresh_token`/
    /// `metadata` (§4.1) — called only by the Dispatcher (C3), which is the
    /// one place in the engine that needs a live token.
    pub async fn load_secrets(&self, user_id: Uuid, app: App) -> Result<Option<Credential>, CredentialError> {
        let row = sqlx::query(
            r#"
            SELECT id, user_id, app, secret_encrypted, expires_at, created_at, updated_at
            FROM credential
            WHERE user_id = $1 AND app = $2
            "#,
        )
        .bind(user_id)
        .bind(app.as_str())
        .fetch_optional(&self.pool)
        .await?;

        row.map(|r| self.row_to_credential(r)).transpose()
    }

    /// Replace the access/refresh token after a successful refresh (C3),
    /// leaving everything else untouched.
    pub async fn update_tokens(
        &self,
        user_id: Uuid,
        app: App,
        tokens: TokenSet,
    ) -> Result<Credential, CredentialError> {
        let payload = EncryptedPayload {
            access_token: tokens.access_token,
            refresh_token: tokens.refresh_token,
            metadata: tokens.metadata,
        };
        let encrypted = encrypt_json(&payload, &self.key)?;

        let row = sqlx::query(
            r#"
            UPDATE credential
            SET secret_encrypted = $3, expires_at = $4, updated_at = NOW()
            WHERE user_id = $1 AND app = $2
            RETURNING id, user_id, app, secret_encrypted, expires_at, created_at, updated_at
            "#,
        )
        .bind(user_id)
        .bind(app.as_str())
        .bind(&encrypted)
        .bind(tokens.expires_at)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(CredentialError::NotFound)?;

        self.row_to_credential(row)
    }

    pub async fn delete(&self, user_id: Uuid, app: App) -> Result<(), CredentialError> {
        sqlx::query("DELETE FROM credential WHERE user_id = $1 AND app = $2")
            .bind(user_id)
            .bind(app.as_str())
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}
