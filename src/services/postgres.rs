use chrono::{DateTime, Utc};
use sqlx::postgres::{PgPoolOptions, PgRow};
use sqlx::{PgPool, Row};
use std::time::Duration;

use crate::models::{MatchPair, Message, Profile, User, UserId};
use crate::services::store::{ProfileStore, StoreError};

/// Postgres-backed store of record.
///
/// Relationship sets are normalized join tables with composite primary keys,
/// so every set append is `INSERT ... ON CONFLICT DO NOTHING` and duplicates
/// are impossible at the storage layer. Compound updates run inside
/// transactions; match formation locks both user rows in ascending-id order
/// before checking reciprocity.
pub struct PgStore {
    pool: PgPool,
}

fn unique_violation(err: &sqlx::Error) -> bool {
    matches!(err, sqlx::Error::Database(db) if db.code().as_deref() == Some("23505"))
}

fn user_from_row(row: &PgRow) -> User {
    User {
        id: row.get("id"),
        username: row.get("username"),
        password_hash: row.get("password_hash"),
        email: row.get("email"),
        created_at: row.get("created_at"),
    }
}

fn profile_from_row(row: &PgRow) -> Profile {
    Profile {
        user_id: row.get("user_id"),
        first_name: row.get("first_name"),
        last_name: row.get("last_name"),
        birthday: row.get("birthday"),
        gender: row.get("gender"),
        description: row.get("description"),
        interests: row
            .get::<Option<Vec<String>>, _>("interests")
            .unwrap_or_default(),
        photo: row.get("photo"),
    }
}

fn message_from_row(row: &PgRow) -> Message {
    Message {
        id: row.get("id"),
        sender_id: row.get("sender_id"),
        receiver_id: row.get("receiver_id"),
        body: row.get("body"),
        sent_at: row.get("sent_at"),
    }
}

impl PgStore {
    /// Connect and run pending migrations.
    pub async fn new(
        database_url: &str,
        max_connections: u32,
        min_connections: u32,
    ) -> Result<Self, StoreError> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .min_connections(min_connections)
            .acquire_timeout(Duration::from_secs(5))
            .idle_timeout(Duration::from_secs(600))
            .test_before_acquire(true)
            .connect(database_url)
            .await?;

        sqlx::migrate!("./migrations")
            .run(&pool)
            .await
            .map_err(|e| StoreError::Database(sqlx::Error::Migrate(Box::new(e))))?;

        Ok(Self { pool })
    }

    pub async fn from_settings(
        url: &str,
        max_connections: Option<u32>,
        min_connections: Option<u32>,
    ) -> Result<Self, StoreError> {
        tracing::info!("Connecting to PostgreSQL");

        Self::new(
            url,
            max_connections.unwrap_or(10),
            min_connections.unwrap_or(1),
        )
        .await
    }

    /// Health check for the database connection
    pub async fn health_check(&self) -> Result<bool, StoreError> {
        sqlx::query("SELECT 1")
            .fetch_one(&self.pool)
            .await
            .map(|_| true)
            .map_err(Into::into)
    }
}

impl ProfileStore for PgStore {
    async fn create_user(
        &self,
        username: &str,
        password_hash: &str,
        email: Option<&str>,
        default_photo: &str,
    ) -> Result<User, StoreError> {
        let mut tx = self.pool.begin().await?;

        let row = sqlx::query(
            r#"
            INSERT INTO users (username, password_hash, email)
            VALUES ($1, $2, $3)
            RETURNING id, username, password_hash, email, created_at
            "#,
        )
        .bind(username)
        .bind(password_hash)
        .bind(email)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| {
            if unique_violation(&e) {
                StoreError::AlreadyExists(format!("user {} is already registered", username))
            } else {
                StoreError::Database(e)
            }
        })?;

        let user = user_from_row(&row);

        sqlx::query("INSERT INTO profiles (user_id, photo) VALUES ($1, $2)")
            .bind(user.id)
            .bind(default_photo)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        tracing::debug!("Created user {} ({})", user.id, user.username);

        Ok(user)
    }

    async fn get_user(&self, id: UserId) -> Result<User, StoreError> {
        let row = sqlx::query(
            "SELECT id, username, password_hash, email, created_at FROM users WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(|r| user_from_row(&r))
            .ok_or_else(|| StoreError::NotFound(format!("user {}", id)))
    }

    async fn get_user_by_username(&self, username: &str) -> Result<User, StoreError> {
        let row = sqlx::query(
            "SELECT id, username, password_hash, email, created_at FROM users WHERE username = $1",
        )
        .bind(username)
        .fetch_optional(&self.pool)
        .await?;

        row.map(|r| user_from_row(&r))
            .ok_or_else(|| StoreError::NotFound(format!("user {}", username)))
    }

    async fn get_profile(&self, user_id: UserId) -> Result<Profile, StoreError> {
        let row = sqlx::query(
            r#"
            SELECT user_id, first_name, last_name, birthday, gender,
                   description, interests, photo
            FROM profiles
            WHERE user_id = $1
            "#,
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(|r| profile_from_row(&r))
            .ok_or_else(|| StoreError::NotFound(format!("profile for user {}", user_id)))
    }

    async fn update_profile(&self, profile: &Profile) -> Result<(), StoreError> {
        let result = sqlx::query(
            r#"
            UPDATE profiles
            SET first_name = $2, last_name = $3, birthday = $4, gender = $5,
                description = $6, interests = $7, photo = $8
            WHERE user_id = $1
            "#,
        )
        .bind(profile.user_id)
        .bind(&profile.first_name)
        .bind(&profile.last_name)
        .bind(profile.birthday)
        .bind(&profile.gender)
        .bind(&profile.description)
        .bind(&profile.interests)
        .bind(&profile.photo)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound(format!(
                "profile for user {}",
                profile.user_id
            )));
        }

        Ok(())
    }

    async fn find_unseen_profile(
        &self,
        excluded: &[UserId],
    ) -> Result<Option<Profile>, StoreError> {
        // Ascending user id gives a deterministic selection policy.
        let row = sqlx::query(
            r#"
            SELECT user_id, first_name, last_name, birthday, gender,
                   description, interests, photo
            FROM profiles
            WHERE user_id <> ALL($1)
            ORDER BY user_id ASC
            LIMIT 1
            "#,
        )
        .bind(excluded.to_vec())
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|r| profile_from_row(&r)))
    }

    async fn seen_ids(&self, viewer: UserId) -> Result<Vec<UserId>, StoreError> {
        let rows = sqlx::query("SELECT target_id FROM seen_profiles WHERE viewer_id = $1")
            .bind(viewer)
            .fetch_all(&self.pool)
            .await?;

        Ok(rows.iter().map(|r| r.get("target_id")).collect())
    }

    async fn has_seen(&self, viewer: UserId, target: UserId) -> Result<bool, StoreError> {
        let row = sqlx::query(
            "SELECT 1 AS one FROM seen_profiles WHERE viewer_id = $1 AND target_id = $2",
        )
        .bind(viewer)
        .bind(target)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.is_some())
    }

    async fn mark_seen(&self, viewer: UserId, target: UserId) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO seen_profiles (viewer_id, target_id, seen_at)
            VALUES ($1, $2, NOW())
            ON CONFLICT (viewer_id, target_id) DO NOTHING
            "#,
        )
        .bind(viewer)
        .bind(target)
        .execute(&self.pool)
        .await?;

        tracing::debug!("Marked seen: {} -> {}", viewer, target);

        Ok(())
    }

    async fn apply_like(&self, actor: UserId, target: UserId) -> Result<(), StoreError> {
        // The like edge and the exclusion entry commit together, so a
        // concurrent selector can never observe the like without the
        // exclusion.
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            INSERT INTO likes (liker_id, likee_id, created_at)
            VALUES ($1, $2, NOW())
            ON CONFLICT (liker_id, likee_id) DO NOTHING
            "#,
        )
        .bind(actor)
        .bind(target)
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            r#"
            INSERT INTO seen_profiles (viewer_id, target_id, seen_at)
            VALUES ($1, $2, NOW())
            ON CONFLICT (viewer_id, target_id) DO NOTHING
            "#,
        )
        .bind(actor)
        .bind(target)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        tracing::debug!("Recorded like: {} -> {}", actor, target);

        Ok(())
    }

    async fn is_liked_by(&self, liker: UserId, likee: UserId) -> Result<bool, StoreError> {
        let row = sqlx::query("SELECT 1 AS one FROM likes WHERE liker_id = $1 AND likee_id = $2")
            .bind(liker)
            .bind(likee)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.is_some())
    }

    async fn likes_sent(&self, user: UserId) -> Result<Vec<UserId>, StoreError> {
        let rows = sqlx::query("SELECT likee_id FROM likes WHERE liker_id = $1")
            .bind(user)
            .fetch_all(&self.pool)
            .await?;

        Ok(rows.iter().map(|r| r.get("likee_id")).collect())
    }

    async fn likes_received(&self, user: UserId) -> Result<Vec<UserId>, StoreError> {
        let rows = sqlx::query("SELECT liker_id FROM likes WHERE likee_id = $1")
            .bind(user)
            .fetch_all(&self.pool)
            .await?;

        Ok(rows.iter().map(|r| r.get("liker_id")).collect())
    }

    async fn try_create_match(&self, a: UserId, b: UserId) -> Result<bool, StoreError> {
        let mut tx = self.pool.begin().await?;

        // Lock both user rows in ascending-id order so two concurrent
        // check_and_match calls on the same pair serialize without deadlock.
        sqlx::query("SELECT id FROM users WHERE id = ANY($1) ORDER BY id FOR UPDATE")
            .bind(vec![a, b])
            .fetch_all(&mut *tx)
            .await?;

        // Reciprocity is re-checked under the lock: both directed edges must
        // exist at commit time.
        let row = sqlx::query(
            r#"
            SELECT COUNT(*) AS edge_count
            FROM likes
            WHERE (liker_id = $1 AND likee_id = $2)
               OR (liker_id = $2 AND likee_id = $1)
            "#,
        )
        .bind(a)
        .bind(b)
        .fetch_one(&mut *tx)
        .await?;

        let edge_count: i64 = row.get("edge_count");
        if edge_count < 2 {
            tx.rollback().await?;
            return Ok(false);
        }

        let result = sqlx::query(
            r#"
            INSERT INTO matches (user_low, user_high, matched_at)
            VALUES (LEAST($1, $2), GREATEST($1, $2), NOW())
            ON CONFLICT (user_low, user_high) DO NOTHING
            "#,
        )
        .bind(a)
        .bind(b)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        let created = result.rows_affected() > 0;
        if created {
            tracing::info!("Match formed: {{{}, {}}}", a.min(b), a.max(b));
        }

        Ok(created)
    }

    async fn are_matched(&self, a: UserId, b: UserId) -> Result<bool, StoreError> {
        let row = sqlx::query(
            r#"
            SELECT 1 AS one
            FROM matches
            WHERE user_low = LEAST($1, $2) AND user_high = GREATEST($1, $2)
            "#,
        )
        .bind(a)
        .bind(b)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.is_some())
    }

    async fn matches_of(&self, user: UserId) -> Result<Vec<MatchPair>, StoreError> {
        let rows = sqlx::query(
            r#"
            SELECT user_low, user_high, matched_at
            FROM matches
            WHERE user_low = $1 OR user_high = $1
            ORDER BY matched_at ASC
            "#,
        )
        .bind(user)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .iter()
            .map(|r| MatchPair {
                user_low: r.get("user_low"),
                user_high: r.get("user_high"),
                matched_at: r.get("matched_at"),
            })
            .collect())
    }

    async fn insert_message(
        &self,
        sender: UserId,
        receiver: UserId,
        body: &str,
        sent_at: DateTime<Utc>,
    ) -> Result<i64, StoreError> {
        let row = sqlx::query(
            r#"
            INSERT INTO messages (sender_id, receiver_id, body, sent_at)
            VALUES ($1, $2, $3, $4)
            RETURNING id
            "#,
        )
        .bind(sender)
        .bind(receiver)
        .bind(body)
        .bind(sent_at)
        .fetch_one(&self.pool)
        .await?;

        Ok(row.get("id"))
    }

    async fn messages_involving(&self, user: UserId) -> Result<Vec<Message>, StoreError> {
        let rows = sqlx::query(
            r#"
            SELECT id, sender_id, receiver_id, body, sent_at
            FROM messages
            WHERE sender_id = $1 OR receiver_id = $1
            ORDER BY sent_at ASC, id ASC
            "#,
        )
        .bind(user)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.iter().map(message_from_row).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unique_violation_detection() {
        let err = sqlx::Error::RowNotFound;
        assert!(!unique_violation(&err));
    }
}
