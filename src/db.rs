use anyhow::Context;
use async_trait::async_trait;
use sqlx::{postgres::PgPoolOptions, PgPool};
use tracing::{debug, error};

use crate::accounts::repo_types::{NewUser, User};
use crate::store::{StoreError, UserStore};

#[derive(Clone)]
pub struct PgUserStore {
    db: PgPool,
}

impl PgUserStore {
    pub async fn connect(database_url: &str) -> anyhow::Result<Self> {
        let db = PgPoolOptions::new()
            .max_connections(10)
            .connect(database_url)
            .await
            .context("connect to database")?;
        Ok(Self { db })
    }

    pub async fn ensure_schema(&self) -> anyhow::Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS users (
                id        SERIAL PRIMARY KEY,
                email     TEXT NOT NULL UNIQUE,
                password  TEXT NOT NULL,
                is_active BOOLEAN NOT NULL DEFAULT TRUE
            )
            "#,
        )
        .execute(&self.db)
        .await
        .context("create users table")?;
        Ok(())
    }
}

#[async_trait]
impl UserStore for PgUserStore {
    async fn list_all(&self) -> Result<Vec<User>, StoreError> {
        let users = sqlx::query_as::<_, User>(
            r#"
            SELECT id, email, password, is_active
            FROM users
            ORDER BY id
            "#,
        )
        .fetch_all(&self.db)
        .await
        .context("list users")?;
        Ok(users)
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, email, password, is_active
            FROM users
            WHERE email = $1
            "#,
        )
        .bind(email)
        .fetch_optional(&self.db)
        .await
        .context("find user by email")?;
        Ok(user)
    }

    async fn find_by_id(&self, id: i32) -> Result<Option<User>, StoreError> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, email, password, is_active
            FROM users
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.db)
        .await
        .context("find user by id")?;
        Ok(user)
    }

    async fn create(&self, new: NewUser) -> Result<User, StoreError> {
        let res = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (email, password, is_active)
            VALUES ($1, $2, TRUE)
            RETURNING id, email, password, is_active
            "#,
        )
        .bind(&new.email)
        .bind(&new.password)
        .fetch_one(&self.db)
        .await;

        match res {
            Ok(user) => Ok(user),
            Err(sqlx::Error::Database(e)) if e.is_unique_violation() => {
                debug!(email = %new.email, "insert hit unique constraint");
                Err(StoreError::DuplicateEmail)
            }
            Err(e) => Err(anyhow::Error::new(e).context("insert user").into()),
        }
    }

    async fn delete(&self, id: i32) -> Result<bool, StoreError> {
        let mut tx = self.db.begin().await.context("begin tx")?;

        let res = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await;

        match res {
            Ok(done) => {
                tx.commit().await.context("commit tx")?;
                Ok(done.rows_affected() > 0)
            }
            Err(e) => {
                if let Err(rb) = tx.rollback().await {
                    error!(error = %rb, user_id = id, "rollback failed");
                }
                Err(anyhow::Error::new(e).context("delete user").into())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // Runs only against a real Postgres; skipped when DATABASE_URL is unset.
    async fn pg_store() -> Option<PgUserStore> {
        let url = std::env::var("DATABASE_URL").ok()?;
        let store = PgUserStore::connect(&url).await.expect("connect to DATABASE_URL");
        store.ensure_schema().await.expect("ensure schema");
        Some(store)
    }

    fn unique_email(tag: &str) -> String {
        let nanos = time::OffsetDateTime::now_utc().unix_timestamp_nanos();
        format!("{tag}-{nanos}@example.com")
    }

    #[tokio::test]
    async fn pg_create_rejects_duplicate_and_delete_commits() {
        let Some(store) = pg_store().await else {
            return;
        };
        let email = unique_email("pg-delete");

        let user = store
            .create(NewUser {
                email: email.clone(),
                password: "pw".into(),
            })
            .await
            .expect("create user");
        assert!(user.is_active);

        let dup = store
            .create(NewUser {
                email: email.clone(),
                password: "other".into(),
            })
            .await;
        assert!(matches!(dup, Err(StoreError::DuplicateEmail)));

        assert!(store.delete(user.id).await.expect("delete user"));
        assert!(store.find_by_id(user.id).await.unwrap().is_none());
        assert!(store.find_by_email(&email).await.unwrap().is_none());
        assert!(!store.delete(user.id).await.expect("second delete"));
    }
}
