//! User store queries.

use async_trait::async_trait;
use sqlx::PgPool;

use super::LookupError;
use crate::models::auth::UserRecord;

/// Read-only access to the platform's user table.
#[async_trait]
pub trait UserStore: Send + Sync {
    /// All rows whose email equals `email` exactly. At most two rows are
    /// returned; two is enough to detect ambiguity.
    async fn users_by_email(&self, email: &str) -> Result<Vec<UserRecord>, sqlx::Error>;
}

/// [`UserStore`] backed by the platform's PostgreSQL database.
#[derive(Clone)]
pub struct PgUserStore {
    pool: PgPool,
}

impl PgUserStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserStore for PgUserStore {
    async fn users_by_email(&self, email: &str) -> Result<Vec<UserRecord>, sqlx::Error> {
        let rows = sqlx::query_as::<_, (String, String, String, Option<String>, Option<String>)>(
            "SELECT id::text, email, authority, tenant_id::text, customer_id::text \
             FROM tb_user WHERE email = $1 LIMIT 2",
        )
        .bind(email)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|(id, email, authority, tenant_id, customer_id)| UserRecord {
                id,
                email,
                authority,
                tenant_id,
                customer_id,
            })
            .collect())
    }
}

/// Resolve `email` to exactly one user.
pub async fn find_user_by_email(
    store: &dyn UserStore,
    email: &str,
) -> Result<UserRecord, LookupError> {
    let mut rows = store.users_by_email(email).await?;
    match rows.len() {
        0 => Err(LookupError::NotFound(email.to_string())),
        1 => Ok(rows.remove(0)),
        _ => Err(LookupError::MultipleMatches(email.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FixedStore(Vec<UserRecord>);

    #[async_trait]
    impl UserStore for FixedStore {
        async fn users_by_email(&self, email: &str) -> Result<Vec<UserRecord>, sqlx::Error> {
            Ok(self.0.iter().filter(|u| u.email == email).cloned().collect())
        }
    }

    struct BrokenStore;

    #[async_trait]
    impl UserStore for BrokenStore {
        async fn users_by_email(&self, _email: &str) -> Result<Vec<UserRecord>, sqlx::Error> {
            Err(sqlx::Error::PoolTimedOut)
        }
    }

    fn user(id: &str, email: &str) -> UserRecord {
        UserRecord {
            id: id.into(),
            email: email.into(),
            authority: "TENANT_ADMIN".into(),
            tenant_id: Some("t1".into()),
            customer_id: None,
        }
    }

    #[tokio::test]
    async fn single_row_resolves() {
        let store = FixedStore(vec![user("1", "a"), user("2", "b")]);
        let found = find_user_by_email(&store, "b").await.unwrap();
        assert_eq!(found.id, "2");
    }

    #[tokio::test]
    async fn no_row_is_not_found() {
        let store = FixedStore(vec![user("1", "a")]);
        let err = find_user_by_email(&store, "z").await.unwrap_err();
        assert!(matches!(err, LookupError::NotFound(_)));
    }

    #[tokio::test]
    async fn duplicate_rows_are_rejected() {
        let store = FixedStore(vec![user("1", "a"), user("2", "a")]);
        let err = find_user_by_email(&store, "a").await.unwrap_err();
        assert!(matches!(err, LookupError::MultipleMatches(_)));
    }

    #[tokio::test]
    async fn store_failure_propagates() {
        let err = find_user_by_email(&BrokenStore, "a").await.unwrap_err();
        assert!(matches!(err, LookupError::Store(_)));
    }
}
