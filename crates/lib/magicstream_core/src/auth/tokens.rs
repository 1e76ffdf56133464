//! Persistence of the latest issued token pair on the user record.

use std::time::Duration;

use chrono::{DateTime, Utc};
use tracing::debug;

use super::jwt::TokenPair;
use crate::models::auth::TokenRecord;
use crate::store::{StoreError, UserStore, bounded};

/// Overwrite the stored token pair of `user_id` with `pair`, stamped `now`.
///
/// Matching no user is [`StoreError::NotFound`]. Concurrent logins for the
/// same user each replace the whole record, so the last write wins.
pub async fn persist_tokens(
    store: &dyn UserStore,
    user_id: &str,
    pair: &TokenPair,
    now: DateTime<Utc>,
    timeout: Duration,
) -> Result<(), StoreError> {
    let record = TokenRecord {
        token: pair.access_token.clone(),
        refresh_token: pair.refresh_token.clone(),
        updated_at: now,
    };
    let matched = bounded(timeout, store.update_tokens(user_id, &record)).await?;
    if matched == 0 {
        return Err(StoreError::NotFound(format!("user {user_id}")));
    }
    debug!(user_id, "token pair persisted");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::auth::{Role, User, UserRecord};
    use crate::store::memory::MemoryUserStore;

    fn pair(tag: &str) -> TokenPair {
        TokenPair {
            access_token: format!("access-{tag}"),
            refresh_token: format!("refresh-{tag}"),
            expires_in: 60,
        }
    }

    async fn store_with_user() -> MemoryUserStore {
        let store = MemoryUserStore::new();
        let user = User {
            user_id: "u1".into(),
            email: "a@b.com".into(),
            first_name: "A".into(),
            last_name: "B".into(),
            role: Role::User,
            favourite_genres: vec![],
        };
        store
            .insert_user(&UserRecord::new(user, "hash".into(), Utc::now()))
            .await
            .unwrap();
        store
    }

    #[tokio::test]
    async fn persists_pair_and_timestamp() {
        let store = store_with_user().await;
        let now = Utc::now();
        persist_tokens(&store, "u1", &pair("1"), now, Duration::from_secs(5))
            .await
            .unwrap();

        let record = store.find_by_id("u1").await.unwrap().unwrap();
        assert_eq!(record.token, "access-1");
        assert_eq!(record.refresh_token, "refresh-1");
        assert_eq!(record.updated_at, now);
    }

    #[tokio::test]
    async fn later_write_replaces_earlier() {
        let store = store_with_user().await;
        let timeout = Duration::from_secs(5);
        persist_tokens(&store, "u1", &pair("1"), Utc::now(), timeout)
            .await
            .unwrap();
        persist_tokens(&store, "u1", &pair("2"), Utc::now(), timeout)
            .await
            .unwrap();

        let record = store.find_by_id("u1").await.unwrap().unwrap();
        assert_eq!(record.token, "access-2");
        assert_eq!(record.refresh_token, "refresh-2");
    }

    #[tokio::test]
    async fn unknown_user_is_not_found() {
        let store = store_with_user().await;
        let err = persist_tokens(&store, "ghost", &pair("1"), Utc::now(), Duration::from_secs(5))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::NotFound(_)));
    }
}
