/// Registration, login and email lookup
///
/// # Registration
///
/// Checks run in this order, and the first failure wins:
///
/// 1. Field format (fullname 1-150 characters, valid email)
/// 2. `password == repeated_password`
/// 3. Email not already used (case-insensitive)
/// 4. Password strength policy
///
/// The username is derived from the email local-part, with `_1`, `_2`, ...
/// appended on collision. The fullname is split into a first name (first
/// word) and last name (the rest).
///
/// # Login
///
/// Every credential failure yields the same message, so a client cannot
/// tell an unknown email from a wrong password or a disabled account.

use serde::Deserialize;
use tracing::{info, warn};
use validator::Validate;

use super::{trimmed, REQUIRED};
use crate::auth::password::{hash_password_with, verify_password, HashParams, PasswordPolicy};
use crate::error::{KanbanError, KanbanResult};
use crate::models::user::{CreateUser, User};
use crate::store::{KanbanStore, StoreError, TokenIssuer};

/// Longest username the schema accepts
pub const USERNAME_MAX_LENGTH: usize = 150;

/// Generic login failure message
pub const INVALID_CREDENTIALS: &str = "Invalid email or password.";

/// Hashing cost and password policy used by registration
#[derive(Debug, Clone, Default)]
pub struct AccountSettings {
    pub hash_params: HashParams,
    pub password_policy: PasswordPolicy,
}

/// Registration request
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct Registration {
    #[validate(length(min = 1, max = 150, message = "Fullname must be between 1 and 150 characters."))]
    pub fullname: String,

    #[validate(email(message = "Enter a valid email address."))]
    pub email: String,

    pub password: String,

    pub repeated_password: String,
}

/// Login request
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct Credentials {
    #[validate(email(message = "Enter a valid email address."))]
    pub email: String,

    pub password: String,
}

/// Email lookup query
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct EmailLookup {
    #[validate(email(message = "Enter a valid email address."))]
    pub email: Option<String>,
}

/// Authenticated user plus their token
#[derive(Debug, Clone)]
pub struct Session {
    pub token: String,
    pub user: User,
}

/// Registers a new account and issues its token
pub async fn register(
    store: &dyn KanbanStore,
    tokens: &dyn TokenIssuer,
    settings: &AccountSettings,
    mut input: Registration,
) -> KanbanResult<Session> {
    input.fullname = trimmed(&input.fullname);
    input.email = trimmed(&input.email);
    input.validate()?;

    if input.password != input.repeated_password {
        return Err(KanbanError::non_field("Passwords do not match."));
    }

    if store.email_exists(&input.email).await? {
        return Err(KanbanError::non_field("Email is already in use."));
    }

    settings
        .password_policy
        .validate(&input.password)
        .map_err(KanbanError::non_field)?;

    let (first_name, last_name) = split_fullname(&input.fullname);
    let password_hash = hash_password_with(&input.password, &settings.hash_params)?;

    let mut retried = false;
    let user = loop {
        let username = unique_username(store, &input.email).await?;
        let data = CreateUser {
            username,
            email: input.email.clone(),
            first_name: first_name.clone(),
            last_name: last_name.clone(),
            password_hash: password_hash.clone(),
        };

        match store.create_user(data).await {
            Ok(user) => break user,
            // Lost a race with a concurrent registration
            Err(StoreError::Conflict(_)) => {
                if store.email_exists(&input.email).await? {
                    return Err(KanbanError::non_field("Email is already in use."));
                }
                if retried {
                    return Err(KanbanError::non_field(
                        "Could not allocate a username. Please try again.",
                    ));
                }
                warn!(email = %input.email, "Username taken concurrently, retrying");
                retried = true;
            }
            Err(e) => return Err(e.into()),
        }
    };

    let token = tokens.issue(user.id).await?;

    info!(user_id = user.id, username = %user.username, "User registered");

    Ok(Session { token, user })
}

/// Authenticates by email and password
///
/// Returns the user's existing token, or issues one on first login.
pub async fn login(
    store: &dyn KanbanStore,
    tokens: &dyn TokenIssuer,
    mut input: Credentials,
) -> KanbanResult<Session> {
    input.email = trimmed(&input.email);
    input.validate()?;

    let invalid = || KanbanError::non_field(INVALID_CREDENTIALS);

    let user = store
        .find_user_by_email(&input.email)
        .await?
        .ok_or_else(invalid)?;

    if !user.is_active {
        warn!(user_id = user.id, "Login attempt for inactive account");
        return Err(invalid());
    }

    if !verify_password(&input.password, &user.password_hash)? {
        return Err(invalid());
    }

    let token = tokens.issue(user.id).await?;

    info!(user_id = user.id, "User logged in");

    Ok(Session { token, user })
}

/// Finds the first account with this email (case-insensitive)
pub async fn find_by_email(store: &dyn KanbanStore, mut query: EmailLookup) -> KanbanResult<User> {
    query.email = query.email.as_deref().map(trimmed);
    query.validate()?;

    let email = query
        .email
        .filter(|e| !e.is_empty())
        .ok_or_else(|| KanbanError::field("email", REQUIRED))?;

    store
        .find_user_by_email(&email)
        .await?
        .ok_or_else(|| KanbanError::NotFound("No user with this email address.".to_string()))
}

/// Splits a fullname into first word and remainder
pub fn split_fullname(fullname: &str) -> (String, String) {
    let mut parts = fullname.split_whitespace();
    let first = parts.next().unwrap_or_default().to_string();
    let rest = parts.collect::<Vec<_>>().join(" ");
    (first, rest)
}

/// Username stem: the email local-part, or `user` if it is empty
pub fn username_base(email: &str) -> String {
    let local = email.split('@').next().unwrap_or_default();
    let local = if local.is_empty() { "user" } else { local };
    local.chars().take(USERNAME_MAX_LENGTH).collect()
}

/// The `n`-th username candidate for a stem
///
/// Candidate 0 is the stem itself. Later candidates append `_n`, cutting the
/// stem so the result stays within [`USERNAME_MAX_LENGTH`].
pub fn username_candidate(base: &str, n: u32) -> String {
    if n == 0 {
        return base.to_string();
    }

    let suffix = format!("_{n}");
    let keep = USERNAME_MAX_LENGTH.saturating_sub(suffix.len());
    let stem: String = base.chars().take(keep).collect();
    format!("{stem}{suffix}")
}

async fn unique_username(store: &dyn KanbanStore, email: &str) -> KanbanResult<String> {
    let base = username_base(email);
    let mut n = 0;

    loop {
        let candidate = username_candidate(&base, n);
        if !store.username_exists(&candidate).await? {
            return Ok(candidate);
        }
        n += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::NON_FIELD_ERRORS;
    use crate::store::memory::MemoryStore;
    use crate::store::racing::RacingStore;
    use std::sync::atomic::Ordering;

    fn settings() -> AccountSettings {
        AccountSettings {
            hash_params: HashParams::minimal(),
            password_policy: PasswordPolicy::default(),
        }
    }

    fn registration(email: &str) -> Registration {
        Registration {
            fullname: "Ada King Lovelace".to_string(),
            email: email.to_string(),
            password: "analytical engine".to_string(),
            repeated_password: "analytical engine".to_string(),
        }
    }

    fn non_field_message(err: KanbanError) -> String {
        match err {
            KanbanError::Validation(fields) => {
                assert_eq!(fields[0].field, NON_FIELD_ERRORS);
                fields[0].message.clone()
            }
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn test_split_fullname() {
        assert_eq!(split_fullname("Ada"), ("Ada".to_string(), String::new()));
        assert_eq!(
            split_fullname("  Ada   King  Lovelace "),
            ("Ada".to_string(), "King Lovelace".to_string())
        );
        assert_eq!(split_fullname(""), (String::new(), String::new()));
    }

    #[test]
    fn test_username_base() {
        assert_eq!(username_base("ada@example.com"), "ada");
        assert_eq!(username_base("@example.com"), "user");
        assert_eq!(username_base(&format!("{}@x.com", "a".repeat(200))).len(), 150);
    }

    #[test]
    fn test_username_candidate_respects_max_length() {
        assert_eq!(username_candidate("ada", 0), "ada");
        assert_eq!(username_candidate("ada", 2), "ada_2");

        let long = "a".repeat(150);
        let candidate = username_candidate(&long, 12);
        assert_eq!(candidate.len(), 150);
        assert!(candidate.ends_with("_12"));
    }

    #[tokio::test]
    async fn test_register_creates_user_and_token() {
        let store = MemoryStore::new();
        let session = register(&store, &store, &settings(), registration(" ada@example.com "))
            .await
            .unwrap();

        assert_eq!(session.user.username, "ada");
        assert_eq!(session.user.email, "ada@example.com");
        assert_eq!(session.user.first_name, "Ada");
        assert_eq!(session.user.last_name, "King Lovelace");
        assert_eq!(store.resolve(&session.token).await.unwrap(), Some(session.user.id));
    }

    #[tokio::test]
    async fn test_register_password_mismatch_creates_nothing() {
        let store = MemoryStore::new();
        let mut input = registration("ada@example.com");
        input.repeated_password = "something else".to_string();

        let err = register(&store, &store, &settings(), input).await.unwrap_err();
        assert_eq!(non_field_message(err), "Passwords do not match.");
        assert!(!store.email_exists("ada@example.com").await.unwrap());
    }

    #[tokio::test]
    async fn test_register_same_email_twice_fails() {
        let store = MemoryStore::new();
        register(&store, &store, &settings(), registration("ada@example.com"))
            .await
            .unwrap();

        let err = register(&store, &store, &settings(), registration("ADA@example.com"))
            .await
            .unwrap_err();
        assert_eq!(non_field_message(err), "Email is already in use.");
    }

    #[tokio::test]
    async fn test_register_shared_local_part_gets_distinct_usernames() {
        let store = MemoryStore::new();
        let first = register(&store, &store, &settings(), registration("a@x.com"))
            .await
            .unwrap();
        let second = register(&store, &store, &settings(), registration("a@y.com"))
            .await
            .unwrap();
        let third = register(&store, &store, &settings(), registration("a@z.com"))
            .await
            .unwrap();

        assert_eq!(first.user.username, "a");
        assert_eq!(second.user.username, "a_1");
        assert_eq!(third.user.username, "a_2");
    }

    #[tokio::test]
    async fn test_register_retries_username_taken_concurrently() {
        let store = RacingStore::new();
        register(&store, &store.inner, &settings(), registration("a@x.com"))
            .await
            .unwrap();

        store.stale_username_check.store(true, Ordering::SeqCst);
        let session = register(&store, &store.inner, &settings(), registration("a@y.com"))
            .await
            .unwrap();

        assert_eq!(session.user.username, "a_1");
        assert_eq!(session.user.email, "a@y.com");
    }

    #[tokio::test]
    async fn test_register_weak_password() {
        let store = MemoryStore::new();
        let mut input = registration("ada@example.com");
        input.password = "12345678".to_string();
        input.repeated_password = "12345678".to_string();

        let err = register(&store, &store, &settings(), input).await.unwrap_err();
        assert!(non_field_message(err).contains("entirely numeric"));
    }

    #[tokio::test]
    async fn test_register_field_errors() {
        let store = MemoryStore::new();
        let mut input = registration("not-an-email");
        input.fullname = "   ".to_string();

        match register(&store, &store, &settings(), input).await.unwrap_err() {
            KanbanError::Validation(fields) => {
                let names: Vec<&str> = fields.iter().map(|f| f.field.as_str()).collect();
                assert_eq!(names, vec!["email", "fullname"]);
            }
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_login_reuses_token() {
        let store = MemoryStore::new();
        let registered = register(&store, &store, &settings(), registration("ada@example.com"))
            .await
            .unwrap();

        let session = login(
            &store,
            &store,
            Credentials {
                email: "ADA@example.com".to_string(),
                password: "analytical engine".to_string(),
            },
        )
        .await
        .unwrap();

        assert_eq!(session.user.id, registered.user.id);
        assert_eq!(session.token, registered.token);
    }

    #[tokio::test]
    async fn test_login_failures_are_indistinguishable() {
        let store = MemoryStore::new();
        let registered = register(&store, &store, &settings(), registration("ada@example.com"))
            .await
            .unwrap();

        let wrong_password = login(
            &store,
            &store,
            Credentials {
                email: "ada@example.com".to_string(),
                password: "wrong password".to_string(),
            },
        )
        .await
        .unwrap_err();

        let unknown_email = login(
            &store,
            &store,
            Credentials {
                email: "nobody@example.com".to_string(),
                password: "analytical engine".to_string(),
            },
        )
        .await
        .unwrap_err();

        store.set_user_active(registered.user.id, false).unwrap();
        let inactive = login(
            &store,
            &store,
            Credentials {
                email: "ada@example.com".to_string(),
                password: "analytical engine".to_string(),
            },
        )
        .await
        .unwrap_err();

        assert_eq!(non_field_message(wrong_password), INVALID_CREDENTIALS);
        assert_eq!(non_field_message(unknown_email), INVALID_CREDENTIALS);
        assert_eq!(non_field_message(inactive), INVALID_CREDENTIALS);
    }

    #[tokio::test]
    async fn test_find_by_email() {
        let store = MemoryStore::new();
        let registered = register(&store, &store, &settings(), registration("ada@example.com"))
            .await
            .unwrap();

        let found = find_by_email(
            &store,
            EmailLookup {
                email: Some("Ada@Example.com".to_string()),
            },
        )
        .await
        .unwrap();
        assert_eq!(found.id, registered.user.id);

        let missing = find_by_email(
            &store,
            EmailLookup {
                email: Some("bob@example.com".to_string()),
            },
        )
        .await
        .unwrap_err();
        assert!(matches!(missing, KanbanError::NotFound(_)));

        let malformed = find_by_email(
            &store,
            EmailLookup {
                email: Some("bob".to_string()),
            },
        )
        .await
        .unwrap_err();
        assert!(matches!(malformed, KanbanError::Validation(_)));

        let absent = find_by_email(&store, EmailLookup::default()).await.unwrap_err();
        assert!(matches!(absent, KanbanError::Validation(_)));
    }
}
