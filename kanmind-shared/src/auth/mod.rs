/// Authentication and authorization utilities
///
/// # Modules
///
/// - [`password`]: Argon2id password hashing and the strength policy
/// - [`token`]: Opaque login token generation
/// - [`authorization`]: Pure board, task and comment permission predicates
/// - [`middleware`]: Axum middleware resolving `Authorization` headers to an `AuthContext`
///
/// # Example
///
/// ```no_run
/// use kanmind_shared::auth::password::{hash_password, verify_password};
/// use kanmind_shared::auth::token::generate_token_key;
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let hash = hash_password("user_password")?;
/// assert!(verify_password("user_password", &hash)?);
///
/// let key = generate_token_key();
/// assert_eq!(key.len(), 40);
/// # Ok(())
/// # }
/// ```

pub mod authorization;
pub mod middleware;
pub mod password;
pub mod token;
