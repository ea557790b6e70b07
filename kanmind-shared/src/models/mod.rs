/// Database models for KanMind
///
/// Row types and their PostgreSQL CRUD operations. Each model exposes
/// associated async functions taking `&PgPool`; services reach them through
/// `store::PgStore`.
///
/// # Models
///
/// - `user`: User accounts
/// - `board`: Boards, membership and derived counts
/// - `task`: Tasks with status, priority, assignee and reviewer
/// - `comment`: Flat task comments
/// - `auth_token`: One opaque login token per user
///
/// # Example
///
/// ```no_run
/// use kanmind_shared::models::user::{User, CreateUser};
/// use kanmind_shared::db::pool::{create_pool, DatabaseConfig};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let pool = create_pool(DatabaseConfig::default()).await?;
///
/// let new_user = CreateUser {
///     username: "user".to_string(),
///     email: "user@example.com".to_string(),
///     first_name: "John".to_string(),
///     last_name: "Doe".to_string(),
///     password_hash: "$argon2id$...".to_string(),
/// };
///
/// let user = User::create(&pool, new_user).await?;
/// # Ok(())
/// # }
/// ```

pub mod auth_token;
pub mod board;
pub mod comment;
pub mod task;
pub mod user;
