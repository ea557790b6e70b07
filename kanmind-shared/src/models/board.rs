/// Board model and database operations
///
/// A board has exactly one owner and a set of members. The owner is not
/// implicitly part of `board_members`; access rules treat "owner or member"
/// as participation (see `auth::authorization`).
///
/// # Schema
///
/// ```sql
/// CREATE TABLE boards (
///     id BIGSERIAL PRIMARY KEY,
///     title VARCHAR(100) NOT NULL,
///     owner_id BIGINT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
///
/// CREATE TABLE board_members (
///     board_id BIGINT NOT NULL REFERENCES boards(id) ON DELETE CASCADE,
///     user_id BIGINT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
///     PRIMARY KEY (board_id, user_id)
/// );
/// ```
///
/// # Derived counts
///
/// `member_count`, `ticket_count`, `tasks_to_do_count` and
/// `tasks_high_prio_count` are never stored. They are computed by one
/// aggregating query (`COUNT(DISTINCT ...) FILTER (WHERE ...)`), so listing
/// boards costs a single round-trip regardless of how many tasks exist.
///
/// # Example
///
/// ```no_run
/// use kanmind_shared::models::board::Board;
/// use sqlx::PgPool;
///
/// # async fn example(pool: PgPool, owner_id: i64, member_id: i64) -> Result<(), sqlx::Error> {
/// let board = Board::create(&pool, owner_id, "Sprint 12", &[member_id]).await?;
/// let summaries = Board::list_for_user(&pool, member_id).await?;
/// assert!(summaries.iter().any(|s| s.id == board.id));
/// # Ok(())
/// # }
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;

/// Board with its current member set
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Board {
    pub id: i64,

    pub title: String,

    /// Immutable after creation
    pub owner_id: i64,

    pub created_at: DateTime<Utc>,

    /// Explicit members, ascending by user ID
    pub member_ids: Vec<i64>,
}

impl Board {
    /// True if `user_id` is listed in `members` (ownership not considered)
    pub fn has_member(&self, user_id: i64) -> bool {
        self.member_ids.contains(&user_id)
    }
}

/// The four derived counts of a board
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct BoardCounts {
    pub member_count: i64,
    pub ticket_count: i64,
    pub tasks_to_do_count: i64,
    pub tasks_high_prio_count: i64,
}

/// Board list entry annotated with its derived counts
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct BoardSummary {
    pub id: i64,
    pub title: String,
    pub owner_id: i64,

    #[sqlx(flatten)]
    #[serde(flatten)]
    pub counts: BoardCounts,
}

const BOARD_SELECT: &str = r#"
    SELECT b.id, b.title, b.owner_id, b.created_at,
           ARRAY(
               SELECT bm.user_id FROM board_members bm
               WHERE bm.board_id = b.id
               ORDER BY bm.user_id
           ) AS member_ids
    FROM boards b
"#;

const SUMMARY_SELECT: &str = r#"
    SELECT b.id, b.title, b.owner_id,
           COUNT(DISTINCT bm.user_id) AS member_count,
           COUNT(DISTINCT t.id) AS ticket_count,
           COUNT(DISTINCT t.id) FILTER (WHERE t.status = 'to-do') AS tasks_to_do_count,
           COUNT(DISTINCT t.id) FILTER (WHERE t.priority = 'high') AS tasks_high_prio_count
    FROM boards b
    LEFT JOIN board_members bm ON bm.board_id = b.id
    LEFT JOIN tasks t ON t.board_id = b.id
"#;

impl Board {
    /// Creates a board and inserts its initial members
    ///
    /// Board row and membership rows are written in one transaction.
    /// Duplicate member IDs are ignored.
    ///
    /// # Errors
    ///
    /// Returns an error if the owner or a member does not exist
    /// (foreign key violation) or the database is unreachable.
    pub async fn create(
        pool: &PgPool,
        owner_id: i64,
        title: &str,
        member_ids: &[i64],
    ) -> Result<Self, sqlx::Error> {
        let mut tx = pool.begin().await?;

        let (board_id,): (i64,) =
            sqlx::query_as("INSERT INTO boards (title, owner_id) VALUES ($1, $2) RETURNING id")
                .bind(title)
                .bind(owner_id)
                .fetch_one(&mut *tx)
                .await?;

        if !member_ids.is_empty() {
            sqlx::query(
                r#"
                INSERT INTO board_members (board_id, user_id)
                SELECT $1, UNNEST($2::BIGINT[])
                ON CONFLICT DO NOTHING
                "#,
            )
            .bind(board_id)
            .bind(member_ids)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;

        Self::find_by_id(pool, board_id)
            .await?
            .ok_or(sqlx::Error::RowNotFound)
    }

    /// Finds a board (with members) by ID
    pub async fn find_by_id(pool: &PgPool, id: i64) -> Result<Option<Self>, sqlx::Error> {
        let query = format!("{BOARD_SELECT} WHERE b.id = $1");

        sqlx::query_as::<_, Board>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Adds a single member; a no-op if already present
    pub async fn add_member(pool: &PgPool, board_id: i64, user_id: i64) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"
            INSERT INTO board_members (board_id, user_id)
            VALUES ($1, $2)
            ON CONFLICT DO NOTHING
            "#,
        )
        .bind(board_id)
        .bind(user_id)
        .execute(pool)
        .await?;

        Ok(())
    }

    /// Replaces the title
    pub async fn update_title(pool: &PgPool, id: i64, title: &str) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("UPDATE boards SET title = $2 WHERE id = $1")
            .bind(id)
            .bind(title)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Replaces the whole member set
    ///
    /// Delete-then-insert inside one transaction. Concurrent replacements on
    /// the same board are not coordinated: the last commit wins.
    pub async fn replace_members(
        pool: &PgPool,
        board_id: i64,
        member_ids: &[i64],
    ) -> Result<(), sqlx::Error> {
        let mut tx = pool.begin().await?;

        sqlx::query("DELETE FROM board_members WHERE board_id = $1")
            .bind(board_id)
            .execute(&mut *tx)
            .await?;

        if !member_ids.is_empty() {
            sqlx::query(
                r#"
                INSERT INTO board_members (board_id, user_id)
                SELECT $1, UNNEST($2::BIGINT[])
                ON CONFLICT DO NOTHING
                "#,
            )
            .bind(board_id)
            .bind(member_ids)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await
    }

    /// Deletes a board; tasks and their comments cascade
    pub async fn delete(pool: &PgPool, id: i64) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM boards WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Lists boards the user owns or is a member of, with derived counts
    ///
    /// Ordered by board ID.
    pub async fn list_for_user(pool: &PgPool, user_id: i64) -> Result<Vec<BoardSummary>, sqlx::Error> {
        let query = format!(
            r#"
            {SUMMARY_SELECT}
            WHERE b.owner_id = $1
               OR EXISTS (
                   SELECT 1 FROM board_members m
                   WHERE m.board_id = b.id AND m.user_id = $1
               )
            GROUP BY b.id
            ORDER BY b.id ASC
            "#
        );

        sqlx::query_as::<_, BoardSummary>(&query)
            .bind(user_id)
            .fetch_all(pool)
            .await
    }

    /// Derived counts for one board
    pub async fn summary(pool: &PgPool, board_id: i64) -> Result<Option<BoardSummary>, sqlx::Error> {
        let query = format!("{SUMMARY_SELECT} WHERE b.id = $1 GROUP BY b.id");

        sqlx::query_as::<_, BoardSummary>(&query)
            .bind(board_id)
            .fetch_optional(pool)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_has_member_ignores_owner() {
        let board = Board {
            id: 1,
            title: "Roadmap".to_string(),
            owner_id: 10,
            created_at: Utc::now(),
            member_ids: vec![11, 12],
        };

        assert!(board.has_member(11));
        assert!(!board.has_member(10));
    }

    #[test]
    fn test_summary_serializes_flat_counts() {
        let summary = BoardSummary {
            id: 3,
            title: "Ops".to_string(),
            owner_id: 1,
            counts: BoardCounts {
                member_count: 2,
                ticket_count: 5,
                tasks_to_do_count: 1,
                tasks_high_prio_count: 4,
            },
        };

        let json = serde_json::to_value(&summary).unwrap();
        assert_eq!(json["member_count"], 2);
        assert_eq!(json["ticket_count"], 5);
        assert_eq!(json["tasks_to_do_count"], 1);
        assert_eq!(json["tasks_high_prio_count"], 4);
        assert!(json.get("counts").is_none());
    }
}
