/// Authorization predicates
///
/// Every endpoint decides access with the functions in this module. They are
/// pure functions of the requesting user ID and an entity snapshot: callers
/// load the board (and task or comment) first, answer "not found" if it is
/// missing, and only then ask whether the requester may act on it.
///
/// # Permission Model
///
/// | Check | Allowed when |
/// |---|---|
/// | board access (read, update) | requester owns the board or is a member |
/// | board delete | requester owns the board |
/// | task access (read, update, comment) | requester owns or is a member of the task's board |
/// | task delete | requester created the task or owns its board |
/// | comment delete | requester wrote the comment |
/// | assignee / reviewer eligibility | candidate owns or is a member of the board |
///
/// The owner is not necessarily listed in `Board::member_ids`; participation
/// always means "owner or member".
///
/// # Example
///
/// ```
/// use chrono::Utc;
/// use kanmind_shared::auth::authorization::{require_board_access, require_board_delete};
/// use kanmind_shared::models::board::Board;
///
/// let board = Board {
///     id: 1,
///     title: "Roadmap".to_string(),
///     owner_id: 10,
///     created_at: Utc::now(),
///     member_ids: vec![11],
/// };
///
/// assert!(require_board_access(11, &board).is_ok());
/// assert!(require_board_delete(11, &board).is_err());
/// assert!(require_board_delete(10, &board).is_ok());
/// ```

use crate::models::board::Board;
use crate::models::comment::Comment;
use crate::models::task::Task;

/// Error type for authorization checks
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AuthzError {
    /// Requester is neither owner nor member of the board
    #[error("You must be the owner or a member of board {0}.")]
    NotBoardParticipant(i64),

    /// Requester does not own the board
    #[error("Only the owner of board {0} may do this.")]
    NotBoardOwner(i64),

    /// Requester neither created the task nor owns its board
    #[error("Only the creator of task {0} or the board owner may delete it.")]
    NotTaskDeleter(i64),

    /// Requester did not write the comment
    #[error("Only the author may delete comment {0}.")]
    NotCommentAuthor(i64),
}

/// True if the user owns the board or is listed as a member
pub fn is_board_participant(user_id: i64, board: &Board) -> bool {
    board.owner_id == user_id || board.has_member(user_id)
}

/// Board read and write access
pub fn require_board_access(user_id: i64, board: &Board) -> Result<(), AuthzError> {
    if is_board_participant(user_id, board) {
        Ok(())
    } else {
        Err(AuthzError::NotBoardParticipant(board.id))
    }
}

/// Board deletion: owner only
pub fn require_board_delete(user_id: i64, board: &Board) -> Result<(), AuthzError> {
    if board.owner_id == user_id {
        Ok(())
    } else {
        Err(AuthzError::NotBoardOwner(board.id))
    }
}

/// Task read, update and comment access, decided by the task's board
///
/// `board` must be the board the task belongs to.
pub fn require_task_access(user_id: i64, task: &Task, board: &Board) -> Result<(), AuthzError> {
    debug_assert_eq!(task.board_id, board.id);
    require_board_access(user_id, board)
}

/// Task deletion: creator or board owner
///
/// Membership alone is not enough, and no separate access check applies.
pub fn require_task_delete(user_id: i64, task: &Task, board: &Board) -> Result<(), AuthzError> {
    debug_assert_eq!(task.board_id, board.id);
    if task.created_by == Some(user_id) || board.owner_id == user_id {
        Ok(())
    } else {
        Err(AuthzError::NotTaskDeleter(task.id))
    }
}

/// Comment deletion: author only
pub fn require_comment_delete(user_id: i64, comment: &Comment) -> Result<(), AuthzError> {
    if comment.author_id == user_id {
        Ok(())
    } else {
        Err(AuthzError::NotCommentAuthor(comment.id))
    }
}

/// Whether a user may be set as assignee or reviewer on the board's tasks
pub fn is_eligible_assignee(candidate_id: i64, board: &Board) -> bool {
    is_board_participant(candidate_id, board)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::task::{TaskPriority, TaskStatus};
    use chrono::Utc;

    const OWNER: i64 = 1;
    const MEMBER: i64 = 2;
    const OUTSIDER: i64 = 3;
    const CREATOR: i64 = 4;

    fn board() -> Board {
        Board {
            id: 100,
            title: "Board".to_string(),
            owner_id: OWNER,
            created_at: Utc::now(),
            member_ids: vec![MEMBER, CREATOR],
        }
    }

    fn task(created_by: Option<i64>) -> Task {
        Task {
            id: 200,
            board_id: 100,
            title: "Task".to_string(),
            description: String::new(),
            status: TaskStatus::ToDo,
            priority: TaskPriority::Medium,
            assignee_id: None,
            reviewer_id: None,
            due_date: None,
            created_at: Utc::now(),
            created_by,
            comments_count: 0,
        }
    }

    #[test]
    fn test_board_access() {
        let board = board();

        assert!(require_board_access(OWNER, &board).is_ok());
        assert!(require_board_access(MEMBER, &board).is_ok());
        assert_eq!(
            require_board_access(OUTSIDER, &board),
            Err(AuthzError::NotBoardParticipant(100))
        );
    }

    #[test]
    fn test_owner_has_access_without_membership_row() {
        let board = board();
        assert!(!board.has_member(OWNER));
        assert!(is_board_participant(OWNER, &board));
    }

    #[test]
    fn test_board_delete_owner_only() {
        let board = board();

        assert!(require_board_delete(OWNER, &board).is_ok());
        assert_eq!(require_board_delete(MEMBER, &board), Err(AuthzError::NotBoardOwner(100)));
    }

    #[test]
    fn test_task_access_follows_board() {
        let board = board();
        let task = task(Some(CREATOR));

        assert!(require_task_access(OWNER, &task, &board).is_ok());
        assert!(require_task_access(MEMBER, &task, &board).is_ok());
        assert!(require_task_access(OUTSIDER, &task, &board).is_err());
    }

    #[test]
    fn test_task_delete() {
        let board = board();
        let task = task(Some(CREATOR));

        assert!(require_task_delete(CREATOR, &task, &board).is_ok());
        assert!(require_task_delete(OWNER, &task, &board).is_ok());
        assert_eq!(
            require_task_delete(MEMBER, &task, &board),
            Err(AuthzError::NotTaskDeleter(200))
        );
    }

    #[test]
    fn test_task_delete_with_deleted_creator() {
        let board = board();
        let task = task(None);

        assert!(require_task_delete(OWNER, &task, &board).is_ok());
        assert!(require_task_delete(CREATOR, &task, &board).is_err());
    }

    #[test]
    fn test_comment_delete_author_only() {
        let comment = Comment {
            id: 300,
            task_id: 200,
            author_id: MEMBER,
            content: "hi".to_string(),
            created_at: Utc::now(),
        };

        assert!(require_comment_delete(MEMBER, &comment).is_ok());
        assert_eq!(
            require_comment_delete(OWNER, &comment),
            Err(AuthzError::NotCommentAuthor(300))
        );
    }

    #[test]
    fn test_assignee_eligibility() {
        let board = board();

        assert!(is_eligible_assignee(OWNER, &board));
        assert!(is_eligible_assignee(MEMBER, &board));
        assert!(!is_eligible_assignee(OUTSIDER, &board));
    }

    #[test]
    fn test_authz_error_display() {
        assert!(AuthzError::NotBoardParticipant(5).to_string().contains("board 5"));
        assert!(AuthzError::NotCommentAuthor(9).to_string().contains("comment 9"));
    }
}
