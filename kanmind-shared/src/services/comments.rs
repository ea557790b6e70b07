/// Task comment operations
///
/// Reading and writing comments requires access to the task's board.
/// Deleting requires authorship; board ownership does not override it.

use serde::Deserialize;
use tracing::info;

use super::{load_board, load_task, user_map, REQUIRED};
use crate::auth::authorization::{require_comment_delete, require_task_access};
use crate::error::{KanbanError, KanbanResult};
use crate::models::comment::{Comment, CreateComment};
use crate::store::KanbanStore;

/// Comment with the author's display name
#[derive(Debug, Clone)]
pub struct CommentView {
    pub comment: Comment,
    pub author: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct NewComment {
    pub content: Option<String>,
}

/// Comments of a task, oldest first
pub async fn list(store: &dyn KanbanStore, user_id: i64, task_id: i64) -> KanbanResult<Vec<CommentView>> {
    let task = load_task(store, task_id).await?;
    let board = load_board(store, task.board_id).await?;
    require_task_access(user_id, &task, &board)?;

    let comments = store.list_comments(task.id).await?;
    let author_ids = comments.iter().map(|c| c.author_id).collect();
    let authors = user_map(store, author_ids).await?;

    Ok(comments
        .into_iter()
        .map(|comment| CommentView {
            author: authors
                .get(&comment.author_id)
                .map(|u| u.fullname())
                .unwrap_or_default(),
            comment,
        })
        .collect())
}

/// Adds a comment authored by the requester
pub async fn create(
    store: &dyn KanbanStore,
    user_id: i64,
    task_id: i64,
    input: NewComment,
) -> KanbanResult<CommentView> {
    let task = load_task(store, task_id).await?;
    let board = load_board(store, task.board_id).await?;
    require_task_access(user_id, &task, &board)?;

    let content = match input.content {
        Some(content) if !content.trim().is_empty() => content,
        Some(_) => return Err(KanbanError::field("content", "This field may not be blank.")),
        None => return Err(KanbanError::field("content", REQUIRED)),
    };

    let comment = store
        .create_comment(CreateComment {
            task_id: task.id,
            author_id: user_id,
            content,
        })
        .await?;

    info!(comment_id = comment.id, task_id, user_id, "Comment added");

    let author = store
        .find_user(user_id)
        .await?
        .map(|u| u.fullname())
        .unwrap_or_default();

    Ok(CommentView { comment, author })
}

/// Deletes a comment; only its author may do so
///
/// A comment ID that exists under a different task is reported as not found.
pub async fn delete(store: &dyn KanbanStore, user_id: i64, task_id: i64, comment_id: i64) -> KanbanResult<()> {
    let task = load_task(store, task_id).await?;
    let comment = store
        .find_comment(task.id, comment_id)
        .await?
        .ok_or_else(|| KanbanError::NotFound("Comment not found.".to_string()))?;
    require_comment_delete(user_id, &comment)?;

    store.delete_comment(comment.id).await?;

    info!(comment_id, task_id, user_id, "Comment deleted");

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::task::CreateTask;
    use crate::models::user::{CreateUser, User};
    use crate::store::memory::MemoryStore;

    async fn user(store: &MemoryStore, first: &str, last: &str) -> User {
        store
            .create_user(CreateUser {
                username: first.to_lowercase(),
                email: format!("{}@example.com", first.to_lowercase()),
                first_name: first.to_string(),
                last_name: last.to_string(),
                password_hash: "hash".to_string(),
            })
            .await
            .unwrap()
    }

    async fn task(store: &MemoryStore, owner_id: i64, members: &[i64]) -> i64 {
        let board = store.create_board(owner_id, "Board", members).await.unwrap();
        store
            .create_task(CreateTask {
                board_id: board.id,
                title: "Task".to_string(),
                description: String::new(),
                status: Default::default(),
                priority: Default::default(),
                assignee_id: None,
                reviewer_id: None,
                due_date: None,
                created_by: Some(owner_id),
            })
            .await
            .unwrap()
            .id
    }

    fn comment(content: &str) -> NewComment {
        NewComment {
            content: Some(content.to_string()),
        }
    }

    #[tokio::test]
    async fn test_comments_listed_oldest_first_with_author() {
        let store = MemoryStore::new();
        let owner = user(&store, "Olga", "Owner").await;
        let member = user(&store, "Max", "Member").await;
        let task_id = task(&store, owner.id, &[member.id]).await;

        create(&store, member.id, task_id, comment("first")).await.unwrap();
        create(&store, owner.id, task_id, comment("second")).await.unwrap();

        let views = list(&store, owner.id, task_id).await.unwrap();
        let rendered: Vec<(&str, &str)> = views
            .iter()
            .map(|v| (v.comment.content.as_str(), v.author.as_str()))
            .collect();
        assert_eq!(rendered, vec![("first", "Max Member"), ("second", "Olga Owner")]);
    }

    #[tokio::test]
    async fn test_blank_content_rejected() {
        let store = MemoryStore::new();
        let owner = user(&store, "Olga", "Owner").await;
        let task_id = task(&store, owner.id, &[]).await;

        for input in [comment("   "), NewComment::default()] {
            match create(&store, owner.id, task_id, input).await.unwrap_err() {
                KanbanError::Validation(fields) => assert_eq!(fields[0].field, "content"),
                other => panic!("expected validation error, got {other:?}"),
            }
        }
        assert!(list(&store, owner.id, task_id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_content_stored_as_written() {
        let store = MemoryStore::new();
        let owner = user(&store, "Olga", "Owner").await;
        let task_id = task(&store, owner.id, &[]).await;
        let snippet = "  line one\n  indented code\n";

        let view = create(&store, owner.id, task_id, comment(snippet)).await.unwrap();
        assert_eq!(view.comment.content, snippet);

        let views = list(&store, owner.id, task_id).await.unwrap();
        assert_eq!(views[0].comment.content, snippet);
    }

    #[tokio::test]
    async fn test_outsider_cannot_read_or_write() {
        let store = MemoryStore::new();
        let owner = user(&store, "Olga", "Owner").await;
        let outsider = user(&store, "Otto", "Outside").await;
        let task_id = task(&store, owner.id, &[]).await;

        let err = list(&store, outsider.id, task_id).await.unwrap_err();
        assert!(matches!(err, KanbanError::PermissionDenied(_)));

        let err = create(&store, outsider.id, task_id, comment("hi")).await.unwrap_err();
        assert!(matches!(err, KanbanError::PermissionDenied(_)));

        let err = list(&store, owner.id, 9999).await.unwrap_err();
        assert!(matches!(err, KanbanError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_only_author_deletes() {
        let store = MemoryStore::new();
        let owner = user(&store, "Olga", "Owner").await;
        let member = user(&store, "Max", "Member").await;
        let task_id = task(&store, owner.id, &[member.id]).await;

        let view = create(&store, member.id, task_id, comment("mine")).await.unwrap();

        let err = delete(&store, owner.id, task_id, view.comment.id).await.unwrap_err();
        assert!(matches!(err, KanbanError::PermissionDenied(_)));

        delete(&store, member.id, task_id, view.comment.id).await.unwrap();
        assert!(list(&store, owner.id, task_id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_delete_scoped_to_task() {
        let store = MemoryStore::new();
        let owner = user(&store, "Olga", "Owner").await;
        let first = task(&store, owner.id, &[]).await;
        let second = task(&store, owner.id, &[]).await;

        let view = create(&store, owner.id, first, comment("here")).await.unwrap();

        let err = delete(&store, owner.id, second, view.comment.id).await.unwrap_err();
        assert!(matches!(err, KanbanError::NotFound(_)));

        let err = delete(&store, owner.id, 9999, view.comment.id).await.unwrap_err();
        assert!(matches!(err, KanbanError::NotFound(_)));

        assert_eq!(list(&store, owner.id, first).await.unwrap().len(), 1);
    }
}
