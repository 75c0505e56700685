//! Comment threading with delete-key authorization
//!
//! Every comment is issued a random opaque delete key at creation, returned
//! exactly once; deletion is authorized by possession of that key, not by
//! identity. Deleting a comment cascades to its direct replies only.

use rand::RngCore;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{require_field, AppError};
use crate::models::Comment;
use crate::store::Store;

/// Incoming comment payload
#[derive(Debug, Clone, Deserialize)]
pub struct NewComment {
    pub author: String,
    pub content: String,
    pub reply_to: Option<Uuid>,
}

/// Creation response; the only place the delete key ever appears
#[derive(Debug, Serialize)]
pub struct CreatedComment {
    #[serde(flatten)]
    pub comment: Comment,
    pub delete_key: String,
}

/// A top-level comment with its direct replies, oldest-first
#[derive(Debug, Serialize)]
pub struct CommentThread {
    #[serde(flatten)]
    pub comment: Comment,
    pub replies: Vec<Comment>,
}

fn generate_delete_key() -> String {
    let mut bytes = [0u8; 16];
    rand::thread_rng().fill_bytes(&mut bytes);
    hex::encode(bytes)
}

/// Create a comment, snapshotting the parent's author name for replies
pub async fn create(
    store: &dyn Store,
    post_id: Uuid,
    new: NewComment,
) -> Result<CreatedComment, AppError> {
    let author = require_field(&new.author, "author")?;
    let content = require_field(&new.content, "content")?;

    if store.get_post(post_id).await?.is_none() {
        return Err(AppError::NotFound("blog post".into()));
    }

    let parent_author = match new.reply_to {
        Some(parent_id) => {
            let parent = store
                .get_comment(parent_id)
                .await?
                .ok_or_else(|| AppError::NotFound("parent comment".into()))?;
            if parent.post_id != post_id {
                return Err(AppError::Validation(
                    "parent comment belongs to a different post".into(),
                ));
            }
            // denormalized snapshot so display never needs a join
            Some(parent.author)
        }
        None => None,
    };

    let delete_key = generate_delete_key();
    let comment = Comment {
        id: Uuid::new_v4(),
        post_id,
        author,
        content,
        reply_to: new.reply_to,
        parent_author,
        delete_key: delete_key.clone(),
        created_at: chrono::Utc::now(),
    };
    store.create_comment(comment.clone()).await?;

    Ok(CreatedComment {
        comment,
        delete_key,
    })
}

/// Delete a comment and its direct replies, authorized by delete key
///
/// Existence is checked before the key, so an unauthorized caller can learn
/// whether the comment exists. That matches the observed behavior of the
/// endpoint; see DESIGN.md before hardening.
pub async fn delete(
    store: &dyn Store,
    comment_id: Uuid,
    delete_key: &str,
) -> Result<usize, AppError> {
    let comment = store
        .get_comment(comment_id)
        .await?
        .ok_or_else(|| AppError::NotFound("comment".into()))?;

    if comment.delete_key != delete_key {
        return Err(AppError::Forbidden("invalid delete key".into()));
    }

    let cascaded = store.delete_replies_of(comment_id).await?;
    store.delete_comment(comment_id).await?;
    Ok(cascaded + 1)
}

/// Grouped thread view built in one pass over the flat list
///
/// Top-level comments come newest-first; replies sit under their parent
/// oldest-first. Replies whose parent has vanished surface as top-level
/// rather than disappearing.
pub async fn list_threads(
    store: &dyn Store,
    post_id: Uuid,
) -> Result<Vec<CommentThread>, AppError> {
    let mut comments = store.list_comments(post_id).await?;
    comments.sort_by(|a, b| a.created_at.cmp(&b.created_at));

    let ids: std::collections::HashSet<Uuid> = comments.iter().map(|c| c.id).collect();
    let mut threads: Vec<CommentThread> = Vec::new();
    let mut index: std::collections::HashMap<Uuid, usize> = std::collections::HashMap::new();

    for comment in comments {
        match comment.reply_to.filter(|parent| ids.contains(parent)) {
            Some(parent_id) => {
                if let Some(&slot) = index.get(&parent_id) {
                    threads[slot].replies.push(comment);
                }
            }
            None => {
                index.insert(comment.id, threads.len());
                threads.push(CommentThread {
                    comment,
                    replies: Vec::new(),
                });
            }
        }
    }

    threads.sort_by(|a, b| b.comment.created_at.cmp(&a.comment.created_at));
    Ok(threads)
}
