//! Reaction toggling on blog posts
//!
//! Kinds are independent: toggling one kind never touches the others, so a
//! user may hold several reactions on the same post. The earlier
//! mutually-exclusive model is gone; see DESIGN.md for the migration note.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{require_field, AppError};
use crate::models::{ReactionKind, Reactions};
use crate::store::Store;

#[derive(Debug, Clone, Deserialize)]
pub struct ToggleRequest {
    pub reaction_type: String,
    pub user_id: String,
}

#[derive(Debug, Serialize)]
pub struct ToggleResponse {
    pub message: String,
    pub reactions: Reactions,
}

/// Toggle membership of `user_id` in one reaction-kind set of a post
pub async fn toggle(
    store: &dyn Store,
    post_id: Uuid,
    request: ToggleRequest,
) -> Result<ToggleResponse, AppError> {
    let kind: ReactionKind = request.reaction_type.parse()?;
    let user_id = require_field(&request.user_id, "user_id")?;

    let (reactions, added) = store
        .toggle_reaction(post_id, kind, &user_id)
        .await?
        .ok_or_else(|| AppError::NotFound("blog post".into()))?;

    Ok(ToggleResponse {
        message: if added {
            "Reaction added".to_string()
        } else {
            "Reaction removed".to_string()
        },
        reactions,
    })
}
