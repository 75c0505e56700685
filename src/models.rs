//! Domain models for the portfolio backend
//!
//! Entities are persisted through the store port (`store.rs`) and serialized
//! verbatim on the API surface.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::str::FromStr;
use uuid::Uuid;

use crate::error::AppError;

/// Enumerated reaction kinds; anything else is a client error
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReactionKind {
    Like,
    Love,
    Wow,
    Sad,
}

impl FromStr for ReactionKind {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "like" => Ok(ReactionKind::Like),
            "love" => Ok(ReactionKind::Love),
            "wow" => Ok(ReactionKind::Wow),
            "sad" => Ok(ReactionKind::Sad),
            other => Err(AppError::Validation(format!(
                "invalid reaction type: {}",
                other
            ))),
        }
    }
}

/// Per-kind sets of user ids that reacted to a post
///
/// Kinds are independent: a user may appear in several sets at once. Data
/// written by the superseded exclusive-toggle revision may still satisfy the
/// old one-set-per-user invariant; nothing here relies on it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Reactions {
    pub like: BTreeSet<String>,
    pub love: BTreeSet<String>,
    pub wow: BTreeSet<String>,
    pub sad: BTreeSet<String>,
}

impl Reactions {
    pub fn set(&self, kind: ReactionKind) -> &BTreeSet<String> {
        match kind {
            ReactionKind::Like => &self.like,
            ReactionKind::Love => &self.love,
            ReactionKind::Wow => &self.wow,
            ReactionKind::Sad => &self.sad,
        }
    }

    pub fn set_mut(&mut self, kind: ReactionKind) -> &mut BTreeSet<String> {
        match kind {
            ReactionKind::Like => &mut self.like,
            ReactionKind::Love => &mut self.love,
            ReactionKind::Wow => &mut self.wow,
            ReactionKind::Sad => &mut self.sad,
        }
    }
}

/// A published blog post
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Post {
    pub id: Uuid,
    pub title: String,
    pub excerpt: String,
    pub content: String,
    /// URL of the stored image asset, owned by the media store
    pub image: String,
    pub category: String,
    pub tags: Vec<String>,
    pub author: String,
    pub read_time: String,
    pub views: u64,
    pub reactions: Reactions,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A comment on a blog post
///
/// `delete_key` authorizes deletion by possession, not identity. It is
/// returned exactly once on creation and stripped from every listing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Comment {
    pub id: Uuid,
    pub post_id: Uuid,
    pub author: String,
    pub content: String,
    /// Parent comment on the same post, if this is a reply
    pub reply_to: Option<Uuid>,
    /// Parent's author name snapshotted at creation, not a live reference
    pub parent_author: Option<String>,
    #[serde(skip_serializing, default)]
    pub delete_key: String,
    pub created_at: DateTime<Utc>,
}

/// A testimonial; invisible to the public until an admin approves it
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Testimonial {
    pub id: Uuid,
    pub name: String,
    pub position: String,
    pub rating: u8,
    pub text: String,
    pub avatar: Option<String>,
    pub approved: bool,
    pub created_at: DateTime<Utc>,
}

/// A contact-form submission; write-once, never mutated
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContactMessage {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub subject: String,
    pub message: String,
    pub created_at: DateTime<Utc>,
}
