//! Document store port and the in-memory adapter
//!
//! The trait captures the contract the handlers rely on: filtered find,
//! findById, delete, deleteMany-by-filter, and field-scoped updates (view
//! counter increments, single reaction-set mutation) so concurrent writers
//! never overwrite whole documents.

use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::error::AppError;
use crate::models::{Comment, ContactMessage, Post, ReactionKind, Reactions, Testimonial};

/// Partial update for a post; `None` fields are left untouched
#[derive(Debug, Default, Clone)]
pub struct PostUpdate {
    pub title: Option<String>,
    pub excerpt: Option<String>,
    pub content: Option<String>,
    pub category: Option<String>,
    pub tags: Option<Vec<String>>,
    pub author: Option<String>,
    pub read_time: Option<String>,
    pub image: Option<String>,
}

#[async_trait]
pub trait Store: Send + Sync {
    // Posts
    async fn create_post(&self, post: Post) -> Result<(), AppError>;
    async fn list_posts(&self) -> Result<Vec<Post>, AppError>;
    async fn get_post(&self, id: Uuid) -> Result<Option<Post>, AppError>;
    async fn update_post(&self, id: Uuid, update: PostUpdate) -> Result<Option<Post>, AppError>;
    async fn delete_post(&self, id: Uuid) -> Result<Option<Post>, AppError>;
    /// Scoped counter increment; never rewrites the document
    async fn increment_views(&self, id: Uuid) -> Result<(), AppError>;
    /// Scoped mutation of one (post, kind) reaction set; returns the updated
    /// reaction state and whether the user was added
    async fn toggle_reaction(
        &self,
        id: Uuid,
        kind: ReactionKind,
        user_id: &str,
    ) -> Result<Option<(Reactions, bool)>, AppError>;

    // Comments
    async fn create_comment(&self, comment: Comment) -> Result<(), AppError>;
    async fn get_comment(&self, id: Uuid) -> Result<Option<Comment>, AppError>;
    async fn list_comments(&self, post_id: Uuid) -> Result<Vec<Comment>, AppError>;
    async fn delete_comment(&self, id: Uuid) -> Result<bool, AppError>;
    /// deleteMany by direct parent; returns the number removed
    async fn delete_replies_of(&self, parent_id: Uuid) -> Result<usize, AppError>;
    async fn delete_comments_of_post(&self, post_id: Uuid) -> Result<usize, AppError>;

    // Testimonials
    async fn create_testimonial(&self, testimonial: Testimonial) -> Result<(), AppError>;
    async fn list_testimonials(&self, approved_only: bool) -> Result<Vec<Testimonial>, AppError>;
    async fn approve_testimonial(&self, id: Uuid) -> Result<Option<Testimonial>, AppError>;
    async fn delete_testimonial(&self, id: Uuid) -> Result<bool, AppError>;

    // Contact messages
    async fn create_contact(&self, message: ContactMessage) -> Result<(), AppError>;
    async fn list_contacts(&self) -> Result<Vec<ContactMessage>, AppError>;
}

/// In-memory adapter; one lock per collection
#[derive(Default)]
pub struct MemoryStore {
    posts: RwLock<HashMap<Uuid, Post>>,
    comments: RwLock<HashMap<Uuid, Comment>>,
    testimonials: RwLock<HashMap<Uuid, Testimonial>>,
    contacts: RwLock<HashMap<Uuid, ContactMessage>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn create_post(&self, post: Post) -> Result<(), AppError> {
        self.posts.write().await.insert(post.id, post);
        Ok(())
    }

    async fn list_posts(&self) -> Result<Vec<Post>, AppError> {
        Ok(self.posts.read().await.values().cloned().collect())
    }

    async fn get_post(&self, id: Uuid) -> Result<Option<Post>, AppError> {
        Ok(self.posts.read().await.get(&id).cloned())
    }

    async fn update_post(&self, id: Uuid, update: PostUpdate) -> Result<Option<Post>, AppError> {
        let mut posts = self.posts.write().await;
        let Some(post) = posts.get_mut(&id) else {
            return Ok(None);
        };
        if let Some(title) = update.title {
            post.title = title;
        }
        if let Some(excerpt) = update.excerpt {
            post.excerpt = excerpt;
        }
        if let Some(content) = update.content {
            post.content = content;
        }
        if let Some(category) = update.category {
            post.category = category;
        }
        if let Some(tags) = update.tags {
            post.tags = tags;
        }
        if let Some(author) = update.author {
            post.author = author;
        }
        if let Some(read_time) = update.read_time {
            post.read_time = read_time;
        }
        if let Some(image) = update.image {
            post.image = image;
        }
        post.updated_at = chrono::Utc::now();
        Ok(Some(post.clone()))
    }

    async fn delete_post(&self, id: Uuid) -> Result<Option<Post>, AppError> {
        Ok(self.posts.write().await.remove(&id))
    }

    async fn increment_views(&self, id: Uuid) -> Result<(), AppError> {
        if let Some(post) = self.posts.write().await.get_mut(&id) {
            post.views += 1;
        }
        Ok(())
    }

    async fn toggle_reaction(
        &self,
        id: Uuid,
        kind: ReactionKind,
        user_id: &str,
    ) -> Result<Option<(Reactions, bool)>, AppError> {
        let mut posts = self.posts.write().await;
        let Some(post) = posts.get_mut(&id) else {
            return Ok(None);
        };
        let set = post.reactions.set_mut(kind);
        let added = if set.contains(user_id) {
            set.remove(user_id);
            false
        } else {
            set.insert(user_id.to_string());
            true
        };
        Ok(Some((post.reactions.clone(), added)))
    }

    async fn create_comment(&self, comment: Comment) -> Result<(), AppError> {
        self.comments.write().await.insert(comment.id, comment);
        Ok(())
    }

    async fn get_comment(&self, id: Uuid) -> Result<Option<Comment>, AppError> {
        Ok(self.comments.read().await.get(&id).cloned())
    }

    async fn list_comments(&self, post_id: Uuid) -> Result<Vec<Comment>, AppError> {
        Ok(self
            .comments
            .read()
            .await
            .values()
            .filter(|c| c.post_id == post_id)
            .cloned()
            .collect())
    }

    async fn delete_comment(&self, id: Uuid) -> Result<bool, AppError> {
        Ok(self.comments.write().await.remove(&id).is_some())
    }

    async fn delete_replies_of(&self, parent_id: Uuid) -> Result<usize, AppError> {
        let mut comments = self.comments.write().await;
        let doomed: Vec<Uuid> = comments
            .values()
            .filter(|c| c.reply_to == Some(parent_id))
            .map(|c| c.id)
            .collect();
        for id in &doomed {
            comments.remove(id);
        }
        Ok(doomed.len())
    }

    async fn delete_comments_of_post(&self, post_id: Uuid) -> Result<usize, AppError> {
        let mut comments = self.comments.write().await;
        let doomed: Vec<Uuid> = comments
            .values()
            .filter(|c| c.post_id == post_id)
            .map(|c| c.id)
            .collect();
        for id in &doomed {
            comments.remove(id);
        }
        Ok(doomed.len())
    }

    async fn create_testimonial(&self, testimonial: Testimonial) -> Result<(), AppError> {
        self.testimonials
            .write()
            .await
            .insert(testimonial.id, testimonial);
        Ok(())
    }

    async fn list_testimonials(&self, approved_only: bool) -> Result<Vec<Testimonial>, AppError> {
        let mut list: Vec<Testimonial> = self
            .testimonials
            .read()
            .await
            .values()
            .filter(|t| !approved_only || t.approved)
            .cloned()
            .collect();
        list.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(list)
    }

    async fn approve_testimonial(&self, id: Uuid) -> Result<Option<Testimonial>, AppError> {
        let mut testimonials = self.testimonials.write().await;
        let Some(testimonial) = testimonials.get_mut(&id) else {
            return Ok(None);
        };
        testimonial.approved = true;
        Ok(Some(testimonial.clone()))
    }

    async fn delete_testimonial(&self, id: Uuid) -> Result<bool, AppError> {
        Ok(self.testimonials.write().await.remove(&id).is_some())
    }

    async fn create_contact(&self, message: ContactMessage) -> Result<(), AppError> {
        self.contacts.write().await.insert(message.id, message);
        Ok(())
    }

    async fn list_contacts(&self) -> Result<Vec<ContactMessage>, AppError> {
        let mut list: Vec<ContactMessage> =
            self.contacts.read().await.values().cloned().collect();
        list.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(list)
    }
}
