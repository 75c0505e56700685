//! Testimonial intake and admin approval
//!
//! Submissions arrive unapproved and stay invisible to the public listing
//! until an admin approves them.

use serde::Deserialize;
use tracing::warn;
use uuid::Uuid;

use crate::error::{require_field, AppError};
use crate::media::{ImageUpload, MediaStore};
use crate::models::Testimonial;
use crate::store::Store;

#[derive(Debug, Clone, Deserialize)]
pub struct NewTestimonial {
    pub name: String,
    pub position: String,
    pub rating: u8,
    pub text: String,
}

pub async fn submit(
    store: &dyn Store,
    media: &dyn MediaStore,
    new: NewTestimonial,
    avatar: Option<ImageUpload>,
) -> Result<Testimonial, AppError> {
    let name = require_field(&new.name, "name")?;
    let position = require_field(&new.position, "position")?;
    let text = require_field(&new.text, "testimonial")?;
    if !(1..=5).contains(&new.rating) {
        return Err(AppError::Validation(
            "rating must be between 1 and 5".into(),
        ));
    }

    // upload before the document write so a storage failure creates nothing
    let avatar_url = match avatar {
        Some(upload) => Some(
            media
                .save_image("avatar", &upload.content_type, &upload.data)
                .await?,
        ),
        None => None,
    };

    let testimonial = Testimonial {
        id: Uuid::new_v4(),
        name,
        position,
        rating: new.rating,
        text,
        avatar: avatar_url,
        approved: false,
        created_at: chrono::Utc::now(),
    };
    store.create_testimonial(testimonial.clone()).await?;
    Ok(testimonial)
}

/// Public listing: approved only, newest first
pub async fn list_public(store: &dyn Store) -> Result<Vec<Testimonial>, AppError> {
    store.list_testimonials(true).await
}

/// Admin listing: everything, newest first
pub async fn list_all(store: &dyn Store) -> Result<Vec<Testimonial>, AppError> {
    store.list_testimonials(false).await
}

pub async fn approve(store: &dyn Store, id: Uuid) -> Result<Testimonial, AppError> {
    store
        .approve_testimonial(id)
        .await?
        .ok_or_else(|| AppError::NotFound("testimonial".into()))
}

/// Admin delete; the avatar asset is removed best-effort
pub async fn delete(
    store: &dyn Store,
    media: &dyn MediaStore,
    id: Uuid,
) -> Result<(), AppError> {
    let listed = store.list_testimonials(false).await?;
    let Some(testimonial) = listed.into_iter().find(|t| t.id == id) else {
        return Err(AppError::NotFound("testimonial".into()));
    };

    if !store.delete_testimonial(id).await? {
        return Err(AppError::NotFound("testimonial".into()));
    }
    if let Some(avatar) = testimonial.avatar {
        if let Err(e) = media.delete(&avatar).await {
            warn!("failed to delete testimonial avatar {}: {}", avatar, e);
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use tempfile::tempdir;

    fn new_testimonial(rating: u8) -> NewTestimonial {
        NewTestimonial {
            name: "Bea".into(),
            position: "CTO".into(),
            rating,
            text: "Great work".into(),
        }
    }

    #[tokio::test]
    async fn test_submit_starts_unapproved() {
        let store = MemoryStore::new();
        let dir = tempdir().unwrap();
        let media = crate::media::LocalMediaStore::new(dir.path(), "/uploads");

        let created = submit(&store, &media, new_testimonial(5), None)
            .await
            .unwrap();
        assert!(!created.approved);
        assert!(list_public(&store).await.unwrap().is_empty());
        assert_eq!(list_all(&store).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_approval_makes_public() {
        let store = MemoryStore::new();
        let dir = tempdir().unwrap();
        let media = crate::media::LocalMediaStore::new(dir.path(), "/uploads");

        let created = submit(&store, &media, new_testimonial(4), None)
            .await
            .unwrap();
        approve(&store, created.id).await.unwrap();
        assert_eq!(list_public(&store).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_rating_bounds() {
        let store = MemoryStore::new();
        let dir = tempdir().unwrap();
        let media = crate::media::LocalMediaStore::new(dir.path(), "/uploads");

        for bad in [0u8, 6] {
            let err = submit(&store, &media, new_testimonial(bad), None)
                .await
                .unwrap_err();
            assert!(matches!(err, AppError::Validation(_)));
        }
    }

    #[tokio::test]
    async fn test_avatar_stored_and_removed_on_delete() {
        let store = MemoryStore::new();
        let dir = tempdir().unwrap();
        let media = crate::media::LocalMediaStore::new(dir.path(), "/uploads");

        let avatar = ImageUpload {
            content_type: "image/png".into(),
            data: b"png".to_vec(),
        };
        let created = submit(&store, &media, new_testimonial(5), Some(avatar))
            .await
            .unwrap();
        let url = created.avatar.clone().unwrap();
        assert!(url.contains("avatar-"));

        delete(&store, &media, created.id).await.unwrap();
        assert!(list_all(&store).await.unwrap().is_empty());
        // asset is gone too
        assert!(media.delete(&url).await.is_err());
    }

    #[tokio::test]
    async fn test_delete_missing_testimonial() {
        let store = MemoryStore::new();
        let dir = tempdir().unwrap();
        let media = crate::media::LocalMediaStore::new(dir.path(), "/uploads");
        let err = delete(&store, &media, Uuid::new_v4()).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }
}
