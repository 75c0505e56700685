//! Blog post CRUD and search entry points
//!
//! Image lifecycle rules: the upload happens before the document write, so a
//! storage failure creates no post; replacing an image removes the old asset
//! best-effort; deleting a post removes its image and its comments.

use serde::Deserialize;
use tracing::warn;
use uuid::Uuid;

use crate::error::{require_field, AppError};
use crate::media::{ImageUpload, MediaStore};
use crate::models::Post;
use crate::search::{SearchEngine, SearchPage, SearchQuery};
use crate::store::{PostUpdate, Store};

/// Incoming post payload; `tags` arrives as a JSON-encoded array of strings
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PostForm {
    pub title: Option<String>,
    pub excerpt: Option<String>,
    pub content: Option<String>,
    pub category: Option<String>,
    pub tags: Option<String>,
    pub author: Option<String>,
    pub read_time: Option<String>,
}

/// Tag lists default to empty on parse failure; the one documented coercion
pub fn parse_tags(raw: Option<&str>) -> Vec<String> {
    let Some(raw) = raw else {
        return Vec::new();
    };
    serde_json::from_str::<Vec<String>>(raw).unwrap_or_default()
}

pub async fn create(
    store: &dyn Store,
    media: &dyn MediaStore,
    form: PostForm,
    image: Option<ImageUpload>,
) -> Result<Post, AppError> {
    let title = require_field(form.title.as_deref().unwrap_or(""), "title")?;
    let excerpt = require_field(form.excerpt.as_deref().unwrap_or(""), "excerpt")?;
    let content = require_field(form.content.as_deref().unwrap_or(""), "content")?;
    let category = require_field(form.category.as_deref().unwrap_or(""), "category")?;
    let author = require_field(form.author.as_deref().unwrap_or(""), "author")?;
    let read_time = require_field(form.read_time.as_deref().unwrap_or(""), "read_time")?;

    let Some(image) = image else {
        return Err(AppError::Validation("image is required".into()));
    };
    let image_url = media
        .save_image("blog", &image.content_type, &image.data)
        .await?;

    let now = chrono::Utc::now();
    let post = Post {
        id: Uuid::new_v4(),
        title,
        excerpt,
        content,
        image: image_url,
        category,
        tags: parse_tags(form.tags.as_deref()),
        author,
        read_time,
        views: 0,
        reactions: Default::default(),
        created_at: now,
        updated_at: now,
    };
    store.create_post(post.clone()).await?;
    Ok(post)
}

pub async fn update(
    store: &dyn Store,
    media: &dyn MediaStore,
    id: Uuid,
    form: PostForm,
    image: Option<ImageUpload>,
) -> Result<Post, AppError> {
    let existing = store
        .get_post(id)
        .await?
        .ok_or_else(|| AppError::NotFound("blog post".into()))?;

    let new_image_url = match image {
        Some(upload) => {
            let url = media
                .save_image("blog", &upload.content_type, &upload.data)
                .await?;
            if let Err(e) = media.delete(&existing.image).await {
                warn!("failed to delete replaced image {}: {}", existing.image, e);
            }
            Some(url)
        }
        None => None,
    };

    let update = PostUpdate {
        title: form.title,
        excerpt: form.excerpt,
        content: form.content,
        category: form.category,
        tags: form.tags.as_deref().map(|raw| parse_tags(Some(raw))),
        author: form.author,
        read_time: form.read_time,
        image: new_image_url,
    };
    store
        .update_post(id, update)
        .await?
        .ok_or_else(|| AppError::NotFound("blog post".into()))
}

/// Delete a post, its image asset, and its comments
pub async fn delete(store: &dyn Store, media: &dyn MediaStore, id: Uuid) -> Result<(), AppError> {
    let post = store
        .delete_post(id)
        .await?
        .ok_or_else(|| AppError::NotFound("blog post".into()))?;

    if let Err(e) = media.delete(&post.image).await {
        warn!("failed to delete image for post {}: {}", id, e);
    }
    let removed = store.delete_comments_of_post(id).await?;
    if removed > 0 {
        tracing::debug!("removed {} comments for deleted post {}", removed, id);
    }
    Ok(())
}

/// Fetch a post, bumping the view counter with a scoped update
pub async fn get(store: &dyn Store, id: Uuid) -> Result<Post, AppError> {
    store.increment_views(id).await?;
    store
        .get_post(id)
        .await?
        .ok_or_else(|| AppError::NotFound("blog post".into()))
}

/// List/search with category filter, sort key, and pagination
pub async fn search(store: &dyn Store, query: &SearchQuery) -> Result<SearchPage<Post>, AppError> {
    let posts = store.list_posts().await?;
    let mut engine = SearchEngine::new();
    Ok(engine.search(&posts, query))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use tempfile::tempdir;

    fn form(title: &str) -> PostForm {
        PostForm {
            title: Some(title.into()),
            excerpt: Some("excerpt".into()),
            content: Some("content".into()),
            category: Some("dev".into()),
            tags: Some(r#"["rust","web"]"#.into()),
            author: Some("ada".into()),
            read_time: Some("5 min".into()),
        }
    }

    fn png() -> ImageUpload {
        ImageUpload {
            content_type: "image/png".into(),
            data: b"png bytes".to_vec(),
        }
    }

    #[tokio::test]
    async fn test_create_requires_image() {
        let store = MemoryStore::new();
        let dir = tempdir().unwrap();
        let media = crate::media::LocalMediaStore::new(dir.path(), "/uploads/blog");
        let err = create(&store, &media, form("Post"), None).await.unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
        assert!(store.list_posts().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_missing_field_names_the_wire_field() {
        let store = MemoryStore::new();
        let dir = tempdir().unwrap();
        let media = crate::media::LocalMediaStore::new(dir.path(), "/uploads/blog");
        let mut f = form("Post");
        f.read_time = None;
        let err = create(&store, &media, f, Some(png())).await.unwrap_err();
        assert!(err.to_string().contains("read_time is required"));
    }

    #[tokio::test]
    async fn test_create_and_fetch_bumps_views() {
        let store = MemoryStore::new();
        let dir = tempdir().unwrap();
        let media = crate::media::LocalMediaStore::new(dir.path(), "/uploads/blog");

        let post = create(&store, &media, form("Post"), Some(png())).await.unwrap();
        assert_eq!(post.tags, vec!["rust".to_string(), "web".to_string()]);
        assert!(post.image.starts_with("/uploads/blog/blog-"));

        let fetched = get(&store, post.id).await.unwrap();
        assert_eq!(fetched.views, 1);
        let fetched = get(&store, post.id).await.unwrap();
        assert_eq!(fetched.views, 2);
    }

    #[tokio::test]
    async fn test_upload_failure_creates_no_post() {
        let store = MemoryStore::new();
        let dir = tempdir().unwrap();
        let media = crate::media::LocalMediaStore::new(dir.path(), "/uploads/blog");

        let bad = ImageUpload {
            content_type: "image/gif".into(),
            data: b"gif".to_vec(),
        };
        let err = create(&store, &media, form("Post"), Some(bad)).await.unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
        assert!(store.list_posts().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_malformed_tags_default_to_empty() {
        let store = MemoryStore::new();
        let dir = tempdir().unwrap();
        let media = crate::media::LocalMediaStore::new(dir.path(), "/uploads/blog");

        let mut f = form("Post");
        f.tags = Some("not json".into());
        let post = create(&store, &media, f, Some(png())).await.unwrap();
        assert!(post.tags.is_empty());
    }

    #[tokio::test]
    async fn test_update_replaces_image_and_removes_old_asset() {
        let store = MemoryStore::new();
        let dir = tempdir().unwrap();
        let media = crate::media::LocalMediaStore::new(dir.path(), "/uploads/blog");

        let post = create(&store, &media, form("Post"), Some(png())).await.unwrap();
        let old_image = post.image.clone();

        let updated = update(
            &store,
            &media,
            post.id,
            PostForm {
                title: Some("Renamed".into()),
                ..Default::default()
            },
            Some(png()),
        )
        .await
        .unwrap();

        assert_eq!(updated.title, "Renamed");
        assert_eq!(updated.excerpt, "excerpt");
        assert_ne!(updated.image, old_image);
        // old asset cleaned up
        assert!(media.delete(&old_image).await.is_err());
    }

    #[tokio::test]
    async fn test_delete_removes_post_comments_and_image() {
        let store = MemoryStore::new();
        let dir = tempdir().unwrap();
        let media = crate::media::LocalMediaStore::new(dir.path(), "/uploads/blog");

        let post = create(&store, &media, form("Post"), Some(png())).await.unwrap();
        crate::comments::create(
            &store,
            post.id,
            crate::comments::NewComment {
                author: "bob".into(),
                content: "hi".into(),
                reply_to: None,
            },
        )
        .await
        .unwrap();

        delete(&store, &media, post.id).await.unwrap();
        assert!(store.get_post(post.id).await.unwrap().is_none());
        assert!(store.list_comments(post.id).await.unwrap().is_empty());
        assert!(media.delete(&post.image).await.is_err());
    }

    #[tokio::test]
    async fn test_update_missing_post() {
        let store = MemoryStore::new();
        let dir = tempdir().unwrap();
        let media = crate::media::LocalMediaStore::new(dir.path(), "/uploads/blog");
        let err = update(&store, &media, Uuid::new_v4(), PostForm::default(), None)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }
}
