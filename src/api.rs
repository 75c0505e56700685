//! HTTP surface: router, handlers, and multipart parsing
//!
//! Handlers stay thin: parse the request, call the matching service module,
//! serialize the result. All policy lives in the service modules. Admin-only
//! handlers take an `AdminClaims` extractor argument, which rejects requests
//! without a valid bearer token before the body is touched.

use axum::async_trait;
use axum::extract::{DefaultBodyLimit, FromRequestParts, Multipart, Path, Query, State};
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{delete, get, post, put};
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::json;
use tracing::info;
use std::path::PathBuf;
use std::sync::Arc;
use uuid::Uuid;

use crate::auth::{AdminAuth, Claims, LoginRequest};
use crate::blog::{self, PostForm};
use crate::comments::{self, NewComment};
use crate::contact::{self, NewContact};
use crate::error::AppError;
use crate::mailer::Mailer;
use crate::media::{ImageUpload, MediaStore, MAX_IMAGE_BYTES};
use crate::ping;
use crate::preview::PreviewService;
use crate::reactions::{self, ToggleRequest};
use crate::search::engine::DEFAULT_PAGE_SIZE;
use crate::search::{SearchQuery, SortKey};
use crate::store::Store;
use crate::testimonials::{self, NewTestimonial};

/// Sitemap ping targets, present only when both URLs are configured
#[derive(Clone)]
pub struct PingTargets {
    pub ping_url: String,
    pub sitemap_url: String,
}

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn Store>,
    pub media: Arc<dyn MediaStore>,
    pub mailer: Arc<dyn Mailer>,
    pub previews: Arc<PreviewService>,
    pub auth: AdminAuth,
    pub http: reqwest::Client,
    pub contact_recipient: String,
    pub uploads_root: PathBuf,
    pub ping: Option<PingTargets>,
}

/// Verified admin identity, extracted from the Authorization header
pub struct AdminClaims(pub Claims);

#[async_trait]
impl FromRequestParts<AppState> for AdminClaims {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let header = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|v| v.to_str().ok());
        Ok(AdminClaims(state.auth.verify_header(header)?))
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/auth/login", post(login))
        .route("/api/blogs", get(list_posts).post(create_post))
        .route(
            "/api/blogs/:id",
            get(get_post).put(update_post).delete(delete_post),
        )
        .route("/api/blogs/:id/reactions", post(toggle_reaction))
        .route(
            "/api/blogs/:id/comments",
            get(list_comments).post(create_comment),
        )
        .route("/api/comments/:id", delete(delete_comment))
        .route(
            "/api/testimonials",
            get(list_testimonials).post(create_testimonial),
        )
        .route("/api/testimonials/all", get(list_all_testimonials))
        .route("/api/testimonials/:id/approve", put(approve_testimonial))
        .route("/api/testimonials/:id", delete(delete_testimonial))
        .route("/api/contact", get(list_contacts).post(submit_contact))
        .route("/api/preview", get(link_preview))
        .route("/uploads/*path", get(serve_upload))
        .layer(DefaultBodyLimit::max(MAX_IMAGE_BYTES + 64 * 1024))
        .with_state(state)
}

// ---- auth ----

async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> Result<impl IntoResponse, AppError> {
    Ok(Json(state.auth.login(&req)?))
}

// ---- blog posts ----

#[derive(Debug, Deserialize)]
struct BlogListParams {
    search: Option<String>,
    category: Option<String>,
    sort_by: Option<String>,
    page: Option<usize>,
    limit: Option<usize>,
}

impl BlogListParams {
    fn into_query(self) -> SearchQuery {
        SearchQuery {
            q: self.search,
            category: self.category.filter(|c| !c.is_empty() && c != "all"),
            sort: self.sort_by.as_deref().map(SortKey::parse).unwrap_or_default(),
            page: self.page.unwrap_or(1),
            limit: self.limit.unwrap_or(DEFAULT_PAGE_SIZE),
        }
    }
}

async fn list_posts(
    State(state): State<AppState>,
    Query(params): Query<BlogListParams>,
) -> Result<impl IntoResponse, AppError> {
    let page = blog::search(state.store.as_ref(), &params.into_query()).await?;
    Ok(Json(page))
}

async fn get_post(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    Ok(Json(blog::get(state.store.as_ref(), id).await?))
}

async fn create_post(
    State(state): State<AppState>,
    admin: AdminClaims,
    multipart: Multipart,
) -> Result<impl IntoResponse, AppError> {
    let (form, image) = read_post_multipart(multipart).await?;
    let post = blog::create(state.store.as_ref(), state.media.as_ref(), form, image).await?;
    info!("blog post {} created by {}", post.id, admin.0.sub);
    notify_search_engines(&state);
    Ok((StatusCode::CREATED, Json(post)))
}

async fn update_post(
    State(state): State<AppState>,
    admin: AdminClaims,
    Path(id): Path<Uuid>,
    multipart: Multipart,
) -> Result<impl IntoResponse, AppError> {
    let (form, image) = read_post_multipart(multipart).await?;
    let post = blog::update(state.store.as_ref(), state.media.as_ref(), id, form, image).await?;
    info!("blog post {} updated by {}", id, admin.0.sub);
    notify_search_engines(&state);
    Ok(Json(post))
}

async fn delete_post(
    State(state): State<AppState>,
    admin: AdminClaims,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    blog::delete(state.store.as_ref(), state.media.as_ref(), id).await?;
    info!("blog post {} deleted by {}", id, admin.0.sub);
    notify_search_engines(&state);
    Ok(Json(json!({ "message": "Blog post deleted" })))
}

fn notify_search_engines(state: &AppState) {
    if let Some(targets) = &state.ping {
        ping::ping_search_engines(
            state.http.clone(),
            targets.ping_url.clone(),
            targets.sitemap_url.clone(),
        );
    }
}

/// Pull the post fields and the optional image out of a multipart form
async fn read_post_multipart(
    mut multipart: Multipart,
) -> Result<(PostForm, Option<ImageUpload>), AppError> {
    let mut form = PostForm::default();
    let mut image = None;

    while let Some(field) = next_field(&mut multipart).await? {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "image" => image = read_image_field(field).await?,
            "title" => form.title = Some(field_text(field).await?),
            "excerpt" => form.excerpt = Some(field_text(field).await?),
            "content" => form.content = Some(field_text(field).await?),
            "category" => form.category = Some(field_text(field).await?),
            "tags" => form.tags = Some(field_text(field).await?),
            "author" => form.author = Some(field_text(field).await?),
            "read_time" => form.read_time = Some(field_text(field).await?),
            _ => {}
        }
    }
    Ok((form, image))
}

async fn next_field(
    multipart: &mut Multipart,
) -> Result<Option<axum::extract::multipart::Field<'_>>, AppError> {
    multipart
        .next_field()
        .await
        .map_err(|e| AppError::Validation(format!("malformed multipart body: {}", e)))
}

async fn field_text(field: axum::extract::multipart::Field<'_>) -> Result<String, AppError> {
    field
        .text()
        .await
        .map_err(|e| AppError::Validation(format!("malformed form field: {}", e)))
}

async fn read_image_field(
    field: axum::extract::multipart::Field<'_>,
) -> Result<Option<ImageUpload>, AppError> {
    let content_type = field
        .content_type()
        .unwrap_or("application/octet-stream")
        .to_string();
    let data = field
        .bytes()
        .await
        .map_err(|e| AppError::Validation(format!("malformed file upload: {}", e)))?
        .to_vec();
    // an empty file part means no upload
    if data.is_empty() {
        return Ok(None);
    }
    Ok(Some(ImageUpload { content_type, data }))
}

// ---- reactions ----

async fn toggle_reaction(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(req): Json<ToggleRequest>,
) -> Result<impl IntoResponse, AppError> {
    Ok(Json(reactions::toggle(state.store.as_ref(), id, req).await?))
}

// ---- comments ----

async fn list_comments(
    State(state): State<AppState>,
    Path(post_id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let threads = comments::list_threads(state.store.as_ref(), post_id).await?;
    Ok(Json(threads))
}

async fn create_comment(
    State(state): State<AppState>,
    Path(post_id): Path<Uuid>,
    Json(new): Json<NewComment>,
) -> Result<impl IntoResponse, AppError> {
    let created = comments::create(state.store.as_ref(), post_id, new).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

#[derive(Debug, Deserialize)]
struct DeleteCommentParams {
    delete_key: String,
}

async fn delete_comment(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Query(params): Query<DeleteCommentParams>,
) -> Result<impl IntoResponse, AppError> {
    let removed = comments::delete(state.store.as_ref(), id, &params.delete_key).await?;
    Ok(Json(json!({ "message": "Comment deleted", "removed": removed })))
}

// ---- testimonials ----

async fn list_testimonials(State(state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    Ok(Json(testimonials::list_public(state.store.as_ref()).await?))
}

async fn list_all_testimonials(
    State(state): State<AppState>,
    _admin: AdminClaims,
) -> Result<impl IntoResponse, AppError> {
    Ok(Json(testimonials::list_all(state.store.as_ref()).await?))
}

async fn create_testimonial(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<impl IntoResponse, AppError> {
    let mut name = String::new();
    let mut position = String::new();
    let mut rating = None;
    let mut text = String::new();
    let mut avatar = None;

    while let Some(field) = next_field(&mut multipart).await? {
        let field_name = field.name().unwrap_or_default().to_string();
        match field_name.as_str() {
            "avatar" => avatar = read_image_field(field).await?,
            "name" => name = field_text(field).await?,
            "position" => position = field_text(field).await?,
            "text" => text = field_text(field).await?,
            "rating" => {
                let raw = field_text(field).await?;
                rating = Some(
                    raw.trim()
                        .parse::<u8>()
                        .map_err(|_| AppError::Validation("rating must be a number".into()))?,
                );
            }
            _ => {}
        }
    }

    let new = NewTestimonial {
        name,
        position,
        rating: rating.ok_or_else(|| AppError::Validation("rating is required".into()))?,
        text,
    };
    let created =
        testimonials::submit(state.store.as_ref(), state.media.as_ref(), new, avatar).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

async fn approve_testimonial(
    State(state): State<AppState>,
    admin: AdminClaims,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let approved = testimonials::approve(state.store.as_ref(), id).await?;
    info!("testimonial {} approved by {}", id, admin.0.sub);
    Ok(Json(approved))
}

async fn delete_testimonial(
    State(state): State<AppState>,
    admin: AdminClaims,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    testimonials::delete(state.store.as_ref(), state.media.as_ref(), id).await?;
    info!("testimonial {} deleted by {}", id, admin.0.sub);
    Ok(Json(json!({ "message": "Testimonial deleted" })))
}

// ---- contact ----

async fn submit_contact(
    State(state): State<AppState>,
    Json(new): Json<NewContact>,
) -> Result<impl IntoResponse, AppError> {
    let saved = contact::submit(
        state.store.as_ref(),
        state.mailer.as_ref(),
        &state.contact_recipient,
        new,
    )
    .await?;
    Ok((StatusCode::CREATED, Json(saved)))
}

async fn list_contacts(
    State(state): State<AppState>,
    _admin: AdminClaims,
) -> Result<impl IntoResponse, AppError> {
    Ok(Json(state.store.list_contacts().await?))
}

// ---- link previews ----

#[derive(Debug, Deserialize)]
struct PreviewParams {
    url: String,
    #[serde(default)]
    refresh: bool,
}

async fn link_preview(
    State(state): State<AppState>,
    Query(params): Query<PreviewParams>,
) -> Result<impl IntoResponse, AppError> {
    Ok(Json(state.previews.get(&params.url, params.refresh).await?))
}

// ---- uploaded assets ----

async fn serve_upload(
    State(state): State<AppState>,
    Path(path): Path<String>,
) -> Result<Response, AppError> {
    // uploads are flat files written by the media store; refuse traversal
    if std::path::Path::new(&path)
        .components()
        .any(|c| !matches!(c, std::path::Component::Normal(_)))
    {
        return Err(AppError::NotFound("asset".into()));
    }
    let full = state.uploads_root.join(&path);
    let data = tokio::fs::read(&full)
        .await
        .map_err(|_| AppError::NotFound("asset".into()))?;

    let content_type = match full.extension().and_then(|e| e.to_str()) {
        Some("png") => "image/png",
        Some("jpg") | Some("jpeg") => "image/jpeg",
        _ => "application/octet-stream",
    };
    Ok(([(axum::http::header::CONTENT_TYPE, content_type)], data).into_response())
}
