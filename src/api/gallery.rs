//! Gallery rendering
//!
//! A basic grid of thumbnails, each linking to the post on Instagram.

use axum::{
    Router,
    extract::State,
    response::{Html, IntoResponse},
    routing::get,
};
use html_escape::{encode_double_quoted_attribute, encode_text};

use crate::AppState;
use crate::error::AppError;
use crate::instagram::GalleryEntry;
use crate::storage::keys;

const GALLERY_STYLE: &str = r#"
        .gallery {
            display: grid;
            grid-template-columns: repeat(4, 1fr);
            grid-gap: 10px;
        }
        .gallery img {
            width: 100%;
            aspect-ratio: 1;
        }
        body {
            max-width: 1000px;
            margin: auto;
        }"#;

/// Create gallery router
///
/// Routes:
/// - GET /gallery
pub fn gallery_router() -> Router<AppState> {
    Router::new().route("/gallery", get(render_gallery))
}

/// GET /gallery
async fn render_gallery(State(state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    let manifest = state
        .bucket
        .get(keys::MANIFEST)
        .await?
        .ok_or_else(|| AppError::NotFound("Gallery not found".to_string()))?;

    let entries: Vec<GalleryEntry> = serde_json::from_slice(&manifest)?;

    Ok(Html(render_page(
        &entries,
        &state.config.gallery.public_base_url,
    )))
}

fn render_page(entries: &[GalleryEntry], public_base_url: &str) -> String {
    let base = public_base_url.trim_end_matches('/');

    let thumbnails = entries
        .iter()
        .map(|entry| {
            let src = format!("{base}/{}", entry.display_object_key());
            format!(
                r#"<a href="{}"><img src="{}" alt="{}"></a>"#,
                encode_double_quoted_attribute(&entry.permalink),
                encode_double_quoted_attribute(&src),
                encode_double_quoted_attribute(&entry.caption),
            )
        })
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        r#"<!DOCTYPE html>
<html>
<head>
    <title>{title}</title>
    <style>{GALLERY_STYLE}
    </style>
</head>
<body>
    <h1>{title}</h1>
    <div class="gallery">
{thumbnails}
    </div>
</body>
</html>
"#,
        title = encode_text("Instagram Gallery"),
    )
}
