//! Manual sync trigger

use axum::{
    Router,
    extract::{Query, State},
    response::{Html, IntoResponse, Response},
    routing::get,
};
use serde::Deserialize;

use crate::AppState;
use crate::auth::is_authenticated;
use crate::error::AppError;
use crate::service::GallerySync;

/// Create update router
///
/// Routes:
/// - GET /update
pub fn update_router() -> Router<AppState> {
    Router::new().route("/update", get(update_gallery))
}

#[derive(Debug, Deserialize)]
struct UpdateQuery {
    config_key: Option<String>,
}

/// GET /update
///
/// Without `config_key` renders a form. With a matching key runs the sync
/// synchronously and reports the result.
async fn update_gallery(
    State(state): State<AppState>,
    Query(query): Query<UpdateQuery>,
) -> Result<Response, AppError> {
    if !is_authenticated(state.kv.as_ref()).await? {
        return Err(AppError::NotAuthenticated);
    }

    match query.config_key.as_deref().filter(|k| !k.is_empty()) {
        Some(key) if state.config.gallery.key_matches(key) => {
            tracing::info!("Manual gallery update requested");
            GallerySync::new(&state).run().await?;
            Ok("Gallery Updated".into_response())
        }
        Some(_) => Err(AppError::Unauthorized(
            "Invalid Configuration Key".to_string(),
        )),
        None => Ok(update_form().into_response()),
    }
}

fn update_form() -> Html<&'static str> {
    Html(
        r#"<!DOCTYPE html>
<html>
<head><title>Update Gallery</title></head>
<body>
    <h1>Update Gallery</h1>
    <form action="/update" method="GET">
        <label for="config_key">Configuration Key:</label>
        <input type="text" id="config_key" name="config_key">
        <button type="submit">Update Gallery</button>
        <p>The configuration key is the value of the gallery.config_key setting.</p>
    </form>
</body>
</html>
"#,
    )
}
