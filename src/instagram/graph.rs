//! Instagram Graph API media listing

use super::decode_response;
use super::media::{MediaEntry, MediaPage};
use super::token::AccessToken;
use crate::error::AppError;

const MEDIA_FIELDS: &str = "id,caption,media_type,media_url,thumbnail_url,timestamp,permalink";
const CHILD_FIELDS: &str = "id,media_type,media_url,thumbnail_url,timestamp,permalink";

/// Graph API client
pub struct GraphApi {
    http: reqwest::Client,
    graph_base_url: String,
}

impl GraphApi {
    pub fn new(http: reqwest::Client, graph_base_url: &str) -> Self {
        Self {
            http,
            graph_base_url: graph_base_url.trim_end_matches('/').to_string(),
        }
    }

    /// Fetch the user's media feed, following at most `max_pages` pages.
    ///
    /// Entries keep the order the API returns them in.
    pub async fn fetch_user_media(
        &self,
        token: &AccessToken,
        max_pages: usize,
    ) -> Result<Vec<MediaEntry>, AppError> {
        let first = self
            .http
            .get(format!("{}/me/media", self.graph_base_url))
            .query(&[
                ("fields", MEDIA_FIELDS),
                ("access_token", token.access_token.as_str()),
            ])
            .send()
            .await?;

        let mut page: MediaPage = decode_response(first, "media listing").await?;
        let mut entries = std::mem::take(&mut page.data);
        let mut pages = 1;

        while pages < max_pages {
            let Some(next) = page.next_page().map(ToOwned::to_owned) else {
                break;
            };

            let response = self.http.get(&next).send().await?;
            page = decode_response(response, "media listing").await?;
            entries.append(&mut page.data);
            pages += 1;
        }

        tracing::debug!(entries = entries.len(), pages, "Fetched media listing");
        Ok(entries)
    }

    /// Fetch the images and videos inside a carousel album
    pub async fn fetch_carousel_children(
        &self,
        token: &AccessToken,
        carousel_id: &str,
    ) -> Result<Vec<MediaEntry>, AppError> {
        let response = self
            .http
            .get(format!("{}/{}/children", self.graph_base_url, carousel_id))
            .query(&[
                ("fields", CHILD_FIELDS),
                ("access_token", token.access_token.as_str()),
            ])
            .send()
            .await?;

        let page: MediaPage = decode_response(response, "carousel children").await?;
        Ok(page.data)
    }
}
