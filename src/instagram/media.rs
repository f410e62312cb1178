//! Media types returned by the Graph API and the gallery manifest

use serde::{Deserialize, Deserializer, Serialize};

use crate::storage::keys;

/// Instagram media type tag
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MediaType {
    Image,
    Video,
    CarouselAlbum,
}

/// Variant-specific fields, tagged by `media_type`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "media_type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MediaKind {
    Image,
    Video {
        #[serde(default)]
        thumbnail_url: Option<String>,
    },
    CarouselAlbum,
}

/// One item of the user's media feed
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediaEntry {
    pub id: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub caption: String,
    pub timestamp: String,
    pub permalink: String,
    /// Missing for media Instagram will not serve (e.g. flagged audio)
    #[serde(default)]
    pub media_url: Option<String>,
    #[serde(flatten)]
    pub kind: MediaKind,
}

impl MediaEntry {
    pub fn media_type(&self) -> MediaType {
        match self.kind {
            MediaKind::Image => MediaType::Image,
            MediaKind::Video { .. } => MediaType::Video,
            MediaKind::CarouselAlbum => MediaType::CarouselAlbum,
        }
    }

    pub fn thumbnail_url(&self) -> Option<&str> {
        match &self.kind {
            MediaKind::Video { thumbnail_url } => thumbnail_url.as_deref(),
            _ => None,
        }
    }

    pub fn media_object_key(&self) -> String {
        keys::media_object(&self.id)
    }

    /// Thumbnail object key, videos only
    pub fn thumbnail_object_key(&self) -> Option<String> {
        matches!(self.kind, MediaKind::Video { .. }).then(|| keys::thumbnail_object(&self.id))
    }

    /// Manifest projection without the media URL
    pub fn gallery_entry(&self) -> GalleryEntry {
        GalleryEntry {
            id: self.id.clone(),
            caption: self.caption.clone(),
            media_type: self.media_type(),
            timestamp: self.timestamp.clone(),
            permalink: self.permalink.clone(),
        }
    }
}

/// One page of `/me/media`
#[derive(Debug, Clone, Deserialize)]
pub struct MediaPage {
    #[serde(default)]
    pub data: Vec<MediaEntry>,
    #[serde(default)]
    pub paging: Option<Paging>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Paging {
    #[serde(default)]
    pub next: Option<String>,
}

impl MediaPage {
    pub fn next_page(&self) -> Option<&str> {
        self.paging.as_ref()?.next.as_deref()
    }
}

/// Manifest entry persisted in `gallery.json`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GalleryEntry {
    pub id: String,
    pub caption: String,
    pub media_type: MediaType,
    pub timestamp: String,
    pub permalink: String,
}

impl GalleryEntry {
    /// Object shown in the grid: the thumbnail for videos, the media otherwise
    pub fn display_object_key(&self) -> String {
        match self.media_type {
            MediaType::Video => keys::thumbnail_object(&self.id),
            _ => keys::media_object(&self.id),
        }
    }
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAGE: &str = r#"{
        "data": [
            {
                "id": "1801",
                "caption": "Sunset",
                "media_type": "IMAGE",
                "media_url": "https://cdn.example/1801.jpg",
                "timestamp": "2024-01-05T18:10:00+0000",
                "permalink": "https://www.instagram.com/p/AAA/"
            },
            {
                "id": "1802",
                "media_type": "VIDEO",
                "media_url": "https://cdn.example/1802.mp4",
                "thumbnail_url": "https://cdn.example/1802.jpg",
                "timestamp": "2024-01-04T10:00:00+0000",
                "permalink": "https://www.instagram.com/p/BBB/"
            },
            {
                "id": "1803",
                "caption": null,
                "media_type": "CAROUSEL_ALBUM",
                "media_url": "https://cdn.example/1803.jpg",
                "timestamp": "2024-01-03T10:00:00+0000",
                "permalink": "https://www.instagram.com/p/CCC/"
            }
        ],
        "paging": {
            "cursors": {"before": "b", "after": "a"},
            "next": "https://graph.instagram.com/v18.0/me/media?after=a"
        }
    }"#;

    #[test]
    fn deserializes_all_media_types() {
        let page: MediaPage = serde_json::from_str(PAGE).unwrap();

        assert_eq!(page.data.len(), 3);
        assert_eq!(page.data[0].media_type(), MediaType::Image);
        assert_eq!(page.data[0].caption, "Sunset");
        assert_eq!(page.data[1].media_type(), MediaType::Video);
        assert_eq!(
            page.data[1].thumbnail_url(),
            Some("https://cdn.example/1802.jpg")
        );
        assert_eq!(page.data[1].caption, "");
        assert_eq!(page.data[2].media_type(), MediaType::CarouselAlbum);
        assert_eq!(page.data[2].caption, "");
        assert_eq!(
            page.next_page(),
            Some("https://graph.instagram.com/v18.0/me/media?after=a")
        );
    }

    #[test]
    fn object_keys_follow_naming_convention() {
        let page: MediaPage = serde_json::from_str(PAGE).unwrap();

        assert_eq!(page.data[0].media_object_key(), "media-1801");
        assert_eq!(page.data[0].thumbnail_object_key(), None);
        assert_eq!(page.data[1].thumbnail_object_key().as_deref(), Some("thumb-1802"));

        assert_eq!(page.data[0].gallery_entry().display_object_key(), "media-1801");
        assert_eq!(page.data[1].gallery_entry().display_object_key(), "thumb-1802");
    }

    #[test]
    fn gallery_entry_omits_media_url() {
        let page: MediaPage = serde_json::from_str(PAGE).unwrap();
        let json = serde_json::to_value(page.data[1].gallery_entry()).unwrap();

        assert_eq!(json["media_type"], "VIDEO");
        assert_eq!(json["permalink"], "https://www.instagram.com/p/BBB/");
        assert!(json.get("media_url").is_none());
        assert!(json.get("thumbnail_url").is_none());
    }

    #[test]
    fn page_without_paging_has_no_next() {
        let page: MediaPage = serde_json::from_str(r#"{"data": []}"#).unwrap();
        assert!(page.data.is_empty());
        assert_eq!(page.next_page(), None);
    }
}
