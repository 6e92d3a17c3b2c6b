use chrono::{DateTime, Datelike, Utc};
use serde::{Deserialize, Serialize};

use crate::entities::{Album, MediaItem, ScanWindow};

mod client;

pub use client::GooglePhotosClient;

pub const API_BASE_URL: &str = "https://photoslibrary.googleapis.com/v1";

#[derive(Debug, thiserror::Error)]
pub enum PhotosApiError {
    #[error("network error: {0}")]
    NetworkError(reqwest::Error),
    #[error("deserialization error: {0}")]
    DeserializationError(serde_json::Error),
    #[error("non-OK response: {0}")]
    NonSuccessfulStatusCode(ApiErrorDescription),
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ApiErrorDescription {
    pub code: i32,
    pub status: String,
    pub message: String,
}

impl std::fmt::Display for ApiErrorDescription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({}): {}", self.status, self.code, self.message)
    }
}

#[derive(Debug, Deserialize)]
pub struct ApiErrorEnvelope {
    pub error: ApiErrorDescription,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AlbumsPage {
    #[serde(default)]
    pub albums: Vec<Album>,
    pub next_page_token: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MediaItemsPage {
    #[serde(default)]
    pub media_items: Vec<MediaItem>,
    pub next_page_token: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchMediaItemsRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub album_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filters: Option<SearchFilters>,
    pub page_size: i32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page_token: Option<String>,
}

impl SearchMediaItemsRequest {
    pub fn for_album(album_id: &str, page_size: i32, page_token: Option<String>) -> Self {
        Self {
            album_id: Some(album_id.to_string()),
            filters: None,
            page_size,
            page_token,
        }
    }

    pub fn for_date_window(window: &ScanWindow, page_size: i32, page_token: Option<String>) -> Self {
        Self {
            album_id: None,
            filters: Some(SearchFilters {
                date_filter: DateFilter {
                    ranges: vec![DateRange {
                        start_date: window.start.into(),
                        end_date: window.end.into(),
                    }],
                },
            }),
            page_size,
            page_token,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchFilters {
    pub date_filter: DateFilter,
}

#[derive(Debug, Clone, Serialize)]
pub struct DateFilter {
    pub ranges: Vec<DateRange>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DateRange {
    pub start_date: ApiDate,
    pub end_date: ApiDate,
}

// The search endpoint filters at whole-day granularity.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct ApiDate {
    pub year: i32,
    pub month: u32,
    pub day: u32,
}

impl From<DateTime<Utc>> for ApiDate {
    fn from(instant: DateTime<Utc>) -> Self {
        Self {
            year: instant.year(),
            month: instant.month(),
            day: instant.day(),
        }
    }
}

pub trait PhotosApi {
    async fn list_albums(
        &self,
        page_size: i32,
        page_token: Option<String>,
    ) -> Result<AlbumsPage, PhotosApiError>;

    async fn create_album(&self, title: &str) -> Result<Album, PhotosApiError>;

    async fn search_media_items(
        &self,
        request: SearchMediaItemsRequest,
    ) -> Result<MediaItemsPage, PhotosApiError>;

    async fn batch_add_media_items(
        &self,
        album_id: &str,
        media_item_ids: &[String],
    ) -> Result<(), PhotosApiError>;

    async fn get_media_item(&self, media_item_id: &str) -> Result<MediaItem, PhotosApiError>;
}
