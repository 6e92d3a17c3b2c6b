use reqwest::header::{HeaderMap, HeaderValue};
use reqwest::{Client, ClientBuilder};
use serde::de::DeserializeOwned;
use serde_json::json;

use crate::api::{
    AlbumsPage, ApiErrorDescription, ApiErrorEnvelope, MediaItemsPage, PhotosApi, PhotosApiError,
    SearchMediaItemsRequest, API_BASE_URL,
};
use crate::entities::{Album, MediaItem};

#[derive(Clone)]
pub struct GooglePhotosClient {
    http_client: Client,
    base_url: String,
}

impl GooglePhotosClient {
    pub fn new(access_token: &str) -> Self {
        let mut auth = HeaderValue::from_str(&format!("Bearer {access_token}")).unwrap();
        auth.set_sensitive(true);

        let mut header_map = HeaderMap::new();
        header_map.insert("Authorization", auth);
        header_map.insert("Accept", HeaderValue::from_static("application/json"));

        let http_client = ClientBuilder::new()
            .default_headers(header_map)
            .use_rustls_tls()
            .build()
            .unwrap();

        Self {
            http_client,
            base_url: API_BASE_URL.to_string(),
        }
    }

    async fn decode<T: DeserializeOwned>(
        http_response: reqwest::Response,
    ) -> Result<T, PhotosApiError> {
        let status = http_response.status();
        let response_str = http_response
            .text()
            .await
            .map_err(PhotosApiError::NetworkError)?;
        if !status.is_success() {
            let description = match serde_json::from_str::<ApiErrorEnvelope>(&response_str) {
                Ok(envelope) => envelope.error,
                Err(_) => ApiErrorDescription {
                    code: status.as_u16() as i32,
                    status: status.to_string(),
                    message: response_str,
                },
            };
            return Err(PhotosApiError::NonSuccessfulStatusCode(description));
        }
        serde_json::from_str(&response_str).map_err(PhotosApiError::DeserializationError)
    }
}

impl PhotosApi for GooglePhotosClient {
    async fn list_albums(
        &self,
        page_size: i32,
        page_token: Option<String>,
    ) -> Result<AlbumsPage, PhotosApiError> {
        let url = format!("{}/albums", self.base_url);
        let mut request = self
            .http_client
            .get(&url)
            .query(&[("pageSize", page_size.to_string())]);
        if let Some(token) = page_token {
            request = request.query(&[("pageToken", token)]);
        }
        let http_response = request.send().await.map_err(PhotosApiError::NetworkError)?;
        Self::decode(http_response).await
    }

    async fn create_album(&self, title: &str) -> Result<Album, PhotosApiError> {
        let url = format!("{}/albums", self.base_url);
        let http_response = self
            .http_client
            .post(&url)
            .json(&json!({ "album": { "title": title } }))
            .send()
            .await
            .map_err(PhotosApiError::NetworkError)?;
        Self::decode(http_response).await
    }

    async fn search_media_items(
        &self,
        request: SearchMediaItemsRequest,
    ) -> Result<MediaItemsPage, PhotosApiError> {
        let url = format!("{}/mediaItems:search", self.base_url);
        let http_response = self
            .http_client
            .post(&url)
            .json(&request)
            .send()
            .await
            .map_err(PhotosApiError::NetworkError)?;
        Self::decode(http_response).await
    }

    async fn batch_add_media_items(
        &self,
        album_id: &str,
        media_item_ids: &[String],
    ) -> Result<(), PhotosApiError> {
        let url = format!("{}/albums/{}:batchAddMediaItems", self.base_url, album_id);
        let http_response = self
            .http_client
            .post(&url)
            .json(&json!({ "mediaItemIds": media_item_ids }))
            .send()
            .await
            .map_err(PhotosApiError::NetworkError)?;
        Self::decode::<serde_json::Value>(http_response).await?;
        Ok(())
    }

    async fn get_media_item(&self, media_item_id: &str) -> Result<MediaItem, PhotosApiError> {
        let url = format!("{}/mediaItems/{}", self.base_url, media_item_id);
        let http_response = self
            .http_client
            .get(&url)
            .send()
            .await
            .map_err(PhotosApiError::NetworkError)?;
        Self::decode(http_response).await
    }
}
