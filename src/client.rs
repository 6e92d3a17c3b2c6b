use chrono::{DateTime, Duration, Utc};
use itertools::Itertools;
use tracing::info;

use crate::api::{PhotosApi, SearchMediaItemsRequest};
use crate::entities::{Album, AlbumResolution, MediaItem, ScanWindow, SyncReport};
use crate::error::WamediaError;
use crate::utils::filename_utils::is_whatsapp_media_filename;

pub const ALBUM_LIST_PAGE_SIZE: i32 = 50;
pub const SEARCH_PAGE_SIZE: i32 = 100;
pub const BATCH_ADD_SIZE: usize = 50;

/// First album whose title is exactly equal to the query wins; duplicate
/// titles are not disambiguated.
pub fn find_album_by_title<'a>(albums: &'a [Album], title: &str) -> Option<&'a Album> {
    albums.iter().find(|album| album.title == title)
}

/// Resume one second past the newest captured item, or fall back to a fixed
/// lookback when nothing was captured yet.
pub fn compute_scan_window(
    last_creation_time: Option<DateTime<Utc>>,
    now: DateTime<Utc>,
    lookback_days: i64,
) -> ScanWindow {
    let start = match last_creation_time {
        Some(last) => last + Duration::seconds(1),
        None => now - Duration::days(lookback_days),
    };
    ScanWindow { start, end: now }
}

#[derive(Debug)]
pub struct ScanOutcome {
    pub matches: Vec<MediaItem>,
    pub total_scanned: usize,
}

pub struct WamediaClient<A: PhotosApi> {
    api: A,
}

impl<A: PhotosApi> WamediaClient<A> {
    pub fn new(api: A) -> Self {
        Self { api }
    }

    pub async fn get_all_albums(&self) -> Result<Vec<Album>, WamediaError> {
        let mut albums = Vec::new();
        let mut page_token: Option<String> = None;
        loop {
            let page = self.api.list_albums(ALBUM_LIST_PAGE_SIZE, page_token).await?;
            albums.extend(page.albums);
            page_token = page.next_page_token;
            if page_token.is_none() {
                break;
            }
        }
        Ok(albums)
    }

    pub async fn resolve_album(&self, title: &str) -> Result<AlbumResolution, WamediaError> {
        let albums = self.get_all_albums().await?;
        if let Some(existing) = find_album_by_title(&albums, title) {
            return Ok(AlbumResolution::Existing(existing.clone()));
        }
        let created = self.api.create_album(title).await?;
        Ok(AlbumResolution::Created(created))
    }

    pub async fn get_album_media_items(
        &self,
        album_id: &str,
    ) -> Result<Vec<MediaItem>, WamediaError> {
        let mut media_items = Vec::new();
        let mut page_token: Option<String> = None;
        loop {
            let request = SearchMediaItemsRequest::for_album(album_id, SEARCH_PAGE_SIZE, page_token);
            let page = self.api.search_media_items(request).await?;
            media_items.extend(page.media_items);
            page_token = page.next_page_token;
            if page_token.is_none() {
                break;
            }
        }
        Ok(media_items)
    }

    pub async fn last_creation_time(
        &self,
        album_id: &str,
    ) -> Result<Option<DateTime<Utc>>, WamediaError> {
        let media_items = self.get_album_media_items(album_id).await?;
        let last = media_items
            .into_iter()
            .sorted_by_key(|item| item.creation_time())
            .last();
        Ok(last.map(|item| item.creation_time()))
    }

    /// Page through the library restricted to the scan window, keeping items
    /// whose filename the classifier accepts. The remote date filter is
    /// day-granular, so items from the boundary days are rescanned; the exact
    /// window check keeps them from matching twice.
    pub async fn scan_for_whatsapp_media(
        &self,
        window: &ScanWindow,
    ) -> Result<ScanOutcome, WamediaError> {
        let mut matches: Vec<MediaItem> = Vec::new();
        let mut total_scanned = 0usize;
        let mut page_token: Option<String> = None;
        loop {
            let request =
                SearchMediaItemsRequest::for_date_window(window, SEARCH_PAGE_SIZE, page_token);
            let page = self.api.search_media_items(request).await?;
            total_scanned += page.media_items.len();
            for item in page.media_items {
                if is_whatsapp_media_filename(&item.filename) && window.contains(item.creation_time())
                {
                    matches.push(item);
                }
            }
            info!(
                "scanned {} media items, {} from WhatsApp so far",
                total_scanned,
                matches.len()
            );
            page_token = page.next_page_token;
            if page_token.is_none() {
                break;
            }
        }
        Ok(ScanOutcome {
            matches,
            total_scanned,
        })
    }

    pub async fn add_to_album(
        &self,
        album_id: &str,
        media_item_ids: &[String],
    ) -> Result<usize, WamediaError> {
        for chunk in media_item_ids.chunks(BATCH_ADD_SIZE) {
            self.api.batch_add_media_items(album_id, chunk).await?;
        }
        Ok(media_item_ids.len())
    }

    pub async fn get_media_item(&self, media_item_id: &str) -> Result<MediaItem, WamediaError> {
        Ok(self.api.get_media_item(media_item_id).await?)
    }

    pub async fn sync(
        &self,
        album_title: &str,
        lookback_days: i64,
    ) -> Result<SyncReport, WamediaError> {
        let resolution = self.resolve_album(album_title).await?;
        let album = resolution.album().clone();

        let last_creation_time = match &resolution {
            AlbumResolution::Existing(album) => self.last_creation_time(&album.id).await?,
            AlbumResolution::Created(_) => None,
        };
        let window = compute_scan_window(last_creation_time, Utc::now(), lookback_days);
        info!("scan window: {} .. {}", window.start, window.end);

        let outcome = self.scan_for_whatsapp_media(&window).await?;
        let media_item_ids = outcome
            .matches
            .iter()
            .map(|item| item.id.clone())
            .collect::<Vec<String>>();

        let added = if media_item_ids.is_empty() {
            0
        } else {
            self.add_to_album(&album.id, &media_item_ids).await?
        };

        Ok(SyncReport {
            album,
            created_album: resolution.was_created(),
            total_scanned: outcome.total_scanned,
            matched: media_item_ids.len(),
            added,
        })
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::sync::Mutex;

    use chrono::{NaiveDate, TimeZone};

    use crate::api::{AlbumsPage, ApiDate, ApiErrorDescription, MediaItemsPage, PhotosApiError};
    use crate::entities::MediaMetadata;

    use super::*;

    const TARGET_TITLE: &str = "WhatsApp-Media-Items";

    #[derive(Default)]
    struct FakePhotos {
        albums: Mutex<Vec<Album>>,
        library: Mutex<Vec<MediaItem>>,
        album_contents: Mutex<HashMap<String, Vec<String>>>,
        batch_add_calls: Mutex<Vec<Vec<String>>>,
        // When set, pages are cut at this size instead of the requested one.
        page_size_override: Option<usize>,
    }

    impl FakePhotos {
        fn with_library(media_items: Vec<MediaItem>) -> Self {
            Self {
                library: Mutex::new(media_items),
                ..Default::default()
            }
        }

        fn batch_add_calls(&self) -> Vec<Vec<String>> {
            self.batch_add_calls.lock().unwrap().clone()
        }

        fn paginate<T: Clone>(&self, all: &[T], page_size: i32, page_token: Option<String>) -> (Vec<T>, Option<String>) {
            let page_size = self.page_size_override.unwrap_or(page_size as usize);
            let offset = page_token.map(|token| token.parse::<usize>().unwrap()).unwrap_or(0);
            let page: Vec<T> = all.iter().skip(offset).take(page_size).cloned().collect();
            let next = offset + page.len();
            let next_page_token = (next < all.len()).then(|| next.to_string());
            (page, next_page_token)
        }
    }

    fn naive_date(date: &ApiDate) -> NaiveDate {
        NaiveDate::from_ymd_opt(date.year, date.month, date.day).unwrap()
    }

    fn media_item(id: &str, filename: &str, creation_time: DateTime<Utc>) -> MediaItem {
        MediaItem {
            id: id.to_string(),
            filename: filename.to_string(),
            media_metadata: MediaMetadata { creation_time },
        }
    }

    impl PhotosApi for FakePhotos {
        async fn list_albums(
            &self,
            page_size: i32,
            page_token: Option<String>,
        ) -> Result<AlbumsPage, PhotosApiError> {
            let albums = self.albums.lock().unwrap();
            let (page, next_page_token) = self.paginate(albums.as_slice(), page_size, page_token);
            Ok(AlbumsPage {
                albums: page,
                next_page_token,
            })
        }

        async fn create_album(&self, title: &str) -> Result<Album, PhotosApiError> {
            let mut albums = self.albums.lock().unwrap();
            let album = Album {
                id: format!("album-{}", albums.len() + 1),
                title: title.to_string(),
            };
            albums.push(album.clone());
            Ok(album)
        }

        async fn search_media_items(
            &self,
            request: SearchMediaItemsRequest,
        ) -> Result<MediaItemsPage, PhotosApiError> {
            let library = self.library.lock().unwrap();
            let selected: Vec<MediaItem> = if let Some(album_id) = &request.album_id {
                let album_contents = self.album_contents.lock().unwrap();
                let ids = album_contents.get(album_id).cloned().unwrap_or_default();
                library.iter().filter(|item| ids.contains(&item.id)).cloned().collect()
            } else if let Some(filters) = &request.filters {
                let range = &filters.date_filter.ranges[0];
                let start = naive_date(&range.start_date);
                let end = naive_date(&range.end_date);
                library
                    .iter()
                    .filter(|item| {
                        let date = item.creation_time().date_naive();
                        start <= date && date <= end
                    })
                    .cloned()
                    .collect()
            } else {
                library.clone()
            };
            let (page, next_page_token) =
                self.paginate(selected.as_slice(), request.page_size, request.page_token);
            Ok(MediaItemsPage {
                media_items: page,
                next_page_token,
            })
        }

        async fn batch_add_media_items(
            &self,
            album_id: &str,
            media_item_ids: &[String],
        ) -> Result<(), PhotosApiError> {
            self.batch_add_calls.lock().unwrap().push(media_item_ids.to_vec());
            self.album_contents
                .lock()
                .unwrap()
                .entry(album_id.to_string())
                .or_default()
                .extend(media_item_ids.iter().cloned());
            Ok(())
        }

        async fn get_media_item(&self, media_item_id: &str) -> Result<MediaItem, PhotosApiError> {
            self.library
                .lock()
                .unwrap()
                .iter()
                .find(|item| item.id == media_item_id)
                .cloned()
                .ok_or_else(|| {
                    PhotosApiError::NonSuccessfulStatusCode(ApiErrorDescription {
                        code: 404,
                        status: "NOT_FOUND".to_string(),
                        message: "media item not found".to_string(),
                    })
                })
        }
    }

    #[test]
    fn lookup_returns_first_exact_title_match() {
        let albums = vec![
            Album { id: "a1".to_string(), title: "Holidays".to_string() },
            Album { id: "a2".to_string(), title: TARGET_TITLE.to_string() },
            Album { id: "a3".to_string(), title: TARGET_TITLE.to_string() },
        ];
        assert_eq!(find_album_by_title(&albums, TARGET_TITLE).map(|a| a.id.as_str()), Some("a2"));
        assert_eq!(find_album_by_title(&albums, "whatsapp-media-items"), None);
        assert_eq!(find_album_by_title(&[], TARGET_TITLE), None);
    }

    #[test]
    fn window_resumes_one_second_past_last_item() {
        let now = Utc.with_ymd_and_hms(2023, 4, 11, 8, 0, 0).unwrap();
        let t3 = Utc.with_ymd_and_hms(2023, 4, 1, 17, 30, 45).unwrap();

        let window = compute_scan_window(Some(t3), now, 100);
        assert_eq!(window.start, t3 + Duration::seconds(1));
        assert_eq!(window.end, now);

        let window = compute_scan_window(None, now, 100);
        assert_eq!(window.start, now - Duration::days(100));
        assert_eq!(window.end, now);
    }

    #[test]
    fn window_is_half_open() {
        let now = Utc.with_ymd_and_hms(2023, 4, 11, 8, 0, 0).unwrap();
        let window = compute_scan_window(None, now, 100);
        assert!(window.contains(window.start));
        assert!(window.contains(now - Duration::seconds(1)));
        assert!(!window.contains(now));
        assert!(!window.contains(window.start - Duration::seconds(1)));
    }

    #[tokio::test]
    async fn albums_are_gathered_across_pages() {
        let api = FakePhotos {
            albums: Mutex::new(
                (1..=120)
                    .map(|i| Album { id: format!("a{i}"), title: format!("Album {i}") })
                    .collect(),
            ),
            ..Default::default()
        };
        let client = WamediaClient::new(api);
        let albums = client.get_all_albums().await.unwrap();
        assert_eq!(albums.len(), 120);
        assert_eq!(albums[0].id, "a1");
        assert_eq!(albums[119].id, "a120");
    }

    #[tokio::test]
    async fn resolve_album_prefers_existing_over_creating() {
        let api = FakePhotos {
            albums: Mutex::new(vec![Album {
                id: "a1".to_string(),
                title: TARGET_TITLE.to_string(),
            }]),
            ..Default::default()
        };
        let client = WamediaClient::new(api);

        let resolution = client.resolve_album(TARGET_TITLE).await.unwrap();
        assert!(!resolution.was_created());
        assert_eq!(resolution.album().id, "a1");

        let resolution = client.resolve_album("Holidays").await.unwrap();
        assert!(resolution.was_created());
        assert_eq!(resolution.album().title, "Holidays");
    }

    #[tokio::test]
    async fn last_creation_time_takes_the_newest_album_item() {
        let t1 = Utc.with_ymd_and_hms(2023, 1, 1, 10, 0, 0).unwrap();
        let t2 = Utc.with_ymd_and_hms(2023, 1, 2, 10, 0, 0).unwrap();
        let t3 = Utc.with_ymd_and_hms(2023, 1, 3, 10, 0, 0).unwrap();
        let api = FakePhotos::with_library(vec![
            media_item("m1", "IMG-20230101-WA0001.jpg", t1),
            media_item("m3", "IMG-20230103-WA0003.jpg", t3),
            media_item("m2", "IMG-20230102-WA0002.jpg", t2),
        ]);
        api.album_contents.lock().unwrap().insert(
            "album-1".to_string(),
            vec!["m1".to_string(), "m3".to_string(), "m2".to_string()],
        );
        let client = WamediaClient::new(api);

        assert_eq!(client.last_creation_time("album-1").await.unwrap(), Some(t3));
        assert_eq!(client.last_creation_time("album-2").await.unwrap(), None);
    }

    #[tokio::test]
    async fn batches_are_chunked_in_order() {
        let media_item_ids = (1..=120).map(|i| format!("m{i}")).collect::<Vec<String>>();
        let client = WamediaClient::new(FakePhotos::default());

        let added = client.add_to_album("album-1", &media_item_ids).await.unwrap();
        assert_eq!(added, 120);

        let calls = client.api.batch_add_calls();
        assert_eq!(calls.len(), 3);
        assert_eq!(calls[0].len(), 50);
        assert_eq!(calls[1].len(), 50);
        assert_eq!(calls[2].len(), 20);
        assert_eq!(calls.concat(), media_item_ids);
    }

    #[tokio::test]
    async fn zero_matches_issue_no_batch_add() {
        let client = WamediaClient::new(FakePhotos::default());
        let added = client.add_to_album("album-1", &[]).await.unwrap();
        assert_eq!(added, 0);
        assert!(client.api.batch_add_calls().is_empty());
    }

    #[tokio::test]
    async fn sync_creates_album_and_adds_matches_in_page_order() {
        let now = Utc::now();
        let api = FakePhotos {
            library: Mutex::new(vec![
                media_item("m1", "IMG-20230101-WA0001.jpg", now - Duration::days(2)),
                media_item("m2", "photo.png", now - Duration::days(2)),
                media_item("m3", "VID-20230102-WA0002.mp4", now - Duration::days(1)),
            ]),
            page_size_override: Some(2),
            ..Default::default()
        };
        let client = WamediaClient::new(api);

        let report = client.sync(TARGET_TITLE, 100).await.unwrap();

        assert!(report.created_album);
        assert_eq!(report.album.title, TARGET_TITLE);
        assert_eq!(report.total_scanned, 3);
        assert_eq!(report.matched, 2);
        assert_eq!(report.added, 2);

        let calls = client.api.batch_add_calls();
        assert_eq!(calls, vec![vec!["m1".to_string(), "m3".to_string()]]);
    }

    #[tokio::test]
    async fn second_sync_finds_nothing_new_and_adds_nothing() {
        let now = Utc::now();
        let api = FakePhotos::with_library(vec![
            media_item("m1", "IMG-20230101-WA0001.jpg", now - Duration::days(2)),
            media_item("m3", "VID-20230102-WA0002.mp4", now - Duration::days(1)),
        ]);
        let client = WamediaClient::new(api);

        let first = client.sync(TARGET_TITLE, 100).await.unwrap();
        assert_eq!(first.matched, 2);
        assert_eq!(client.api.batch_add_calls().len(), 1);

        let second = client.sync(TARGET_TITLE, 100).await.unwrap();
        assert!(!second.created_album);
        assert_eq!(second.matched, 0);
        assert_eq!(second.added, 0);
        assert_eq!(client.api.batch_add_calls().len(), 1);
    }
}
