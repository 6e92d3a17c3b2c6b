use chrono::{DateTime, Utc};

#[derive(serde::Serialize, serde::Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct Album {
    pub id: String,
    pub title: String,
}

#[derive(serde::Serialize, serde::Deserialize, Clone, Debug, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct MediaItem {
    pub id: String,
    pub filename: String,
    pub media_metadata: MediaMetadata,
}

#[derive(serde::Serialize, serde::Deserialize, Clone, Debug, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct MediaMetadata {
    pub creation_time: DateTime<Utc>,
}

impl MediaItem {
    pub fn creation_time(&self) -> DateTime<Utc> {
        self.media_metadata.creation_time
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum AlbumResolution {
    Existing(Album),
    Created(Album),
}

impl AlbumResolution {
    pub fn album(&self) -> &Album {
        match self {
            AlbumResolution::Existing(album) => album,
            AlbumResolution::Created(album) => album,
        }
    }

    pub fn was_created(&self) -> bool {
        matches!(self, AlbumResolution::Created(_))
    }
}

/// Half-open interval of creation times to scan, `start <= t < end`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ScanWindow {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl ScanWindow {
    pub fn contains(&self, instant: DateTime<Utc>) -> bool {
        self.start <= instant && instant < self.end
    }
}

#[derive(Clone, Debug)]
pub struct SyncReport {
    pub album: Album,
    pub created_album: bool,
    pub total_scanned: usize,
    pub matched: usize,
    pub added: usize,
}
