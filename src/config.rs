use std::path::PathBuf;

use clap::Args;

#[derive(Args, Debug)]
pub struct FlatConfig {
    #[arg(
        long,
        env = "WAMEDIA_ALBUM_TITLE",
        default_value = "WhatsApp-Media-Items",
        help = "Title of the album that collects WhatsApp media"
    )]
    album_title: String,

    #[arg(
        long,
        env = "WAMEDIA_LOOKBACK_DAYS",
        default_value_t = 100,
        help = "Days to scan back when the album has no items yet"
    )]
    lookback_days: i64,

    #[arg(
        long,
        env = "WAMEDIA_CREDENTIALS_PATH",
        default_value = "credentials.json",
        help = "OAuth client secrets file"
    )]
    credentials_path: PathBuf,

    #[arg(
        long,
        env = "WAMEDIA_TOKEN_PATH",
        default_value = "token.json",
        help = "File the acquired token is persisted to"
    )]
    token_path: PathBuf,
}

#[derive(Debug)]
pub struct Config {
    pub album: AlbumConfiguration,
    pub auth: AuthConfiguration,
}

#[derive(Debug)]
pub struct AlbumConfiguration {
    pub title: String,
    pub lookback_days: i64,
}

#[derive(Debug)]
pub struct AuthConfiguration {
    pub credentials_path: PathBuf,
    pub token_path: PathBuf,
}

impl From<FlatConfig> for Config {
    fn from(value: FlatConfig) -> Self {
        Config {
            album: AlbumConfiguration {
                title: value.album_title,
                lookback_days: value.lookback_days,
            },
            auth: AuthConfiguration {
                credentials_path: value.credentials_path,
                token_path: value.token_path,
            },
        }
    }
}
