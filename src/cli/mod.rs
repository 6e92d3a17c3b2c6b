use std::io::Write;

use clap::{Parser, Subcommand};

use crate::api::GooglePhotosClient;
use crate::auth::{Authenticator, ClientSecrets, CredentialOutcome, FileTokenStore, StoredToken};
use crate::client::WamediaClient;
use crate::config::{Config, FlatConfig};
use crate::error::WamediaError;

#[derive(Parser, Debug)]
#[command(
    name = "wamedia",
    version,
    about = "Collects WhatsApp photos and videos from a Google Photos library into a dedicated album"
)]
pub struct Cli {
    #[command(flatten)]
    pub config: FlatConfig,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Scan the library and add new WhatsApp media to the target album
    Sync,
    /// List all albums in the library
    Albums,
    /// Show a single media item
    Media { media_id: String },
    /// Run the authorization flow and store the token
    Login,
}

pub async fn sync(config: &Config) -> Result<(), WamediaError> {
    let client = authenticated_client(config).await?;
    let report = client
        .sync(&config.album.title, config.album.lookback_days)
        .await?;

    if report.created_album {
        println!("Created album: {} (id: {})", report.album.title, report.album.id);
    } else {
        println!("Album already exists: {} (id: {})", report.album.title, report.album.id);
    }
    println!(
        "Found {} WhatsApp media items from total {} scanned.",
        report.matched, report.total_scanned
    );
    println!("Added {} media items to the album.", report.added);
    Ok(())
}

pub async fn list_albums(config: &Config) -> Result<(), WamediaError> {
    let client = authenticated_client(config).await?;
    let albums = client.get_all_albums().await?;

    if albums.is_empty() {
        println!("No albums found.");
        return Ok(());
    }
    println!("Albums:");
    for album in &albums {
        println!("  {} (id: {})", album.title, album.id);
    }
    Ok(())
}

pub async fn show_media_item(config: &Config, media_id: &str) -> Result<(), WamediaError> {
    let client = authenticated_client(config).await?;
    let media_item = client.get_media_item(media_id).await?;

    println!("Media item: {} (id: {})", media_item.filename, media_item.id);
    println!("Created at: {}", media_item.creation_time());
    Ok(())
}

pub async fn login(config: &Config) -> Result<(), WamediaError> {
    let secrets = ClientSecrets::load(&config.auth.credentials_path)?;
    let authenticator = Authenticator::new(secrets);
    let mut store = FileTokenStore::new(config.auth.token_path.clone());

    let auth_url = authenticator.authorization_url()?;
    prompt_for_authorization(&authenticator, &mut store, &auth_url).await?;
    println!("Authorization complete, token stored.");
    Ok(())
}

async fn authenticated_client(
    config: &Config,
) -> Result<WamediaClient<GooglePhotosClient>, WamediaError> {
    let secrets = ClientSecrets::load(&config.auth.credentials_path)?;
    let authenticator = Authenticator::new(secrets);
    let mut store = FileTokenStore::new(config.auth.token_path.clone());

    let token = match authenticator.acquire(&mut store).await? {
        CredentialOutcome::Valid(token) => token,
        CredentialOutcome::AuthRequired { auth_url } => {
            prompt_for_authorization(&authenticator, &mut store, &auth_url).await?
        }
    };
    Ok(WamediaClient::new(GooglePhotosClient::new(&token.access_token)))
}

async fn prompt_for_authorization(
    authenticator: &Authenticator,
    store: &mut FileTokenStore,
    auth_url: &str,
) -> Result<StoredToken, WamediaError> {
    println!("Visit this URL to authorize access to your photo library:");
    println!("{auth_url}");
    print!("Enter the authorization code: ");
    std::io::stdout().flush().map_err(WamediaError::PromptIo)?;

    let mut code = String::new();
    std::io::stdin()
        .read_line(&mut code)
        .map_err(WamediaError::PromptIo)?;
    authenticator.exchange_code(code.trim(), store).await
}
