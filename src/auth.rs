use std::path::{Path, PathBuf};

use chrono::{DateTime, Duration, Utc};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::WamediaError;

pub const PHOTOS_SCOPE: &str = "https://www.googleapis.com/auth/photoslibrary";

/// Client secrets file issued by the identity provider for an installed app.
#[derive(Debug, Clone, Deserialize)]
pub struct ClientSecrets {
    pub installed: InstalledApp,
}

#[derive(Debug, Clone, Deserialize)]
pub struct InstalledApp {
    pub client_id: String,
    pub client_secret: String,
    pub auth_uri: String,
    pub token_uri: String,
    #[serde(default)]
    pub redirect_uris: Vec<String>,
}

impl ClientSecrets {
    pub fn load(path: &Path) -> Result<Self, WamediaError> {
        let file_str = std::fs::read_to_string(path).map_err(WamediaError::SecretsIo)?;
        serde_json::from_str(&file_str).map_err(WamediaError::SecretsSerialization)
    }
}

/// Token file layout written by Google's OAuth client libraries. The access
/// token is stored under the `token` key.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct StoredToken {
    #[serde(rename = "token")]
    pub access_token: String,
    pub refresh_token: Option<String>,
    pub token_uri: String,
    pub client_id: String,
    pub client_secret: String,
    #[serde(default)]
    pub scopes: Vec<String>,
    pub expiry: Option<DateTime<Utc>>,
}

impl StoredToken {
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expiry.map_or(true, |expiry| expiry <= now)
    }
}

pub trait TokenStore {
    async fn load(&self) -> Result<Option<StoredToken>, WamediaError>;
    async fn save(&mut self, token: &StoredToken) -> Result<(), WamediaError>;
}

pub struct FileTokenStore {
    token_path: PathBuf,
}

impl FileTokenStore {
    pub fn new(token_path: PathBuf) -> Self {
        Self { token_path }
    }
}

impl TokenStore for FileTokenStore {
    async fn load(&self) -> Result<Option<StoredToken>, WamediaError> {
        if !self.token_path.exists() {
            return Ok(None);
        }
        let file_str = tokio::fs::read_to_string(&self.token_path)
            .await
            .map_err(WamediaError::TokenIo)?;
        let token = serde_json::from_str(&file_str).map_err(WamediaError::TokenSerialization)?;
        Ok(Some(token))
    }

    async fn save(&mut self, token: &StoredToken) -> Result<(), WamediaError> {
        let serialized_token =
            serde_json::to_string(token).map_err(WamediaError::TokenSerialization)?;
        tokio::fs::write(&self.token_path, serialized_token)
            .await
            .map_err(WamediaError::TokenIo)?;
        Ok(())
    }
}

#[derive(Debug, Default)]
pub struct MemoryTokenStore {
    token: Option<StoredToken>,
}

impl TokenStore for MemoryTokenStore {
    async fn load(&self) -> Result<Option<StoredToken>, WamediaError> {
        Ok(self.token.clone())
    }

    async fn save(&mut self, token: &StoredToken) -> Result<(), WamediaError> {
        self.token = Some(token.clone());
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CredentialOutcome {
    /// A usable token was loaded from the store or silently refreshed.
    Valid(StoredToken),
    /// The operator has to walk through the consent flow at this URL.
    AuthRequired { auth_url: String },
}

#[derive(Debug, Deserialize)]
struct GrantedToken {
    access_token: String,
    #[serde(default)]
    refresh_token: Option<String>,
    expires_in: i64,
}

pub struct Authenticator {
    secrets: ClientSecrets,
    http_client: Client,
}

impl Authenticator {
    pub fn new(secrets: ClientSecrets) -> Self {
        Self {
            secrets,
            http_client: Client::new(),
        }
    }

    /// Load a token from the store, refreshing it when expired. Never blocks
    /// on operator input; an interactive caller handles `AuthRequired`.
    pub async fn acquire<S: TokenStore>(
        &self,
        store: &mut S,
    ) -> Result<CredentialOutcome, WamediaError> {
        let now = Utc::now();
        if let Some(token) = store.load().await? {
            if !token.is_expired(now) {
                return Ok(CredentialOutcome::Valid(token));
            }
            if let Some(refresh_token) = token.refresh_token.as_deref() {
                info!("stored token is expired, refreshing");
                let refreshed = self.refresh(&token, refresh_token).await?;
                store.save(&refreshed).await?;
                return Ok(CredentialOutcome::Valid(refreshed));
            }
        }
        Ok(CredentialOutcome::AuthRequired {
            auth_url: self.authorization_url()?,
        })
    }

    pub fn authorization_url(&self) -> Result<String, WamediaError> {
        let installed = &self.secrets.installed;
        let redirect_uri = self.redirect_uri()?;
        Ok(format!(
            "{}?client_id={}&redirect_uri={}&response_type=code&scope={}&access_type=offline&prompt=consent",
            installed.auth_uri,
            urlencoding::encode(&installed.client_id),
            urlencoding::encode(redirect_uri),
            urlencoding::encode(PHOTOS_SCOPE),
        ))
    }

    pub async fn exchange_code<S: TokenStore>(
        &self,
        code: &str,
        store: &mut S,
    ) -> Result<StoredToken, WamediaError> {
        let installed = &self.secrets.installed;
        let redirect_uri = self.redirect_uri()?;
        let params = [
            ("code", code),
            ("client_id", installed.client_id.as_str()),
            ("client_secret", installed.client_secret.as_str()),
            ("redirect_uri", redirect_uri),
            ("grant_type", "authorization_code"),
        ];
        let http_response = self
            .http_client
            .post(&installed.token_uri)
            .form(&params)
            .send()
            .await
            .map_err(WamediaError::TokenEndpointNetwork)?;
        let granted = Self::decode_granted_token(http_response).await?;

        let token = StoredToken {
            access_token: granted.access_token,
            refresh_token: granted.refresh_token,
            token_uri: installed.token_uri.clone(),
            client_id: installed.client_id.clone(),
            client_secret: installed.client_secret.clone(),
            scopes: vec![PHOTOS_SCOPE.to_string()],
            expiry: Some(Utc::now() + Duration::seconds(granted.expires_in)),
        };
        store.save(&token).await?;
        Ok(token)
    }

    async fn refresh(
        &self,
        token: &StoredToken,
        refresh_token: &str,
    ) -> Result<StoredToken, WamediaError> {
        let params = [
            ("client_id", token.client_id.as_str()),
            ("client_secret", token.client_secret.as_str()),
            ("refresh_token", refresh_token),
            ("grant_type", "refresh_token"),
        ];
        let http_response = self
            .http_client
            .post(&token.token_uri)
            .form(&params)
            .send()
            .await
            .map_err(WamediaError::TokenEndpointNetwork)?;
        let granted = Self::decode_granted_token(http_response).await?;

        Ok(StoredToken {
            access_token: granted.access_token,
            // The provider omits the refresh token when it is unchanged.
            refresh_token: granted.refresh_token.or_else(|| token.refresh_token.clone()),
            token_uri: token.token_uri.clone(),
            client_id: token.client_id.clone(),
            client_secret: token.client_secret.clone(),
            scopes: token.scopes.clone(),
            expiry: Some(Utc::now() + Duration::seconds(granted.expires_in)),
        })
    }

    async fn decode_granted_token(
        http_response: reqwest::Response,
    ) -> Result<GrantedToken, WamediaError> {
        let status = http_response.status();
        let response_str = http_response
            .text()
            .await
            .map_err(WamediaError::TokenEndpointNetwork)?;
        if !status.is_success() {
            return Err(WamediaError::TokenEndpointRejected {
                status: status.as_u16(),
                description: response_str,
            });
        }
        serde_json::from_str(&response_str).map_err(WamediaError::TokenSerialization)
    }

    fn redirect_uri(&self) -> Result<&str, WamediaError> {
        self.secrets
            .installed
            .redirect_uris
            .first()
            .map(|uri| uri.as_str())
            .ok_or(WamediaError::MissingRedirectUri)
    }
}
