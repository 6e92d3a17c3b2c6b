use thiserror::Error;

use crate::api::PhotosApiError;

#[derive(Error, Debug)]
pub enum WamediaError {
    #[error("failed to read/write token file: {0}")]
    TokenIo(std::io::Error),
    #[error("failed to serialize/deserialize stored token: {0}")]
    TokenSerialization(serde_json::Error),
    #[error("failed to read client secrets file: {0}")]
    SecretsIo(std::io::Error),
    #[error("failed to deserialize client secrets file: {0}")]
    SecretsSerialization(serde_json::Error),
    #[error("client secrets file lists no redirect URI")]
    MissingRedirectUri,
    #[error("token endpoint request failed: {0}")]
    TokenEndpointNetwork(reqwest::Error),
    #[error("token endpoint returned {status}: {description}")]
    TokenEndpointRejected { status: u16, description: String },
    #[error("failed to read authorization code: {0}")]
    PromptIo(std::io::Error),
    #[error("Photos API error: {0}")]
    Api(#[from] PhotosApiError),
}
