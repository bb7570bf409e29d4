use thiserror::Error;

use crate::application::image::ComposeError;
use crate::infra::discord::DiscordError;
use crate::infra::error::InfraError;

/// Top-level application failure surfaced to the runtime and the webhook
/// follow-up path.
#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Compose(#[from] ComposeError),
    #[error(transparent)]
    Discord(#[from] DiscordError),
    #[error(transparent)]
    Infra(#[from] InfraError),
    #[error("{0}")]
    Unexpected(String),
}

impl AppError {
    pub fn unexpected(message: impl Into<String>) -> Self {
        Self::Unexpected(message.into())
    }
}
