use thiserror::Error;

#[derive(Error, Debug)]
pub enum TtsError {
    /// The voice id is not in the current catalog
    #[error("Unknown voice: {0}")]
    InvalidVoice(String),

    /// The text cannot be synthesized as given
    #[error("{0}")]
    InvalidInput(String),

    /// The provider could not be reached or refused to list voices
    #[error("TTS provider unavailable: {0}")]
    ProviderUnavailable(anyhow::Error),

    /// A synthesis call failed remotely (network, auth, quota)
    #[error("TTS provider error: {detail}")]
    ProviderError {
        status: Option<u16>,
        detail: anyhow::Error,
    },
}

impl TtsError {
    pub fn provider(status: Option<u16>, detail: anyhow::Error) -> Self {
        Self::ProviderError { status, detail }
    }

    pub fn is_rate_limited(&self) -> bool {
        matches!(self, Self::ProviderError { status: Some(429), .. })
    }

    /// Errors caused by what the user asked for rather than by the provider
    pub fn is_user_error(&self) -> bool {
        matches!(self, Self::InvalidVoice(_) | Self::InvalidInput(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::anyhow;
    use rstest::rstest;

    #[rstest]
    #[case::invalid_voice(TtsError::InvalidVoice("v9".to_string()), true)]
    #[case::invalid_input(TtsError::InvalidInput("Text is empty".to_string()), true)]
    #[case::unavailable(TtsError::ProviderUnavailable(anyhow!("down")), false)]
    #[case::provider(TtsError::provider(Some(500), anyhow!("boom")), false)]
    fn test_user_errors_are_distinguished(#[case] error: TtsError, #[case] expected: bool) {
        assert_eq!(error.is_user_error(), expected);
    }
}
