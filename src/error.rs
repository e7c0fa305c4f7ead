use thiserror::Error;

/// Failure of the single directory round trip.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("directory request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("directory returned status {0}")]
    Status(reqwest::StatusCode),

    #[error("could not parse station list: {0}")]
    Json(#[from] serde_json::Error),
}

/// Failure reported by the audio engine while creating a session.
#[derive(Debug, Error)]
pub enum PlaybackError {
    #[error("failed to initialize audio output: {0}. Check your audio drivers")]
    Output(String),

    #[error("failed to create audio sink: {0}")]
    Sink(String),

    #[error("failed to spawn ffmpeg: {0}. Is ffmpeg installed?")]
    Decoder(#[from] std::io::Error),

    #[error("failed to capture ffmpeg stdout")]
    DecoderStdout,
}
