//! Failures of the collaborators the portal does not own: the risk model
//! artifact and the translation and generation APIs.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum UpstreamError {
    #[error("Could not load the risk model: {0}")]
    Artifact(String),

    #[error("Risk model failure: {0}")]
    Model(String),

    #[error("{service} request failed: {source}")]
    Transport {
        service: &'static str,
        #[source]
        source: reqwest::Error,
    },

    #[error("{service} answered {status}: {body}")]
    Status {
        service: &'static str,
        status: u16,
        body: String,
    },

    #[error("{service} returned an unexpected payload")]
    Payload { service: &'static str },
}
