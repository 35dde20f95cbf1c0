// Centralized error types for torrent-finder

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while loading or validating the configuration file
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Errors raised by the download daemon adapter
#[derive(Error, Debug)]
pub enum DispatchError {
    #[error("Daemon unreachable: {0}")]
    Unreachable(String),

    #[error("Daemon returned HTTP {0}")]
    HttpStatus(u16),

    #[error("Failed to negotiate daemon session id")]
    SessionNegotiation,

    #[error("Daemon rejected the request: {0}")]
    Rejected(String),

    #[error("Failed to decode daemon response: {0}")]
    Decode(String),
}

impl From<reqwest::Error> for DispatchError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            DispatchError::Decode(err.to_string())
        } else {
            DispatchError::Unreachable(err.to_string())
        }
    }
}

/// Errors raised inside the Torznab client.
///
/// These never leave the indexer layer: `Indexer::search` logs them and
/// returns an empty list.
#[derive(Error, Debug)]
pub enum IndexerError {
    #[error("Indexer request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("Indexer returned HTTP {status}")]
    HttpStatus { status: u16, body_head: String },

    #[error("Indexer returned invalid XML: {0}")]
    Xml(String),
}

/// Errors raised by a chat transport
#[derive(Error, Debug)]
pub enum TransportError {
    #[error("Chat API request failed: {0}")]
    Request(reqwest::Error),

    #[error("Chat API returned an error: {0}")]
    Api(String),
}

/// Bot API URLs carry the token; the error keeps none
impl From<reqwest::Error> for TransportError {
    fn from(err: reqwest::Error) -> Self {
        TransportError::Request(err.without_url())
    }
}

/// Outcome of the one-shot finder when nothing could be sent
#[derive(Error, Debug)]
pub enum FindError {
    #[error("No candidates found for '{0}'")]
    NoCandidates(String),

    #[error(transparent)]
    Dispatch(#[from] DispatchError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_find_error_messages() {
        let err = FindError::NoCandidates("dune".to_string());
        assert_eq!(err.to_string(), "No candidates found for 'dune'");

        let err = FindError::from(DispatchError::Rejected("duplicate torrent".to_string()));
        assert_eq!(err.to_string(), "Daemon rejected the request: duplicate torrent");
    }

    #[test]
    fn test_config_error_from_toml() {
        let parse_err = toml::from_str::<toml::Value>("not = [valid").unwrap_err();
        let err = ConfigError::from(parse_err);
        assert!(err.to_string().starts_with("Failed to parse config file"));
    }
}
