//! Loading the geography lookup table from disk or over HTTP.

use crate::error::SourceError;
use std::fmt;
use std::path::PathBuf;
use tracing::{debug, info};

/// Where the lookup table lives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GeographySource {
    File(PathBuf),
    Url(String),
}

impl GeographySource {
    /// Interpret a CLI/config value: anything starting with `http://` or
    /// `https://` is fetched, everything else is a local path.
    pub fn parse(value: &str) -> Self {
        if value.starts_with("http://") || value.starts_with("https://") {
            GeographySource::Url(value.to_string())
        } else {
            GeographySource::File(PathBuf::from(value))
        }
    }
}

impl fmt::Display for GeographySource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GeographySource::File(path) => write!(f, "{}", path.display()),
            GeographySource::Url(url) => write!(f, "{}", url),
        }
    }
}

/// Read the full text of the lookup table.
///
/// Any failure here means the table is unavailable as a whole.
pub async fn load_table(
    source: &GeographySource,
    client: &reqwest::Client,
) -> Result<String, SourceError> {
    info!("Loading geography table from {}", source);

    let text = match source {
        GeographySource::File(path) => {
            tokio::fs::read_to_string(path)
                .await
                .map_err(|err| SourceError::Io {
                    path: path.display().to_string(),
                    err,
                })?
        }
        GeographySource::Url(url) => {
            let response = client
                .get(url)
                .send()
                .await
                .map_err(|e| SourceError::unavailable("geography table", e))?;

            if !response.status().is_success() {
                return Err(SourceError::unavailable(
                    "geography table",
                    format!("HTTP error! status: {}", response.status()),
                ));
            }

            response
                .text()
                .await
                .map_err(|e| SourceError::unavailable("geography table", e))?
        }
    };

    debug!("Geography table is {} bytes", text.len());
    Ok(text)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tokio_test::{assert_err, assert_ok};

    #[test]
    fn test_parse_source() {
        assert_eq!(
            GeographySource::parse("https://example.org/DataZone2022.csv"),
            GeographySource::Url("https://example.org/DataZone2022.csv".to_string())
        );
        assert_eq!(
            GeographySource::parse("data/DataZone2022.csv"),
            GeographySource::File(PathBuf::from("data/DataZone2022.csv"))
        );
    }

    #[tokio::test]
    async fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "header\nrow").unwrap();

        let source = GeographySource::File(file.path().to_path_buf());
        let text = assert_ok!(load_table(&source, &reqwest::Client::new()).await);
        assert_eq!(text, "header\nrow");
    }

    #[tokio::test]
    async fn test_missing_file_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let source = GeographySource::File(dir.path().join("missing.csv"));
        let err = assert_err!(load_table(&source, &reqwest::Client::new()).await);
        assert!(matches!(err, SourceError::Io { .. }));
    }
}
