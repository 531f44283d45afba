//! Media retrieval from local storage or an HTTP object store.

use crate::error::{Error, Result};
use crate::media::MediaReference;
use futures_util::StreamExt;
use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};
use reqwest::Client;
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use tokio::fs::File;
use tokio::io::AsyncWriteExt;
use tracing::debug;

/// Media made available on the local filesystem.
///
/// Downloaded media lives in a temporary directory owned by this value and is
/// removed when it is dropped.
#[derive(Debug)]
pub struct FetchedMedia {
    path: PathBuf,
    _temp_dir: Option<TempDir>,
}

impl FetchedMedia {
    /// Media that already exists on disk and is not cleaned up.
    pub fn existing(path: PathBuf) -> Self {
        Self {
            path,
            _temp_dir: None,
        }
    }

    /// Media downloaded into `temp_dir`.
    pub fn temporary(path: PathBuf, temp_dir: TempDir) -> Self {
        Self {
            path,
            _temp_dir: Some(temp_dir),
        }
    }

    /// Local path of the media.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// Makes a referenced media object readable from a local path.
pub trait MediaFetcher: Send + Sync {
    /// Fetch the referenced media.
    fn fetch(&self, reference: &MediaReference) -> Result<FetchedMedia>;
}

/// Resolves references against the local filesystem.
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalFetcher;

impl MediaFetcher for LocalFetcher {
    fn fetch(&self, reference: &MediaReference) -> Result<FetchedMedia> {
        let path = if reference.source().is_empty() {
            PathBuf::from(reference.key())
        } else {
            Path::new(reference.source()).join(reference.key())
        };

        if !path.is_file() {
            return Err(Error::MediaNotFound { path });
        }

        Ok(FetchedMedia::existing(path))
    }
}

/// Downloads objects over HTTP using a URL template.
///
/// `{bucket}` in the template is replaced by the reference source and `{key}`
/// by its key.
pub struct HttpFetcher {
    client: Client,
    runtime: tokio::runtime::Runtime,
    url_template: String,
}

impl HttpFetcher {
    /// Create a fetcher for the given URL template.
    pub fn new(url_template: impl Into<String>) -> Result<Self> {
        let runtime = tokio::runtime::Runtime::new().map_err(|e| Error::Internal {
            message: format!("failed to create async runtime: {e}"),
        })?;

        Ok(Self {
            client: Client::new(),
            runtime,
            url_template: url_template.into(),
        })
    }

    /// URL an object is downloaded from.
    pub fn url_for(&self, reference: &MediaReference) -> String {
        object_url(&self.url_template, reference.source(), reference.key())
    }
}

impl MediaFetcher for HttpFetcher {
    fn fetch(&self, reference: &MediaReference) -> Result<FetchedMedia> {
        let url = self.url_for(reference);
        let temp_dir = tempfile::Builder::new().prefix("birdtag-").tempdir()?;
        // Keep the original file name so decoders get an extension hint.
        let dest = temp_dir.path().join(reference.file_name());

        debug!("Downloading {url} to {}", dest.display());
        self.runtime
            .block_on(download_file(&self.client, &url, &dest))?;

        Ok(FetchedMedia::temporary(dest, temp_dir))
    }
}

/// Characters left as-is inside one key segment.
const KEY_SEGMENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~');

/// Substitute `{bucket}` and `{key}` into a URL template.
///
/// Each `/`-separated segment of the key is percent-encoded, so names with
/// `#`, `?`, `+` or spaces address the right object.
pub fn object_url(template: &str, bucket: &str, key: &str) -> String {
    let encoded_key = key
        .split('/')
        .map(|segment| utf8_percent_encode(segment, KEY_SEGMENT).to_string())
        .collect::<Vec<_>>()
        .join("/");
    template
        .replace("{bucket}", bucket)
        .replace("{key}", &encoded_key)
}

async fn download_file(client: &Client, url: &str, dest: &Path) -> Result<()> {
    let response = client.get(url).send().await.map_err(|e| Error::Fetch {
        url: url.to_string(),
        source: Box::new(e),
    })?;

    if !response.status().is_success() {
        return Err(Error::Fetch {
            url: url.to_string(),
            source: format!("HTTP {}", response.status()).into(),
        });
    }

    let mut file = File::create(dest).await?;
    let mut stream = response.bytes_stream();

    while let Some(chunk) = stream.next().await {
        let chunk = chunk.map_err(|e| Error::Fetch {
            url: url.to_string(),
            source: Box::new(e),
        })?;
        file.write_all(&chunk).await?;
    }

    file.flush().await?;
    Ok(())
}
