//! Contracten voor het ophalen en cachen van externe inhoud.
//!
//! De kern gebruikt deze traits zelf niet; ze beschrijven de grens met de
//! laag die `Include`-verwijzingen oplost en modellen of texturen laadt.

use std::collections::HashMap;
use std::hash::{DefaultHasher, Hash, Hasher};
use std::path::PathBuf;

use thiserror::Error;
use url::Url;

use crate::scene::element::Element;

#[derive(Debug, Error)]
pub enum ResourceError {
    #[error("element `{0}` heeft geen bron-URI")]
    NoSource(String),
    #[error("URI `{uri}` kon niet opgelost worden: {source}")]
    Resolve {
        uri: String,
        #[source]
        source: url::ParseError,
    },
    #[error("schema `{0}` wordt niet ondersteund")]
    UnsupportedScheme(String),
    #[error("I/O-fout bij `{path}`: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Levert de ruwe bytes achter de bron-URI van een element.
pub trait ResourceSource {
    fn acquire(&self, element: &Element) -> Result<Vec<u8>, ResourceError>;
}

/// Sleutel in een [`ByteCache`]: inhoudshash plus extensie.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    pub content_hash: u64,
    pub extension: String,
}

impl CacheKey {
    #[must_use]
    pub fn new(content_hash: u64, extension: impl Into<String>) -> Self {
        Self {
            content_hash,
            extension: extension.into(),
        }
    }

    /// Sleutel voor `bytes`, met de hash van de inhoud.
    #[must_use]
    pub fn for_bytes(bytes: &[u8], extension: impl Into<String>) -> Self {
        let mut hasher = DefaultHasher::new();
        bytes.hash(&mut hasher);
        Self::new(hasher.finish(), extension)
    }
}

pub trait ByteCache {
    fn store(&mut self, key: CacheKey, bytes: Vec<u8>);

    fn retrieve(&self, key: &CacheKey) -> Option<&[u8]>;
}

/// Cache in het geheugen, zonder verloopbeleid.
#[derive(Debug, Clone, Default)]
pub struct MemoryCache {
    entries: HashMap<CacheKey, Vec<u8>>,
}

impl MemoryCache {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl ByteCache for MemoryCache {
    fn store(&mut self, key: CacheKey, bytes: Vec<u8>) {
        self.entries.insert(key, bytes);
    }

    fn retrieve(&self, key: &CacheKey) -> Option<&[u8]> {
        self.entries.get(key).map(Vec::as_slice)
    }
}

/// Haalt `file:`-bronnen van schijf, relatief opgelost tegen `base`.
#[derive(Debug, Clone)]
pub struct FileSource {
    base: Url,
}

impl FileSource {
    #[must_use]
    pub fn new(base: Url) -> Self {
        Self { base }
    }

    /// Bron met een map als basis.
    pub fn from_dir(dir: impl Into<PathBuf>) -> Result<Self, ResourceError> {
        let dir = dir.into();
        Url::from_directory_path(&dir)
            .map(Self::new)
            .map_err(|()| ResourceError::UnsupportedScheme(dir.display().to_string()))
    }

    /// Volledige URL van de bron van `element`.
    pub fn resolve(&self, element: &Element) -> Result<Url, ResourceError> {
        let uri = element
            .source_uri()
            .ok_or_else(|| ResourceError::NoSource(element.name().to_owned()))?;
        uri.resolve(&self.base).map_err(|source| ResourceError::Resolve {
            uri: uri.to_string(),
            source,
        })
    }
}

impl ResourceSource for FileSource {
    fn acquire(&self, element: &Element) -> Result<Vec<u8>, ResourceError> {
        let url = self.resolve(element)?;
        if url.scheme() != "file" {
            return Err(ResourceError::UnsupportedScheme(url.scheme().to_owned()));
        }
        let path = url
            .to_file_path()
            .map_err(|()| ResourceError::UnsupportedScheme(url.to_string()))?;
        log::debug!("bron {} laden", path.display());
        std::fs::read(&path).map_err(|source| ResourceError::Io { path, source })
    }
}
