//! Track model
//!
//! A track is one playable item: metadata plus a music source that is either
//! a direct URL or a resolver yielding one asynchronously.

use crate::events::TrackSummary;
use crate::uuid_utils;
use futures::future::BoxFuture;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::future::Future;
use std::sync::Arc;

/// Track identity within a playlist
///
/// Empty ids are legal on input; playlists replace them on ingestion.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TrackId(String);

impl TrackId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Fresh UUIDv4-backed id
    pub fn generate() -> Self {
        Self(uuid_utils::generate_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.trim().is_empty()
    }
}

impl fmt::Display for TrackId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for TrackId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for TrackId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// Future returned by a [`SourceResolver`]; the error is a human-readable reason.
pub type ResolveFuture = BoxFuture<'static, std::result::Result<String, String>>;

/// Asynchronously yields a playable URL for a deferred track
pub trait SourceResolver: Send + Sync {
    fn resolve(&self) -> ResolveFuture;
}

impl<F, Fut> SourceResolver for F
where
    F: Fn() -> Fut + Send + Sync,
    Fut: Future<Output = std::result::Result<String, String>> + Send + 'static,
{
    fn resolve(&self) -> ResolveFuture {
        Box::pin(self())
    }
}

/// Where a track's audio comes from
#[derive(Clone)]
pub enum MusicSource {
    /// URL known up front
    Direct(String),
    /// URL produced lazily when the track is selected
    Deferred(Arc<dyn SourceResolver>),
}

impl MusicSource {
    pub fn direct(url: impl Into<String>) -> Self {
        MusicSource::Direct(url.into())
    }

    pub fn deferred<R: SourceResolver + 'static>(resolver: R) -> Self {
        MusicSource::Deferred(Arc::new(resolver))
    }

    /// The URL, if this source does not need resolving
    pub fn as_direct(&self) -> Option<&str> {
        match self {
            MusicSource::Direct(url) => Some(url.as_str()),
            MusicSource::Deferred(_) => None,
        }
    }

    pub fn is_deferred(&self) -> bool {
        matches!(self, MusicSource::Deferred(_))
    }
}

impl Default for MusicSource {
    fn default() -> Self {
        MusicSource::Direct(String::new())
    }
}

impl fmt::Debug for MusicSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MusicSource::Direct(url) => f.debug_tuple("Direct").field(url).finish(),
            MusicSource::Deferred(_) => f.write_str("Deferred(..)"),
        }
    }
}

// Deferred sources have no serializable form; they appear as an empty URL.
impl Serialize for MusicSource {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_direct().unwrap_or(""))
    }
}

impl<'de> Deserialize<'de> for MusicSource {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        String::deserialize(deserializer).map(MusicSource::Direct)
    }
}

/// One playable item
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Track {
    pub id: TrackId,
    pub name: String,
    pub singer: String,
    pub cover: String,
    #[serde(alias = "musicSrc")]
    pub music_src: MusicSource,
    /// Raw timed lyric text (LRC); empty when the track has none
    pub lyric: String,
    /// Declared duration in seconds, preferred over the transport's report
    pub duration: Option<f64>,
}

impl Track {
    pub fn new(name: impl Into<String>, music_src: MusicSource) -> Self {
        Self {
            name: name.into(),
            music_src,
            ..Default::default()
        }
    }

    pub fn with_id(mut self, id: impl Into<TrackId>) -> Self {
        self.id = id.into();
        self
    }

    pub fn with_singer(mut self, singer: impl Into<String>) -> Self {
        self.singer = singer.into();
        self
    }

    pub fn with_cover(mut self, cover: impl Into<String>) -> Self {
        self.cover = cover.into();
        self
    }

    pub fn with_lyric(mut self, lyric: impl Into<String>) -> Self {
        self.lyric = lyric.into();
        self
    }

    pub fn with_duration(mut self, seconds: f64) -> Self {
        self.duration = Some(seconds.max(0.0));
        self
    }

    pub fn summary(&self) -> TrackSummary {
        TrackSummary {
            id: self.id.clone(),
            name: self.name.clone(),
            singer: self.singer.clone(),
            cover: self.cover.clone(),
            music_src: self.music_src.as_direct().unwrap_or_default().to_string(),
            duration: self.duration,
        }
    }
}
