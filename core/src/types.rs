//! Credentials, request parameters and per-method query types.
//!
//! # Design
//! Method-specific arguments are plain structs of `Option` fields. They are
//! flattened into `Params`, which applies the sparse policy: absent values,
//! empty strings and numeric zero never reach the wire.

use std::fmt;

use serde::Deserialize;

/// Login details for the media service, as produced by a config loader.
#[derive(Clone, PartialEq, Eq, Deserialize)]
pub struct Credentials {
    pub url: String,
    pub username: String,
    /// Hex-encoded password when `is_encoded` is true, the raw one otherwise.
    pub password: String,
    #[serde(default = "encoded_by_default")]
    pub is_encoded: bool,
}

fn encoded_by_default() -> bool {
    true
}

impl Credentials {
    pub fn new(url: &str, username: &str, password: &str, is_encoded: bool) -> Self {
        Self {
            url: url.to_string(),
            username: username.to_string(),
            password: password.to_string(),
            is_encoded,
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("url", &self.url)
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .field("is_encoded", &self.is_encoded)
            .finish()
    }
}

/// Anything able to hand over a set of credentials.
pub trait CredentialSource {
    fn credentials(&self) -> Credentials;
}

impl CredentialSource for Credentials {
    fn credentials(&self) -> Credentials {
        self.clone()
    }
}

/// A value that may be sent as a request parameter.
///
/// Returns `None` for values that must be left out of the request.
pub trait ParamValue {
    fn to_param(&self) -> Option<String>;
}

impl ParamValue for str {
    fn to_param(&self) -> Option<String> {
        (!self.is_empty()).then(|| self.to_string())
    }
}

impl ParamValue for String {
    fn to_param(&self) -> Option<String> {
        self.as_str().to_param()
    }
}

macro_rules! numeric_param {
    ($($ty:ty),*) => {
        $(impl ParamValue for $ty {
            fn to_param(&self) -> Option<String> {
                (*self != 0).then(|| self.to_string())
            }
        })*
    };
}

numeric_param!(u32, u64, i32, i64, usize);

impl<T: ParamValue + ?Sized> ParamValue for &T {
    fn to_param(&self) -> Option<String> {
        (**self).to_param()
    }
}

impl<T: ParamValue> ParamValue for Option<T> {
    fn to_param(&self) -> Option<String> {
        self.as_ref().and_then(ParamValue::to_param)
    }
}

/// Method-specific parameters in insertion order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Params {
    pairs: Vec<(String, String)>,
}

impl Params {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append `name` unless `value` is blank. A repeated name replaces the
    /// earlier value.
    pub fn push(&mut self, name: &str, value: impl ParamValue) -> &mut Self {
        if let Some(value) = value.to_param() {
            match self.pairs.iter_mut().find(|(n, _)| n.as_str() == name) {
                Some(slot) => slot.1 = value,
                None => self.pairs.push((name.to_string(), value)),
            }
        }
        self
    }

    pub fn with(mut self, name: &str, value: impl ParamValue) -> Self {
        self.push(name, value);
        self
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.pairs
            .iter()
            .find(|(n, _)| n.as_str() == name)
            .map(|(_, v)| v.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.pairs.iter().map(|(n, v)| (n.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }
}

/// Optional filters for `getIndexes`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct IndexesQuery {
    /// Only return artists in this music folder.
    pub music_folder_id: Option<String>,
    /// Only return a result if the collection changed after this time (ms since epoch).
    pub if_modified_since: Option<i64>,
}

impl IndexesQuery {
    pub fn to_params(&self) -> Params {
        Params::new()
            .with("musicFolderId", &self.music_folder_id)
            .with("ifModifiedSince", self.if_modified_since)
    }
}

/// Criteria for the legacy `search` method.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SearchQuery {
    pub artist: Option<String>,
    pub album: Option<String>,
    pub title: Option<String>,
    /// Matched against artist, album and title.
    pub any: Option<String>,
    pub count: Option<u32>,
    pub offset: Option<u32>,
    /// Only return matches newer than this time (ms since epoch).
    pub newer_than: Option<i64>,
}

impl SearchQuery {
    pub fn to_params(&self) -> Params {
        Params::new()
            .with("artist", &self.artist)
            .with("album", &self.album)
            .with("title", &self.title)
            .with("any", &self.any)
            .with("count", self.count)
            .with("offset", self.offset)
            .with("newerThan", self.newer_than)
    }
}

/// Criteria for the paged `search2` method.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Search2Query {
    pub query: String,
    pub artist_count: Option<u32>,
    pub artist_offset: Option<u32>,
    pub album_count: Option<u32>,
    pub album_offset: Option<u32>,
    pub song_count: Option<u32>,
    pub song_offset: Option<u32>,
}

impl Search2Query {
    pub fn new(query: &str) -> Self {
        Self {
            query: query.to_string(),
            ..Self::default()
        }
    }

    pub fn to_params(&self) -> Params {
        Params::new()
            .with("query", &self.query)
            .with("artistCount", self.artist_count)
            .with("artistOffset", self.artist_offset)
            .with("albumCount", self.album_count)
            .with("albumOffset", self.album_offset)
            .with("songCount", self.song_count)
            .with("songOffset", self.song_offset)
    }
}
