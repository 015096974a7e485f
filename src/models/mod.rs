//! Records read from the upstream feeds and the derived catalog entries
//!
//! The feed records mirror the iptv-org API shape. Fields the service does not
//! use are ignored and `null` lists are read as empty.

use serde::{Deserialize, Deserializer, Serialize};

/// Prefix of every catalog entry id, also advertised in the manifest
pub const CATALOG_ID_PREFIX: &str = "iptv-";

/// The only content type this service publishes
pub const CONTENT_TYPE_TV: &str = "tv";

pub const LIVE_STREAM_TITLE: &str = "Live Stream";

const POSTER_SHAPE_SQUARE: &str = "square";

/// A broadcaster entry from the channel feed
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Channel {
    pub id: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub name: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub categories: Vec<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub languages: Vec<String>,
    #[serde(default)]
    pub country: Option<String>,
    #[serde(default)]
    pub logo: Option<String>,
}

/// A candidate playable URL from the stream feed
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreamEntry {
    /// Channel id this stream belongs to; some feed entries carry none
    #[serde(default)]
    pub channel: Option<String>,
    pub url: String,
    #[serde(default)]
    pub user_agent: Option<String>,
    #[serde(default)]
    pub http_referrer: Option<String>,
}

/// Playable stream record handed to clients
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StreamInfo {
    pub url: String,
    pub title: String,
    pub http_referrer: Option<String>,
}

/// A filtered, verified channel ready to be offered to a client
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogEntry {
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub content_type: String,
    /// Channel categories followed by its country code
    pub genres: Vec<String>,
    pub poster: Option<String>,
    pub poster_shape: String,
    pub background: Option<String>,
    pub logo: Option<String>,
    pub stream_info: StreamInfo,
}

impl Channel {
    pub fn catalog_id(&self) -> String {
        format!("{CATALOG_ID_PREFIX}{}", self.id)
    }

    pub fn country_code(&self) -> Option<&str> {
        self.country.as_deref().filter(|c| !c.is_empty())
    }
}

impl CatalogEntry {
    /// Build the entry for a channel and the stream resolved for it
    pub fn from_channel(channel: &Channel, stream: &StreamEntry) -> Self {
        let mut genres: Vec<String> = channel
            .categories
            .iter()
            .filter(|c| !c.is_empty())
            .cloned()
            .collect();
        if let Some(country) = channel.country_code() {
            genres.push(country.to_string());
        }

        let logo = channel.logo.clone().filter(|l| !l.is_empty());

        Self {
            id: channel.catalog_id(),
            name: channel.name.clone(),
            content_type: CONTENT_TYPE_TV.to_string(),
            genres,
            poster: logo.clone(),
            poster_shape: POSTER_SHAPE_SQUARE.to_string(),
            background: logo.clone(),
            logo,
            stream_info: StreamInfo {
                url: stream.url.clone(),
                title: LIVE_STREAM_TITLE.to_string(),
                http_referrer: stream.http_referrer.clone(),
            },
        }
    }

    pub fn has_genre(&self, genre: &str) -> bool {
        self.genres.iter().any(|g| g == genre)
    }
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}
