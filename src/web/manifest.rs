//! Addon manifest advertised at `/manifest.json`

use serde::Serialize;

use crate::models::{CATALOG_ID_PREFIX, CONTENT_TYPE_TV};

pub const ADDON_ID: &str = "org.iptv";
pub const ADDON_NAME: &str = "IPTV Addon";

/// Catalog ids are this prefix followed by the country code
pub const CATALOG_PREFIX: &str = "iptv-channels-";

const ADDON_LOGO: &str = "https://dl.strem.io/addon-logo.png";
const ADDON_BACKGROUND: &str = "https://dl.strem.io/addon-background.jpg";

/// Genre values offered as catalog filter options
pub const GENRE_OPTIONS: &[&str] = &[
    "animation",
    "business",
    "classic",
    "comedy",
    "cooking",
    "culture",
    "documentary",
    "education",
    "entertainment",
    "family",
    "kids",
    "legislative",
    "lifestyle",
    "movies",
    "music",
    "general",
    "religious",
    "news",
    "outdoor",
    "relax",
    "series",
    "science",
    "shop",
    "sports",
    "travel",
    "weather",
    "xxx",
    "auto",
];

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Manifest {
    pub id: String,
    pub name: String,
    pub version: String,
    pub description: String,
    pub resources: Vec<String>,
    pub types: Vec<String>,
    pub catalogs: Vec<ManifestCatalog>,
    pub id_prefixes: Vec<String>,
    pub behavior_hints: BehaviorHints,
    pub logo: String,
    pub icon: String,
    pub background: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct ManifestCatalog {
    #[serde(rename = "type")]
    pub content_type: String,
    pub id: String,
    pub name: String,
    pub extra: Vec<CatalogExtra>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogExtra {
    pub name: String,
    pub is_required: bool,
    pub options: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BehaviorHints {
    pub configurable: bool,
    pub configuration_required: bool,
}

impl Manifest {
    /// Build the manifest with one catalog per included country
    pub fn for_countries(countries: &[String]) -> Self {
        let catalogs = countries
            .iter()
            .map(|country| ManifestCatalog {
                content_type: CONTENT_TYPE_TV.to_string(),
                id: format!("{CATALOG_PREFIX}{country}"),
                name: format!("IPTV - {country}"),
                extra: vec![CatalogExtra {
                    name: "genre".to_string(),
                    is_required: false,
                    options: GENRE_OPTIONS.iter().map(|g| g.to_string()).collect(),
                }],
            })
            .collect();

        Self {
            id: ADDON_ID.to_string(),
            name: ADDON_NAME.to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            description: format!("Watch live TV from {}", countries.join(", ")),
            resources: ["catalog", "meta", "stream"]
                .iter()
                .map(|r| r.to_string())
                .collect(),
            types: vec![CONTENT_TYPE_TV.to_string()],
            catalogs,
            id_prefixes: vec![CATALOG_ID_PREFIX.to_string()],
            behavior_hints: BehaviorHints {
                configurable: false,
                configuration_required: false,
            },
            logo: ADDON_LOGO.to_string(),
            icon: ADDON_LOGO.to_string(),
            background: ADDON_BACKGROUND.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_manifest_lists_catalog_per_country() {
        let manifest = Manifest::for_countries(&["GR".to_string(), "CY".to_string()]);
        let value = serde_json::to_value(&manifest).unwrap();

        assert_eq!(value["id"], "org.iptv");
        assert_eq!(value["description"], "Watch live TV from GR, CY");
        assert_eq!(value["idPrefixes"][0], "iptv-");
        assert_eq!(value["catalogs"][1]["id"], "iptv-channels-CY");
        assert_eq!(value["catalogs"][1]["name"], "IPTV - CY");
        assert_eq!(value["catalogs"][0]["type"], "tv");
        assert_eq!(value["catalogs"][0]["extra"][0]["isRequired"], false);
        assert_eq!(value["catalogs"][0]["extra"][0]["options"].as_array().unwrap().len(), 28);
        assert_eq!(value["behaviorHints"]["configurationRequired"], false);
    }
}
