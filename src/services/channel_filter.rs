//! Locale and category rules applied to the channel feed

use crate::config::FilterConfig;
use crate::models::Channel;

/// Inclusion/exclusion rules built once from [`FilterConfig`]
///
/// Empty include lists admit everything. Exclusions always win. Matching is
/// exact and case sensitive, like the feed codes themselves.
#[derive(Debug, Clone)]
pub struct ChannelFilter {
    config: FilterConfig,
}

impl ChannelFilter {
    pub fn new(config: FilterConfig) -> Self {
        Self { config }
    }

    /// Whether the channel passes every locale and category rule
    pub fn matches(&self, channel: &Channel) -> bool {
        self.country_allowed(channel.country.as_deref())
            && self.languages_allowed(&channel.languages)
            && !self.category_excluded(&channel.categories)
    }

    fn country_allowed(&self, country: Option<&str>) -> bool {
        let listed = |list: &[String]| country.is_some_and(|c| contains(list, c));

        (self.config.include_countries.is_empty() || listed(&self.config.include_countries))
            && !listed(&self.config.exclude_countries)
    }

    fn languages_allowed(&self, languages: &[String]) -> bool {
        let included = self.config.include_languages.is_empty()
            || languages
                .iter()
                .any(|lang| contains(&self.config.include_languages, lang));
        let excluded = languages
            .iter()
            .any(|lang| contains(&self.config.exclude_languages, lang));

        included && !excluded
    }

    fn category_excluded(&self, categories: &[String]) -> bool {
        categories
            .iter()
            .any(|cat| contains(&self.config.exclude_categories, cat))
    }
}

fn contains(list: &[String], value: &str) -> bool {
    list.iter().any(|item| item == value)
}
