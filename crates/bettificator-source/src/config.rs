//! Source site configuration

/// Placeholder substituted with the day (`YYYY-MM-DD`) in [`SourceConfig::matches_path`]
pub const DATE_PLACEHOLDER: &str = "{date}";

/// Placeholder substituted with the lowercase catalog key in [`SourceConfig::clubs_path`]
pub const KEY_PLACEHOLDER: &str = "{key}";

/// Where result and catalog pages live
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceConfig {
    pub base_url: String,
    /// Path of a day's results page, containing `{date}`
    pub matches_path: String,
    /// Path of a catalog letter page, containing `{key}`
    pub clubs_path: String,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            base_url: "https://www.footballdatabase.eu".to_string(),
            matches_path: "/en/results/-/{date}".to_string(),
            clubs_path: "/en/clubs/{key}".to_string(),
        }
    }
}

impl SourceConfig {
    pub fn matches_url(&self, date: &str) -> String {
        self.url(&self.matches_path.replace(DATE_PLACEHOLDER, date))
    }

    pub fn clubs_url(&self, key: &str) -> String {
        self.url(&self.clubs_path.replace(KEY_PLACEHOLDER, &key.to_lowercase()))
    }

    /// Resolve an `href` found on a page to an absolute URL
    pub fn url(&self, href: &str) -> String {
        if href.starts_with("http://") || href.starts_with("https://") {
            return href.to_string();
        }
        let base = self.base_url.trim_end_matches('/');
        if href.starts_with('/') {
            format!("{base}{href}")
        } else {
            format!("{base}/{href}")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_urls() {
        let config = SourceConfig::default();
        assert_eq!(
            config.matches_url("2020-01-01"),
            "https://www.footballdatabase.eu/en/results/-/2020-01-01"
        );
        assert_eq!(config.clubs_url("A"), "https://www.footballdatabase.eu/en/clubs/a");
    }

    #[test]
    fn url_joins_relative_and_keeps_absolute() {
        let config = SourceConfig {
            base_url: "http://localhost:8080/".into(),
            ..Default::default()
        };
        assert_eq!(config.url("/club/1"), "http://localhost:8080/club/1");
        assert_eq!(config.url("club/1"), "http://localhost:8080/club/1");
        assert_eq!(config.url("https://cdn.example/x"), "https://cdn.example/x");
    }
}
