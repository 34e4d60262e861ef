//! Page parsers: fetch a page for a unit of work and turn it into records

use bettificator_core::{CatalogKey, FetchResult, HttpError, PageParser, ParseFailure, fetch_text};
use chrono::NaiveDate;

use crate::config::SourceConfig;
use crate::html::{parse_club_page, parse_match_page};
use crate::records::{ClubRecord, MatchRecord};

/// Retrieves raw page bodies
pub trait PageFetcher: Sync {
    fn fetch(&self, url: &str) -> Result<String, HttpError>;
}

/// Fetcher backed by the shared HTTP client
#[derive(Debug, Default, Clone, Copy)]
pub struct HttpFetcher;

impl PageFetcher for HttpFetcher {
    fn fetch(&self, url: &str) -> Result<String, HttpError> {
        fetch_text(url)
    }
}

/// Results for one calendar day
pub struct MatchPageParser<F = HttpFetcher> {
    config: SourceConfig,
    fetcher: F,
}

impl MatchPageParser {
    pub fn new(config: SourceConfig) -> Self {
        Self::with_fetcher(config, HttpFetcher)
    }
}

impl<F: PageFetcher> MatchPageParser<F> {
    pub fn with_fetcher(config: SourceConfig, fetcher: F) -> Self {
        Self { config, fetcher }
    }
}

impl<F: PageFetcher> PageParser<NaiveDate> for MatchPageParser<F> {
    type Record = MatchRecord;

    fn parse(&self, day: &NaiveDate) -> Result<FetchResult<MatchRecord>, ParseFailure> {
        let url = self.config.matches_url(&day.to_string());
        let body = match self.fetcher.fetch(&url) {
            Ok(body) => body,
            // The site answers 404 for days it has no fixtures for
            Err(e) if e.is_not_found() => {
                log::debug!("{day}: no results page ({url})");
                return Ok(FetchResult::empty());
            }
            Err(e) => return Err(ParseFailure::new(day, e.to_string())),
        };
        let matches = parse_match_page(*day, &body, &self.config)
            .map_err(|msg| ParseFailure::new(day, format!("{msg} ({url})")))?;
        Ok(FetchResult::new(matches))
    }
}

/// Clubs listed on one catalog page
pub struct ClubPageParser<F = HttpFetcher> {
    config: SourceConfig,
    fetcher: F,
}

impl ClubPageParser {
    pub fn new(config: SourceConfig) -> Self {
        Self::with_fetcher(config, HttpFetcher)
    }
}

impl<F: PageFetcher> ClubPageParser<F> {
    pub fn with_fetcher(config: SourceConfig, fetcher: F) -> Self {
        Self { config, fetcher }
    }
}

impl<F: PageFetcher> PageParser<CatalogKey> for ClubPageParser<F> {
    type Record = ClubRecord;

    fn parse(&self, key: &CatalogKey) -> Result<FetchResult<ClubRecord>, ParseFailure> {
        let url = self.config.clubs_url(&key.to_string());
        let body = self
            .fetcher
            .fetch(&url)
            .map_err(|e| ParseFailure::new(key, e.to_string()))?;
        let clubs = parse_club_page(*key, &body, &self.config)
            .map_err(|msg| ParseFailure::new(key, format!("{msg} ({url})")))?;
        Ok(FetchResult::new(clubs))
    }
}
