//! HTML → records
//!
//! Results page layout: one `table.matches` with `tr.competition` header
//! rows, each followed by the `tr.match` rows of that competition. A day
//! without fixtures carries a `.no-matches` notice instead of the table.
//!
//! Catalog page layout: one `ul.clubs` whose `li` items hold a link to the
//! club and an optional `span.country`.

use std::sync::LazyLock;

use bettificator_core::CatalogKey;
use chrono::NaiveDate;
use scraper::{ElementRef, Html, Selector};

use crate::config::SourceConfig;
use crate::records::{ClubRecord, MatchRecord, MatchStatus};

fn selector(css: &str) -> Selector {
    Selector::parse(css).expect("invalid selector")
}

static MATCH_TABLE: LazyLock<Selector> = LazyLock::new(|| selector("table.matches"));
static MATCH_ROWS: LazyLock<Selector> = LazyLock::new(|| selector("table.matches tr"));
static NO_MATCHES: LazyLock<Selector> = LazyLock::new(|| selector(".no-matches"));
static TIME: LazyLock<Selector> = LazyLock::new(|| selector("td.time"));
static HOME: LazyLock<Selector> = LazyLock::new(|| selector("td.home"));
static AWAY: LazyLock<Selector> = LazyLock::new(|| selector("td.away"));
static SCORE: LazyLock<Selector> = LazyLock::new(|| selector("td.score"));
static LINK: LazyLock<Selector> = LazyLock::new(|| selector("a[href]"));
static CLUB_LIST: LazyLock<Selector> = LazyLock::new(|| selector("ul.clubs"));
static CLUB_ITEMS: LazyLock<Selector> = LazyLock::new(|| selector("ul.clubs > li"));
static COUNTRY: LazyLock<Selector> = LazyLock::new(|| selector("span.country"));

/// Collapse all whitespace runs to single spaces
fn clean(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn text_of(el: ElementRef<'_>) -> String {
    clean(&el.text().collect::<String>())
}

fn non_empty(s: String) -> Option<String> {
    (!s.is_empty()).then_some(s)
}

fn has_class(el: ElementRef<'_>, class: &str) -> bool {
    el.value().classes().any(|c| c == class)
}

fn cell_text(row: ElementRef<'_>, sel: &Selector) -> Option<String> {
    row.select(sel).next().map(text_of).and_then(non_empty)
}

fn leading_number(s: &str) -> Option<u8> {
    let digits: String = s.trim().chars().take_while(char::is_ascii_digit).collect();
    digits.parse().ok()
}

/// Interpret a score cell: `2 - 1`, `3-2 aet`, `-`, `vs`, `P-P`, `20:45`
pub fn parse_score(raw: &str) -> (Option<u8>, Option<u8>, MatchStatus) {
    let s = clean(raw).to_ascii_lowercase();
    if s.contains("p-p") || s.starts_with("postp") || s == "pst" {
        return (None, None, MatchStatus::Postponed);
    }
    let mut sides = s.splitn(2, '-');
    let home = sides.next().and_then(leading_number);
    let away = sides.next().and_then(leading_number);
    match (home, away) {
        (Some(h), Some(a)) => (Some(h), Some(a), MatchStatus::Played),
        _ => (None, None, MatchStatus::Scheduled),
    }
}

/// Parse a day's results page
pub fn parse_match_page(
    date: NaiveDate,
    html: &str,
    config: &SourceConfig,
) -> Result<Vec<MatchRecord>, String> {
    let doc = Html::parse_document(html);
    if doc.select(&NO_MATCHES).next().is_some() {
        return Ok(Vec::new());
    }
    if doc.select(&MATCH_TABLE).next().is_none() {
        return Err("no results table on page".to_string());
    }

    let mut competition: Option<String> = None;
    let mut matches = Vec::new();
    for row in doc.select(&MATCH_ROWS) {
        if has_class(row, "competition") {
            competition = non_empty(text_of(row));
            continue;
        }
        if !has_class(row, "match") {
            continue;
        }

        let (Some(home), Some(away)) = (cell_text(row, &HOME), cell_text(row, &AWAY)) else {
            log::debug!("{date}: skipping row without both clubs");
            continue;
        };
        let score_cell = row.select(&SCORE).next();
        let (home_goals, away_goals, status) = score_cell
            .map(|cell| parse_score(&text_of(cell)))
            .unwrap_or((None, None, MatchStatus::Scheduled));
        let url = score_cell
            .and_then(|cell| cell.select(&LINK).next())
            .and_then(|a| a.value().attr("href"))
            .map(|href| config.url(href));

        matches.push(MatchRecord {
            date,
            time: cell_text(row, &TIME),
            competition: competition.clone(),
            home,
            away,
            home_goals,
            away_goals,
            status,
            url,
        });
    }
    Ok(matches)
}

/// Parse one catalog letter page
pub fn parse_club_page(
    key: CatalogKey,
    html: &str,
    config: &SourceConfig,
) -> Result<Vec<ClubRecord>, String> {
    let doc = Html::parse_document(html);
    if doc.select(&CLUB_LIST).next().is_none() {
        return Err("no club list on page".to_string());
    }

    let clubs = doc
        .select(&CLUB_ITEMS)
        .filter_map(|item| {
            let link = item.select(&LINK).next();
            let name = non_empty(link.map(text_of)?)?;
            Some(ClubRecord {
                name,
                country: item.select(&COUNTRY).next().map(text_of).and_then(non_empty),
                url: link
                    .and_then(|a| a.value().attr("href"))
                    .map(|href| config.url(href)),
                catalog_key: key.to_string(),
            })
        })
        .collect::<Vec<_>>();

    let foreign = misfiled(key, &clubs);
    if foreign > 0 {
        log::debug!("catalog {key}: {foreign} clubs listed under another initial");
    }
    Ok(clubs)
}

/// Clubs whose display name files under a different key than the page they are on
fn misfiled(key: CatalogKey, clubs: &[ClubRecord]) -> usize {
    clubs
        .iter()
        .filter(|club| CatalogKey::for_name(&club.name) != key)
        .count()
}
