// src/services/listings.rs

//! Listing fetcher and parser.
//!
//! Fetches the search result page and extracts listings using the configured
//! CSS selectors. The page is walked in document order; parsing stops at the
//! heading that opens the "other regions" section.

use async_trait::async_trait;
use chrono::{Local, NaiveDate};
use reqwest::Client;
use scraper::{ElementRef, Html, Selector};
use url::Url;

use crate::error::{AppError, Result};
use crate::models::{Config, Listing, ParserConfig};
use crate::utils::date::parse_posted_at_on;
use crate::utils::{http, normalize_whitespace, resolve_url};

/// Anything that can produce the current listing set.
#[async_trait]
pub trait ListingSource: Send + Sync {
    async fn fetch_listings(&self) -> Result<Vec<Listing>>;
}

/// Compiled extraction rules for one search result page layout.
#[derive(Debug, Clone)]
pub struct ListingParser {
    base_url: Url,
    container: Selector,
    block: Selector,
    item: Selector,
    title: Selector,
    date: Selector,
    price: Selector,
    price_attr: String,
    boundary: Selector,
    boundary_text: Option<String>,
    location_prefix: Option<String>,
}

impl ListingParser {
    /// Compile the parser; relative links are resolved against `base_url`.
    pub fn new(config: &ParserConfig, base_url: Url) -> Result<Self> {
        Ok(Self {
            base_url,
            container: Self::parse_selector(&config.container_selector)?,
            block: Self::parse_selector(&config.block_selector)?,
            item: Self::parse_selector(&config.item_selector)?,
            title: Self::parse_selector(&config.title_selector)?,
            date: Self::parse_selector(&config.date_selector)?,
            price: Self::parse_selector(&config.price_selector)?,
            price_attr: config.price_attr.clone(),
            boundary: Self::parse_selector(&config.boundary_selector)?,
            boundary_text: config
                .boundary_text
                .as_deref()
                .map(normalize_whitespace)
                .filter(|t| !t.is_empty()),
            location_prefix: config
                .location_prefix
                .as_deref()
                .map(str::trim)
                .filter(|p| !p.is_empty())
                .map(str::to_string),
        })
    }

    /// Parse a page, resolving relative dates against the current local date.
    pub fn parse(&self, html: &str) -> Vec<Listing> {
        self.parse_on(html, Local::now().date_naive())
    }

    /// Parse a page, resolving relative dates against `today`.
    pub fn parse_on(&self, html: &str, today: NaiveDate) -> Vec<Listing> {
        let document = Html::parse_document(html);
        let mut listings = Vec::new();

        let mut containers = document.select(&self.container).peekable();
        if containers.peek().is_none() {
            log::warn!("No result container found in page");
        }

        'walk: for container in containers {
            for child in container.children().filter_map(ElementRef::wrap) {
                if self.is_boundary(&child) {
                    log::debug!("Reached secondary results section, stopping");
                    break 'walk;
                }
                if self.block.matches(&child) {
                    listings.extend(
                        child
                            .select(&self.item)
                            .filter_map(|item| self.parse_item(&item, today)),
                    );
                }
            }
        }

        match &self.location_prefix {
            Some(prefix) => listings
                .into_iter()
                .filter(|l| l.location.starts_with(prefix.as_str()))
                .collect(),
            None => listings,
        }
    }

    fn is_boundary(&self, element: &ElementRef) -> bool {
        match &self.boundary_text {
            Some(text) => {
                self.boundary.matches(element)
                    && normalize_whitespace(&element.text().collect::<String>()) == *text
            }
            None => false,
        }
    }

    /// Extract one listing; a missing link skips the record.
    fn parse_item(&self, item: &ElementRef, today: NaiveDate) -> Option<Listing> {
        let Some(title_elem) = item.select(&self.title).next() else {
            log::warn!("Skipping listing block without a title element");
            return None;
        };
        let title = normalize_whitespace(&title_elem.text().collect::<String>());

        let Some(href) = title_elem.value().attr("href") else {
            log::warn!("Unable to get link for '{}'", title);
            return None;
        };
        let link = resolve_url(&self.base_url, href);

        let date_text = item
            .select(&self.date)
            .next()
            .map(|e| normalize_whitespace(&e.text().collect::<String>()))
            .unwrap_or_default();
        let (date_part, location) = split_date_location(&date_text);
        let posted_at = parse_posted_at_on(date_part, today);

        let price = self.extract_price(item, &title);

        Some(Listing::new(title, price, link, posted_at, location))
    }

    fn extract_price(&self, item: &ElementRef, title: &str) -> i64 {
        let Some(raw) = item
            .select(&self.price)
            .find_map(|e| e.value().attr(&self.price_attr))
        else {
            log::warn!("Unable to get price for '{}'", title);
            return 0;
        };

        parse_price(raw).unwrap_or_else(|| {
            log::warn!("Unable to convert price '{}' for '{}'", raw, title);
            0
        })
    }

    fn parse_selector(s: &str) -> Result<Selector> {
        Selector::parse(s).map_err(|e| AppError::selector(s, format!("{e:?}")))
    }
}

/// Split "date, location" on the first comma.
fn split_date_location(text: &str) -> (&str, String) {
    match text.split_once(',') {
        Some((date, location)) => (date.trim(), location.trim().to_string()),
        None => (text.trim(), String::new()),
    }
}

/// Integer part of a price such as `"125000.00"`.
fn parse_price(raw: &str) -> Option<i64> {
    let compact: String = raw.chars().filter(|c| !c.is_whitespace()).collect();
    let whole = compact.split('.').next().unwrap_or_default();
    whole.parse().ok()
}

/// Fetches and parses the configured search page.
pub struct ListingFetcher {
    client: Client,
    url: Url,
    parser: ListingParser,
}

impl ListingFetcher {
    pub fn new(config: &Config) -> Result<Self> {
        let url = config.search.url()?;
        let client = http::create_client(&config.crawler)?;
        let parser = ListingParser::new(&config.parser, url.clone())?;
        Ok(Self::with_client(client, url, parser))
    }

    pub fn with_client(client: Client, url: Url, parser: ListingParser) -> Self {
        Self {
            client,
            url,
            parser,
        }
    }

    /// Fetch the search page once and parse it.
    pub async fn fetch(&self) -> Result<Vec<Listing>> {
        let body = http::fetch_text(&self.client, self.url.as_str()).await?;
        let listings = self.parser.parse(&body);
        log::info!("Parsed {} listings from {}", listings.len(), self.url);
        Ok(listings)
    }
}

#[async_trait]
impl ListingSource for ListingFetcher {
    async fn fetch_listings(&self) -> Result<Vec<Listing>> {
        self.fetch().await
    }
}
