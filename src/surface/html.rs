//! HTTP/HTML navigation surface
//!
//! `HtmlSession` drives a server-rendered listing through plain HTTP:
//! - the session state is the document it last loaded (cookies persist in the client)
//! - pager links, the current-page marker and block-advance links are read
//!   from a configurable pager panel
//! - rows and cells are read with configurable selectors
//! - the media gallery is read as a side view and leaves the session where it was
//! - the detail (edit) view replaces the current document
//!
//! Only real `href` links are followed; script postbacks are not.

use crate::config::{ColumnLayout, SelectorConfig, SurfaceConfig};
use crate::record::{RawRow, RowDetail};
use crate::surface::traits::{ActualPage, PageNavigator, RowExtractor, SurfaceError, SurfaceResult};
use async_trait::async_trait;
use reqwest::Client;
use scraper::{ElementRef, Html, Selector};
use std::time::Duration;
use url::Url;

/// A loaded document
#[derive(Debug, Clone)]
struct Document {
    url: Url,
    body: String,
}

/// Pre-parsed selectors
struct Selectors {
    paging_panel: Selector,
    page_link: Selector,
    current_page: Selector,
    rows: Selector,
    cells: Selector,
    description: Selector,
    media_links: Selector,
    anchor: Selector,
    checkbox: Selector,
    select: Selector,
    selected_option: Selector,
    option: Selector,
    nested_table: Selector,
}

impl Selectors {
    fn compile(config: &SelectorConfig) -> SurfaceResult<Self> {
        Ok(Self {
            paging_panel: compile(&config.paging_panel)?,
            page_link: compile(&config.page_link)?,
            current_page: compile(&config.current_page)?,
            rows: compile(&config.rows)?,
            cells: compile(&config.cells)?,
            description: compile(&config.description)?,
            media_links: compile(&config.media_links)?,
            anchor: compile("a[href]")?,
            checkbox: compile("input[type='checkbox']")?,
            select: compile("select")?,
            selected_option: compile("option[selected]")?,
            option: compile("option")?,
            nested_table: compile("table")?,
        })
    }
}

fn compile(selector: &str) -> SurfaceResult<Selector> {
    Selector::parse(selector).map_err(|e| SurfaceError::Selector {
        selector: selector.to_string(),
        message: format!("{:?}", e),
    })
}

/// Navigation surface over a cookie-backed HTTP session
pub struct HtmlSession {
    client: Client,
    listing_url: Url,
    selectors: Selectors,
    advance_labels: Vec<String>,
    detail_hint: String,
    layout: ColumnLayout,
    current: Option<Document>,
    last_listing: Option<Document>,
}

impl HtmlSession {
    /// Builds a session for the configured listing; nothing is fetched yet
    pub fn new(config: &SurfaceConfig) -> SurfaceResult<Self> {
        let listing_url = Url::parse(&config.listing_url).map_err(|source| SurfaceError::Link {
            href: config.listing_url.clone(),
            source,
        })?;

        let client = Client::builder()
            .user_agent(config.user_agent.clone())
            .timeout(Duration::from_secs(config.timeout_secs))
            .connect_timeout(Duration::from_secs(config.timeout_secs.min(10)))
            .cookie_store(true)
            .gzip(true)
            .brotli(true)
            .build()
            .map_err(|source| SurfaceError::Http {
                url: config.listing_url.clone(),
                source,
            })?;

        Ok(Self {
            client,
            listing_url,
            selectors: Selectors::compile(&config.selectors)?,
            advance_labels: config
                .selectors
                .block_advance_labels
                .iter()
                .map(|l| l.trim().to_string())
                .collect(),
            detail_hint: config.selectors.detail_link_hint.to_lowercase(),
            layout: config.columns.clone(),
            current: None,
            last_listing: None,
        })
    }

    async fn fetch(&self, url: Url) -> SurfaceResult<Document> {
        tracing::debug!("GET {}", url);

        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(|source| SurfaceError::Http {
                url: url.to_string(),
                source,
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(SurfaceError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let final_url = response.url().clone();
        let body = response.text().await.map_err(|source| SurfaceError::Http {
            url: url.to_string(),
            source,
        })?;

        Ok(Document {
            url: final_url,
            body,
        })
    }

    /// Makes `doc` the current document, remembering it if it is a listing
    fn load(&mut self, doc: Document) {
        if self.is_listing(&doc) {
            self.last_listing = Some(doc.clone());
        }
        self.current = Some(doc);
    }

    /// Brings the session back to a listing document before a pager action
    async fn restore_listing(&mut self) -> SurfaceResult<()> {
        if self.current.as_ref().is_some_and(|d| self.is_listing(d)) {
            return Ok(());
        }

        let url = self
            .last_listing
            .as_ref()
            .map(|d| d.url.clone())
            .unwrap_or_else(|| self.listing_url.clone());

        tracing::debug!("Restoring listing view from {}", url);
        let doc = self.fetch(url).await?;
        self.load(doc);
        Ok(())
    }

    /// The listing the pager should be read from, without fetching
    fn listing_view(&self) -> Option<&Document> {
        match &self.current {
            Some(doc) if self.is_listing(doc) => Some(doc),
            _ => self.last_listing.as_ref(),
        }
    }

    fn is_listing(&self, doc: &Document) -> bool {
        let html = Html::parse_document(&doc.body);
        let has_pager = html.select(&self.selectors.paging_panel).next().is_some();
        has_pager || html.select(&self.selectors.rows).next().is_some()
    }

    /// Page number marked current in `doc`
    ///
    /// A listing with rows but no pager panel is a single page 1.
    fn page_of(&self, doc: &Document) -> ActualPage {
        let html = Html::parse_document(&doc.body);

        match html.select(&self.selectors.paging_panel).next() {
            Some(panel) => panel
                .select(&self.selectors.current_page)
                .next()
                .and_then(|marker| collapse(marker.text()).parse().ok()),
            None if html.select(&self.selectors.rows).next().is_some() => Some(1),
            None => None,
        }
    }

    /// Numbered page links of the pager block in `doc`
    fn page_links(&self, doc: &Document) -> Vec<(u32, Url)> {
        let html = Html::parse_document(&doc.body);
        let Some(panel) = html.select(&self.selectors.paging_panel).next() else {
            return Vec::new();
        };

        panel
            .select(&self.selectors.page_link)
            .filter_map(|link| {
                let number = collapse(link.text()).parse::<u32>().ok()?;
                let href = link.value().attr("href")?;
                Some((number, followable(&doc.url, href)?))
            })
            .collect()
    }

    /// The pager control revealing the next block of page links
    fn advance_link(&self, doc: &Document) -> Option<Url> {
        let html = Html::parse_document(&doc.body);
        let panel = html.select(&self.selectors.paging_panel).next()?;

        panel.select(&self.selectors.anchor).find_map(|link| {
            let text = collapse(link.text());
            if !self.advance_labels.iter().any(|label| *label == text) {
                return None;
            }
            followable(&doc.url, link.value().attr("href")?)
        })
    }

    fn extract_rows(&self, doc: &Document) -> SurfaceResult<Vec<RawRow>> {
        let html = Html::parse_document(&doc.body);
        let mut rows = Vec::new();

        for row in html.select(&self.selectors.rows) {
            // pager rows embed their own table
            if row.select(&self.selectors.nested_table).next().is_some() {
                continue;
            }

            let cells: Vec<ElementRef> = row.select(&self.selectors.cells).collect();
            if cells.is_empty() {
                continue;
            }

            let texts = cells.iter().map(|cell| self.cell_text(*cell)).collect();
            let mut raw = RawRow::new(rows.len() + 1, texts);

            raw.detail_link = self.detail_link(row, &doc.url)?;
            raw.media_link = match cells.get(self.layout.pictures) {
                Some(cell) => match cell.select(&self.selectors.anchor).next() {
                    Some(a) => resolve_attr(&doc.url, a.value().attr("href"))?,
                    None => None,
                },
                None => None,
            };

            rows.push(raw);
        }

        Ok(rows)
    }

    /// Reads a cell's value: checkboxes become Yes/No, selects their selected option
    fn cell_text(&self, cell: ElementRef) -> String {
        if let Some(checkbox) = cell.select(&self.selectors.checkbox).next() {
            let checked = checkbox.value().attr("checked").is_some();
            return if checked { "Yes" } else { "No" }.to_string();
        }

        if let Some(select) = cell.select(&self.selectors.select).next() {
            return select
                .select(&self.selectors.selected_option)
                .next()
                .or_else(|| select.select(&self.selectors.option).next())
                .map(|option| collapse(option.text()))
                .unwrap_or_default();
        }

        collapse(cell.text())
    }

    fn detail_link(&self, row: ElementRef, base: &Url) -> SurfaceResult<Option<String>> {
        let hinted = row.select(&self.selectors.anchor).find(|a| {
            let text = collapse(a.text()).to_lowercase();
            let title = a.value().attr("title").unwrap_or_default().to_lowercase();
            text.contains(&self.detail_hint) || title.contains(&self.detail_hint)
        });

        match hinted {
            Some(a) => resolve_attr(base, a.value().attr("href")),
            None => Ok(None),
        }
    }

    fn read_media(&self, doc: &Document) -> Vec<String> {
        let html = Html::parse_document(&doc.body);
        html.select(&self.selectors.media_links)
            .filter_map(|a| a.value().attr("href"))
            .filter_map(|href| doc.url.join(href.trim()).ok())
            .map(|url| url.to_string())
            .collect()
    }

    fn read_description(&self, doc: &Document) -> Option<String> {
        let html = Html::parse_document(&doc.body);
        let field = html.select(&self.selectors.description).next()?;

        let markup = match field.value().attr("value") {
            Some(value) => value.to_string(),
            None => field.text().collect::<String>(),
        };

        if markup.trim().is_empty() {
            None
        } else {
            Some(markup)
        }
    }
}

#[async_trait]
impl PageNavigator for HtmlSession {
    async fn go_to(&mut self, page: u32) -> SurfaceResult<ActualPage> {
        self.restore_listing().await?;
        let doc = self.current.as_ref().ok_or(SurfaceError::NoDocument)?;

        if self.page_of(doc) == Some(page) {
            return Ok(Some(page));
        }

        let link = self
            .page_links(doc)
            .into_iter()
            .find(|(number, _)| *number == page)
            .map(|(_, url)| url);

        match link {
            Some(url) => {
                let next = self.fetch(url).await?;
                self.load(next);
            }
            None => tracing::debug!("No link to page {} in the current pager block", page),
        }

        self.current_page().await
    }

    async fn current_page(&mut self) -> SurfaceResult<ActualPage> {
        Ok(self.current.as_ref().and_then(|doc| {
            if self.is_listing(doc) {
                self.page_of(doc)
            } else {
                None
            }
        }))
    }

    async fn visible_pages(&mut self) -> SurfaceResult<Vec<u32>> {
        let Some(doc) = self.listing_view() else {
            return Ok(Vec::new());
        };

        let mut pages: Vec<u32> = self.page_links(doc).into_iter().map(|(n, _)| n).collect();
        if let Some(current) = self.page_of(doc) {
            pages.push(current);
        }
        pages.sort_unstable();
        pages.dedup();
        Ok(pages)
    }

    async fn advance_block(&mut self) -> SurfaceResult<bool> {
        self.restore_listing().await?;
        let doc = self.current.as_ref().ok_or(SurfaceError::NoDocument)?;

        let Some(url) = self.advance_link(doc) else {
            return Ok(false);
        };

        let next = self.fetch(url).await?;
        self.load(next);
        Ok(true)
    }

    async fn has_next(&mut self) -> SurfaceResult<bool> {
        let doc = self.listing_view().ok_or(SurfaceError::NoDocument)?;
        let current = self.page_of(doc).unwrap_or(0);

        let later_link = self.page_links(doc).iter().any(|(n, _)| *n > current);
        Ok(later_link || self.advance_link(doc).is_some())
    }
}

#[async_trait]
impl RowExtractor for HtmlSession {
    async fn rows_of_current_page(&mut self) -> SurfaceResult<Vec<RawRow>> {
        let doc = self.current.as_ref().ok_or(SurfaceError::NoDocument)?;
        if !self.is_listing(doc) {
            return Err(SurfaceError::Other(format!(
                "{} is not a listing page",
                doc.url
            )));
        }
        self.extract_rows(doc)
    }

    async fn open_detail(&mut self, row: &RawRow) -> SurfaceResult<Option<RowDetail>> {
        if !row.has_detail() {
            return Ok(None);
        }

        let mut detail = RowDetail::default();

        if let Some(link) = &row.media_link {
            let url = parse_link(link)?;
            let gallery = self.fetch(url).await?;
            detail.media = self.read_media(&gallery);
        }

        if let Some(link) = &row.detail_link {
            let url = parse_link(link)?;
            let page = self.fetch(url).await?;
            detail.description_markup = self.read_description(&page);
            // the edit view replaces the listing, like clicking into it would
            self.load(page);
        }

        Ok(Some(detail))
    }
}

/// Joins whitespace-separated text fragments into one trimmed line
fn collapse<'a>(text: impl Iterator<Item = &'a str>) -> String {
    text.flat_map(str::split_whitespace)
        .collect::<Vec<_>>()
        .join(" ")
}

/// Resolves `href` against `base`, keeping only http(s) targets
fn followable(base: &Url, href: &str) -> Option<Url> {
    let url = base.join(href.trim()).ok()?;
    matches!(url.scheme(), "http" | "https").then_some(url)
}

fn resolve_attr(base: &Url, href: Option<&str>) -> SurfaceResult<Option<String>> {
    let Some(href) = href else {
        return Ok(None);
    };

    let url = base.join(href.trim()).map_err(|source| SurfaceError::Link {
        href: href.to_string(),
        source,
    })?;

    if matches!(url.scheme(), "http" | "https") {
        Ok(Some(url.to_string()))
    } else {
        tracing::debug!("Skipping non-http link {}", href);
        Ok(None)
    }
}

fn parse_link(link: &str) -> SurfaceResult<Url> {
    Url::parse(link).map_err(|source| SurfaceError::Link {
        href: link.to_string(),
        source,
    })
}
