use serde::Deserialize;

/// Main configuration structure for page-sweep
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub traversal: TraversalConfig,
    #[serde(default)]
    pub checkpoint: CheckpointConfig,
    pub surface: SurfaceConfig,
}

/// Traversal behavior configuration
#[derive(Debug, Clone, Deserialize)]
pub struct TraversalConfig {
    /// First page to visit (1-based)
    #[serde(rename = "start-page", default = "default_start_page")]
    pub start_page: u32,

    /// Last page to visit; unbounded when absent
    #[serde(rename = "end-page", default)]
    pub end_page: Option<u32>,

    /// Attempts allowed to reach or re-establish a page
    #[serde(rename = "max-nav-retries", default = "default_max_nav_retries")]
    pub max_nav_retries: u32,

    /// Attempts allowed for a row's detail view (and for re-reading a page's rows)
    #[serde(rename = "max-detail-retries", default = "default_max_detail_retries")]
    pub max_detail_retries: u32,

    /// Fixed delay between attempts (milliseconds)
    #[serde(rename = "retry-delay-ms", default = "default_retry_delay_ms")]
    pub retry_delay_ms: u64,

    /// Politeness delay before moving to the next page (milliseconds)
    #[serde(rename = "page-delay-ms", default)]
    pub page_delay_ms: u64,
}

impl Default for TraversalConfig {
    fn default() -> Self {
        Self {
            start_page: default_start_page(),
            end_page: None,
            max_nav_retries: default_max_nav_retries(),
            max_detail_retries: default_max_detail_retries(),
            retry_delay_ms: default_retry_delay_ms(),
            page_delay_ms: 0,
        }
    }
}

/// Checkpoint output configuration
#[derive(Debug, Clone, Deserialize)]
pub struct CheckpointConfig {
    /// Directory holding checkpoints and the consolidated dataset
    #[serde(default = "default_directory")]
    pub directory: String,

    /// Prefix for every file written to the directory
    #[serde(rename = "file-prefix", default = "default_file_prefix")]
    pub file_prefix: String,

    /// Number of admitted records between interval checkpoints
    #[serde(rename = "interval-size", default = "default_interval_size")]
    pub interval_size: usize,
}

impl Default for CheckpointConfig {
    fn default() -> Self {
        Self {
            directory: default_directory(),
            file_prefix: default_file_prefix(),
            interval_size: default_interval_size(),
        }
    }
}

/// Navigation surface configuration
#[derive(Debug, Clone, Deserialize)]
pub struct SurfaceConfig {
    /// URL of the first listing page
    #[serde(rename = "listing-url")]
    pub listing_url: String,

    /// HTTP request timeout (seconds)
    #[serde(rename = "timeout-secs", default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// User agent sent with every request
    #[serde(rename = "user-agent", default = "default_user_agent")]
    pub user_agent: String,

    /// Character budget of a description summary
    #[serde(rename = "summary-max-chars", default = "default_summary_max_chars")]
    pub summary_max_chars: usize,

    #[serde(default)]
    pub selectors: SelectorConfig,

    #[serde(default)]
    pub columns: ColumnLayout,
}

/// CSS selectors used to read the listing, pager and detail views
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct SelectorConfig {
    pub paging_panel: String,
    pub page_link: String,
    pub current_page: String,
    /// Link texts that reveal the next block of page links
    pub block_advance_labels: Vec<String>,
    pub rows: String,
    pub cells: String,
    /// Case-insensitive text/title fragment marking a row's detail link
    pub detail_link_hint: String,
    pub description: String,
    pub media_links: String,
}

impl Default for SelectorConfig {
    fn default() -> Self {
        Self {
            paging_panel: "#ctl00_ContentPlaceHolderBody_PanelDataListPaging".to_string(),
            page_link: "a.PagingLink".to_string(),
            current_page: ".PagingLinkCurrent".to_string(),
            block_advance_labels: ["»", ">>", "Next", ">|"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            rows: "table.gridView > tbody > tr".to_string(),
            cells: "td".to_string(),
            detail_link_hint: "edit".to_string(),
            description: "[name='ctl00$ContentPlaceHolderBody$txtdesc']".to_string(),
            media_links: "div#ctl00_ContentPlaceHolderBody_ReorderList1 ul > li a[target='_blank']"
                .to_string(),
        }
    }
}

/// Named fields of a listing row
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    Identity,
    Name,
    Category,
    Pictures,
    Price,
    Featured,
    Status,
    Updated,
}

/// Column positions of each named field within a row
///
/// A row with fewer than `required_cells` cells is structurally incomplete.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct ColumnLayout {
    pub required_cells: usize,
    pub identity: usize,
    pub name: usize,
    pub category: usize,
    pub pictures: usize,
    pub price: usize,
    pub featured: usize,
    pub status: usize,
    pub updated: usize,
}

impl ColumnLayout {
    /// Returns the cell index holding `field`
    pub fn index_of(&self, field: Field) -> usize {
        match field {
            Field::Identity => self.identity,
            Field::Name => self.name,
            Field::Category => self.category,
            Field::Pictures => self.pictures,
            Field::Price => self.price,
            Field::Featured => self.featured,
            Field::Status => self.status,
            Field::Updated => self.updated,
        }
    }

    /// All fields paired with their configured index
    pub fn columns(&self) -> [(Field, usize); 8] {
        [
            (Field::Identity, self.identity),
            (Field::Name, self.name),
            (Field::Category, self.category),
            (Field::Pictures, self.pictures),
            (Field::Price, self.price),
            (Field::Featured, self.featured),
            (Field::Status, self.status),
            (Field::Updated, self.updated),
        ]
    }
}

impl Default for ColumnLayout {
    fn default() -> Self {
        Self {
            required_cells: 10,
            identity: 2,
            name: 3,
            category: 4,
            pictures: 5,
            price: 6,
            featured: 7,
            status: 8,
            updated: 9,
        }
    }
}

fn default_start_page() -> u32 {
    1
}

fn default_max_nav_retries() -> u32 {
    5
}

fn default_max_detail_retries() -> u32 {
    3
}

fn default_retry_delay_ms() -> u64 {
    2000
}

fn default_directory() -> String {
    "output".to_string()
}

fn default_file_prefix() -> String {
    "items".to_string()
}

fn default_interval_size() -> usize {
    100
}

fn default_timeout_secs() -> u64 {
    20
}

fn default_user_agent() -> String {
    format!("page-sweep/{}", env!("CARGO_PKG_VERSION"))
}

fn default_summary_max_chars() -> usize {
    200
}
