use crate::config::types::{
    CheckpointConfig, ColumnLayout, Config, SelectorConfig, SurfaceConfig, TraversalConfig,
};
use crate::ConfigError;
use scraper::Selector;
use url::Url;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_traversal_config(&config.traversal)?;
    validate_checkpoint_config(&config.checkpoint)?;
    validate_surface_config(&config.surface)?;
    Ok(())
}

/// Validates traversal configuration
fn validate_traversal_config(config: &TraversalConfig) -> Result<(), ConfigError> {
    if config.start_page < 1 {
        return Err(ConfigError::Validation(
            "start_page must be >= 1".to_string(),
        ));
    }

    if let Some(end_page) = config.end_page {
        if end_page < config.start_page {
            return Err(ConfigError::Validation(format!(
                "end_page ({}) must not be before start_page ({})",
                end_page, config.start_page
            )));
        }
    }

    if config.max_nav_retries < 1 || config.max_nav_retries > 100 {
        return Err(ConfigError::Validation(format!(
            "max_nav_retries must be between 1 and 100, got {}",
            config.max_nav_retries
        )));
    }

    if config.max_detail_retries < 1 || config.max_detail_retries > 100 {
        return Err(ConfigError::Validation(format!(
            "max_detail_retries must be between 1 and 100, got {}",
            config.max_detail_retries
        )));
    }

    Ok(())
}

/// Validates checkpoint configuration
fn validate_checkpoint_config(config: &CheckpointConfig) -> Result<(), ConfigError> {
    if config.directory.is_empty() {
        return Err(ConfigError::Validation(
            "checkpoint directory cannot be empty".to_string(),
        ));
    }

    if config.file_prefix.is_empty() {
        return Err(ConfigError::Validation(
            "file_prefix cannot be empty".to_string(),
        ));
    }

    if !config
        .file_prefix
        .chars()
        .all(|c| c.is_alphanumeric() || c == '-' || c == '_')
    {
        return Err(ConfigError::Validation(format!(
            "file_prefix must contain only alphanumeric characters, hyphens and underscores, got '{}'",
            config.file_prefix
        )));
    }

    if config.interval_size < 1 {
        return Err(ConfigError::Validation(format!(
            "interval_size must be >= 1, got {}",
            config.interval_size
        )));
    }

    Ok(())
}

/// Validates surface configuration
fn validate_surface_config(config: &SurfaceConfig) -> Result<(), ConfigError> {
    let url = Url::parse(&config.listing_url)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid listing_url: {}", e)))?;

    if url.scheme() != "https" && url.scheme() != "http" {
        return Err(ConfigError::InvalidUrl(format!(
            "listing_url '{}' must use http or https",
            config.listing_url
        )));
    }

    if config.timeout_secs < 1 {
        return Err(ConfigError::Validation(
            "timeout_secs must be >= 1".to_string(),
        ));
    }

    if config.user_agent.trim().is_empty() {
        return Err(ConfigError::Validation(
            "user_agent cannot be empty".to_string(),
        ));
    }

    if config.summary_max_chars < 1 {
        return Err(ConfigError::Validation(
            "summary_max_chars must be >= 1".to_string(),
        ));
    }

    validate_selectors(&config.selectors)?;
    validate_columns(&config.columns)?;

    Ok(())
}

/// Validates that every selector parses
fn validate_selectors(selectors: &SelectorConfig) -> Result<(), ConfigError> {
    for (name, selector) in [
        ("paging-panel", &selectors.paging_panel),
        ("page-link", &selectors.page_link),
        ("current-page", &selectors.current_page),
        ("rows", &selectors.rows),
        ("cells", &selectors.cells),
        ("description", &selectors.description),
        ("media-links", &selectors.media_links),
    ] {
        Selector::parse(selector).map_err(|e| {
            ConfigError::InvalidSelector(format!("{} = '{}': {:?}", name, selector, e))
        })?;
    }

    if selectors.block_advance_labels.is_empty() {
        return Err(ConfigError::Validation(
            "block_advance_labels must contain at least one label".to_string(),
        ));
    }

    Ok(())
}

/// Validates that every column lies within the required cell count
fn validate_columns(columns: &ColumnLayout) -> Result<(), ConfigError> {
    if columns.required_cells < 1 {
        return Err(ConfigError::Validation(
            "required_cells must be >= 1".to_string(),
        ));
    }

    for (field, index) in columns.columns() {
        if index >= columns.required_cells {
            return Err(ConfigError::Validation(format!(
                "column {:?} at index {} is outside required_cells ({})",
                field, index, columns.required_cells
            )));
        }
    }

    Ok(())
}
