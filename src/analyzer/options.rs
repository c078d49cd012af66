//! Analyzer options and configuration.

use crate::pipeline::{MatchingConfig, OrderConfig, PageParsingConfig, SegmentationConfig};

/// Options for analyzing page images.
#[derive(Debug, Clone)]
pub struct AnalyzerConfig {
    /// Error handling mode
    pub error_mode: ErrorMode,

    /// Worker threads for streaming analysis (1 = process on the caller's thread)
    pub workers: usize,

    /// Whether `analyze_all` processes pages in parallel
    pub parallel: bool,

    /// Maximum number of pages to analyze
    pub max_pages: Option<usize>,

    /// Keep the pixel data in the resulting pages
    pub keep_image: bool,

    /// Which categories become layouts, tables, cells and words
    pub parser: PageParsingConfig,

    /// Table segmentation options
    pub segmentation: SegmentationConfig,

    /// Word-to-block matching options
    pub matching: MatchingConfig,

    /// Reading order options
    pub order: OrderConfig,
}

impl AnalyzerConfig {
    /// Create new analyzer options with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set error mode.
    pub fn with_error_mode(mut self, mode: ErrorMode) -> Self {
        self.error_mode = mode;
        self
    }

    /// Enable lenient mode (skip pages that fail).
    pub fn lenient(mut self) -> Self {
        self.error_mode = ErrorMode::Lenient;
        self
    }

    /// Set the number of streaming workers.
    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers.max(1);
        self
    }

    /// Enable or disable parallel batch processing.
    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    /// Disable parallel processing.
    pub fn sequential(mut self) -> Self {
        self.parallel = false;
        self.workers = 1;
        self
    }

    /// Limit the number of pages.
    pub fn with_max_pages(mut self, max: usize) -> Self {
        self.max_pages = Some(max);
        self
    }

    /// Keep or drop pixel data after analysis.
    pub fn with_keep_image(mut self, keep: bool) -> Self {
        self.keep_image = keep;
        self
    }

    /// Set the page parsing config.
    pub fn with_parser(mut self, parser: PageParsingConfig) -> Self {
        self.parser = parser;
        self
    }

    /// Set the table segmentation config.
    pub fn with_segmentation(mut self, segmentation: SegmentationConfig) -> Self {
        self.segmentation = segmentation;
        self
    }

    /// Set the matching config.
    pub fn with_matching(mut self, matching: MatchingConfig) -> Self {
        self.matching = matching;
        self
    }

    /// Set the reading order config.
    pub fn with_order(mut self, order: OrderConfig) -> Self {
        self.order = order;
        self
    }
}

impl Default for AnalyzerConfig {
    fn default() -> Self {
        Self {
            error_mode: ErrorMode::Strict,
            workers: 1,
            parallel: true,
            max_pages: None,
            keep_image: false,
            parser: PageParsingConfig::default(),
            segmentation: SegmentationConfig::default(),
            matching: MatchingConfig::default(),
            order: OrderConfig::default(),
        }
    }
}

/// Error handling mode during analysis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ErrorMode {
    /// Stop at the first failing page
    #[default]
    Strict,
    /// Log failing pages and continue
    Lenient,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_analyzer_config_builder() {
        let config = AnalyzerConfig::new()
            .lenient()
            .with_workers(0)
            .with_max_pages(3)
            .with_keep_image(true)
            .sequential();

        assert_eq!(config.error_mode, ErrorMode::Lenient);
        assert_eq!(config.workers, 1);
        assert_eq!(config.max_pages, Some(3));
        assert!(config.keep_image);
        assert!(!config.parallel);
    }

    #[test]
    fn test_default_config() {
        let config = AnalyzerConfig::default();
        assert_eq!(config.error_mode, ErrorMode::Strict);
        assert_eq!(config.workers, 1);
        assert!(config.parallel);
        assert!(!config.keep_image);
    }
}
