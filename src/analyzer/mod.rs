//! Document analyzer.
//!
//! The analyzer is assembled once from model backends and then applied to
//! directories of page images. Pages are produced lazily by a
//! [`PageStream`].

mod options;

pub use options::{AnalyzerConfig, ErrorMode};

use crate::backend::{ObjectDetector, TextRecognizer, TokenClassifier};
use crate::dataflow::{DataFlow, DataFlowExt, MultiThreadMapData, SerializerFiles};
use crate::datapoint::Image;
use crate::detect::IMAGE_EXTENSIONS;
use crate::error::{Error, Result};
use crate::model::Page;
use crate::pipeline::{
    ImageLayoutService, LmTokenClassService, MatchingService, PipelineComponent,
    SubImageLayoutService, TableSegmentationService, TextExtractionService, TextOrderService,
};
use rayon::prelude::*;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Components and options shared between the analyzer and its streams.
struct Pipeline {
    components: Vec<Box<dyn PipelineComponent>>,
    config: AnalyzerConfig,
}

impl Pipeline {
    fn process(&self, mut image: Image) -> Result<Page> {
        if !image.has_image() {
            image.load_image()?;
        }
        for component in &self.components {
            log::debug!("{}: serving {}", component.name(), image.file_name);
            component.serve(&mut image)?;
        }
        if !self.config.keep_image {
            image.clear_image();
        }
        Ok(Page::from_image(image, &self.config.parser))
    }

    fn process_file(&self, page_number: usize, path: &Path) -> Result<Page> {
        let mut image = Image::from_file(path)?;
        image.page_number = page_number as u32;
        self.process(image)
    }
}

/// Document layout analyzer.
///
/// # Example
///
/// ```no_run
/// use docsift::Analyzer;
///
/// let analyzer = Analyzer::builder().build();
/// for page in analyzer.analyze("scans/").unwrap() {
///     let page = page.unwrap();
///     println!("{}: {}", page.page_number, page.text());
/// }
/// ```
pub struct Analyzer {
    pipeline: Arc<Pipeline>,
}

impl Analyzer {
    /// Start building an analyzer.
    pub fn builder() -> AnalyzerBuilder {
        AnalyzerBuilder::default()
    }

    /// The analyzer configuration.
    pub fn config(&self) -> &AnalyzerConfig {
        &self.pipeline.config
    }

    /// Names of the pipeline components, in execution order.
    pub fn component_names(&self) -> Vec<&str> {
        self.pipeline
            .components
            .iter()
            .map(|c| c.name())
            .collect()
    }

    /// Analyze a directory of page images.
    ///
    /// Files are collected recursively and sorted by path. Nothing is
    /// loaded until the returned stream is advanced.
    pub fn analyze<P: AsRef<Path>>(&self, path: P) -> Result<PageStream> {
        let files = self.list_pages(path.as_ref())?;
        let source: DataFlow<(usize, PathBuf)> = Box::new(
            files
                .into_iter()
                .enumerate()
                .map(|(idx, path)| Ok((idx + 1, path))),
        );

        let pipeline = Arc::clone(&self.pipeline);
        let mapper = move |(page_number, path): (usize, PathBuf)| {
            pipeline.process_file(page_number, &path)
        };
        let workers = self.pipeline.config.workers;
        let inner: DataFlow<Page> = if workers > 1 {
            Box::new(MultiThreadMapData::new(source, workers, workers * 2, mapper))
        } else {
            source.map_data(mapper)
        };

        Ok(PageStream {
            inner,
            error_mode: self.pipeline.config.error_mode,
            finished: false,
        })
    }

    /// Analyze a single datapoint, loading its pixels from `location` if needed.
    pub fn analyze_image(&self, image: Image) -> Result<Page> {
        self.pipeline.process(image)
    }

    /// Analyze a directory and collect every page.
    ///
    /// With `parallel` enabled the pages are processed with rayon; the
    /// result keeps the directory order.
    pub fn analyze_all<P: AsRef<Path>>(&self, path: P) -> Result<Vec<Page>> {
        if !self.pipeline.config.parallel {
            return self.analyze(path)?.collect();
        }

        let files = self.list_pages(path.as_ref())?;
        let results: Vec<Result<Page>> = files
            .par_iter()
            .enumerate()
            .map(|(idx, path)| self.pipeline.process_file(idx + 1, path))
            .collect();

        let mut pages = Vec::with_capacity(results.len());
        for (result, path) in results.into_iter().zip(&files) {
            match result {
                Ok(page) => pages.push(page),
                Err(e) if self.pipeline.config.error_mode == ErrorMode::Lenient => {
                    log::warn!("Skipping {}: {}", path.display(), e);
                }
                Err(e) => return Err(e),
            }
        }
        Ok(pages)
    }

    fn list_pages(&self, path: &Path) -> Result<Vec<PathBuf>> {
        let metadata = fs::metadata(path)?;
        if !metadata.is_dir() {
            return Err(Error::NotADirectory(path.to_path_buf()));
        }
        let files = SerializerFiles::load(path, IMAGE_EXTENSIONS, self.pipeline.config.max_pages)?
            .collect::<Result<Vec<_>>>()?;
        log::info!("analyzing {} page images in {}", files.len(), path.display());
        Ok(files)
    }
}

/// Lazy stream of analyzed pages.
///
/// In strict mode the stream ends after yielding the first error; in
/// lenient mode failing pages are logged and skipped.
pub struct PageStream {
    inner: DataFlow<Page>,
    error_mode: ErrorMode,
    finished: bool,
}

impl Iterator for PageStream {
    type Item = Result<Page>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }
        loop {
            match self.inner.next()? {
                Ok(page) => return Some(Ok(page)),
                Err(e) if self.error_mode == ErrorMode::Lenient => {
                    log::warn!("Skipping page: {}", e);
                }
                Err(e) => {
                    self.finished = true;
                    return Some(Err(e));
                }
            }
        }
    }
}

/// Builder for [`Analyzer`].
#[derive(Default)]
pub struct AnalyzerBuilder {
    layout_detector: Option<Arc<dyn ObjectDetector>>,
    cell_detector: Option<Arc<dyn ObjectDetector>>,
    item_detector: Option<Arc<dyn ObjectDetector>>,
    text_recognizer: Option<Arc<dyn TextRecognizer>>,
    token_classifier: Option<Arc<dyn TokenClassifier>>,
    extra: Vec<Box<dyn PipelineComponent>>,
    config: AnalyzerConfig,
}

impl AnalyzerBuilder {
    /// Detector for page layout segments and tables.
    pub fn with_layout_detector(mut self, detector: Arc<dyn ObjectDetector>) -> Self {
        self.layout_detector = Some(detector);
        self
    }

    /// Detector for cells, run inside each table.
    pub fn with_cell_detector(mut self, detector: Arc<dyn ObjectDetector>) -> Self {
        self.cell_detector = Some(detector);
        self
    }

    /// Detector for rows and columns, run inside each table.
    pub fn with_item_detector(mut self, detector: Arc<dyn ObjectDetector>) -> Self {
        self.item_detector = Some(detector);
        self
    }

    /// OCR engine or text extractor.
    pub fn with_text_recognizer(mut self, recognizer: Arc<dyn TextRecognizer>) -> Self {
        self.text_recognizer = Some(recognizer);
        self
    }

    /// Token classifier run last.
    pub fn with_token_classifier(mut self, classifier: Arc<dyn TokenClassifier>) -> Self {
        self.token_classifier = Some(classifier);
        self
    }

    /// Append a custom component after the built-in ones.
    pub fn with_component(mut self, component: Box<dyn PipelineComponent>) -> Self {
        self.extra.push(component);
        self
    }

    /// Set the configuration.
    pub fn with_config(mut self, config: AnalyzerConfig) -> Self {
        self.config = config;
        self
    }

    /// Assemble the pipeline.
    pub fn build(self) -> Analyzer {
        let config = self.config;
        let table = vec![config.segmentation.table.clone()];
        let mut components: Vec<Box<dyn PipelineComponent>> = Vec::new();

        if let Some(detector) = self.layout_detector {
            components.push(Box::new(ImageLayoutService::new(detector)));
        }
        if let Some(detector) = self.cell_detector {
            components.push(Box::new(SubImageLayoutService::new(detector, table.clone())));
        }
        if let Some(detector) = self.item_detector {
            components.push(Box::new(SubImageLayoutService::new(detector, table)));
        }
        components.push(Box::new(TableSegmentationService::new(
            config.segmentation.clone(),
        )));
        if let Some(recognizer) = self.text_recognizer {
            components.push(Box::new(TextExtractionService::new(recognizer)));
        }
        components.push(Box::new(MatchingService::new(config.matching.clone())));
        components.push(Box::new(TextOrderService::new(config.order.clone())));
        if let Some(classifier) = self.token_classifier {
            components.push(Box::new(
                LmTokenClassService::new(classifier).with_parsing(config.parser.clone()),
            ));
        }
        components.extend(self.extra);

        log::debug!("analyzer built with {} components", components.len());
        Analyzer {
            pipeline: Arc::new(Pipeline { components, config }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_components() {
        let analyzer = Analyzer::builder().build();
        assert_eq!(
            analyzer.component_names(),
            vec!["table_segment", "matching", "text_order"]
        );
    }

    #[test]
    fn test_single_file_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("page.png");
        fs::write(&file, b"not really").unwrap();
        let analyzer = Analyzer::builder().build();
        assert!(matches!(analyzer.analyze(&file), Err(Error::NotADirectory(_))));
    }

    #[test]
    fn test_missing_path() {
        let analyzer = Analyzer::builder().build();
        match analyzer.analyze("/nonexistent/docsift/pages") {
            Err(Error::Io(e)) => assert_eq!(e.kind(), std::io::ErrorKind::NotFound),
            _ => panic!("expected a not-found error"),
        }
    }
}
