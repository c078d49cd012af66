//! Integration tests for the analyzer.

use docsift::backend::{
    DetectionResult, LayoutEncoding, ObjectDetector, TextRecognizer, TokenClassCategories,
    TokenClassResult, TokenClassifier, WordResult,
};
use docsift::{
    Analyzer, AnalyzerConfig, BoundingBox, CategoryName, Error, Page, Result,
};
use image::{DynamicImage, RgbImage};
use std::fs;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

/// Detects a title above a text block on every page.
#[derive(Default)]
struct MockLayoutDetector {
    calls: AtomicUsize,
}

impl ObjectDetector for MockLayoutDetector {
    fn name(&self) -> &str {
        "mock_layout"
    }

    fn categories(&self) -> Vec<CategoryName> {
        vec![CategoryName::Title, CategoryName::Text]
    }

    fn predict(&self, _image: &DynamicImage) -> Result<Vec<DetectionResult>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(vec![
            DetectionResult::new(
                BoundingBox::new(10.0, 50.0, 190.0, 90.0).unwrap(),
                CategoryName::Text,
                0.9,
            ),
            DetectionResult::new(
                BoundingBox::new(10.0, 5.0, 190.0, 30.0).unwrap(),
                CategoryName::Title,
                0.95,
            ),
        ])
    }
}

/// Returns two words per block.
struct MockRecognizer;

impl TextRecognizer for MockRecognizer {
    fn name(&self) -> &str {
        "mock_ocr"
    }

    fn predict(&self, _image: &DynamicImage) -> Result<Vec<WordResult>> {
        let word = |text: &str, ulx: f32, uly: f32| WordResult {
            bounding_box: BoundingBox::new(ulx, uly, ulx + 50.0, uly + 15.0).unwrap(),
            text: text.to_string(),
            score: 0.99,
        };
        Ok(vec![
            word("grew", 80.0, 60.0),
            word("Revenue", 20.0, 60.0),
            word("Quarterly", 20.0, 10.0),
            word("Report", 80.0, 10.0),
        ])
    }
}

fn write_page(dir: &Path, name: &str) {
    RgbImage::new(200, 100).save(dir.join(name)).unwrap();
}

fn analyzer(config: AnalyzerConfig) -> (Analyzer, Arc<MockLayoutDetector>) {
    let detector = Arc::new(MockLayoutDetector::default());
    let analyzer = Analyzer::builder()
        .with_layout_detector(detector.clone())
        .with_text_recognizer(Arc::new(MockRecognizer))
        .with_config(config)
        .build();
    (analyzer, detector)
}

#[test]
fn test_component_order() {
    let (analyzer, _) = analyzer(AnalyzerConfig::default());
    assert_eq!(
        analyzer.component_names(),
        vec![
            "image_layout_mock_layout",
            "table_segment",
            "text_extract_mock_ocr",
            "matching",
            "text_order"
        ]
    );
}

#[test]
fn test_analyze_pages() {
    let dir = tempfile::tempdir().unwrap();
    write_page(dir.path(), "page_01.png");
    write_page(dir.path(), "page_02.png");

    let (analyzer, _) = analyzer(AnalyzerConfig::default());
    let pages: Vec<Page> = analyzer
        .analyze(dir.path())
        .unwrap()
        .collect::<Result<_>>()
        .unwrap();

    assert_eq!(pages.len(), 2);
    assert_eq!(pages[0].page_number, 1);
    assert_eq!(pages[1].page_number, 2);
    assert_eq!(pages[0].file_name, "page_01.png");
    assert_eq!((pages[0].width, pages[0].height), (200, 100));

    let page = &pages[0];
    assert_eq!(page.layouts.len(), 2);
    assert_eq!(page.layouts[0].layout_type, CategoryName::Title);
    assert_eq!(page.layouts[0].reading_order, Some(1));
    assert_eq!(page.text(), "Quarterly Report\nRevenue grew");
    assert_eq!(page.words().len(), 4);
    assert!(!page.image().has_image());
}

#[test]
fn test_stream_is_lazy() {
    let dir = tempfile::tempdir().unwrap();
    for i in 1..=3 {
        write_page(dir.path(), &format!("page_{i}.png"));
    }

    let (analyzer, detector) = analyzer(AnalyzerConfig::default());
    let mut stream = analyzer.analyze(dir.path()).unwrap();
    assert_eq!(detector.calls.load(Ordering::SeqCst), 0);

    stream.next().unwrap().unwrap();
    assert_eq!(detector.calls.load(Ordering::SeqCst), 1);
}

#[test]
fn test_strict_stops_at_first_error() {
    let dir = tempfile::tempdir().unwrap();
    write_page(dir.path(), "a.png");
    fs::write(dir.path().join("b.png"), b"corrupted").unwrap();
    write_page(dir.path(), "c.png");

    let (analyzer, _) = analyzer(AnalyzerConfig::default());
    let results: Vec<Result<Page>> = analyzer.analyze(dir.path()).unwrap().collect();
    assert_eq!(results.len(), 2);
    assert!(results[0].is_ok());
    assert!(results[1].is_err());
}

#[test]
fn test_lenient_skips_failing_pages() {
    let dir = tempfile::tempdir().unwrap();
    write_page(dir.path(), "a.png");
    fs::write(dir.path().join("b.png"), b"corrupted").unwrap();
    write_page(dir.path(), "c.png");

    let (analyzer, _) = analyzer(AnalyzerConfig::new().lenient());
    let pages: Vec<Page> = analyzer
        .analyze(dir.path())
        .unwrap()
        .collect::<Result<_>>()
        .unwrap();
    let numbers: Vec<u32> = pages.iter().map(|p| p.page_number).collect();
    assert_eq!(numbers, vec![1, 3]);

    let all = analyzer.analyze_all(dir.path()).unwrap();
    assert_eq!(all.len(), 2);
}

#[test]
fn test_workers_keep_order() {
    let dir = tempfile::tempdir().unwrap();
    for i in 1..=6 {
        write_page(dir.path(), &format!("page_{i}.png"));
    }

    let (analyzer, _) = analyzer(AnalyzerConfig::new().with_workers(3));
    let names: Vec<String> = analyzer
        .analyze(dir.path())
        .unwrap()
        .map(|p| p.unwrap().file_name)
        .collect();
    let expected: Vec<String> = (1..=6).map(|i| format!("page_{i}.png")).collect();
    assert_eq!(names, expected);
}

#[test]
fn test_analyze_all_matches_stream() {
    let dir = tempfile::tempdir().unwrap();
    for i in 1..=4 {
        write_page(dir.path(), &format!("page_{i}.png"));
    }

    let (analyzer, _) = analyzer(AnalyzerConfig::default());
    let parallel = analyzer.analyze_all(dir.path()).unwrap();
    let streamed: Vec<Page> = analyzer
        .analyze(dir.path())
        .unwrap()
        .collect::<Result<_>>()
        .unwrap();
    assert_eq!(parallel, streamed);
}

#[test]
fn test_max_pages() {
    let dir = tempfile::tempdir().unwrap();
    for i in 1..=5 {
        write_page(dir.path(), &format!("page_{i}.png"));
    }

    let (analyzer, _) = analyzer(AnalyzerConfig::new().with_max_pages(2));
    assert_eq!(analyzer.analyze(dir.path()).unwrap().count(), 2);
}

#[test]
fn test_single_file_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    write_page(dir.path(), "page.png");

    let (analyzer, _) = analyzer(AnalyzerConfig::default());
    assert!(matches!(
        analyzer.analyze(dir.path().join("page.png")),
        Err(Error::NotADirectory(_))
    ));
}

#[test]
fn test_save_and_load_with_image() {
    let dir = tempfile::tempdir().unwrap();
    let pages_dir = dir.path().join("pages");
    fs::create_dir(&pages_dir).unwrap();
    write_page(&pages_dir, "page_1.png");

    let (analyzer, _) = analyzer(AnalyzerConfig::new().with_keep_image(true));
    let page = analyzer.analyze(&pages_dir).unwrap().next().unwrap().unwrap();
    assert!(page.image().has_image());

    let out = dir.path().join("page_1.json");
    page.save(&out, true).unwrap();
    let json = fs::read_to_string(&out).unwrap();
    assert!(json.contains("\"_image\""));

    let loaded = Page::from_file(&out).unwrap();
    assert_eq!(loaded, page);
    assert_eq!(loaded.image().image_bytes(), page.image().image_bytes());
    assert_eq!(loaded.text(), "Quarterly Report\nRevenue grew");
}

#[test]
fn test_save_without_image() {
    let dir = tempfile::tempdir().unwrap();
    let pages_dir = dir.path().join("pages");
    fs::create_dir(&pages_dir).unwrap();
    write_page(&pages_dir, "page_1.png");

    let (analyzer, _) = analyzer(AnalyzerConfig::new().with_keep_image(true));
    let page = analyzer.analyze(&pages_dir).unwrap().next().unwrap().unwrap();

    let out = dir.path().join("page_1.json");
    page.save(&out, false).unwrap();
    let loaded = Page::from_file(&out).unwrap();
    assert!(!loaded.image().has_image());
    assert_eq!(loaded, page);
}

/// A title, a table and a text block, top to bottom.
struct TablePageDetector;

impl ObjectDetector for TablePageDetector {
    fn name(&self) -> &str {
        "mock_layout"
    }

    fn categories(&self) -> Vec<CategoryName> {
        vec![CategoryName::Title, CategoryName::Table, CategoryName::Text]
    }

    fn predict(&self, _image: &DynamicImage) -> Result<Vec<DetectionResult>> {
        let det = |category: CategoryName, b: [f32; 4]| {
            DetectionResult::new(BoundingBox::new(b[0], b[1], b[2], b[3]).unwrap(), category, 0.9)
        };
        Ok(vec![
            det(CategoryName::Text, [10.0, 150.0, 190.0, 190.0]),
            det(CategoryName::Table, [10.0, 50.0, 190.0, 130.0]),
            det(CategoryName::Title, [10.0, 5.0, 190.0, 30.0]),
        ])
    }
}

/// Two rows and two columns in table crop coordinates.
struct MockItemDetector;

impl ObjectDetector for MockItemDetector {
    fn name(&self) -> &str {
        "mock_items"
    }

    fn categories(&self) -> Vec<CategoryName> {
        vec![CategoryName::Row, CategoryName::Column]
    }

    fn predict(&self, image: &DynamicImage) -> Result<Vec<DetectionResult>> {
        assert_eq!((image.width(), image.height()), (180, 80));
        let det = |category: CategoryName, b: [f32; 4]| {
            DetectionResult::new(BoundingBox::new(b[0], b[1], b[2], b[3]).unwrap(), category, 0.8)
        };
        Ok(vec![
            det(CategoryName::Row, [0.0, 0.0, 180.0, 40.0]),
            det(CategoryName::Row, [0.0, 40.0, 180.0, 80.0]),
            det(CategoryName::Column, [0.0, 0.0, 90.0, 80.0]),
            det(CategoryName::Column, [90.0, 0.0, 180.0, 80.0]),
        ])
    }
}

/// Words for the title, the four table cells and the text block.
struct TablePageRecognizer;

impl TextRecognizer for TablePageRecognizer {
    fn name(&self) -> &str {
        "mock_ocr"
    }

    fn predict(&self, _image: &DynamicImage) -> Result<Vec<WordResult>> {
        let word = |text: &str, ulx: f32, uly: f32| WordResult {
            bounding_box: BoundingBox::new(ulx, uly, ulx + 45.0, uly + 15.0).unwrap(),
            text: text.to_string(),
            score: 0.99,
        };
        Ok(vec![
            word("grew", 80.0, 160.0),
            word("3", 110.0, 100.0),
            word("Qty", 110.0, 60.0),
            word("Quarterly", 20.0, 10.0),
            word("Apples", 20.0, 100.0),
            word("Revenue", 20.0, 160.0),
            word("Name", 20.0, 60.0),
            word("Report", 80.0, 10.0),
        ])
    }
}

/// Labels the first token as a header and the rest as outside.
struct MockTokenClassifier {
    categories: TokenClassCategories,
    tokens: Mutex<Vec<String>>,
}

impl MockTokenClassifier {
    fn new() -> Self {
        Self {
            categories: TokenClassCategories::from_semantics_and_bio(
                &["HEADER", "OTHER"],
                &["B", "I", "O"],
            ),
            tokens: Mutex::new(Vec::new()),
        }
    }
}

impl TokenClassifier for MockTokenClassifier {
    fn name(&self) -> &str {
        "mock_labels"
    }

    fn categories(&self) -> &TokenClassCategories {
        &self.categories
    }

    fn predict(&self, encoding: &LayoutEncoding) -> Result<Vec<TokenClassResult>> {
        *self.tokens.lock().unwrap() = encoding.tokens.clone();
        Ok(encoding
            .annotation_ids
            .iter()
            .zip(&encoding.tokens)
            .enumerate()
            .map(|(i, (id, token))| TokenClassResult::new(id.clone(), token.clone(), if i == 0 { 0 } else { 2 }))
            .collect())
    }
}

fn table_analyzer() -> (Analyzer, Arc<MockTokenClassifier>) {
    let classifier = Arc::new(MockTokenClassifier::new());
    let analyzer = Analyzer::builder()
        .with_layout_detector(Arc::new(TablePageDetector))
        .with_item_detector(Arc::new(MockItemDetector))
        .with_text_recognizer(Arc::new(TablePageRecognizer))
        .with_token_classifier(classifier.clone())
        .build();
    (analyzer, classifier)
}

fn analyze_table_page() -> (Page, Vec<String>) {
    let dir = tempfile::tempdir().unwrap();
    RgbImage::new(200, 200).save(dir.path().join("page.png")).unwrap();

    let (analyzer, classifier) = table_analyzer();
    let page = analyzer.analyze(dir.path()).unwrap().next().unwrap().unwrap();
    let tokens = classifier.tokens.lock().unwrap().clone();
    (page, tokens)
}

#[test]
fn test_table_component_order() {
    let (analyzer, _) = table_analyzer();
    assert_eq!(
        analyzer.component_names(),
        vec![
            "image_layout_mock_layout",
            "sub_image_layout_mock_items",
            "table_segment",
            "text_extract_mock_ocr",
            "matching",
            "text_order",
            "token_class_mock_labels"
        ]
    );
}

#[test]
fn test_table_page_end_to_end() {
    let (page, _) = analyze_table_page();

    assert_eq!(page.tables.len(), 1);
    let table = &page.tables[0];
    assert_eq!((table.number_of_rows, table.number_of_columns), (2, 2));
    assert_eq!(table.cells.len(), 4);
    assert_eq!(
        table.grid(),
        vec![
            vec!["Name".to_string(), "Qty".to_string()],
            vec!["Apples".to_string(), "3".to_string()],
        ]
    );
    assert_eq!(table.cell(2, 1).unwrap().text(), "Apples");

    // title, table, text
    assert_eq!(page.layouts.len(), 2);
    assert_eq!(page.layouts[0].reading_order, Some(1));
    assert_eq!(table.reading_order, Some(2));
    assert_eq!(page.layouts[1].reading_order, Some(3));
    assert_eq!(
        page.text(),
        "Quarterly Report\nName\tQty\nApples\t3\nRevenue grew"
    );
}

#[test]
fn test_token_classes_follow_reading_order() {
    let (page, tokens) = analyze_table_page();
    assert_eq!(
        tokens,
        vec!["Quarterly", "Report", "Name", "Qty", "Apples", "3", "Revenue", "grew"]
    );

    let words = page.words();
    assert_eq!(words.len(), 8);
    let quarterly = words.iter().find(|w| w.text == "Quarterly").unwrap();
    assert_eq!(quarterly.token_class.as_deref(), Some("HEADER"));
    assert_eq!(quarterly.tag.as_deref(), Some("B"));
    let apples = words.iter().find(|w| w.text == "Apples").unwrap();
    assert_eq!(apples.token_class.as_deref(), Some("OTHER"));
    assert_eq!(apples.tag.as_deref(), Some("O"));
}
