//! Integration tests for dataset builders.

use docsift::datasets::{BuildOptions, Dataset, DatasetRegistry, IiitAr13k, PubTables1MDet};
use docsift::{CategoryName, Error, Image, Result};
use image::RgbImage;
use std::fs;
use std::path::Path;
use std::sync::Arc;

fn voc(filename: &str, objects: &[(&str, [u32; 4])]) -> String {
    let mut xml = format!(
        "<annotation><filename>{filename}</filename>\
         <size><width>400</width><height>300</height><depth>3</depth></size>"
    );
    for (name, [xmin, ymin, xmax, ymax]) in objects {
        xml.push_str(&format!(
            "<object><name>{name}</name><bndbox><xmin>{xmin}</xmin><ymin>{ymin}</ymin>\
             <xmax>{xmax}</xmax><ymax>{ymax}</ymax></bndbox></object>"
        ));
    }
    xml.push_str("</annotation>");
    xml
}

/// Lays out a small IIIT-AR-13K validation split below `root`.
fn iiitar_fixture(root: &Path) {
    let xml_dir = root.join("iiitar13k/validation_xml");
    let image_dir = root.join("iiitar13k/validation_images");
    fs::create_dir_all(&xml_dir).unwrap();
    fs::create_dir_all(&image_dir).unwrap();

    fs::write(
        xml_dir.join("page_a.xml"),
        voc(
            "page_a.png",
            &[("table", [20, 30, 380, 150]), ("natural_image", [20, 160, 200, 280])],
        ),
    )
    .unwrap();
    fs::write(
        xml_dir.join("page_b.xml"),
        voc("page_b.png", &[("stamp", [10, 10, 40, 40])]),
    )
    .unwrap();
    fs::write(
        xml_dir.join("page_c.xml"),
        voc("page_c.png", &[("Signature", [300, 250, 390, 290]), ("logo", [5, 5, 60, 40])]),
    )
    .unwrap();

    for name in ["page_a.png", "page_b.png", "page_c.png"] {
        RgbImage::new(400, 300).save(image_dir.join(name)).unwrap();
    }
}

fn collect(dataset: &dyn Dataset, options: &BuildOptions) -> Vec<Image> {
    dataset
        .dataflow(options)
        .unwrap()
        .collect::<Result<_>>()
        .unwrap()
}

#[test]
fn test_iiitar13k_dataflow() {
    let root = tempfile::tempdir().unwrap();
    iiitar_fixture(root.path());

    let dataset = IiitAr13k::new(root.path());
    let images = collect(&dataset, &BuildOptions::new());

    // page_b only has an unknown label and is filtered out
    let names: Vec<&str> = images.iter().map(|i| i.file_name.as_str()).collect();
    assert_eq!(names, vec!["page_a.png", "page_c.png"]);

    let page_a = &images[0];
    assert_eq!((page_a.width, page_a.height), (400, 300));
    assert!(!page_a.has_image());
    let categories: Vec<&CategoryName> =
        page_a.annotations.iter().map(|a| &a.category_name).collect();
    assert_eq!(categories, vec![&CategoryName::Table, &CategoryName::Figure]);
    assert_eq!(page_a.annotations[1].category_id, Some(3));
    for ann in &page_a.annotations {
        let score = ann.score.unwrap();
        assert!((0.0..1.0).contains(&score));
    }

    let page_c = &images[1];
    assert_eq!(page_c.annotations[0].category_name, CategoryName::Signature);
    assert_eq!(page_c.annotations[1].category_name, CategoryName::Logo);
}

#[test]
fn test_dataflow_is_deterministic() {
    let root = tempfile::tempdir().unwrap();
    iiitar_fixture(root.path());

    let dataset = IiitAr13k::new(root.path());
    let first = collect(&dataset, &BuildOptions::new());
    let second = collect(&dataset, &BuildOptions::new());
    assert_eq!(first, second);
}

#[test]
fn test_max_datapoints_and_load_image() {
    let root = tempfile::tempdir().unwrap();
    iiitar_fixture(root.path());

    let dataset = IiitAr13k::new(root.path());
    let options = BuildOptions::new()
        .with_max_datapoints(1)
        .with_load_image(true);
    let images = collect(&dataset, &options);
    assert_eq!(images.len(), 1);
    assert!(images[0].has_image());
    assert!(images[0].decode().is_ok());

    // page_b is among the first two files but has no known objects
    let images = collect(&dataset, &BuildOptions::new().with_max_datapoints(2));
    let names: Vec<&str> = images.iter().map(|i| i.file_name.as_str()).collect();
    assert_eq!(names, vec!["page_a.png"]);
}

#[test]
fn test_categories_filter() {
    let root = tempfile::tempdir().unwrap();
    iiitar_fixture(root.path());

    let dataset = IiitAr13k::new(root.path()).with_categories_filter(&[CategoryName::Signature]);
    let images = collect(&dataset, &BuildOptions::new());
    assert_eq!(images.len(), 1);
    assert_eq!(images[0].file_name, "page_c.png");
    assert_eq!(images[0].annotations.len(), 1);
    assert_eq!(images[0].annotations[0].category_id, Some(1));
}

#[test]
fn test_unknown_split() {
    let root = tempfile::tempdir().unwrap();
    let dataset = IiitAr13k::new(root.path());
    let result = dataset.dataflow(&BuildOptions::new().with_split("dev"));
    assert!(matches!(result, Err(Error::UnknownSplit(s)) if s == "dev"));
}

#[test]
fn test_missing_split_directory() {
    let root = tempfile::tempdir().unwrap();
    let dataset = IiitAr13k::new(root.path());
    let result = dataset.dataflow(&BuildOptions::new().with_split("train"));
    assert!(matches!(result, Err(Error::NotADirectory(_))));
}

#[test]
fn test_malformed_file_is_reported() {
    let root = tempfile::tempdir().unwrap();
    iiitar_fixture(root.path());
    fs::write(
        root.path().join("iiitar13k/validation_xml/page_d.xml"),
        "<annotation><filename>page_d.png</filename><size><width>wide</width></size></annotation>",
    )
    .unwrap();

    let dataset = IiitAr13k::new(root.path());
    let results: Vec<Result<Image>> = dataset.dataflow(&BuildOptions::new()).unwrap().collect();
    assert_eq!(results.len(), 3);
    match &results[2] {
        Err(Error::Xml(msg)) => assert!(msg.contains("page_d.xml")),
        other => panic!("expected an XML error, got {other:?}"),
    }
}

#[test]
fn test_pubtables1m_det() {
    let root = tempfile::tempdir().unwrap();
    let workdir = root.path().join("PubTables1M/PubTables1M-Detection-PASCAL-VOC");
    fs::create_dir_all(workdir.join("val")).unwrap();
    fs::create_dir_all(workdir.join("images")).unwrap();
    fs::write(
        workdir.join("val/PMC1_table_0.xml"),
        voc(
            "PMC1_table_0.jpg",
            &[("table", [10, 10, 200, 100]), ("table rotated", [10, 120, 100, 290])],
        ),
    )
    .unwrap();
    fs::write(
        workdir.join("val/PMC2_table_0.xml"),
        voc("PMC2_table_0.jpg", &[]),
    )
    .unwrap();

    let dataset = PubTables1MDet::new(root.path());
    let images = collect(&dataset, &BuildOptions::new());
    // no empty-image filtering for this dataset
    assert_eq!(images.len(), 2);
    assert!(images[0].location.starts_with(workdir.join("images")));
    assert_eq!(images[0].annotations[1].category_name.as_str(), "TABLE_ROTATED");
    assert_eq!(images[0].annotations[1].category_id, Some(2));
    assert!(images[0].annotations[0].score.is_none());
    assert!(images[1].annotations.is_empty());
}

#[test]
fn test_registry() {
    let root = tempfile::tempdir().unwrap();
    iiitar_fixture(root.path());

    let mut registry = DatasetRegistry::new();
    assert!(registry.names().is_empty());
    registry.register(Arc::new(IiitAr13k::new(root.path())));

    let dataset = registry.get("iiitar13k").unwrap();
    assert_eq!(dataset.info().splits.len(), 3);
    assert_eq!(collect(dataset.as_ref(), &BuildOptions::new()).len(), 2);
    assert!(matches!(
        registry.get("pubtables1m_det"),
        Err(Error::DatasetNotFound(_))
    ));
}
