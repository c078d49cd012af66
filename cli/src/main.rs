//! docsift CLI - inspect analyzed pages and stream datasets

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};

use docsift::dataflow::SerializerFiles;
use docsift::datasets::{BuildOptions, DatasetRegistry, DATASET_DIR_ENV};
use docsift::render::{to_json, to_markdown_pages, to_text_pages};
use docsift::{JsonFormat, Page, PageSelection, RenderOptions, TableFallback};

#[derive(Parser)]
#[command(name = "docsift")]
#[command(version)]
#[command(about = "Inspect analyzed document pages and stream layout datasets", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Show page information (size, layouts, tables, words)
    Show {
        /// Saved page JSON file
        #[arg(value_name = "FILE")]
        input: PathBuf,
    },

    /// Render saved pages as plain text
    Text {
        /// Saved page JSON file or directory of them
        #[arg(value_name = "FILE|DIR")]
        input: PathBuf,

        /// Output file (stdout if not specified)
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,

        /// Page numbers (e.g., "1-10", "1,3,5")
        #[arg(long)]
        pages: Option<String>,
    },

    /// Render saved pages as Markdown
    #[command(alias = "md")]
    Markdown {
        /// Saved page JSON file or directory of them
        #[arg(value_name = "FILE|DIR")]
        input: PathBuf,

        /// Output file (stdout if not specified)
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,

        /// Include YAML frontmatter
        #[arg(short, long)]
        frontmatter: bool,

        /// Table rendering mode
        #[arg(long, value_enum, default_value = "markdown")]
        table_mode: TableMode,

        /// Page numbers (e.g., "1-10", "1,3,5")
        #[arg(long)]
        pages: Option<String>,
    },

    /// Render the page view of saved pages as JSON
    Json {
        /// Saved page JSON file or directory of them
        #[arg(value_name = "FILE|DIR")]
        input: PathBuf,

        /// Output file (stdout if not specified)
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,

        /// Output compact JSON
        #[arg(long)]
        compact: bool,

        /// Page numbers (e.g., "1-10", "1,3,5")
        #[arg(long)]
        pages: Option<String>,
    },

    /// Stream a built-in dataset
    Dataset {
        /// Dataset name (see `docsift datasets`)
        #[arg(value_name = "NAME")]
        name: String,

        /// Dataset root directory
        #[arg(long, env = DATASET_DIR_ENV, default_value = "./datasets")]
        root: PathBuf,

        /// Split to read
        #[arg(long, default_value = "val")]
        split: String,

        /// Maximum number of datapoints
        #[arg(long)]
        max: Option<usize>,

        /// Load and embed the page images
        #[arg(long)]
        load_image: bool,

        /// Directory to save each datapoint as JSON
        #[arg(short, long, value_name = "DIR")]
        output: Option<PathBuf>,
    },

    /// List registered datasets
    Datasets {
        /// Dataset root directory
        #[arg(long, env = DATASET_DIR_ENV, default_value = "./datasets")]
        root: PathBuf,
    },

    /// Show version information
    Version,
}

#[derive(Copy, Clone, PartialEq, Eq, ValueEnum)]
enum TableMode {
    /// Markdown tables, HTML for merged cells
    Markdown,
    /// HTML tables
    Html,
}

impl From<TableMode> for TableFallback {
    fn from(mode: TableMode) -> Self {
        match mode {
            TableMode::Markdown => TableFallback::Markdown,
            TableMode::Html => TableFallback::Html,
        }
    }
}

fn main() {
    env_logger::init();

    let cli = Cli::parse();

    let result = match cli.command {
        Some(Commands::Show { input }) => cmd_show(&input),
        Some(Commands::Text {
            input,
            output,
            pages,
        }) => cmd_text(&input, output.as_deref(), pages.as_deref()),
        Some(Commands::Markdown {
            input,
            output,
            frontmatter,
            table_mode,
            pages,
        }) => cmd_markdown(
            &input,
            output.as_deref(),
            frontmatter,
            table_mode,
            pages.as_deref(),
        ),
        Some(Commands::Json {
            input,
            output,
            compact,
            pages,
        }) => cmd_json(&input, output.as_deref(), compact, pages.as_deref()),
        Some(Commands::Dataset {
            name,
            root,
            split,
            max,
            load_image,
            output,
        }) => cmd_dataset(&name, root, split, max, load_image, output.as_deref()),
        Some(Commands::Datasets { root }) => cmd_datasets(root),
        Some(Commands::Version) => {
            cmd_version();
            Ok(())
        }
        None => {
            println!("{}", "Usage: docsift <COMMAND>".yellow());
            println!("       docsift --help for more information");
            Ok(())
        }
    };

    if let Err(e) = result {
        eprintln!("{}: {}", "Error".red().bold(), e);
        std::process::exit(1);
    }
}

fn page_selection(pages: Option<&str>) -> docsift::Result<PageSelection> {
    match pages {
        Some(p) => PageSelection::parse(p),
        None => Ok(PageSelection::All),
    }
}

/// Load one saved page, or every `*.json` page below a directory.
fn load_pages(input: &Path, selection: &PageSelection) -> docsift::Result<Vec<Page>> {
    if !input.is_dir() {
        return Ok(vec![Page::from_file(input)?]);
    }

    let mut pages = Vec::new();
    for path in SerializerFiles::load(input, &["json"], None)? {
        let page = Page::from_file(path?)?;
        if selection.includes(page.page_number) {
            pages.push(page);
        }
    }
    pages.sort_by_key(|p| p.page_number);
    log::debug!("loaded {} pages from {}", pages.len(), input.display());
    Ok(pages)
}

fn write_output(output: Option<&Path>, content: &str) -> Result<(), Box<dyn std::error::Error>> {
    if let Some(path) = output {
        fs::write(path, content)?;
        println!("{} {}", "Saved to".green(), path.display());
    } else {
        println!("{}", content);
    }
    Ok(())
}

fn cmd_show(input: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let page = Page::from_file(input)?;

    println!("{}", "Page Information".cyan().bold());
    println!("{}", "─".repeat(40).dimmed());

    println!("{}: {}", "File".bold(), input.display());
    println!("{}: {}", "Image".bold(), page.file_name);
    println!("{}: {}", "Page".bold(), page.page_number);
    println!("{}: {} x {}", "Size".bold(), page.width, page.height);
    println!(
        "{}: {}",
        "Embedded image".bold(),
        if page.image().has_image() { "Yes" } else { "No" }
    );

    println!();
    println!("{}", "Layout".cyan().bold());
    println!("{}", "─".repeat(40).dimmed());

    let mut by_type: BTreeMap<&str, usize> = BTreeMap::new();
    for layout in &page.layouts {
        *by_type.entry(layout.layout_type.as_str()).or_default() += 1;
    }
    for (layout_type, count) in &by_type {
        println!("{}: {}", layout_type.bold(), count);
    }
    for (i, table) in page.tables.iter().enumerate() {
        println!(
            "{} {}: {} x {} ({} cells{})",
            "Table".bold(),
            i + 1,
            table.number_of_rows,
            table.number_of_columns,
            table.cells.len(),
            if table.has_merged_cells() { ", merged" } else { "" }
        );
    }

    let words = page.words();
    let chars: usize = words.iter().map(|w| w.text.chars().count()).sum();
    println!("{}: {}", "Words".bold(), words.len());
    println!("{}: {}", "Characters".bold(), chars);

    Ok(())
}

fn cmd_text(
    input: &Path,
    output: Option<&Path>,
    pages: Option<&str>,
) -> Result<(), Box<dyn std::error::Error>> {
    let selection = page_selection(pages)?;
    let loaded = load_pages(input, &selection)?;
    let options = RenderOptions::new().with_pages(selection);
    let text = to_text_pages(&loaded, &options)?;
    write_output(output, &text)
}

fn cmd_markdown(
    input: &Path,
    output: Option<&Path>,
    frontmatter: bool,
    table_mode: TableMode,
    pages: Option<&str>,
) -> Result<(), Box<dyn std::error::Error>> {
    let selection = page_selection(pages)?;
    let loaded = load_pages(input, &selection)?;
    let options = RenderOptions::new()
        .with_frontmatter(frontmatter)
        .with_table_fallback(table_mode.into())
        .with_pages(selection);
    let markdown = to_markdown_pages(&loaded, &options)?;
    write_output(output, &markdown)
}

fn cmd_json(
    input: &Path,
    output: Option<&Path>,
    compact: bool,
    pages: Option<&str>,
) -> Result<(), Box<dyn std::error::Error>> {
    let format = if compact {
        JsonFormat::Compact
    } else {
        JsonFormat::Pretty
    };

    let selection = page_selection(pages)?;
    let loaded = load_pages(input, &selection)?;
    let json = if input.is_dir() {
        let rendered = loaded
            .iter()
            .map(|page| to_json(page, JsonFormat::Compact))
            .collect::<docsift::Result<Vec<_>>>()?;
        let values = rendered
            .iter()
            .map(|s| serde_json::from_str::<serde_json::Value>(s))
            .collect::<Result<Vec<_>, _>>()?;
        match format {
            JsonFormat::Pretty => serde_json::to_string_pretty(&values)?,
            JsonFormat::Compact => serde_json::to_string(&values)?,
        }
    } else {
        match loaded.first() {
            Some(page) => to_json(page, format)?,
            None => String::from("null"),
        }
    };
    write_output(output, &json)
}

fn cmd_dataset(
    name: &str,
    root: PathBuf,
    split: String,
    max: Option<usize>,
    load_image: bool,
    output: Option<&Path>,
) -> Result<(), Box<dyn std::error::Error>> {
    let registry = DatasetRegistry::with_defaults(root);
    let dataset = registry.get(name)?;

    let mut options = BuildOptions::new()
        .with_split(split)
        .with_load_image(load_image);
    if let Some(max) = max {
        options = options.with_max_datapoints(max);
    }

    if let Some(dir) = output {
        fs::create_dir_all(dir)?;
    }

    let pb = match max {
        Some(max) => ProgressBar::new(max as u64),
        None => ProgressBar::new_spinner(),
    };
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{bar:40.cyan/blue}] {pos} {msg}")?
            .progress_chars("#>-"),
    );

    let mut count = 0usize;
    let mut annotations = 0usize;
    for image in dataset.dataflow(&options)? {
        let image = image?;
        pb.set_message(image.file_name.clone());
        annotations += image.annotations.len();
        if let Some(dir) = output {
            let stem = Path::new(&image.file_name)
                .file_stem()
                .map(|s| s.to_string_lossy().to_string())
                .unwrap_or_else(|| image.image_id.clone());
            image.save(dir.join(format!("{}.json", stem)), load_image)?;
        }
        count += 1;
        pb.inc(1);
    }
    pb.finish_with_message("Done!");

    println!(
        "\n{} {} datapoints, {} annotations ({} / {})",
        "Streamed".green().bold(),
        count,
        annotations,
        dataset.name(),
        options.split
    );
    if let Some(dir) = output {
        println!("{} {}", "Saved to".green(), dir.display());
    }

    Ok(())
}

fn cmd_datasets(root: PathBuf) -> Result<(), Box<dyn std::error::Error>> {
    let registry = DatasetRegistry::with_defaults(root);

    println!("{}", "Datasets".cyan().bold());
    println!("{}", "─".repeat(40).dimmed());
    for name in registry.names() {
        let dataset = registry.get(name)?;
        let info = dataset.info();
        let categories: Vec<&str> = dataset
            .categories()
            .categories(true)
            .iter()
            .map(|c| c.as_str())
            .collect();
        let splits: Vec<&str> = info.splits.keys().map(String::as_str).collect();
        println!("{}", name.bold());
        println!("  {} {}", "categories:".dimmed(), categories.join(", "));
        println!("  {} {}", "splits:".dimmed(), splits.join(", "));
        println!("  {} {}", "url:".dimmed(), info.url);
    }

    Ok(())
}

fn cmd_version() {
    println!("{} {}", "docsift".cyan().bold(), env!("CARGO_PKG_VERSION"));
    println!("Document layout analysis tool");
    println!();
    println!("License: MIT");
}
