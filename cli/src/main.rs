//! relayout CLI - rebuild extracted PDF text into DOCX, JSON, or text

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;

use relayout::convert::{self, ConvertOptions, OutputFormat};
use relayout::{read_input, BlockType, JsonFormat, PageSelection, RenderOptions, SegmentStrategy};

#[derive(Parser)]
#[command(name = "relayout")]
#[command(author = "iyulab")]
#[command(version)]
#[command(about = "Rebuild extracted PDF text into DOCX, JSON, and plain text", long_about = None)]
struct Cli {
    /// Input items file (JSON produced by the extractor)
    #[arg(value_name = "FILE")]
    input: Option<PathBuf>,

    /// Output file or directory
    #[arg(value_name = "OUTPUT")]
    output: Option<PathBuf>,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Convert extracted items to DOCX, JSON, or text
    Convert {
        /// Input items file
        #[arg(value_name = "FILE")]
        input: PathBuf,

        /// Output file or directory (current directory if not specified)
        #[arg(short, long, value_name = "PATH")]
        output: Option<PathBuf>,

        /// Output format
        #[arg(short, long, value_enum, default_value = "docx")]
        format: Format,

        /// Name of the original document, used for the output file name
        #[arg(long, value_name = "NAME")]
        name: Option<String>,

        #[command(flatten)]
        layout: LayoutArgs,
    },

    /// Convert extracted items to plain text
    Text {
        /// Input items file
        #[arg(value_name = "FILE")]
        input: PathBuf,

        /// Output file (stdout if not specified)
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,

        #[command(flatten)]
        layout: LayoutArgs,
    },

    /// Dump the reconstructed structure as JSON
    Json {
        /// Input items file
        #[arg(value_name = "FILE")]
        input: PathBuf,

        /// Output file (stdout if not specified)
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,

        /// Output compact JSON
        #[arg(long)]
        compact: bool,

        #[command(flatten)]
        layout: LayoutArgs,
    },

    /// Show a summary of the reconstructed structure
    Inspect {
        /// Input items file
        #[arg(value_name = "FILE")]
        input: PathBuf,

        /// Print the summary as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show version information
    Version,
}

/// Options shared by the converting commands.
#[derive(clap::Args, Clone, Default)]
struct LayoutArgs {
    /// Page range (e.g., "1-10", "1,3,5")
    #[arg(long)]
    pages: Option<String>,

    /// Analyze pages one at a time
    #[arg(long, env = "RELAYOUT_SEQUENTIAL")]
    sequential: bool,

    /// Segmentation strategies in fallback order
    #[arg(long, value_enum, value_delimiter = ',')]
    strategy: Vec<Strategy>,

    /// Do not start each page on a new DOCX page
    #[arg(long)]
    no_page_breaks: bool,

    /// Emit "--- Page N ---" markers
    #[arg(long, env = "RELAYOUT_PAGE_MARKERS")]
    page_markers: bool,

    /// Drop running headers and footers
    #[arg(long)]
    no_headers_footers: bool,

    /// Do not emit "[Image N]" placeholders
    #[arg(long)]
    no_images: bool,
}

impl LayoutArgs {
    fn options(&self, format: OutputFormat) -> Result<ConvertOptions, Box<dyn std::error::Error>> {
        let page_selection = match self.pages.as_deref() {
            Some(p) => PageSelection::parse(p).map_err(|e| format!("Invalid page range: {}", e))?,
            None => PageSelection::All,
        };

        let render = RenderOptions::new()
            .with_pages(page_selection)
            .with_page_breaks(!self.no_page_breaks)
            .with_page_markers(self.page_markers)
            .with_headers_footers(!self.no_headers_footers)
            .with_image_placeholders(!self.no_images);

        Ok(ConvertOptions::new()
            .with_format(format)
            .with_parallel(!self.sequential)
            .with_strategies(self.strategy.iter().map(|&s| s.into()).collect())
            .with_render_options(render))
    }
}

#[derive(Copy, Clone, PartialEq, Eq, ValueEnum)]
enum Format {
    /// Word document
    Docx,
    /// JSON structure
    Json,
    /// Plain text
    Text,
}

impl From<Format> for OutputFormat {
    fn from(format: Format) -> Self {
        match format {
            Format::Docx => OutputFormat::Docx,
            Format::Json => OutputFormat::Json,
            Format::Text => OutputFormat::Text,
        }
    }
}

#[derive(Copy, Clone, PartialEq, Eq, ValueEnum)]
enum Strategy {
    /// Gap-based clustering
    Gap,
    /// One block per line
    Line,
    /// Whole page as one block
    Single,
}

impl From<Strategy> for SegmentStrategy {
    fn from(strategy: Strategy) -> Self {
        match strategy {
            Strategy::Gap => SegmentStrategy::Gap,
            Strategy::Line => SegmentStrategy::Line,
            Strategy::Single => SegmentStrategy::Single,
        }
    }
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let result = match cli.command {
        Some(Commands::Convert {
            input,
            output,
            format,
            name,
            layout,
        }) => cmd_convert(&input, output.as_deref(), format, name.as_deref(), &layout),
        Some(Commands::Text {
            input,
            output,
            layout,
        }) => cmd_text(&input, output.as_deref(), &layout),
        Some(Commands::Json {
            input,
            output,
            compact,
            layout,
        }) => cmd_json(&input, output.as_deref(), compact, &layout),
        Some(Commands::Inspect { input, json }) => cmd_inspect(&input, json),
        Some(Commands::Version) => {
            cmd_version();
            Ok(())
        }
        None => {
            // Default behavior: convert to DOCX if input is provided
            if let Some(input) = cli.input {
                cmd_convert(
                    &input,
                    cli.output.as_deref(),
                    Format::Docx,
                    None,
                    &LayoutArgs::default(),
                )
            } else {
                println!("{}", "Usage: relayout <FILE> [OUTPUT]".yellow());
                println!("       relayout --help for more information");
                Ok(())
            }
        }
    };

    if let Err(e) = result {
        eprintln!("{}: {}", "Error".red().bold(), e);
        std::process::exit(1);
    }
}

/// Where to write a converted file: an explicit file path, or the suggested
/// name inside a directory (the current one by default).
fn resolve_output_path(output: Option<&Path>, file_name: &str) -> PathBuf {
    match output {
        Some(path) if path.is_dir() || path.extension().is_none() => path.join(file_name),
        Some(path) => path.to_path_buf(),
        None => PathBuf::from(file_name),
    }
}

/// Name of the source document: the explicit name, or the input stem.
fn original_name(input: &Path, name: Option<&str>) -> String {
    name.map(str::to_string).unwrap_or_else(|| {
        input
            .file_stem()
            .unwrap_or_default()
            .to_string_lossy()
            .into_owned()
    })
}

fn cmd_convert(
    input: &Path,
    output: Option<&Path>,
    format: Format,
    name: Option<&str>,
    layout: &LayoutArgs,
) -> Result<(), Box<dyn std::error::Error>> {
    let options = layout.options(format.into())?;
    let items = read_input(input)?;
    log::info!("Read {} items on {} pages", items.item_count(), items.pages.len());

    let result = convert::convert(&items, &original_name(input, name), &options)?;

    let path = resolve_output_path(output, &result.file_name);
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    fs::write(&path, &result.bytes)?;

    println!(
        "{} {} ({}, {} bytes)",
        "Saved to".green(),
        path.display(),
        result.mime_type.dimmed(),
        result.content_len()
    );
    Ok(())
}

fn write_or_print(output: Option<&Path>, content: &str) -> Result<(), Box<dyn std::error::Error>> {
    if let Some(path) = output {
        fs::write(path, content)?;
        println!("{} {}", "Saved to".green(), path.display());
    } else {
        println!("{}", content);
    }
    Ok(())
}

fn cmd_text(
    input: &Path,
    output: Option<&Path>,
    layout: &LayoutArgs,
) -> Result<(), Box<dyn std::error::Error>> {
    let options = layout.options(OutputFormat::Text)?;
    let doc = convert::build_structure(&read_input(input)?, &options)?;
    let text = relayout::render::to_text(&doc, &options.render)?;
    write_or_print(output, &text)
}

fn cmd_json(
    input: &Path,
    output: Option<&Path>,
    compact: bool,
    layout: &LayoutArgs,
) -> Result<(), Box<dyn std::error::Error>> {
    let format = if compact {
        JsonFormat::Compact
    } else {
        JsonFormat::Pretty
    };
    let mut options = layout.options(OutputFormat::Json)?;
    options.render = options.render.with_json_format(format);

    let doc = convert::build_structure(&read_input(input)?, &options)?;
    let json = String::from_utf8(convert::render(&doc, &options)?)?;
    write_or_print(output, &json)
}

fn cmd_inspect(input: &Path, as_json: bool) -> Result<(), Box<dyn std::error::Error>> {
    let items = read_input(input)?;
    let doc = convert::build_structure(&items, &ConvertOptions::default())?;

    let mut by_type: BTreeMap<&'static str, usize> = BTreeMap::new();
    for page in &doc.pages {
        for block in page.headers.iter().chain(&page.blocks).chain(&page.footers) {
            *by_type.entry(block.block_type.as_str()).or_default() += 1;
        }
    }
    let tables: usize = doc.pages.iter().map(|p| p.tables.len()).sum();
    let images: usize = doc.pages.iter().map(|p| p.images.len()).sum();
    let empty_pages = doc.pages.iter().filter(|p| p.is_empty()).count();

    if as_json {
        let summary = serde_json::json!({
            "file": input.display().to_string(),
            "title": doc.title,
            "author": doc.author,
            "pages": doc.page_count(),
            "emptyPages": empty_pages,
            "items": items.item_count(),
            "blocks": by_type,
            "tables": tables,
            "images": images,
        });
        println!("{}", serde_json::to_string_pretty(&summary)?);
        return Ok(());
    }

    println!("{}", "Document Information".cyan().bold());
    println!("{}", "─".repeat(40).dimmed());
    println!("{}: {}", "File".bold(), input.display());
    println!("{}: {}", "Pages".bold(), doc.page_count());
    if !doc.title.is_empty() {
        println!("{}: {}", "Title".bold(), doc.title);
    }
    if !doc.author.is_empty() {
        println!("{}: {}", "Author".bold(), doc.author);
    }
    if !doc.subject.is_empty() {
        println!("{}: {}", "Subject".bold(), doc.subject);
    }

    println!();
    println!("{}", "Structure".cyan().bold());
    println!("{}", "─".repeat(40).dimmed());
    println!("{}: {}", "Items".bold(), items.item_count());
    for block_type in [
        BlockType::Heading,
        BlockType::Paragraph,
        BlockType::List,
        BlockType::Table,
        BlockType::Caption,
        BlockType::Address,
        BlockType::Contact,
        BlockType::Header,
        BlockType::Footer,
    ] {
        if let Some(count) = by_type.get(block_type.as_str()) {
            println!("{}: {}", capitalize(block_type.as_str()).bold(), count);
        }
    }
    println!("{}: {}", "Tables".bold(), tables);
    println!("{}: {}", "Images".bold(), images);
    if empty_pages > 0 {
        println!("{}: {}", "Empty pages".yellow().bold(), empty_pages);
    }

    Ok(())
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

fn cmd_version() {
    println!("{} {}", "relayout".cyan().bold(), env!("CARGO_PKG_VERSION"));
    println!("Layout reconstruction for extracted PDF text");
    println!();
    println!("Repository: {}", "https://github.com/iyulab/relayout".dimmed());
    println!("License: MIT");
}
