use std::io::Write;
use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tokio_util::sync::CancellationToken;

mod output;

use output::ColorMode;
use paperlens_core::{Config, CorpusStore, Document, PdfBackend, Pipeline};
use paperlens_pdf_mupdf::MupdfBackend;

/// PaperLens - Automated analysis of research paper PDFs
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Analyze a research paper PDF (or plain-text file)
    Analyze {
        /// Path to the PDF or .txt file to analyze
        file_path: PathBuf,

        /// Emit the full analysis as JSON instead of a formatted report
        #[arg(long)]
        json: bool,

        /// Disable colored output
        #[arg(long)]
        no_color: bool,

        /// Path to output file
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Manage the local reference corpus
    Corpus {
        #[command(subcommand)]
        command: CorpusCommand,
    },
}

#[derive(Subcommand, Debug)]
enum CorpusCommand {
    /// Add a document to the corpus used for plagiarism comparison
    Add {
        /// Path to the PDF or .txt file to add
        file_path: PathBuf,

        /// Corpus entry id (defaults to the file stem)
        #[arg(long)]
        id: Option<String>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "paperlens_core=warn".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Command::Analyze {
            file_path,
            json,
            no_color,
            output,
        } => analyze(file_path, json, no_color, output).await,
        Command::Corpus {
            command: CorpusCommand::Add { file_path, id },
        } => corpus_add(file_path, id),
    }
}

async fn analyze(
    file_path: PathBuf,
    json: bool,
    no_color: bool,
    output: Option<PathBuf>,
) -> anyhow::Result<()> {
    if !file_path.exists() {
        anyhow::bail!("File not found: {}", file_path.display());
    }

    let use_color = !no_color && !json && output.is_none();
    let color = ColorMode(use_color);

    let mut writer: Box<dyn Write> = if let Some(ref output_path) = output {
        Box::new(std::fs::File::create(output_path)?)
    } else {
        Box::new(std::io::stdout())
    };

    let document = load_document(&file_path)?;

    let file_name = file_path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| file_path.display().to_string());

    if !json {
        output::print_extraction_summary(&mut writer, &file_name, &document, color)?;
    }

    let config = Config::load();
    let client = reqwest::Client::new();
    let corpus = CorpusStore::open(&config.corpus_dir)?;
    let pipeline = Pipeline::new(&config, &client);

    let cancel = CancellationToken::new();
    let cancel_clone = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            cancel_clone.cancel();
        }
    });

    let result = pipeline.analyze(&document, &corpus, &cancel).await?;

    if json {
        writeln!(writer, "{}", serde_json::to_string_pretty(&result)?)?;
    } else {
        output::print_report(&mut writer, &result, color)?;
    }

    Ok(())
}

fn corpus_add(file_path: PathBuf, id: Option<String>) -> anyhow::Result<()> {
    if !file_path.exists() {
        anyhow::bail!("File not found: {}", file_path.display());
    }

    let document = load_document(&file_path)?;

    let id = id.unwrap_or_else(|| {
        file_path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| file_path.display().to_string())
    });

    let config = Config::load();
    let corpus = CorpusStore::open(&config.corpus_dir)?;
    corpus.append(&id, &document.text)?;

    println!(
        "Added '{}' to corpus ({} entries, {})",
        id,
        corpus.len(),
        config.corpus_dir.display()
    );

    Ok(())
}

/// Load a document from disk, extracting text from PDFs and reading
/// `.txt` files directly.
fn load_document(file_path: &std::path::Path) -> anyhow::Result<Document> {
    let is_txt = file_path
        .extension()
        .map(|e| e.eq_ignore_ascii_case("txt"))
        .unwrap_or(false);

    if is_txt {
        let text = std::fs::read_to_string(file_path)?;
        return Ok(Document::from_text(text));
    }

    let backend = MupdfBackend::new();
    let extracted = backend
        .extract(file_path)
        .map_err(|e| anyhow::anyhow!("PDF extraction failed: {}", e))?;
    Ok(Document::from(extracted))
}
