use clap::{Parser, Subcommand};
use imagehacker::artifact::{ImageArtifact, ImageFormatTag};
use imagehacker::imaging::{ImageBackend, RustBackend};
use imagehacker::service::EditorService;
use imagehacker::{batch, config, logging, output, schema};
use std::io::Read;
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "imagehacker")]
#[command(about = "JSON-driven image editing engine")]
#[command(long_about = "\
JSON-driven image editing engine

Each request is a JSON envelope carrying one Base64 image and one action:

  {
    \"imageBase64URL\": \"iVBORw0KGgo...\",
    \"imageFormat\": \"png\",
    \"action\": { \"resize\": { \"resizeByPercentage\": { \"percentage\": 50 } } }
  }

The response is either { imageBase64URL, imageFormat } or { errorMessage }.

Formats: bmp, ico, jpg (jpeg), png.
Run 'imagehacker operations' to list every category, operation and parameter.
Run 'imagehacker gen-config' to generate a documented imagehacker.toml.")]
#[command(version)]
struct Cli {
    /// Config file (missing file means stock defaults)
    #[arg(long, default_value = config::CONFIG_FILE_NAME, global = true)]
    config: PathBuf,

    /// Log level or filter directive; overrides the config file
    #[arg(long, global = true)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Handle one request envelope and print the response JSON
    Edit {
        /// Request file; reads stdin when absent
        #[arg(long)]
        request: Option<PathBuf>,
    },
    /// Apply one action to an image file
    Apply {
        /// Input image
        #[arg(long)]
        input: PathBuf,
        /// Action JSON, e.g. '{"crop": {"crop": {"x1": 0, "y1": 0, "x2": 9, "y2": 9}}}'
        #[arg(long)]
        action: String,
        /// Where to write the result
        #[arg(long)]
        output: PathBuf,
        /// Input format; defaults to the input file extension
        #[arg(long)]
        format: Option<String>,
    },
    /// Handle every request file in a directory in parallel
    Batch {
        /// Directory of *.json request envelopes
        dir: PathBuf,
        /// Mirror responses under this directory instead of next to requests
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// List categories, operations and their parameters
    Operations,
    /// Print a stock imagehacker.toml with all options documented
    GenConfig,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let mut config = config::load_config(&cli.config)?;
    if let Some(level) = cli.log_level {
        config.logging.level = level;
    }
    logging::init(&config.logging).ok();

    match cli.command {
        Command::Edit { request } => {
            let body = match request {
                Some(path) => std::fs::read_to_string(path)?,
                None => {
                    let mut body = String::new();
                    std::io::stdin().read_to_string(&mut body)?;
                    body
                }
            };
            let service = EditorService::from_config(backend(&config), &config);
            let response = service.handle_json(&body);
            println!("{}", serde_json::to_string_pretty(&response.body)?);
            if !response.is_success() {
                std::process::exit(1);
            }
        }
        Command::Apply {
            input,
            action,
            output: output_path,
            format,
        } => {
            let format = resolve_input_format(&input, format.as_deref())?;
            let action: serde_json::Value = serde_json::from_str(&action)?;
            let bytes = std::fs::read(&input)?;
            let service = EditorService::from_config(backend(&config), &config);
            let before = ImageArtifact::new(service.backend().decode(&bytes)?, format);
            let outcome = service.apply(&bytes, format, &action)?;
            std::fs::write(&output_path, &outcome.encoded)?;
            println!(
                "{}",
                output::format_apply_result(
                    &input,
                    &output_path,
                    before.dimensions(),
                    &outcome.artifact,
                    outcome.encoded.len(),
                )
            );
        }
        Command::Batch { dir, out } => {
            init_thread_pool(&config.processing);
            let service = EditorService::from_config(backend(&config), &config);
            let report = batch::run_batch(&service, &dir, out.as_deref())?;
            output::print_batch_report(&report);
            if report.failed() > 0 {
                std::process::exit(1);
            }
        }
        Command::Operations => {
            output::print_operations(&schema::describe());
        }
        Command::GenConfig => {
            print!("{}", config::stock_config_toml());
        }
    }

    Ok(())
}

fn backend(config: &config::EditorConfig) -> RustBackend {
    RustBackend::with_background_tolerance(config.processing.background_tolerance)
}

/// Initialize the rayon thread pool based on processing config.
///
/// Caps at the number of available CPU cores; the config can constrain down, not up.
fn init_thread_pool(processing: &config::ProcessingConfig) {
    let threads = config::effective_threads(processing);
    rayon::ThreadPoolBuilder::new()
        .num_threads(threads)
        .build_global()
        .ok();
}

/// The explicit `--format`, else the input's extension.
fn resolve_input_format(
    input: &Path,
    explicit: Option<&str>,
) -> Result<ImageFormatTag, Box<dyn std::error::Error>> {
    match explicit {
        Some(name) => {
            ImageFormatTag::parse(name).ok_or_else(|| format!("unsupported format: {name}").into())
        }
        None => ImageFormatTag::from_path(input).ok_or_else(|| {
            format!(
                "cannot infer format of {}; pass --format",
                input.display()
            )
            .into()
        }),
    }
}
