use std::fs;
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};
use std::process;

use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use qr_watermark::{check_watermark_len, parse_size, QrSpec, Result, MAX_WATERMARK_BYTES};

#[derive(Parser)]
#[command(
    name = "qr-watermark",
    about = "Generate a QR code PNG, optionally with a watermark centered over it",
    version,
    after_help = "Simple usage: qr-watermark https://example.com -o qr.png\n\n\
                  NOTE: The watermark must be a PNG. It is resized to a quarter of the\n\
                  code's width and placed assuming a 64x64 footprint."
)]
struct Cli {
    /// Content to encode
    content: String,

    /// Edge length of the generated image in pixels
    #[arg(short, long, default_value = "256")]
    size: String,

    /// PNG image to overlay on the code
    #[arg(short, long)]
    watermark: Option<PathBuf>,

    /// Output file, or `-` for stdout
    #[arg(short, long, default_value = "qr.png")]
    output: String,

    /// Report errors as a JSON object on stdout
    #[arg(long)]
    json_errors: bool,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Suppress all non-error output
    #[arg(short, long)]
    quiet: bool,
}

fn main() {
    let cli = Cli::parse();
    init_tracing(&cli);

    if let Err(e) = run(&cli) {
        if cli.json_errors {
            println!("{}", e.response_body());
        } else {
            error!("{} {e}", e.context());
        }
        process::exit(1);
    }
}

fn init_tracing(cli: &Cli) {
    let default_level = if cli.quiet {
        "error"
    } else if cli.verbose {
        "debug"
    } else {
        "info"
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .init();
}

fn run(cli: &Cli) -> Result<()> {
    let size = parse_size(&cli.size)?;
    let spec = QrSpec::new(cli.content.as_str(), i64::from(size))?;

    let png = match &cli.watermark {
        Some(path) => {
            let watermark = read_watermark(path)?;
            info!(
                path = %path.display(),
                width = spec.watermark_width(),
                "Applying watermark"
            );
            spec.generate_with_watermark(&watermark)?
        }
        None => spec.generate()?,
    };

    if cli.output == "-" {
        io::stdout().lock().write_all(&png)?;
    } else {
        let output = Path::new(&cli.output);
        if let Some(parent) = output.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                fs::create_dir_all(parent)?;
            }
        }
        fs::write(output, &png)?;
        info!(path = %output.display(), size, bytes = png.len(), "Wrote QR code");
    }
    Ok(())
}

/// Read a watermark file, refusing anything larger than the upload limit.
fn read_watermark(path: &Path) -> Result<Vec<u8>> {
    let file = fs::File::open(path)?;
    check_watermark_len(file.metadata()?.len())?;
    let mut buf = Vec::new();
    file.take(MAX_WATERMARK_BYTES + 1).read_to_end(&mut buf)?;
    check_watermark_len(buf.len() as u64)?;
    Ok(buf)
}
