use std::path::{Path, PathBuf};
use std::process;

use clap::Parser;

use bilateral_smoothing::{
    default_output_path, process_directory, process_file, FilterParams, ProcessOptions,
    ProcessResult, DEFAULT_SIZE,
};

#[derive(Parser)]
#[command(
    name = "bilateral-smooth",
    about = "Edge-preserving bilateral smoothing with a 7x7 window",
    version,
    after_help = "Simple usage: bilateral-smooth <image>  (writes {name}_bilateral.{ext})\n\n\
                  Images are resized to a square (128px by default) before filtering.\n\
                  Use --no-resize to keep the original dimensions."
)]
struct Cli {
    /// Input image file or directory
    input: String,

    /// Output file or directory (default: {name}_bilateral.{ext})
    #[arg(short, long)]
    output: Option<String>,

    /// Standard deviation of the grey-level difference weight
    #[arg(short = 'c', long, default_value = "25")]
    sigma_color: f64,

    /// Standard deviation of the spatial distance weight, in pixels
    #[arg(short = 's', long, default_value = "25")]
    sigma_space: f64,

    /// Side length of the square the image is resized to
    #[arg(long, default_value_t = DEFAULT_SIZE, conflicts_with = "no_resize")]
    size: u32,

    /// Keep the original image dimensions
    #[arg(long)]
    no_resize: bool,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Suppress all non-error output
    #[arg(short, long)]
    quiet: bool,
}

fn main() {
    let cli = Cli::parse();

    let level = if cli.quiet {
        log::LevelFilter::Error
    } else if cli.verbose {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Warn
    };
    env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .init();

    let params = match FilterParams::new(cli.sigma_color, cli.sigma_space) {
        Ok(p) => p,
        Err(e) => {
            eprintln!("Error: {e}");
            process::exit(1);
        }
    };

    if !cli.no_resize && cli.size == 0 {
        eprintln!("Error: Size must be greater than 0");
        process::exit(1);
    }

    let opts = ProcessOptions {
        params,
        size: (!cli.no_resize).then_some(cli.size),
        verbose: cli.verbose,
        quiet: cli.quiet,
    };

    let input_path = Path::new(&cli.input);
    if !input_path.exists() {
        eprintln!("Error: Input path does not exist: {}", cli.input);
        process::exit(1);
    }

    if !opts.quiet {
        eprintln!(
            "sigma_color={}, sigma_space={}, {}",
            params.sigma_color,
            params.sigma_space,
            opts.size
                .map_or_else(|| "original size".to_string(), |s| format!("resize {s}x{s}"))
        );
        eprintln!();
    }

    let results = if input_path.is_dir() {
        let output_dir = if let Some(o) = &cli.output {
            PathBuf::from(o)
        } else {
            eprintln!("Error: Output directory is required for batch processing");
            eprintln!("Usage: bilateral-smooth <input_dir> -o <output_dir>");
            process::exit(1);
        };
        process_directory(input_path, &output_dir, &opts)
    } else {
        let output_path = match &cli.output {
            Some(o) => PathBuf::from(o),
            None => default_output_path(input_path),
        };
        vec![process_file(input_path, &output_path, &opts)]
    };

    let mut success_count = 0u32;
    let mut fail_count = 0u32;

    for r in &results {
        print_result(r, &opts);
        if r.success {
            success_count += 1;
        } else {
            fail_count += 1;
        }
    }

    if results.len() > 1 && !opts.quiet {
        eprintln!();
        eprint!("[Summary] Processed: {success_count}");
        if fail_count > 0 {
            eprint!(", Failed: {fail_count}");
        }
        eprintln!(" (Total: {})", results.len());
    }

    if fail_count > 0 {
        process::exit(1);
    }
}

fn print_result(result: &ProcessResult, opts: &ProcessOptions) {
    if opts.quiet && result.success {
        return;
    }

    let filename = result.path.file_name().map_or_else(
        || result.path.display().to_string(),
        |f| f.to_string_lossy().to_string(),
    );

    if result.success {
        match result.dimensions {
            Some((w, h)) => eprintln!("[OK] {filename} ({w}x{h})"),
            None => eprintln!("[OK] {filename}"),
        }
    } else {
        eprintln!("[FAIL] {filename}: {}", result.message);
    }

    if opts.verbose && !result.message.is_empty() {
        eprintln!("  -> {}", result.message);
    }
}
