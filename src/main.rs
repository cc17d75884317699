use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, bail};
use clap::Parser;
use tracing::{error, info};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use arm11::{Arm11, CoreConfig};

fn parse_number(s: &str) -> Result<u32, String> {
    let trimmed = s.trim();
    match trimmed
        .strip_prefix("0x")
        .or_else(|| trimmed.strip_prefix("0X"))
    {
        Some(hex) => u32::from_str_radix(&hex.replace('_', ""), 16)
            .map_err(|e| format!("invalid hex value '{s}': {e}")),
        None => trimmed
            .replace('_', "")
            .parse()
            .map_err(|e| format!("invalid value '{s}': {e}")),
    }
}

/// Runs a raw ARM binary on an emulated ARM11 core.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Raw binary image
    image: PathBuf,

    /// Address the image is copied to
    #[arg(long, default_value = "0", value_parser = parse_number)]
    load_address: u32,

    /// Initial PC after reset (defaults to the load address)
    #[arg(long, value_parser = parse_number)]
    entry: Option<u32>,

    /// Size of the RAM in bytes
    #[arg(long, value_parser = parse_number)]
    memory_size: Option<u32>,

    /// Maximum number of instructions to execute
    #[arg(long, default_value_t = 1_000_000)]
    max_steps: u64,

    /// Core configuration (JSON); command line flags take precedence
    #[arg(long)]
    config: Option<PathBuf>,

    /// Put the exception vectors at 0xFFFF0000
    #[arg(long)]
    high_vectors: bool,

    /// Log filter, e.g. `info` or `arm11=trace` (overrides RUST_LOG)
    #[arg(long)]
    log_level: Option<String>,

    /// Also write the log to this file
    #[arg(long)]
    log_file: Option<PathBuf>,

    /// Write the final core state here as JSON
    #[arg(long)]
    dump: Option<PathBuf>,
}

fn init_logging(level: Option<&str>, log_file: Option<&Path>) -> anyhow::Result<Option<WorkerGuard>> {
    let filter = match level {
        Some(level) => EnvFilter::try_new(level)?,
        None => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
    };
    let stderr = fmt::layer().with_writer(std::io::stderr);

    let Some(path) = log_file else {
        tracing_subscriber::registry().with(filter).with(stderr).init();
        return Ok(None);
    };

    let directory = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    let Some(file_name) = path.file_name() else {
        bail!("log file {} has no file name", path.display());
    };
    let (writer, guard) =
        tracing_appender::non_blocking(tracing_appender::rolling::never(directory, file_name));

    tracing_subscriber::registry()
        .with(filter)
        .with(stderr)
        .with(fmt::layer().with_ansi(false).with_writer(writer))
        .init();
    Ok(Some(guard))
}

fn build_config(cli: &Cli) -> anyhow::Result<CoreConfig> {
    let mut config = match &cli.config {
        Some(path) => {
            let text = fs::read_to_string(path)
                .with_context(|| format!("reading config {}", path.display()))?;
            serde_json::from_str(&text)
                .with_context(|| format!("parsing config {}", path.display()))?
        }
        None => CoreConfig::default(),
    };

    if let Some(size) = cli.memory_size {
        config.memory_size = usize::try_from(size)?;
    }
    if cli.high_vectors {
        config.high_vectors = true;
    }
    config.reset_pc = cli.entry.or(config.reset_pc).or(Some(cli.load_address));
    Ok(config)
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let _guard = init_logging(cli.log_level.as_deref(), cli.log_file.as_deref())?;

    let config = build_config(&cli)?;
    let image = fs::read(&cli.image)
        .with_context(|| format!("reading image {}", cli.image.display()))?;
    info!(
        "loading {} ({} bytes) at 0x{:08X}",
        cli.image.display(),
        image.len(),
        cli.load_address
    );

    let mut core = Arm11::with_config(config);
    core.memory_mut()
        .load(cli.load_address, &image)
        .context("loading image")?;

    let outcome = core.run(cli.max_steps);
    match &outcome {
        Ok(executed) => info!("stopped after {executed} instructions"),
        Err(e) => error!("core stopped after {} instructions: {e}", core.retired()),
    }

    println!("{}", core.registers());

    if let Some(path) = &cli.dump {
        let file = fs::File::create(path)
            .with_context(|| format!("creating dump {}", path.display()))?;
        serde_json::to_writer_pretty(file, &core.snapshot())?;
    }

    outcome?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn numbers_in_hex_and_decimal() {
        assert_eq!(parse_number("0x8000"), Ok(0x8000));
        assert_eq!(parse_number("0X10_0000"), Ok(0x0010_0000));
        assert_eq!(parse_number("4096"), Ok(4096));
        assert!(parse_number("0xZZ").is_err());
    }

    #[test]
    fn entry_defaults_to_load_address() {
        let cli = Cli::parse_from(["osprey", "image.bin", "--load-address", "0x8000"]);
        let config = build_config(&cli).unwrap();
        assert_eq!(config.reset_pc, Some(0x8000));
        assert!(!config.high_vectors);

        let cli = Cli::parse_from([
            "osprey",
            "image.bin",
            "--entry",
            "0x100",
            "--memory-size",
            "0x4000",
            "--high-vectors",
        ]);
        let config = build_config(&cli).unwrap();
        assert_eq!(config.reset_pc, Some(0x100));
        assert_eq!(config.memory_size, 0x4000);
        assert!(config.high_vectors);
    }
}
