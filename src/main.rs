use anyhow::{Context, Result};
use clap::Parser;
use std::io::Write;
use std::path::{Path, PathBuf};

use feedsmith::config::Config;
use feedsmith::encode::encode_profile;
use feedsmith::validate::validate;
use feedsmith::{ExtensionNode, Feed, Profile};

/// Maximum input file size (16 MB).
const MAX_INPUT_SIZE: u64 = 16 * 1_048_576;

/// Default config path (~/.config/feedsmith/config.toml)
fn default_config_path() -> Result<PathBuf> {
    let home = std::env::var("HOME").context("HOME environment variable not set")?;
    Ok(PathBuf::from(home)
        .join(".config")
        .join("feedsmith")
        .join("config.toml"))
}

/// Write a file using the write-to-temp-then-rename pattern so the
/// destination is never left in a partial state.
fn atomic_write(dst: &Path, content: &[u8]) -> Result<()> {
    use std::time::{SystemTime, UNIX_EPOCH};
    let random_suffix = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos())
        .unwrap_or(0);
    let temp_path = dst.with_extension(format!("tmp.{:016x}", random_suffix));

    let mut temp_file = std::fs::OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(&temp_path)
        .with_context(|| {
            format!(
                "Failed to create temporary file '{}': check directory permissions",
                temp_path.display()
            )
        })?;

    temp_file.write_all(content).with_context(|| {
        let _ = std::fs::remove_file(&temp_path);
        format!("Failed to write to temporary file '{}'", temp_path.display())
    })?;

    temp_file.sync_all().with_context(|| {
        let _ = std::fs::remove_file(&temp_path);
        format!("Failed to sync temporary file '{}' to disk", temp_path.display())
    })?;

    drop(temp_file);

    std::fs::rename(&temp_path, dst).with_context(|| {
        let _ = std::fs::remove_file(&temp_path);
        format!(
            "Failed to rename '{}' to '{}'",
            temp_path.display(),
            dst.display()
        )
    })?;

    Ok(())
}

/// Load the canonical feed: TOML for `.toml` files, JSON otherwise.
fn load_feed(path: &Path) -> Result<Feed> {
    let metadata = std::fs::metadata(path)
        .with_context(|| format!("Failed to read input file: {}", path.display()))?;
    if !metadata.is_file() {
        anyhow::bail!("Input path must be a regular file");
    }
    if metadata.len() > MAX_INPUT_SIZE {
        anyhow::bail!(
            "Input file is {} bytes (max {} bytes)",
            metadata.len(),
            MAX_INPUT_SIZE
        );
    }

    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read input file: {}", path.display()))?;
    if content.trim().is_empty() {
        anyhow::bail!("Input file is empty: {}", path.display());
    }

    let is_toml = path
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("toml"));
    let feed: Feed = if is_toml {
        toml::from_str(&content).context("Invalid TOML feed description")?
    } else {
        serde_json::from_str(&content).context("Invalid JSON feed description")?
    };
    tracing::debug!(path = %path.display(), items = feed.items.len(), "Loaded feed");
    Ok(feed)
}

#[derive(Parser, Debug)]
#[command(
    name = "feedsmith",
    about = "Encode a feed description as RSS, Atom, JSON Feed or PSP-1 podcast RSS"
)]
struct Args {
    /// Feed description (.toml, or JSON for any other extension)
    #[arg(value_name = "INPUT")]
    input: PathBuf,

    /// Output format: rss, atom, json or psp (overrides the config file)
    #[arg(short, long, value_name = "FORMAT")]
    format: Option<Profile>,

    /// Write to this file instead of stdout
    #[arg(short, long, value_name = "FILE")]
    output: Option<PathBuf>,

    /// Skip profile validation before encoding
    #[arg(long)]
    no_validate: bool,

    /// Entity-escape HTML instead of wrapping it in CDATA sections
    #[arg(long)]
    no_cdata: bool,

    /// Config file (default: ~/.config/feedsmith/config.toml)
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,
}

fn main() -> Result<()> {
    // Logs go to stderr so stdout carries only the document
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    let config_path = match &args.config {
        Some(path) => path.clone(),
        None => default_config_path()?,
    };
    let config = Config::load(&config_path)
        .with_context(|| format!("Failed to load config: {}", config_path.display()))?;

    let profile = match args.format {
        Some(profile) => profile,
        None => config.profile().context("Invalid format in config file")?,
    };

    let mut feed = load_feed(&args.input)?;
    if args.no_cdata || !config.cdata {
        feed.extensions.push(ExtensionNode::config("cdata", "false"));
    }

    if config.validate && !args.no_validate {
        validate(&feed, profile).with_context(|| format!("Feed is not valid {profile}"))?;
    }

    let mut document = Vec::new();
    encode_profile(&feed, profile, &mut document)
        .with_context(|| format!("Failed to encode feed as {profile}"))?;
    tracing::info!(format = %profile, bytes = document.len(), "Encoded feed");

    match &args.output {
        Some(path) => atomic_write(path, &document)?,
        None => {
            let mut stdout = std::io::stdout().lock();
            stdout.write_all(&document).context("Failed to write to stdout")?;
            stdout.write_all(b"\n").context("Failed to write to stdout")?;
        }
    }
    Ok(())
}
