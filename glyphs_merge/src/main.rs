use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;

pub mod error;
pub mod features;
pub mod merge;
pub mod metadata;

use mimalloc::MiMalloc;

#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

/// Build the Reem Kufi source by merging the Latin font into the Arabic one.
#[derive(Parser)]
#[command(about, long_about = None)]
struct Cli {
    /// The Arabic Glyphs.app source, receiving the Latin glyphs.
    #[arg(value_name = "ARABICFILE")]
    arabic_path: PathBuf,

    /// The Latin Glyphs.app source.
    #[arg(value_name = "LATINFILE")]
    latin_path: PathBuf,

    /// The path to the merged Glyphs.app file to write.
    #[arg(long, value_name = "FILE")]
    out_file: PathBuf,

    /// Version number of the merged font, as <major>.<minor>.
    #[arg(long, value_name = "VERSION")]
    version: String,
}

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn"))
        .format_timestamp(None)
        .init();

    run(&Cli::parse())
}

fn run(cli: &Cli) -> anyhow::Result<()> {
    let arabic = glyphs_plist::Font::load(&cli.arabic_path)
        .with_context(|| format!("Cannot load {}", cli.arabic_path.display()))?;
    let latin = glyphs_plist::Font::load(&cli.latin_path)
        .with_context(|| format!("Cannot load {}", cli.latin_path.display()))?;

    let merged = merge::merge(arabic, latin, &cli.version).with_context(|| {
        format!(
            "Cannot merge {} into {}",
            cli.latin_path.display(),
            cli.arabic_path.display()
        )
    })?;

    merged
        .save(&cli.out_file)
        .with_context(|| format!("Cannot save {}", cli.out_file.display()))?;
    log::info!("wrote {}", cli.out_file.display());
    Ok(())
}
