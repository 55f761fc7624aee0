use std::fs::File;
use std::io::BufWriter;
use std::path::PathBuf;
use std::time::Instant;

use anyhow::Context;
use clap::{Parser, Subcommand, ValueEnum};

use url::Url;

use guest_scraper::config::{DelayRange, SourceConfig};
use guest_scraper::fetch::HttpFetcher;
use guest_scraper::{pipeline, report};

#[derive(Parser)]
#[command(name = "guest_scraper", about = "Archive guest-metadata scraper")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Discover, fetch and extract guest entries for every configured source
    Run {
        /// JSON file holding an array of source configurations
        #[arg(short, long)]
        config: PathBuf,
        /// Output table path
        #[arg(short, long)]
        output: PathBuf,
        #[arg(short, long, value_enum, default_value = "csv")]
        format: Format,
    },
    /// Validate source configurations (selectors, regexes) without fetching
    Check {
        #[arg(short, long)]
        config: PathBuf,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum Format {
    Csv,
    Jsonl,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let t0 = Instant::now();
    let cli = Cli::parse();

    match cli.command {
        Commands::Run {
            config,
            output,
            format,
        } => {
            let sources = load_sources(&config)?;
            // One shared fetcher, each source's delay bounds registered for
            // its own origin; two sources sharing an origin get the widest.
            let mut fetcher = HttpFetcher::new(DelayRange::default())?;
            for s in &sources {
                if let Some(host) = Url::parse(&s.base_url).ok().and_then(|u| {
                    u.host_str().map(|h| h.to_string())
                }) {
                    fetcher.set_origin_delay(&host, s.delay);
                }
            }

            let out = pipeline::run(&sources, &fetcher)?;
            for s in &out.stats {
                s.print();
            }
            if !out.failures.is_empty() {
                println!("{} URLs failed; kept going without them:", out.failures.len());
                for f in &out.failures {
                    println!("  [{:?}] {}: {}", f.stage, f.url, f.reason);
                }
            }

            let file = File::create(&output)
                .with_context(|| format!("cannot create {}", output.display()))?;
            let mut writer = BufWriter::new(file);
            match format {
                Format::Csv => report::write_csv(&mut writer, &out.records)?,
                Format::Jsonl => report::write_jsonl(&mut writer, &out.records)?,
            }
            println!(
                "Wrote {} entries to {} in {:.1}s",
                out.records.len(),
                output.display(),
                t0.elapsed().as_secs_f64()
            );
        }
        Commands::Check { config } => {
            let sources = load_sources(&config)?;
            for source in &sources {
                source.compile()?;
                println!("{}: ok", source.name);
            }
            println!("{} source(s) valid.", sources.len());
        }
    }

    Ok(())
}

fn load_sources(path: &PathBuf) -> anyhow::Result<Vec<SourceConfig>> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("cannot read {}", path.display()))?;
    let sources: Vec<SourceConfig> =
        serde_json::from_str(&text).with_context(|| format!("invalid config {}", path.display()))?;
    Ok(sources)
}
