//! IPTV Guide - command line front end
//! Lists playlist channels together with what is airing now and next

// Use mimalloc for faster memory allocation (Linux, macOS)
#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use chrono::{DateTime, FixedOffset, Utc};
use clap::Parser;
use serde::Serialize;
use tracing::{debug, info, warn};

use iptv_guide::epg::format_time;
use iptv_guide::guide::now_next_programs;
use iptv_guide::{
    describe, ChannelFilter, GuideConfig, GuideLoader, LoadEvent, NowNext, Playlist, Program,
    QualityFilter, ScheduleIndex,
};

/// Parsing a large guide can take a while on slow machines
const LOAD_TIMEOUT: Duration = Duration::from_secs(300);

#[derive(Parser, Debug)]
#[command(name = "iptv-guide", version, about = "Show what is on now and next for an IPTV playlist")]
struct Cli {
    /// M3U/M3U8 playlist file
    #[arg(short, long)]
    playlist: PathBuf,

    /// XMLTV guide file (.xml or .xml.gz)
    #[arg(short, long)]
    epg: Option<PathBuf>,

    /// Instant to query, RFC 3339 (defaults to the current time)
    #[arg(long)]
    at: Option<DateTime<FixedOffset>>,

    /// Case-insensitive channel name filter
    #[arg(short, long, default_value = "")]
    search: String,

    /// Quality filter: all, hd or sd
    #[arg(short, long)]
    quality: Option<QualityFilter>,

    /// Print JSON instead of text
    #[arg(long)]
    json: bool,

    /// Config file (defaults to the user config dir)
    #[arg(short, long)]
    config: Option<PathBuf>,

    #[arg(short, long)]
    verbose: bool,
}

#[derive(Serialize)]
struct Row<'a> {
    name: &'a str,
    url: &'a str,
    quality: &'static str,
    epg_id: Option<&'a str>,
    #[serde(flatten)]
    guide: NowNext,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let env_filter = std::env::var("RUST_LOG").unwrap_or_else(|_| {
        if cli.verbose {
            "iptv_guide=debug".to_string()
        } else {
            "iptv_guide=warn".to_string()
        }
    });
    tracing_subscriber::fmt()
        .with_env_filter(&env_filter)
        .with_writer(std::io::stderr)
        .init();

    let config = match cli.config.as_deref() {
        Some(path) => GuideConfig::load_from(path)
            .with_context(|| format!("Failed to load config {}", path.display()))?,
        None => GuideConfig::load(),
    };

    let (playlist, index) = load_sources(&cli)?;

    if let (Some(url), None) = (playlist.epg_url.as_deref(), cli.epg.as_ref()) {
        info!(%url, "Playlist advertises a guide; pass it with --epg to see programs");
    }

    let now = config.adjusted_now(cli.at.map(|t| t.with_timezone(&Utc)).unwrap_or_else(Utc::now));
    let filter = ChannelFilter::new(cli.search.as_str(), cli.quality.unwrap_or(config.default_quality));
    let channels = filter.apply(&playlist.channels);
    debug!(shown = channels.len(), total = playlist.channels.len(), "Filtered channels");

    if cli.json {
        let rows: Vec<Row> = channels
            .iter()
            .map(|c| Row {
                name: &c.name,
                url: &c.url,
                quality: c.quality.label(),
                epg_id: c.epg_id.as_deref(),
                guide: describe(c, &index, &now),
            })
            .collect();
        println!("{}", serde_json::to_string_pretty(&rows)?);
        return Ok(());
    }

    for channel in channels {
        println!("{} [{}]", channel.name, channel.quality.label());
        let (current, next) = now_next_programs(channel, &index, &now);
        if let Some(p) = current {
            println!("  now:  {}", program_line(p));
        }
        if let Some(p) = next {
            println!("  next: {}", program_line(p));
        }
    }
    Ok(())
}

fn program_line(p: &Program) -> String {
    format!("{}-{} {}", format_time(&p.start), format_time(&p.end), p.title)
}

/// Read the inputs and parse them on the loader's worker threads
fn load_sources(cli: &Cli) -> Result<(Playlist, ScheduleIndex)> {
    let loader = GuideLoader::new();

    let text = fs::read_to_string(&cli.playlist)
        .with_context(|| format!("Failed to read playlist {}", cli.playlist.display()))?;
    loader.load_playlist(&cli.playlist.display().to_string(), text);

    let mut index = None;
    if let Some(path) = &cli.epg {
        let bytes = fs::read(path).with_context(|| format!("Failed to read EPG {}", path.display()))?;
        loader.load_epg(&path.display().to_string(), bytes);
    } else {
        index = Some(ScheduleIndex::default());
    }

    let mut playlist = None;
    while playlist.is_none() || index.is_none() {
        let Some(event) = loader.wait_next(LOAD_TIMEOUT) else {
            bail!("Timed out waiting for sources to load");
        };
        match event {
            LoadEvent::Progress { fraction, .. } => debug!("Playlist {:.0}%", fraction * 100.0),
            LoadEvent::PlaylistLoaded { playlist: p, .. } => playlist = Some(p),
            LoadEvent::EpgLoaded { index: i, error, .. } => {
                if let Some(e) = error {
                    warn!(error = %e, "Showing channels without guide data");
                }
                index = Some(i);
            }
        }
    }

    match (playlist, index) {
        (Some(playlist), Some(index)) => Ok((playlist, index)),
        _ => bail!("Sources did not finish loading"),
    }
}
