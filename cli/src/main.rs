mod sim;

use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context};
use clap::{Parser, Subcommand};
use serde_json::json;
use tapwrite_core::{load_app_config, read_link_file, WriteOutcome};

/// NTAG213 user memory minus TLV framing.
const DEFAULT_TAG_CAPACITY: u32 = 137;

#[derive(Debug, Parser)]
#[command(name = "tapwrite")]
#[command(about = "Write a list of links onto NFC tags, one tag per link")]
struct Cli {
    /// State directory (tapwrite_config.json is read from here)
    #[arg(long, env = "TAPWRITE_STATE_DIR", default_value = ".tapwrite")]
    state_dir: PathBuf,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Parse a link file and print the links in write order
    Parse {
        /// Text/CSV file with one link (or several separated links) per line
        file: PathBuf,
    },

    /// Print the NDEF message a link would be written as
    Encode {
        link: String,
    },

    /// Write a link file onto in-memory tags, one tap per tag
    Simulate {
        file: PathBuf,

        /// Number of taps (defaults to one per link)
        #[arg(long)]
        taps: Option<usize>,

        /// NDEF capacity of every tag in bytes
        #[arg(long, default_value_t = DEFAULT_TAG_CAPACITY)]
        capacity: u32,

        /// Present blank tags that must be formatted first
        #[arg(long)]
        formatable: bool,

        /// Zero-based tap numbers whose tag is read-only (repeatable)
        #[arg(long)]
        read_only_at: Vec<usize>,
    },
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_target(false)
        .without_time()
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    std::fs::create_dir_all(&cli.state_dir)
        .with_context(|| format!("create state dir {}", cli.state_dir.display()))?;

    match &cli.cmd {
        Command::Parse { file } => cmd_parse(&cli, file),
        Command::Encode { link } => cmd_encode(link),
        Command::Simulate {
            file,
            taps,
            capacity,
            formatable,
            read_only_at,
        } => cmd_simulate(
            &cli,
            file,
            *taps,
            sim::TagPlan {
                capacity: *capacity,
                formatable: *formatable,
                read_only_at: read_only_at.clone(),
            },
        ),
    }
}

fn print(v: serde_json::Value) {
    println!("{}", serde_json::to_string_pretty(&v).expect("json encode"));
}

fn outcome_json(outcome: &WriteOutcome) -> serde_json::Value {
    match outcome {
        WriteOutcome::Success => json!({ "result": "success" }),
        WriteOutcome::ReadOnlyTag => json!({ "result": "read_only_tag" }),
        WriteOutcome::MessageTooLarge { size, max_size } => json!({
            "result": "message_too_large",
            "size": size,
            "max_size": max_size,
        }),
        WriteOutcome::UnsupportedTag => json!({ "result": "unsupported_tag" }),
        WriteOutcome::IoFailure { message } => json!({
            "result": "io_failure",
            "message": message,
        }),
    }
}

// ── Commands ────────────────────────────────────────────────────────────────

fn cmd_parse(cli: &Cli, file: &Path) -> anyhow::Result<()> {
    let config = load_app_config(&cli.state_dir.to_string_lossy());
    let text = read_link_file(file)?;
    let links = config.link_file_format().parse(&text);
    config.check_link_count(links.len())?;
    print(json!({
        "file": file.display().to_string(),
        "count": links.len(),
        "links": links,
    }));
    Ok(())
}

fn cmd_encode(link: &str) -> anyhow::Result<()> {
    print(encode_json(link)?);
    Ok(())
}

fn encode_json(link: &str) -> anyhow::Result<serde_json::Value> {
    if let Err(e) = tapwrite_ndef::encode_uri_message(link) {
        tracing::warn!(link, %e, "link would be written as an empty URI");
    }
    let bytes = tapwrite_core::encode_link_message(link);
    let uri = tapwrite_ndef::decode_first_uri(&bytes).context("decode encoded message")?;
    Ok(json!({
        "link": link,
        "uri": uri,
        "ndef_hex": hex::encode(&bytes),
        "ndef_len": bytes.len(),
    }))
}

fn cmd_simulate(
    cli: &Cli,
    file: &Path,
    taps: Option<usize>,
    plan: sim::TagPlan,
) -> anyhow::Result<()> {
    let session = sim::Session::start(&cli.state_dir);
    let count = session
        .load(file)
        .map_err(|e| anyhow!("load {}: {e}", file.display()))?;
    let taps = taps.unwrap_or(count as usize);

    let mut results = Vec::with_capacity(taps);
    for i in 0..taps {
        let tap = session.tap(plan.build(i))?;
        results.push(json!({
            "tap": i,
            "link": tap.report.as_ref().map(|r| r.link.clone()),
            "outcome": tap.report.as_ref().map(|r| outcome_json(&r.outcome)),
            "toast": tap.toast,
            "ndef_hex": tap.contents.map(hex::encode),
        }));
    }

    let q = session.state().queue;
    print(json!({
        "source": q.source,
        "total": q.total,
        "written": q.written,
        "remaining": q.remaining,
        "next_link": q.next_link,
        "taps": results,
    }));
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encode_reports_abbreviated_uri_bytes() {
        let v = encode_json("https://www.example.com").unwrap();
        assert_eq!(v["uri"], "https://www.example.com");
        assert_eq!(v["ndef_hex"], "d1010c55026578616d706c652e636f6d");
        assert_eq!(v["ndef_len"], 16);
    }

    #[test]
    fn encode_degrades_invalid_link_to_empty_uri() {
        let v = encode_json("two words").unwrap();
        assert_eq!(v["uri"], "");
        assert_eq!(v["ndef_hex"], "d101015500");
    }
}
