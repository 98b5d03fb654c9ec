use std::path::PathBuf;

use anyhow::{Context as _, Result};
use aws_config::{BehaviorVersion, Region};
use aws_sdk_resourcegroupstagging::{types::TagFilter, Client as TaggingClient};
use chrono::Utc;
use clap::Parser;
use tag_report::{export_file_name, render_csv, render_table, OutputFormat, Report};
use tracing::info;

const DEFAULT_TAG_KEY: &str = "aws-apn-id";
const DEFAULT_TAG_VALUE: &str = "pc:3jtjsihjubajawpl401j5b27s";

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "Report resources carrying the partner attribution tag"
)]
struct Args {
    /// Region to query (default: AWS_REGION, then us-east-1).
    #[arg(long)]
    region: Option<String>,

    #[arg(long, default_value = DEFAULT_TAG_KEY)]
    tag_key: String,

    #[arg(long, default_value = DEFAULT_TAG_VALUE)]
    tag_value: String,

    #[arg(long, value_enum, default_value_t = OutputFormat::Table)]
    format: OutputFormat,

    /// Include the full ARN list per service.
    #[arg(long)]
    detailed: bool,

    /// Directory to write the export file into instead of printing to stdout.
    #[arg(long)]
    output: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let args = Args::parse();
    let region = args
        .region
        .clone()
        .or_else(|| std::env::var("AWS_REGION").ok())
        .unwrap_or_else(|| "us-east-1".to_string());

    let config = aws_config::defaults(BehaviorVersion::latest())
        .region(Region::new(region.clone()))
        .load()
        .await;
    let client = TaggingClient::new(&config);

    let filter = TagFilter::builder()
        .key(&args.tag_key)
        .values(&args.tag_value)
        .build();

    // A failing query must surface before any statistics are computed; an
    // empty result is a valid zero-count report.
    let mut arns = Vec::new();
    let mut mappings = client
        .get_resources()
        .tag_filters(filter)
        .into_paginator()
        .items()
        .send();
    while let Some(entry) = mappings.next().await {
        let mapping = entry.context("querying tagged resources failed")?;
        if let Some(arn) = mapping.resource_arn() {
            arns.push(arn.to_string());
        }
    }

    if arns.is_empty() {
        info!(
            "no resources carrying {}={} found in {region}",
            args.tag_key, args.tag_value
        );
    }

    let now = Utc::now();
    let report = Report::new(
        &region,
        &args.tag_key,
        &args.tag_value,
        &arns,
        args.detailed,
        now,
    );

    let rendered = match args.format {
        OutputFormat::Table => render_table(&report),
        OutputFormat::Json => serde_json::to_string_pretty(&report)?,
        OutputFormat::Csv => render_csv(&report),
    };

    match args.output {
        Some(dir) => {
            let path = dir.join(export_file_name(&region, args.format, now));
            std::fs::write(&path, rendered)
                .with_context(|| format!("writing report to {}", path.display()))?;
            println!("wrote {}", path.display());
        }
        None => print!("{rendered}"),
    }

    Ok(())
}
