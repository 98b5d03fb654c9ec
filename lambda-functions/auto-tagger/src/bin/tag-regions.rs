//! Sequential multi-region runner for operators who want the tagging pass
//! outside Lambda, with an optional inter-region delay to stay clear of API
//! throttling.

use std::time::Duration;

use anyhow::Result;
use auto_tagger::{process_region, summarize, Request, RunConfig};
use clap::Parser;
use tracing::{info, warn};

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "Apply the partner attribution tag across one or more AWS regions"
)]
struct Args {
    /// Region to process; repeat for multiple regions, in order.
    /// Falls back to TARGET_REGIONS, then AWS_REGION.
    #[arg(long = "region", value_name = "REGION")]
    regions: Vec<String>,

    /// Discover and log resources without writing any tags.
    #[arg(long)]
    dry_run: bool,

    /// Override the tag key (default: aws-apn-id, or TAG_KEY).
    #[arg(long)]
    tag_key: Option<String>,

    /// Override the tag value (default from TAG_VALUE).
    #[arg(long)]
    tag_value: Option<String>,

    /// Limit the run to specific service groups (e.g. ec2, s3, lambda).
    #[arg(long = "service", value_name = "NAME")]
    services: Vec<String>,

    /// Seconds to wait between regions.
    #[arg(long, default_value_t = 0)]
    region_delay: u64,
}

/// An omitted flag or option stays `None` so `RunConfig::resolve` can fall
/// back to the environment; a bare bool from clap would otherwise turn an
/// absent `--dry-run` into an explicit `false` and defeat a `DRY_RUN=true`
/// safety net.
fn request_from(args: &Args) -> Request {
    Request {
        dry_run: args.dry_run.then_some(true),
        regions: (!args.regions.is_empty()).then(|| args.regions.clone()),
        services: (!args.services.is_empty()).then(|| args.services.clone()),
        tag_key: args.tag_key.clone(),
        tag_value: args.tag_value.clone(),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let args = Args::parse();
    let request = request_from(&args);
    let config = RunConfig::resolve(&request);

    info!(
        "processing regions {:?} with tag {}={} (dry run: {})",
        config.regions, config.tag.key, config.tag.value, config.dry_run
    );

    let mut reports = Vec::new();
    for (index, region) in config.regions.iter().enumerate() {
        if index > 0 && args.region_delay > 0 {
            info!("waiting {}s before next region", args.region_delay);
            tokio::time::sleep(Duration::from_secs(args.region_delay)).await;
        }
        reports.push(process_region(region.clone(), &config).await);
    }

    let response = summarize(&config, reports);
    println!("{}", serde_json::to_string_pretty(&response)?);

    if !response.failed_regions.is_empty() {
        warn!("regions failed: {:?}", response.failed_regions);
        std::process::exit(1);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn omitted_dry_run_flag_stays_unset() {
        let args = Args::parse_from(["tag-regions"]);
        let request = request_from(&args);
        assert_eq!(request.dry_run, None);
        assert_eq!(request.regions, None);
        assert_eq!(request.services, None);
    }

    #[test]
    fn explicit_dry_run_flag_is_forwarded() {
        let args = Args::parse_from(["tag-regions", "--dry-run", "--region", "us-east-1"]);
        let request = request_from(&args);
        assert_eq!(request.dry_run, Some(true));
        assert_eq!(request.regions, Some(vec!["us-east-1".to_string()]));
    }
}
