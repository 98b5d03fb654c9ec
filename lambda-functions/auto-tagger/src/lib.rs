use std::collections::BTreeMap;

use chrono::Utc;
use futures::{stream, StreamExt};
use serde::{Deserialize, Serialize};
use tracing::{error, info};

pub mod arn;
pub mod counters;
pub mod registry;
pub mod tag;
pub mod tagger;

pub use counters::{RunCounters, TagOutcome};
pub use registry::ServiceGroup;
pub use tag::{TagPolicy, TargetTag, DEFAULT_TAG_KEY, DEFAULT_TAG_VALUE};
pub use tagger::{resolve_bucket_location, ResourceTagger, DEFAULT_BUCKET_REGION};

/// Upper bound on regions processed at once (the original worker pool size).
pub const MAX_CONCURRENT_REGIONS: usize = 5;

/// Event payload. Every field is optional; absent fields fall back to the
/// `TAG_KEY`, `TAG_VALUE`, `DRY_RUN`, and `TARGET_REGIONS` environment
/// variables, then to built-in defaults.
#[derive(Deserialize, Debug, Clone, Default)]
pub struct Request {
    pub dry_run: Option<bool>,
    pub regions: Option<Vec<String>>,
    pub services: Option<Vec<String>>,
    pub tag_key: Option<String>,
    pub tag_value: Option<String>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Response {
    pub message: String,
    pub timestamp: String,
    pub dry_run: bool,
    pub regions_processed: usize,
    pub failed_regions: Vec<String>,
    pub total_statistics: RunCounters,
    pub region_details: Vec<RegionReport>,
}

/// Result of one regional pass. `error` is set only when the pass could not
/// start at all (credentials, connectivity); per-resource failures live in
/// `statistics.failed`.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct RegionReport {
    pub region: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub resources: BTreeMap<String, Vec<String>>,
    pub statistics: RunCounters,
}

/// Fully-resolved configuration for one run.
#[derive(Debug, Clone, PartialEq)]
pub struct RunConfig {
    pub regions: Vec<String>,
    pub tag: TargetTag,
    pub dry_run: bool,
    pub services: Option<Vec<String>>,
}

impl RunConfig {
    /// Resolution order: event payload, then environment, then defaults.
    pub fn resolve(request: &Request) -> Self {
        Self::resolve_with(request, |key| std::env::var(key).ok())
    }

    /// Resolution with an explicit variable lookup, so the fallback chain can
    /// be exercised without touching process-wide environment state.
    pub fn resolve_with(request: &Request, lookup: impl Fn(&str) -> Option<String>) -> Self {
        let tag = TargetTag::new(
            request
                .tag_key
                .clone()
                .or_else(|| lookup("TAG_KEY"))
                .unwrap_or_else(|| DEFAULT_TAG_KEY.to_string()),
            request
                .tag_value
                .clone()
                .or_else(|| lookup("TAG_VALUE"))
                .unwrap_or_else(|| DEFAULT_TAG_VALUE.to_string()),
        );

        let dry_run = request.dry_run.unwrap_or_else(|| {
            lookup("DRY_RUN")
                .map(|v| v.to_lowercase() == "true")
                .unwrap_or(false)
        });

        let regions = request
            .regions
            .clone()
            .filter(|r| !r.is_empty())
            .or_else(|| {
                lookup("TARGET_REGIONS").map(|raw| {
                    raw.split(',')
                        .map(str::trim)
                        .filter(|r| !r.is_empty())
                        .map(str::to_string)
                        .collect()
                })
            })
            .filter(|r: &Vec<String>| !r.is_empty())
            .unwrap_or_else(|| {
                vec![lookup("AWS_REGION").unwrap_or_else(|| "us-east-1".to_string())]
            });

        Self {
            regions,
            tag,
            dry_run,
            services: request.services.clone(),
        }
    }
}

/// Run one regional pass. A pass that cannot start is reported as a failed
/// region; it never takes the other regions down with it.
pub async fn process_region(region: String, config: &RunConfig) -> RegionReport {
    info!("starting tagging pass for region {region}");

    match ResourceTagger::new(
        &region,
        config.tag.clone(),
        TagPolicy::from_env(),
        config.dry_run,
    )
    .await
    {
        Ok(mut tagger) => {
            let resources = tagger.tag_all_resources(config.services.as_deref()).await;
            let statistics = tagger.counters();
            info!(
                "completed region {region}: total={} tagged={} failed={}",
                statistics.total, statistics.tagged, statistics.failed
            );
            RegionReport {
                region,
                error: None,
                resources,
                statistics,
            }
        }
        Err(e) => {
            error!("failed to process region {region}: {e}");
            RegionReport {
                region,
                error: Some(e.to_string()),
                resources: BTreeMap::new(),
                statistics: RunCounters::failed_region(),
            }
        }
    }
}

/// Merge per-region counters and collect the names of regions that failed
/// outright.
pub fn aggregate(reports: &[RegionReport]) -> (RunCounters, Vec<String>) {
    let mut total = RunCounters::default();
    let mut failed_regions = Vec::new();
    for report in reports {
        total.absorb(report.statistics);
        if report.error.is_some() {
            failed_regions.push(report.region.clone());
        }
    }
    (total, failed_regions)
}

pub fn summarize(config: &RunConfig, reports: Vec<RegionReport>) -> Response {
    let (total_statistics, failed_regions) = aggregate(&reports);
    Response {
        message: "AWS PRM tagging completed".to_string(),
        timestamp: Utc::now().to_rfc3339(),
        dry_run: config.dry_run,
        regions_processed: reports.len(),
        failed_regions,
        total_statistics,
        region_details: reports,
    }
}

/// Process every configured region with bounded parallelism and aggregate
/// the counters.
pub async fn run(config: &RunConfig) -> Response {
    info!(
        "processing regions {:?} with tag {}={} (dry run: {})",
        config.regions, config.tag.key, config.tag.value, config.dry_run
    );

    let reports: Vec<RegionReport> = stream::iter(config.regions.clone())
        .map(|region| process_region(region, config))
        .buffer_unordered(MAX_CONCURRENT_REGIONS)
        .collect()
        .await;

    let response = summarize(config, reports);
    info!(
        "final statistics: total={} tagged={} failed={}",
        response.total_statistics.total,
        response.total_statistics.tagged,
        response.total_statistics.failed
    );
    response
}
