use std::collections::BTreeMap;

use auto_tagger::{
    aggregate, summarize, RegionReport, Request, Response, RunConfig, RunCounters, TagOutcome,
    TargetTag,
};
use lambda_runtime::{Context, LambdaEvent};
use serde_json::json;

// AWS SDK clients cannot be mocked directly, so these tests exercise the
// payload contract and the pure aggregation seams the engine reports through.

#[tokio::test]
async fn test_lambda_event_parsing() {
    let event_json = json!({
        "dry_run": true,
        "regions": ["us-east-1", "us-west-2"],
        "services": ["ec2", "s3", "lambda"]
    });

    let context = Context::default();
    let event = LambdaEvent {
        payload: serde_json::from_value::<Request>(event_json).unwrap(),
        context,
    };

    assert_eq!(event.payload.dry_run, Some(true));
    assert_eq!(
        event.payload.regions,
        Some(vec!["us-east-1".to_string(), "us-west-2".to_string()])
    );
    assert_eq!(event.payload.tag_key, None);
}

#[test]
fn test_empty_payload_uses_all_defaults() {
    let request: Request = serde_json::from_str("{}").unwrap();
    assert_eq!(request.dry_run, None);
    assert_eq!(request.regions, None);
    assert_eq!(request.services, None);

    // Resolve against an empty environment so the host's exports can't leak in.
    let config = RunConfig::resolve_with(&request, |_| None);
    assert_eq!(config.tag.key, "aws-apn-id");
    assert!(!config.dry_run);
    assert_eq!(config.regions, vec!["us-east-1".to_string()]);
}

#[test]
fn test_response_json_structure() {
    let config = RunConfig {
        regions: vec!["us-east-1".to_string()],
        tag: TargetTag::default(),
        dry_run: true,
        services: None,
    };

    let mut resources = BTreeMap::new();
    resources.insert(
        "ec2".to_string(),
        vec!["ec2-instance:i-0abc".to_string()],
    );
    let reports = vec![RegionReport {
        region: "us-east-1".to_string(),
        error: None,
        resources,
        statistics: RunCounters {
            total: 1,
            tagged: 0,
            failed: 0,
        },
    }];

    let response = summarize(&config, reports);
    let value = serde_json::to_value(&response).unwrap();

    assert_eq!(value["message"], "AWS PRM tagging completed");
    assert_eq!(value["dry_run"], true);
    assert_eq!(value["regions_processed"], 1);
    assert_eq!(value["total_statistics"]["total"], 1);
    assert_eq!(value["total_statistics"]["tagged"], 0);
    assert_eq!(
        value["region_details"][0]["resources"]["ec2"][0],
        "ec2-instance:i-0abc"
    );
    // A clean region carries no error field.
    assert!(value["region_details"][0].get("error").is_none());
}

#[test]
fn test_failed_region_report_serialization() {
    let report = RegionReport {
        region: "eu-central-1".to_string(),
        error: Some("credentials expired".to_string()),
        resources: BTreeMap::new(),
        statistics: RunCounters::failed_region(),
    };

    let value = serde_json::to_value(&report).unwrap();
    assert_eq!(value["error"], "credentials expired");
    assert_eq!(value["statistics"]["total"], 0);
    assert_eq!(value["statistics"]["failed"], 1);
}

#[test]
fn test_dry_run_counters_stay_clean() {
    // Every discovered resource still counts toward total in a dry run.
    let mut counters = RunCounters::default();
    for _ in 0..7 {
        counters.record(TagOutcome::WouldTag);
    }

    assert_eq!(counters.total, 7);
    assert_eq!(counters.tagged, 0);
    assert_eq!(counters.failed, 0);
}

#[test]
fn test_region_failure_isolation_end_to_end() {
    let healthy = RegionReport {
        region: "us-west-2".to_string(),
        error: None,
        resources: BTreeMap::new(),
        statistics: RunCounters {
            total: 8,
            tagged: 7,
            failed: 1,
        },
    };
    let broken = RegionReport {
        region: "us-east-1".to_string(),
        error: Some("connect timeout".to_string()),
        resources: BTreeMap::new(),
        statistics: RunCounters::failed_region(),
    };

    let (total, failed_regions) = aggregate(&[broken, healthy]);
    assert_eq!(failed_regions, vec!["us-east-1".to_string()]);
    assert_eq!(total.total, 8);
    assert_eq!(total.tagged, 7);
    assert_eq!(total.failed, 2);
}

#[test]
fn test_response_round_trip() {
    let response = Response {
        message: "AWS PRM tagging completed".to_string(),
        timestamp: "2025-01-06T12:00:00+00:00".to_string(),
        dry_run: false,
        regions_processed: 1,
        failed_regions: Vec::new(),
        total_statistics: RunCounters {
            total: 3,
            tagged: 3,
            failed: 0,
        },
        region_details: Vec::new(),
    };

    let json = serde_json::to_string(&response).unwrap();
    let parsed: Response = serde_json::from_str(&json).unwrap();
    assert_eq!(parsed, response);
}
