//! Read-only verification report over resources carrying the attribution tag.
//!
//! The query side is one paginated `GetResources` call; everything in here is
//! the reshaping: group ARNs by service, sort by count, and render as a
//! table, JSON, or CSV.

use std::collections::BTreeMap;
use std::fmt::Write as _;

use chrono::{DateTime, Utc};
use clap::ValueEnum;
use serde::Serialize;

/// Extract the service segment from an ARN
/// (`arn:partition:service:region:account:resource`).
pub fn service_of(arn: &str) -> Option<&str> {
    let mut parts = arn.split(':');
    if parts.next()? != "arn" {
        return None;
    }
    parts.next()?; // partition
    let service = parts.next()?;
    if service.is_empty() {
        None
    } else {
        Some(service)
    }
}

#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct ServiceBreakdown {
    pub service: String,
    pub count: usize,
    /// Per-resource ARNs; populated only for detailed reports.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub arns: Vec<String>,
}

/// Group ARNs by service, sorted by descending count (ties broken by name so
/// the output is stable).
pub fn group_by_service(arns: &[String], detailed: bool) -> Vec<ServiceBreakdown> {
    let mut buckets: BTreeMap<&str, Vec<String>> = BTreeMap::new();
    for arn in arns {
        let service = service_of(arn).unwrap_or("unknown");
        buckets.entry(service).or_default().push(arn.clone());
    }

    let mut breakdown: Vec<ServiceBreakdown> = buckets
        .into_iter()
        .map(|(service, list)| ServiceBreakdown {
            service: service.to_string(),
            count: list.len(),
            arns: if detailed { list } else { Vec::new() },
        })
        .collect();
    breakdown.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.service.cmp(&b.service)));
    breakdown
}

#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct Report {
    pub region: String,
    pub tag_key: String,
    pub tag_value: String,
    pub generated_at: String,
    pub total: usize,
    pub services: Vec<ServiceBreakdown>,
}

impl Report {
    pub fn new(
        region: impl Into<String>,
        tag_key: impl Into<String>,
        tag_value: impl Into<String>,
        arns: &[String],
        detailed: bool,
        generated_at: DateTime<Utc>,
    ) -> Self {
        Self {
            region: region.into(),
            tag_key: tag_key.into(),
            tag_value: tag_value.into(),
            generated_at: generated_at.to_rfc3339(),
            total: arns.len(),
            services: group_by_service(arns, detailed),
        }
    }
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Table,
    Json,
    Csv,
}

impl OutputFormat {
    pub fn extension(self) -> &'static str {
        match self {
            OutputFormat::Table => "txt",
            OutputFormat::Json => "json",
            OutputFormat::Csv => "csv",
        }
    }
}

pub fn render_table(report: &Report) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "Resources tagged {}={} in {}",
        report.tag_key, report.tag_value, report.region
    );
    let _ = writeln!(out, "{:<32} {:>7}", "SERVICE", "COUNT");
    for entry in &report.services {
        let _ = writeln!(out, "{:<32} {:>7}", entry.service, entry.count);
        for arn in &entry.arns {
            let _ = writeln!(out, "    {arn}");
        }
    }
    let _ = writeln!(out, "{:<32} {:>7}", "TOTAL", report.total);
    out
}

/// Summary rows (`service,count`), or one row per resource when the report
/// carries ARNs.
pub fn render_csv(report: &Report) -> String {
    let detailed = report.services.iter().any(|entry| !entry.arns.is_empty());
    let mut out = String::new();
    if detailed {
        out.push_str("service,arn\n");
        for entry in &report.services {
            for arn in &entry.arns {
                let _ = writeln!(out, "{},{}", entry.service, arn);
            }
        }
    } else {
        out.push_str("service,count\n");
        for entry in &report.services {
            let _ = writeln!(out, "{},{}", entry.service, entry.count);
        }
    }
    out
}

/// Export files carry the region and a timestamp so repeated runs never
/// overwrite each other.
pub fn export_file_name(region: &str, format: OutputFormat, at: DateTime<Utc>) -> String {
    format!(
        "tag-report-{}-{}.{}",
        region,
        at.format("%Y%m%d-%H%M%S"),
        format.extension()
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn arns(specs: &[(&str, usize)]) -> Vec<String> {
        let mut out = Vec::new();
        for (service, count) in specs {
            for i in 0..*count {
                out.push(format!(
                    "arn:aws:{service}:us-east-1:123456789012:resource/{i}"
                ));
            }
        }
        out
    }

    #[test]
    fn service_segment_parsing() {
        assert_eq!(
            service_of("arn:aws:lambda:us-east-1:123456789012:function:fn"),
            Some("lambda")
        );
        assert_eq!(service_of("arn:aws:s3:::my-bucket"), Some("s3"));
        assert_eq!(service_of("not-an-arn"), None);
        assert_eq!(service_of("arn:aws"), None);
    }

    #[test]
    fn grouping_sorts_by_descending_count() {
        let input = arns(&[("dynamodb", 3), ("lambda", 5)]);
        let grouped = group_by_service(&input, false);

        assert_eq!(grouped.len(), 2);
        assert_eq!(grouped[0].service, "lambda");
        assert_eq!(grouped[0].count, 5);
        assert_eq!(grouped[1].service, "dynamodb");
        assert_eq!(grouped[1].count, 3);
    }

    #[test]
    fn grouping_breaks_count_ties_by_name() {
        let input = arns(&[("sqs", 2), ("ec2", 2), ("sns", 2)]);
        let grouped = group_by_service(&input, false);
        let names: Vec<&str> = grouped.iter().map(|e| e.service.as_str()).collect();
        assert_eq!(names, vec!["ec2", "sns", "sqs"]);
    }

    #[test]
    fn report_totals_match_input() {
        let input = arns(&[("dynamodb", 3), ("lambda", 5)]);
        let report = Report::new(
            "us-east-1",
            "aws-apn-id",
            "pc:test",
            &input,
            false,
            Utc::now(),
        );
        assert_eq!(report.total, 8);
    }

    #[test]
    fn empty_query_is_a_valid_zero_report() {
        let report = Report::new("us-east-1", "aws-apn-id", "pc:test", &[], false, Utc::now());
        assert_eq!(report.total, 0);
        assert!(report.services.is_empty());

        let table = render_table(&report);
        assert!(table.contains("TOTAL"));
        assert!(table.contains("0"));
    }

    #[test]
    fn detailed_grouping_carries_arns() {
        let input = arns(&[("s3", 1)]);
        let grouped = group_by_service(&input, true);
        assert_eq!(grouped[0].arns.len(), 1);

        let summary = group_by_service(&input, false);
        assert!(summary[0].arns.is_empty());
    }

    #[test]
    fn csv_summary_and_detailed_shapes() {
        let input = arns(&[("lambda", 2), ("s3", 1)]);

        let summary = Report::new("us-east-1", "k", "v", &input, false, Utc::now());
        let csv = render_csv(&summary);
        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(lines[0], "service,count");
        assert_eq!(lines[1], "lambda,2");
        assert_eq!(lines[2], "s3,1");

        let detailed = Report::new("us-east-1", "k", "v", &input, true, Utc::now());
        let csv = render_csv(&detailed);
        assert!(csv.starts_with("service,arn\n"));
        assert_eq!(csv.lines().count(), 4);
    }

    #[test]
    fn export_file_name_embeds_region_and_timestamp() {
        let at = Utc.with_ymd_and_hms(2025, 1, 6, 12, 30, 45).unwrap();
        assert_eq!(
            export_file_name("us-east-1", OutputFormat::Json, at),
            "tag-report-us-east-1-20250106-123045.json"
        );
        assert_eq!(
            export_file_name("eu-west-1", OutputFormat::Csv, at),
            "tag-report-eu-west-1-20250106-123045.csv"
        );
    }
}
