use chrono::{TimeZone, Utc};
use tag_report::{group_by_service, render_csv, render_table, Report};

fn fixed_time() -> chrono::DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 1, 6, 12, 0, 0).unwrap()
}

#[test]
fn test_grouped_report_orders_by_count() {
    // Two services with counts {dynamodb: 3, lambda: 5}: lambda must come
    // first and the total must equal 8.
    let mut arns = Vec::new();
    for i in 0..3 {
        arns.push(format!("arn:aws:dynamodb:us-east-1:123456789012:table/t{i}"));
    }
    for i in 0..5 {
        arns.push(format!("arn:aws:lambda:us-east-1:123456789012:function:f{i}"));
    }

    let report = Report::new("us-east-1", "aws-apn-id", "pc:test", &arns, false, fixed_time());

    assert_eq!(report.total, 8);
    assert_eq!(report.services[0].service, "lambda");
    assert_eq!(report.services[0].count, 5);
    assert_eq!(report.services[1].service, "dynamodb");
    assert_eq!(report.services[1].count, 3);
}

#[test]
fn test_table_rendering() {
    let arns = vec![
        "arn:aws:s3:::bucket-one".to_string(),
        "arn:aws:s3:::bucket-two".to_string(),
        "arn:aws:sns:us-east-1:123456789012:topic".to_string(),
    ];
    let report = Report::new("us-east-1", "aws-apn-id", "pc:test", &arns, false, fixed_time());
    let table = render_table(&report);

    assert!(table.contains("SERVICE"));
    assert!(table.contains("s3"));
    assert!(table.contains("sns"));
    assert!(table.contains("TOTAL"));

    // s3 (count 2) is listed before sns (count 1).
    assert!(table.find("s3").unwrap() < table.find("sns").unwrap());
}

#[test]
fn test_detailed_table_lists_arns() {
    let arns = vec!["arn:aws:s3:::bucket-one".to_string()];
    let report = Report::new("us-east-1", "aws-apn-id", "pc:test", &arns, true, fixed_time());
    let table = render_table(&report);
    assert!(table.contains("    arn:aws:s3:::bucket-one"));
}

#[test]
fn test_json_export_shape() {
    let arns = vec!["arn:aws:lambda:us-east-1:123456789012:function:f".to_string()];
    let report = Report::new("us-east-1", "aws-apn-id", "pc:test", &arns, false, fixed_time());

    let value = serde_json::to_value(&report).unwrap();
    assert_eq!(value["region"], "us-east-1");
    assert_eq!(value["tag_key"], "aws-apn-id");
    assert_eq!(value["total"], 1);
    assert_eq!(value["services"][0]["service"], "lambda");
    assert_eq!(value["services"][0]["count"], 1);
    // Summary reports omit the ARN lists entirely.
    assert!(value["services"][0].get("arns").is_none());
}

#[test]
fn test_csv_export_shape() {
    let arns = vec![
        "arn:aws:lambda:us-east-1:123456789012:function:f".to_string(),
        "arn:aws:lambda:us-east-1:123456789012:function:g".to_string(),
    ];
    let report = Report::new("us-east-1", "aws-apn-id", "pc:test", &arns, false, fixed_time());
    assert_eq!(render_csv(&report), "service,count\nlambda,2\n");
}

#[test]
fn test_unknown_arn_shapes_are_grouped_not_dropped() {
    let arns = vec![
        "garbage".to_string(),
        "arn:aws:ec2:us-east-1:123456789012:instance/i-1".to_string(),
    ];
    let grouped = group_by_service(&arns, false);
    let total: usize = grouped.iter().map(|e| e.count).sum();
    assert_eq!(total, 2);
    assert!(grouped.iter().any(|e| e.service == "unknown"));
}
