//! Conversion of a scan report to SARIF 2.1.0.

use engine::{Finding, ScanReport, Severity};
use serde_sarif::sarif;

use crate::order_findings;

fn level(severity: Severity) -> sarif::ResultLevel {
    match severity {
        Severity::Info => sarif::ResultLevel::Note,
        Severity::Warning => sarif::ResultLevel::Warning,
        Severity::Error => sarif::ResultLevel::Error,
    }
}

fn result(f: &Finding) -> sarif::Result {
    let location = sarif::Location::builder()
        .physical_location(
            sarif::PhysicalLocation::builder()
                .artifact_location(
                    sarif::ArtifactLocation::builder()
                        .uri(f.file.display().to_string().replace('\\', "/"))
                        .build(),
                )
                .region(
                    sarif::Region::builder()
                        .start_line(f.line as i64)
                        .start_column(f.column as i64)
                        .end_line(f.end_line as i64)
                        .end_column(f.end_column as i64)
                        .build(),
                )
                .build(),
        )
        .build();

    sarif::Result::builder()
        .rule_id(f.rule_id.clone())
        .message(sarif::Message::builder().text(f.message.clone()).build())
        .level(level(f.severity))
        .locations(vec![location])
        .build()
}

pub(crate) fn to_sarif(report: &ScanReport) -> sarif::Sarif {
    let ordered = order_findings(&report.findings);
    let mut rule_ids: Vec<&str> = ordered.iter().map(|f| f.rule_id.as_str()).collect();
    rule_ids.sort_unstable();
    rule_ids.dedup();
    let rules: Vec<sarif::ReportingDescriptor> = rule_ids
        .into_iter()
        .map(|id| sarif::ReportingDescriptor::builder().id(id).build())
        .collect();

    let results: Vec<sarif::Result> = ordered.into_iter().map(result).collect();

    sarif::Sarif::builder()
        .version(serde_json::json!("2.1.0"))
        .schema(sarif::SCHEMA_URL.to_string())
        .runs(vec![sarif::Run::builder()
            .tool(
                sarif::Tool::builder()
                    .driver(
                        sarif::ToolComponent::builder()
                            .name("sastgate")
                            .version(env!("CARGO_PKG_VERSION"))
                            .rules(rules)
                            .build(),
                    )
                    .build(),
            )
            .results(results)
            .build()])
        .build()
}
