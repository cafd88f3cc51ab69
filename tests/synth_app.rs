use cfnsynth::app::{build_stack, open_writer, template_file_name};
use cfnsynth::config::AppConfig;
use serde_json::{json, Value};
use std::fs;

const APP: &str = r#"
[stack]
name = "Security"
description = "audit trail and alert routing"

[output]
format = { type = "json", pretty = false }

[[trail]]
id = "Trail"
s3_key_prefix = "org"
send_to_cloud_watch_logs = true
cloud_watch_logs_retention = "one_month"
log_all_s3_data_events = true

[[trail.lambda_selector]]
function_arns = ["arn:aws:lambda:us-east-1:123456789012:function:a"]

[[trail.lambda_selector]]
function_arns = ["arn:aws:lambda:us-east-1:123456789012:function:b"]
include_management_events = false

[[event_bus]]
id = "Alerts"

[[event_bus.archive]]
id = "Archive"
retention_days = 14
event_pattern = { source = ["aws.guardduty"] }

[[rule]]
id = "Findings"
event_bus = "Alerts"
event_pattern = { source = ["aws.guardduty"], detail = { severity = [8] } }

[[rule.target]]
type = "arn"
arn = "arn:aws:sns:us-east-1:123456789012:alerts"
input = { type = "event_path", path = "$.detail" }

[[lifecycle_policy]]
id = "Snapshots"
properties = { State = "ENABLED", PolicyDetails = { ResourceTypes = ["VOLUME"], Schedules = [{ Name = "Daily", CreateRule = { Interval = 24, IntervalUnit = "HOURS" }, RetainRule = { Count = 7 } }] } }
"#;

fn load(dir: &std::path::Path) -> AppConfig {
    let path = dir.join("app.toml");
    fs::write(&path, APP).expect("write config");
    let mut config = AppConfig::from_path(&path).expect("config");
    config.output.dir = dir.join("out").to_string_lossy().to_string();
    config
}

fn count(template: &Value, resource_type: &str) -> usize {
    template["Resources"]
        .as_object()
        .expect("resources")
        .values()
        .filter(|node| node["Type"] == json!(resource_type))
        .count()
}

#[test]
fn config_to_template_file() {
    let dir = tempfile::tempdir().expect("tempdir");
    let config = load(dir.path());

    let stack = build_stack(&config).expect("stack");
    let template = stack.synthesize().expect("template");
    let mut writer = open_writer(&config.output).expect("writer");
    writer
        .write_template(stack.name(), &template)
        .expect("write");
    writer.close().expect("close");

    let path = dir
        .path()
        .join("out")
        .join(template_file_name(&config.output, stack.name()));
    assert!(path.ends_with("Security.template.json"));
    let text = fs::read_to_string(&path).expect("read template");
    assert_eq!(text.lines().count(), 1);
    let written: Value = serde_json::from_str(&text).expect("json");

    assert_eq!(written["AWSTemplateFormatVersion"], json!("2010-09-09"));
    assert_eq!(written["Description"], json!("audit trail and alert routing"));
    assert_eq!(count(&written, "AWS::CloudTrail::Trail"), 1);
    assert_eq!(count(&written, "AWS::S3::Bucket"), 1);
    assert_eq!(count(&written, "AWS::S3::BucketPolicy"), 1);
    assert_eq!(count(&written, "AWS::Logs::LogGroup"), 1);
    assert_eq!(count(&written, "AWS::IAM::Role"), 1);
    assert_eq!(count(&written, "AWS::IAM::Policy"), 1);
    assert_eq!(count(&written, "AWS::Events::EventBus"), 1);
    assert_eq!(count(&written, "AWS::Events::Archive"), 1);
    assert_eq!(count(&written, "AWS::Events::Rule"), 1);
    assert_eq!(count(&written, "AWS::DLM::LifecyclePolicy"), 1);
    assert!(written["Outputs"]["TrailArn"].is_object());
    assert!(written["Outputs"]["AlertsArn"].is_object());
}

#[test]
fn trail_selectors_keep_call_order() {
    let dir = tempfile::tempdir().expect("tempdir");
    let config = load(dir.path());
    let template = build_stack(&config)
        .expect("stack")
        .synthesize()
        .expect("template");

    let (_, trail) = template
        .resources_of_type("AWS::CloudTrail::Trail")
        .next()
        .expect("trail");
    let selectors = trail.properties["EventSelectors"]
        .as_array()
        .expect("selectors");
    assert_eq!(selectors.len(), 3);
    assert_eq!(
        selectors[0]["DataResources"][0]["Values"][0],
        json!("arn:aws:lambda:us-east-1:123456789012:function:a")
    );
    assert_eq!(
        selectors[1]["DataResources"][0]["Values"][0],
        json!("arn:aws:lambda:us-east-1:123456789012:function:b")
    );
    assert_eq!(selectors[1]["IncludeManagementEvents"], json!(false));
    assert_eq!(selectors[2]["DataResources"][0]["Type"], json!("AWS::S3::Object"));

    let (_, group) = template
        .resources_of_type("AWS::Logs::LogGroup")
        .next()
        .expect("log group");
    assert_eq!(group.properties["RetentionInDays"], json!(30));
}

#[test]
fn rule_pattern_and_target_input() {
    let dir = tempfile::tempdir().expect("tempdir");
    let config = load(dir.path());
    let template = build_stack(&config)
        .expect("stack")
        .synthesize()
        .expect("template");

    let (_, rule) = template
        .resources_of_type("AWS::Events::Rule")
        .next()
        .expect("rule");
    assert_eq!(
        rule.properties["EventPattern"],
        json!({"source": ["aws.guardduty"], "detail": {"severity": [8]}})
    );
    assert_eq!(rule.properties["Targets"][0]["InputPath"], json!("$.detail"));
    assert_eq!(rule.properties["Targets"][0]["Id"], json!("Target0"));
}

#[test]
fn validation_errors_are_collected() {
    let config = AppConfig::from_toml(
        r#"
[stack]
name = "Broken"

[[rule]]
id = "Empty"
rule_name = "has spaces"

[[lifecycle_policy]]
id = "Policy"
properties = { Description = "bad: chars" }
"#,
    )
    .expect("config");
    let err = build_stack(&config)
        .expect("stack")
        .synthesize()
        .expect_err("invalid");
    assert_eq!(err.validation_errors().len(), 3);
}
