use parley_agent::templates::ReplyTemplates;
use parley_core::config::{AppConfig, LoadOptions};
use serde::Serialize;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
enum CheckStatus {
    Pass,
    Fail,
    Skipped,
}

#[derive(Debug, Serialize)]
struct DoctorCheck {
    name: &'static str,
    status: CheckStatus,
    details: String,
}

#[derive(Debug, Serialize)]
struct DoctorReport {
    overall_status: CheckStatus,
    summary: String,
    checks: Vec<DoctorCheck>,
}

pub fn run(json_output: bool) -> String {
    let report = build_report();

    if json_output {
        return serde_json::to_string_pretty(&report).unwrap_or_else(|error| {
            format!(
                "{{\"overall_status\":\"fail\",\"summary\":\"doctor serialization failed\",\"error\":\"{}\"}}",
                escape_json(&error.to_string())
            )
        });
    }

    render_human(&report)
}

fn build_report() -> DoctorReport {
    let mut checks = Vec::new();

    match AppConfig::load(LoadOptions::default()) {
        Ok(config) => {
            checks.push(DoctorCheck {
                name: "config_validation",
                status: CheckStatus::Pass,
                details: "configuration loaded and validated".to_string(),
            });
            checks.push(check_reply_templates());
            checks.push(check_endpoints(&config));
        }
        Err(error) => {
            checks.push(DoctorCheck {
                name: "config_validation",
                status: CheckStatus::Fail,
                details: error.to_string(),
            });
            checks.push(check_reply_templates());
            checks.push(DoctorCheck {
                name: "endpoint_configuration",
                status: CheckStatus::Skipped,
                details: "skipped because configuration did not load".to_string(),
            });
        }
    }

    let all_pass = checks.iter().all(|check| check.status == CheckStatus::Pass);
    let overall_status = if all_pass { CheckStatus::Pass } else { CheckStatus::Fail };
    let summary = if all_pass {
        "doctor: all readiness checks passed".to_string()
    } else {
        "doctor: one or more readiness checks failed".to_string()
    };

    DoctorReport { overall_status, summary, checks }
}

fn check_reply_templates() -> DoctorCheck {
    let rendered = ReplyTemplates::new()
        .and_then(|templates| templates.weather_report("Paris", "clear sky", 18.0, "°C"));

    match rendered {
        Ok(sample) => DoctorCheck {
            name: "reply_templates",
            status: CheckStatus::Pass,
            details: format!("sample render: {sample}"),
        },
        Err(error) => DoctorCheck {
            name: "reply_templates",
            status: CheckStatus::Fail,
            details: format!("reply templates failed: {error}"),
        },
    }
}

// No network traffic here; reachability is exercised by `parley ask`.
fn check_endpoints(config: &AppConfig) -> DoctorCheck {
    let joke_auth = if config.joke.api_key.is_some() { "bearer" } else { "none" };
    DoctorCheck {
        name: "endpoint_configuration",
        status: CheckStatus::Pass,
        details: format!(
            "classifier `{}`, weather `{}` ({} units), joke `{}` (auth: {joke_auth}), timeout {}ms",
            config.classifier.base_url,
            config.weather.base_url,
            config.weather.units.as_query(),
            config.joke.base_url,
            config.http.timeout_ms,
        ),
    }
}

fn render_human(report: &DoctorReport) -> String {
    let mut lines = Vec::new();
    lines.push(report.summary.clone());

    for check in &report.checks {
        let marker = match check.status {
            CheckStatus::Pass => "ok",
            CheckStatus::Fail => "fail",
            CheckStatus::Skipped => "skip",
        };
        lines.push(format!("- [{marker}] {}: {}", check.name, check.details));
    }

    lines.join("\n")
}

fn escape_json(value: &str) -> String {
    value.replace('\\', "\\\\").replace('"', "\\\"")
}
