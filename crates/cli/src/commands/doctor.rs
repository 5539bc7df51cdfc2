use panier_core::catalog::{Catalog, POPULAR_KEYS};
use panier_core::config::{AppConfig, LoadOptions};
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
            checks.push(check_api_key(&config));
        }
        Err(error) => {
            checks.push(DoctorCheck {
                name: "config_validation",
                status: CheckStatus::Fail,
                details: error.to_string(),
            });
            checks.push(DoctorCheck {
                name: "api_key_readiness",
                status: CheckStatus::Skipped,
                details: "skipped because configuration did not load".to_string(),
            });
        }
    }
    checks.push(check_catalog());

    let all_pass = checks.iter().all(|check| check.status == CheckStatus::Pass);
    let overall_status = if all_pass { CheckStatus::Pass } else { CheckStatus::Fail };
    let summary = if all_pass {
        "doctor: all readiness checks passed".to_string()
    } else {
        "doctor: one or more readiness checks failed".to_string()
    };

    DoctorReport { overall_status, summary, checks }
}

fn check_api_key(config: &AppConfig) -> DoctorCheck {
    match config.llm.require_api_key() {
        Ok(_) => DoctorCheck {
            name: "api_key_readiness",
            status: CheckStatus::Pass,
            details: format!("api key present for model `{}`", config.llm.model),
        },
        Err(error) => DoctorCheck {
            name: "api_key_readiness",
            status: CheckStatus::Fail,
            details: error.to_string(),
        },
    }
}

fn check_catalog() -> DoctorCheck {
    let catalog = Catalog::seed();

    if catalog.is_empty() {
        return DoctorCheck {
            name: "catalog_integrity",
            status: CheckStatus::Fail,
            details: "seed catalog is empty".to_string(),
        };
    }

    let missing: Vec<&str> = POPULAR_KEYS
        .iter()
        .copied()
        .filter(|key| catalog.details(key).is_none())
        .collect();

    if !missing.is_empty() {
        return DoctorCheck {
            name: "catalog_integrity",
            status: CheckStatus::Fail,
            details: format!("popular products missing from the catalog: {}", missing.join(", ")),
        };
    }

    DoctorCheck {
        name: "catalog_integrity",
        status: CheckStatus::Pass,
        details: format!("{} products seeded, popular list resolves", catalog.len()),
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
