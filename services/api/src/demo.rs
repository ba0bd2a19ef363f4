use crate::infra::{InMemoryDirectory, InMemoryKpiRepository};
use chrono::Utc;
use clap::Args;
use prabhav_kpi::config::{DirectoryConfig, KpiConfig};
use prabhav_kpi::error::AppError;
use prabhav_kpi::kpi::scoring::round_score;
use prabhav_kpi::kpi::{
    score_breakdown, KpiServiceError, KpiSubmissionReceipt, KpiSubmissionRequest,
    KpiSubmissionService, ParameterSetImporter, Period, ScoreBreakdown,
};
use serde_json::json;
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Args, Debug)]
pub(crate) struct ScoreArgs {
    /// Parameter file: `.csv` rows of `name,v1,v2,...` or a JSON object of arrays
    pub(crate) path: PathBuf,
    /// Print per-parameter intermediate values
    #[arg(long)]
    pub(crate) breakdown: bool,
    /// Emit the result as JSON instead of text
    #[arg(long)]
    pub(crate) json: bool,
}

#[derive(Args, Debug)]
pub(crate) struct DemoArgs {
    /// Reporting period (YYYY-MM). Defaults to the current month.
    #[arg(long, value_parser = parse_period)]
    pub(crate) period: Option<Period>,
    /// Field worker identifier used for the sample submissions
    #[arg(long, default_value = "fw-demo")]
    pub(crate) user: String,
    /// Project identifier used for the sample submissions
    #[arg(long, default_value = "demo-project")]
    pub(crate) project: String,
}

fn parse_period(raw: &str) -> Result<Period, String> {
    raw.parse::<Period>().map_err(|err| err.to_string())
}

pub(crate) fn run_score(args: ScoreArgs) -> Result<(), AppError> {
    let parameters = ParameterSetImporter::from_path(&args.path)?;
    let breakdown = score_breakdown(&parameters)?;

    if args.json {
        let rendered = if args.breakdown {
            serde_json::to_string_pretty(&breakdown)
        } else {
            serde_json::to_string_pretty(&json!({
                "vasa_score": round_score(breakdown.score),
                "processed_parameters": breakdown.parameters.len(),
            }))
        }
        .map_err(std::io::Error::from)?;
        println!("{rendered}");
        return Ok(());
    }

    println!("Source: {}", args.path.display());
    println!(
        "VASA score: {:.2} ({} parameters)",
        breakdown.score,
        breakdown.parameters.len()
    );
    if args.breakdown {
        render_breakdown(&breakdown);
    }

    Ok(())
}

fn render_breakdown(breakdown: &ScoreBreakdown) {
    println!("\nParameter breakdown");
    for parameter in &breakdown.parameters {
        println!(
            "- {}: mean {:.3}, variance {:.3}, |z| mean {:.3}, raw {:.6}, normalized {:.3}, weight {:.3}",
            parameter.name,
            parameter.mean,
            parameter.variance,
            parameter.abs_z_mean,
            parameter.raw_score,
            parameter.normalized,
            parameter.weight
        );
    }
    println!("Entropy (diagnostic, not applied): {:.4}", breakdown.entropy);
}

pub(crate) fn run_demo(args: DemoArgs) -> Result<(), AppError> {
    let DemoArgs {
        period,
        user,
        project,
    } = args;

    let period = period.unwrap_or_else(|| Period::containing(Utc::now().date_naive()));

    let repository = Arc::new(InMemoryKpiRepository::default());
    let directory = Arc::new(InMemoryDirectory::from_config(&DirectoryConfig {
        known_users: Some(vec![user.clone()]),
        known_projects: Some(vec![project.clone()]),
    }));
    let service = KpiSubmissionService::new(
        repository,
        directory,
        KpiConfig {
            required_parameter_count: Some(5),
        },
    );

    println!("KPI submission demo");
    println!("Worker {user}, project {project}, period {period}");

    let first = KpiSubmissionRequest {
        user_id: Some(user.clone()),
        period: Some(period.to_string()),
        project_id: Some(project.clone()),
        kpi_data: Some(json!({
            "file_disposal_rate": [75, 78, 76, 74, 77],
            "survey_accuracy": [15, 12, 10, 18, 13],
            "site_visits": [88, 90, 85, 91, 87],
            "reports_filed": [3, 4, 2, 5, 3],
            "evidence_uploads": [60, 62, 61, 59, 63],
        })),
    };
    print_outcome("Initial submission", service.submit(first.clone()));

    let resubmission = KpiSubmissionRequest {
        kpi_data: Some(json!({
            "file_disposal_rate": [80, 81, 80, 79, 80],
            "survey_accuracy": [14, 14, 15, 14, 13],
            "site_visits": [70, 95, 60, 99, 75],
            "reports_filed": [4, 4, 4, 4, 4],
            "evidence_uploads": [61, 62, 61, 60, 61],
        })),
        ..first.clone()
    };
    print_outcome("Resubmission", service.submit(resubmission));

    let incomplete = KpiSubmissionRequest {
        kpi_data: Some(json!({
            "file_disposal_rate": [80, 81, 80, 79, 80],
            "survey_accuracy": [14],
        })),
        ..first
    };
    print_outcome("Incomplete submission", service.submit(incomplete));

    Ok(())
}

fn print_outcome(label: &str, outcome: Result<KpiSubmissionReceipt, KpiServiceError>) {
    match outcome {
        Ok(receipt) => {
            let action = if receipt.created { "created" } else { "replaced" };
            println!(
                "\n{label}: record {action}, VASA score {:.2} from {} parameters",
                receipt.vasa_score, receipt.processed_parameters
            );
            for item in &receipt.kpi.kpis {
                println!("- {}: {:?}", item.kpi_code, item.computed_values);
            }
        }
        Err(err) => println!("\n{label}: rejected ({err}); stored record left unchanged"),
    }
}
