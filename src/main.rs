use axum::extract::State;
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};
use axum_prometheus::PrometheusMetricLayer;
use chrono::{Duration, Local};
use clap::{Args, Parser, Subcommand};
use metrics_exporter_prometheus::PrometheusHandle;
use review_hub::config::AppConfig;
use review_hub::error::AppError;
use review_hub::review::{
    review_router, NewUser, Position, ReviewPatch, ReviewService, ReviewView, ReviewerGroup,
    Score, SheetWeight, UserRole,
};
use review_hub::telemetry;
use serde_json::json;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::info;

#[derive(Clone)]
struct AppState {
    readiness: Arc<AtomicBool>,
    metrics: PrometheusHandle,
}

#[derive(Parser, Debug)]
#[command(
    name = "Review Hub",
    about = "Run the performance-review backend or walk a demo review cycle",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Start the HTTP service (default command)
    Serve(ServeArgs),
    /// Seed a sample review cycle and print the computed results
    Demo {
        /// Also complete the review and show the sheet cascade
        #[arg(long)]
        complete: bool,
    },
}

#[derive(Args, Debug, Default)]
struct ServeArgs {
    /// Override the configured host for the HTTP server
    #[arg(long)]
    host: Option<String>,
    /// Override the configured port for the HTTP server
    #[arg(long)]
    port: Option<u16>,
}

#[tokio::main]
async fn main() {
    if let Err(err) = run_cli().await {
        eprintln!("application error: {err}");
        std::process::exit(1);
    }
}

async fn run_cli() -> Result<(), AppError> {
    let cli = Cli::parse();
    let command = cli
        .command
        .unwrap_or_else(|| Command::Serve(ServeArgs::default()));

    match command {
        Command::Serve(args) => run_server(args).await,
        Command::Demo { complete } => run_demo(complete),
    }
}

async fn run_server(mut args: ServeArgs) -> Result<(), AppError> {
    let mut config = AppConfig::load()?;

    if let Some(host) = args.host.take() {
        config.server.host = host;
    }
    if let Some(port) = args.port.take() {
        config.server.port = port;
    }

    telemetry::init(&config.telemetry)?;

    let (prometheus_layer, prometheus_handle) = PrometheusMetricLayer::pair();
    let readiness_flag = Arc::new(AtomicBool::new(false));
    let state = AppState {
        readiness: readiness_flag.clone(),
        metrics: prometheus_handle,
    };

    let service = Arc::new(ReviewService::new());

    let ops = Router::new()
        .route("/health", get(healthcheck))
        .route("/ready", get(readiness_endpoint))
        .route("/metrics", get(metrics_endpoint))
        .with_state(state);

    let app = review_router(service).merge(ops).layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(?config.environment, %addr, "review backend ready");

    axum::serve(listener, app).await?;
    Ok(())
}

async fn healthcheck() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

async fn readiness_endpoint(State(state): State<AppState>) -> impl IntoResponse {
    let ready = state.readiness.load(Ordering::Relaxed);
    let status = if ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    let payload = if ready {
        json!({ "status": "ready" })
    } else {
        json!({ "status": "initializing" })
    };

    (status, Json(payload))
}

async fn metrics_endpoint(State(state): State<AppState>) -> impl IntoResponse {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        state.metrics.render(),
    )
}

/// Seed one round of reviews and print what the aggregator derives from it.
fn run_demo(complete: bool) -> Result<(), AppError> {
    let service = ReviewService::new();

    if let Err(err) = run_demo_cycle(&service, complete) {
        eprintln!("demo failed: {err}");
    }
    Ok(())
}

fn run_demo_cycle(
    service: &ReviewService,
    complete: bool,
) -> Result<(), review_hub::review::ServiceError> {
    let review_id = seed_demo_cycle(service)?;
    let view = service.get_review(review_id)?;
    render_review_report(&view);

    if complete {
        let patch = ReviewPatch {
            completed: Some(true),
            ..ReviewPatch::default()
        };
        service.update_review(review_id, patch)?;
        let view = service.get_review(review_id)?;
        println!("\nAfter completion");
        println!(
            "sheets: {} total, {} filled, {} completed",
            view.sheet_counters.all, view.sheet_counters.filled, view.sheet_counters.completed
        );
        if let Some(date) = view.completed_date {
            println!("completed at {date}");
        }
    }

    Ok(())
}

fn seed_demo_cycle(
    service: &ReviewService,
) -> Result<review_hub::review::ReviewId, review_hub::review::ServiceError> {
    let role = service.create_job_role("Backend Engineer")?;
    let code = service.create_criteria(
        role.id,
        "Code quality",
        "Readable, tested, maintainable changes",
    )?;
    let comms = service.create_criteria(
        role.id,
        "Communication",
        "Clear writing and timely updates",
    )?;

    let reviewee = service.create_user(NewUser {
        username: "ajohnson".to_string(),
        user_role: UserRole::User,
        job_role_id: Some(role.id),
        position: Position::Middle,
        full_name: "Alex Johnson".to_string(),
        email: "ajohnson@example.com".to_string(),
        department: "Platform".to_string(),
    })?;

    let mut reviewers = Vec::new();
    for username in ["bmiller", "ckim", "dlopez"] {
        reviewers.push(service.create_user(NewUser {
            username: username.to_string(),
            user_role: UserRole::User,
            job_role_id: Some(role.id),
            position: Position::Senior,
            full_name: String::new(),
            email: String::new(),
            department: "Platform".to_string(),
        })?);
    }

    let review = service.create_review(reviewee.id, "2026-H1")?;

    let due = Local::now().date_naive() + Duration::days(14);
    let groups = [
        ReviewerGroup::Manager,
        ReviewerGroup::Colleague,
        ReviewerGroup::Colleague,
    ];
    let mut sheets = Vec::new();
    for (reviewer, group) in reviewers.iter().zip(groups) {
        sheets.push(service.create_sheet(review.id, reviewer.id, due, group)?);
    }

    let ratings = [
        (Score::MeetExpectations, Score::AboveExpectations),
        (Score::WayBelowExpectations, Score::BelowExpectations),
        (Score::WayAboveExpectations, Score::WayAboveExpectations),
    ];
    for (sheet, (code_score, comms_score)) in sheets.iter().zip(ratings) {
        service.save_answer(
            sheet.id,
            code.id,
            Some(code_score),
            Some("seen in the incident follow-ups".to_string()),
        )?;
        service.save_answer(
            sheet.id,
            comms.id,
            Some(comms_score),
            Some("weekly updates were consistent".to_string()),
        )?;
        service.save_sheet_answer(
            sheet.id,
            Some(code_score),
            Some("solid half overall".to_string()),
        )?;
    }

    let weights: Vec<SheetWeight> = sheets
        .iter()
        .zip([0.5, 0.3, 0.2])
        .map(|(sheet, weight)| SheetWeight {
            sheet_id: sheet.id,
            weight,
        })
        .collect();
    service.set_weights(&weights)?;

    Ok(review.id)
}

fn render_review_report(view: &ReviewView) {
    println!("Review demo");
    println!(
        "Review #{}: {} ({}), position {}",
        view.id.0,
        view.user.username,
        view.period,
        view.user_position.label()
    );

    println!("\nCriteria results");
    for result in &view.criteria_results {
        println!(
            "- {}: {:.2} ({}), min {:.0} / max {:.0}",
            result.criteria.name,
            result.score_value,
            result.score.label(),
            result.min_score_value,
            result.max_score_value
        );
        for comment in &result.comments {
            println!("    \"{}\"", comment.text);
        }
    }

    println!(
        "\nTotal: {:.2} ({})",
        view.total_result.score_value,
        view.total_result.score.label()
    );
    for comment in &view.total_result.comments {
        println!("    \"{}\"", comment.text);
    }

    println!(
        "\nSheets: {} total, {} filled, {} completed",
        view.sheet_counters.all, view.sheet_counters.filled, view.sheet_counters.completed
    );
    for sheet in &view.sheets {
        println!(
            "- {} ({:?}): avg {:.2} ({}), weight {}",
            sheet.reviewer.username,
            sheet.reviewer_group,
            sheet.avg_score_value,
            sheet.avg_score.label(),
            sheet
                .weight
                .map(|weight| format!("{weight:.2}"))
                .unwrap_or_else(|| "unset".to_string())
        );
    }
}
