use axum::extract::State;
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};
use axum_prometheus::PrometheusMetricLayer;
use biosentry::alerts::{alert_router, AlertApi, AlertService};
use biosentry::analytics::{analytics_router, AnalyticsApi};
use biosentry::assessment::{
    assessment_router, AnswerSet, AssessmentApi, AssessmentService, Catalog,
    KvAssessmentRepository,
};
use biosentry::auth::{auth_router, FarmType, SessionService};
use biosentry::community::{community_router, CommunityApi, CommunityService};
use biosentry::config::AppConfig;
use biosentry::error::AppError;
use biosentry::records::compliance::{compliance_router, ComplianceApi, ComplianceService};
use biosentry::records::finance::{finance_router, FinanceApi, FinanceService};
use biosentry::records::gamification::{gamification_router, GamificationApi, GamificationService};
use biosentry::records::health::{health_router, HealthApi, HealthService};
use biosentry::records::training::{training_router, TrainingApi, TrainingService};
use biosentry::store::{KeyValueStore, MemoryStore};
use biosentry::{seed, telemetry};
use clap::{Args, Parser, Subcommand};
use metrics_exporter_prometheus::PrometheusHandle;
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
    name = "BioSentry",
    about = "Run the farm biosecurity management service from the command line",
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
    /// Score an answer set against a farm-type catalog for demos
    Score(ScoreArgs),
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

#[derive(Args, Debug)]
struct ScoreArgs {
    /// Catalog to score against (pig or poultry)
    #[arg(long, value_parser = parse_farm_type)]
    farm_type: FarmType,
    /// Comma-separated ids of questions answered yes; the rest are no
    #[arg(long, value_delimiter = ',')]
    yes: Vec<String>,
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
        Command::Score(args) => run_score(args),
    }
}

fn parse_farm_type(raw: &str) -> Result<FarmType, String> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "pig" => Ok(FarmType::Pig),
        "poultry" => Ok(FarmType::Poultry),
        other => Err(format!(
            "'{other}' is not a scoreable farm type (expected pig or poultry)"
        )),
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

    let store: Arc<dyn KeyValueStore> = Arc::new(MemoryStore::default());
    let sessions = Arc::new(SessionService::new(store.clone()));
    let repository = Arc::new(KvAssessmentRepository::new(store.clone()));
    let assessments = Arc::new(AssessmentService::new(repository));
    let alerts = Arc::new(AlertService::new(store.clone()));
    let community = Arc::new(CommunityService::new(store.clone()));
    let compliance = Arc::new(ComplianceService::new(store.clone()));
    let health = Arc::new(HealthService::new(store.clone()));
    let finance = Arc::new(FinanceService::new(store.clone()));
    let training = Arc::new(TrainingService::new(store.clone()));
    let gamification = Arc::new(GamificationService::new(store));

    if config.seed_demo_data {
        seed::seed_demo_data(&sessions, &alerts, &community)?;
    }

    let app = Router::new()
        .route("/health", get(healthcheck))
        .route("/ready", get(readiness_endpoint))
        .route("/metrics", get(metrics_endpoint))
        .with_state(state)
        .merge(auth_router(sessions.clone()))
        .merge(assessment_router(AssessmentApi {
            sessions: sessions.clone(),
            service: assessments.clone(),
        }))
        .merge(alert_router(AlertApi {
            sessions: sessions.clone(),
            service: alerts.clone(),
        }))
        .merge(community_router(CommunityApi {
            sessions: sessions.clone(),
            service: community,
        }))
        .merge(compliance_router(ComplianceApi {
            sessions: sessions.clone(),
            service: compliance,
        }))
        .merge(health_router(HealthApi {
            sessions: sessions.clone(),
            service: health,
        }))
        .merge(finance_router(FinanceApi {
            sessions: sessions.clone(),
            service: finance,
        }))
        .merge(training_router(TrainingApi {
            sessions: sessions.clone(),
            service: training,
        }))
        .merge(gamification_router(GamificationApi {
            sessions: sessions.clone(),
            service: gamification,
        }))
        .merge(analytics_router(AnalyticsApi {
            sessions,
            assessments,
            alerts,
        }))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(?config.environment, %addr, "biosecurity management service ready");

    axum::serve(listener, app).await?;
    Ok(())
}

fn run_score(args: ScoreArgs) -> Result<(), AppError> {
    let Some(catalog) = Catalog::for_farm_type(args.farm_type) else {
        eprintln!("no catalog for farm type {}", args.farm_type.label());
        std::process::exit(2);
    };

    let answers = match build_answer_set(catalog, &args.yes) {
        Ok(answers) => answers,
        Err(unknown) => {
            eprintln!(
                "unknown question id '{unknown}' for the {} catalog",
                catalog.farm_type.label()
            );
            std::process::exit(2);
        }
    };

    let report = match biosentry::assessment::score(&answers, catalog) {
        Ok(report) => report,
        Err(error) => {
            eprintln!("scoring failed: {error}");
            std::process::exit(2);
        }
    };

    println!("Biosecurity scoring demo ({})", catalog.farm_type.label());
    for question in catalog.questions {
        let answer = if answers.get(question.id) == Some(&true) {
            "yes"
        } else {
            "no"
        };
        println!("- [{answer}] {}", question.prompt);
    }
    println!("\nCompliance score: {}", report.compliance_score);
    println!("Risk score: {}", report.risk_score);
    println!("Risk tier: {}", report.risk_tier.label());

    Ok(())
}

/// Every catalog question answered no, then the listed ids flipped to yes.
/// An id outside the catalog is returned as the error.
fn build_answer_set(catalog: &Catalog, yes: &[String]) -> Result<AnswerSet, String> {
    let mut answers: AnswerSet = catalog
        .questions
        .iter()
        .map(|question| (question.id.to_string(), false))
        .collect();
    for id in yes {
        let id = id.trim();
        if !catalog.contains(id) {
            return Err(id.to_string());
        }
        answers.insert(id.to_string(), true);
    }
    Ok(answers)
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
