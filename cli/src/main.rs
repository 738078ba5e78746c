use std::path::PathBuf;
use std::process;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use naysayer_core::api::types::{EvaluationCounts, RuleEvaluation};
use naysayer_core::api::traits::Reporter;
use naysayer_core::{config as core_config, Decision, RuleRegistry};
use naysayer_cli::app::{build_router, AppState};
use naysayer_cli::assembler::{AssemblerOutcome, MrContextAssembler};
use naysayer_cli::config::NaysayerConfig;
use naysayer_cli::fixture::Fixture;
use naysayer_cli::runner::evaluate_concurrently;
use naysayer_forge::mock::MockForgeClient;
use naysayer_forge::types::CommentKind;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "naysayer", version, about = "Merge request compliance gatekeeper")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Evaluate a single merge request against a local fixture, without any network access
    Evaluate {
        /// Path to a JSON fixture describing the MR, its changes and file contents
        fixture: PathBuf,

        /// Emit the machine-readable JSON report instead of markdown
        #[arg(long)]
        json: bool,

        /// Override the built-in rule configuration
        #[arg(long)]
        rules: Option<PathBuf>,

        /// Cap on concurrently evaluated files
        #[arg(long)]
        max_concurrent_files: Option<usize>,
    },
    /// Run the liveness HTTP service
    Serve,
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Evaluate { fixture, json, rules, max_concurrent_files } => {
            run_evaluate(fixture, json, rules, max_concurrent_files).await
        }
        Commands::Serve => run_serve().await,
    }
}

async fn run_evaluate(fixture_path: PathBuf, json: bool, rules_override: Option<PathBuf>, max_concurrent_files: Option<usize>) {
    let fixture = match Fixture::load(&fixture_path) {
        Ok(f) => f,
        Err(e) => {
            eprintln!("error: could not read fixture {}: {e}", fixture_path.display());
            process::exit(2);
        }
    };

    let rules_yaml = match &rules_override {
        Some(path) => match std::fs::read_to_string(path) {
            Ok(s) => s,
            Err(e) => {
                eprintln!("error: could not read rules file {}: {e}", path.display());
                process::exit(1);
            }
        },
        None => core_config::DEFAULT_RULES.to_string(),
    };
    let configs = match core_config::parse_rules(&rules_yaml) {
        Ok(c) => Arc::new(c),
        Err(e) => {
            eprintln!("error: malformed rule configuration: {e}");
            process::exit(1);
        }
    };

    let config = NaysayerConfig::from_env();
    let client = MockForgeClient::new(config.bot_username.clone());
    fixture.seed(&client);

    let assembler = MrContextAssembler::new(&client, config.forge_timeout);
    let outcome = match assembler.assemble(&fixture.project_id, fixture.mr_iid).await {
        Ok(outcome) => outcome,
        Err(e) => {
            eprintln!("error: could not assemble MR context: {e}");
            process::exit(1);
        }
    };

    let evaluation = match outcome {
        AssemblerOutcome::ShortCircuit(decision) => short_circuit_evaluation(decision),
        AssemblerOutcome::Ready { context, contents } => {
            let registry = Arc::new(RuleRegistry::builtin());
            evaluate_concurrently(
                configs,
                registry,
                Arc::new(context),
                Arc::new(contents),
                max_concurrent_files.unwrap_or(config.max_concurrent_files),
                tokio_util::sync::CancellationToken::new(),
            )
            .await
        }
    };

    let report = if json {
        naysayer_core::reporter::JsonReporter.report(&evaluation)
    } else {
        naysayer_core::reporter::TextReporter.report(&evaluation)
    };
    println!("{report}");

    post_outcome(&client, &fixture.project_id, fixture.mr_iid, &evaluation, &report).await;
    process::exit(0);
}

async fn post_outcome(client: &MockForgeClient, project_id: &str, mr_iid: u64, evaluation: &RuleEvaluation, body: &str) {
    if let Err(e) = client.post_or_update_bot_comment(project_id, mr_iid, body, CommentKind::RuleEvaluation).await {
        tracing::warn!(error = %e, "could not post rule evaluation comment");
    }
    let result = if evaluation.final_decision.is_approve() {
        client.approve_mr(project_id, mr_iid, Some(&evaluation.final_decision.reason)).await
    } else {
        client.reset_approval(project_id, mr_iid).await
    };
    if let Err(e) = result {
        tracing::warn!(error = %e, "could not update MR approval state");
    }
}

fn short_circuit_evaluation(decision: Decision) -> RuleEvaluation {
    RuleEvaluation {
        final_decision: decision,
        files: Default::default(),
        counts: EvaluationCounts::default(),
        duration_ms: 0,
    }
}

async fn run_serve() {
    let config = NaysayerConfig::from_env();
    tracing::info!(host = %config.host, port = config.port, "starting naysayer service");

    let addr: std::net::SocketAddr = format!("{}:{}", config.host, config.port).parse().expect("invalid bind address");
    let app = build_router(AppState { config });

    let listener = tokio::net::TcpListener::bind(addr).await.expect("failed to bind");
    tracing::info!(%addr, "listening");

    if let Err(e) = axum::serve(listener, app).await {
        tracing::error!(error = %e, "server error");
        process::exit(1);
    }
}
