//! Risk Server — standalone binary.
//!
//! Usage:
//!   cargo run --bin risk-server
//!   cargo run --bin risk-server -- --port 8002 --policy enhanced
//!
//! Serves the crisis-risk triage API on localhost:8002 by default. The
//! classifier artifact and fusion thresholds come from `vigil.toml` (or a
//! custom `--config` path); a missing file runs on tuned defaults.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use vigil_core::{CaseLog, VigilConfig};
use vigil_risk::classifier::ClassifierHandle;
use vigil_risk::knowledge::KnowledgeStore;
use vigil_risk::risk_engine::{FusionPolicy, RiskEngine};
use vigil_risk::risk_server::{self, ServerConfig};

#[derive(Parser)]
#[command(name = "risk-server")]
#[command(about = "Vigil Risk Server — crisis-risk triage for conversational text")]
struct Cli {
    /// Port to listen on (overrides config)
    #[arg(short, long)]
    port: Option<u16>,

    /// Bind address (overrides config)
    #[arg(short, long)]
    bind: Option<String>,

    /// Path to the TOML configuration file
    #[arg(long, env = "VIGIL_CONFIG", default_value = "vigil.toml")]
    config: PathBuf,

    /// Fusion policy: "simplified" or "enhanced"
    #[arg(long, default_value = "enhanced")]
    policy: String,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let config = VigilConfig::load(&cli.config).map_err(anyhow::Error::msg)?;

    let policy = match cli.policy.as_str() {
        "simplified" => FusionPolicy::Simplified,
        "enhanced" => FusionPolicy::Enhanced,
        other => anyhow::bail!("Unknown policy {:?} (expected simplified|enhanced)", other),
    };

    let bind = cli.bind.unwrap_or_else(|| config.server.bind.clone());
    let port = cli.port.unwrap_or(config.server.port);
    let addr: SocketAddr = format!("{}:{}", bind, port).parse()?;

    let classifier = ClassifierHandle::load(
        &config.classifier.artifact_path,
        config.classifier.decision_threshold,
    );

    let mut case_log = CaseLog::new(config.case_log.max_cases);
    if !config.case_log.path.is_empty() {
        case_log = case_log.with_file(&config.case_log.path);
    }

    let mut engine = RiskEngine::new(policy, classifier)
        .with_fusion_config(config.fusion.clone())
        .with_case_log(Arc::new(case_log))
        .with_top_k(config.retrieval.top_k);

    if policy == FusionPolicy::Enhanced && config.retrieval.enabled {
        let store = Arc::new(KnowledgeStore::new(config.retrieval.clone()));
        engine = engine.with_knowledge(store);
    }

    risk_server::serve(Arc::new(engine), ServerConfig { addr }).await?;
    Ok(())
}
