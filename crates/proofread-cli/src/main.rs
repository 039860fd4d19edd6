//! # proofread
//!
//! Proofreading solver binary. `serve` builds a region adjacency graph from a
//! volume file and serves one client over WebSocket; `simulate` plays a
//! proofreader against a running solver using the volume's ground truth.

#![deny(unsafe_code)]

mod volume;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use proofread_features::{ContactManager, FeatureManager, GroundTruthManager};
use proofread_rag::Rag;
use proofread_server::evaluate::{apply_lut, vi};
use proofread_server::{proofread, ProofreadOptions, Solver};
use proofread_settings::{load_settings, ProofreadSettings};
use proofread_telemetry::{init_telemetry, TelemetryConfig};
use tokio::net::TcpListener;
use tracing::info;

use crate::volume::Volume;

/// Interactive proofreading solver.
#[derive(Parser, Debug)]
#[command(name = "proofread", about = "Interactive proofreading solver")]
struct Cli {
    /// Settings file (JSON). Defaults and `PROOFREAD_*` variables apply
    /// without one.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Serve one proofreading client.
    Serve {
        /// Volume file with labels and probabilities.
        volume: PathBuf,

        /// Edge features fed to the classifier.
        #[arg(long, value_enum, default_value_t = Features::Contact)]
        features: Features,
    },
    /// Proofread a volume against its ground truth through a running solver.
    Simulate {
        /// Volume file with labels and ground truth.
        volume: PathBuf,

        /// Number of true segments to proofread (all when omitted).
        #[arg(long)]
        operations: Option<usize>,

        /// Seed for the proofreading order.
        #[arg(long, default_value_t = 0)]
        seed: u64,

        /// Leave the solver running afterwards.
        #[arg(long)]
        keep_alive: bool,
    },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum Features {
    /// Contact-area ratios over the probability map.
    Contact,
    /// Overlap with the volume's ground truth (a perfect oracle).
    GroundTruth,
}

fn feature_manager(
    features: Features,
    volume: &Volume,
    settings: &ProofreadSettings,
) -> Result<Arc<dyn FeatureManager>> {
    let manager: Arc<dyn FeatureManager> = match features {
        Features::Contact => Arc::new(ContactManager::new(
            settings.features.thresholds.clone(),
            settings.features.oriented,
        )),
        Features::GroundTruth => {
            let truth = volume.truth.as_deref().context("volume has no ground truth")?;
            Arc::new(
                GroundTruthManager::new(&volume.labels, truth)
                    .context("Failed to tabulate ground truth")?,
            )
        }
    };
    Ok(manager)
}

async fn serve(settings: &ProofreadSettings, path: PathBuf, features: Features) -> Result<()> {
    let volume = Volume::load(&path)?;
    let labels = volume.labels()?;
    let mut builder = Rag::builder(labels.view())
        .normalize_probabilities(true)
        .feature_manager(feature_manager(features, &volume, settings)?);
    if let Some(probs) = volume.probabilities()? {
        builder = builder.probabilities(probs);
    }
    if let Some(probs) = volume.oriented_probabilities()? {
        builder = builder.oriented_probabilities(probs);
    }
    let rag = builder.build().context("Failed to build region adjacency graph")?;

    let mut solver = Solver::from_settings(rag, settings)
        .await
        .context("Failed to configure solver")?;
    let listener = TcpListener::bind(settings.client_url.as_str())
        .await
        .with_context(|| format!("Failed to bind {}", settings.client_url))?;
    info!(address = %settings.client_url, "waiting for a proofreading client");
    let mut endpoint = proofread_rpc::websocket::accept(&listener)
        .await
        .context("Failed to accept client")?;
    solver.listen(&mut endpoint).await.context("Session failed")?;
    Ok(())
}

async fn simulate(
    settings: &ProofreadSettings,
    path: PathBuf,
    options: ProofreadOptions,
) -> Result<()> {
    let volume = Volume::load(&path)?;
    let labels = volume.labels()?;
    let truth = volume.truth()?;
    let mut endpoint = proofread_rpc::websocket::connect(&settings.solver_url)
        .await
        .with_context(|| format!("Failed to connect to {}", settings.solver_url))?;
    let (src, dst) = proofread(labels.view(), truth.view(), &mut endpoint, &options)
        .await
        .context("Proofreading failed")?;

    let truth_flat: Vec<_> = truth.iter().copied().collect();
    let before = vi(&volume.labels, &truth_flat);
    let after = vi(&apply_lut(&volume.labels, &src, &dst), &truth_flat);
    println!(
        "{}",
        serde_json::json!({"fragments": src.len(), "vi_before": before, "vi_after": after})
    );
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Cli::parse();

    let settings = load_settings(args.config.as_deref()).context("Failed to load settings")?;
    let _telemetry = init_telemetry(&TelemetryConfig::from_level_name(
        &settings.logging.level,
        settings.logging.json,
    ))
    .context("Failed to initialise logging")?;

    match args.command {
        Command::Serve { volume, features } => serve(&settings, volume, features).await,
        Command::Simulate {
            volume,
            operations,
            seed,
            keep_alive,
        } => {
            let options = ProofreadOptions {
                num_operations: operations,
                stop_when_finished: !keep_alive,
                seed,
            };
            simulate(&settings, volume, options).await
        }
    }
}
