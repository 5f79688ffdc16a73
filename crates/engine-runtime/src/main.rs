//! # Veridoc Engine Runtime
//!
//! Demo entry point: builds a development container and walks one
//! document through the full lifecycle — upload, approve, internal sign,
//! download capability, redemption — printing the audit trail at the end.

use anyhow::Result;
use engine_runtime::config::EngineConfig;
use engine_runtime::container::EngineContainer;
use shared_types::{Actor, Role};
use tracing::info;
use tracing_subscriber::{EnvFilter, FmtSubscriber};
use vd_02_audit_trail::{AuditQuery, AuditTrail};
use vd_03_workflow_engine::{UploadRequest, WorkflowApi};

#[tokio::main]
async fn main() -> Result<()> {
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    info!("[runtime] Starting Veridoc engine (development mode)");
    let config = EngineConfig::development();
    let container = EngineContainer::build(&config)?;
    let engine = &container.engine;

    let sender = Actor::with_role(Role::Sender);
    let checker = Actor::with_role(Role::Checker);
    let manager = Actor::with_role(Role::Manager);

    // 1. SENDER uploads a contract.
    let document = engine
        .upload(
            sender,
            UploadRequest {
                document: None,
                title: "Contract A".into(),
                filename: "contract-a.pdf".into(),
                metadata: Default::default(),
                notes: Some("Initial draft".into()),
                content: Box::new(&b"Contract A: the parties agree..."[..]),
            },
        )
        .await?;
    info!(document = %document.id, status = %document.status, "Uploaded");

    // 2. CHECKER approves it for signing.
    let document = engine.approve(checker, document.id, None).await?;
    info!(status = %document.status, "Approved");

    // 3. MANAGER signs with the internal key.
    let (document, signature) = engine
        .sign_internal(manager, document.id, Some("First signature".into()))
        .await?;
    info!(status = %document.status, signature = %signature.id, "Signed");

    // 4. The recorded signature verifies against the stored bytes.
    let verified = engine.verify_signature(signature.id).await?;
    info!(verified, "Signature verification");

    // 5. MANAGER fetches a download capability and redeems it.
    let (token, version) = engine.download_approved(manager, document.id).await?;
    let grant = container.gate.redeem(&token)?;
    info!(
        version = version.version_number,
        filename = %grant.filename,
        "Download granted"
    );

    // Give the background worker a moment to drain verification tasks.
    tokio::time::sleep(std::time::Duration::from_millis(50)).await;

    println!("\nAudit trail:");
    for entry in container.trail.query(&AuditQuery::default()) {
        println!(
            "  #{:<3} {:<24} doc={:?}",
            entry.id,
            entry.action.to_string(),
            entry.document.map(|d| d.to_string())
        );
    }

    container.worker.abort();
    Ok(())
}
