use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, anyhow};
use outreach_pipeline::channels::{MailHogInbox, SmtpMailer};
use outreach_pipeline::config::CampaignConfig;
use outreach_pipeline::llm::create_ready_provider;
use outreach_pipeline::pipeline::CampaignPipeline;
use outreach_pipeline::report::{CampaignStats, write_report};
use outreach_pipeline::store::{load_leads, write_results};

const OLLAMA_READY_ATTEMPTS: u32 = 60;
const OLLAMA_READY_INTERVAL: Duration = Duration::from_secs(2);

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Install rustls crypto provider before any TLS usage
    rustls::crypto::ring::default_provider()
        .install_default()
        .map_err(|_| anyhow!("Failed to install rustls crypto provider"))?;

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let config = CampaignConfig::from_env().unwrap_or_else(|e| {
        eprintln!("Error: {e}");
        std::process::exit(1);
    });

    eprintln!("📬 Outreach Pipeline v{}", env!("CARGO_PKG_VERSION"));
    eprintln!("   Model: {}", config.llm.model);
    eprintln!("   SMTP: {}:{}", config.smtp.host, config.smtp.port);
    eprintln!("   Leads: {}", config.leads_csv.display());

    let llm = create_ready_provider(&config.llm, OLLAMA_READY_ATTEMPTS, OLLAMA_READY_INTERVAL).await?;

    let transport = Arc::new(SmtpMailer::new(config.smtp.clone()));
    let inbox = Arc::new(MailHogInbox::new(&config.mailhog_api));
    let pipeline = CampaignPipeline::new(&config, llm, transport, inbox)
        .context("Failed to prepare the message template")?;

    tracing::info!("Starting pipeline...");
    let leads = load_leads(&config.leads_csv, config.max_leads)
        .with_context(|| format!("Failed to load leads from {}", config.leads_csv.display()))?;
    let records = pipeline.run(leads).await;

    write_results(&config.output_csv, &records)
        .with_context(|| format!("Failed to write {}", config.output_csv.display()))?;
    tracing::info!(
        "Wrote {} with {} rows",
        config.output_csv.display(),
        records.len()
    );

    let stats = CampaignStats::from_records(&records);
    let now = chrono::Local::now().naive_local();
    let report_path = write_report(&config.reports_dir, &stats, &records, now)
        .context("Failed to write campaign report")?;
    tracing::info!("Wrote report to {}", report_path.display());

    Ok(())
}
