//! services/client/src/bin/dashboard.rs

use client_lib::{config::Config, context::DashboardContext, error::ClientError};
use jobs_dashboard_core::stores::reports::DEFAULT_MAX_RECORDS;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), ClientError> {
    // --- 1. Load Configuration & Set Up Logging ---
    let config = Config::from_env()?;
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(config.log_level.to_string()))
        .with(tracing_subscriber::fmt::layer())
        .init();
    info!(api = %config.api_base_url, "Configuration loaded");

    // --- 2. Build the Stores ---
    let context = DashboardContext::from_config(&config)?;
    if !context.session.is_authenticated() {
        warn!("No session token; protected endpoints will answer 401");
    } else if context.session.is_token_expiring_soon() {
        warn!("Session token is about to expire");
    }
    context.initialize();

    // --- 3. Run the Requested Command ---
    match std::env::args().nth(1).as_deref() {
        Some("export") => {
            let count = context.reports.count_export_records(DEFAULT_MAX_RECORDS).await?;
            info!(records = count.count, "Exporting");
            let export = context.reports.export_csv(DEFAULT_MAX_RECORDS).await?;
            info!(file = %export.filename, bytes = export.bytes, "Export finished");
        }
        Some("logout") => context.logout(),
        _ => {
            context.refresh_all().await;
            summarize(&context);
        }
    }
    Ok(())
}

fn summarize(context: &DashboardContext) {
    let overview = context.dashboard.snapshot().overview;
    match overview.error {
        Some(error) => warn!(%error, "Dashboard unavailable"),
        None => info!(
            current = overview.data.current_count,
            previous = overview.data.previous_count,
            companies = context.dashboard.active_companies(),
            "Jobs in period"
        ),
    }

    let kpis = context.trending.snapshot().kpis;
    if let Some(top) = kpis.most_demanded {
        info!(skill = %top.skill, jobs = top.skill_count, "Most demanded skill");
    }
    if let Some(growth) = kpis.highest_growth {
        info!(skill = %growth.change.skill, change = growth.change.change, "Highest growth");
    }

    for skill in context.skills.aggregated_skills().iter().take(5) {
        info!(skill = %skill.skill_name, jobs = skill.job_count, "Skill");
    }
    for company in context.empresas.aggregated_companies().iter().take(5) {
        info!(company = %company.employer_name, jobs = company.job_count, "Company");
    }
}
