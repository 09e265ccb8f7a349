//! Authority verification commands: `verify`, `verify-refresh`, `verify-purge`.

use anyhow::{bail, Result};
use clap::Args;
use serde::Serialize;
use uuid::Uuid;

use crate::cli::context::AppContext;
use crate::cli::display::{
    action_success, colorize_risk, colorize_severity, or_dash, output, CommandOutput, DetailView,
};
use crate::cli::progress::create_spinner;
use crate::domain::models::{Config, VerificationFailure, VerificationOutcome};
use crate::services::RefreshSummary;

#[derive(Args, Debug)]
pub struct VerifyArgs {
    /// MC number (preferred when both numbers are given)
    #[arg(long)]
    pub mc: Option<String>,

    /// USDOT number
    #[arg(long)]
    pub dot: Option<String>,

    /// Verify a registered carrier by ID using its stored numbers
    #[arg(long, conflicts_with_all = ["mc", "dot"])]
    pub carrier: Option<Uuid>,

    /// Ignore the cache and query the authority
    #[arg(short, long)]
    pub force: bool,
}

#[derive(Args, Debug)]
pub struct VerifyRefreshArgs {
    /// Maximum number of expired entries to refresh
    #[arg(short, long, default_value = "50")]
    pub limit: u32,
}

#[derive(Args, Debug)]
pub struct VerifyPurgeArgs {}

#[derive(Debug, Serialize)]
pub struct VerifyOutput {
    #[serde(flatten)]
    pub outcome: VerificationOutcome,
}

impl CommandOutput for VerifyOutput {
    fn to_human(&self) -> String {
        let o = &self.outcome;
        let title = o.data.as_ref().and_then(|d| d.legal_name.clone()).unwrap_or_else(|| {
            match &o.failure {
                Some(VerificationFailure::NotFound) => "No authority record found".to_string(),
                Some(VerificationFailure::Unavailable(_)) => "Unable to verify".to_string(),
                None => "Verification".to_string(),
            }
        });

        let mut view = DetailView::new(&title)
            .field("Verified", o.verified)
            .field("Risk", format!("{} ({})", colorize_risk(o.risk_level), o.risk_score))
            .field("Cached", o.cached)
            .field("Verified at", o.verified_at.format("%Y-%m-%d %H:%M UTC"))
            .field_opt(
                "Expires at",
                o.expires_at
                    .map(|t| t.format("%Y-%m-%d %H:%M UTC").to_string())
                    .as_deref(),
            );

        if let Some(data) = &o.data {
            view = view
                .section("Authority")
                .field("Source", &data.source)
                .field("MC", or_dash(data.mc_number.as_deref()))
                .field("DOT", or_dash(data.dot_number.as_deref()))
                .field_opt("DBA", data.dba_name.as_deref())
                .field("Operating status", data.operating_status.as_str())
                .field_opt("Phone", data.phone.as_deref())
                .field_opt("Address", data.physical_address.as_deref());
        }

        if !o.warnings.is_empty() {
            view = view.section("Warnings");
            for warning in &o.warnings {
                view = view.item(format!("[{}] {}", colorize_severity(warning.severity), warning.message));
            }
        }
        view.render()
    }
}

#[derive(Debug, Serialize)]
pub struct RefreshOutput {
    pub summary: RefreshSummary,
}

impl CommandOutput for RefreshOutput {
    fn to_human(&self) -> String {
        let s = &self.summary;
        action_success(&format!(
            "Examined {} expired verification(s): {} refreshed, {} not found, {} failed",
            s.examined, s.refreshed, s.not_found, s.failed
        ))
    }
}

#[derive(Debug, Serialize)]
pub struct PurgeOutput {
    pub removed: u64,
}

impl CommandOutput for PurgeOutput {
    fn to_human(&self) -> String {
        action_success(&format!("Removed {} expired verification(s)", self.removed))
    }
}

pub async fn execute(args: VerifyArgs, config: Config, json_mode: bool) -> Result<()> {
    if args.carrier.is_none() && args.mc.is_none() && args.dot.is_none() {
        bail!("Provide --mc, --dot or --carrier");
    }

    let ctx = AppContext::open(config).await?;
    let service = ctx.verification_service()?;

    let spinner = create_spinner("Querying authority records...", json_mode);
    let outcome = match args.carrier {
        Some(id) => service.verify_registered_carrier(id, args.force).await,
        None => {
            service
                .verify_carrier(args.mc.as_deref(), args.dot.as_deref(), args.force)
                .await
        }
    };
    spinner.finish_and_clear();

    output(&VerifyOutput { outcome: outcome? }, json_mode);
    Ok(())
}

pub async fn execute_refresh(args: VerifyRefreshArgs, config: Config, json_mode: bool) -> Result<()> {
    let ctx = AppContext::open(config).await?;
    let service = ctx.verification_service()?;

    let spinner = create_spinner("Refreshing expired verifications...", json_mode);
    let summary = service.refresh_expired(args.limit).await;
    spinner.finish_and_clear();

    output(&RefreshOutput { summary: summary? }, json_mode);
    Ok(())
}

pub async fn execute_purge(_args: VerifyPurgeArgs, config: Config, json_mode: bool) -> Result<()> {
    let ctx = AppContext::open(config).await?;
    let removed = ctx.verification_service()?.purge_expired().await?;
    output(&PurgeOutput { removed }, json_mode);
    Ok(())
}
