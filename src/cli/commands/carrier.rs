//! Carrier directory commands.

use anyhow::{anyhow, Result};
use clap::{Args, Subcommand};
use serde::Serialize;
use uuid::Uuid;

use crate::cli::context::AppContext;
use crate::cli::display::{
    action_success, colorize_score, colorize_status, list_table, money, or_dash, output, render_list, short_id,
    truncate, CommandOutput, DetailView,
};
use crate::domain::models::{
    CarrierCallInteraction, CarrierEntity, CarrierStatisticsSnapshot, CarrierStatus, Config, EquipmentType,
};
use crate::domain::ports::CarrierFilter;

/// Interactions shown by `carrier show`.
const RECENT_INTERACTIONS: usize = 10;

#[derive(Args, Debug)]
pub struct CarrierArgs {
    #[command(subcommand)]
    pub command: CarrierCommands,
}

#[derive(Subcommand, Debug)]
pub enum CarrierCommands {
    /// List carriers
    List {
        /// Restrict to one organization
        #[arg(long)]
        org: Option<Uuid>,
        /// Filter by status (active, inactive, blacklisted)
        #[arg(short, long)]
        status: Option<String>,
        /// Filter by equipment (e.g. "reefer", "flatbed")
        #[arg(short, long)]
        equipment: Option<String>,
        /// Only carriers flagged for review
        #[arg(long)]
        needs_review: bool,
        /// Company name contains
        #[arg(short, long)]
        name: Option<String>,
        /// Maximum number of carriers to display
        #[arg(short, long, default_value = "50")]
        limit: u32,
    },
    /// Show carrier details and recent calls
    Show {
        /// Carrier ID
        id: Uuid,
    },
    /// Recompute statistics from load history
    Stats {
        /// Carrier ID
        id: Uuid,
    },
    /// Change carrier status
    Status {
        /// Carrier ID
        id: Uuid,
        /// New status (active, inactive, blacklisted)
        status: String,
    },
}

#[derive(Debug, Serialize)]
pub struct CarrierListOutput {
    pub carriers: Vec<CarrierEntity>,
    pub total: usize,
}

impl CommandOutput for CarrierListOutput {
    fn to_human(&self) -> String {
        let mut table = list_table(&["id", "name", "mc", "dot", "phone", "status", "loads", "score", "review"]);
        for carrier in &self.carriers {
            table.add_row(vec![
                short_id(&carrier.id),
                truncate(&carrier.display_name(), 28),
                or_dash(carrier.mc_number.as_deref()),
                or_dash(carrier.dot_number.as_deref()),
                or_dash(carrier.dispatcher_phone.as_deref()),
                carrier.status.as_str().to_string(),
                carrier.stats.total_loads.to_string(),
                carrier.stats.performance_score.to_string(),
                if carrier.needs_review { "yes" } else { "" }.to_string(),
            ]);
        }
        render_list("carrier", &table, self.total)
    }
}

#[derive(Debug, Serialize)]
pub struct CarrierDetailOutput {
    pub carrier: CarrierEntity,
    pub recent_interactions: Vec<CarrierCallInteraction>,
}

impl CommandOutput for CarrierDetailOutput {
    fn to_human(&self) -> String {
        let c = &self.carrier;
        let location = match (&c.city, &c.state) {
            (Some(city), Some(state)) => Some(format!("{city}, {state}")),
            (None, Some(state)) => Some(state.clone()),
            (Some(city), None) => Some(city.clone()),
            (None, None) => None,
        };
        let mut view = DetailView::new(&c.display_name())
            .field("ID", c.id)
            .field("Organization", c.organization_id)
            .field("Status", colorize_status(c.status))
            .field_opt("MC", c.mc_number.as_deref())
            .field_opt("DOT", c.dot_number.as_deref())
            .field("Auto-created", c.auto_created)
            .field("Needs review", c.needs_review)
            .section("Contacts")
            .field_opt("Dispatcher", c.dispatcher_name.as_deref())
            .field_opt("Phone", c.dispatcher_phone.as_deref())
            .field_opt("Alternate phone", c.alternate_phone.as_deref())
            .field_opt("Email", c.dispatcher_email.as_deref())
            .field_opt("Driver", c.driver_name.as_deref())
            .field_opt("Driver phone", c.driver_phone.as_deref())
            .field_opt("Address", c.address.as_deref())
            .field_opt("Location", location.as_deref())
            .field_opt("Zip", c.zip.as_deref())
            .section("Statistics")
            .field("Total loads", c.stats.total_loads)
            .field("Completed loads", c.stats.completed_loads)
            .field("On time", format!("{:.1}%", c.stats.on_time_percentage))
            .field("Average rate", c.stats.average_rate.map_or_else(|| "-".to_string(), money))
            .field("Lifetime revenue", money(c.stats.lifetime_revenue))
            .field("Performance score", colorize_score(c.stats.performance_score));

        if !c.equipment_types.is_empty() {
            view = view.section("Equipment");
            for equipment in &c.equipment_types {
                view = view.item(equipment.as_str());
            }
        }
        if !c.preferred_lanes.is_empty() {
            view = view.section("Preferred lanes");
            for lane in &c.preferred_lanes {
                view = view.item(lane.as_str());
            }
        }
        if !self.recent_interactions.is_empty() {
            view = view.section("Recent calls");
            for interaction in &self.recent_interactions {
                view = view.item(format!(
                    "{} {} call {} (confidence {}){}",
                    interaction.occurred_at.format("%Y-%m-%d %H:%M"),
                    interaction.kind.as_str(),
                    short_id(&interaction.call_id),
                    interaction.confidence,
                    interaction
                        .note
                        .as_deref()
                        .map_or_else(String::new, |note| format!(": {note}")),
                ));
            }
        }
        view.render()
    }
}

#[derive(Debug, Serialize)]
pub struct CarrierStatsOutput {
    pub statistics: CarrierStatisticsSnapshot,
}

impl CommandOutput for CarrierStatsOutput {
    fn to_human(&self) -> String {
        let s = &self.statistics;
        let mut view = DetailView::new(&format!("Statistics for {}", s.carrier_id))
            .field("Total loads", s.total_loads)
            .field("Completed", s.completed_loads)
            .field("Delivered", s.delivered_loads)
            .field("Cancelled", s.cancelled_loads)
            .field("On time", format!("{:.1}%", s.on_time_percentage))
            .field("Completion rate", format!("{:.1}%", s.completion_rate))
            .field("Cancellation rate", format!("{:.1}%", s.cancellation_rate))
            .field("Average rate", s.average_rate.map_or_else(|| "-".to_string(), money))
            .field("Average margin", s.average_margin.map_or_else(|| "-".to_string(), money))
            .field("Lifetime revenue", money(s.lifetime_revenue))
            .field("Performance score", colorize_score(s.performance_score));
        if !s.top_equipment.is_empty() {
            view = view.section("Top equipment");
            for entry in &s.top_equipment {
                view = view.item(format!("{} ({})", entry.key, entry.count));
            }
        }
        if !s.top_lanes.is_empty() {
            view = view.section("Top lanes");
            for entry in &s.top_lanes {
                view = view.item(format!("{} ({})", entry.key, entry.count));
            }
        }
        view.render()
    }
}

#[derive(Debug, Serialize)]
pub struct CarrierActionOutput {
    pub success: bool,
    pub message: String,
    pub carrier: CarrierEntity,
}

impl CommandOutput for CarrierActionOutput {
    fn to_human(&self) -> String {
        action_success(&self.message)
    }
}

pub async fn execute(args: CarrierArgs, config: Config, json_mode: bool) -> Result<()> {
    let ctx = AppContext::open(config).await?;
    let service = ctx.carrier_service();

    match args.command {
        CarrierCommands::List {
            org,
            status,
            equipment,
            needs_review,
            name,
            limit,
        } => {
            let status = status
                .map(|s| CarrierStatus::from_str(&s).ok_or_else(|| anyhow!("Invalid status: {s}")))
                .transpose()?;
            let equipment = equipment
                .map(|e| EquipmentType::from_mention(&e).ok_or_else(|| anyhow!("Unknown equipment type: {e}")))
                .transpose()?;
            let filter = CarrierFilter {
                organization_id: org,
                status,
                equipment,
                needs_review: needs_review.then_some(true),
                name_contains: name,
                limit: Some(limit),
            };
            let carriers = service.list_carriers(filter).await?;
            let total = carriers.len();
            output(&CarrierListOutput { carriers, total }, json_mode);
        }
        CarrierCommands::Show { id } => {
            let carrier = service.get_carrier(id).await?;
            let mut recent_interactions = service.interactions(id).await?;
            recent_interactions.truncate(RECENT_INTERACTIONS);
            output(
                &CarrierDetailOutput {
                    carrier,
                    recent_interactions,
                },
                json_mode,
            );
        }
        CarrierCommands::Stats { id } => {
            service.get_carrier(id).await?;
            let statistics = ctx.statistics_engine().recompute(id).await?;
            output(&CarrierStatsOutput { statistics }, json_mode);
        }
        CarrierCommands::Status { id, status } => {
            let new_status = CarrierStatus::from_str(&status).ok_or_else(|| anyhow!("Invalid status: {status}"))?;
            let carrier = service.transition_status(id, new_status).await?;
            output(
                &CarrierActionOutput {
                    success: true,
                    message: format!("{} is now {}", carrier.display_name(), new_status.as_str()),
                    carrier,
                },
                json_mode,
            );
        }
    }

    Ok(())
}
