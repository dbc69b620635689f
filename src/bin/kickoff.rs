//! kickoff CLI, the operator interface to the campaign kickoff engine.

use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use kickoff_rs::actions::ActionRegistry;
use kickoff_rs::config::Config;
use kickoff_rs::contacts::KickoffContactFinder;
use kickoff_rs::db::{Db, TableConfig};
use kickoff_rs::executioner::{ContactLimiter, KickoffExecutioner};
use kickoff_rs::executor::ActionExecutor;
use kickoff_rs::host::HostHooks;
use kickoff_rs::model::{CampaignId, ContactId};
use kickoff_rs::scheduler::{DEFERRED_QUEUE, TimingScheduler};
use kickoff_rs::telemetry::{TelemetryConfig, init_telemetry};
use secrecy::ExposeSecret;

#[derive(Parser)]
#[command(name = "kickoff", about = "Campaign kickoff execution engine")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run a campaign's kickoff events against its eligible contacts
    Trigger {
        /// Campaign ID
        campaign_id: i64,
        /// Contacts per batch (defaults to KICKOFF_BATCH_LIMIT)
        #[arg(long)]
        batch_limit: Option<usize>,
        /// Restrict the run to a single contact
        #[arg(long)]
        contact_id: Option<i64>,
        /// Directory containing action handler TOML configs
        #[arg(long, default_value = "actions")]
        actions: PathBuf,
        /// Suppress progress output
        #[arg(long)]
        quiet: bool,
    },
    /// Campaign operations
    Campaign {
        #[command(subcommand)]
        action: CampaignAction,
    },
}

#[derive(Subcommand)]
enum CampaignAction {
    /// List campaigns
    List {
        /// Maximum campaigns to show
        #[arg(long, default_value_t = 20)]
        limit: i64,
    },
    /// Show a campaign and its kickoff events
    Show {
        /// Campaign ID
        id: i64,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    let config = Config::from_env()?;

    match cli.command {
        Command::Trigger {
            campaign_id,
            batch_limit,
            contact_id,
            actions,
            quiet,
        } => cmd_trigger(config, campaign_id, batch_limit, contact_id, actions, quiet).await,
        Command::Campaign { action } => {
            let db = Db::connect(config.database_url.expose_secret()).await?;
            db.migrate().await?;
            let tables = TableConfig::new(&config.table_prefix);

            match action {
                CampaignAction::List { limit } => cmd_campaign_list(&db, &tables, limit).await,
                CampaignAction::Show { id } => cmd_campaign_show(&db, &tables, id).await,
            }
        }
    }
}

async fn cmd_trigger(
    config: Config,
    campaign_id: i64,
    batch_limit: Option<usize>,
    contact_id: Option<i64>,
    actions: PathBuf,
    quiet: bool,
) -> anyhow::Result<()> {
    let _guard = init_telemetry(TelemetryConfig {
        endpoint: config.otel_endpoint.clone(),
        service_name: "kickoff".to_string(),
    })?;

    let db = Arc::new(Db::connect(config.database_url.expose_secret()).await?);
    db.migrate().await?;

    let registry = Arc::new(ActionRegistry::load_from_dir(&actions)?);
    db.create_queue(DEFERRED_QUEUE).await?;
    for name in registry_queues(&registry) {
        db.create_queue(&name).await?;
    }

    let tables = TableConfig::new(&config.table_prefix);
    let campaign = db.get_campaign(&tables, CampaignId(campaign_id)).await?;
    if !campaign.published {
        anyhow::bail!("campaign {campaign_id} is not published");
    }

    let finder = KickoffContactFinder::new(Arc::clone(&db), tables.clone());
    let scheduler = TimingScheduler::new(Arc::clone(&db), tables.clone());
    let executor = ActionExecutor::new(Arc::clone(&db), tables.clone(), Arc::clone(&registry));
    let mut executioner = KickoffExecutioner::new(finder, scheduler, executor);

    let mut limiter = ContactLimiter::new(batch_limit.unwrap_or(config.batch_limit));
    if let Some(id) = contact_id {
        limiter = limiter.for_contact(ContactId(id));
    }

    let mut stdout = std::io::stdout();
    let output: Option<&mut dyn std::io::Write> = if quiet { None } else { Some(&mut stdout) };

    let counter = executioner.execute(&campaign, &mut limiter, output).await?;

    let hooks = HostHooks::detect(&db, &tables).await?;
    hooks.kickoff_finished(campaign.id, &counter).await?;

    println!("Done: {counter}");
    Ok(())
}

fn registry_queues(registry: &ActionRegistry) -> Vec<String> {
    // Queue names may repeat across handlers; create each once.
    let mut queues: Vec<String> = Vec::new();
    for meta in registry.iter() {
        if !queues.contains(&meta.queue) {
            queues.push(meta.queue.clone());
        }
    }
    queues
}

async fn cmd_campaign_list(db: &Db, tables: &TableConfig, limit: i64) -> anyhow::Result<()> {
    let campaigns = db.list_campaigns(tables, limit).await?;

    if campaigns.is_empty() {
        println!("No campaigns found.");
        return Ok(());
    }

    println!(
        "{:<8}  {:<32}  {:<10}  {:<8}  CREATED",
        "ID", "NAME", "PUBLISHED", "KICKOFFS"
    );
    println!("{}", "-".repeat(80));

    for campaign in &campaigns {
        let name = if campaign.name.len() > 32 {
            &campaign.name[..32]
        } else {
            &campaign.name
        };
        println!(
            "{:<8}  {:<32}  {:<10}  {:<8}  {}",
            campaign.id,
            name,
            if campaign.published { "yes" } else { "no" },
            campaign.root_event_count,
            campaign.created_at.format("%Y-%m-%d %H:%M")
        );
    }

    println!("\n{} campaign(s)", campaigns.len());
    Ok(())
}

async fn cmd_campaign_show(db: &Db, tables: &TableConfig, id: i64) -> anyhow::Result<()> {
    let campaign = db.get_campaign(tables, CampaignId(id)).await?;

    println!("ID:         {}", campaign.id);
    println!("Name:       {}", campaign.name);
    println!(
        "Published:  {}",
        if campaign.published { "yes" } else { "no" }
    );
    println!("Created:    {}", campaign.created_at);
    println!("Kickoffs:   {}", campaign.root_events.len());

    for event in &campaign.root_events {
        println!("---");
        println!("Event:      {} ({})", event.name, event.id);
        println!("Action:     {}", event.action_type);
        println!("Trigger:    {:?}", event.trigger);
        if let Some(ref window) = event.timing {
            println!("Timing:     {window:?}");
        }
        println!(
            "Params:     {}",
            serde_json::to_string_pretty(&event.params)?
        );
    }

    Ok(())
}
