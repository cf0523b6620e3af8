// Copyright (c) 2024-2026 Campaign Systems Contributors
//
// SPDX-License-Identifier: Apache-2.0
mod cli;

use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use cli::{Cli, Commands};
use tracing_subscriber::prelude::*;
use tracing_subscriber::{fmt, EnvFilter};
use uuid::Uuid;

use campaign_core::{Contact, Gender, WorkflowStatus};
use campaign_messenger::{BrowserSessionManager, MockMessenger};
use campaign_node::{
    ApiError, ControlPlane, CreateCampaignRequest, PauseRequest, ResumeRequest, StartRequest,
    StopRequest,
};
use campaign_store::{InMemoryStore, WorkflowStore};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Commands::ShowConfig { config } => show_config(config.as_deref()),
        Commands::Demo {
            contacts,
            browser,
            timing_mode,
            manual_min,
            manual_max,
            pause_after,
            config,
        } => {
            run_demo(
                contacts,
                browser.into(),
                timing_mode.into(),
                manual_min,
                manual_max,
                pause_after,
                config.as_deref(),
            )
            .await
        }
    }
}

fn show_config(config_path: Option<&std::path::Path>) -> anyhow::Result<()> {
    let cfg = campaign_config::load(config_path)?;
    println!("{}", serde_json::to_string_pretty(&cfg)?);
    Ok(())
}

/// Seed `n` synthetic contacts for one owner, alternating gender and Arabic
/// vs. English naming so a demo run exercises both template families.
fn seed_contacts(owner_id: Uuid, n: u32) -> Vec<Contact> {
    const FIRST_NAMES: &[&str] = &["Sara", "Omar", "Lina", "Yusuf", "Mona", "Adam"];
    (0..n)
        .map(|i| {
            let idx = i as usize % FIRST_NAMES.len();
            let gender = if i % 2 == 0 { Gender::Female } else { Gender::Male };
            Contact {
                id: Uuid::new_v4(),
                owner_id,
                first_name: FIRST_NAMES[idx].to_string(),
                arabic_name: if i % 3 == 0 { Some(format!("{}_ar", FIRST_NAMES[idx])) } else { None },
                english_name: Some(FIRST_NAMES[idx].to_string()),
                formatted_phone: format!("+1555000{:04}", i),
                gender,
                is_selected: true,
                status: WorkflowStatus::New,
            }
        })
        .collect()
}

#[allow(clippy::too_many_arguments)]
async fn run_demo(
    contact_count: u32,
    browser_kind: campaign_core::BrowserKind,
    timing_mode: campaign_core::TimingMode,
    manual_min: Option<u32>,
    manual_max: Option<u32>,
    pause_after: u32,
    config_path: Option<&std::path::Path>,
) -> anyhow::Result<()> {
    let config = Arc::new(campaign_config::load(config_path)?);
    let store: Arc<dyn WorkflowStore> = Arc::new(InMemoryStore::new());
    let messenger = Arc::new(MockMessenger::new());
    let sessions = Arc::new(BrowserSessionManager::new());
    let control = Arc::new(ControlPlane::new(store.clone(), messenger, sessions, config, None));

    let owner_id = Uuid::new_v4();
    let contacts = seed_contacts(owner_id, contact_count);
    let contact_ids: Vec<Uuid> = contacts.iter().map(|c| c.id).collect();
    for contact in contacts {
        store.put_contact(contact).await?;
    }

    let created = control
        .create_campaign(CreateCampaignRequest {
            owner_id,
            name: Some("demo campaign".to_string()),
            contact_ids,
            message_content: Some("Hi {firstName}, this is a demo message.".to_string()),
            male_message: None,
            female_message: None,
            use_gender_templates: false,
            attachment: None,
        })
        .await
        .map_err(api_err)?;
    tracing::info!(campaign_id = %created.id, contacts = created.contacts_count, "campaign created");

    let started = control
        .start(StartRequest {
            campaign_id: created.id,
            browser_kind,
            timing_mode,
            manual_min_delay: manual_min,
            manual_max_delay: manual_max,
        })
        .await
        .map_err(api_err)?;
    println!("started: {}", serde_json::to_string(&started)?);

    let mut paused_once = pause_after == 0;
    loop {
        tokio::time::sleep(Duration::from_millis(150)).await;
        let progress = control.progress(created.id).await.map_err(api_err)?;
        println!("{}", serde_json::to_string(&progress)?);

        if !paused_once && progress.processed >= pause_after {
            paused_once = true;
            let paused = control
                .pause(PauseRequest { campaign_id: created.id, current_progress: None })
                .await
                .map_err(api_err)?;
            println!("paused: {}", serde_json::to_string(&paused)?);
            tokio::time::sleep(Duration::from_millis(200)).await;
            let resumed = control
                .resume(ResumeRequest { campaign_id: created.id, browser_kind })
                .await
                .map_err(api_err)?;
            println!("resumed: {}", serde_json::to_string(&resumed)?);
        }

        if matches!(
            progress.status,
            campaign_core::CampaignStatus::Completed | campaign_core::CampaignStatus::Stopped
        ) {
            break;
        }
    }

    let _ = control
        .stop(StopRequest { campaign_id: created.id, current_progress: None })
        .await;
    let summary = control.workflow_summary(created.id).await.map_err(api_err)?;
    println!("summary: {}", serde_json::to_string(&summary)?);
    Ok(())
}

fn api_err(e: ApiError) -> anyhow::Error {
    anyhow::anyhow!(e)
}

fn init_logging(verbosity: u8) {
    let default_level = match verbosity {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("campaignctl={default_level},campaign_node={default_level}")));
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(false))
        .init();
}
