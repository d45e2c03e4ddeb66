use anyhow::Context;
use careplan_core::{Action, CloseReason, FieldEdit, Mode, OpenContext, Workflow};
use careplan_gateway::{EntityGateway, HttpGateway};
use careplan_wire::EntityId;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod config;
mod host;
mod output;
mod script;

use config::CliConfig;
use host::TerminalHost;

#[derive(Parser)]
#[command(name = "careplan")]
#[command(about = "Care plan authoring CLI")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List care plans with their goals
    CarePlans,
    /// List the staff directory
    Staff,
    /// List a goal's interventions
    Interventions {
        /// Goal id
        goal_id: EntityId,
    },
    /// List a goal's reviews
    Reviews {
        /// Goal id
        goal_id: EntityId,
    },
    /// Create a standalone care plan
    CreateCarePlan {
        /// Visit the care plan belongs to
        #[arg(long)]
        visit_id: EntityId,
        /// Title (at least 3 characters)
        #[arg(long)]
        title: String,
        /// Description (at most 500 characters)
        #[arg(long)]
        description: Option<String>,
    },
    /// Run a scripted authoring session from a YAML file
    Author {
        /// Path to the script
        script: PathBuf,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("careplan=info".parse()?),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    let cfg = CliConfig::from_env()?;
    let gateway = HttpGateway::new(&cfg.gateway, Arc::new(cfg.token))?;
    let today = chrono::Local::now().date_naive();
    let mut stdout = std::io::stdout().lock();

    match cli.command {
        Commands::CarePlans => {
            let plans = gateway.list_care_plans().await?;
            output::care_plans(&mut stdout, &plans)?;
        }
        Commands::Staff => {
            let staff = gateway.list_staff().await?;
            output::staff(&mut stdout, &staff)?;
        }
        Commands::Interventions { goal_id } => {
            let items = gateway.list_interventions(&goal_id).await?;
            output::interventions(&mut stdout, &items)?;
        }
        Commands::Reviews { goal_id } => {
            let items = gateway.list_reviews(&goal_id).await?;
            output::reviews(&mut stdout, &items)?;
        }
        Commands::CreateCarePlan {
            visit_id,
            title,
            description,
        } => {
            let mut workflow = Workflow::new(gateway, TerminalHost::new(stdout));
            workflow
                .open(OpenContext::new(Mode::CarePlan, today).for_visit(visit_id))
                .await;
            let mut actions = vec![Action::Edit(FieldEdit::CarePlanTitle(title))];
            if let Some(description) = description {
                actions.push(Action::Edit(FieldEdit::CarePlanDescription(description)));
            }
            actions.push(Action::SaveAndComplete);
            for action in actions {
                workflow.dispatch(action).await?;
            }
            workflow.close().await;

            let (_, host) = workflow.into_parts();
            if host.close_reason() != Some(CloseReason::Completed) {
                anyhow::bail!("care plan was not created");
            }
        }
        Commands::Author { script } => {
            let loaded = script::Script::load(&script)?;
            let mut workflow = Workflow::new(gateway, TerminalHost::new(stdout));
            script::run(loaded, &mut workflow, today)
                .await
                .with_context(|| format!("script {} stopped", script.display()))?;

            let (_, host) = workflow.into_parts();
            if host.errors() > 0 {
                tracing::warn!("{} step(s) reported errors", host.errors());
            }
        }
    }

    Ok(())
}
