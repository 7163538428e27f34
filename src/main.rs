use std::process::ExitCode;

use clap::{Parser, Subcommand};
use dotenvy::dotenv;
use serde::Serialize;
use tracing::error;
use uuid::Uuid;

use planshift::{
    app_error::{AppError, AppResult},
    infra::{
        app::AppState,
        config::AppConfig,
        setup::{init_app_state, init_tracing},
    },
    use_cases::subscription::{ApiSubscriptionParams, CreateSubscriptionInput},
};

#[derive(Parser, Debug)]
#[command(name = "planshift")]
#[command(about = "Create and change customer subscriptions")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Subscribe a customer by external id to a plan by code
    Subscribe {
        #[arg(long)]
        organization: Uuid,
        /// External customer id, created on first use
        #[arg(long)]
        customer: String,
        #[arg(long)]
        plan: String,
        /// Membership that performed the change, reported in tracking
        #[arg(long)]
        membership: Option<Uuid>,
    },
    /// Subscribe a customer to a plan, both by internal id
    SubscribeById {
        #[arg(long)]
        organization: Uuid,
        #[arg(long)]
        customer_id: Uuid,
        #[arg(long)]
        plan_id: Uuid,
        #[arg(long)]
        membership: Option<Uuid>,
    },
    /// Print a customer's subscriptions, newest first
    History {
        #[arg(long)]
        organization: Uuid,
        #[arg(long)]
        customer: String,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    dotenv().ok();
    let cli = Cli::parse();

    let config = AppConfig::from_env();
    init_tracing(config.log_file.as_deref())?;

    let runtime = init_app_state(config).await?;
    let result = run(&runtime.state, cli.command).await;

    // Queued billing and tracking jobs are flushed before exiting
    runtime.shutdown().await;

    match result {
        Ok(output) => {
            println!("{output}");
            Ok(ExitCode::SUCCESS)
        }
        Err(e) => {
            error!(error = %e, "Command failed");
            println!("{}", serde_json::to_string_pretty(&e.to_response())?);
            Ok(ExitCode::FAILURE)
        }
    }
}

async fn run(state: &AppState, command: Command) -> AppResult<String> {
    let use_cases = &state.subscription_use_cases;

    match command {
        Command::Subscribe {
            organization,
            customer,
            plan,
            membership,
        } => {
            let params = ApiSubscriptionParams {
                customer_id: Some(customer),
                plan_code: Some(plan),
            };
            let subscription = use_cases
                .create_from_api(organization, params, membership)
                .await?;
            to_pretty_json(&subscription)
        }
        Command::SubscribeById {
            organization,
            customer_id,
            plan_id,
            membership,
        } => {
            let input = CreateSubscriptionInput {
                organization_id: organization,
                customer_id,
                plan_id,
            };
            let subscription = use_cases.create(input, membership).await?;
            to_pretty_json(&subscription)
        }
        Command::History {
            organization,
            customer,
        } => {
            let subscriptions = use_cases
                .list_customer_subscriptions(organization, &customer)
                .await?;
            to_pretty_json(&subscriptions)
        }
    }
}

fn to_pretty_json<T: Serialize>(value: &T) -> AppResult<String> {
    serde_json::to_string_pretty(value)
        .map_err(|e| AppError::Internal(e.to_string()))
}
