use clap::Parser;
use dealrank::application::alert_engine::AlertDecision;
use dealrank::application::dispatch::ChannelTarget;
use dealrank::cli::commands::{Cli, Commands};
use dealrank::config::Config;
use dealrank::domain::entities::batch_job::JobSpec;
use dealrank::domain::entities::deal::Deal;
use dealrank::domain::entities::thesis::{ThesisCriteria, ThesisUpdate};
use dealrank::domain::ports::alert_repository::AlertFilter;
use dealrank::domain::values::alert_event::{AlertEvent, AnomalySignal};
use dealrank::domain::values::job_state::JobKind;
use dealrank::domain::values::sub_scores::SubScoreSet;
use dealrank::domain::values::weight_profile::WeightProfile;
use dealrank::DealRank;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing_subscriber::EnvFilter;

const JOB_POLL_INTERVAL: Duration = Duration::from_millis(100);

#[derive(Deserialize)]
struct NewThesis {
    title: String,
    description: String,
    #[serde(default)]
    criteria: ThesisCriteria,
}

#[derive(Serialize)]
struct Evaluated<T> {
    #[serde(flatten)]
    result: T,
    alerts: Vec<AlertDecision>,
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error reading configuration: {e}");
            std::process::exit(1);
        }
    };

    let app = match DealRank::new(&config) {
        Ok(app) => app,
        Err(e) => {
            eprintln!("Error initializing dealrank: {e}");
            std::process::exit(1);
        }
    };

    if let Err(e) = run_command(app, cli.command).await {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

fn print_json<T: Serialize>(value: &T) -> Result<(), Box<dyn std::error::Error>> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

async fn run_command(app: DealRank, cmd: Commands) -> Result<(), Box<dyn std::error::Error>> {
    match cmd {
        Commands::DealAdd { json } => {
            let mut data: serde_json::Value = serde_json::from_str(&json)?;
            let fields = data.as_object_mut().ok_or("Deal JSON must be an object")?;
            fields
                .entry("id")
                .or_insert_with(|| uuid::Uuid::new_v4().to_string().into());
            let deal: Deal = serde_json::from_value(data)?;
            print_json(&app.add_deal(deal)?)?;
        }
        Commands::Deal { id } => print_json(&app.get_deal(&id)?)?,
        Commands::ProfileSet {
            investor,
            market,
            traction,
            team,
            financial,
        } => {
            let weights = WeightProfile::new(market, traction, team, financial);
            print_json(&app.set_weight_profile(&investor, weights)?)?;
        }
        Commands::Profile { investor } => print_json(&app.weight_profile(&investor)?)?,
        Commands::Aggregate {
            deal_id,
            investor,
            json,
        } => {
            let sub_scores: SubScoreSet = serde_json::from_str(&json)?;
            let score = app.aggregate(&deal_id, &investor, &sub_scores)?;
            let alerts = app.evaluate_alert(&AlertEvent::Score(score.clone()))?;
            print_json(&Evaluated {
                result: score,
                alerts,
            })?;
        }
        Commands::Score { deal_id, investor } => {
            let score = app.score_deal(&deal_id, &investor).await?;
            let alerts = app.evaluate_alert(&AlertEvent::Score(score.clone()))?;
            print_json(&Evaluated {
                result: score,
                alerts,
            })?;
        }
        Commands::History {
            deal_id,
            investor,
            limit,
        } => print_json(&app.score_history(&deal_id, &investor, limit)?)?,
        Commands::Compare { investor, deal_ids } => {
            print_json(&app.compare_scores(&deal_ids, &investor)?)?
        }
        Commands::ThesisAdd { investor, json } => {
            let input: NewThesis = serde_json::from_str(&json)?;
            let thesis = app.create_thesis(&investor, input.title, input.description, input.criteria)?;
            print_json(&thesis)?;
        }
        Commands::ThesisUpdate {
            thesis_id,
            investor,
            json,
        } => {
            let update: ThesisUpdate = serde_json::from_str(&json)?;
            print_json(&app.update_thesis(&thesis_id, &investor, update)?)?;
        }
        Commands::ThesisDeactivate {
            thesis_id,
            investor,
        } => print_json(&app.deactivate_thesis(&thesis_id, &investor)?)?,
        Commands::Theses { investor, all } => print_json(&app.list_theses(&investor, all)?)?,
        Commands::Match { thesis_id, deal_id } => {
            let m = app.match_deal(&thesis_id, &deal_id).await?;
            let alerts = app.evaluate_alert(&AlertEvent::Match(m.clone()))?;
            print_json(&Evaluated { result: m, alerts })?;
        }
        Commands::Matches {
            thesis_id,
            min,
            limit,
        } => print_json(&app.top_matches(&thesis_id, min, limit)?)?,
        Commands::InvestorMatches {
            investor,
            min,
            limit,
        } => print_json(&app.matches_for_investor(&investor, min, limit)?)?,
        Commands::Batch {
            kind,
            investor,
            deal_ids,
            thesis,
        } => {
            let kind: JobKind = kind.parse().map_err(|e: String| e)?;
            let job_id = app
                .submit_batch_job(JobSpec {
                    kind,
                    investor_id: investor,
                    thesis_id: thesis,
                    target_ids: deal_ids,
                })
                .await?;
            print_json(&app.wait_for_job(&job_id, JOB_POLL_INTERVAL).await?)?;
        }
        Commands::Recalculate { investor } => {
            let job_id = app.recalculate_all(&investor).await?;
            print_json(&app.wait_for_job(&job_id, JOB_POLL_INTERVAL).await?)?;
        }
        Commands::Alerts {
            investor,
            alert_type,
            status,
            include_expired,
            limit,
        } => {
            let filter = AlertFilter {
                alert_type: alert_type.map(|t| t.parse()).transpose().map_err(|e: String| e)?,
                status: status.map(|s| s.parse()).transpose().map_err(|e: String| e)?,
                include_expired,
                limit,
            };
            print_json(&app.list_alerts(&investor, &filter)?)?;
        }
        Commands::AlertRead { alert_id, investor } => {
            print_json(&app.mark_alert_read(&alert_id, &investor)?)?
        }
        Commands::AlertArchive { alert_id, investor } => {
            print_json(&app.archive_alert(&alert_id, &investor)?)?
        }
        Commands::AlertsExpire => {
            let count = app.archive_expired_alerts(chrono::Utc::now())?;
            println!("Archived {count} expired alerts");
        }
        Commands::Anomaly { json } => {
            let signal: AnomalySignal = serde_json::from_str(&json)?;
            print_json(&app.evaluate_alert(&AlertEvent::Anomaly(signal))?)?;
        }
        Commands::Rules => print_json(&app.alert_rules())?,
        Commands::Channels => print_json(&app.notification_channels())?,
        Commands::Notify { alert_id, targets } => {
            let targets = targets
                .iter()
                .map(|t| parse_target(t))
                .collect::<Result<Vec<_>, _>>()?;
            print_json(&app.dispatch_notification(&alert_id, &targets).await?)?;
        }
    }
    Ok(())
}

fn parse_target(s: &str) -> Result<ChannelTarget, String> {
    match s.split_once(':') {
        Some((channel, recipient)) if !channel.is_empty() => Ok(ChannelTarget::new(channel, recipient)),
        _ => Err(format!("Invalid target: {s}. Use channel:recipient")),
    }
}
