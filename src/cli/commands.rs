use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "dealrank", about = "Investor-specific deal scoring, thesis matching and alerts")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Add a deal
    DealAdd {
        /// JSON with name, description, sectors, stage, country, region, business_model,
        /// revenue, growth_rate, burn_rate, team_size, features, flags
        json: String,
    },
    /// Show a deal
    Deal { id: String },
    /// Set an investor's sub-score weights (normalized before storing)
    ProfileSet {
        investor: String,
        #[arg(long)]
        market: f64,
        #[arg(long)]
        traction: f64,
        #[arg(long)]
        team: f64,
        #[arg(long)]
        financial: f64,
    },
    /// Show an investor's weights
    Profile { investor: String },
    /// Aggregate caller-supplied sub-scores into a composite score
    Aggregate {
        deal_id: String,
        investor: String,
        /// JSON with market, traction, team, financial, founder, red_flags
        json: String,
    },
    /// Score a deal through the scoring service
    Score { deal_id: String, investor: String },
    /// Score history for a deal, newest first
    History {
        deal_id: String,
        investor: String,
        #[arg(long, default_value = "20")]
        limit: usize,
    },
    /// Compare the latest scores of several deals
    Compare {
        investor: String,
        #[arg(required = true)]
        deal_ids: Vec<String>,
    },
    /// Create a thesis
    ThesisAdd {
        investor: String,
        /// JSON with title, description, criteria
        json: String,
    },
    /// Update a thesis
    ThesisUpdate {
        thesis_id: String,
        investor: String,
        /// JSON with any of title, description, criteria
        json: String,
    },
    /// Deactivate a thesis
    ThesisDeactivate { thesis_id: String, investor: String },
    /// List an investor's theses
    Theses {
        investor: String,
        /// Include inactive theses
        #[arg(long)]
        all: bool,
    },
    /// Match a deal against a thesis
    Match { thesis_id: String, deal_id: String },
    /// Best stored matches for a thesis
    Matches {
        thesis_id: String,
        #[arg(long, default_value = "0")]
        min: f64,
        #[arg(long, default_value = "20")]
        limit: usize,
    },
    /// Best stored matches across all of an investor's theses
    InvestorMatches {
        investor: String,
        #[arg(long, default_value = "0")]
        min: f64,
        /// Per-thesis limit
        #[arg(long, default_value = "20")]
        limit: usize,
    },
    /// Run a batch job and wait for it
    Batch {
        /// Job kind (score, match, recalculate)
        kind: String,
        investor: String,
        #[arg(required = true)]
        deal_ids: Vec<String>,
        /// Thesis id, required for match jobs
        #[arg(long)]
        thesis: Option<String>,
    },
    /// Re-score every known deal for an investor
    Recalculate { investor: String },
    /// List alerts
    Alerts {
        investor: String,
        #[arg(long = "type")]
        alert_type: Option<String>,
        #[arg(long)]
        status: Option<String>,
        #[arg(long)]
        include_expired: bool,
        #[arg(long)]
        limit: Option<usize>,
    },
    /// Mark an alert read
    AlertRead { alert_id: String, investor: String },
    /// Archive an alert
    AlertArchive { alert_id: String, investor: String },
    /// Archive every expired alert
    AlertsExpire,
    /// Report an externally detected anomaly
    Anomaly {
        /// JSON with investor_id, kind, title, description, deal_id, portfolio_id
        json: String,
    },
    /// Show the alert trigger rules in effect
    Rules,
    /// List registered notification channels
    Channels,
    /// Send an alert to notification channels
    Notify {
        alert_id: String,
        /// Targets as channel:recipient, e.g. webhook:https://hooks.example/x or log:ops
        #[arg(required = true)]
        targets: Vec<String>,
    },
}
