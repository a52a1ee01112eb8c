use breathwork_core::{Config, SessionStage};
use clap::Subcommand;

#[derive(Subcommand)]
pub enum StageAction {
    /// Print the stage reached after MS milliseconds on the page
    At {
        /// Elapsed milliseconds since load
        elapsed_ms: u64,
    },
    /// Print the configured stage boundaries
    Thresholds,
}

pub fn run(action: StageAction) -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::load()?;
    let thresholds = config.stage_thresholds();
    match action {
        StageAction::At { elapsed_ms } => {
            let stage = thresholds.stage_at(elapsed_ms);
            println!("{}", serde_json::to_string_pretty(&serde_json::json!({
                "elapsed_ms": elapsed_ms,
                "stage": stage,
                "reveal": stage.reveal(),
            }))?);
        }
        StageAction::Thresholds => {
            let engagement_ends = thresholds.arrival_ms.saturating_add(thresholds.engagement_ms);
            println!("{}: 0..={} ms", SessionStage::Arrival, thresholds.arrival_ms);
            println!(
                "{}: {}..={} ms",
                SessionStage::Engagement,
                thresholds.starts_at(SessionStage::Engagement),
                engagement_ends
            );
            println!(
                "{}: {}.. ms",
                SessionStage::Active,
                thresholds.starts_at(SessionStage::Active)
            );
        }
    }
    Ok(())
}
