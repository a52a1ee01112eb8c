use breathwork_core::{BreathingPattern, Config};
use clap::Subcommand;
use serde::Serialize;

#[derive(Subcommand)]
pub enum PatternAction {
    /// List available patterns
    List {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show one pattern's phase lengths
    Show {
        /// Pattern id (e.g. "4-7-8")
        id: String,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Validate an ad-hoc "inhale-hold-exhale[-hold]" pattern
    Check {
        /// Pattern text, seconds per phase
        spec: String,
    },
}

#[derive(Serialize)]
struct PatternView<'a> {
    id: &'a str,
    inhale: u32,
    hold_in: u32,
    exhale: u32,
    hold_out: u32,
    cycle_secs: u64,
    default: bool,
}

impl<'a> PatternView<'a> {
    fn new(p: &'a BreathingPattern, default_id: &str) -> Self {
        Self {
            id: p.id(),
            inhale: p.inhale_secs(),
            hold_in: p.hold_in_secs(),
            exhale: p.exhale_secs(),
            hold_out: p.hold_out_secs(),
            cycle_secs: p.total_ms() / 1000,
            default: p.id() == default_id,
        }
    }

    fn line(&self) -> String {
        format!(
            "{}{:<12} in {:>2}s  hold {:>2}s  out {:>2}s  hold {:>2}s  ({}s cycle)",
            if self.default { "* " } else { "  " },
            self.id,
            self.inhale,
            self.hold_in,
            self.exhale,
            self.hold_out,
            self.cycle_secs
        )
    }
}

pub fn run(action: PatternAction) -> Result<(), Box<dyn std::error::Error>> {
    match action {
        PatternAction::List { json } => {
            let config = Config::load()?;
            let table = config.pattern_table()?;
            let default_id = config.breathing.default_pattern.as_str();
            let views: Vec<PatternView> = table
                .iter()
                .map(|p| PatternView::new(p, default_id))
                .collect();
            if json {
                println!("{}", serde_json::to_string_pretty(&views)?);
            } else {
                for view in &views {
                    println!("{}", view.line());
                }
            }
        }
        PatternAction::Show { id, json } => {
            let config = Config::load()?;
            let table = config.pattern_table()?;
            let view = PatternView::new(table.lookup(&id)?, &config.breathing.default_pattern);
            if json {
                println!("{}", serde_json::to_string_pretty(&view)?);
            } else {
                println!("{}", view.line());
            }
        }
        PatternAction::Check { spec } => {
            let pattern = BreathingPattern::parse(&spec)?;
            println!("{}", PatternView::new(&pattern, "").line());
        }
    }
    Ok(())
}
