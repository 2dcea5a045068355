use clap::{Args, Subcommand};
use serde_json::Value;

use amortization_core::inputs::presets::{self, FileStore};

use crate::config::Settings;

#[derive(Args)]
pub struct PresetsArgs {
    #[command(subcommand)]
    pub action: PresetsAction,
}

#[derive(Subcommand)]
pub enum PresetsAction {
    /// Show stored presets, or the shipped defaults when none are stored
    List,
    /// Overwrite stored presets with the shipped defaults
    Reset,
}

pub fn run_presets(args: PresetsArgs, settings: &Settings) -> Result<Value, Box<dyn std::error::Error>> {
    let mut store = FileStore::new(&settings.presets_dir);
    let list = match args.action {
        PresetsAction::List => presets::load_presets(&store),
        PresetsAction::Reset => presets::reset_presets(&mut store)?,
    };
    Ok(serde_json::json!({ "result": list }))
}
