pub mod grid;
pub mod run;
pub mod scale;

use std::path::Path;

use serde::Deserialize;

use sk_grid::TacticalGrid;
use sk_session::{EngineConfig, EnemySpawn, PlayerTemplate};

fn default_trigger() -> String {
    "encounter".to_string()
}

/// Everything needed to start a fight, as read from an encounter file.
#[derive(Debug, Deserialize)]
pub struct Encounter {
    /// What started the fight, for the log.
    #[serde(default = "default_trigger")]
    pub trigger: String,
    /// Opaque location reference passed through to the session.
    #[serde(default)]
    pub location: Option<String>,
    pub grid: TacticalGrid,
    pub players: Vec<PlayerTemplate>,
    pub enemies: Vec<EnemySpawn>,
    #[serde(default)]
    pub config: EngineConfig,
}

/// Read and parse an encounter file.
fn load_encounter(path: &Path) -> Result<Encounter, String> {
    let text = std::fs::read_to_string(path)
        .map_err(|e| format!("cannot read {}: {e}", path.display()))?;
    serde_json::from_str(&text).map_err(|e| format!("invalid encounter {}: {e}", path.display()))
}
