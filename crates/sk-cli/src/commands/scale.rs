use std::path::Path;

use colored::Colorize;
use comfy_table::{ContentArrangement, Table};

use sk_mechanics::Combatant;
use sk_monster::ScalingEngine;
use sk_session::PlayerTemplate;

pub fn run(path: &Path) -> Result<(), String> {
    let encounter = super::load_encounter(path)?;
    if encounter.players.is_empty() {
        return Err("encounter has no players to scale against".into());
    }

    let engine = ScalingEngine::new(encounter.config.scaling.clone());
    let party: Vec<Combatant> = encounter
        .players
        .into_iter()
        .map(PlayerTemplate::into_combatant)
        .collect();
    let power = engine.party_power(&party);

    println!(
        "  {} {power:.1} {}",
        "Party power".bold(),
        format!("({} members)", party.len()).dimmed()
    );
    println!();

    let mut table = Table::new();
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec![
        "Monster",
        "Challenge",
        "Factor",
        "HP",
        "AC",
        "Damage",
    ]);

    for spawn in &encounter.enemies {
        let statblock = &spawn.statblock;
        statblock.validate().map_err(|e| e.to_string())?;
        let scaled = engine.scale_for_party(statblock, &party, 1.0);
        let record = &scaled.record;
        let damage = scaled
            .statblock
            .attacks
            .iter()
            .map(|a| match a.scaled_damage {
                Some(flat) => format!("{} {} -> {flat}", a.name, a.damage),
                None => format!("{} {}", a.name, a.damage),
            })
            .collect::<Vec<_>>()
            .join(", ");

        table.add_row(vec![
            statblock.name.clone(),
            format!("{:.1}", record.base_challenge),
            format_factor(record.factor),
            format!(
                "{} -> {}",
                record.original_hit_points, scaled.statblock.hit_points
            ),
            format!(
                "{} -> {}",
                record.original_armor_class, scaled.statblock.armor_class
            ),
            if damage.is_empty() {
                "--".to_string()
            } else {
                damage
            },
        ]);
    }

    println!("{table}");
    Ok(())
}

fn format_factor(factor: f64) -> String {
    let text = format!("x{factor:.2}");
    if factor > 1.0 {
        text.red().to_string()
    } else if factor < 1.0 {
        text.green().to_string()
    } else {
        text
    }
}
