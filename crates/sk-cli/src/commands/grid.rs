use std::collections::{HashMap, HashSet};
use std::path::Path;

use colored::Colorize;

use sk_core::Position;

pub fn run(path: &Path, threats: bool) -> Result<(), String> {
    let encounter = super::load_encounter(path)?;
    let grid = &encounter.grid;

    let mut marks: HashMap<Position, (char, bool)> = HashMap::new();
    let placements = encounter
        .players
        .iter()
        .map(|p| (p.name.as_str(), p.position, true))
        .chain(
            encounter
                .enemies
                .iter()
                .map(|e| (e.statblock.name.as_str(), e.position, false)),
        );
    for (name, position, player) in placements {
        grid.validate_placement(position)
            .map_err(|e| format!("{name}: {e}"))?;
        if marks.contains_key(&position) {
            return Err(format!("{name}: {position} is already taken"));
        }
        marks.insert(position, (glyph(name, player), player));
    }

    let zone: HashSet<Position> = if threats {
        grid.threat_zone(encounter.enemies.iter().map(|e| e.position))
    } else {
        HashSet::new()
    };

    println!(
        "  {} {}",
        "Battlefield".bold(),
        format!(
            "({}x{}, {} ft squares)",
            grid.width(),
            grid.height(),
            grid.feet_per_square()
        )
        .dimmed()
    );
    println!();

    for y in 0..grid.height() {
        let mut line = String::new();
        for x in 0..grid.width() {
            let position = Position::new(x, y);
            let cell = match marks.get(&position) {
                Some(&(c, true)) => c.to_string().green().bold().to_string(),
                Some(&(c, false)) => c.to_string().red().bold().to_string(),
                None if zone.contains(&position) && grid.is_passable(position) => {
                    "!".yellow().to_string()
                }
                None => grid.terrain_at(position).glyph().to_string(),
            };
            line.push_str(&cell);
        }
        println!("  {line}");
    }

    println!();
    print!(
        "  {} open  ~ difficult  # obstacle  {} player  {} enemy",
        ".".dimmed(),
        "A".green().bold(),
        "a".red().bold()
    );
    if threats {
        print!("  {} threatened", "!".yellow());
    }
    println!();
    Ok(())
}

/// Players show as the uppercase initial of their name, enemies lowercase.
fn glyph(name: &str, player: bool) -> char {
    let initial = name.chars().next().unwrap_or('?');
    if player {
        initial.to_ascii_uppercase()
    } else {
        initial.to_ascii_lowercase()
    }
}
