use std::collections::HashSet;
use std::path::Path;

use colored::Colorize;
use comfy_table::{ContentArrangement, Table};
use tracing::warn;

use sk_core::{Position, Side};
use sk_mechanics::Combatant;
use sk_monster::CombatMemory;
use sk_session::{CombatEventKind, CombatOutcome, CombatSession, SessionResult, SessionStatus};

/// Reason recorded when the round limit stops a fight.
const ROUND_LIMIT: &str = "round_limit";

pub fn run(path: &Path, seed: Option<u64>, max_rounds: u32, quiet: bool) -> Result<(), String> {
    let encounter = super::load_encounter(path)?;
    let mut config = encounter.config;
    if let Some(seed) = seed {
        config.seed = seed;
    }
    let seed = config.seed;

    let mut session = CombatSession::new(config, encounter.grid, CombatMemory::new());
    if let Some(location) = encounter.location {
        session = session.with_location(location);
    }
    let trigger = encounter.trigger;
    session
        .start(trigger.clone(), encounter.players, encounter.enemies)
        .map_err(|e| format!("cannot start combat: {e}"))?;

    while session.status() == SessionStatus::Active {
        if session.round() > max_rounds {
            session.force_end(ROUND_LIMIT);
            break;
        }
        autopilot(&mut session)?;
        session
            .end_turn()
            .map_err(|e| format!("combat halted: {e}"))?;
    }

    println!(
        "  {} '{trigger}' {}",
        "Combat".bold(),
        format!("(seed={seed})").dimmed()
    );
    println!();

    if !quiet {
        println!("  {}", "Event Log".bold().underline());
        println!();
        for event in session.events().events() {
            let round_label = format!("[round {:>2}]", event.round).dimmed();
            let desc = colorize_event(&event.kind, &event.description);
            println!("  {round_label} {desc}");
        }
        println!();
    }

    println!("  {}", "Combatants".bold().underline());
    println!();
    let mut table = Table::new();
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec!["Combatant", "Side", "HP", "AC", "Position", "State"]);
    for c in session.combatants() {
        table.add_row(vec![
            c.name.clone(),
            c.side.to_string(),
            format!("{}/{}", c.hit_points, c.max_hit_points),
            c.armor_class.to_string(),
            c.position.to_string(),
            state_of(c),
        ]);
    }
    println!("{table}");
    println!();

    if let Some(result) = session.result() {
        let outcome = match result.outcome {
            CombatOutcome::Victory => result.outcome.to_string().green().bold(),
            CombatOutcome::Defeat => result.outcome.to_string().red().bold(),
            CombatOutcome::Interrupted => result.outcome.to_string().yellow().bold(),
        };
        println!(
            "  Outcome: {outcome} {}",
            format!("({})", result.reason).dimmed()
        );
        println!(
            "  {} rounds, {} enemies defeated, {} XP",
            result.rounds,
            result.defeated_enemies.len(),
            result.total_xp
        );
    }

    Ok(())
}

/// Play the current turn for a player: attack the nearest enemy in reach,
/// otherwise move toward the nearest enemy and attack if that closes the
/// gap. Monster turns have already been played by the session.
fn autopilot(session: &mut CombatSession) -> Result<(), String> {
    let Some(actor) = session
        .current_combatant()
        .filter(|c| c.is_player_controlled())
        .cloned()
    else {
        return Ok(());
    };

    let mut enemies: Vec<(u32, Combatant)> = session
        .living(Side::Enemy)
        .map(|e| (e.position.chebyshev(actor.position), e.clone()))
        .collect();
    enemies.sort_by(|(da, a), (db, b)| da.cmp(db).then_with(|| a.id.cmp(&b.id)));

    for (_, enemy) in &enemies {
        if let Some(index) = attack_reaching(session, &actor, actor.position, enemy.position) {
            return act(session.attack(&actor.id, &enemy.id, index).map(|_| ()));
        }
    }

    let Some((distance, nearest)) = enemies.first() else {
        return Ok(());
    };
    let occupied: HashSet<Position> = session
        .combatants()
        .filter(|c| c.id != actor.id && !c.has_fled())
        .map(|c| c.position)
        .collect();
    let step = session.grid().step_toward(
        actor.position,
        nearest.position,
        actor.economy.movement,
        &occupied,
    );
    if let Some(spot) = step
        && spot.chebyshev(nearest.position) < *distance
    {
        act(session.move_to(&actor.id, spot).map(|_| ()))?;
        if let Some(index) = attack_reaching(session, &actor, spot, nearest.position) {
            act(session.attack(&actor.id, &nearest.id, index).map(|_| ()))?;
        }
    }
    Ok(())
}

fn attack_reaching(
    session: &CombatSession,
    actor: &Combatant,
    from: Position,
    target: Position,
) -> Option<usize> {
    let radius = session.config().rules.ranged_radius_squares;
    actor
        .attacks
        .iter()
        .position(|a| session.grid().in_attack_range(from, target, a.is_ranged(), radius))
}

/// A rejected autopilot action is skipped; anything else stops the run.
fn act(result: SessionResult<()>) -> Result<(), String> {
    match result {
        Ok(()) => Ok(()),
        Err(e) if e.is_validation() => {
            warn!(error = %e, "autopilot action rejected");
            Ok(())
        }
        Err(e) => Err(e.to_string()),
    }
}

fn state_of(c: &Combatant) -> String {
    if c.has_fled() {
        "fled".yellow().to_string()
    } else if c.is_living() {
        "standing".green().to_string()
    } else if c.side == Side::Enemy {
        "dead".red().to_string()
    } else {
        "down".red().to_string()
    }
}

fn colorize_event(kind: &CombatEventKind, description: &str) -> colored::ColoredString {
    match kind {
        CombatEventKind::CombatantDown { .. } | CombatEventKind::InvariantViolation { .. } => {
            description.red().bold()
        }
        CombatEventKind::DamageApplied { .. } => description.red(),
        CombatEventKind::AttackResolved { .. } => description.normal(),
        CombatEventKind::CombatantMoved { .. } | CombatEventKind::Dashed { .. } => {
            description.blue()
        }
        CombatEventKind::StatusApplied { .. } | CombatEventKind::StatusExpired { .. } => {
            description.cyan()
        }
        CombatEventKind::FleeAttempted { .. } | CombatEventKind::CombatantFled { .. } => {
            description.yellow()
        }
        CombatEventKind::AiDecided { .. } => description.dimmed(),
        CombatEventKind::SessionStarted { .. }
        | CombatEventKind::RoundStarted { .. }
        | CombatEventKind::SessionEnded { .. } => description.bold(),
        CombatEventKind::TurnStarted { .. } | CombatEventKind::CombatantJoined { .. } => {
            description.green()
        }
    }
}
