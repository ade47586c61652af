use anyhow::{Context, Result};
use clap::Parser;
use serde::Serialize;
use std::io::Read;
use std::path::Path;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use cricket_scorer::config::{Command, Config};
use cricket_scorer::db::models::NewMatch;
use cricket_scorer::db::Database;
use cricket_scorer::scoring::{PlayersRequest, ScoringRequest, TossRequest};
use cricket_scorer::service::ScoringService;

fn main() -> Result<()> {
    let config = Config::parse();

    // Logs go to stderr; stdout carries the JSON output
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&config.log_filter)),
        )
        .init();

    config.validate()?;

    let db = Database::open(&config.database_path)?;
    info!("Database opened: {}", config.database_path);

    let service = ScoringService::new(db, config.rules());
    if let Err(e) = run(&service, config.command) {
        error!("{:#}", e);
        return Err(e);
    }
    Ok(())
}

/// Reads a JSON body from `path`, or stdin for `-`.
fn read_body(path: &Path) -> Result<String> {
    if path == Path::new("-") {
        let mut body = String::new();
        std::io::stdin()
            .read_to_string(&mut body)
            .context("Failed to read request from stdin")?;
        return Ok(body);
    }
    std::fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn run(service: &ScoringService<Database>, command: Command) -> Result<()> {
    match command {
        Command::Create { file } => {
            let new: NewMatch = serde_json::from_str(&read_body(&file)?)
                .context("Invalid match description")?;
            print_json(&service.create_match(new)?)
        }
        Command::Toss {
            match_id,
            winner,
            decision,
        } => {
            let request = TossRequest {
                toss_winner_team: winner,
                decision,
            };
            print_json(&service.set_toss(&match_id, &request)?)
        }
        Command::Score { match_id, request } => {
            let request = ScoringRequest::from_json(&read_body(&request)?)?;
            print_json(&service.score(&match_id, &request)?)
        }
        Command::Undo { match_id } => print_json(&service.undo(&match_id)?),
        Command::Players {
            match_id,
            striker,
            striker_id,
            non_striker,
            non_striker_id,
            bowler,
            bowler_id,
        } => {
            let request = PlayersRequest {
                striker_name: striker,
                striker_id,
                non_striker_name: non_striker,
                non_striker_id,
                bowler_name: bowler,
                bowler_id,
            };
            print_json(&service.set_players(&match_id, &request)?)
        }
        Command::NextInnings { match_id } => print_json(&service.start_second_innings(&match_id)?),
        Command::Complete { match_id } => print_json(&service.complete(&match_id)?),
        Command::Abandon { match_id } => print_json(&service.abandon(&match_id)?),
        Command::Delete { match_id } => {
            service.delete(&match_id)?;
            print_json(&serde_json::json!({ "deleted": match_id }))
        }
        Command::Show { match_id } => print_json(&service.get_match(&match_id)?),
        Command::List { status } => {
            let rows: Vec<_> = service
                .store()
                .list_matches(status)?
                .into_iter()
                .map(|(id, status)| serde_json::json!({ "id": id, "status": status }))
                .collect();
            print_json(&rows)
        }
        Command::Report { match_id, top } => print_json(&service.report(&match_id, top)?),
        Command::Career { player_id } => print_json(&service.player_career(&player_id)?),
        Command::Team { team_id } => print_json(&service.team_record(&team_id)?),
        Command::Stats { match_id } => match service.ensure_stats(&match_id)? {
            Some(summary) => print_json(&summary),
            None => {
                info!("Statistics for match {} were already applied", match_id);
                Ok(())
            }
        },
    }
}
