// Terminal demo: run one guided session against the engine
use std::time::Duration;

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use breathwell::commands;
use breathwell::db::models::SessionStats;

#[derive(Parser)]
#[command(version, about = "Guided breathing sessions in the terminal")]
struct Cli {
    /// Technique id (deep, box, 478)
    #[arg(short, long, default_value = "box")]
    technique: String,

    /// Breath cycles to run before the session ends
    #[arg(short, long, default_value_t = 3)]
    cycles: u32,

    /// Volume percentage (0-100)
    #[arg(short, long, default_value_t = 70.0)]
    volume: f32,

    /// Use recorded breath clips instead of synthetic tones
    #[arg(long)]
    recorded: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();
    let state = breathwell::bootstrap()?;

    commands::set_volume(&state, cli.volume).map_err(anyhow::Error::msg)?;
    commands::set_recorded_audio(&state, cli.recorded).map_err(anyhow::Error::msg)?;

    let technique = commands::select_technique(&state, &cli.technique).map_err(anyhow::Error::msg)?;
    println!("{} — {}", technique.name, technique.description);

    commands::play(&state).await.map_err(anyhow::Error::msg)?;

    let mut last_line = String::new();
    loop {
        tokio::time::sleep(Duration::from_millis(250)).await;
        let snapshot = commands::get_session_state(&state).map_err(anyhow::Error::msg)?;
        if snapshot.cycles_completed >= cli.cycles {
            break;
        }
        if let Some(phase) = &snapshot.current_phase {
            let line = format!(
                "[{}] {:<6} {:>2}s  cycle {}/{}",
                snapshot.session_elapsed,
                phase.name,
                snapshot.phase_remaining,
                snapshot.cycles_completed + 1,
                cli.cycles
            );
            if line != last_line {
                println!("{}  — {}", line, phase.instruction);
                last_line = line;
            }
        }
    }

    commands::pause(&state).map_err(anyhow::Error::msg)?;

    let snapshot = commands::get_session_state(&state).map_err(anyhow::Error::msg)?;
    let now = chrono::Utc::now();
    let stats = commands::add_session_stats(
        &state,
        SessionStats {
            id: now.timestamp_millis().to_string(),
            technique: technique.id.clone(),
            duration: snapshot.session_elapsed_secs as i64,
            cycles_completed: snapshot.cycles_completed as i64,
            timestamp: now.to_rfc3339(),
        },
    )
    .map_err(anyhow::Error::msg)?;

    println!(
        "Session saved: {} cycles of {} in {}",
        stats.cycles_completed, technique.name, snapshot.session_elapsed
    );

    state.audio.destroy();
    Ok(())
}
