pub mod commands;
pub mod config;
pub mod drop;
pub mod error;
pub mod runtime;
pub mod state;

use crate::config::ConsoleConfig;
use crate::error::ConsoleError;
use crate::runtime::{NoopSink, TranscriptPlayback};
use crate::state::AppState;
use chrono::Utc;
use dispatch_core::incidents::IncidentFilter;
use dispatch_core::seed;
use serde::Serialize;
use tracing::info;

/// Installs the `RUST_LOG`-driven subscriber. Binaries call this once.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .try_init();
}

pub fn build_state(config: ConsoleConfig) -> AppState {
    let cad = seed::demo_state(config.fleet_size, Utc::now());
    info!(
        fleet_size = config.fleet_size,
        required = ?config.required_categories,
        "console state seeded"
    );
    AppState::new(cad, config)
}

/// Headless console: replays the scripted call and logs the outcome.
pub fn run(config: ConsoleConfig) -> Result<(), ConsoleError> {
    let state = build_state(config);
    runtime::start(&state)
        .join()
        .map_err(|_| ConsoleError::StatePoisoned)?;

    let advisory = commands::get_advisory(&state)?;
    info!(advisory = %serde_json::to_string(&advisory)?, "playback finished");
    Ok(())
}

fn print_json(label: &str, value: &impl Serialize) -> Result<(), ConsoleError> {
    println!("{label}:\n{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Walks one call from first ring to alarm and prints a snapshot per step.
pub fn run_demo(config: ConsoleConfig) -> Result<(), ConsoleError> {
    let state = build_state(config);

    let mut playback = TranscriptPlayback::scripted();
    while runtime::emit_tick(&state, &NoopSink, &mut playback)? {}
    print_json("advisory", &commands::get_advisory(&state)?)?;

    commands::add_key_fact(&state, "Smoke from window".into())?;
    let call = commands::edit_call_field(
        &state,
        dispatch_core::call::CallField::Location,
        "45 Leopold Street".into(),
    )?;
    print_json("call", &call)?;

    let vehicle = serde_json::json!({
        "id": "MAP-ELW-1",
        "name": "Florian München 1/11-1",
        "subtype": "ELW",
        "category": "Fire",
        "status": "Available",
        "position": [48.152, 11.581]
    });
    commands::drop_unit_payload(&state, vehicle.to_string())?;
    commands::drop_unit_payload(&state, "{\"garbage\":true}".into())?;
    commands::toggle_resource(&state, "REC-4".into(), None)?;
    print_json("proposal", &commands::get_proposal(&state)?)?;
    print_json("compliance", &commands::get_compliance(&state)?)?;

    commands::decide_recommendation(&state, commands::RecommendationDecision::Accept)?;
    print_json("alarm", &commands::alarm_proposal(&state, "INC-2025-001".into())?)?;

    commands::update_unit_status(&state, "REC-1".into(), "S5".into())?;
    print_json("advisory", &commands::get_advisory(&state)?)?;
    commands::acknowledge_voice_contact(&state, "REC-1".into())?;

    print_json("incidents", &commands::list_incidents(&state, IncidentFilter::Active)?)?;
    print_json("hospitals", &commands::list_hospitals(&state)?)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn build_state_uses_configured_fleet() {
        let config = ConsoleConfig {
            fleet_size: 5,
            ..ConsoleConfig::default()
        };
        let state = build_state(config);
        let units = commands::list_units(&state, None).expect("units");
        assert_eq!(units.len(), 9);
    }

    #[test]
    fn demo_runs_end_to_end() {
        let config = ConsoleConfig {
            fleet_size: 6,
            ..ConsoleConfig::default()
        };
        run_demo(config).expect("demo");
    }
}
