//! Letterfall: a headless scripted round of the letter-catching game
//!
//! Loads the bundled settings, level and asset manifest, runs one round on
//! a fixed timestep, then persists the outcome.

mod config;
mod game;
mod store;

use config::LevelConfig;
use game::LetterfallGame;
use letterfall_engine::config::{Config, GameSettings};
use letterfall_engine::foundation::time::FixedStep;
use letterfall_engine::persistence::ScoreStore;
use store::RonScoreStore;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let settings = GameSettings::from_toml_str(include_str!("../resources/settings.toml"))?;
    settings.validate().map_err(|e| format!("settings: {e}"))?;
    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or(&settings.log_level),
    )
    .init();

    let level = LevelConfig::from_ron_str(include_str!("../resources/level_default.ron"))?;
    log::info!("starting round on level '{}'", level.name);

    let mut game = LetterfallGame::new(
        &settings,
        level,
        include_str!("../resources/manifest.ron"),
    )?;

    let mut stepper = FixedStep::new(settings.timestep);
    while !game.round_over() {
        stepper.accumulate(settings.timestep);
        while let Some(delta_time) = stepper.consume() {
            game.update(delta_time);
        }
    }

    log::info!(
        "round over: score {}, words {:?}",
        game.score(),
        game.completed_words()
    );

    let record = game.record("chef");
    let mut store = RonScoreStore::new("scores.ron");
    store.save_score(&record)?;
    for (rank, entry) in store.top_scores(5)?.iter().enumerate() {
        log::info!("{}. {} - {}", rank + 1, entry.player, entry.score);
    }

    Ok(())
}
