//! Round state machine and the contact-to-event bridge

use crate::config::LevelConfig;
use letterfall_engine::assembly::AssemblyError;
use letterfall_engine::config::GameSettings;
use letterfall_engine::entity::{EntityKey, EntityKind, Stage};
use letterfall_engine::events::{EventPayload, GameEventType, MoveDirection};
use letterfall_engine::persistence::ScoreRecord;
use letterfall_engine::physics::{ContactEvent, ContactListener};
use letterfall_engine::{Engine, GameContext};
use nalgebra::Vector2;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;
use thiserror::Error;

/// Game-level errors
#[derive(Error, Debug)]
pub enum GameError {
    /// The level configuration is unusable
    #[error("level error: {0}")]
    Level(String),

    /// A required entity failed to assemble
    #[error("assembly error: {0}")]
    Assembly(#[from] AssemblyError),
}

/// Contacts of interest recorded during a tick, drained by the game
#[derive(Default)]
pub struct ContactInbox {
    /// Letter entities that touched the player
    pub caught: Vec<EntityKey>,
    /// Letter entities that came to rest on the ground
    pub grounded: Vec<EntityKey>,
}

/// Maps raw begin-contacts to game events and inbox entries
///
/// Player touching a letter means the letter was caught; anything touching
/// terrain raises a ground-contact event for the other participant.
pub struct LetterfallContactListener {
    inbox: Rc<RefCell<ContactInbox>>,
}

impl LetterfallContactListener {
    /// Create a listener feeding the shared inbox
    pub fn new(inbox: Rc<RefCell<ContactInbox>>) -> Self {
        Self { inbox }
    }
}

impl ContactListener for LetterfallContactListener {
    fn begin_contact(
        &mut self,
        contact: &ContactEvent,
        stage: &mut Stage,
        context: &mut GameContext,
    ) {
        let (first, second) = contact.entities();
        let kind_of = |key: EntityKey, stage: &Stage| stage.get(key).map(|e| e.kind());

        for (this, other) in [(first, second), (second, first)] {
            match (kind_of(this, stage), kind_of(other, stage)) {
                (Some(EntityKind::Player), Some(EntityKind::Item)) => {
                    self.inbox.borrow_mut().caught.push(other);
                }
                (Some(EntityKind::Terrain), Some(_)) => {
                    context.publish(
                        GameEventType::GroundContact,
                        EventPayload::GroundContact { entity: other },
                        stage,
                    );
                    if kind_of(other, stage) == Some(EntityKind::Item) {
                        self.inbox.borrow_mut().grounded.push(other);
                    }
                }
                _ => {}
            }
        }
    }
}

/// One round of letterfall: spawn letters, catch them, build words
pub struct LetterfallGame {
    engine: Engine,
    level: LevelConfig,
    player: EntityKey,
    letters: HashMap<EntityKey, char>,
    completed: Vec<String>,
    tray: Vec<char>,
    inbox: Rc<RefCell<ContactInbox>>,
    rng: StdRng,
    spawn_clock: f32,
    elapsed: f32,
    score: u32,
    letters_caught: u32,
}

impl LetterfallGame {
    /// Set up a round: build the engine, load assets, spawn the level
    pub fn new(
        settings: &GameSettings,
        level: LevelConfig,
        manifest: &str,
    ) -> Result<Self, GameError> {
        level.validate().map_err(GameError::Level)?;

        let mut engine = Engine::new(settings);
        engine
            .context_mut()
            .assets
            .load_manifest(manifest)
            .map_err(|e| GameError::Level(e.to_string()))?;
        engine
            .context_mut()
            .physics
            .set_gravity(Vector2::new(level.gravity.0, level.gravity.1));

        let inbox = Rc::new(RefCell::new(ContactInbox::default()));
        engine
            .context_mut()
            .physics
            .set_contact_listener(Box::new(LetterfallContactListener::new(Rc::clone(&inbox))));

        engine.spawn_entity(&level.ground)?;
        let player = engine.spawn_entity(&level.player)?;
        log::info!("level '{}' ready", level.name);

        Ok(Self {
            engine,
            level,
            player,
            letters: HashMap::new(),
            completed: Vec::new(),
            tray: Vec::new(),
            inbox,
            rng: StdRng::from_entropy(),
            spawn_clock: 0.0,
            elapsed: 0.0,
            score: 0,
            letters_caught: 0,
        })
    }

    /// Advance the round by one fixed step
    pub fn update(&mut self, delta_time: f32) {
        self.elapsed += delta_time;
        self.spawn_clock += delta_time;
        if self.spawn_clock >= self.level.spawn_interval {
            self.spawn_clock -= self.level.spawn_interval;
            let letter = self.random_letter();
            let x = self.random_spawn_x();
            self.spawn_letter_at(letter, x);
        }

        self.steer_player();
        self.engine.tick(delta_time);
        self.drain_contacts();
    }

    /// Whether the round is finished
    pub fn round_over(&self) -> bool {
        self.elapsed >= self.level.round_time
            || self.completed.len() == self.level.target_words.len()
    }

    /// Current score
    pub fn score(&self) -> u32 {
        self.score
    }

    /// Letters currently held in the tray
    pub fn tray(&self) -> &[char] {
        &self.tray
    }

    /// Words completed so far
    pub fn completed_words(&self) -> &[String] {
        &self.completed
    }

    /// Package the round outcome for persistence
    pub fn record(&self, player: impl Into<String>) -> ScoreRecord {
        ScoreRecord {
            player: player.into(),
            score: self.score,
            letters_caught: self.letters_caught,
            words_completed: self.completed.len() as u32,
        }
    }

    /// The engine running this round
    pub fn engine(&self) -> &Engine {
        &self.engine
    }

    fn random_letter(&mut self) -> char {
        let pool: Vec<char> = self.level.letter_pool.chars().collect();
        pool[self.rng.gen_range(0..pool.len())]
    }

    fn random_spawn_x(&mut self) -> f32 {
        let half = self.level.spawn_width / 2.0;
        self.rng.gen_range(-half..half)
    }

    fn spawn_letter_at(&mut self, letter: char, x: f32) {
        let mut config = self.level.letter_template.clone();
        config.position = (x, self.level.spawn_height);
        match self.engine.spawn_entity(&config) {
            Ok(key) => {
                self.letters.insert(key, letter);
                log::debug!("spawned letter '{letter}' at x = {x:.2}");
            }
            Err(err) => log::warn!("failed to spawn letter: {err}"),
        }
    }

    /// Chase the nearest falling letter
    fn steer_player(&mut self) {
        let Some(player_x) = self
            .engine
            .stage()
            .get(self.player)
            .map(|e| e.position().x)
        else {
            return;
        };
        let nearest = self
            .letters
            .keys()
            .filter_map(|&key| self.engine.stage().get(key))
            .map(|e| e.position().x)
            .min_by(|a, b| {
                (a - player_x)
                    .abs()
                    .total_cmp(&(b - player_x).abs())
            });
        let Some(target_x) = nearest else {
            return;
        };

        let delta = target_x - player_x;
        let direction = if delta > 0.2 {
            MoveDirection::Right
        } else if delta < -0.2 {
            MoveDirection::Left
        } else {
            return;
        };
        self.engine.publish(
            GameEventType::Move,
            EventPayload::Move {
                direction,
                speed: 4.0,
            },
        );
    }

    fn drain_contacts(&mut self) {
        let caught: Vec<EntityKey> = self.inbox.borrow_mut().caught.drain(..).collect();
        for key in caught {
            let Some(letter) = self.letters.remove(&key) else {
                continue;
            };
            // The letter entity terminates itself through its bound action.
            self.engine.publish(
                GameEventType::LetterCaught,
                EventPayload::LetterCaught {
                    entity: key,
                    letter,
                },
            );
            self.tray.push(letter);
            self.letters_caught += 1;
            self.score += 1;
            log::info!("caught '{}', tray: {:?}", letter, self.tray);
        }
        self.inbox.borrow_mut().grounded.clear();
        self.complete_words();
    }

    /// Consume tray letters for every target word that can now be built
    fn complete_words(&mut self) {
        let targets: Vec<String> = self
            .level
            .target_words
            .iter()
            .filter(|word| !self.completed.contains(word))
            .cloned()
            .collect();
        for word in targets {
            if !Self::tray_covers(&self.tray, &word) {
                continue;
            }
            for letter in word.chars() {
                if let Some(index) = self.tray.iter().position(|&c| c == letter) {
                    self.tray.remove(index);
                }
            }
            let points = 10 * word.len() as u32;
            self.score += points;
            self.completed.push(word.clone());
            self.engine.publish(
                GameEventType::WordCompleted,
                EventPayload::WordCompleted {
                    word: word.clone(),
                    points,
                },
            );
            log::info!("completed '{word}' for {points} points");
        }
    }

    fn tray_covers(tray: &[char], word: &str) -> bool {
        let mut available = tray.to_vec();
        word.chars().all(|letter| {
            if let Some(index) = available.iter().position(|&c| c == letter) {
                available.remove(index);
                true
            } else {
                false
            }
        })
    }
}
