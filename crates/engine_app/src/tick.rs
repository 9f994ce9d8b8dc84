//! Host-side frame driver.
//!
//! The core never drives a clock. [`TickLoop`] is the host that does: it
//! calls [`Game::update`] then [`Game::render`] once per frame with a fixed
//! `1 / tick_rate` interval, sleeping out whatever is left of each frame's
//! budget.

use std::str::FromStr;
use std::time::{Duration, Instant};

use anyhow::{Context, Result, bail};
use tracing::{debug, info, warn};

use crate::game::Game;

/// Environment variable overriding [`TickConfig::tick_rate`].
pub const TICK_RATE_VAR: &str = "ENGINE_TICK_RATE";
/// Environment variable overriding [`TickConfig::max_ticks`].
pub const MAX_TICKS_VAR: &str = "ENGINE_MAX_TICKS";

/// Configuration for the tick loop.
#[derive(Debug, Clone, PartialEq)]
pub struct TickConfig {
    /// Target ticks per second.
    pub tick_rate: f64,
    /// Maximum number of ticks to run (0 = unlimited).
    pub max_ticks: u64,
}

impl Default for TickConfig {
    fn default() -> Self {
        Self {
            tick_rate: 60.0,
            max_ticks: 0,
        }
    }
}

impl TickConfig {
    #[must_use]
    pub fn with_tick_rate(mut self, tick_rate: f64) -> Self {
        self.tick_rate = tick_rate;
        self
    }

    #[must_use]
    pub fn with_max_ticks(mut self, max_ticks: u64) -> Self {
        self.max_ticks = max_ticks;
        self
    }

    /// Defaults overridden by `ENGINE_TICK_RATE` and `ENGINE_MAX_TICKS`.
    ///
    /// # Errors
    ///
    /// Returns an error if either variable is set but unparsable, or if the
    /// resulting tick rate is not a positive finite number.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Like [`from_env`](Self::from_env), reading variables through `lookup`.
    ///
    /// # Errors
    ///
    /// See [`from_env`](Self::from_env).
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let mut config = Self::default();
        if let Some(rate) = parse_var::<f64>(&lookup, TICK_RATE_VAR)? {
            config.tick_rate = rate;
        }
        if let Some(max) = parse_var::<u64>(&lookup, MAX_TICKS_VAR)? {
            config.max_ticks = max;
        }
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if !(self.tick_rate.is_finite() && self.tick_rate > 0.0) {
            bail!("tick rate must be positive, got {}", self.tick_rate);
        }
        Ok(())
    }

    /// Length of one frame.
    #[must_use]
    pub fn interval(&self) -> Duration {
        Duration::from_secs_f64(1.0 / self.tick_rate)
    }
}

fn parse_var<T>(lookup: &impl Fn(&str) -> Option<String>, name: &str) -> Result<Option<T>>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    lookup(name)
        .map(|raw| {
            raw.trim()
                .parse::<T>()
                .with_context(|| format!("invalid {name}: {raw:?}"))
        })
        .transpose()
}

/// Drives a [`Game`] at a fixed rate.
#[derive(Debug)]
pub struct TickLoop {
    /// Frames run so far.
    tick_id: u64,
    config: TickConfig,
    game: Game,
}

impl TickLoop {
    #[must_use]
    pub fn new(config: TickConfig, game: Game) -> Self {
        Self {
            tick_id: 0,
            config,
            game,
        }
    }

    #[must_use]
    pub fn tick_id(&self) -> u64 {
        self.tick_id
    }

    #[must_use]
    pub fn config(&self) -> &TickConfig {
        &self.config
    }

    #[must_use]
    pub fn game(&self) -> &Game {
        &self.game
    }

    pub fn game_mut(&mut self) -> &mut Game {
        &mut self.game
    }

    /// Hand the game back once the loop is done with it.
    #[must_use]
    pub fn into_game(self) -> Game {
        self.game
    }

    /// Run one frame: update, then render, both with `dt`.
    pub fn step(&mut self, dt: f64) {
        self.tick_id += 1;
        debug!(tick_id = self.tick_id, dt, "tick start");
        self.game.update(dt);
        self.game.render(dt);
    }

    /// Run frames for the configured number of ticks, or indefinitely.
    ///
    /// Blocks the calling thread.
    pub fn run(&mut self) {
        let tick_duration = self.config.interval();
        let mut tick_count = 0u64;

        info!(
            tick_rate = self.config.tick_rate,
            max_ticks = self.config.max_ticks,
            "starting tick loop"
        );

        loop {
            let start = Instant::now();

            self.step(tick_duration.as_secs_f64());

            tick_count += 1;
            if self.config.max_ticks > 0 && tick_count >= self.config.max_ticks {
                info!(ticks = tick_count, "tick loop complete");
                break;
            }

            let elapsed = start.elapsed();
            if elapsed < tick_duration {
                std::thread::sleep(tick_duration - elapsed);
            } else {
                warn!(
                    tick_id = self.tick_id,
                    elapsed_ms = elapsed.as_millis() as u64,
                    budget_ms = tick_duration.as_millis() as u64,
                    "tick exceeded time budget"
                );
            }
        }
    }
}
