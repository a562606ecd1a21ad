//! Bot configuration
//!
//! The YAML file is read into [`RawConfig`], where every key is optional and defaulted, then
//! sanitised into [`BotConfig`]. Invalid values are replaced with a warning rather than
//! aborting startup.

use crate::error::{BotError, BotResult};
use log::LevelFilter;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::net::SocketAddrV4;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const CONFIG_DIR_NAME: &str = ".tft-adb-run";
pub const CONFIG_FILE_NAME: &str = "config.yaml";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GameMode {
    Normal,
    DawnOfHeroes,
}

impl GameMode {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "normal" => Some(GameMode::Normal),
            "dawn of heroes" => Some(GameMode::DawnOfHeroes),
            _ => None,
        }
    }

    /// Sub directory of `traits/` holding this mode's shop icons
    pub fn trait_dir(self) -> &'static str {
        match self {
            GameMode::Normal => "normal",
            GameMode::DawnOfHeroes => "dawn_of_heroes",
        }
    }

    pub fn default_traits(self) -> &'static [&'static str] {
        match self {
            GameMode::Normal => &["heavenly"],
            GameMode::DawnOfHeroes => &["dawnbringer"],
        }
    }
}

impl std::fmt::Display for GameMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GameMode::Normal => write!(f, "normal"),
            GameMode::DawnOfHeroes => write!(f, "dawn of heroes"),
        }
    }
}

/// Pacing constants in milliseconds
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Timings {
    pub loop_pause: u64,
    pub loading_wait: u64,
    pub launch_wait: u64,
    pub queue_poll: u64,
    pub accepted_poll: u64,
    pub after_accept: u64,
    pub queue_settle: u64,
    pub match_tick: u64,
    pub match_exit_wait: u64,
    pub action_settle: u64,
    pub reveal_wait: u64,
    pub surrender_step: u64,
    pub surrender_settle: u64,
    pub carousel_min: u64,
    pub carousel_max: u64,
    pub shop_jitter_min: u64,
    pub shop_jitter_max: u64,
    pub pause_poll: u64,
    pub next_game_poll: u64,
    pub frame_freshness: u64,
    pub stream_interval: u64,
}

impl Default for Timings {
    fn default() -> Self {
        Self {
            loop_pause: 2_000,
            loading_wait: 10_000,
            launch_wait: 5_000,
            queue_poll: 2_000,
            accepted_poll: 1_000,
            after_accept: 2_000,
            queue_settle: 3_000,
            match_tick: 5_000,
            match_exit_wait: 10_000,
            action_settle: 1_000,
            reveal_wait: 2_000,
            surrender_step: 2_000,
            surrender_settle: 5_000,
            carousel_min: 3_000,
            carousel_max: 9_000,
            shop_jitter_min: 250,
            shop_jitter_max: 750,
            pause_poll: 5_000,
            next_game_poll: 15_000,
            frame_freshness: 15_000,
            stream_interval: 500,
        }
    }
}

impl Timings {
    fn sanitize(mut self) -> Self {
        // Poll intervals must stay positive
        for (name, value) in [
            ("queue_poll", &mut self.queue_poll),
            ("accepted_poll", &mut self.accepted_poll),
            ("match_tick", &mut self.match_tick),
            ("pause_poll", &mut self.pause_poll),
            ("next_game_poll", &mut self.next_game_poll),
            ("stream_interval", &mut self.stream_interval),
            ("loop_pause", &mut self.loop_pause),
        ] {
            if *value == 0 {
                log::warn!("⚠️ timings.{name} must be positive, using 100ms");
                *value = 100;
            }
        }
        if self.carousel_min > self.carousel_max {
            log::warn!("⚠️ timings.carousel_min is above carousel_max, swapping them");
            std::mem::swap(&mut self.carousel_min, &mut self.carousel_max);
        }
        if self.shop_jitter_min > self.shop_jitter_max {
            log::warn!("⚠️ timings.shop_jitter_min is above shop_jitter_max, swapping them");
            std::mem::swap(&mut self.shop_jitter_min, &mut self.shop_jitter_max);
        }
        self
    }
}

/// The config file as written by the user
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RawConfig {
    pub log_level: String,
    pub adb_address: String,
    pub templates_dir: String,
    pub game_mode: String,
    pub traits: Vec<String>,
    pub surrender_early: bool,
    pub surrender_random_delay: i64,
    pub surrender_phase: String,
    pub chance_to_buy_xp: i64,
    pub queue_timeout: u64,
    pub use_frame_stream: bool,
    pub min_client_version: Option<String>,
    pub timings: Timings,
}

impl Default for RawConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            adb_address: String::new(),
            templates_dir: String::new(),
            game_mode: "normal".to_string(),
            traits: vec!["heavenly".to_string()],
            surrender_early: false,
            surrender_random_delay: 60,
            surrender_phase: "3-2".to_string(),
            chance_to_buy_xp: 25,
            queue_timeout: 120,
            use_frame_stream: false,
            min_client_version: None,
            timings: Timings::default(),
        }
    }
}

impl RawConfig {
    pub fn from_yaml(text: &str) -> BotResult<Self> {
        if text.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yaml::from_str(text)?)
    }

    /// Validate every value. `available_traits` lists the trait icons present for a mode.
    pub fn sanitize<F>(self, config_dir: &Path, available_traits: F) -> BotConfig
    where
        F: Fn(GameMode) -> Vec<String>,
    {
        let log_level = parse_log_level(&self.log_level).unwrap_or_else(|| {
            log::warn!(
                "⚠️ The configured log level '{}' does not exist. Using info instead.",
                self.log_level
            );
            LevelFilter::Info
        });

        let game_mode = GameMode::parse(&self.game_mode).unwrap_or_else(|| {
            log::warn!(
                "⚠️ The configured game mode '{}' does not exist. Playing 'normal' instead.",
                self.game_mode
            );
            GameMode::Normal
        });

        let adb_address = match self.adb_address.trim() {
            "" => None,
            address => match address.parse::<SocketAddrV4>() {
                Ok(parsed) => Some(parsed),
                Err(_) => {
                    log::warn!(
                        "⚠️ The configured adb address '{address}' is not host:port. Using the first device instead."
                    );
                    None
                }
            },
        };

        let templates_dir = resolve_templates_dir(&self.templates_dir, config_dir);

        let traits = sanitize_traits(&self.traits, game_mode, &available_traits(game_mode));

        let surrender_random_delay = u64::try_from(self.surrender_random_delay).unwrap_or(0);

        let chance_to_buy_xp = self.chance_to_buy_xp.clamp(0, 100) as u8;
        if i64::from(chance_to_buy_xp) != self.chance_to_buy_xp {
            log::warn!(
                "⚠️ chance_to_buy_xp {} is outside 0-100, using {chance_to_buy_xp}",
                self.chance_to_buy_xp
            );
        }

        let queue_timeout = if self.queue_timeout == 0 {
            log::warn!("⚠️ queue_timeout must be positive, using 120 seconds");
            120
        } else {
            self.queue_timeout
        };

        let min_client_version = self
            .min_client_version
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty());

        BotConfig {
            log_level,
            adb_address,
            templates_dir,
            game_mode,
            traits,
            surrender_early: self.surrender_early,
            surrender_random_delay,
            surrender_phase: self.surrender_phase.trim().to_string(),
            chance_to_buy_xp,
            queue_timeout: Duration::from_secs(queue_timeout),
            use_frame_stream: self.use_frame_stream,
            min_client_version,
            timings: self.timings.sanitize(),
        }
    }
}

/// Empty means `templates/` next to the config file
fn resolve_templates_dir(configured: &str, config_dir: &Path) -> PathBuf {
    match configured.trim() {
        "" => config_dir.join("templates"),
        dir => PathBuf::from(dir),
    }
}

fn parse_log_level(value: &str) -> Option<LevelFilter> {
    match value.trim().to_lowercase().as_str() {
        "trace" => Some(LevelFilter::Trace),
        "debug" => Some(LevelFilter::Debug),
        "info" => Some(LevelFilter::Info),
        "warn" | "warning" => Some(LevelFilter::Warn),
        "error" | "critical" => Some(LevelFilter::Error),
        _ => None,
    }
}

fn sanitize_traits(configured: &[String], mode: GameMode, available: &[String]) -> Vec<String> {
    let mut allowed = Vec::new();
    for name in configured {
        let name = name.trim().to_lowercase();
        if !available.contains(&name) {
            log::warn!("⚠️ The configured trait '{name}' does not exist. Skipping it.");
            continue;
        }
        if !allowed.contains(&name) {
            allowed.push(name);
        }
    }

    if allowed.is_empty() {
        let defaults: Vec<String> = mode.default_traits().iter().map(|t| t.to_string()).collect();
        log::warn!("⚠️ No valid traits were configured. Falling back to {defaults:?}.");
        allowed = defaults;
    }
    allowed
}

/// Validated configuration, read-only for the lifetime of the bot
#[derive(Debug, Clone)]
pub struct BotConfig {
    pub log_level: LevelFilter,
    pub adb_address: Option<SocketAddrV4>,
    pub templates_dir: PathBuf,
    pub game_mode: GameMode,
    /// Never empty
    pub traits: Vec<String>,
    pub surrender_early: bool,
    pub surrender_random_delay: u64,
    pub surrender_phase: String,
    pub chance_to_buy_xp: u8,
    pub queue_timeout: Duration,
    pub use_frame_stream: bool,
    pub min_client_version: Option<String>,
    pub timings: Timings,
}

impl Default for BotConfig {
    fn default() -> Self {
        RawConfig::default().sanitize(Path::new("."), |mode| {
            mode.default_traits().iter().map(|t| t.to_string()).collect()
        })
    }
}

impl BotConfig {
    /// Delay before surrendering: uniform in 1..=bound seconds, zero when the bound is zero
    pub fn surrender_delay<R: Rng + ?Sized>(&self, rng: &mut R) -> Duration {
        if self.surrender_random_delay == 0 {
            return Duration::ZERO;
        }
        Duration::from_secs(rng.gen_range(1..=self.surrender_random_delay))
    }

    /// Roll the configured XP purchase chance
    pub fn roll_buy_xp<R: Rng + ?Sized>(&self, rng: &mut R) -> bool {
        rng.gen_range(0..100u8) < self.chance_to_buy_xp
    }

    pub fn frame_freshness(&self) -> Duration {
        Duration::from_millis(self.timings.frame_freshness)
    }
}

pub fn default_config_path() -> BotResult<PathBuf> {
    homedir::my_home()
        .ok()
        .flatten()
        .map(|home| home.join(CONFIG_DIR_NAME).join(CONFIG_FILE_NAME))
        .ok_or_else(|| BotError::Config("Failed to determine home directory".to_string()))
}

/// Read `path`, writing a default file first when none exists
pub fn load_raw(path: &Path) -> BotResult<RawConfig> {
    if !path.exists() {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let defaults = serde_yaml::to_string(&RawConfig::default())?;
        std::fs::write(path, defaults)?;
        log::info!("📝 Created default config at {}", path.display());
    }
    let text = std::fs::read_to_string(path)?;
    RawConfig::from_yaml(&text)
}

/// Load and sanitise the config, checking traits against the icons in the template directory
pub fn load(path: &Path) -> BotResult<BotConfig> {
    let raw = load_raw(path)?;
    let config_dir = path.parent().unwrap_or_else(|| Path::new("."));
    let templates_dir = resolve_templates_dir(&raw.templates_dir, config_dir);
    Ok(raw.sanitize(config_dir, |mode| {
        crate::vision::TemplateLibrary::available_traits(&templates_dir, mode)
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn traits(names: &[&str]) -> Vec<String> {
        names.iter().map(|n| n.to_string()).collect()
    }

    fn sanitize(raw: RawConfig) -> BotConfig {
        raw.sanitize(Path::new("/cfg"), |_| traits(&["heavenly", "mythic", "dragonlord"]))
    }

    #[test]
    fn test_partial_yaml_uses_defaults() {
        let raw = RawConfig::from_yaml("game_mode: dawn of heroes\nchance_to_buy_xp: 40\n").unwrap();
        let config = sanitize(raw);
        assert_eq!(config.game_mode, GameMode::DawnOfHeroes);
        assert_eq!(config.chance_to_buy_xp, 40);
        assert_eq!(config.queue_timeout, Duration::from_secs(120));
        assert_eq!(config.timings, Timings::default());
        assert_eq!(config.templates_dir, PathBuf::from("/cfg/templates"));
    }

    #[test]
    fn test_empty_file_is_default() {
        let raw = RawConfig::from_yaml("").unwrap();
        assert_eq!(raw.game_mode, "normal");
    }

    #[test]
    fn test_invalid_values_fall_back() {
        let raw = RawConfig {
            log_level: "LOUD".into(),
            game_mode: "arena".into(),
            adb_address: "not-an-address".into(),
            chance_to_buy_xp: 250,
            queue_timeout: 0,
            ..RawConfig::default()
        };
        let config = sanitize(raw);
        assert_eq!(config.log_level, LevelFilter::Info);
        assert_eq!(config.game_mode, GameMode::Normal);
        assert_eq!(config.adb_address, None);
        assert_eq!(config.chance_to_buy_xp, 100);
        assert_eq!(config.queue_timeout, Duration::from_secs(120));
    }

    #[test]
    fn test_adb_address_parsed() {
        let raw = RawConfig {
            adb_address: "127.0.0.1:5555".into(),
            ..RawConfig::default()
        };
        let config = sanitize(raw);
        assert_eq!(config.adb_address, Some("127.0.0.1:5555".parse().unwrap()));
    }

    #[test]
    fn test_unknown_traits_skipped_and_deduplicated() {
        let raw = RawConfig {
            traits: traits(&["Mythic", "bogus", "mythic", "dragonlord"]),
            ..RawConfig::default()
        };
        assert_eq!(sanitize(raw).traits, traits(&["mythic", "dragonlord"]));
    }

    #[test]
    fn test_no_valid_trait_falls_back_to_mode_default() {
        let raw = RawConfig {
            traits: traits(&["bogus"]),
            ..RawConfig::default()
        };
        assert_eq!(sanitize(raw).traits, traits(&["heavenly"]));
    }

    #[test]
    fn test_timing_ranges_are_ordered() {
        let raw = RawConfig {
            timings: Timings {
                carousel_min: 9_000,
                carousel_max: 3_000,
                queue_poll: 0,
                ..Timings::default()
            },
            ..RawConfig::default()
        };
        let timings = sanitize(raw).timings;
        assert_eq!((timings.carousel_min, timings.carousel_max), (3_000, 9_000));
        assert_eq!(timings.queue_poll, 100);
    }

    #[test]
    fn test_surrender_delay_bounds() {
        let mut rng = StdRng::seed_from_u64(3);
        let mut config = BotConfig::default();
        config.surrender_random_delay = 0;
        assert_eq!(config.surrender_delay(&mut rng), Duration::ZERO);

        config.surrender_random_delay = 5;
        for _ in 0..100 {
            let delay = config.surrender_delay(&mut rng);
            assert!(delay >= Duration::from_secs(1) && delay <= Duration::from_secs(5));
        }
    }

    #[test]
    fn test_buy_xp_chance_extremes() {
        let mut rng = StdRng::seed_from_u64(9);
        let mut config = BotConfig::default();
        config.chance_to_buy_xp = 0;
        assert!((0..200).all(|_| !config.roll_buy_xp(&mut rng)));
        config.chance_to_buy_xp = 100;
        assert!((0..200).all(|_| config.roll_buy_xp(&mut rng)));
    }

    #[test]
    fn test_default_file_round_trips_through_yaml() {
        let text = serde_yaml::to_string(&RawConfig::default()).unwrap();
        let parsed = RawConfig::from_yaml(&text).unwrap();
        assert_eq!(parsed.traits, RawConfig::default().traits);
        assert_eq!(parsed.timings, Timings::default());
    }
}
