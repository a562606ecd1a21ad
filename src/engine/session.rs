//! Everything one bot run acts through: device, frames, probe, config and operator toggles

use super::state::{find_button, find_image};
use crate::adb::{AdbResult, FrameSource, GameDevice};
use crate::catalog::Button;
use crate::config::BotConfig;
use crate::control::BotControl;
use crate::vision::{Frame, ImageId, MatchResult, Region, ScreenProbe};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::sync::Arc;
use std::time::Duration;

pub struct Session<D, P> {
    pub device: Arc<D>,
    pub frames: FrameSource<D>,
    pub probe: P,
    pub config: Arc<BotConfig>,
    pub control: BotControl,
    rng: StdRng,
}

impl<D: GameDevice, P: ScreenProbe> Session<D, P> {
    pub fn new(
        device: Arc<D>,
        frames: FrameSource<D>,
        probe: P,
        config: Arc<BotConfig>,
        control: BotControl,
    ) -> Self {
        Self {
            device,
            frames,
            probe,
            config,
            control,
            rng: StdRng::from_entropy(),
        }
    }

    /// Replace the random source, for reproducible runs
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng = StdRng::seed_from_u64(seed);
        self
    }

    pub fn rng(&mut self) -> &mut StdRng {
        &mut self.rng
    }

    /// Roll the configured XP purchase chance
    pub fn roll_buy_xp(&mut self) -> bool {
        self.config.roll_buy_xp(&mut self.rng)
    }

    pub fn surrender_delay(&mut self) -> Duration {
        self.config.surrender_delay(&mut self.rng)
    }

    pub async fn capture(&mut self) -> AdbResult<Option<Frame>> {
        self.frames.capture().await
    }

    pub fn find_button(&self, frame: &Frame, button: Button) -> Option<MatchResult> {
        find_button(&self.probe, frame, button)
    }

    pub fn is_visible(&self, frame: &Frame, button: Button) -> bool {
        self.find_button(frame, button).is_some()
    }

    pub fn image_visible(&self, frame: &Frame, image: ImageId) -> bool {
        find_image(&self.probe, frame, image).is_some()
    }

    /// Tap a random point inside the button's click region
    pub async fn click_button(&mut self, button: Button) -> AdbResult<()> {
        log::debug!("👆 {button:?}");
        self.click_region(button.element().click_region()).await
    }

    pub async fn click_region(&mut self, region: Region) -> AdbResult<()> {
        let (x, y) = region.random_point(&mut self.rng);
        self.device.click(x, y).await
    }

    /// Tap inside the bounds of something found on screen
    pub async fn click_match(&mut self, found: &MatchResult) -> AdbResult<()> {
        self.click_region(found.bounds()).await
    }

    pub async fn wait(&self, millis: u64) {
        tokio::time::sleep(Duration::from_millis(millis)).await;
    }

    /// Sleep a uniformly random time between two bounds
    pub async fn wait_between(&mut self, min_millis: u64, max_millis: u64) {
        let millis = self.rng.gen_range(min_millis..=max_millis.max(min_millis));
        self.wait(millis).await;
    }

    pub async fn wait_while_paused(&self) {
        while self.control.is_paused() {
            self.wait(self.config.timings.pause_poll).await;
        }
    }

    /// Hold the outer loop while the operator disabled queueing another game
    pub async fn wait_for_next_game(&self) {
        let poll = self.config.timings.next_game_poll;
        let mut waited = 0u64;
        let mut last_log = 0u64;
        while !self.control.play_next_game() {
            self.wait(poll).await;
            waited += poll;
            if waited - last_log >= 30_000 {
                log::debug!("Play next game still disabled after {}s", waited / 1000);
                last_log = waited;
            }
        }
    }

    /// Bring the game back to the foreground if something else has focus.
    /// Returns false when a relaunch was needed.
    pub async fn ensure_app_active(&mut self) -> AdbResult<bool> {
        if self.device.is_app_active().await? {
            return Ok(true);
        }
        log::info!("📲 The game was not in the foreground, launching it");
        self.device.launch_app().await?;
        self.wait(self.config.timings.launch_wait).await;
        Ok(false)
    }
}
