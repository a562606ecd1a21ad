// Scripted device and probe for driving the engine without a phone
//
// Each capture takes the next scripted screen (the last one repeats) and the probe answers
// from whatever screen that frame was taken on.

use super::dispatcher::Reconnect;
use super::session::Session;
use crate::adb::{AdbError, AdbResult, FrameSource, GameDevice};
use crate::catalog::Button;
use crate::config::BotConfig;
use crate::control::BotControl;
use crate::error::BotResult;
use crate::vision::{Frame, ImageId, MatchResult, Region, ScreenProbe, TemplateKey};
use image::GrayImage;
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

pub const SEED: u64 = 7;
const FOUND: f32 = 0.95;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    /// Tap, tagged with how many frames had been captured at that point
    Click { x: u32, y: u32, at_capture: u64 },
    Back,
    Launch,
}

/// What the probe can see on one captured frame
#[derive(Debug, Clone, Default)]
pub struct Screen {
    visible: Vec<(TemplateKey, MatchResult)>,
}

impl Screen {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, key: TemplateKey, found: MatchResult) -> Self {
        self.visible.push((key, found));
        self
    }

    pub fn image(self, id: ImageId) -> Self {
        self.with(TemplateKey::Image(id), image_match())
    }

    pub fn button(self, button: Button) -> Self {
        let template = button
            .element()
            .template()
            .unwrap_or_else(|| panic!("{button:?} is never recognized"));
        self.with(TemplateKey::Image(template), button_match(button))
    }

    /// Trait icon drawn on a shop card (0 based slot)
    pub fn trait_on_card(self, name: &str, slot: usize) -> Self {
        self.with(
            TemplateKey::Trait(name.to_string()),
            trait_match_at_card(slot),
        )
    }

    pub fn phase(self, name: &str) -> Self {
        self.with(TemplateKey::Phase(name.to_string()), image_match())
    }
}

/// Match centered where the button's face is searched: its capture area, or the click
/// region for buttons read where they are tapped
pub fn button_match(button: Button) -> MatchResult {
    let element = button.element();
    let (x, y) = element
        .capture()
        .unwrap_or(element.click_region())
        .center();
    MatchResult::new(x - 5, y - 5, 10, 10, FOUND)
}

pub fn image_match() -> MatchResult {
    MatchResult::new(20, 20, 10, 10, FOUND)
}

pub fn trait_match_at_card(slot: usize) -> MatchResult {
    let card = Button::store_cards()[slot].element().click_region();
    let (x, _) = card.center();
    MatchResult::new(x - 10, 160, 20, 20, FOUND)
}

struct ScriptState {
    screens: VecDeque<Screen>,
    shown: HashMap<u64, Screen>,
    captures: u64,
    actions: Vec<Action>,
    app_active: bool,
    link_losses: VecDeque<u64>,
}

#[derive(Clone)]
pub struct Script {
    state: Arc<Mutex<ScriptState>>,
}

impl Script {
    pub fn new(screens: Vec<Screen>) -> Self {
        Self {
            state: Arc::new(Mutex::new(ScriptState {
                screens: screens.into(),
                shown: HashMap::new(),
                captures: 0,
                actions: Vec::new(),
                app_active: true,
                link_losses: VecDeque::new(),
            })),
        }
    }

    fn lock(&self) -> MutexGuard<'_, ScriptState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn set_app_active(&self, active: bool) {
        self.lock().app_active = active;
    }

    /// Fail the capture attempted once this many frames were taken, once per entry
    pub fn lose_link_after(&self, captures: &[u64]) {
        self.lock().link_losses = captures.iter().copied().collect();
    }

    pub fn captures(&self) -> u64 {
        self.lock().captures
    }

    pub fn actions(&self) -> Vec<Action> {
        self.lock().actions.clone()
    }

    pub fn clicks(&self) -> Vec<(u32, u32, u64)> {
        self.actions()
            .into_iter()
            .filter_map(|action| match action {
                Action::Click { x, y, at_capture } => Some((x, y, at_capture)),
                _ => None,
            })
            .collect()
    }

    /// Capture counts of every tap that landed inside `region`
    pub fn clicks_in(&self, region: Region) -> Vec<u64> {
        self.clicks()
            .into_iter()
            .filter(|&(x, y, _)| region.contains((x, y)))
            .map(|(_, _, at)| at)
            .collect()
    }

    pub fn clicks_on(&self, button: Button) -> Vec<u64> {
        self.clicks_in(button.element().click_region())
    }
}

pub struct ScriptedDevice(pub Script);

impl GameDevice for ScriptedDevice {
    async fn capture_frame(&self) -> AdbResult<Option<Frame>> {
        let mut state = self.0.lock();
        if state.link_losses.front() == Some(&state.captures) {
            state.link_losses.pop_front();
            return Err(lost_link());
        }
        let screen = if state.screens.len() > 1 {
            state.screens.pop_front()
        } else {
            state.screens.front().cloned()
        };
        let Some(screen) = screen else {
            return Ok(None);
        };
        state.captures += 1;
        let index = state.captures;
        state.shown.insert(index, screen);
        Ok(Some(Frame::new(GrayImage::new(4, 4), index)))
    }

    async fn click(&self, x: u32, y: u32) -> AdbResult<()> {
        let mut state = self.0.lock();
        let at_capture = state.captures;
        state.actions.push(Action::Click { x, y, at_capture });
        Ok(())
    }

    async fn is_app_active(&self) -> AdbResult<bool> {
        Ok(self.0.lock().app_active)
    }

    async fn launch_app(&self) -> AdbResult<()> {
        let mut state = self.0.lock();
        state.actions.push(Action::Launch);
        state.app_active = true;
        Ok(())
    }

    async fn go_back(&self) -> AdbResult<()> {
        self.0.lock().actions.push(Action::Back);
        Ok(())
    }
}

pub struct ScriptedProbe(pub Script);

impl ScriptedProbe {
    fn candidates(
        &self,
        frame: &Frame,
        key: &TemplateKey,
        region: Option<Region>,
        threshold: f32,
    ) -> Vec<MatchResult> {
        let state = self.0.lock();
        let Some(screen) = state.shown.get(&frame.index) else {
            return Vec::new();
        };
        let mut found: Vec<MatchResult> = screen
            .visible
            .iter()
            .filter(|(visible, _)| visible == key)
            .map(|(_, found)| *found)
            .filter(|found| found.confidence >= threshold)
            .filter(|found| region.is_none_or(|r| r.contains(found.center())))
            .collect();
        found.sort_by(|a, b| b.confidence.total_cmp(&a.confidence));
        found
    }
}

impl ScreenProbe for ScriptedProbe {
    fn find(
        &self,
        frame: &Frame,
        key: &TemplateKey,
        region: Option<Region>,
        threshold: f32,
    ) -> Option<MatchResult> {
        self.candidates(frame, key, region, threshold)
            .into_iter()
            .next()
    }

    fn find_all(
        &self,
        frame: &Frame,
        key: &TemplateKey,
        region: Option<Region>,
        threshold: f32,
    ) -> Vec<MatchResult> {
        self.candidates(frame, key, region, threshold)
    }
}

pub type ScriptedSession = Session<ScriptedDevice, ScriptedProbe>;

pub fn lost_link() -> AdbError {
    AdbError::Timeout {
        duration: Duration::from_secs(5),
        description: "screencap".to_string(),
    }
}

/// Hands the same scripted device back, failing once its attempts run out
pub struct ScriptedLink {
    pub script: Script,
    pub attempts: usize,
    pub succeed: usize,
}

impl Reconnect<ScriptedDevice> for ScriptedLink {
    async fn reconnect(
        &mut self,
    ) -> BotResult<(Arc<ScriptedDevice>, FrameSource<ScriptedDevice>)> {
        self.attempts += 1;
        if self.attempts > self.succeed {
            return Err(lost_link().into());
        }
        let device = Arc::new(ScriptedDevice(self.script.clone()));
        Ok((device.clone(), FrameSource::Direct(device)))
    }
}

/// Session over direct captures with a fixed seed
pub fn session(script: &Script, config: BotConfig) -> ScriptedSession {
    let device = Arc::new(ScriptedDevice(script.clone()));
    Session::new(
        device.clone(),
        FrameSource::Direct(device),
        ScriptedProbe(script.clone()),
        Arc::new(config),
        BotControl::new(),
    )
    .with_seed(SEED)
}

/// Config that never buys XP or surrenders unless a test asks for it
pub fn quiet_config() -> BotConfig {
    BotConfig {
        chance_to_buy_xp: 0,
        surrender_early: false,
        ..BotConfig::default()
    }
}
