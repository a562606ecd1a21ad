// Core device types and traits
use super::error::AdbResult;
use crate::vision::Frame;
use std::future::Future;

pub const GAME_PACKAGE: &str = "com.riotgames.league.teamfighttactics";
pub const GAME_ACTIVITY: &str = "com.riotgames.leagueoflegends.RiotNativeActivity";

/// Everything the bot needs from the phone. Every call may fail with a transport error.
///
/// Futures are `Send` so a background capture task can share the device.
pub trait GameDevice: Send + Sync + 'static {
    /// Current screen in grayscale, `None` when the device returned nothing usable
    fn capture_frame(&self) -> impl Future<Output = AdbResult<Option<Frame>>> + Send;

    fn click(&self, x: u32, y: u32) -> impl Future<Output = AdbResult<()>> + Send;

    /// Whether the game client holds window focus
    fn is_app_active(&self) -> impl Future<Output = AdbResult<bool>> + Send;

    fn launch_app(&self) -> impl Future<Output = AdbResult<()>> + Send;

    fn go_back(&self) -> impl Future<Output = AdbResult<()>> + Send;
}
