//! Outer bot loop: classify the screen, perform the one action that state calls for

use super::match_engine::{MatchEnd, run_match};
use super::queue::{QueueOutcome, negotiate};
use super::session::Session;
use super::state::{ApplicationState, Classification, classify};
use crate::adb::{AdbResult, FrameSource, GameDevice};
use crate::catalog::Button;
use crate::error::{BotError, BotResult};
use crate::vision::ScreenProbe;
use std::sync::Arc;

/// Perform the action for one classified screen
pub async fn dispatch<D: GameDevice, P: ScreenProbe>(
    session: &mut Session<D, P>,
    classification: Classification,
) -> AdbResult<()> {
    match classification.state {
        ApplicationState::Loading => {
            log::debug!("⏳ Loading screen");
            session.wait(session.config.timings.loading_wait).await;
        }
        ApplicationState::MainMenu => {
            log::info!("🏠 Main menu, pressing play");
            session.click_button(Button::Play).await?;
        }
        ApplicationState::ChoiceConfirm => {
            log::debug!("Confirming a pending choice");
            session.click_button(Button::CheckChoice).await?;
        }
        ApplicationState::ModeSelect => {
            log::info!("🎮 Selecting {} mode", session.config.game_mode);
            match classification.target {
                Some(found) => session.click_match(&found).await?,
                None => log::warn!("Mode select screen without a mode to click"),
            }
        }
        ApplicationState::QueueMissed => {
            log::info!("Queue was missed, acknowledging");
            session.click_button(Button::Check).await?;
        }
        ApplicationState::Lobby => {
            log::info!("🛋️ In the lobby, finding a match");
            session.click_button(Button::Play).await?;
            match negotiate(session).await? {
                QueueOutcome::Resolved => log::info!("Match found"),
                QueueOutcome::TimedOut => log::info!("Queue timed out, checking the screen again"),
            }
        }
        ApplicationState::InMatch => match run_match(session).await? {
            MatchEnd::Exited => log::info!("🏁 Left the finished match"),
            MatchEnd::PostMatch => log::debug!("Match ended on the result screen"),
            MatchEnd::Relaunched => log::warn!("Game was relaunched during the match"),
        },
        ApplicationState::PostMatchVariant => {
            log::info!("🏁 Result screen, continuing");
            session.click_button(Button::DawnOfHeroesContinue).await?;
        }
        ApplicationState::PostMatch => {
            log::info!("🏁 Result screen, playing again");
            session.click_button(Button::Play).await?;
        }
        ApplicationState::Unknown => {}
    }
    Ok(())
}

/// One iteration of the outer loop, returning the state that was acted on
pub async fn step<D: GameDevice, P: ScreenProbe>(
    session: &mut Session<D, P>,
) -> AdbResult<ApplicationState> {
    session.wait_for_next_game().await;
    session.wait_while_paused().await;

    if !session.ensure_app_active().await? {
        return Ok(ApplicationState::Unknown);
    }

    let state = match session.capture().await? {
        Some(frame) => {
            let classification = classify(&frame, &session.probe, session.config.game_mode);
            log::debug!("Screen #{} is {:?}", frame.index, classification.state);
            let state = classification.state;
            dispatch(session, classification).await?;
            state
        }
        None => {
            log::warn!("No frame available, retrying");
            ApplicationState::Unknown
        }
    };

    session.wait(session.config.timings.loop_pause).await;
    Ok(state)
}

/// Run until a transport error ends the loop
pub async fn run<D: GameDevice, P: ScreenProbe>(session: &mut Session<D, P>) -> AdbResult<()> {
    log::info!("🤖 Bot loop started");
    loop {
        step(session).await?;
    }
}

/// Re-establishes the device link after a transport failure
pub trait Reconnect<D> {
    fn reconnect(&mut self) -> impl Future<Output = BotResult<(Arc<D>, FrameSource<D>)>>;
}

/// Run the bot loop, giving every transport failure its own reconnect attempt.
/// Any other error, or a reconnect that fails, ends the run.
pub async fn run_reconnecting<D, P, R>(
    session: &mut Session<D, P>,
    link: &mut R,
) -> BotResult<()>
where
    D: GameDevice,
    P: ScreenProbe,
    R: Reconnect<D>,
{
    loop {
        let error: BotError = match run(session).await {
            Ok(()) => return Ok(()),
            Err(e) => e.into(),
        };
        if !error.is_recoverable() {
            return Err(error);
        }

        log::warn!("🔌 Lost the device ({error}), reconnecting");
        session.frames.shutdown().await;
        let (device, frames) = link.reconnect().await?;
        session.device = device;
        session.frames = frames;
        log::info!("🔌 Reconnected, resuming");
    }
}
