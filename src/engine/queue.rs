//! Matchmaking accept protocol
//!
//! WaitingForAccept -> Accepted -> Clearing -> Resolved, or TimedOut while waiting.
//! A match declined by another player shows the accept or play button again after the
//! overlay clears, which sends the negotiation back to waiting. The loop only ends on a
//! formed match or the accept timeout.

use super::session::Session;
use crate::adb::{AdbResult, GameDevice};
use crate::catalog::Button;
use crate::vision::{ImageId, ScreenProbe};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueueOutcome {
    /// Queue UI is gone; the next classification sees loading or the match
    Resolved,
    /// No accept prompt within the queue timeout, nothing was clicked
    TimedOut,
}

pub async fn negotiate<D: GameDevice, P: ScreenProbe>(
    session: &mut Session<D, P>,
) -> AdbResult<QueueOutcome> {
    let timeout = session.config.queue_timeout;
    let mut attempt = 1u32;

    loop {
        log::debug!("⏳ Waiting for the accept prompt (attempt {attempt})");
        match tokio::time::timeout(timeout, wait_for_accept(session)).await {
            Ok(result) => result?,
            Err(_) => {
                log::info!(
                    "⌛ No match found within {}s, leaving the queue to the next cycle",
                    timeout.as_secs()
                );
                return Ok(QueueOutcome::TimedOut);
            }
        }

        session.click_button(Button::Accept).await?;
        log::info!("✅ Match accepted");
        session.wait(session.config.timings.after_accept).await;

        let polls = wait_for_overlay_to_clear(session).await?;
        log::debug!("Accepted overlay cleared after {polls} checks");
        session.wait(session.config.timings.queue_settle).await;

        let declined = match session.capture().await? {
            Some(frame) => {
                session.is_visible(&frame, Button::Accept) || session.is_visible(&frame, Button::Play)
            }
            None => false,
        };
        if !declined {
            return Ok(QueueOutcome::Resolved);
        }
        log::info!("🔁 The match was declined by another player, back to waiting");
        attempt += 1;
    }
}

/// Poll until the accept button shows up
async fn wait_for_accept<D: GameDevice, P: ScreenProbe>(
    session: &mut Session<D, P>,
) -> AdbResult<()> {
    loop {
        if let Some(frame) = session.capture().await?
            && session.is_visible(&frame, Button::Accept)
        {
            return Ok(());
        }
        session.wait(session.config.timings.queue_poll).await;
    }
}

/// Poll the "accepted" overlay until it disappears, returning the number of checks
async fn wait_for_overlay_to_clear<D: GameDevice, P: ScreenProbe>(
    session: &mut Session<D, P>,
) -> AdbResult<u32> {
    let mut polls = 0;
    loop {
        polls += 1;
        let showing = match session.capture().await? {
            Some(frame) => session.image_visible(&frame, ImageId::Accepted),
            None => false,
        };
        if !showing {
            return Ok(polls);
        }
        session.wait(session.config.timings.accepted_poll).await;
    }
}
