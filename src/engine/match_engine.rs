//! In-match decisions
//!
//! Runs for the whole match. Each tick works on one frame and performs at most one of the
//! exclusive actions (return to board, augments, choice prompts). Buying XP and shopping
//! may both happen in the same tick, XP first, and the surrender check always runs last.

use super::session::Session;
use super::state::classify;
use crate::adb::{AdbResult, GameDevice};
use crate::catalog::{Button, CAROUSEL_REGION, SHOP_REGION};
use crate::vision::{
    DEFAULT_CONFIDENCE, Frame, ImageId, STRICT_CONFIDENCE, ScreenProbe, TemplateKey,
};
use rand::Rng;
use rand::seq::SliceRandom;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchEnd {
    /// The exit button showed up and was clicked
    Exited,
    /// The result screen is up, the outer loop takes over
    PostMatch,
    /// The game lost focus and was relaunched
    Relaunched,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickAction {
    ReturnToBoard,
    Carousel,
    /// Offer handled with this many rerolls
    Augment { rolls: usize },
    RevealChoice,
    PickChoice,
    BuyXp,
    /// Bought one card from this shop slot (0 based)
    BuyCard(usize),
    ExpandTopBar,
    Surrender,
}

pub async fn run_match<D: GameDevice, P: ScreenProbe>(
    session: &mut Session<D, P>,
) -> AdbResult<MatchEnd> {
    log::info!("⚔️ In a match, making decisions until it ends");
    loop {
        if session.control.is_paused() {
            session.wait(session.config.timings.pause_poll).await;
            continue;
        }

        if !session.ensure_app_active().await? {
            return Ok(MatchEnd::Relaunched);
        }

        let Some(frame) = session.capture().await? else {
            session.wait(session.config.timings.match_tick).await;
            continue;
        };

        if session.is_visible(&frame, Button::ExitNow) {
            log::info!("🚪 Match over, leaving");
            session.click_button(Button::ExitNow).await?;
            session.wait(session.config.timings.match_exit_wait).await;
            return Ok(MatchEnd::Exited);
        }

        if classify(&frame, &session.probe, session.config.game_mode).is_post_match() {
            log::info!("🏁 Match over, result screen is up");
            return Ok(MatchEnd::PostMatch);
        }

        let actions = tick(session, &frame).await?;
        if !actions.is_empty() {
            log::debug!("Tick actions: {actions:?}");
        }
        session.wait(session.config.timings.match_tick).await;
    }
}

/// One round of decisions on `frame`
pub async fn tick<D: GameDevice, P: ScreenProbe>(
    session: &mut Session<D, P>,
    frame: &Frame,
) -> AdbResult<Vec<TickAction>> {
    let mut actions = Vec::new();

    if session.is_visible(frame, Button::ReturnToBoard) {
        return_to_board(session, &mut actions).await?;
        return Ok(actions);
    }

    if session.image_visible(frame, ImageId::PickAugment) {
        let rolls = handle_augments(session).await?;
        actions.push(TickAction::Augment { rolls });
        return Ok(actions);
    }

    // Revealing the offer changes the screen, so the prompt check needs a new capture
    let revealed;
    let mut choice_frame = frame;
    if session.is_visible(frame, Button::ChooseOneHidden) {
        log::debug!("Choice offer is hidden, revealing it");
        session.click_button(Button::ChooseOneHidden).await?;
        actions.push(TickAction::RevealChoice);
        session.wait(session.config.timings.reveal_wait).await;
        match session.capture().await? {
            Some(fresh) => {
                revealed = fresh;
                choice_frame = &revealed;
            }
            None => return Ok(actions),
        }
    }

    if session.is_visible(choice_frame, Button::ChooseOne) {
        log::debug!("Picking from a choice offer");
        session.click_button(Button::ChooseOne).await?;
        session.wait(session.config.timings.action_settle).await;
        actions.push(TickAction::PickChoice);
        return Ok(actions);
    }
    if actions.contains(&TickAction::RevealChoice) {
        return Ok(actions);
    }

    if session.is_visible(frame, Button::BuyXp) && session.roll_buy_xp() {
        log::debug!("📈 Buying XP");
        session.click_button(Button::BuyXp).await?;
        session.wait(session.config.timings.action_settle).await;
        actions.push(TickAction::BuyXp);
    }

    buy_from_shop(session, frame, &mut actions).await?;

    if session.config.surrender_early {
        check_surrender(session, frame, &mut actions).await?;
    }

    Ok(actions)
}

async fn return_to_board<D: GameDevice, P: ScreenProbe>(
    session: &mut Session<D, P>,
    actions: &mut Vec<TickAction>,
) -> AdbResult<()> {
    log::debug!("On another board, returning to our own");
    session.click_button(Button::ReturnToBoard).await?;
    actions.push(TickAction::ReturnToBoard);
    session.wait(session.config.timings.action_settle).await;

    // The carousel only shows once we are back, so look again
    let Some(frame) = session.capture().await? else {
        return Ok(());
    };
    if session.image_visible(&frame, ImageId::Carousel) {
        log::debug!("🎠 On the carousel, walking to a random spot");
        session.click_region(CAROUSEL_REGION).await?;
        actions.push(TickAction::Carousel);
        let timings = &session.config.timings;
        let (min, max) = (timings.carousel_min, timings.carousel_max);
        session.wait_between(min, max).await;
    }
    Ok(())
}

/// Reroll each offer on a coin flip in shuffled order, then pick one at random
async fn handle_augments<D: GameDevice, P: ScreenProbe>(
    session: &mut Session<D, P>,
) -> AdbResult<usize> {
    log::debug!("✨ Augments offered");
    let mut rolls = Button::augment_rolls();
    rolls.shuffle(session.rng());

    let mut rolled = 0;
    for roll in rolls {
        if session.rng().gen_bool(0.5) {
            log::debug!("Rerolling {roll:?}");
            session.click_button(roll).await?;
            rolled += 1;
        }
        session.wait(session.config.timings.action_settle).await;
    }
    session.wait(session.config.timings.reveal_wait).await;

    let augments = Button::augments();
    let pick = augments[session.rng().gen_range(0..augments.len())];
    log::debug!("Selecting {pick:?}");
    session.click_button(pick).await?;
    session.wait(session.config.timings.action_settle).await;
    Ok(rolled)
}

/// Buy every shop card that carries one of the watched traits
async fn buy_from_shop<D: GameDevice, P: ScreenProbe>(
    session: &mut Session<D, P>,
    frame: &Frame,
    actions: &mut Vec<TickAction>,
) -> AdbResult<()> {
    let traits = session.config.traits.clone();
    for name in traits {
        let key = TemplateKey::Trait(name.clone());
        let found = session
            .probe
            .find_all(frame, &key, Some(SHOP_REGION), STRICT_CONFIDENCE);
        if found.is_empty() {
            continue;
        }
        log::debug!("🛒 {} shop cards carry {name}", found.len());

        let mut cards: Vec<(usize, Button)> =
            Button::store_cards().into_iter().enumerate().collect();
        cards.shuffle(session.rng());

        for hit in found {
            let center = hit.center();
            let slot = cards
                .iter()
                .find(|(_, card)| card.element().click_region().contains(center))
                .copied();
            if let Some((index, card)) = slot {
                log::debug!("Buying store card {}", index + 1);
                session.click_button(card).await?;
                actions.push(TickAction::BuyCard(index));
            }
            let timings = &session.config.timings;
            let (min, max) = (timings.shop_jitter_min, timings.shop_jitter_max);
            session.wait_between(min, max).await;
        }
    }
    Ok(())
}

/// Surrender once the configured stage shows in the top bar
async fn check_surrender<D: GameDevice, P: ScreenProbe>(
    session: &mut Session<D, P>,
    frame: &Frame,
    actions: &mut Vec<TickAction>,
) -> AdbResult<()> {
    // The stage indicator is only readable with the top bar expanded
    let expanded;
    let mut bar_frame = frame;
    if !session.image_visible(frame, ImageId::CollapseTopBar) {
        session.click_button(Button::ExpandTopBar).await?;
        actions.push(TickAction::ExpandTopBar);
        session.wait(session.config.timings.action_settle).await;
        match session.capture().await? {
            Some(fresh) => {
                expanded = fresh;
                bar_frame = &expanded;
            }
            None => return Ok(()),
        }
    }

    let phase = TemplateKey::Phase(session.config.surrender_phase.clone());
    if session
        .probe
        .find(bar_frame, &phase, None, DEFAULT_CONFIDENCE)
        .is_none()
    {
        return Ok(());
    }

    let delay = session.surrender_delay();
    log::info!("🏳️ Surrendering the game in {}s", delay.as_secs());
    tokio::time::sleep(delay).await;

    let step = session.config.timings.surrender_step;
    session.device.go_back().await?;
    session.wait(step).await;
    session.click_button(Button::Surrender).await?;
    session.wait(step).await;
    session.click_button(Button::CheckSurrender).await?;
    session.wait(session.config.timings.surrender_settle).await;
    actions.push(TickAction::Surrender);
    Ok(())
}
