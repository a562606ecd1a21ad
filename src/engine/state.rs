//! Screen classification
//!
//! A frame is tested against an ordered list of predicates and the first one that holds
//! decides the state. Several predicates can hold at once (the play button shows in the
//! main menu, the lobby and after a match), so the order is part of the contract.

use crate::catalog::Button;
use crate::config::GameMode;
use crate::vision::{DEFAULT_CONFIDENCE, Frame, ImageId, MatchResult, ScreenProbe, TemplateKey};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ApplicationState {
    Loading,
    MainMenu,
    ModeSelect,
    Lobby,
    QueueMissed,
    InMatch,
    /// Dawn of Heroes result screen with its own continue button
    PostMatchVariant,
    PostMatch,
    ChoiceConfirm,
    Unknown,
}

/// Evaluation order, highest priority first
pub const PRIORITY: [ApplicationState; 9] = [
    ApplicationState::ChoiceConfirm,
    ApplicationState::Loading,
    ApplicationState::MainMenu,
    ApplicationState::ModeSelect,
    ApplicationState::QueueMissed,
    ApplicationState::Lobby,
    ApplicationState::InMatch,
    ApplicationState::PostMatchVariant,
    ApplicationState::PostMatch,
];

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Classification {
    pub state: ApplicationState,
    /// Where to click next, when the state implies a target found on screen
    pub target: Option<MatchResult>,
}

impl Classification {
    pub fn new(state: ApplicationState) -> Self {
        Self {
            state,
            target: None,
        }
    }

    pub fn unknown() -> Self {
        Self::new(ApplicationState::Unknown)
    }

    pub fn is_post_match(&self) -> bool {
        matches!(
            self.state,
            ApplicationState::PostMatch | ApplicationState::PostMatchVariant
        )
    }
}

/// Locate a catalog button using its template, capture region and threshold
pub fn find_button<P: ScreenProbe + ?Sized>(
    probe: &P,
    frame: &Frame,
    button: Button,
) -> Option<MatchResult> {
    let element = button.element();
    let template = element.template()?;
    probe.find(
        frame,
        &TemplateKey::Image(template),
        element.capture(),
        button.confidence(),
    )
}

pub fn find_image<P: ScreenProbe + ?Sized>(
    probe: &P,
    frame: &Frame,
    image: ImageId,
) -> Option<MatchResult> {
    probe.find(frame, &TemplateKey::Image(image), None, DEFAULT_CONFIDENCE)
}

fn mode_image(mode: GameMode) -> ImageId {
    match mode {
        GameMode::Normal => ImageId::NormalGame,
        GameMode::DawnOfHeroes => ImageId::DawnOfHeroes,
    }
}

/// Test a single state's predicate against the frame
pub fn detect<P: ScreenProbe + ?Sized>(
    state: ApplicationState,
    frame: &Frame,
    probe: &P,
    mode: GameMode,
) -> Option<Classification> {
    let image = |id| find_image(probe, frame, id).is_some();
    let button = |b| find_button(probe, frame, b).is_some();

    let holds = match state {
        ApplicationState::ChoiceConfirm => button(Button::CheckChoice),
        ApplicationState::Loading => image(ImageId::RitoLogo),
        // Play without the back arrow; the lobby and result screens show both
        ApplicationState::MainMenu => image(ImageId::Play) && !image(ImageId::Back),
        ApplicationState::ModeSelect => {
            return find_image(probe, frame, mode_image(mode)).map(|found| Classification {
                state,
                target: Some(found),
            });
        }
        ApplicationState::QueueMissed => button(Button::Check),
        ApplicationState::Lobby => image(ImageId::CloseLobby) && button(Button::Play),
        ApplicationState::InMatch => image(ImageId::Composition) || image(ImageId::Items),
        ApplicationState::PostMatchVariant => {
            image(ImageId::Back) && button(Button::DawnOfHeroesContinue)
        }
        ApplicationState::PostMatch => image(ImageId::FirstPlace) && image(ImageId::Back),
        ApplicationState::Unknown => false,
    };
    holds.then(|| Classification::new(state))
}

/// Classify a frame. Pure with respect to the frame: the same frame always yields the
/// same classification.
pub fn classify<P: ScreenProbe + ?Sized>(
    frame: &Frame,
    probe: &P,
    mode: GameMode,
) -> Classification {
    PRIORITY
        .iter()
        .find_map(|&state| detect(state, frame, probe, mode))
        .unwrap_or_else(Classification::unknown)
}
