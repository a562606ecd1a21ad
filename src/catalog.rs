//! Static catalog of the game's UI elements at 1280x720
//!
//! Every button the bot taps has a click region. Buttons it also has to see first carry
//! their template and, where the face is easily confused with other UI, a narrower
//! capture region to search within.

use crate::vision::{DEFAULT_CONFIDENCE, ImageId, Region, STRICT_CONFIDENCE};

pub const SCREEN_WIDTH: u32 = 1280;
pub const SCREEN_HEIGHT: u32 = 720;

/// Row of shop cards searched for trait icons
pub const SHOP_REGION: Region = Region::new(170, 110, 1250, 230);
/// Area of the carousel the little legend can walk to
pub const CAROUSEL_REGION: Region = Region::new(420, 180, 825, 425);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UiElement {
    /// Tapped blind, never recognized
    Clickable { click: Region },
    Recognizable {
        click: Region,
        template: ImageId,
        capture: Option<Region>,
    },
}

impl UiElement {
    const fn clickable(click: Region) -> Self {
        UiElement::Clickable { click }
    }

    const fn recognizable(click: Region, template: ImageId) -> Self {
        UiElement::Recognizable {
            click,
            template,
            capture: None,
        }
    }

    const fn captured(click: Region, template: ImageId, capture: Region) -> Self {
        UiElement::Recognizable {
            click,
            template,
            capture: Some(capture),
        }
    }

    pub fn click_region(&self) -> Region {
        match self {
            UiElement::Clickable { click } | UiElement::Recognizable { click, .. } => *click,
        }
    }

    pub fn template(&self) -> Option<ImageId> {
        match self {
            UiElement::Clickable { .. } => None,
            UiElement::Recognizable { template, .. } => Some(*template),
        }
    }

    pub fn capture(&self) -> Option<Region> {
        match self {
            UiElement::Clickable { .. } => None,
            UiElement::Recognizable { capture, .. } => *capture,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Button {
    Play,
    Accept,
    ExitNow,
    Check,
    CheckChoice,
    BuyXp,
    ReturnToBoard,
    ChooseOne,
    ChooseOneHidden,
    DawnOfHeroesContinue,
    StoreCard1,
    StoreCard2,
    StoreCard3,
    StoreCard4,
    StoreCard5,
    Augment1,
    Augment2,
    Augment3,
    AugmentRoll1,
    AugmentRoll2,
    AugmentRoll3,
    Surrender,
    CheckSurrender,
    ExpandTopBar,
}

impl Button {
    pub const ALL: [Button; 24] = [
        Button::Play,
        Button::Accept,
        Button::ExitNow,
        Button::Check,
        Button::CheckChoice,
        Button::BuyXp,
        Button::ReturnToBoard,
        Button::ChooseOne,
        Button::ChooseOneHidden,
        Button::DawnOfHeroesContinue,
        Button::StoreCard1,
        Button::StoreCard2,
        Button::StoreCard3,
        Button::StoreCard4,
        Button::StoreCard5,
        Button::Augment1,
        Button::Augment2,
        Button::Augment3,
        Button::AugmentRoll1,
        Button::AugmentRoll2,
        Button::AugmentRoll3,
        Button::Surrender,
        Button::CheckSurrender,
        Button::ExpandTopBar,
    ];

    pub const fn element(self) -> UiElement {
        match self {
            Button::Play => UiElement::recognizable(Region::new(950, 600, 1200, 650), ImageId::Play),
            Button::Accept => {
                UiElement::recognizable(Region::new(525, 520, 755, 545), ImageId::Accept)
            }
            Button::ExitNow => UiElement::captured(
                Region::new(550, 425, 740, 440),
                ImageId::ExitNow,
                Region::new(520, 400, 775, 425),
            ),
            Button::Check => UiElement::recognizable(Region::new(555, 425, 725, 470), ImageId::Check),
            Button::CheckChoice => UiElement::captured(
                Region::new(585, 610, 695, 645),
                ImageId::CheckChoice,
                Region::new(560, 590, 720, 665),
            ),
            Button::BuyXp => UiElement::captured(
                Region::new(35, 593, 124, 682),
                ImageId::BuyXp,
                Region::new(9, 550, 170, 708),
            ),
            Button::ReturnToBoard => UiElement::captured(
                Region::new(1155, 595, 1242, 682),
                ImageId::ReturnToBoard,
                Region::new(1128, 568, 1269, 709),
            ),
            Button::ChooseOne => UiElement::captured(
                Region::new(636, 91, 693, 186),
                ImageId::ChooseOne,
                Region::new(1128, 568, 1269, 709),
            ),
            Button::ChooseOneHidden => UiElement::captured(
                Region::new(1155, 595, 1242, 682),
                ImageId::ChooseOneHidden,
                Region::new(1128, 568, 1269, 709),
            ),
            Button::DawnOfHeroesContinue => UiElement::captured(
                Region::new(555, 630, 725, 670),
                ImageId::DawnOfHeroesContinue,
                Region::new(530, 610, 750, 690),
            ),
            Button::StoreCard1 => UiElement::clickable(Region::new(180, 47, 363, 272)),
            Button::StoreCard2 => UiElement::clickable(Region::new(402, 47, 585, 272)),
            Button::StoreCard3 => UiElement::clickable(Region::new(624, 47, 807, 272)),
            Button::StoreCard4 => UiElement::clickable(Region::new(845, 47, 1028, 272)),
            Button::StoreCard5 => UiElement::clickable(Region::new(1067, 47, 1250, 272)),
            Button::Augment1 => UiElement::clickable(Region::new(170, 120, 424, 520)),
            Button::Augment2 => UiElement::clickable(Region::new(516, 120, 770, 520)),
            Button::Augment3 => UiElement::clickable(Region::new(863, 120, 1117, 520)),
            Button::AugmentRoll1 => UiElement::clickable(Region::new(266, 602, 323, 659)),
            Button::AugmentRoll2 => UiElement::clickable(Region::new(612, 602, 669, 659)),
            Button::AugmentRoll3 => UiElement::clickable(Region::new(959, 602, 1016, 659)),
            Button::Surrender => UiElement::clickable(Region::new(115, 570, 330, 610)),
            Button::CheckSurrender => UiElement::clickable(Region::new(700, 440, 900, 480)),
            Button::ExpandTopBar => UiElement::clickable(Region::new(610, 0, 670, 20)),
        }
    }

    /// Match threshold. Choice prompts sit on busy backgrounds and need the strict one.
    pub fn confidence(self) -> f32 {
        match self {
            Button::ChooseOne | Button::ChooseOneHidden | Button::CheckChoice => STRICT_CONFIDENCE,
            _ => DEFAULT_CONFIDENCE,
        }
    }

    pub fn store_cards() -> [Button; 5] {
        [
            Button::StoreCard1,
            Button::StoreCard2,
            Button::StoreCard3,
            Button::StoreCard4,
            Button::StoreCard5,
        ]
    }

    pub fn augments() -> [Button; 3] {
        [Button::Augment1, Button::Augment2, Button::Augment3]
    }

    pub fn augment_rolls() -> [Button; 3] {
        [
            Button::AugmentRoll1,
            Button::AugmentRoll2,
            Button::AugmentRoll3,
        ]
    }
}
