//! Reference templates and the store that owns them

use crate::config::GameMode;
use crate::error::{BotError, BotResult};
use image::GrayImage;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// Every fixed UI image the bot recognizes. File names are the snake_case variant names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ImageId {
    RitoLogo,
    CloseLobby,
    Accepted,
    Composition,
    Items,
    FirstPlace,
    Back,
    PickAugment,
    Carousel,
    CollapseTopBar,
    NormalGame,
    DawnOfHeroes,
    // Button faces, stored under buttons/
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
}

impl ImageId {
    pub const ALL: [ImageId; 22] = [
        ImageId::RitoLogo,
        ImageId::CloseLobby,
        ImageId::Accepted,
        ImageId::Composition,
        ImageId::Items,
        ImageId::FirstPlace,
        ImageId::Back,
        ImageId::PickAugment,
        ImageId::Carousel,
        ImageId::CollapseTopBar,
        ImageId::NormalGame,
        ImageId::DawnOfHeroes,
        ImageId::Play,
        ImageId::Accept,
        ImageId::ExitNow,
        ImageId::Check,
        ImageId::CheckChoice,
        ImageId::BuyXp,
        ImageId::ReturnToBoard,
        ImageId::ChooseOne,
        ImageId::ChooseOneHidden,
        ImageId::DawnOfHeroesContinue,
    ];

    pub fn file_stem(self) -> &'static str {
        match self {
            ImageId::RitoLogo => "rito_logo",
            ImageId::CloseLobby => "close_lobby",
            ImageId::Accepted => "accepted",
            ImageId::Composition => "composition",
            ImageId::Items => "items",
            ImageId::FirstPlace => "first_place",
            ImageId::Back => "back",
            ImageId::PickAugment => "pick_augment",
            ImageId::Carousel => "carousel",
            ImageId::CollapseTopBar => "collapse_top_bar",
            ImageId::NormalGame => "normal_game",
            ImageId::DawnOfHeroes => "dawn_of_heroes",
            ImageId::Play => "play",
            ImageId::Accept => "accept",
            ImageId::ExitNow => "exit_now",
            ImageId::Check => "check",
            ImageId::CheckChoice => "check_choice",
            ImageId::BuyXp => "buy_xp",
            ImageId::ReturnToBoard => "return_to_board",
            ImageId::ChooseOne => "choose_one",
            ImageId::ChooseOneHidden => "choose_one_hidden",
            ImageId::DawnOfHeroesContinue => "dawn_of_heroes_continue",
        }
    }

    fn is_button_face(self) -> bool {
        matches!(
            self,
            ImageId::Play
                | ImageId::Accept
                | ImageId::ExitNow
                | ImageId::Check
                | ImageId::CheckChoice
                | ImageId::BuyXp
                | ImageId::ReturnToBoard
                | ImageId::ChooseOne
                | ImageId::ChooseOneHidden
                | ImageId::DawnOfHeroesContinue
        )
    }

    pub fn relative_path(self) -> PathBuf {
        let file = format!("{}.png", self.file_stem());
        if self.is_button_face() {
            Path::new("buttons").join(file)
        } else {
            PathBuf::from(file)
        }
    }
}

/// Identity of a template in the store
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TemplateKey {
    Image(ImageId),
    /// Unit trait icon shown on shop cards, changes every set
    Trait(String),
    /// Stage indicator in the expanded top bar, e.g. "3-2"
    Phase(String),
}

impl TemplateKey {
    pub fn relative_path(&self, mode: GameMode) -> PathBuf {
        match self {
            TemplateKey::Image(id) => id.relative_path(),
            TemplateKey::Trait(name) => Path::new("traits")
                .join(mode.trait_dir())
                .join(format!("{}.png", name.to_lowercase())),
            TemplateKey::Phase(name) => {
                Path::new("phases").join(format!("phase_{}.png", name.replace('-', "_")))
            }
        }
    }
}

impl From<ImageId> for TemplateKey {
    fn from(id: ImageId) -> Self {
        TemplateKey::Image(id)
    }
}

impl std::fmt::Display for TemplateKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TemplateKey::Image(id) => write!(f, "{}", id.file_stem()),
            TemplateKey::Trait(name) => write!(f, "trait:{name}"),
            TemplateKey::Phase(name) => write!(f, "phase:{name}"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Template {
    pub key: TemplateKey,
    pub path: PathBuf,
    pub image: GrayImage,
}

impl Template {
    pub fn open(key: TemplateKey, path: PathBuf) -> Result<Self, String> {
        let image = image::open(&path)
            .map_err(|e| format!("Failed to load template {}: {e}", path.display()))?
            .to_luma8();
        if image.width() == 0 || image.height() == 0 {
            return Err(format!("Template {} is empty", path.display()));
        }
        Ok(Self { key, path, image })
    }

    pub fn from_image(key: TemplateKey, image: GrayImage) -> Self {
        Self {
            key,
            path: PathBuf::new(),
            image,
        }
    }

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }
}

/// Lookup of templates by symbolic key
pub trait TemplateStore: Send + Sync {
    fn load(&self, key: &TemplateKey) -> Option<&Template>;
}

/// Templates read once at startup from `templates_dir`
#[derive(Debug, Default)]
pub struct TemplateLibrary {
    templates: HashMap<TemplateKey, Template>,
}

impl TemplateLibrary {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, template: Template) {
        self.templates.insert(template.key.clone(), template);
    }

    pub fn count(&self) -> usize {
        self.templates.len()
    }

    /// Load every UI image plus the requested trait and phase templates.
    ///
    /// A missing or unreadable UI image is fatal. Trait and phase templates are optional:
    /// they are skipped with a warning and simply never match.
    pub fn load_from_directory(
        directory: &Path,
        mode: GameMode,
        traits: &[String],
        phases: &[String],
    ) -> BotResult<Self> {
        if !directory.is_dir() {
            return Err(BotError::Config(format!(
                "Template directory not found: {}",
                directory.display()
            )));
        }

        let mut library = Self::new();
        let mut missing = Vec::new();

        for id in ImageId::ALL {
            let key = TemplateKey::Image(id);
            let path = directory.join(key.relative_path(mode));
            match Template::open(key, path) {
                Ok(template) => library.insert(template),
                Err(e) => {
                    log::debug!("{e}");
                    missing.push(id.relative_path().display().to_string());
                }
            }
        }

        if !missing.is_empty() {
            return Err(BotError::MissingTemplates(missing));
        }

        let optional = traits
            .iter()
            .map(|t| TemplateKey::Trait(t.clone()))
            .chain(phases.iter().map(|p| TemplateKey::Phase(p.clone())));
        for key in optional {
            let path = directory.join(key.relative_path(mode));
            match Template::open(key.clone(), path) {
                Ok(template) => library.insert(template),
                Err(e) => log::warn!("⚠️ {key} will never match: {e}"),
            }
        }

        log::info!(
            "🖼️ Loaded {} templates from {}",
            library.count(),
            directory.display()
        );
        Ok(library)
    }

    /// Trait names that have an icon on disk for `mode`, sorted
    pub fn available_traits(directory: &Path, mode: GameMode) -> Vec<String> {
        let trait_dir = directory.join("traits").join(mode.trait_dir());
        let mut names: Vec<String> = std::fs::read_dir(&trait_dir)
            .map(|entries| {
                entries
                    .filter_map(|entry| entry.ok())
                    .map(|entry| entry.path())
                    .filter(|path| {
                        path.is_file() && path.extension().is_some_and(|ext| ext == "png")
                    })
                    .filter_map(|path| {
                        path.file_stem()
                            .and_then(|stem| stem.to_str())
                            .map(str::to_lowercase)
                    })
                    .collect()
            })
            .unwrap_or_default();
        names.sort();
        names
    }
}

impl TemplateStore for TemplateLibrary {
    fn load(&self, key: &TemplateKey) -> Option<&Template> {
        self.templates.get(key)
    }
}
