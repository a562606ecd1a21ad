//! Screen recognition for the game client
//!
//! Frames come from the device, templates from the template directory, and the probe
//! locates templates inside frames with a confidence score.

pub mod frame;
pub mod probe;
pub mod region;
pub mod template;


pub use frame::{Frame, MatchResult};
pub use probe::{DEFAULT_CONFIDENCE, STRICT_CONFIDENCE, ScreenProbe, TemplateProbe};
pub use region::Region;
pub use template::{ImageId, Template, TemplateKey, TemplateLibrary, TemplateStore};
