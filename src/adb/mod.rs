// Device module - the phone as seen through the local adb server
// Shell commands run on the adb_client server device; frames can be captured per
// request or by a background stream.

pub mod device;
pub mod error;
pub mod frame_stream;
pub mod types;

#[cfg(test)]
mod tests;

pub use device::AdbDevice;
pub use error::{AdbError, AdbResult};
pub use frame_stream::{FrameSource, FrameStream};
pub use types::{GAME_ACTIVITY, GAME_PACKAGE, GameDevice};
