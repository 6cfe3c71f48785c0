//! Resource kinds shipped with the client.

mod apns_device;
mod class;
mod instance;
mod invitation;
mod user;

pub use apns_device::*;
pub use class::*;
pub use instance::*;
pub use invitation::*;
pub use user::*;
