pub mod controller;
pub mod image_url;
pub mod message;
pub mod surface;

pub use controller::{OverlayController, OverlayOptions, OverlayState, SubmitOutcome};
pub use image_url::is_valid_image_url;
pub use message::InboundMessage;
