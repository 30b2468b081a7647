//! Twyn push notification delivery.
//!
//! - [`PushMessage`]: the title/body/data triple sent to a device, with
//!   constructors for every job outcome.
//! - [`PushTransport`]: a single-device send. [`ApnsTransport`] talks to
//!   Apple's token-based HTTP/2 API, [`LogOnlyTransport`] only logs.
//! - [`DeviceRegistry`]: where active device tokens come from.
//! - [`Notifier`]: fans one message out to every active device of an owner.

pub mod error;
pub mod message;
pub mod notifier;
pub mod registry;
pub mod transport;

pub use error::PushError;
pub use message::PushMessage;
pub use notifier::{DeliveryFailure, DeliveryReport, Notifier};
pub use registry::{Device, DeviceRegistry, PgDeviceRegistry};
pub use transport::apns::{ApnsConfig, ApnsTransport};
pub use transport::log_only::LogOnlyTransport;
pub use transport::PushTransport;
