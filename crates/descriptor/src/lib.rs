//! Page descriptors for telemetry records
//!
//! Pure, synchronous snapshots of the things a page view carries besides its
//! URL: how big the window and screen are, what client produced the request
//! and which marketing campaign brought the visitor in.
//!
//! Nothing here reads global state or caches. Callers pass in raw values read
//! at capture time and get a serializable descriptor back.
//!
//! ```text
//! Viewport + Screen ──► DeviceDescriptor
//! user agent string ──► ClientDescriptor
//! page href         ──► Campaign (utm_*)
//! ```

pub mod campaign;
pub mod client;
pub mod device;
pub mod error;

pub use campaign::Campaign;
pub use client::{ClientDescriptor, DeviceKind};
pub use device::{DeviceDescriptor, Screen, Viewport};
pub use error::{DescriptorError, Result};
