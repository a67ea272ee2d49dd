//! Device geometry
//!
//! The screen dimensions recorded are the *available* area (what the OS
//! leaves for windows after taskbars and docks), not the raw panel size.

use serde::{Deserialize, Serialize};

/// Layout viewport of the page (`innerWidth` / `innerHeight`)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Viewport {
    pub inner_width: u32,
    pub inner_height: u32,
}

/// Physical screen as reported by the host
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Screen {
    pub width: u32,
    pub height: u32,
    pub avail_width: u32,
    pub avail_height: u32,
}

impl Screen {
    /// Screen where the whole panel is available
    pub fn full(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            avail_width: width,
            avail_height: height,
        }
    }
}

/// Geometry attached to every page view
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceDescriptor {
    pub inner_width: u32,
    pub inner_height: u32,
    pub screen_width: u32,
    pub screen_height: u32,
}

impl DeviceDescriptor {
    pub fn new(viewport: &Viewport, screen: &Screen) -> Self {
        Self {
            inner_width: viewport.inner_width,
            inner_height: viewport.inner_height,
            screen_width: screen.avail_width,
            screen_height: screen.avail_height,
        }
    }
}
