//! User-agent parsing
//!
//! Token matching in a fixed precedence order. Most UA strings carry several
//! vendor tokens (Edge says "Chrome" and "Safari", Chrome says "Safari"), so
//! the more specific products are checked first.
//!
//! Names follow the ones analytics dashboards commonly display ("Mobile
//! Safari", "Samsung Internet", "macOS"). Anything unrecognized becomes
//! `"Unknown"` so a parsed-but-unknown client is still distinguishable from a
//! client that was never parsed.

use serde::{Deserialize, Serialize};

pub const UNKNOWN: &str = "Unknown";

/// Form factor of the device
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeviceKind {
    Mobile,
    Tablet,
    Desktop,
}

/// Client information extracted from a user-agent string
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientDescriptor {
    pub browser: String,
    pub os: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub device: Option<DeviceKind>,
}

impl ClientDescriptor {
    pub fn parse(user_agent: &str) -> Self {
        let os = detect_os(user_agent);

        Self {
            browser: detect_browser(user_agent).to_string(),
            os: os.to_string(),
            device: detect_device(user_agent, os),
        }
    }

    pub fn is_unknown(&self) -> bool {
        self.browser == UNKNOWN && self.os == UNKNOWN && self.device.is_none()
    }
}

fn has_any(ua: &str, tokens: &[&str]) -> bool {
    tokens.iter().any(|t| ua.contains(t))
}

fn detect_browser(ua: &str) -> &'static str {
    if has_any(ua, &["Edg/", "EdgA/", "EdgiOS/", "Edge/"]) {
        return "Edge";
    }

    if has_any(ua, &["OPR/", "Opera"]) {
        return "Opera";
    }

    if ua.contains("SamsungBrowser/") {
        return "Samsung Internet";
    }

    if ua.contains("FxiOS/") {
        return "Mobile Firefox";
    }

    if ua.contains("Firefox/") {
        return if has_any(ua, &["Mobile", "Tablet"]) {
            "Mobile Firefox"
        } else {
            "Firefox"
        };
    }

    if ua.contains("CriOS/") {
        return "Mobile Chrome";
    }

    if ua.contains("Chromium/") {
        return "Chromium";
    }

    if ua.contains("Chrome/") {
        if ua.contains("; wv)") {
            return "Chrome WebView";
        }
        return if ua.contains("Mobile") {
            "Mobile Chrome"
        } else {
            "Chrome"
        };
    }

    if has_any(ua, &["MSIE ", "Trident/"]) {
        return "IE";
    }

    if ua.contains("Safari/") && ua.contains("Version/") {
        return if ua.contains("Mobile/") {
            "Mobile Safari"
        } else {
            "Safari"
        };
    }

    UNKNOWN
}

fn detect_os(ua: &str) -> &'static str {
    // iPadOS in desktop mode reports Macintosh; nothing to do about that here
    if has_any(ua, &["iPhone", "iPad", "iPod"]) {
        return "iOS";
    }

    if ua.contains("Android") {
        return "Android";
    }

    if ua.contains("Windows Phone") {
        return "Windows Phone";
    }

    if ua.contains("Windows") {
        return "Windows";
    }

    if ua.contains("CrOS") {
        return "Chrome OS";
    }

    if has_any(ua, &["Mac OS X", "Macintosh"]) {
        return "macOS";
    }

    if ua.contains("Ubuntu") {
        return "Ubuntu";
    }

    if ua.contains("Linux") {
        return "Linux";
    }

    UNKNOWN
}

fn detect_device(ua: &str, os: &str) -> Option<DeviceKind> {
    if has_any(ua, &["iPad", "Tablet"]) || (os == "Android" && !ua.contains("Mobile")) {
        return Some(DeviceKind::Tablet);
    }

    if has_any(ua, &["iPhone", "iPod", "Mobile", "Windows Phone"]) {
        return Some(DeviceKind::Mobile);
    }

    match os {
        "Windows" | "macOS" | "Linux" | "Ubuntu" | "Chrome OS" => Some(DeviceKind::Desktop),
        _ => None,
    }
}
