//! Session configuration.
//!
//! Defaults, optionally overridden by a JSON file and then by URL-style
//! query parameters (`?room=abc123&server=localhost:3030`).

use crate::error::{ConfigError, ConfigResult};
use crate::render::Smoothing;
use crate::style::{DEFAULT_ERASER_WIDTH, DEFAULT_PEN_WIDTH, SessionContext, StrokeColor};
use crate::viewport::AspectRatio;
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    pub aspect_ratio: AspectRatio,
    pub pen_color: StrokeColor,
    pub pen_width: f64,
    pub eraser_width: f64,
    pub smoothing: Smoothing,
    /// Relay host:port or full `ws://` / `wss://` URL.
    pub server: Option<String>,
    pub room: Option<String>,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            aspect_ratio: AspectRatio::default(),
            pen_color: StrokeColor::BLACK,
            pen_width: DEFAULT_PEN_WIDTH,
            eraser_width: DEFAULT_ERASER_WIDTH,
            smoothing: Smoothing::default(),
            server: None,
            room: None,
        }
    }
}

impl SessionConfig {
    pub fn from_json(json: &str) -> ConfigResult<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Load from a JSON file.
    pub fn load(path: impl AsRef<Path>) -> ConfigResult<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)?;
        let config = Self::from_json(&json)?;
        log::info!("Loaded config from {}", path.display());
        Ok(config)
    }

    pub fn validate(&self) -> ConfigResult<()> {
        if self.aspect_ratio.width == 0 || self.aspect_ratio.height == 0 {
            return Err(ConfigError::Invalid {
                field: "aspect_ratio",
                reason: "both sides must be non-zero".to_string(),
            });
        }
        for (field, width) in [("pen_width", self.pen_width), ("eraser_width", self.eraser_width)] {
            if !width.is_finite() || width <= 0.0 {
                return Err(ConfigError::Invalid {
                    field,
                    reason: format!("must be a positive number, got {}", width),
                });
            }
        }
        Ok(())
    }

    /// Apply `room` and `server` from a query string or hash fragment.
    /// Empty values and unknown keys are ignored.
    pub fn apply_query(&mut self, query: &str) {
        let query = query.trim_start_matches(['?', '#']);
        for pair in query.split('&') {
            let Some((key, value)) = pair.split_once('=') else {
                continue;
            };
            if value.is_empty() {
                continue;
            }
            match key {
                "room" => self.room = Some(value.to_string()),
                "server" => self.server = Some(value.to_string()),
                _ => {}
            }
        }
    }

    /// Apply `room` and `server` from the page's query string and hash.
    #[cfg(target_arch = "wasm32")]
    pub fn apply_location(&mut self) {
        let Some(window) = web_sys::window() else {
            return;
        };
        let location = window.location();
        if let Ok(hash) = location.hash() {
            self.apply_query(&hash);
        }
        // The query string takes precedence over the hash.
        if let Ok(search) = location.search() {
            self.apply_query(&search);
        }
    }

    /// WebSocket URL of the relay, if a server is configured.
    ///
    /// A bare `host:port` gets the `ws://` scheme, and the `/ws` path is
    /// appended when missing.
    pub fn server_url(&self) -> Option<String> {
        let server = self.server.as_deref()?.trim();
        if server.is_empty() {
            return None;
        }
        let server = server.trim_end_matches('/');
        let with_scheme = if server.starts_with("ws://") || server.starts_with("wss://") {
            server.to_string()
        } else {
            format!("ws://{}", server)
        };
        if with_scheme.ends_with("/ws") {
            Some(with_scheme)
        } else {
            Some(format!("{}/ws", with_scheme))
        }
    }

    /// Initial toolbar state.
    pub fn session_context(&self) -> SessionContext {
        SessionContext {
            color: self.pen_color,
            pen_width: self.pen_width,
            eraser_width: self.eraser_width,
            ..SessionContext::default()
        }
    }
}
