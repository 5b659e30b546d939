//! User and device properties attached to events.

use serde::{Deserialize, Serialize};
use tracker_payload::constants::keys;

/// Properties describing who or what generated an event.
///
/// A tracker may carry a default subject and each event may carry its own;
/// the event's fields win where both are set.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Subject {
    pub user_id: Option<String>,
    pub screen_resolution: Option<(u32, u32)>,
    pub viewport: Option<(u32, u32)>,
    pub color_depth: Option<u32>,
    pub timezone: Option<String>,
    pub language: Option<String>,
    pub ip_address: Option<String>,
    pub useragent: Option<String>,
    pub domain_user_id: Option<String>,
    pub network_user_id: Option<String>,
    pub domain_session_id: Option<String>,
}

impl Subject {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn user_id(mut self, user_id: impl Into<String>) -> Self {
        self.user_id = Some(user_id.into());
        self
    }

    pub fn screen_resolution(mut self, width: u32, height: u32) -> Self {
        self.screen_resolution = Some((width, height));
        self
    }

    pub fn viewport(mut self, width: u32, height: u32) -> Self {
        self.viewport = Some((width, height));
        self
    }

    pub fn color_depth(mut self, depth: u32) -> Self {
        self.color_depth = Some(depth);
        self
    }

    pub fn timezone(mut self, timezone: impl Into<String>) -> Self {
        self.timezone = Some(timezone.into());
        self
    }

    pub fn language(mut self, language: impl Into<String>) -> Self {
        self.language = Some(language.into());
        self
    }

    pub fn ip_address(mut self, ip: impl Into<String>) -> Self {
        self.ip_address = Some(ip.into());
        self
    }

    pub fn useragent(mut self, useragent: impl Into<String>) -> Self {
        self.useragent = Some(useragent.into());
        self
    }

    pub fn domain_user_id(mut self, id: impl Into<String>) -> Self {
        self.domain_user_id = Some(id.into());
        self
    }

    pub fn network_user_id(mut self, id: impl Into<String>) -> Self {
        self.network_user_id = Some(id.into());
        self
    }

    pub fn domain_session_id(mut self, id: impl Into<String>) -> Self {
        self.domain_session_id = Some(id.into());
        self
    }

    /// Field-wise merge: values set on `self` take precedence over `fallback`.
    pub fn merged_over(&self, fallback: &Subject) -> Subject {
        Subject {
            user_id: self.user_id.clone().or_else(|| fallback.user_id.clone()),
            screen_resolution: self.screen_resolution.or(fallback.screen_resolution),
            viewport: self.viewport.or(fallback.viewport),
            color_depth: self.color_depth.or(fallback.color_depth),
            timezone: self.timezone.clone().or_else(|| fallback.timezone.clone()),
            language: self.language.clone().or_else(|| fallback.language.clone()),
            ip_address: self.ip_address.clone().or_else(|| fallback.ip_address.clone()),
            useragent: self.useragent.clone().or_else(|| fallback.useragent.clone()),
            domain_user_id: self
                .domain_user_id
                .clone()
                .or_else(|| fallback.domain_user_id.clone()),
            network_user_id: self
                .network_user_id
                .clone()
                .or_else(|| fallback.network_user_id.clone()),
            domain_session_id: self
                .domain_session_id
                .clone()
                .or_else(|| fallback.domain_session_id.clone()),
        }
    }

    /// Payload entries for every property that is set.
    pub fn pairs(&self) -> Vec<(&'static str, String)> {
        let dims = |(w, h): (u32, u32)| format!("{}x{}", w, h);

        [
            (keys::UID, self.user_id.clone()),
            (keys::RESOLUTION, self.screen_resolution.map(dims)),
            (keys::VIEWPORT, self.viewport.map(dims)),
            (keys::COLOR_DEPTH, self.color_depth.map(|d| d.to_string())),
            (keys::TIMEZONE, self.timezone.clone()),
            (keys::LANGUAGE, self.language.clone()),
            (keys::IP_ADDRESS, self.ip_address.clone()),
            (keys::USERAGENT, self.useragent.clone()),
            (keys::DOMAIN_UID, self.domain_user_id.clone()),
            (keys::NETWORK_UID, self.network_user_id.clone()),
            (keys::SESSION_UID, self.domain_session_id.clone()),
        ]
        .into_iter()
        .filter_map(|(key, value)| value.filter(|v| !v.is_empty()).map(|v| (key, v)))
        .collect()
    }
}
