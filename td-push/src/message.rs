//! Push message schema.
//!
//! Mirrors the wire format the messaging platform and the Flutter app
//! expect: a device token, a human-readable notification, a string data
//! map, and platform delivery hints for Android and APNs.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use td_core::constants::CLICK_ACTION;

/// A push message addressed to a single device token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PushMessage {
    /// Delivery token of the target installation.
    pub token: String,

    /// Human-readable notification content.
    pub notification: PushNotification,

    /// Structured payload delivered alongside the notification.
    #[serde(default)]
    pub data: BTreeMap<String, String>,

    /// Android delivery hints.
    pub android: AndroidConfig,

    /// APNs delivery hints.
    pub apns: ApnsConfig,
}

/// Title and body shown to the user.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PushNotification {
    pub title: String,
    pub body: String,
}

/// Android-specific delivery configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AndroidConfig {
    pub priority: String,
    pub notification: AndroidNotification,
}

/// Android notification channel and tap behaviour.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AndroidNotification {
    #[serde(rename = "channelId")]
    pub channel_id: String,
    #[serde(rename = "clickAction")]
    pub click_action: String,
}

/// APNs-specific delivery configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApnsConfig {
    pub payload: ApnsPayload,
}

/// APNs payload wrapper.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApnsPayload {
    pub aps: Aps,
}

/// APNs `aps` dictionary.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Aps {
    pub sound: String,
    pub badge: u32,
}

impl PushMessage {
    /// Build a message with the standard delivery hints: high priority on
    /// Android with the given channel, default sound and badge 1 on APNs.
    pub fn new(token: &str, title: &str, body: &str, channel_id: &str) -> Self {
        Self {
            token: token.to_string(),
            notification: PushNotification {
                title: title.to_string(),
                body: body.to_string(),
            },
            data: BTreeMap::new(),
            android: AndroidConfig {
                priority: "high".to_string(),
                notification: AndroidNotification {
                    channel_id: channel_id.to_string(),
                    click_action: CLICK_ACTION.to_string(),
                },
            },
            apns: ApnsConfig {
                payload: ApnsPayload {
                    aps: Aps {
                        sound: "default".to_string(),
                        badge: 1,
                    },
                },
            },
        }
    }

    /// Add a data payload entry.
    pub fn with_data(mut self, key: &str, value: &str) -> Self {
        self.data.insert(key.to_string(), value.to_string());
        self
    }
}
