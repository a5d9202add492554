//! Bonus reward catalog entries.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::reward::Weighted;

/// How a bonus reward is meant to be presented.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RewardKind {
    /// A link to open.
    Url,
    /// A plain message.
    Message,
    /// An image URL.
    Image,
    /// A quote category (`programming`, `motivation`, `any`, ...).
    Quote,
}

impl fmt::Display for RewardKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            RewardKind::Url => "url",
            RewardKind::Message => "message",
            RewardKind::Image => "image",
            RewardKind::Quote => "quote",
        };
        f.write_str(s)
    }
}

/// A configured bonus reward.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RewardItem {
    #[serde(rename = "type")]
    pub kind: RewardKind,
    pub label: String,
    pub content: String,
    /// Relative weight; unset means 1.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weight: Option<f64>,
}

impl RewardItem {
    pub fn new(kind: RewardKind, label: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            kind,
            label: label.into(),
            content: content.into(),
            weight: None,
        }
    }

    /// Set an explicit weight.
    pub fn with_weight(mut self, weight: f64) -> Self {
        self.weight = Some(weight);
        self
    }
}

impl Weighted for RewardItem {
    fn weight(&self) -> f64 {
        self.weight.unwrap_or(1.0)
    }
}
