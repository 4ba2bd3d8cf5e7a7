use serde::{Deserialize, Serialize};

use crate::id::{BrowserId, FrameId};

/// A browser tab as seen by a load callback.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Browser {
    pub id: BrowserId,
}

impl Browser {
    pub fn new(id: i32) -> Self {
        Self { id: BrowserId(id) }
    }
}

/// A document frame within a browser.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Frame {
    pub id: FrameId,
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub is_main: bool,
}

impl Frame {
    /// The top-level frame of a browser.
    pub fn main(id: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            id: FrameId::new(id),
            url: url.into(),
            is_main: true,
        }
    }

    /// A nested (iframe) frame.
    pub fn child(id: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            id: FrameId::new(id),
            url: url.into(),
            is_main: false,
        }
    }
}
