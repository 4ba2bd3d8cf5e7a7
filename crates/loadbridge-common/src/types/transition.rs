use serde::{Deserialize, Serialize};

/// Raw transition value as delivered by the engine: a source in the low byte
/// plus qualifier flags in the upper bits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TransitionType(pub u32);

impl TransitionType {
    pub const SOURCE_MASK: u32 = 0x0000_00FF;
    pub const QUALIFIER_MASK: u32 = 0xFFFF_FF00;

    pub fn new(source: TransitionSource, qualifiers: TransitionQualifiers) -> Self {
        Self(source as u32 | qualifiers.bits())
    }

    /// Decode the source part. `None` when the engine sent a source this
    /// build does not know about.
    pub fn source(self) -> Option<TransitionSource> {
        TransitionSource::from_raw(self.0 & Self::SOURCE_MASK)
    }

    pub fn qualifiers(self) -> TransitionQualifiers {
        TransitionQualifiers::from_bits_truncate(self.0 & Self::QUALIFIER_MASK)
    }

    pub fn is_redirect(self) -> bool {
        self.qualifiers().intersects(TransitionQualifiers::IS_REDIRECT)
    }
}

impl From<TransitionSource> for TransitionType {
    fn from(source: TransitionSource) -> Self {
        Self(source as u32)
    }
}

/// What started a navigation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u32)]
pub enum TransitionSource {
    /// User followed a link.
    Link = 0,
    /// User typed a URL or picked a suggestion.
    Explicit = 1,
    AutoBookmark = 2,
    /// Subframe loaded automatically as part of its parent.
    AutoSubframe = 3,
    /// Subframe navigated explicitly by the user.
    ManualSubframe = 4,
    Generated = 5,
    AutoToplevel = 6,
    FormSubmit = 7,
    Reload = 8,
    Keyword = 9,
    KeywordGenerated = 10,
}

impl TransitionSource {
    pub const ALL: [TransitionSource; 11] = [
        Self::Link,
        Self::Explicit,
        Self::AutoBookmark,
        Self::AutoSubframe,
        Self::ManualSubframe,
        Self::Generated,
        Self::AutoToplevel,
        Self::FormSubmit,
        Self::Reload,
        Self::Keyword,
        Self::KeywordGenerated,
    ];

    pub fn from_raw(raw: u32) -> Option<Self> {
        Self::ALL.into_iter().find(|s| *s as u32 == raw)
    }

    /// Constant name used by the listener runtime's enum.
    pub fn name(self) -> &'static str {
        match self {
            Self::Link => "TT_LINK",
            Self::Explicit => "TT_EXPLICIT",
            Self::AutoBookmark => "TT_AUTO_BOOKMARK",
            Self::AutoSubframe => "TT_AUTO_SUBFRAME",
            Self::ManualSubframe => "TT_MANUAL_SUBFRAME",
            Self::Generated => "TT_GENERATED",
            Self::AutoToplevel => "TT_AUTO_TOPLEVEL",
            Self::FormSubmit => "TT_FORM_SUBMIT",
            Self::Reload => "TT_RELOAD",
            Self::Keyword => "TT_KEYWORD",
            Self::KeywordGenerated => "TT_KEYWORD_GENERATED",
        }
    }
}

bitflags::bitflags! {
    /// Qualifier flags carried in the upper bits of a transition value.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct TransitionQualifiers: u32 {
        const BLOCKED = 0x0080_0000;
        const FORWARD_BACK = 0x0100_0000;
        const DIRECT_LOAD = 0x0200_0000;
        const HOME_PAGE = 0x0400_0000;
        const FROM_API = 0x0800_0000;
        const CHAIN_START = 0x1000_0000;
        const CHAIN_END = 0x2000_0000;
        const CLIENT_REDIRECT = 0x4000_0000;
        const SERVER_REDIRECT = 0x8000_0000;

        const IS_REDIRECT = Self::CLIENT_REDIRECT.bits() | Self::SERVER_REDIRECT.bits();
    }
}
