//! The structured memory aid document.
//!
//! A [`StructuredAid`] is what the generation layer hands back to its
//! callers: an optional mind map, an ordered list of mnemonic variants, and
//! an ordered list of sensory associations. Serialization uses the upstream
//! camelCase field names so persisted documents and provider replies share
//! one shape.

use serde::{Deserialize, Serialize};

/// Output language for generated placeholder text and prompts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    #[default]
    English,
    Chinese,
}

impl Language {
    /// Map a BCP-47-ish tag ("zh-CN", "en-US", ...) to a supported language.
    pub fn from_tag(tag: &str) -> Self {
        if tag.to_ascii_lowercase().starts_with("zh") {
            Self::Chinese
        } else {
            Self::English
        }
    }
}

/// The generated artifact: mind map + mnemonics + sensory associations.
///
/// `mind_map` being `None` means the upstream produced nothing usable for
/// it. Absence is distinct from an empty tree and is preserved as `null`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StructuredAid {
    pub mind_map: Option<MindMapNode>,
    pub mnemonics: Vec<Mnemonic>,
    pub sensory_associations: Vec<SensoryAssociation>,
}

/// One node in the mind map tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MindMapNode {
    pub id: String,
    pub label: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<MindMapNode>,
}

/// Discriminant for mnemonic variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MnemonicType {
    Rhyme,
    Acronym,
    Story,
    Summary,
    Palace,
    Mnemonic,
    Association,
    Unknown,
}

impl MnemonicType {
    /// Positional defaults applied when a reply omits the `type` field:
    /// the prompt template asks for exactly these three, in this order.
    pub const POSITIONAL_DEFAULTS: [MnemonicType; 3] =
        [Self::Rhyme, Self::Summary, Self::Palace];

    /// Parse a discriminant string; `None` for anything unrecognized.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "rhyme" => Some(Self::Rhyme),
            "acronym" => Some(Self::Acronym),
            "story" => Some(Self::Story),
            "summary" => Some(Self::Summary),
            "palace" => Some(Self::Palace),
            "mnemonic" => Some(Self::Mnemonic),
            "association" => Some(Self::Association),
            "unknown" => Some(Self::Unknown),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Rhyme => "rhyme",
            Self::Acronym => "acronym",
            Self::Story => "story",
            Self::Summary => "summary",
            Self::Palace => "palace",
            Self::Mnemonic => "mnemonic",
            Self::Association => "association",
            Self::Unknown => "unknown",
        }
    }
}

impl std::fmt::Display for MnemonicType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single mnemonic variant.
///
/// `id`, `title`, `content` and `kind` are always populated; the remaining
/// fields carry variant-specific detail (summary and palace structure).
/// `content` is always a scalar string — list-shaped replies are flattened
/// before this type is ever constructed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Mnemonic {
    pub id: String,
    pub title: String,
    pub content: String,
    #[serde(rename = "type")]
    pub kind: MnemonicType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub explanation: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub core_point: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub key_principles: Vec<KeyPrinciple>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub theme: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub scenes: Vec<PalaceScene>,
}

/// A concept/example pair inside a summary mnemonic.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KeyPrinciple {
    pub concept: String,
    pub example: String,
}

/// One station in a memory palace mnemonic.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PalaceScene {
    pub principle: String,
    pub scene: String,
    pub anchor: String,
}

/// Discriminant for sensory association groups.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SenseKind {
    Visual,
    Auditory,
    Tactile,
}

impl SenseKind {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "visual" => Some(Self::Visual),
            "auditory" => Some(Self::Auditory),
            "tactile" => Some(Self::Tactile),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Visual => "visual",
            Self::Auditory => "auditory",
            Self::Tactile => "tactile",
        }
    }
}

/// A group of per-sense records under one association heading.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SensoryAssociation {
    pub id: String,
    pub title: String,
    #[serde(rename = "type")]
    pub kind: SenseKind,
    pub content: Vec<SenseRecord>,
}

/// The canonical per-sense content record.
///
/// Legacy reply shapes (`{dynasty, ...}` or `{sense, desc}` pairs) are
/// normalized into these variants on read; they never leak to callers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged, rename_all_fields = "camelCase")]
pub enum SenseRecord {
    Visual {
        label: String,
        icon: String,
        color: String,
        association_text: String,
    },
    Auditory {
        label: String,
        sound_description: String,
        rhythm_description: String,
    },
    Tactile {
        label: String,
        texture_description: String,
        feeling_description: String,
    },
}

impl SenseRecord {
    /// The display label, independent of which sense the record carries.
    pub fn label(&self) -> &str {
        match self {
            Self::Visual { label, .. }
            | Self::Auditory { label, .. }
            | Self::Tactile { label, .. } => label,
        }
    }
}

/// Truncate to at most `max_chars` characters (not bytes), appending an
/// ellipsis when anything was cut.
pub fn truncate_label(s: &str, max_chars: usize) -> String {
    if s.chars().count() <= max_chars {
        s.to_string()
    } else {
        let mut out: String = s.chars().take(max_chars).collect();
        out.push_str("...");
        out
    }
}

impl StructuredAid {
    /// The canonical fallback document, used when every parse attempt on an
    /// upstream reply failed or the upstream returned nothing.
    ///
    /// Schema-valid by construction so downstream consumers never need to
    /// special-case it: a single labeled root with two placeholder
    /// children, one rhyme mnemonic asking the user to retry, and one
    /// neutral visual association.
    pub fn fallback(original_input: &str, language: Language) -> Self {
        let (point1, point2, rhyme_title, retry_msg, visual_title, label, assoc) = match language {
            Language::Chinese => (
                "关键点1",
                "关键点2",
                "顺口溜记忆法",
                "系统正在处理中，请稍后重试",
                "视觉联想",
                "内容",
                "记忆联想",
            ),
            Language::English => (
                "Key point 1",
                "Key point 2",
                "Rhyme memory method",
                "The system is still processing, please retry shortly",
                "Visual association",
                "Content",
                "Memory association",
            ),
        };

        Self {
            mind_map: Some(MindMapNode {
                id: "root".into(),
                label: truncate_label(original_input, 50),
                children: vec![
                    MindMapNode {
                        id: "point1".into(),
                        label: point1.into(),
                        children: Vec::new(),
                    },
                    MindMapNode {
                        id: "point2".into(),
                        label: point2.into(),
                        children: Vec::new(),
                    },
                ],
            }),
            mnemonics: vec![Mnemonic {
                id: "rhyme".into(),
                title: rhyme_title.into(),
                content: retry_msg.into(),
                kind: MnemonicType::Rhyme,
                explanation: None,
                core_point: None,
                key_principles: Vec::new(),
                theme: None,
                scenes: Vec::new(),
            }],
            sensory_associations: vec![SensoryAssociation {
                id: "visual".into(),
                title: visual_title.into(),
                kind: SenseKind::Visual,
                content: vec![SenseRecord::Visual {
                    label: label.into(),
                    icon: "🧠".into(),
                    color: "#3b82f6".into(),
                    association_text: assoc.into(),
                }],
            }],
        }
    }
}
