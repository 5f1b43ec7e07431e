//! Best-effort repair of semi-structured provider replies.
//!
//! Upstream models wrap valid JSON in prose and code fences, drop fields,
//! or emit older field layouts depending on prompt-template revision. This
//! pipeline turns whatever came back into a schema-valid [`StructuredAid`],
//! falling back to a canonical placeholder document when nothing is
//! recoverable. "Could not parse" is a normal outcome here, not an error:
//! [`parse`] never fails.
//!
//! The repair sequence is bounded and ordered:
//! 1. strip code-fence markers and surrounding whitespace
//! 2. direct parse
//! 3. one repair pass: keep only the first `{` .. last `}` span, escape
//!    bare newlines inside string spans, reparse
//! 4. normalize fields, or build the fallback if both parses failed

use memoraid_core::aid::{
    KeyPrinciple, Language, MindMapNode, Mnemonic, MnemonicType, PalaceScene, SenseKind,
    SenseRecord, SensoryAssociation, StructuredAid, truncate_label,
};
use serde_json::Value;
use tracing::{debug, warn};

/// Bound on logged reply previews, in characters.
const PREVIEW_CHARS: usize = 120;

/// Parse a raw provider reply into a schema-valid aid.
///
/// `original_input` labels the fallback document when the reply is
/// irrecoverable.
pub fn parse(raw: &str, original_input: &str, language: Language) -> StructuredAid {
    let cleaned = strip_code_fences(raw);

    let value = match serde_json::from_str::<Value>(&cleaned) {
        Ok(value) => Some(value),
        Err(_) => repair_once(&cleaned)
            .and_then(|repaired| serde_json::from_str::<Value>(&repaired).ok()),
    };

    match value.as_ref().and_then(Value::as_object) {
        Some(fields) => {
            debug!("Parsed provider reply, normalizing fields");
            StructuredAid {
                mind_map: normalize_mind_map(fields.get("mindMap")),
                mnemonics: normalize_mnemonics(fields.get("mnemonics"), language),
                sensory_associations: normalize_sensory(fields.get("sensoryAssociations"), language),
            }
        }
        None => {
            warn!(
                preview = %truncate_label(raw, PREVIEW_CHARS),
                "Provider reply is not recoverable JSON, using fallback aid"
            );
            StructuredAid::fallback(original_input, language)
        }
    }
}

/// Remove ```json / ``` markers and surrounding whitespace.
fn strip_code_fences(raw: &str) -> String {
    raw.replace("```json", "").replace("```", "").trim().to_string()
}

/// One bounded repair pass: discard everything outside the outermost
/// object span, then escape bare newlines inside string spans.
fn repair_once(cleaned: &str) -> Option<String> {
    let start = cleaned.find('{')?;
    let end = cleaned.rfind('}')?;
    if end <= start {
        return None;
    }
    Some(escape_newlines_in_strings(&cleaned[start..=end]))
}

fn escape_newlines_in_strings(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut in_string = false;
    let mut escaped = false;
    for c in s.chars() {
        if escaped {
            out.push(c);
            escaped = false;
            continue;
        }
        match c {
            '\\' if in_string => {
                out.push(c);
                escaped = true;
            }
            '"' => {
                in_string = !in_string;
                out.push(c);
            }
            '\n' if in_string => out.push_str("\\n"),
            '\r' if in_string => out.push_str("\\r"),
            _ => out.push(c),
        }
    }
    out
}

// ── Field normalization ───────────────────────────────────────────────────

/// An empty-or-keyless mind map object means "absent", not "empty tree".
fn normalize_mind_map(value: Option<&Value>) -> Option<MindMapNode> {
    let map = value?.as_object()?;
    if map.is_empty() {
        return None;
    }
    Some(build_mind_map_node(map))
}

fn build_mind_map_node(map: &serde_json::Map<String, Value>) -> MindMapNode {
    let id = string_field(map, &["id"]).unwrap_or_else(|| "root".into());
    let label = string_field(map, &["label"]).unwrap_or_else(|| id.clone());
    let children = map
        .get("children")
        .and_then(Value::as_array)
        .map(|nodes| {
            nodes
                .iter()
                .filter_map(Value::as_object)
                .map(build_mind_map_node)
                .collect()
        })
        .unwrap_or_default();
    MindMapNode { id, label, children }
}

fn normalize_mnemonics(value: Option<&Value>, language: Language) -> Vec<Mnemonic> {
    let Some(entries) = value.and_then(Value::as_array) else {
        return Vec::new();
    };
    entries
        .iter()
        .enumerate()
        .filter_map(|(index, entry)| {
            let map = entry.as_object()?;
            Some(build_mnemonic(index, map, language))
        })
        .collect()
}

fn build_mnemonic(
    index: usize,
    map: &serde_json::Map<String, Value>,
    language: Language,
) -> Mnemonic {
    // `type` wins when valid; a recognizable `id` comes next; then the
    // positional defaults the prompt template implies; then `unknown`.
    let kind = string_field(map, &["type"])
        .and_then(|t| MnemonicType::parse(&t))
        .or_else(|| string_field(map, &["id"]).and_then(|id| MnemonicType::parse(&id)))
        .or_else(|| MnemonicType::POSITIONAL_DEFAULTS.get(index).copied())
        .unwrap_or(MnemonicType::Unknown);

    let id = string_field(map, &["id"]).unwrap_or_else(|| kind.as_str().into());
    let title = string_field(map, &["title"]).unwrap_or_else(|| default_title(kind, language));
    let content = flatten_content(map.get("content"), language);

    Mnemonic {
        id,
        title,
        content,
        kind,
        explanation: string_field(map, &["explanation"]),
        core_point: string_field(map, &["corePoint"]),
        key_principles: map
            .get("keyPrinciples")
            .and_then(Value::as_array)
            .map(|items| {
                items
                    .iter()
                    .filter_map(Value::as_object)
                    .filter_map(|p| {
                        let concept = string_field(p, &["concept"]).unwrap_or_default();
                        let example = string_field(p, &["example"]).unwrap_or_default();
                        (!concept.is_empty() || !example.is_empty())
                            .then_some(KeyPrinciple { concept, example })
                    })
                    .collect()
            })
            .unwrap_or_default(),
        theme: string_field(map, &["theme"]),
        scenes: map
            .get("scenes")
            .and_then(Value::as_array)
            .map(|items| {
                items
                    .iter()
                    .filter_map(Value::as_object)
                    .map(|s| PalaceScene {
                        principle: string_field(s, &["principle"]).unwrap_or_default(),
                        scene: string_field(s, &["scene"]).unwrap_or_default(),
                        anchor: string_field(s, &["anchor"]).unwrap_or_default(),
                    })
                    .collect()
            })
            .unwrap_or_default(),
    }
}

fn default_title(kind: MnemonicType, language: Language) -> String {
    match language {
        Language::Chinese => match kind {
            MnemonicType::Rhyme => "顺口溜记忆法",
            MnemonicType::Acronym => "首字母记忆法",
            MnemonicType::Story => "故事联想法",
            MnemonicType::Summary => "核心内容总结",
            MnemonicType::Palace => "记忆宫殿编码",
            MnemonicType::Association => "联想记忆法",
            MnemonicType::Mnemonic | MnemonicType::Unknown => "记忆口诀",
        },
        Language::English => match kind {
            MnemonicType::Rhyme => "Rhyme Memory Method",
            MnemonicType::Acronym => "Acronym Method",
            MnemonicType::Story => "Story Association",
            MnemonicType::Summary => "Core Content Summary",
            MnemonicType::Palace => "Memory Palace Encoding",
            MnemonicType::Association => "Association Method",
            MnemonicType::Mnemonic | MnemonicType::Unknown => "Mnemonic",
        },
    }
    .to_string()
}

fn content_placeholder(language: Language) -> String {
    match language {
        Language::Chinese => "记忆内容",
        Language::English => "Memory content",
    }
    .to_string()
}

/// Mnemonic `content` must be a scalar string. Lists and objects are
/// flattened by joining their extractable scalar values; anything empty
/// collapses to a generic placeholder.
fn flatten_content(value: Option<&Value>, language: Language) -> String {
    let parts = match value {
        Some(Value::String(s)) if !s.trim().is_empty() => return s.clone(),
        Some(Value::Array(items)) => items.iter().flat_map(scalar_values).collect::<Vec<_>>(),
        Some(object @ Value::Object(_)) => scalar_values(object),
        Some(Value::Number(n)) => vec![n.to_string()],
        Some(Value::Bool(b)) => vec![b.to_string()],
        _ => Vec::new(),
    };
    if parts.is_empty() {
        content_placeholder(language)
    } else {
        parts.join(" ")
    }
}

fn scalar_values(value: &Value) -> Vec<String> {
    match value {
        Value::String(s) if !s.trim().is_empty() => vec![s.clone()],
        Value::Number(n) => vec![n.to_string()],
        Value::Bool(b) => vec![b.to_string()],
        Value::Object(map) => map.values().flat_map(scalar_values).collect(),
        Value::Array(items) => items.iter().flat_map(scalar_values).collect(),
        _ => Vec::new(),
    }
}

fn normalize_sensory(value: Option<&Value>, language: Language) -> Vec<SensoryAssociation> {
    let Some(entries) = value.and_then(Value::as_array) else {
        return Vec::new();
    };
    entries
        .iter()
        .filter_map(Value::as_object)
        .map(|map| {
            let kind = string_field(map, &["type"])
                .and_then(|t| SenseKind::parse(&t))
                .or_else(|| {
                    string_field(map, &["id"]).and_then(|id| {
                        [SenseKind::Visual, SenseKind::Auditory, SenseKind::Tactile]
                            .into_iter()
                            .find(|k| id.starts_with(k.as_str()))
                    })
                })
                .unwrap_or(SenseKind::Visual);

            SensoryAssociation {
                id: string_field(map, &["id"]).unwrap_or_else(|| kind.as_str().into()),
                title: string_field(map, &["title"])
                    .unwrap_or_else(|| default_sense_title(kind, language)),
                kind,
                content: map
                    .get("content")
                    .and_then(Value::as_array)
                    .map(|records| {
                        records
                            .iter()
                            .filter_map(Value::as_object)
                            .map(|record| normalize_record(kind, record, language))
                            .collect()
                    })
                    .unwrap_or_default(),
            }
        })
        .collect()
}

fn default_sense_title(kind: SenseKind, language: Language) -> String {
    match language {
        Language::Chinese => match kind {
            SenseKind::Visual => "视觉联想",
            SenseKind::Auditory => "听觉联想",
            SenseKind::Tactile => "触觉联想",
        },
        Language::English => match kind {
            SenseKind::Visual => "Visual Association",
            SenseKind::Auditory => "Auditory Association",
            SenseKind::Tactile => "Tactile Association",
        },
    }
    .to_string()
}

/// Map one content record into the canonical per-sense shape. Legacy key
/// layouts (`{dynasty, image, ...}` and `{sense, desc}`) are folded in
/// here: the label and description lookups accept the old names.
fn normalize_record(
    kind: SenseKind,
    record: &serde_json::Map<String, Value>,
    language: Language,
) -> SenseRecord {
    let label = string_field(record, &["label", "dynasty", "sense", "name"])
        .unwrap_or_else(|| match language {
            Language::Chinese => "内容".into(),
            Language::English => "Content".into(),
        });

    match kind {
        SenseKind::Visual => SenseRecord::Visual {
            label,
            icon: string_field(record, &["icon", "image", "emoji"])
                .unwrap_or_else(|| "🧠".into()),
            color: string_field(record, &["color"]).unwrap_or_else(|| "#3b82f6".into()),
            association_text: string_field(record, &["associationText", "association", "desc"])
                .unwrap_or_default(),
        },
        SenseKind::Auditory => SenseRecord::Auditory {
            label,
            sound_description: string_field(record, &["soundDescription", "sound", "desc"])
                .unwrap_or_default(),
            rhythm_description: string_field(record, &["rhythmDescription", "rhythm"])
                .unwrap_or_default(),
        },
        SenseKind::Tactile => SenseRecord::Tactile {
            label,
            texture_description: string_field(record, &["textureDescription", "texture", "desc"])
                .unwrap_or_default(),
            feeling_description: string_field(record, &["feelingDescription", "feeling"])
                .unwrap_or_default(),
        },
    }
}

/// First non-empty string value among `keys`.
fn string_field(map: &serde_json::Map<String, Value>, keys: &[&str]) -> Option<String> {
    keys.iter()
        .filter_map(|key| map.get(*key))
        .filter_map(Value::as_str)
        .map(str::trim)
        .find(|s| !s.is_empty())
        .map(str::to_string)
}
