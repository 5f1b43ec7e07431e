//! Deterministic mock provider for offline development and tests.
//!
//! Returns canned, keyword-sensitive structures with a small artificial
//! delay. The reply is raw fenced JSON — exactly what a real vendor sends —
//! so the orchestration and repair logic are exercised identically. The
//! sensory records deliberately use the legacy `dynasty` field layout to
//! keep the normalization path honest.

use async_trait::async_trait;
use memoraid_core::{AidProvider, ProviderError, aid::truncate_label};
use serde_json::json;
use std::time::Duration;
use tracing::debug;

const MOCK_DELAY: Duration = Duration::from_millis(100);

pub struct MockProvider;

impl MockProvider {
    pub fn new() -> Self {
        Self
    }

    fn canned_aid(content: &str) -> serde_json::Value {
        let lower = content.to_lowercase();

        let mut aid = json!({
            "mindMap": {
                "id": "root",
                "label": truncate_label(content, 30),
                "children": [
                    {
                        "id": "main-concept",
                        "label": "核心概念",
                        "children": [
                            { "id": "detail-1", "label": "要点一" },
                            { "id": "detail-2", "label": "要点二" },
                            { "id": "detail-3", "label": "要点三" }
                        ]
                    },
                    {
                        "id": "application",
                        "label": "应用场景",
                        "children": [
                            { "id": "app-1", "label": "实际应用" },
                            { "id": "app-2", "label": "相关案例" }
                        ]
                    }
                ]
            },
            "mnemonics": [
                {
                    "id": "rhyme-1",
                    "title": "顺口溜记忆法",
                    "content": "这是一个简单易记的顺口溜，帮助记忆核心内容",
                    "type": "rhyme",
                    "explanation": "通过押韵的方式，让内容更容易记忆和回忆"
                },
                {
                    "id": "acronym-1",
                    "title": "首字母缩写法",
                    "content": "MOCK - Memory, Organization, Comprehension, Knowledge",
                    "type": "acronym",
                    "explanation": "将关键词的首字母组合成容易记忆的缩写"
                }
            ],
            "sensoryAssociations": [
                {
                    "id": "visual-1",
                    "title": "视觉联想",
                    "type": "visual",
                    "content": [
                        {
                            "dynasty": "现代",
                            "image": "🧠",
                            "color": "#3b82f6",
                            "association": "蓝色的大脑象征着智慧和记忆"
                        }
                    ]
                },
                {
                    "id": "auditory-1",
                    "title": "听觉联想",
                    "type": "auditory",
                    "content": [
                        {
                            "dynasty": "现代",
                            "sound": "轻柔的钢琴声",
                            "rhythm": "4/4拍，缓慢而稳定"
                        }
                    ]
                }
            ]
        });

        if ["历史", "history", "朝代", "dynasty"]
            .iter()
            .any(|k| lower.contains(k))
        {
            aid["sensoryAssociations"][0]["content"][0]["dynasty"] = json!("唐朝");
            aid["sensoryAssociations"][0]["content"][0]["association"] =
                json!("盛唐时期的繁荣景象");
            aid["mnemonics"][0]["content"] = json!("唐宋元明清，历史要记清");
        } else if ["数学", "math", "公式", "formula"]
            .iter()
            .any(|k| lower.contains(k))
        {
            aid["mindMap"]["children"][0]["children"] = json!([
                { "id": "formula", "label": "公式推导" },
                { "id": "example", "label": "例题解析" },
                { "id": "application", "label": "实际应用" }
            ]);
            aid["mnemonics"][0]["content"] = json!("数学公式要记牢，多做练习是王道");
        } else if ["英语", "english", "单词", "word"]
            .iter()
            .any(|k| lower.contains(k))
        {
            if let Some(mnemonics) = aid["mnemonics"].as_array_mut() {
                mnemonics.push(json!({
                    "id": "word-association",
                    "title": "词根记忆法",
                    "content": "通过词根词缀来记忆单词含义",
                    "type": "association",
                    "explanation": "理解词根含义，举一反三记忆更多单词"
                }));
            }
        }

        aid
    }
}

impl Default for MockProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl AidProvider for MockProvider {
    fn name(&self) -> &str {
        "mock"
    }

    async fn generate_structured_aid(&self, content: &str) -> Result<String, ProviderError> {
        debug!(content_chars = content.chars().count(), "Mock aid generation");
        tokio::time::sleep(MOCK_DELAY).await;

        // Fenced like real vendor output so the repair pipeline is exercised.
        let body = serde_json::to_string_pretty(&Self::canned_aid(content))
            .map_err(|e| ProviderError::Network(e.to_string()))?;
        Ok(format!("```json\n{body}\n```"))
    }

    async fn generate_text(&self, prompt: &str) -> Result<Option<String>, ProviderError> {
        tokio::time::sleep(MOCK_DELAY / 2).await;

        let lower = prompt.to_lowercase();
        let text = if lower.contains("总结") || lower.contains("summary") {
            "这是一个模拟的总结内容，包含了主要要点和关键信息。"
        } else if lower.contains("解释") || lower.contains("explain") {
            "这是一个模拟的解释内容，详细说明了相关概念和原理。"
        } else {
            "这是一个模拟的AI生成文本内容，用于开发和测试目的。"
        };
        Ok(Some(text.to_string()))
    }
}
