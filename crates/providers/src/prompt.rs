//! Prompt templates for structured-aid generation.
//!
//! One template per supported output language. Each template carries the
//! full JSON output skeleton so every vendor is asked for the exact same
//! shape; the repair pipeline handles whatever comes back anyway.

use memoraid_core::Language;

const ENGLISH_PREAMBLE: &str = "\
You are a memory-training assistant. Based on the following content, \
generate a mind map, mnemonics, and sensory associations.

Generate three types of mnemonics: Rhyme Memory Method, Core Content \
Summary, Memory Palace Encoding.

For Core Content Summary:
1. Extract the core argument of the text in one or two sentences (corePoint)
2. Break the content down into key principles (keyPrinciples)
3. For each principle, clearly separate concept/viewpoint from example/practice
4. Write a complete, coherent summary into the content field

For Memory Palace Encoding:
1. Create an imaginative, unified memory palace theme (theme)
2. Map each key principle onto a specific room, station or scene (scenes)
3. Use strong visual, action and sensory language for each scene
4. End each scene with an explicit memory anchor
5. Write a complete palace walkthrough into the content field";

const CHINESE_PREAMBLE: &str = "\
你是记忆搭子，负责帮助用户记忆。你会根据用户输入的内容，生成思维导图、\
记忆口诀和感官联想。

记忆口诀生成三种类型：顺口溜记忆法、核心内容总结、记忆宫殿编码。

对于核心内容总结：
1. 用一两句话提炼文本的核心论点，填入 corePoint 字段
2. 将内容分解为几个关键原则，填入 keyPrinciples 数组
3. 每一点都区分观点/概念与例子/做法两个层面
4. 在 content 字段中生成一段完整连贯的总结性描述

对于记忆宫殿编码：
1. 为所有要点创建一个统一的记忆宫殿主题，填入 theme 字段
2. 将每个关键原则映射到主题中的一个具体场景，填入 scenes 数组
3. 用强烈的视觉、动作和感官语言注入生动细节
4. 每个场景以明确的记忆锚点收尾
5. 在 content 字段中生成一段完整的宫殿整体描述";

const ENGLISH_SKELETON: &str = r##"Output strictly in the following JSON format without any additional content:

{
  "mindMap": {
    "id": "root",
    "label": "Memory topic",
    "children": [
      {
        "id": "part1",
        "label": "Main content 1",
        "children": [
          { "id": "leaf1", "label": "Detail 1" },
          { "id": "leaf2", "label": "Detail 2" }
        ]
      }
    ]
  },
  "mnemonics": [
    {
      "id": "rhyme",
      "title": "Rhyme Memory Method",
      "content": "Catchy rhyme for memory",
      "type": "rhyme"
    },
    {
      "id": "summary",
      "title": "Core Content Summary",
      "content": "Complete summary based on the core argument and key principles",
      "type": "summary",
      "corePoint": "Core argument",
      "keyPrinciples": [
        { "concept": "Concept/Viewpoint", "example": "Example/Practice" }
      ]
    },
    {
      "id": "palace",
      "title": "Memory Palace Encoding",
      "content": "Complete palace walkthrough based on theme and scenes",
      "type": "palace",
      "theme": "Memory palace theme",
      "scenes": [
        { "principle": "Principle", "scene": "Vivid scene", "anchor": "Memory anchor" }
      ]
    }
  ],
  "sensoryAssociations": [
    {
      "id": "visual",
      "title": "Visual Association",
      "type": "visual",
      "content": [
        { "label": "Element 1", "icon": "🌟", "color": "#fbbf24", "associationText": "Visual association" }
      ]
    },
    {
      "id": "auditory",
      "title": "Auditory Association",
      "type": "auditory",
      "content": [
        { "label": "Element 1", "soundDescription": "Sound", "rhythmDescription": "Rhythm" }
      ]
    },
    {
      "id": "tactile",
      "title": "Tactile Association",
      "type": "tactile",
      "content": [
        { "label": "Element 1", "textureDescription": "Texture", "feelingDescription": "Feeling" }
      ]
    }
  ]
}

All example texts above must be replaced with content generated from the user input; never echo the placeholders themselves."##;

const CHINESE_SKELETON: &str = r##"注意严格按照如下JSON格式输出，不需要任何多余的内容：

{
  "mindMap": {
    "id": "root",
    "label": "记忆主题",
    "children": [
      {
        "id": "part1",
        "label": "主要内容1",
        "children": [
          { "id": "leaf1", "label": "细节1" },
          { "id": "leaf2", "label": "细节2" }
        ]
      }
    ]
  },
  "mnemonics": [
    {
      "id": "rhyme",
      "title": "顺口溜记忆法",
      "content": "朗朗上口的顺口溜",
      "type": "rhyme"
    },
    {
      "id": "summary",
      "title": "核心内容总结",
      "content": "基于核心论点和关键原则的完整总结描述",
      "type": "summary",
      "corePoint": "核心论点内容",
      "keyPrinciples": [
        { "concept": "观点或概念", "example": "具体例子或做法" }
      ]
    },
    {
      "id": "palace",
      "title": "记忆宫殿编码",
      "content": "基于记忆宫殿主题和场景的整体描述",
      "type": "palace",
      "theme": "记忆宫殿主题",
      "scenes": [
        { "principle": "对应的原则", "scene": "生动的场景描述", "anchor": "记忆锚点" }
      ]
    }
  ],
  "sensoryAssociations": [
    {
      "id": "visual",
      "title": "视觉联想",
      "type": "visual",
      "content": [
        { "label": "视觉要素", "icon": "🌟", "color": "#fbbf24", "associationText": "具体的视觉联想描述" }
      ]
    },
    {
      "id": "auditory",
      "title": "听觉联想",
      "type": "auditory",
      "content": [
        { "label": "听觉要素", "soundDescription": "声音描述", "rhythmDescription": "节奏感" }
      ]
    },
    {
      "id": "tactile",
      "title": "触觉联想",
      "type": "tactile",
      "content": [
        { "label": "触觉要素", "textureDescription": "质感", "feelingDescription": "触感" }
      ]
    }
  ]
}

以上JSON中的所有示例文本都必须替换为根据用户输入实际生成的内容，绝对不能保留示例文本本身。"##;

/// Build the structured-aid prompt for `content` in the active language.
pub fn aid_prompt(content: &str, language: Language) -> String {
    match language {
        Language::English => format!(
            "{ENGLISH_PREAMBLE}\n\nUser input: {content}\n\n{ENGLISH_SKELETON}"
        ),
        Language::Chinese => format!(
            "{CHINESE_PREAMBLE}\n\n用户输入的内容：{content}\n\n{CHINESE_SKELETON}"
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prompt_embeds_the_user_content() {
        let prompt = aid_prompt("photosynthesis", Language::English);
        assert!(prompt.contains("User input: photosynthesis"));
        assert!(prompt.contains("\"mindMap\""));
        assert!(prompt.contains("\"sensoryAssociations\""));
    }

    #[test]
    fn chinese_prompt_uses_chinese_template() {
        let prompt = aid_prompt("光合作用", Language::Chinese);
        assert!(prompt.contains("用户输入的内容：光合作用"));
        assert!(prompt.contains("顺口溜记忆法"));
    }
}
