//! services/api/src/adapters/closure_llm.rs
//!
//! This module contains the adapter for the event-closure summarization LLM.
//! It implements the `ClosureSummaryService` port from the `core` crate.

use async_openai::{
    config::OpenAIConfig,
    error::OpenAIError,
    types::chat::{
        ChatCompletionRequestSystemMessageArgs, ChatCompletionRequestUserMessageArgs,
        CreateChatCompletionRequestArgs,
    },
    Client,
};
use async_trait::async_trait;
use event_journal_core::domain::EventRecord;
use event_journal_core::ports::{ClosureSummaryService, PortError, PortResult};

const SYSTEM_PROMPT: &str = "你是一个事件总结助手。用户会提供一个事件的标题和按时间排列的全部进展记录，\
请生成一段闭环总结：概述事件的起因与目标、关键进展节点、最终结果，以及值得记住的经验。\
语言简洁、结构清晰，控制在三到五段以内。只输出总结内容本身。";

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// An adapter that implements `ClosureSummaryService` using an OpenAI-compatible LLM.
#[derive(Clone)]
pub struct OpenAiClosureAdapter {
    client: Client<OpenAIConfig>,
    model: String,
}

impl OpenAiClosureAdapter {
    /// Creates a new `OpenAiClosureAdapter`.
    pub fn new(client: Client<OpenAIConfig>, model: String) -> Self {
        Self { client, model }
    }

    /// Renders the title and ordered record list as the user message.
    fn build_input(title: &str, records: &[EventRecord]) -> String {
        let mut input = format!("事件标题：{}\n\n进展记录：\n", title);
        if records.is_empty() {
            input.push_str("（该事件没有任何进展记录）\n");
        } else {
            for (index, record) in records.iter().enumerate() {
                input.push_str(&format!(
                    "{}. [{}] {}\n",
                    index + 1,
                    record.created_at.format("%Y/%m/%d %H:%M"),
                    record.display_text()
                ));
            }
        }
        input
    }
}

//=========================================================================================
// `ClosureSummaryService` Trait Implementation
//=========================================================================================

#[async_trait]
impl ClosureSummaryService for OpenAiClosureAdapter {
    /// Generates the closing retrospective for an event.
    async fn summarize_event(&self, title: &str, records: &[EventRecord]) -> PortResult<String> {
        let messages = vec![
            ChatCompletionRequestSystemMessageArgs::default()
                .content(SYSTEM_PROMPT)
                .build()
                .map_err(|e| PortError::Unexpected(e.to_string()))?
                .into(),
            ChatCompletionRequestUserMessageArgs::default()
                .content(Self::build_input(title, records))
                .build()
                .map_err(|e| PortError::Unexpected(e.to_string()))?
                .into(),
        ];

        let request = CreateChatCompletionRequestArgs::default()
            .model(&self.model)
            .messages(messages)
            .n(1)
            .build()
            .map_err(|e| PortError::Unexpected(e.to_string()))?;

        let response = self
            .client
            .chat()
            .create(request)
            .await
            .map_err(|e: OpenAIError| PortError::Unexpected(e.to_string()))?;

        if let Some(choice) = response.choices.into_iter().next() {
            if let Some(content) = choice.message.content {
                Ok(content.trim().to_string())
            } else {
                Err(PortError::Unexpected(
                    "Closure summarization LLM response contained no text content.".to_string(),
                ))
            }
        } else {
            Err(PortError::Unexpected(
                "Closure summarization LLM returned no choices in its response.".to_string(),
            ))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use uuid::Uuid;

    #[test]
    fn input_lists_records_in_order_with_timestamps() {
        let event_id = Uuid::new_v4();
        let records: Vec<EventRecord> = ["联系了供应商", "拿到了报价"]
            .iter()
            .enumerate()
            .map(|(i, text)| EventRecord {
                id: Uuid::new_v4(),
                event_id,
                original_content: text.to_string(),
                ai_summary: String::new(),
                created_at: Utc.with_ymd_and_hms(2024, 6, 10 + i as u32, 9, 0, 0).unwrap(),
            })
            .collect();

        let input = OpenAiClosureAdapter::build_input("采购新设备", &records);
        assert!(input.starts_with("事件标题：采购新设备\n"));
        assert!(input.contains("1. [2024/06/10 09:00] 联系了供应商"));
        assert!(input.contains("2. [2024/06/11 09:00] 拿到了报价"));
    }

    #[test]
    fn input_marks_empty_record_lists() {
        let input = OpenAiClosureAdapter::build_input("空事件", &[]);
        assert!(input.contains("没有任何进展记录"));
    }
}
