//! services/api/src/adapters/period_llm.rs
//!
//! This module contains the adapter for the period-summary LLM. It implements
//! the `PeriodSummaryService` port from the `core` crate, turning the
//! flattened event list for a date window into a structured Markdown report.

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
use event_journal_core::domain::PeriodEvent;
use event_journal_core::period::PeriodKind;
use event_journal_core::ports::{PeriodSummaryService, PortError, PortResult};

const SYSTEM_PROMPT: &str = "你是一个个人事件分析助手。用户会提供某个时间段内的全部事件及其进展记录，\
请生成一份结构化的 Markdown 总结报告，包含：整体概览、按分类的事件梳理（重点关注重要程度高的事件）、\
已闭环事件的成果、进行中事件的当前状态与下一步建议。语言务实，不要空洞的套话。";

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// An adapter that implements `PeriodSummaryService` using an OpenAI-compatible LLM.
#[derive(Clone)]
pub struct OpenAiPeriodAdapter {
    client: Client<OpenAIConfig>,
    model: String,
}

impl OpenAiPeriodAdapter {
    /// Creates a new `OpenAiPeriodAdapter`.
    pub fn new(client: Client<OpenAIConfig>, model: String) -> Self {
        Self { client, model }
    }

    fn build_input(
        kind: PeriodKind,
        start_label: &str,
        end_label: &str,
        events: &[PeriodEvent],
    ) -> String {
        let mut input = format!(
            "请生成{}总结。时间范围：{} 至 {}，共 {} 个事件。\n\n",
            kind.label(),
            start_label,
            end_label,
            events.len()
        );

        for (index, event) in events.iter().enumerate() {
            input.push_str(&format!(
                "事件 {}：{}\n分类：{}｜状态：{}｜重要程度：{}/5\n",
                index + 1,
                event.title,
                event.category,
                event.status.label(),
                event.importance
            ));
            if let Some(description) = &event.description {
                input.push_str(&format!("描述：{}\n", description));
            }
            if event.records.is_empty() {
                input.push_str("进展：暂无记录\n");
            } else {
                input.push_str("进展：\n");
                for record in &event.records {
                    input.push_str(&format!(
                        "- [{}] {}\n",
                        record.created_at.format("%Y/%m/%d"),
                        record.text
                    ));
                }
            }
            input.push('\n');
        }

        input
    }
}

//=========================================================================================
// `PeriodSummaryService` Trait Implementation
//=========================================================================================

#[async_trait]
impl PeriodSummaryService for OpenAiPeriodAdapter {
    async fn summarize_period(
        &self,
        kind: PeriodKind,
        start_label: &str,
        end_label: &str,
        events: &[PeriodEvent],
    ) -> PortResult<String> {
        let messages = vec![
            ChatCompletionRequestSystemMessageArgs::default()
                .content(SYSTEM_PROMPT)
                .build()
                .map_err(|e| PortError::Unexpected(e.to_string()))?
                .into(),
            ChatCompletionRequestUserMessageArgs::default()
                .content(Self::build_input(kind, start_label, end_label, events))
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
                    "Period summarization LLM response contained no text content.".to_string(),
                ))
            }
        } else {
            Err(PortError::Unexpected(
                "Period summarization LLM returned no choices in its response.".to_string(),
            ))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use event_journal_core::domain::{EventStatus, PeriodRecord};

    #[test]
    fn input_carries_range_and_event_metadata() {
        let events = vec![PeriodEvent {
            title: "搬家".to_string(),
            description: Some("换到离公司近的地方".to_string()),
            category: "生活".to_string(),
            status: EventStatus::Ongoing,
            importance: 4,
            created_at: Utc.with_ymd_and_hms(2024, 6, 10, 9, 0, 0).unwrap(),
            updated_at: Utc.with_ymd_and_hms(2024, 6, 11, 9, 0, 0).unwrap(),
            records: vec![PeriodRecord {
                text: "看了三套房".to_string(),
                created_at: Utc.with_ymd_and_hms(2024, 6, 11, 9, 0, 0).unwrap(),
            }],
        }];

        let input =
            OpenAiPeriodAdapter::build_input(PeriodKind::Week, "2024/06/10", "2024/06/12", &events);
        assert!(input.contains("请生成周总结"));
        assert!(input.contains("2024/06/10 至 2024/06/12，共 1 个事件"));
        assert!(input.contains("事件 1：搬家"));
        assert!(input.contains("重要程度：4/5"));
        assert!(input.contains("- [2024/06/11] 看了三套房"));
    }
}
