//! services/api/src/adapters/record_llm.rs
//!
//! This module contains the adapter for the progress-record summarization LLM.
//! It implements the `RecordSummaryService` port from the `core` crate.

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
use event_journal_core::ports::{PortError, PortResult, RecordSummaryService};

const SYSTEM_PROMPT: &str = "你是一个事件记录整理助手。用户会输入一段关于某个事件的最新进展，\
请将它整理为一条简洁、清晰的进展记录：保留所有关键事实（时间、人物、结果、数字），\
去掉口语化的冗余表达，用陈述句输出。只输出整理后的内容本身，不要任何解释或前缀。";

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// An adapter that implements `RecordSummaryService` using an OpenAI-compatible LLM.
#[derive(Clone)]
pub struct OpenAiRecordAdapter {
    client: Client<OpenAIConfig>,
    model: String,
}

impl OpenAiRecordAdapter {
    /// Creates a new `OpenAiRecordAdapter`.
    pub fn new(client: Client<OpenAIConfig>, model: String) -> Self {
        Self { client, model }
    }
}

//=========================================================================================
// `RecordSummaryService` Trait Implementation
//=========================================================================================

#[async_trait]
impl RecordSummaryService for OpenAiRecordAdapter {
    /// Normalizes one free-text progress entry into a concise record.
    async fn summarize_record(&self, raw_text: &str) -> PortResult<String> {
        let messages = vec![
            ChatCompletionRequestSystemMessageArgs::default()
                .content(SYSTEM_PROMPT)
                .build()
                .map_err(|e| PortError::Unexpected(e.to_string()))?
                .into(),
            ChatCompletionRequestUserMessageArgs::default()
                .content(raw_text.to_string())
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
                    "Record summarization LLM response contained no text content.".to_string(),
                ))
            }
        } else {
            Err(PortError::Unexpected(
                "Record summarization LLM returned no choices in its response.".to_string(),
            ))
        }
    }
}
