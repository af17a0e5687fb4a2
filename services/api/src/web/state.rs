//! services/api/src/web/state.rs
//!
//! Defines the application's shared state.

use crate::config::Config;
use event_journal_core::ports::{
    ClosureSummaryService, EventStore, PeriodSummaryService, RecordSummaryService,
};
use std::sync::Arc;

/// The shared application state, created once at startup and passed to all handlers.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn EventStore>,
    pub config: Arc<Config>,
    pub record_llm: Arc<dyn RecordSummaryService>,
    pub closure_llm: Arc<dyn ClosureSummaryService>,
    pub period_llm: Arc<dyn PeriodSummaryService>,
}
