pub mod closure_llm;
pub mod db;
pub mod period_llm;
pub mod record_llm;

pub use closure_llm::OpenAiClosureAdapter;
pub use db::PgStore;
pub use period_llm::OpenAiPeriodAdapter;
pub use record_llm::OpenAiRecordAdapter;
