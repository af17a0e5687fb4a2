//! crates/event_journal_core/src/export.rs
//!
//! Deterministic, order-preserving text renderers for the downloadable
//! exports: the plain-text single-event export, the Markdown period export,
//! and the wrapper around an AI-generated period report. Pure string
//! building, no I/O.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};

use crate::domain::EventWithRecords;
use crate::period::PeriodKind;

fn format_timestamp(ts: DateTime<Utc>) -> String {
    ts.format("%Y/%m/%d %H:%M:%S").to_string()
}

fn importance_stars(importance: i32) -> String {
    "⭐".repeat(importance.clamp(1, 5) as usize)
}

/// Whole days spanned between creation and last update, rounded up.
fn span_days(event: &EventWithRecords) -> i64 {
    let secs = (event.event.updated_at - event.event.created_at)
        .num_seconds()
        .max(0);
    (secs + 86_399) / 86_400
}

/// Renders a single event with its records as a plain-text document for the
/// `.txt` download.
pub fn event_export_text(event: &EventWithRecords) -> String {
    let mut out = String::new();
    out.push_str(&format!("事件：{}\n", event.event.title));
    out.push_str(&format!("状态：{}\n", event.event.status.label()));
    out.push_str(&format!("分类：{}\n", event.event.category));
    out.push_str(&format!(
        "重要程度：{}\n",
        importance_stars(event.event.importance)
    ));
    out.push_str(&format!(
        "创建时间：{}\n",
        format_timestamp(event.event.created_at)
    ));
    out.push_str(&format!(
        "更新时间：{}\n",
        format_timestamp(event.event.updated_at)
    ));

    if let Some(description) = &event.event.description {
        out.push_str(&format!("\n事件描述：\n{}\n", description));
    }

    if event.records.is_empty() {
        out.push_str("\n进展记录：暂无\n");
    } else {
        out.push_str(&format!("\n进展记录（共{}条）：\n", event.records.len()));
        for (index, record) in event.records.iter().enumerate() {
            out.push_str(&format!(
                "{}. [{}]\n   {}\n",
                index + 1,
                format_timestamp(record.created_at),
                record.display_text()
            ));
        }
    }

    if let Some(summary) = &event.event.summary {
        out.push_str(&format!("\n事件总结：\n{}\n", summary));
    }

    out
}

/// Renders the local (non-AI) Markdown export of all events in a period:
/// events grouped by category (categories sorted), per-event metadata and
/// ordered progress entries, and a trailing aggregate statistics block.
pub fn period_export_markdown(
    kind: PeriodKind,
    date_range: &str,
    events: &[EventWithRecords],
) -> String {
    let mut out = String::new();
    out.push_str(&format!("# {}事件记录导出\n\n", kind.label()));
    out.push_str(&format!("**时间范围**：{}\n", date_range));
    out.push_str(&format!("**事件总数**：{}\n\n", events.len()));
    out.push_str("---\n\n");

    // BTreeMap gives the sorted category order for free.
    let mut by_category: BTreeMap<&str, Vec<&EventWithRecords>> = BTreeMap::new();
    for event in events {
        by_category
            .entry(event.event.category.as_str())
            .or_default()
            .push(event);
    }

    for (category, grouped) in &by_category {
        out.push_str(&format!("## 📂 {}\n\n", category));

        for (index, event) in grouped.iter().enumerate() {
            out.push_str(&format!("### {}. {}\n\n", index + 1, event.event.title));
            out.push_str(&format!("- **状态**：{}\n", event.event.status.label()));
            out.push_str(&format!(
                "- **重要程度**：{}\n",
                importance_stars(event.event.importance)
            ));
            out.push_str(&format!(
                "- **创建时间**：{}\n",
                format_timestamp(event.event.created_at)
            ));
            out.push_str(&format!(
                "- **更新时间**：{}\n",
                format_timestamp(event.event.updated_at)
            ));
            out.push_str(&format!("- **时间跨度**：{}天\n\n", span_days(event)));

            if let Some(description) = &event.event.description {
                out.push_str(&format!("**事件描述**：\n{}\n\n", description));
            }

            if event.records.is_empty() {
                out.push_str("**进展记录**：暂无\n\n");
            } else {
                out.push_str(&format!("**进展记录**（共{}条）：\n\n", event.records.len()));
                for (record_index, record) in event.records.iter().enumerate() {
                    out.push_str(&format!(
                        "{}. [{}]\n   {}\n\n",
                        record_index + 1,
                        format_timestamp(record.created_at),
                        record.display_text()
                    ));
                }
            }

            if let Some(summary) = &event.event.summary {
                out.push_str(&format!("**事件总结**：\n{}\n\n", summary));
            }

            out.push_str("---\n\n");
        }
    }

    let ongoing = events
        .iter()
        .filter(|e| e.event.status == crate::domain::EventStatus::Ongoing)
        .count();
    let closed = events.len() - ongoing;
    let total_records: usize = events.iter().map(|e| e.records.len()).sum();

    out.push_str("## 📊 统计信息\n\n");
    out.push_str(&format!("- 总事件数：{}\n", events.len()));
    out.push_str(&format!("- 进行中：{}\n", ongoing));
    out.push_str(&format!("- 已闭环：{}\n", closed));
    out.push_str(&format!("- 分类数：{}\n", by_category.len()));
    out.push_str(&format!("- 总进展记录数：{}\n", total_records));

    out
}

/// Wraps an AI-generated period summary with a download header.
pub fn summary_report_markdown(
    kind: PeriodKind,
    date_range: &str,
    event_count: usize,
    body: &str,
) -> String {
    format!(
        "# {}总结报告\n\n时间范围：{}\n事件数量：{}\n\n---\n\n{}",
        kind.label(),
        date_range,
        event_count,
        body
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Event, EventRecord, EventStatus, EventWithRecords};
    use chrono::TimeZone;
    use uuid::Uuid;

    fn ts(day: u32, hour: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, day, hour, 0, 0).unwrap()
    }

    fn event(
        title: &str,
        category: &str,
        status: EventStatus,
        record_texts: &[&str],
    ) -> EventWithRecords {
        let id = Uuid::new_v4();
        let records = record_texts
            .iter()
            .enumerate()
            .map(|(i, text)| EventRecord {
                id: Uuid::new_v4(),
                event_id: id,
                original_content: format!("raw {}", text),
                ai_summary: text.to_string(),
                created_at: ts(11, i as u32 + 1),
            })
            .collect();
        EventWithRecords::new(
            Event {
                id,
                user_id: Uuid::new_v4(),
                title: title.to_string(),
                description: None,
                category: category.to_string(),
                status,
                importance: 3,
                summary: match status {
                    EventStatus::Closed => Some("done".to_string()),
                    EventStatus::Ongoing => None,
                },
                created_at: ts(10, 9),
                updated_at: ts(12, 9),
            },
            records,
        )
    }

    fn category_headings(markdown: &str) -> Vec<&str> {
        markdown
            .lines()
            .filter(|l| l.starts_with("## 📂 "))
            .collect()
    }

    #[test]
    fn one_heading_per_category_sorted() {
        let events = vec![
            event("b", "工作", EventStatus::Ongoing, &["x"]),
            event("a", "健康", EventStatus::Closed, &[]),
            event("c", "工作", EventStatus::Ongoing, &["y", "z"]),
        ];
        let md = period_export_markdown(PeriodKind::Week, "2024/06/10 - 2024/06/12", &events);

        let headings = category_headings(&md);
        assert_eq!(headings, vec!["## 📂 健康", "## 📂 工作"]);
    }

    #[test]
    fn statistics_block_counts_match_input() {
        let events = vec![
            event("b", "工作", EventStatus::Ongoing, &["x"]),
            event("a", "健康", EventStatus::Closed, &[]),
            event("c", "工作", EventStatus::Ongoing, &["y", "z"]),
        ];
        let md = period_export_markdown(PeriodKind::Month, "2024/06/01 - 2024/06/12", &events);

        assert!(md.contains("- 总事件数：3\n"));
        assert!(md.contains("- 进行中：2\n"));
        assert!(md.contains("- 已闭环：1\n"));
        assert!(md.contains("- 分类数：2\n"));
        assert!(md.contains("- 总进展记录数：3\n"));
    }

    #[test]
    fn events_without_records_show_the_empty_marker() {
        let events = vec![event("a", "健康", EventStatus::Ongoing, &[])];
        let md = period_export_markdown(PeriodKind::Day, "2024/06/12 - 2024/06/12", &events);
        assert!(md.contains("**进展记录**：暂无"));
    }

    #[test]
    fn closed_event_summary_is_included() {
        let events = vec![event("a", "健康", EventStatus::Closed, &["x"])];
        let md = period_export_markdown(PeriodKind::Day, "2024/06/12 - 2024/06/12", &events);
        assert!(md.contains("**事件总结**：\ndone"));
    }

    #[test]
    fn text_export_lists_records_in_order() {
        let e = event("进度", "工作", EventStatus::Ongoing, &["first", "second"]);
        let txt = event_export_text(&e);
        let first = txt.find("first").unwrap();
        let second = txt.find("second").unwrap();
        assert!(first < second);
        assert!(txt.starts_with("事件：进度\n"));
        assert!(txt.contains("进展记录（共2条）"));
    }

    #[test]
    fn report_wrapper_carries_header_fields() {
        let md = summary_report_markdown(PeriodKind::Week, "2024/06/10 - 2024/06/12", 4, "body");
        assert!(md.starts_with("# 周总结报告\n"));
        assert!(md.contains("事件数量：4"));
        assert!(md.ends_with("---\n\nbody"));
    }
}
