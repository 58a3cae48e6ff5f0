// src/digest.rs
//! Report rendering. One bracketed header per source in display order, one
//! blank-line-separated bullet per surviving record, date ascending.
//!
//! A section never renders empty: no records means the nothing-found line,
//! a manual source means its notice. Missing media fields degrade to a
//! placeholder plus the page URL so the record stays visible.

use chrono::{Datelike, NaiveDate};
use serde::Serialize;

use crate::date::format_duration;
use crate::ingest::types::ResolvedItem;
use crate::window::Window;

pub const DURATION_PLACEHOLDER: &str = "再生時間情報を自分で取得してください";

/// Per-source display flags.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SectionStyle {
    /// Records carry a video link and duration.
    pub expects_media: bool,
    /// Wrap titles in 「」.
    pub quote_titles: bool,
    /// Prefix the nothing-found line with the window range.
    pub range_on_empty: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum SectionBody {
    Items(Vec<ResolvedItem>),
    /// Source is not automated; the notice is printed verbatim.
    Manual(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Section {
    pub source_id: String,
    pub name: String,
    pub window: Window,
    pub style: SectionStyle,
    pub body: SectionBody,
    /// Set when the source's adapter failed; the section then reads as empty.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failure: Option<String>,
}

#[derive(Debug, Clone)]
pub struct DigestFormatter {
    nothing_found: String,
}

impl DigestFormatter {
    pub fn new(nothing_found: impl Into<String>) -> Self {
        Self {
            nothing_found: nothing_found.into(),
        }
    }

    /// Render all sections, in the order given.
    pub fn format(&self, sections: &[Section]) -> String {
        let mut out = String::new();
        for s in sections {
            self.write_section(&mut out, s);
        }
        out
    }

    pub fn write_section(&self, out: &mut String, section: &Section) {
        out.push('【');
        out.push_str(&section.name);
        out.push_str("】\n");

        match &section.body {
            SectionBody::Manual(notice) => {
                out.push_str(notice);
                out.push_str("\n\n");
            }
            SectionBody::Items(items) if items.is_empty() => {
                if section.style.range_on_empty {
                    out.push_str(&format_month_day(section.window.start()));
                    out.push('〜');
                    out.push_str(&format_month_day(section.window.end()));
                    out.push('　');
                }
                out.push_str(&self.nothing_found);
                out.push_str("\n\n");
            }
            SectionBody::Items(items) => {
                let mut sorted: Vec<&ResolvedItem> = items.iter().collect();
                // stable: same-day records keep pipeline order
                sorted.sort_by_key(|it| it.date);
                for it in sorted {
                    write_item(out, it, section.style);
                }
            }
        }
    }
}

impl Default for DigestFormatter {
    fn default() -> Self {
        Self::new(crate::config::DEFAULT_NOTHING_FOUND)
    }
}

fn write_item(out: &mut String, it: &ResolvedItem, style: SectionStyle) {
    out.push('○');
    out.push_str(&format_month_day(it.date));
    out.push('　');
    if style.quote_titles {
        out.push('「');
        out.push_str(&it.title);
        out.push('」');
    } else {
        out.push_str(&it.title);
    }

    if style.expects_media {
        let media = it.media.clone().unwrap_or_default();
        match media.duration_secs.filter(|s| *s > 0) {
            Some(secs) => {
                out.push_str(&format!("（{}）\n", format_duration(secs)));
                push_line(out, media.video_url.as_deref().unwrap_or(&it.url));
            }
            None => {
                out.push_str(&format!("（{DURATION_PLACEHOLDER}）\n"));
                if let Some(video) = media.video_url.as_deref() {
                    push_line(out, video);
                }
                push_line(out, &format!("（会見ページから自分で確認して！！！: {}）", it.url));
            }
        }
    } else {
        out.push('\n');
        if !it.url.is_empty() {
            push_line(out, &it.url);
        }
    }

    if let Some(body) = it.body.as_deref() {
        if !body.is_empty() && body != it.title {
            push_line(out, body);
        }
    }
    out.push('\n');
}

fn push_line(out: &mut String, text: &str) {
    out.push('　');
    out.push_str(text);
    out.push('\n');
}

/// `6月20日` (no zero padding).
pub fn format_month_day(date: NaiveDate) -> String {
    format!("{}月{}日", date.month(), date.day())
}

/// Structured form of the same sections.
pub fn to_json(sections: &[Section]) -> serde_json::Result<String> {
    serde_json::to_string_pretty(sections)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ingest::types::Media;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn item(date: NaiveDate, title: &str, url: &str) -> ResolvedItem {
        ResolvedItem {
            source_id: "s".into(),
            date,
            title: title.into(),
            body: None,
            url: url.into(),
            media: None,
        }
    }

    fn section(items: Vec<ResolvedItem>, style: SectionStyle) -> Section {
        Section {
            source_id: "s".into(),
            name: "内閣府".into(),
            window: Window::lookback(ymd(2025, 6, 23), 4),
            style,
            body: SectionBody::Items(items),
            failure: None,
        }
    }

    #[test]
    fn month_day_has_no_padding() {
        assert_eq!(format_month_day(ymd(2025, 6, 5)), "6月5日");
        assert_eq!(format_month_day(ymd(2025, 12, 31)), "12月31日");
    }

    #[test]
    fn items_sorted_ascending() {
        let s = section(
            vec![
                item(ymd(2025, 6, 22), "後", "https://b"),
                item(ymd(2025, 6, 20), "先", "https://a"),
            ],
            SectionStyle::default(),
        );
        let text = DigestFormatter::default().format(&[s]);
        assert_eq!(
            text,
            "【内閣府】\n○6月20日　先\n　https://a\n\n○6月22日　後\n　https://b\n\n"
        );
    }

    #[test]
    fn empty_section_gets_nothing_found_line() {
        let f = DigestFormatter::new("なし");
        assert_eq!(
            f.format(&[section(vec![], SectionStyle::default())]),
            "【内閣府】\nなし\n\n"
        );
        let ranged = SectionStyle {
            range_on_empty: true,
            ..Default::default()
        };
        assert_eq!(
            f.format(&[section(vec![], ranged)]),
            "【内閣府】\n6月19日〜6月23日　なし\n\n"
        );
    }

    #[test]
    fn quoted_titles_and_body_lines() {
        let mut it = item(ymd(2025, 6, 21), "サイバー演習", "https://n");
        it.body = Some("於 本部".into());
        let style = SectionStyle {
            quote_titles: true,
            ..Default::default()
        };
        let text = DigestFormatter::default().format(&[section(vec![it], style)]);
        assert!(text.contains("○6月21日　「サイバー演習」\n　https://n\n　於 本部\n\n"));
    }

    #[test]
    fn body_equal_to_title_is_not_repeated() {
        let mut it = item(ymd(2025, 6, 21), "同じ", "https://n");
        it.body = Some("同じ".into());
        let text = DigestFormatter::default().format(&[section(vec![it], SectionStyle::default())]);
        assert_eq!(text.matches("同じ").count(), 1);
    }

    #[test]
    fn media_with_and_without_duration() {
        let style = SectionStyle {
            expects_media: true,
            ..Default::default()
        };
        let mut ok = item(ymd(2025, 6, 20), "大臣会見", "https://page/1");
        ok.media = Some(Media {
            video_url: Some("https://youtu.be/x".into()),
            duration_secs: Some(754),
        });
        let mut missing = item(ymd(2025, 6, 21), "大臣会見", "https://page/2");
        missing.media = Some(Media {
            video_url: Some("https://youtu.be/y".into()),
            duration_secs: None,
        });
        let bare = item(ymd(2025, 6, 22), "大臣会見", "https://page/3");

        let text = DigestFormatter::default().format(&[section(vec![ok, missing, bare], style)]);
        assert!(text.contains("○6月20日　大臣会見（12分34秒）\n　https://youtu.be/x\n\n"));
        assert!(text.contains(
            "○6月21日　大臣会見（再生時間情報を自分で取得してください）\n　https://youtu.be/y\n　（会見ページから自分で確認して！！！: https://page/2）\n\n"
        ));
        assert!(text.contains(
            "○6月22日　大臣会見（再生時間情報を自分で取得してください）\n　（会見ページから自分で確認して！！！: https://page/3）\n\n"
        ));
    }

    #[test]
    fn manual_section_prints_notice() {
        let mut s = section(vec![], SectionStyle::default());
        s.name = "経済産業省".into();
        s.body = SectionBody::Manual("自動化できないので手動で調べてください!!!!".into());
        assert_eq!(
            DigestFormatter::default().format(&[s]),
            "【経済産業省】\n自動化できないので手動で調べてください!!!!\n\n"
        );
    }

    #[test]
    fn json_form_carries_items() {
        let s = section(vec![item(ymd(2025, 6, 20), "t", "u")], SectionStyle::default());
        let v: serde_json::Value = serde_json::from_str(&to_json(&[s]).unwrap()).unwrap();
        assert_eq!(v[0]["name"], "内閣府");
        assert_eq!(v[0]["body"]["kind"], "items");
        assert_eq!(v[0]["body"]["value"][0]["date"], "2025-06-20");
        assert!(v[0].get("failure").is_none());
    }
}
