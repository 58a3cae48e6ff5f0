// tests/dedup.rs
use chrono::NaiveDate;
use policy_digest::dedup::dedupe;
use policy_digest::ResolvedItem;

fn item(title: &str, body: Option<&str>, url: &str) -> ResolvedItem {
    ResolvedItem {
        source_id: "ldp".into(),
        date: NaiveDate::from_ymd_opt(2025, 6, 20).unwrap(),
        title: title.into(),
        body: body.map(str::to_string),
        url: url.into(),
        media: None,
    }
}

#[test]
fn distinct_body_beats_title_echo() {
    let body50 = "あ".repeat(50);
    let out = dedupe(vec![
        item("部会", Some("部会"), "a"),
        item("部会", Some(&body50), "b"),
    ]);
    assert_eq!(out.len(), 1);
    assert_eq!(out[0].url, "b");
}

#[test]
fn tie_keeps_first_seen() {
    let out = dedupe(vec![item("会議", None, "first"), item("会議", None, "second")]);
    assert_eq!(out.len(), 1);
    assert_eq!(out[0].url, "first");
}

#[test]
fn idempotent_and_order_of_first_appearance() {
    let input = vec![
        item("b", None, "1"),
        item("a", Some("詳細"), "2"),
        item("b", Some("詳細あり"), "3"),
        item("a", None, "4"),
    ];
    let once = dedupe(input);
    assert_eq!(once.iter().map(|i| i.url.as_str()).collect::<Vec<_>>(), ["3", "2"]);
    assert_eq!(dedupe(once.clone()), once);
}
