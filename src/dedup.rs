// src/dedup.rs
//! Collapse records sharing a `(date, title)` key into the most informative one.
//!
//! Score: character length of the body when it is non-empty and differs from
//! the title, otherwise 0. A later record replaces the kept one only with a
//! strictly greater score; ties keep the first seen. The survivor occupies the
//! slot of the key's first appearance, so output order is first-appearance order.

use std::collections::HashMap;

use crate::ingest::types::{DedupeKey, ResolvedItem};

pub fn informativeness(item: &ResolvedItem) -> usize {
    match item.body.as_deref() {
        Some(body) if !body.is_empty() && body != item.title => body.chars().count(),
        _ => 0,
    }
}

pub fn dedupe(items: Vec<ResolvedItem>) -> Vec<ResolvedItem> {
    dedupe_with_count(items).0
}

/// Like [`dedupe`], also returning how many records were collapsed away.
pub fn dedupe_with_count(items: Vec<ResolvedItem>) -> (Vec<ResolvedItem>, usize) {
    let mut slots: HashMap<DedupeKey, usize> = HashMap::with_capacity(items.len());
    let mut out: Vec<ResolvedItem> = Vec::with_capacity(items.len());
    let mut collapsed = 0usize;

    for item in items {
        match slots.get(&item.dedupe_key()) {
            Some(&idx) => {
                collapsed += 1;
                if informativeness(&item) > informativeness(&out[idx]) {
                    tracing::debug!(
                        target: "digest",
                        title = %item.title,
                        "dedup: richer record replaces earlier one"
                    );
                    out[idx] = item;
                }
            }
            None => {
                slots.insert(item.dedupe_key(), out.len());
                out.push(item);
            }
        }
    }

    (out, collapsed)
}
