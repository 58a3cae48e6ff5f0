// src/window.rs
//! # Date Window
//! Inclusive day range `[anchor - lookback, anchor + ahead]`.
//!
//! The anchor is fixed once per run and injected; nothing here reads the
//! clock. Dates must already be in the same offset as the anchor.

use chrono::NaiveDate;
use serde::Serialize;

use crate::date::{days_after, days_before};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Window {
    anchor: NaiveDate,
    lookback_days: u32,
    ahead_days: u32,
}

impl Window {
    pub fn new(anchor: NaiveDate, lookback_days: u32, ahead_days: u32) -> Self {
        Self {
            anchor,
            lookback_days,
            ahead_days,
        }
    }

    /// Window that only looks back (`ahead_days = 0`).
    pub fn lookback(anchor: NaiveDate, days: u32) -> Self {
        Self::new(anchor, days, 0)
    }

    pub fn anchor(&self) -> NaiveDate {
        self.anchor
    }

    pub fn lookback_days(&self) -> u32 {
        self.lookback_days
    }

    pub fn ahead_days(&self) -> u32 {
        self.ahead_days
    }

    /// First included day.
    pub fn start(&self) -> NaiveDate {
        days_before(self.anchor, self.lookback_days)
    }

    /// Last included day.
    pub fn end(&self) -> NaiveDate {
        days_after(self.anchor, self.ahead_days)
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start() <= date && date <= self.end()
    }
}

/// Free-function form of [`Window::contains`].
pub fn in_window(date: NaiveDate, window: &Window) -> bool {
    window.contains(date)
}
