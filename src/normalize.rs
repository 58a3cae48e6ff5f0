// src/normalize.rs
//! Text canonicalization shared by keyword matching and date extraction.
//!
//! Order matters:
//! 1) NFKC folds full-width letters, digits and punctuation variants.
//! 2) Any full-width digit NFKC left behind is mapped to ASCII.
//! 3) ASCII letters are lowercased; everything else is left alone.
//! 4) NFKC again, since a lowercased letter can compose with a following
//!    combining mark (`J` + U+030C stays apart, `j` + U+030C becomes `ǰ`).

use unicode_normalization::UnicodeNormalization;

/// Canonical form used for matching. Idempotent.
pub fn normalize(text: &str) -> String {
    text.nfkc()
        .map(fold_fullwidth_digit)
        .map(|c| c.to_ascii_lowercase())
        .nfkc()
        .collect()
}

fn fold_fullwidth_digit(c: char) -> char {
    match c {
        '０'..='９' => char::from(b'0' + (c as u32 - '０' as u32) as u8),
        _ => c,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fullwidth_digits_collapse() {
        assert_eq!(normalize("２０２５"), normalize("2025"));
        assert_eq!(normalize("２０２５"), "2025");
    }

    #[test]
    fn fullwidth_letters_fold_and_lowercase() {
        assert_eq!(normalize("ＤＸ推進"), "dx推進");
        assert_eq!(normalize("AIガバナンス"), "aiガバナンス");
    }

    #[test]
    fn era_ligature_folds() {
        assert_eq!(normalize("㋿7年"), "令和7年");
    }

    #[test]
    fn halfwidth_kana_composes() {
        assert_eq!(normalize("ﾃﾞｼﾞﾀﾙ"), "デジタル");
        assert_eq!(normalize("デジタル"), "デジタル");
    }

    #[test]
    fn idempotent() {
        for s in ["Ｗｅｂ３．０研究会", "令和７年６月２０日", "  Mixed ＣＡＳＥ  ", "J\u{30C}", ""] {
            let once = normalize(s);
            assert_eq!(normalize(&once), once);
        }
    }

    #[test]
    fn lowercase_then_compose() {
        assert_eq!(normalize("J\u{30C}"), "\u{1F0}");
    }

    #[test]
    fn fold_digit_maps_every_fullwidth_digit() {
        let all: String = ('０'..='９').map(fold_fullwidth_digit).collect();
        assert_eq!(all, "0123456789");
        assert_eq!(fold_fullwidth_digit('年'), '年');
    }
}
