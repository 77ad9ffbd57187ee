//! # Label Validity
//!
//! A label is the leaf segment a user registers (`"newname"` in
//! `newname.dc`). It is valid when it is a non-empty sequence of well-formed
//! grapheme clusters. Length, for pricing, is counted in clusters, so `"你好吗"`
//! is three long and `"💩💩"` is two.
//!
//! ## Segmentation
//!
//! [`graphemes`] is a deliberately small segmenter. It keeps together:
//!
//! - a base character and its trailing extend characters (combining marks,
//!   variation selectors, emoji modifiers, enclosing keycap, tags);
//! - anything joined by a zero-width joiner;
//! - pairs of regional indicators;
//! - `CR LF`.
//!
//! ## Rejected clusters
//!
//! A cluster is malformed when it starts with an extend character (a dangling
//! mark), contains a zero-width joiner, a variation selector or the keycap
//! mark, is a lone regional indicator, or is a control character. This
//! rejects ZWJ emoji sequences such as `"🤼‍♀️"` and keycaps such as `"7️⃣"`.

/// A pluggable validity rule. The controller is built with
/// [`is_valid_label`] unless told otherwise.
pub type LabelRule = fn(&str) -> bool;

const ZWJ: char = '\u{200D}';
const KEYCAP: char = '\u{20E3}';

fn is_variation_selector(c: char) -> bool {
    matches!(c, '\u{FE00}'..='\u{FE0F}' | '\u{E0100}'..='\u{E01EF}')
}

fn is_regional_indicator(c: char) -> bool {
    matches!(c, '\u{1F1E6}'..='\u{1F1FF}')
}

/// Characters that attach to the preceding cluster.
fn is_extend(c: char) -> bool {
    is_variation_selector(c)
        || matches!(
            c,
            '\u{0300}'..='\u{036F}'
                | '\u{0483}'..='\u{0489}'
                | '\u{0591}'..='\u{05BD}'
                | '\u{0610}'..='\u{061A}'
                | '\u{064B}'..='\u{065F}'
                | '\u{0670}'
                | '\u{06D6}'..='\u{06DC}'
                | '\u{0900}'..='\u{0903}'
                | '\u{093A}'..='\u{094F}'
                | '\u{0951}'..='\u{0957}'
                | '\u{0962}'..='\u{0963}'
                | '\u{0E31}'
                | '\u{0E34}'..='\u{0E3A}'
                | '\u{0E47}'..='\u{0E4E}'
                | '\u{1AB0}'..='\u{1AFF}'
                | '\u{1DC0}'..='\u{1DFF}'
                | '\u{200C}'
                | '\u{20D0}'..='\u{20FF}'
                | '\u{302A}'..='\u{302F}'
                | '\u{3099}'..='\u{309A}'
                | '\u{FE20}'..='\u{FE2F}'
                | '\u{1F3FB}'..='\u{1F3FF}'
                | '\u{E0020}'..='\u{E007F}'
        )
}

/// Split `label` into grapheme clusters.
pub fn graphemes(label: &str) -> Vec<&str> {
    let mut clusters = Vec::new();
    let mut start = 0;
    let mut prev: Option<char> = None;
    // Regional indicators in the current cluster.
    let mut indicators = 0usize;

    for (i, c) in label.char_indices() {
        let joins = match prev {
            None => false,
            Some('\r') => c == '\n',
            Some(p) if p.is_control() || c.is_control() => false,
            Some(p) => {
                is_extend(c)
                    || c == ZWJ
                    || p == ZWJ
                    || (is_regional_indicator(p)
                        && is_regional_indicator(c)
                        && indicators % 2 == 1)
            }
        };
        if !joins && i > start {
            clusters.push(&label[start..i]);
            start = i;
            indicators = 0;
        }
        if is_regional_indicator(c) {
            indicators += 1;
        }
        prev = Some(c);
    }
    if start < label.len() {
        clusters.push(&label[start..]);
    }
    clusters
}

/// Label length in grapheme clusters.
pub fn grapheme_len(label: &str) -> usize {
    graphemes(label).len()
}

fn is_well_formed(cluster: &str) -> bool {
    let mut chars = cluster.chars();
    let Some(first) = chars.next() else {
        return false;
    };
    if is_extend(first) || first == ZWJ || first.is_control() {
        return false;
    }
    if is_regional_indicator(first) && cluster.chars().count() == 1 {
        return false;
    }
    !cluster
        .chars()
        .any(|c| c == ZWJ || c == KEYCAP || is_variation_selector(c))
}

/// The default validity rule.
pub fn is_valid_label(label: &str) -> bool {
    !label.is_empty() && graphemes(label).into_iter().all(is_well_formed)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_label_fixtures() {
        let cases: &[(&str, bool)] = &[
            ("testing", true),
            ("longname12345678", true),
            ("sixsix", true),
            ("five5", true),
            ("four", true),
            ("iii", true),
            ("ii", true),
            ("i", true),
            ("", false),
            ("\u{4f60}\u{597d}\u{5417}", true),
            ("\u{305f}\u{3053}", true),
            ("\u{1F4A9}\u{1F4A9}\u{1F4A9}", true),
            ("\u{1F4A9}\u{1F4A9}", true),
            ("🤼‍♀️", false),
            ("7️⃣", false),
            ("🏴‍☠️", false),
        ];
        for (label, expected) in cases {
            assert_eq!(is_valid_label(label), *expected, "{label:?}");
        }
    }

    #[test]
    fn test_grapheme_lengths() {
        assert_eq!(grapheme_len("aaa"), 3);
        assert_eq!(grapheme_len("\u{4f60}\u{597d}\u{5417}"), 3);
        assert_eq!(grapheme_len("\u{1F4A9}\u{1F4A9}"), 2);
        // e + combining acute is one cluster.
        assert_eq!(grapheme_len("cafe\u{0301}"), 4);
        // Two regional indicators form one flag.
        assert_eq!(grapheme_len("\u{1F1EF}\u{1F1F5}"), 1);
        assert_eq!(grapheme_len(""), 0);
    }

    #[test]
    fn test_zwj_sequence_is_one_cluster() {
        assert_eq!(graphemes("a🤼‍♀️b"), vec!["a", "🤼‍♀️", "b"]);
    }

    #[test]
    fn test_combining_marks_accepted_after_base() {
        assert!(is_valid_label("cafe\u{0301}"));
        assert!(is_valid_label("\u{1F1EF}\u{1F1F5}"));
        assert!(is_valid_label("\u{1F44D}\u{1F3FD}"));
    }

    #[test]
    fn test_dangling_and_lone_sequences_rejected() {
        assert!(!is_valid_label("\u{0301}abc"));
        assert!(!is_valid_label("\u{FE0F}"));
        assert!(!is_valid_label("\u{1F1EF}"));
        assert!(!is_valid_label("a\u{200D}b"));
        assert!(!is_valid_label("a\u{0000}b"));
    }

    mod proptests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn ascii_alphanumerics_are_valid(label in "[a-zA-Z0-9]{1,64}") {
                prop_assert!(is_valid_label(&label));
                prop_assert_eq!(grapheme_len(&label), label.len());
            }

            #[test]
            fn clusters_reassemble_the_label(label in "\\PC{0,24}") {
                prop_assert_eq!(graphemes(&label).concat(), label);
            }
        }
    }
}
