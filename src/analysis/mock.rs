use async_trait::async_trait;

use super::{AnalysisError, AnalysisResult, Analyzer};
use crate::db::models::{Correction, ReviewCategory, ReviewScores};

/// Trigger phrases scanned for, first occurrence only.
const TRIGGERS: &[(&str, ReviewCategory, &str)] = &[
    (
        "However",
        ReviewCategory::Grammar,
        "Add a comma after transitional words at the beginning of a sentence. Should be: 'However,'",
    ),
    (
        "it's",
        ReviewCategory::Grammar,
        "Incorrect use of contraction. Use 'its' (possessive) instead of 'it's' (it is).",
    ),
    (
        "very important",
        ReviewCategory::Style,
        "Replace weak intensifiers with stronger, more precise vocabulary. Consider: 'crucial' or 'essential'",
    ),
    (
        "In conclusion",
        ReviewCategory::Style,
        "Vary your transitional phrases to avoid repetitive language. Try: 'To conclude' or 'Ultimately'",
    ),
    (
        "this",
        ReviewCategory::Clarity,
        "Vague pronoun reference. Specify what 'this' refers to for better clarity.",
    ),
];

const STRUCTURE_COMMENT: &str = "The opening paragraph would benefit from a clear thesis statement to guide readers through your argument.";
const CONTENT_COMMENT: &str = "Your main arguments are well-developed. Consider adding more specific examples or evidence to strengthen your claims.";
const RESEARCH_COMMENT: &str = "Consider citing authoritative sources to support your key points. This would add credibility to your arguments.";

/// Opening span length covered by the structure note, in UTF-16 units.
const OPENING_SPAN: usize = 100;

/// Length in UTF-16 code units, the unit browser clients slice text by.
pub(crate) fn utf16_len(s: &str) -> usize {
    s.encode_utf16().count()
}

/// Longest prefix of `s` that fits in `limit` UTF-16 units without splitting
/// a surrogate pair.
fn utf16_prefix(s: &str, limit: usize) -> &str {
    let mut units = 0;
    for (idx, ch) in s.char_indices() {
        units += ch.len_utf16();
        if units > limit {
            return &s[..idx];
        }
    }
    s
}

#[derive(Debug, Clone, Copy, Default)]
pub struct MockAnalyzer;

impl MockAnalyzer {
    pub fn new() -> Self {
        Self
    }

    /// Pure function of the content; offsets are UTF-16 code units.
    pub fn review(&self, content: &str) -> AnalysisResult {
        let mut corrections = Vec::new();

        for (needle, category, comment) in TRIGGERS {
            if let Some(byte_idx) = content.find(needle) {
                let start = utf16_len(&content[..byte_idx]) as i64;
                corrections.push(Correction {
                    category: *category,
                    selected_text: needle.to_string(),
                    text_start_index: start,
                    text_end_index: start + utf16_len(needle) as i64,
                    comment: comment.to_string(),
                });
            }
        }

        let first_paragraph = content.split("\n\n").next().unwrap_or_default();
        if !first_paragraph.is_empty() {
            let opening = utf16_prefix(first_paragraph, OPENING_SPAN);
            let len = utf16_len(opening) as i64;
            corrections.push(Correction {
                category: ReviewCategory::Structure,
                selected_text: opening.to_string(),
                text_start_index: 0,
                text_end_index: len,
                comment: STRUCTURE_COMMENT.to_string(),
            });
        }

        for (category, comment) in [
            (ReviewCategory::Content, CONTENT_COMMENT),
            (ReviewCategory::Research, RESEARCH_COMMENT),
        ] {
            corrections.push(Correction {
                category,
                selected_text: String::new(),
                text_start_index: 0,
                text_end_index: 0,
                comment: comment.to_string(),
            });
        }

        let issues = |category: ReviewCategory| {
            corrections.iter().filter(|c| c.category == category).count() as i32
        };

        let grammar_score = (180 - 20 * issues(ReviewCategory::Grammar)).max(120);
        let style_score = (170 - 15 * issues(ReviewCategory::Style)).max(120);
        let clarity_score = (175 - 20 * issues(ReviewCategory::Clarity)).max(130);
        let structure_score = (180 - 15 * issues(ReviewCategory::Structure)).max(140);
        let content_score = 165;
        let research_score = 155;

        let scores = ReviewScores {
            grammar_score,
            style_score,
            clarity_score,
            structure_score,
            content_score,
            research_score,
            overall_score: grammar_score
                + style_score
                + clarity_score
                + structure_score
                + content_score
                + research_score,
        };

        corrections.retain(|c| c.text_start_index >= 0);

        AnalysisResult {
            scores,
            corrections,
        }
    }
}

#[async_trait]
impl Analyzer for MockAnalyzer {
    async fn analyze(&self, _title: &str, content: &str) -> Result<AnalysisResult, AnalysisError> {
        Ok(self.review(content))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SCENARIO: &str = "However, it's very important. In conclusion, this matters.";

    #[test]
    fn test_scenario_finds_every_trigger() {
        let result = MockAnalyzer::new().review(SCENARIO);
        let texts: Vec<&str> = result
            .corrections
            .iter()
            .map(|c| c.selected_text.as_str())
            .collect();
        for needle in ["However", "it's", "very important", "In conclusion", "this"] {
            assert!(texts.contains(&needle), "missing {needle}");
        }
        // five triggers, one structure note, content and research
        assert_eq!(result.corrections.len(), 8);
    }

    #[test]
    fn test_scenario_scores_follow_formula() {
        let s = MockAnalyzer::new().review(SCENARIO).scores;
        assert_eq!(s.grammar_score, 140);
        assert_eq!(s.style_score, 140);
        assert_eq!(s.clarity_score, 155);
        assert_eq!(s.structure_score, 165);
        assert_eq!(s.content_score, 165);
        assert_eq!(s.research_score, 155);
        assert_eq!(s.overall_score, 920);
    }

    #[test]
    fn test_trigger_spans_match_offsets() {
        let result = MockAnalyzer::new().review(SCENARIO);
        let conclusion = result
            .corrections
            .iter()
            .find(|c| c.selected_text == "In conclusion")
            .unwrap();
        assert_eq!(conclusion.text_start_index, 30);
        assert_eq!(conclusion.text_end_index, 43);
    }

    #[test]
    fn test_offsets_count_utf16_units_not_bytes() {
        let result = MockAnalyzer::new().review("Café: this works.");
        let this = result
            .corrections
            .iter()
            .find(|c| c.category == ReviewCategory::Clarity)
            .unwrap();
        assert_eq!(this.text_start_index, 6);
        assert_eq!(this.text_end_index, 10);
    }

    #[test]
    fn test_empty_content_keeps_fixed_corrections_only() {
        let result = MockAnalyzer::new().review("");
        assert_eq!(result.corrections.len(), 2);
        assert_eq!(result.scores.grammar_score, 180);
        assert_eq!(result.scores.structure_score, 180);
        assert_eq!(result.scores.overall_score, 180 + 170 + 175 + 180 + 165 + 155);
    }

    #[test]
    fn test_structure_note_spans_first_paragraph_prefix() {
        let long = "a".repeat(150);
        let content = format!("{long}\n\nSecond paragraph");
        let result = MockAnalyzer::new().review(&content);
        let structure = result
            .corrections
            .iter()
            .find(|c| c.category == ReviewCategory::Structure)
            .unwrap();
        assert_eq!(structure.text_end_index, 100);
        assert_eq!(structure.selected_text.len(), 100);

        let short = MockAnalyzer::new().review("Short.\n\nMore.");
        let structure = short
            .corrections
            .iter()
            .find(|c| c.category == ReviewCategory::Structure)
            .unwrap();
        assert_eq!(structure.selected_text, "Short.");
        assert_eq!(structure.text_end_index, 6);
    }

    #[test]
    fn test_astral_characters_count_as_two_units() {
        let result = MockAnalyzer::new().review("😀 this");
        let this = result
            .corrections
            .iter()
            .find(|c| c.category == ReviewCategory::Clarity)
            .unwrap();
        assert_eq!(this.text_start_index, 3);
        assert_eq!(this.text_end_index, 7);

        let structure = result
            .corrections
            .iter()
            .find(|c| c.category == ReviewCategory::Structure)
            .unwrap();
        assert_eq!(structure.text_end_index, 7);
    }

    #[test]
    fn test_structure_prefix_never_splits_surrogate_pair() {
        // 99 units of ASCII, then an emoji that would need units 100 and 101
        let content = format!("{}😀tail", "a".repeat(99));
        let result = MockAnalyzer::new().review(&content);
        let structure = result
            .corrections
            .iter()
            .find(|c| c.category == ReviewCategory::Structure)
            .unwrap();
        assert_eq!(structure.text_end_index, 99);
        assert_eq!(structure.selected_text, "a".repeat(99));

        assert_eq!(utf16_prefix("😀😀", 4), "😀😀");
        assert_eq!(utf16_prefix("😀😀", 3), "😀");
    }
}
