// Color guessing for offers.
//
// Two heuristics exist and they disagree on the same input, so the choice is
// an explicit policy rather than a hidden default.

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::models::{AttributeLabel, NOT_SURE};

const COLOR_LABEL: &str = "färg";

const SWEDISH_COLORS: [&str; 48] = [
    "Röd", "Ljusröd", "Mörkröd", "Blå", "Ljusblå", "Mörkblå", "Gul", "Ljusgul", "Mörkgul",
    "Grön", "Ljusgrön", "Mörkgrön", "Orange", "Ljusorange", "Mörkorange", "Lila", "Ljuslila",
    "Mörklila", "Rosa", "Ljusrosa", "Mörkrosa", "Brun", "Ljusbrun", "Mörkbrun", "Svart",
    "Vit", "Grå", "Ljusgrå", "Mörkgrå", "Turkos", "Ljusturkos", "Mörkturkos", "Cyan",
    "Ljuscyan", "Mörkcyan", "Magenta", "Ljusmagenta", "Mörkmagenta", "Indigo", "Ljusindigo",
    "Mörkindigo", "Violett", "Ljusviolett", "Mörkviolett", "Guld", "Silver", "Beige", "Ockra",
];

// (Swedish, English)
const TRANSLATIONS: [(&str, &str); 32] = [
    ("Röd", "Red"), ("Ljusröd", "Light Red"), ("Mörkröd", "Dark Red"),
    ("Blå", "Blue"), ("Ljusblå", "Light Blue"), ("Mörkblå", "Dark Blue"),
    ("Gul", "Yellow"), ("Ljusgul", "Light Yellow"), ("Mörkgul", "Dark Yellow"),
    ("Grön", "Green"), ("Ljusgrön", "Light Green"), ("Mörkgrön", "Dark Green"),
    ("Orange", "Orange"), ("Ljusorange", "Light Orange"), ("Mörkorange", "Dark Orange"),
    ("Lila", "Purple"), ("Ljuslila", "Light Purple"), ("Mörklila", "Dark Purple"),
    ("Rosa", "Pink"), ("Ljusrosa", "Light Pink"), ("Mörkrosa", "Dark Pink"),
    ("Brun", "Brown"), ("Ljusbrun", "Light Brown"), ("Mörkbrun", "Dark Brown"),
    ("Svart", "Black"), ("Vit", "White"), ("Grå", "Gray"), ("Ljusgrå", "Light Gray"),
    ("Mörkgrå", "Dark Gray"), ("Turkos", "Turquoise"), ("Ljusturkos", "Light Turquoise"),
    ("Mörkturkos", "Dark Turquoise"),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ColorPolicy {
    /// Structured "Färg" label first, then a whole-word scan of the offer name.
    LabelFirst,
    /// Only a substring check of the expected color against the offer name.
    NameOnly,
}

/// Language of labels produced from the built-in vocabulary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ColorLanguage {
    Swedish,
    English,
}

#[derive(Debug)]
struct Candidate {
    pattern: Regex,
    swedish: &'static str,
}

#[derive(Debug)]
pub struct ColorClassifier {
    policy: ColorPolicy,
    language: ColorLanguage,
    // Longest names first so "Ljusblå" wins over "Blå"
    candidates: Vec<Candidate>,
}

impl ColorClassifier {
    pub fn new(
        policy: ColorPolicy,
        language: ColorLanguage,
        match_english_names: bool,
    ) -> Result<Self, regex::Error> {
        let mut words: Vec<(&'static str, &'static str)> = SWEDISH_COLORS
            .iter()
            .chain(TRANSLATIONS.iter().map(|(sv, _)| sv))
            .map(|sv| (*sv, *sv))
            .collect();
        if match_english_names {
            words.extend(TRANSLATIONS.iter().map(|(sv, en)| (*en, *sv)));
        }

        words.sort_by(|a, b| {
            b.0.chars()
                .count()
                .cmp(&a.0.chars().count())
                .then_with(|| a.0.cmp(b.0))
        });
        words.dedup_by(|a, b| a.0.eq_ignore_ascii_case(b.0));

        let candidates = words
            .into_iter()
            .map(|(word, swedish)| -> Result<Candidate, regex::Error> {
                Ok(Candidate {
                    pattern: whole_word(word)?,
                    swedish,
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            policy,
            language,
            candidates,
        })
    }

    /// Best-guess color for an offer, `"Not Sure"` when nothing matches.
    pub fn classify(
        &self,
        offer_name: &str,
        labels: &[AttributeLabel],
        expected_color: Option<&str>,
    ) -> String {
        let expected = expected_color.map(str::trim).filter(|c| !c.is_empty());
        match self.policy {
            ColorPolicy::LabelFirst => self
                .from_labels(labels, expected)
                .or_else(|| self.from_name(offer_name, expected))
                .unwrap_or_else(|| NOT_SURE.to_string()),
            ColorPolicy::NameOnly => expected
                .filter(|c| offer_name.to_lowercase().contains(&c.to_lowercase()))
                .map(str::to_string)
                .unwrap_or_else(|| NOT_SURE.to_string()),
        }
    }

    fn from_labels(&self, labels: &[AttributeLabel], expected: Option<&str>) -> Option<String> {
        labels
            .iter()
            .filter(|label| label.name.trim().to_lowercase() == COLOR_LABEL)
            .map(|label| label.value.trim())
            .filter(|value| !value.is_empty())
            .find(|value| expected.is_none_or(|e| value.to_lowercase() == e.to_lowercase()))
            .map(|value| self.localize(value))
    }

    fn from_name(&self, offer_name: &str, expected: Option<&str>) -> Option<String> {
        if let Some(expected) = expected {
            if whole_word(expected).is_ok_and(|re| re.is_match(offer_name)) {
                return Some(expected.to_string());
            }
        }

        self.candidates
            .iter()
            .find(|c| c.pattern.is_match(offer_name))
            .map(|c| self.localize(c.swedish))
    }

    fn localize(&self, swedish: &str) -> String {
        match self.language {
            ColorLanguage::Swedish => swedish.to_string(),
            ColorLanguage::English => TRANSLATIONS
                .iter()
                .find(|(sv, _)| sv.to_lowercase() == swedish.to_lowercase())
                .map(|(_, en)| en.to_string())
                .unwrap_or_else(|| swedish.to_string()),
        }
    }
}

fn whole_word(word: &str) -> Result<Regex, regex::Error> {
    Regex::new(&format!(r"(?i)\b{}\b", regex::escape(word)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn label(name: &str, value: &str) -> AttributeLabel {
        AttributeLabel {
            name: name.to_string(),
            value: value.to_string(),
        }
    }

    fn label_first() -> ColorClassifier {
        ColorClassifier::new(ColorPolicy::LabelFirst, ColorLanguage::Swedish, false).unwrap()
    }

    fn name_only() -> ColorClassifier {
        ColorClassifier::new(ColorPolicy::NameOnly, ColorLanguage::Swedish, false).unwrap()
    }

    #[test]
    fn label_first_scans_swedish_names() {
        let classifier = label_first();
        assert_eq!(classifier.classify("Röd T-shirt Large", &[], None), "Röd");
        assert_eq!(classifier.classify("Red shirt", &[], Some("Red")), "Red");
        assert_eq!(classifier.classify("Blue shoes", &[], None), "Not Sure");
    }

    #[test]
    fn label_first_prefers_the_farg_label() {
        let classifier = label_first();
        let labels = [label("Storlek", "L"), label("Färg", "Mörkgrön")];
        assert_eq!(classifier.classify("Svart jacka", &labels, None), "Mörkgrön");
        // Label disagrees with the expected color, so the name decides
        assert_eq!(classifier.classify("Svart jacka", &labels, Some("Svart")), "Svart");
        assert_eq!(classifier.classify("Jacka", &labels, Some("mörkgrön")), "Mörkgrön");
    }

    #[test]
    fn whole_words_only_and_longest_first() {
        let classifier = label_first();
        assert_eq!(classifier.classify("Rödbetor", &[], None), "Not Sure");
        assert_eq!(classifier.classify("Keps ljusblå one size", &[], None), "Ljusblå");
        assert_eq!(classifier.classify("Keps BLÅ", &[], None), "Blå");
    }

    #[test]
    fn english_names_are_opt_in() {
        let classifier =
            ColorClassifier::new(ColorPolicy::LabelFirst, ColorLanguage::Swedish, true).unwrap();
        assert_eq!(classifier.classify("Blue shoes", &[], None), "Blå");
        assert_eq!(classifier.classify("Light Blue shoes", &[], None), "Ljusblå");
    }

    #[test]
    fn english_output_translates_vocabulary_hits() {
        let classifier =
            ColorClassifier::new(ColorPolicy::LabelFirst, ColorLanguage::English, false).unwrap();
        assert_eq!(classifier.classify("Blå Keps", &[], Some("Blue")), "Blue");
        assert_eq!(classifier.classify("Guld ring", &[], None), "Guld");
        let labels = [label("färg", "Svart")];
        assert_eq!(classifier.classify("Jacka", &labels, None), "Black");
    }

    #[test]
    fn name_only_matches_substrings_of_the_expected_color() {
        let classifier = name_only();
        assert_eq!(classifier.classify("Blåbärsblå Keps", &[], Some("blå")), "blå");
        assert_eq!(classifier.classify("Röd T-shirt", &[], None), "Not Sure");
        assert_eq!(
            classifier.classify("Svart jacka", &[label("Färg", "Svart")], Some("Vit")),
            "Not Sure"
        );
    }

    #[test]
    fn blank_expected_color_counts_as_missing() {
        let classifier = label_first();
        assert_eq!(classifier.classify("Vit mugg", &[], Some("  ")), "Vit");
        assert_eq!(name_only().classify("Vit mugg", &[], Some("")), "Not Sure");
    }
}
