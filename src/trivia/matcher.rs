//! Free-text answer matching.
//!
//! Both the submission and the known answer are [normalized](normalize) and then
//! compared with a ladder of increasingly lenient rules. The first rule that
//! reaches a verdict decides, see [Decision].

use std::sync::LazyLock;

use regex::Regex;

/// Words that never count as the "key" word of an answer.
const STOPLIST: [&str; 15] = [
    "with", "from", "that", "this", "they", "have", "been", "were", "answer", "question", "word",
    "name", "place", "thing", "person",
];

/// Minimum length of a token to be considered meaningful on the answer side.
const ANSWER_TOKEN_MIN: usize = 4;
/// Minimum length of a token to be considered meaningful on the submission side.
const SUBMISSION_TOKEN_MIN: usize = 3;
/// Share of significant answer words a multi-word submission must cover.
const WORD_RATIO: f64 = 0.6;
/// Character-overlap threshold, applied in both directions.
const OVERLAP: f64 = 0.9;
/// Minimum ratio between the shorter and the longer string.
const LENGTH_RATIO: f64 = 0.7;

/// Compiles a pattern that is known to be valid.
fn pattern(re: &str) -> Regex {
    Regex::new(re).expect("hardcoded pattern must compile")
}

static INTERROGATIVE: LazyLock<Regex> =
    LazyLock::new(|| pattern(r"^(what|who|where|when|why|how)\s+(is|are|was|were)\s+"));
static PARENTHESIZED: LazyLock<Regex> = LazyLock::new(|| pattern(r"\([^)]*\)"));
static ARTICLE: LazyLock<Regex> = LazyLock::new(|| pattern(r"^(a|an|the)\s+"));
static GEOGRAPHIC: LazyLock<Regex> = LazyLock::new(|| {
    pattern(r"\b(peninsula|island|city|state|country|province|territory)\b")
});
static DASHES: LazyLock<Regex> = LazyLock::new(|| pattern(r"[-–—]"));
static PUNCTUATION: LazyLock<Regex> = LazyLock::new(|| pattern(r"[^\w\s]"));
static WHITESPACE: LazyLock<Regex> = LazyLock::new(|| pattern(r"\s+"));

/// Normalizes text before comparison.
///
/// Lower-cases, drops a leading "what is"/"who was"/... phrase, parenthesized
/// asides, a leading article and geographic descriptors, turns dashes into spaces,
/// strips punctuation and collapses whitespace.
pub fn normalize(text: &str) -> String {
    let text = text.to_lowercase();
    let text = INTERROGATIVE.replace(&text, "");
    let text = PARENTHESIZED.replace_all(&text, "");
    let text = ARTICLE.replace(&text, "");
    let text = GEOGRAPHIC.replace_all(&text, "");
    let text = DASHES.replace_all(&text, " ");
    let text = PUNCTUATION.replace_all(&text, "");
    let text = WHITESPACE.replace_all(&text, " ");
    text.trim().to_string()
}

/// Which rule settled a comparison.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Decision {
    /// Normalized strings are identical.
    Exact,
    /// A single meaningful word found among the answer's words.
    SingleWord,
    /// A submission word matches a non-trivial answer word.
    KeyWord,
    /// Two single words, one inside the other.
    SingleToken,
    /// Ratio of answer words covered by a multi-word submission.
    WordRatio { ratio: f64, matched: bool },
    /// The (much shorter) answer appears verbatim in the submission.
    Contained,
    /// Bidirectional character overlap.
    Similarity {
        forward: f64,
        backward: f64,
        length_ratio: f64,
        matched: bool,
    },
    /// Nothing matched.
    NoMatch,
}

impl Decision {
    /// Whether this decision accepts the submission.
    pub fn is_match(&self) -> bool {
        match self {
            Decision::Exact | Decision::SingleWord | Decision::KeyWord | Decision::SingleToken => {
                true
            }
            Decision::Contained => true,
            Decision::WordRatio { matched, .. } | Decision::Similarity { matched, .. } => *matched,
            Decision::NoMatch => false,
        }
    }
}

/// Returns `true` if `submission` counts as a correct response to `answer`.
///
/// Not symmetric: the answer and the submission play different roles.
pub fn is_match(submission: &str, answer: &str) -> bool {
    let decision = decide(submission, answer);
    tracing::debug!(?decision, "Checked '{submission}' against '{answer}'.");
    decision.is_match()
}

/// Runs the matching ladder and reports the rule that decided.
pub fn decide(submission: &str, answer: &str) -> Decision {
    // Messages without text (attachments, embeds) are not answers.
    if submission.trim().is_empty() {
        return Decision::NoMatch;
    }

    let submission = normalize(submission);
    let answer = normalize(answer);

    // Answers like "an island" normalize to nothing and can only match exactly.
    if submission == answer {
        return Decision::Exact;
    }
    if submission.is_empty() {
        return Decision::NoMatch;
    }

    let submitted: Vec<&str> = submission.split_whitespace().collect();
    let expected: Vec<&str> = answer.split_whitespace().collect();

    if let [word] = submitted[..] {
        if expected.len() > 1
            && len(word) >= ANSWER_TOKEN_MIN
            && expected
                .iter()
                .any(|exp| len(exp) >= ANSWER_TOKEN_MIN && related(word, exp))
        {
            return Decision::SingleWord;
        }
    }

    if expected.len() > 1 {
        let key_word = submitted
            .iter()
            .filter(|sub| len(sub) >= SUBMISSION_TOKEN_MIN)
            .any(|sub| {
                expected
                    .iter()
                    .filter(|exp| len(exp) >= ANSWER_TOKEN_MIN && !is_common(exp))
                    .any(|exp| related(sub, exp))
            });
        if key_word {
            return Decision::KeyWord;
        }
    }

    if let ([sub], [exp]) = (&submitted[..], &expected[..]) {
        if sub.contains(exp) || exp.contains(sub) {
            return Decision::SingleToken;
        }
    }

    if submitted.len() > 1 && expected.len() > 1 {
        let significant: Vec<&&str> = expected
            .iter()
            .filter(|exp| len(exp) >= SUBMISSION_TOKEN_MIN && !is_common(exp))
            .collect();
        let matches = significant
            .iter()
            .filter(|exp| {
                submitted
                    .iter()
                    .filter(|sub| len(sub) >= SUBMISSION_TOKEN_MIN)
                    .any(|sub| related(sub, exp))
            })
            .count();

        if !significant.is_empty() && matches > 0 {
            let ratio = matches as f64 / significant.len() as f64;
            return Decision::WordRatio {
                ratio,
                matched: ratio >= WORD_RATIO,
            };
        }
    }

    if answer.is_empty() {
        return Decision::NoMatch;
    }

    let (sub_len, ans_len) = (len(&submission), len(&answer));

    if (ans_len as f64) < sub_len as f64 * 0.5 && submission.contains(answer.as_str()) {
        return Decision::Contained;
    }

    let forward = overlap(&answer, &submission);
    let backward = overlap(&submission, &answer);
    let length_ratio = sub_len.min(ans_len) as f64 / sub_len.max(ans_len) as f64;

    Decision::Similarity {
        forward,
        backward,
        length_ratio,
        matched: forward >= OVERLAP && backward >= OVERLAP && length_ratio >= LENGTH_RATIO,
    }
}

/// Length in characters.
fn len(s: &str) -> usize {
    s.chars().count()
}

/// Equal, or one contains the other.
fn related(a: &str, b: &str) -> bool {
    a == b || a.contains(b) || b.contains(a)
}

fn is_common(word: &str) -> bool {
    STOPLIST.contains(&word)
}

/// Share of the characters of `from` (counted per occurrence) that appear anywhere in `within`.
fn overlap(from: &str, within: &str) -> f64 {
    let found = from.chars().filter(|c| within.contains(*c)).count();
    found as f64 / len(from) as f64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_strips_question_phrasing_and_articles() {
        assert_eq!(normalize("What is the Eiffel Tower?"), "eiffel tower");
        assert_eq!(normalize("Who were The Beatles"), "beatles");
        assert_eq!(normalize("an apple"), "apple");
    }

    #[test]
    fn normalize_drops_parentheses_descriptors_and_dashes() {
        assert_eq!(
            normalize("William Shakespeare (playwright)"),
            "william shakespeare"
        );
        assert_eq!(normalize("the Baja Peninsula"), "baja");
        assert_eq!(normalize("New York City"), "new york");
        assert_eq!(normalize("Lin-Manuel Miranda"), "lin manuel miranda");
        assert_eq!(normalize("Jean—Paul   Sartre!"), "jean paul sartre");
    }

    #[test]
    fn normalize_only_strips_one_leading_phrase() {
        assert_eq!(normalize("what is who is"), "who is");
        assert_eq!(normalize("the the"), "the");
        // Not at the start, so it stays.
        assert_eq!(normalize("so what is it"), "so what is it");
    }

    #[test]
    fn normalize_is_stable_on_its_output() {
        let answers = [
            "What is Paris?",
            "Who is Abraham Lincoln?",
            "Lin-Manuel Miranda",
            "Wellington, New Zealand",
            "the Baja Peninsula",
            "Mount Everest (highest peak)",
            "New York City",
            "What is a lion?",
            "Forrest Gump",
            "Rhode Island",
            "Café au lait",
            "  lots   of\tspace ",
            "",
        ];
        for answer in answers {
            let once = normalize(answer);
            assert_eq!(normalize(&once), once, "unstable on {answer:?}");
        }
    }

    #[test]
    fn hyphenated_names_match() {
        assert!(is_match("Lin Manuel Miranda", "Lin-Manuel Miranda"));
        assert_eq!(
            decide("Lin Manuel Miranda", "Lin-Manuel Miranda"),
            Decision::Exact
        );
    }

    #[test]
    fn single_word_inside_longer_answer() {
        assert!(is_match("wellington", "Wellington, New Zealand"));
        assert_eq!(
            decide("wellington", "Wellington, New Zealand"),
            Decision::SingleWord
        );
        assert!(is_match("paris", "Paris, France"));
    }

    #[test]
    fn question_phrasing_and_last_name() {
        assert!(is_match("what is lincoln", "Abraham Lincoln"));
        assert!(is_match("who is shakespeare", "William Shakespeare (playwright)"));
    }

    #[test]
    fn key_word_needs_a_meaningful_answer_word() {
        assert_eq!(decide("honest lincoln", "Abraham Lincoln"), Decision::KeyWord);
        // "answer" is on the stoplist, so sharing it proves nothing.
        assert!(!is_match("wrong answer", "Correct Answer"));
        assert!(!is_match("completely different", "Something Else"));
    }

    #[test]
    fn single_tokens_contain_each_other() {
        assert_eq!(decide("oxygens", "What is oxygen?"), Decision::SingleToken);
        assert_eq!(decide("ox", "oxygen"), Decision::SingleToken);
        assert!(!is_match("lion", "tiger"));
    }

    #[test]
    fn word_ratio_decides_for_multi_word_pairs() {
        // Two of three significant words (each only 3 letters long, so the
        // key-word rule cannot fire).
        let decision = decide("sun dog", "sun dog cat");
        assert!(matches!(
            decision,
            Decision::WordRatio { matched: true, .. }
        ));

        let decision = decide("sun xyz", "sun dog cat");
        assert!(matches!(
            decision,
            Decision::WordRatio { matched: false, .. }
        ));
        assert!(!decision.is_match());
    }

    #[test]
    fn short_answer_inside_long_submission() {
        assert_eq!(decide("baja california", "the Baja Peninsula"), Decision::Contained);
        assert!(is_match("baja california", "the Baja Peninsula"));
    }

    #[test]
    fn exact_phrases_survive_normalization() {
        assert!(is_match("new york", "New York City"));
        assert!(is_match("mount everest", "Mount Everest (highest peak)"));
    }

    #[test]
    fn character_similarity_catches_typos() {
        let decision = decide("recieve", "receive");
        assert!(matches!(decision, Decision::Similarity { matched: true, .. }));

        let decision = decide("abc", "xyz");
        assert!(matches!(
            decision,
            Decision::Similarity { matched: false, .. }
        ));
    }

    #[test]
    fn similarity_over_matches_repeated_characters() {
        // Counted per occurrence but not deduplicated, so anagram-like strings pass.
        assert!(is_match("silent", "listen"));
    }

    #[test]
    fn empty_inputs_never_match() {
        assert!(!is_match("", "Paris"));
        assert!(!is_match("?!", "Paris"));
        assert!(!is_match("   ", "an island"));
        assert!(!is_match("paris", "(nothing)"));
    }

    #[test]
    fn answers_that_normalize_to_nothing_match_exactly() {
        assert_eq!(normalize("an island"), "");
        assert_eq!(decide("what is an island", "an island"), Decision::Exact);
        assert!(is_match("The City", "the city"));
        assert!(is_match("what is a state?", "A State"));
        assert!(!is_match("what is paris", "an island"));
    }

    #[test]
    fn matching_is_intentionally_asymmetric() {
        // A short submission may name the key word of a longer answer...
        assert!(is_match("lincoln", "abe lincoln"));
        // ...but a longer submission is not accepted for a short answer unless it
        // is at least twice as long.
        assert!(!is_match("abe lincoln", "lincoln"));
    }
}
