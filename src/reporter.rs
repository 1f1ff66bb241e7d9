/**
This modules holds the results of the decoding, for a single sentence and for a batch of
sentences. A batch can be prettyprinted as a dataframe.
*/
use crate::ranker::RankedCandidate;
use crate::schemes::Polarity;
use crate::span::SentimentSpan;
use serde::{Deserialize, Serialize};
use std::fmt::Display;
use std::slice::Iter;

/// An aspect term found in the sentence, with its sentiment.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AspectWithSentiment {
    /// The word at the start of the span.
    pub aspect: String,
    /// Every word of the span, separated by a single space.
    pub phrase: String,
    /// First and last (inclusive) token indices of the span.
    pub indices: (usize, usize),
    pub sentiment: Polarity,
}

impl AspectWithSentiment {
    /// Binds a span to the words of its sentence. Panics if the span is out of bounds.
    pub(crate) fn from_span<S: AsRef<str>>(span: &SentimentSpan, tokens: &[S]) -> Self {
        let words = &tokens[span.begin..=span.end];
        AspectWithSentiment {
            aspect: String::from(words[0].as_ref()),
            phrase: words.iter().map(|w| w.as_ref()).collect::<Vec<_>>().join(" "),
            indices: (span.begin, span.end),
            sentiment: span.polarity,
        }
    }
}

impl Display for AspectWithSentiment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.phrase, self.sentiment)
    }
}

/// Everything found in a single sentence. It is built once by `assemble` and never mutated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SentenceResult {
    /// Position of the sentence in the input batch.
    sent_id: usize,
    aspects: Vec<AspectWithSentiment>,
    /// Target words of the gold labels. Empty when the sentence is unlabeled.
    gold_targets: Vec<String>,
    /// Words ranked by descending confidence, without duplicates.
    candidates: Vec<RankedCandidate>,
}

impl SentenceResult {
    pub fn sent_id(&self) -> usize {
        self.sent_id
    }
    pub fn aspects(&self) -> &[AspectWithSentiment] {
        &self.aspects
    }
    pub fn gold_targets(&self) -> &[String] {
        &self.gold_targets
    }
    pub fn candidates(&self) -> &[RankedCandidate] {
        &self.candidates
    }
}

/// Composes the result of a sentence from its spans, gold target words and ranked candidates.
///
/// * `sent_id`: Position of the sentence in its batch.
/// * `tokens`: Words of the sentence. Every span must be in bounds.
/// * `spans`: Extracted spans.
/// * `gold_targets`: Aligned gold words.
/// * `candidates`: Ranked candidates.
///
/// # Panics
///
/// Panics if a span ends past the last token. The spans extracted from a tag sequence of the same
/// length as `tokens` are always in bounds.
pub fn assemble<S: AsRef<str>>(
    sent_id: usize,
    tokens: &[S],
    spans: &[SentimentSpan],
    gold_targets: Vec<String>,
    candidates: Vec<RankedCandidate>,
) -> SentenceResult {
    SentenceResult {
        sent_id,
        aspects: spans
            .iter()
            .map(|s| AspectWithSentiment::from_span(s, tokens))
            .collect(),
        gold_targets,
        candidates,
    }
}

/// Results of a batch, in input order. When sentences are skipped (see `ErrorPolicy::Skip`),
/// their ids are listed in `skipped` and every kept result still carries its input `sent_id`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct BatchResult {
    results: Vec<SentenceResult>,
    skipped: Vec<usize>,
}

impl BatchResult {
    pub(crate) fn with_capacity(capacity: usize) -> Self {
        BatchResult {
            results: Vec::with_capacity(capacity),
            skipped: Vec::new(),
        }
    }

    pub(crate) fn push(&mut self, result: SentenceResult) {
        self.results.push(result)
    }

    pub(crate) fn skip(&mut self, sent_id: usize) {
        self.skipped.push(sent_id)
    }

    pub fn len(&self) -> usize {
        self.results.len()
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&SentenceResult> {
        self.results.get(index)
    }

    pub fn iter(&self) -> Iter<'_, SentenceResult> {
        self.results.iter()
    }

    /// Ids of the sentences that could not be decoded.
    pub fn skipped(&self) -> &[usize] {
        &self.skipped
    }

    /// Aspect terms of every sentence.
    pub fn aspects(&self) -> Vec<&[AspectWithSentiment]> {
        self.iter().map(|r| r.aspects()).collect()
    }

    /// Gold target words of every sentence.
    pub fn gold_targets(&self) -> Vec<&[String]> {
        self.iter().map(|r| r.gold_targets()).collect()
    }

    /// Ranked candidates of every sentence.
    pub fn unique_predictions(&self) -> Vec<&[RankedCandidate]> {
        self.iter().map(|r| r.candidates()).collect()
    }
}

impl IntoIterator for BatchResult {
    type Item = SentenceResult;
    type IntoIter = std::vec::IntoIter<SentenceResult>;
    fn into_iter(self) -> Self::IntoIter {
        self.results.into_iter()
    }
}

impl<'a> IntoIterator for &'a BatchResult {
    type Item = &'a SentenceResult;
    type IntoIter = Iter<'a, SentenceResult>;
    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// The BatchResult acts as a dataframe when displayed, with one line per aspect term.
impl Display for BatchResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Sentence, Aspect, Begin, End, Sentiment")?;
        for result in self.results.iter() {
            for aspect in result.aspects.iter() {
                writeln!(
                    f,
                    "{}, {}, {}, {}, {}",
                    result.sent_id, aspect.phrase, aspect.indices.0, aspect.indices.1, aspect.sentiment
                )?
            }
        }
        Ok(())
    }
}
