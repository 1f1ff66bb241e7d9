/**
This module ranks the words of a sentence by the confidence of the classifier. It is a second,
confidence-driven view over the raw scores, independent of the hard decoding of the tags.
*/
use crate::decoder::LengthMismatchError;
use ahash::AHashSet;
use itertools::Itertools;
use ndarray::{s, ArrayView2, Axis};
use ndarray_stats::{errors::MinMaxError, QuantileExt};
use num::Float;
use serde::{Deserialize, Serialize};
use std::fmt::Display;

/// Number of leading score columns without sentiment (`O` and `EQ`).
const NON_SENTIMENT_CLASSES: usize = 2;

/// A candidate aspect term and its confidence. The confidence is always stored as an `f32`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankedCandidate {
    pub term: String,
    pub score: f32,
}

impl RankedCandidate {
    pub fn new<S: Into<String>>(term: S, score: f32) -> Self {
        RankedCandidate {
            term: term.into(),
            score,
        }
    }
}

impl Display for RankedCandidate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}, {})", self.term, self.score)
    }
}

/// Ranks the words of a sentence by their best sentiment score.
///
/// The first row of `scores` holds the leading boundary token and the first two columns hold the
/// `O` and `EQ` classes: the word at position `j` is scored with the maximum of row `j + 1` over the
/// sentiment columns, for `j` in `0..tokens.len() - 1`. The words are sorted by descending score
/// and only the best occurrence of each word is kept.
///
/// The scores are narrowed to `f32` before sorting, whatever `F` is. Scores of a wider type that
/// round to the same `f32` are ties, and ties keep the order of the words in the sentence.
///
/// * `tokens`: Words of the sentence.
/// * `scores`: Raw classifier output, with one row per internal position and one column per class.
pub fn rank<F: Float, S: AsRef<str>>(
    tokens: &[S],
    scores: ArrayView2<F>,
) -> Result<Vec<RankedCandidate>, LengthMismatchError> {
    if scores.nrows() < tokens.len() {
        return Err(LengthMismatchError::new(
            "score matrix",
            tokens.len(),
            scores.nrows(),
        ));
    }
    if tokens.len() < 2 || scores.ncols() <= NON_SENTIMENT_CLASSES {
        return Ok(Vec::new());
    }
    let best_scores = scores
        .slice(s![1..tokens.len(), NON_SENTIMENT_CLASSES..])
        .map_axis(Axis(1), |row| {
            // Float::max ignores NaN, so the maximum is never NaN
            row.fold(F::neg_infinity(), |acc, x| acc.max(*x))
        });
    let pairs = tokens
        .iter()
        .zip(best_scores.iter())
        .map(|(t, s)| (t.as_ref(), s.to_f32().unwrap_or(f32::NEG_INFINITY)));
    Ok(dedup_ranked(pairs))
}

/// Sorts the `(term, score)` pairs by descending score and keeps the best scoring occurrence of
/// each term. The sort is stable: pairs with equal scores keep their original order.
pub fn dedup_ranked<S, I>(pairs: I) -> Vec<RankedCandidate>
where
    S: AsRef<str>,
    I: IntoIterator<Item = (S, f32)>,
{
    let sorted = pairs
        .into_iter()
        .sorted_by(|a, b| b.1.total_cmp(&a.1))
        .collect::<Vec<_>>();
    let mut seen: AHashSet<&str> = AHashSet::with_capacity(sorted.len());
    sorted
        .iter()
        .filter(|(term, _)| seen.insert(term.as_ref()))
        .map(|(term, score)| RankedCandidate::new(term.as_ref(), *score))
        .collect()
}

/// Decodes the predicted label ids from the raw scores by taking the best class of every row.
/// Fails if a row is empty or contains NaN.
pub fn argmax_labels<F: Float>(scores: ArrayView2<F>) -> Result<Vec<usize>, MinMaxError> {
    scores.outer_iter().map(|row| row.argmax()).collect()
}

#[cfg(test)]
mod test {
    use super::*;
    use ndarray::{array, Array2};
    use quickcheck_macros::quickcheck as quickcheck_test;

    fn candidates(raw: &[(&str, f32)]) -> Vec<RankedCandidate> {
        raw.iter()
            .map(|(t, s)| RankedCandidate::new(*t, *s))
            .collect()
    }

    #[test]
    fn test_dedup_keeps_best_occurrence() {
        let actual = dedup_ranked(vec![("good", 0.9), ("food", 0.4), ("good", 0.7)]);
        assert_eq!(actual, candidates(&[("good", 0.9), ("food", 0.4)]));
    }

    #[test]
    fn test_dedup_best_occurrence_comes_later() {
        let actual = dedup_ranked(vec![("good", 0.2), ("food", 0.4), ("good", 0.7)]);
        assert_eq!(actual, candidates(&[("good", 0.7), ("food", 0.4)]));
    }

    #[test]
    fn test_dedup_is_stable_on_ties() {
        let actual = dedup_ranked(vec![("b", 0.5), ("a", 0.5), ("c", 0.5)]);
        assert_eq!(actual, candidates(&[("b", 0.5), ("a", 0.5), ("c", 0.5)]));
    }

    #[test]
    fn test_rank() {
        let tokens = ["the", "pizza", "was", "pizza"];
        // Rows: boundary token then one row per word. Columns: O, EQ, then sentiment classes.
        let scores = array![
            [0.9, 0.0, 0.1, 0.0],
            [0.8, 0.0, 0.1, 0.1],
            [0.1, 0.0, 0.2, 0.7],
            [0.6, 0.1, 0.3, 0.0],
            [0.0, 0.0, 0.9, 0.1],
        ];
        let actual = rank(&tokens, scores.view()).unwrap();
        // "the" is scored with row 1, "pizza" with row 2, "was" with row 3
        let expected = candidates(&[("pizza", 0.7), ("was", 0.3), ("the", 0.1)]);
        assert_eq!(actual, expected);
    }

    #[test]
    fn test_rank_ignores_non_sentiment_columns() {
        let tokens = ["a", "b"];
        let scores = array![[0.0, 0.0, 0.0], [1.0, 1.0, 0.25]];
        let actual = rank(&tokens, scores.view()).unwrap();
        assert_eq!(actual, candidates(&[("a", 0.25)]));
    }

    #[test]
    fn test_rank_too_few_rows() {
        let tokens = ["a", "b", "c"];
        let scores = Array2::<f32>::zeros((2, 5));
        let err = rank(&tokens, scores.view()).unwrap_err();
        assert_eq!(err, LengthMismatchError::new("score matrix", 3, 2));
    }

    #[test]
    fn test_rank_degenerate_inputs() {
        let scores = Array2::<f64>::zeros((4, 2));
        assert!(rank(&["a", "b", "c"], scores.view()).unwrap().is_empty());
        let scores = Array2::<f64>::zeros((4, 5));
        assert!(rank(&["a"], scores.view()).unwrap().is_empty());
        let empty: [&str; 0] = [];
        assert!(rank(&empty, scores.view()).unwrap().is_empty());
    }

    #[test]
    fn test_rank_narrows_wide_scores() {
        let tokens = ["first", "second", "third"];
        // The two sentiment scores differ in f64 but not in f32
        let scores = array![
            [0.0, 0.0, 0.0],
            [0.0, 0.0, 0.5],
            [0.0, 0.0, 0.5 + 1e-12],
        ];
        let actual = rank(&tokens, scores.view()).unwrap();
        assert_eq!(actual, candidates(&[("first", 0.5), ("second", 0.5)]));
    }

    #[test]
    fn test_argmax_labels() {
        let scores = array![[0.9, 0.1, 0.0], [0.1, 0.2, 0.7], [0.0, 0.6, 0.4]];
        assert_eq!(argmax_labels(scores.view()).unwrap(), vec![0, 2, 1]);
    }

    #[test]
    fn test_argmax_labels_nan() {
        let scores = array![[0.9, f64::NAN, 0.0]];
        assert!(argmax_labels(scores.view()).is_err());
    }

    #[quickcheck_test]
    fn propertie_test_dedup_is_deterministic_and_sorted(pairs: Vec<(String, f32)>) -> bool {
        let first = dedup_ranked(pairs.clone());
        let second = dedup_ranked(pairs);
        let unique = first.iter().map(|c| &c.term).collect::<AHashSet<_>>().len() == first.len();
        let sorted = first
            .windows(2)
            .all(|w| w[0].score.total_cmp(&w[1].score).is_ge());
        first.len() == second.len()
            && first
                .iter()
                .zip(second.iter())
                .all(|(a, b)| a.term == b.term && a.score.to_bits() == b.score.to_bits())
            && unique
            && sorted
    }
}
