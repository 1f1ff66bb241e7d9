/**
This module decodes the classifier output of whole sentences: the label ids are mapped to tags,
normalized into the BIEOS schema, and the spans are extracted and bound to the words of the
sentence. Batches of sentences can be decoded sequentially or in parallel.
*/
use crate::convert::normalize;
use crate::gold::align;
use crate::ranker::{argmax_labels, rank};
use crate::reporter::{assemble, BatchResult, SentenceResult};
use crate::schemes::{labels, TaggingSchema, UnknownLabelError, UnknownSchemaError};
use crate::span::extract;
use itertools::Itertools;
use ndarray::Array2;
use ndarray_stats::errors::MinMaxError;
use rayon::prelude::*;
use std::borrow::Cow;
use std::error::Error;
use std::fmt::{self, Display};
use std::str::FromStr;
use tracing::{debug, info, warn};

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
/// Error type to represent when the tokens of a sentence and another sequence (the tags, the rows
/// of the score matrix) do not line up.
pub struct LengthMismatchError {
    /// Name of the sequence compared with the tokens.
    which: &'static str,
    /// Number of elements needed by the tokens.
    required: usize,
    /// Number of elements actually found.
    found: usize,
}

impl LengthMismatchError {
    pub fn new(which: &'static str, required: usize, found: usize) -> Self {
        LengthMismatchError {
            which,
            required,
            found,
        }
    }
}

impl Display for LengthMismatchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Inconsistent length between the tokens and the {}. The tokens require {} elements, the {} has {}",
            self.which, self.required, self.which, self.found
        )
    }
}
impl Error for LengthMismatchError {}

#[derive(Debug, Clone, PartialEq)]
/// Enum error encompassing every failure that can happen when decoding a sentence.
pub enum DecodingError {
    UnknownSchema(UnknownSchemaError),
    LengthMismatch(LengthMismatchError),
    UnknownLabel(UnknownLabelError),
    /// The best class of a score row is undefined. This happens with NaN scores or empty rows.
    InvalidScores(MinMaxError),
}

impl Display for DecodingError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnknownSchema(schema_err) => std::fmt::Display::fmt(schema_err, f),
            Self::LengthMismatch(length_err) => std::fmt::Display::fmt(length_err, f),
            Self::UnknownLabel(label_err) => std::fmt::Display::fmt(label_err, f),
            Self::InvalidScores(scores_err) => {
                write!(f, "Could not decode the score matrix: {}", scores_err)
            }
        }
    }
}
impl Error for DecodingError {}

impl From<UnknownSchemaError> for DecodingError {
    fn from(value: UnknownSchemaError) -> Self {
        Self::UnknownSchema(value)
    }
}
impl From<LengthMismatchError> for DecodingError {
    fn from(value: LengthMismatchError) -> Self {
        Self::LengthMismatch(value)
    }
}
impl From<UnknownLabelError> for DecodingError {
    fn from(value: UnknownLabelError) -> Self {
        Self::UnknownLabel(value)
    }
}
impl From<MinMaxError> for DecodingError {
    fn from(value: MinMaxError) -> Self {
        Self::InvalidScores(value)
    }
}

#[derive(Debug, Clone, PartialEq)]
/// A decoding error, with the id of the sentence that raised it.
pub struct SentenceError {
    pub sent_id: usize,
    pub error: DecodingError,
}

impl Display for SentenceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Could not decode sentence {}: {}", self.sent_id, self.error)
    }
}
impl Error for SentenceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        Some(&self.error)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
/// What to do with a sentence that cannot be decoded.
pub enum ErrorPolicy {
    /// Stops the batch and returns the error of the first failing sentence, in input order.
    #[default]
    Abort,
    /// Logs the error, leaves the sentence out of the results and keeps going.
    Skip,
}

#[derive(Debug)]
pub struct ParsingErrorPolicyError<S: fmt::Debug + Display>(S);

impl<S: fmt::Debug + Display> Display for ParsingErrorPolicyError<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Could not parse the {} into an `ErrorPolicy`", self.0)
    }
}
impl<S: fmt::Debug + Display> Error for ParsingErrorPolicyError<S> {}

impl FromStr for ErrorPolicy {
    type Err = ParsingErrorPolicyError<String>;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_ref() {
            "abort" | "fail" => Ok(ErrorPolicy::Abort),
            "skip" => Ok(ErrorPolicy::Skip),
            _ => Err(ParsingErrorPolicyError(String::from(s))),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
/// Classifier output of a single sentence.
///
/// The predictions are read over the *internal* positions of the classifier, which usually differ
/// from the positions of the words (boundary tokens, sub-words). The index map gives, for every
/// word, the internal position holding its prediction. Without an index map, label ids are read
/// one per word, while scores skip their leading boundary row (see `from_scores`).
pub struct SentenceInput {
    tokens: Vec<String>,
    label_ids: Option<Vec<usize>>,
    scores: Option<Array2<f32>>,
    index_map: Option<Vec<usize>>,
    gold_ids: Option<Vec<usize>>,
}

impl SentenceInput {
    /// Input whose tags are given by their predicted label ids.
    pub fn from_label_ids<I, S>(tokens: I, label_ids: Vec<usize>) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        SentenceInput {
            tokens: tokens.into_iter().map(Into::into).collect(),
            label_ids: Some(label_ids),
            scores: None,
            index_map: None,
            gold_ids: None,
        }
    }

    /// Input whose tags are the best class of every row of `scores`. The same scores are used to
    /// rank the candidates.
    ///
    /// The first row of `scores` is the leading boundary token, as `rank` expects: the default
    /// index map reads the word at position `j` from row `j + 1`. Use `with_index_map` for any
    /// other layout.
    pub fn from_scores<I, S>(tokens: I, scores: Array2<f32>) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let tokens: Vec<String> = tokens.into_iter().map(Into::into).collect();
        let index_map = (1..=tokens.len()).collect();
        SentenceInput {
            tokens,
            label_ids: None,
            scores: Some(scores),
            index_map: Some(index_map),
            gold_ids: None,
        }
    }

    pub fn with_index_map(mut self, index_map: Vec<usize>) -> Self {
        self.index_map = Some(index_map);
        self
    }

    /// Raw scores used to rank the candidates. When the input was built with `from_label_ids`,
    /// they are not used to decode the tags.
    pub fn with_scores(mut self, scores: Array2<f32>) -> Self {
        self.scores = Some(scores);
        self
    }

    /// Gold label ids, over the internal positions.
    pub fn with_gold(mut self, gold_ids: Vec<usize>) -> Self {
        self.gold_ids = Some(gold_ids);
        self
    }

    pub fn tokens(&self) -> &[String] {
        &self.tokens
    }

    /// Label ids over the internal positions, decoded from the scores if needed.
    fn internal_ids(&self) -> Result<Cow<'_, [usize]>, MinMaxError> {
        match (&self.label_ids, &self.scores) {
            (Some(ids), _) => Ok(Cow::Borrowed(ids.as_slice())),
            (None, Some(scores)) => Ok(Cow::Owned(argmax_labels(scores.view())?)),
            (None, None) => Ok(Cow::Owned(Vec::new())),
        }
    }
}

/// Gathers the label id of every word through the index map.
fn gather<'a>(
    ids: &'a [usize],
    index_map: Option<&[usize]>,
) -> Result<Cow<'a, [usize]>, LengthMismatchError> {
    match index_map {
        None => Ok(Cow::Borrowed(ids)),
        Some(map) => map
            .iter()
            .map(|i| {
                ids.get(*i)
                    .copied()
                    .ok_or_else(|| LengthMismatchError::new("predicted tag sequence", i + 1, ids.len()))
            })
            .collect::<Result<Vec<_>, _>>()
            .map(Cow::Owned),
    }
}

/// Decodes a single sentence: its aspect terms with their sentiment, its gold target words and,
/// if `rank_candidates` is true and the input carries scores, its ranked candidates.
///
/// * `input`: Classifier output of the sentence.
/// * `sent_id`: Position of the sentence in its batch.
/// * `schema`: Tagging schema of the label ids.
/// * `rank_candidates`: Should the words be ranked by their scores?
pub fn decode_sentence(
    input: &SentenceInput,
    sent_id: usize,
    schema: TaggingSchema,
    rank_candidates: bool,
) -> Result<SentenceResult, DecodingError> {
    let tokens = input.tokens();
    let internal_ids = input.internal_ids()?;
    let ids = gather(&internal_ids, input.index_map.as_deref())?;
    if ids.len() != tokens.len() {
        return Err(LengthMismatchError::new("predicted tag sequence", tokens.len(), ids.len()).into());
    }
    let tags = labels(schema).decode(&ids)?;
    let spans = extract(&normalize(schema, &tags));
    let gold_targets = align(input.gold_ids.as_deref(), tokens);
    let candidates = match &input.scores {
        Some(scores) if rank_candidates => rank(tokens, scores.view())?,
        _ => Vec::new(),
    };
    let result = assemble(sent_id, tokens, &spans, gold_targets, candidates);
    debug!(
        sent_id,
        %schema,
        "Input: {}, output: {}",
        tokens.join(" "),
        result.aspects().iter().join("\t")
    );
    Ok(result)
}

/// Decodes a batch of sentences. The results are in input order and every result carries the
/// position of its sentence in `inputs` as its `sent_id`.
///
/// * `inputs`: Classifier outputs, one per sentence.
/// * `schema`: Tagging schema of the label ids.
/// * `error_policy`: What to do with the sentences that cannot be decoded.
/// * `parallel`: Can we decode the sentences on multiple cores?
/// * `rank_candidates`: Should the words be ranked by their scores?
pub fn decode_batch(
    inputs: &[SentenceInput],
    schema: TaggingSchema,
    error_policy: ErrorPolicy,
    parallel: bool,
    rank_candidates: bool,
) -> Result<BatchResult, SentenceError> {
    let decode_one = |(sent_id, input): (usize, &SentenceInput)| {
        decode_sentence(input, sent_id, schema, rank_candidates)
            .map_err(|error| SentenceError { sent_id, error })
    };
    let outcomes: Vec<Result<SentenceResult, SentenceError>> = if parallel {
        inputs.par_iter().enumerate().map(decode_one).collect()
    } else {
        inputs.iter().enumerate().map(decode_one).collect()
    };
    let batch = outcomes.into_iter().try_fold(
        BatchResult::with_capacity(inputs.len()),
        |mut batch, outcome| {
            match outcome {
                Ok(result) => batch.push(result),
                Err(err) => match error_policy {
                    ErrorPolicy::Abort => return Err(err),
                    ErrorPolicy::Skip => {
                        warn!(sent_id = err.sent_id, "Skipping sentence: {}", err.error);
                        batch.skip(err.sent_id)
                    }
                },
            };
            Ok(batch)
        },
    )?;
    info!(
        sentences = inputs.len(),
        decoded = batch.len(),
        skipped = batch.skipped().len(),
        %schema,
        "Decoded batch"
    );
    Ok(batch)
}
