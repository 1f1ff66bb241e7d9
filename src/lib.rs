/*!
This library decodes the output of an end-to-end aspect-based sentiment analysis (E2E-ABSA)
sequence classifier. The classifier gives one label per token, where each label tells both
whether the token belongs to an aspect term and the sentiment expressed toward that term. This
library turns the label ids back into typed aspect terms, aligns the gold annotations with the
words of the sentence and ranks the words by the confidence of the classifier.
# SCHEMAS
The current tagging schemas are supported:
* OT: `T-x` marks every token of an aspect term with sentiment `x`, without telling where the
    term starts or ends. Adjacent tokens with the same sentiment belong to the same term.
* BIO: `B-x` is the first token of a term and `I-x` a token inside of it.
* BIEOS: `B-x`, `I-x` and `E-x` are the first, inside and last tokens of a term, while `S-x` is a
    term made of a single token.

Every schema also has `O` (outside of any term) and `EQ` (equivocal token). The label ids are
fixed: `O` is `0`, `EQ` is `1`, then each polarity `POS`, `NEG` and `NEU` gets one id per prefix
of the schema, in this order. OT and BIO sequences are normalized into BIEOS before the terms are
extracted.

# Terminology
* A polarity is the sentiment attached to an aspect term: `POS`, `NEG` or `NEU`.
* A tag is a single label such as `B-POS` or `O`. It is made of a prefix and a polarity.
* A span is the inclusive token range `(begin, end)` of an aspect term, with its polarity.
* The internal positions are the positions of the classifier's inputs. They usually include a
    leading boundary token and can contain sub-words. An index map gives, for each word, the
    internal position of its prediction.
* A candidate is a word of the sentence with its best sentiment score.
*/

mod config;
mod convert;
mod decoder;
mod gold;
mod ranker;
mod reporter;
mod schemes;
mod span;

// The public api starts here
pub use schemes::{
    labels, labels_by_name, LabelVocab, ParsingError, Polarity, Prefix, Tag, TaggingSchema,
    UnknownLabelError, UnknownSchemaError, NON_SENTIMENT_MAX_ID,
};

pub use convert::{bio_to_ot, normalize, ot_to_bieos};

pub use span::{extract, SentimentSpan, SpanIter};

pub use gold::align;

pub use ranker::{argmax_labels, dedup_ranked, rank, RankedCandidate};

pub use reporter::{assemble, AspectWithSentiment, BatchResult, SentenceResult};

pub use decoder::{
    decode_batch, decode_sentence, DecodingError, ErrorPolicy, LengthMismatchError,
    ParsingErrorPolicyError, SentenceError, SentenceInput,
};

pub use config::{DecoderConfig, DecoderConfigBuilder, DefaultDecoderConfig};

/// Main entrypoint of the library. This function decodes every sentence of the batch and returns
/// their aspect terms, gold target words and ranked candidates, in input order. The returned
/// structure can be used to prettyprint the aspect terms. Instead of taking in the raw
/// parameters, this function takes a `DecoderConfig` struct and uses sensible defaults.
///
/// * `inputs`: Classifier outputs, one per sentence.
/// * `config`: Parameters used to decode the sentences.
///
/// #Example
/// ```rust
/// use rusabsa::{decode_batch_conf, DecoderConfigBuilder, SentenceInput, TaggingSchema};
///
/// // BIO ids: O=0, EQ=1, B-POS=2, I-POS=3, B-NEG=4, I-NEG=5, B-NEU=6, I-NEU=7
/// let inputs = vec![
///     SentenceInput::from_label_ids(["the", "sushi", "rolls", "were", "fresh"], vec![0, 2, 3, 0, 0]),
///     SentenceInput::from_label_ids(["slow", "service"], vec![0, 4]),
/// ];
/// let config = DecoderConfigBuilder::default().schema(TaggingSchema::BIO).build();
///
/// let batch = decode_batch_conf(&inputs, config).unwrap();
/// let expected_report = "Sentence, Aspect, Begin, End, Sentiment
/// 0, sushi rolls, 1, 2, POS
/// 1, service, 1, 1, NEG\n";
///
/// assert_eq!(expected_report, batch.to_string());
/// ```
pub fn decode_batch_conf<Schema, Policy>(
    inputs: &[SentenceInput],
    config: DecoderConfig<Schema, Policy>,
) -> Result<BatchResult, SentenceError>
where
    Schema: Into<TaggingSchema>,
    Policy: Into<ErrorPolicy>,
{
    let (schema, error_policy, parallel, rank_candidates) = config.into();
    decode_batch(inputs, schema, error_policy, parallel, rank_candidates)
}

/// Extracts the spans of a single sequence of label ids, with the schema given by its name. The
/// name is case-sensitive.
///
/// * `schema_name`: One of `OT`, `BIO` or `BIEOS`.
/// * `label_ids`: Label ids of the sequence, one per token.
///
/// #Example
/// ```rust
/// use rusabsa::{extract_spans_by_name, Polarity, SentimentSpan};
///
/// // OT ids: O=0, EQ=1, T-POS=2, T-NEG=3, T-NEU=4
/// let spans = extract_spans_by_name("OT", &[2, 2, 0]).unwrap();
/// assert_eq!(spans, vec![SentimentSpan::new(0, 1, Polarity::POS)]);
///
/// assert!(extract_spans_by_name("IOB2", &[0]).is_err());
/// ```
pub fn extract_spans_by_name(
    schema_name: &str,
    label_ids: &[usize],
) -> Result<Vec<SentimentSpan>, DecodingError> {
    let vocab = labels_by_name(schema_name)?;
    let tags = vocab.decode(label_ids)?;
    Ok(extract(&normalize(vocab.schema(), &tags)))
}
