/**
This module holds the tag vocabularies of the three tagging schemas (OT, BIO and BIEOS) and the
label-id tables shared with the sequence classifier.
*/
use ahash::AHashMap;
use enum_iterator::{all, Sequence};
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::Display;
use std::str::FromStr;
use std::sync::OnceLock;

/// Highest label id without any sentiment attached. In every schema, `O` is `0` and `EQ` is `1`.
pub const NON_SENTIMENT_MAX_ID: usize = 1;

#[allow(clippy::upper_case_acronyms)]
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Sequence, Serialize, Deserialize,
)]
/// Sentiment attached to an aspect term. The variant order is the order used to build the label
/// tables.
pub enum Polarity {
    POS,
    NEG,
    NEU,
}

impl Polarity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::POS => "POS",
            Self::NEG => "NEG",
            Self::NEU => "NEU",
        }
    }
}

impl Display for Polarity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Polarity {
    type Err = ParsingError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "POS" => Ok(Self::POS),
            "NEG" => Ok(Self::NEG),
            "NEU" => Ok(Self::NEU),
            _ => Err(ParsingError::PolarityError(String::from(s))),
        }
    }
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Sequence, Serialize, Deserialize,
)]
/// Position of a token inside an aspect term. `T` is only used by the OT schema, where it marks
/// any target token without telling where the term starts or ends.
pub enum Prefix {
    T,
    B,
    I,
    E,
    S,
}

impl Prefix {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::T => "T",
            Self::B => "B",
            Self::I => "I",
            Self::E => "E",
            Self::S => "S",
        }
    }
}

impl Display for Prefix {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Prefix {
    type Err = ParsingError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "T" => Ok(Self::T),
            "B" => Ok(Self::B),
            "I" => Ok(Self::I),
            "E" => Ok(Self::E),
            "S" => Ok(Self::S),
            _ => Err(ParsingError::PrefixError(String::from(s))),
        }
    }
}

#[allow(clippy::upper_case_acronyms)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
/// A single label of a tag sequence, such as `O`, `EQ`, `T-NEU` or `B-POS`.
pub enum Tag {
    /// Outside of any aspect term.
    O,
    /// Equivocal token, excluded from the sentiment scoring.
    EQ,
    /// Token of an aspect term.
    Sentiment(Prefix, Polarity),
}

impl Tag {
    /// Polarity of the tag. `O` and `EQ` carry none.
    #[inline]
    pub fn polarity(&self) -> Option<Polarity> {
        match self {
            Self::Sentiment(_, polarity) => Some(*polarity),
            _ => None,
        }
    }

    #[inline]
    pub fn prefix(&self) -> Option<Prefix> {
        match self {
            Self::Sentiment(prefix, _) => Some(*prefix),
            _ => None,
        }
    }

    /// Is this tag `O` or `EQ`?
    #[inline]
    pub fn is_sentiment_free(&self) -> bool {
        matches!(self, Self::O | Self::EQ)
    }
}

impl Display for Tag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::O => write!(f, "O"),
            Self::EQ => write!(f, "EQ"),
            Self::Sentiment(prefix, polarity) => write!(f, "{}-{}", prefix, polarity),
        }
    }
}

impl FromStr for Tag {
    type Err = ParsingError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "" => Err(ParsingError::EmptyTag),
            "O" => Ok(Self::O),
            "EQ" => Ok(Self::EQ),
            _ => {
                let (prefix, polarity) = s
                    .split_once('-')
                    .ok_or_else(|| ParsingError::PrefixError(String::from(s)))?;
                Ok(Self::Sentiment(prefix.parse()?, polarity.parse()?))
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
/// Could not parse a string into a `Tag`.
pub enum ParsingError {
    PrefixError(String),
    PolarityError(String),
    EmptyTag,
}

impl Display for ParsingError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::PrefixError(s) => write!(
                f,
                "Could not parse the following string into a Prefix: {}",
                s
            ),
            Self::PolarityError(s) => write!(
                f,
                "Could not parse the following string into a Polarity: {}",
                s
            ),
            Self::EmptyTag => write!(f, "Received an empty string/&str"),
        }
    }
}

impl Error for ParsingError {}

#[allow(clippy::upper_case_acronyms)]
#[derive(
    Debug, Clone, Copy, Sequence, Hash, Eq, PartialEq, Serialize, Deserialize, Default,
)]
/// Enumeration of the supported tagging schemas.
pub enum TaggingSchema {
    /// Target tokens only: `T-x`.
    OT,
    /// Begin and inside tokens: `B-x`, `I-x`.
    BIO,
    /// Begin, inside, end and singleton tokens: `B-x`, `I-x`, `E-x`, `S-x`.
    #[default]
    BIEOS,
}

impl TaggingSchema {
    const OT_PREFIXES: [Prefix; 1] = [Prefix::T];
    const BIO_PREFIXES: [Prefix; 2] = [Prefix::B, Prefix::I];
    const BIEOS_PREFIXES: [Prefix; 4] = [Prefix::B, Prefix::I, Prefix::E, Prefix::S];

    /// Prefixes allowed by the schema, in label-table order.
    pub fn prefixes(&self) -> &'static [Prefix] {
        match self {
            Self::OT => &Self::OT_PREFIXES,
            Self::BIO => &Self::BIO_PREFIXES,
            Self::BIEOS => &Self::BIEOS_PREFIXES,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::OT => "OT",
            Self::BIO => "BIO",
            Self::BIEOS => "BIEOS",
        }
    }
}

impl Display for TaggingSchema {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for TaggingSchema {
    type Err = UnknownSchemaError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "OT" => Ok(Self::OT),
            "BIO" => Ok(Self::BIO),
            "BIEOS" => Ok(Self::BIEOS),
            _ => Err(UnknownSchemaError(String::from(s))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
/// The schema name is not one of `OT`, `BIO` or `BIEOS`.
pub struct UnknownSchemaError(pub String);

impl Display for UnknownSchemaError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Invalid tagging schema {}. Expected one of OT, BIO or BIEOS",
            self.0
        )
    }
}

impl Error for UnknownSchemaError {}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
/// The label id does not belong to the vocabulary of the schema.
pub struct UnknownLabelError {
    pub id: usize,
    pub schema: TaggingSchema,
}

impl Display for UnknownLabelError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Label id {} is outside of the {} vocabulary",
            self.id, self.schema
        )
    }
}

impl Error for UnknownLabelError {}

#[derive(Debug, Clone)]
/// Bijection between the tags of a schema and their label ids. The ids are `0..len()`, with `O`
/// first, `EQ` second and then, for each polarity, one tag per prefix of the schema.
pub struct LabelVocab {
    schema: TaggingSchema,
    id_to_tag: Box<[Tag]>,
    tag_to_id: AHashMap<Tag, usize>,
}

impl LabelVocab {
    fn new(schema: TaggingSchema) -> Self {
        let prefixes = schema.prefixes();
        let mut id_to_tag = Vec::with_capacity(2 + 3 * prefixes.len());
        id_to_tag.push(Tag::O);
        id_to_tag.push(Tag::EQ);
        for polarity in all::<Polarity>() {
            for prefix in prefixes {
                id_to_tag.push(Tag::Sentiment(*prefix, polarity));
            }
        }
        let tag_to_id = id_to_tag
            .iter()
            .enumerate()
            .map(|(id, tag)| (*tag, id))
            .collect();
        Self {
            schema,
            id_to_tag: id_to_tag.into_boxed_slice(),
            tag_to_id,
        }
    }

    pub fn schema(&self) -> TaggingSchema {
        self.schema
    }

    pub fn len(&self) -> usize {
        self.id_to_tag.len()
    }

    pub fn is_empty(&self) -> bool {
        self.id_to_tag.is_empty()
    }

    pub fn tag(&self, id: usize) -> Option<Tag> {
        self.id_to_tag.get(id).copied()
    }

    pub fn id(&self, tag: &Tag) -> Option<usize> {
        self.tag_to_id.get(tag).copied()
    }

    /// Looks up the tag of `id`, failing if the id is not part of the vocabulary.
    pub fn try_tag(&self, id: usize) -> Result<Tag, UnknownLabelError> {
        self.tag(id).ok_or(UnknownLabelError {
            id,
            schema: self.schema,
        })
    }

    /// Converts a sequence of label ids into tags.
    pub fn decode(&self, ids: &[usize]) -> Result<Vec<Tag>, UnknownLabelError> {
        ids.iter().map(|id| self.try_tag(*id)).collect()
    }

    /// Iterates over the `(id, tag)` pairs, in id order.
    pub fn iter(&self) -> impl Iterator<Item = (usize, Tag)> + '_ {
        self.id_to_tag.iter().copied().enumerate()
    }
}

/// Returns the label table of `schema`. The tables are built once and shared by every caller.
pub fn labels(schema: TaggingSchema) -> &'static LabelVocab {
    static OT: OnceLock<LabelVocab> = OnceLock::new();
    static BIO: OnceLock<LabelVocab> = OnceLock::new();
    static BIEOS: OnceLock<LabelVocab> = OnceLock::new();
    let cell = match schema {
        TaggingSchema::OT => &OT,
        TaggingSchema::BIO => &BIO,
        TaggingSchema::BIEOS => &BIEOS,
    };
    cell.get_or_init(|| LabelVocab::new(schema))
}

/// Same as `labels`, but the schema is given by its name.
pub fn labels_by_name(name: &str) -> Result<&'static LabelVocab, UnknownSchemaError> {
    let schema = TaggingSchema::from_str(name)?;
    Ok(labels(schema))
}

#[cfg(test)]
mod test {
    use super::*;
    use quickcheck_macros::quickcheck as quickcheck_test;
    use rstest::rstest;

    impl quickcheck::Arbitrary for Polarity {
        fn arbitrary(g: &mut quickcheck::Gen) -> Self {
            let choices: Vec<Polarity> = all::<Polarity>().collect();
            *g.choose(&choices).unwrap()
        }
    }

    impl quickcheck::Arbitrary for Prefix {
        fn arbitrary(g: &mut quickcheck::Gen) -> Self {
            let choices: Vec<Prefix> = all::<Prefix>().collect();
            *g.choose(&choices).unwrap()
        }
    }

    impl quickcheck::Arbitrary for TaggingSchema {
        fn arbitrary(g: &mut quickcheck::Gen) -> Self {
            let choices: Vec<TaggingSchema> = all::<TaggingSchema>().collect();
            *g.choose(&choices).unwrap()
        }
    }

    impl quickcheck::Arbitrary for Tag {
        fn arbitrary(g: &mut quickcheck::Gen) -> Self {
            match u8::arbitrary(g) % 4 {
                0 => Tag::O,
                1 => Tag::EQ,
                _ => Tag::Sentiment(Prefix::arbitrary(g), Polarity::arbitrary(g)),
            }
        }
    }

    #[rstest]
    #[case(TaggingSchema::OT, 5)]
    #[case(TaggingSchema::BIO, 8)]
    #[case(TaggingSchema::BIEOS, 14)]
    fn test_vocab_len(#[case] schema: TaggingSchema, #[case] expected: usize) {
        assert_eq!(labels(schema).len(), expected);
    }

    #[test]
    fn test_bieos_table() {
        let expected = [
            "O", "EQ", "B-POS", "I-POS", "E-POS", "S-POS", "B-NEG", "I-NEG", "E-NEG", "S-NEG",
            "B-NEU", "I-NEU", "E-NEU", "S-NEU",
        ];
        let actual: Vec<String> = labels(TaggingSchema::BIEOS)
            .iter()
            .map(|(_, t)| t.to_string())
            .collect();
        assert_eq!(actual, expected);
    }

    #[test]
    fn test_bio_table() {
        let expected = [
            "O", "EQ", "B-POS", "I-POS", "B-NEG", "I-NEG", "B-NEU", "I-NEU",
        ];
        let actual: Vec<String> = labels(TaggingSchema::BIO)
            .iter()
            .map(|(_, t)| t.to_string())
            .collect();
        assert_eq!(actual, expected);
    }

    #[test]
    fn test_ot_table() {
        let vocab = labels(TaggingSchema::OT);
        assert_eq!(vocab.tag(0), Some(Tag::O));
        assert_eq!(vocab.tag(1), Some(Tag::EQ));
        assert_eq!(vocab.id(&"T-POS".parse().unwrap()), Some(2));
        assert_eq!(vocab.id(&"T-NEG".parse().unwrap()), Some(3));
        assert_eq!(vocab.id(&"T-NEU".parse().unwrap()), Some(4));
        assert_eq!(vocab.tag(5), None);
    }

    #[quickcheck_test]
    fn propertie_test_vocab_is_a_bijection(schema: TaggingSchema) -> bool {
        let vocab = labels(schema);
        vocab
            .iter()
            .all(|(id, tag)| vocab.id(&tag) == Some(id) && vocab.tag(id) == Some(tag))
    }

    #[quickcheck_test]
    fn propertie_test_sentiment_free_ids(schema: TaggingSchema) -> bool {
        labels(schema)
            .iter()
            .all(|(id, tag)| tag.is_sentiment_free() == (id <= NON_SENTIMENT_MAX_ID))
    }

    #[quickcheck_test]
    fn propertie_test_tag_display_parse(tag: Tag) -> bool {
        tag.to_string().parse::<Tag>() == Ok(tag)
    }

    #[rstest]
    #[case("OT", TaggingSchema::OT)]
    #[case("BIO", TaggingSchema::BIO)]
    #[case("BIEOS", TaggingSchema::BIEOS)]
    fn test_labels_by_name(#[case] name: &str, #[case] expected: TaggingSchema) {
        assert_eq!(labels_by_name(name).unwrap().schema(), expected);
    }

    #[rstest]
    #[case("IOB2")]
    #[case("bieos")]
    #[case("")]
    fn test_unknown_schema(#[case] name: &str) {
        let err = labels_by_name(name).unwrap_err();
        assert_eq!(err, UnknownSchemaError(String::from(name)));
    }

    #[test]
    fn test_try_tag_unknown_label() {
        let err = labels(TaggingSchema::BIO).try_tag(8).unwrap_err();
        assert_eq!(
            err,
            UnknownLabelError {
                id: 8,
                schema: TaggingSchema::BIO
            }
        );
    }

    #[rstest]
    #[case("")]
    #[case("X-POS")]
    #[case("B-FOO")]
    #[case("BPOS")]
    fn test_tag_parsing_error(#[case] s: &str) {
        assert!(s.parse::<Tag>().is_err());
    }
}
