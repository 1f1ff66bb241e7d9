/*
 * This modules contains some quality of life structs and alias. Most importantly, it contains the
 * `DecoderConfig` struct, which implements the default trait. This config can be passed to the
 * `decode_batch_conf` function to simplify the arguments of `decode_batch`.
*/
use crate::decoder::ErrorPolicy;
use crate::schemes::{TaggingSchema, UnknownSchemaError};
use either::Either as LeftOrRight;
use std::fmt::{Debug, Display};

/// Reasonable default configuration when decoding the sentences.
pub type DefaultDecoderConfig = DecoderConfig<TaggingSchema, ErrorPolicy>;

impl DefaultDecoderConfig {
    pub fn new() -> Self {
        Self::default()
    }
    pub fn schema(&self) -> TaggingSchema {
        self.schema
    }
    pub fn error_policy(&self) -> ErrorPolicy {
        self.error_policy
    }
    pub fn parallel(&self) -> bool {
        self.parallel
    }
    pub fn rank_candidates(&self) -> bool {
        self.rank_candidates
    }
}

impl<Schema, Policy> From<(Schema, Policy, bool, bool)> for DecoderConfig<Schema, Policy>
where
    Schema: Into<TaggingSchema>,
    Policy: Into<ErrorPolicy>,
{
    fn from(value: (Schema, Policy, bool, bool)) -> Self {
        Self {
            schema: value.0,
            error_policy: value.1,
            parallel: value.2,
            rank_candidates: value.3,
        }
    }
}

impl<Schema, Policy> From<DecoderConfigBuilder<Schema, Policy>> for DefaultDecoderConfig
where
    Schema: Into<TaggingSchema>,
    Policy: Into<ErrorPolicy>,
{
    fn from(value: DecoderConfigBuilder<Schema, Policy>) -> Self {
        Self {
            schema: value.schema.either_into(),
            error_policy: value.error_policy.either_into(),
            parallel: value.parallel,
            rank_candidates: value.rank_candidates,
        }
    }
}

impl<Schema, Policy> From<DecoderConfig<Schema, Policy>> for (TaggingSchema, ErrorPolicy, bool, bool)
where
    Schema: Into<TaggingSchema>,
    Policy: Into<ErrorPolicy>,
{
    fn from(value: DecoderConfig<Schema, Policy>) -> Self {
        (
            value.schema.into(),
            value.error_policy.into(),
            value.parallel,
            value.rank_candidates,
        )
    }
}

#[derive(Clone, Debug, Eq, PartialEq, Hash)]
/// Config struct used to simplify the inputs of parameters to the batch decoding. It implements
/// the default trait.
pub struct DecoderConfig<Schema, Policy>
where
    Schema: Into<TaggingSchema>,
    Policy: Into<ErrorPolicy>,
{
    /// Tagging schema of the label ids produced by the classifier. Defaults to BIEOS.
    schema: Schema,
    /// What to do with a sentence that cannot be decoded. By default, the whole batch fails on
    /// the first error.
    error_policy: Policy,
    /// Can we use multiple cores to decode the sentences? Sentences are independent and the
    /// results keep the input order either way.
    parallel: bool,
    /// Should the words of the sentences be ranked by their scores? Sentences without scores are
    /// never ranked.
    rank_candidates: bool,
}

impl Default for DefaultDecoderConfig {
    fn default() -> Self {
        Self {
            schema: TaggingSchema::BIEOS,
            error_policy: ErrorPolicy::Abort,
            parallel: false,
            rank_candidates: true,
        }
    }
}

impl<Schema, Policy> Display for DecoderConfig<Schema, Policy>
where
    Schema: Into<TaggingSchema> + Debug,
    Policy: Into<ErrorPolicy> + Debug,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let string = format!("Tagging schema: {:?}\n Policy when a sentence cannot be decoded: {:?}\n Using parallel computations: {}\n Ranking the candidates: {}", self.schema, self.error_policy, self.parallel, self.rank_candidates);
        write!(f, "{}", string)
    }
}

/// This builder can be used to build and customize a `DecoderConfig` stucture.
pub struct DecoderConfigBuilder<Schema, Policy>
where
    Schema: Into<TaggingSchema>,
    Policy: Into<ErrorPolicy>,
{
    schema: LeftOrRight<Schema, TaggingSchema>,
    error_policy: LeftOrRight<Policy, ErrorPolicy>,
    parallel: bool,
    rank_candidates: bool,
}

impl Default for DecoderConfigBuilder<TaggingSchema, ErrorPolicy> {
    fn default() -> Self {
        Self::new()
    }
}

impl<Schema, Policy> DecoderConfigBuilder<Schema, Policy>
where
    Schema: Into<TaggingSchema>,
    Policy: Into<ErrorPolicy>,
{
    pub fn schema(mut self, schema: Schema) -> Self {
        self.schema = LeftOrRight::Left(schema);
        self
    }
    /// Sets the schema from its name. The name is case-sensitive.
    pub fn schema_name(mut self, name: &str) -> Result<Self, UnknownSchemaError> {
        self.schema = LeftOrRight::Right(name.parse()?);
        Ok(self)
    }
    pub fn error_policy(mut self, error_policy: Policy) -> Self {
        self.error_policy = LeftOrRight::Left(error_policy);
        self
    }
    pub fn parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }
    pub fn rank_candidates(mut self, rank_candidates: bool) -> Self {
        self.rank_candidates = rank_candidates;
        self
    }
    pub fn new() -> Self {
        Self {
            schema: LeftOrRight::Right(TaggingSchema::BIEOS),
            error_policy: LeftOrRight::Right(ErrorPolicy::Abort),
            parallel: false,
            rank_candidates: true,
        }
    }
    pub fn build(self) -> DefaultDecoderConfig {
        DecoderConfig::from(self)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(TaggingSchema::OT)]
    #[case(TaggingSchema::BIO)]
    #[case(TaggingSchema::BIEOS)]
    fn test_builder_setters_schema(#[case] schema: TaggingSchema) {
        let builder = DecoderConfigBuilder::default();
        let config = builder.schema(schema).build();
        assert_eq!(config.schema, schema)
    }

    #[rstest]
    #[case("OT", TaggingSchema::OT)]
    #[case("BIO", TaggingSchema::BIO)]
    #[case("BIEOS", TaggingSchema::BIEOS)]
    fn test_builder_setters_schema_name(#[case] name: &str, #[case] expected: TaggingSchema) {
        let builder = DecoderConfigBuilder::default();
        let config = builder.schema_name(name).unwrap().build();
        assert_eq!(config.schema, expected)
    }

    #[test]
    fn test_builder_unknown_schema_name() {
        let builder = DecoderConfigBuilder::default();
        let err = builder.schema_name("IOB2").err().unwrap();
        assert_eq!(err, UnknownSchemaError(String::from("IOB2")))
    }

    #[rstest]
    #[case(ErrorPolicy::Abort)]
    #[case(ErrorPolicy::Skip)]
    fn test_builder_setters_error_policy(#[case] policy: ErrorPolicy) {
        let builder = DecoderConfigBuilder::default();
        let config = builder.error_policy(policy).build();
        assert_eq!(config.error_policy, policy)
    }

    #[rstest]
    #[case(true)]
    #[case(false)]
    fn test_builder_setters_parallel(#[case] parallel: bool) {
        let builder = DecoderConfigBuilder::default();
        let config = builder.parallel(parallel).build();
        assert_eq!(config.parallel, parallel)
    }

    #[rstest]
    #[case(true)]
    #[case(false)]
    fn test_builder_setters_rank_candidates(#[case] rank_candidates: bool) {
        let builder = DecoderConfigBuilder::default();
        let config = builder.rank_candidates(rank_candidates).build();
        assert_eq!(config.rank_candidates, rank_candidates)
    }

    #[test]
    fn test_builder_default_is_config_default() {
        assert_eq!(DecoderConfigBuilder::default().build(), DefaultDecoderConfig::default());
    }

    #[test]
    fn test_config_into_tuple() {
        let config = DecoderConfig::from((TaggingSchema::OT, ErrorPolicy::Skip, true, false));
        let (schema, policy, parallel, rank): (TaggingSchema, ErrorPolicy, bool, bool) =
            config.into();
        assert_eq!(schema, TaggingSchema::OT);
        assert_eq!(policy, ErrorPolicy::Skip);
        assert!(parallel);
        assert!(!rank);
    }

    #[test]
    fn test_display() {
        let config = DefaultDecoderConfig::default();
        let expected = "Tagging schema: BIEOS\n Policy when a sentence cannot be decoded: Abort\n Using parallel computations: false\n Ranking the candidates: true";
        assert_eq!(config.to_string(), expected)
    }
}
