/**
Conversions between the tagging schemas. Every supported schema is normalized into the BIEOS
schema before the spans are extracted.
*/
use crate::schemes::{Prefix, Tag, TaggingSchema};

/// Normalizes a tag sequence written in `schema` into its BIEOS form. The output has the same
/// length as the input. No validation is made on the well-formedness of the input: a malformed
/// sequence is rewritten structurally, never rejected.
///
/// * `schema`: Schema in which `tags` is written.
/// * `tags`: The tag sequence of a single sentence.
pub fn normalize(schema: TaggingSchema, tags: &[Tag]) -> Vec<Tag> {
    match schema {
        TaggingSchema::BIEOS => tags.to_vec(),
        TaggingSchema::OT => ot_to_bieos(tags),
        TaggingSchema::BIO => ot_to_bieos(&bio_to_ot(tags)),
    }
}

/// Collapses the `B-x` and `I-x` tags into `T-x`. `O` and `EQ` are left untouched.
pub fn bio_to_ot(tags: &[Tag]) -> Vec<Tag> {
    tags.iter()
        .map(|tag| match tag {
            Tag::Sentiment(_, polarity) => Tag::Sentiment(Prefix::T, *polarity),
            other => *other,
        })
        .collect()
}

/// Rewrites every target tag `T-x` using its neighbours. A neighbour belongs to the same term when
/// it carries the same polarity `x`:
///
/// | previous same | next same | output |
/// |---|---|---|
/// | no  | no  | `S-x` |
/// | no  | yes | `B-x` |
/// | yes | no  | `E-x` |
/// | yes | yes | `I-x` |
///
/// Any sentiment tag is read as `T-x`, whatever its prefix.
pub fn ot_to_bieos(tags: &[Tag]) -> Vec<Tag> {
    let polarity_at = |i: Option<usize>| i.and_then(|i| tags.get(i)).and_then(Tag::polarity);
    tags.iter()
        .enumerate()
        .map(|(i, tag)| match tag.polarity() {
            None => *tag,
            Some(polarity) => {
                let prev_same = polarity_at(i.checked_sub(1)) == Some(polarity);
                let next_same = polarity_at(Some(i + 1)) == Some(polarity);
                Tag::Sentiment(bieos_prefix(prev_same, next_same), polarity)
            }
        })
        .collect()
}

#[inline]
fn bieos_prefix(prev_same: bool, next_same: bool) -> Prefix {
    match (prev_same, next_same) {
        (false, false) => Prefix::S,
        (false, true) => Prefix::B,
        (true, false) => Prefix::E,
        (true, true) => Prefix::I,
    }
}
