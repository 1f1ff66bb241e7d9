/**
This module walks a BIEOS tag sequence and extracts the aspect-term spans, each with its
polarity. The extraction never fails: malformed sequences are decoded with a fixed set of
tolerant transitions.
*/
use crate::schemes::{Polarity, Prefix, Tag};
use serde::{Deserialize, Serialize};
use std::fmt::Display;
use std::iter::Enumerate;
use std::slice::Iter;

/// A span is the token range of one aspect term. Both `begin` and `end` are inclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SentimentSpan {
    pub begin: usize,
    pub end: usize,
    pub polarity: Polarity,
}

impl SentimentSpan {
    pub fn new(begin: usize, end: usize, polarity: Polarity) -> Self {
        SentimentSpan {
            begin,
            end,
            polarity,
        }
    }

    pub fn is_singleton(&self) -> bool {
        self.begin == self.end
    }
}

impl Display for SentimentSpan {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}, {}, {})", self.begin, self.end, self.polarity)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
/// State of the span transducer.
enum DecoderState {
    Outside,
    InSpan { begin: usize, polarity: Polarity },
}

/// Iterates over a *single* BIEOS sequence and returns its spans, from left to right. Transitions
/// for the current tag at index `i`:
///
/// | tag | `Outside` | `InSpan(b, y)` |
/// |---|---|---|
/// | `S-x` | emit `(i, i, x)` | emit `(b, i-1, y)` and `(i, i, x)` |
/// | `B-x` | open `(i, x)` | emit `(b, i-1, y)`, open `(i, x)` |
/// | `I-x` | open `(i, x)` | stay, keeping `y` |
/// | `E-x` | emit `(i, i, x)` | emit `(b, i, x)` |
/// | `O`, `EQ` | stay | emit `(b, i-1, y)` |
///
/// A span still open at the end of the sequence is flushed up to the last token. A `T-x` tag is
/// read as `I-x`; the OT schema must be normalized beforehand to be decoded correctly.
pub struct SpanIter<'a> {
    tags: Enumerate<Iter<'a, Tag>>,
    state: DecoderState,
    /// A single step can close a span and emit a singleton. The singleton waits here.
    pending: Option<SentimentSpan>,
    len: usize,
}

impl<'a> SpanIter<'a> {
    pub fn new(tags: &'a [Tag]) -> Self {
        SpanIter {
            tags: tags.iter().enumerate(),
            state: DecoderState::Outside,
            pending: None,
            len: tags.len(),
        }
    }

    /// Closes the open span, if any, with `end` as its last token.
    fn close(&mut self, end: usize) -> Option<SentimentSpan> {
        match std::mem::replace(&mut self.state, DecoderState::Outside) {
            DecoderState::InSpan { begin, polarity } => {
                Some(SentimentSpan::new(begin, end, polarity))
            }
            DecoderState::Outside => None,
        }
    }

    /// Applies the transition of `tag` at index `i`. Returns the first span emitted by the step;
    /// a second one is kept in `pending`.
    fn step(&mut self, i: usize, tag: &Tag) -> Option<SentimentSpan> {
        let (prefix, polarity) = match tag {
            Tag::O | Tag::EQ => return self.close(i.wrapping_sub(1)),
            Tag::Sentiment(prefix, polarity) => (*prefix, *polarity),
        };
        match (self.state, prefix) {
            (_, Prefix::S) => {
                let singleton = SentimentSpan::new(i, i, polarity);
                match self.close(i.wrapping_sub(1)) {
                    Some(closed) => {
                        self.pending = Some(singleton);
                        Some(closed)
                    }
                    None => Some(singleton),
                }
            }
            (_, Prefix::B) => {
                let closed = self.close(i.wrapping_sub(1));
                self.state = DecoderState::InSpan { begin: i, polarity };
                closed
            }
            (DecoderState::InSpan { .. }, Prefix::I | Prefix::T) => None,
            (DecoderState::Outside, Prefix::I | Prefix::T) => {
                self.state = DecoderState::InSpan { begin: i, polarity };
                None
            }
            (DecoderState::InSpan { begin, .. }, Prefix::E) => {
                self.state = DecoderState::Outside;
                Some(SentimentSpan::new(begin, i, polarity))
            }
            (DecoderState::Outside, Prefix::E) => Some(SentimentSpan::new(i, i, polarity)),
        }
    }
}

impl<'a> Iterator for SpanIter<'a> {
    type Item = SentimentSpan;
    fn next(&mut self) -> Option<Self::Item> {
        if let Some(span) = self.pending.take() {
            return Some(span);
        }
        loop {
            match self.tags.next() {
                Some((i, tag)) => {
                    if let Some(span) = self.step(i, tag) {
                        return Some(span);
                    }
                }
                // End of the sequence: flush the open span, if any.
                None => return self.close(self.len.wrapping_sub(1)),
            }
        }
    }
}

/// Extracts the spans of a BIEOS sequence.
pub fn extract(tags: &[Tag]) -> Vec<SentimentSpan> {
    SpanIter::new(tags).collect()
}
