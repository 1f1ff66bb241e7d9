/**
Extraction of the gold target words, used to compare the predictions with the annotations.
*/
use crate::schemes::NON_SENTIMENT_MAX_ID;

/// Returns the words tagged as targets in the gold labels. The gold label at internal position `i`
/// selects the token at position `i - 1`: position `0` holds the leading boundary token added by
/// the tokenizer, so only positions `1..tokens.len()` are read. The alignment only compares the
/// ids against `NON_SENTIMENT_MAX_ID` and does not depend on the schema.
///
/// Missing gold labels (unlabeled data) give an empty list.
///
/// * `gold_ids`: Gold label ids, indexed by internal position.
/// * `tokens`: Words of the sentence.
pub fn align<S: AsRef<str>>(gold_ids: Option<&[usize]>, tokens: &[S]) -> Vec<String> {
    let gold_ids = match gold_ids {
        Some(ids) => ids,
        None => return Vec::new(),
    };
    gold_ids
        .iter()
        .enumerate()
        .take(tokens.len())
        .skip(1)
        .filter(|(_, id)| **id > NON_SENTIMENT_MAX_ID)
        .map(|(i, _)| String::from(tokens[i - 1].as_ref()))
        .collect()
}

#[cfg(test)]
mod test {
    use super::*;
    use rstest::rstest;

    #[test]
    fn test_align_selects_previous_token() {
        let tokens = ["a", "b", "c", "d"];
        let actual = align(Some(&[0, 0, 5, 0][..]), &tokens);
        assert_eq!(actual, vec![String::from("b")]);
    }

    #[test]
    fn test_align_without_gold() {
        let tokens = ["great", "food"];
        assert!(align(None, &tokens).is_empty());
    }

    #[rstest]
    // O and EQ are never selected
    #[case(&[1, 1, 1, 0], &[])]
    // The first position is the boundary token
    #[case(&[9, 0, 0, 0], &[])]
    // Positions past the sentence are padding
    #[case(&[0, 0, 0, 0, 7, 7], &[])]
    #[case(&[0, 2, 3, 13], &["a", "b", "c"])]
    // Shorter gold sequences are read as far as they go
    #[case(&[0, 4], &["a"])]
    fn test_align(#[case] gold: &[usize], #[case] expected: &[&str]) {
        let tokens = ["a", "b", "c", "d"];
        assert_eq!(align(Some(gold), &tokens), expected);
    }
}
