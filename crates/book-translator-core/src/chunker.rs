//! Paragraph-boundary text chunking.
//!
//! Translation providers cap the size of a single request. Pages are split on
//! newlines into paragraphs and greedily packed into chunks no larger than the
//! limit. A paragraph is never split, so a single paragraph longer than the
//! limit becomes an oversized chunk of its own.
//!
//! Joining the chunks with `'\n'` reproduces the input exactly.

/// Split `text` into chunks of at most `max_chars` characters.
///
/// Sizes are measured in `char`s. Empty input yields no chunks.
pub fn split_into_chunks(text: &str, max_chars: usize) -> Vec<String> {
    if text.is_empty() {
        return Vec::new();
    }

    let mut chunks = Vec::new();
    let mut current: Option<(String, usize)> = None;

    for paragraph in text.split('\n') {
        let len = paragraph.chars().count();

        match current.as_mut() {
            // +1 for the newline that rejoins the paragraph
            Some((chunk, chunk_len)) if *chunk_len + len + 1 <= max_chars => {
                chunk.push('\n');
                chunk.push_str(paragraph);
                *chunk_len += len + 1;
            }
            Some(_) => {
                if let Some((chunk, _)) = current.take() {
                    chunks.push(chunk);
                }
                current = Some((paragraph.to_string(), len));
            }
            None => current = Some((paragraph.to_string(), len)),
        }
    }

    if let Some((chunk, _)) = current {
        chunks.push(chunk);
    }

    chunks
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_input() {
        assert!(split_into_chunks("", 10).is_empty());
    }

    #[test]
    fn test_short_text_single_chunk() {
        assert_eq!(split_into_chunks("Hello\nWorld", 4000), vec!["Hello\nWorld"]);
    }

    #[test]
    fn test_splits_on_paragraph_boundary() {
        // "aaaa\nbbbb" is 9 chars, limit 8 forces a split
        let chunks = split_into_chunks("aaaa\nbbbb\ncc", 8);
        assert_eq!(chunks, vec!["aaaa", "bbbb\ncc"]);
    }

    #[test]
    fn test_exact_fit() {
        let chunks = split_into_chunks("aaa\nbbbb", 8);
        assert_eq!(chunks, vec!["aaa\nbbbb"]);
    }

    #[test]
    fn test_oversized_paragraph_kept_whole() {
        let long = "x".repeat(25);
        let text = format!("ab\n{long}\ncd");
        let chunks = split_into_chunks(&text, 10);
        assert_eq!(chunks, vec!["ab".to_string(), long, "cd".to_string()]);
    }

    #[test]
    fn test_counts_chars_not_bytes() {
        // Each 'ş' is two bytes but one char
        let chunks = split_into_chunks("şşşş\nğğğ", 8);
        assert_eq!(chunks, vec!["şşşş\nğğğ"]);
    }

    #[test]
    fn test_join_reconstructs_input() {
        let samples = [
            "one",
            "\n\nleading blank lines",
            "trailing\n\n",
            "a\n\n\nb\n\nc",
            "para one is long enough\nshort\n\nanother paragraph here\nx",
            "\n",
        ];

        for max in [1, 3, 5, 10, 4000] {
            for text in samples {
                let chunks = split_into_chunks(text, max);
                assert_eq!(chunks.join("\n"), text, "max={max} text={text:?}");
            }
        }
    }

    #[test]
    fn test_no_chunk_exceeds_limit_unless_single_paragraph() {
        let text = "alpha beta\ngamma\ndelta epsilon zeta\neta\ntheta iota kappa lambda\nmu";
        let max = 12;

        for chunk in split_into_chunks(text, max) {
            let size = chunk.chars().count();
            assert!(
                size <= max || !chunk.contains('\n'),
                "chunk {chunk:?} is {size} chars and holds several paragraphs"
            );
        }
    }
}
