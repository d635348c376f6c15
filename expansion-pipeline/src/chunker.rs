use common::{corpus::text_chunk::TextChunk, error::AppError};
use tracing::trace;

/// Chunk sizing knobs. "Tokens" are whitespace-separated words so chunking
/// stays offline and bit-for-bit reproducible across runs.
#[derive(Debug, Clone)]
pub struct ChunkerConfig {
    pub chunk_size: usize,
    pub overlap_fraction: f64,
    pub min_chunk_size: usize,
}

impl Default for ChunkerConfig {
    fn default() -> Self {
        Self {
            chunk_size: 512,
            overlap_fraction: 0.2,
            min_chunk_size: 100,
        }
    }
}

impl ChunkerConfig {
    pub fn validate(&self) -> Result<(), AppError> {
        if !(0.0..1.0).contains(&self.overlap_fraction) {
            return Err(AppError::InvalidConfig(format!(
                "overlap_fraction must be within [0, 1), got {}",
                self.overlap_fraction
            )));
        }
        if self.chunk_size <= self.min_chunk_size {
            return Err(AppError::InvalidConfig(format!(
                "chunk_size ({}) must exceed min_chunk_size ({})",
                self.chunk_size, self.min_chunk_size
            )));
        }
        Ok(())
    }

    fn overlap_target(&self) -> usize {
        (self.overlap_fraction * self.chunk_size as f64).round() as usize
    }
}

/// Collapses all whitespace runs to single spaces and trims the ends.
/// Chunk offsets refer to this normalized text.
pub fn normalize_document(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Splits a document into overlapping, sentence-aligned chunks.
///
/// Sentences are accumulated greedily until adding the next one would exceed
/// `chunk_size` tokens; the following chunk re-includes the tail of the
/// previous one until roughly `overlap_fraction * chunk_size` tokens are
/// covered. A sentence longer than `chunk_size` on its own becomes a chunk
/// by itself rather than being split mid-sentence. A trailing chunk below
/// `min_chunk_size` merges into its predecessor unless it is the only chunk.
pub fn chunk_document(text: &str, config: &ChunkerConfig) -> Result<Vec<TextChunk>, AppError> {
    config.validate()?;

    let normalized = normalize_document(text);
    if normalized.is_empty() {
        return Err(AppError::EmptyDocument(
            "document contains no text after whitespace normalization".into(),
        ));
    }

    let sentences = sentence_spans(&normalized);
    let sentence_tokens: Vec<usize> = sentences
        .iter()
        .map(|&(start, end)| normalized[start..end].split_whitespace().count())
        .collect();

    let groups = group_sentences(&sentence_tokens, config);

    let chunks = groups
        .into_iter()
        .enumerate()
        .map(|(chunk_index, (first, last))| {
            let span_start = sentences[first].0;
            let span_end = sentences[last].1;
            let body = normalized[span_start..span_end].trim_end().to_owned();
            TextChunk::new(body, span_start, span_end, chunk_index)
        })
        .collect::<Vec<_>>();

    trace!(
        sentence_count = sentences.len(),
        chunk_count = chunks.len(),
        "document chunked"
    );

    Ok(chunks)
}

/// Greedy accumulation over sentence token counts. Returns inclusive
/// sentence-index ranges per chunk.
fn group_sentences(sentence_tokens: &[usize], config: &ChunkerConfig) -> Vec<(usize, usize)> {
    let overlap_target = config.overlap_target();
    let mut groups: Vec<(usize, usize)> = Vec::new();

    let mut first = 0usize;
    let mut tokens_in = 0usize;
    let mut i = 0usize;

    while i < sentence_tokens.len() {
        let next = sentence_tokens[i];
        if tokens_in > 0 && tokens_in + next > config.chunk_size {
            groups.push((first, i - 1));

            // Walk back over the emitted chunk's tail for the overlap. The
            // walk never reaches the chunk's first sentence, so every chunk
            // starts strictly after its predecessor.
            let mut overlap_tokens = 0usize;
            let mut j = i;
            while j > first + 1 && overlap_tokens < overlap_target {
                overlap_tokens += sentence_tokens[j - 1];
                j -= 1;
            }

            // Shrink the overlap if it would crowd out the sentence that
            // forced the emit; otherwise the next group would be re-emitted
            // as a pure sub-span of this one and extend coverage by nothing.
            while j < i && overlap_tokens + next > config.chunk_size {
                overlap_tokens -= sentence_tokens[j];
                j += 1;
            }

            first = j;
            tokens_in = overlap_tokens;
        } else {
            tokens_in += next;
            i += 1;
        }
    }
    groups.push((first, sentence_tokens.len() - 1));

    // Fold an undersized trailing fragment into its predecessor.
    if groups.len() > 1 {
        let (last_first, last_last) = groups[groups.len() - 1];
        let tail_tokens: usize = sentence_tokens[last_first..=last_last].iter().sum();
        if tail_tokens < config.min_chunk_size {
            groups.pop();
            if let Some(prev) = groups.last_mut() {
                prev.1 = last_last;
            }
        }
    }

    groups
}

const ABBREVIATIONS: &[&str] = &[
    "mr", "mrs", "ms", "dr", "prof", "rev", "st", "no", "vs", "etc", "e.g", "i.e", "u.s", "jr",
    "sr",
];

/// Sentence boundary detection: a terminator (`.` `!` `?`) followed by a
/// space and an upper-case letter, digit, or opening quote starts a new
/// sentence, unless the word before a period is a known abbreviation or a
/// single initial. Spans partition the input: each span runs to the start of
/// the next, so the final span ends at `text.len()`.
fn sentence_spans(text: &str) -> Vec<(usize, usize)> {
    let chars: Vec<(usize, char)> = text.char_indices().collect();
    let mut spans = Vec::new();
    let mut start = 0usize;
    let mut i = 0usize;

    while i < chars.len() {
        let (pos, ch) = chars[i];
        if matches!(ch, '.' | '!' | '?') {
            let next_is_space = chars.get(i + 1).is_some_and(|&(_, c)| c == ' ');
            let opens_sentence = chars
                .get(i + 2)
                .is_some_and(|&(_, c)| is_sentence_opener(c));
            let guarded = ch == '.' && is_abbreviation(text, start, pos);
            if next_is_space && opens_sentence && !guarded {
                let next_start = chars[i + 2].0;
                spans.push((start, next_start));
                start = next_start;
                i += 2;
                continue;
            }
        }
        i += 1;
    }

    if start < text.len() {
        spans.push((start, text.len()));
    }

    spans
}

fn is_sentence_opener(c: char) -> bool {
    c.is_uppercase() || c.is_ascii_digit() || matches!(c, '"' | '\'' | '(' | '\u{201c}' | '\u{2018}')
}

fn is_abbreviation(text: &str, sentence_start: usize, period_pos: usize) -> bool {
    let prefix = &text[sentence_start..period_pos];
    let word = prefix.rsplit(' ').next().unwrap_or(prefix);
    let word = word.trim_start_matches(|c: char| !c.is_alphanumeric());

    let mut chars = word.chars();
    if let (Some(only), None) = (chars.next(), chars.next()) {
        if only.is_alphabetic() {
            // Single initial, e.g. the "E" in "W. E. B. Du Bois".
            return true;
        }
    }

    ABBREVIATIONS.contains(&word.to_ascii_lowercase().as_str())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spans_text(text: &str) -> Vec<String> {
        let normalized = normalize_document(text);
        sentence_spans(&normalized)
            .into_iter()
            .map(|(s, e)| normalized[s..e].trim_end().to_owned())
            .collect()
    }

    fn uniform_document(sentence_count: usize) -> String {
        // Four tokens per sentence.
        (0..sentence_count)
            .map(|i| format!("The drum speaks {i}."))
            .collect::<Vec<_>>()
            .join(" ")
    }

    fn overlap_tokens(normalized: &str, prev: &TextChunk, next: &TextChunk) -> usize {
        assert!(next.start_char <= prev.end_char, "chunks must overlap or touch");
        normalized[next.start_char..prev.end_char]
            .split_whitespace()
            .count()
    }

    #[test]
    fn splits_on_terminators_with_abbreviation_guard() {
        let sentences = spans_text("Dr. Karenga founded the holiday in 1966. It spans seven days.");
        assert_eq!(
            sentences,
            vec![
                "Dr. Karenga founded the holiday in 1966.",
                "It spans seven days."
            ]
        );
    }

    #[test]
    fn single_initials_do_not_break_sentences() {
        let sentences = spans_text("W. E. B. Du Bois wrote widely. His archive is digitized.");
        assert_eq!(sentences.len(), 2);
        assert!(sentences[0].starts_with("W. E. B."));
    }

    #[test]
    fn question_and_exclamation_terminate_sentences() {
        let sentences = spans_text("Habari gani? Umoja! The greeting repeats daily.");
        assert_eq!(sentences.len(), 3);
    }

    #[test]
    fn lowercase_continuation_is_not_a_boundary() {
        let sentences = spans_text("The kinara holds seven candles. e.g. three red ones.");
        // "e.g." opens with lowercase, so no split before it; the guard also
        // keeps "e.g." itself from splitting.
        assert_eq!(sentences.len(), 1);
    }

    #[test]
    fn empty_document_is_rejected() {
        let err = chunk_document("   \n\t  ", &ChunkerConfig::default())
            .expect_err("whitespace-only input");
        assert!(matches!(err, AppError::EmptyDocument(_)));
    }

    #[test]
    fn invalid_overlap_fraction_is_rejected() {
        let config = ChunkerConfig {
            overlap_fraction: 1.0,
            ..ChunkerConfig::default()
        };
        let err = chunk_document("Some text.", &config).expect_err("overlap out of range");
        assert!(matches!(err, AppError::InvalidConfig(_)));
    }

    #[test]
    fn chunk_size_must_exceed_min_chunk_size() {
        let config = ChunkerConfig {
            chunk_size: 100,
            min_chunk_size: 100,
            ..ChunkerConfig::default()
        };
        let err = chunk_document("Some text.", &config).expect_err("degenerate sizes");
        assert!(matches!(err, AppError::InvalidConfig(_)));
    }

    #[test]
    fn chunking_is_deterministic() {
        let document = uniform_document(60);
        let config = ChunkerConfig {
            chunk_size: 40,
            overlap_fraction: 0.2,
            min_chunk_size: 8,
        };
        let first = chunk_document(&document, &config).expect("chunks");
        let second = chunk_document(&document, &config).expect("chunks");
        assert_eq!(first, second);
        let hashes: Vec<_> = first.iter().map(|c| c.content_hash.clone()).collect();
        let hashes_again: Vec<_> = second.iter().map(|c| c.content_hash.clone()).collect();
        assert_eq!(hashes, hashes_again);
    }

    #[test]
    fn chunk_spans_cover_the_normalized_document() {
        let document = uniform_document(75);
        let normalized = normalize_document(&document);
        let config = ChunkerConfig {
            chunk_size: 50,
            overlap_fraction: 0.2,
            min_chunk_size: 8,
        };
        let chunks = chunk_document(&document, &config).expect("chunks");

        assert_eq!(chunks[0].start_char, 0);
        assert_eq!(chunks.last().expect("non-empty").end_char, normalized.len());
        for pair in chunks.windows(2) {
            assert!(
                pair[1].start_char <= pair[0].end_char,
                "no gap between consecutive chunk spans"
            );
            assert!(pair[1].start_char > pair[0].start_char, "strict forward progress");
        }
        for (index, chunk) in chunks.iter().enumerate() {
            assert_eq!(chunk.chunk_index, index);
            assert_eq!(chunk.text, normalized[chunk.start_char..chunk.end_char].trim_end());
        }
    }

    #[test]
    fn consecutive_chunks_overlap_near_target() {
        // 75 sentences of 4 tokens = 300 tokens; chunk_size 50 with 20%
        // overlap means roughly 10 shared tokens per seam.
        let document = uniform_document(75);
        let normalized = normalize_document(&document);
        let config = ChunkerConfig {
            chunk_size: 50,
            overlap_fraction: 0.2,
            min_chunk_size: 8,
        };
        let chunks = chunk_document(&document, &config).expect("chunks");
        assert!(chunks.len() > 2);

        for pair in chunks.windows(2) {
            let shared = overlap_tokens(&normalized, &pair[0], &pair[1]);
            assert!(shared >= 10, "at least the overlap target, got {shared}");
            assert!(shared <= 14, "overshoot bounded by one sentence, got {shared}");
        }
    }

    #[test]
    fn overlap_shrinks_rather_than_emitting_a_contained_chunk() {
        // Token counts 5, 5, 9 against chunk_size 10: a one-sentence overlap
        // leaves no room for the long third sentence, so the overlap is
        // dropped instead of re-emitting the middle sentence on its own.
        let document = "One two three four five. \
                        Six seven eight nine ten. \
                        Alpha beta gamma delta epsilon zeta eta theta iota.";
        let config = ChunkerConfig {
            chunk_size: 10,
            overlap_fraction: 0.2,
            min_chunk_size: 2,
        };
        let chunks = chunk_document(document, &config).expect("chunks");

        assert_eq!(chunks.len(), 2);
        assert!(chunks[1].text.starts_with("Alpha"));
        for pair in chunks.windows(2) {
            assert!(
                pair[1].end_char > pair[0].end_char,
                "every chunk must extend coverage past its predecessor"
            );
        }
    }

    #[test]
    fn oversized_sentence_becomes_its_own_chunk() {
        let long_sentence = format!("The elders recited {} without pausing.", "names ".repeat(600));
        let document = format!("A short opener sits here. {long_sentence} A short closer follows.");
        let config = ChunkerConfig {
            chunk_size: 512,
            overlap_fraction: 0.2,
            min_chunk_size: 2,
        };
        let chunks = chunk_document(&document, &config).expect("chunks");

        let oversized = chunks
            .iter()
            .find(|c| c.token_count() > 512)
            .expect("oversized sentence kept whole");
        assert!(oversized.text.starts_with("The elders recited"));
        assert!(oversized.text.ends_with("without pausing."));
    }

    #[test]
    fn single_oversized_sentence_document_yields_one_chunk() {
        let document = format!("Words {} end.", "repeat ".repeat(600));
        let chunks =
            chunk_document(&document, &ChunkerConfig::default()).expect("single chunk, no error");
        assert_eq!(chunks.len(), 1);
        assert!(chunks[0].token_count() > 512);
    }

    #[test]
    fn trailing_fragment_merges_into_previous_chunk() {
        // Three 8-token sentences and a 4-token tail; the tail cannot join
        // the previous chunk greedily (8 + 4 > 10) and alone it sits below
        // min_chunk_size, so it folds back into the last chunk.
        let document = "One two three four five six seven eight. \
                        Alpha beta gamma delta epsilon zeta eta theta. \
                        Ichi ni san shi go roku nana hachi. \
                        Tail end here now.";
        let config = ChunkerConfig {
            chunk_size: 10,
            overlap_fraction: 0.0,
            min_chunk_size: 5,
        };
        let chunks = chunk_document(document, &config).expect("chunks");
        assert_eq!(chunks.len(), 3);
        let last = chunks.last().expect("non-empty");
        assert!(last.text.ends_with("Tail end here now."));
        assert!(last.text.starts_with("Ichi"));
    }

    #[test]
    fn short_document_is_a_single_chunk_even_below_minimum() {
        let chunks = chunk_document("Habari gani.", &ChunkerConfig::default()).expect("chunks");
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].chunk_index, 0);
    }

    #[test]
    fn zero_overlap_still_covers_the_document() {
        let document = uniform_document(30);
        let normalized = normalize_document(&document);
        let config = ChunkerConfig {
            chunk_size: 20,
            overlap_fraction: 0.0,
            min_chunk_size: 4,
        };
        let chunks = chunk_document(&document, &config).expect("chunks");
        assert!(chunks.len() > 1);
        for pair in chunks.windows(2) {
            assert_eq!(
                pair[1].start_char, pair[0].end_char,
                "adjacent spans touch exactly when overlap is disabled"
            );
        }
        assert_eq!(chunks.last().expect("non-empty").end_char, normalized.len());
    }
}
