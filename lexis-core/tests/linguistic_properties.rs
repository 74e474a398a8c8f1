//! Property tests for the linguistic stages
//!
//! The stages must be total over arbitrary input: tokens rebuild the text,
//! sentences partition the tokens, every token gets a tag, and entities
//! never overlap or cross a sentence boundary.

use lexis_core::splitter::covers_all_tokens;
use lexis_core::{EntityRecognizer, SentenceSplitter, Tagger, Tokenizer};
use proptest::prelude::*;

/// Sentence-like text built from words, numbers, punctuation and spacing
fn texty() -> impl Strategy<Value = String> {
    let piece = prop_oneof![
        "[A-Za-z]{1,10}",
        "[A-Z][a-z]{1,8}",
        "[0-9]{1,4}",
        Just("Dr.".to_string()),
        Just("U.S.A.".to_string()),
        Just("don't".to_string()),
        Just("$5".to_string()),
        Just("3:30".to_string()),
        Just("Friday".to_string()),
        Just("New York".to_string()),
        Just("https://example.com/a".to_string()),
        Just("x@y.org".to_string()),
        "[.!?,;:\"'()…—-]",
        "[ \t\n]{1,3}",
        "\\PC{1,3}",
    ];
    prop::collection::vec(piece, 0..40).prop_map(|parts| parts.join(" "))
}

proptest! {
    #[test]
    fn tokens_rebuild_the_text(text in texty()) {
        let tokens = Tokenizer::new().tokenize(&text);
        prop_assert_eq!(Tokenizer::reconstruct(&text, &tokens), Some(text.clone()));
        for pair in tokens.windows(2) {
            prop_assert!(pair[0].span.end <= pair[1].span.start);
        }
        for token in &tokens {
            prop_assert_eq!(&text[token.span.start..token.span.end], token.text.as_str());
        }
    }

    #[test]
    fn sentences_partition_tokens(text in texty()) {
        let tokens = Tokenizer::new().tokenize(&text);
        let sentences = SentenceSplitter::default().split(&text, &tokens);
        prop_assert!(covers_all_tokens(&sentences, &tokens));
        prop_assert_eq!(sentences.is_empty(), tokens.is_empty());
        for pair in sentences.windows(2) {
            prop_assert!(pair[0].paragraph <= pair[1].paragraph);
        }
    }

    #[test]
    fn every_token_is_tagged(text in texty()) {
        let tokens = Tokenizer::new().tokenize(&text);
        let sentences = SentenceSplitter::default().split(&text, &tokens);
        let tags = Tagger::default().tag_all(&sentences, &tokens).unwrap();
        let tagged: usize = tags.iter().map(|t| t.len()).sum();
        prop_assert_eq!(tagged, tokens.len());
        prop_assert_eq!(Tagger::default().tag_tokens(&tokens).len(), tokens.len());
    }

    #[test]
    fn entities_are_disjoint_and_sentence_bound(text in texty()) {
        let tokens = Tokenizer::new().tokenize(&text);
        let sentences = SentenceSplitter::default().split(&text, &tokens);
        let tags = Tagger::default().tag_all(&sentences, &tokens).unwrap();
        let entities = EntityRecognizer::default()
            .recognize_all(&text, &sentences, &tokens, &tags)
            .unwrap();

        for pair in entities.windows(2) {
            prop_assert!(pair[0].span.end <= pair[1].span.start);
        }
        for entity in &entities {
            prop_assert!((0.0..=1.0).contains(&entity.confidence));
            prop_assert_eq!(&text[entity.span.start..entity.span.end], entity.text.as_str());
            prop_assert!(sentences.iter().any(|s|
                s.tokens.start <= entity.tokens.start && entity.tokens.end <= s.tokens.end
            ));
        }
    }

    #[test]
    fn stages_are_deterministic(text in texty()) {
        let first = Tokenizer::new().tokenize(&text);
        let second = Tokenizer::new().tokenize(&text);
        prop_assert_eq!(&first, &second);
        let sentences = SentenceSplitter::default().split(&text, &first);
        let a = Tagger::default().tag_all(&sentences, &first).unwrap();
        let b = Tagger::default().tag_all(&sentences, &second).unwrap();
        prop_assert_eq!(a, b);
    }
}
