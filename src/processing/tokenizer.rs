//! Keyword extraction for the two derived documents.
//!
//! A record's title and tags are reduced to lower-cased atomic words. The content document
//! keeps the exact words; the search document additionally stores every prefix of 2 to 6
//! characters so "search-as-you-type" can be served with plain equality queries against an
//! array field. Capping the prefix length bounds the number of tokens a long word produces.
//!
//! Lengths are counted in characters, never bytes, so prefixes of non-ASCII words stay valid
//! UTF-8.

use std::collections::BTreeSet;

use super::sanitize::parse_tag_list;

/// Shortest prefix materialized for search.
pub const MIN_PREFIX_CHARS: usize = 2;
/// Longest prefix materialized for search.
pub const MAX_PREFIX_CHARS: usize = 6;

/// Exact-word and prefix token sets derived from one record.
///
/// Both sets are ordered ascending, so serializing them is deterministic.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KeywordSets {
    /// Whole normalized words.
    pub exact: BTreeSet<String>,
    /// Whole words plus their 2..=6 character prefixes.
    pub search: BTreeSet<String>,
}

/// Build both keyword sets from a title and an optional brace-wrapped tag list.
///
/// A malformed tag list contributes nothing; it is logged and the title words still count.
pub fn build_keyword_sets(title: &str, tags: Option<&str>) -> KeywordSets {
    let mut phrases: Vec<&str> = title.split_whitespace().collect();
    if let Some(raw) = tags {
        match parse_tag_list(raw) {
            Ok(entries) => phrases.extend(entries),
            Err(error) => tracing::warn!(error = %error, "Ignoring malformed tag list"),
        }
    }

    let mut sets = KeywordSets::default();
    for phrase in phrases {
        let lowered = phrase.to_lowercase();
        for word in lowered.split_whitespace() {
            sets.search.extend(search_tokens(word));
            sets.exact.insert(word.to_string());
        }
    }
    sets
}

/// Tokens a single word contributes to the search set: its prefixes and the word itself.
///
/// Words of three or more characters yield prefixes of length `2..=min(len - 1, 6)`; shorter
/// words yield only themselves.
pub fn search_tokens(word: &str) -> Vec<String> {
    let length = word.chars().count();
    let mut tokens = Vec::new();
    if length > MIN_PREFIX_CHARS {
        let longest = (length - 1).min(MAX_PREFIX_CHARS);
        for chars in MIN_PREFIX_CHARS..=longest {
            tokens.push(char_prefix(word, chars).to_string());
        }
    }
    tokens.push(word.to_string());
    tokens
}

fn char_prefix(word: &str, chars: usize) -> &str {
    match word.char_indices().nth(chars) {
        Some((end, _)) => &word[..end],
        None => word,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set(items: &[&str]) -> BTreeSet<String> {
        items.iter().map(|item| item.to_string()).collect()
    }

    #[test]
    fn title_and_tags_produce_both_sets() {
        let sets = build_keyword_sets("Intro to Algebra", Some("{algebra,geometry}"));

        assert_eq!(sets.exact, set(&["algebra", "geometry", "intro", "to"]));
        assert_eq!(
            sets.search,
            set(&[
                "al", "alg", "alge", "algeb", "algebr", "algebra", "ge", "geo", "geom", "geome",
                "geomet", "geometry", "in", "int", "intr", "intro", "to",
            ])
        );
    }

    #[test]
    fn long_words_stop_at_six_character_prefixes() {
        let tokens = search_tokens("geometry");
        assert_eq!(
            tokens,
            vec!["ge", "geo", "geom", "geome", "geomet", "geometry"]
        );
        assert!(!tokens.iter().any(|token| token == "geometr"));
    }

    #[test]
    fn short_words_contribute_only_themselves() {
        assert_eq!(search_tokens("a"), vec!["a"]);
        assert_eq!(search_tokens("to"), vec!["to"]);
        assert_eq!(search_tokens("sum"), vec!["su", "sum"]);
    }

    #[test]
    fn six_character_words_end_at_the_whole_word() {
        assert_eq!(
            search_tokens("vector"),
            vec!["ve", "vec", "vect", "vecto", "vector"]
        );
    }

    #[test]
    fn multi_word_tags_split_into_atomic_words() {
        let sets = build_keyword_sets("Matrices", Some("{Linear Algebra,matrices}"));
        assert_eq!(sets.exact, set(&["algebra", "linear", "matrices"]));
    }

    #[test]
    fn irregular_whitespace_never_yields_empty_tokens() {
        let sets = build_keyword_sets("  Vectors \t and  Spaces ", Some("{ maths ,}"));
        assert!(!sets.exact.contains(""));
        assert!(!sets.search.contains(""));
        assert_eq!(sets.exact, set(&["and", "maths", "spaces", "vectors"]));
    }

    #[test]
    fn malformed_tags_contribute_nothing() {
        let bare = build_keyword_sets("Vectors", None);
        for tags in ["", "{", "}", "vectors,maths", "{maths"] {
            assert_eq!(build_keyword_sets("Vectors", Some(tags)), bare, "{tags:?}");
        }
        assert_eq!(build_keyword_sets("Vectors", Some("{}")), bare);
    }

    #[test]
    fn prefixes_respect_character_boundaries() {
        assert_eq!(search_tokens("ÉCOLE"), vec!["ÉC", "ÉCO", "ÉCOL", "ÉCOLE"]);
        let sets = build_keyword_sets("Équations Différentielles", None);
        assert!(sets.exact.contains("équations"));
        assert!(sets.search.contains("éq"));
        assert!(sets.search.contains("différ"));
    }

    #[test]
    fn keyword_sets_are_deterministic() {
        let first = build_keyword_sets("Intro to Algebra", Some("{algebra,geometry}"));
        let second = build_keyword_sets("Intro to Algebra", Some("{algebra,geometry}"));
        assert_eq!(first, second);
        let ordered: Vec<_> = first.search.iter().cloned().collect();
        let mut sorted = ordered.clone();
        sorted.sort();
        assert_eq!(ordered, sorted);
    }
}
