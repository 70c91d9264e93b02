//! Vector Index — per-pass TF-IDF vectorization and cosine similarity.
//!
//! SCOPE: turns raw text into sparse numeric vectors and scores their
//! similarity. The vocabulary is rebuilt from the corpus slice handed to
//! each analysis pass (the user's topic keyword sets plus the incoming
//! message), never from global fitted state, so it cannot drift as
//! messages accumulate.
//!
//! Weighting: tf = raw term count within the document,
//! idf = ln((1 + N) / (1 + df)) + 1 (smoothed), vectors L2-normalized.

use std::collections::{HashMap, HashSet};
use std::sync::OnceLock;

use rayon::prelude::*;
use regex::Regex;

use crate::constants::{MIN_TOKEN_CHARS, STOP_WORDS};

/// Sparse L2-normalized TF-IDF vector: term index → weight.
#[derive(Debug, Clone, Default)]
pub struct FeatureVector {
    weights: HashMap<usize, f64>,
}

impl FeatureVector {
    /// True when no recognized token survived stop-word removal. A zero
    /// vector fails similarity against everything by definition.
    pub fn is_zero(&self) -> bool {
        self.weights.is_empty()
    }
}

/// Cosine similarity in [0, 1]. Vectors are L2-normalized at fit time,
/// so the dot product suffices. Two all-zero vectors score 0.0.
pub fn cosine_similarity(a: &FeatureVector, b: &FeatureVector) -> f64 {
    if a.is_zero() || b.is_zero() {
        return 0.0;
    }
    let (small, large) = if a.weights.len() <= b.weights.len() {
        (a, b)
    } else {
        (b, a)
    };
    let dot: f64 = small
        .weights
        .iter()
        .filter_map(|(idx, w)| large.weights.get(idx).map(|v| w * v))
        .sum();
    dot.clamp(0.0, 1.0)
}

/// A corpus fitted in one pass: vocabulary, document frequencies, and one
/// vector per input document (same order).
#[derive(Debug)]
pub struct Corpus {
    vocab: HashMap<String, usize>,
    vectors: Vec<FeatureVector>,
}

impl Corpus {
    /// Tokenize and vectorize every document. Vocabulary is first-seen
    /// order over this slice only.
    pub fn fit(documents: &[String]) -> Self {
        let tokenized: Vec<Vec<String>> =
            documents.par_iter().map(|d| tokenize(d)).collect();

        let mut vocab: HashMap<String, usize> = HashMap::new();
        for tokens in &tokenized {
            for t in tokens {
                if !vocab.contains_key(t) {
                    let idx = vocab.len();
                    vocab.insert(t.clone(), idx);
                }
            }
        }

        let mut df = vec![0usize; vocab.len()];
        for tokens in &tokenized {
            let distinct: HashSet<&String> = tokens.iter().collect();
            for t in distinct {
                df[vocab[t]] += 1;
            }
        }

        let n = documents.len() as f64;
        let idf: Vec<f64> = df
            .iter()
            .map(|d| ((1.0 + n) / (1.0 + *d as f64)).ln() + 1.0)
            .collect();

        let vectors = tokenized
            .iter()
            .map(|tokens| {
                let mut tf: HashMap<usize, f64> = HashMap::new();
                for t in tokens {
                    *tf.entry(vocab[t]).or_insert(0.0) += 1.0;
                }
                let mut weights: HashMap<usize, f64> =
                    tf.into_iter().map(|(idx, c)| (idx, c * idf[idx])).collect();
                let norm: f64 = weights.values().map(|w| w * w).sum::<f64>().sqrt();
                if norm > 0.0 {
                    for w in weights.values_mut() {
                        *w /= norm;
                    }
                }
                FeatureVector { weights }
            })
            .collect();

        Self { vocab, vectors }
    }

    /// One vector per fitted document, input order.
    pub fn vectors(&self) -> &[FeatureVector] {
        &self.vectors
    }

    pub fn vocab_len(&self) -> usize {
        self.vocab.len()
    }
}

/// Top `k` terms by summed TF-IDF weight across the given texts (each text
/// one document), ties broken by lexical order.
pub fn top_keywords(texts: &[String], k: usize) -> Vec<String> {
    if texts.is_empty() || k == 0 {
        return Vec::new();
    }
    let corpus = Corpus::fit(texts);

    let mut scores: HashMap<usize, f64> = HashMap::new();
    for vector in corpus.vectors() {
        for (idx, w) in &vector.weights {
            *scores.entry(*idx).or_insert(0.0) += w;
        }
    }

    let mut term_of: Vec<&str> = vec![""; corpus.vocab.len()];
    for (term, idx) in &corpus.vocab {
        term_of[*idx] = term;
    }

    let mut ranked: Vec<(&str, f64)> = scores
        .into_iter()
        .map(|(idx, score)| (term_of[idx], score))
        .collect();
    ranked.sort_by(|a, b| {
        b.1.partial_cmp(&a.1)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| a.0.cmp(b.0))
    });

    ranked.into_iter().take(k).map(|(t, _)| t.to_string()).collect()
}

static WS_RE: OnceLock<Regex> = OnceLock::new();

/// Collapse whitespace before tokenization.
pub fn clean_text(raw: &str) -> String {
    let re = WS_RE.get_or_init(|| Regex::new(r"\s+").expect("static regex"));
    re.replace_all(raw.trim(), " ").to_string()
}

fn stop_words() -> &'static HashSet<&'static str> {
    static SET: OnceLock<HashSet<&'static str>> = OnceLock::new();
    SET.get_or_init(|| STOP_WORDS.iter().copied().collect())
}

/// Lowercase, split on non-alphanumerics, drop short tokens and stop words.
pub fn tokenize(text: &str) -> Vec<String> {
    clean_text(text)
        .to_lowercase()
        .split(|c: char| !c.is_alphanumeric())
        .filter(|w| w.len() >= MIN_TOKEN_CHARS && !stop_words().contains(w))
        .map(String::from)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn docs(texts: &[&str]) -> Vec<String> {
        texts.iter().map(|t| t.to_string()).collect()
    }

    #[test]
    fn test_tokenize_removes_stop_words_and_short_tokens() {
        let tokens = tokenize("I need help with my invoice!");
        assert_eq!(tokens, vec!["invoice"]);
    }

    #[test]
    fn test_identical_documents_score_one() {
        let corpus = Corpus::fit(&docs(&["rust borrow checker", "rust borrow checker"]));
        let v = corpus.vectors();
        let sim = cosine_similarity(&v[0], &v[1]);
        assert!((sim - 1.0).abs() < 1e-9, "sim={}", sim);
    }

    #[test]
    fn test_disjoint_documents_score_zero() {
        let corpus = Corpus::fit(&docs(&["invoice billing", "weather forecast"]));
        let v = corpus.vectors();
        assert_eq!(cosine_similarity(&v[0], &v[1]), 0.0);
    }

    #[test]
    fn test_empty_after_stop_words_is_zero_vector() {
        let corpus = Corpus::fit(&docs(&["and the of", "invoice wrong"]));
        let v = corpus.vectors();
        assert!(v[0].is_zero());
        assert_eq!(cosine_similarity(&v[0], &v[1]), 0.0);
        assert_eq!(cosine_similarity(&v[0], &v[0]), 0.0);
    }

    #[test]
    fn test_overlapping_documents_score_between() {
        let corpus = Corpus::fit(&docs(&["invoice wrong", "invoice"]));
        let v = corpus.vectors();
        let sim = cosine_similarity(&v[0], &v[1]);
        assert!(sim > 0.3 && sim < 1.0, "sim={}", sim);
    }

    #[test]
    fn test_top_keywords_lexical_tie_break() {
        // Single doc, equal weights: lexical order decides.
        let keywords = top_keywords(&docs(&["weather today"]), 5);
        assert_eq!(keywords, vec!["today", "weather"]);
    }

    #[test]
    fn test_top_keywords_repeated_term_outranks() {
        let keywords = top_keywords(
            &docs(&["invoice wrong", "invoice missing"]),
            1,
        );
        assert_eq!(keywords, vec!["invoice"]);
    }

    #[test]
    fn test_top_keywords_caps_at_k() {
        let keywords = top_keywords(&docs(&["alpha beta gamma delta epsilon zeta"]), 3);
        assert_eq!(keywords.len(), 3);
        assert_eq!(keywords, vec!["alpha", "beta", "delta"]);
    }

    #[test]
    fn test_top_keywords_empty_input() {
        assert!(top_keywords(&[], 5).is_empty());
        assert!(top_keywords(&docs(&["the and of"]), 5).is_empty());
    }

    #[test]
    fn test_vocabulary_is_per_fit() {
        let a = Corpus::fit(&docs(&["rust tokio async"]));
        let b = Corpus::fit(&docs(&["python asyncio"]));
        assert_eq!(a.vocab_len(), 3);
        assert_eq!(b.vocab_len(), 2);
    }
}
