//! Trigram embedding provider using character trigram-based content-aware embeddings.

use crate::embeddings::provider::EmbeddingProvider;
use docchat_core::AppResult;
use std::collections::{HashMap, HashSet};

/// English function words that carry no topical signal.
const STOP_WORDS: [&str; 36] = [
    "the", "is", "at", "which", "on", "a", "an", "as", "are", "was", "were", "for", "to", "of",
    "in", "and", "or", "but", "with", "by", "from", "this", "that", "be", "have", "has", "had",
    "it", "its", "their", "they", "them", "what", "who", "how", "does",
];

/// Trigram-based embedding provider for local, offline operation.
///
/// Generates deterministic embeddings from character trigrams and word
/// frequencies. Not semantically accurate like neural embedding models, but
/// consistent and content-dependent in any script, which suits development,
/// tests and air-gapped use.
#[derive(Debug)]
pub struct TrigramProvider {
    dimensions: usize,
    stop_words: HashSet<&'static str>,
}

impl TrigramProvider {
    /// Create a new trigram provider with specified dimensions.
    pub fn new(dimensions: usize) -> Self {
        Self {
            dimensions: dimensions.max(1),
            stop_words: STOP_WORDS.iter().copied().collect(),
        }
    }

    /// Lowercased words with surrounding punctuation removed, so that
    /// "France." and "France?" produce the same token.
    fn tokens<'a>(&'a self, lower: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        lower
            .split_whitespace()
            .map(|w| w.trim_matches(|c: char| !c.is_alphanumeric()))
            .filter(move |w| w.chars().count() > 2 && !self.stop_words.contains(w))
    }

    /// Generate a trigram-based embedding for text.
    fn generate_trigram_embedding(&self, text: &str) -> Vec<f32> {
        let mut embedding = vec![0.0; self.dimensions];
        let lower = text.to_lowercase();

        let mut word_freq: HashMap<&str, u32> = HashMap::new();
        for word in self.tokens(&lower) {
            *word_freq.entry(word).or_insert(0) += 1;
        }

        for (word, freq) in word_freq.iter() {
            let chars: Vec<char> = word.chars().collect();
            for window in chars.windows(3) {
                let trigram: String = window.iter().collect();
                let trigram_hash = trigram
                    .bytes()
                    .fold(0u64, |acc, b| acc.wrapping_mul(37).wrapping_add(b as u64));

                let dim_idx = (trigram_hash as usize) % self.dimensions;
                embedding[dim_idx] += (*freq as f32).sqrt();
            }

            // Whole word
            let word_hash = word
                .bytes()
                .fold(0u64, |acc, b| acc.wrapping_mul(31).wrapping_add(b as u64));
            let base_dim = (word_hash as usize) % self.dimensions;
            embedding[base_dim] += *freq as f32;
        }

        // Normalize to unit vector
        let norm: f32 = embedding.iter().map(|x| x * x).sum::<f32>().sqrt();
        if norm > 0.0 {
            for v in &mut embedding {
                *v /= norm;
            }
        }

        embedding
    }
}

#[async_trait::async_trait]
impl EmbeddingProvider for TrigramProvider {
    fn provider_name(&self) -> &str {
        "trigram"
    }

    fn model_name(&self) -> &str {
        "trigram-v1"
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }

    async fn embed_batch(&self, texts: &[String]) -> AppResult<Vec<Vec<f32>>> {
        Ok(texts
            .iter()
            .map(|text| self.generate_trigram_embedding(text))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::cosine_similarity;

    fn norm(v: &[f32]) -> f32 {
        v.iter().map(|x| x * x).sum::<f32>().sqrt()
    }

    #[tokio::test]
    async fn test_trigram_provider_embed_single() {
        let provider = TrigramProvider::new(384);
        let embedding = provider.embed("hello world").await.unwrap();

        assert_eq!(embedding.len(), 384);
        assert!((norm(&embedding) - 1.0).abs() < 0.001);
    }

    #[tokio::test]
    async fn test_trigram_provider_deterministic() {
        let provider = TrigramProvider::new(384);
        let texts = vec!["deterministic test".to_string(), "second text".to_string()];

        let first = provider.embed_batch(&texts).await.unwrap();
        let second = provider.embed_batch(&texts).await.unwrap();

        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn test_punctuation_does_not_change_tokens() {
        let provider = TrigramProvider::new(384);
        let a = provider.embed("capital of France.").await.unwrap();
        let b = provider.embed("capital of France?").await.unwrap();

        assert_eq!(a, b);
    }

    #[tokio::test]
    async fn test_related_text_scores_higher() {
        let provider = TrigramProvider::new(384);
        let query = provider.embed("What is the capital of France?").await.unwrap();
        let related = provider.embed("Paris is the capital of France.").await.unwrap();
        let unrelated = provider.embed("Photosynthesis converts light into sugar.").await.unwrap();

        assert!(cosine_similarity(&query, &related) > cosine_similarity(&query, &unrelated));
    }

    #[tokio::test]
    async fn test_trigram_provider_empty_text() {
        let provider = TrigramProvider::new(384);
        let embedding = provider.embed("").await.unwrap();

        assert_eq!(embedding.len(), 384);
        assert!(embedding.iter().all(|&x| x == 0.0));
    }

    #[tokio::test]
    async fn test_indic_scripts() {
        let provider = TrigramProvider::new(384);
        for text in ["भारत की राजधानी नई दिल्ली है।", "சென்னை தமிழ்நாட்டின் தலைநகரம்", "హైదరాబాద్ తెలంగాణ రాజధాని"] {
            let embedding = provider.embed(text).await.unwrap();
            assert!((norm(&embedding) - 1.0).abs() < 0.001, "{}", text);
        }
    }
}
