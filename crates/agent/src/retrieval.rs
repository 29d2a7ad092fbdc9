//! Nearest-neighbor intent lookup over the labeled corpus.
//!
//! The matcher embeds a value-masked form of each utterance and compares it
//! to the corpus with cosine similarity. Masking collapses amounts, weights,
//! head counts, animal codes and buyer names to placeholder tokens so that
//! `j ai vendu 5 porcs a 800000` and `j ai vendu 12 porcs a 950k` land on
//! the same point. An inverted token index keeps request-time scoring to the
//! top candidates instead of the whole corpus.
//!
//! The corpus is read-only at request time; maintenance happens offline.

use std::collections::HashMap;
use std::sync::{Arc, OnceLock};

use async_trait::async_trait;
use regex::Regex;

use porcher_core::{fold_text, ActionKind, CapabilityError};

use crate::capabilities::EmbeddingProvider;
use crate::corpus::LabeledExample;

/// Dimension of the hashed bag-of-tokens embedding space.
pub const EMBEDDING_DIM: usize = 256;

/// Scoring is restricted to this many index-selected candidates.
const MAX_CANDIDATES: usize = 100;

/// Tokens introduced by masking; never indexed.
const PLACEHOLDERS: [&str; 5] = ["CODEANIMAL", "POIDS", "QUANTITE", "MONTANT", "NOM"];

fn cached(cell: &'static OnceLock<Regex>, pattern: &'static str) -> &'static Regex {
    cell.get_or_init(|| Regex::new(pattern).expect("hard-coded pattern compiles"))
}

fn code_mask_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    cached(&RE, r"\b(?:porc|animal|code) ?[a-z0-9]{3,}\b|\bp\d+\b")
}

fn weight_unit_mask_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    cached(&RE, r"\b\d+(?: \d+)? ?(?:kg|kilogrammes?|kilos?)\b")
}

fn weight_ctx_mask_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    cached(&RE, r"\b(fait|pese|poids) \d+(?: \d+)?\b")
}

fn quantity_mask_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    cached(&RE, r"\b\d+ ?(?:porcs?|porcelets?|tetes?|sujets?|animaux|sacs?)\b")
}

fn amount_suffix_mask_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    cached(&RE, r"\b\d+(?: \d{3})* ?(?:k|millions?|balles?|m)\b")
}

fn amount_group_mask_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    cached(&RE, r"\b\d[\d ]{2,}\b(?: ?(?:fcfa|cfa|francs?))?")
}

fn amount_ctx_mask_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    cached(&RE, r"\b(a|pour|de|montant|prix|cout|vendu|achete|depense|paye) \d+\b")
}

fn name_mask_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    cached(&RE, r"\b(a|pour|chez|acheteur|client) [a-z]{2,}\b")
}

/// Collapses variable values in an already-folded utterance to placeholder
/// tokens. Applied identically to corpus entries and live utterances, so
/// magnitude and name variation cancel out of the similarity.
pub fn mask_values(folded: &str) -> String {
    let text = code_mask_re().replace_all(folded, " CODEANIMAL ");
    let text = weight_unit_mask_re().replace_all(&text, " POIDS ");
    let text = weight_ctx_mask_re().replace_all(&text, "$1 POIDS");
    let text = quantity_mask_re().replace_all(&text, " QUANTITE ");
    let text = amount_suffix_mask_re().replace_all(&text, " MONTANT ");
    let text = amount_group_mask_re().replace_all(&text, " MONTANT ");
    let text = amount_ctx_mask_re().replace_all(&text, "$1 MONTANT");
    let text = name_mask_re().replace_all(&text, "$1 NOM");
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Deterministic embedding provider: hashed bag-of-tokens, L2-normalized.
/// Cosine similarity between two such vectors approximates lexical overlap,
/// which is what the corpus was labeled against. Used whenever no remote
/// embedding model is configured.
#[derive(Clone, Copy, Debug, Default)]
pub struct HashingEmbedder;

#[async_trait]
impl EmbeddingProvider for HashingEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, CapabilityError> {
        let mut vector = vec![0.0f32; EMBEDDING_DIM];
        for token in text.split_whitespace().filter(|token| token.len() >= 2) {
            let bucket = (fnv1a(token.as_bytes()) % EMBEDDING_DIM as u64) as usize;
            vector[bucket] += 1.0;
        }

        let norm = vector.iter().map(|value| value * value).sum::<f32>().sqrt();
        if norm > 0.0 {
            for value in &mut vector {
                *value /= norm;
            }
        }
        Ok(vector)
    }
}

// FNV-1a; the std hasher is randomly keyed per process and would make
// corpus vectors irreproducible across runs.
fn fnv1a(bytes: &[u8]) -> u64 {
    let mut hash: u64 = 0xcbf2_9ce4_8422_2325;
    for byte in bytes {
        hash ^= u64::from(*byte);
        hash = hash.wrapping_mul(0x0000_0100_0000_01b3);
    }
    hash
}

pub fn cosine(a: &[f32], b: &[f32]) -> f64 {
    let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    f64::from(dot / (norm_a * norm_b))
}

#[derive(Clone, Debug, PartialEq)]
pub struct RetrievalMatch {
    pub action: ActionKind,
    pub similarity: f64,
}

/// Nearest-neighbor matcher over the labeled corpus.
pub struct RetrievalMatcher {
    embedder: Arc<dyn EmbeddingProvider>,
    entries: Vec<LabeledExample>,
    vectors: Vec<Vec<f32>>,
    inverted: HashMap<String, Vec<usize>>,
}

impl RetrievalMatcher {
    /// Masks and embeds the whole corpus once. With a remote embedder this
    /// is the only bulk call; request-time work is a single embedding.
    pub async fn build(
        embedder: Arc<dyn EmbeddingProvider>,
        corpus: Vec<LabeledExample>,
    ) -> Result<Self, CapabilityError> {
        let masked: Vec<String> =
            corpus.iter().map(|example| mask_values(&fold_text(example.text))).collect();

        let mut vectors = Vec::with_capacity(masked.len());
        for text in &masked {
            vectors.push(embedder.embed(text).await?);
        }

        let inverted = build_inverted_index(&masked);
        Ok(Self { embedder, entries: corpus, vectors, inverted })
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Best corpus neighbor for the utterance. Threshold filtering is the
    /// orchestrator's job; this returns the raw best match.
    pub async fn retrieve(&self, text: &str) -> Result<Option<RetrievalMatch>, CapabilityError> {
        if self.entries.is_empty() {
            return Ok(None);
        }

        let masked = mask_values(&fold_text(text));
        let query = self.embedder.embed(&masked).await?;

        let mut best: Option<(usize, f64)> = None;
        for index in self.candidate_indices(&masked) {
            let score = cosine(&query, &self.vectors[index]);
            if best.map(|(_, current)| score > current).unwrap_or(true) {
                best = Some((index, score));
            }
        }

        Ok(best.map(|(index, similarity)| RetrievalMatch {
            action: self.entries[index].action,
            similarity,
        }))
    }

    /// Index-selected candidate entries, most shared tokens first. Falls
    /// back to the whole corpus when the utterance shares no indexed token.
    fn candidate_indices(&self, masked: &str) -> Vec<usize> {
        let mut scores: HashMap<usize, usize> = HashMap::new();
        for token in index_tokens(masked) {
            if let Some(indices) = self.inverted.get(token) {
                for index in indices {
                    *scores.entry(*index).or_insert(0) += 1;
                }
            }
        }

        if scores.is_empty() {
            return (0..self.entries.len()).collect();
        }

        let mut ranked: Vec<(usize, usize)> = scores.into_iter().collect();
        ranked.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(&b.0)));
        ranked.truncate(MAX_CANDIDATES);
        ranked.into_iter().map(|(index, _)| index).collect()
    }
}

fn index_tokens(masked: &str) -> impl Iterator<Item = &str> {
    masked
        .split_whitespace()
        .filter(|token| token.len() >= 3 && !PLACEHOLDERS.contains(token))
}

fn build_inverted_index(masked: &[String]) -> HashMap<String, Vec<usize>> {
    let mut inverted: HashMap<String, Vec<usize>> = HashMap::new();
    for (index, text) in masked.iter().enumerate() {
        for token in index_tokens(text) {
            let postings = inverted.entry(token.to_string()).or_default();
            if postings.last() != Some(&index) {
                postings.push(index);
            }
        }
    }

    // Tokens present in almost every entry carry no signal.
    let stop_threshold = masked.len() * 3 / 10;
    if stop_threshold > 0 {
        inverted.retain(|_, postings| postings.len() <= stop_threshold);
    }
    inverted
}
