//! Knowledge Retriever — semantic passage lookup over the reference corpus.
//!
//! The corpus is a small set of mental-health reference documents. Each
//! document is split into overlapping passages (fixed word window, 50%
//! overlap, minimum-length filter) for retrieval granularity. Passages are
//! embedded as deterministic hashed character-trigram + word-unigram feature
//! vectors, L2-normalized; query relevance is cosine similarity (equivalently
//! 1 − cosine distance), clamped to [0, 1].
//!
//! Rebuilds are atomic from the reader's perspective: a new index is built
//! completely off to the side, then published with a single swap of the
//! shared `Arc`. In-flight retrievals see the fully-old or fully-new index,
//! never a partially populated one. An empty or unbuilt index yields an empty
//! result — a degraded signal, not an error.

use parking_lot::RwLock;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::info;
use vigil_core::config::RetrievalConfig;

/// A reference document as submitted by an operator.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct KnowledgeDocument {
    pub title: String,
    pub content: String,
    pub category: String,
}

/// A retrieved passage with its query relevance.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct KnowledgePassage {
    pub text: String,
    pub title: String,
    pub category: String,
    pub relevance_score: f64,
}

// ── Embedding ───────────────────────────────────────────────────────────────

fn fnv1a(bytes: &[u8]) -> u64 {
    let mut hash: u64 = 0xcbf29ce484222325;
    for &b in bytes {
        hash ^= b as u64;
        hash = hash.wrapping_mul(0x100000001b3);
    }
    hash
}

/// Hash `text` into a fixed-dimension feature vector: character trigrams
/// capture surface form, word unigrams capture vocabulary. L2-normalized so
/// cosine similarity reduces to a dot product.
fn embed(text: &str, dim: usize) -> Vec<f64> {
    let lower = text.to_lowercase();
    let mut vector = vec![0.0f64; dim];

    let chars: Vec<char> = lower.chars().collect();
    for window in chars.windows(3) {
        let gram: String = window.iter().collect();
        let slot = (fnv1a(gram.as_bytes()) as usize) % dim;
        vector[slot] += 1.0;
    }
    for word in lower.split(|c: char| !c.is_alphanumeric()) {
        if word.is_empty() {
            continue;
        }
        let slot = (fnv1a(word.as_bytes()) as usize) % dim;
        vector[slot] += 2.0;
    }

    let norm = vector.iter().map(|x| x * x).sum::<f64>().sqrt();
    if norm > 0.0 {
        for v in vector.iter_mut() {
            *v /= norm;
        }
    }
    vector
}

fn cosine(a: &[f64], b: &[f64]) -> f64 {
    a.iter().zip(b.iter()).map(|(x, y)| x * y).sum()
}

// ── Passage splitting ───────────────────────────────────────────────────────

/// Split `text` into overlapping word windows (50% overlap), dropping
/// fragments below the substantial-length floor.
fn split_into_passages(text: &str, window_words: usize, min_chars: usize) -> Vec<String> {
    let words: Vec<&str> = text.split_whitespace().collect();
    let step = (window_words / 2).max(1);
    let mut passages = Vec::new();
    let mut start = 0;
    while start < words.len() {
        let end = (start + window_words).min(words.len());
        let passage = words[start..end].join(" ");
        if passage.trim().len() > min_chars {
            passages.push(passage);
        }
        if end == words.len() {
            break;
        }
        start += step;
    }
    passages
}

// ── Index ───────────────────────────────────────────────────────────────────

struct IndexedPassage {
    text: String,
    title: String,
    category: String,
    embedding: Vec<f64>,
}

/// An immutable generation of the passage index.
pub struct KnowledgeIndex {
    passages: Vec<IndexedPassage>,
    dim: usize,
}

impl KnowledgeIndex {
    fn empty(dim: usize) -> Self {
        Self { passages: Vec::new(), dim }
    }

    fn build(documents: &[KnowledgeDocument], config: &RetrievalConfig) -> Self {
        let mut passages = Vec::new();
        for doc in documents {
            for text in
                split_into_passages(&doc.content, config.passage_words, config.min_passage_chars)
            {
                let embedding = embed(&text, config.embedding_dim);
                passages.push(IndexedPassage {
                    text,
                    title: doc.title.clone(),
                    category: doc.category.clone(),
                    embedding,
                });
            }
        }
        Self { passages, dim: config.embedding_dim }
    }

    pub fn len(&self) -> usize {
        self.passages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.passages.is_empty()
    }

    /// Top-K passages by descending cosine relevance.
    fn retrieve(&self, query: &str, top_k: usize) -> Vec<KnowledgePassage> {
        if self.passages.is_empty() {
            return Vec::new();
        }
        let query_embedding = embed(query, self.dim);
        let mut scored: Vec<KnowledgePassage> = self
            .passages
            .iter()
            .map(|p| KnowledgePassage {
                text: p.text.clone(),
                title: p.title.clone(),
                category: p.category.clone(),
                relevance_score: cosine(&query_embedding, &p.embedding).clamp(0.0, 1.0),
            })
            .collect();
        scored.sort_by(|a, b| {
            b.relevance_score
                .partial_cmp(&a.relevance_score)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        scored.truncate(top_k.min(scored.len()));
        scored
    }
}

// ── Store ───────────────────────────────────────────────────────────────────

/// The swappable corpus handle held by the fusion engine. Documents are the
/// mutable source of truth; the index is a published immutable generation.
pub struct KnowledgeStore {
    documents: RwLock<Vec<KnowledgeDocument>>,
    index: RwLock<Arc<KnowledgeIndex>>,
    config: RetrievalConfig,
    total_rebuilds: AtomicU64,
    total_retrievals: AtomicU64,
}

impl KnowledgeStore {
    /// A store seeded with the built-in mental-health reference corpus,
    /// indexed and ready to serve.
    pub fn new(config: RetrievalConfig) -> Self {
        let store = Self::with_documents(default_corpus(), config);
        info!(
            documents = store.document_count(),
            passages = store.passage_count(),
            "Knowledge base index built"
        );
        store
    }

    pub fn with_documents(documents: Vec<KnowledgeDocument>, config: RetrievalConfig) -> Self {
        let index = Arc::new(KnowledgeIndex::build(&documents, &config));
        Self {
            documents: RwLock::new(documents),
            index: RwLock::new(index),
            config,
            total_rebuilds: AtomicU64::new(1),
            total_retrievals: AtomicU64::new(0),
        }
    }

    /// An empty store whose retrievals all come back empty.
    pub fn empty(config: RetrievalConfig) -> Self {
        let dim = config.embedding_dim;
        Self {
            documents: RwLock::new(Vec::new()),
            index: RwLock::new(Arc::new(KnowledgeIndex::empty(dim))),
            config,
            total_rebuilds: AtomicU64::new(0),
            total_retrievals: AtomicU64::new(0),
        }
    }

    /// Append documents and atomically republish the index. Returns the
    /// number of documents added.
    pub fn add_documents(&self, new_documents: Vec<KnowledgeDocument>) -> usize {
        let added = new_documents.len();
        let snapshot = {
            let mut docs = self.documents.write();
            docs.extend(new_documents);
            docs.clone()
        };
        // Build completely before publishing: readers never see a partial
        // index, only the previous or the next full generation.
        let next = Arc::new(KnowledgeIndex::build(&snapshot, &self.config));
        *self.index.write() = next;
        self.total_rebuilds.fetch_add(1, Ordering::Relaxed);
        info!(added, passages = self.passage_count(), "Knowledge base updated");
        added
    }

    /// Top-K relevant passages for `query`, ordered by descending relevance.
    pub fn retrieve(&self, query: &str, top_k: usize) -> Vec<KnowledgePassage> {
        self.total_retrievals.fetch_add(1, Ordering::Relaxed);
        let index = self.index.read().clone();
        index.retrieve(query, top_k)
    }

    pub fn document_count(&self) -> usize {
        self.documents.read().len()
    }

    pub fn passage_count(&self) -> usize {
        self.index.read().len()
    }

    pub fn total_rebuilds(&self) -> u64 {
        self.total_rebuilds.load(Ordering::Relaxed)
    }

    pub fn total_retrievals(&self) -> u64 {
        self.total_retrievals.load(Ordering::Relaxed)
    }
}

// ── Built-in corpus ─────────────────────────────────────────────────────────

/// The seed reference corpus: warning signs, risk and protective factors,
/// crisis phrasing, response protocols, resources, and safety planning.
pub fn default_corpus() -> Vec<KnowledgeDocument> {
    vec![
        KnowledgeDocument {
            title: "Suicide Warning Signs".into(),
            content: "Talking about wanting to die or kill themselves. Looking for ways to kill themselves. Talking about feeling hopeless or having no reason to live. Talking about feeling trapped or in unbearable pain. Talking about being a burden to others. Increasing use of alcohol or drugs. Acting anxious or agitated. Withdrawing from family and friends. Changing eating and sleeping habits. Showing rage or talking about seeking revenge. Taking risks that could lead to death. Giving away prized possessions. Saying goodbye to loved ones.".into(),
            category: "warning_signs".into(),
        },
        KnowledgeDocument {
            title: "Risk Factors for Suicide".into(),
            content: "Mental health conditions: Depression, bipolar disorder, schizophrenia, anxiety disorders, substance use disorders, eating disorders. Personal history: Previous suicide attempts, family history of suicide, childhood abuse or trauma. Environmental factors: Social isolation, bullying, discrimination, relationship problems, financial problems, job loss, access to lethal means.".into(),
            category: "risk_factors".into(),
        },
        KnowledgeDocument {
            title: "Protective Factors".into(),
            content: "Strong connections to family and community support. Skills in problem solving and conflict resolution. Cultural and religious beliefs that discourage suicide. Easy access to effective mental health care. Restricted access to highly lethal means of suicide.".into(),
            category: "protective_factors".into(),
        },
        KnowledgeDocument {
            title: "Crisis Intervention Phrases".into(),
            content: "I want to kill myself. I have a plan to end my life. I can't go on anymore. Everyone would be better off without me. I feel like giving up. There's no point in living. I want to disappear forever. I can't take this pain anymore. I'm thinking about suicide. Life isn't worth living.".into(),
            category: "crisis_phrases".into(),
        },
        KnowledgeDocument {
            title: "Immediate Response Protocols".into(),
            content: "If someone expresses suicidal thoughts: Stay calm and listen without judgment. Take them seriously. Ask directly about suicidal thoughts and plans. Do not leave them alone. Remove or secure potential means of harm. Contact emergency services (911) or crisis hotline (988). Escort them to emergency room if necessary. Follow up to ensure they receive ongoing care.".into(),
            category: "intervention".into(),
        },
        KnowledgeDocument {
            title: "Crisis Resources".into(),
            content: "National Suicide Prevention Lifeline: 988 or 1-800-273-8255. Crisis Text Line: Text HOME to 741741. International Association for Suicide Prevention: https://www.iasp.info/resources/Crisis_Centres/. National Alliance on Mental Illness (NAMI): 1-800-950-NAMI. Substance Abuse and Mental Health Services Administration (SAMHSA): 1-800-662-4357.".into(),
            category: "resources".into(),
        },
        KnowledgeDocument {
            title: "Safety Planning Elements".into(),
            content: "Warning signs recognition: Personal signs that a crisis may be developing. Internal coping strategies: Things I can do to distract myself without contacting another person. Social contacts and social settings: People and places that provide distraction and support. Family members or friends who may help resolve a crisis. Mental health professionals and agencies to contact during a crisis. Making the environment safe: Removing or restricting access to lethal means.".into(),
            category: "safety_planning".into(),
        },
    ]
}
