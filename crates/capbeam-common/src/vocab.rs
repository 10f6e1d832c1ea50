//! Token table: integer token id ↔ word mapping with designated start and
//! stop tokens.

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::TokenId;

/// Placeholder rendered for ids outside the table.
pub const UNKNOWN_WORD: &str = "<unk>";

/// Errors produced while building or loading a [`Vocabulary`].
#[derive(Debug, thiserror::Error)]
pub enum VocabError {
    #[error("vocabulary is empty")]
    Empty,

    #[error("duplicate word {word:?} at ids {first} and {second}")]
    DuplicateWord { word: String, first: TokenId, second: TokenId },

    #[error("{role} word {word:?} is not in the vocabulary")]
    MissingSpecial { role: &'static str, word: String },

    #[error("vocabulary has {0} entries, more than a token id can address")]
    TooLarge(usize),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Read-only view of a token table as consumed by the decoders.
pub trait TokenTable {
    /// Number of entries.
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Word for `id`, or `None` when out of range.
    fn word(&self, id: TokenId) -> Option<&str>;

    /// Id for `word`, or `None` when absent.
    fn id(&self, word: &str) -> Option<TokenId>;

    /// Sentinel fed as the previous word on the first timestep.
    fn start_token(&self) -> TokenId;

    /// Token that marks a caption as complete.
    fn stop_token(&self) -> TokenId;

    /// Render `tokens` up to and including the first stop token.
    ///
    /// Words are separated by single spaces; the stop word attaches to the
    /// preceding word. Start tokens are skipped but still counted.
    fn render(&self, tokens: &[TokenId]) -> Rendered {
        let (start, stop) = (self.start_token(), self.stop_token());
        let mut sentence = String::new();
        let mut length = 0;
        for &token in tokens {
            length += 1;
            if token == start {
                continue;
            }
            let word = self.word(token).unwrap_or(UNKNOWN_WORD);
            if token == stop {
                sentence.push_str(word);
                break;
            }
            if !sentence.is_empty() {
                sentence.push(' ');
            }
            sentence.push_str(word);
        }
        Rendered { sentence, length }
    }
}

/// Sentence rendered from a token sequence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rendered {
    pub sentence: String,
    /// Tokens consumed, including the stop token when one was reached.
    pub length: usize,
}

/// On-disk layout accepted by [`Vocabulary::from_json_file`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VocabularyFile {
    pub words: Vec<String>,
    pub start: String,
    pub stop: String,
}

/// In-memory token table.
#[derive(Debug, Clone)]
pub struct Vocabulary {
    words: Vec<String>,
    index: HashMap<String, TokenId>,
    start: TokenId,
    stop: TokenId,
}

impl Vocabulary {
    /// Build a table where `words[i]` has id `i`.
    pub fn new(words: Vec<String>, start_word: &str, stop_word: &str) -> Result<Self, VocabError> {
        if words.is_empty() {
            return Err(VocabError::Empty);
        }
        if TokenId::try_from(words.len()).is_err() {
            return Err(VocabError::TooLarge(words.len()));
        }

        let mut index = HashMap::with_capacity(words.len());
        for (i, word) in words.iter().enumerate() {
            let id = i as TokenId;
            if let Some(first) = index.insert(word.clone(), id) {
                return Err(VocabError::DuplicateWord { word: word.clone(), first, second: id });
            }
        }

        let start = *index.get(start_word).ok_or_else(|| VocabError::MissingSpecial {
            role: "start",
            word: start_word.to_string(),
        })?;
        let stop = *index.get(stop_word).ok_or_else(|| VocabError::MissingSpecial {
            role: "stop",
            word: stop_word.to_string(),
        })?;

        Ok(Self { words, index, start, stop })
    }

    /// Load a table from `{ "words": [...], "start": "...", "stop": "..." }`.
    pub fn from_json_file(path: &Path) -> Result<Self, VocabError> {
        let text = fs::read_to_string(path)?;
        let file: VocabularyFile = serde_json::from_str(&text)?;
        Self::new(file.words, &file.start, &file.stop)
    }
}

impl TokenTable for Vocabulary {
    fn len(&self) -> usize {
        self.words.len()
    }

    fn word(&self, id: TokenId) -> Option<&str> {
        self.words.get(id as usize).map(String::as_str)
    }

    fn id(&self, word: &str) -> Option<TokenId> {
        self.index.get(word).copied()
    }

    fn start_token(&self) -> TokenId {
        self.start
    }

    fn stop_token(&self) -> TokenId {
        self.stop
    }
}
