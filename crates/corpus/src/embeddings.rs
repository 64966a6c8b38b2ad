//! Pretrained word vectors in word2vec text or binary format.
//!
//! Vectors are packed row-major into a single `Vec<f32>`. Row 0 is the
//! all-zero padding vector ([`PAD_ID`]); word `i` in file order occupies
//! row `i + 1`. Token ids outside the table resolve to the padding row.

use std::collections::HashMap;
use std::fs::File;
use std::io::{BufRead, BufReader, Read};
use std::path::Path;

use crate::error::CorpusError;
use crate::tokenizer::tokenize;
use crate::types::PAD_ID;

/// Frozen word-vector table plus its vocabulary.
#[derive(Debug, Clone)]
pub struct WordVectors {
    vocab: HashMap<String, u32>,
    dim: usize,
    data: Vec<f32>,
}

impl WordVectors {
    /// Build a table from `(word, vector)` pairs. Duplicate words keep their
    /// first vector.
    pub fn from_entries(
        dim: usize,
        entries: impl IntoIterator<Item = (String, Vec<f32>)>,
    ) -> Result<Self, CorpusError> {
        if dim == 0 {
            return Err(CorpusError::EmbeddingFormat {
                line: 0,
                reason: "embedding dimension must be > 0".to_string(),
            });
        }
        let mut table = Self {
            vocab: HashMap::new(),
            dim,
            data: vec![0.0; dim],
        };
        for (i, (word, vector)) in entries.into_iter().enumerate() {
            table.push(word, &vector, i + 1)?;
        }
        Ok(table)
    }

    fn push(&mut self, word: String, vector: &[f32], line: usize) -> Result<(), CorpusError> {
        if vector.len() != self.dim {
            return Err(CorpusError::EmbeddingFormat {
                line,
                reason: format!("vector for {word:?} has {} values, expected {}", vector.len(), self.dim),
            });
        }
        if self.vocab.contains_key(&word) {
            return Ok(());
        }
        let id = self.rows() as u32;
        self.vocab.insert(word, id);
        self.data.extend_from_slice(vector);
        Ok(())
    }

    /// Load vectors, choosing the binary reader for `.bin` files.
    ///
    /// `max_vocab` keeps only the first N words, matching the frequency
    /// ordering of published word2vec files.
    pub fn load(path: &Path, max_vocab: Option<usize>) -> Result<Self, CorpusError> {
        let file = File::open(path).map_err(|e| CorpusError::io(path, e))?;
        let reader = BufReader::new(file);
        let table = if path.extension().is_some_and(|ext| ext == "bin") {
            Self::read_binary(reader, max_vocab)
        } else {
            Self::read_text(reader, max_vocab)
        }?;
        tracing::info!(
            path = %path.display(),
            words = table.vocab_size(),
            dim = table.dim,
            "Loaded word vectors"
        );
        Ok(table)
    }

    /// Parse the text format. The `"<count> <dim>"` header is optional; without
    /// it the dimension is taken from the first row (GloVe layout).
    pub fn read_text<R: BufRead>(reader: R, max_vocab: Option<usize>) -> Result<Self, CorpusError> {
        let limit = max_vocab.unwrap_or(usize::MAX);
        let mut table: Option<Self> = None;

        for (idx, line) in reader.lines().enumerate() {
            let line_no = idx + 1;
            let line = line.map_err(|e| CorpusError::EmbeddingFormat {
                line: line_no,
                reason: e.to_string(),
            })?;
            let mut fields = line.split_whitespace();
            let Some(word) = fields.next() else {
                continue;
            };
            let values: Vec<&str> = fields.collect();

            if idx == 0 && values.len() == 1 {
                if let (Ok(_), Ok(dim)) = (word.parse::<usize>(), values[0].parse::<usize>()) {
                    table = Some(Self::from_entries(dim, std::iter::empty())?);
                    continue;
                }
            }

            let vector = values
                .iter()
                .map(|v| v.parse::<f32>())
                .collect::<Result<Vec<f32>, _>>()
                .map_err(|e| CorpusError::EmbeddingFormat {
                    line: line_no,
                    reason: format!("bad float for {word:?}: {e}"),
                })?;
            let table = match &mut table {
                Some(t) => t,
                slot => slot.insert(Self::from_entries(vector.len(), std::iter::empty())?),
            };
            if table.vocab_size() >= limit {
                break;
            }
            table.push(word.to_string(), &vector, line_no)?;
        }

        table.ok_or_else(|| CorpusError::EmbeddingFormat {
            line: 0,
            reason: "no vectors found".to_string(),
        })
    }

    /// Parse the binary format: an ASCII `"<count> <dim>\n"` header, then for
    /// each word its bytes, a space, and `dim` little-endian f32 values.
    pub fn read_binary<R: BufRead>(mut reader: R, max_vocab: Option<usize>) -> Result<Self, CorpusError> {
        let mut header = String::new();
        reader
            .read_line(&mut header)
            .map_err(|e| CorpusError::EmbeddingFormat {
                line: 1,
                reason: e.to_string(),
            })?;
        let bad_header = || CorpusError::EmbeddingFormat {
            line: 1,
            reason: format!("expected \"<count> <dim>\" header, got {:?}", header.trim()),
        };
        let mut parts = header.split_whitespace();
        let count: usize = parts.next().and_then(|s| s.parse().ok()).ok_or_else(bad_header)?;
        let dim: usize = parts.next().and_then(|s| s.parse().ok()).ok_or_else(bad_header)?;

        let count = count.min(max_vocab.unwrap_or(usize::MAX));
        let mut table = Self::from_entries(dim, std::iter::empty())?;
        let mut word_bytes = Vec::new();
        let mut raw = vec![0u8; dim * 4];

        for entry in 0..count {
            let line = entry + 2;
            word_bytes.clear();
            reader
                .read_until(b' ', &mut word_bytes)
                .map_err(|e| CorpusError::EmbeddingFormat {
                    line,
                    reason: e.to_string(),
                })?;
            if word_bytes.last() != Some(&b' ') {
                return Err(CorpusError::EmbeddingFormat {
                    line,
                    reason: format!("file ended after {entry} of {count} words"),
                });
            }
            // Some writers terminate each vector with '\n'; it lands before the next word.
            let word = String::from_utf8_lossy(&word_bytes[..word_bytes.len() - 1])
                .trim_start_matches('\n')
                .to_string();

            reader
                .read_exact(&mut raw)
                .map_err(|e| CorpusError::EmbeddingFormat {
                    line,
                    reason: format!("truncated vector for {word:?}: {e}"),
                })?;
            let vector: Vec<f32> = raw
                .chunks_exact(4)
                .map(|b| f32::from_le_bytes([b[0], b[1], b[2], b[3]]))
                .collect();
            table.push(word, &vector, line)?;
        }

        Ok(table)
    }

    /// Embedding dimension.
    pub fn dim(&self) -> usize {
        self.dim
    }

    /// Number of rows including the padding row.
    pub fn rows(&self) -> usize {
        self.data.len() / self.dim
    }

    /// Number of real words (excludes padding).
    pub fn vocab_size(&self) -> usize {
        self.vocab.len()
    }

    /// Row-major `rows() × dim()` table.
    pub fn data(&self) -> &[f32] {
        &self.data
    }

    /// Id for a token: exact match first, then its lowercase form.
    pub fn token_id(&self, token: &str) -> Option<u32> {
        self.vocab.get(token).copied().or_else(|| {
            let lower = token.to_lowercase();
            (lower != token).then(|| self.vocab.get(&lower).copied()).flatten()
        })
    }

    /// Tokenize and map text to ids, dropping out-of-vocabulary tokens and
    /// keeping at most `max_len` ids.
    pub fn encode(&self, text: &str, max_len: usize) -> Vec<u32> {
        tokenize(text)
            .filter_map(|t| self.token_id(t))
            .take(max_len)
            .collect()
    }

    /// Vector for an id. Ids outside the table resolve to the padding row.
    pub fn vector(&self, id: u32) -> &[f32] {
        let row = if (id as usize) < self.rows() { id as usize } else { PAD_ID as usize };
        &self.data[row * self.dim..(row + 1) * self.dim]
    }
}
