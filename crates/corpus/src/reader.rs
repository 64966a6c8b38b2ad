//! JSON readers for qrels, topics and document collections.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::fs;
use std::path::Path;

use serde::Deserialize;

use crate::error::CorpusError;
use crate::types::Qrels;

fn read_json<T: for<'de> Deserialize<'de>>(path: &Path) -> Result<T, CorpusError> {
    let contents = fs::read_to_string(path).map_err(|e| CorpusError::io(path, e))?;
    serde_json::from_str(&contents).map_err(|e| CorpusError::json(path, e))
}

/// Load qrels of the form `{"<topic>": {"<doc>": <relevance>}}`.
pub fn read_qrels(path: &Path) -> Result<Qrels, CorpusError> {
    let qrels: Qrels = read_json(path)?;
    let judgements: usize = qrels.values().map(BTreeMap::len).sum();
    tracing::info!(path = %path.display(), topics = qrels.len(), judgements, "Loaded qrels");
    Ok(qrels)
}

/// A topic is either a bare query string or an object with a title.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum TopicEntry {
    Text(String),
    Fields { title: String },
}

/// Load topics as `topic id → query text`.
///
/// Accepts `{"301": "international organized crime"}` as well as
/// `{"301": {"title": "...", "description": "..."}}`; only the title is used
/// as the query.
pub fn read_topics(path: &Path) -> Result<BTreeMap<String, String>, CorpusError> {
    let raw: BTreeMap<String, TopicEntry> = read_json(path)?;
    let topics: BTreeMap<String, String> = raw
        .into_iter()
        .map(|(id, entry)| {
            let text = match entry {
                TopicEntry::Text(text) => text,
                TopicEntry::Fields { title, .. } => title,
            };
            (id, text)
        })
        .collect();
    tracing::info!(path = %path.display(), count = topics.len(), "Loaded topics");
    Ok(topics)
}

/// A single document record on disk.
#[derive(Debug, Clone, Deserialize)]
pub struct DocumentRecord {
    pub id: String,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub text: String,
}

impl DocumentRecord {
    /// Title and body joined for tokenization.
    pub fn full_text(&self) -> String {
        match &self.title {
            Some(title) if !title.is_empty() => format!("{title}\n{}", self.text),
            _ => self.text.clone(),
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum DocumentFile {
    One(DocumentRecord),
    Many(Vec<DocumentRecord>),
}

/// Read every `*.json` file under `dir` and keep the documents whose id is
/// in `wanted`, transformed by `encode`.
///
/// Each file holds one record or an array of records. Files are visited in
/// sorted order so duplicate ids resolve deterministically (first wins).
pub fn read_documents<T>(
    dir: &Path,
    wanted: &HashSet<&str>,
    mut encode: impl FnMut(&DocumentRecord) -> T,
) -> Result<HashMap<String, T>, CorpusError> {
    let mut paths: Vec<_> = fs::read_dir(dir)
        .map_err(|e| CorpusError::io(dir, e))?
        .map(|entry| entry.map(|e| e.path()).map_err(|e| CorpusError::io(dir, e)))
        .collect::<Result<_, _>>()?;
    paths.retain(|p| p.extension().is_some_and(|ext| ext == "json"));
    paths.sort();

    let mut docs = HashMap::new();
    let mut scanned = 0usize;
    for path in &paths {
        let records = match read_json::<DocumentFile>(path)? {
            DocumentFile::One(record) => vec![record],
            DocumentFile::Many(records) => records,
        };
        for record in records {
            scanned += 1;
            if wanted.contains(record.id.as_str()) && !docs.contains_key(&record.id) {
                let value = encode(&record);
                docs.insert(record.id, value);
            }
        }
    }

    tracing::info!(
        dir = %dir.display(),
        files = paths.len(),
        scanned,
        kept = docs.len(),
        "Loaded documents"
    );
    Ok(docs)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_qrels() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("qrels.json");
        fs::write(&path, r#"{"301": {"d1": 1, "d2": 0}, "302": {"d3": 2}}"#).unwrap();

        let qrels = read_qrels(&path).unwrap();
        assert_eq!(qrels.len(), 2);
        assert_eq!(qrels["301"]["d1"], 1);
        assert_eq!(qrels["301"]["d2"], 0);
        assert_eq!(qrels["302"]["d3"], 2);
    }

    #[test]
    fn test_read_qrels_malformed() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("qrels.json");
        fs::write(&path, r#"{"301": ["d1"]}"#).unwrap();
        assert!(matches!(read_qrels(&path), Err(CorpusError::Json { .. })));
    }

    #[test]
    fn test_read_topics_both_layouts() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("topics.json");
        fs::write(
            &path,
            r#"{"301": "organized crime", "302": {"title": "poliomyelitis", "description": "post-polio"}}"#,
        )
        .unwrap();

        let topics = read_topics(&path).unwrap();
        assert_eq!(topics["301"], "organized crime");
        assert_eq!(topics["302"], "poliomyelitis");
    }

    #[test]
    fn test_read_documents_filters_and_accepts_arrays() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("a.json"), r#"{"id": "d1", "title": "Crime", "text": "mafia"}"#).unwrap();
        fs::write(
            dir.path().join("b.json"),
            r#"[{"id": "d2", "text": "polio"}, {"id": "d9", "text": "unjudged"}]"#,
        )
        .unwrap();
        fs::write(dir.path().join("notes.txt"), "not json").unwrap();

        let wanted: HashSet<&str> = ["d1", "d2"].into_iter().collect();
        let docs = read_documents(dir.path(), &wanted, DocumentRecord::full_text).unwrap();

        assert_eq!(docs.len(), 2);
        assert_eq!(docs["d1"], "Crime\nmafia");
        assert_eq!(docs["d2"], "polio");
    }

    #[test]
    fn test_read_documents_missing_dir() {
        let wanted = HashSet::new();
        let err = read_documents(Path::new("/nonexistent/docs"), &wanted, |_| ()).unwrap_err();
        assert!(matches!(err, CorpusError::Io { .. }));
    }
}
