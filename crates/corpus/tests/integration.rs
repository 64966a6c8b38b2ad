//! End-to-end corpus loading from files on disk.

use std::fs;
use std::path::Path;

use corpus::{BatchCycler, PairBatch, PairConfig, RelevanceCorpus, Split, WordVectors, PAD_ID};

fn write_fixture(dir: &Path) {
    fs::write(
        dir.join("vectors.txt"),
        "6 3\n\
         crime 1 0 0\n\
         mafia 0.9 0.1 0\n\
         polio 0 1 0\n\
         vaccine 0 0.8 0.2\n\
         weather 0 0 1\n\
         rain 0 0.1 0.9\n",
    )
    .unwrap();
    fs::write(
        dir.join("qrels.json"),
        r#"{
            "301": {"d1": 1, "d2": 0, "d3": 0},
            "302": {"d3": 2, "d1": 0},
            "303": {"d2": 1, "d4": 0}
        }"#,
    )
    .unwrap();
    fs::write(
        dir.join("topics.json"),
        r#"{
            "301": "Organized Crime",
            "302": {"title": "polio vaccine", "description": "post-polio syndrome"},
            "303": "rain"
        }"#,
    )
    .unwrap();

    let docs = dir.join("docs");
    fs::create_dir(&docs).unwrap();
    fs::write(
        docs.join("part-0.json"),
        r#"[
            {"id": "d1", "title": "Crime", "text": "mafia crime crime"},
            {"id": "d2", "text": "weather and rain"}
        ]"#,
    )
    .unwrap();
    fs::write(docs.join("part-1.json"), r#"{"id": "d3", "text": "polio vaccine trial"}"#).unwrap();
    fs::write(docs.join("part-2.json"), r#"{"id": "d4", "text": "sunny weather"}"#).unwrap();
}

fn load(dir: &Path, config: &PairConfig) -> (WordVectors, RelevanceCorpus) {
    let vectors = WordVectors::load(&dir.join("vectors.txt"), None).unwrap();
    let corpus = RelevanceCorpus::load(
        &dir.join("qrels.json"),
        &dir.join("topics.json"),
        &dir.join("docs"),
        &vectors,
        config,
    )
    .unwrap();
    (vectors, corpus)
}

#[test]
fn test_load_and_build_pairs() {
    let dir = tempfile::tempdir().unwrap();
    write_fixture(dir.path());

    let config = PairConfig {
        negatives_per_positive: 2,
        test_ratio: 0.3,
        ..Default::default()
    };
    let (vectors, corpus) = load(dir.path(), &config);
    assert_eq!(vectors.vocab_size(), 6);
    assert_eq!(corpus.topics(Split::Train), vec!["301", "302"]);
    assert_eq!(corpus.topics(Split::Test), vec!["303"]);

    let train = corpus.pairs(Split::Train, &config).unwrap();
    assert_eq!(train.len(), 4, "two topics, one positive each, two negatives per positive");

    let crime = vectors.token_id("crime").unwrap();
    let t301: Vec<_> = train.iter().filter(|p| p.topic_id == "301").collect();
    assert_eq!(t301.len(), 2);
    // "Organized" is out of vocabulary; "Crime" falls back to lowercase.
    assert_eq!(&t301[0].query[..], &[crime]);
    // Title is prepended to the body before tokenization.
    assert_eq!(t301[0].pos_doc.len(), 4);

    let test = corpus.pairs(Split::Test, &config).unwrap();
    assert_eq!(test.len(), 2);
    assert!(test.iter().all(|p| p.topic_id == "303"));
}

#[test]
fn test_pairs_feed_a_cycler() {
    let dir = tempfile::tempdir().unwrap();
    write_fixture(dir.path());
    let config = PairConfig {
        test_ratio: 0.0,
        ..Default::default()
    };
    let (_, corpus) = load(dir.path(), &config);
    let pairs = corpus.pairs(Split::Train, &config).unwrap();
    let n = pairs.len();

    let mut cycler = BatchCycler::shuffled(pairs, 4, 1).unwrap();
    let mut seen = 0;
    for _ in 0..cycler.batches_per_pass() {
        let batch = PairBatch::collate(&cycler.next_batch());
        assert!(batch.len() <= 4);
        for row in 0..batch.len() {
            let q = batch.query.row(row);
            assert!(q[..batch.query_lengths[row]].iter().all(|&id| id != PAD_ID));
            assert!(q[batch.query_lengths[row]..].iter().all(|&id| id == PAD_ID));
        }
        seen += batch.len();
    }
    assert_eq!(seen, n);
    assert_eq!(cycler.rebuilds(), 0);
}

#[test]
fn test_missing_qrels_file_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    write_fixture(dir.path());
    let vectors = WordVectors::load(&dir.path().join("vectors.txt"), None).unwrap();
    let result = RelevanceCorpus::load(
        &dir.path().join("missing.json"),
        &dir.path().join("topics.json"),
        &dir.path().join("docs"),
        &vectors,
        &PairConfig::default(),
    );
    assert!(result.is_err());
}
