//! End-to-end training on a tiny synthetic corpus with the real burn learner.

use burn::backend::ndarray::NdArray;
use burn::backend::Autodiff;
use burn::optim::AdamWConfig;
use burn::prelude::*;
use corpus::{BatchCycler, PairBatch, PairConfig, PairSample, Qrels, RelevanceCorpus, Split, WordVectors};
use drmm::model::drmm::{Drmm, DrmmConfig};
use drmm::model::embedding::FrozenEmbedding;
use drmm::training::loss::pairwise_loss;
use drmm::training::{load_checkpoint, train, BatchSource, CheckpointFile, DrmmLearner, DrmmTrainingConfig};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

type TestBackend = NdArray<f32>;
type TestAutodiffBackend = Autodiff<NdArray<f32>>;

const DIM: usize = 8;
const WORDS: usize = 40;

fn vectors() -> WordVectors {
    let mut rng = StdRng::seed_from_u64(3);
    WordVectors::from_entries(
        DIM,
        (0..WORDS).map(|i| {
            let v: Vec<f32> = (0..DIM).map(|_| rng.gen_range(-1.0..1.0)).collect();
            (format!("w{i}"), v)
        }),
    )
    .unwrap()
}

/// Ten topics; each relevant doc repeats its topic's query terms, each
/// non-relevant doc draws from the other topics' vocabulary.
fn corpus() -> RelevanceCorpus {
    let mut queries = Vec::new();
    let mut docs = Vec::new();
    let mut qrels = Qrels::new();
    for t in 0..10u32 {
        let topic = format!("{}", 400 + t);
        let q = vec![1 + t * 4, 2 + t * 4];
        queries.push((topic.clone(), q.clone()));

        let other = 1 + ((t + 5) % 10) * 4;
        let mut judged = std::collections::BTreeMap::new();
        for d in 0..2u32 {
            let id = format!("{topic}-rel{d}");
            docs.push((id.clone(), vec![q[0], 3 + t * 4, q[1], q[0], other]));
            judged.insert(id, 1);
        }
        for d in 0..3u32 {
            let id = format!("{topic}-non{d}");
            docs.push((id.clone(), vec![other, other + 1, other + 2, 4 + t * 4]));
            judged.insert(id, 0);
        }
        qrels.insert(topic, judged);
    }
    RelevanceCorpus::from_parts(queries, docs, qrels, 0.2)
}

fn pairs(split: Split) -> Vec<PairSample> {
    corpus().pairs(split, &PairConfig::default()).unwrap()
}

fn score_sum(model: &Drmm<TestBackend>, embedding: &FrozenEmbedding<TestBackend>, batch: &PairBatch) -> f32 {
    pairwise_loss(
        model,
        embedding.lookup(&batch.query),
        embedding.lookup(&batch.pos_doc),
        embedding.lookup(&batch.neg_doc),
        &batch.query_lengths,
    )
    .into_scalar()
    .elem()
}

#[test]
fn test_train_persists_loadable_best_model() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("drmm.ckpt");
    let device = Default::default();
    let vectors = vectors();

    let model_config = DrmmConfig::new(DIM).with_nbins(10);
    let model = model_config.init::<TestAutodiffBackend>(&device);
    let embedding = FrozenEmbedding::from_vectors(&vectors, &device);
    let mut learner = DrmmLearner::new(model, embedding, AdamWConfig::new().init::<TestAutodiffBackend, Drmm<TestAutodiffBackend>>(), 1e-2);

    let config = DrmmTrainingConfig::new()
        .with_valid_steps(2)
        .with_save_steps(4)
        .with_valid_num(2)
        .with_batch_size(4)
        .with_max_steps(Some(12))
        .with_show_progress(false);
    let mut train_batches = BatchCycler::shuffled(pairs(Split::Train), config.batch_size, 1).unwrap();
    let mut valid_batches = BatchCycler::sequential(pairs(Split::Test), config.batch_size).unwrap();
    let mut sink = CheckpointFile::new(&path);

    let state = train(&config, &mut learner, &mut train_batches, &mut valid_batches, &mut sink).unwrap();

    assert_eq!(state.step, 12);
    assert!(state.saves >= 1, "first validation always beats +inf");
    assert!(state.prev_loss.is_finite());
    assert_eq!(state.prev_loss, state.min_loss, "step 12 is both a validation and a save point");
    assert!(path.exists());

    // The file holds exactly the best snapshot.
    let best = state.best_snapshot.unwrap();
    let loaded = load_checkpoint::<TestBackend>(&path, &model_config, &device).unwrap();
    let inner_embedding = FrozenEmbedding::<TestBackend>::from_vectors(&vectors, &device);
    let batch = PairBatch::collate(&pairs(Split::Test));
    let expected = score_sum(&best, &inner_embedding, &batch);
    let actual = score_sum(&loaded, &inner_embedding, &batch);
    assert!((expected - actual).abs() < 1e-5, "{expected} vs {actual}");
    assert_eq!(loaded.num_params(), best.num_params());
}

#[test]
fn test_training_wraps_the_train_stream() {
    let device = Default::default();
    let vectors = vectors();
    let model = DrmmConfig::new(DIM).with_nbins(6).init::<TestAutodiffBackend>(&device);
    let embedding = FrozenEmbedding::from_vectors(&vectors, &device);
    let mut learner = DrmmLearner::new(model, embedding, AdamWConfig::new().init::<TestAutodiffBackend, Drmm<TestAutodiffBackend>>(), 1e-3);

    let train_pairs = pairs(Split::Train);
    let batches_per_pass = train_pairs.len().div_ceil(8);
    let config = DrmmTrainingConfig::new()
        .with_valid_steps(1000)
        .with_save_steps(1000)
        .with_max_steps(Some(batches_per_pass * 2 + 1))
        .with_show_progress(false);
    let mut train_batches = BatchCycler::shuffled(train_pairs, config.batch_size, 5).unwrap();
    let mut valid_batches = BatchCycler::sequential(pairs(Split::Test), config.batch_size).unwrap();
    let dir = tempfile::tempdir().unwrap();
    let mut sink = CheckpointFile::new(dir.path().join("unused.ckpt"));

    let state = train(&config, &mut learner, &mut train_batches, &mut valid_batches, &mut sink).unwrap();

    assert_eq!(state.step, batches_per_pass * 2 + 1);
    assert_eq!(BatchSource::passes(&train_batches), 2);
    assert_eq!(BatchSource::passes(&valid_batches), 0);
    assert_eq!(state.saves, 0);
    assert!(!dir.path().join("unused.ckpt").exists());
}
