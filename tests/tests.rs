//! Integration tests for `review_text_analytics`.
//
// This suite verifies:
// - Library behavior (end-to-end passes over in-memory and file-backed corpora, caps, metadata)
// - Failure handling (unreadable sources abort the pass)
// - Binary behavior (refuses to start without a readable dataset or with a bad config)

use std::time::Instant;

use assert_fs::prelude::*;
use async_trait::async_trait;
use futures::stream::{self, StreamExt};
use predicates::prelude::*;
use serde_json::Value as Json;

use review_text_analytics::source::DocumentStream;
use review_text_analytics::{
    AnalysisKind, AnalysisResults, AnalyticsConfig, AnalyticsError, DocumentSource,
    JsonLinesSource, MemorySource, Pipeline, RawDocument, SourceQuery,
};

// --------------------- helpers ---------------------

/// Write a review dump (one JSON object per line) into a temp dir.
fn write_dump(dir: &assert_fs::TempDir, reviews: &[(&str, f64)]) -> std::path::PathBuf {
    let f = dir.child("review.json");
    let mut content = String::new();
    for (i, (text, stars)) in reviews.iter().enumerate() {
        let line = serde_json::json!({
            "review_id": format!("r{}", i),
            "user_id": "u1",
            "business_id": "b1",
            "stars": stars,
            "useful": 0,
            "funny": 0,
            "cool": 0,
            "text": text,
            "date": "2018-07-07 22:09:11",
        });
        content.push_str(&line.to_string());
        content.push('\n');
    }
    f.write_str(&content).unwrap();
    f.path().to_path_buf()
}

/// Ids of a word-count result, in order.
fn word_ids(results: &AnalysisResults) -> Vec<String> {
    match results {
        AnalysisResults::Words(words) => words.iter().map(|w| w.id.clone()).collect(),
        other => panic!("expected word counts, got {:?}", other),
    }
}

/// Source that yields `good` documents and then fails, like a store dropping mid-pass.
struct FlakySource {
    good: usize,
}

#[async_trait]
impl DocumentSource for FlakySource {
    async fn ping(&self) -> review_text_analytics::Result<()> {
        Ok(())
    }

    async fn open(&self, _query: SourceQuery) -> review_text_analytics::Result<DocumentStream> {
        let docs = (0..self.good).map(|_| Ok(RawDocument::new("steady stream")));
        let failure = std::iter::once(Err(AnalyticsError::source_unavailable(
            "connection reset",
        )));
        Ok(stream::iter(docs.chain(failure)).boxed())
    }
}

/// Run the binary with arguments and no inherited dataset variables.
fn run_cli(args: &[&str]) -> assert_cmd::assert::Assert {
    let mut cmd = assert_cmd::Command::cargo_bin("review_text_analytics").unwrap();
    cmd.env_remove("REVIEW_DATASET").env_remove("LISTEN_ADDR");
    cmd.args(args).assert()
}

// --------------------- library tests ---------------------

#[tokio::test]
async fn lib_common_words_end_to_end() {
    let source = MemorySource::new(vec![
        RawDocument::new("Great pizza and service"),
        RawDocument::new("Great service"),
        RawDocument::new("Bad pizza"),
    ]);
    let config = AnalyticsConfig::default();
    let report = Pipeline::new(&source, &config)
        .run(AnalysisKind::CommonWords, Instant::now())
        .await
        .unwrap();

    assert_eq!(
        word_ids(&report.results),
        vec!["great", "pizza", "service", "and", "bad"]
    );
    let json = serde_json::to_value(&report).unwrap();
    assert_eq!(json["results"][0], serde_json::json!({"_id": "great", "count": 2}));
    assert_eq!(json["results"][1], serde_json::json!({"_id": "pizza", "count": 2}));
    assert_eq!(json["metadata"]["sampleSize"], 3);
    assert!(json["metadata"]["processedAt"].is_string());
    assert!(json["metadata"]["elapsedMs"].is_u64());
    // common words carry no description
    assert!(json["metadata"].get("description").is_none());
}

#[tokio::test]
async fn lib_document_cap_ignores_larger_corpus() {
    let docs: Vec<RawDocument> = (0..50_000).map(|_| RawDocument::new("pizza")).collect();
    let source = MemorySource::new(docs);
    let config = AnalyticsConfig::default();
    let report = Pipeline::new(&source, &config)
        .run(AnalysisKind::CommonWords, Instant::now())
        .await
        .unwrap();

    assert_eq!(report.processed, 10_000);
    assert_eq!(report.metadata.sample_size, 10_000);
    let json = serde_json::to_value(&report.results).unwrap();
    assert_eq!(json[0]["count"], 10_000);
}

#[tokio::test]
async fn lib_word_cloud_source_limit_applies_before_cap() {
    let docs: Vec<RawDocument> = (0..30).map(|_| RawDocument::new("crispy")).collect();
    let source = MemorySource::new(docs);
    let config = AnalyticsConfig::from_toml_str(
        r#"
        [word_cloud]
        source_limit = 12
        document_cap = 20
        "#,
    )
    .unwrap();
    let report = Pipeline::new(&source, &config)
        .run(AnalysisKind::WordCloud, Instant::now())
        .await
        .unwrap();
    assert_eq!(report.processed, 12);

    let json = serde_json::to_value(&report).unwrap();
    assert_eq!(json["results"][0], serde_json::json!({"text": "crispy", "size": 12}));
    assert_eq!(
        json["metadata"]["description"],
        "Word cloud analysis with simplified part-of-speech filtering"
    );
}

#[tokio::test]
async fn lib_file_backed_rating_split() {
    let dir = assert_fs::TempDir::new().unwrap();
    let path = write_dump(
        &dir,
        &[
            ("Amazing tacos, friendly staff!", 5.0),
            ("The tacos were cold and the staff rude.", 2.0),
            ("Decent tacos. Average prices.", 3.0),
            ("Best salsa in town", 4.0),
        ],
    );
    let source = JsonLinesSource::new(&path);
    let config = AnalyticsConfig::default();
    let pipeline = Pipeline::new(&source, &config);

    let positive = pipeline
        .run(AnalysisKind::PositiveWords, Instant::now())
        .await
        .unwrap();
    assert_eq!(positive.processed, 2);
    assert!(word_ids(&positive.results).contains(&"salsa".to_string()));
    assert!(!word_ids(&positive.results).contains(&"cold".to_string()));

    let negative = pipeline
        .run(AnalysisKind::NegativeWords, Instant::now())
        .await
        .unwrap();
    assert_eq!(negative.processed, 2);
    let ids = word_ids(&negative.results);
    assert_eq!(ids[0], "the");
    assert_eq!(ids[1], "tacos");
    assert!(!ids.contains(&"salsa".to_string()));
}

#[tokio::test]
async fn lib_word_association_graph_from_file() {
    let dir = assert_fs::TempDir::new().unwrap();
    let path = write_dump(&dir, &[("a b c d e", 4.0), ("Chinese steak house", 3.0)]);
    let source = JsonLinesSource::new(&path);
    let config = AnalyticsConfig::default();
    let report = Pipeline::new(&source, &config)
        .run(AnalysisKind::WordAssociations, Instant::now())
        .await
        .unwrap();
    // single letters never survive the tokenizer
    let json = serde_json::to_value(&report.results).unwrap();
    let graph = json.as_array().unwrap();
    assert_eq!(graph.len(), 3);
    assert_eq!(graph[0]["word"], "chinese");
    assert_eq!(
        graph[0]["associations"],
        serde_json::json!([{"word": "steak", "count": 1}, {"word": "house", "count": 1}])
    );
}

#[tokio::test]
async fn lib_read_failure_discards_partial_state() {
    let source = FlakySource { good: 25 };
    let config = AnalyticsConfig::default();
    let result = Pipeline::new(&source, &config)
        .run(AnalysisKind::WordCloud, Instant::now())
        .await;
    assert!(matches!(
        result,
        Err(AnalyticsError::SourceUnavailable { .. })
    ));
}

#[tokio::test]
async fn lib_failure_after_cap_is_never_read() {
    // the cap stops the pass before the broken read
    let source = FlakySource { good: 5 };
    let config = AnalyticsConfig::from_toml_str("[common_words]\ndocument_cap = 5").unwrap();
    let report = Pipeline::new(&source, &config)
        .run(AnalysisKind::CommonWords, Instant::now())
        .await
        .unwrap();
    assert_eq!(report.processed, 5);
    assert_eq!(word_ids(&report.results), vec!["steady", "stream"]);
}

#[tokio::test]
async fn lib_missing_dataset_is_unavailable() {
    let source = JsonLinesSource::new("/no/such/dir/review.json");
    let config = AnalyticsConfig::default();
    let result = Pipeline::new(&source, &config)
        .run(AnalysisKind::CommonWords, Instant::now())
        .await;
    assert!(matches!(
        result,
        Err(AnalyticsError::SourceUnavailable { .. })
    ));
}

#[test]
fn lib_report_serializes_to_expected_shape() {
    let runtime = tokio::runtime::Runtime::new().unwrap();
    let source = MemorySource::new(vec![RawDocument::rated("Awful wait, awful food", 1.0)]);
    let config = AnalyticsConfig::default();
    let report = runtime
        .block_on(Pipeline::new(&source, &config).run(AnalysisKind::NegativeWords, Instant::now()))
        .unwrap();
    let json: Json = serde_json::to_value(&report).unwrap();
    let metadata = json["metadata"].as_object().unwrap();
    let mut keys: Vec<&str> = metadata.keys().map(|k| k.as_str()).collect();
    keys.sort();
    assert_eq!(
        keys,
        vec!["description", "elapsedMs", "processedAt", "sampleSize"]
    );
    assert_eq!(json["results"][0], serde_json::json!({"_id": "awful", "count": 2}));
}

// --------------------- binary tests ---------------------

#[test]
fn cli_help_lists_options() {
    run_cli(&["--help"])
        .success()
        .stdout(predicate::str::contains("--dataset"))
        .stdout(predicate::str::contains("--listen"))
        .stdout(predicate::str::contains("--config"));
}

#[test]
fn cli_requires_dataset() {
    run_cli(&[]).failure();
}

#[test]
fn cli_nonexistent_dataset_fails() {
    let dir = assert_fs::TempDir::new().unwrap();
    let missing = dir.child("missing.json");
    run_cli(&[
        "--dataset",
        missing.path().to_str().unwrap(),
        "--listen",
        "127.0.0.1:0",
    ])
    .failure()
    .code(1);
}

#[test]
fn cli_invalid_config_fails() {
    let dir = assert_fs::TempDir::new().unwrap();
    let dataset = write_dump(&dir, &[("fine", 5.0)]);
    let config = dir.child("analytics.toml");
    config.write_str("batch_size = 0\n").unwrap();
    run_cli(&[
        "--dataset",
        dataset.to_str().unwrap(),
        "--config",
        config.path().to_str().unwrap(),
        "--listen",
        "127.0.0.1:0",
    ])
    .failure()
    .code(1);
}
