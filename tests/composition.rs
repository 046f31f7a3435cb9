// Composition tests: the analyze -> store -> report flow end to end.
//
// A session with scripted jitter and no simulated latency feeds a memory-backed
// store; the stats and CSV export are then computed from what was stored.

use std::sync::Arc;
use std::time::Duration;

use chrono::NaiveDate;
use cybershield::classifier::heuristic::HeuristicClassifier;
use cybershield::classifier::traits::ScriptedJitter;
use cybershield::models::{iso_millis, Language, LanguageHint};
use cybershield::output::csv::{default_export_filename, to_csv, write_csv, CSV_HEADER};
use cybershield::session::{Session, SessionError, EXAMPLE_TEXTS};
use cybershield::stats::{compute_stats, ResultFilter};
use cybershield::store::backend::MemoryStorage;
use cybershield::store::ResultStore;

fn session(jitter: Vec<f64>) -> Session {
    let classifier = HeuristicClassifier::with_jitter(Box::new(ScriptedJitter::new(jitter)))
        .unwrap()
        .with_processing_delay(Duration::ZERO);
    let store = ResultStore::open(Arc::new(MemoryStorage::new()), None).unwrap();
    Session::new(Box::new(classifier), store).with_network_latency(Duration::ZERO, Duration::ZERO)
}

async fn analyze_examples(session: &Session) {
    for text in EXAMPLE_TEXTS {
        session.submit(text, LanguageHint::Auto).await.unwrap();
    }
}

// ============================================================
// Session -> Store -> Stats
// ============================================================

#[tokio::test]
async fn example_texts_produce_expected_stats() {
    // 0.5 keeps every clean text clean; matches add 0.25 each
    let session = session(vec![0.5]);
    analyze_examples(&session).await;

    let store = session.store().await;
    let stats = compute_stats(store.history());
    assert_eq!(stats.total_analyzed, 5);
    assert_eq!(stats.toxic_detected, 2);
    assert_eq!(stats.clean_messages, 3);
    assert_eq!(stats.language_breakdown.get(Language::English), 3);
    assert_eq!(stats.language_breakdown.get(Language::Hindi), 1);
    assert_eq!(stats.language_breakdown.get(Language::Tamil), 1);
    assert_eq!(stats.language_breakdown.get(Language::Mixed), 0);
}

#[tokio::test]
async fn toxic_plus_clean_equals_total() {
    let session = session(vec![0.03, 0.9, 0.2, 0.6, 0.01]);
    analyze_examples(&session).await;
    analyze_examples(&session).await;

    let store = session.store().await;
    let stats = compute_stats(store.history());
    assert_eq!(stats.toxic_detected + stats.clean_messages, stats.total_analyzed);
    let breakdown: usize = stats
        .language_breakdown
        .entries()
        .iter()
        .map(|(_, count)| count)
        .sum();
    assert_eq!(breakdown, stats.total_analyzed);
    assert!(stats.avg_confidence >= 0.51 && stats.avg_confidence <= 0.99);
}

#[tokio::test]
async fn empty_history_stats_are_zero() {
    let session = session(vec![0.5]);
    let store = session.store().await;
    let stats = compute_stats(store.history());
    assert_eq!(stats.total_analyzed, 0);
    assert_eq!(stats.avg_confidence, 0.0);
}

#[tokio::test]
async fn rejected_submissions_leave_history_untouched() {
    let session = session(vec![0.5]).with_max_text_chars(20);
    assert!(matches!(
        session.submit("", LanguageHint::Auto).await,
        Err(SessionError::EmptyText)
    ));
    assert!(matches!(
        session
            .submit("this sentence is definitely longer than twenty", LanguageHint::Auto)
            .await,
        Err(SessionError::TooLong { .. })
    ));
    assert!(session.store().await.is_empty());
}

// ============================================================
// Filters -> CSV export
// ============================================================

#[tokio::test]
async fn filters_partition_history() {
    let session = session(vec![0.5]);
    analyze_examples(&session).await;

    let store = session.store().await;
    let all = ResultFilter::All.apply(store.history());
    let toxic = ResultFilter::Toxic.apply(store.history());
    let clean = ResultFilter::Clean.apply(store.history());
    assert_eq!(all.len(), toxic.len() + clean.len());
    assert!(toxic.iter().all(|r| r.is_toxic));
    assert!(clean.iter().all(|r| !r.is_toxic));
}

#[tokio::test]
async fn toxic_export_has_header_and_one_row_per_result() {
    let session = session(vec![0.5]);
    analyze_examples(&session).await;

    let store = session.store().await;
    let toxic = ResultFilter::Toxic.apply(store.history());
    let csv = to_csv(toxic.iter().copied());
    let lines: Vec<&str> = csv.split('\n').collect();

    assert_eq!(lines.len(), 1 + toxic.len());
    assert_eq!(lines[0], CSV_HEADER.join(","));
    assert!(!csv.ends_with('\n'));

    let first = toxic[0];
    assert_eq!(
        lines[1],
        format!(
            "{},\"{}\",english,true,{:.2},{},{}",
            first.id,
            first.text,
            first.confidence,
            first.categories.join(";"),
            iso_millis::format(&first.timestamp)
        )
    );
}

#[tokio::test]
async fn export_writes_file() {
    let session = session(vec![0.5]);
    session
        .submit("He said \"you are a loser\"", LanguageHint::Auto)
        .await
        .unwrap();

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join(default_export_filename(
        ResultFilter::All,
        NaiveDate::from_ymd_opt(2024, 5, 1).unwrap(),
    ));
    assert!(path.ends_with("cybershield-all-2024-05-01.csv"));

    let store = session.store().await;
    let rows = write_csv(&path, &ResultFilter::All.apply(store.history())).unwrap();
    assert_eq!(rows, 1);

    let content = std::fs::read_to_string(&path).unwrap();
    assert!(content.contains("\"He said \"\"you are a loser\"\"\""), "{content}");
}

// ============================================================
// Persistence across sessions
// ============================================================

#[cfg(feature = "sqlite")]
#[tokio::test]
async fn results_survive_a_new_session() {
    use cybershield::store::sqlite::SqliteStorage;

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("cybershield.db");
    let path = path.to_str().unwrap();

    let first_id = {
        let classifier = HeuristicClassifier::with_jitter(Box::new(ScriptedJitter::constant(0.5)))
            .unwrap()
            .with_processing_delay(Duration::ZERO);
        let store = ResultStore::open(Arc::new(SqliteStorage::open(path).unwrap()), None).unwrap();
        let session = Session::new(Box::new(classifier), store)
            .with_network_latency(Duration::ZERO, Duration::ZERO);
        session
            .submit(EXAMPLE_TEXTS[0], LanguageHint::Auto)
            .await
            .unwrap()
            .id
    };

    let store = ResultStore::open(Arc::new(SqliteStorage::open(path).unwrap()), None).unwrap();
    assert_eq!(store.len(), 1);
    assert_eq!(store.history()[0].id, first_id);
    assert!(store.history()[0].is_toxic);
}
