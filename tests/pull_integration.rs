//! Integration tests for archive pulls
//!
//! A simulated index serves documents under the archive's sort order and
//! answers `search_after` the way the real service does. It also rejects any
//! cursor other than the one it handed out last, so a pull that skips or
//! rewinds fails loudly.

use archive_puller::cli::{PullOptions, pull_with};
use archive_puller::{ArchiveError, ArchiveExtractor, SearchTransport};
use serde_json::{Value, json};
use std::sync::Mutex;
use std::time::Duration;
use tempfile::TempDir;

struct SimulatedIndex {
    docs: Vec<(Value, Value)>,
    last_cursor: Mutex<Option<Value>>,
    requests: Mutex<Vec<Value>>,
    fail_on_request: Mutex<Option<usize>>,
}

impl SimulatedIndex {
    /// `count` documents, newest first, three per distinct date so that
    /// page boundaries land inside runs of equal dates
    fn with_docs(count: usize) -> Self {
        let docs = (0..count)
            .map(|i| {
                let id = format!("{:06}", count - i);
                let date = 1_600_000_000_000_i64 - (i as i64 / 3) * 1000;
                let text = if i % 4 == 0 { "<p></p>".to_string() } else { format!("tweet {}", id) };
                let source = json!({"id": id, "date": date, "text": text, "isRetweet": false});
                (source, json!([date, id]))
            })
            .collect();

        Self {
            docs,
            last_cursor: Mutex::new(None),
            requests: Mutex::new(Vec::new()),
            fail_on_request: Mutex::new(None),
        }
    }

    fn failing_on(self, request: usize) -> Self {
        *self.fail_on_request.lock().unwrap() = Some(request);
        self
    }

    fn recover(&self) {
        *self.fail_on_request.lock().unwrap() = None;
    }

    fn requests(&self) -> Vec<Value> {
        self.requests.lock().unwrap().clone()
    }

    fn error(reason: &str) -> Value {
        json!({"responses": [{"error": {"type": "illegal_argument_exception", "reason": reason}, "status": 400}]})
    }

    fn answer(&self, body: &str) -> Result<Value, ArchiveError> {
        let mut lines = body.lines();
        assert_eq!(lines.next(), Some("{}"), "header line");
        let query: Value = serde_json::from_str(lines.next().expect("query line")).unwrap();
        assert!(body.ends_with('\n'));

        let request_number = {
            let mut requests = self.requests.lock().unwrap();
            requests.push(query.clone());
            requests.len()
        };
        if *self.fail_on_request.lock().unwrap() == Some(request_number) {
            return Err(ArchiveError::transport(None, "connection reset by peer"));
        }

        let size = query["size"].as_u64().unwrap() as usize;
        let search_after = query.get("search_after").cloned();

        let mut last_cursor = self.last_cursor.lock().unwrap();
        if search_after != *last_cursor {
            return Ok(Self::error("search_after does not match the last page served"));
        }

        let start = match &search_after {
            None => 0,
            Some(cursor) => match self.docs.iter().position(|(_, sort)| sort == cursor) {
                Some(position) => position + 1,
                None => return Ok(Self::error("unknown search_after")),
            },
        };

        let page: Vec<Value> = self.docs[start..]
            .iter()
            .take(size)
            .map(|(source, sort)| json!({"_index": "tweets", "_id": source["id"], "_source": source, "sort": sort}))
            .collect();

        if let Some(last) = page.last() {
            *last_cursor = Some(last["sort"].clone());
        }

        Ok(json!({"responses": [{"took": 1, "hits": {"hits": page}, "status": 200}]}))
    }
}

impl SearchTransport for &SimulatedIndex {
    async fn msearch(&self, body: String) -> Result<Value, ArchiveError> {
        self.answer(&body)
    }
}

fn options(output: std::path::PathBuf, page_size: usize) -> PullOptions {
    PullOptions {
        output,
        page_size,
        delay: Duration::ZERO,
        checkpoint_every: None,
        resume: false,
        drop_empty: false,
    }
}

fn ids(records: &[Value]) -> Vec<String> {
    records
        .iter()
        .map(|r| r["id"].as_str().unwrap().to_string())
        .collect()
}

#[tokio::test]
async fn test_pagination_is_complete_and_ordered() {
    for (total, page_size) in [(10, 3), (9, 3), (1, 5), (25, 1), (7, 100)] {
        let index = SimulatedIndex::with_docs(total);
        let records = ArchiveExtractor::new(&index)
            .with_page_size(page_size)
            .with_delay(Duration::ZERO)
            .fetch_all()
            .await
            .unwrap();

        let expected: Vec<String> = index
            .docs
            .iter()
            .map(|(source, _)| source["id"].as_str().unwrap().to_string())
            .collect();
        assert_eq!(ids(&records), expected, "N={} P={}", total, page_size);
        assert_eq!(
            index.requests().len(),
            total.div_ceil(page_size) + 1,
            "N={} P={}",
            total,
            page_size
        );
    }
}

#[tokio::test]
async fn test_cursor_follows_last_hit() {
    let index = SimulatedIndex::with_docs(7);
    ArchiveExtractor::new(&index)
        .with_page_size(3)
        .with_delay(Duration::ZERO)
        .fetch_all()
        .await
        .unwrap();

    let requests = index.requests();
    assert!(requests[0].get("search_after").is_none());
    assert_eq!(requests[1]["search_after"], index.docs[2].1);
    assert_eq!(requests[2]["search_after"], index.docs[5].1);
    assert_eq!(requests[3]["search_after"], index.docs[6].1);
    for request in &requests {
        assert_eq!(request["sort"], json!([{"date": "desc"}, {"_id": "desc"}]));
        assert_eq!(request["query"], json!({"match_all": {}}));
    }
}

#[tokio::test]
async fn test_empty_corpus_single_request() {
    let index = SimulatedIndex::with_docs(0);
    let records = ArchiveExtractor::new(&index)
        .with_delay(Duration::ZERO)
        .fetch_all()
        .await
        .unwrap();
    assert!(records.is_empty());
    assert_eq!(index.requests().len(), 1);
}

#[tokio::test]
async fn test_delay_between_pages() {
    let index = SimulatedIndex::with_docs(4);
    let started = std::time::Instant::now();
    ArchiveExtractor::new(&index)
        .with_page_size(2)
        .with_delay(Duration::from_millis(20))
        .fetch_all()
        .await
        .unwrap();
    // two non-empty pages, one pause after each
    assert!(started.elapsed() >= Duration::from_millis(40));
}

#[tokio::test]
async fn test_pull_writes_snapshot() {
    let temp = TempDir::new().unwrap();
    let output = temp.path().join("trump_tweets.json");
    let index = SimulatedIndex::with_docs(8);

    let count = pull_with(&index, &options(output.clone(), 3)).await.unwrap();
    assert_eq!(count, 8);

    let content = std::fs::read_to_string(&output).unwrap();
    assert!(content.starts_with("[\n  {\n    \"id\": \"000008\""));
    assert!(content.ends_with("]\n"));
    let written: Vec<Value> = serde_json::from_str(&content).unwrap();
    assert_eq!(written.len(), 8);
}

#[tokio::test]
async fn test_pull_drop_empty() {
    let temp = TempDir::new().unwrap();
    let output = temp.path().join("trump_tweets.json");
    let index = SimulatedIndex::with_docs(8);

    let mut options = options(output.clone(), 3);
    options.drop_empty = true;
    let count = pull_with(&index, &options).await.unwrap();

    // docs 0 and 4 carry the empty marker
    assert_eq!(count, 6);
    let written: Vec<Value> = serde_json::from_str(&std::fs::read_to_string(&output).unwrap()).unwrap();
    assert!(written.iter().all(|r| r["text"] != "<p></p>"));
}

#[tokio::test]
async fn test_failed_pull_keeps_previous_snapshot() {
    let temp = TempDir::new().unwrap();
    let output = temp.path().join("trump_tweets.json");
    std::fs::write(&output, "[\n  \"previous\"\n]\n").unwrap();

    let index = SimulatedIndex::with_docs(10).failing_on(2);
    let err = pull_with(&index, &options(output.clone(), 3)).await.unwrap_err();

    let cause = err.downcast_ref::<ArchiveError>().expect("archive error");
    assert!(matches!(cause, ArchiveError::Transport { .. }));
    assert_eq!(
        std::fs::read_to_string(&output).unwrap(),
        "[\n  \"previous\"\n]\n"
    );
    assert_eq!(index.requests().len(), 2);
}

#[tokio::test]
async fn test_server_error_is_protocol_error() {
    struct RejectingIndex(Mutex<usize>);

    impl SearchTransport for &RejectingIndex {
        async fn msearch(&self, _body: String) -> Result<Value, ArchiveError> {
            *self.0.lock().unwrap() += 1;
            Ok(json!({"responses": [{"error": {"root_cause": [{"type": "index_not_found_exception"}]}}]}))
        }
    }

    let index = RejectingIndex(Mutex::new(0));
    let err = ArchiveExtractor::new(&index)
        .with_delay(Duration::ZERO)
        .fetch_all()
        .await
        .unwrap_err();
    assert!(matches!(err, ArchiveError::Protocol(_)));
    assert!(err.to_string().contains("index_not_found_exception"));
    assert_eq!(*index.0.lock().unwrap(), 1);
}

#[tokio::test]
async fn test_resume_after_failure() {
    let temp = TempDir::new().unwrap();
    let output = temp.path().join("trump_tweets.json");
    let checkpoint = temp.path().join("trump_tweets.json.checkpoint");

    let index = SimulatedIndex::with_docs(10).failing_on(3);
    let mut options = options(output.clone(), 3);
    options.checkpoint_every = Some(1);

    pull_with(&index, &options).await.unwrap_err();
    assert!(!output.exists());
    assert!(checkpoint.exists());

    index.recover();
    options.resume = true;
    let count = pull_with(&index, &options).await.unwrap();
    assert_eq!(count, 10);
    assert!(!checkpoint.exists());

    // 2 pages, the failed request, then 2 more pages and the empty one
    let requests = index.requests();
    assert_eq!(requests.len(), 6);
    assert_eq!(requests[3]["search_after"], index.docs[5].1);

    let written: Vec<Value> = serde_json::from_str(&std::fs::read_to_string(&output).unwrap()).unwrap();
    let expected: Vec<String> = index
        .docs
        .iter()
        .map(|(source, _)| source["id"].as_str().unwrap().to_string())
        .collect();
    assert_eq!(ids(&written), expected);
}

#[tokio::test]
async fn test_failed_write_keeps_checkpoint() {
    let temp = TempDir::new().unwrap();
    // a directory where the snapshot should go: the final rename fails
    let output = temp.path().join("trump_tweets.json");
    std::fs::create_dir(&output).unwrap();
    let checkpoint = temp.path().join("trump_tweets.json.checkpoint");

    let index = SimulatedIndex::with_docs(10);
    let mut options = options(output.clone(), 3);
    options.checkpoint_every = Some(1);

    let err = pull_with(&index, &options).await.unwrap_err();
    let cause = err.downcast_ref::<ArchiveError>().expect("archive error");
    assert!(matches!(cause, ArchiveError::Io { .. }));
    assert!(checkpoint.exists());
    assert_eq!(index.requests().len(), 5);

    // once the path is writable, resuming needs only the final empty page
    std::fs::remove_dir(&output).unwrap();
    options.resume = true;
    let count = pull_with(&index, &options).await.unwrap();
    assert_eq!(count, 10);
    assert!(!checkpoint.exists());
    assert_eq!(index.requests().len(), 6);

    let written: Vec<Value> = serde_json::from_str(&std::fs::read_to_string(&output).unwrap()).unwrap();
    assert_eq!(written.len(), 10);
}
