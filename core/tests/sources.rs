mod common;

use std::io::Write;
use std::time::Duration;

use common::jsonl;
use devlog_core::api::{follow_file, read_batch, FollowOptions, ViewerError};
use serde_json::json;
use tokio::sync::{mpsc, oneshot};

#[test]
fn last_n_restricts_to_final_raw_lines() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("events.jsonl");
    let body = jsonl(
        &(1..=5)
            .map(|i| json!({"type": "info", "subtype": "tick", "ts": i * 1000}))
            .collect::<Vec<_>>(),
    );
    std::fs::write(&path, body).unwrap();

    let batch = read_batch(&path, 2).unwrap();
    let ts: Vec<i64> = batch.records.iter().map(|r| r.timestamp).collect();
    assert_eq!(ts, vec![4000, 5000]);
}

#[test]
fn malformed_line_reports_one_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("events.jsonl");
    std::fs::write(&path, "{not json\n{\"type\":\"info\"}\n").unwrap();

    let batch = read_batch(&path, 0).unwrap();
    assert_eq!(batch.records.len(), 1);
    assert_eq!(batch.errors.len(), 1);
    assert_eq!(batch.errors[0].preview, "{not json");
}

#[test]
fn missing_file_is_fatal() {
    let dir = tempfile::tempdir().unwrap();
    let err = read_batch(&dir.path().join("absent.jsonl"), 0).unwrap_err();
    assert!(matches!(err, ViewerError::FileNotFound(_)));
    assert_eq!(err.exit_code(), 1);
}

#[tokio::test]
async fn follow_prints_only_appended_records() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("live.jsonl");
    std::fs::write(&path, "{\"type\":\"info\",\"subtype\":\"before\"}\n").unwrap();

    let opts = FollowOptions {
        verbose: false,
        poll_interval: Duration::from_millis(10),
        flush_interval: Duration::from_millis(50),
        batch_threshold: 50,
    };
    let (line_tx, mut line_rx) = mpsc::unbounded_channel::<String>();
    let (stop_tx, stop_rx) = oneshot::channel::<()>();

    let follow_path = path.clone();
    let task = tokio::spawn(async move {
        follow_file(
            &follow_path,
            opts,
            |line| {
                let _ = line_tx.send(line.to_string());
            },
            async {
                let _ = stop_rx.await;
            },
        )
        .await
    });

    tokio::time::sleep(Duration::from_millis(100)).await;
    {
        let mut f = std::fs::OpenOptions::new().append(true).open(&path).unwrap();
        writeln!(f, "{{\"type\":\"interactionUpdate\",\"subtype\":\"textDelta\",\"data\":{{\"text\":\"hi\"}}}}").unwrap();
        writeln!(f, "{{\"type\":\"kvClient\"}}").unwrap();
        writeln!(f, "{{\"type\":\"info\",\"subtype\":\"after\"}}").unwrap();
    }

    let mut lines = Vec::new();
    while lines.len() < 2 {
        match tokio::time::timeout(Duration::from_secs(5), line_rx.recv()).await {
            Ok(Some(line)) => lines.push(line),
            _ => break,
        }
    }
    let _ = stop_tx.send(());
    task.await.unwrap().unwrap();

    assert_eq!(
        lines,
        vec![
            "[??:??:??] text: hi".to_string(),
            "[??:??:??] info:after".to_string(),
        ]
    );
}

#[tokio::test]
async fn shutdown_flushes_buffered_records_and_open_text() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("live.jsonl");
    std::fs::write(&path, "").unwrap();

    let opts = FollowOptions {
        verbose: false,
        poll_interval: Duration::from_millis(10),
        flush_interval: Duration::from_secs(600),
        batch_threshold: 1000,
    };
    let (line_tx, mut line_rx) = mpsc::unbounded_channel::<String>();
    let (stop_tx, stop_rx) = oneshot::channel::<()>();

    let follow_path = path.clone();
    let task = tokio::spawn(async move {
        follow_file(
            &follow_path,
            opts,
            |line| {
                let _ = line_tx.send(line.to_string());
            },
            async {
                let _ = stop_rx.await;
            },
        )
        .await
    });

    tokio::time::sleep(Duration::from_millis(100)).await;
    {
        let mut f = std::fs::OpenOptions::new().append(true).open(&path).unwrap();
        for text in ["he", "llo"] {
            writeln!(f, "{{\"type\":\"interactionUpdate\",\"subtype\":\"textDelta\",\"data\":{{\"text\":\"{text}\"}}}}").unwrap();
        }
        writeln!(f, "{{\"type\":\"info\",\"subtype\":\"mid\"}}").unwrap();
        writeln!(f, "{{\"type\":\"interactionUpdate\",\"subtype\":\"textDelta\",\"data\":{{\"text\":\"tail\"}}}}").unwrap();
    }

    tokio::time::sleep(Duration::from_millis(300)).await;
    assert!(line_rx.try_recv().is_err(), "nothing is due before shutdown");

    let _ = stop_tx.send(());
    task.await.unwrap().unwrap();

    let mut lines = Vec::new();
    while let Ok(line) = line_rx.try_recv() {
        lines.push(line);
    }
    assert_eq!(
        lines,
        vec![
            "[??:??:??] text: hello".to_string(),
            "[??:??:??] info:mid".to_string(),
            "[??:??:??] text: tail".to_string(),
        ]
    );
}
