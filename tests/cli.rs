use std::fs;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::process::Command;

use axum::routing::post;
use axum::{Json, Router};
use serde_json::{json, Value};
use tempfile::TempDir;

const LEGACY: &str = r#"[
  {"id": "1000", "title": "Older Paper", "date": "2021-05-01",
   "text": "Older Paper\n1 Intro\nold\n\n",
   "sections": [{"title": "1 Intro", "content": "old\n"}],
   "fileData": "data:application/pdf;base64,JVBERi0xLjc="},
  {"id": "2000", "title": "Newer Paper", "date": "2024-09-30",
   "sections": [
     {"title": "Introduction", "content": "Newer Paper\n"},
     {"title": "1 Method", "content": "We measure.\n"},
     {"title": "2 Results", "content": "FAIL on purpose\n"},
     {"title": "10 Appendix", "content": "Tables.\n"}
   ]}
]"#;

fn setup(base_url: Option<&str>) -> (TempDir, PathBuf) {
    let tmp = TempDir::new().unwrap();
    let root = tmp.path();
    fs::create_dir_all(root.join("config")).unwrap();
    fs::write(root.join("papers.json"), LEGACY).unwrap();

    let mut config = format!(
        "[db]\npath = \"{}\"\n\n[legacy]\npath = \"{}\"\n",
        root.join("data").join("papers.sqlite").display(),
        root.join("papers.json").display()
    );
    if let Some(url) = base_url {
        config.push_str(&format!("\n[summarizer]\nbase_url = \"{}\"\n", url));
    }
    let config_path = root.join("config").join("digest.toml");
    fs::write(&config_path, config).unwrap();
    (tmp, config_path)
}

fn run_digest(config_path: &Path, args: &[&str]) -> (String, String, bool) {
    let output = Command::new(env!("CARGO_BIN_EXE_digest"))
        .arg("--config")
        .arg(config_path)
        .args(args)
        .output()
        .expect("Failed to run digest binary");

    (
        String::from_utf8_lossy(&output.stdout).to_string(),
        String::from_utf8_lossy(&output.stderr).to_string(),
        output.status.success(),
    )
}

#[test]
fn init_is_idempotent() {
    let (_tmp, config) = setup(None);
    let (stdout, stderr, ok) = run_digest(&config, &["init"]);
    assert!(ok, "init failed: {}", stderr);
    assert!(stdout.contains("initialized"));
    let (_, _, ok) = run_digest(&config, &["init"]);
    assert!(ok);
}

#[test]
fn list_migrates_legacy_and_sorts_by_date() {
    let (tmp, config) = setup(None);
    let (stdout, stderr, ok) = run_digest(&config, &["list"]);
    assert!(ok, "list failed: {}", stderr);
    assert!(!tmp.path().join("papers.json").exists());

    let newer = stdout.find("Newer Paper").unwrap();
    let older = stdout.find("Older Paper").unwrap();
    assert!(newer < older, "{}", stdout);

    let (stdout, _, _) = run_digest(&config, &["list", "--order", "asc"]);
    assert!(stdout.find("Older Paper").unwrap() < stdout.find("Newer Paper").unwrap());
}

#[test]
fn show_edit_export_and_delete() {
    let (tmp, config) = setup(None);

    let (stdout, _, ok) = run_digest(&config, &["show", "1000"]);
    assert!(ok);
    assert!(stdout.contains("[1] 1 Intro"));
    assert!(stdout.contains("8 bytes"));

    let (_, _, ok) = run_digest(
        &config,
        &["edit", "1000", "--title", "Renamed", "--date", "2020-01-01"],
    );
    assert!(ok);
    let (stdout, _, _) = run_digest(&config, &["show", "1000"]);
    assert!(stdout.contains("Renamed"));
    assert!(stdout.contains("2020-01-01"));

    let out = tmp.path().join("out.pdf");
    let (_, stderr, ok) = run_digest(&config, &["export-file", "1000", out.to_str().unwrap()]);
    assert!(ok, "{}", stderr);
    assert_eq!(fs::read(&out).unwrap(), b"%PDF-1.7");

    let (_, _, ok) = run_digest(&config, &["export-file", "2000", out.to_str().unwrap()]);
    assert!(!ok, "paper without a file cannot be exported");

    let (_, _, ok) = run_digest(&config, &["delete", "1000"]);
    assert!(ok);
    let (_, stderr, ok) = run_digest(&config, &["show", "1000"]);
    assert!(!ok);
    assert!(stderr.contains("paper not found: 1000"));
}

#[test]
fn edit_rejects_bad_date() {
    let (_tmp, config) = setup(None);
    let (_, stderr, ok) = run_digest(&config, &["edit", "1000", "--date", "May 1st"]);
    assert!(!ok);
    assert!(stderr.contains("Invalid date"));
}

#[test]
fn edit_summary_by_hand() {
    let (tmp, config) = setup(None);

    let (_, stderr, ok) = run_digest(&config, &["edit-summary", "1000", "--text", "Typed by hand."]);
    assert!(ok, "{}", stderr);
    let (stdout, _, _) = run_digest(&config, &["show", "1000"]);
    assert!(stdout.contains("summarized: yes"), "{}", stdout);
    assert!(stdout.contains("Typed by hand."));

    let notes = tmp.path().join("notes.txt");
    fs::write(&notes, "From a file.\n").unwrap();
    let (_, stderr, ok) = run_digest(
        &config,
        &["edit-summary", "1000", "--file", notes.to_str().unwrap()],
    );
    assert!(ok, "{}", stderr);
    let (stdout, _, _) = run_digest(&config, &["show", "1000"]);
    assert!(stdout.contains("From a file."));
    assert!(!stdout.contains("Typed by hand."));

    let (_, stderr, ok) = run_digest(
        &config,
        &["edit-summary", "1000", "--section", "1 Intro", "--text", "x"],
    );
    assert!(!ok);
    assert!(stderr.contains("no saved summary"), "{}", stderr);

    let (_, _, ok) = run_digest(&config, &["edit-summary", "1000"]);
    assert!(!ok, "text or file is required");
}

#[test]
fn add_rejects_unreadable_pdf() {
    let (tmp, config) = setup(None);
    let bogus = tmp.path().join("bogus.pdf");
    fs::write(&bogus, b"this is not a pdf").unwrap();

    let (_, stderr, ok) = run_digest(&config, &["add", bogus.to_str().unwrap(), "--progress", "off"]);
    assert!(!ok);
    assert!(stderr.contains("Failed to extract text"), "{}", stderr);

    let (stdout, _, _) = run_digest(&config, &["list"]);
    assert_eq!(stdout.lines().filter(|l| l.contains("Paper")).count(), 2);
}

#[test]
fn summarize_requires_service_url() {
    let (_tmp, config) = setup(None);
    let (_, stderr, ok) = run_digest(&config, &["summarize-all", "2000"]);
    assert!(!ok);
    assert!(stderr.contains("base_url"));
}

async fn section(Json(body): Json<Value>) -> Json<Value> {
    let content = body["content"].as_str().unwrap_or_default();
    if content.contains("FAIL") {
        return Json(json!({"error": "model overloaded"}));
    }
    Json(json!({"reply": format!("summary of {}", content.trim())}))
}

async fn full(Json(body): Json<Value>) -> Json<Value> {
    Json(json!({"reply": format!("all of {}", body["title"].as_str().unwrap_or_default())}))
}

async fn serve() -> SocketAddr {
    let app = Router::new()
        .route("/summarize-section", post(section))
        .route("/summarize-full", post(full));
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    addr
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn summarize_sections_isolates_failures() {
    let addr = serve().await;
    let (_tmp, config) = setup(Some(&format!("http://{}", addr)));
    let config_again = config.clone();

    let (summarized, listed, whole) = tokio::task::spawn_blocking(move || {
        let summarized = run_digest(
            &config,
            &["summarize", "2000", "--section", "4", "--section", "3", "--section", "2"],
        );
        let listed = run_digest(&config, &["summaries", "2000"]);
        let whole = run_digest(&config, &["summarize-all", "2000"]);
        (summarized, listed, whole)
    })
    .await
    .unwrap();

    assert!(summarized.2, "summarize failed: {}", summarized.1);
    assert!(summarized.0.contains("summary of Tables."));
    assert!(summarized.1.contains("2 Results"));

    assert!(whole.2, "summarize-all failed: {}", whole.1);
    assert!(whole.0.contains("all of Newer Paper"));

    let (stdout, stderr, ok) = listed;
    assert!(ok, "summaries failed: {}", stderr);
    let method = stdout.find("## 1 Method").unwrap();
    let appendix = stdout.find("## 10 Appendix").unwrap();
    assert!(method < appendix, "{}", stdout);
    assert!(!stdout.contains("## 2 Results"));

    let (edited, listed) = tokio::task::spawn_blocking(move || {
        let edited = run_digest(
            &config_again,
            &["edit-summary", "2000", "--section", "10 Appendix", "--text", "Rewritten."],
        );
        (edited, run_digest(&config_again, &["summaries", "2000"]))
    })
    .await
    .unwrap();
    assert!(edited.2, "edit-summary failed: {}", edited.1);
    assert!(listed.0.contains("Rewritten."), "{}", listed.0);
    assert!(!listed.0.contains("summary of Tables."));
    assert!(listed.0.find("## 1 Method").unwrap() < listed.0.find("## 10 Appendix").unwrap());
}
