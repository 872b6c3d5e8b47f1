use vigil_core::{ModelConfig, ReviewConfig, Strategy};
use vigil_review::analyze::Analyzer;
use vigil_review::github::GitHubClient;
use vigil_review::pipeline::Pipeline;

fn heuristic_pipeline(server_url: &str, review: ReviewConfig) -> Pipeline {
    let github = GitHubClient::new(server_url, Some("test-token")).unwrap();
    let analyzer =
        Analyzer::from_strategy(Strategy::Heuristic, &ModelConfig::default()).unwrap();
    Pipeline::new(github, analyzer, review)
}

fn files_body(patch: &str) -> String {
    serde_json::json!([
        {
            "filename": "app.py",
            "status": "modified",
            "sha": "blob1",
            "patch": patch,
        }
    ])
    .to_string()
}

const COMMITS_BODY: &str = r#"[{"sha":"base1"},{"sha":"headsha"}]"#;

#[tokio::test]
async fn single_undocumented_function_posts_one_anchored_comment() {
    let mut server = mockito::Server::new_async().await;

    // "def foo():" sits on line 5 of the patch text, nothing else triggers
    let patch = "import os\nx = 1\ny = 2\nz = 3\ndef foo():";
    let _files = server
        .mock("GET", "/repos/octo/demo/pulls/1/files")
        .match_query(mockito::Matcher::Any)
        .with_status(200)
        .with_body(files_body(patch))
        .create_async()
        .await;
    let _commits = server
        .mock("GET", "/repos/octo/demo/pulls/1/commits")
        .match_query(mockito::Matcher::Any)
        .with_status(200)
        .with_body(COMMITS_BODY)
        .create_async()
        .await;
    let post = server
        .mock("POST", "/repos/octo/demo/pulls/1/comments")
        .match_body(mockito::Matcher::PartialJson(serde_json::json!({
            "path": "app.py",
            "line": 5,
            "side": "RIGHT",
            "commit_id": "headsha",
        })))
        .with_status(201)
        .with_body(r#"{"id":1}"#)
        .expect(1)
        .create_async()
        .await;

    let pipeline = heuristic_pipeline(&server.url(), ReviewConfig::default());
    let report = pipeline.run("octo", "demo", 1).await.unwrap();

    post.assert_async().await;
    assert_eq!(report.files_listed, 1);
    assert_eq!(report.files_analyzed, 1);
    assert_eq!(report.findings.len(), 1);
    assert_eq!(report.findings[0].line, 5);
    assert_eq!(report.comments_posted, 1);
    assert_eq!(report.publish_failures, 0);
}

#[tokio::test]
async fn rejected_comment_does_not_abort_remaining_comments() {
    let mut server = mockito::Server::new_async().await;

    // two undocumented functions -> two findings -> two publish attempts
    let patch = "def first():\n    pass\ndef second():\n    pass";
    let _files = server
        .mock("GET", "/repos/octo/demo/pulls/2/files")
        .match_query(mockito::Matcher::Any)
        .with_status(200)
        .with_body(files_body(patch))
        .create_async()
        .await;
    let _commits = server
        .mock("GET", "/repos/octo/demo/pulls/2/commits")
        .match_query(mockito::Matcher::Any)
        .with_status(200)
        .with_body(COMMITS_BODY)
        .create_async()
        .await;
    let post = server
        .mock("POST", "/repos/octo/demo/pulls/2/comments")
        .with_status(422)
        .with_body(
            r#"{"message":"Validation Failed","documentation_url":"https://docs.github.com","errors":[]}"#,
        )
        .expect(2)
        .create_async()
        .await;

    let pipeline = heuristic_pipeline(&server.url(), ReviewConfig::default());
    let report = pipeline.run("octo", "demo", 2).await.unwrap();

    // both attempts must have reached the API despite the first rejection
    post.assert_async().await;
    assert_eq!(report.findings.len(), 2);
    assert_eq!(report.comments_posted, 0);
    assert_eq!(report.publish_failures, 2);
}

#[tokio::test]
async fn file_listing_failure_is_fatal() {
    let mut server = mockito::Server::new_async().await;
    let _files = server
        .mock("GET", "/repos/octo/demo/pulls/3/files")
        .match_query(mockito::Matcher::Any)
        .with_status(500)
        .with_body("server error")
        .create_async()
        .await;

    let pipeline = heuristic_pipeline(&server.url(), ReviewConfig::default());
    assert!(pipeline.run("octo", "demo", 3).await.is_err());
}

#[tokio::test]
async fn unfetchable_file_is_skipped_not_fatal() {
    let mut server = mockito::Server::new_async().await;

    let files = serde_json::json!([
        {
            "filename": "app.py",
            "status": "modified",
            "sha": "blob1",
            "contents_url": format!("{}/repos/octo/demo/contents/app.py?ref=blob1", server.url()),
        }
    ]);
    let _files = server
        .mock("GET", "/repos/octo/demo/pulls/4/files")
        .match_query(mockito::Matcher::Any)
        .with_status(200)
        .with_body(files.to_string())
        .create_async()
        .await;
    let _commits = server
        .mock("GET", "/repos/octo/demo/pulls/4/commits")
        .match_query(mockito::Matcher::Any)
        .with_status(200)
        .with_body(COMMITS_BODY)
        .create_async()
        .await;
    let _contents = server
        .mock("GET", "/repos/octo/demo/contents/app.py")
        .match_query(mockito::Matcher::Any)
        .with_status(404)
        .with_body(r#"{"message":"Not Found"}"#)
        .create_async()
        .await;

    let review = ReviewConfig {
        fetch_contents: true,
        ..ReviewConfig::default()
    };
    let pipeline = heuristic_pipeline(&server.url(), review);
    let report = pipeline.run("octo", "demo", 4).await.unwrap();

    assert_eq!(report.files_listed, 1);
    assert_eq!(report.files_skipped, 1);
    assert_eq!(report.files_analyzed, 0);
    assert!(report.findings.is_empty());
}

#[tokio::test]
async fn allowlist_and_removed_files_are_filtered() {
    let mut server = mockito::Server::new_async().await;

    let files = serde_json::json!([
        {"filename": "app.py", "status": "modified", "sha": "a", "patch": "def f():"},
        {"filename": "notes.md", "status": "modified", "sha": "b", "patch": "def not_code():"},
        {"filename": "old.py", "status": "removed", "sha": "c", "patch": "-def gone():"},
    ]);
    let _files = server
        .mock("GET", "/repos/octo/demo/pulls/5/files")
        .match_query(mockito::Matcher::Any)
        .with_status(200)
        .with_body(files.to_string())
        .create_async()
        .await;
    let _commits = server
        .mock("GET", "/repos/octo/demo/pulls/5/commits")
        .match_query(mockito::Matcher::Any)
        .with_status(200)
        .with_body(COMMITS_BODY)
        .create_async()
        .await;

    let pipeline = heuristic_pipeline(&server.url(), ReviewConfig::default()).dry_run();
    let report = pipeline.run("octo", "demo", 5).await.unwrap();

    assert_eq!(report.files_listed, 3);
    assert_eq!(report.files_analyzed, 1);
    assert_eq!(report.files_skipped, 2);
    assert_eq!(report.findings.len(), 1);
    assert_eq!(report.findings[0].file_path.to_string_lossy(), "app.py");
    // dry run publishes nothing
    assert_eq!(report.comments_posted, 0);
}

#[tokio::test]
async fn batch_mode_posts_single_review_submission() {
    let mut server = mockito::Server::new_async().await;

    let patch = "def first():\n    pass\ndef second():\n    pass";
    let _files = server
        .mock("GET", "/repos/octo/demo/pulls/6/files")
        .match_query(mockito::Matcher::Any)
        .with_status(200)
        .with_body(files_body(patch))
        .create_async()
        .await;
    let _commits = server
        .mock("GET", "/repos/octo/demo/pulls/6/commits")
        .match_query(mockito::Matcher::Any)
        .with_status(200)
        .with_body(COMMITS_BODY)
        .create_async()
        .await;
    let review_post = server
        .mock("POST", "/repos/octo/demo/pulls/6/reviews")
        .match_body(mockito::Matcher::PartialJson(serde_json::json!({
            "event": "COMMENT",
            "commit_id": "headsha",
        })))
        .with_status(200)
        .with_body(r#"{"id":99}"#)
        .expect(1)
        .create_async()
        .await;

    let review = ReviewConfig {
        batch: true,
        ..ReviewConfig::default()
    };
    let pipeline = heuristic_pipeline(&server.url(), review);
    let report = pipeline.run("octo", "demo", 6).await.unwrap();

    review_post.assert_async().await;
    assert_eq!(report.findings.len(), 2);
    assert_eq!(report.comments_posted, 2);
    assert_eq!(report.publish_failures, 0);
}

#[tokio::test]
async fn file_level_mode_sends_at_most_one_result_per_file() {
    let mut server = mockito::Server::new_async().await;

    // classifier strategy: exactly one file-level finding per analyzed file
    let files = serde_json::json!([
        {"filename": "a.py", "status": "modified", "sha": "a", "patch": "def f():"},
        {"filename": "b.py", "status": "added", "sha": "b", "patch": "def g():"},
    ]);
    let _files = server
        .mock("GET", "/repos/octo/demo/pulls/7/files")
        .match_query(mockito::Matcher::Any)
        .with_status(200)
        .with_body(files.to_string())
        .create_async()
        .await;
    let _commits = server
        .mock("GET", "/repos/octo/demo/pulls/7/commits")
        .match_query(mockito::Matcher::Any)
        .with_status(200)
        .with_body(COMMITS_BODY)
        .create_async()
        .await;
    let _model = server
        .mock("POST", "/models/codebert-base")
        .with_status(200)
        .with_body(r#"[[{"label":"LABEL_0","score":0.8},{"label":"LABEL_1","score":0.2}]]"#)
        .expect(2)
        .create_async()
        .await;

    let github = GitHubClient::new(&server.url(), Some("test-token")).unwrap();
    let model = ModelConfig {
        base_url: server.url(),
        model: "codebert-base".into(),
        ..ModelConfig::default()
    };
    let analyzer = Analyzer::from_strategy(Strategy::Classifier, &model).unwrap();
    let pipeline = Pipeline::new(github, analyzer, ReviewConfig::default()).dry_run();

    let report = pipeline.run("octo", "demo", 7).await.unwrap();
    assert_eq!(report.files_analyzed, 2);
    // one finding per file, no duplication across the per-file pipeline
    assert_eq!(report.findings.len(), 2);
    assert!(report.findings.iter().all(|f| f.line == 1));
}
