use std::sync::Arc;
use tracing::Instrument;

use crate::api_client::ApiClient;
use crate::config::{CleanupConfig, PathRules};
use crate::remover::ObjectRemover;
use crate::storage_key::derive_key;

#[derive(Debug, Clone)]
pub struct CleanupSettings {
    pub bucket: String,
    pub paths: PathRules,
    pub list_endpoint: String,
    pub mark_deleted_endpoint: String,
    pub dry_run: bool,
}

impl CleanupSettings {
    pub fn from_config(config: &CleanupConfig, dry_run: bool) -> Self {
        CleanupSettings {
            bucket: config.storage.bucket.clone(),
            paths: config.paths.clone(),
            list_endpoint: config.api.endpoints.list.clone(),
            mark_deleted_endpoint: config.api.endpoints.mark_deleted.clone(),
            dry_run,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepOutcome {
    Succeeded,
    Failed(String),
    Skipped(&'static str),
}

impl StepOutcome {
    pub fn succeeded(&self) -> bool {
        matches!(self, StepOutcome::Succeeded)
    }

    pub fn failed(&self) -> bool {
        matches!(self, StepOutcome::Failed(_))
    }
}

#[derive(Debug, Clone)]
pub struct ItemReport {
    pub candidate: String,
    pub key: String,
    pub removal: StepOutcome,
    pub mark: StepOutcome,
}

/// What happened during one cleanup pass.
#[derive(Debug, Default)]
pub struct RunReport {
    /// Set when the candidate list could not be fetched.
    pub list_error: Option<String>,
    pub items: Vec<ItemReport>,
}

impl RunReport {
    pub fn candidates(&self) -> usize {
        self.items.len()
    }

    pub fn removed(&self) -> usize {
        self.items.iter().filter(|i| i.removal.succeeded()).count()
    }

    pub fn marked(&self) -> usize {
        self.items.iter().filter(|i| i.mark.succeeded()).count()
    }

    /// Items where at least one step failed.
    pub fn failed(&self) -> usize {
        self.items
            .iter()
            .filter(|i| i.removal.failed() || i.mark.failed())
            .count()
    }
}

/// One pass of the deletion workflow.
///
/// Candidates are processed one after the other. A failure on one item is
/// recorded in its [`ItemReport`] and never stops the remaining items, and
/// the file is marked deleted whatever the outcome of the removal step.
pub struct Cleanup {
    api: ApiClient,
    remover: Arc<dyn ObjectRemover>,
    settings: CleanupSettings,
}

impl Cleanup {
    pub fn new(api: ApiClient, remover: Arc<dyn ObjectRemover>, settings: CleanupSettings) -> Self {
        Cleanup {
            api,
            remover,
            settings,
        }
    }

    pub async fn run(&self) -> RunReport {
        let mut report = RunReport::default();

        tracing::info!(
            bucket = %self.settings.bucket,
            strategy = self.remover.name(),
            dry_run = self.settings.dry_run,
            "Fetching files to delete"
        );

        let candidates = match self.api.list_candidates(&self.settings.list_endpoint).await {
            Ok(candidates) => candidates,
            Err(e) => {
                tracing::warn!(error = %e, "Could not fetch files to delete, treating as no work");
                report.list_error = Some(e.to_string());
                return report;
            }
        };

        if candidates.is_empty() {
            tracing::info!("No files to delete");
            return report;
        }

        tracing::info!(count = candidates.len(), "Processing files to delete");

        for candidate in &candidates {
            let span = tracing::info_span!("cleanup_item", candidate = %candidate);
            let item = self.process(candidate).instrument(span).await;
            report.items.push(item);
        }

        tracing::info!(
            candidates = report.candidates(),
            removed = report.removed(),
            marked = report.marked(),
            failed = report.failed(),
            "File cleanup completed"
        );

        report
    }

    async fn process(&self, candidate: &str) -> ItemReport {
        let key = derive_key(
            &self.settings.paths.base_path,
            &self.settings.paths.root_path,
            candidate,
        );

        if self.settings.dry_run {
            tracing::info!(%key, bucket = %self.settings.bucket, "Dry run, would delete");
            return ItemReport {
                candidate: candidate.to_string(),
                key,
                removal: StepOutcome::Skipped("dry run"),
                mark: StepOutcome::Skipped("dry run"),
            };
        }

        tracing::info!(%key, bucket = %self.settings.bucket, "Deleting file");
        let removal = match self.remover.remove(&self.settings.bucket, &key).await {
            Ok(()) => {
                tracing::info!(%key, "Deleted file");
                StepOutcome::Succeeded
            }
            Err(e) => {
                tracing::warn!(%key, error = %e, "Failed to delete file");
                StepOutcome::Failed(e.to_string())
            }
        };

        // The API is told about the deletion even when removal failed.
        let mark = if candidate.trim().is_empty() {
            tracing::warn!("Blank file name in candidate list, not marking it deleted");
            StepOutcome::Skipped("blank file name")
        } else {
            match self
                .api
                .mark_deleted(&self.settings.mark_deleted_endpoint, candidate)
                .await
            {
                Ok(()) => {
                    tracing::info!("Marked file as deleted");
                    StepOutcome::Succeeded
                }
                Err(e) => {
                    tracing::warn!(error = %e, "Failed to mark file as deleted");
                    StepOutcome::Failed(e.to_string())
                }
            }
        };

        ItemReport {
            candidate: candidate.to_string(),
            key,
            removal,
            mark,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ApiConfig, Endpoints};
    use crate::error::CallError;
    use crate::remover::ApiRemover;
    use async_trait::async_trait;
    use serde_json::json;
    use std::sync::Mutex;
    use wiremock::matchers::{body_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const LIST: &str = "/files/to-delete";
    const MARK: &str = "/files/mark-deleted";
    const DELETE: &str = "/files/delete";
    const BUCKET: &str = "event-files";

    /// Records every key it is asked to remove and fails on chosen ones.
    #[derive(Default)]
    struct RecordingRemover {
        failing_keys: Vec<String>,
        calls: Mutex<Vec<String>>,
    }

    impl RecordingRemover {
        fn failing_on(keys: &[&str]) -> Self {
            RecordingRemover {
                failing_keys: keys.iter().map(|k| k.to_string()).collect(),
                calls: Mutex::new(Vec::new()),
            }
        }

        fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl ObjectRemover for RecordingRemover {
        fn name(&self) -> &'static str {
            "recording"
        }

        async fn remove(&self, _bucket: &str, key: &str) -> Result<(), CallError> {
            self.calls.lock().unwrap().push(key.to_string());
            if self.failing_keys.iter().any(|k| k == key) {
                return Err(CallError::Storage(format!("refused {key}")));
            }
            Ok(())
        }
    }

    fn api_for(server: &MockServer) -> ApiClient {
        ApiClient::new(&ApiConfig {
            base_url: server.uri(),
            token: "token".to_string(),
            endpoints: Endpoints {
                list: LIST.to_string(),
                mark_deleted: MARK.to_string(),
                delete: DELETE.to_string(),
            },
        })
        .unwrap()
    }

    fn settings(dry_run: bool) -> CleanupSettings {
        CleanupSettings {
            bucket: BUCKET.to_string(),
            paths: PathRules {
                base_path: "/srv/uploads/events/".to_string(),
                root_path: "/srv/uploads/".to_string(),
            },
            list_endpoint: LIST.to_string(),
            mark_deleted_endpoint: MARK.to_string(),
            dry_run,
        }
    }

    async fn mount_candidates(server: &MockServer, files: &[&str]) {
        Mock::given(method("GET"))
            .and(path(LIST))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "results": { "Data": files, "Message": "", "ResponseCode": true }
            })))
            .expect(1)
            .mount(server)
            .await;
    }

    async fn mount_mark(server: &MockServer, status: u16, expected_calls: u64) {
        Mock::given(method("POST"))
            .and(path(MARK))
            .respond_with(ResponseTemplate::new(status))
            .expect(expected_calls)
            .mount(server)
            .await;
    }

    #[tokio::test]
    async fn empty_candidate_list_does_nothing() {
        let server = MockServer::start().await;
        mount_candidates(&server, &[]).await;
        mount_mark(&server, 200, 0).await;
        let remover = Arc::new(RecordingRemover::default());

        let report = Cleanup::new(api_for(&server), remover.clone(), settings(false))
            .run()
            .await;

        assert_eq!(report.candidates(), 0);
        assert!(report.list_error.is_none());
        assert!(remover.calls().is_empty());
    }

    #[tokio::test]
    async fn list_failure_is_treated_as_no_work() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(LIST))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;
        mount_mark(&server, 200, 0).await;
        let remover = Arc::new(RecordingRemover::default());

        let report = Cleanup::new(api_for(&server), remover.clone(), settings(false))
            .run()
            .await;

        assert_eq!(report.candidates(), 0);
        assert!(report.list_error.as_deref().unwrap().contains("500"));
        assert!(remover.calls().is_empty());
    }

    #[tokio::test]
    async fn every_candidate_is_removed_and_marked() {
        let server = MockServer::start().await;
        mount_candidates(&server, &["file1.txt", "file2.txt"]).await;
        for file in ["file1.txt", "file2.txt"] {
            Mock::given(method("POST"))
                .and(path(MARK))
                .and(body_json(json!({ "fileToDelete": file })))
                .respond_with(ResponseTemplate::new(200))
                .expect(1)
                .mount(&server)
                .await;
        }
        let remover = Arc::new(RecordingRemover::default());

        let report = Cleanup::new(api_for(&server), remover.clone(), settings(false))
            .run()
            .await;

        assert_eq!(remover.calls(), vec!["events/file1.txt", "events/file2.txt"]);
        assert_eq!(report.removed(), 2);
        assert_eq!(report.marked(), 2);
        assert_eq!(report.failed(), 0);
    }

    #[tokio::test]
    async fn one_failing_item_does_not_stop_the_batch() {
        let server = MockServer::start().await;
        mount_candidates(&server, &["one.txt", "two.txt", "three.txt"]).await;
        mount_mark(&server, 200, 3).await;
        let remover = Arc::new(RecordingRemover::failing_on(&["events/two.txt"]));

        let report = Cleanup::new(api_for(&server), remover.clone(), settings(false))
            .run()
            .await;

        assert_eq!(
            remover.calls(),
            vec!["events/one.txt", "events/two.txt", "events/three.txt"]
        );
        assert_eq!(report.removed(), 2);
        assert_eq!(report.failed(), 1);
        assert!(report.items[1].removal.failed());
        assert!(report.items[2].removal.succeeded());
    }

    #[tokio::test]
    async fn failed_delete_is_still_marked_deleted() {
        let server = MockServer::start().await;
        mount_candidates(&server, &["bad.txt"]).await;
        Mock::given(method("POST"))
            .and(path(DELETE))
            .and(body_json(json!({ "bucketName": BUCKET, "keyName": "events/bad.txt" })))
            .respond_with(ResponseTemplate::new(500))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path(MARK))
            .and(body_json(json!({ "fileToDelete": "bad.txt" })))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;
        let api = api_for(&server);
        let remover = Arc::new(ApiRemover::new(api.clone(), DELETE));

        let report = Cleanup::new(api, remover, settings(false)).run().await;

        let item = &report.items[0];
        assert!(item.removal.failed());
        assert_eq!(item.mark, StepOutcome::Succeeded);
    }

    #[tokio::test]
    async fn mark_failure_is_recorded_per_item() {
        let server = MockServer::start().await;
        mount_candidates(&server, &["a.txt", "b.txt"]).await;
        mount_mark(&server, 404, 2).await;
        let remover = Arc::new(RecordingRemover::default());

        let report = Cleanup::new(api_for(&server), remover.clone(), settings(false))
            .run()
            .await;

        assert_eq!(remover.calls().len(), 2);
        assert_eq!(report.marked(), 0);
        assert_eq!(report.failed(), 2);
    }

    #[tokio::test]
    async fn dry_run_touches_nothing() {
        let server = MockServer::start().await;
        mount_candidates(&server, &["a.txt"]).await;
        mount_mark(&server, 200, 0).await;
        let remover = Arc::new(RecordingRemover::default());

        let report = Cleanup::new(api_for(&server), remover.clone(), settings(true))
            .run()
            .await;

        assert!(remover.calls().is_empty());
        assert_eq!(report.items[0].key, "events/a.txt");
        assert_eq!(report.items[0].removal, StepOutcome::Skipped("dry run"));
    }

    #[tokio::test]
    async fn blank_candidates_are_removed_but_not_marked() {
        let server = MockServer::start().await;
        mount_candidates(&server, &["", " ", "x.txt"]).await;
        Mock::given(method("POST"))
            .and(path(DELETE))
            .respond_with(ResponseTemplate::new(200))
            .expect(3)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path(MARK))
            .and(body_json(json!({ "fileToDelete": "x.txt" })))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;
        let api = api_for(&server);
        let remover = Arc::new(ApiRemover::new(api.clone(), DELETE));

        let report = Cleanup::new(api, remover, settings(false)).run().await;

        assert_eq!(report.candidates(), 3);
        assert_eq!(report.removed(), 3);
        assert_eq!(report.items[0].mark, StepOutcome::Skipped("blank file name"));
        assert_eq!(report.items[1].mark, StepOutcome::Skipped("blank file name"));
        assert_eq!(report.marked(), 1);
    }
}
