// 🔄 Pipeline - text → validated records → concurrent registry checks
//
// Flow:
//   1. Extract candidates (person lines or bare numbers)
//   2. Validate + stamp records, prepend them to the store (newest first)
//   3. One task per valid record asks the registry, then writes its own
//      record back by id
//
// Invalid records start as ERROR and never reach the registry. Checks are
// never cancelled: they run to completion whether or not anyone holds the
// submission handle.

use crate::error::{Result, ValidGuardError};
use crate::extraction::{extract_id_numbers, extract_records, CandidateRecord};
use crate::records::{RecordStore, RegistryStatus, ValidatedRecord};
use crate::registry::RegistryClient;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{info, warn};

/// One resolved registry check
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusUpdate {
    pub id: String,
    pub status: RegistryStatus,
}

/// Orchestrates validation and registry checks against a shared store
#[derive(Clone)]
pub struct Pipeline {
    store: RecordStore,
    client: Arc<dyn RegistryClient>,
}

impl Pipeline {
    pub fn new(store: RecordStore, client: Arc<dyn RegistryClient>) -> Self {
        Pipeline { store, client }
    }

    pub fn store(&self) -> &RecordStore {
        &self.store
    }

    /// Person lines ("NOME 06819885253 08/07/1957") from free text.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn process_text(&self, text: &str) -> Result<Submission> {
        self.submit_records(extract_records(text))
    }

    /// Loose list of punctuated or bare numbers.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn process_id_list(&self, text: &str) -> Result<Submission> {
        self.submit_id_numbers(extract_id_numbers(text))
    }

    pub fn submit_records(&self, candidates: Vec<CandidateRecord>) -> Result<Submission> {
        let records = candidates
            .into_iter()
            .map(ValidatedRecord::from_candidate)
            .collect();
        self.submit(records)
    }

    pub fn submit_id_numbers(&self, numbers: Vec<String>) -> Result<Submission> {
        let records = numbers
            .into_iter()
            .map(ValidatedRecord::from_id_number)
            .collect();
        self.submit(records)
    }

    fn submit(&self, records: Vec<ValidatedRecord>) -> Result<Submission> {
        if records.is_empty() {
            return Err(ValidGuardError::EmptyInput);
        }

        let record_ids: Vec<String> = records.iter().map(|r| r.id.clone()).collect();
        let to_check: Vec<(String, String)> = records
            .iter()
            .filter(|r| r.awaiting_registry())
            .map(|r| (r.id.clone(), r.id_number.clone()))
            .collect();

        info!(
            records = records.len(),
            registry_checks = to_check.len(),
            "submission accepted"
        );

        // Records must be visible before any check can resolve
        self.store.prepend_batch(records);

        let outstanding = to_check.len();
        let (updates_tx, updates) = mpsc::unbounded_channel();
        for (id, id_number) in to_check {
            let store = self.store.clone();
            let client = Arc::clone(&self.client);
            let updates_tx = updates_tx.clone();

            tokio::spawn(async move {
                let status = match client.check_status(&id_number, true).await {
                    Ok(status) => status,
                    Err(e) => {
                        warn!(record_id = %id, error = %e, "registry lookup failed");
                        RegistryStatus::Error
                    }
                };

                store.update_status(&id, status);
                // Receiver may be gone; the store is already updated
                let _ = updates_tx.send(StatusUpdate { id, status });
            });
        }

        Ok(Submission {
            record_ids,
            outstanding,
            updates,
        })
    }
}

/// Handle over the registry checks launched by one submission.
///
/// Only observes the checks. Dropping it leaves them running, and each one
/// still writes its result to the store.
pub struct Submission {
    record_ids: Vec<String>,
    outstanding: usize,
    updates: mpsc::UnboundedReceiver<StatusUpdate>,
}

impl Submission {
    /// Ids of every record in the submission, in input order
    pub fn record_ids(&self) -> &[String] {
        &self.record_ids
    }

    /// Checks not yet observed through `next_update`
    pub fn outstanding(&self) -> usize {
        self.outstanding
    }

    /// Next resolved check, in completion order. The store already reflects
    /// it when this returns.
    pub async fn next_update(&mut self) -> Option<StatusUpdate> {
        if self.outstanding == 0 {
            return None;
        }

        match self.updates.recv().await {
            Some(update) => {
                self.outstanding -= 1;
                Some(update)
            }
            None => {
                // Every sender is gone, so the missing checks panicked
                warn!(lost = self.outstanding, "registry check tasks ended without a result");
                self.outstanding = 0;
                None
            }
        }
    }

    /// Join every outstanding check. Returns how many resolved.
    pub async fn wait(mut self) -> usize {
        let mut resolved = 0;
        while self.next_update().await.is_some() {
            resolved += 1;
        }
        info!(resolved, "submission complete");
        resolved
    }

    /// Stop observing. Checks keep running and still update the store.
    pub fn detach(self) {
        info!(outstanding = self.outstanding, "submission detached");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classifier::summarize;
    use crate::error::RegistryError;
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::sync::Mutex;
    use std::time::Duration;

    /// Registry with scripted answers and per-number latency
    struct ScriptedRegistry {
        answers: HashMap<String, (u64, RegistryStatus)>,
        calls: Mutex<Vec<String>>,
    }

    impl ScriptedRegistry {
        fn new(answers: &[(&str, u64, RegistryStatus)]) -> Self {
            ScriptedRegistry {
                answers: answers
                    .iter()
                    .map(|(n, d, s)| (n.to_string(), (*d, *s)))
                    .collect(),
                calls: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl RegistryClient for ScriptedRegistry {
        async fn check_status(
            &self,
            id_number: &str,
            _is_valid: bool,
        ) -> std::result::Result<RegistryStatus, RegistryError> {
            self.calls.lock().unwrap().push(id_number.to_string());
            match self.answers.get(id_number) {
                Some((delay, status)) => {
                    tokio::time::sleep(Duration::from_millis(*delay)).await;
                    Ok(*status)
                }
                None => Err(RegistryError::Unavailable("no script".to_string())),
            }
        }
    }

    const VALID_A: &str = "06819885253";
    const VALID_B: &str = "52998224725";

    #[tokio::test(start_paused = true)]
    async fn test_invalid_records_skip_registry() {
        let registry = Arc::new(ScriptedRegistry::new(&[(VALID_A, 10, RegistryStatus::Regular)]));
        let pipeline = Pipeline::new(RecordStore::new(), registry.clone());

        let submission = pipeline
            .process_text("ANA 06819885253 01/01/1990\nBETO 12345678900 02/02/1980")
            .unwrap();
        assert_eq!(submission.outstanding(), 1);
        assert_eq!(submission.wait().await, 1);

        assert_eq!(registry.calls.lock().unwrap().clone(), vec![VALID_A.to_string()]);

        let records = pipeline.store().snapshot();
        assert_eq!(records[0].name, "ANA");
        assert_eq!(records[0].registry_status, RegistryStatus::Regular);
        assert_eq!(records[1].name, "BETO");
        assert_eq!(records[1].registry_status, RegistryStatus::Error);
    }

    #[tokio::test(start_paused = true)]
    async fn test_partial_completion_keeps_summary_correct() {
        let registry = Arc::new(ScriptedRegistry::new(&[
            (VALID_A, 100, RegistryStatus::Regular),
            (VALID_B, 500, RegistryStatus::Suspended),
        ]));
        let pipeline = Pipeline::new(RecordStore::new(), registry);

        let mut submission = pipeline
            .submit_id_numbers(vec![VALID_A.to_string(), VALID_B.to_string()])
            .unwrap();
        assert_eq!(pipeline.store().pending_count(), 2);

        let first = submission.next_update().await.unwrap();
        assert_eq!(first.status, RegistryStatus::Regular);
        let stats = summarize(&pipeline.store().snapshot());
        assert_eq!(stats.regular_count, 1);
        assert_eq!(pipeline.store().pending_count(), 1);

        let second = submission.next_update().await.unwrap();
        assert_eq!(second.status, RegistryStatus::Suspended);
        assert!(submission.next_update().await.is_none());
        assert_eq!(pipeline.store().pending_count(), 0);
        assert_eq!(summarize(&pipeline.store().snapshot()).regular_count, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_registry_failure_maps_to_error() {
        let registry = Arc::new(ScriptedRegistry::new(&[]));
        let pipeline = Pipeline::new(RecordStore::new(), registry);

        let submission = pipeline.submit_id_numbers(vec![VALID_A.to_string()]).unwrap();
        let id = submission.record_ids()[0].clone();
        submission.wait().await;

        assert_eq!(
            pipeline.store().get(&id).unwrap().registry_status,
            RegistryStatus::Error
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_batches_prepend_newest_first() {
        let registry = Arc::new(ScriptedRegistry::new(&[(VALID_A, 1, RegistryStatus::Regular)]));
        let pipeline = Pipeline::new(RecordStore::new(), registry);

        pipeline.process_text("PRIMEIRO 06819885253").unwrap().wait().await;
        pipeline.process_text("SEGUNDO 06819885253\nTERCEIRO 06819885253").unwrap().wait().await;

        let names: Vec<String> = pipeline.store().snapshot().into_iter().map(|r| r.name).collect();
        assert_eq!(names, vec!["SEGUNDO", "TERCEIRO", "PRIMEIRO"]);
    }

    #[tokio::test]
    async fn test_empty_input_rejected() {
        let registry = Arc::new(ScriptedRegistry::new(&[]));
        let pipeline = Pipeline::new(RecordStore::new(), registry);

        assert!(matches!(pipeline.process_text(""), Err(ValidGuardError::EmptyInput)));
        assert!(matches!(
            pipeline.process_id_list("nada aqui"),
            Err(ValidGuardError::EmptyInput)
        ));
        assert!(pipeline.store().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_dropped_submission_still_resolves() {
        let registry = Arc::new(ScriptedRegistry::new(&[
            (VALID_A, 800, RegistryStatus::Regular),
            (VALID_B, 200, RegistryStatus::Suspended),
        ]));
        let pipeline = Pipeline::new(RecordStore::new(), registry);

        let submission = pipeline
            .submit_id_numbers(vec![VALID_A.to_string(), VALID_B.to_string()])
            .unwrap();
        drop(submission);
        assert_eq!(pipeline.store().pending_count(), 2);

        tokio::time::sleep(Duration::from_secs(2)).await;
        assert_eq!(pipeline.store().pending_count(), 0);
        assert_eq!(summarize(&pipeline.store().snapshot()).regular_count, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_discarded_handle_from_process_text() {
        let registry = Arc::new(ScriptedRegistry::new(&[(VALID_A, 500, RegistryStatus::Regular)]));
        let pipeline = Pipeline::new(RecordStore::new(), registry);

        pipeline.process_text("ANA 06819885253 01/01/1990").unwrap();

        tokio::time::sleep(Duration::from_millis(600)).await;
        assert_eq!(
            pipeline.store().snapshot()[0].registry_status,
            RegistryStatus::Regular
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_detached_checks_still_update_store() {
        let registry = Arc::new(ScriptedRegistry::new(&[(VALID_A, 300, RegistryStatus::Cancelled)]));
        let pipeline = Pipeline::new(RecordStore::new(), registry);

        let submission = pipeline.submit_id_numbers(vec![VALID_A.to_string()]).unwrap();
        let id = submission.record_ids()[0].clone();
        submission.detach();

        tokio::time::sleep(Duration::from_millis(400)).await;
        assert_eq!(
            pipeline.store().get(&id).unwrap().registry_status,
            RegistryStatus::Cancelled
        );
    }
}
