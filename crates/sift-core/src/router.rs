//! Classification router
//!
//! Decides, per batch, whether results come from the remote model, the
//! deterministic classifier, or a mix of both. The router never fails: every
//! remote problem is turned into an error descriptor and the affected
//! transactions are classified offline.
//!
//! One remote attempt per batch, no retries. The attempt runs on its own task
//! bounded by the batch timeout, so a stalled or panicking call cannot take
//! the request down with it.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, error, info, warn};

use crate::ai::{RemoteAnswer, RemoteBackend, RemoteClient};
use crate::config::ClassifierConfig;
use crate::error::{RemoteError, RemoteErrorKind};
use crate::models::{
    BatchMode, BatchResponse, ClassificationResult, ErrorDescriptor, Provenance, Transaction,
};
use crate::rules::{DeterministicClassifier, KeywordRuleTable};

/// Routes batches between the remote client and the offline classifier
#[derive(Clone)]
pub struct ClassificationRouter {
    remote: RemoteClient,
    classifier: DeterministicClassifier,
    batch_timeout: Duration,
}

impl ClassificationRouter {
    pub fn new(
        remote: RemoteClient,
        classifier: DeterministicClassifier,
        batch_timeout: Duration,
    ) -> Self {
        Self {
            remote,
            classifier,
            batch_timeout,
        }
    }

    /// Build a router backed by Gemini
    pub fn from_config(config: &ClassifierConfig, rules: Arc<KeywordRuleTable>) -> Self {
        Self::new(
            RemoteClient::from_config(config),
            DeterministicClassifier::new(rules),
            config.batch_timeout,
        )
    }

    pub fn remote(&self) -> &RemoteClient {
        &self.remote
    }

    /// Classify a batch, one result per input in input order
    pub async fn categorize_batch(&self, transactions: &[Transaction]) -> BatchResponse {
        if !self.remote.has_credential() {
            let err = RemoteError::missing_credential();
            warn!(
                count = transactions.len(),
                code = err.kind.as_str(),
                "No API key configured, using offline classifier"
            );
            return self.fallback_response(transactions, Some(ErrorDescriptor::from(&err)));
        }

        if transactions.is_empty() {
            return BatchResponse {
                ok: true,
                mode: BatchMode::Remote,
                categories: vec![],
                error: None,
            };
        }

        match self.attempt_remote(transactions).await {
            Ok(answers) => self.assemble(transactions, answers),
            Err(err) => {
                let descriptor = report_failure(&err, transactions.len());
                self.fallback_response(transactions, Some(descriptor))
            }
        }
    }

    /// Classify a batch without contacting the remote model
    pub fn categorize_offline(&self, transactions: &[Transaction]) -> BatchResponse {
        self.fallback_response(transactions, None)
    }

    /// Run the single remote call on its own task, bounded by the batch timeout
    async fn attempt_remote(
        &self,
        transactions: &[Transaction],
    ) -> Result<Vec<RemoteAnswer>, RemoteError> {
        let remote = self.remote.clone();
        let batch = transactions.to_vec();
        let mut handle = tokio::spawn(async move { remote.classify_batch(&batch).await });

        match tokio::time::timeout(self.batch_timeout, &mut handle).await {
            Ok(Ok(result)) => result,
            Ok(Err(join_err)) => Err(RemoteError::new(
                RemoteErrorKind::Transport,
                format!("Remote call aborted: {}", join_err),
            )),
            Err(_) => {
                handle.abort();
                Err(RemoteError::new(
                    RemoteErrorKind::Timeout,
                    format!(
                        "Remote call exceeded {}s batch timeout",
                        self.batch_timeout.as_secs_f64()
                    ),
                ))
            }
        }
    }

    /// Merge remote answers with offline rescues for missing ids
    fn assemble(&self, transactions: &[Transaction], answers: Vec<RemoteAnswer>) -> BatchResponse {
        let mut by_id: HashMap<String, RemoteAnswer> = HashMap::with_capacity(answers.len());
        for answer in answers {
            // First answer for an id wins
            by_id.entry(answer.id.clone()).or_insert(answer);
        }

        let categories: Vec<ClassificationResult> = transactions
            .iter()
            .map(|tx| match by_id.get(&tx.id) {
                Some(answer) => ClassificationResult {
                    id: tx.id.clone(),
                    category: answer.category,
                    confidence: answer.confidence,
                    source: Provenance::Remote,
                    reason: None,
                },
                None => self.classifier.classify(tx),
            })
            .collect();

        let total = categories.len();
        let rescued = categories.iter().filter(|r| r.source.is_fallback()).count();

        let (mode, error) = match rescued {
            0 => (BatchMode::Remote, None),
            n if n == total => (
                BatchMode::Fallback,
                Some(ErrorDescriptor::partial_match(n, total)),
            ),
            n => (
                BatchMode::Mixed,
                Some(ErrorDescriptor::partial_match(n, total)),
            ),
        };

        match mode {
            BatchMode::Remote => info!(count = total, "Batch classified remotely"),
            _ => warn!(
                count = total,
                rescued,
                mode = mode.as_str(),
                code = ErrorDescriptor::PARTIAL_MATCH,
                "Remote reply missing transactions, rescued offline"
            ),
        }

        BatchResponse {
            ok: true,
            mode,
            categories,
            error,
        }
    }

    fn fallback_response(
        &self,
        transactions: &[Transaction],
        error: Option<ErrorDescriptor>,
    ) -> BatchResponse {
        BatchResponse {
            ok: true,
            mode: BatchMode::Fallback,
            categories: self.classifier.classify_all(transactions),
            error,
        }
    }
}

/// Log a remote failure and build the descriptor reported with the fallback batch
///
/// Failures an operator has to fix (key, model) log at error; transient
/// ones at warn; an unreadable reply at warn with the raw message at debug.
fn report_failure(err: &RemoteError, count: usize) -> ErrorDescriptor {
    let code = err.kind.as_str();
    match err.kind {
        RemoteErrorKind::MissingCredential
        | RemoteErrorKind::CredentialInvalid
        | RemoteErrorKind::ModelNotFound => error!(
            count,
            code,
            status = ?err.status,
            "Remote model unusable, using offline classifier: {}",
            err.message
        ),
        RemoteErrorKind::QuotaExceeded
        | RemoteErrorKind::Timeout
        | RemoteErrorKind::Transport
        | RemoteErrorKind::Http => warn!(
            count,
            code,
            status = ?err.status,
            "Remote classification failed, using offline classifier: {}",
            err.message
        ),
        RemoteErrorKind::ResponseParse => {
            warn!(count, code, "Remote reply unreadable, using offline classifier");
            debug!("Parse failure: {}", err.message);
        }
    }
    ErrorDescriptor::from(err)
}
