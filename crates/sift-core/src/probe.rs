//! End-to-end health probe
//!
//! Validates the configured model, then issues one tiny generation call.
//! Reports which step failed; never touches the classification path.

use std::time::Duration;

use tracing::{info, warn};

use crate::ai::{GenerationOptions, RemoteBackend, RemoteClient};
use crate::models::{ErrorDescriptor, ProbeStep, SelfTestReport};
use crate::prompts::SELF_TEST_PROMPT;

/// Run the self-test against the remote client
pub async fn run_self_test(client: &RemoteClient, probe_timeout: Duration) -> SelfTestReport {
    let model = client.model().to_string();

    let validation = client.validate_model_availability().await;
    if !validation.ok {
        let error = validation.error.unwrap_or_else(|| ErrorDescriptor {
            code: "model-not-found".to_string(),
            message: format!("Model {} is not available", model),
            status: None,
        });
        warn!(model = %model, code = %error.code, "Self-test failed at validation");
        return SelfTestReport::failed(&model, ProbeStep::Validation, &error);
    }

    match client
        .generate(SELF_TEST_PROMPT, &GenerationOptions::probe(probe_timeout))
        .await
    {
        Ok(_) => {
            info!(model = %model, "Self-test passed");
            SelfTestReport::passed(&model)
        }
        Err(e) => {
            warn!(model = %model, code = e.kind.as_str(), status = ?e.status, "Self-test failed at generation: {}", e.message);
            SelfTestReport::failed(&model, ProbeStep::Generation, &ErrorDescriptor::from(&e))
        }
    }
}
