//! The task spawned for each started run.

use super::{CancellationReason, Inner, TriggerSource};
use crate::error::GenerationError;
use crate::generation::{GenerationRequest, GenerationResponse};
use crate::settings::truncate_chars;
use crate::telemetry::events::{
    CancellationEventData, CompletionEventData, FailureEventData, StageEventData,
    PIPELINE_CANCELLED, PIPELINE_COMPLETED, PIPELINE_FAILED, PIPELINE_STAGE,
};
use futures::FutureExt;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::error;
use uuid::Uuid;

const PREVIEW_CHARS: usize = 160;

/// Where a cancellation was noticed; decides the fallback reason.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CancelledIn {
    Pipeline,
    Generator,
}

/// Runs the pipeline; a panic in any collaborator still clears the
/// generating flag and releases the slot.
pub(super) async fn supervise(
    inner: Arc<Inner>,
    run_id: u64,
    source: TriggerSource,
    regenerate_from_id: Option<Uuid>,
    cancel: CancellationToken,
) {
    let outcome = AssertUnwindSafe(run(
        inner.clone(),
        run_id,
        source,
        regenerate_from_id,
        cancel,
    ))
    .catch_unwind()
    .await;

    if outcome.is_err() {
        error!(run_id, "Pipeline task panicked");
        inner.emit(
            PIPELINE_FAILED,
            &FailureEventData {
                error: GenerationError::GenerationFailed.kind().to_string(),
                run_id: Some(run_id),
                request_id: None,
                attempts: None,
                presented_in_panel: None,
            },
        );
        let sink = inner.services.sink.clone();
        if AssertUnwindSafe(sink.set_generating(false))
            .catch_unwind()
            .await
            .is_err()
        {
            error!(run_id, "Presentation sink panicked while clearing the generating flag");
        }
        inner.release(run_id);
    }
}

async fn run(
    inner: Arc<Inner>,
    run_id: u64,
    source: TriggerSource,
    regenerate_from_id: Option<Uuid>,
    cancel: CancellationToken,
) {
    let sink = inner.services.sink.clone();
    sink.set_generating(true).await;

    match execute(&inner, run_id, regenerate_from_id, &cancel).await {
        _ if cancel.is_cancelled() => report_cancellation(&inner, run_id, CancelledIn::Pipeline),
        Err(GenerationError::Cancelled) => report_cancellation(&inner, run_id, CancelledIn::Pipeline),
        Err(error) => present_failure(&inner, run_id, source, error).await,
        Ok(response) => match response.error() {
            Some(GenerationError::Cancelled) => {
                report_cancellation(&inner, run_id, CancelledIn::Generator)
            }
            Some(error) => present_failure(&inner, run_id, source, error).await,
            None => {
                inner.emit(
                    PIPELINE_COMPLETED,
                    &CompletionEventData {
                        duration_ms: u64::try_from(response.generation_time.as_millis())
                            .unwrap_or(u64::MAX),
                        run_id: Some(run_id),
                        request_id: Some(response.request_id.to_string()),
                        attempts: None,
                    },
                );
                sink.show_response(response).await;
            }
        },
    }

    sink.set_generating(false).await;
    inner.release(run_id);
}

async fn execute(
    inner: &Inner,
    run_id: u64,
    regenerate_from_id: Option<Uuid>,
    cancel: &CancellationToken,
) -> Result<GenerationResponse, GenerationError> {
    let services = &inner.services;

    stage(inner, run_id, "preflight");
    if cancel.is_cancelled() {
        return Err(GenerationError::Cancelled);
    }
    let permission = until_cancelled(cancel, services.text_source.preflight()).await?;
    if !permission.is_granted() {
        return Err(GenerationError::AccessibilityPermissionDenied);
    }

    stage(inner, run_id, "capture");
    let text = until_cancelled(cancel, services.text_source.capture(cancel.clone()))
        .await?
        .map_err(GenerationError::from)?;

    services
        .sink
        .show_loading(Some(truncate_chars(text.trim(), PREVIEW_CHARS)))
        .await;

    let request = GenerationRequest::new(&text, inner.config.kind, regenerate_from_id)
        .map_err(|_| GenerationError::NoSelection)?;

    stage(inner, run_id, "settings");
    let settings = until_cancelled(cancel, services.settings.snapshot())
        .await?
        .validated();

    stage(inner, run_id, "generate");

    Ok(services
        .generator
        .generate(&request, &settings, cancel.clone())
        .await)
}

async fn until_cancelled<F: Future>(
    cancel: &CancellationToken,
    future: F,
) -> Result<F::Output, GenerationError> {
    tokio::select! {
        biased;
        _ = cancel.cancelled() => Err(GenerationError::Cancelled),
        output = future => Ok(output),
    }
}

fn stage(inner: &Inner, run_id: u64, stage: &str) {
    inner.emit(
        PIPELINE_STAGE,
        &StageEventData {
            run_id,
            stage: stage.to_string(),
        },
    );
}

fn report_cancellation(inner: &Inner, run_id: u64, cancelled_in: CancelledIn) {
    let reason = inner
        .record_cancellation(run_id)
        .unwrap_or(match cancelled_in {
            CancelledIn::Generator => CancellationReason::ServiceCancelled,
            CancelledIn::Pipeline => CancellationReason::TaskCancelled,
        });
    inner.emit(
        PIPELINE_CANCELLED,
        &CancellationEventData {
            run_id,
            reason: reason.as_str().to_string(),
        },
    );
}

async fn present_failure(inner: &Inner, run_id: u64, source: TriggerSource, error: GenerationError) {
    let sink = &inner.services.sink;
    let presentation = inner.mapper.map(error, source);
    let in_panel = presentation.prefer_panel || sink.is_panel_visible().await;

    inner.emit(
        PIPELINE_FAILED,
        &FailureEventData {
            error: error.kind().to_string(),
            run_id: Some(run_id),
            request_id: None,
            attempts: None,
            presented_in_panel: Some(in_panel),
        },
    );

    if in_panel {
        sink.show_error(presentation).await;
    } else {
        sink.notify_background(presentation.message).await;
    }
}
