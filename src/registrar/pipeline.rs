//! Background phase of a registration run: submit, poll, generate.

use futures::future::join_all;

use crate::artifacts;
use crate::error::{Error, Result};
use crate::poll::poll_until;
use crate::scheduler::{run_bounded, tally};
use crate::types::{AuthContext, ContainerId, Event, ItemId, ItemSource, RpcMethod, RunStatus, Severity};

use super::{ArtifactReport, Registrar, RunReport, add_item_params, get_container_params};

impl Registrar {
    /// Run the background phase to completion
    ///
    /// Never fails: an error escaping any step is logged, reported to subscribers and
    /// folded into the report as [`RunStatus::Failed`].
    #[tracing::instrument(skip_all, fields(container_id = %container_id))]
    pub(crate) async fn run_pipeline(
        self,
        container_id: ContainerId,
        items: Vec<ItemSource>,
        auth: AuthContext,
    ) -> RunReport {
        let mut report = RunReport::new(container_id.clone());

        match self.process(&container_id, &items, &auth, &mut report).await {
            Ok(status) => {
                report.status = status;
                tracing::info!(?status, "registration run finished");
                self.emit_event(Event::RunFinished {
                    container_id,
                    status,
                });
            }
            Err(e) => {
                tracing::error!(error = %e, code = e.code(), "registration run failed");
                report.status = RunStatus::Failed;
                report.error = Some(e.to_string());
                self.notify(&container_id, format!("Error: {e}"), Severity::Error);
                self.emit_event(Event::RunFailed {
                    container_id,
                    code: e.code().to_string(),
                    error: e.to_string(),
                });
            }
        }

        report
    }

    async fn process(
        &self,
        container_id: &ContainerId,
        items: &[ItemSource],
        auth: &AuthContext,
        report: &mut RunReport,
    ) -> Result<RunStatus> {
        let (succeeded, failed) = self.submit_items(container_id, items, auth).await;
        report.submitted = succeeded;
        report.failed_submissions = failed;
        self.emit_event(Event::ItemsSubmitted {
            container_id: container_id.clone(),
            succeeded,
            failed,
        });
        self.notify(
            container_id,
            format!("Adding {succeeded} sources..."),
            Severity::Info,
        );

        let ids = self.wait_for_item_ids(container_id, succeeded, auth).await?;
        tracing::info!(found = ids.len(), expected = succeeded, "source ids discovered");
        report.item_ids = ids.clone();

        if ids.is_empty() {
            self.notify(
                container_id,
                "Sources are still processing. Please wait a moment",
                Severity::Warning,
            );
            return Ok(RunStatus::Partial);
        }

        self.notify(container_id, "Generating artifacts...", Severity::Info);
        report.artifacts = self.generate_artifacts(container_id, &ids, auth).await;

        let generated = report.generated();
        if generated.is_empty() {
            self.notify(container_id, "Artifact generation failed", Severity::Warning);
        } else {
            let labels: Vec<&str> = generated.iter().map(|kind| kind.label()).collect();
            self.notify(
                container_id,
                format!("Done: generated {}", labels.join(", ")),
                Severity::Success,
            );
        }

        if generated.len() == report.artifacts.len() {
            Ok(RunStatus::Success)
        } else {
            Ok(RunStatus::Partial)
        }
    }

    /// Submit every item with bounded concurrency, returning `(succeeded, failed)`
    async fn submit_items(
        &self,
        container_id: &ContainerId,
        items: &[ItemSource],
        auth: &AuthContext,
    ) -> (usize, usize) {
        let delay = self.config.submission.request_delay;

        // Tasks own their captures so the spawned run stays Send
        let tasks: Vec<_> = items
            .iter()
            .map(|item| {
                let rpc = self.rpc.clone();
                let auth = auth.clone();
                let params = add_item_params(container_id, &item.url);
                let (id, title) = (item.id.clone(), item.title.clone());
                move || async move {
                    let payload = rpc.call(RpcMethod::AddItem, &params, &auth).await?;
                    tracing::debug!(item = %id, %title, "source added");
                    tokio::time::sleep(delay).await;
                    Ok::<_, Error>(payload)
                }
            })
            .collect();

        let outcomes = run_bounded(tasks, self.config.submission.concurrency_limit).await;
        for outcome in &outcomes {
            if let Some(e) = outcome.error() {
                let item = &items[outcome.index];
                tracing::warn!(item = %item.id, url = %item.url, error = %e, "failed to add source");
            }
        }

        let (succeeded, failed) = tally(&outcomes);
        tracing::info!(succeeded, failed, "source submission settled");
        (succeeded, failed)
    }

    /// Poll the notebook until `expected` source ids are visible or attempts run out
    async fn wait_for_item_ids(
        &self,
        container_id: &ContainerId,
        expected: usize,
        auth: &AuthContext,
    ) -> Result<Vec<ItemId>> {
        let params = get_container_params(container_id);

        poll_until(
            &self.config.poll,
            |attempt| {
                let params = &params;
                async move {
                    let payload = self.rpc.call(RpcMethod::GetContainer, params, auth).await?;
                    let ids = payload
                        .map(|p| self.extractor.item_ids(&p, container_id))
                        .unwrap_or_default();

                    tracing::debug!(attempt, found = ids.len(), expected, "polled notebook sources");
                    self.emit_event(Event::PollAttempt {
                        container_id: container_id.clone(),
                        attempt,
                        found: ids.len(),
                        expected,
                    });
                    Ok::<_, Error>(ids)
                }
            },
            |ids: &Vec<ItemId>| ids.len() >= expected,
        )
        .await
    }

    /// Generate every configured artifact kind concurrently; failures stay per-kind
    async fn generate_artifacts(
        &self,
        container_id: &ContainerId,
        ids: &[ItemId],
        auth: &AuthContext,
    ) -> Vec<ArtifactReport> {
        let requests = self.config.artifacts.kinds.iter().map(|&kind| async move {
            let result = artifacts::generate(
                &self.rpc,
                kind,
                container_id,
                ids,
                auth,
                &self.config.artifacts,
            )
            .await;
            (kind, result)
        });

        join_all(requests)
            .await
            .into_iter()
            .map(|(kind, result)| {
                let error = result.err().map(|e| {
                    tracing::warn!(%kind, error = %e, "artifact generation failed");
                    e.to_string()
                });
                self.emit_event(Event::ArtifactFinished {
                    container_id: container_id.clone(),
                    kind,
                    success: error.is_none(),
                    error: error.clone(),
                });
                ArtifactReport {
                    kind,
                    success: error.is_none(),
                    error,
                }
            })
            .collect()
    }

    fn notify(&self, container_id: &ContainerId, message: impl Into<String>, severity: Severity) {
        self.emit_event(Event::Notification {
            container_id: container_id.clone(),
            message: message.into(),
            severity,
        });
    }
}
