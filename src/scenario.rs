//! Create a domain through its custom resource, wait for it to finish
//! provisioning, delete it and wait for it to disappear.

use std::time::Duration;

use kube::api::DynamicObject;
use tracing::{debug, info, warn};

use crate::{
    cluster::{CustomResourceClient, CustomResourceReference, DomainClient},
    domain::{deletion_underway, processing_finished, resource_arn},
    poll::ConditionPoller,
    Error,
};

pub const CREATE_WAIT_INTERVAL: Duration = Duration::from_secs(15);
pub const CREATE_TIMEOUT: Duration = Duration::from_secs(900);

pub const DELETE_WAIT_AFTER: Duration = Duration::from_secs(30);
pub const DELETE_WAIT_INTERVAL: Duration = Duration::from_secs(15);
pub const DELETE_TIMEOUT: Duration = Duration::from_secs(240);

const AWAIT_PROCESSED: &str = "ES Domain to get DomainStatus.Processing == False";
const AWAIT_DELETED: &str = "ES Domain to be deleted";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timings {
    pub create_interval: Duration,
    pub create_timeout: Duration,
    /// Grace period between deleting the custom resource and the first
    /// check for the domain's disappearance.
    pub delete_wait_after: Duration,
    pub delete_interval: Duration,
    pub delete_timeout: Duration,
}

impl Default for Timings {
    fn default() -> Self {
        Timings {
            create_interval: CREATE_WAIT_INTERVAL,
            create_timeout: CREATE_TIMEOUT,
            delete_wait_after: DELETE_WAIT_AFTER,
            delete_interval: DELETE_WAIT_INTERVAL,
            delete_timeout: DELETE_TIMEOUT,
        }
    }
}

/// Runs the full lifecycle of the domain behind `reference`.
///
/// Provisioning usually takes 4-6 minutes, and the domain lingers upstream
/// for another couple of minutes after its custom resource is deleted. A
/// domain deleted while still processing reports `Created`, `Processing`
/// and `Deleted` all at once, so the delete is only issued once processing
/// has finished.
#[tracing::instrument(name = "lifecycle", skip_all, fields(resource = %reference))]
pub async fn run_create_delete<R, D>(
    resources: &R,
    domains: &D,
    reference: &CustomResourceReference,
    manifest: &DynamicObject,
    timings: &Timings,
) -> Result<(), Error>
where
    R: CustomResourceClient,
    D: DomainClient,
{
    // Validate both pollers before touching the cluster.
    let create_poller = ConditionPoller::new(timings.create_interval, timings.create_timeout)?;
    let delete_poller = ConditionPoller::new(timings.delete_interval, timings.delete_timeout)?
        .not_found_means_done(true);

    let name = reference.name.as_str();

    resources.create(reference, manifest).await?;
    let Some(resource) = resources.wait_consumed_by_controller(reference).await? else {
        return Err(Error::NotConsumed(reference.to_string()));
    };
    debug!("consumed: {resource:?}");

    match resource_arn(&resource) {
        Ok(arn) => info!("{reference} adopted as {arn}"),
        Err(err) => warn!("{err}"),
    }

    if !resources.exists(reference).await? {
        return Err(Error::Missing(reference.to_string()));
    }

    let status = domains.describe(name).await?;
    debug!("initial status of {name}: {status:?}");

    create_poller
        .wait_until(
            AWAIT_PROCESSED,
            move || domains.describe(name),
            processing_finished,
        )
        .await?
        .into_result(AWAIT_PROCESSED)?;

    info!("ES Domain {name} creation succeeded and DomainStatus.Processing is now False");

    resources.delete(reference).await?;

    info!(
        "deleted {reference}, waiting {:?} before checking existence upstream",
        timings.delete_wait_after
    );
    tokio::time::sleep(timings.delete_wait_after).await;

    delete_poller
        .wait_until(
            AWAIT_DELETED,
            move || domains.describe(name),
            deletion_underway,
        )
        .await?
        .into_result(AWAIT_DELETED)?;

    info!("ES Domain {name} no longer exists");
    Ok(())
}
