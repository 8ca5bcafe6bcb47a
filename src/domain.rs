use kube::{api::DynamicObject, ResourceExt};
use serde::Deserialize;

use crate::{poll::Verdict, Error};

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceMetadata {
    pub arn: Option<String>,
    #[serde(rename = "ownerAccountID")]
    pub owner_account_id: Option<String>,
    pub region: Option<String>,
}

/// Status snapshot of an Elasticsearch domain.
///
/// Every flag is optional: a flag missing from the snapshot is not the same
/// as a flag set to `false`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DomainStatus {
    pub created: Option<bool>,
    pub processing: Option<bool>,
    pub deleted: Option<bool>,
    pub endpoint: Option<String>,
    pub ack_resource_metadata: Option<ResourceMetadata>,
}

impl DomainStatus {
    pub fn arn(&self) -> Option<&str> {
        self.ack_resource_metadata
            .as_ref()
            .and_then(|metadata| metadata.arn.as_deref())
    }
}

/// A domain is marked `Created` almost immediately, but stays `Processing`
/// while Elasticsearch is installed onto the worker nodes.
pub fn processing_finished(status: &DomainStatus) -> Verdict {
    match status.processing {
        Some(true) => Verdict::Pending,
        Some(false) => Verdict::Done,
        None => Verdict::Malformed("DomainStatus.Processing is missing".to_string()),
    }
}

/// Holds while a domain whose custom resource was deleted still shows up
/// upstream. Its disappearance is signalled by `NotFound`, not by this
/// predicate.
pub fn deletion_underway(status: &DomainStatus) -> Verdict {
    match status.deleted {
        Some(true) => Verdict::Pending,
        Some(false) => Verdict::FailedPrecondition(
            "DomainStatus.Deleted is false for ES Domain that was deleted".to_string(),
        ),
        None => Verdict::Malformed("DomainStatus.Deleted is missing".to_string()),
    }
}

/// Decodes the status block the controller mirrors onto the custom resource.
pub fn status_of(resource: &DynamicObject) -> Result<Option<DomainStatus>, Error> {
    match resource.data.get("status") {
        Some(status) if !status.is_null() => Ok(Some(serde_json::from_value(status.clone())?)),
        _ => Ok(None),
    }
}

/// ARN the controller recorded for the resource once it adopted it.
pub fn resource_arn(resource: &DynamicObject) -> Result<String, Error> {
    status_of(resource)?
        .as_ref()
        .and_then(DomainStatus::arn)
        .map(str::to_string)
        .ok_or_else(|| Error::MissingArn(resource.name_any()))
}
