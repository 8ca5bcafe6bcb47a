use std::{
    collections::VecDeque,
    sync::{
        atomic::{AtomicUsize, Ordering},
        Mutex,
    },
};

use es_domain_e2e::{
    cluster::{CustomResourceClient, CustomResourceReference, DomainClient},
    domain::DomainStatus,
    Error,
};
use k8s_openapi::serde_json::json;
use kube::api::DynamicObject;

#[allow(dead_code)]
pub fn init_tracing() {
    tracing_subscriber::fmt().with_test_writer().try_init().ok();
}

#[allow(dead_code)]
pub fn processing(processing: bool) -> DomainStatus {
    DomainStatus {
        created: Some(true),
        processing: Some(processing),
        deleted: Some(false),
        ..Default::default()
    }
}

#[allow(dead_code)]
pub fn deleting(deleted: bool) -> DomainStatus {
    DomainStatus {
        created: Some(true),
        processing: Some(false),
        deleted: Some(deleted),
        ..Default::default()
    }
}

#[allow(dead_code)]
pub fn not_found(name: &str) -> Error {
    Error::NotFound {
        kind: "ElasticsearchDomain".to_string(),
        name: name.to_string(),
    }
}

#[allow(dead_code)]
pub fn server_error() -> Error {
    Error::Kube(kube::Error::Api(kube::error::ErrorResponse {
        status: "Internal Server Error".to_string(),
        message: "etcdserver: request timed out".to_string(),
        reason: "InternalError".to_string(),
        code: 500,
    }))
}

#[allow(dead_code)]
#[derive(Debug, Clone)]
pub enum Reply {
    Status(DomainStatus),
    NotFound,
    Broken,
}

/// Answers `describe` calls from a script. The final reply repeats once
/// the script runs out.
#[allow(dead_code)]
pub struct ScriptedDomains {
    replies: Mutex<VecDeque<Reply>>,
    calls: AtomicUsize,
}

#[allow(dead_code)]
impl ScriptedDomains {
    pub fn new(replies: impl IntoIterator<Item = Reply>) -> Self {
        ScriptedDomains {
            replies: Mutex::new(replies.into_iter().collect()),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl DomainClient for ScriptedDomains {
    async fn describe(&self, name: &str) -> Result<DomainStatus, Error> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        let reply = {
            let mut replies = self.replies.lock().unwrap();
            if replies.len() > 1 {
                replies.pop_front()
            } else {
                replies.front().cloned()
            }
        };

        match reply {
            Some(Reply::Status(status)) => Ok(status),
            Some(Reply::NotFound) | None => Err(not_found(name)),
            Some(Reply::Broken) => Err(server_error()),
        }
    }
}

/// In-memory stand-in for the cluster, recording every call made to it.
#[allow(dead_code)]
pub struct FakeResources {
    pub consumed: bool,
    pub records_arn: bool,
    pub events: Mutex<Vec<String>>,
    existing: Mutex<Option<DynamicObject>>,
}

#[allow(dead_code)]
impl FakeResources {
    pub fn new() -> Self {
        FakeResources {
            consumed: true,
            records_arn: true,
            events: Mutex::new(vec![]),
            existing: Mutex::new(None),
        }
    }

    /// A cluster whose controller never picks anything up.
    pub fn without_controller() -> Self {
        FakeResources {
            consumed: false,
            ..FakeResources::new()
        }
    }

    /// A controller that writes status but never adopts the domain.
    pub fn without_arn() -> Self {
        FakeResources {
            records_arn: false,
            ..FakeResources::new()
        }
    }

    pub fn events(&self) -> Vec<String> {
        self.events.lock().unwrap().clone()
    }

    fn record(&self, event: String) {
        self.events.lock().unwrap().push(event);
    }
}

impl CustomResourceClient for FakeResources {
    async fn create(
        &self,
        reference: &CustomResourceReference,
        manifest: &DynamicObject,
    ) -> Result<DynamicObject, Error> {
        self.record(format!("create {reference}"));

        let mut object = manifest.clone();
        object.metadata.name = Some(reference.name.clone());
        object.metadata.namespace = Some(reference.namespace.clone());
        *self.existing.lock().unwrap() = Some(object.clone());
        Ok(object)
    }

    async fn delete(&self, reference: &CustomResourceReference) -> Result<(), Error> {
        self.record(format!("delete {reference}"));
        self.existing.lock().unwrap().take();
        Ok(())
    }

    async fn wait_consumed_by_controller(
        &self,
        reference: &CustomResourceReference,
    ) -> Result<Option<DynamicObject>, Error> {
        self.record(format!("consume {reference}"));

        if !self.consumed {
            return Ok(None);
        }

        Ok(self.existing.lock().unwrap().clone().map(|mut object| {
            object.data["status"] = json!({
                "created": true,
                "processing": true,
            });
            if self.records_arn {
                object.data["status"]["ackResourceMetadata"] = json!({
                    "arn": format!("arn:aws:es:us-west-2:123456789012:domain/{}", reference.name),
                });
            }
            object
        }))
    }

    async fn exists(&self, reference: &CustomResourceReference) -> Result<bool, Error> {
        self.record(format!("exists {reference}"));
        Ok(self.existing.lock().unwrap().is_some())
    }
}
