use std::{cell::RefCell, fmt::Display, time::Duration};

use kube::{
    api::{ApiResource, DeleteParams, DynamicObject, GroupVersionKind, PostParams, TypeMeta},
    Api, Client,
};
use tracing::{debug, info, warn};

use crate::{
    domain::{self, DomainStatus},
    poll::{ConditionPoller, Verdict},
    Error,
};

pub const DEFAULT_GROUP: &str = "elasticsearchservice.services.k8s.aws";
pub const DEFAULT_VERSION: &str = "v1alpha1";
pub const DEFAULT_KIND: &str = "ElasticsearchDomain";
pub const DEFAULT_PLURAL: &str = "elasticsearchdomains";

/// Time between checks for a freshly created resource being picked up by
/// its controller.
pub const CONSUME_PERIOD: Duration = Duration::from_secs(5);
pub const CONSUME_PERIODS: u32 = 3;

/// Coordinates of a single namespaced custom resource.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CustomResourceReference {
    pub group: String,
    pub version: String,
    pub kind: String,
    pub plural: String,
    pub name: String,
    pub namespace: String,
}

impl CustomResourceReference {
    /// Reference to an `ElasticsearchDomain` named `name` in `namespace`.
    pub fn domain(name: &str, namespace: &str) -> Self {
        CustomResourceReference {
            group: DEFAULT_GROUP.to_string(),
            version: DEFAULT_VERSION.to_string(),
            kind: DEFAULT_KIND.to_string(),
            plural: DEFAULT_PLURAL.to_string(),
            name: name.to_string(),
            namespace: namespace.to_string(),
        }
    }

    pub fn api_resource(&self) -> ApiResource {
        ApiResource::from_gvk_with_plural(
            &GroupVersionKind::gvk(&self.group, &self.version, &self.kind),
            &self.plural,
        )
    }

    /// Same kind of resource, different name.
    pub fn with_name(&self, name: &str) -> Self {
        CustomResourceReference {
            name: name.to_string(),
            ..self.clone()
        }
    }
}

impl Display for CustomResourceReference {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}.{}", self.namespace, self.plural, self.name)
    }
}

/// Cluster-side lifecycle of a custom resource.
#[allow(async_fn_in_trait)]
pub trait CustomResourceClient {
    async fn create(
        &self,
        reference: &CustomResourceReference,
        manifest: &DynamicObject,
    ) -> Result<DynamicObject, Error>;

    async fn delete(&self, reference: &CustomResourceReference) -> Result<(), Error>;

    /// The resource once its controller has written a status block, or
    /// `None` if that did not happen in time.
    async fn wait_consumed_by_controller(
        &self,
        reference: &CustomResourceReference,
    ) -> Result<Option<DynamicObject>, Error>;

    async fn exists(&self, reference: &CustomResourceReference) -> Result<bool, Error>;
}

/// Upstream view of a domain. Fails with [`Error::NotFound`] once the
/// domain is gone.
#[allow(async_fn_in_trait)]
pub trait DomainClient {
    async fn describe(&self, name: &str) -> Result<DomainStatus, Error>;
}

pub struct KubeResources {
    client: Client,
    consume_poller: ConditionPoller,
}

impl KubeResources {
    pub fn new(client: Client) -> Result<Self, Error> {
        Ok(KubeResources {
            client,
            consume_poller: ConditionPoller::new(CONSUME_PERIOD, CONSUME_PERIOD * CONSUME_PERIODS)?,
        })
    }

    pub fn with_consume_poller(mut self, poller: ConditionPoller) -> Self {
        self.consume_poller = poller;
        self
    }

    fn api(&self, reference: &CustomResourceReference) -> Api<DynamicObject> {
        Api::namespaced_with(
            self.client.clone(),
            &reference.namespace,
            &reference.api_resource(),
        )
    }
}

impl CustomResourceClient for KubeResources {
    async fn create(
        &self,
        reference: &CustomResourceReference,
        manifest: &DynamicObject,
    ) -> Result<DynamicObject, Error> {
        let resource = reference.api_resource();

        let mut object = manifest.clone();
        object.metadata.name = Some(reference.name.clone());
        object.metadata.namespace = Some(reference.namespace.clone());
        object.types.get_or_insert_with(|| TypeMeta {
            api_version: resource.api_version.clone(),
            kind: resource.kind.clone(),
        });

        info!("creating {reference}");
        Ok(self
            .api(reference)
            .create(&PostParams::default(), &object)
            .await?)
    }

    async fn delete(&self, reference: &CustomResourceReference) -> Result<(), Error> {
        info!("deleting {reference}");
        self.api(reference)
            .delete(&reference.name, &DeleteParams::default())
            .await?;

        Ok(())
    }

    #[tracing::instrument(name = "consume", skip_all, fields(resource = %reference))]
    async fn wait_consumed_by_controller(
        &self,
        reference: &CustomResourceReference,
    ) -> Result<Option<DynamicObject>, Error> {
        let api = &self.api(reference);
        let name = reference.name.as_str();
        let last_seen: &RefCell<Option<DynamicObject>> = &RefCell::new(None);

        let outcome = self
            .consume_poller
            .wait_until(
                "controller to record status",
                move || async move {
                    let object = api.get_opt(name).await?;
                    last_seen.replace(object.clone());
                    Ok::<_, Error>(object)
                },
                consumed_by_controller,
            )
            .await?;

        if !outcome.succeeded() {
            warn!("{reference} was not consumed by its controller: {outcome:?}");
            return Ok(None);
        }

        // The snapshot that satisfied the check, not a fresh read.
        Ok(last_seen.take())
    }

    async fn exists(&self, reference: &CustomResourceReference) -> Result<bool, Error> {
        Ok(self.api(reference).get_opt(&reference.name).await?.is_some())
    }
}

/// A controller has picked up a resource once it has written a status
/// block onto it.
pub fn consumed_by_controller(object: &Option<DynamicObject>) -> Verdict {
    let has_status = object
        .as_ref()
        .and_then(|object| object.data.get("status"))
        .is_some_and(|status| !status.is_null());

    if has_status {
        Verdict::Done
    } else {
        Verdict::Pending
    }
}

/// Reads a domain's status from the flags its controller mirrors onto the
/// custom resource.
///
/// The domain counts as gone as soon as the resource is, which can be well
/// before it is gone upstream. Use [`AwsDomains`](crate::aws::AwsDomains)
/// wherever AWS credentials are available.
pub struct StatusDomains {
    client: Client,
    template: CustomResourceReference,
}

impl StatusDomains {
    /// Domains are looked up as resources of the same kind and namespace as
    /// `template`.
    pub fn new(client: Client, template: CustomResourceReference) -> Self {
        StatusDomains { client, template }
    }
}

impl DomainClient for StatusDomains {
    async fn describe(&self, name: &str) -> Result<DomainStatus, Error> {
        let reference = self.template.with_name(name);
        let api: Api<DynamicObject> = Api::namespaced_with(
            self.client.clone(),
            &reference.namespace,
            &reference.api_resource(),
        );

        let Some(object) = api.get_opt(name).await? else {
            return Err(Error::NotFound {
                kind: reference.kind,
                name: name.to_string(),
            });
        };

        let status = domain::status_of(&object)?.unwrap_or_default();
        debug!("{reference} status: {status:?}");
        Ok(status)
    }
}
