//! Domain status straight from the Elasticsearch Service API.

use aws_sdk_elasticsearch::{
    operation::describe_elasticsearch_domain::DescribeElasticsearchDomainError,
    types::ElasticsearchDomainStatus, Client,
};
use tracing::debug;

use crate::{
    cluster::DomainClient,
    domain::{DomainStatus, ResourceMetadata},
    Error,
};

pub struct AwsDomains {
    client: Client,
}

impl AwsDomains {
    pub fn new(client: Client) -> Self {
        AwsDomains { client }
    }

    /// Client configured from the usual AWS environment, profile and
    /// instance metadata sources.
    pub async fn from_env() -> Self {
        let config = aws_config::load_defaults(aws_config::BehaviorVersion::latest()).await;
        AwsDomains::new(Client::new(&config))
    }
}

impl DomainClient for AwsDomains {
    async fn describe(&self, name: &str) -> Result<DomainStatus, Error> {
        let output = self
            .client
            .describe_elasticsearch_domain()
            .domain_name(name)
            .send()
            .await
            .map_err(|err| describe_error(name, err.into_service_error()))?;

        let Some(status) = Option::<&ElasticsearchDomainStatus>::from(output.domain_status())
        else {
            return Err(Error::Malformed(format!(
                "DescribeElasticsearchDomain returned no DomainStatus for {name}"
            )));
        };

        let status = domain_status(status);
        debug!("ES Domain {name} status: {status:?}");
        Ok(status)
    }
}

/// Flags and identity of a described domain.
pub fn domain_status(status: &ElasticsearchDomainStatus) -> DomainStatus {
    DomainStatus {
        created: status.created(),
        processing: status.processing(),
        deleted: status.deleted(),
        endpoint: status.endpoint().map(str::to_string),
        ack_resource_metadata: Some(ResourceMetadata {
            arn: Option::<&str>::from(status.arn()).map(str::to_string),
            ..Default::default()
        }),
    }
}

/// `ResourceNotFoundException` is how the API reports a domain that is
/// gone; everything else is fatal.
pub fn describe_error(name: &str, err: DescribeElasticsearchDomainError) -> Error {
    if err.is_resource_not_found_exception() {
        Error::NotFound {
            kind: "ES Domain".to_string(),
            name: name.to_string(),
        }
    } else {
        Error::ElasticsearchService(err)
    }
}
