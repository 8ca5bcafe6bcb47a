use std::{path::PathBuf, process::ExitCode, time::Duration};

use clap::{command, Parser, Subcommand, ValueEnum};
use es_domain_e2e::{
    aws::AwsDomains,
    cluster::{
        CustomResourceReference, KubeResources, StatusDomains, DEFAULT_GROUP, DEFAULT_KIND,
        DEFAULT_PLURAL, DEFAULT_VERSION,
    },
    manifest::{self, Replacements},
    scenario::{self, Timings},
    Error,
};
use kube::Client;
use tracing::{error, info};

#[derive(Debug, Parser)]
#[command(author, version, about, long_about = None)]
struct Args {
    #[command(subcommand)]
    pub command: Command,
}

/// Where domain status is read from while waiting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum DomainSource {
    /// DescribeElasticsearchDomain against the Elasticsearch Service API.
    Aws,
    /// Flags mirrored onto the custom resource's status. Stops tracking the
    /// domain once the custom resource is deleted.
    Status,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Create a domain from a manifest, wait for it to provision, then
    /// delete it and wait for it to disappear.
    Run {
        #[arg(long, default_value = "my-es-domain")]
        name: String,
        #[arg(long, env = "ES_DOMAIN_NAMESPACE", default_value = "default")]
        namespace: String,
        /// Manifest template, `$KEY` placeholders are replaced before use.
        #[arg(long)]
        manifest: PathBuf,
        /// Additional KEY=VALUE replacement, may be repeated.
        #[arg(long = "set")]
        replacements: Vec<String>,

        #[arg(long, value_enum, env = "ES_DOMAIN_SOURCE", default_value_t = DomainSource::Aws)]
        domain_source: DomainSource,

        #[arg(long, default_value = DEFAULT_GROUP)]
        group: String,
        #[arg(long, default_value = DEFAULT_VERSION)]
        api_version: String,
        #[arg(long, default_value = DEFAULT_KIND)]
        kind: String,
        #[arg(long, default_value = DEFAULT_PLURAL)]
        plural: String,

        #[arg(long, env = "CREATE_WAIT_INTERVAL_SECS", default_value_t = 15)]
        create_interval_secs: u64,
        #[arg(long, env = "CREATE_TIMEOUT_SECS", default_value_t = 900)]
        create_timeout_secs: u64,
        #[arg(long, env = "DELETE_WAIT_AFTER_SECS", default_value_t = 30)]
        delete_wait_after_secs: u64,
        #[arg(long, env = "DELETE_WAIT_INTERVAL_SECS", default_value_t = 15)]
        delete_interval_secs: u64,
        #[arg(long, env = "DELETE_TIMEOUT_SECS", default_value_t = 240)]
        delete_timeout_secs: u64,
    },
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    tracing_subscriber::fmt::init();
    let args = Args::parse();

    match run(args.command).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!("{err}");
            ExitCode::FAILURE
        }
    }
}

async fn run(command: Command) -> Result<(), Error> {
    match command {
        Command::Run {
            name,
            namespace,
            manifest,
            replacements,
            domain_source,
            group,
            api_version,
            kind,
            plural,
            create_interval_secs,
            create_timeout_secs,
            delete_wait_after_secs,
            delete_interval_secs,
            delete_timeout_secs,
        } => {
            let mut values = Replacements::for_domain(&name);
            for pair in &replacements {
                values.parse_pair(pair)?;
            }

            let resource = manifest::load(&manifest, &values)?;

            let reference = CustomResourceReference {
                group,
                version: api_version,
                kind,
                plural,
                name,
                namespace,
            };

            let timings = Timings {
                create_interval: Duration::from_secs(create_interval_secs),
                create_timeout: Duration::from_secs(create_timeout_secs),
                delete_wait_after: Duration::from_secs(delete_wait_after_secs),
                delete_interval: Duration::from_secs(delete_interval_secs),
                delete_timeout: Duration::from_secs(delete_timeout_secs),
            };

            let client = Client::try_default().await?;
            let resources = KubeResources::new(client.clone())?;

            match domain_source {
                DomainSource::Aws => {
                    let domains = AwsDomains::from_env().await;
                    scenario::run_create_delete(&resources, &domains, &reference, &resource, &timings)
                        .await?;
                }
                DomainSource::Status => {
                    let domains = StatusDomains::new(client, reference.clone());
                    scenario::run_create_delete(&resources, &domains, &reference, &resource, &timings)
                        .await?;
                }
            }

            info!("lifecycle of {reference} completed");
            Ok(())
        }
    }
}
