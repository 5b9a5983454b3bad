pub mod artifactory;
pub mod client;
pub mod config;
pub mod error;
pub mod jenkins;
pub mod poller;
pub mod sonarqube;

pub use artifactory::ArtifactoryCollector;
pub use client::ServiceClient;
pub use config::{CollectorConfig, ServerConfig};
pub use error::CollectError;
pub use jenkins::JenkinsCollector;
pub use poller::{Collector, Poller, PollerHandle};
pub use sonarqube::SonarqubeCollector;
