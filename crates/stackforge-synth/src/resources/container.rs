//! Container definitions inside a service's task spec.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::json;
use stackforge_config::MissingFields;
use stackforge_core::stack::{ResourceKind, ResourceRecord};
use stackforge_core::{Result, ScopePath};

const DEFAULT_LOG_RETENTION_DAYS: u32 = 14;

/// Where a container's image comes from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ImageSource {
    /// Built from a local directory at synthesis time.
    LocalAsset { path: String },
    /// Pulled from a registry by URI.
    Registry { uri: String },
}

/// Structured logging destination for one container.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogSink {
    pub group: String,
    pub stream_prefix: String,
    pub retention_days: u32,
}

/// One container within a task spec: image, command, ports, environment
/// and log sink.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContainerSpec {
    name: String,
    image: ImageSource,
    command: Vec<String>,
    ports: Vec<u16>,
    env: BTreeMap<String, String>,
    log: LogSink,
}

impl ContainerSpec {
    pub fn builder(name: impl Into<String>) -> ContainerSpecBuilder {
        ContainerSpecBuilder {
            name: name.into(),
            image: None,
            command: Vec::new(),
            ports: Vec::new(),
            env: BTreeMap::new(),
            log_group: None,
            stream_prefix: None,
            retention_days: None,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn ports(&self) -> &[u16] {
        &self.ports
    }

    pub fn render(&self, parent: &ScopePath) -> Result<ResourceRecord> {
        Ok(ResourceRecord::new(
            parent.child(&self.name)?,
            ResourceKind::Container,
            json!({
                "image": self.image,
                "command": self.command,
                "ports": self.ports,
                "env": self.env,
                "log": self.log,
            }),
        ))
    }
}

/// Builder for [`ContainerSpec`]. Required: image and log group. The stream
/// prefix defaults to the container name.
#[derive(Debug)]
pub struct ContainerSpecBuilder {
    name: String,
    image: Option<ImageSource>,
    command: Vec<String>,
    ports: Vec<u16>,
    env: BTreeMap<String, String>,
    log_group: Option<String>,
    stream_prefix: Option<String>,
    retention_days: Option<u32>,
}

impl ContainerSpecBuilder {
    pub fn image(mut self, image: ImageSource) -> Self {
        self.image = Some(image);
        self
    }

    pub fn command(mut self, command: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.command = command.into_iter().map(Into::into).collect();
        self
    }

    pub fn port(mut self, port: u16) -> Self {
        self.ports.push(port);
        self
    }

    pub fn env_var(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.insert(key.into(), value.into());
        self
    }

    pub fn log_group(mut self, group: impl Into<String>) -> Self {
        self.log_group = Some(group.into());
        self
    }

    pub fn stream_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.stream_prefix = Some(prefix.into());
        self
    }

    pub fn retention_days(mut self, days: u32) -> Self {
        self.retention_days = Some(days);
        self
    }

    pub fn build(self) -> Result<ContainerSpec> {
        let mut missing = MissingFields::new();
        let image = missing.take_or("image", self.image, || ImageSource::Registry {
            uri: String::new(),
        });
        let log_group = missing.take_str("log_group", self.log_group);
        missing.check(format!("container '{}'", self.name))?;

        Ok(ContainerSpec {
            log: LogSink {
                group: log_group,
                stream_prefix: self.stream_prefix.unwrap_or_else(|| self.name.clone()),
                retention_days: self.retention_days.unwrap_or(DEFAULT_LOG_RETENTION_DAYS),
            },
            name: self.name,
            image,
            command: self.command,
            ports: self.ports,
            env: self.env,
        })
    }
}
