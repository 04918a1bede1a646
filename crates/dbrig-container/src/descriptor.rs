//! Container descriptors and their fluent builder.

use dbrig_common::error::{DbrigError, Result};
use dbrig_common::types::{LifecycleMode, PortMapping};

/// Identity and launch parameters for one database container.
///
/// Immutable once handed to creation; the lifecycle manager never mutates
/// it. The `name` is the unique key every later operation uses.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContainerDescriptor {
    /// Container name; the unique key.
    pub name: String,
    /// Image reference, e.g. `postgres:16`.
    pub image: String,
    /// Host-to-container port mappings.
    pub ports: Vec<PortMapping>,
    /// Environment variables passed to the container.
    pub env: Vec<(String, String)>,
    /// Raw volume-mount strings in `host:container[:mode]` form.
    pub volumes: Vec<String>,
    /// How the container's lifetime is managed.
    pub mode: LifecycleMode,
}

impl ContainerDescriptor {
    /// Starts building a descriptor for the named container.
    #[must_use]
    pub fn builder(name: impl Into<String>) -> DescriptorBuilder {
        DescriptorBuilder::new(name)
    }
}

/// Builder for configuring a [`ContainerDescriptor`] before creation.
#[derive(Debug)]
pub struct DescriptorBuilder {
    name: String,
    image: Option<String>,
    ports: Vec<PortMapping>,
    env: Vec<(String, String)>,
    volumes: Vec<String>,
    mode: LifecycleMode,
}

impl DescriptorBuilder {
    /// Creates a new builder with the given container name.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            image: None,
            ports: Vec::new(),
            env: Vec::new(),
            volumes: Vec::new(),
            mode: LifecycleMode::Standalone,
        }
    }

    /// Sets the image reference.
    #[must_use]
    pub fn image(mut self, image: impl Into<String>) -> Self {
        self.image = Some(image.into());
        self
    }

    /// Adds a host-to-container port mapping.
    #[must_use]
    pub fn port(mut self, host: u16, container: u16) -> Self {
        self.ports.push(PortMapping::new(host, container));
        self
    }

    /// Adds an environment variable.
    #[must_use]
    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.push((key.into(), value.into()));
        self
    }

    /// Adds a raw volume-mount string in `host:container[:mode]` form.
    #[must_use]
    pub fn volume(mut self, raw: impl Into<String>) -> Self {
        self.volumes.push(raw.into());
        self
    }

    /// Sets the lifecycle mode. Defaults to [`LifecycleMode::Standalone`].
    #[must_use]
    pub const fn mode(mut self, mode: LifecycleMode) -> Self {
        self.mode = mode;
        self
    }

    /// Builds the descriptor.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if the name is empty or no image was
    /// set.
    pub fn build(self) -> Result<ContainerDescriptor> {
        if self.name.trim().is_empty() {
            return Err(DbrigError::config("container name must not be empty"));
        }
        let image = self
            .image
            .filter(|image| !image.trim().is_empty())
            .ok_or_else(|| DbrigError::config("an image reference is required"))?;
        Ok(ContainerDescriptor {
            name: self.name,
            image,
            ports: self.ports,
            env: self.env,
            volumes: self.volumes,
            mode: self.mode,
        })
    }
}
