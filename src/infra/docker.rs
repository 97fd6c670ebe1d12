//! Infrastructure implementation of the `ContainerRuntime` port.
//!
//! `BollardRuntime` talks to the Docker daemon over its control socket via
//! the `bollard` client and maps client errors onto the domain taxonomy:
//! transport failures become `Unavailable`, daemon rejections become
//! `Network`, and missing images become `ImageNotFound`.

use std::collections::HashMap;

use bollard::Docker;
use bollard::container::{
    Config, CreateContainerOptions, ListContainersOptions, LogsOptions, RemoveContainerOptions,
    StartContainerOptions, StopContainerOptions,
};
use bollard::errors::Error as DockerError;
use bollard::exec::{CreateExecOptions, StartExecResults};
use bollard::image::{CreateImageOptions, ListImagesOptions, RemoveImageOptions};
use bollard::models::HostConfig;
use futures_util::StreamExt;
use tracing::debug;

use crate::application::ports::{
    ContainerRuntime, ContainerSpec, ContainerSummary, ExecOutput, ImageSummary, RuntimeVersion,
};
use crate::domain::{ContainerHandle, Endpoint, ImageRef, LifecycleState, RuntimeError};
use crate::infra::config::RuntimeConfig;

/// Seconds before an idle daemon connection is considered dead.
const CONNECT_TIMEOUT_SECS: u64 = 30;

/// Seconds a container gets to stop gracefully before the kill.
const STOP_GRACE_SECS: i64 = 5;

/// Production `ContainerRuntime` backed by the Docker control socket.
pub struct BollardRuntime {
    docker: Docker,
    socket: String,
}

impl BollardRuntime {
    /// Connect using the given configuration. The connection is lazy —
    /// [`ContainerRuntime::ping`] performs the first real round-trip.
    ///
    /// # Errors
    ///
    /// Returns [`RuntimeError::Unavailable`] when the client cannot be
    /// constructed for the socket at all.
    pub fn connect(config: &RuntimeConfig) -> Result<Self, RuntimeError> {
        let docker = Docker::connect_with_socket(
            config.socket_path(),
            CONNECT_TIMEOUT_SECS,
            bollard::API_DEFAULT_VERSION,
        )
        .map_err(|e| RuntimeError::Unavailable(e.to_string()))?;
        Ok(Self {
            docker,
            socket: config.socket_path().to_owned(),
        })
    }
}

/// Map a client error outside any image-specific context.
///
/// The socket answered the initial ping, so mid-flow failures are
/// `Network`; only a dropped transport means the daemon itself is gone.
fn classify(err: DockerError) -> RuntimeError {
    match err {
        DockerError::DockerResponseServerError {
            status_code,
            message,
        } => RuntimeError::Network(format!("daemon returned {status_code}: {message}")),
        e @ DockerError::IOError { .. } => RuntimeError::Unavailable(e.to_string()),
        other => RuntimeError::Network(other.to_string()),
    }
}

/// Map a client error where a 404 means the named image is missing.
fn classify_for_image(err: DockerError, image: &ImageRef) -> RuntimeError {
    match err {
        DockerError::DockerResponseServerError {
            status_code: 404, ..
        } => RuntimeError::ImageNotFound(image.to_string()),
        other => classify(other),
    }
}

impl ContainerRuntime for BollardRuntime {
    async fn ping(&self) -> Result<(), RuntimeError> {
        self.docker
            .ping()
            .await
            .map_err(|e| RuntimeError::Unavailable(format!("{} ({})", e, self.socket)))?;
        Ok(())
    }

    async fn version(&self) -> Result<RuntimeVersion, RuntimeError> {
        let version = self.docker.version().await.map_err(classify)?;
        Ok(RuntimeVersion {
            version: version.version.unwrap_or_default(),
            api_version: version.api_version.unwrap_or_default(),
        })
    }

    async fn list_images(&self) -> Result<Vec<ImageSummary>, RuntimeError> {
        let images = self
            .docker
            .list_images(Some(ListImagesOptions::<String> {
                all: false,
                ..Default::default()
            }))
            .await
            .map_err(classify)?;
        Ok(images
            .into_iter()
            .map(|i| ImageSummary {
                id: i.id,
                tags: i.repo_tags,
            })
            .collect())
    }

    async fn list_containers(&self, all: bool) -> Result<Vec<ContainerSummary>, RuntimeError> {
        let containers = self
            .docker
            .list_containers(Some(ListContainersOptions::<String> {
                all,
                ..Default::default()
            }))
            .await
            .map_err(classify)?;
        Ok(containers
            .into_iter()
            .map(|c| ContainerSummary {
                id: c.id.unwrap_or_default(),
                name: c
                    .names
                    .unwrap_or_default()
                    .first()
                    .map(|n| n.trim_start_matches('/').to_owned())
                    .unwrap_or_default(),
                image: c.image.unwrap_or_default(),
                state: c.state.unwrap_or_default(),
            })
            .collect())
    }

    async fn pull_image(&self, image: &ImageRef) -> Result<(), RuntimeError> {
        let options = CreateImageOptions {
            from_image: image.to_string(),
            ..Default::default()
        };
        let mut stream = self.docker.create_image(Some(options), None, None);
        while let Some(progress) = stream.next().await {
            let _ = progress.map_err(|e| classify_for_image(e, image))?;
        }
        debug!(image = %image, "image pulled");
        Ok(())
    }

    async fn create_container(&self, spec: &ContainerSpec) -> Result<ContainerHandle, RuntimeError> {
        let exposed_ports = spec.publish_port.map(|port| {
            let mut ports = HashMap::new();
            let _ = ports.insert(format!("{port}/tcp"), HashMap::new());
            ports
        });
        let host_config = spec.publish_port.map(|_| HostConfig {
            publish_all_ports: Some(true),
            ..Default::default()
        });
        let config = Config {
            image: Some(spec.image.to_string()),
            cmd: spec.cmd.clone(),
            exposed_ports,
            host_config,
            ..Default::default()
        };
        let options = CreateContainerOptions {
            name: spec.name.clone(),
            platform: None,
        };

        let response = self
            .docker
            .create_container(Some(options), config)
            .await
            .map_err(|e| classify_for_image(e, &spec.image))?;
        debug!(container = %spec.name, id = %response.id, "container created");

        Ok(ContainerHandle {
            id: response.id,
            name: spec.name.clone(),
            image: spec.image.clone(),
            state: LifecycleState::Created,
        })
    }

    async fn start_container(&self, handle: &ContainerHandle) -> Result<(), RuntimeError> {
        self.docker
            .start_container(&handle.id, None::<StartContainerOptions<String>>)
            .await
            .map_err(classify)
    }

    async fn resolve_endpoint(
        &self,
        handle: &ContainerHandle,
        container_port: u16,
    ) -> Result<Endpoint, RuntimeError> {
        let inspect = self
            .docker
            .inspect_container(&handle.id, None)
            .await
            .map_err(classify)?;
        let key = format!("{container_port}/tcp");
        let binding = inspect
            .network_settings
            .and_then(|ns| ns.ports)
            .and_then(|ports| ports.get(&key).cloned())
            .flatten()
            .and_then(|bindings| bindings.first().cloned())
            .ok_or_else(|| {
                RuntimeError::Network(format!("no host binding published for {key}"))
            })?;

        let port = binding
            .host_port
            .as_deref()
            .and_then(|p| p.parse::<u16>().ok())
            .ok_or_else(|| RuntimeError::Network(format!("unparseable host port for {key}")))?;
        let host = match binding.host_ip.as_deref() {
            None | Some("" | "0.0.0.0" | "::") => "127.0.0.1".to_owned(),
            Some(ip) => ip.to_owned(),
        };
        Ok(Endpoint { host, port })
    }

    async fn logs(&self, handle: &ContainerHandle, tail: usize) -> Result<String, RuntimeError> {
        let options = LogsOptions::<String> {
            stdout: true,
            stderr: true,
            tail: tail.to_string(),
            ..Default::default()
        };
        let mut stream = self.docker.logs(&handle.id, Some(options));
        let mut collected = String::new();
        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(classify)?;
            collected.push_str(&chunk.to_string());
        }
        Ok(collected)
    }

    async fn exec(&self, handle: &ContainerHandle, cmd: &[&str]) -> Result<ExecOutput, RuntimeError> {
        let options = CreateExecOptions::<String> {
            attach_stdout: Some(true),
            attach_stderr: Some(true),
            cmd: Some(cmd.iter().map(ToString::to_string).collect()),
            ..Default::default()
        };
        let exec = self
            .docker
            .create_exec(&handle.id, options)
            .await
            .map_err(classify)?;

        let mut collected = String::new();
        if let StartExecResults::Attached { mut output, .. } = self
            .docker
            .start_exec(&exec.id, None)
            .await
            .map_err(classify)?
        {
            while let Some(chunk) = output.next().await {
                let chunk = chunk.map_err(classify)?;
                collected.push_str(&chunk.to_string());
            }
        }

        let inspect = self.docker.inspect_exec(&exec.id).await.map_err(classify)?;
        Ok(ExecOutput {
            exit_code: inspect.exit_code.unwrap_or(-1),
            output: collected,
        })
    }

    async fn stop_container(&self, handle: &ContainerHandle) -> Result<(), RuntimeError> {
        let options = StopContainerOptions { t: STOP_GRACE_SECS };
        match self.docker.stop_container(&handle.id, Some(options)).await {
            Ok(()) => {
                debug!(container = %handle.name, "container stopped");
                Ok(())
            }
            // Already stopped / already gone.
            Err(DockerError::DockerResponseServerError {
                status_code: 304 | 404,
                ..
            }) => Ok(()),
            Err(e) => Err(classify(e)),
        }
    }

    async fn remove_container(&self, handle: &ContainerHandle) -> Result<(), RuntimeError> {
        let options = RemoveContainerOptions {
            force: true,
            ..Default::default()
        };
        match self.docker.remove_container(&handle.id, Some(options)).await {
            Ok(()) => {
                debug!(container = %handle.name, "container removed");
                Ok(())
            }
            Err(DockerError::DockerResponseServerError {
                status_code: 404, ..
            }) => Ok(()),
            Err(e) => Err(classify(e)),
        }
    }

    async fn remove_image(&self, image: &ImageRef) -> Result<(), RuntimeError> {
        let options = RemoveImageOptions {
            force: true,
            ..Default::default()
        };
        match self
            .docker
            .remove_image(image.as_str(), Some(options), None)
            .await
        {
            Ok(_) => {
                debug!(image = %image, "image removed");
                Ok(())
            }
            Err(DockerError::DockerResponseServerError {
                status_code: 404, ..
            }) => Ok(()),
            Err(e) => Err(classify(e)),
        }
    }
}
