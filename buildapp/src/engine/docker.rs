use log::debug;

use super::{BuildImageError, BuildImageOptions, BuiltImage, Engine, EngineUnavailable};
use crate::docker;

/// Builds images through the `docker` command line. The CLI picks up `DOCKER_HOST` and friends
/// from the environment.
pub struct DockerEngine {
    server_version: docker::ServerVersion,
}

impl DockerEngine {
    pub fn connect() -> Result<Self, EngineUnavailable> {
        let server_version =
            docker::server_version().map_err(|error| EngineUnavailable::new(error.to_string()))?;
        debug!(
            "docker server version {version} (api {api_version})",
            version = server_version.version,
            api_version = server_version.api_version
        );
        Ok(Self { server_version })
    }

    pub fn server_version(&self) -> &str {
        &self.server_version.version
    }
}

// This conversion is necessary because the build options of the engine may differ from the build
// arguments accepted by the docker command line abstraction.
fn into_docker_args(options: BuildImageOptions) -> docker::BuildArgs {
    let BuildImageOptions {
        path,
        tag,
        use_cache,
        pull,
        remove_intermediate_containers,
    } = options;
    docker::BuildArgs {
        context: path,
        image_tag: tag,
        no_cache: !use_cache,
        pull,
        rm: remove_intermediate_containers,
    }
}

fn from_docker_output(output: docker::BuildOutput) -> BuiltImage {
    let docker::BuildOutput { image_id, records } = output;
    BuiltImage {
        id: image_id,
        logs: records,
    }
}

fn from_docker_error(error: docker::Error) -> BuildImageError {
    match error {
        docker::Error::Build { message, records } => BuildImageError::Build {
            message,
            logs: records,
        },
        docker::Error::Api(message) => BuildImageError::Api { message },
    }
}

impl Engine for DockerEngine {
    fn build_image(&self, options: BuildImageOptions) -> Result<BuiltImage, BuildImageError> {
        docker::build(into_docker_args(options))
            .map(from_docker_output)
            .map_err(from_docker_error)
    }
}
