use std::{fmt, path::Path};

use log::debug;
use serde_json::{Map, Value};

use crate::{process, temp_path};

/// One structured line of `docker build` output.
pub type Record = Map<String, Value>;

/// Partial implementation of the JSON emitted by `docker version --format '{{json .Server}}'`.
#[derive(Debug, serde::Deserialize)]
pub struct ServerVersion {
    #[serde(rename = "Version")]
    pub version: String,
    #[serde(rename = "ApiVersion")]
    pub api_version: String,
}

/// Asks the docker daemon for its version, which fails when no daemon is reachable.
pub fn server_version() -> Result<ServerVersion, Error> {
    let output = process::command!("docker", "version", "--format", "{{json .Server}}")
        .output()
        .map_err(|error| Error::Api(error.to_string()))?;

    // The server section is `null` when the client could talk to something that is not a daemon.
    serde_json::from_slice::<Option<ServerVersion>>(&output.stdout)
        .map_err(|error| Error::Api(format!("unexpected `docker version` output: {error}")))?
        .ok_or_else(|| Error::Api("the docker daemon did not report a server version".to_owned()))
}

pub struct BuildArgs<'a> {
    pub context: &'a Path,
    pub image_tag: &'a str,
    pub no_cache: bool,
    pub pull: bool,
    pub rm: bool,
}

pub struct BuildOutput {
    pub image_id: String,
    pub records: Vec<Record>,
}

#[derive(Debug)]
pub enum Error {
    /// The build ran but one of its steps failed.
    Build { message: String, records: Vec<Record> },
    /// Talking to the daemon failed.
    Api(String),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Build { message, .. } => f.write_str(message),
            Error::Api(message) => f.write_str(message),
        }
    }
}

impl std::error::Error for Error {}

pub fn build(args: BuildArgs) -> Result<BuildOutput, Error> {
    let BuildArgs {
        context,
        image_tag,
        no_cache,
        pull,
        rm,
    } = args;

    let iid_path = temp_path::tmp_path(".iid");

    let mut command = process::command!(
        "docker",
        "build",
        context,
        "--tag",
        image_tag,
        "--iidfile",
        iid_path,
        "--progress=plain",
        format!("--rm={rm}"),
    );
    if no_cache {
        command = process::args!(command, "--no-cache");
    }
    if pull {
        command = process::args!(command, "--pull");
    }

    let output = command
        .try_output()
        .map_err(|error| Error::Api(error.to_string()))?;

    let records = records(&output.stdout, &output.stderr);

    if !output.status.success() {
        remove_iid_file(&iid_path);
        return Err(classify_failure(
            &String::from_utf8_lossy(&output.stderr),
            records,
        ));
    }

    let image_id = std::fs::read_to_string(&iid_path);
    remove_iid_file(&iid_path);
    let image_id = image_id
        .map_err(|error| {
            Error::Api(format!(
                "failed to read the image id from {path}: {error}",
                path = iid_path.display()
            ))
        })?
        .trim()
        .to_owned();
    debug!("image_id: {image_id:?}");

    Ok(BuildOutput { image_id, records })
}

/// Docker only writes the file on success, so failing to remove it is not an error.
fn remove_iid_file(path: &Path) {
    if let Err(error) = std::fs::remove_file(path) {
        debug!("did not remove {path}: {error}", path = path.display());
    }
}

/// Converts the captured output into records. Lines that are JSON objects become their own record,
/// every other non-empty line becomes a `stream` record.
fn records(stdout: &[u8], stderr: &[u8]) -> Vec<Record> {
    [stdout, stderr]
        .into_iter()
        .flat_map(|bytes| {
            String::from_utf8_lossy(bytes)
                .lines()
                .filter(|line| !line.trim().is_empty())
                .map(record)
                .collect::<Vec<_>>()
        })
        .collect()
}

fn record(line: &str) -> Record {
    match serde_json::from_str(line) {
        Ok(Value::Object(map)) => map,
        _ => {
            let mut map = Map::with_capacity(1);
            map.insert("stream".to_owned(), Value::String(line.to_owned()));
            map
        }
    }
}

/// Messages printed by the docker CLI when it can not talk to the daemon.
const DAEMON_UNREACHABLE: [&str; 2] = [
    "Cannot connect to the Docker daemon",
    "error during connect",
];

fn classify_failure(stderr: &str, records: Vec<Record>) -> Error {
    let lines = || stderr.lines().rev().map(str::trim);

    // Lines starting with `#` are BuildKit step output, which may mention anything.
    if let Some(line) = lines().find(|line| {
        !line.starts_with('#') && DAEMON_UNREACHABLE.iter().any(|marker| line.contains(marker))
    }) {
        return Error::Api(line.to_owned());
    }

    let message = lines()
        .find_map(|line| line.strip_prefix("ERROR:"))
        .map(str::trim)
        .or_else(|| lines().find(|line| !line.is_empty()))
        .unwrap_or("docker build did not run successfully")
        .to_owned();

    Error::Build { message, records }
}
