use std::io::{BufRead, BufReader, Write};
use std::os::unix::net::UnixStream;
use std::path::Path;
use std::thread::sleep;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use rigging_core::ConfigurationId;

use crate::error::{io_err, DaemonError};
use crate::paths::socket_path;

/// Build lifecycle event, as delivered by the host.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum BuildEvent {
    /// A project configuration is about to build.
    ConfigBegin {
        project: String,
        configuration: String,
        platform: String,
    },
    /// A project configuration finished building.
    ConfigDone {
        project: String,
        configuration: String,
        platform: String,
        success: bool,
    },
    /// The whole build finished.
    BuildDone,
}

impl BuildEvent {
    pub fn kind(&self) -> &'static str {
        match self {
            BuildEvent::ConfigBegin { .. } => "config_begin",
            BuildEvent::ConfigDone { .. } => "config_done",
            BuildEvent::BuildDone => "build_done",
        }
    }

    /// Project and configuration the event refers to, if any.
    pub fn target(&self) -> Option<(&str, ConfigurationId)> {
        match self {
            BuildEvent::ConfigBegin {
                project,
                configuration,
                platform,
            }
            | BuildEvent::ConfigDone {
                project,
                configuration,
                platform,
                ..
            } => Some((project.as_str(), ConfigurationId::new(configuration, platform))),
            BuildEvent::BuildDone => None,
        }
    }
}

/// JSON newline-delimited request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DaemonRequest {
    pub cmd: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub event: Option<BuildEvent>,
}

impl DaemonRequest {
    pub fn new(cmd: &str) -> Self {
        Self {
            cmd: cmd.to_string(),
            project: None,
            event: None,
        }
    }
}

/// JSON newline-delimited response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DaemonResponse {
    pub ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl DaemonResponse {
    pub fn ok(data: Value) -> Self {
        Self {
            ok: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            ok: false,
            data: None,
            error: Some(message.into()),
        }
    }
}

/// Send one JSON request to the solution's daemon socket and return one response.
pub fn send_request(root: &Path, request: &DaemonRequest) -> Result<DaemonResponse, DaemonError> {
    let socket = socket_path(root);
    let not_running = || DaemonError::DaemonNotRunning {
        socket: socket.clone(),
    };
    if !socket.exists() {
        return Err(not_running());
    }

    let mut stream = match UnixStream::connect(&socket) {
        Ok(stream) => stream,
        Err(err) if is_dead_socket(&err) => return Err(not_running()),
        Err(err) => return Err(io_err(&socket, err)),
    };

    let mut line = serde_json::to_vec(request)?;
    line.push(b'\n');
    stream
        .write_all(&line)
        .and_then(|()| stream.flush())
        .map_err(|e| io_err(&socket, e))?;

    let mut reply = String::new();
    let read = BufReader::new(stream)
        .read_line(&mut reply)
        .map_err(|e| io_err(&socket, e))?;
    if read == 0 {
        return Err(DaemonError::Protocol(
            "connection closed without a response".to_string(),
        ));
    }
    Ok(serde_json::from_str(reply.trim_end())?)
}

fn is_dead_socket(err: &std::io::Error) -> bool {
    use std::io::ErrorKind::*;
    matches!(err.kind(), NotFound | ConnectionRefused | ConnectionReset)
}

/// Query daemon status, retrying briefly while a starting daemon binds its socket.
pub fn request_status(root: &Path) -> Result<Value, DaemonError> {
    const ATTEMPTS: u32 = 5;
    let request = DaemonRequest::new("status");
    let mut attempt = 1;
    loop {
        match send_request(root, &request) {
            Err(DaemonError::DaemonNotRunning { .. }) if attempt < ATTEMPTS => {
                attempt += 1;
                sleep(Duration::from_millis(100));
            }
            result => return result.and_then(into_data),
        }
    }
}

pub fn request_stop(root: &Path) -> Result<(), DaemonError> {
    let response = send_request(root, &DaemonRequest::new("stop"))?;
    into_data(response).map(|_| ())
}

pub fn request_sync(root: &Path, project: Option<String>) -> Result<Value, DaemonError> {
    let request = DaemonRequest {
        project,
        ..DaemonRequest::new("sync")
    };
    into_data(send_request(root, &request)?)
}

/// Queue a build lifecycle event. Returns once the daemon has accepted it.
pub fn send_event(root: &Path, event: BuildEvent) -> Result<Value, DaemonError> {
    let request = DaemonRequest {
        event: Some(event),
        ..DaemonRequest::new("event")
    };
    into_data(send_request(root, &request)?)
}

fn into_data(response: DaemonResponse) -> Result<Value, DaemonError> {
    match response {
        DaemonResponse { ok: true, data, .. } => Ok(data.unwrap_or(Value::Null)),
        DaemonResponse { error, .. } => Err(DaemonError::Protocol(
            error.unwrap_or_else(|| "daemon reported an error without detail".to_string()),
        )),
    }
}
