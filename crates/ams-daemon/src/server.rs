//! Unix-socket IPC front end.
//!
//! One listener, one task per connection. A connection carries any number of
//! request/response exchanges; each request is decoded at this boundary into
//! a typed [`AmsRequest`] and forwarded to the manager through its handle.
//! The front end holds no ability state of its own.

use std::path::{Path, PathBuf};

use ams_core::error::ErrorCode;
use ams_core::ipc::{
    decode_request, encode_response, read_frame, write_frame, AmsRequest, AmsResponse, IpcError,
};
use ams_core::service::AmsHandle;
use ams_core::STATUS_OK;
use tokio::net::{UnixListener, UnixStream};
use tracing::{debug, info, warn};

/// The daemon's listening socket and its manager handle.
#[derive(Debug)]
pub struct IpcServer {
    listener: UnixListener,
    socket_path: PathBuf,
    manager: AmsHandle,
}

impl IpcServer {
    /// Binds the manager socket, replacing a stale socket file from a
    /// previous run.
    ///
    /// # Errors
    ///
    /// Returns the underlying I/O error when the path cannot be bound.
    pub fn bind(socket_path: &Path, manager: AmsHandle) -> std::io::Result<Self> {
        if socket_path.exists() {
            debug!(path = %socket_path.display(), "removing stale socket file");
            std::fs::remove_file(socket_path)?;
        }
        let listener = UnixListener::bind(socket_path)?;
        info!(path = %socket_path.display(), "manager socket bound");
        Ok(Self {
            listener,
            socket_path: socket_path.to_path_buf(),
            manager,
        })
    }

    /// Path the listener is bound to.
    #[must_use]
    pub fn socket_path(&self) -> &Path {
        &self.socket_path
    }

    /// Accept loop. Runs until the task is cancelled; each connection gets
    /// its own task.
    pub async fn run(self) {
        loop {
            match self.listener.accept().await {
                Ok((stream, _addr)) => {
                    let manager = self.manager.clone();
                    tokio::spawn(serve_connection(stream, manager));
                },
                Err(e) => {
                    // Accept failures are transient (fd pressure); keep
                    // listening.
                    warn!(error = %e, "accept failed");
                },
            }
        }
    }
}

/// Removes the socket file left behind by a bound listener.
pub fn cleanup_socket(socket_path: &Path) {
    if socket_path.exists() {
        if let Err(e) = std::fs::remove_file(socket_path) {
            warn!(path = %socket_path.display(), error = %e, "failed to remove socket file");
        }
    }
}

async fn serve_connection(mut stream: UnixStream, manager: AmsHandle) {
    debug!("client connected");
    loop {
        let record = match read_frame(&mut stream).await {
            Ok(Some(record)) => record,
            Ok(None) => break,
            Err(e) => {
                warn!(error = %e, "dropping connection");
                break;
            },
        };

        let response = dispatch(&manager, &record).await;
        if let Err(e) = reply(&mut stream, &response).await {
            warn!(error = %e, "reply failed, dropping connection");
            break;
        }
    }
    debug!("client disconnected");
}

async fn reply(stream: &mut UnixStream, response: &AmsResponse) -> Result<(), IpcError> {
    let payload = encode_response(response)?;
    write_frame(stream, &payload).await
}

/// Decodes one request record and runs it against the manager. Decode
/// failures answer with an IPC status instead of killing the connection;
/// the record boundary is still intact.
async fn dispatch(manager: &AmsHandle, record: &[u8]) -> AmsResponse {
    let request = match decode_request(record) {
        Ok(request) => request,
        Err(e) => {
            warn!(error = %e, "malformed request record");
            return AmsResponse::error(ErrorCode::Ipc.as_status());
        },
    };
    debug!(?request, "dispatching");

    match request {
        AmsRequest::StartAbility { want } => status_reply(manager.start_ability(want).await),
        AmsRequest::TerminateAbility { token } => {
            status_reply(manager.terminate_ability(token).await)
        },
        AmsRequest::LifecycleDone { token, state } => {
            status_reply(manager.lifecycle_done(token, state).await)
        },
        AmsRequest::ForceStopApp { token } => status_reply(manager.force_stop_app(token).await),
        AmsRequest::ForceStopBundle { bundle_name } => {
            status_reply(manager.force_stop_bundle(bundle_name).await)
        },
        AmsRequest::GetTopAbility => match manager.get_top_ability().await {
            Ok(element) => AmsResponse {
                status: STATUS_OK,
                element,
            },
            Err(e) => AmsResponse::error(e.as_status()),
        },
    }
}

fn status_reply(result: Result<(), ams_core::AmsError>) -> AmsResponse {
    match result {
        Ok(()) => AmsResponse::ok(),
        Err(e) => AmsResponse::error(e.as_status()),
    }
}
