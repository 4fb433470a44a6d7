//! Client side of the manager protocol.
//!
//! [`AmsClient`] wraps one Unix-socket connection to the manager. Discovery
//! is a bounded retry loop: the manager may not have bound its socket yet
//! when a client starts, so [`AmsClient::connect`] keeps trying at a fixed
//! interval and gives up with [`ClientError::Discovery`] once the attempt
//! budget is spent. Requests on an established connection never retry.

use std::path::{Path, PathBuf};
use std::time::Duration;

use tokio::net::UnixStream;
use tracing::{debug, warn};

use crate::config::AmsConfig;
use crate::error::{ErrorCode, STATUS_OK};
use crate::ipc::{
    decode_response, encode_request, read_frame, write_frame, AmsRequest, AmsResponse, IpcError,
};
use crate::record::LifecycleState;
use crate::want::{ElementName, Want};

/// Client-side failures.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// The manager socket never became reachable.
    #[error("manager not reachable at {path} after {attempts} attempts")]
    Discovery {
        /// Socket path that was probed.
        path: PathBuf,
        /// Number of connection attempts made.
        attempts: u32,
    },

    /// Transport or codec failure.
    #[error(transparent)]
    Ipc(#[from] IpcError),

    /// The manager closed the connection without replying.
    #[error("manager closed the connection without a reply")]
    NoReply,

    /// The manager rejected the request.
    #[error("manager rejected the request (status {status})")]
    Rejected {
        /// Raw wire status.
        status: i32,
    },
}

impl ClientError {
    /// Decoded error code for a [`ClientError::Rejected`] status, if the
    /// status is known.
    #[must_use]
    pub const fn code(&self) -> Option<ErrorCode> {
        match self {
            Self::Rejected { status } => ErrorCode::from_status(*status),
            _ => None,
        }
    }
}

/// How a client locates the manager.
#[derive(Debug, Clone)]
pub struct DiscoveryConfig {
    /// Manager socket path.
    pub socket_path: PathBuf,
    /// Connection attempt ceiling.
    pub retries: u32,
    /// Sleep between attempts.
    pub retry_interval: Duration,
}

impl DiscoveryConfig {
    /// Discovery settings for a fixed socket path with the default retry
    /// budget.
    #[must_use]
    pub fn for_socket(socket_path: impl Into<PathBuf>) -> Self {
        let defaults = AmsConfig::default();
        Self {
            socket_path: socket_path.into(),
            retries: defaults.discovery_retries,
            retry_interval: defaults.discovery_retry_interval,
        }
    }
}

impl From<&AmsConfig> for DiscoveryConfig {
    fn from(config: &AmsConfig) -> Self {
        Self {
            socket_path: config.socket_path.clone(),
            retries: config.discovery_retries,
            retry_interval: config.discovery_retry_interval,
        }
    }
}

/// One connection to the manager.
#[derive(Debug)]
pub struct AmsClient {
    stream: UnixStream,
}

impl AmsClient {
    /// Connects to the manager, retrying until the socket answers or the
    /// attempt budget is spent.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Discovery`] when every attempt fails.
    pub async fn connect(discovery: &DiscoveryConfig) -> Result<Self, ClientError> {
        let attempts = discovery.retries.max(1);
        for attempt in 1..=attempts {
            match UnixStream::connect(&discovery.socket_path).await {
                Ok(stream) => {
                    debug!(path = %discovery.socket_path.display(), attempt, "connected to manager");
                    return Ok(Self { stream });
                },
                Err(e) => {
                    debug!(
                        path = %discovery.socket_path.display(),
                        attempt,
                        error = %e,
                        "manager not reachable yet"
                    );
                    if attempt < attempts {
                        tokio::time::sleep(discovery.retry_interval).await;
                    }
                },
            }
        }
        warn!(path = %discovery.socket_path.display(), attempts, "manager discovery failed");
        Err(ClientError::Discovery {
            path: discovery.socket_path.clone(),
            attempts,
        })
    }

    /// Connects to the manager at `socket_path` with the default retry
    /// budget.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Discovery`] when every attempt fails.
    pub async fn connect_to(socket_path: impl AsRef<Path>) -> Result<Self, ClientError> {
        Self::connect(&DiscoveryConfig::for_socket(socket_path.as_ref())).await
    }

    async fn call(&mut self, request: &AmsRequest) -> Result<AmsResponse, ClientError> {
        let record = encode_request(request)?;
        write_frame(&mut self.stream, &record).await?;
        let payload = read_frame(&mut self.stream)
            .await?
            .ok_or(ClientError::NoReply)?;
        Ok(decode_response(&payload)?)
    }

    async fn call_status(&mut self, request: &AmsRequest) -> Result<(), ClientError> {
        let response = self.call(request).await?;
        if response.status == STATUS_OK {
            Ok(())
        } else {
            Err(ClientError::Rejected {
                status: response.status,
            })
        }
    }

    /// Asks the manager to start the ability a want describes.
    ///
    /// # Errors
    ///
    /// Propagates transport failures and manager rejections.
    pub async fn start_ability(&mut self, want: &Want) -> Result<(), ClientError> {
        self.call_status(&AmsRequest::StartAbility { want: want.clone() })
            .await
    }

    /// Asks the manager to gracefully terminate `token`.
    ///
    /// # Errors
    ///
    /// Propagates transport failures and manager rejections.
    pub async fn terminate_ability(&mut self, token: u16) -> Result<(), ClientError> {
        self.call_status(&AmsRequest::TerminateAbility { token })
            .await
    }

    /// Reports a lifecycle completion on behalf of `token`.
    ///
    /// The wire carries only the token's low byte; see the codec notes.
    ///
    /// # Errors
    ///
    /// Propagates transport failures and manager rejections.
    pub async fn lifecycle_done(
        &mut self,
        token: u16,
        state: LifecycleState,
    ) -> Result<(), ClientError> {
        self.call_status(&AmsRequest::LifecycleDone { token, state })
            .await
    }

    /// Asks the manager to force-stop the application holding `token`.
    ///
    /// # Errors
    ///
    /// Propagates transport failures and manager rejections.
    pub async fn force_stop_app(&mut self, token: u16) -> Result<(), ClientError> {
        self.call_status(&AmsRequest::ForceStopApp { token }).await
    }

    /// Asks the manager to force-stop the application owning `bundle_name`.
    ///
    /// # Errors
    ///
    /// Propagates transport failures and manager rejections.
    pub async fn force_stop_bundle(&mut self, bundle_name: &str) -> Result<(), ClientError> {
        self.call_status(&AmsRequest::ForceStopBundle {
            bundle_name: bundle_name.to_string(),
        })
        .await
    }

    /// Queries the authoritative foreground identity.
    ///
    /// # Errors
    ///
    /// Propagates transport failures and manager rejections.
    pub async fn get_top_ability(&mut self) -> Result<Option<ElementName>, ClientError> {
        let response = self.call(&AmsRequest::GetTopAbility).await?;
        if response.status == STATUS_OK {
            Ok(response.element)
        } else {
            Err(ClientError::Rejected {
                status: response.status,
            })
        }
    }
}
