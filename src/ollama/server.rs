use std::process::{Command, Stdio};
use std::time::Duration;
use tracing::{debug, info, warn};

use super::service::InferenceService;
use crate::app::ServerConfig;
use crate::utils::ServerError;

/// Starts the inference server
#[cfg_attr(test, mockall::automock)]
pub trait ServerLauncher: Send + Sync {
    /// Spawn the server and return without waiting for it
    fn launch(&self) -> Result<(), ServerError>;
}

/// Runs `<binary> serve` detached from this process
#[derive(Debug, Clone)]
pub struct OllamaServe {
    binary: String,
}

impl OllamaServe {
    pub fn new(binary: impl Into<String>) -> Self {
        Self {
            binary: binary.into(),
        }
    }

    fn command(&self) -> Command {
        let mut cmd = Command::new(&self.binary);
        cmd.arg("serve")
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null());
        detach(&mut cmd);
        cmd
    }
}

#[cfg(unix)]
fn detach(cmd: &mut Command) {
    use std::os::unix::process::CommandExt;

    // SAFETY: setsid is async-signal-safe and touches no state of the parent.
    unsafe {
        cmd.pre_exec(|| {
            if libc::setsid() == -1 {
                return Err(std::io::Error::last_os_error());
            }
            Ok(())
        });
    }
}

#[cfg(windows)]
fn detach(cmd: &mut Command) {
    use std::os::windows::process::CommandExt;

    const DETACHED_PROCESS: u32 = 0x0000_0008;
    const CREATE_NEW_PROCESS_GROUP: u32 = 0x0000_0200;
    cmd.creation_flags(DETACHED_PROCESS | CREATE_NEW_PROCESS_GROUP);
}

#[cfg(not(any(unix, windows)))]
fn detach(_cmd: &mut Command) {}

impl ServerLauncher for OllamaServe {
    fn launch(&self) -> Result<(), ServerError> {
        let child = self.command().spawn().map_err(|source| ServerError::Launch {
            binary: self.binary.clone(),
            source,
        })?;
        // The handle goes out of scope here; that neither waits for nor kills the server.
        info!("Spawned `{} serve` (pid {})", self.binary, child.id());
        Ok(())
    }
}

/// How long to wait for a freshly launched server
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReadinessPolicy {
    /// Delay before the first probe
    pub startup_grace: Duration,
    /// Delay between probes
    pub check_interval: Duration,
    /// Number of probes before giving up
    pub max_attempts: usize,
    /// Spawn the server when it is not reachable
    pub auto_start: bool,
}

impl Default for ReadinessPolicy {
    fn default() -> Self {
        Self::from(&ServerConfig::default())
    }
}

impl From<&ServerConfig> for ReadinessPolicy {
    fn from(config: &ServerConfig) -> Self {
        Self {
            startup_grace: Duration::from_secs(config.startup_grace_secs),
            check_interval: Duration::from_secs(config.check_interval_secs),
            max_attempts: config.max_startup_attempts,
            auto_start: config.auto_start,
        }
    }
}

/// Outcome of a successful readiness check
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServerState {
    /// The first probe succeeded
    AlreadyRunning,
    /// The server was launched and answered a later probe
    Started,
}

/// Probe the server and launch it if it does not answer.
pub async fn ensure_server_ready(
    service: &dyn InferenceService,
    launcher: &dyn ServerLauncher,
    policy: &ReadinessPolicy,
) -> Result<ServerState, ServerError> {
    match service.list_models().await {
        Ok(_) => {
            debug!("Ollama server is reachable");
            return Ok(ServerState::AlreadyRunning);
        }
        Err(e) => {
            warn!("Ollama server check failed: {}", e);
        }
    }

    if !policy.auto_start {
        return Err(ServerError::AutoStartDisabled);
    }

    info!("Starting Ollama server...");
    launcher.launch()?;

    tokio::time::sleep(policy.startup_grace).await;
    let mut waited = policy.startup_grace;

    for attempt in 0..policy.max_attempts {
        match service.list_models().await {
            Ok(_) => {
                info!("Ollama server is ready");
                return Ok(ServerState::Started);
            }
            Err(e) => debug!("Readiness probe {} failed: {}", attempt + 1, e),
        }
        if attempt + 1 < policy.max_attempts {
            tokio::time::sleep(policy.check_interval).await;
            waited += policy.check_interval;
        }
    }

    Err(ServerError::NotReady { waited })
}
