//! SSH transport: password authentication, exec channels and SCP

use super::{shell_escape, CommandOutput, RemoteSession};
use crate::config::RemoteHost;
use crate::path::{join_remote, relative_to, remote_file_name, to_remote};
use crate::scanner::{scan_tree, ScanOptions};
use crate::types::{CopierError, RemoteError, TransferError};
use ssh2::Session;
use std::fs::{self, File, Metadata};
use std::io::{self, Read, Write};
use std::net::{TcpStream, ToSocketAddrs};
use std::path::Path;
use std::thread;
use std::time::{Duration, UNIX_EPOCH};

const CHUNK_SIZE: usize = 128 * 1024;
const POLL_INTERVAL: Duration = Duration::from_millis(10);

/// One authenticated SSH connection used for both commands and SCP
pub struct SshSession {
    session: Session,
    target: String,
    closed: bool,
}

impl SshSession {
    /// Connect and authenticate with a password.
    ///
    /// TCP connect, handshake and authentication are bounded by the host's
    /// timeout; afterwards operations block without a limit.
    pub fn connect(host: &RemoteHost) -> Result<Self, CopierError> {
        let target = host.display_target();
        let fail = |reason: String| CopierError::Connection {
            target: target.clone(),
            reason,
        };

        tracing::info!("connecting to {}", target);
        let timeout = host.timeout();

        let addrs = (host.address.as_str(), host.port)
            .to_socket_addrs()
            .map_err(|e| fail(format!("cannot resolve address: {}", e)))?;

        let mut last_error = None;
        let mut stream = None;
        for addr in addrs {
            match TcpStream::connect_timeout(&addr, timeout) {
                Ok(tcp) => {
                    stream = Some(tcp);
                    break;
                }
                Err(e) => last_error = Some(e),
            }
        }
        let tcp = match (stream, last_error) {
            (Some(tcp), _) => tcp,
            (None, Some(e)) => return Err(fail(format!("TCP connection failed: {}", e))),
            (None, None) => return Err(fail("address resolved to nothing".to_string())),
        };

        let mut session =
            Session::new().map_err(|e| fail(format!("failed to create SSH session: {}", e)))?;
        session.set_timeout(timeout_millis(timeout));
        session.set_tcp_stream(tcp);
        session
            .handshake()
            .map_err(|e| fail(format!("SSH handshake failed: {}", e)))?;

        if let Some(hash) = session.host_key_hash(ssh2::HashType::Sha256) {
            let fingerprint: String = hash.iter().map(|b| format!("{:02x}", b)).collect();
            tracing::debug!("host key sha256 {}", fingerprint);
        }

        session
            .userauth_password(&host.username, &host.password)
            .map_err(|e| fail(format!("authentication failed: {}", e)))?;
        if !session.authenticated() {
            return Err(fail("authentication rejected".to_string()));
        }

        // Only connection setup is bounded
        session.set_timeout(0);

        tracing::info!("connected to {}", target);
        Ok(Self {
            session,
            target,
            closed: false,
        })
    }

    /// `mkdir -p` on the remote side
    fn make_remote_dir(&self, remote_dir: &str) -> Result<(), TransferError> {
        let failed = |reason: String| TransferError::Failed {
            path: remote_dir.to_string(),
            reason,
        };
        let output = self
            .execute(&format!("mkdir -p {}", shell_escape(remote_dir)))
            .map_err(|e| failed(e.to_string()))?;
        if output.has_error_output() {
            return Err(failed(output.stderr_text().trim().to_string()));
        }
        Ok(())
    }

    fn remote_exists(&self, remote_path: &str) -> Result<bool, RemoteError> {
        let output = self.execute(&format!(
            "test -e {} && echo yes || echo no",
            shell_escape(remote_path)
        ))?;
        Ok(output.stdout_text().trim() == "yes")
    }

    /// Send one regular file to `remote_path`
    fn send_file(
        &self,
        local_path: &Path,
        remote_path: &str,
        metadata: &Metadata,
    ) -> Result<u64, TransferError> {
        let failed = |reason: String| TransferError::Failed {
            path: local_path.display().to_string(),
            reason,
        };

        let mut local_file = File::open(local_path).map_err(|e| failed(e.to_string()))?;
        let mut channel = self
            .session
            .scp_send(
                Path::new(remote_path),
                file_mode(metadata),
                metadata.len(),
                file_times(metadata),
            )
            .map_err(|e| failed(format!("SCP send init failed: {}", e)))?;

        let mut buffer = vec![0u8; CHUNK_SIZE];
        let mut transferred = 0u64;
        loop {
            let n = local_file
                .read(&mut buffer)
                .map_err(|e| failed(format!("local read error: {}", e)))?;
            if n == 0 {
                break;
            }
            channel
                .write_all(&buffer[..n])
                .map_err(|e| failed(format!("SCP write error: {}", e)))?;
            transferred += n as u64;
        }

        channel
            .send_eof()
            .map_err(|e| failed(format!("failed to send EOF: {}", e)))?;
        channel
            .wait_eof()
            .map_err(|e| failed(format!("failed waiting for EOF: {}", e)))?;
        channel
            .close()
            .map_err(|e| failed(format!("failed to close channel: {}", e)))?;
        channel
            .wait_close()
            .map_err(|e| failed(format!("failed waiting for close: {}", e)))?;

        tracing::debug!("uploaded {} bytes to {}", transferred, remote_path);
        Ok(transferred)
    }

    /// Distinguish a missing remote file from other receive failures
    fn classify_recv_error(&self, remote_path: &str, error: ssh2::Error) -> TransferError {
        match self.remote_exists(remote_path) {
            Ok(false) => TransferError::NotFound {
                path: remote_path.to_string(),
            },
            Ok(true) => TransferError::Failed {
                path: remote_path.to_string(),
                reason: format!("SCP receive failed: {}", error),
            },
            Err(probe) => TransferError::Failed {
                path: remote_path.to_string(),
                reason: format!("SCP receive failed: {} ({})", error, probe),
            },
        }
    }
}

impl RemoteSession for SshSession {
    fn execute(&self, command: &str) -> Result<CommandOutput, RemoteError> {
        let exec_error = |reason: String| RemoteError::Execution {
            command: command.to_string(),
            reason,
        };

        let mut channel = self
            .session
            .channel_session()
            .map_err(|e| exec_error(format!("failed to open channel: {}", e)))?;
        channel
            .exec(command)
            .map_err(|e| exec_error(e.to_string()))?;

        // Both streams are drained together so neither can fill its window
        let mut out_stream = channel.stream(0);
        let mut err_stream = channel.stderr();
        self.session.set_blocking(false);
        let drained = drain_streams(&mut out_stream, &mut err_stream, || channel.eof());
        self.session.set_blocking(true);
        drop(out_stream);
        drop(err_stream);
        let (stdout, stderr) =
            drained.map_err(|e| exec_error(format!("failed to read output: {}", e)))?;

        channel
            .wait_close()
            .map_err(|e| exec_error(format!("failed waiting for close: {}", e)))?;
        let exit_status = channel.exit_status().ok();

        tracing::debug!(
            "'{}' exited with {:?} ({} bytes stdout, {} bytes stderr)",
            command,
            exit_status,
            stdout.len(),
            stderr.len()
        );
        Ok(CommandOutput {
            stdout,
            stderr,
            exit_status,
        })
    }

    fn upload(
        &self,
        local_path: &Path,
        remote_dir: &str,
        recursive: bool,
        filter: &ScanOptions,
    ) -> Result<u64, TransferError> {
        let failed = |reason: String| TransferError::Failed {
            path: local_path.display().to_string(),
            reason,
        };

        let metadata = fs::metadata(local_path).map_err(|e| failed(e.to_string()))?;
        let name = local_path
            .file_name()
            .map(|n| to_remote(&n.to_string_lossy()))
            .ok_or_else(|| failed("path has no file name".to_string()))?;
        let remote_base = join_remote(remote_dir, &name);

        if metadata.is_file() {
            return self.send_file(local_path, &remote_base, &metadata);
        }

        if !recursive {
            return Err(failed("is a directory (recursive upload not requested)".to_string()));
        }

        self.make_remote_dir(&remote_base)?;
        let mut transferred = 0u64;
        let entries = scan_tree(local_path, filter)
            .map_err(|e| failed(e.to_string()))?;
        for entry in entries {
            let relative = relative_to(local_path, &entry.absolute_path)
                .unwrap_or_else(|| entry.relative_path.clone());
            let remote_path = join_remote(&remote_base, &relative);
            if entry.is_dir {
                self.make_remote_dir(&remote_path)?;
            } else {
                let entry_metadata =
                    fs::metadata(&entry.absolute_path).map_err(|e| failed(e.to_string()))?;
                transferred += self.send_file(&entry.absolute_path, &remote_path, &entry_metadata)?;
            }
        }

        Ok(transferred)
    }

    fn download(&self, remote_path: &str, local_dir: &Path) -> Result<u64, TransferError> {
        let (mut channel, stat) = match self.session.scp_recv(Path::new(remote_path)) {
            Ok(received) => received,
            Err(e) => return Err(self.classify_recv_error(remote_path, e)),
        };

        let destination = local_dir.join(remote_file_name(remote_path));
        let transferred = super::receive::receive_atomic(&mut channel, &destination, stat.size())
            .map_err(|e| TransferError::Failed {
                path: remote_path.to_string(),
                reason: e.to_string(),
            })?;

        channel.send_eof().ok();
        channel.wait_eof().ok();
        channel.close().ok();
        channel.wait_close().ok();

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let mode = (stat.mode() as u32) & 0o7777;
            if mode != 0 {
                if let Err(e) = fs::set_permissions(&destination, fs::Permissions::from_mode(mode))
                {
                    tracing::warn!("cannot set mode on {}: {}", destination.display(), e);
                }
            }
        }

        tracing::debug!("downloaded {} bytes from {}", transferred, remote_path);
        Ok(transferred)
    }

    fn close(&mut self) -> Result<(), RemoteError> {
        if self.closed {
            return Ok(());
        }
        self.closed = true;

        tracing::info!("closing session to {}", self.target);
        self.session
            .disconnect(None, "copier finished", None)
            .map_err(|e| RemoteError::Close(e.to_string()))
    }
}

impl Drop for SshSession {
    fn drop(&mut self) {
        if let Err(e) = self.close() {
            tracing::warn!("{}", e);
        }
    }
}

/// Read two streams in turn until `at_eof` reports the end and neither has data left.
///
/// The readers may return `WouldBlock`; that just means nothing is ready yet.
fn drain_streams<O: Read, E: Read>(
    stdout: &mut O,
    stderr: &mut E,
    at_eof: impl Fn() -> bool,
) -> io::Result<(Vec<u8>, Vec<u8>)> {
    let mut out = Vec::new();
    let mut err = Vec::new();
    let mut buffer = vec![0u8; 32 * 1024];

    loop {
        let got_out = read_available(stdout, &mut buffer, &mut out)?;
        let got_err = read_available(stderr, &mut buffer, &mut err)?;
        let progressed = got_out || got_err;
        if !progressed {
            if at_eof() {
                return Ok((out, err));
            }
            thread::sleep(POLL_INTERVAL);
        }
    }
}

/// One read into `sink`; true if any bytes arrived
fn read_available<R: Read>(
    reader: &mut R,
    buffer: &mut [u8],
    sink: &mut Vec<u8>,
) -> io::Result<bool> {
    match reader.read(buffer) {
        Ok(0) => Ok(false),
        Ok(n) => {
            sink.extend_from_slice(&buffer[..n]);
            Ok(true)
        }
        Err(e) if matches!(e.kind(), io::ErrorKind::WouldBlock | io::ErrorKind::Interrupted) => {
            Ok(false)
        }
        Err(e) => Err(e),
    }
}

fn timeout_millis(timeout: Duration) -> u32 {
    u32::try_from(timeout.as_millis()).unwrap_or(u32::MAX)
}

#[cfg(unix)]
fn file_mode(metadata: &Metadata) -> i32 {
    use std::os::unix::fs::PermissionsExt;
    (metadata.permissions().mode() & 0o777) as i32
}

#[cfg(not(unix))]
fn file_mode(_metadata: &Metadata) -> i32 {
    0o644
}

/// (mtime, atime) in seconds, as scp expects
fn file_times(metadata: &Metadata) -> Option<(u64, u64)> {
    let mtime = metadata
        .modified()
        .ok()?
        .duration_since(UNIX_EPOCH)
        .ok()?
        .as_secs();
    let atime = metadata
        .accessed()
        .ok()
        .and_then(|t| t.duration_since(UNIX_EPOCH).ok())
        .map(|d| d.as_secs())
        .unwrap_or(mtime);
    Some((mtime, atime))
}
