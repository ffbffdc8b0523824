//! Player module - mpv integration with progress reporting

use crate::core::progress::ProgressTracker;
use crate::error::{MflixError, Result};
use std::io::Write;
use std::process::{ExitStatus, Stdio};
use tokio::process::{Child, Command};

/// mpv exit code when the user quits with `q`
const MPV_USER_QUIT: i32 = 4;

/// Play a movie in mpv, starting at `start_at` seconds.
///
/// The position is sampled while mpv runs and handed to `tracker`; the last
/// sample is flushed when mpv exits, whatever the exit status.
pub async fn play(start_at: Option<f64>, mut tracker: ProgressTracker<'_>) -> Result<()> {
    if !is_command_available("mpv").await {
        return Err(MflixError::MissingDependency("mpv".into()));
    }

    let movie = tracker.movie().clone();
    let url = movie
        .video_url()
        .ok_or_else(|| MflixError::NoStream(movie.title()))?;

    let mut args = vec![
        "--really-quiet".to_string(),
        format!("--force-media-title={}", movie.title()),
    ];
    if let Some(secs) = start_at {
        args.push(format!("--start={:.0}", secs));
    }

    #[cfg(unix)]
    let socket_path =
        std::env::temp_dir().join(format!("mflix-mpv-{}.sock", std::process::id()));
    #[cfg(unix)]
    args.push(format!("--input-ipc-server={}", socket_path.display()));

    args.push(url);

    match start_at {
        Some(secs) => println!("⏯  Resuming at {}", format_timestamp(secs)),
        None => println!("▶  Starting from the beginning"),
    }
    print!("⏳ Loading {}...", movie.title());
    std::io::stdout().flush().ok();

    tracing::info!(movie_id = %movie.movie_id, ?start_at, "starting mpv");

    // Inherited stdio so keyboard controls work
    let child = Command::new("mpv")
        .args(&args)
        .stdin(Stdio::inherit())
        .stdout(Stdio::inherit())
        .stderr(Stdio::null())
        .kill_on_drop(true)
        .spawn()
        .map_err(|e| MflixError::Spawn(format!("Failed to start mpv: {}", e)))?;

    #[cfg(unix)]
    let status = {
        let status = ipc::watch_playback(child, &socket_path, &mut tracker).await;
        let _ = std::fs::remove_file(&socket_path);
        status
    };
    #[cfg(not(unix))]
    let status = wait_for(child).await;

    tracker.finish();
    let status = status?;

    // Clear the loading line
    print!("\r\x1b[K");

    if !status.success() && status.code() != Some(MPV_USER_QUIT) {
        return Err(MflixError::Spawn(format!(
            "mpv exited with code: {:?}",
            status.code()
        )));
    }

    println!("👋 See you next time.");
    Ok(())
}

#[cfg(not(unix))]
async fn wait_for(mut child: Child) -> Result<ExitStatus> {
    Ok(child.wait().await?)
}

/// `1:02:03` / `4:05`
pub fn format_timestamp(secs: f64) -> String {
    let total = secs.max(0.0) as u64;
    let (h, m, s) = (total / 3600, (total % 3600) / 60, total % 60);
    if h > 0 {
        format!("{}:{:02}:{:02}", h, m, s)
    } else {
        format!("{}:{:02}", m, s)
    }
}

/// Check if a command is available in PATH
async fn is_command_available(cmd: &str) -> bool {
    Command::new("which")
        .arg(cmd)
        .output()
        .await
        .map(|o| o.status.success())
        .unwrap_or(false)
}

/// mpv JSON IPC: one JSON object per line in each direction
#[cfg(unix)]
mod ipc {
    use super::*;
    use serde_json::{Value, json};
    use std::path::Path;
    use std::time::{Duration, Instant};
    use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, Lines};
    use tokio::net::UnixStream;
    use tokio::net::unix::{OwnedReadHalf, OwnedWriteHalf};
    use tokio::time::{interval, timeout};

    const POLL_INTERVAL: Duration = Duration::from_secs(1);
    const REPLY_TIMEOUT: Duration = Duration::from_millis(500);

    pub(super) struct MpvIpc {
        lines: Lines<BufReader<OwnedReadHalf>>,
        writer: OwnedWriteHalf,
        next_id: u64,
    }

    impl MpvIpc {
        async fn connect(path: &Path) -> std::io::Result<Self> {
            let stream = UnixStream::connect(path).await?;
            let (reader, writer) = stream.into_split();
            Ok(Self {
                lines: BufReader::new(reader).lines(),
                writer,
                next_id: 1,
            })
        }

        /// `Ok(None)` when mpv answers but the property has no value yet
        async fn get_f64(&mut self, property: &str) -> std::io::Result<Option<f64>> {
            let request_id = self.next_id;
            self.next_id += 1;

            let mut request = json!({
                "command": ["get_property", property],
                "request_id": request_id,
            })
            .to_string();
            request.push('\n');
            self.writer.write_all(request.as_bytes()).await?;

            match timeout(REPLY_TIMEOUT, self.read_reply(request_id)).await {
                Ok(result) => result,
                Err(_) => Err(std::io::Error::from(std::io::ErrorKind::TimedOut)),
            }
        }

        /// Skip event lines and stale replies until `request_id` is answered
        async fn read_reply(&mut self, request_id: u64) -> std::io::Result<Option<f64>> {
            while let Some(line) = self.lines.next_line().await? {
                if let Some((id, value)) = parse_reply(&line) {
                    if id == request_id {
                        return Ok(value);
                    }
                }
            }
            Err(std::io::Error::from(std::io::ErrorKind::UnexpectedEof))
        }
    }

    /// Reply id and value; `None` for event lines and anything unparseable
    pub(super) fn parse_reply(line: &str) -> Option<(u64, Option<f64>)> {
        let reply: Value = serde_json::from_str(line).ok()?;
        let id = reply.get("request_id")?.as_u64()?;
        let value = match reply.get("error").and_then(Value::as_str) {
            Some("success") => reply.get("data").and_then(Value::as_f64),
            _ => None,
        };
        Some((id, value))
    }

    /// Sample `time-pos` and `duration` once per second until mpv exits
    pub(super) async fn watch_playback(
        mut child: Child,
        socket_path: &Path,
        tracker: &mut ProgressTracker<'_>,
    ) -> Result<ExitStatus> {
        let mut ticker = interval(POLL_INTERVAL);
        let mut conn: Option<MpvIpc> = None;

        loop {
            tokio::select! {
                status = child.wait() => return Ok(status?),
                _ = ticker.tick() => {
                    if conn.is_none() {
                        // mpv creates the socket shortly after start
                        conn = MpvIpc::connect(socket_path).await.ok();
                    }
                    let Some(ipc) = conn.as_mut() else { continue };

                    match sample(ipc).await {
                        Ok(Some((position, duration))) => {
                            tracker.record(position, duration, Instant::now());
                        }
                        Ok(None) => {}
                        Err(e) => {
                            tracing::debug!(error = %e, "mpv ipc lost");
                            conn = None;
                        }
                    }
                }
            }
        }
    }

    async fn sample(ipc: &mut MpvIpc) -> std::io::Result<Option<(f64, f64)>> {
        let Some(position) = ipc.get_f64("time-pos").await? else {
            return Ok(None);
        };
        let duration = ipc.get_f64("duration").await?.unwrap_or(0.0);
        Ok(Some((position, duration)))
    }
}
