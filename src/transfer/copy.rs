use std::fs::File;
use std::io::{self, BufWriter, Read, Write};
use std::path::Path;
use std::sync::Arc;

use indicatif::ProgressBar;

use crate::config::types::{Side, ThrottleSettings};
use crate::error::TrickleError;
use crate::throttle::{CancelToken, RateLimiter};

/// Copy buffer size: 256KB.
const BUF_SIZE: usize = 256 * 1024;

/// Wraps a Read and updates a ProgressBar as bytes are read.
pub struct ProgressReader<R: Read> {
    inner: R,
    progress: ProgressBar,
}

impl<R: Read> ProgressReader<R> {
    pub fn new(inner: R, progress: ProgressBar) -> Self {
        Self { inner, progress }
    }
}

impl<R: Read> Read for ProgressReader<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let bytes_read = self.inner.read(buf)?;
        self.progress.inc(bytes_read as u64);
        Ok(bytes_read)
    }
}

/// Build the shared limiter described by `settings`.
pub fn build_limiter(settings: &ThrottleSettings) -> Arc<RateLimiter> {
    let limiter = match settings.burst {
        Some(burst) => RateLimiter::with_burst(settings.limit, burst, settings.buffer_size),
        None => RateLimiter::new(settings.limit, settings.buffer_size),
    };
    tracing::debug!(
        limit = %limiter.limit(),
        burst = limiter.burst(),
        buffer_size = limiter.buffer_size(),
        "Limiter configured"
    );
    Arc::new(limiter)
}

/// Pump `reader` into `writer` until end of stream, retrying interrupted reads.
pub fn copy_stream<R, W>(reader: &mut R, writer: &mut W) -> io::Result<u64>
where
    R: Read + ?Sized,
    W: Write + ?Sized,
{
    let mut buf = vec![0u8; BUF_SIZE];
    let mut total_bytes = 0u64;
    loop {
        let n = match reader.read(&mut buf) {
            Ok(0) => break,
            Ok(n) => n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        };
        writer.write_all(&buf[..n])?;
        total_bytes += n as u64;
    }
    writer.flush()?;
    Ok(total_bytes)
}

/// Open the copy source: a file, or stdin when `path` is `None`.
fn open_source(path: Option<&Path>) -> Result<(Box<dyn Read>, Option<u64>), TrickleError> {
    let Some(path) = path else {
        return Ok((Box::new(io::stdin().lock()), None));
    };
    let file = File::open(path).map_err(|e| match e.kind() {
        io::ErrorKind::NotFound => TrickleError::SourceNotFound {
            path: path.to_path_buf(),
        },
        io::ErrorKind::PermissionDenied => TrickleError::PermissionDenied {
            path: path.to_path_buf(),
        },
        _ => TrickleError::Io { source: e },
    })?;
    let size = file.metadata().ok().map(|m| m.len());
    Ok((Box::new(file), size))
}

/// Open the copy destination: a file, or stdout when `path` is `None`.
fn open_dest(path: Option<&Path>) -> Result<Box<dyn Write>, TrickleError> {
    let Some(path) = path else {
        return Ok(Box::new(io::stdout().lock()));
    };
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            std::fs::create_dir_all(parent).map_err(|e| match e.kind() {
                io::ErrorKind::PermissionDenied => TrickleError::DestinationNotWritable {
                    path: parent.to_path_buf(),
                },
                _ => TrickleError::Io { source: e },
            })?;
        }
    }
    let file = File::create(path).map_err(|e| match e.kind() {
        io::ErrorKind::PermissionDenied => TrickleError::DestinationNotWritable {
            path: path.to_path_buf(),
        },
        _ => TrickleError::Io { source: e },
    })?;
    Ok(Box::new(file))
}

/// Copy `source` to `dest` under the rate limit in `settings`.
///
/// Only the side named by `settings.side` is throttled. Waits are bound to a
/// token carrying the configured timeout, if any.
pub fn copy_throttled(
    source: Option<&Path>,
    dest: Option<&Path>,
    settings: &ThrottleSettings,
    progress: &ProgressBar,
) -> Result<u64, TrickleError> {
    let (src, size) = open_source(source)?;
    if let Some(size) = size {
        progress.set_length(size);
    }
    let dst = open_dest(dest)?;

    let limiter = build_limiter(settings);
    let cancel = match settings.timeout {
        Some(timeout) => CancelToken::with_timeout(timeout),
        None => CancelToken::never(),
    };

    let src = ProgressReader::new(src, progress.clone());
    let (mut reader, mut writer): (Box<dyn Read>, Box<dyn Write>) = match settings.side {
        Side::Read => (
            Box::new(limiter.reader_with_cancel(cancel, src)),
            Box::new(BufWriter::with_capacity(BUF_SIZE, dst)),
        ),
        Side::Write => (
            Box::new(src),
            Box::new(limiter.writer_with_cancel(cancel, dst)),
        ),
    };

    let bytes = copy_stream(&mut reader, &mut writer).map_err(TrickleError::from_transfer)?;
    progress.finish_with_message("done");
    tracing::info!(bytes, limit = %settings.limit, "Copy finished");
    Ok(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::throttle::{Limit, WaitError};
    use std::io::Cursor;
    use std::time::Duration;

    fn settings(limit: Limit) -> ThrottleSettings {
        ThrottleSettings {
            limit,
            burst: None,
            buffer_size: 0,
            timeout: None,
            side: Side::Read,
        }
    }

    #[test]
    fn progress_reader_tracks_bytes() {
        let data = b"hello world, this is a test of the progress reader";
        let pb = ProgressBar::hidden();
        let mut reader = ProgressReader::new(Cursor::new(data.as_ref()), pb.clone());

        let mut buf = [0u8; 10];
        assert_eq!(reader.read(&mut buf).unwrap(), 10);
        assert_eq!(pb.position(), 10);
        assert_eq!(reader.read(&mut buf).unwrap(), 10);
        assert_eq!(pb.position(), 20);
    }

    #[test]
    fn build_limiter_uses_explicit_burst() {
        let mut s = settings(Limit::per_second(1_000_000));
        assert_eq!(build_limiter(&s).burst(), 1_000_000);
        s.burst = Some(4096);
        s.buffer_size = 1024;
        let limiter = build_limiter(&s);
        assert_eq!(limiter.burst(), 4096);
        assert_eq!(limiter.buffer_size(), 1024);
    }

    #[test]
    fn copy_stream_moves_everything() {
        let data: Vec<u8> = (0..600_000u32).map(|i| (i % 253) as u8).collect();
        let mut out = Vec::new();
        let n = copy_stream(&mut Cursor::new(&data), &mut out).unwrap();
        assert_eq!(n, data.len() as u64);
        assert_eq!(out, data);
    }

    #[test]
    fn copy_throttled_copies_file_on_either_side() {
        let dir = tempfile::tempdir().unwrap();
        let src_path = dir.path().join("source.bin");
        let content: Vec<u8> = (0..100_000u32).map(|i| (i % 241) as u8).collect();
        std::fs::write(&src_path, &content).unwrap();

        for side in [Side::Read, Side::Write] {
            let dst_path = dir.path().join("nested").join(format!("{:?}.bin", side));
            let mut s = settings(Limit::per_second(50_000_000));
            s.side = side;
            let pb = ProgressBar::hidden();

            let bytes = copy_throttled(Some(&src_path), Some(&dst_path), &s, &pb).unwrap();
            assert_eq!(bytes, content.len() as u64);
            assert_eq!(std::fs::read(&dst_path).unwrap(), content);
        }
    }

    #[test]
    fn copy_nonexistent_source_returns_error() {
        let dir = tempfile::tempdir().unwrap();
        let pb = ProgressBar::hidden();
        let result = copy_throttled(
            Some(&dir.path().join("nonexistent.bin")),
            Some(&dir.path().join("dest.bin")),
            &settings(Limit::INF),
            &pb,
        );
        match result {
            Err(TrickleError::SourceNotFound { .. }) => {}
            other => panic!("Expected SourceNotFound, got: {:?}", other),
        }
    }

    #[test]
    fn timeout_surfaces_as_wait_error() {
        let dir = tempfile::tempdir().unwrap();
        let src_path = dir.path().join("source.bin");
        std::fs::write(&src_path, vec![0u8; 20_000]).unwrap();

        // 1KB/s with a 1KB burst cannot move 20KB inside one second.
        let mut s = settings(Limit::per_second(1000));
        s.timeout = Some(Duration::from_secs(1));
        let pb = ProgressBar::hidden();
        let result = copy_throttled(Some(&src_path), Some(&dir.path().join("d.bin")), &s, &pb);

        match result {
            Err(TrickleError::Wait(WaitError::DeadlineExceeded { .. })) => {}
            other => panic!("Expected DeadlineExceeded, got: {:?}", other),
        }
    }
}
