//! Logger setup: the terminal plus one file per run under `<config dir>/logs`.

use log::LevelFilter;
use std::fs::{self, File};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

/// Log files kept across runs, oldest removed first
pub const KEPT_LOG_FILES: usize = 10;
const LOG_PREFIX: &str = "tft-adb-run-";
const LOG_EXTENSION: &str = "log";

/// Start logging before the config is read so config errors are reported too.
/// Returns true when `--debug` or `RUST_LOG` fixed the level.
pub fn init(debug: bool, log_dir: Option<&Path>) -> bool {
    let from_env = std::env::var_os("RUST_LOG").is_some();

    let (file, opened) = match log_dir.map(|dir| (dir, open_run_log(dir))) {
        Some((_, Ok((file, path)))) => (Some(file), Ok(Some(path))),
        Some((dir, Err(e))) => (None, Err((dir, e))),
        None => (None, Ok(None)),
    };

    env_logger::Builder::new()
        .filter_level(LevelFilter::Trace)
        .filter_module("adb_client", LevelFilter::Warn)
        .parse_default_env()
        .format_timestamp_millis()
        .target(env_logger::Target::Pipe(Box::new(Tee { file })))
        .init();
    if !from_env {
        log::set_max_level(if debug {
            LevelFilter::Debug
        } else {
            LevelFilter::Info
        });
    }

    match opened {
        Ok(Some(path)) => log::debug!("📝 Logging to {}", path.display()),
        Ok(None) => {}
        Err((dir, e)) => log::warn!("Could not open a log file in {}: {e}", dir.display()),
    }
    debug || from_env
}

/// Create this run's log file and drop the oldest ones beyond the retention count
pub fn open_run_log(dir: &Path) -> io::Result<(File, PathBuf)> {
    fs::create_dir_all(dir)?;
    let millis = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_millis())
        .unwrap_or_default();
    let path = dir.join(format!("{LOG_PREFIX}{millis:015}.{LOG_EXTENSION}"));
    let file = File::create(&path)?;
    prune_logs(dir, KEPT_LOG_FILES)?;
    Ok((file, path))
}

/// Remove all but the newest `keep` run logs in `dir`. Returns how many were removed.
pub fn prune_logs(dir: &Path, keep: usize) -> io::Result<usize> {
    let mut logs: Vec<PathBuf> = fs::read_dir(dir)?
        .filter_map(|entry| entry.ok().map(|entry| entry.path()))
        .filter(|path| is_run_log(path))
        .collect();
    // Names carry a zero-padded timestamp, so name order is age order
    logs.sort();

    let excess = logs.len().saturating_sub(keep);
    for old in &logs[..excess] {
        fs::remove_file(old)?;
    }
    Ok(excess)
}

fn is_run_log(path: &Path) -> bool {
    path.is_file()
        && path.extension().is_some_and(|ext| ext == LOG_EXTENSION)
        && path
            .file_name()
            .and_then(|name| name.to_str())
            .is_some_and(|name| name.starts_with(LOG_PREFIX))
}

/// Copies every formatted record to stderr and, when open, the run log
struct Tee {
    file: Option<File>,
}

impl Write for Tee {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        if let Some(file) = &mut self.file
            && file.write_all(buf).is_err()
        {
            self.file = None;
        }
        io::stderr().write_all(buf)?;
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        if let Some(file) = &mut self.file {
            file.flush()?;
        }
        io::stderr().flush()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scratch_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("tft-adb-run-{name}-{}", std::process::id()));
        let _ = fs::remove_dir_all(&dir);
        dir
    }

    fn touch(dir: &Path, name: &str) {
        fs::write(dir.join(name), b"").unwrap();
    }

    #[test]
    fn test_prune_keeps_newest_logs() {
        let dir = scratch_dir("prune-logs");
        fs::create_dir_all(&dir).unwrap();
        for stamp in 1..=13 {
            touch(&dir, &format!("{LOG_PREFIX}{stamp:015}.log"));
        }
        touch(&dir, "config.yaml");
        touch(&dir, "notes.log");

        assert_eq!(prune_logs(&dir, KEPT_LOG_FILES).unwrap(), 3);

        let mut left: Vec<String> = fs::read_dir(&dir)
            .unwrap()
            .map(|entry| entry.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        left.sort();
        assert_eq!(left.len(), KEPT_LOG_FILES + 2);
        assert!(left.contains(&"config.yaml".to_string()));
        assert!(left.contains(&"notes.log".to_string()));
        assert!(!left.contains(&format!("{LOG_PREFIX}{:015}.log", 3)));
        assert!(left.contains(&format!("{LOG_PREFIX}{:015}.log", 4)));
        fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_prune_under_limit_removes_nothing() {
        let dir = scratch_dir("prune-few");
        fs::create_dir_all(&dir).unwrap();
        touch(&dir, &format!("{LOG_PREFIX}{:015}.log", 1));
        assert_eq!(prune_logs(&dir, KEPT_LOG_FILES).unwrap(), 0);
        fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_run_log_is_created_with_its_directory() {
        let dir = scratch_dir("run-log").join("logs");
        let (mut file, path) = open_run_log(&dir).unwrap();
        file.write_all(b"started\n").unwrap();

        assert!(is_run_log(&path));
        assert_eq!(path.parent(), Some(dir.as_path()));
        assert_eq!(fs::read_to_string(&path).unwrap(), "started\n");
        fs::remove_dir_all(dir.parent().unwrap()).unwrap();
    }

    #[test]
    fn test_tee_survives_without_a_file() {
        let mut tee = Tee { file: None };
        assert_eq!(tee.write(b"record\n").unwrap(), 7);
        tee.flush().unwrap();
    }
}
