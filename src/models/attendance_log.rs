use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use crate::errors::AppError;
use crate::models::event::{AttendanceEvent, LOG_COLUMNS};

// ---------- Writer ----------

struct LogState {
    /// First-write marker: true once the file is known to hold a header.
    header_written: bool,
}

/// Append-only CSV log of attendance events.
///
/// All appends from this process go through one mutex. Each append opens
/// the file in append mode, writes one fully encoded row (plus the header on
/// the very first write) with a single `write_all`, and closes it again.
pub struct AttendanceLog {
    path: PathBuf,
    state: Mutex<LogState>,
}

impl AttendanceLog {
    /// Open a log at `path`, creating parent directories as needed.
    /// The file itself is created lazily on the first append.
    pub fn open(path: impl Into<PathBuf>) -> io::Result<Self> {
        let path = path.into();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        let header_written = match fs::metadata(&path) {
            Ok(meta) => meta.len() > 0,
            Err(e) if e.kind() == io::ErrorKind::NotFound => false,
            Err(e) => return Err(e),
        };
        log::info!(
            "Attendance log at {} (existing data: {})",
            path.display(),
            header_written
        );
        Ok(Self { path, state: Mutex::new(LogState { header_written }) })
    }

    /// Append one event as a complete row.
    pub fn append(&self, event: &AttendanceEvent) -> Result<(), AppError> {
        let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());

        let mut buf = Vec::with_capacity(256);
        {
            let mut writer = csv::Writer::from_writer(&mut buf);
            if !state.header_written {
                writer.write_record(LOG_COLUMNS)?;
            }
            writer.write_record(event.to_record())?;
            writer.flush()?;
        }

        let mut file = OpenOptions::new().create(true).append(true).open(&self.path)?;
        file.write_all(&buf)?;
        file.flush()?;

        state.header_written = true;
        Ok(())
    }
}

// ---------- Reader ----------

/// Everything read from the log in one pass.
#[derive(Debug, Default)]
pub struct LoadedLog {
    pub events: Vec<AttendanceEvent>,
    /// Rows that could not be decoded and were left out.
    pub skipped_rows: usize,
}

fn is_header(record: &csv::StringRecord) -> bool {
    record.len() == LOG_COLUMNS.len()
        && record.iter().zip(LOG_COLUMNS).all(|(a, b)| a.trim() == b)
}

/// Read every row currently in the log. A log that does not exist yet reads
/// as empty; bad rows are counted and skipped.
pub fn read_log(path: &Path) -> Result<LoadedLog, AppError> {
    let file = match File::open(path) {
        Ok(f) => f,
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            log::debug!("No attendance log at {} yet", path.display());
            return Ok(LoadedLog::default());
        }
        Err(e) => return Err(e.into()),
    };

    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(file);

    let mut loaded = LoadedLog::default();
    for result in reader.records() {
        match result {
            Ok(record) if is_header(&record) => {}
            Ok(record) => loaded.events.push(AttendanceEvent::from_record(&record)),
            Err(e) if e.is_io_error() => return Err(e.into()),
            Err(e) => {
                log::warn!("Skipping unreadable attendance row: {e}");
                loaded.skipped_rows += 1;
            }
        }
    }
    Ok(loaded)
}
