use anyhow::{Context, Result, anyhow};
use chrono::Local;
use log::warn;
use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

// @module: File and directory utilities

// @const: Containers ffmpeg can demux audio from
const VIDEO_EXTENSIONS: &[&str] = &[
    "mp4", "mkv", "avi", "mov", "wmv", "flv", "webm", "m4v", "mpg", "mpeg", "ogv", "ts", "mts",
    "m2ts",
];

/// Kinds of input the pipeline accepts
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileType {
    /// Video container; audio is extracted and transcribed
    Video,
    /// Word-timed transcript JSON; used as the token stream directly
    Transcript,
    /// Anything else
    Unknown,
}

// @struct: File operations utility
pub struct FileManager;

impl FileManager {
    // @checks: File existence
    pub fn file_exists<P: AsRef<Path>>(path: P) -> bool {
        path.as_ref().is_file()
    }

    // @checks: Directory existence
    pub fn dir_exists<P: AsRef<Path>>(path: P) -> bool {
        path.as_ref().is_dir()
    }

    // @creates: Directory and parents if needed
    pub fn ensure_dir<P: AsRef<Path>>(path: P) -> Result<()> {
        let path = path.as_ref();
        if path.exists() && !path.is_dir() {
            return Err(anyhow!("Path exists but is not a directory: {}", path.display()));
        }
        fs::create_dir_all(path)
            .with_context(|| format!("Could not create directory: {}", path.display()))
    }

    /// Check that a pre-existing directory accepts new files
    pub fn ensure_writable_dir<P: AsRef<Path>>(path: P) -> Result<()> {
        let path = path.as_ref();
        if !path.is_dir() {
            return Err(anyhow!("Directory does not exist: {}", path.display()));
        }
        tempfile::tempfile_in(path)
            .map(drop)
            .with_context(|| format!("Directory is not writable: {}", path.display()))
    }

    // @generates: `<stem>.<language>.<extension>` inside output_dir
    pub fn generate_output_path<P1: AsRef<Path>, P2: AsRef<Path>>(
        input_file: P1,
        output_dir: P2,
        language: &str,
        extension: &str,
    ) -> PathBuf {
        let stem = input_file.as_ref().file_stem().unwrap_or_default();
        let file_name = format!("{}.{}.{}", stem.to_string_lossy(), language, extension);
        output_dir.as_ref().join(file_name)
    }

    /// Classify a path by extension
    pub fn detect_file_type<P: AsRef<Path>>(path: P) -> Result<FileType> {
        let path = path.as_ref();
        if !path.is_file() {
            return Err(anyhow!("File does not exist: {}", path.display()));
        }

        let ext = path
            .extension()
            .map(|e| e.to_string_lossy().to_lowercase())
            .unwrap_or_default();

        Ok(if ext == "json" {
            FileType::Transcript
        } else if VIDEO_EXTENSIONS.contains(&ext.as_str()) {
            FileType::Video
        } else {
            FileType::Unknown
        })
    }

    /// Processable inputs directly inside `dir`, smallest file first
    pub fn find_inputs_sorted_by_size<P: AsRef<Path>>(dir: P) -> Result<Vec<PathBuf>> {
        let dir = dir.as_ref();
        if !dir.is_dir() {
            return Err(anyhow!("Input path is not a directory: {}", dir.display()));
        }

        let mut inputs: Vec<(PathBuf, u64)> = Vec::new();
        for entry in WalkDir::new(dir).min_depth(1).max_depth(1).follow_links(true) {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    warn!("Skipping unreadable entry in {}: {}", dir.display(), e);
                    continue;
                }
            };
            let path = entry.path();
            if !matches!(Self::detect_file_type(path), Ok(FileType::Video | FileType::Transcript)) {
                continue;
            }
            match entry.metadata() {
                Ok(metadata) => inputs.push((path.to_path_buf(), metadata.len())),
                Err(e) => warn!("Skipping {}, could not read its metadata: {}", path.display(), e),
            }
        }

        inputs.sort_by(|(a_path, a_size), (b_path, b_size)| a_size.cmp(b_size).then_with(|| a_path.cmp(b_path)));
        Ok(inputs.into_iter().map(|(path, _)| path).collect())
    }

    /// Read a file to a string
    pub fn read_to_string<P: AsRef<Path>>(path: P) -> Result<String> {
        fs::read_to_string(&path).with_context(|| format!("Failed to read file: {:?}", path.as_ref()))
    }
}

/// Append-only log file rotated by size
///
/// When a line would push the file past `max_bytes`, the file is renamed to
/// `<log>.1`, older backups shift up by one and at most `backup_count` are
/// kept. With `backup_count == 0` the file is truncated instead.
#[derive(Debug)]
pub struct RotatingLogFile {
    path: PathBuf,
    max_bytes: u64,
    backup_count: usize,
    file: Option<File>,
    size: u64,
}

impl RotatingLogFile {
    pub fn new<P: AsRef<Path>>(path: P, max_bytes: u64, backup_count: usize) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            max_bytes: max_bytes.max(1),
            backup_count,
            file: None,
            size: 0,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Path of the n-th backup, `<log>.<n>`
    pub fn backup_path(&self, n: usize) -> PathBuf {
        let mut name = self.path.as_os_str().to_os_string();
        name.push(format!(".{}", n));
        PathBuf::from(name)
    }

    /// Append a timestamped line, rotating first when it would not fit
    pub fn append(&mut self, content: &str) -> Result<()> {
        let line = format!("[{}] {}\n", Local::now().format("%Y-%m-%d %H:%M:%S%.3f"), content);

        if self.file.is_none() {
            self.open()?;
        }
        if self.size > 0 && self.size + line.len() as u64 > self.max_bytes {
            self.rotate()?;
        }

        let file = self
            .file
            .as_mut()
            .ok_or_else(|| anyhow!("Log file is not open: {}", self.path.display()))?;
        file.write_all(line.as_bytes())
            .with_context(|| format!("Failed to write to log file: {}", self.path.display()))?;
        self.size += line.len() as u64;
        Ok(())
    }

    fn open(&mut self) -> Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            FileManager::ensure_dir(parent)?;
        }

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .with_context(|| format!("Failed to open log file: {}", self.path.display()))?;
        self.size = file.metadata().map(|m| m.len()).unwrap_or(0);
        self.file = Some(file);
        Ok(())
    }

    fn rotate(&mut self) -> Result<()> {
        self.file = None;

        if self.backup_count == 0 {
            fs::remove_file(&self.path)
                .with_context(|| format!("Failed to truncate log file: {}", self.path.display()))?;
            return self.open();
        }

        let oldest = self.backup_path(self.backup_count);
        if oldest.exists() {
            fs::remove_file(&oldest)
                .with_context(|| format!("Failed to remove old log file: {}", oldest.display()))?;
        }
        for n in (1..self.backup_count).rev() {
            let from = self.backup_path(n);
            if from.exists() {
                fs::rename(&from, self.backup_path(n + 1))
                    .with_context(|| format!("Failed to rotate log file: {}", from.display()))?;
            }
        }
        fs::rename(&self.path, self.backup_path(1))
            .with_context(|| format!("Failed to rotate log file: {}", self.path.display()))?;

        self.open()
    }
}
