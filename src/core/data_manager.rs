use crate::domain::model::ScrapedEntry;
use crate::utils::error::{HousingError, Result};
use flate2::read::MultiGzDecoder;
use flate2::write::GzEncoder;
use flate2::Compression;
use std::collections::HashSet;
use std::fs::{self, File, OpenOptions};
use std::io::{BufRead, BufReader, Lines, Write};
use std::path::{Path, PathBuf};

pub const DEFAULT_DATA_FILENAME: &str = "scraped_data.gz";

/// Append-only store of scraped listings: gzip compressed JSON lines, one
/// [`ScrapedEntry`] per line, plus an in-memory ledger of stored endpoint ids.
///
/// Every session appends a new gzip member. Each append is followed by a sync
/// flush so that the line is recoverable even if the process dies before
/// [`DataManager::close`] runs.
pub struct DataManager {
    base_dir: PathBuf,
    data_file_path: PathBuf,
    writer: Option<GzEncoder<File>>,
    scraped_endpoints: HashSet<String>,
}

impl DataManager {
    pub fn open<P: AsRef<Path>>(base_dir: P) -> Result<Self> {
        Self::open_with_filename(base_dir, DEFAULT_DATA_FILENAME)
    }

    pub fn open_with_filename<P: AsRef<Path>>(base_dir: P, data_filename: &str) -> Result<Self> {
        let base_dir = base_dir.as_ref().to_path_buf();
        fs::create_dir_all(&base_dir)?;
        let data_file_path = base_dir.join(data_filename);

        let mut manager = Self {
            base_dir,
            data_file_path,
            writer: None,
            scraped_endpoints: HashSet::new(),
        };
        manager.load_scraped_endpoints()?;
        Ok(manager)
    }

    fn load_scraped_endpoints(&mut self) -> Result<()> {
        if !self.data_file_path.exists() {
            return Ok(());
        }

        let mut entries = Self::read_entries(&self.data_file_path)?;
        for entry in entries.by_ref() {
            self.scraped_endpoints.insert(entry.id);
        }
        tracing::info!(
            "Loaded {} already scraped endpoints from {}",
            self.scraped_endpoints.len(),
            self.data_file_path.display()
        );

        // A member without its trailer would swallow anything appended after it
        if entries.is_truncated() {
            tracing::warn!(
                "{} ends in a truncated gzip member, rewriting it",
                self.data_file_path.display()
            );
            self.repair_data_file()?;
        }
        Ok(())
    }

    fn repair_data_file(&self) -> Result<()> {
        let repair_path = self.data_file_path.with_extension("gz.repair");
        {
            let mut encoder = GzEncoder::new(File::create(&repair_path)?, Compression::default());
            let mut kept = 0usize;
            for entry in Self::read_entries(&self.data_file_path)? {
                serde_json::to_writer(&mut encoder, &entry)?;
                encoder.write_all(b"\n")?;
                kept += 1;
            }
            encoder.finish()?.sync_all()?;
            tracing::info!("Rewrote {} entries into a clean gzip member", kept);
        }
        // Anything past the corruption is dropped from the live file; keep the original around.
        let backup_path = self.data_file_path.with_extension("gz.bak");
        let original_len = fs::metadata(&self.data_file_path)?.len();
        fs::rename(&self.data_file_path, &backup_path)?;
        fs::rename(&repair_path, &self.data_file_path)?;
        tracing::warn!(
            "⚠️ Data file was corrupt; original ({} bytes) kept at {}",
            original_len,
            backup_path.display()
        );
        Ok(())
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    pub fn data_file_path(&self) -> &Path {
        &self.data_file_path
    }

    fn writer(&mut self) -> Result<&mut GzEncoder<File>> {
        if self.writer.is_none() {
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(&self.data_file_path)?;
            self.writer = Some(GzEncoder::new(file, Compression::default()));
        }
        self.writer.as_mut().ok_or_else(|| HousingError::ConfigError {
            message: "data file writer unavailable".to_string(),
        })
    }

    /// Appends one entry and marks `endpoint_id` as scraped.
    pub fn append_data_to_file(
        &mut self,
        endpoint_id: &str,
        date: Option<&str>,
        data: serde_json::Value,
    ) -> Result<()> {
        let entry = ScrapedEntry {
            id: endpoint_id.to_string(),
            date: date.map(str::to_string),
            data,
        };
        let mut line = serde_json::to_vec(&entry)?;
        line.push(b'\n');

        let writer = self.writer()?;
        writer.write_all(&line)?;
        writer.flush()?;

        self.mark_endpoint_scraped(endpoint_id);
        Ok(())
    }

    /// Streams every stored entry. Usable without ever appending.
    pub fn load_data(&self) -> Result<Entries> {
        Self::read_entries(&self.data_file_path)
    }

    /// Streams the entries of any data file written by a `DataManager`.
    pub fn read_entries<P: AsRef<Path>>(path: P) -> Result<Entries> {
        let file = File::open(path.as_ref())?;
        let lines = if file.metadata()?.len() == 0 {
            None
        } else {
            Some(BufReader::new(MultiGzDecoder::new(file)).lines())
        };
        Ok(Entries {
            lines,
            truncated: false,
            skipped_lines: 0,
        })
    }

    pub fn mark_endpoint_scraped(&mut self, endpoint_id: &str) {
        self.scraped_endpoints.insert(endpoint_id.to_string());
    }

    pub fn is_endpoint_scraped(&self, endpoint_id: &str) -> bool {
        self.scraped_endpoints.contains(endpoint_id)
    }

    pub fn entry_count(&self) -> usize {
        self.scraped_endpoints.len()
    }

    /// Writes the gzip trailer of this session's member.
    pub fn close(&mut self) -> Result<()> {
        if let Some(writer) = self.writer.take() {
            writer.finish()?.sync_all()?;
        }
        Ok(())
    }
}

impl Drop for DataManager {
    fn drop(&mut self) {
        if let Err(e) = self.close() {
            tracing::error!(
                "Failed to finish {}: {}",
                self.data_file_path.display(),
                e
            );
        }
    }
}

/// Iterator over stored entries.
///
/// A truncated tail ends iteration (see [`Entries::is_truncated`]); lines that
/// are not valid entries are skipped and counted.
pub struct Entries {
    lines: Option<Lines<BufReader<MultiGzDecoder<File>>>>,
    truncated: bool,
    skipped_lines: usize,
}

impl Entries {
    pub fn is_truncated(&self) -> bool {
        self.truncated
    }

    pub fn skipped_lines(&self) -> usize {
        self.skipped_lines
    }
}

impl Iterator for Entries {
    type Item = ScrapedEntry;

    fn next(&mut self) -> Option<ScrapedEntry> {
        loop {
            let line = match self.lines.as_mut()?.next()? {
                Ok(line) => line,
                Err(e) => {
                    tracing::debug!("Stopped reading scraped data: {}", e);
                    self.truncated = true;
                    self.lines = None;
                    return None;
                }
            };

            if line.trim().is_empty() {
                continue;
            }
            match serde_json::from_str::<ScrapedEntry>(&line) {
                Ok(entry) => return Some(entry),
                Err(e) => {
                    tracing::warn!("Skipping malformed entry line: {}", e);
                    self.skipped_lines += 1;
                }
            }
        }
    }
}
