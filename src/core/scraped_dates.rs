use crate::utils::error::Result;
use crate::utils::validation::DATE_FORMAT;
use chrono::{Days, NaiveDate};
use std::collections::BTreeSet;
use std::fs::{self, File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

pub const DEFAULT_DATES_FILENAME: &str = "_scraped_dates.txt";

/// Tracks which sold-dates have been fully scraped, one `YYYY-MM-DD` per line.
///
/// Dates are appended to the file as soon as they are marked, so the ledger
/// needs no explicit save step.
pub struct ScrapedDatesManager {
    file_path: PathBuf,
    scraped_dates: BTreeSet<NaiveDate>,
    file: File,
    needs_newline: bool,
}

impl ScrapedDatesManager {
    pub fn open<P: AsRef<Path>>(base_dir: P) -> Result<Self> {
        Self::open_with_filename(base_dir, DEFAULT_DATES_FILENAME)
    }

    pub fn open_with_filename<P: AsRef<Path>>(base_dir: P, filename: &str) -> Result<Self> {
        fs::create_dir_all(base_dir.as_ref())?;
        let file_path = base_dir.as_ref().join(filename);
        let scraped_dates = Self::load_scraped_dates_from_file(&file_path)?;

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .read(true)
            .open(&file_path)?;
        let needs_newline = Self::lacks_trailing_newline(&mut file)?;

        Ok(Self {
            file_path,
            scraped_dates,
            file,
            needs_newline,
        })
    }

    fn load_scraped_dates_from_file(path: &Path) -> Result<BTreeSet<NaiveDate>> {
        let mut scraped_dates = BTreeSet::new();
        if !path.exists() {
            return Ok(scraped_dates);
        }

        for line in fs::read_to_string(path)?.lines() {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            match NaiveDate::parse_from_str(line, DATE_FORMAT) {
                Ok(date) => {
                    scraped_dates.insert(date);
                }
                Err(e) => tracing::warn!("Ignoring '{}' in {}: {}", line, path.display(), e),
            }
        }
        Ok(scraped_dates)
    }

    fn lacks_trailing_newline(file: &mut File) -> Result<bool> {
        let len = file.metadata()?.len();
        if len == 0 {
            return Ok(false);
        }
        let mut last = [0u8; 1];
        file.seek(SeekFrom::Start(len - 1))?;
        file.read_exact(&mut last)?;
        Ok(last[0] != b'\n')
    }

    pub fn file_path(&self) -> &Path {
        &self.file_path
    }

    pub fn scraped_dates(&self) -> &BTreeSet<NaiveDate> {
        &self.scraped_dates
    }

    pub fn mark_date_scraped(&mut self, date: NaiveDate) -> Result<()> {
        if !self.scraped_dates.insert(date) {
            return Ok(());
        }

        let mut line = String::new();
        if self.needs_newline {
            line.push('\n');
        }
        line.push_str(&date.format(DATE_FORMAT).to_string());
        line.push('\n');

        self.file.write_all(line.as_bytes())?;
        self.file.flush()?;
        self.needs_newline = false;
        Ok(())
    }

    pub fn is_date_scraped(&self, date: NaiveDate) -> bool {
        self.scraped_dates.contains(&date)
    }

    /// Dates still to scrape, newest first, between yesterday and `back_to_date`.
    ///
    /// Everything between the earliest and latest scraped date counts as done:
    /// sessions always walk backwards in time, so only the two ends can be open.
    pub fn dates_to_scrape(&self, back_to_date: NaiveDate, today: NaiveDate) -> Vec<NaiveDate> {
        let Some(yesterday) = today.checked_sub_days(Days::new(1)) else {
            return Vec::new();
        };
        let before_back_to = back_to_date.checked_sub_days(Days::new(1));

        let (Some(earliest), Some(latest)) = (
            self.scraped_dates.first().copied(),
            self.scraped_dates.last().copied(),
        ) else {
            return descending_dates(yesterday, before_back_to);
        };

        let mut dates = descending_dates(yesterday, Some(latest));
        if let Some(day_before_earliest) = earliest.checked_sub_days(Days::new(1)) {
            dates.extend(descending_dates(day_before_earliest, before_back_to));
        }
        dates
    }
}

/// `from` down to (but excluding) `stop`; empty when `from <= stop`.
fn descending_dates(from: NaiveDate, stop: Option<NaiveDate>) -> Vec<NaiveDate> {
    let mut dates = Vec::new();
    let mut current = Some(from);
    while let Some(date) = current {
        if stop.is_some_and(|stop| date <= stop) {
            break;
        }
        dates.push(date);
        current = date.checked_sub_days(Days::new(1));
    }
    dates
}
