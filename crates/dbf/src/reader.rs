//! DBF table reader.
//!
//! Pulls the header and field table when constructed, then one fixed-width
//! record per call. A short read at a record boundary ends the data.

use std::fs::File;
use std::io::{self, BufReader, Read};
use std::path::Path;
use std::sync::Arc;

use crate::error::{DbfError, Result};
use crate::header::{read_fully, read_metadata};
use crate::memo::{MemoReader, MemoSource};
use crate::record::DbfRecord;
use crate::types::{DbfMetadata, DbfReaderOptions, computed_header_length};

/// Reader state once the header has been read.
struct Open<R: Read> {
    reader: BufReader<R>,
    metadata: Arc<DbfMetadata>,
    memo: Option<Arc<dyn MemoSource>>,
    buffer: Vec<u8>,
}

/// Sequential DBF table reader.
pub struct DbfReader<R: Read> {
    state: Option<Open<R>>,
    options: DbfReaderOptions,
    record_number: u32,
}

impl<R: Read> DbfReader<R> {
    /// Read the header and field table from `reader`.
    pub fn new(reader: R) -> Result<Self> {
        Self::with_options(reader, None, DbfReaderOptions::default())
    }

    /// Read the header and field table, resolving memo fields through `memo`.
    pub fn with_memo(reader: R, memo: Arc<dyn MemoSource>) -> Result<Self> {
        Self::with_options(reader, Some(memo), DbfReaderOptions::default())
    }

    /// Read the header and field table with options.
    ///
    /// # Errors
    /// Returns a corruption error if the header or field table is damaged.
    pub fn with_options(
        reader: R,
        memo: Option<Arc<dyn MemoSource>>,
        options: DbfReaderOptions,
    ) -> Result<Self> {
        let mut reader = BufReader::new(reader);
        let metadata = read_metadata(&mut reader, options.default_encoding)?;
        if metadata.record_length == 0 {
            return Err(DbfError::corrupted("declared record length is zero"));
        }
        skip_to_first_record(&mut reader, &metadata)?;

        let buffer = vec![0u8; usize::from(metadata.record_length)];
        Ok(Self {
            state: Some(Open {
                reader,
                metadata: Arc::new(metadata),
                memo,
                buffer,
            }),
            options,
            record_number: 0,
        })
    }

    /// Table metadata.
    ///
    /// # Errors
    /// Returns [`DbfError::ReaderClosed`] after [`Self::close`].
    pub fn metadata(&self) -> Result<&Arc<DbfMetadata>> {
        self.state
            .as_ref()
            .map(|open| &open.metadata)
            .ok_or(DbfError::ReaderClosed)
    }

    /// Reader options.
    #[must_use]
    pub fn options(&self) -> &DbfReaderOptions {
        &self.options
    }

    /// Number of records returned so far.
    #[must_use]
    pub fn records_read(&self) -> u32 {
        self.record_number
    }

    /// Whether [`Self::close`] has been called.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.state.is_none()
    }

    /// Read the next record, or `None` at end of data.
    ///
    /// # Errors
    /// - [`DbfError::ReaderClosed`] after [`Self::close`]
    /// - [`DbfError::Corrupted`] if the data holds more records than a `u32` counts
    /// - I/O errors from the source
    pub fn read_record(&mut self) -> Result<Option<DbfRecord>> {
        let open = self.state.as_mut().ok_or(DbfError::ReaderClosed)?;

        open.buffer.fill(0);
        let read = read_fully(&mut open.reader, &mut open.buffer)?;
        if read < open.buffer.len() {
            tracing::debug!(
                records = self.record_number,
                trailing = read,
                "end of record data"
            );
            return Ok(None);
        }

        self.record_number = self
            .record_number
            .checked_add(1)
            .ok_or_else(|| DbfError::corrupted("record data exceeds 4294967295 records"))?;
        let mut record = DbfRecord::new(
            &open.buffer,
            Arc::clone(&open.metadata),
            open.memo.clone(),
            self.record_number,
        );
        record.set_string_encoding(self.options.override_encoding);
        Ok(Some(record))
    }

    /// Iterate over the remaining records.
    pub fn records(&mut self) -> Records<'_, R> {
        Records {
            reader: self,
            done: false,
        }
    }

    /// Release the byte source and memo store. Calling it again does nothing.
    pub fn close(&mut self) {
        if self.state.take().is_some() {
            tracing::debug!(records = self.record_number, "closed reader");
        }
        self.record_number = 0;
    }
}

impl DbfReader<File> {
    /// Open a table from disk.
    ///
    /// # Arguments
    /// * `path` - Path to the `.dbf` file
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        Self::with_options(open_file(path.as_ref())?, None, DbfReaderOptions::default())
    }

    /// Open a table and its memo file from disk.
    pub fn open_with_memo(path: impl AsRef<Path>, memo_path: impl AsRef<Path>) -> Result<Self> {
        Self::open_with_options(path, Some(memo_path.as_ref()), DbfReaderOptions::default())
    }

    /// Open a table, and optionally its memo file, with options.
    pub fn open_with_options(
        path: impl AsRef<Path>,
        memo_path: Option<&Path>,
        options: DbfReaderOptions,
    ) -> Result<Self> {
        let memo = match memo_path {
            Some(memo_path) => Some(Arc::new(MemoReader::open(memo_path)?) as Arc<dyn MemoSource>),
            None => None,
        };
        Self::with_options(open_file(path.as_ref())?, memo, options)
    }
}

/// Iterator over records; stops at end of data or after the first error.
pub struct Records<'a, R: Read> {
    reader: &'a mut DbfReader<R>,
    done: bool,
}

impl<R: Read> Iterator for Records<'_, R> {
    type Item = Result<DbfRecord>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        let item = self.reader.read_record().transpose();
        if !matches!(item, Some(Ok(_))) {
            self.done = true;
        }
        item
    }
}

/// Read every record of a table on disk.
pub fn read_dbf(path: impl AsRef<Path>) -> Result<(Arc<DbfMetadata>, Vec<DbfRecord>)> {
    let mut reader = DbfReader::open(path)?;
    let metadata = Arc::clone(reader.metadata()?);
    let records = reader.records().collect::<Result<Vec<_>>>()?;
    Ok((metadata, records))
}

fn open_file(path: &Path) -> Result<File> {
    File::open(path).map_err(|e| {
        if e.kind() == io::ErrorKind::NotFound {
            DbfError::FileNotFound {
                path: path.to_path_buf(),
            }
        } else {
            DbfError::Io(e)
        }
    })
}

/// Move from the end of the field table to the declared header length.
fn skip_to_first_record<R: Read>(reader: &mut R, metadata: &DbfMetadata) -> Result<()> {
    let consumed = computed_header_length(metadata.fields().len()) as u64;
    let declared = u64::from(metadata.header_length);
    if declared < consumed {
        tracing::warn!(
            declared,
            consumed,
            "declared header length is shorter than the field table; reading records from the terminator"
        );
        return Ok(());
    }
    let gap = declared - consumed;
    let skipped = io::copy(&mut reader.take(gap), &mut io::sink())?;
    if skipped < gap {
        tracing::warn!(gap, skipped, "stream ended before the first record");
    }
    Ok(())
}
