//! Data file - flat, append-only record store keyed like the index.

use std::fs::{self, File, OpenOptions};
use std::io::{BufWriter, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use tracing::info;

use crate::common::config::{check_order, RECORD_SIZE};
use crate::common::{Key, Result};
use crate::index::btree::parse_nodes;
use crate::storage::{IoCounters, IoStats};

use super::Record;

/// Sequentially scanned file of fixed-size [`Record`]s.
///
/// Records are only ever appended; removal clears the active flag in place.
/// Lookups scan from the start and return the first active match, so the
/// store tolerates duplicate keys. Each record read or written counts as
/// one I/O, and every public operation resets the counters at entry.
pub struct DataFile {
    file: File,
    path: PathBuf,
    record_count: u32,
    stats: IoStats,
}

impl DataFile {
    /// Open the data file at `path`, creating an empty one if it is missing.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(path.as_ref())?;

        // A torn trailing record is ignored
        let record_count = (file.metadata()?.len() / RECORD_SIZE as u64) as u32;

        Ok(Self {
            file,
            path: path.as_ref().to_path_buf(),
            record_count,
            stats: IoStats::new(),
        })
    }

    /// Build a data file holding one sample record per key of a text index
    /// description, in the order the keys appear.
    ///
    /// The text is validated exactly as the index import does, before
    /// `data_path` is touched.
    pub fn create_from_text<P, Q>(text_path: P, data_path: Q, order: usize) -> Result<()>
    where
        P: AsRef<Path>,
        Q: AsRef<Path>,
    {
        let order = check_order(order)?;
        let text = fs::read_to_string(text_path.as_ref())?;
        let nodes = parse_nodes(&text, order)?;
        let keys: Vec<Key> = nodes.iter().flat_map(|n| n.keys().iter().copied()).collect();

        if let Err(e) = write_samples(data_path.as_ref(), &keys) {
            let _ = fs::remove_file(data_path.as_ref());
            return Err(e);
        }

        info!(
            source = %text_path.as_ref().display(),
            path = %data_path.as_ref().display(),
            records = keys.len(),
            "created data file"
        );
        Ok(())
    }

    /// First active record with `key`.
    pub fn find(&mut self, key: Key) -> Result<Option<Record>> {
        self.stats.reset();
        Ok(self.scan_for(key)?.map(|(_, record)| record))
    }

    /// Append `record` as active and return its index.
    ///
    /// Duplicate keys are not checked.
    pub fn insert(&mut self, record: &Record) -> Result<u32> {
        self.stats.reset();

        let mut record = record.clone();
        record.set_active(true);

        let index = self.record_count;
        self.write_record(index, &record)?;
        self.record_count += 1;
        Ok(index)
    }

    /// Logically delete the first active record with `key`.
    pub fn remove(&mut self, key: Key) -> Result<bool> {
        self.stats.reset();

        match self.scan_for(key)? {
            Some((index, mut record)) => {
                record.set_active(false);
                self.write_record(index, &record)?;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Keys of all active records, in file order.
    pub fn list_active_keys(&mut self) -> Result<Vec<Key>> {
        self.stats.reset();

        let mut keys = Vec::new();
        for index in 0..self.record_count {
            let record = self.read_record(index)?;
            if record.is_active() {
                keys.push(record.key());
            }
        }
        Ok(keys)
    }

    /// Number of records in the file, removed ones included.
    #[inline]
    pub fn record_count(&self) -> u32 {
        self.record_count
    }

    #[inline]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Record I/O performed by the most recent operation.
    #[inline]
    pub fn io_stats(&self) -> IoCounters {
        self.stats.snapshot()
    }

    fn scan_for(&mut self, key: Key) -> Result<Option<(u32, Record)>> {
        for index in 0..self.record_count {
            let record = self.read_record(index)?;
            if record.is_active() && record.key() == key {
                return Ok(Some((index, record)));
            }
        }
        Ok(None)
    }

    fn read_record(&mut self, index: u32) -> Result<Record> {
        self.file
            .seek(SeekFrom::Start(index as u64 * RECORD_SIZE as u64))?;
        let mut data = [0u8; RECORD_SIZE];
        self.file.read_exact(&mut data)?;
        self.stats.record_read();
        Record::decode(index, &data)
    }

    fn write_record(&mut self, index: u32, record: &Record) -> Result<()> {
        self.file
            .seek(SeekFrom::Start(index as u64 * RECORD_SIZE as u64))?;
        self.file.write_all(&record.encode())?;
        self.file.flush()?;
        self.stats.record_write();
        Ok(())
    }
}

fn write_samples(path: &Path, keys: &[Key]) -> Result<()> {
    let mut out = BufWriter::new(File::create(path)?);
    for &key in keys {
        out.write_all(&Record::sample(key).encode())?;
    }
    out.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::Error;
    use tempfile::tempdir;

    fn open_data() -> (DataFile, tempfile::TempDir) {
        let dir = tempdir().unwrap();
        let data = DataFile::open(dir.path().join("data.bin")).unwrap();
        (data, dir)
    }

    #[test]
    fn test_open_creates_missing_file() {
        let (data, _dir) = open_data();
        assert!(data.path().exists());
        assert_eq!(data.record_count(), 0);
    }

    #[test]
    fn test_insert_and_find() {
        let (mut data, _dir) = open_data();
        data.insert(&Record::new(5, b"five").unwrap()).unwrap();
        data.insert(&Record::new(9, b"nine").unwrap()).unwrap();
        assert_eq!(data.io_stats(), IoCounters { reads: 0, writes: 1 });

        let found = data.find(9).unwrap().unwrap();
        assert_eq!(found.payload(), b"nine");
        assert_eq!(data.io_stats().reads, 2);

        assert!(data.find(7).unwrap().is_none());
    }

    #[test]
    fn test_remove_is_logical() {
        let (mut data, _dir) = open_data();
        for key in [1, 2, 3] {
            data.insert(&Record::sample(key)).unwrap();
        }

        assert!(data.remove(2).unwrap());
        assert_eq!(data.io_stats().writes, 1);
        assert!(!data.remove(2).unwrap());

        assert_eq!(data.record_count(), 3);
        assert_eq!(data.list_active_keys().unwrap(), vec![1, 3]);
        assert!(data.find(2).unwrap().is_none());
    }

    #[test]
    fn test_duplicates_find_first_active() {
        let (mut data, _dir) = open_data();
        data.insert(&Record::new(4, b"old").unwrap()).unwrap();
        data.insert(&Record::new(4, b"new").unwrap()).unwrap();

        assert_eq!(data.find(4).unwrap().unwrap().payload(), b"old");
        data.remove(4).unwrap();
        assert_eq!(data.find(4).unwrap().unwrap().payload(), b"new");
    }

    #[test]
    fn test_records_persist() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("data.bin");
        {
            let mut data = DataFile::open(&path).unwrap();
            data.insert(&Record::sample(10)).unwrap();
            data.insert(&Record::sample(20)).unwrap();
            data.remove(10).unwrap();
        }

        let mut data = DataFile::open(&path).unwrap();
        assert_eq!(data.record_count(), 2);
        assert_eq!(data.list_active_keys().unwrap(), vec![20]);
    }

    #[test]
    fn test_corrupted_record_is_reported() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("data.bin");
        {
            let mut data = DataFile::open(&path).unwrap();
            data.insert(&Record::sample(1)).unwrap();
        }
        let mut bytes = fs::read(&path).unwrap();
        bytes[10] ^= 0x55;
        fs::write(&path, bytes).unwrap();

        let mut data = DataFile::open(&path).unwrap();
        assert!(matches!(data.find(1), Err(Error::Corrupt { id: 0, .. })));
    }

    #[test]
    fn test_create_from_text() {
        let dir = tempdir().unwrap();
        let text = dir.path().join("tree.txt");
        let path = dir.path().join("data.bin");
        fs::write(&text, "1 2 20 3\n1 0 10 0\n1 0 30 0\n").unwrap();

        DataFile::create_from_text(&text, &path, 3).unwrap();
        let mut data = DataFile::open(&path).unwrap();
        assert_eq!(data.list_active_keys().unwrap(), vec![20, 10, 30]);
        assert_eq!(data.find(30).unwrap().unwrap().payload_str(), "record-30");
    }

    #[test]
    fn test_create_from_invalid_text() {
        let dir = tempdir().unwrap();
        let text = dir.path().join("tree.txt");
        let path = dir.path().join("data.bin");
        fs::write(&text, "2 5 10 6 20 7\n").unwrap();

        assert!(matches!(
            DataFile::create_from_text(&text, &path, 5),
            Err(Error::Format { .. })
        ));
        assert!(!path.exists());
    }
}
