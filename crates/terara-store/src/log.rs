use std::fs::{self, File, OpenOptions};
use std::io::{self, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use tracing::{debug, warn};

use crate::config::SyncMode;
use crate::error::{StoreError, StoreResult};
use crate::memory::InMemoryEngine;
use crate::traits::{KvEngine, WriteOp};

/// Name of the log file inside the database directory.
pub const FILE_NAME: &str = "terara.log";

/// Header size: 4 bytes length + 4 bytes CRC.
const HEADER_SIZE: usize = 8;

/// The file operations an append needs, so a failing disk can be simulated.
trait LogFile: Write + Seek {
    fn set_len(&self, len: u64) -> io::Result<()>;
    fn sync_all(&self) -> io::Result<()>;
}

impl LogFile for File {
    fn set_len(&self, len: u64) -> io::Result<()> {
        File::set_len(self, len)
    }

    fn sync_all(&self) -> io::Result<()> {
        File::sync_all(self)
    }
}

struct LogWriter<F: LogFile = File> {
    file: F,
    /// End of the last whole frame.
    offset: u64,
    /// Set when a failed append could not be rolled back.
    failed: Option<String>,
}

impl<F: LogFile> LogWriter<F> {
    /// Append one encoded frame. On failure the file is cut back to the
    /// last whole frame so the next append starts aligned.
    fn append(&mut self, frame: &[u8], sync: bool) -> StoreResult<()> {
        if let Some(reason) = &self.failed {
            return Err(StoreError::LogFailed(reason.clone()));
        }
        let written = self.file.write_all(frame).and_then(|()| {
            if sync {
                self.file.sync_all()
            } else {
                Ok(())
            }
        });
        if let Err(e) = written {
            self.rollback();
            return Err(e.into());
        }
        self.offset += frame.len() as u64;
        Ok(())
    }

    fn rollback(&mut self) {
        let offset = self.offset;
        let restored = self
            .file
            .set_len(offset)
            .and_then(|()| self.file.seek(SeekFrom::Start(offset)).map(drop));
        match restored {
            Ok(()) => warn!(offset, "log append failed; rolled back to last frame"),
            Err(e) => {
                warn!(offset, error = %e, "log rollback failed; refusing further appends");
                self.failed = Some(format!("rollback to offset {offset} failed: {e}"));
            }
        }
    }
}

/// Frame a batch as `[len][crc][payload]`.
fn encode_frame(batch: &[WriteOp]) -> StoreResult<Vec<u8>> {
    let payload =
        bincode::serialize(batch).map_err(|e| StoreError::Serialization(e.to_string()))?;
    let length = u32::try_from(payload.len()).map_err(|_| {
        StoreError::Serialization(format!("batch too large: {} bytes", payload.len()))
    })?;
    let mut frame = Vec::with_capacity(HEADER_SIZE + payload.len());
    frame.extend_from_slice(&length.to_le_bytes());
    frame.extend_from_slice(&crc32fast::hash(&payload).to_le_bytes());
    frame.extend_from_slice(&payload);
    Ok(frame)
}

/// Durable engine backed by an append-only batch log.
///
/// Every applied batch is bincode-serialized and framed on disk as:
/// ```text
/// [4 bytes: payload length (little-endian u32)]
/// [4 bytes: CRC32 of payload (little-endian u32)]
/// [N bytes: payload (bincode-serialized Vec<WriteOp>)]
/// ```
/// The live key space is kept in memory and rebuilt by replaying the log on
/// open. A frame that runs past the end of the file is a torn write from a
/// crash: it is cut off and the file truncated to the last whole frame.
/// Frames whose CRC does not match are skipped.
pub struct LogEngine {
    path: PathBuf,
    index: InMemoryEngine,
    writer: Mutex<LogWriter>,
    sync_mode: SyncMode,
}

impl LogEngine {
    /// Open (or create) the log in `dir` and replay it.
    pub fn open(dir: &Path, sync_mode: SyncMode) -> StoreResult<Self> {
        fs::create_dir_all(dir)?;
        let path = dir.join(FILE_NAME);
        let index = InMemoryEngine::new();

        let valid_len = if path.exists() {
            replay(&path, &index)?
        } else {
            0
        };

        let mut file = OpenOptions::new()
            .create(true)
            .read(true)
            .write(true)
            .open(&path)?;
        if file.metadata()?.len() > valid_len {
            file.set_len(valid_len)?;
        }
        file.seek(SeekFrom::Start(valid_len))?;

        debug!(path = %path.display(), keys = index.len(), "log engine opened");
        Ok(Self {
            path,
            index,
            writer: Mutex::new(LogWriter {
                file,
                offset: valid_len,
                failed: None,
            }),
            sync_mode,
        })
    }

    /// Path of the log file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Current size of the log in bytes.
    pub fn log_size(&self) -> u64 {
        self.writer.lock().expect("log mutex poisoned").offset
    }
}

/// Replay every intact frame of the log at `path` into `index`.
///
/// Returns the length of the valid prefix of the file.
fn replay(path: &Path, index: &InMemoryEngine) -> StoreResult<u64> {
    let data = fs::read(path)?;
    let mut offset = 0usize;
    let mut batches = 0usize;

    while offset < data.len() {
        if offset + HEADER_SIZE > data.len() {
            warn!(offset, file_len = data.len(), "torn log header; truncating");
            break;
        }
        let header = &data[offset..offset + HEADER_SIZE];
        let length = u32::from_le_bytes([header[0], header[1], header[2], header[3]]) as usize;
        let expected_crc = u32::from_le_bytes([header[4], header[5], header[6], header[7]]);

        let end = offset + HEADER_SIZE + length;
        if length == 0 || end > data.len() {
            warn!(
                offset,
                length,
                file_len = data.len(),
                "invalid log entry length; truncating"
            );
            break;
        }

        let payload = &data[offset + HEADER_SIZE..end];
        let actual_crc = crc32fast::hash(payload);
        if actual_crc != expected_crc {
            warn!(
                offset,
                expected = expected_crc,
                actual = actual_crc,
                "CRC mismatch; skipping entry"
            );
            offset = end;
            continue;
        }

        match bincode::deserialize::<Vec<WriteOp>>(payload) {
            Ok(batch) => {
                index.apply(&batch)?;
                batches += 1;
            }
            Err(e) => {
                warn!(offset, error = %e, "failed to deserialize log entry; skipping");
            }
        }
        offset = end;
    }

    debug!(batches, keys = index.len(), "log replay complete");
    Ok(offset as u64)
}

impl KvEngine for LogEngine {
    fn get(&self, key: &[u8]) -> StoreResult<Option<Vec<u8>>> {
        self.index.get(key)
    }

    fn apply(&self, batch: &[WriteOp]) -> StoreResult<()> {
        if batch.is_empty() {
            return Ok(());
        }
        let frame = encode_frame(batch)?;

        // Held across the index update so replay order matches apply order.
        let mut w = self.writer.lock().expect("log mutex poisoned");
        w.append(&frame, matches!(self.sync_mode, SyncMode::EveryWrite))?;

        self.index.apply(batch)?;
        debug!(ops = batch.len(), len = frame.len(), "log append");
        Ok(())
    }

    fn scan_prefix(&self, prefix: &[u8]) -> StoreResult<Vec<(Vec<u8>, Vec<u8>)>> {
        self.index.scan_prefix(prefix)
    }

    fn len(&self) -> usize {
        self.index.len()
    }

    fn flush(&self) -> StoreResult<()> {
        let mut w = self.writer.lock().expect("log mutex poisoned");
        w.file.flush()?;
        w.file.sync_all()?;
        Ok(())
    }
}

impl std::fmt::Debug for LogEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LogEngine")
            .field("path", &self.path)
            .field("key_count", &self.index.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn put(key: &[u8], value: &[u8]) -> WriteOp {
        WriteOp::Put {
            key: key.to_vec(),
            value: value.to_vec(),
        }
    }

    #[test]
    fn writes_survive_reopen() {
        let dir = TempDir::new().unwrap();
        {
            let engine = LogEngine::open(dir.path(), SyncMode::EveryWrite).unwrap();
            engine.apply(&[put(b"a", b"1"), put(b"b", b"2")]).unwrap();
            engine
                .apply(&[WriteOp::Delete { key: b"a".to_vec() }])
                .unwrap();
        }

        let engine = LogEngine::open(dir.path(), SyncMode::OsDefault).unwrap();
        assert_eq!(engine.get(b"a").unwrap(), None);
        assert_eq!(engine.get(b"b").unwrap(), Some(b"2".to_vec()));
        assert_eq!(engine.len(), 1);
    }

    #[test]
    fn empty_batch_writes_nothing() {
        let dir = TempDir::new().unwrap();
        let engine = LogEngine::open(dir.path(), SyncMode::OsDefault).unwrap();
        assert_eq!(engine.path(), dir.path().join(FILE_NAME));
        engine.apply(&[]).unwrap();
        assert_eq!(engine.log_size(), 0);
    }

    #[test]
    fn torn_tail_is_truncated() {
        let dir = TempDir::new().unwrap();
        let good_len = {
            let engine = LogEngine::open(dir.path(), SyncMode::EveryWrite).unwrap();
            engine.apply(&[put(b"kept", b"yes")]).unwrap();
            engine.log_size()
        };

        // Simulate a crash halfway through the next frame.
        let path = dir.path().join(FILE_NAME);
        let mut file = OpenOptions::new().append(true).open(&path).unwrap();
        file.write_all(&100u32.to_le_bytes()).unwrap();
        file.write_all(&[0u8; 10]).unwrap();
        drop(file);

        let engine = LogEngine::open(dir.path(), SyncMode::EveryWrite).unwrap();
        assert_eq!(engine.get(b"kept").unwrap(), Some(b"yes".to_vec()));
        assert_eq!(engine.log_size(), good_len);
        assert_eq!(fs::metadata(&path).unwrap().len(), good_len);

        // New writes land right after the last whole frame.
        engine.apply(&[put(b"next", b"1")]).unwrap();
        drop(engine);
        let engine = LogEngine::open(dir.path(), SyncMode::OsDefault).unwrap();
        assert_eq!(engine.len(), 2);
    }

    #[test]
    fn corrupt_entry_is_skipped() {
        let dir = TempDir::new().unwrap();
        {
            let engine = LogEngine::open(dir.path(), SyncMode::EveryWrite).unwrap();
            engine.apply(&[put(b"first", b"1")]).unwrap();
            engine.apply(&[put(b"second", b"2")]).unwrap();
        }

        // Flip a payload byte in the first frame.
        let path = dir.path().join(FILE_NAME);
        let mut data = fs::read(&path).unwrap();
        data[HEADER_SIZE] ^= 0xff;
        fs::write(&path, &data).unwrap();

        let engine = LogEngine::open(dir.path(), SyncMode::OsDefault).unwrap();
        assert_eq!(engine.get(b"first").unwrap(), None);
        assert_eq!(engine.get(b"second").unwrap(), Some(b"2".to_vec()));
    }

    /// Passes writes through to a real file until its byte budget runs out.
    struct FlakyFile {
        inner: File,
        budget: usize,
        truncate_fails: bool,
    }

    impl Write for FlakyFile {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            if self.budget == 0 {
                return Err(io::Error::other("disk full"));
            }
            let n = buf.len().min(self.budget);
            self.budget -= n;
            self.inner.write(&buf[..n])
        }

        fn flush(&mut self) -> io::Result<()> {
            self.inner.flush()
        }
    }

    impl Seek for FlakyFile {
        fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
            self.inner.seek(pos)
        }
    }

    impl LogFile for FlakyFile {
        fn set_len(&self, len: u64) -> io::Result<()> {
            if self.truncate_fails {
                return Err(io::Error::other("read-only filesystem"));
            }
            self.inner.set_len(len)
        }

        fn sync_all(&self) -> io::Result<()> {
            self.inner.sync_all()
        }
    }

    /// Reopen the log left by a single committed batch behind a flaky file.
    fn flaky_writer(dir: &Path, budget: usize, truncate_fails: bool) -> LogWriter<FlakyFile> {
        let offset = {
            let engine = LogEngine::open(dir, SyncMode::EveryWrite).unwrap();
            engine.apply(&[put(b"before", b"1")]).unwrap();
            engine.log_size()
        };
        let mut inner = OpenOptions::new()
            .write(true)
            .open(dir.join(FILE_NAME))
            .unwrap();
        inner.seek(SeekFrom::End(0)).unwrap();
        LogWriter {
            file: FlakyFile {
                inner,
                budget,
                truncate_fails,
            },
            offset,
            failed: None,
        }
    }

    #[test]
    fn failed_append_is_rolled_back() {
        let dir = TempDir::new().unwrap();
        let mut writer = flaky_writer(dir.path(), 3, false);
        let offset = writer.offset;

        let lost = encode_frame(&[put(b"lost", b"2")]).unwrap();
        assert!(matches!(
            writer.append(&lost, false),
            Err(StoreError::Io(_))
        ));
        assert_eq!(writer.offset, offset);

        writer.file.budget = usize::MAX;
        let after = encode_frame(&[put(b"after", b"3")]).unwrap();
        writer.append(&after, true).unwrap();
        drop(writer);

        let engine = LogEngine::open(dir.path(), SyncMode::OsDefault).unwrap();
        assert_eq!(engine.get(b"before").unwrap(), Some(b"1".to_vec()));
        assert_eq!(engine.get(b"lost").unwrap(), None);
        assert_eq!(engine.get(b"after").unwrap(), Some(b"3".to_vec()));
        assert_eq!(
            engine.log_size(),
            fs::metadata(dir.path().join(FILE_NAME)).unwrap().len()
        );
    }

    #[test]
    fn unrecoverable_append_refuses_later_writes() {
        let dir = TempDir::new().unwrap();
        let mut writer = flaky_writer(dir.path(), 3, true);

        let frame = encode_frame(&[put(b"lost", b"2")]).unwrap();
        assert!(writer.append(&frame, false).is_err());

        writer.file.budget = usize::MAX;
        let frame = encode_frame(&[put(b"after", b"3")]).unwrap();
        assert!(matches!(
            writer.append(&frame, false),
            Err(StoreError::LogFailed(_))
        ));
        drop(writer);

        let engine = LogEngine::open(dir.path(), SyncMode::OsDefault).unwrap();
        assert_eq!(engine.get(b"before").unwrap(), Some(b"1".to_vec()));
        assert_eq!(engine.len(), 1);
    }

    #[test]
    fn scan_prefix_reads_replayed_state() {
        let dir = TempDir::new().unwrap();
        {
            let engine = LogEngine::open(dir.path(), SyncMode::OsDefault).unwrap();
            engine
                .apply(&[put(b"c/1", b"x"), put(b"c/2", b"y"), put(b"d/1", b"z")])
                .unwrap();
            engine.flush().unwrap();
        }
        let engine = LogEngine::open(dir.path(), SyncMode::OsDefault).unwrap();
        assert_eq!(engine.scan_prefix(b"c/").unwrap().len(), 2);
    }
}
