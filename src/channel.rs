//! [`FileChannel`]: the minimal host-facing handle returned by
//! `FileSystem::open_*` (spec.md 6a) — a `std::io::{Read, Write, Seek}`
//! implementation over one regular file's [`crate::byte_store::ByteStore`].
//!
//! A channel holds its own [`FileRef`] clone, independent of whatever
//! directory entry it was opened through, so it keeps working across a
//! concurrent `delete` of that entry (spec.md 4.5, "delete while open").
//! The per-file content lock is acquired fresh for each `read`/`write`
//! call and dropped immediately after, per spec.md 5's "content lock held
//! only for the duration of one call".

use std::io::{self, Read, Seek, SeekFrom, Write};

use crate::file::FileRef;

fn not_open_for(op: &str) -> io::Error {
    io::Error::new(io::ErrorKind::PermissionDenied, format!("channel not open for {op}"))
}

/// A handle over one regular file's bytes, with an independent read/write
/// cursor.
pub struct FileChannel {
    file: FileRef,
    position: u64,
    readable: bool,
    writable: bool,
    append: bool,
}

impl FileChannel {
    pub(crate) fn new(file: FileRef, readable: bool, writable: bool, append: bool) -> FileChannel {
        FileChannel { file, position: 0, readable, writable, append }
    }

    pub fn file_id(&self) -> u64 {
        self.file.id()
    }

    pub fn position(&self) -> u64 {
        self.position
    }

    pub fn size(&self) -> u64 {
        self.file.size()
    }
}

impl Read for FileChannel {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if !self.readable {
            return Err(not_open_for("reading"));
        }
        let store = self.file.as_regular().ok_or_else(|| io::Error::new(io::ErrorKind::InvalidInput, "not a regular file"))?;
        let n = store.read().read(self.position, buf);
        self.position += n as u64;
        if n > 0 {
            self.file.touch_access();
        }
        Ok(n)
    }
}

impl Write for FileChannel {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        if !self.writable {
            return Err(not_open_for("writing"));
        }
        let store = self.file.as_regular().ok_or_else(|| io::Error::new(io::ErrorKind::InvalidInput, "not a regular file"))?;
        let mut guard = store.write();
        let pos = if self.append { guard.size() } else { self.position };
        let n = guard.write(pos, buf);
        drop(guard);
        self.position = pos + n as u64;
        self.file.touch_modified();
        Ok(n)
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl Seek for FileChannel {
    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        let new_pos = match pos {
            SeekFrom::Start(offset) => offset as i128,
            SeekFrom::Current(offset) => self.position as i128 + offset as i128,
            SeekFrom::End(offset) => self.size() as i128 + offset as i128,
        };
        if new_pos < 0 {
            return Err(io::Error::new(io::ErrorKind::InvalidInput, "seek before byte 0"));
        }
        self.position = new_pos as u64;
        Ok(self.position)
    }
}
