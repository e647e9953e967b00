use std::fs::{self, File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::Path;

use super::error::{StorageError, StorageResult};
use super::{PAGE_SIZE, PageId};

/// Handle to an open page file.
///
/// A page file is a flat binary file whose length is an exact multiple of
/// `PAGE_SIZE`; page `i` occupies bytes `[i * PAGE_SIZE, (i + 1) * PAGE_SIZE)`.
/// The handle owns the underlying stream exclusively; after [`close`] the
/// stream is gone and every operation reports `HandleNotInit`.
///
/// `total_num_pages` and `cur_page_pos` are plain public fields so callers
/// can inspect handle state directly.
///
/// [`close`]: PageFile::close
#[derive(Debug)]
pub struct PageFile {
    /// Path the file was opened with (kept for reference, never reopened)
    file_name: String,
    /// Number of pages currently materialized in the file
    pub total_num_pages: usize,
    /// Index of the last page read or written by an absolute operation
    pub cur_page_pos: PageId,
    /// Owned stream; `None` once the handle has been closed
    stream: Option<File>,
}

/// Byte offset of the start of a page (0-based).
fn page_offset(page_num: PageId) -> u64 {
    page_num as u64 * PAGE_SIZE as u64
}

impl PageFile {
    /// Create a new page file containing exactly one zero-filled page.
    ///
    /// Opens in write-create-truncate mode: if the file already exists it is
    /// reinitialized to a single zero page.
    pub fn create<P: AsRef<Path>>(path: P) -> StorageResult<()> {
        let path = path.as_ref();

        let mut file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(true)
            .open(path)
            .map_err(|e| {
                StorageError::WriteFailed(format!("unable to create {}: {e}", path.display()))
            })?;

        Self::write_zero_page(&mut file)?;
        file.sync_all().map_err(|e| {
            StorageError::WriteFailed(format!("sync of new file {} failed: {e}", path.display()))
        })?;
        Ok(())
    }

    /// Open an existing page file for reading and writing.
    ///
    /// The page count is recomputed from the file's byte length with floor
    /// division: a trailing partial page is silently ignored rather than
    /// rejected. This permissive policy is deliberate; stricter validation
    /// belongs to callers that want it.
    pub fn open<P: AsRef<Path>>(path: P) -> StorageResult<PageFile> {
        let path = path.as_ref();

        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .open(path)
            .map_err(|_| StorageError::FileNotFound(path.display().to_string()))?;

        // If the size query fails the stream is dropped here, so a failed
        // open never leaks a handle.
        let len = file
            .metadata()
            .map_err(|e| {
                StorageError::HandleNotInit(format!(
                    "size query for {} failed: {e}",
                    path.display()
                ))
            })?
            .len();

        Ok(PageFile {
            file_name: path.display().to_string(),
            total_num_pages: (len / PAGE_SIZE as u64) as usize,
            cur_page_pos: 0,
            stream: Some(file),
        })
    }

    /// Close the handle, releasing the underlying stream.
    ///
    /// The stream is taken out of the handle before any failure is reported,
    /// so the handle is invalidated on every exit path.
    pub fn close(&mut self) -> StorageResult<()> {
        let file = self.stream.take().ok_or_else(|| {
            StorageError::HandleNotInit("file handle not initialized".to_string())
        })?;

        file.sync_all().map_err(|e| {
            StorageError::HandleNotInit(format!("closing {} failed: {e}", self.file_name))
        })?;
        Ok(())
    }

    /// Remove a page file from the filesystem.
    pub fn destroy<P: AsRef<Path>>(path: P) -> StorageResult<()> {
        let path = path.as_ref();
        fs::remove_file(path).map_err(|_| {
            StorageError::FileNotFound(format!(
                "remove of {} failed (file missing or in use)",
                path.display()
            ))
        })
    }

    /// Path this handle was opened with.
    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    /// Read the page with absolute index `page_num` into `buf`.
    ///
    /// `buf` must be exactly `PAGE_SIZE` bytes. On success the cursor moves
    /// to `page_num`.
    pub fn read_block(&mut self, page_num: PageId, buf: &mut [u8]) -> StorageResult<()> {
        Self::check_buffer(buf)?;
        self.require_open()?;

        if page_num >= self.total_num_pages {
            return Err(StorageError::NonExistingPage(format!(
                "page {page_num} out of range (file has {} pages)",
                self.total_num_pages
            )));
        }

        let file = self.stream_mut()?;
        file.seek(SeekFrom::Start(page_offset(page_num))).map_err(|e| {
            StorageError::NonExistingPage(format!("seek to page {page_num} failed: {e}"))
        })?;

        // Short reads cannot happen while the length invariant holds, but
        // read_exact checks anyway.
        file.read_exact(buf).map_err(|e| {
            StorageError::NonExistingPage(format!("incomplete read of page {page_num}: {e}"))
        })?;

        self.cur_page_pos = page_num;
        Ok(())
    }

    /// Read page 0.
    pub fn read_first_block(&mut self, buf: &mut [u8]) -> StorageResult<()> {
        Self::check_buffer(buf)?;
        self.require_open()?;

        if self.total_num_pages == 0 {
            return Err(StorageError::NonExistingPage(
                "file has no pages".to_string(),
            ));
        }
        self.read_block(0, buf)
    }

    /// Read the last page.
    pub fn read_last_block(&mut self, buf: &mut [u8]) -> StorageResult<()> {
        Self::check_buffer(buf)?;
        self.require_open()?;

        if self.total_num_pages == 0 {
            return Err(StorageError::NonExistingPage(
                "file has no pages".to_string(),
            ));
        }
        self.read_block(self.total_num_pages - 1, buf)
    }

    /// Read the page at the cursor.
    pub fn read_current_block(&mut self, buf: &mut [u8]) -> StorageResult<()> {
        let pos = self.cur_page_pos;
        self.read_block(pos, buf)
    }

    /// Read the page after the cursor.
    pub fn read_next_block(&mut self, buf: &mut [u8]) -> StorageResult<()> {
        let next = self.cur_page_pos + 1;
        self.read_block(next, buf)
    }

    /// Read the page before the cursor.
    pub fn read_previous_block(&mut self, buf: &mut [u8]) -> StorageResult<()> {
        Self::check_buffer(buf)?;
        self.require_open()?;

        if self.cur_page_pos == 0 {
            return Err(StorageError::NonExistingPage(
                "no page before the first".to_string(),
            ));
        }
        let prev = self.cur_page_pos - 1;
        self.read_block(prev, buf)
    }

    /// Current cursor position, or -1 if the handle is unusable.
    ///
    /// A query, not an action: never fails and does not validate that the
    /// cursor is in range.
    pub fn block_pos(&self) -> i64 {
        match self.stream {
            Some(_) => self.cur_page_pos as i64,
            None => -1,
        }
    }

    /// Write `buf` to the page with absolute index `page_num`.
    ///
    /// `buf` must be exactly `PAGE_SIZE` bytes and `page_num` must already
    /// exist; writes never extend the file (use [`ensure_capacity`] or
    /// [`append_empty_block`] first). Flushed to storage before returning.
    /// On success the cursor moves to `page_num`.
    ///
    /// [`ensure_capacity`]: PageFile::ensure_capacity
    /// [`append_empty_block`]: PageFile::append_empty_block
    pub fn write_block(&mut self, page_num: PageId, buf: &[u8]) -> StorageResult<()> {
        Self::check_buffer(buf)?;
        self.require_open()?;

        if page_num >= self.total_num_pages {
            return Err(StorageError::WriteFailed(format!(
                "page {page_num} outside valid range for write (file has {} pages)",
                self.total_num_pages
            )));
        }

        let file = self.stream_mut()?;
        file.seek(SeekFrom::Start(page_offset(page_num)))
            .map_err(|e| StorageError::WriteFailed(format!("seek before write failed: {e}")))?;
        file.write_all(buf).map_err(|e| {
            StorageError::WriteFailed(format!("incomplete write of page {page_num}: {e}"))
        })?;
        file.sync_data()
            .map_err(|e| StorageError::WriteFailed(format!("flush after write failed: {e}")))?;

        self.cur_page_pos = page_num;
        Ok(())
    }

    /// Write `buf` to the page at the cursor.
    pub fn write_current_block(&mut self, buf: &[u8]) -> StorageResult<()> {
        let pos = self.cur_page_pos;
        self.write_block(pos, buf)
    }

    /// Append one zero-filled page at end-of-file.
    ///
    /// Increments `total_num_pages`; the cursor is deliberately left
    /// unchanged, unlike [`write_block`].
    ///
    /// [`write_block`]: PageFile::write_block
    pub fn append_empty_block(&mut self) -> StorageResult<()> {
        self.require_open()?;

        let file = self.stream_mut()?;
        file.seek(SeekFrom::End(0))
            .map_err(|e| StorageError::WriteFailed(format!("seek to end failed: {e}")))?;
        Self::write_zero_page(file)?;

        self.total_num_pages += 1;
        Ok(())
    }

    /// Grow the file to at least `number_of_pages` pages.
    ///
    /// No-op when the file is already large enough. Growth happens one page
    /// at a time and is not atomic: on failure, pages already appended are
    /// kept.
    pub fn ensure_capacity(&mut self, number_of_pages: usize) -> StorageResult<()> {
        self.require_open()?;

        while self.total_num_pages < number_of_pages {
            self.append_empty_block()?;
        }
        Ok(())
    }

    /// Write exactly one zero-filled page at the stream's current position.
    fn write_zero_page(file: &mut File) -> StorageResult<()> {
        let zero_buf = [0u8; PAGE_SIZE];
        file.write_all(&zero_buf)
            .map_err(|e| StorageError::WriteFailed(format!("writing zero page failed: {e}")))?;
        file.sync_data()
            .map_err(|e| StorageError::WriteFailed(format!("flush after write failed: {e}")))?;
        Ok(())
    }

    /// Reject a caller buffer that is not exactly one page long.
    fn check_buffer(buf: &[u8]) -> StorageResult<()> {
        if buf.len() != PAGE_SIZE {
            return Err(StorageError::HandleNotInit(format!(
                "page buffer must be {PAGE_SIZE} bytes, got {}",
                buf.len()
            )));
        }
        Ok(())
    }

    /// Fail with `HandleNotInit` if the handle has no stream.
    fn require_open(&self) -> StorageResult<()> {
        if self.stream.is_none() {
            return Err(StorageError::HandleNotInit(
                "file stream missing".to_string(),
            ));
        }
        Ok(())
    }

    fn stream_mut(&mut self) -> StorageResult<&mut File> {
        self.stream.as_mut().ok_or_else(|| {
            StorageError::HandleNotInit("file stream missing".to_string())
        })
    }
}
