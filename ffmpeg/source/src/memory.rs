/*!
    Memory-backed read source for custom FFmpeg I/O.
*/

use std::ffi::{c_int, c_void};
use std::ptr::NonNull;

use ffmpeg_next::{error::EAGAIN, ffi};

use crate::error::{Error, Result};

/// Default size of the scratch buffer handed to FFmpeg.
pub const DEFAULT_BUFFER_SIZE: usize = 4096;

/**
    A region allocated with `av_malloc`.

    Freed with `av_free` on drop, unless ownership was handed to FFmpeg
    through [`AvBuffer::hand_over`].
*/
pub struct AvBuffer {
    ptr: NonNull<u8>,
    len: usize,
}

impl AvBuffer {
    /**
        Allocate `len` bytes. A zero length is valid, FFmpeg still returns
        a unique non-null allocation for it.
    */
    pub fn alloc(len: usize) -> Result<Self> {
        // SAFETY: av_malloc has no preconditions; a null return is handled below.
        let ptr = unsafe { ffi::av_malloc(len) } as *mut u8;
        NonNull::new(ptr)
            .map(|ptr| Self { ptr, len })
            .ok_or(Error::BufferAlloc(len))
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn as_ptr(&self) -> *const u8 {
        self.ptr.as_ptr()
    }

    /**
        Give up ownership to the FFmpeg object that now references the
        allocation. That object is responsible for freeing it.
    */
    pub(crate) fn hand_over(self) {
        std::mem::forget(self);
    }
}

impl Drop for AvBuffer {
    fn drop(&mut self) {
        // SAFETY: the pointer came from av_malloc and is freed exactly once here.
        unsafe { ffi::av_free(self.ptr.as_ptr() as *mut c_void) };
    }
}

impl std::fmt::Debug for AvBuffer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AvBuffer").field("len", &self.len).finish()
    }
}

/**
    Read state shared with the FFmpeg read callback.
*/
#[derive(Debug, Default)]
pub(crate) struct MemoryReader {
    blocking: bool,
    data: Vec<u8>,
    position: usize,
}

impl MemoryReader {
    pub(crate) fn read(&mut self, dst: &mut [u8]) -> c_int {
        if !self.blocking {
            return ffi::AVERROR(EAGAIN);
        }

        let remaining = &self.data[self.position..];
        if remaining.is_empty() {
            return ffi::AVERROR_EOF;
        }

        // Clamp so the returned count always fits the callback's int.
        let count = dst.len().min(remaining.len()).min(c_int::MAX as usize);
        dst[..count].copy_from_slice(&remaining[..count]);
        self.position += count;
        count as c_int
    }
}

/**
    A memory-backed source for FFmpeg's custom I/O.

    Owns the scratch buffer FFmpeg reads into and the bytes it serves. A
    source that is not blocking-capable reports `AVERROR(EAGAIN)` for every
    read and never produces data.

    # Example

    ```ignore
    let source = MemorySource::new(DEFAULT_BUFFER_SIZE, false)?;
    let io = IoContext::bind(source)?;
    ```
*/
#[derive(Debug)]
pub struct MemorySource {
    buffer: AvBuffer,
    reader: MemoryReader,
}

impl MemorySource {
    /**
        Create an empty source with a scratch buffer of `capacity` bytes.
    */
    pub fn new(capacity: usize, blocking: bool) -> Result<Self> {
        Ok(Self {
            buffer: AvBuffer::alloc(capacity)?,
            reader: MemoryReader {
                blocking,
                ..MemoryReader::default()
            },
        })
    }

    /**
        Create a blocking-capable source that serves `data`, then reports
        end of stream.
    */
    pub fn with_data(capacity: usize, data: Vec<u8>) -> Result<Self> {
        Ok(Self {
            buffer: AvBuffer::alloc(capacity)?,
            reader: MemoryReader {
                blocking: true,
                data,
                position: 0,
            },
        })
    }

    pub fn capacity(&self) -> usize {
        self.buffer.len()
    }

    #[cfg(test)]
    pub(crate) fn buffer_ptr(&self) -> *const u8 {
        self.buffer.as_ptr()
    }

    pub fn is_blocking(&self) -> bool {
        self.reader.blocking
    }

    /**
        Number of payload bytes not yet read.
    */
    pub fn remaining(&self) -> usize {
        self.reader.data.len() - self.reader.position
    }

    /**
        Read into `dst`, returning the byte count or an FFmpeg status.

        Non-blocking sources return `AVERROR(EAGAIN)` and leave `dst`
        untouched. Blocking sources copy up to `dst.len()` bytes and return
        `AVERROR_EOF` once the payload is exhausted.
    */
    pub fn read(&mut self, dst: &mut [u8]) -> c_int {
        self.reader.read(dst)
    }

    pub(crate) fn into_parts(self) -> (AvBuffer, MemoryReader) {
        (self.buffer, self.reader)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn non_blocking_read_never_copies() {
        let mut source = MemorySource::new(DEFAULT_BUFFER_SIZE, false).unwrap();
        for len in [0, 1, 7, 188, 4096, 65536] {
            let mut dst = vec![0xAB; len];
            assert_eq!(source.read(&mut dst), ffi::AVERROR(EAGAIN));
            assert!(dst.iter().all(|&b| b == 0xAB));
        }
    }

    #[test]
    fn non_blocking_read_never_reports_eof() {
        let mut source = MemorySource::new(16, false).unwrap();
        let mut dst = [0u8; 4];
        for _ in 0..8 {
            assert_ne!(source.read(&mut dst), ffi::AVERROR_EOF);
        }
    }

    #[test]
    fn zero_capacity_is_valid() {
        let source = MemorySource::new(0, false).unwrap();
        assert_eq!(source.capacity(), 0);
        assert!(!source.is_blocking());
    }

    #[test]
    fn default_capacity() {
        let source = MemorySource::new(DEFAULT_BUFFER_SIZE, false).unwrap();
        assert_eq!(source.capacity(), 4096);
    }

    #[test]
    fn blocking_read_copies_then_reports_eof() {
        let mut source = MemorySource::with_data(8, b"ftypisom".to_vec()).unwrap();
        assert!(source.is_blocking());

        let mut dst = [0u8; 5];
        assert_eq!(source.read(&mut dst), 5);
        assert_eq!(&dst, b"ftypi");
        assert_eq!(source.remaining(), 3);

        let mut dst = [0u8; 5];
        assert_eq!(source.read(&mut dst), 3);
        assert_eq!(&dst[..3], b"som");
        assert_eq!(dst[3..], [0, 0]);

        assert_eq!(source.read(&mut dst), ffi::AVERROR_EOF);
    }

    #[test]
    fn blocking_empty_source_is_eof() {
        let mut source = MemorySource::new(16, true).unwrap();
        let mut dst = [0u8; 16];
        assert_eq!(source.read(&mut dst), ffi::AVERROR_EOF);
    }
}
