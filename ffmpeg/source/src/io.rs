/*!
    Custom `AVIOContext` bound to a [`MemorySource`].
*/

use std::ffi::{c_int, c_void};
use std::ptr::NonNull;

use ffmpeg_next::ffi;

use crate::error::{Error, Result};
use crate::memory::{MemoryReader, MemorySource};

/**
    Read callback handed to `avio_alloc_context`.

    `opaque` must point to the [`MemoryReader`] owned by the [`IoContext`]
    that registered this callback.
*/
unsafe extern "C" fn read_packet(opaque: *mut c_void, buf: *mut u8, buf_size: c_int) -> c_int {
    // SAFETY: opaque is the boxed reader owned by IoContext, which outlives the AVIOContext.
    let reader = unsafe { &mut *(opaque as *mut MemoryReader) };

    let dst: &mut [u8] = if buf.is_null() || buf_size <= 0 {
        &mut []
    } else {
        // SAFETY: FFmpeg guarantees buf points to at least buf_size writable bytes.
        unsafe { std::slice::from_raw_parts_mut(buf, buf_size as usize) }
    };

    let ret = reader.read(dst);
    tracing::trace!(requested = buf_size, ret, "memory source read");
    ret
}

/**
    An FFmpeg I/O context reading from a [`MemorySource`].

    The context takes over the source's scratch buffer; FFmpeg may replace
    it internally, so the buffer is always released through the context.
*/
pub struct IoContext {
    ptr: NonNull<ffi::AVIOContext>,
    /// Read state behind the callback's opaque pointer. Declared last so it
    /// is dropped after the context that refers to it.
    reader: Box<MemoryReader>,
}

impl IoContext {
    /**
        Bind a source's read callback into a new read-only I/O context.
    */
    pub fn bind(source: MemorySource) -> Result<Self> {
        let (buffer, reader) = source.into_parts();
        let buffer_size =
            c_int::try_from(buffer.len()).map_err(|_| Error::BufferTooLarge(buffer.len()))?;

        let mut reader = Box::new(reader);
        let opaque = &mut *reader as *mut MemoryReader as *mut c_void;

        // SAFETY: the buffer and opaque pointer stay valid for the context's lifetime.
        let ptr = unsafe {
            ffi::avio_alloc_context(
                buffer.as_ptr() as *mut u8,
                buffer_size,
                0,
                opaque,
                Some(read_packet),
                None,
                None,
            )
        };

        // On failure the buffer is still ours and is freed when it drops here.
        let ptr = NonNull::new(ptr).ok_or(Error::IoContextAlloc)?;
        buffer.hand_over();

        tracing::debug!(buffer_size, "bound memory source to avio context");

        Ok(Self { ptr, reader })
    }

    pub fn as_ptr(&self) -> *mut ffi::AVIOContext {
        self.ptr.as_ptr()
    }

    /**
        Last read error FFmpeg stored on the context, or 0.

        A demuxer that hits a failing read usually surfaces its own status
        (often `AVERROR_INVALIDDATA`); the source's status survives here.
    */
    pub fn error(&self) -> c_int {
        // SAFETY: the context is valid for the lifetime of self.
        unsafe { (*self.ptr.as_ptr()).error }
    }

    /**
        Size of the buffer FFmpeg currently reads into.
    */
    pub fn buffer_size(&self) -> usize {
        // SAFETY: the context is valid for the lifetime of self.
        unsafe { (*self.ptr.as_ptr()).buffer_size.max(0) as usize }
    }
}

impl Drop for IoContext {
    fn drop(&mut self) {
        let mut ptr = self.ptr.as_ptr();
        // SAFETY: the context is owned by self; its buffer is freed before the context.
        unsafe {
            ffi::av_freep(&mut (*ptr).buffer as *mut *mut u8 as *mut c_void);
            ffi::avio_context_free(&mut ptr);
        }
    }
}

impl std::fmt::Debug for IoContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IoContext")
            .field("buffer_size", &self.buffer_size())
            .field("reader", &self.reader)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use ffmpeg_next::error::EAGAIN;

    use super::*;
    use crate::memory::DEFAULT_BUFFER_SIZE;

    #[test]
    fn bind_default_source() {
        let source = MemorySource::new(DEFAULT_BUFFER_SIZE, false).unwrap();
        let io = IoContext::bind(source).unwrap();
        assert!(!io.as_ptr().is_null());
        assert_eq!(io.buffer_size(), DEFAULT_BUFFER_SIZE);
    }

    #[test]
    fn bind_zero_capacity_source() {
        let source = MemorySource::new(0, false).unwrap();
        let io = IoContext::bind(source).unwrap();
        assert_eq!(io.buffer_size(), 0);
    }

    #[test]
    fn bind_moves_buffer_into_context() {
        let source = MemorySource::new(128, false).unwrap();
        let buffer = source.buffer_ptr();
        let io = IoContext::bind(source).unwrap();
        // SAFETY: io is alive; the buffer field is only compared, not read through.
        let bound = unsafe { (*io.as_ptr()).buffer } as *const u8;
        assert_eq!(bound, buffer);
    }

    #[test]
    fn fresh_context_has_no_error() {
        let io = IoContext::bind(MemorySource::new(64, false).unwrap()).unwrap();
        assert_eq!(io.error(), 0);
    }

    #[test]
    fn failed_read_is_recorded_on_context() {
        let io = IoContext::bind(MemorySource::new(64, false).unwrap()).unwrap();
        let mut dst = [0u8; 16];
        // SAFETY: io is a valid read context, dst is a valid writable region.
        let ret = unsafe { ffi::avio_read(io.as_ptr(), dst.as_mut_ptr(), dst.len() as c_int) };
        assert!(ret < 0);
        assert_eq!(io.error(), ffi::AVERROR(EAGAIN));
    }

    #[test]
    fn callback_reports_not_ready() {
        let io = IoContext::bind(MemorySource::new(64, false).unwrap()).unwrap();
        let mut dst = [0x5Au8; 32];
        // SAFETY: opaque belongs to io, dst is a valid writable region.
        let ret = unsafe {
            read_packet(
                (*io.as_ptr()).opaque,
                dst.as_mut_ptr(),
                dst.len() as c_int,
            )
        };
        assert_eq!(ret, ffi::AVERROR(EAGAIN));
        assert!(dst.iter().all(|&b| b == 0x5A));
    }

    #[test]
    fn callback_handles_empty_request() {
        let io = IoContext::bind(MemorySource::with_data(64, vec![1, 2, 3]).unwrap()).unwrap();
        // SAFETY: a null buffer with a non-positive size is never dereferenced.
        let ret = unsafe { read_packet((*io.as_ptr()).opaque, std::ptr::null_mut(), -1) };
        assert_eq!(ret, 0);
    }

    #[test]
    fn callback_serves_payload() {
        let io = IoContext::bind(MemorySource::with_data(64, vec![1, 2, 3]).unwrap()).unwrap();
        // SAFETY: io is alive for the whole test.
        let opaque = unsafe { (*io.as_ptr()).opaque };
        let mut dst = [0u8; 8];

        // SAFETY: opaque belongs to io, dst is a valid writable region.
        let ret = unsafe { read_packet(opaque, dst.as_mut_ptr(), dst.len() as c_int) };
        assert_eq!(ret, 3);
        assert_eq!(&dst[..3], &[1, 2, 3]);

        // SAFETY: as above.
        let ret = unsafe { read_packet(opaque, dst.as_mut_ptr(), dst.len() as c_int) };
        assert_eq!(ret, ffi::AVERROR_EOF);
    }
}
