/*!
    Demuxer context and input format lookup.
*/

use std::ffi::{CStr, CString, c_int};
use std::marker::PhantomData;
use std::mem::ManuallyDrop;
use std::ptr;
use std::time::Duration;

use ffmpeg_next::ffi;

use crate::error::{Error, Result};
use crate::io::IoContext;

/**
    A container format descriptor registered with libavformat.
*/
#[derive(Clone, Copy)]
pub struct InputFormat(&'static ffi::AVInputFormat);

impl InputFormat {
    /**
        Short name of the demuxer, e.g. `"mov,mp4,m4a,3gp,3g2,mj2"`.
    */
    pub fn name(&self) -> String {
        // SAFETY: registered demuxers always carry a static, NUL-terminated name.
        unsafe { CStr::from_ptr(self.0.name) }
            .to_string_lossy()
            .into_owned()
    }

    /**
        Descriptive name, if the demuxer provides one.
    */
    pub fn long_name(&self) -> Option<String> {
        if self.0.long_name.is_null() {
            return None;
        }
        // SAFETY: checked non-null above; demuxer names are static.
        let name = unsafe { CStr::from_ptr(self.0.long_name) };
        Some(name.to_string_lossy().into_owned())
    }

    fn as_ptr(&self) -> *const ffi::AVInputFormat {
        self.0
    }
}

impl std::fmt::Debug for InputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("InputFormat").field(&self.name()).finish()
    }
}

/**
    Look up a demuxer by short name.
*/
pub fn find_input_format(name: &str) -> Result<InputFormat> {
    let c_name = CString::new(name).map_err(|_| Error::InvalidName {
        kind: "format name",
        value: name.to_string(),
    })?;

    // SAFETY: c_name is a valid C string; the returned descriptor is static.
    let format = unsafe {
        let ptr = ffi::av_find_input_format(c_name.as_ptr()) as *const ffi::AVInputFormat;
        ptr.as_ref()
    };

    match format {
        Some(format) => {
            let format = InputFormat(format);
            tracing::debug!(requested = name, found = %format.name(), "found input format");
            Ok(format)
        }
        None => Err(Error::FormatNotFound(name.to_string())),
    }
}

/**
    All demuxers compiled into libavformat, in registration order.
*/
pub fn input_formats() -> Vec<InputFormat> {
    let mut opaque = ptr::null_mut();
    let mut formats = Vec::new();
    // SAFETY: av_demuxer_iterate only advances the opaque cursor it owns.
    while let Some(format) = unsafe { ffi::av_demuxer_iterate(&mut opaque).as_ref() } {
        formats.push(InputFormat(format));
    }
    formats
}

/**
    Summary of a successfully opened input.
*/
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OpenedInput {
    /// Name of the demuxer that accepted the input.
    pub format_name: Option<String>,
    /// Number of streams found while reading the header.
    pub stream_count: usize,
    /// Container duration, if the header declares one.
    pub duration: Option<Duration>,
}

/**
    An owned `AVFormatContext`.

    Once attached to an [`IoContext`], the context borrows it so the I/O
    context cannot be released while the demuxer may still read from it.
*/
pub struct FormatContext<'io> {
    /// Nulled by FFmpeg when a failed open frees the context.
    ptr: *mut ffi::AVFormatContext,
    opened: bool,
    _io: PhantomData<&'io IoContext>,
}

impl FormatContext<'static> {
    pub fn alloc() -> Result<Self> {
        // SAFETY: avformat_alloc_context has no preconditions.
        let ptr = unsafe { ffi::avformat_alloc_context() };
        if ptr.is_null() {
            return Err(Error::ContextAlloc);
        }
        tracing::debug!("allocated format context");
        Ok(Self {
            ptr,
            opened: false,
            _io: PhantomData,
        })
    }
}

impl<'io> FormatContext<'io> {
    /**
        Attach a custom I/O context as the demuxer's byte source.
    */
    pub fn attach_io(self, io: &IoContext) -> FormatContext<'_> {
        let this = ManuallyDrop::new(self);
        // SAFETY: ptr is a valid, not yet opened context owned by this.
        unsafe {
            (*this.ptr).pb = io.as_ptr();
            (*this.ptr).flags |= ffi::AVFMT_FLAG_CUSTOM_IO as c_int;
        }
        tracing::debug!("attached custom io to format context");
        FormatContext {
            ptr: this.ptr,
            opened: this.opened,
            _io: PhantomData,
        }
    }

    pub fn is_opened(&self) -> bool {
        self.opened
    }

    /**
        Call `avformat_open_input` and return its raw status.

        A non-zero status is not an error here; FFmpeg has already released
        the context in that case and this value only reports why. Only an
        unusable `url` fails.
    */
    pub fn open_input(&mut self, url: &str, format: Option<InputFormat>) -> Result<c_int> {
        let c_url = CString::new(url).map_err(|_| Error::InvalidName {
            kind: "url",
            value: url.to_string(),
        })?;

        if self.ptr.is_null() || self.opened {
            // The context was consumed by an earlier attempt.
            return Ok(ffi::AVERROR(ffmpeg_next::error::EINVAL));
        }

        let format_ptr = format.map_or(ptr::null(), |f| f.as_ptr());

        // SAFETY: ptr is an allocated context; FFmpeg frees and nulls it on failure.
        let status = unsafe {
            ffi::avformat_open_input(&mut self.ptr, c_url.as_ptr(), format_ptr, ptr::null_mut())
        };

        self.opened = status == 0;
        Ok(status)
    }

    /**
        Describe the opened input. Returns `None` before a successful open.
    */
    pub fn opened_input(&self) -> Option<OpenedInput> {
        if !self.opened {
            return None;
        }

        // SAFETY: an opened context has a valid iformat and stream table.
        unsafe {
            let ctx = &*self.ptr;
            let format_name = ctx
                .iformat
                .as_ref()
                .filter(|f| !f.name.is_null())
                .map(|f| CStr::from_ptr(f.name).to_string_lossy().into_owned());
            let duration = (ctx.duration > 0).then(|| Duration::from_micros(ctx.duration as u64));

            Some(OpenedInput {
                format_name,
                stream_count: ctx.nb_streams as usize,
                duration,
            })
        }
    }
}

impl Drop for FormatContext<'_> {
    fn drop(&mut self) {
        if self.ptr.is_null() {
            return;
        }
        // SAFETY: ptr is owned by self. Custom io is flagged, so pb is left alone.
        unsafe {
            if self.opened {
                ffi::avformat_close_input(&mut self.ptr);
            } else {
                ffi::avformat_free_context(self.ptr);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn finds_mp4_demuxer() {
        ffmpeg_next::init().unwrap();
        let format = find_input_format("mp4").unwrap();
        assert!(format.name().contains("mp4"));
    }

    #[test]
    fn unknown_format_is_not_found() {
        ffmpeg_next::init().unwrap();
        let err = find_input_format("doesnotexist").unwrap_err();
        assert_eq!(err, Error::FormatNotFound("doesnotexist".into()));
        assert_eq!(err.to_string(), "av_find_input_format(\"doesnotexist\") failed");
    }

    #[test]
    fn iterates_demuxers() {
        let formats = input_formats();
        assert!(!formats.is_empty());
        assert!(formats.iter().any(|f| f.name().split(',').any(|n| n == "mp4")));
    }

    #[test]
    fn nul_in_format_name_is_rejected() {
        let err = find_input_format("mp\04").unwrap_err();
        assert!(matches!(err, Error::InvalidName { kind: "format name", .. }));
    }

    #[test]
    fn alloc_and_drop_unopened() {
        let format = FormatContext::alloc().unwrap();
        assert!(!format.is_opened());
        assert!(format.opened_input().is_none());
    }
}
