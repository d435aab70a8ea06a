// 2025 Thomas Bicanic – MIT License

//! Type-state device buffers.
//!
//! A buffer starts `Queued` (allocated, contents undefined), becomes
//! `InFlight` while an upload or a kernel writes it, and is `Ready` once the
//! pending command's [`GpuEventGuard`] has been consumed. Only `Ready`
//! buffers can be read back.

use bytemuck::{cast_slice, cast_slice_mut, Pod};
use opencl3::{
    command_queue::CommandQueue,
    context::Context,
    event::Event,
    memory::{Buffer, CL_MEM_READ_ONLY, CL_MEM_READ_WRITE, CL_MEM_WRITE_ONLY},
    types::{cl_mem_flags, CL_BLOCKING, CL_NON_BLOCKING},
};
use std::{marker::PhantomData, mem::ManuallyDrop, ptr, time::Duration};

#[cfg(feature = "metrics")]
use crate::metrics::{record, ALLOCS, ALLOC_BYTES};
#[cfg(feature = "metrics")]
use std::{sync::atomic::Ordering, time::Instant};

use crate::ClError;

// ─── Typ‑State‑Marker ────────────────────────────────────────────────
mod sealed {
    pub trait Sealed {}
}

pub trait State: sealed::Sealed {}

pub struct Queued;
impl sealed::Sealed for Queued {}
impl State for Queued {}

pub struct InFlight;
impl sealed::Sealed for InFlight {}
impl State for InFlight {}

pub struct Ready;
impl sealed::Sealed for Ready {}
impl State for Ready {}

/// Device-side access of a buffer, as seen by the kernels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    ReadOnly,
    WriteOnly,
    ReadWrite,
}

impl Access {
    fn flags(self) -> cl_mem_flags {
        match self {
            Access::ReadOnly => CL_MEM_READ_ONLY,
            Access::WriteOnly => CL_MEM_WRITE_ONLY,
            Access::ReadWrite => CL_MEM_READ_WRITE,
        }
    }
}

// ─── GPU‑Buffer Wrapper ──────────────────────────────────────────────
pub struct GpuBuffer<S> {
    buf: Buffer<u8>,
    len: usize,
    _state: PhantomData<S>,
}

impl<S> std::fmt::Debug for GpuBuffer<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GpuBuffer")
            .field("len", &self.len)
            .field("state", &std::any::type_name::<S>())
            .finish()
    }
}

#[cfg(feature = "metrics")]
impl<S> Drop for GpuBuffer<S> {
    fn drop(&mut self) {
        ALLOCS.fetch_sub(1, Ordering::Relaxed);
        ALLOC_BYTES.fetch_sub(self.len, Ordering::Relaxed);
    }
}

impl<S> GpuBuffer<S> {
    /// Moves the handle into another state without running `Drop`.
    fn transition<N>(self) -> GpuBuffer<N> {
        let this = ManuallyDrop::new(self);
        // SAFETY: `this` is never dropped, so the buffer is moved out exactly once.
        let buf = unsafe { ptr::read(&this.buf) };
        GpuBuffer { buf, len: this.len, _state: PhantomData }
    }

    fn check_len(&self, bytes: usize) -> Result<(), ClError> {
        if bytes != self.len {
            return Err(ClError::LengthMismatch { expected: self.len, actual: bytes });
        }
        Ok(())
    }

    /// Underlying OpenCL buffer, e.g. to pass it as a kernel argument.
    #[inline(always)]
    pub fn raw(&self) -> &Buffer<u8> {
        &self.buf
    }

    /// Size in bytes.
    #[inline(always)]
    pub fn len(&self) -> usize {
        self.len
    }

    #[inline(always)]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}

// ── Queued ───────────────────────────────────────────────────────────
impl GpuBuffer<Queued> {
    /// Allocates `len` bytes on the device. Contents are undefined.
    pub fn new(ctx: &Context, len: usize, access: Access) -> Result<Self, ClError> {
        if len == 0 {
            return Err(ClError::InvalidSize(len));
        }

        #[cfg(feature = "metrics")]
        let t = Instant::now();

        let buf = Buffer::<u8>::create(ctx, access.flags(), len, ptr::null_mut())?;

        #[cfg(feature = "metrics")]
        {
            ALLOCS.fetch_add(1, Ordering::Relaxed);
            ALLOC_BYTES.fetch_add(len, Ordering::Relaxed);
            record("GpuBuffer::new", t);
        }

        log::debug!("allocated {len} bytes ({access:?})");
        Ok(Self { buf, len, _state: PhantomData })
    }

    /// Allocates a buffer sized for `data`, uploads it and waits.
    pub fn from_slice<T: Pod>(
        ctx: &Context,
        queue: &CommandQueue,
        data: &[T],
        access: Access,
    ) -> Result<GpuBuffer<Ready>, ClError> {
        let bytes: &[u8] = cast_slice(data);
        let (in_flight, guard) = Self::new(ctx, bytes.len(), access)?.enqueue_write(queue, data)?;
        guard.wait()?;
        Ok(in_flight.transition())
    }

    /// Starts a non-blocking upload of `host`.
    ///
    /// `host` must stay untouched until the returned guard is consumed.
    pub fn enqueue_write<T: Pod>(
        mut self,
        queue: &CommandQueue,
        host: &[T],
    ) -> Result<(GpuBuffer<InFlight>, GpuEventGuard), ClError> {
        let bytes: &[u8] = cast_slice(host);
        self.check_len(bytes.len())?;

        #[cfg(feature = "metrics")]
        let t = Instant::now();

        let evt = queue.enqueue_write_buffer(&mut self.buf, CL_NON_BLOCKING, 0, bytes, &[])?;

        #[cfg(feature = "metrics")]
        record("enqueue_write", t);

        Ok((self.transition(), GpuEventGuard { evt }))
    }

    /// Hands the buffer to a kernel that will write it.
    #[inline(always)]
    pub fn launch(self) -> GpuBuffer<InFlight> {
        self.transition()
    }
}

// ── InFlight ─────────────────────────────────────────────────────────
impl GpuBuffer<InFlight> {
    /// Waits for the pending command and marks the buffer readable.
    pub fn into_ready(self, guard: GpuEventGuard) -> Result<GpuBuffer<Ready>, ClError> {
        #[cfg(feature = "metrics")]
        let t = Instant::now();

        guard.wait()?;

        #[cfg(feature = "metrics")]
        record("into_ready", t);

        Ok(self.transition())
    }
}

// ── Ready → Host (D2H) ───────────────────────────────────────────────
impl GpuBuffer<Ready> {
    /// Blocking read of the whole buffer into `host_out`.
    pub fn read_into<T: Pod>(&self, queue: &CommandQueue, host_out: &mut [T]) -> Result<(), ClError> {
        let bytes: &mut [u8] = cast_slice_mut(host_out);
        self.check_len(bytes.len())?;

        #[cfg(feature = "metrics")]
        let t = Instant::now();

        queue.enqueue_read_buffer(&self.buf, CL_BLOCKING, 0, bytes, &[])?;

        #[cfg(feature = "metrics")]
        record("enqueue_read", t);

        Ok(())
    }
}

// ── Guard (wartet bei Drop auf Event) ────────────────────────────────
pub struct GpuEventGuard {
    evt: Event,
}

impl From<Event> for GpuEventGuard {
    fn from(evt: Event) -> Self {
        Self { evt }
    }
}

impl Drop for GpuEventGuard {
    fn drop(&mut self) {
        let _ = self.evt.wait();
    }
}

impl GpuEventGuard {
    /// Explicit wait; the error is reported instead of swallowed by `Drop`.
    pub fn wait(self) -> Result<(), ClError> {
        let result = self.evt.wait().map_err(ClError::from);
        let this = ManuallyDrop::new(self);
        // SAFETY: `this` is never dropped, the event is released exactly once here.
        drop(unsafe { ptr::read(&this.evt) });
        result
    }

    /// Device-side execution time from the queue's profiling counters.
    ///
    /// `None` if the queue was created without profiling or the command has
    /// not completed yet.
    pub fn device_time(&self) -> Option<Duration> {
        let start = self.evt.profiling_command_start().ok()?;
        let end = self.evt.profiling_command_end().ok()?;
        Some(Duration::from_nanos(end.saturating_sub(start)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn access_maps_to_mem_flags() {
        assert_eq!(Access::ReadOnly.flags(), CL_MEM_READ_ONLY);
        assert_eq!(Access::WriteOnly.flags(), CL_MEM_WRITE_ONLY);
        assert_eq!(Access::ReadWrite.flags(), CL_MEM_READ_WRITE);
    }
}
