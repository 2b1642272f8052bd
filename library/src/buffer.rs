//! Reference-counted pixel buffer handle.
//!
//! The engine never inspects pixel contents; it only moves buffers between
//! pads and tracks how many holders still need them. The reference counter
//! is an explicit field (not the `Arc` strong count) so the
//! release-exactly-at-zero contract stays observable: `release()` drops the
//! payload the moment the counter reaches zero, even while clones of the
//! handle are still alive.

use std::sync::Arc;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Pixel payload stored behind a [`Buffer`] handle.
///
/// Interleaved RGBA, `pixels.len() == width * height * 4`. The concrete
/// layout only matters to the builtin operations; the evaluation engine
/// treats the whole struct as opaque.
#[derive(Clone, Debug, PartialEq)]
pub struct BufferData {
    pub width: usize,
    pub height: usize,
    pub pixels: Vec<f32>,
}

impl BufferData {
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            pixels: vec![0.0; width * height * 4],
        }
    }

    pub fn from_pixels(width: usize, height: usize, pixels: Vec<f32>) -> Self {
        debug_assert_eq!(pixels.len(), width * height * 4);
        Self {
            width,
            height,
            pixels,
        }
    }
}

#[derive(Debug)]
struct Shared {
    refs: AtomicUsize,
    data: Mutex<Option<BufferData>>,
}

/// Cloneable handle to a reference-counted buffer.
///
/// Cloning the handle does NOT touch the reference count; use
/// [`Buffer::acquire`] to register a new holder and [`Buffer::release`] when
/// done. The payload is freed when the count reaches zero.
#[derive(Clone, Debug)]
pub struct Buffer {
    shared: Arc<Shared>,
}

impl Buffer {
    /// Wrap a payload into a fresh handle with a reference count of one,
    /// owned by the caller.
    pub fn new(data: BufferData) -> Self {
        Self {
            shared: Arc::new(Shared {
                refs: AtomicUsize::new(1),
                data: Mutex::new(Some(data)),
            }),
        }
    }

    /// A buffer with no payload, used to degrade gracefully when an input
    /// could not be produced. Holds a reference count of one like any other
    /// freshly produced buffer.
    pub fn empty() -> Self {
        Self {
            shared: Arc::new(Shared {
                refs: AtomicUsize::new(1),
                data: Mutex::new(None),
            }),
        }
    }

    /// Register an additional holder and return a handle for it.
    pub fn acquire(&self) -> Buffer {
        self.shared.refs.fetch_add(1, Ordering::SeqCst);
        self.clone()
    }

    /// Drop one holder's reference. At zero the payload is freed and the
    /// underlying storage reclaimed.
    pub fn release(&self) {
        let prev = self.shared.refs.fetch_sub(1, Ordering::SeqCst);
        if prev == 0 {
            // Underflow: put the counter back and complain instead of
            // wrapping around.
            self.shared.refs.fetch_add(1, Ordering::SeqCst);
            log::warn!("buffer released more times than acquired");
            return;
        }
        if prev == 1 {
            self.shared.data.lock().unwrap().take();
        }
    }

    /// Current reference count.
    pub fn refs(&self) -> usize {
        self.shared.refs.load(Ordering::SeqCst)
    }

    /// True once the payload has been freed (count reached zero).
    pub fn is_freed(&self) -> bool {
        self.shared.data.lock().unwrap().is_none()
    }

    /// True if this buffer never had a payload or has been freed.
    pub fn is_empty(&self) -> bool {
        self.is_freed()
    }

    /// Read access to the payload, if still present.
    pub fn with_data<R>(&self, f: impl FnOnce(&BufferData) -> R) -> Option<R> {
        self.shared.data.lock().unwrap().as_ref().map(f)
    }
}
