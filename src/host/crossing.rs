//! Crossing contexts: scoped attachment to a foreign runtime.
//!
//! A managed runtime only accepts calls from threads attached to it. The
//! engine thread, and any thread the host calls us from, cannot be assumed
//! attached, so every crossing attaches on entry and detaches on drop.
//! Nested crossings into the same runtime attach once, and a thread the
//! runtime already owns is never detached by us. Depth is tracked per
//! runtime, so crossing into a second runtime from inside the first still
//! attaches to the second.

use crate::error::AttachError;
use std::cell::RefCell;
use std::marker::PhantomData;

/// A runtime the calling thread must be attached to before calling in.
pub trait ForeignRuntime: Send + Sync {
    /// Attach the calling thread.
    fn attach_current_thread(&self) -> Result<(), AttachError>;

    /// Detach the calling thread.
    fn detach_current_thread(&self);

    /// Whether the calling thread is already attached by the runtime itself.
    fn is_current_thread_attached(&self) -> bool {
        false
    }
}

/// Runtime for hosts that share the engine's threading model.
#[derive(Debug, Clone, Copy, Default)]
pub struct NativeRuntime;

impl ForeignRuntime for NativeRuntime {
    fn attach_current_thread(&self) -> Result<(), AttachError> {
        Ok(())
    }

    fn detach_current_thread(&self) {}

    fn is_current_thread_attached(&self) -> bool {
        true
    }
}

thread_local! {
    /// Open attaching crossings on this thread, keyed by runtime address.
    static DEPTH: RefCell<Vec<(usize, u32)>> = const { RefCell::new(Vec::new()) };
}

fn runtime_key(runtime: &dyn ForeignRuntime) -> usize {
    std::ptr::from_ref(runtime).cast::<()>() as usize
}

fn depth_of(key: usize) -> u32 {
    DEPTH.with(|depths| {
        depths
            .borrow()
            .iter()
            .find(|(k, _)| *k == key)
            .map_or(0, |&(_, n)| n)
    })
}

fn increment_depth(key: usize) {
    DEPTH.with(|depths| {
        let mut depths = depths.borrow_mut();
        match depths.iter_mut().find(|(k, _)| *k == key) {
            Some((_, n)) => *n += 1,
            None => depths.push((key, 1)),
        }
    });
}

/// Returns the remaining depth. Entries that reach zero are removed.
fn decrement_depth(key: usize) -> u32 {
    DEPTH.with(|depths| {
        let mut depths = depths.borrow_mut();
        let Some(pos) = depths.iter().position(|(k, _)| *k == key) else {
            return 0;
        };
        let n = depths[pos].1.saturating_sub(1);
        if n == 0 {
            depths.swap_remove(pos);
        } else {
            depths[pos].1 = n;
        }
        n
    })
}

/// Guard for one call into a foreign runtime.
///
/// Dropping the guard detaches the thread if this guard performed the
/// attach and no outer crossing is still open. The guard is `!Send`: it
/// must be released on the thread that acquired it.
pub struct Crossing<'a> {
    runtime: &'a dyn ForeignRuntime,
    key: usize,
    counted: bool,
    _thread_bound: PhantomData<*const ()>,
}

impl<'a> Crossing<'a> {
    /// Attach the calling thread (if needed) for the lifetime of the guard.
    pub fn enter(runtime: &'a dyn ForeignRuntime) -> Result<Self, AttachError> {
        let key = runtime_key(runtime);

        if depth_of(key) == 0 {
            if runtime.is_current_thread_attached() {
                return Ok(Self {
                    runtime,
                    key,
                    counted: false,
                    _thread_bound: PhantomData,
                });
            }
            runtime.attach_current_thread()?;
        }

        increment_depth(key);
        Ok(Self {
            runtime,
            key,
            counted: true,
            _thread_bound: PhantomData,
        })
    }

    /// Crossings into `runtime` open on this thread that hold an attachment.
    pub fn depth(runtime: &dyn ForeignRuntime) -> u32 {
        depth_of(runtime_key(runtime))
    }
}

impl Drop for Crossing<'_> {
    fn drop(&mut self) {
        if !self.counted {
            return;
        }
        if decrement_depth(self.key) == 0 {
            self.runtime.detach_current_thread();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use std::thread;

    #[derive(Default)]
    struct CountingRuntime {
        attaches: AtomicUsize,
        detaches: AtomicUsize,
        refuse: AtomicBool,
    }

    impl ForeignRuntime for CountingRuntime {
        fn attach_current_thread(&self) -> Result<(), AttachError> {
            if self.refuse.load(Ordering::SeqCst) {
                return Err(AttachError::Refused { code: -1 });
            }
            self.attaches.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }

        fn detach_current_thread(&self) {
            self.detaches.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[test]
    fn test_attach_and_detach_once() {
        let runtime = CountingRuntime::default();
        {
            let _crossing = Crossing::enter(&runtime).unwrap();
            assert_eq!(Crossing::depth(&runtime), 1);
        }
        assert_eq!(Crossing::depth(&runtime), 0);
        assert_eq!(runtime.attaches.load(Ordering::SeqCst), 1);
        assert_eq!(runtime.detaches.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_nested_crossings_attach_once() {
        let runtime = CountingRuntime::default();
        {
            let _outer = Crossing::enter(&runtime).unwrap();
            {
                let _inner = Crossing::enter(&runtime).unwrap();
                assert_eq!(Crossing::depth(&runtime), 2);
            }
            assert_eq!(runtime.detaches.load(Ordering::SeqCst), 0);
        }
        assert_eq!(runtime.attaches.load(Ordering::SeqCst), 1);
        assert_eq!(runtime.detaches.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_refused_attach_leaves_no_state() {
        let runtime = CountingRuntime::default();
        runtime.refuse.store(true, Ordering::SeqCst);
        assert!(matches!(
            Crossing::enter(&runtime),
            Err(AttachError::Refused { code: -1 })
        ));
        assert_eq!(Crossing::depth(&runtime), 0);
        assert_eq!(runtime.detaches.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_detach_on_error_path() {
        fn failing_call(runtime: &CountingRuntime) -> Result<(), &'static str> {
            let _crossing = Crossing::enter(runtime).map_err(|_| "attach")?;
            Err("callee failed")
        }

        let runtime = CountingRuntime::default();
        assert!(failing_call(&runtime).is_err());
        assert_eq!(runtime.detaches.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_native_runtime_is_never_detached() {
        let runtime = NativeRuntime;
        let crossing = Crossing::enter(&runtime).unwrap();
        assert_eq!(Crossing::depth(&runtime), 0);
        drop(crossing);
    }

    #[test]
    fn test_each_thread_attaches_separately() {
        let runtime = CountingRuntime::default();
        thread::scope(|s| {
            for _ in 0..3 {
                s.spawn(|| {
                    let _crossing = Crossing::enter(&runtime).unwrap();
                });
            }
        });
        assert_eq!(runtime.attaches.load(Ordering::SeqCst), 3);
        assert_eq!(runtime.detaches.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn test_nested_runtimes_attach_independently() {
        let outer_runtime = CountingRuntime::default();
        let inner_runtime = CountingRuntime::default();
        {
            let _outer = Crossing::enter(&outer_runtime).unwrap();
            {
                let _inner = Crossing::enter(&inner_runtime).unwrap();
                assert_eq!(Crossing::depth(&outer_runtime), 1);
                assert_eq!(Crossing::depth(&inner_runtime), 1);
                assert_eq!(inner_runtime.attaches.load(Ordering::SeqCst), 1);
            }
            assert_eq!(inner_runtime.detaches.load(Ordering::SeqCst), 1);
            assert_eq!(outer_runtime.detaches.load(Ordering::SeqCst), 0);
        }
        assert_eq!(outer_runtime.attaches.load(Ordering::SeqCst), 1);
        assert_eq!(outer_runtime.detaches.load(Ordering::SeqCst), 1);
        assert_eq!(Crossing::depth(&outer_runtime), 0);
    }
}
