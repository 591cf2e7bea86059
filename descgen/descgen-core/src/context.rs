//! The owning context a generated decoder runs under.

use crate::{error::HostValueTypeError, heap::NativeHeap};

/// Owner of the allocations a decode makes and of the host error channel.
///
/// In a real binding this is the device object: it hands out memory and
/// forwards validation failures to the host's error callback.
pub trait OwningContext {
    fn heap(&mut self) -> &mut NativeHeap;

    /// Report a decode failure through the host error channel.
    fn report_error(&mut self, error: &HostValueTypeError);
}

/// In-process [`OwningContext`] that keeps every reported error.
#[derive(Debug, Default)]
pub struct DeviceContext {
    heap: NativeHeap,
    errors: Vec<HostValueTypeError>,
}

impl DeviceContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn heap_ref(&self) -> &NativeHeap {
        &self.heap
    }

    pub fn errors(&self) -> &[HostValueTypeError] {
        &self.errors
    }
}

impl OwningContext for DeviceContext {
    fn heap(&mut self) -> &mut NativeHeap {
        &mut self.heap
    }

    fn report_error(&mut self, error: &HostValueTypeError) {
        log::debug!("host error channel: {error}");
        self.errors.push(error.clone());
    }
}
