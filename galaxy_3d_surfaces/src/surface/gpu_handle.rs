/// Ownership-tagged GPU object handle
///
/// A surface object either manages the GPU object behind it (creates it
/// lazily, deletes it when dropped) or borrows one supplied by the caller
/// (never deletes it).

use crate::error::Result;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GpuHandle<Id> {
    /// Owned by this handle; `None` until first GPU use
    Managed(Option<Id>),
    /// Supplied by the caller, never released here
    Borrowed(Id),
}

impl<Id: Copy> GpuHandle<Id> {
    pub fn managed() -> Self {
        GpuHandle::Managed(None)
    }

    pub fn borrowed(id: Id) -> Self {
        GpuHandle::Borrowed(id)
    }

    pub fn is_managing(&self) -> bool {
        matches!(self, GpuHandle::Managed(_))
    }

    /// Current id, without creating one
    pub fn peek(&self) -> Option<Id> {
        match self {
            GpuHandle::Managed(id) => *id,
            GpuHandle::Borrowed(id) => Some(*id),
        }
    }

    /// Current id, creating the GPU object on first use of a managed handle
    pub fn get_or_create<F>(&mut self, create: F) -> Result<Id>
    where
        F: FnOnce() -> Result<Id>,
    {
        match self {
            GpuHandle::Borrowed(id) => Ok(*id),
            GpuHandle::Managed(Some(id)) => Ok(*id),
            GpuHandle::Managed(slot @ None) => {
                let id = create()?;
                *slot = Some(id);
                Ok(id)
            }
        }
    }

    /// Take the id out of a managed handle for release
    ///
    /// Returns `None` for borrowed handles and for managed handles whose
    /// GPU object was never created. A second call also returns `None`.
    pub fn take_managed(&mut self) -> Option<Id> {
        match self {
            GpuHandle::Managed(id) => id.take(),
            GpuHandle::Borrowed(_) => None,
        }
    }
}

#[cfg(test)]
#[path = "gpu_handle_tests.rs"]
mod tests;
