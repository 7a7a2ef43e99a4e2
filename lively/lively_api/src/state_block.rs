//! The state block is the single allocation holding all of a game's mutable state.
//!
//! It is a `State_Header` followed by the payload. It is allocated through the `System`
//! allocator rather than the image's global allocator: the block outlives the module
//! image that created it, and whichever image (or the host) ends up freeing it must go
//! through the same allocator.

use crate::descriptor::State_Descriptor;
use std::alloc::{GlobalAlloc, Layout, System};
use std::mem::{align_of, size_of};
use std::ptr::{self, NonNull};

/// "LVSB" in little endian
pub const STATE_BLOCK_MAGIC: u32 = 0x4253_564c;

/// Types that may live inside a state block.
///
/// # Safety
/// The type must be plain data: no references, raw pointers, function pointers,
/// trait objects or owned heap allocations (Box, Vec, String...). Anything inside the
/// block must stay meaningful after the code image that wrote it is unloaded; refer to
/// other parts of the block by index or offset instead.
pub unsafe trait Relocatable: Copy + 'static {}

macro_rules! impl_relocatable {
    ($($t: ty),*) => {
        $(unsafe impl Relocatable for $t {})*
    };
}

impl_relocatable!(u8, u16, u32, u64, i8, i16, i32, i64, f32, f64, bool);

unsafe impl<T: Relocatable, const N: usize> Relocatable for [T; N] {}

#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct State_Header {
    pub magic: u32,
    pub payload_offset: u32,
    pub descriptor: State_Descriptor,
    pub alloc_size: u64,
    pub alloc_align: u64,
}

// Note: this is an opaque type
#[repr(C)]
pub struct State_Block {
    _private: [u8; 0],
}

#[inline]
const fn round_up(x: usize, align: usize) -> usize {
    (x + align - 1) / align * align
}

/// Allocates a new block holding `value`. Returns None if the allocation fails.
pub fn alloc_state_block<T: Relocatable>(
    layout_version: u32,
    value: T,
) -> Option<NonNull<State_Block>> {
    let payload_offset = round_up(size_of::<State_Header>(), align_of::<T>());
    let alloc_size = payload_offset + size_of::<T>();
    let alloc_align = align_of::<State_Header>().max(align_of::<T>());
    let layout = Layout::from_size_align(alloc_size, alloc_align).ok()?;

    let header = State_Header {
        magic: STATE_BLOCK_MAGIC,
        payload_offset: payload_offset as u32,
        descriptor: State_Descriptor::of::<T>(layout_version),
        alloc_size: alloc_size as u64,
        alloc_align: alloc_align as u64,
    };

    unsafe {
        let base = NonNull::new(System.alloc_zeroed(layout))?;
        ptr::write(base.as_ptr() as *mut State_Header, header);
        ptr::write(base.as_ptr().add(payload_offset) as *mut T, value);
        Some(base.cast())
    }
}

/// # Safety
/// `block` must be null or point to a live block created by `alloc_state_block`.
pub unsafe fn header<'a>(block: *const State_Block) -> Option<&'a State_Header> {
    let header = (block as *const State_Header).as_ref()?;
    if header.magic == STATE_BLOCK_MAGIC {
        Some(header)
    } else {
        None
    }
}

/// # Safety
/// Same as `header`.
pub unsafe fn descriptor_of(block: *const State_Block) -> Option<State_Descriptor> {
    header(block).map(|h| h.descriptor)
}

unsafe fn payload_ptr<T: Relocatable>(block: *const State_Block) -> Option<*mut T> {
    let header = header(block)?;
    let offset = header.payload_offset as usize;
    if header.descriptor.size != size_of::<T>() as u64
        || offset % align_of::<T>() != 0
        || (header.alloc_align as usize) < align_of::<T>()
    {
        return None;
    }
    Some((block as *mut u8).add(offset) as *mut T)
}

/// Returns None if the block is null, corrupted or was not created for a `T`-sized payload.
///
/// # Safety
/// Same as `header`, plus the usual aliasing rules for the returned reference.
pub unsafe fn payload<'a, T: Relocatable>(block: *const State_Block) -> Option<&'a T> {
    payload_ptr::<T>(block).map(|p| &*p)
}

/// # Safety
/// Same as `payload`.
pub unsafe fn payload_mut<'a, T: Relocatable>(block: *mut State_Block) -> Option<&'a mut T> {
    payload_ptr::<T>(block).map(|p| &mut *p)
}

/// The raw payload bytes, without interpreting them.
///
/// # Safety
/// Same as `header`.
pub unsafe fn payload_bytes<'a>(block: *const State_Block) -> Option<&'a [u8]> {
    let header = header(block)?;
    let data = (block as *const u8).add(header.payload_offset as usize);
    Some(std::slice::from_raw_parts(
        data,
        header.descriptor.size as usize,
    ))
}

/// # Safety
/// `block` must point to a live block created by `alloc_state_block` and must not be
/// used afterwards.
pub unsafe fn free_state_block(block: *mut State_Block) {
    let header = match header(block) {
        Some(h) => *h,
        None => return,
    };
    let layout =
        Layout::from_size_align_unchecked(header.alloc_size as usize, header.alloc_align as usize);
    // Clear the magic so a stale handle is rejected instead of misread.
    (*(block as *mut State_Header)).magic = 0;
    System.dealloc(block as *mut u8, layout);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[repr(C)]
    #[derive(Copy, Clone, Debug, PartialEq)]
    struct Small {
        a: u32,
        b: f32,
    }
    unsafe impl Relocatable for Small {}

    #[repr(C, align(32))]
    #[derive(Copy, Clone)]
    struct Aligned {
        x: [u8; 40],
    }
    unsafe impl Relocatable for Aligned {}

    #[test]
    fn alloc_and_read_back() {
        let block = alloc_state_block(1, Small { a: 7, b: 2.5 }).unwrap();
        unsafe {
            let p = payload::<Small>(block.as_ptr()).unwrap();
            assert_eq!(*p, Small { a: 7, b: 2.5 });
            assert_eq!(
                descriptor_of(block.as_ptr()),
                Some(State_Descriptor::new(1, 8))
            );
            payload_mut::<Small>(block.as_ptr()).unwrap().a = 9;
            assert_eq!(payload::<Small>(block.as_ptr()).unwrap().a, 9);
            free_state_block(block.as_ptr());
        }
    }

    #[test]
    fn wrong_payload_type_is_rejected() {
        let block = alloc_state_block(1, Small { a: 0, b: 0. }).unwrap();
        unsafe {
            assert!(payload::<u64>(block.as_ptr()).is_some()); // same size
            assert!(payload::<u32>(block.as_ptr()).is_none());
            assert!(payload::<Aligned>(block.as_ptr()).is_none());
            free_state_block(block.as_ptr());
        }
    }

    #[test]
    fn null_block_has_no_header() {
        unsafe {
            assert!(header(std::ptr::null()).is_none());
            assert!(payload_bytes(std::ptr::null()).is_none());
        }
    }

    #[test]
    fn over_aligned_payload() {
        let block = alloc_state_block(4, Aligned { x: [3; 40] }).unwrap();
        unsafe {
            let h = *header(block.as_ptr()).unwrap();
            assert_eq!(h.payload_offset % 32, 0);
            assert_eq!(h.alloc_align, 32);
            let p = payload::<Aligned>(block.as_ptr()).unwrap();
            assert_eq!(p as *const Aligned as usize % 32, 0);
            assert_eq!(p.x, [3; 40]);
            assert_eq!(payload_bytes(block.as_ptr()).unwrap().len(), 64);
            free_state_block(block.as_ptr());
        }
    }

    #[test]
    fn payload_bytes_match_value() {
        let block = alloc_state_block(1, [1u8, 2, 3, 4]).unwrap();
        unsafe {
            assert_eq!(payload_bytes(block.as_ptr()).unwrap(), &[1, 2, 3, 4]);
            free_state_block(block.as_ptr());
        }
    }
}
