use crate::{*, error::*};
use std::{collections::BTreeMap, mem::MaybeUninit};
use libc::{pid_t, c_void};

// Read-only access to the inspected program's address space.
pub trait MemorySource {
    fn read(&self, addr: usize, buf: &mut [u8]) -> Result<()>;

    fn read_u64(&self, addr: usize) -> Result<u64> {
        let mut buf = [0u8; 8];
        self.read(addr, &mut buf)?;
        Ok(u64::from_le_bytes(buf))
    }

    fn read_usize(&self, addr: usize) -> Result<usize> {
        Ok(self.read_u64(addr)? as usize)
    }

    // Little-endian unsigned integer of 1..=8 bytes, zero-extended.
    fn read_uint(&self, addr: usize, size: usize) -> Result<u64> {
        if size == 0 || size > 8 {
            return err!(Sanity, "unexpected integer size: {}", size);
        }
        let mut buf = [0u8; 8];
        self.read(addr, &mut buf[..size])?;
        Ok(u64::from_le_bytes(buf))
    }
}

impl<M: MemorySource + ?Sized> MemorySource for &M {
    fn read(&self, addr: usize, buf: &mut [u8]) -> Result<()> { (**self).read(addr, buf) }
}

// Memory captured ahead of time: regions of a core dump, a saved heap, or a hand-assembled test heap.
// A read must fall entirely inside one region; anything else is reported as a bad address, like reading unmapped memory of a live process.
#[derive(Default)]
pub struct SnapshotMemory {
    regions: BTreeMap<usize, Vec<u8>>,
}
impl SnapshotMemory {
    pub fn new() -> Self { Self::default() }

    pub fn add_region(&mut self, addr: usize, data: Vec<u8>) -> Result<()> {
        if data.is_empty() {
            return Ok(());
        }
        let end = match addr.checked_add(data.len()) {
            Some(e) => e,
            None => return err!(Usage, "region 0x{:x} + 0x{:x} overflows", addr, data.len()),
        };
        if let Some((&start, d)) = self.regions.range(..end).next_back() {
            if start + d.len() > addr {
                return err!(Usage, "region [0x{:x}, 0x{:x}) overlaps [0x{:x}, 0x{:x})", addr, end, start, start + d.len());
            }
        }
        self.regions.insert(addr, data);
        Ok(())
    }

    pub fn write(&mut self, addr: usize, bytes: &[u8]) -> Result<()> {
        let (start, data) = match self.regions.range_mut(..=addr).next_back() {
            Some((&s, d)) => (s, d),
            None => return err!(ProcessState, "bad address 0x{:x}", addr),
        };
        let off = addr - start;
        if off.saturating_add(bytes.len()) > data.len() {
            return err!(ProcessState, "bad address 0x{:x}", addr);
        }
        data[off..off + bytes.len()].copy_from_slice(bytes);
        Ok(())
    }

    pub fn mapped_bytes(&self) -> usize { self.regions.values().map(|d| d.len()).sum() }
}

impl MemorySource for SnapshotMemory {
    fn read(&self, addr: usize, buf: &mut [u8]) -> Result<()> {
        if buf.is_empty() {
            return Ok(());
        }
        let (start, data) = match self.regions.range(..=addr).next_back() {
            Some((&s, d)) => (s, d),
            None => return err!(ProcessState, "bad address 0x{:x}", addr),
        };
        let off = addr - start;
        if off.saturating_add(buf.len()) > data.len() {
            if off < data.len() {
                return err!(ProcessState, "unexpected EOF in mem @{:x}:0x{:x}", addr, buf.len());
            }
            return err!(ProcessState, "bad address 0x{:x}", addr);
        }
        buf.copy_from_slice(&data[off..off + buf.len()]);
        Ok(())
    }
}

// Reads memory of a live process. Needs ptrace permission over it (or to be the process itself).
#[derive(Clone)]
pub struct PidMemReader {
    pid: pid_t,
}
impl PidMemReader {
    pub fn new(pid: pid_t) -> Self { PidMemReader {pid} }

    pub fn pid(&self) -> pid_t { self.pid }

    pub fn read_uninit<'a>(&self, addr: usize, buf: &'a mut [MaybeUninit<u8>]) -> Result<&'a mut [u8]> {
        if buf.is_empty() {
            return Ok(&mut []);
        }
        unsafe {
            let local_iov = libc::iovec {iov_base: buf.as_mut_ptr() as *mut c_void, iov_len: buf.len()};
            let remote_iov = libc::iovec {iov_base: addr as *mut c_void, iov_len: buf.len()};
            let r = libc::process_vm_readv(self.pid, &local_iov as *const libc::iovec, 1, &remote_iov as *const libc::iovec, 1, 0);
            if r < 0 {
                if *libc::__errno_location() == libc::EFAULT {
                    return err!(ProcessState, "bad address 0x{:x}", addr);
                } else {
                    return errno_err!("process_vm_readv failed");
                }
            }
            if r != buf.len() as isize {
                return err!(ProcessState, "unexpected EOF in mem @{:x}:0x{:x}", addr, buf.len());
            }
            Ok(std::slice::from_raw_parts_mut(buf.as_mut_ptr() as *mut u8, buf.len()))
        }
    }
}

impl MemorySource for PidMemReader {
    fn read(&self, addr: usize, buf: &mut [u8]) -> Result<()> {
        unsafe {self.read_uninit(addr, std::slice::from_raw_parts_mut(buf.as_mut_ptr() as *mut MaybeUninit<u8>, buf.len()))}?;
        Ok(())
    }
}
