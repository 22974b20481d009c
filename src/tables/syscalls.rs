/*!
 * Syscall Table
 * Architecture-specific syscall name and number mapping
 */

use crate::core::types::SyscallId;
use std::collections::BTreeMap;

// x86_64 syscall numbers (common ones)
const X86_64_SYSCALLS: &[(&str, SyscallId)] = &[
    ("read", 0),
    ("write", 1),
    ("open", 2),
    ("close", 3),
    ("stat", 4),
    ("fstat", 5),
    ("lstat", 6),
    ("poll", 7),
    ("lseek", 8),
    ("mmap", 9),
    ("mprotect", 10),
    ("munmap", 11),
    ("brk", 12),
    ("rt_sigaction", 13),
    ("rt_sigprocmask", 14),
    ("ioctl", 16),
    ("pread64", 17),
    ("pwrite64", 18),
    ("readv", 19),
    ("writev", 20),
    ("access", 21),
    ("pipe", 22),
    ("select", 23),
    ("sched_yield", 24),
    ("madvise", 28),
    ("dup", 32),
    ("dup2", 33),
    ("nanosleep", 35),
    ("getpid", 39),
    ("sendfile", 40),
    ("socket", 41),
    ("connect", 42),
    ("accept", 43),
    ("sendto", 44),
    ("recvfrom", 45),
    ("sendmsg", 46),
    ("recvmsg", 47),
    ("bind", 49),
    ("listen", 50),
    ("clone", 56),
    ("fork", 57),
    ("vfork", 58),
    ("execve", 59),
    ("exit", 60),
    ("wait4", 61),
    ("kill", 62),
    ("fcntl", 72),
    ("fsync", 74),
    ("getdents64", 217),
    ("futex", 202),
    ("epoll_wait", 232),
    ("epoll_ctl", 233),
    ("openat", 257),
    ("ppoll", 271),
    ("epoll_pwait", 281),
    ("exit_group", 231),
    ("clock_gettime", 228),
    ("clock_nanosleep", 230),
];

// aarch64 uses the generic syscall numbering
const AARCH64_SYSCALLS: &[(&str, SyscallId)] = &[
    ("getcwd", 17),
    ("dup", 23),
    ("dup3", 24),
    ("fcntl", 25),
    ("epoll_ctl", 21),
    ("epoll_pwait", 22),
    ("ioctl", 29),
    ("openat", 56),
    ("close", 57),
    ("pipe2", 59),
    ("getdents64", 61),
    ("lseek", 62),
    ("read", 63),
    ("write", 64),
    ("readv", 65),
    ("writev", 66),
    ("pread64", 67),
    ("pwrite64", 68),
    ("sendfile", 71),
    ("ppoll", 73),
    ("fstat", 80),
    ("fsync", 82),
    ("exit", 93),
    ("exit_group", 94),
    ("futex", 98),
    ("nanosleep", 101),
    ("clock_gettime", 113),
    ("clock_nanosleep", 115),
    ("sched_yield", 124),
    ("kill", 129),
    ("rt_sigaction", 134),
    ("rt_sigprocmask", 135),
    ("getpid", 172),
    ("socket", 198),
    ("bind", 200),
    ("listen", 201),
    ("accept", 202),
    ("connect", 203),
    ("sendto", 206),
    ("recvfrom", 207),
    ("sendmsg", 211),
    ("recvmsg", 212),
    ("brk", 214),
    ("munmap", 215),
    ("clone", 220),
    ("execve", 221),
    ("mmap", 222),
    ("mprotect", 226),
    ("madvise", 233),
    ("wait4", 260),
];

/// Name to number mapping for one architecture
#[derive(Debug, Clone, Default)]
pub struct SyscallTable {
    by_name: BTreeMap<String, SyscallId>,
    by_id: BTreeMap<SyscallId, String>,
}

impl SyscallTable {
    pub fn from_pairs<'a>(pairs: impl IntoIterator<Item = (&'a str, SyscallId)>) -> Self {
        let mut table = Self::default();
        for (name, id) in pairs {
            table.by_name.insert(name.to_string(), id);
            table.by_id.insert(id, name.to_string());
        }
        table
    }

    /// Table for the architecture this crate was built for
    ///
    /// Unknown architectures get an empty table, so every named syscall is
    /// reported as unknown.
    pub fn for_current_arch() -> Self {
        if cfg!(target_arch = "x86_64") {
            Self::x86_64()
        } else if cfg!(target_arch = "aarch64") {
            Self::aarch64()
        } else {
            Self::default()
        }
    }

    pub fn x86_64() -> Self {
        Self::from_pairs(X86_64_SYSCALLS.iter().copied())
    }

    pub fn aarch64() -> Self {
        Self::from_pairs(AARCH64_SYSCALLS.iter().copied())
    }

    pub fn id_by_name(&self, name: &str) -> Option<SyscallId> {
        self.by_name.get(name).copied()
    }

    pub fn name_by_id(&self, id: SyscallId) -> Option<&str> {
        self.by_id.get(&id).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.by_name.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_name.is_empty()
    }
}
