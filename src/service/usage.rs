use serde::Serialize;
use std::io;

#[cfg(target_os = "linux")]
use std::fs;

/// Resident memory and CPU time of the current process.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct ProcessUsage {
    /// `None` where the platform gives no cheap way to read it.
    pub rss_bytes: Option<u64>,
    pub user_cpu_secs: f64,
    pub system_cpu_secs: f64,
}

impl ProcessUsage {
    pub fn rss_mib(&self) -> Option<f64> {
        self.rss_bytes.map(|b| b as f64 / (1024.0 * 1024.0))
    }
}

pub fn current() -> io::Result<ProcessUsage> {
    let (user_cpu_secs, system_cpu_secs) = cpu_times()?;
    Ok(ProcessUsage {
        rss_bytes: resident_bytes(),
        user_cpu_secs,
        system_cpu_secs,
    })
}

#[cfg(unix)]
fn cpu_times() -> io::Result<(f64, f64)> {
    let mut usage = std::mem::MaybeUninit::<libc::rusage>::uninit();
    let ret = unsafe { libc::getrusage(libc::RUSAGE_SELF, usage.as_mut_ptr()) };
    if ret != 0 {
        return Err(io::Error::last_os_error());
    }
    let usage = unsafe { usage.assume_init() };
    let secs = |tv: libc::timeval| tv.tv_sec as f64 + tv.tv_usec as f64 * 1e-6;
    Ok((secs(usage.ru_utime), secs(usage.ru_stime)))
}

#[cfg(not(unix))]
fn cpu_times() -> io::Result<(f64, f64)> {
    Ok((0.0, 0.0))
}

/// Second field of `/proc/self/statm` is resident pages.
#[cfg(target_os = "linux")]
fn resident_bytes() -> Option<u64> {
    let statm = fs::read_to_string("/proc/self/statm").ok()?;
    let pages: u64 = statm.split_whitespace().nth(1)?.parse().ok()?;
    let page_size = unsafe { libc::sysconf(libc::_SC_PAGE_SIZE) };
    if page_size <= 0 {
        return None;
    }
    Some(pages * page_size as u64)
}

/// Peak rather than current resident size, which is what `getrusage` offers here.
#[cfg(all(unix, not(target_os = "linux")))]
fn resident_bytes() -> Option<u64> {
    let mut usage = std::mem::MaybeUninit::<libc::rusage>::uninit();
    let ret = unsafe { libc::getrusage(libc::RUSAGE_SELF, usage.as_mut_ptr()) };
    if ret != 0 {
        return None;
    }
    let usage = unsafe { usage.assume_init() };
    // macOS reports bytes.
    Some(usage.ru_maxrss as u64)
}

#[cfg(not(unix))]
fn resident_bytes() -> Option<u64> {
    None
}
