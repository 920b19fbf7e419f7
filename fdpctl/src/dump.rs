// SPDX-License-Identifier: MIT

use std::fs::OpenOptions;
use std::path::Path;

use clap::ValueEnum;
use fdpio::prelude::*;
use fdpru::prelude::*;

/// Pages `fdpctl dump` can fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Page {
    Configs,
    Stats,
    Events,
    RuhStatus,
}

impl Page {
    pub fn full_len(self, dev: &FdpDevice) -> usize {
        match self.log_id() {
            Some(id) => dev.log_page(id).len(),
            None => dev.ruh_status_page().len(),
        }
    }

    fn log_id(self) -> Option<LogId> {
        match self {
            Page::Configs => Some(LogId::FdpConfigs),
            Page::Stats => Some(LogId::FdpStats),
            Page::Events => Some(LogId::FdpEvents),
            Page::RuhStatus => None,
        }
    }

    /// Issues the host command for this page, transferring into `io`.
    pub fn fetch<IO: HostIO + ?Sized>(self, dev: &FdpDevice, io: &mut IO, len: u64) -> Completion {
        match self.log_id() {
            Some(id) => {
                let (d10, d11) = LogRequest::to_dwords(id.lid(), len);
                dev.get_log(io, d10, d11)
            }
            None => {
                let (d10, d11) = MgmtRequest::to_dwords(MO_RUH_STATUS, len);
                dev.io_mgmt_recv(io, d10, d11)
            }
        }
    }
}

/// Fetches `page` into memory.
pub fn fetch_vec(dev: &FdpDevice, page: Page, len: u64) -> anyhow::Result<Vec<u8>> {
    let mut buf = vec![0u8; usize::try_from(len)?];
    let mut io = MemHostIO::new(&mut buf);
    let c = page.fetch(dev, &mut io, len);
    if !c.is_ok() {
        anyhow::bail!("{page:?} request failed with status {}", c.status);
    }
    buf.truncate(c.transferred);
    Ok(buf)
}

/// Fetches `page` straight into a file. Returns the bytes written.
pub fn fetch_to_file(dev: &FdpDevice, page: Page, len: u64, out: &Path) -> anyhow::Result<usize> {
    let mut file = OpenOptions::new()
        .read(true)
        .write(true)
        .create(true)
        .truncate(true)
        .open(out)?;
    let mut io = StdHostIO::new(&mut file);
    let c = page.fetch(dev, &mut io, len);
    if !c.is_ok() {
        anyhow::bail!("{page:?} request failed with status {}", c.status);
    }
    io.set_len(c.transferred as u64)?;
    Ok(c.transferred)
}
