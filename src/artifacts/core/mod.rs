//! Terminal plumbing shared by the commands

use derive_new::new;
use minus::Pager;
use std::io::{self, Write};

/// Feeds command output into a `minus` pager.
///
/// Output is only shown once the caller hands the pager to
/// `minus::page_all`, so long logs never interleave with tracing on stderr.
#[derive(new)]
pub struct PagerWriter {
    pager: Pager,
}

impl Write for PagerWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        // colour escapes and paths are UTF-8; anything else is a lossy render
        let text = String::from_utf8_lossy(buf);
        self.pager.push_str(text).map_err(io::Error::other)?;
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}
