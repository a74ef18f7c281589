//! Output and hex-dump sinks (`spec.md` §6 "External collaborators"):
//! `write(bytes)` plus a scoped close, called exactly once per byte-copy
//! event. The interface stays external per §1's Non-goals; this module
//! ships one concrete conforming implementation the way the teacher ships
//! a concrete `BoxRenderer` behind its own rendering trait.

use crate::error::CoreResult;
use std::io::Write as _;

/// Direction a sink observes a byte-copy event on, for sinks that want to
/// label output (e.g. a combined hex dump of both directions).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    LocalToRemote,
    RemoteToLocal,
}

pub trait OutputSink {
    fn write(&mut self, direction: Direction, data: &[u8]) -> CoreResult<()>;
    fn close(&mut self) -> CoreResult<()>;
}

/// `ncat`/`netcat`-style hex dumper: 16 bytes per line, offset, hex pairs,
/// printable ASCII gutter.
pub struct HexDumpSink<W: std::io::Write> {
    out: W,
    offset: u64,
}

impl<W: std::io::Write> HexDumpSink<W> {
    pub fn new(out: W) -> Self {
        Self { out, offset: 0 }
    }

    fn dump_line(&mut self, direction: Direction, chunk: &[u8]) -> CoreResult<()> {
        let arrow = match direction {
            Direction::LocalToRemote => '>',
            Direction::RemoteToLocal => '<',
        };
        write!(self.out, "{} {:08x}  ", arrow, self.offset)?;
        for i in 0..16 {
            if i < chunk.len() {
                write!(self.out, "{:02x} ", chunk[i])?;
            } else {
                write!(self.out, "   ")?;
            }
            if i == 7 {
                write!(self.out, " ")?;
            }
        }
        write!(self.out, " |")?;
        for &b in chunk {
            let c = if b.is_ascii_graphic() || b == b' ' {
                b as char
            } else {
                '.'
            };
            write!(self.out, "{}", c)?;
        }
        writeln!(self.out, "|")?;
        self.offset += chunk.len() as u64;
        Ok(())
    }
}

impl<W: std::io::Write> OutputSink for HexDumpSink<W> {
    fn write(&mut self, direction: Direction, data: &[u8]) -> CoreResult<()> {
        for chunk in data.chunks(16) {
            self.dump_line(direction, chunk)?;
        }
        Ok(())
    }

    fn close(&mut self) -> CoreResult<()> {
        self.out.flush()?;
        Ok(())
    }
}

/// Mirrors every byte, undecorated, to a raw output file — the plain
/// `-o` style capture sink, as distinct from the annotated hex dumper.
pub struct MirrorSink<W: std::io::Write> {
    out: W,
}

impl<W: std::io::Write> MirrorSink<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }
}

impl<W: std::io::Write> OutputSink for MirrorSink<W> {
    fn write(&mut self, _direction: Direction, data: &[u8]) -> CoreResult<()> {
        self.out.write_all(data)?;
        Ok(())
    }

    fn close(&mut self) -> CoreResult<()> {
        self.out.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hex_dump_formats_short_line() {
        let mut buf = Vec::new();
        {
            let mut sink = HexDumpSink::new(&mut buf);
            sink.write(Direction::LocalToRemote, b"hi").unwrap();
        }
        let text = String::from_utf8(buf).unwrap();
        assert!(text.starts_with("> 00000000  68 69"));
        assert!(text.trim_end().ends_with("|hi|"));
    }

    #[test]
    fn hex_dump_tracks_offset_across_writes() {
        let mut buf = Vec::new();
        {
            let mut sink = HexDumpSink::new(&mut buf);
            sink.write(Direction::RemoteToLocal, &[0u8; 16]).unwrap();
            sink.write(Direction::RemoteToLocal, b"x").unwrap();
        }
        let text = String::from_utf8(buf).unwrap();
        assert!(text.contains("00000010"));
    }

    #[test]
    fn mirror_sink_writes_raw_bytes() {
        let mut buf = Vec::new();
        {
            let mut sink = MirrorSink::new(&mut buf);
            sink.write(Direction::LocalToRemote, b"raw").unwrap();
        }
        assert_eq!(buf, b"raw");
    }
}
