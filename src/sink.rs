use std::fmt;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::process::{Child, ChildStdin, Command, Stdio};

use crate::dns::{DomainName, ProtocolError, RecordClass, RecordType, ResourceRecord};

/// One decoded record, ready to be written out.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ZoneEntry {
    pub name: DomainName,
    pub ttl: u32,
    pub class: RecordClass,
    pub record_type: RecordType,
    pub data: String,
}

impl ZoneEntry {
    pub fn decode(record: &ResourceRecord, message: &[u8]) -> Result<Self, ProtocolError> {
        Ok(Self {
            name: record.owner(message)?,
            ttl: record.ttl,
            class: record.class,
            record_type: record.record_type,
            data: record.render_data(message)?,
        })
    }
}

/// Tab separated: name, ttl, class, type, data.
impl fmt::Display for ZoneEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}\t{}\t{}\t{}\t{}",
            self.name, self.ttl, self.class, self.record_type, self.data
        )
    }
}

/// Receives records in the order the server sent them.
pub trait RecordSink {
    fn emit(&mut self, entry: &ZoneEntry) -> io::Result<()>;

    fn finish(&mut self) -> io::Result<()> {
        Ok(())
    }

    /// Gives up on the stream after a failed transfer. Nothing buffered may
    /// reach the consumer as if the zone were complete.
    fn abort(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl RecordSink for Vec<ZoneEntry> {
    fn emit(&mut self, entry: &ZoneEntry) -> io::Result<()> {
        self.push(entry.clone());
        Ok(())
    }
}

/// Writes one line per record.
pub struct LineSink<W: Write> {
    out: W,
}

impl<W: Write> LineSink<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> RecordSink for LineSink<W> {
    fn emit(&mut self, entry: &ZoneEntry) -> io::Result<()> {
        writeln!(self.out, "{}", entry)
    }

    fn finish(&mut self) -> io::Result<()> {
        self.out.flush()
    }
}

/// Pipes the record lines into the standard input of an external program,
/// typically a zone database builder.
pub struct ProcessSink {
    program: PathBuf,
    child: Child,
    stdin: Option<LineSink<BufWriter<ChildStdin>>>,
}

impl ProcessSink {
    pub fn spawn(program: &Path) -> io::Result<Self> {
        let mut child = Command::new(program).stdin(Stdio::piped()).spawn()?;
        let stdin = child.stdin.take().ok_or_else(|| {
            io::Error::new(io::ErrorKind::BrokenPipe, "child process has no stdin")
        })?;
        log::debug!("Spawned {} (pid {}).", program.display(), child.id());

        Ok(Self {
            program: program.to_path_buf(),
            child,
            stdin: Some(LineSink::new(BufWriter::new(stdin))),
        })
    }
}

impl RecordSink for ProcessSink {
    fn emit(&mut self, entry: &ZoneEntry) -> io::Result<()> {
        match self.stdin.as_mut() {
            Some(stdin) => stdin.emit(entry),
            None => Err(io::Error::new(
                io::ErrorKind::BrokenPipe,
                "record stream already finished",
            )),
        }
    }

    /// Closes the pipe and waits for the program to exit.
    fn finish(&mut self) -> io::Result<()> {
        if let Some(mut stdin) = self.stdin.take() {
            stdin.finish()?;
        }

        let status = self.child.wait()?;
        if !status.success() {
            return Err(io::Error::new(
                io::ErrorKind::Other,
                format!("{} exited with {}", self.program.display(), status),
            ));
        }
        Ok(())
    }

    /// Kills the program before its pipe is closed, so it never sees the end
    /// of a partial record stream. Buffered lines are discarded.
    fn abort(&mut self) -> io::Result<()> {
        let stdin = match self.stdin.take() {
            Some(stdin) => stdin,
            None => return Ok(()),
        };

        log::warn!("Aborting {} (pid {}).", self.program.display(), self.child.id());
        let (pipe, _unwritten) = stdin.into_inner().into_parts();
        if let Err(err) = self.child.kill() {
            drop(pipe);
            return Err(err);
        }
        // the pipe stays open until the program is gone
        self.child.wait()?;
        drop(pipe);
        Ok(())
    }
}

impl Drop for ProcessSink {
    fn drop(&mut self) {
        if let Err(err) = self.abort() {
            log::error!("Failed to abort {}: {}", self.program.display(), err);
        }
    }
}
