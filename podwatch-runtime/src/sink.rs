//! Destinations for display records
use futures::channel::mpsc;
use podwatch_core::DisplayRecord;
use std::io;

/// Receives every record the watch admits, in server order.
///
/// Errors are fatal to the watch: a sink that can no longer be written to (for example a
/// closed pipe) ends it.
pub trait RecordSink: Send {
    /// Writes one record
    fn write_record(&mut self, record: &DisplayRecord) -> io::Result<()>;

    /// Flushes buffered output, called once the watch ends
    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl RecordSink for Vec<DisplayRecord> {
    fn write_record(&mut self, record: &DisplayRecord) -> io::Result<()> {
        self.push(record.clone());
        Ok(())
    }
}

impl RecordSink for mpsc::UnboundedSender<DisplayRecord> {
    fn write_record(&mut self, record: &DisplayRecord) -> io::Result<()> {
        self.unbounded_send(record.clone())
            .map_err(|_| io::Error::new(io::ErrorKind::BrokenPipe, "record receiver dropped"))
    }
}

impl<S: RecordSink + ?Sized> RecordSink for Box<S> {
    fn write_record(&mut self, record: &DisplayRecord) -> io::Result<()> {
        (**self).write_record(record)
    }

    fn flush(&mut self) -> io::Result<()> {
        (**self).flush()
    }
}
