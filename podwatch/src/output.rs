//! Writers that print display records to a terminal or pipe
use crate::config::OutputMode;
use podwatch_core::DisplayRecord;
use podwatch_runtime::RecordSink;
use std::io::{self, Write};

/// Column titles of the table output
pub const HEADER: [&str; 6] = ["EVENT", "NAME", "READY", "STATUS", "RESTARTS", "AGE"];

/// Builds the sink for `mode` writing to `out`.
///
/// Table output writes its header immediately, so it appears before the first event.
pub fn sink<W>(mode: OutputMode, out: W) -> io::Result<Box<dyn RecordSink>>
where
    W: Write + Send + 'static,
{
    Ok(match mode {
        OutputMode::Table => {
            let mut table = TableWriter::new(out);
            table.write_header()?;
            Box::new(table)
        }
        OutputMode::Json => Box::new(JsonWriter::new(out)),
    })
}

fn row(out: &mut impl Write, cols: [&str; 6]) -> io::Result<()> {
    let [event, name, ready, status, restarts, age] = cols;
    writeln!(
        out,
        "{event:<10} {name:<40} {ready:<10} {status:<10} {restarts:<12} {age:<10}"
    )
}

/// Fixed-width columns under a single header line
pub struct TableWriter<W> {
    out: W,
    header_written: bool,
}

impl<W: Write> TableWriter<W> {
    /// Writes rows to `out`
    pub fn new(out: W) -> Self {
        Self {
            out,
            header_written: false,
        }
    }

    /// Writes the header unless it was already written
    pub fn write_header(&mut self) -> io::Result<()> {
        if self.header_written {
            return Ok(());
        }
        row(&mut self.out, HEADER)?;
        self.header_written = true;
        self.out.flush()
    }

    /// Gives back the writer
    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write + Send> RecordSink for TableWriter<W> {
    fn write_record(&mut self, record: &DisplayRecord) -> io::Result<()> {
        self.write_header()?;
        row(&mut self.out, [
            record.event.as_str(),
            &record.name,
            &record.ready.to_string(),
            record.status_str(),
            &record.restarts.to_string(),
            &record.age.to_string(),
        ])?;
        self.out.flush()
    }

    fn flush(&mut self) -> io::Result<()> {
        self.out.flush()
    }
}

/// One JSON object per record and line
pub struct JsonWriter<W> {
    out: W,
}

impl<W: Write> JsonWriter<W> {
    /// Writes lines to `out`
    pub fn new(out: W) -> Self {
        Self { out }
    }

    /// Gives back the writer
    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write + Send> RecordSink for JsonWriter<W> {
    fn write_record(&mut self, record: &DisplayRecord) -> io::Result<()> {
        serde_json::to_writer(&mut self.out, record)?;
        self.out.write_all(b"\n")?;
        self.out.flush()
    }

    fn flush(&mut self) -> io::Result<()> {
        self.out.flush()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use jiff::{SignedDuration, Timestamp};
    use podwatch_core::{ContainerState, EventKind, Phase, ResourceSnapshot};

    fn record(kind: EventKind) -> DisplayRecord {
        let now = Timestamp::from_second(1_700_000_000).unwrap();
        let pod = ResourceSnapshot::new("web-0")
            .phase(Phase::Running)
            .created(now - SignedDuration::from_secs(125))
            .container("app")
            .container("proxy")
            .container_status(ContainerState {
                name: "app".into(),
                ready: true,
                restart_count: 1,
            });
        DisplayRecord::project(kind, &pod, now)
    }

    #[test]
    fn table_has_one_header_and_padded_columns() {
        let mut table = TableWriter::new(Vec::new());
        table.write_header().unwrap();
        table.write_record(&record(EventKind::Added)).unwrap();
        table.write_record(&record(EventKind::Modified)).unwrap();
        let out = String::from_utf8(table.into_inner()).unwrap();
        let lines: Vec<_> = out.lines().collect();

        assert_eq!(lines.len(), 3);
        assert_eq!(
            lines[0],
            format!("{:<10} {:<40} {:<10} {:<10} {:<12} {:<10}", "EVENT", "NAME", "READY", "STATUS", "RESTARTS", "AGE")
        );
        assert_eq!(
            lines[1],
            format!("{:<10} {:<40} {:<10} {:<10} {:<12} {:<10}", "ADDED", "web-0", "1/2", "Running", "1", "2m5s")
        );
        assert!(lines[2].starts_with("MODIFIED   web-0"));
    }

    #[test]
    fn table_writes_the_header_before_the_first_record() {
        let mut table = TableWriter::new(Vec::new());
        table.write_record(&record(EventKind::Deleted)).unwrap();
        let out = String::from_utf8(table.into_inner()).unwrap();
        assert!(out.starts_with("EVENT "));
        assert_eq!(out.lines().count(), 2);
    }

    #[test]
    fn missing_status_is_blank() {
        let now = Timestamp::from_second(1_700_000_000).unwrap();
        let pod = ResourceSnapshot::new("new").created(now);
        let mut table = TableWriter::new(Vec::new());
        table
            .write_record(&DisplayRecord::project(EventKind::Added, &pod, now))
            .unwrap();
        let out = String::from_utf8(table.into_inner()).unwrap();
        let line = out.lines().nth(1).unwrap();
        assert_eq!(line[63..73], " ".repeat(10));
        assert!(line.contains("0/0"));
        assert!(line.trim_end().ends_with("0s"));
    }

    #[test]
    fn json_lines() {
        let mut json = JsonWriter::new(Vec::new());
        json.write_record(&record(EventKind::Added)).unwrap();
        json.write_record(&record(EventKind::Deleted)).unwrap();
        let out = String::from_utf8(json.into_inner()).unwrap();
        let values: Vec<serde_json::Value> = out
            .lines()
            .map(|line| serde_json::from_str(line).unwrap())
            .collect();

        assert_eq!(values.len(), 2);
        assert_eq!(values[0]["event"], "ADDED");
        assert_eq!(values[0]["name"], "web-0");
        assert_eq!(values[0]["age"], "2m5s");
        assert_eq!(values[1]["event"], "DELETED");
    }
}
