// src/recorder.rs
use std::fs::File;
use std::io::{BufRead, BufReader, ErrorKind, Write};
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};
use log::{debug, info, warn};
use crate::drivers::csv_series::PEAK_CSV_HEADER;
use crate::drivers::AnalysisError;
/// Where and how long to record.
#[derive(Clone, Debug)]
pub struct CaptureSettings {
    pub port: String,
    pub baud_rate: u32,
    pub output: PathBuf,
    pub limits: CaptureLimits,
}
#[derive(Clone, Copy, Debug, Default)]
pub struct CaptureLimits {
    pub duration: Option<Duration>,
    pub max_samples: Option<usize>,
}
/// Appends `(timestamp, peakToPeak)` rows to a CSV sink.
///
/// Every row is flushed right away, so killing the process mid-capture still
/// leaves a readable file.
pub struct DataRecorder<W: Write> {
    writer: csv::Writer<W>,
    rows: usize,
}
impl<W: Write> DataRecorder<W> {
    pub fn new(sink: W) -> Result<Self, AnalysisError> {
        let mut writer = csv::Writer::from_writer(sink);
        writer.write_record(PEAK_CSV_HEADER)?;
        writer.flush()?;
        Ok(Self { writer, rows: 0 })
    }
    pub fn rows(&self) -> usize {
        self.rows
    }
    pub fn write_record(&mut self, timestamp: f64, value: i64) -> Result<(), AnalysisError> {
        self.writer
            .write_record([timestamp.to_string(), value.to_string()])?;
        self.writer.flush()?;
        self.rows += 1;
        Ok(())
    }
    /// Records `line` if it is a bare decimal reading; anything else is ignored.
    /// The clock is only read for lines that are kept.
    pub fn ingest_line(
        &mut self,
        line: &str,
        clock: &mut impl FnMut() -> f64,
    ) -> Result<Option<i64>, AnalysisError> {
        let line = line.trim();
        if line.is_empty() || !line.bytes().all(|b| b.is_ascii_digit()) {
            if !line.is_empty() {
                debug!("ignoring non-numeric line {line:?}");
            }
            return Ok(None);
        }
        // the loader reads values back as i64
        let Ok(value) = line.parse::<i64>() else {
            warn!("reading {line} is out of range, skipped");
            return Ok(None);
        };
        let timestamp = clock();
        self.write_record(timestamp, value)?;
        println!("{timestamp}, {value}");
        Ok(Some(value))
    }
    /// Reads lines until EOF, `stop` is raised, or a limit is hit. Read timeouts are
    /// retried; partially received lines are kept until their newline arrives.
    pub fn record_from<R: BufRead>(
        &mut self,
        mut reader: R,
        stop: &AtomicBool,
        limits: CaptureLimits,
        mut clock: impl FnMut() -> f64,
    ) -> Result<usize, AnalysisError> {
        let started = Instant::now();
        let mut line = String::new();
        while !stop.load(Ordering::Relaxed) {
            if limits.duration.is_some_and(|d| started.elapsed() >= d) {
                info!("capture duration reached");
                break;
            }
            if limits.max_samples.is_some_and(|n| self.rows >= n) {
                info!("sample limit reached");
                break;
            }
            match reader.read_line(&mut line) {
                Ok(0) => {
                    info!("serial stream closed");
                    break;
                }
                Ok(_) => {
                    if line.ends_with('\n') {
                        self.ingest_line(&line, &mut clock)?;
                        line.clear();
                    }
                }
                Err(err) if err.kind() == ErrorKind::TimedOut => continue,
                // non-UTF-8 noise on the line; drop it and resync on the next newline
                Err(err) if err.kind() == ErrorKind::InvalidData => line.clear(),
                Err(err) => return Err(err.into()),
            }
        }
        Ok(self.rows())
    }
    pub fn into_inner(self) -> Result<W, AnalysisError> {
        self.writer
            .into_inner()
            .map_err(|err| AnalysisError::Io(err.into_error()))
    }
}
fn wall_clock_secs() -> f64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs_f64()
}
/// Raises `stop` once the user presses Enter. A closed stdin never stops the capture.
fn watch_stdin(stop: Arc<AtomicBool>) {
    thread::spawn(move || {
        let mut buf = String::new();
        if let Ok(n) = std::io::stdin().read_line(&mut buf) {
            if n > 0 {
                stop.store(true, Ordering::Relaxed);
            }
        }
    });
}
/// Records a serial device into a CSV file until the user stops it.
pub fn record_serial(settings: &CaptureSettings) -> Result<usize, AnalysisError> {
    let port = serialport::new(&settings.port, settings.baud_rate)
        .timeout(Duration::from_secs(1))
        .open()?;
    info!("opened {} at {} baud", settings.port, settings.baud_rate);
    if let Some(parent) = settings.output.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    let mut recorder = DataRecorder::new(File::create(&settings.output)?)?;
    let stop = Arc::new(AtomicBool::new(false));
    watch_stdin(Arc::clone(&stop));
    println!("Recording to {}... Press Enter to stop.", settings.output.display());
    let rows = recorder.record_from(BufReader::new(port), &stop, settings.limits, wall_clock_secs)?;
    recorder.into_inner()?.sync_all()?;
    println!("Recording stopped: {rows} samples saved.");
    Ok(rows)
}
#[cfg(test)]
mod tests {
    use super::*;
    use crate::drivers::csv_series::parse_peak_csv;
    use std::io::Cursor;
    use std::path::Path;
    fn ticking_clock() -> impl FnMut() -> f64 {
        let mut t = 1_700_000_000.0;
        move || {
            t += 0.5;
            t
        }
    }
    #[test]
    fn keeps_only_digit_lines() {
        let input = Cursor::new("512\nabc\n\n 77 \r\n-5\n1.5\n1024\n");
        let mut recorder = DataRecorder::new(Vec::new()).unwrap();
        let stop = AtomicBool::new(false);
        let rows = recorder
            .record_from(input, &stop, CaptureLimits::default(), ticking_clock())
            .unwrap();
        assert_eq!(rows, 3);
        let bytes = recorder.into_inner().unwrap();
        let text = String::from_utf8(bytes).unwrap();
        assert!(text.starts_with("timestamp,peakToPeak\n"));
        let series = parse_peak_csv(text.as_bytes(), Path::new("capture.csv")).unwrap();
        assert_eq!(series.values, vec![512, 77, 1024]);
        assert_eq!(series.timestamps, vec![0.0, 0.5, 1.0]);
    }
    #[test]
    fn ingest_line_reports_kept_value() {
        let mut recorder = DataRecorder::new(Vec::new()).unwrap();
        let mut clock = ticking_clock();
        assert_eq!(recorder.ingest_line("  42\n", &mut clock).unwrap(), Some(42));
        assert_eq!(recorder.ingest_line("42a", &mut clock).unwrap(), None);
        assert_eq!(recorder.ingest_line("99999999999999999999999", &mut clock).unwrap(), None);
        assert_eq!(recorder.ingest_line("9223372036854775807", &mut clock).unwrap(), Some(i64::MAX));
        assert_eq!(recorder.ingest_line("9223372036854775808", &mut clock).unwrap(), None);
        assert_eq!(recorder.rows(), 2);
        let bytes = recorder.into_inner().unwrap();
        let series = parse_peak_csv(bytes.as_slice(), Path::new("capture.csv")).unwrap();
        assert_eq!(series.values, vec![42, i64::MAX]);
    }
    #[test]
    fn sample_limit_stops_capture() {
        let input = Cursor::new("1\n2\n3\n4\n");
        let mut recorder = DataRecorder::new(Vec::new()).unwrap();
        let stop = AtomicBool::new(false);
        let limits = CaptureLimits {
            duration: None,
            max_samples: Some(2),
        };
        let rows = recorder.record_from(input, &stop, limits, ticking_clock()).unwrap();
        assert_eq!(rows, 2);
    }
    #[test]
    fn raised_stop_flag_records_nothing() {
        let mut recorder = DataRecorder::new(Vec::new()).unwrap();
        let stop = AtomicBool::new(true);
        let rows = recorder
            .record_from(Cursor::new("10\n"), &stop, CaptureLimits::default(), ticking_clock())
            .unwrap();
        assert_eq!(rows, 0);
    }
    #[test]
    fn unterminated_last_line_is_dropped() {
        let mut recorder = DataRecorder::new(Vec::new()).unwrap();
        let stop = AtomicBool::new(false);
        let rows = recorder
            .record_from(Cursor::new("10\n20"), &stop, CaptureLimits::default(), ticking_clock())
            .unwrap();
        assert_eq!(rows, 1);
    }
}
