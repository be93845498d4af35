use crate::error::{HarnessError, Result};
use crate::recorder::Recorder;
use csv::{Terminator, WriterBuilder};
use std::io;
use std::time::Duration;

pub const HEADER: &str = "numero;nome;tempo;countResult;hash";

/// Whole nanoseconds scaled to milliseconds, so `170ns` prints as `0.00017`.
fn millis(elapsed: Duration) -> f64 {
    elapsed.as_nanos() as f64 / 1e6
}

/// Semicolon-delimited table: a header, then one line per recorded run.
/// Uses the cached timings and fingerprints; nothing is recomputed.
pub fn write_table(recorder: &Recorder, writer: impl io::Write) -> Result<()> {
    let mut wtr = WriterBuilder::new()
        .delimiter(b';')
        .terminator(Terminator::Any(b'\n'))
        .from_writer(writer);

    wtr.write_record(HEADER.split(';'))?;
    for m in recorder.measurements() {
        let index = m.index.to_string();
        let elapsed = millis(m.elapsed).to_string();
        let count = m.result_count.to_string();
        wtr.write_record([index.as_str(), m.strategy, elapsed.as_str(), count.as_str(), m.fingerprint])?;
    }
    wtr.flush()?;
    Ok(())
}

pub fn render_table(recorder: &Recorder) -> Result<String> {
    let mut out = Vec::new();
    write_table(recorder, &mut out)?;
    String::from_utf8(out).map_err(|err| HarnessError::Io(io::Error::new(io::ErrorKind::InvalidData, err)))
}

/// Human-readable block per strategy: the setup time, then one line per run.
pub fn render_summary(recorder: &Recorder) -> String {
    let mut out = String::new();
    for history in recorder.histories() {
        out.push_str(&format!("{} | {:?}\n", history.name(), history.setup_elapsed()));
        for run in history.runs() {
            out.push_str(&format!(
                "Exec:{:?} | Count:{} | Hash:{}\n",
                run.elapsed,
                run.result_count(),
                run.fingerprint
            ));
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::{Dataset, Query, QueryResult, Record};
    use crate::strategy::{HashJoin, LinearWhere, Strategy};

    fn recorder() -> Recorder {
        let data: Dataset = (0..5)
            .map(|id| Record::new(id, "teste"))
            .collect::<Vec<_>>()
            .into();
        let mut recorder = Recorder::new();
        let mut where_ = LinearWhere::new();
        let mut join = HashJoin::new();
        recorder.time_setup(&mut where_, data.clone()).unwrap();
        recorder.time_setup(&mut join, data).unwrap();
        for keys in [Query::new([1, 3, 9]), Query::new([])] {
            recorder.time_query(&where_, &keys).unwrap();
        }
        recorder.time_query(&join, &Query::new([4])).unwrap();
        recorder
    }

    #[test]
    fn table_layout() {
        let table = render_table(&recorder()).unwrap();
        let lines = table.lines().collect::<Vec<_>>();
        assert_eq!(lines.len(), 4);
        assert_eq!(lines[0], HEADER);

        let cells = lines.iter().skip(1).map(|l| l.split(';').collect::<Vec<_>>()).collect::<Vec<_>>();
        assert!(cells.iter().all(|c| c.len() == 5));
        assert_eq!((cells[0][0], cells[0][1], cells[0][3]), ("0", "LinearWhere", "2"));
        assert_eq!(cells[0][4], "b4920aa4262beeff689fdaa95a18e8cb1188ca0093a566f759619f97564d47ce");
        assert_eq!((cells[1][0], cells[1][3]), ("1", "0"));
        assert_eq!(cells[1][4], "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855");
        assert_eq!((cells[2][0], cells[2][1], cells[2][3]), ("0", "HashJoin", "1"));
        for c in &cells {
            let ms = c[2].parse::<f64>().unwrap();
            assert!(ms >= 0.0);
        }
    }

    #[test]
    fn table_is_stable() {
        let recorder = recorder();
        assert_eq!(render_table(&recorder).unwrap(), render_table(&recorder).unwrap());
    }

    #[test]
    fn empty_table_is_header_only() {
        assert_eq!(render_table(&Recorder::new()).unwrap(), format!("{HEADER}\n"));
    }

    #[test]
    fn write_table_matches_render() {
        let recorder = recorder();
        let mut buffer = Vec::new();
        write_table(&recorder, &mut buffer).unwrap();
        assert_eq!(String::from_utf8(buffer).unwrap(), render_table(&recorder).unwrap());
    }

    #[test]
    fn summary_lists_each_strategy() {
        let summary = render_summary(&recorder());
        assert!(summary.lines().any(|l| l.starts_with("LinearWhere | ")));
        assert!(summary.lines().any(|l| l.starts_with("HashJoin | ")));
        assert_eq!(summary.lines().filter(|l| l.starts_with("Exec:")).count(), 3);
    }

    /// Echoes every key back as a record, under an arbitrary name.
    struct Echo(&'static str);

    impl Strategy for Echo {
        fn name(&self) -> &str {
            self.0
        }

        fn setup(&mut self, _dataset: Dataset) -> Result<()> {
            Ok(())
        }

        fn query(&self, keys: &Query) -> Result<QueryResult> {
            Ok(keys.ids().iter().map(|&id| Record::new(id, "")).collect())
        }
    }

    #[test]
    fn delimiter_in_name_is_quoted() {
        let mut recorder = Recorder::new();
        let mut echo = Echo("hash;join");
        recorder.time_setup(&mut echo, Vec::<Record>::new().into()).unwrap();
        recorder.time_query(&echo, &Query::new([1])).unwrap();

        let table = render_table(&recorder).unwrap();
        let mut reader = csv::ReaderBuilder::new()
            .delimiter(b';')
            .from_reader(table.as_bytes());
        assert_eq!(reader.headers().unwrap().iter().collect::<Vec<_>>(), HEADER.split(';').collect::<Vec<_>>());
        let rows = reader.records().collect::<std::result::Result<Vec<_>, _>>().unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].len(), 5);
        assert_eq!(&rows[0][1], "hash;join");
        assert_eq!(&rows[0][3], "1");
    }

    #[test]
    fn millis_has_no_float_noise() {
        assert_eq!(millis(Duration::from_nanos(170)).to_string(), "0.00017");
        assert_eq!(millis(Duration::from_micros(1500)).to_string(), "1.5");
        assert_eq!(millis(Duration::from_secs(2)).to_string(), "2000");
        assert_eq!(millis(Duration::ZERO).to_string(), "0");
    }
}
