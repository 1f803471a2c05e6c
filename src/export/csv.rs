use anyhow::Result;
use serde::Serialize;
use std::io::Write;

use crate::accounting::SamplesHistory;
use crate::compensation::CompensationRecord;

#[derive(Serialize)]
struct SampleRow {
    period: usize,
    closed_at: String,
    kind: &'static str,
    link: String,
    number: u64,
    value: i64,
}

#[derive(Serialize)]
struct CompensationRow {
    recorded_at: String,
    source_as: u32,
    link: String,
    value: i64,
}

/// One row per archived sample: period index, link or tunnel traffic, sample
/// number and value
pub fn export_samples_csv<W: Write>(history: &SamplesHistory, writer: W) -> Result<()> {
    let mut wtr = csv::Writer::from_writer(writer);
    for (period, snapshot) in history.periods().iter().enumerate() {
        let closed_at = snapshot.closed_at.to_rfc3339();
        let kinds = [("link", &snapshot.links), ("tunnel", &snapshot.tunnels)];
        for (kind, entries) in kinds {
            for entry in entries {
                for sample in &entry.samples {
                    wtr.serialize(SampleRow {
                        period,
                        closed_at: closed_at.clone(),
                        kind,
                        link: entry.link.to_string(),
                        number: sample.number,
                        value: sample.value,
                    })?;
                }
            }
        }
    }
    wtr.flush()?;
    Ok(())
}

/// One row per compensation vector component
pub fn export_compensations_csv<W: Write>(
    records: &[CompensationRecord],
    writer: W,
) -> Result<()> {
    let mut wtr = csv::Writer::from_writer(writer);
    for record in records {
        let recorded_at = record.recorded_at.to_rfc3339();
        for (link, value) in record.vector.entries() {
            wtr.serialize(CompensationRow {
                recorded_at: recorded_at.clone(),
                source_as: record.vector.source_as,
                link: link.to_string(),
                value,
            })?;
        }
    }
    wtr.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::accounting::TrafficSample;
    use crate::compensation::CompensationHistory;
    use crate::state::{CVector, LinkId};
    use std::collections::HashMap;

    #[test]
    fn test_samples_csv() {
        let link = LinkId::new("link1", "isp1");
        let mut history = SamplesHistory::default();
        history.store(
            HashMap::from([(
                link.clone(),
                vec![
                    TrafficSample { number: 1, value: 10 },
                    TrafficSample { number: 2, value: 20 },
                ],
            )]),
            HashMap::from([(link, vec![TrafficSample { number: 1, value: 3 }])]),
        );

        let mut out = Vec::new();
        export_samples_csv(&history, &mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        let lines: Vec<&str> = text.lines().collect();

        assert_eq!(lines[0], "period,closed_at,kind,link,number,value");
        assert_eq!(lines.len(), 4);
        assert!(lines[1].starts_with("0,"));
        assert!(lines[1].ends_with(",link,link1@isp1,1,10"));
        assert!(lines[3].ends_with(",tunnel,link1@isp1,1,3"));
    }

    #[test]
    fn test_compensations_csv() {
        let history = CompensationHistory::new();
        history.store(
            &CVector::from_values(
                7,
                [
                    (LinkId::new("link1", "isp1"), 100),
                    (LinkId::new("link2", "isp1"), -100),
                ],
            ),
            &[],
        );

        let mut out = Vec::new();
        export_compensations_csv(&history.records(), &mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        let lines: Vec<&str> = text.lines().collect();

        assert_eq!(lines[0], "recorded_at,source_as,link,value");
        assert!(lines[1].ends_with(",7,link1@isp1,100"));
        assert!(lines[2].ends_with(",7,link2@isp1,-100"));
    }

    #[test]
    fn test_empty_history_writes_nothing() {
        let mut out = Vec::new();
        export_samples_csv(&SamplesHistory::default(), &mut out).unwrap();
        assert!(out.is_empty());
    }
}
