use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::cmp::Reverse;

/// One timestamped status change of a prescription.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrescriptionLog {
    pub log_timestamp: Option<DateTime<Utc>>,
    pub prescription_status: String,
    #[serde(default)]
    pub additional_info: String,
}

/// Sort most recent first. Entries without a timestamp go last; ties keep their order.
pub fn sort_most_recent_first(logs: &mut [PrescriptionLog]) {
    logs.sort_by_key(|log| (log.log_timestamp.is_none(), Reverse(log.log_timestamp)));
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn entry(hour: Option<u32>, status: &str) -> PrescriptionLog {
        PrescriptionLog {
            log_timestamp: hour.map(|h| Utc.with_ymd_and_hms(2014, 1, 28, h, 0, 0).unwrap()),
            prescription_status: status.into(),
            additional_info: String::new(),
        }
    }

    #[test]
    fn newest_first_with_undated_last() {
        let mut logs = vec![
            entry(Some(1), "Sent"),
            entry(None, "Unknown"),
            entry(Some(3), "Delivered"),
            entry(Some(2), "Queued"),
        ];
        sort_most_recent_first(&mut logs);

        let statuses: Vec<&str> = logs.iter().map(|l| l.prescription_status.as_str()).collect();
        assert_eq!(statuses, vec!["Delivered", "Queued", "Sent", "Unknown"]);
    }
}
