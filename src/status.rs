//! Controller status shared with value providers.
//!
//! The control loop owns a [`StatusPublisher`] and replaces the whole
//! snapshot on each update. Providers hold a [`StatusReader`] and see either
//! the previous snapshot or the new one, never a mix.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use tokio::sync::watch;

/// Which IPMI threshold the fan curve is driven from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "cli", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "cli", serde(rename_all = "lowercase"))]
pub enum Threshold {
    #[default]
    Warning,
    Critical,
}

impl Threshold {
    /// Lowercase name as reported over SNMP.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Warning => "warning",
            Self::Critical => "critical",
        }
    }
}

impl fmt::Display for Threshold {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Threshold {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "warning" => Ok(Self::Warning),
            "critical" => Ok(Self::Critical),
            _ => Err(format!("expected 'warning' or 'critical', got '{}'", s)),
        }
    }
}

/// One temperature sensor reading with its IPMI thresholds, in degrees C.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "cli", derive(serde::Serialize, serde::Deserialize))]
pub struct SensorReading {
    pub current: f64,
    pub warning: f64,
    pub critical: f64,
}

/// Point-in-time controller status.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "cli", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "cli", serde(default))]
pub struct StatusSnapshot {
    /// Fan index to speed percentage.
    pub fan_speeds: BTreeMap<u32, i64>,
    /// Sensor number to reading.
    pub temps: BTreeMap<u32, SensorReading>,
    pub outdoor_temp: f64,
    pub usetemp: Threshold,
    #[cfg_attr(feature = "cli", serde(with = "unix_seconds"))]
    pub last_update_time: SystemTime,
}

impl Default for StatusSnapshot {
    fn default() -> Self {
        Self {
            fan_speeds: BTreeMap::new(),
            temps: BTreeMap::new(),
            outdoor_temp: 0.0,
            usetemp: Threshold::default(),
            last_update_time: UNIX_EPOCH,
        }
    }
}

impl StatusSnapshot {
    /// Whole seconds since the UNIX epoch of the last update.
    ///
    /// Times before the epoch report as 0.
    pub fn last_update_unix_secs(&self) -> i64 {
        self.last_update_time
            .duration_since(UNIX_EPOCH)
            .map(|d| i64::try_from(d.as_secs()).unwrap_or(i64::MAX))
            .unwrap_or(0)
    }

    /// Set the last update time from UNIX seconds.
    pub fn with_last_update_unix_secs(mut self, secs: u64) -> Self {
        self.last_update_time = UNIX_EPOCH + Duration::from_secs(secs);
        self
    }
}

#[cfg(feature = "cli")]
mod unix_seconds {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::{Duration, SystemTime, UNIX_EPOCH};

    pub fn serialize<S: Serializer>(time: &SystemTime, s: S) -> Result<S::Ok, S::Error> {
        let secs = time
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs_f64())
            .unwrap_or(0.0);
        s.serialize_f64(secs)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<SystemTime, D::Error> {
        let secs = f64::deserialize(d)?;
        Duration::try_from_secs_f64(secs)
            .map(|d| UNIX_EPOCH + d)
            .map_err(serde::de::Error::custom)
    }
}

/// Create a linked publisher and reader, starting from `initial`.
pub fn channel(initial: StatusSnapshot) -> (StatusPublisher, StatusReader) {
    let (tx, rx) = watch::channel(Arc::new(initial));
    (StatusPublisher { tx }, StatusReader { rx })
}

/// Write side of the status channel.
#[derive(Debug)]
pub struct StatusPublisher {
    tx: watch::Sender<Arc<StatusSnapshot>>,
}

impl StatusPublisher {
    /// Replace the current snapshot.
    ///
    /// Succeeds even when no reader is alive.
    pub fn publish(&self, snapshot: StatusSnapshot) {
        self.tx.send_replace(Arc::new(snapshot));
    }

    /// Create another reader of this channel.
    pub fn subscribe(&self) -> StatusReader {
        StatusReader {
            rx: self.tx.subscribe(),
        }
    }
}

/// Read side of the status channel. Cheap to clone.
#[derive(Debug, Clone)]
pub struct StatusReader {
    rx: watch::Receiver<Arc<StatusSnapshot>>,
}

impl StatusReader {
    /// The most recently published snapshot.
    pub fn snapshot(&self) -> Arc<StatusSnapshot> {
        self.rx.borrow().clone()
    }

    /// A reader that always returns `snapshot`.
    pub fn fixed(snapshot: StatusSnapshot) -> Self {
        let (tx, rx) = watch::channel(Arc::new(snapshot));
        // Receiver keeps the last value after the sender is gone
        drop(tx);
        Self { rx }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snapshot_with_fan(speed: i64) -> StatusSnapshot {
        StatusSnapshot {
            fan_speeds: BTreeMap::from([(0, speed)]),
            ..Default::default()
        }
    }

    #[test]
    fn test_publish_replaces_snapshot() {
        let (publisher, reader) = channel(StatusSnapshot::default());
        assert!(reader.snapshot().fan_speeds.is_empty());

        publisher.publish(snapshot_with_fan(40));
        assert_eq!(reader.snapshot().fan_speeds[&0], 40);

        publisher.publish(snapshot_with_fan(75));
        assert_eq!(reader.snapshot().fan_speeds[&0], 75);
    }

    #[test]
    fn test_held_snapshot_is_unaffected_by_publish() {
        let (publisher, reader) = channel(snapshot_with_fan(10));
        let held = reader.snapshot();
        publisher.publish(snapshot_with_fan(90));
        assert_eq!(held.fan_speeds[&0], 10);
        assert_eq!(reader.snapshot().fan_speeds[&0], 90);
    }

    #[test]
    fn test_fixed_reader() {
        let reader = StatusReader::fixed(snapshot_with_fan(55));
        assert_eq!(reader.snapshot().fan_speeds[&0], 55);
        assert_eq!(reader.clone().snapshot().fan_speeds[&0], 55);
    }

    #[test]
    fn test_publish_without_readers() {
        let (publisher, reader) = channel(StatusSnapshot::default());
        drop(reader);
        publisher.publish(snapshot_with_fan(1));
        assert_eq!(publisher.subscribe().snapshot().fan_speeds[&0], 1);
    }

    #[test]
    fn test_concurrent_readers_see_whole_snapshots() {
        let (publisher, reader) = channel(StatusSnapshot::default());

        let handles: Vec<_> = (0..4)
            .map(|_| {
                let reader = reader.clone();
                std::thread::spawn(move || {
                    for _ in 0..1000 {
                        let snap = reader.snapshot();
                        // Every published snapshot has fan 0 == fan 1
                        assert_eq!(snap.fan_speeds.get(&0), snap.fan_speeds.get(&1));
                    }
                })
            })
            .collect();

        for speed in 0..1000 {
            publisher.publish(StatusSnapshot {
                fan_speeds: BTreeMap::from([(0, speed), (1, speed)]),
                ..Default::default()
            });
        }

        for handle in handles {
            handle.join().unwrap();
        }
    }

    #[test]
    fn test_threshold_parse_and_display() {
        assert_eq!("warning".parse::<Threshold>().unwrap(), Threshold::Warning);
        assert_eq!("CRITICAL".parse::<Threshold>().unwrap(), Threshold::Critical);
        assert!("hot".parse::<Threshold>().is_err());
        assert_eq!(Threshold::Critical.to_string(), "critical");
    }

    #[test]
    fn test_last_update_secs() {
        let snap = StatusSnapshot::default().with_last_update_unix_secs(1_700_000_000);
        assert_eq!(snap.last_update_unix_secs(), 1_700_000_000);
        assert_eq!(StatusSnapshot::default().last_update_unix_secs(), 0);
    }
}
