//! Fan controller managed objects.
//!
//! Everything lives under the MIB-II `system` group (`1.3.6.1.2.1.1`):
//!
//! | OID | Type | Value |
//! |-----|------|-------|
//! | `.1.0` | OCTET STRING | agent description |
//! | `.5.0` | OCTET STRING | configured city |
//! | `.8.0` | INTEGER | outdoor temperature, truncated |
//! | `.9.0` | OCTET STRING | `warning` or `critical` |
//! | `.10.0` | INTEGER | last update, UNIX seconds |
//! | `.2.{fan+1}.0` | INTEGER | fan speed percentage |
//! | `.4.{sensor}.{0,1,2}.0` | INTEGER | sensor current / warning / critical |
//!
//! Every provider captures only the index it serves plus a
//! [`StatusReader`] handle, and reads a fresh snapshot on each call.

use std::collections::BTreeMap;
use std::sync::Arc;

use crate::ber::{encode_integer, encode_octet_string};
use crate::handler::ManagedObjectTree;
use crate::oid;
use crate::oid::Oid;
use crate::status::{StatusReader, StatusSnapshot};

/// Description returned for sysDescr.
pub const SYS_DESCR: &str = "SNMP Fan Proxy Server";

/// Fans are reported as indices `0..FAN_COUNT`.
pub const FAN_COUNT: u32 = 6;

/// Highest sensor number reported; sensors start at 1.
pub const SENSOR_COUNT: u32 = 30;

/// Root of the registered objects.
pub fn system_oid() -> Oid {
    oid!(1, 3, 6, 1, 2, 1, 1)
}

/// Which value of a sensor an OID reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SensorField {
    Current,
    Warning,
    Critical,
}

impl SensorField {
    pub const ALL: [SensorField; 3] = [Self::Current, Self::Warning, Self::Critical];

    /// Arc under `.4.{sensor}`.
    pub fn arc(self) -> u32 {
        match self {
            Self::Current => 0,
            Self::Warning => 1,
            Self::Critical => 2,
        }
    }
}

/// Fixed thresholds that replace IPMI-reported ones for one sensor.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct SensorOverride {
    pub warning: Option<f64>,
    pub critical: Option<f64>,
}

/// Static inputs to the registrations.
#[derive(Debug, Clone, PartialEq)]
pub struct MibConfig {
    pub city: String,
    pub sensor_overrides: BTreeMap<u32, SensorOverride>,
}

impl Default for MibConfig {
    fn default() -> Self {
        Self {
            city: "Unknown".into(),
            sensor_overrides: default_sensor_overrides(),
        }
    }
}

/// Thresholds for sensors whose IPMI limits are unusable.
pub fn default_sensor_overrides() -> BTreeMap<u32, SensorOverride> {
    BTreeMap::from([
        (
            30,
            SensorOverride {
                warning: Some(100.0),
                critical: Some(110.0),
            },
        ),
        (
            29,
            SensorOverride {
                warning: Some(81.0),
                critical: Some(85.0),
            },
        ),
    ])
}

/// Value reported for one sensor field, with overrides applied.
///
/// Missing sensors read as 0.
pub fn sensor_value(
    snapshot: &StatusSnapshot,
    overrides: &BTreeMap<u32, SensorOverride>,
    sensor: u32,
    field: SensorField,
) -> f64 {
    let overridden = overrides.get(&sensor).and_then(|o| match field {
        SensorField::Current => None,
        SensorField::Warning => o.warning,
        SensorField::Critical => o.critical,
    });
    if let Some(value) = overridden {
        return value;
    }

    snapshot
        .temps
        .get(&sensor)
        .map(|reading| match field {
            SensorField::Current => reading.current,
            SensorField::Warning => reading.warning,
            SensorField::Critical => reading.critical,
        })
        .unwrap_or(0.0)
}

/// Truncate toward zero. NaN reads as 0; out-of-range values saturate.
fn truncate(value: f64) -> i64 {
    value as i64
}

/// Register all fan controller objects into `tree`.
pub fn register_fan_objects(tree: &mut ManagedObjectTree, status: &StatusReader, config: &MibConfig) {
    let system = system_oid();

    tree.register_fn(system.child(1).child(0), || encode_octet_string(SYS_DESCR));

    let city = config.city.clone();
    tree.register_fn(system.child(5).child(0), move || encode_octet_string(&city));

    let reader = status.clone();
    tree.register_fn(system.child(8).child(0), move || {
        Ok(encode_integer(truncate(reader.snapshot().outdoor_temp)))
    });

    let reader = status.clone();
    tree.register_fn(system.child(9).child(0), move || {
        encode_octet_string(reader.snapshot().usetemp.as_str())
    });

    let reader = status.clone();
    tree.register_fn(system.child(10).child(0), move || {
        Ok(encode_integer(reader.snapshot().last_update_unix_secs()))
    });

    for fan in 0..FAN_COUNT {
        let reader = status.clone();
        tree.register_fn(system.child(2).child(fan + 1).child(0), move || {
            let speed = reader.snapshot().fan_speeds.get(&fan).copied().unwrap_or(0);
            Ok(encode_integer(speed))
        });
    }

    let overrides = Arc::new(config.sensor_overrides.clone());
    for sensor in 1..=SENSOR_COUNT {
        for field in SensorField::ALL {
            let reader = status.clone();
            let overrides = Arc::clone(&overrides);
            let oid = system.child(4).child(sensor).child(field.arc()).child(0);
            tree.register_fn(oid, move || {
                let value = sensor_value(&reader.snapshot(), &overrides, sensor, field);
                Ok(encode_integer(truncate(value)))
            });
        }
    }

    tracing::debug!(objects = tree.len(), "registered fan controller objects");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ber::encode_null;
    use crate::status::{self, SensorReading, Threshold};

    fn sample_snapshot() -> StatusSnapshot {
        StatusSnapshot {
            fan_speeds: BTreeMap::from([(0, 42), (5, 100)]),
            temps: BTreeMap::from([
                (
                    1,
                    SensorReading {
                        current: 45.9,
                        warning: 80.0,
                        critical: 90.0,
                    },
                ),
                (
                    30,
                    SensorReading {
                        current: 61.2,
                        warning: 70.0,
                        critical: 75.0,
                    },
                ),
            ]),
            outdoor_temp: -3.7,
            usetemp: Threshold::Critical,
            ..Default::default()
        }
        .with_last_update_unix_secs(1_700_000_123)
    }

    fn tree_for(snapshot: StatusSnapshot) -> ManagedObjectTree {
        let mut tree = ManagedObjectTree::new();
        register_fan_objects(&mut tree, &StatusReader::fixed(snapshot), &MibConfig {
            city: "Riga".into(),
            ..Default::default()
        });
        tree
    }

    fn value(tree: &ManagedObjectTree, oid: Oid) -> bytes::Bytes {
        tree.get(&oid)
            .map(|p| p.provide().unwrap())
            .unwrap_or_else(encode_null)
    }

    #[test]
    fn test_object_count() {
        let tree = tree_for(StatusSnapshot::default());
        // 5 scalars, 6 fans, 30 sensors x 3 fields
        assert_eq!(tree.len(), 5 + 6 + 90);
    }

    #[test]
    fn test_scalars() {
        let tree = tree_for(sample_snapshot());
        assert_eq!(
            value(&tree, oid!(1, 3, 6, 1, 2, 1, 1, 1, 0)),
            encode_octet_string(SYS_DESCR).unwrap()
        );
        assert_eq!(
            value(&tree, oid!(1, 3, 6, 1, 2, 1, 1, 5, 0)),
            encode_octet_string("Riga").unwrap()
        );
        assert_eq!(value(&tree, oid!(1, 3, 6, 1, 2, 1, 1, 8, 0)), encode_integer(-3));
        assert_eq!(
            value(&tree, oid!(1, 3, 6, 1, 2, 1, 1, 9, 0)),
            encode_octet_string("critical").unwrap()
        );
        assert_eq!(
            value(&tree, oid!(1, 3, 6, 1, 2, 1, 1, 10, 0)),
            encode_integer(1_700_000_123)
        );
    }

    #[test]
    fn test_fans() {
        let tree = tree_for(sample_snapshot());
        assert_eq!(value(&tree, oid!(1, 3, 6, 1, 2, 1, 1, 2, 1, 0)), encode_integer(42));
        assert_eq!(value(&tree, oid!(1, 3, 6, 1, 2, 1, 1, 2, 2, 0)), encode_integer(0));
        assert_eq!(value(&tree, oid!(1, 3, 6, 1, 2, 1, 1, 2, 6, 0)), encode_integer(100));
        assert!(tree.get(&oid!(1, 3, 6, 1, 2, 1, 1, 2, 7, 0)).is_none());
    }

    #[test]
    fn test_sensors_and_overrides() {
        let tree = tree_for(sample_snapshot());
        let sensor = |s: u32, f: u32| oid!(1, 3, 6, 1, 2, 1, 1, 4, s, f, 0);

        assert_eq!(value(&tree, sensor(1, 0)), encode_integer(45));
        assert_eq!(value(&tree, sensor(1, 1)), encode_integer(80));
        assert_eq!(value(&tree, sensor(1, 2)), encode_integer(90));

        // Sensor 30: current from IPMI, thresholds overridden
        assert_eq!(value(&tree, sensor(30, 0)), encode_integer(61));
        assert_eq!(value(&tree, sensor(30, 1)), encode_integer(100));
        assert_eq!(value(&tree, sensor(30, 2)), encode_integer(110));

        // Sensor 29: absent from the snapshot, thresholds still overridden
        assert_eq!(value(&tree, sensor(29, 0)), encode_integer(0));
        assert_eq!(value(&tree, sensor(29, 1)), encode_integer(81));
        assert_eq!(value(&tree, sensor(29, 2)), encode_integer(85));

        // Absent sensor without override
        assert_eq!(value(&tree, sensor(7, 1)), encode_integer(0));
    }

    #[test]
    fn test_providers_follow_published_status() {
        let (publisher, reader) = status::channel(StatusSnapshot::default());
        let mut tree = ManagedObjectTree::new();
        register_fan_objects(&mut tree, &reader, &MibConfig::default());

        let fan0 = oid!(1, 3, 6, 1, 2, 1, 1, 2, 1, 0);
        assert_eq!(value(&tree, fan0.clone()), encode_integer(0));

        publisher.publish(sample_snapshot());
        assert_eq!(value(&tree, fan0), encode_integer(42));
    }

    #[test]
    fn test_non_latin1_city_fails_to_encode() {
        let mut tree = ManagedObjectTree::new();
        register_fan_objects(
            &mut tree,
            &StatusReader::fixed(StatusSnapshot::default()),
            &MibConfig {
                city: "\u{6771}\u{4EAC}".into(),
                ..Default::default()
            },
        );
        let provider = tree.get(&oid!(1, 3, 6, 1, 2, 1, 1, 5, 0)).unwrap();
        assert!(provider.provide().is_err());
    }

    #[test]
    fn test_truncate() {
        assert_eq!(truncate(45.9), 45);
        assert_eq!(truncate(-3.7), -3);
        assert_eq!(truncate(f64::NAN), 0);
    }
}
