//! Detector class label to device lookup table
//!
//! The table is fixed when the dispatcher starts. Values are checked once
//! against the limits of the FPGA test programs so a bad entry fails at
//! startup instead of on the board.

use crate::device::DeviceKind;
use std::str::FromStr;
use thiserror::Error;

/// Largest glyph index in the dot matrix digit font
pub const DOT_MATRIX_MAX: u32 = 9;

/// LED value is a single byte bitmask
pub const LED_MAX: u32 = 0xff;

/// Four digit seven-segment display
pub const FND_MAX: u32 = 9999;

/// Errors raised while building a mapping table
#[derive(Error, Debug, PartialEq, Eq)]
pub enum MappingError {
    #[error("Value {value} out of range for {kind} (max: {max})")]
    ValueOutOfRange { kind: DeviceKind, value: u32, max: u32 },

    #[error("Duplicate entry for label {0}")]
    DuplicateLabel(ClassLabel),
}

/// Class labels the detector model is trained on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ClassLabel {
    Dev1,
    Dev2,
    Dev3,
    Dev4,
    Off,
}

impl ClassLabel {
    /// Label as emitted by the detector
    pub fn as_str(self) -> &'static str {
        match self {
            ClassLabel::Dev1 => "dev1",
            ClassLabel::Dev2 => "dev2",
            ClassLabel::Dev3 => "dev3",
            ClassLabel::Dev4 => "dev4",
            ClassLabel::Off => "off",
        }
    }
}

impl std::fmt::Display for ClassLabel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Returned when a detector label has no table entry
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Unknown class label: {0}")]
pub struct UnknownLabel(pub String);

impl FromStr for ClassLabel {
    type Err = UnknownLabel;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "dev1" => Ok(ClassLabel::Dev1),
            "dev2" => Ok(ClassLabel::Dev2),
            "dev3" => Ok(ClassLabel::Dev3),
            "dev4" => Ok(ClassLabel::Dev4),
            "off" => Ok(ClassLabel::Off),
            other => Err(UnknownLabel(other.to_string())),
        }
    }
}

/// Device and value a label resolves to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeviceTarget {
    pub kind: DeviceKind,
    pub value: u32,
}

impl DeviceTarget {
    pub const fn new(kind: DeviceKind, value: u32) -> Self {
        Self { kind, value }
    }

    /// Check the value against what the device's test program accepts
    pub fn validate(&self) -> Result<(), MappingError> {
        let max = match self.kind {
            DeviceKind::DotMatrix => DOT_MATRIX_MAX,
            DeviceKind::Led => LED_MAX,
            DeviceKind::Fnd => FND_MAX,
            // Any u32 fits on a 16 character LCD line
            DeviceKind::TextLcd | DeviceKind::Buzzer => return Ok(()),
        };

        if self.value > max {
            return Err(MappingError::ValueOutOfRange {
                kind: self.kind,
                value: self.value,
                max,
            });
        }
        Ok(())
    }
}

/// Entries of the board's label table
pub const STANDARD_ENTRIES: [(ClassLabel, DeviceTarget); 5] = [
    (ClassLabel::Dev1, DeviceTarget::new(DeviceKind::DotMatrix, 1)),
    (ClassLabel::Dev2, DeviceTarget::new(DeviceKind::Led, 2)),
    (ClassLabel::Dev3, DeviceTarget::new(DeviceKind::TextLcd, 3)),
    (ClassLabel::Dev4, DeviceTarget::new(DeviceKind::Fnd, 4)),
    (ClassLabel::Off, DeviceTarget::new(DeviceKind::Buzzer, 0)),
];

/// Immutable label to device table
#[derive(Debug, Clone)]
pub struct DeviceMapping {
    entries: Vec<(ClassLabel, DeviceTarget)>,
}

impl DeviceMapping {
    /// Build a table, validating every entry
    pub fn new(entries: &[(ClassLabel, DeviceTarget)]) -> Result<Self, MappingError> {
        let mut checked: Vec<(ClassLabel, DeviceTarget)> = Vec::with_capacity(entries.len());

        for (label, target) in entries {
            if checked.iter().any(|(l, _)| l == label) {
                return Err(MappingError::DuplicateLabel(*label));
            }
            target.validate()?;
            checked.push((*label, *target));
        }

        Ok(Self { entries: checked })
    }

    /// The five-entry table used on the board
    pub fn standard() -> Self {
        Self {
            entries: STANDARD_ENTRIES.to_vec(),
        }
    }

    /// Look up a parsed label
    pub fn get(&self, label: ClassLabel) -> Option<DeviceTarget> {
        self.entries
            .iter()
            .find(|(l, _)| *l == label)
            .map(|(_, target)| *target)
    }

    /// Resolve a raw detector label; unknown labels resolve to `None`
    pub fn resolve(&self, raw: &str) -> Option<DeviceTarget> {
        raw.parse::<ClassLabel>().ok().and_then(|label| self.get(label))
    }

    /// Number of entries
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for DeviceMapping {
    fn default() -> Self {
        Self::standard()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_standard_table() {
        let mapping = DeviceMapping::standard();
        assert_eq!(mapping.len(), 5);
        assert_eq!(
            mapping.resolve("dev1"),
            Some(DeviceTarget::new(DeviceKind::DotMatrix, 1))
        );
        assert_eq!(
            mapping.resolve("dev3"),
            Some(DeviceTarget::new(DeviceKind::TextLcd, 3))
        );
        assert_eq!(
            mapping.resolve("off"),
            Some(DeviceTarget::new(DeviceKind::Buzzer, 0))
        );
    }

    #[test]
    fn test_standard_table_is_valid() {
        assert!(DeviceMapping::new(&STANDARD_ENTRIES).is_ok());
    }

    #[test]
    fn test_unknown_labels_do_not_resolve() {
        let mapping = DeviceMapping::standard();
        for raw in ["", "dev5", "DEV1", "person", " off"] {
            assert_eq!(mapping.resolve(raw), None, "label {:?}", raw);
        }
    }

    #[test]
    fn test_label_parse() {
        assert_eq!("dev4".parse::<ClassLabel>(), Ok(ClassLabel::Dev4));
        assert_eq!(
            "cat".parse::<ClassLabel>(),
            Err(UnknownLabel("cat".to_string()))
        );
        assert_eq!(ClassLabel::Off.to_string(), "off");
    }

    #[test]
    fn test_value_limits() {
        let result = DeviceMapping::new(&[(ClassLabel::Dev1, DeviceTarget::new(DeviceKind::DotMatrix, 10))]);
        assert_eq!(
            result.unwrap_err(),
            MappingError::ValueOutOfRange {
                kind: DeviceKind::DotMatrix,
                value: 10,
                max: DOT_MATRIX_MAX,
            }
        );

        assert!(DeviceTarget::new(DeviceKind::Led, 255).validate().is_ok());
        assert!(DeviceTarget::new(DeviceKind::Led, 256).validate().is_err());
        assert!(DeviceTarget::new(DeviceKind::Fnd, 9999).validate().is_ok());
        assert!(DeviceTarget::new(DeviceKind::Fnd, 10000).validate().is_err());
        assert!(DeviceTarget::new(DeviceKind::TextLcd, u32::MAX).validate().is_ok());
        assert!(DeviceTarget::new(DeviceKind::Buzzer, u32::MAX).validate().is_ok());
    }

    #[test]
    fn test_duplicate_label_rejected() {
        let result = DeviceMapping::new(&[
            (ClassLabel::Dev2, DeviceTarget::new(DeviceKind::Led, 2)),
            (ClassLabel::Dev2, DeviceTarget::new(DeviceKind::Led, 3)),
        ]);
        assert_eq!(result.unwrap_err(), MappingError::DuplicateLabel(ClassLabel::Dev2));
    }
}
