//! FPGA peripherals and the commands that drive them
//!
//! Each peripheral is driven by a small test program that takes its value as
//! positional arguments. This module owns the argument layout for turning a
//! device on and off; resolving the executable path is left to the runtime.

use std::fmt;

/// Text written to the first line of the LCD on activation
pub const TEXT_LCD_GREETING: &str = "hello";

/// One of the controllable FPGA peripherals
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DeviceKind {
    DotMatrix,
    Led,
    TextLcd,
    Fnd,
    Buzzer,
}

impl DeviceKind {
    /// All device kinds, in board order
    pub const ALL: [DeviceKind; 5] = [
        DeviceKind::DotMatrix,
        DeviceKind::Led,
        DeviceKind::TextLcd,
        DeviceKind::Fnd,
        DeviceKind::Buzzer,
    ];

    /// Arguments that blank this device, or `None` if it has no off state.
    ///
    /// The buzzer is momentary and is never switched off explicitly.
    pub fn off_args(self) -> Option<Vec<String>> {
        match self {
            DeviceKind::DotMatrix | DeviceKind::Led | DeviceKind::Fnd => Some(vec!["0".into()]),
            DeviceKind::TextLcd => Some(vec![" ".into(), "0".into()]),
            DeviceKind::Buzzer => None,
        }
    }

    /// Arguments that show `value` on this device
    pub fn on_args(self, value: u32) -> Vec<String> {
        match self {
            DeviceKind::DotMatrix | DeviceKind::Led | DeviceKind::Fnd => vec![value.to_string()],
            DeviceKind::TextLcd => vec![TEXT_LCD_GREETING.into(), value.to_string()],
            DeviceKind::Buzzer => Vec::new(),
        }
    }
}

impl fmt::Display for DeviceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DeviceKind::DotMatrix => write!(f, "dot_matrix"),
            DeviceKind::Led => write!(f, "led"),
            DeviceKind::TextLcd => write!(f, "text_lcd"),
            DeviceKind::Fnd => write!(f, "fnd"),
            DeviceKind::Buzzer => write!(f, "buzzer"),
        }
    }
}

/// Whether a command turns a device on or off
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandAction {
    Activate,
    Deactivate,
}

/// A single invocation of a device's control program
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceCommand {
    pub kind: DeviceKind,
    pub action: CommandAction,
    /// Positional arguments, not including the program itself
    pub args: Vec<String>,
}

impl DeviceCommand {
    /// Build the command that shows `value` on `kind`
    pub fn activate(kind: DeviceKind, value: u32) -> Self {
        Self {
            kind,
            action: CommandAction::Activate,
            args: kind.on_args(value),
        }
    }

    /// Build the command that blanks `kind`, if it has one
    pub fn deactivate(kind: DeviceKind) -> Option<Self> {
        kind.off_args().map(|args| Self {
            kind,
            action: CommandAction::Deactivate,
            args,
        })
    }
}

/// Ordered commands produced by one dispatch cycle
pub type CommandSequence = Vec<DeviceCommand>;
