//! Control command encoding.
//!
//! Each command goes out as one opcode byte from a closed set, followed by a
//! fixed-width payload in the same endianness the telemetry decoder uses.

use crate::error::ProtocolError;
use bytes::{BufMut, Bytes, BytesMut};

/// Request opcode for setting the chamber temperature set point.
pub const OP_SET_TEMP: u8 = 0xA1;
/// Request opcode for setting the heater run timer.
pub const OP_SET_HEATER_TIME_LEFT: u8 = 0xA2;
/// Request opcode for switching the chamber light.
pub const OP_SET_LIGHT: u8 = 0xA3;
/// Request opcode for switching the heater fan.
pub const OP_SET_HEATER_FAN: u8 = 0xA4;
/// Request opcode for switching the door vent fan.
pub const OP_SET_DOOR_VENT_FAN: u8 = 0xA5;
/// Request opcode for switching the auxiliary fan.
pub const OP_SET_AUX_FAN: u8 = 0xA6;

/// A control command addressed to the controller.
///
/// Numeric variants carry a wider type than their wire field so that
/// out-of-range values surface as [`ProtocolError::ValueOutOfRange`] at
/// encode time instead of being silently truncated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// Set the chamber temperature set point in degrees Celsius (1 byte).
    SetTemperature(u16),
    /// Set the heater run timer in minutes (little-endian u16).
    SetHeaterTimeLeft(u32),
    /// Switch the chamber light.
    SetLight(bool),
    /// Switch the heater fan.
    SetHeaterFan(bool),
    /// Switch the door vent fan.
    SetDoorVentFan(bool),
    /// Switch the auxiliary fan.
    SetAuxFan(bool),
}

impl Command {
    /// Returns the wire opcode for this command.
    pub fn opcode(&self) -> u8 {
        match self {
            Command::SetTemperature(_) => OP_SET_TEMP,
            Command::SetHeaterTimeLeft(_) => OP_SET_HEATER_TIME_LEFT,
            Command::SetLight(_) => OP_SET_LIGHT,
            Command::SetHeaterFan(_) => OP_SET_HEATER_FAN,
            Command::SetDoorVentFan(_) => OP_SET_DOOR_VENT_FAN,
            Command::SetAuxFan(_) => OP_SET_AUX_FAN,
        }
    }

    /// Encodes the command into its fixed-size wire buffer.
    ///
    /// Boolean commands never fail. Numeric commands fail with
    /// [`ProtocolError::ValueOutOfRange`] when the value does not fit the
    /// declared field width.
    pub fn encode(&self) -> Result<Bytes, ProtocolError> {
        let mut buf = BytesMut::with_capacity(3);
        buf.put_u8(self.opcode());

        match *self {
            Command::SetTemperature(deg_c) => {
                let deg_c = u8::try_from(deg_c).map_err(|_| ProtocolError::ValueOutOfRange {
                    field: "temp_set_deg_c",
                    value: deg_c as u32,
                    max: u8::MAX as u32,
                })?;
                buf.put_u8(deg_c);
            }
            Command::SetHeaterTimeLeft(mins) => {
                let mins = u16::try_from(mins).map_err(|_| ProtocolError::ValueOutOfRange {
                    field: "heater_time_left_mins",
                    value: mins,
                    max: u16::MAX as u32,
                })?;
                buf.put_u16_le(mins);
            }
            Command::SetLight(on)
            | Command::SetHeaterFan(on)
            | Command::SetDoorVentFan(on)
            | Command::SetAuxFan(on) => {
                buf.put_u8(on as u8);
            }
        }

        Ok(buf.freeze())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_set_temperature_encoding() {
        let bytes = Command::SetTemperature(32).encode().unwrap();
        assert_eq!(&bytes[..], &[OP_SET_TEMP, 32]);
    }

    #[test]
    fn test_set_temperature_out_of_range() {
        let err = Command::SetTemperature(256).encode().unwrap_err();
        assert_eq!(
            err,
            ProtocolError::ValueOutOfRange {
                field: "temp_set_deg_c",
                value: 256,
                max: 255,
            }
        );
    }

    #[test]
    fn test_set_heater_time_little_endian() {
        let bytes = Command::SetHeaterTimeLeft(0x0102).encode().unwrap();
        assert_eq!(&bytes[..], &[OP_SET_HEATER_TIME_LEFT, 0x02, 0x01]);
    }

    #[test]
    fn test_set_heater_time_out_of_range() {
        let err = Command::SetHeaterTimeLeft(70_000).encode().unwrap_err();
        assert!(matches!(err, ProtocolError::ValueOutOfRange { max: 65535, .. }));
    }

    #[test]
    fn test_switch_commands() {
        let cases = [
            (Command::SetLight(true), OP_SET_LIGHT, 1),
            (Command::SetLight(false), OP_SET_LIGHT, 0),
            (Command::SetHeaterFan(true), OP_SET_HEATER_FAN, 1),
            (Command::SetDoorVentFan(false), OP_SET_DOOR_VENT_FAN, 0),
            (Command::SetAuxFan(true), OP_SET_AUX_FAN, 1),
        ];
        for (cmd, opcode, payload) in cases {
            let bytes = cmd.encode().unwrap();
            assert_eq!(&bytes[..], &[opcode, payload]);
        }
    }

    #[test]
    fn test_opcodes_are_distinct() {
        let ops = [
            OP_SET_TEMP,
            OP_SET_HEATER_TIME_LEFT,
            OP_SET_LIGHT,
            OP_SET_HEATER_FAN,
            OP_SET_DOOR_VENT_FAN,
            OP_SET_AUX_FAN,
        ];
        for (i, a) in ops.iter().enumerate() {
            for b in &ops[i + 1..] {
                assert_ne!(a, b);
            }
        }
    }

    proptest! {
        #[test]
        fn prop_in_range_temperatures_encode(deg_c in 0u16..=255) {
            let bytes = Command::SetTemperature(deg_c).encode().unwrap();
            prop_assert_eq!(bytes.len(), 2);
            prop_assert_eq!(bytes[1] as u16, deg_c);
        }

        #[test]
        fn prop_in_range_timers_encode(mins in 0u32..=65535) {
            let bytes = Command::SetHeaterTimeLeft(mins).encode().unwrap();
            prop_assert_eq!(bytes.len(), 3);
            prop_assert_eq!(bytes[1] as u32 | (bytes[2] as u32) << 8, mins);
        }
    }
}
