//! Telemetry frame decoding.
//!
//! Revision A frame layout (9 bytes):
//!
//! ```text
//! +----------+---------+-----------+----------+------+-------+
//! | tempRaw  | tempSet | timeLeft  | heaterR  | duty | flags |
//! | LE16     | 1 byte  | LE16      | LE16     | 1 B  | 1 B   |
//! +----------+---------+-----------+----------+------+-------+
//! ```
//!
//! The flags byte packs eight independent booleans, one per bit, with bit
//! positions taken from the [`WireProfile`].

use crate::error::ProtocolError;
use crate::profile::{FlagBits, WireProfile};
use bytes::{Bytes, BytesMut};
use serde::{Deserialize, Serialize};

/// Device status booleans unpacked from the flags byte.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusFlags {
    pub heater_on: bool,
    pub light_on: bool,
    pub heater_fan_set: bool,
    pub heater_fan_on: bool,
    pub door_vent_fan_set: bool,
    pub door_vent_fan_on: bool,
    pub aux_fan_set: bool,
    pub aux_fan_on: bool,
}

impl StatusFlags {
    /// Unpacks a flags byte using the given bit-position table.
    pub fn unpack(byte: u8, bits: &FlagBits) -> Self {
        let bit = |pos: u8| byte & (1 << pos) != 0;
        Self {
            heater_on: bit(bits.heater_on),
            light_on: bit(bits.light_on),
            heater_fan_set: bit(bits.heater_fan_set),
            heater_fan_on: bit(bits.heater_fan_on),
            door_vent_fan_set: bit(bits.door_vent_fan_set),
            door_vent_fan_on: bit(bits.door_vent_fan_on),
            aux_fan_set: bit(bits.aux_fan_set),
            aux_fan_on: bit(bits.aux_fan_on),
        }
    }

    /// Packs the flags into a byte using the given bit-position table.
    /// Exact inverse of [`StatusFlags::unpack`].
    pub fn pack(&self, bits: &FlagBits) -> u8 {
        let mut byte = 0u8;
        let mut set = |on: bool, pos: u8| {
            if on {
                byte |= 1 << pos;
            }
        };
        set(self.heater_on, bits.heater_on);
        set(self.light_on, bits.light_on);
        set(self.heater_fan_set, bits.heater_fan_set);
        set(self.heater_fan_on, bits.heater_fan_on);
        set(self.door_vent_fan_set, bits.door_vent_fan_set);
        set(self.door_vent_fan_on, bits.door_vent_fan_on);
        set(self.aux_fan_set, bits.aux_fan_set);
        set(self.aux_fan_on, bits.aux_fan_on);
        byte
    }
}

/// One decoded telemetry snapshot from the controller.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct TelemetryFrame {
    /// Chamber temperature in degrees Celsius.
    pub temp_deg_c: f64,
    /// Chamber temperature set point in degrees Celsius.
    pub temp_set_deg_c: u8,
    /// Minutes left on the heater run timer.
    pub heater_time_left_mins: u16,
    /// Raw heater thermistor resistance reading in ohms.
    pub heater_resistance_ohms: u16,
    /// Heater duty cycle as a percentage, 0..100.
    pub heater_duty_cycle_pct: f64,
    /// Device status booleans.
    pub flags: StatusFlags,
}

impl TelemetryFrame {
    /// Decodes a telemetry frame from a byte buffer using the given wire
    /// profile.
    ///
    /// Fails with [`ProtocolError::ShortFrame`] when the buffer is shorter
    /// than the profile's frame length. Trailing bytes beyond the declared
    /// layout are ignored. Pure: a failed decode leaves nothing half-applied.
    pub fn decode(buf: &[u8], profile: &WireProfile) -> Result<Self, ProtocolError> {
        if buf.len() < profile.frame_len {
            return Err(ProtocolError::ShortFrame {
                len: buf.len(),
                expected: profile.frame_len,
            });
        }

        let le16 = |lo: usize, hi: usize| buf[lo] as u16 | (buf[hi] as u16) << 8;

        let temp_raw = match profile.temp_hi {
            Some(hi) => le16(profile.temp_lo, hi),
            None => buf[profile.temp_lo] as u16,
        };
        let temp_deg_c = temp_raw as f64 / profile.temp_factor + profile.temp_offset;

        let heater_duty_cycle_pct = match profile.duty_cycle {
            Some(off) => buf[off] as f64 / profile.duty_factor,
            None => 0.0,
        };

        Ok(Self {
            temp_deg_c,
            temp_set_deg_c: buf[profile.temp_set],
            heater_time_left_mins: le16(profile.heater_time_lo, profile.heater_time_hi),
            heater_resistance_ohms: le16(profile.heater_r_lo, profile.heater_r_hi),
            heater_duty_cycle_pct,
            flags: StatusFlags::unpack(buf[profile.flags], &profile.flag_bits),
        })
    }

    /// Encodes the frame back into its wire form.
    ///
    /// This is the controller's side of the contract, mirrored here for test
    /// rigs and simulators. Byte-exact inverse of [`TelemetryFrame::decode`]
    /// up to the scaling-factor quantization of the float fields.
    pub fn encode(&self, profile: &WireProfile) -> Result<Bytes, ProtocolError> {
        let temp_raw = (self.temp_deg_c - profile.temp_offset) * profile.temp_factor;
        let temp_max: u32 = if profile.temp_hi.is_some() {
            u16::MAX as u32
        } else {
            u8::MAX as u32
        };
        if !(0.0..=temp_max as f64).contains(&temp_raw.round()) {
            return Err(ProtocolError::ValueOutOfRange {
                field: "temp_deg_c",
                value: temp_raw.round().max(0.0) as u32,
                max: temp_max,
            });
        }
        let temp_raw = temp_raw.round() as u16;

        let mut buf = BytesMut::zeroed(profile.frame_len);
        buf[profile.temp_lo] = (temp_raw & 0xFF) as u8;
        if let Some(hi) = profile.temp_hi {
            buf[hi] = (temp_raw >> 8) as u8;
        }
        buf[profile.temp_set] = self.temp_set_deg_c;
        buf[profile.heater_time_lo] = (self.heater_time_left_mins & 0xFF) as u8;
        buf[profile.heater_time_hi] = (self.heater_time_left_mins >> 8) as u8;
        buf[profile.heater_r_lo] = (self.heater_resistance_ohms & 0xFF) as u8;
        buf[profile.heater_r_hi] = (self.heater_resistance_ohms >> 8) as u8;
        if let Some(off) = profile.duty_cycle {
            let duty_raw = (self.heater_duty_cycle_pct * profile.duty_factor).round();
            if !(0.0..=u8::MAX as f64).contains(&duty_raw) {
                return Err(ProtocolError::ValueOutOfRange {
                    field: "heater_duty_cycle_pct",
                    value: duty_raw.max(0.0) as u32,
                    max: u8::MAX as u32,
                });
            }
            buf[off] = duty_raw as u8;
        }
        buf[profile.flags] = self.flags.pack(&profile.flag_bits);

        debug_assert_eq!(buf.len(), profile.frame_len);
        Ok(buf.freeze())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::profile::{REV_A, REV_B};
    use proptest::prelude::*;

    /// Revision-A layout with round test constants: temp raw/10, duty raw/2.
    fn test_profile() -> WireProfile {
        WireProfile {
            temp_factor: 10.0,
            temp_offset: 0.0,
            duty_factor: 2.0,
            ..REV_A
        }
    }

    #[test]
    fn test_decode_scenario_frame() {
        let buf = [0x64, 0x00, 0x20, 0x05, 0x00, 0x10, 0x00, 0x32, 0x03];
        let frame = TelemetryFrame::decode(&buf, &test_profile()).unwrap();

        assert!((frame.temp_deg_c - 10.0).abs() < f64::EPSILON);
        assert_eq!(frame.temp_set_deg_c, 32);
        assert_eq!(frame.heater_time_left_mins, 5);
        assert_eq!(frame.heater_resistance_ohms, 16);
        assert!((frame.heater_duty_cycle_pct - 25.0).abs() < f64::EPSILON);
        assert!(frame.flags.heater_on);
        assert!(frame.flags.light_on);
        assert!(!frame.flags.heater_fan_set);
        assert!(!frame.flags.heater_fan_on);
        assert!(!frame.flags.door_vent_fan_set);
        assert!(!frame.flags.door_vent_fan_on);
        assert!(!frame.flags.aux_fan_set);
        assert!(!frame.flags.aux_fan_on);
    }

    #[test]
    fn test_decode_firmware_temp_scaling() {
        // Firmware packs (temp + 50) * 100; 25 degC -> 7500 -> [0x4C, 0x1D]
        let buf = [0x4C, 0x1D, 0x1E, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00];
        let frame = TelemetryFrame::decode(&buf, &REV_A).unwrap();
        assert!((frame.temp_deg_c - 25.0).abs() < 1e-9);
        assert_eq!(frame.temp_set_deg_c, 30);
    }

    #[test]
    fn test_flags_truth_table() {
        let flags = StatusFlags::unpack(0b1010_0101, &REV_A.flag_bits);
        assert!(flags.heater_on);
        assert!(!flags.light_on);
        assert!(flags.heater_fan_set);
        assert!(!flags.heater_fan_on);
        assert!(!flags.door_vent_fan_set);
        assert!(flags.door_vent_fan_on);
        assert!(!flags.aux_fan_set);
        assert!(flags.aux_fan_on);
    }

    #[test]
    fn test_flags_bit_swap_between_revisions() {
        // Bit 4 is doorVentFanSet in revision A but auxFanSet in revision B.
        let a = StatusFlags::unpack(1 << 4, &REV_A.flag_bits);
        let b = StatusFlags::unpack(1 << 4, &REV_B.flag_bits);
        assert!(a.door_vent_fan_set && !a.aux_fan_set);
        assert!(b.aux_fan_set && !b.door_vent_fan_set);
    }

    #[test]
    fn test_short_buffer_rejected() {
        for len in 0..REV_A.frame_len {
            let buf = vec![0u8; len];
            let err = TelemetryFrame::decode(&buf, &REV_A).unwrap_err();
            assert_eq!(
                err,
                ProtocolError::ShortFrame {
                    len,
                    expected: REV_A.frame_len
                }
            );
        }
    }

    #[test]
    fn test_trailing_bytes_ignored() {
        let mut buf = vec![0u8; REV_A.frame_len];
        buf[2] = 42;
        buf.extend_from_slice(&[0xFF; 4]);
        let frame = TelemetryFrame::decode(&buf, &REV_A).unwrap();
        assert_eq!(frame.temp_set_deg_c, 42);
    }

    #[test]
    fn test_decode_rev_b() {
        let buf = [28, 30, 0x02, 0x01, 0x10, 0x27, 0b0011_0000];
        let frame = TelemetryFrame::decode(&buf, &REV_B).unwrap();
        assert!((frame.temp_deg_c - 28.0).abs() < f64::EPSILON);
        assert_eq!(frame.temp_set_deg_c, 30);
        assert_eq!(frame.heater_time_left_mins, 258);
        assert_eq!(frame.heater_resistance_ohms, 10000);
        assert_eq!(frame.heater_duty_cycle_pct, 0.0);
        assert!(frame.flags.aux_fan_set);
        assert!(frame.flags.aux_fan_on);
        assert!(!frame.flags.door_vent_fan_set);
    }

    #[test]
    fn test_encode_rejects_out_of_range_temp() {
        let frame = TelemetryFrame {
            temp_deg_c: 10_000.0,
            ..Default::default()
        };
        let err = frame.encode(&REV_A).unwrap_err();
        assert!(matches!(
            err,
            ProtocolError::ValueOutOfRange {
                field: "temp_deg_c",
                ..
            }
        ));
    }

    proptest! {
        #[test]
        fn prop_rev_a_roundtrip(buf in proptest::collection::vec(any::<u8>(), 9)) {
            let frame = TelemetryFrame::decode(&buf, &REV_A).unwrap();
            let encoded = frame.encode(&REV_A).unwrap();
            prop_assert_eq!(&encoded[..], &buf[..]);
        }

        #[test]
        fn prop_flags_roundtrip(byte in any::<u8>()) {
            for bits in [&REV_A.flag_bits, &REV_B.flag_bits] {
                let flags = StatusFlags::unpack(byte, bits);
                prop_assert_eq!(flags.pack(bits), byte);
            }
        }

        #[test]
        fn prop_short_buffers_always_fail(buf in proptest::collection::vec(any::<u8>(), 0..9)) {
            prop_assert!(TelemetryFrame::decode(&buf, &REV_A).is_err());
        }
    }
}
