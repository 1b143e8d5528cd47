//! Wire profiles: byte offsets, flag bit positions, and scaling constants
//! for each supported firmware revision.
//!
//! The decode path is parameterized by these tables rather than hard-coding
//! offsets, so a firmware layout change is a new constant here and nothing
//! else.

/// Bit position of each status flag within the flags byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FlagBits {
    pub heater_on: u8,
    pub light_on: u8,
    pub heater_fan_set: u8,
    pub heater_fan_on: u8,
    pub door_vent_fan_set: u8,
    pub door_vent_fan_on: u8,
    pub aux_fan_set: u8,
    pub aux_fan_on: u8,
}

/// Byte layout and scaling constants of one telemetry frame revision.
///
/// Multi-byte fields are little-endian. `temp_hi` is `None` when the
/// revision carries the chamber temperature as a single raw byte, and
/// `duty_cycle` is `None` when the revision has no duty-cycle field.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WireProfile {
    /// Total frame length in bytes. Shorter buffers are rejected.
    pub frame_len: usize,

    pub temp_lo: usize,
    pub temp_hi: Option<usize>,
    pub temp_set: usize,
    pub heater_time_lo: usize,
    pub heater_time_hi: usize,
    pub heater_r_lo: usize,
    pub heater_r_hi: usize,
    pub duty_cycle: Option<usize>,
    pub flags: usize,

    /// Chamber temperature decodes as `raw / temp_factor + temp_offset`.
    /// These constants are part of the firmware contract and must match the
    /// device bit-for-bit.
    pub temp_factor: f64,
    pub temp_offset: f64,

    /// Heater duty cycle decodes as `raw_byte / duty_factor`, yielding a
    /// percentage in 0..100.
    pub duty_factor: f64,

    pub flag_bits: FlagBits,
}

/// Revision A: the 9-byte frame emitted by the shipped controller firmware.
///
/// The firmware packs the chamber temperature as `(temp + 50) * 100` into a
/// little-endian u16 and the duty cycle as `fraction * 255` into one byte.
pub const REV_A: WireProfile = WireProfile {
    frame_len: 9,
    temp_lo: 0,
    temp_hi: Some(1),
    temp_set: 2,
    heater_time_lo: 3,
    heater_time_hi: 4,
    heater_r_lo: 5,
    heater_r_hi: 6,
    duty_cycle: Some(7),
    flags: 8,
    temp_factor: 100.0,
    temp_offset: -50.0,
    duty_factor: 2.55,
    flag_bits: FlagBits {
        heater_on: 0,
        light_on: 1,
        heater_fan_set: 2,
        heater_fan_on: 3,
        door_vent_fan_set: 4,
        door_vent_fan_on: 5,
        aux_fan_set: 6,
        aux_fan_on: 7,
    },
};

/// Revision B: legacy 7-byte frame from pre-release firmware. Single-byte
/// raw temperature, no duty-cycle field, and the door-vent/aux fan bit pairs
/// swapped relative to revision A. Kept for bench units that were never
/// reflashed.
pub const REV_B: WireProfile = WireProfile {
    frame_len: 7,
    temp_lo: 0,
    temp_hi: None,
    temp_set: 1,
    heater_time_lo: 2,
    heater_time_hi: 3,
    heater_r_lo: 4,
    heater_r_hi: 5,
    duty_cycle: None,
    flags: 6,
    temp_factor: 1.0,
    temp_offset: 0.0,
    duty_factor: 1.0,
    flag_bits: FlagBits {
        heater_on: 0,
        light_on: 1,
        heater_fan_set: 2,
        heater_fan_on: 3,
        door_vent_fan_set: 6,
        door_vent_fan_on: 7,
        aux_fan_set: 4,
        aux_fan_on: 5,
    },
};
