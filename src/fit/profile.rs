// ABOUTME: FIT profile subset used by the encoder: base types, message numbers, field tables
// ABOUTME: Field tables drive both the definition records and the data-record layout
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.
// Copyright ©2025 Async-IO.org

/// FIT base type identifiers (with the endian-ability bit where the
/// on-wire type carries one).
pub(crate) mod base_type {
    pub const ENUM: u8 = 0x00;
    pub const UINT8: u8 = 0x02;
    pub const SINT32: u8 = 0x85;
    pub const UINT16: u8 = 0x84;
    pub const UINT32: u8 = 0x86;
    pub const UINT32Z: u8 = 0x8C;
}

/// Global message numbers
pub(crate) mod mesg_num {
    pub const FILE_ID: u16 = 0;
    pub const SESSION: u16 = 18;
    pub const LAP: u16 = 19;
    pub const RECORD: u16 = 20;
    pub const EVENT: u16 = 21;
}

/// Local message type assignments, stable for the whole file
pub(crate) mod local {
    pub const FILE_ID: u8 = 0;
    pub const EVENT: u8 = 1;
    pub const RECORD: u8 = 2;
    pub const LAP: u8 = 3;
    pub const SESSION: u8 = 4;
}

/// One field in a definition record
#[derive(Debug, Clone, Copy)]
pub(crate) struct FieldDef {
    /// Field definition number from the FIT profile
    pub num: u8,
    /// On-wire size in bytes
    pub size: u8,
    /// Base type identifier
    pub base_type: u8,
}

use base_type::{ENUM, SINT32, UINT16, UINT32, UINT32Z, UINT8};

pub(crate) const FILE_ID_FIELDS: &[FieldDef] = &[
    FieldDef { num: 0, size: 1, base_type: ENUM },      // type
    FieldDef { num: 1, size: 2, base_type: UINT16 },    // manufacturer
    FieldDef { num: 2, size: 2, base_type: UINT16 },    // product
    FieldDef { num: 3, size: 4, base_type: UINT32Z },   // serial_number
    FieldDef { num: 4, size: 4, base_type: UINT32 },    // time_created
];

pub(crate) const EVENT_FIELDS: &[FieldDef] = &[
    FieldDef { num: 253, size: 4, base_type: UINT32 },  // timestamp
    FieldDef { num: 0, size: 1, base_type: ENUM },      // event
    FieldDef { num: 1, size: 1, base_type: ENUM },      // event_type
];

pub(crate) const RECORD_FIELDS: &[FieldDef] = &[
    FieldDef { num: 253, size: 4, base_type: UINT32 },  // timestamp
    FieldDef { num: 0, size: 4, base_type: SINT32 },    // position_lat
    FieldDef { num: 1, size: 4, base_type: SINT32 },    // position_long
    FieldDef { num: 5, size: 4, base_type: UINT32 },    // distance, m * 100
    FieldDef { num: 2, size: 2, base_type: UINT16 },    // altitude, (m + 500) * 5
    FieldDef { num: 78, size: 4, base_type: UINT32 },   // enhanced_altitude
    FieldDef { num: 3, size: 1, base_type: UINT8 },     // heart_rate, bpm
    FieldDef { num: 4, size: 1, base_type: UINT8 },     // cadence, rpm
    FieldDef { num: 7, size: 2, base_type: UINT16 },    // power, W
    FieldDef { num: 6, size: 2, base_type: UINT16 },    // speed, m/s * 1000
    FieldDef { num: 73, size: 4, base_type: UINT32 },   // enhanced_speed
];

pub(crate) const LAP_FIELDS: &[FieldDef] = &[
    FieldDef { num: 253, size: 4, base_type: UINT32 },  // timestamp
    FieldDef { num: 2, size: 4, base_type: UINT32 },    // start_time
    FieldDef { num: 7, size: 4, base_type: UINT32 },    // total_elapsed_time, s * 1000
    FieldDef { num: 8, size: 4, base_type: UINT32 },    // total_timer_time, s * 1000
    FieldDef { num: 9, size: 4, base_type: UINT32 },    // total_distance, m * 100
    FieldDef { num: 14, size: 2, base_type: UINT16 },   // max_speed, m/s * 1000
    FieldDef { num: 21, size: 2, base_type: UINT16 },   // total_ascent, m
];

pub(crate) const SESSION_FIELDS: &[FieldDef] = &[
    FieldDef { num: 253, size: 4, base_type: UINT32 },  // timestamp
    FieldDef { num: 2, size: 4, base_type: UINT32 },    // start_time
    FieldDef { num: 7, size: 4, base_type: UINT32 },    // total_elapsed_time, s * 1000
    FieldDef { num: 8, size: 4, base_type: UINT32 },    // total_timer_time, s * 1000
    FieldDef { num: 9, size: 4, base_type: UINT32 },    // total_distance, m * 100
    FieldDef { num: 15, size: 2, base_type: UINT16 },   // max_speed, m/s * 1000
    FieldDef { num: 22, size: 2, base_type: UINT16 },   // total_ascent, m
    FieldDef { num: 5, size: 1, base_type: ENUM },      // sport
    FieldDef { num: 25, size: 2, base_type: UINT16 },   // first_lap_index
    FieldDef { num: 26, size: 2, base_type: UINT16 },   // num_laps
];

/// Human-readable name for the message kinds this encoder emits
#[must_use]
pub fn mesg_name(global: u16) -> &'static str {
    match global {
        mesg_num::FILE_ID => "file_id",
        mesg_num::SESSION => "session",
        mesg_num::LAP => "lap",
        mesg_num::RECORD => "record",
        mesg_num::EVENT => "event",
        _ => "unknown",
    }
}
