// ABOUTME: Low-level FIT byte assembly: header, definition and data records, CRC-16
// ABOUTME: Append-only; the header and trailing CRC are produced once when the body is finished
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.
// Copyright ©2025 Async-IO.org

use super::profile::FieldDef;

/// FIT encodes absent optional fields as the base type's invalid sentinel;
/// decoders report such fields as missing.
pub(crate) const INVALID_U8: u8 = 0xFF;
pub(crate) const INVALID_U16: u16 = 0xFFFF;
pub(crate) const INVALID_U32: u32 = 0xFFFF_FFFF;

const HEADER_SIZE: u8 = 14;
const PROTOCOL_VERSION: u8 = 0x10;
const PROFILE_VERSION: u16 = 2132;

/// CRC-16 used by the FIT container (nibble-table variant from the FIT
/// protocol document).
pub(crate) fn crc16(bytes: &[u8]) -> u16 {
    const TABLE: [u16; 16] = [
        0x0000, 0xCC01, 0xD801, 0x1401, 0xF001, 0x3C01, 0x2801, 0xE401,
        0xA001, 0x6C01, 0x7801, 0xB401, 0x5001, 0x9C01, 0x8801, 0x4401,
    ];
    let mut crc: u16 = 0;
    for &byte in bytes {
        for nibble in [byte & 0x0F, byte >> 4] {
            let tmp = TABLE[(crc & 0x0F) as usize];
            crc = (crc >> 4) & 0x0FFF;
            crc = crc ^ tmp ^ TABLE[nibble as usize];
        }
    }
    crc
}

/// Append-only assembler for the record body. Callers are responsible for
/// pushing data fields in exactly the order of the definition's field
/// table; the typed put helpers keep sizes honest.
#[derive(Debug, Default)]
pub(crate) struct FitWriter {
    body: Vec<u8>,
}

impl FitWriter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Write a definition record binding `local` to `global` with the
    /// given little-endian field table.
    pub fn write_definition(&mut self, local: u8, global: u16, fields: &[FieldDef]) {
        self.body.push(0x40 | (local & 0x0F));
        self.body.push(0); // reserved
        self.body.push(0); // architecture: little-endian
        self.body.extend_from_slice(&global.to_le_bytes());
        self.body.push(fields.len() as u8);
        for field in fields {
            self.body.push(field.num);
            self.body.push(field.size);
            self.body.push(field.base_type);
        }
    }

    /// Start a data record for the given local message type.
    pub fn data_header(&mut self, local: u8) {
        self.body.push(local & 0x0F);
    }

    pub fn put_u8(&mut self, value: u8) {
        self.body.push(value);
    }

    pub fn put_u16(&mut self, value: u16) {
        self.body.extend_from_slice(&value.to_le_bytes());
    }

    pub fn put_u32(&mut self, value: u32) {
        self.body.extend_from_slice(&value.to_le_bytes());
    }

    pub fn put_i32(&mut self, value: i32) {
        self.body.extend_from_slice(&value.to_le_bytes());
    }

    pub fn put_opt_u8(&mut self, value: Option<u8>) {
        self.put_u8(value.unwrap_or(INVALID_U8));
    }

    pub fn put_opt_u16(&mut self, value: Option<u16>) {
        self.put_u16(value.unwrap_or(INVALID_U16));
    }

    pub fn put_opt_u32(&mut self, value: Option<u32>) {
        self.put_u32(value.unwrap_or(INVALID_U32));
    }

    /// Produce the finished file: 14-byte header (with header CRC over its
    /// first 12 bytes), the record body, and the file CRC over everything
    /// preceding it.
    pub fn finish(self) -> Vec<u8> {
        let mut out = Vec::with_capacity(usize::from(HEADER_SIZE) + self.body.len() + 2);
        out.push(HEADER_SIZE);
        out.push(PROTOCOL_VERSION);
        out.extend_from_slice(&PROFILE_VERSION.to_le_bytes());
        out.extend_from_slice(&(self.body.len() as u32).to_le_bytes());
        out.extend_from_slice(b".FIT");
        let header_crc = crc16(&out[..12]);
        out.extend_from_slice(&header_crc.to_le_bytes());
        out.extend_from_slice(&self.body);
        let file_crc = crc16(&out);
        out.extend_from_slice(&file_crc.to_le_bytes());
        out
    }
}
