use log::debug;

use crate::bus::RegisterBus;
use crate::constants::{BME280_CALIB_00_LEN, BME280_CALIB_26_LEN, BME280_REG_CALIB_00, BME280_REG_CALIB_26};
use crate::error::Error;

/// Factory calibration coefficients read from the sensor NVM
#[derive(Debug, PartialEq, Eq, Clone, Copy, Default)]
pub struct CalibrationData {
    pub t1: u16,  // 0x88..0x89
    pub t2: i16,  // 0x8A..0x8B
    pub t3: i16,  // 0x8C..0x8D
    pub p1: u16,  // 0x8E..0x8F
    pub p2: i16,  // 0x90..0x91
    pub p3: i16,  // 0x92..0x93
    pub p4: i16,  // 0x94..0x95
    pub p5: i16,  // 0x96..0x97
    pub p6: i16,  // 0x98..0x99
    pub p7: i16,  // 0x9A..0x9B
    pub p8: i16,  // 0x9C..0x9D
    pub p9: i16,  // 0x9E..0x9F
    pub h1: u8,   // 0xA1
    pub h2: i16,  // 0xE1..0xE2
    pub h3: u8,   // 0xE3
    pub h4: i16,  // 0xE4 [11:4], 0xE5 [3:0]
    pub h5: i16,  // 0xE6 [11:4] signed, 0xE5 [7:4]
    pub h6: i8,   // 0xE7
}

impl CalibrationData {
    /// Read both calibration blocks and decode them. A failed read is returned as is,
    /// retrying is up to `init`.
    pub fn load<B: RegisterBus>(bus: &mut B) -> Result<Self, Error<B::Error>> {
        debug!("in CalibrationData::load()");
        let mut temp_press_buf: [u8; BME280_CALIB_00_LEN] = [0; BME280_CALIB_00_LEN];
        bus.read_register(BME280_REG_CALIB_00, &mut temp_press_buf)
            .map_err(Error::Bus)?;
        let mut hum_buf: [u8; BME280_CALIB_26_LEN] = [0; BME280_CALIB_26_LEN];
        bus.read_register(BME280_REG_CALIB_26, &mut hum_buf)
            .map_err(Error::Bus)?;

        let calibration = Self::from_registers(&temp_press_buf, &hum_buf);
        debug!("  calibration = {:?}", calibration);
        Ok(calibration)
    }

    /// decode the 26 bytes at 0x88 and the 7 bytes at 0xE1
    pub fn from_registers(
        temp_press: &[u8; BME280_CALIB_00_LEN],
        hum: &[u8; BME280_CALIB_26_LEN],
    ) -> Self {
        let word = |i: usize| [temp_press[i], temp_press[i + 1]];
        CalibrationData {
            t1: u16::from_le_bytes(word(0)),
            t2: i16::from_le_bytes(word(2)),
            t3: i16::from_le_bytes(word(4)),
            p1: u16::from_le_bytes(word(6)),
            p2: i16::from_le_bytes(word(8)),
            p3: i16::from_le_bytes(word(10)),
            p4: i16::from_le_bytes(word(12)),
            p5: i16::from_le_bytes(word(14)),
            p6: i16::from_le_bytes(word(16)),
            p7: i16::from_le_bytes(word(18)),
            p8: i16::from_le_bytes(word(20)),
            p9: i16::from_le_bytes(word(22)),
            // byte 24 (0xA0) is not used
            h1: temp_press[25],
            h2: i16::from_le_bytes([hum[0], hum[1]]),
            h3: hum[2],
            // 12 bit values sharing the nibbles of 0xE5
            h4: (hum[3] as i16) * 16 | (hum[4] & 0x0F) as i16,
            h5: (hum[5] as i8 as i16) * 16 | (hum[4] >> 4) as i16,
            h6: hum[6] as i8,
        }
    }
}
