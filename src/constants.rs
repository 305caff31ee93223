// BME280 registers

pub const BME280_REG_CHIP_ID: u8 = 0xD0;  // Chip ID, expect value 0x60
pub const BME280_REG_RESET: u8 = 0xE0;  // soft reset, write BME280_SOFT_RESET
pub const BME280_REG_CALIB_00: u8 = 0x88;  // 26 bytes at 0x88 - 0xA1, T1..T3, P1..P9, (0xA0 unused), H1
pub const BME280_REG_CALIB_26: u8 = 0xE1;  // 7 bytes at 0xE1 - 0xE7, H2..H6
pub const BME280_REG_CTRL_HUM: u8 = 0xF2;  // humidity oversampling, bits 2..0
pub const BME280_REG_CTRL_MEAS: u8 = 0xF4;  // temperature / pressure oversampling and power mode bits
pub const BME280_REG_PWR_CTRL: u8 = BME280_REG_CTRL_MEAS;  // power mode lives in the low 2 bits of ctrl_meas
pub const BME280_REG_CONFIG: u8 = 0xF5;  // standby time, IIR filter, spi3w_en
pub const BME280_REG_DATA: u8 = 0xF7;  // 8 bytes at 0xF7 - 0xFE, press msb/lsb/xlsb, temp msb/lsb/xlsb, hum msb/lsb

pub const BME280_CALIB_00_LEN: usize = 26;
pub const BME280_CALIB_26_LEN: usize = 7;
pub const BME280_DATA_LEN: usize = 8;

pub const BME280_SOFT_RESET: u8 = 0xB6;
pub const BME280_CHIP_ID: u8 = 0x60;

/// identity poll attempts made by `init` before giving up
pub const BME280_CHIP_ID_ATTEMPTS: usize = 5;

/// milliseconds to wait after a soft reset
pub const BME280_RESET_DELAY_MS: u32 = 2;
/// milliseconds to wait after reading the calibration data
pub const BME280_CALIB_DELAY_MS: u32 = 1;

/// BME280 default I2C device address (SDO pulled high)
pub const BME280_I2C_ADDR: u8 = 0x77;
