//! Fixed point compensation of raw ADC values, following the datasheet's 32 bit
//! (temperature, humidity) and 64 bit (pressure) integer formulas.
//!
//! Arithmetic wraps on overflow the same way the reference C code does on two's
//! complement targets, so any calibration set produces a clamped result rather than
//! a panic.

use log::debug;

use crate::calibration::CalibrationData;
use crate::data::{Measurement, RawSample};

/// 0.01 °C
const TEMPERATURE_MIN: i32 = -4000;
const TEMPERATURE_MAX: i32 = 8500;
/// 0.01 Pa
const PRESSURE_MIN: u32 = 3_000_000;
const PRESSURE_MAX: u32 = 11_000_000;
/// 0.001 %RH
const HUMIDITY_MAX: u32 = 100_000;
/// humidity in Q22.10 before the final scaling, 100 %RH * 1024 * 4096
const HUMIDITY_VAR_MAX: i32 = 419_430_400;

/// Fine resolution temperature produced by `temperature` and consumed by
/// `pressure` and `humidity` for the same sample.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FineTemperature(pub i32);

/// Compensate one raw sample. Temperature goes first, its fine temperature feeds
/// pressure and humidity.
pub fn compensate(calib: &CalibrationData, raw: &RawSample) -> Measurement {
    let (temperature, t_fine) = temperature(calib, raw.temperature);
    let pressure = pressure(calib, raw.pressure, t_fine);
    let humidity = humidity(calib, raw.humidity, t_fine);
    debug!("  compensated {:?} -> t_fine = {}, T = {}, P = {}, H = {}", raw, t_fine.0, temperature, pressure, humidity);

    Measurement { temperature, pressure, humidity }
}

/// temperature in °C, clamped to -40.00 ..= 85.00, plus the unclamped fine temperature
pub fn temperature(calib: &CalibrationData, raw: u32) -> (f64, FineTemperature) {
    let adc = raw as i32;
    let t1 = calib.t1 as i32;

    let var1 = (adc / 8 - t1 * 2).wrapping_mul(calib.t2 as i32) / 2048;
    let var2 = adc / 16 - t1;
    let var2 = (var2.wrapping_mul(var2) / 4096).wrapping_mul(calib.t3 as i32) / 16384;

    let t_fine = var1.wrapping_add(var2);
    let temp = t_fine.wrapping_mul(5).wrapping_add(128) / 256;

    let temp = temp.clamp(TEMPERATURE_MIN, TEMPERATURE_MAX);
    (temp as f64 / 100.0, FineTemperature(t_fine))
}

/// pressure in decapascal, clamped to 3000.00 ..= 11000.00
pub fn pressure(calib: &CalibrationData, raw: u32, t_fine: FineTemperature) -> f64 {
    let p1 = calib.p1 as i64;
    let p2 = calib.p2 as i64;
    let p3 = calib.p3 as i64;
    let p4 = calib.p4 as i64;
    let p5 = calib.p5 as i64;
    let p6 = calib.p6 as i64;
    let p7 = calib.p7 as i64;
    let p8 = calib.p8 as i64;
    let p9 = calib.p9 as i64;

    let var1 = t_fine.0 as i64 - 128_000;
    let var2 = var1.wrapping_mul(var1).wrapping_mul(p6);
    let var2 = var2.wrapping_add(var1.wrapping_mul(p5).wrapping_mul(131_072));
    let var2 = var2.wrapping_add(p4 * 34_359_738_368);
    let var1 = (var1.wrapping_mul(var1).wrapping_mul(p3) / 256)
        .wrapping_add(var1.wrapping_mul(p2).wrapping_mul(4096));
    let var1 = 140_737_488_355_328_i64.wrapping_add(var1).wrapping_mul(p1) / 8_589_934_592;

    if var1 == 0 {
        // avoid a division by zero
        return PRESSURE_MIN as f64 / 1000.0;
    }

    let p = 1_048_576 - raw as i64;
    let p = p
        .wrapping_mul(2_147_483_648)
        .wrapping_sub(var2)
        .wrapping_mul(3125)
        .wrapping_div(var1);
    let var1 = p9.wrapping_mul(p / 8192).wrapping_mul(p / 8192) / 33_554_432;
    let var2 = p8.wrapping_mul(p) / 524_288;
    let p = (p.wrapping_add(var1).wrapping_add(var2) / 256).wrapping_add(p7 * 16);

    // Q24.8 pascal to 0.01 Pa
    let pressure = ((p / 2) as u32).wrapping_mul(100) / 128;
    let pressure = pressure.clamp(PRESSURE_MIN, PRESSURE_MAX);
    pressure as f64 / 1000.0
}

/// relative humidity in percent, clamped to 0.000 ..= 100.000
pub fn humidity(calib: &CalibrationData, raw: u32, t_fine: FineTemperature) -> f64 {
    let var1 = t_fine.0.wrapping_sub(76_800);
    let var2 = raw.wrapping_mul(16_384) as i32;
    let var3 = (calib.h4 as i32).wrapping_mul(1_048_576);
    let var4 = (calib.h5 as i32).wrapping_mul(var1);
    let var5 = var2
        .wrapping_sub(var3)
        .wrapping_sub(var4)
        .wrapping_add(16_384)
        / 32_768;

    let var2 = var1.wrapping_mul(calib.h6 as i32) / 1024;
    let var3 = var1.wrapping_mul(calib.h3 as i32) / 2048;
    let var4 = (var2.wrapping_mul(var3.wrapping_add(32_768)) / 1024).wrapping_add(2_097_152);
    let var2 = var4.wrapping_mul(calib.h2 as i32).wrapping_add(8192) / 16_384;
    let var3 = var5.wrapping_mul(var2);
    let var4 = (var3 / 32_768).wrapping_mul(var3 / 32_768) / 128;
    let var5 = var3.wrapping_sub(var4.wrapping_mul(calib.h1 as i32) / 16);

    let var5 = var5.clamp(0, HUMIDITY_VAR_MAX);
    let humidity = ((var5 / 4096) as u32).min(HUMIDITY_MAX);
    humidity as f64 / 1000.0
}
