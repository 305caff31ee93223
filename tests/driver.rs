use std::collections::VecDeque;

use bme280_ya::bus::RegisterBus;
use bme280_ya::data::{Filter, Measurement, Mode, Oversampling, Settings, StandbyTime};
use bme280_ya::error::Error;
use bme280_ya::Bme280;
use embedded_hal::delay::DelayNs;

const CALIB_00: [u8; 26] = [
    0x70, 0x6B, 0x43, 0x67, 0x18, 0xFC, 0x7D, 0x8E, 0x43, 0xD6, 0xD0, 0x0B, 0x27, 0x0B,
    0x8C, 0x00, 0xF9, 0xFF, 0x8C, 0x3C, 0xF8, 0xC6, 0x70, 0x17, 0x00, 0x4B,
];
const CALIB_26: [u8; 7] = [0x6A, 0x01, 0x00, 0x13, 0x29, 0x03, 0x1E];
// raw P = 415148, T = 519888, H = 27212
const DATA: [u8; 8] = [0x65, 0x5A, 0xC0, 0x7E, 0xED, 0x00, 0x6A, 0x4C];

const ALL_X16: Settings = Settings::builder()
    .filter(Filter::Off)
    .standby(StandbyTime::Ms1000)
    .temperature_oversampling(Oversampling::X16)
    .pressure_oversampling(Oversampling::X16)
    .humidity_oversampling(Oversampling::X16)
    .build();

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct FakeBusError;

/// Register file behaving like a BME280: soft reset clears the settings registers
/// and a forced measurement finishes right away.
struct FakeSensor {
    regs: [u8; 256],
    /// answers for the next chip ID reads, the register value is used once empty
    chip_id_script: VecDeque<Result<u8, FakeBusError>>,
    fail_writes_to: Option<u8>,
    reads: usize,
    writes: Vec<(u8, u8)>,
}

impl FakeSensor {
    fn new() -> Self {
        let mut regs = [0u8; 256];
        regs[0xD0] = 0x60;
        regs[0x88..0x88 + 26].copy_from_slice(&CALIB_00);
        regs[0xE1..0xE1 + 7].copy_from_slice(&CALIB_26);
        regs[0xF7..0xF7 + 8].copy_from_slice(&DATA);
        Self {
            regs,
            chip_id_script: VecDeque::new(),
            fail_writes_to: None,
            reads: 0,
            writes: Vec::new(),
        }
    }

    fn with_chip_ids(mut self, script: &[Result<u8, FakeBusError>]) -> Self {
        self.chip_id_script.extend(script.iter().copied());
        self
    }

    fn written_to(&self, reg: u8) -> Vec<u8> {
        self.writes
            .iter()
            .filter(|(r, _)| *r == reg)
            .map(|(_, v)| *v)
            .collect()
    }
}

impl RegisterBus for FakeSensor {
    type Error = FakeBusError;

    fn read_register(&mut self, reg: u8, buffer: &mut [u8]) -> Result<(), Self::Error> {
        self.reads += 1;
        if reg == 0xD0 {
            if let Some(answer) = self.chip_id_script.pop_front() {
                buffer[0] = answer?;
                return Ok(());
            }
        }
        for (offset, byte) in buffer.iter_mut().enumerate() {
            *byte = self.regs[reg.wrapping_add(offset as u8) as usize];
        }
        Ok(())
    }

    fn write_register(&mut self, reg: u8, data: &[u8]) -> Result<(), Self::Error> {
        for (offset, value) in data.iter().enumerate() {
            let reg = reg.wrapping_add(offset as u8);
            if self.fail_writes_to == Some(reg) {
                return Err(FakeBusError);
            }
            self.writes.push((reg, *value));
            match (reg, *value) {
                (0xE0, 0xB6) => {
                    self.regs[0xF2] = 0;
                    self.regs[0xF4] = 0;
                    self.regs[0xF5] = 0;
                }
                // forced conversion done, back to sleep
                (0xF4, v) if matches!(v & 0x03, 0x01 | 0x02) => self.regs[0xF4] = v & !0x03,
                (r, v) => self.regs[r as usize] = v,
            }
        }
        Ok(())
    }
}

#[derive(Default)]
struct RecordingDelay {
    ms: Vec<u32>,
}

impl DelayNs for RecordingDelay {
    fn delay_ns(&mut self, ns: u32) {
        self.ms.push(ns / 1_000_000);
    }

    fn delay_ms(&mut self, ms: u32) {
        self.ms.push(ms);
    }
}

fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

#[test]
fn forced_read_end_to_end() {
    init_logger();
    let mut fake = FakeSensor::new();
    let mut delay = RecordingDelay::default();
    {
        let mut sensor = Bme280::new(&mut fake, &mut delay);
        sensor.init_with(Mode::Forced, ALL_X16).unwrap();
        assert_eq!(sensor.mode(), Mode::Forced);

        let m = sensor.read().unwrap();
        assert_eq!(m, Measurement { temperature: 25.08, pressure: 10065.328, humidity: 40.403 });
        assert_eq!(sensor.get_settings().unwrap(), ALL_X16);
    }
    // reset, calibration, then the forced measurement wait of ceil(112.8 ms)
    assert_eq!(delay.ms, vec![2, 1, 113]);
    assert_eq!(fake.written_to(0xE0), vec![0xB6]);
    // set_mode(Forced) then the forced measurement in read
    assert_eq!(fake.written_to(0xF4).last(), Some(&0b101_101_01));
    assert_eq!(fake.regs[0xF2] & 0x07, 0b101);
    assert_eq!(fake.regs[0xF5], 0b101_000_00);
}

#[test]
fn every_forced_read_triggers_a_measurement() {
    init_logger();
    let mut fake = FakeSensor::new();
    let mut delay = RecordingDelay::default();
    {
        let mut sensor = Bme280::new(&mut fake, &mut delay);
        sensor.init_with(Mode::Forced, Settings::default()).unwrap();
        sensor.read().unwrap();
        sensor.read().unwrap();
    }
    // all x1: 9.3 ms
    assert_eq!(delay.ms, vec![2, 1, 10, 10]);
}

#[test]
fn normal_mode_read_does_not_write() {
    init_logger();
    let mut fake = FakeSensor::new();
    let mut delay = RecordingDelay::default();
    {
        let mut sensor = Bme280::new(&mut fake, &mut delay);
        sensor.init_with(Mode::Normal, ALL_X16).unwrap();
        assert_eq!(sensor.get_mode().unwrap(), Mode::Normal);

        let m = sensor.read().unwrap();
        assert_eq!(m.temperature, 25.08);
    }
    // soft reset, ctrl_hum, ctrl_meas, config, then the mode change
    assert_eq!(fake.writes.len(), 5);
    assert_eq!(fake.writes.last(), Some(&(0xF4, 0b101_101_11)));
    assert_eq!(delay.ms, vec![2, 1]);
}

#[test]
fn init_succeeds_on_fifth_attempt() {
    init_logger();
    let mut fake = FakeSensor::new().with_chip_ids(&[
        Ok(0x00),
        Err(FakeBusError),
        Ok(0x58),
        Err(FakeBusError),
        Ok(0x60),
    ]);
    let mut sensor = Bme280::new(&mut fake, RecordingDelay::default());
    sensor.init().unwrap();
    assert!(sensor.is_initialized());
    assert_eq!(sensor.calibration().map(|c| (c.h4, c.h5)), Some((313, 50)));
}

#[test]
fn init_fails_when_chip_id_never_matches() {
    init_logger();
    let mut fake = FakeSensor::new();
    fake.regs[0xD0] = 0x58;
    {
        let mut sensor = Bme280::new(&mut fake, RecordingDelay::default());
        assert_eq!(sensor.init(), Err(Error::IdentityMismatch(0x58)));
        assert!(!sensor.is_initialized());
        assert_eq!(sensor.read(), Err(Error::Uninitialized));
    }
    assert_eq!(fake.reads, 5);
    assert!(fake.writes.is_empty());
}

#[test]
fn init_reports_bus_error_when_last_attempt_fails() {
    init_logger();
    let mut fake = FakeSensor::new().with_chip_ids(&[
        Ok(0x58),
        Ok(0x58),
        Ok(0x58),
        Ok(0x58),
        Err(FakeBusError),
    ]);
    let mut sensor = Bme280::new(&mut fake, RecordingDelay::default());
    assert_eq!(sensor.init(), Err(Error::Bus(FakeBusError)));
    assert!(!sensor.is_initialized());
}

#[test]
fn failed_reinit_clears_initialization() {
    init_logger();
    let mut fake = FakeSensor::new().with_chip_ids(&[Ok(0x60), Ok(0x00), Ok(0x00), Ok(0x00), Ok(0x00), Ok(0x00)]);
    let mut sensor = Bme280::new(&mut fake, RecordingDelay::default());
    sensor.init().unwrap();
    assert!(sensor.is_initialized());

    assert_eq!(sensor.init(), Err(Error::IdentityMismatch(0x00)));
    assert!(sensor.calibration().is_none());
    assert_eq!(sensor.read(), Err(Error::Uninitialized));
}

#[test]
fn read_before_init_touches_nothing() {
    init_logger();
    let mut fake = FakeSensor::new();
    {
        let mut sensor = Bme280::new(&mut fake, RecordingDelay::default());
        assert_eq!(sensor.read(), Err(Error::Uninitialized));
    }
    assert_eq!(fake.reads, 0);
    assert!(fake.writes.is_empty());
}

#[test]
fn force_measurement_refused_in_normal_mode() {
    init_logger();
    let mut fake = FakeSensor::new();
    fake.regs[0xF4] = 0b001_001_11;
    {
        let mut sensor = Bme280::new(&mut fake, RecordingDelay::default());
        assert_eq!(sensor.force_measurement(), Err(Error::InvalidState));
    }
    assert!(fake.writes.is_empty());
    assert_eq!(fake.regs[0xF4], 0b001_001_11);
}

#[test]
fn set_settings_from_normal_mode_resets_and_leaves_sensor_sleeping() {
    init_logger();
    let mut fake = FakeSensor::new();
    fake.regs[0xF2] = 0b001;
    fake.regs[0xF4] = 0b001_001_11;
    fake.regs[0xF5] = 0b000_100_00;
    {
        let mut sensor = Bme280::new(&mut fake, RecordingDelay::default());
        sensor.set_settings(ALL_X16).unwrap();
        assert_eq!(sensor.get_mode().unwrap(), Mode::Sleep);
        assert_eq!(sensor.get_settings().unwrap(), ALL_X16);
    }
    assert_eq!(fake.written_to(0xE0), vec![0xB6]);
}

#[test]
fn set_settings_while_sleeping_skips_reset() {
    init_logger();
    let mut fake = FakeSensor::new();
    {
        let mut sensor = Bme280::new(&mut fake, RecordingDelay::default());
        sensor.set_settings(ALL_X16).unwrap();
    }
    assert!(fake.written_to(0xE0).is_empty());
    // humidity goes first, ctrl_meas latches it
    let order: Vec<u8> = fake.writes.iter().map(|(r, _)| *r).collect();
    assert_eq!(order, vec![0xF2, 0xF4, 0xF5]);
}

#[test]
fn set_settings_keeps_reserved_bits() {
    init_logger();
    let mut fake = FakeSensor::new();
    fake.regs[0xF2] = 0b1010_1000;
    fake.regs[0xF5] = 0b000_000_01;
    {
        let mut sensor = Bme280::new(&mut fake, RecordingDelay::default());
        sensor.set_settings(ALL_X16).unwrap();
    }
    assert_eq!(fake.regs[0xF2], 0b1010_1101);
    assert_eq!(fake.regs[0xF5], 0b101_000_01);
}

#[test]
fn sleep_keeps_settings() {
    init_logger();
    let mut fake = FakeSensor::new();
    {
        let mut sensor = Bme280::new(&mut fake, RecordingDelay::default());
        sensor.init_with(Mode::Normal, ALL_X16).unwrap();
        assert_eq!(sensor.get_mode().unwrap(), Mode::Normal);

        sensor.sleep().unwrap();
        assert_eq!(sensor.mode(), Mode::Sleep);
        assert_eq!(sensor.get_mode().unwrap(), Mode::Sleep);
        assert_eq!(sensor.get_settings().unwrap(), ALL_X16);
    }
    // once in init, once in sleep
    assert_eq!(fake.written_to(0xE0), vec![0xB6, 0xB6]);
}

#[test]
fn set_mode_goes_through_sleep() {
    init_logger();
    let mut fake = FakeSensor::new();
    fake.regs[0xF4] = 0b010_010_11;
    {
        let mut sensor = Bme280::new(&mut fake, RecordingDelay::default());
        sensor.set_mode(Mode::Normal).unwrap();
        assert_eq!(sensor.get_mode().unwrap(), Mode::Normal);
    }
    assert_eq!(fake.written_to(0xE0), vec![0xB6]);
    assert_eq!(fake.regs[0xF4], 0b010_010_11);
}

#[test]
fn set_mode_propagates_write_error() {
    init_logger();
    let mut fake = FakeSensor::new();
    fake.fail_writes_to = Some(0xF4);
    let mut sensor = Bme280::new(&mut fake, RecordingDelay::default());
    assert_eq!(sensor.set_mode(Mode::Normal), Err(Error::Bus(FakeBusError)));
    assert_eq!(sensor.mode(), Mode::Sleep);
}
