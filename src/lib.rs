//! Yet another BME280 driver.
//!
//! A `no_std` driver for the Bosch BME280 temperature, pressure and humidity
//! sensor on top of `embedded-hal` 1.0.
//!
//! The sensor only accepts configuration changes while it sleeps, and the only
//! reliable way from Normal mode into Sleep is a soft reset followed by restoring
//! the settings. The driver does this for you in [`Bme280::set_settings`] and
//! [`Bme280::set_mode`].
//!
//! ```ignore
//! use bme280_ya::{Bme280, data::{Filter, Mode, Oversampling, Settings, StandbyTime}};
//!
//! const SETTINGS: Settings = Settings::builder()
//!     .filter(Filter::Off)
//!     .standby(StandbyTime::Ms1000)
//!     .temperature_oversampling(Oversampling::X16)
//!     .pressure_oversampling(Oversampling::X16)
//!     .humidity_oversampling(Oversampling::X16)
//!     .build();
//!
//! let mut sensor = Bme280::new_i2c(i2c, 0x77, delay);
//! sensor.init_with(Mode::Forced, SETTINGS)?;
//! let measurement = sensor.read()?;
//! ```
#![cfg_attr(not(test), no_std)]

pub mod bus;
pub mod calibration;
pub mod compensation;
pub mod constants;
pub mod data;
pub mod error;

use embedded_hal::{delay::DelayNs, i2c::I2c};
use libm::ceilf;
use log::{debug, info};

use crate::bus::{I2cBus, RegisterBus};
use crate::calibration::CalibrationData;
use crate::constants::{
    BME280_CALIB_DELAY_MS, BME280_CHIP_ID, BME280_CHIP_ID_ATTEMPTS, BME280_DATA_LEN,
    BME280_REG_CHIP_ID, BME280_REG_CONFIG, BME280_REG_CTRL_HUM, BME280_REG_CTRL_MEAS,
    BME280_REG_DATA, BME280_REG_PWR_CTRL, BME280_REG_RESET, BME280_RESET_DELAY_MS,
    BME280_SOFT_RESET,
};
use crate::data::{
    Config, CtrlHum, CtrlMeas, Measurement, Mode, Oversampling, RawSample, Settings,
    SettingsRegisters,
};
use crate::error::Error;

/// the BME280 device
pub struct Bme280<B, D> {
    bus: B,
    delayer: D,
    /// `Some` once `init` succeeded
    calibration: Option<CalibrationData>,
    /// mode requested with `set_mode`, decides whether `read` triggers a measurement
    mode: Mode,
}

impl<I2C, D> Bme280<I2cBus<I2C>, D>
where
    I2C: I2c,
    D: DelayNs,
{
    /// create new BME280 driver on an I2C bus at the given 7 bit address
    pub fn new_i2c(i2c: I2C, address: u8, delayer: D) -> Self {
        Self::new(I2cBus::new(i2c, address), delayer)
    }
}

impl<B, D> Bme280<B, D>
where
    B: RegisterBus,
    D: DelayNs,
{
    /// create new BME280 driver, nothing is sent to the sensor until `init`
    pub fn new(bus: B, delayer: D) -> Self {
        debug!("new called");
        Self {
            bus,
            delayer,
            calibration: None,
            mode: Mode::Sleep,
        }
    }

    /// give back the register bus
    pub fn release(self) -> B {
        self.bus
    }

    pub fn is_initialized(&self) -> bool {
        self.calibration.is_some()
    }

    /// calibration data read by the last successful `init`
    pub fn calibration(&self) -> Option<&CalibrationData> {
        self.calibration.as_ref()
    }

    /// mode last requested with `set_mode`
    pub fn mode(&self) -> Mode {
        self.mode
    }

    fn read_register(&mut self, reg: u8, buffer: &mut [u8]) -> Result<(), Error<B::Error>> {
        self.bus.read_register(reg, buffer).map_err(Error::Bus)
    }

    fn read_byte(&mut self, reg: u8) -> Result<u8, Error<B::Error>> {
        let mut result_buf: [u8; 1] = [0; 1];
        self.read_register(reg, &mut result_buf)?;
        Ok(result_buf[0])
    }

    fn write_byte(&mut self, reg: u8, value: u8) -> Result<(), Error<B::Error>> {
        debug!("  writing reg {:#04X} = {:#010b}", reg, value);
        self.bus.write_register(reg, &[value]).map_err(Error::Bus)
    }

    /// read the chip ID register, 0x60 for a BME280
    pub fn read_chip_id(&mut self) -> Result<u8, Error<B::Error>> {
        self.read_byte(BME280_REG_CHIP_ID)
    }

    /// Check the chip ID, soft reset the sensor and load the calibration data.
    ///
    /// The chip ID is polled up to 5 times. If it never matches the error is
    /// `IdentityMismatch`, or `Bus` when the last read itself failed.
    pub fn init(&mut self) -> Result<(), Error<B::Error>> {
        debug!("in init()");
        self.calibration = None;

        let mut attempt = 1;
        loop {
            match self.read_chip_id() {
                Ok(BME280_CHIP_ID) => break,
                Ok(id) if attempt >= BME280_CHIP_ID_ATTEMPTS => {
                    return Err(Error::IdentityMismatch(id));
                }
                Err(e) if attempt >= BME280_CHIP_ID_ATTEMPTS => return Err(e),
                Ok(id) => debug!("  chip id attempt {} read {:#04X}", attempt, id),
                Err(_) => debug!("  chip id attempt {} failed", attempt),
            }
            attempt += 1;
        }

        self.soft_reset()?;
        let calibration = CalibrationData::load(&mut self.bus)?;
        self.delayer.delay_ms(BME280_CALIB_DELAY_MS);

        self.calibration = Some(calibration);
        self.mode = Mode::Sleep;
        info!("BME280 initialized");
        Ok(())
    }

    /// `init`, then apply `settings` and switch to `mode`
    pub fn init_with(&mut self, mode: Mode, settings: Settings) -> Result<(), Error<B::Error>> {
        self.init()?;
        self.set_settings(settings)?;
        self.set_mode(mode)
    }

    /// soft reset, all registers go back to their reset values and the sensor sleeps
    fn soft_reset(&mut self) -> Result<(), Error<B::Error>> {
        debug!("in soft_reset()");
        self.write_byte(BME280_REG_RESET, BME280_SOFT_RESET)?;
        self.delayer.delay_ms(BME280_RESET_DELAY_MS);
        Ok(())
    }

    /// get the power mode bits of the ctrl_meas register
    pub fn get_mode(&mut self) -> Result<Mode, Error<B::Error>> {
        let ctrl_meas = CtrlMeas(self.read_byte(BME280_REG_PWR_CTRL)?);
        debug!("  get_mode = {:?}", ctrl_meas.mode());
        Ok(ctrl_meas.mode())
    }

    /// read and decode the ctrl_hum, ctrl_meas and config registers
    pub fn get_settings(&mut self) -> Result<Settings, Error<B::Error>> {
        let regs = self.read_settings_registers()?;
        let settings = Settings::from_registers(&regs);
        debug!("  get_settings = {:?}", settings);
        Ok(settings)
    }

    fn read_settings_registers(&mut self) -> Result<SettingsRegisters, Error<B::Error>> {
        Ok(SettingsRegisters {
            config: Config(self.read_byte(BME280_REG_CONFIG)?),
            ctrl_meas: CtrlMeas(self.read_byte(BME280_REG_CTRL_MEAS)?),
            ctrl_hum: CtrlHum(self.read_byte(BME280_REG_CTRL_HUM)?),
        })
    }

    /// Read-modify-write the humidity oversampling in ctrl_hum. Only takes effect
    /// after the next ctrl_meas write.
    pub fn write_humidity_oversampling(&mut self, oversampling: Oversampling) -> Result<(), Error<B::Error>> {
        let mut ctrl_hum = CtrlHum(self.read_byte(BME280_REG_CTRL_HUM)?);
        ctrl_hum.set_osrs_h(oversampling as u8);
        self.write_byte(BME280_REG_CTRL_HUM, ctrl_hum.0)
    }

    /// Read-modify-write temperature / pressure oversampling in ctrl_meas and filter /
    /// standby time in config. The power mode bits are left alone.
    pub fn write_measurement_settings(&mut self, settings: &Settings) -> Result<(), Error<B::Error>> {
        let current = SettingsRegisters {
            ctrl_hum: CtrlHum(0),
            ctrl_meas: CtrlMeas(self.read_byte(BME280_REG_CTRL_MEAS)?),
            config: Config(0),
        };
        let regs = settings.merge_into(current);
        self.write_byte(BME280_REG_CTRL_MEAS, regs.ctrl_meas.0)?;

        let current = SettingsRegisters {
            config: Config(self.read_byte(BME280_REG_CONFIG)?),
            ..current
        };
        let regs = settings.merge_into(current);
        self.write_byte(BME280_REG_CONFIG, regs.config.0)
    }

    // humidity first, it is latched by the ctrl_meas write
    fn load_settings(&mut self, settings: &Settings) -> Result<(), Error<B::Error>> {
        self.write_humidity_oversampling(settings.humidity_oversampling)?;
        self.write_measurement_settings(settings)
    }

    /// The sensor ignores configuration writes while it is measuring, so every
    /// configuration change goes through here first.
    fn ensure_sleeping(&mut self) -> Result<(), Error<B::Error>> {
        let mode = self.get_mode()?;
        if mode != Mode::Sleep {
            debug!("  sensor in {:?} mode, putting it to sleep", mode);
            self.enter_sleep()?;
        }
        Ok(())
    }

    fn enter_sleep(&mut self) -> Result<(), Error<B::Error>> {
        let settings = self.get_settings()?;
        self.soft_reset()?;
        self.load_settings(&settings)
    }

    /// Put the sensor to sleep, keeping its settings.
    ///
    /// There is no safe way to clear the mode bits in the middle of a measurement,
    /// so this reads the settings, soft resets the sensor and writes them back.
    pub fn sleep(&mut self) -> Result<(), Error<B::Error>> {
        debug!("in sleep()");
        self.enter_sleep()?;
        self.mode = Mode::Sleep;
        Ok(())
    }

    /// Apply new settings, putting the sensor to sleep first if needed. The sensor
    /// is left sleeping, call `set_mode` to resume Normal mode.
    pub fn set_settings(&mut self, settings: Settings) -> Result<(), Error<B::Error>> {
        debug!("in set_settings({:?})", settings);
        self.ensure_sleeping()?;
        self.load_settings(&settings)
    }

    /// set power mode, putting the sensor to sleep first if needed
    pub fn set_mode(&mut self, mode: Mode) -> Result<(), Error<B::Error>> {
        debug!("in set_mode({:?})", mode);
        self.ensure_sleeping()?;

        let mut ctrl_meas = CtrlMeas(self.read_byte(BME280_REG_PWR_CTRL)?);
        ctrl_meas.set_mode(mode as u8);
        self.write_byte(BME280_REG_PWR_CTRL, ctrl_meas.0)?;

        self.mode = mode;
        Ok(())
    }

    /// Trigger a single measurement and wait for the worst case conversion time.
    ///
    /// Fails with `InvalidState`, without writing anything, when the sensor is
    /// running in Normal mode.
    pub fn force_measurement(&mut self) -> Result<(), Error<B::Error>> {
        debug!("in force_measurement()");
        if self.get_mode()? == Mode::Normal {
            return Err(Error::InvalidState);
        }

        let settings = self.get_settings()?;
        self.write_humidity_oversampling(settings.humidity_oversampling)?;

        let mut ctrl_meas = CtrlMeas(0);
        ctrl_meas.set_osrs_p(settings.pressure_oversampling as u8);
        ctrl_meas.set_osrs_t(settings.temperature_oversampling as u8);
        ctrl_meas.set_mode(Mode::Forced as u8);
        self.write_byte(BME280_REG_CTRL_MEAS, ctrl_meas.0)?;

        let wait_ms = ceilf(settings.measurement_time_ms()) as u32;
        debug!("  waiting {} ms for the measurement", wait_ms);
        self.delayer.delay_ms(wait_ms);
        Ok(())
    }

    /// burst read the data registers
    pub fn read_raw(&mut self) -> Result<RawSample, Error<B::Error>> {
        let mut result_buf: [u8; BME280_DATA_LEN] = [0; BME280_DATA_LEN];
        self.read_register(BME280_REG_DATA, &mut result_buf)?;
        let raw = RawSample::from_burst(&result_buf);
        debug!("  raw sample = {:?}", raw);
        Ok(raw)
    }

    /// Read temperature, pressure and humidity. In Forced mode a new measurement is
    /// triggered first, otherwise the latest sample is read.
    pub fn read(&mut self) -> Result<Measurement, Error<B::Error>> {
        debug!("in read()");
        let calibration = self.calibration.ok_or(Error::Uninitialized)?;

        if self.mode == Mode::Forced {
            self.force_measurement()?;
        }

        let raw = self.read_raw()?;
        Ok(compensation::compensate(&calibration, &raw))
    }
}
