use bitfield::bitfield;
use const_builder::ConstBuilder;


/// A compensated measurement result from the sensor.
#[derive(Debug, PartialEq, Clone, Copy)]
pub struct Measurement {
    /// temperature degrees C, clamped to -40.00 ..= 85.00
    pub temperature: f64,
    /// air pressure in decapascal (1 daPa = 10 Pa), clamped to 3000.00 ..= 11000.00
    pub pressure: f64,
    /// relative humidity percent, clamped to 0.000 ..= 100.000
    pub humidity: f64,
}

impl Measurement {
    /// air pressure in hectopascal
    pub fn pressure_hpa(&self) -> f64 {
        self.pressure / 10.0
    }

    /// air pressure in pascal
    pub fn pressure_pa(&self) -> f64 {
        self.pressure * 10.0
    }
}

/// Uncompensated ADC values from one 8 byte data burst
#[derive(Debug, PartialEq, Eq, Clone, Copy, Default)]
pub struct RawSample {
    /// 20 bit pressure ADC value
    pub pressure: u32,
    /// 20 bit temperature ADC value
    pub temperature: u32,
    /// 16 bit humidity ADC value
    pub humidity: u32,
}

impl RawSample {
    /// unpack the burst read starting at 0xF7 (press msb/lsb/xlsb, temp msb/lsb/xlsb, hum msb/lsb)
    pub fn from_burst(buf: &[u8; 8]) -> Self {
        RawSample {
            pressure: (buf[0] as u32) << 12 | (buf[1] as u32) << 4 | (buf[2] as u32) >> 4,
            temperature: (buf[3] as u32) << 12 | (buf[4] as u32) << 4 | (buf[5] as u32) >> 4,
            humidity: (buf[6] as u32) << 8 | buf[7] as u32,
        }
    }
}

/// Power Mode
#[derive(Debug, Eq, PartialEq, Clone, Copy, Default)]
#[repr(u8)]
pub enum Mode {
    #[default]
    Sleep =  0x00,
    Forced = 0x01,
    Normal = 0x03,
}

impl From<u8> for Mode {
    fn from(v: u8) -> Mode {
        match v & 0x03 {
            0x00 => Self::Sleep,
            0x01 | 0x02 => Self::Forced,
            _ => Self::Normal,
        }
    }
}

/// IIR filter coefficient
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Default)]
#[repr(u8)]
pub enum Filter {
    #[default]
    Off = 0x00,
    X2  = 0x01,
    X4  = 0x02,
    X8  = 0x03,
    X16 = 0x04,
}

impl From<u8> for Filter {
    fn from(v: u8) -> Self {
        match v & 0x07 {
            0x00 => Self::Off,
            0x01 => Self::X2,
            0x02 => Self::X4,
            0x03 => Self::X8,
            _ => Self::X16,  // 0x04 and higher all mean filter coefficient 16
        }
    }
}

/// Inactive duration between measurements in Normal mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[repr(u8)]
pub enum StandbyTime {
    #[default]
    Ms0_5   = 0x00,
    Ms62_5  = 0x01,
    Ms125   = 0x02,
    Ms250   = 0x03,
    Ms500   = 0x04,
    Ms1000  = 0x05,
    Ms10    = 0x06,
    Ms20    = 0x07,
}

impl From<u8> for StandbyTime {
    fn from(v: u8) -> Self {
        match v & 0x07 {
            0x00 => Self::Ms0_5,
            0x01 => Self::Ms62_5,
            0x02 => Self::Ms125,
            0x03 => Self::Ms250,
            0x04 => Self::Ms500,
            0x05 => Self::Ms1000,
            0x06 => Self::Ms10,
            _ => Self::Ms20,
        }
    }
}

/// Over sampling config, one per temperature, pressure and humidity channel
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Default)]
#[repr(u8)]
pub enum Oversampling {
    /// channel skipped
    Off = 0x00,
    #[default]
    X1  = 0x01,
    X2  = 0x02,
    X4  = 0x03,
    X8  = 0x04,
    X16 = 0x05,
}

impl From<u8> for Oversampling {
    fn from(v: u8) -> Self {
        match v & 0x07 {
            0x00 => Self::Off,
            0x01 => Self::X1,
            0x02 => Self::X2,
            0x03 => Self::X4,
            0x04 => Self::X8,
            _ => Self::X16,  // 0x05, 0x06 and 0x07 all mean x16
        }
    }
}

impl Oversampling {
    /// true unless the channel is skipped
    pub fn is_enabled(self) -> bool {
        self != Oversampling::Off
    }

    /// worst case conversion time multiplier used by the forced measurement wait
    pub fn timing_coefficient(self) -> f32 {
        match self {
            Oversampling::Off => 0.0,
            Oversampling::X1 => 1.0,
            Oversampling::X2 => 2.0,
            Oversampling::X4 => 4.0,
            Oversampling::X8 => 16.0,
            Oversampling::X16 => 16.0,
        }
    }
}

bitfield! {
    /// ctrl_hum register (0xF2), bits 7..3 unused
    #[derive(Clone, Copy, PartialEq, Eq, Default)]
    pub struct CtrlHum(u8);
    impl Debug;

    pub u8, into Oversampling, osrs_h, set_osrs_h: 2, 0;
}

bitfield! {
    /// ctrl_meas register (0xF4): temperature and pressure oversampling plus the power mode
    #[derive(Clone, Copy, PartialEq, Eq, Default)]
    pub struct CtrlMeas(u8);
    impl Debug;

    pub u8, into Mode, mode, set_mode: 1, 0;
    pub u8, into Oversampling, osrs_p, set_osrs_p: 4, 2;
    pub u8, into Oversampling, osrs_t, set_osrs_t: 7, 5;
}

bitfield! {
    /// config register (0xF5): standby time and IIR filter, bit 0 is spi3w_en
    #[derive(Clone, Copy, PartialEq, Eq, Default)]
    pub struct Config(u8);
    impl Debug;

    pub u8, into Filter, filter, set_filter: 4, 2;
    pub u8, into StandbyTime, t_sb, set_t_sb: 7, 5;
}

/// Register image of the three settings registers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SettingsRegisters {
    pub ctrl_hum: CtrlHum,
    pub ctrl_meas: CtrlMeas,
    pub config: Config,
}

/// BME280 settings: IIR filter, standby time and per channel oversampling.
///
/// Build one at compile time with `Settings::builder()`, every field defaults to
/// filter off, 0.5 ms standby and x1 oversampling.
#[derive(ConstBuilder, Debug, Clone, Copy, PartialEq, Eq)]
pub struct Settings {
    #[builder(default = Filter::Off)]
    pub filter: Filter,
    #[builder(default = StandbyTime::Ms0_5)]
    pub standby: StandbyTime,
    #[builder(default = Oversampling::X1)]
    pub pressure_oversampling: Oversampling,
    #[builder(default = Oversampling::X1)]
    pub temperature_oversampling: Oversampling,
    #[builder(default = Oversampling::X1)]
    pub humidity_oversampling: Oversampling,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            filter: Filter::Off,
            standby: StandbyTime::Ms0_5,
            pressure_oversampling: Oversampling::X1,
            temperature_oversampling: Oversampling::X1,
            humidity_oversampling: Oversampling::X1,
        }
    }
}

impl Settings {
    /// Merge these settings into a register image. Only the settings fields are
    /// cleared and rewritten, the power mode bits of ctrl_meas, bits 1..0 of config
    /// and the unused bits of ctrl_hum keep their current value.
    pub fn merge_into(&self, current: SettingsRegisters) -> SettingsRegisters {
        let mut regs = current;
        regs.ctrl_hum.set_osrs_h(self.humidity_oversampling as u8);
        regs.ctrl_meas.set_osrs_p(self.pressure_oversampling as u8);
        regs.ctrl_meas.set_osrs_t(self.temperature_oversampling as u8);
        regs.config.set_filter(self.filter as u8);
        regs.config.set_t_sb(self.standby as u8);
        regs
    }

    /// decode settings from a register image
    pub fn from_registers(regs: &SettingsRegisters) -> Self {
        Settings {
            filter: regs.config.filter(),
            standby: regs.config.t_sb(),
            pressure_oversampling: regs.ctrl_meas.osrs_p(),
            temperature_oversampling: regs.ctrl_meas.osrs_t(),
            humidity_oversampling: regs.ctrl_hum.osrs_h(),
        }
    }

    /// Worst case duration of one forced measurement in milliseconds, from the
    /// datasheet's maximum measurement time formula.
    pub fn measurement_time_ms(&self) -> f32 {
        let mut time = 1.25 + 2.3 * self.temperature_oversampling.timing_coefficient();
        if self.pressure_oversampling.is_enabled() {
            time += 2.3 * self.pressure_oversampling.timing_coefficient() + 0.575;
        }
        if self.humidity_oversampling.is_enabled() {
            time += 2.3 * self.humidity_oversampling.timing_coefficient() + 0.575;
        }
        time
    }
}
