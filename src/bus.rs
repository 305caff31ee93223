use embedded_hal::i2c::I2c;

use crate::constants::BME280_I2C_ADDR;

/// Register level access to the sensor.
///
/// `read_register` fills `buffer` starting at register `reg` (burst read),
/// `write_register` writes `data` starting at register `reg`.
pub trait RegisterBus {
    type Error;

    fn read_register(&mut self, reg: u8, buffer: &mut [u8]) -> Result<(), Self::Error>;

    fn write_register(&mut self, reg: u8, data: &[u8]) -> Result<(), Self::Error>;
}

impl<T: RegisterBus + ?Sized> RegisterBus for &mut T {
    type Error = T::Error;

    fn read_register(&mut self, reg: u8, buffer: &mut [u8]) -> Result<(), Self::Error> {
        (**self).read_register(reg, buffer)
    }

    fn write_register(&mut self, reg: u8, data: &[u8]) -> Result<(), Self::Error> {
        (**self).write_register(reg, data)
    }
}

/// `RegisterBus` over an embedded-hal I2C bus at a fixed 7 bit address
pub struct I2cBus<I2C> {
    /// I²C interface
    i2c: I2C,
    /// I²C device address
    address: u8,
}

impl<I2C: I2c> I2cBus<I2C> {
    pub fn new(i2c: I2C, address: u8) -> Self {
        Self { i2c, address }
    }

    /// device at the default address 0x77
    pub fn new_default(i2c: I2C) -> Self {
        Self::new(i2c, BME280_I2C_ADDR)
    }

    pub fn address(&self) -> u8 {
        self.address
    }

    /// give back the I2C interface
    pub fn release(self) -> I2C {
        self.i2c
    }
}

impl<I2C: I2c> RegisterBus for I2cBus<I2C> {
    type Error = I2C::Error;

    fn read_register(&mut self, reg: u8, buffer: &mut [u8]) -> Result<(), Self::Error> {
        self.i2c.write_read(self.address, &[reg], buffer)
    }

    // the BME280 does not auto increment on write, every byte goes out as a (register, data) pair
    fn write_register(&mut self, reg: u8, data: &[u8]) -> Result<(), Self::Error> {
        for (offset, byte) in data.iter().enumerate() {
            self.i2c
                .write(self.address, &[reg.wrapping_add(offset as u8), *byte])?;
        }
        Ok(())
    }
}
