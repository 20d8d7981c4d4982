// MPU-6050 6-axis IMU driver
// Datasheet: https://invensense.tdk.com/wp-content/uploads/2015/02/MPU-6000-Datasheet1.pdf

pub use crate::drivers::imu::mpu6050_constants::*;

use embedded_hal::blocking::i2c::{Write, WriteRead};

/// One decoded output frame, in raw sensor counts.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct RawSample {
    pub accel: (i16, i16, i16),
    pub gyro: (i16, i16, i16),
}

impl RawSample {
    /// Accelerations in g.
    pub fn accel_g(&self) -> (f32, f32, f32) {
        (
            self.accel.0 as f32 / ACCEL_LSB_PER_G,
            self.accel.1 as f32 / ACCEL_LSB_PER_G,
            self.accel.2 as f32 / ACCEL_LSB_PER_G,
        )
    }

    /// Angular rates in degrees/second.
    pub fn gyro_dps(&self) -> (f32, f32, f32) {
        (
            self.gyro.0 as f32 / GYRO_LSB_PER_DPS,
            self.gyro.1 as f32 / GYRO_LSB_PER_DPS,
            self.gyro.2 as f32 / GYRO_LSB_PER_DPS,
        )
    }
}

pub struct Mpu6050<I2C> {
    i2c: I2C,
    address: u8,
}

impl<I2C, E> Mpu6050<I2C>
where
    I2C: Write<Error = E> + WriteRead<Error = E>,
{
    pub fn new(i2c: I2C) -> Self {
        Self::with_address(i2c, DEFAULT_I2C_ADDR)
    }

    pub fn with_address(i2c: I2C, address: u8) -> Self {
        Self { i2c, address }
    }

    /// Wakes the device; it powers up in sleep mode.
    pub fn init(&mut self) -> Result<(), E> {
        self.i2c.write(self.address, &[REG_PWR_MGMT_1, 0x00])
    }

    /// Burst-reads one accel + gyro frame.
    pub fn read_raw(&mut self) -> Result<RawSample, E> {
        let mut buf: [u8; RAW_FRAME_NUM_BYTES] = [0; RAW_FRAME_NUM_BYTES];
        self.i2c
            .write_read(self.address, &[REG_ACCEL_XOUT_H], &mut buf)?;
        // accel X/Y/Z, two temperature bytes, gyro X/Y/Z, all big-endian
        Ok(RawSample {
            accel: (
                (((buf[0] as u16) << 8) | buf[1] as u16) as i16,
                (((buf[2] as u16) << 8) | buf[3] as u16) as i16,
                (((buf[4] as u16) << 8) | buf[5] as u16) as i16,
            ),
            gyro: (
                (((buf[8] as u16) << 8) | buf[9] as u16) as i16,
                (((buf[10] as u16) << 8) | buf[11] as u16) as i16,
                (((buf[12] as u16) << 8) | buf[13] as u16) as i16,
            ),
        })
    }

    /// Releases the bus.
    pub fn free(self) -> I2C {
        self.i2c
    }
}
