// MPU-6050 register map subset and scale factors
// Register map: https://invensense.tdk.com/wp-content/uploads/2015/02/MPU-6000-Register-Map1.pdf

/// 7-bit I2C address with AD0 low.
pub const DEFAULT_I2C_ADDR: u8 = 0x68;

/// Power management 1; writing 0x00 clears the sleep bit the device boots with.
pub const REG_PWR_MGMT_1: u8 = 0x6B;

/// First register of the contiguous accel(6) + temp(2) + gyro(6) output block.
pub const REG_ACCEL_XOUT_H: u8 = 0x3B;

/// Length of one full output block burst read.
pub const RAW_FRAME_NUM_BYTES: usize = 14;

/// Accelerometer sensitivity at the +-2 g full-scale default.
pub const ACCEL_LSB_PER_G: f32 = 16384.0;

/// Gyroscope sensitivity at the +-250 deg/s full-scale default.
pub const GYRO_LSB_PER_DPS: f32 = 131.0;
