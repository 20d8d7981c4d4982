pub mod mpu6050;
pub mod mpu6050_constants;
