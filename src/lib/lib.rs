#![cfg_attr(not(test), no_std)]

pub mod drivers;
pub mod estimation;
pub mod filtering;
