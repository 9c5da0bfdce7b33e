#![no_std]
extern crate alloc;

#[cfg(feature = "std")]
extern crate std;

use alloc::{boxed::Box, string::String, vec::Vec};

pub mod decode;
pub mod encode;
pub mod io;

mod value;

pub use value::{Tag, Value};



#[cfg(test)]
mod value_tests;
