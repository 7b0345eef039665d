pub use crate::controller::{Controller, Error};

mod controller;
