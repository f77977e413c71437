pub mod fwi;
