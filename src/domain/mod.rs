pub mod command;
pub mod ports;
pub mod track;
