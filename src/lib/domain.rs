//! Domain logic, independent of HTTP and SMTP details

pub mod communication;
