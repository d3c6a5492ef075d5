//! Web demo for the natural-product classifier.

pub mod routes;
