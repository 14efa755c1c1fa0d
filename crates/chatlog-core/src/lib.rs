pub mod cache;
pub mod config;
pub mod engine;
pub mod errors;
pub mod model;
pub mod replies;
pub mod sentiment;
pub mod sqlfn;

pub mod doctor;

pub mod report;
pub mod storage;
