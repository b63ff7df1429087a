pub mod command;
pub mod config;
pub mod controller;
pub mod error;
pub mod event;
pub mod formatter;
pub mod job;
pub mod notify;
pub mod pages;
pub mod progress;
pub mod runner;
pub mod service;
pub mod tracker;
