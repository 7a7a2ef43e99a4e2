#![warn(clippy::all)]
#![allow(clippy::new_without_default)]
#![allow(non_camel_case_types)]

#[macro_use]
extern crate lazy_static;

#[macro_use]
pub mod prelude;

pub use prelude::*;
use std::sync::{Arc, Mutex};

pub trait Logger: Send {
    fn log(&mut self, file: &'static str, line: u32, tag: &'static str, msg: &str);
}

lazy_static! {
    static ref LOGGERS: Arc<Mutex<Vec<Box<dyn Logger>>>> = Arc::new(Mutex::new(vec![]));
}

/// Dispatches a message to all registered loggers.
/// Note that every dynamically loaded image has its own registry: a game module that
/// never registers a logger falls back to printing directly.
#[inline]
pub fn emit_log_msg(file: &'static str, line: u32, tag: &'static str, msg: &str) {
    let mut loggers = match LOGGERS.lock() {
        Ok(loggers) => loggers,
        // A logger panicked while holding the lock: keep logging anyway.
        Err(poisoned) => poisoned.into_inner(),
    };
    if loggers.is_empty() {
        print_tagged(tag, msg);
    } else {
        loggers.iter_mut().for_each(|logger| logger.log(file, line, tag, msg));
    }
}

fn print_tagged(tag: &str, msg: &str) {
    if tag == "DEBUG" || tag == "VERBOSE" {
        eprintln!("[ {} ] {}", tag, msg);
    } else {
        println!("[ {} ] {}", tag, msg);
    }
}

pub struct Println_Logger;

impl Logger for Println_Logger {
    fn log(&mut self, _file: &'static str, _line: u32, tag: &'static str, msg: &str) {
        print_tagged(tag, msg);
    }
}

/// Keeps every message in memory. Mostly useful in tests.
#[derive(Clone, Default)]
pub struct Memory_Logger {
    pub lines: Arc<Mutex<Vec<(&'static str, String)>>>,
}

impl Logger for Memory_Logger {
    fn log(&mut self, _file: &'static str, _line: u32, tag: &'static str, msg: &str) {
        if let Ok(mut lines) = self.lines.lock() {
            lines.push((tag, String::from(msg)));
        }
    }
}

pub fn add_default_logger() {
    add_logger(Box::new(Println_Logger {}));
}

pub fn add_logger(logger: Box<dyn Logger>) {
    let mut loggers = match LOGGERS.lock() {
        Ok(loggers) => loggers,
        Err(poisoned) => poisoned.into_inner(),
    };
    loggers.push(logger);
}

pub fn clear_loggers() {
    if let Ok(mut loggers) = LOGGERS.lock() {
        loggers.clear();
    }
}
