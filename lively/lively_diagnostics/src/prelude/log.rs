use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

lazy_static! {
    pub static ref ONCE_LOGS: Arc<Mutex<HashSet<String>>> =
        Arc::new(Mutex::new(HashSet::default()));
}

static VERBOSE: AtomicBool = AtomicBool::new(false);

#[inline(always)]
pub fn is_verbose() -> bool {
    cfg!(debug_assertions) && VERBOSE.load(Ordering::Acquire)
}

#[inline(always)]
pub fn set_verbose(verbose: bool) {
    VERBOSE.store(verbose, Ordering::Release);
}

/// Returns true the first time it's called with `key`.
pub fn first_time_logging(key: &str) -> bool {
    let mut logs = match ONCE_LOGS.lock() {
        Ok(logs) => logs,
        Err(poisoned) => poisoned.into_inner(),
    };
    logs.insert(String::from(key))
}

#[macro_export]
macro_rules! fatal {
    ($fmt:tt $(,$arg:expr)* $(,)?) => {
        panic!("[ FATAL ] {}", format_args!($fmt, $($arg),*))
    };
}

#[macro_export]
macro_rules! log {
    ($prelude:tt, $($arg:expr),* $(,)*) => {
        $crate::emit_log_msg(file!(), line!(), $prelude, &format!("{}", $($arg),*))
    };
}

#[macro_export]
macro_rules! lok {
    ($fmt:tt $(,$arg:expr)* $(,)?) => {
        $crate::log!("OK", format_args!($fmt, $($arg),*))
    };
}

#[macro_export]
macro_rules! lerr {
    ($fmt:tt $(,$arg:expr)* $(,)?) => {
        $crate::log!("ERROR", format_args!($fmt, $($arg),*))
    };
}

#[macro_export]
macro_rules! lwarn {
    ($fmt:tt $(,$arg:expr)* $(,)?) => {
        $crate::log!("WARNING", format_args!($fmt, $($arg),*))
    };
}

#[macro_export]
macro_rules! linfo {
    ($fmt:tt $(,$arg:expr)* $(,)?) => {
        $crate::log!("INFO", format_args!($fmt, $($arg),*))
    };
}

#[macro_export]
#[cfg(debug_assertions)]
macro_rules! ldebug {
    ($fmt:tt $(,$arg:expr)* $(,)?) => {
        $crate::log!("DEBUG", format_args!($fmt, $($arg),*))
    };
}

#[macro_export]
#[cfg(debug_assertions)]
macro_rules! lverbose {
    ($fmt:tt $(,$arg:expr)* $(,)?) => {
        if $crate::prelude::is_verbose() {
            $crate::log!("VERBOSE", format_args!($fmt, $($arg),*));
        }
    };
}

#[macro_export]
#[cfg(not(debug_assertions))]
macro_rules! ldebug {
    ($fmt:tt $(,$arg:expr)* $(,)?) => {
        ()
    };
}

#[macro_export]
#[cfg(not(debug_assertions))]
macro_rules! lverbose {
    ($fmt:tt $(,$arg:expr)* $(,)?) => {
        ()
    };
}

#[macro_export]
macro_rules! log_once {
    ($key: expr, $prelude: tt, $($arg: expr),* $(,)*) => {
        if $crate::prelude::first_time_logging($key) {
            $crate::log!($prelude, $($arg),*);
        }
    };
}

#[macro_export]
macro_rules! lwarn_once {
    ($key:expr, $fmt:tt $(,$arg:expr)* $(,)?) => {
        $crate::log_once!($key, "WARNING", format_args!($fmt, $($arg),*))
    };
}

#[macro_export]
macro_rules! lerr_once {
    ($key:expr, $fmt:tt $(,$arg:expr)* $(,)?) => {
        $crate::log_once!($key, "ERROR", format_args!($fmt, $($arg),*))
    };
}

#[macro_export]
macro_rules! linfo_once {
    ($key:expr, $fmt:tt $(,$arg:expr)* $(,)?) => {
        $crate::log_once!($key, "INFO", format_args!($fmt, $($arg),*))
    };
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Logger, Memory_Logger};

    #[test]
    fn first_time_logging_only_once_per_key() {
        assert!(first_time_logging("diagnostics-test-key"));
        assert!(!first_time_logging("diagnostics-test-key"));
        assert!(first_time_logging("diagnostics-test-key-2"));
    }

    #[test]
    fn memory_logger_keeps_tags() {
        let mut logger = Memory_Logger::default();
        logger.log(file!(), line!(), "WARNING", "careful");
        logger.log(file!(), line!(), "OK", "fine");

        let lines = logger.lines.lock().unwrap();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0], ("WARNING", String::from("careful")));
        assert_eq!(lines[1].0, "OK");
    }

    #[test]
    fn verbose_only_in_debug_builds() {
        set_verbose(true);
        assert_eq!(is_verbose(), cfg!(debug_assertions));
        set_verbose(false);
        assert!(!is_verbose());
    }
}
