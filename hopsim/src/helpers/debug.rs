// Per-sensor debug trace
#[macro_export]
macro_rules! debug_sensor {
    ($id:expr, $($arg:tt)+) => {
        log::debug!("[S{}] {}", $id, format_args!($($arg)+))
    }
}
