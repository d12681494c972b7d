//! Tracing and logging (shared setup).

/// Initialize process-wide logging in the given output format.
///
/// This is safe to call multiple times; subsequent calls become no-ops.
pub fn init(format: LogFormat) {
    tracing::init(format);
}

/// Subscriber configuration (filters, formats).
pub mod tracing;

pub use self::tracing::LogFormat;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn repeated_init_is_a_no_op() {
        init(LogFormat::Pretty);
        init(LogFormat::default());
        ::tracing::info!("still logging");
    }
}
