#![allow(dead_code)]

pub mod tracing_util {
    use tracing::subscriber::DefaultGuard;
    use tracing_subscriber::EnvFilter;

    /// Scoped tracing for a single test: log lines honor `RUST_LOG` and the
    /// subscriber is torn down when the guard drops.
    pub struct TestTracing {
        _guard: DefaultGuard,
    }

    impl TestTracing {
        pub fn init() -> Self {
            let subscriber = tracing_subscriber::fmt()
                .with_env_filter(EnvFilter::from_default_env())
                .with_test_writer()
                .finish();
            let guard = tracing::subscriber::set_default(subscriber);
            Self { _guard: guard }
        }
    }
}

pub mod test_runtime {
    use std::sync::Once;

    static MAY_INIT: Once = Once::new();

    /// Configure the may runtime once per test binary.
    pub fn setup_may_runtime() {
        MAY_INIT.call_once(|| {
            may::config().set_stack_size(0x8000);
        });
    }
}
