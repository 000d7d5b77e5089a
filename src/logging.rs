use tracing_subscriber::EnvFilter;

/// Install the global stderr subscriber.
///
/// `--quiet` shows errors only. Otherwise `RUST_LOG` wins when set, and
/// `-v`/`-vv` raise the default `warn` level to `info`/`debug`.
pub fn init_logging(verbosity: u8, quiet: bool) {
	let filter = if quiet {
		EnvFilter::new("error")
	} else {
		EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level(verbosity)))
	};

	// try_init: a second call (tests) keeps the first subscriber.
	let _ = tracing_subscriber::fmt()
		.with_env_filter(filter)
		.with_writer(std::io::stderr)
		.with_target(false)
		.without_time()
		.try_init();
}

fn default_level(verbosity: u8) -> &'static str {
	match verbosity {
		0 => "warn",
		1 => "info",
		_ => "debug",
	}
}
