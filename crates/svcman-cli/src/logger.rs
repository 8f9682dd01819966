use tracing_subscriber::EnvFilter;

/// Diagnostics of svcman itself go to stderr. An explicit `-v` wins over
/// `SVCMAN_LOG` / `RUST_LOG`; otherwise only warnings are shown.
pub fn init(verbosity: u8) {
	let filter = match verbosity {
		0 => from_env().unwrap_or_else(|| EnvFilter::new("warn")),
		1 => EnvFilter::new("info"),
		_ => EnvFilter::new("debug"),
	};
	tracing_subscriber::fmt()
		.with_env_filter(filter)
		.with_writer(std::io::stderr)
		.with_target(false)
		.init();
}

fn from_env() -> Option<EnvFilter> {
	["SVCMAN_LOG", "RUST_LOG"]
		.iter()
		.filter_map(|var| std::env::var(var).ok())
		.find_map(|directives| EnvFilter::try_new(directives).ok())
}
