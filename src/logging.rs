use tracing_log::LogTracer;
use tracing_subscriber::{prelude::*, EnvFilter};

pub fn init_logs() {
    let trace_file =
        tracing_appender::rolling::never(".", "platepack.log").with_max_level(tracing::Level::TRACE);

    LogTracer::init().ok();

    let file_layer = tracing_subscriber::fmt::Layer::new()
        .with_writer(trace_file)
        .with_file(true)
        .with_ansi(false)
        .with_line_number(true)
        .with_target(true)
        .with_level(true)
        .compact()
        .with_filter(EnvFilter::new("info,platepack=trace,platepack_lib=trace"));

    let stderr_layer = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .without_time()
        .with_file(true)
        .with_line_number(true)
        .with_target(false)
        .compact();

    tracing_subscriber::registry()
        .with(file_layer)
        .with(stderr_layer)
        .try_init()
        .unwrap();
}
