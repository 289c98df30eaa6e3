use std::{env, path::PathBuf, process::ExitCode};

use tapesort::{sort_file, LatencyPolicy};

/// Sets up tracing subscriber.
fn setup_tracing() {
    use tracing_subscriber::{
        fmt::{format::FmtSpan, layer},
        layer::SubscriberExt,
        util::SubscriberInitExt,
        EnvFilter,
    };

    let filter_layer = EnvFilter::try_from_default_env().unwrap_or("warn".into());
    let fmt_layer = layer().with_span_events(FmtSpan::NEW | FmtSpan::CLOSE);

    tracing_subscriber::registry()
        .with(filter_layer)
        .with(fmt_layer)
        .init();
}

fn main() -> ExitCode {
    setup_tracing();

    let args: Vec<String> = env::args().collect();
    if args.len() != 3 {
        eprintln!("usage: {} <input-path> <output-path>", args[0]);
        return ExitCode::FAILURE;
    }

    let input = PathBuf::from(&args[1]);
    let output = PathBuf::from(&args[2]);

    let latency_path = env::var_os("TAPESORT_LATENCY_CONFIG").map(PathBuf::from);
    let latency = match LatencyPolicy::from_path(latency_path.as_deref()) {
        Ok(policy) => policy,
        Err(err) => {
            eprintln!("tapesort: {err}");
            return ExitCode::FAILURE;
        }
    };

    match sort_file::<i32, 4>(&input, &output, latency, tapesort::config::DEFAULT_PAGE_SIZE) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("tapesort: {err}");
            ExitCode::FAILURE
        }
    }
}
