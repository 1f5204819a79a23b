use console::config::ConsoleConfig;

fn main() {
    console::init_tracing();
    let demo_mode = std::env::args().any(|arg| arg == "--demo");

    let result = ConsoleConfig::from_env().and_then(|config| {
        if demo_mode {
            console::run_demo(config)
        } else {
            console::run(config)
        }
    });

    if let Err(err) = result {
        tracing::error!(error = %err, "dispatch console failed");
        std::process::exit(1);
    }
}
