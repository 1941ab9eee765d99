use cfl_cli::{command, init_tracing, run};

#[tokio::main]
async fn main() {
    let matches = command().get_matches();
    let json_logs = matches
        .subcommand()
        .is_some_and(|(_, args)| args.get_flag("json-logs"));
    init_tracing(json_logs);

    let mut stdout = std::io::stdout().lock();
    if let Err(e) = run(&matches, &mut stdout).await {
        tracing::error!("{e:#}");
        eprintln!("error: {e:#}");
        std::process::exit(1);
    }
}
