use crate::cmd::{PingArgs, TargetArgs};
use crate::exit::{client_error, CliResult, SUCCESS};
use crate::output::{print_ping, OutputFormat};

pub async fn run(args: PingArgs, target: &TargetArgs, format: OutputFormat) -> CliResult<i32> {
    let conn = target.connect().await?;
    for _ in 0..args.count.max(1) {
        let rtt = conn
            .ping()
            .await
            .map_err(|err| client_error("ping failed", err))?;
        print_ping(&target.host, target.port, rtt, format);
    }
    Ok(SUCCESS)
}
