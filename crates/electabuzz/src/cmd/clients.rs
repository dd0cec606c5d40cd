use crate::cmd::{ClientsArgs, TargetArgs};
use crate::exit::{client_error, result_code_exit, CliResult};
use crate::output::{print_roster, OutputFormat};

pub async fn run(_args: ClientsArgs, target: &TargetArgs, format: OutputFormat) -> CliResult<i32> {
    let conn = target.connect().await?;
    let (result, roster) = conn
        .get_connected_clients()
        .await
        .map_err(|err| client_error("client list failed", err))?;
    print_roster(result, &roster, format);
    Ok(result_code_exit(result))
}
