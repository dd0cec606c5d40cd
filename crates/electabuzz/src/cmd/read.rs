use crate::cmd::{ReadArgs, TargetArgs};
use crate::exit::{client_error, CliResult, SUCCESS};
use crate::output::{print_read_results, OutputFormat};

pub async fn run(args: ReadArgs, target: &TargetArgs, format: OutputFormat) -> CliResult<i32> {
    let conn = target.connect().await?;
    let results = conn
        .multi_read(args.ids.as_slice())
        .await
        .map_err(|err| client_error("read failed", err))?;
    print_read_results(&results, format);
    Ok(SUCCESS)
}
