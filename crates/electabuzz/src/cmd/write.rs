use electabuzz_value::checked_id;
use tracing::debug;

use crate::cmd::{TargetArgs, WriteArgs};
use crate::convert::parse_values;
use crate::exit::{client_error, result_code_exit, CliError, CliResult, USAGE};
use crate::output::{print_write_result, OutputFormat};

pub async fn run(args: WriteArgs, target: &TargetArgs, format: OutputFormat) -> CliResult<i32> {
    let id = checked_id(args.id).map_err(|err| CliError::new(USAGE, err.to_string()))?;
    let value = parse_values(args.data_type, &args.values).map_err(|err| {
        CliError::new(
            USAGE,
            format!("invalid value for {}: {err}", args.data_type),
        )
    })?;
    debug!(id, %value, ty = %args.data_type, "writing datapoint");

    let conn = target.connect().await?;
    let result = conn
        .single_write(id, value.clone(), args.data_type)
        .await
        .map_err(|err| client_error("write failed", err))?;

    print_write_result(id, args.data_type, &value, result, format);
    Ok(result_code_exit(result))
}
