use electabuzz_frame::VERSION;
use electabuzz_transport::DEFAULT_PORT;

use crate::cmd::VersionArgs;
use crate::exit::{CliResult, SUCCESS};

pub fn run(args: VersionArgs) -> CliResult<i32> {
    if !args.extended {
        println!("electabuzz {}", env!("CARGO_PKG_VERSION"));
        return Ok(SUCCESS);
    }

    println!("name: electabuzz");
    println!("version: {}", env!("CARGO_PKG_VERSION"));
    println!("protocol_version: {VERSION}");
    println!("default_port: {DEFAULT_PORT}");
    println!(
        "target: {}",
        option_env!("ELECTABUZZ_BUILD_TARGET").unwrap_or("unknown")
    );
    println!("target_os: {}", std::env::consts::OS);
    println!("target_arch: {}", std::env::consts::ARCH);
    println!(
        "rustc: {}",
        option_env!("RUSTC_VERSION").unwrap_or("unknown")
    );
    println!("git_hash: {}", option_env!("GIT_HASH").unwrap_or("unknown"));

    Ok(SUCCESS)
}
