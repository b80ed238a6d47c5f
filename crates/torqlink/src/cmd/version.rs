use crate::cmd::VersionArgs;
use crate::exit::{CliResult, SUCCESS};

pub fn run(args: VersionArgs) -> CliResult<i32> {
    if !args.extended {
        println!("torqlink {}", env!("CARGO_PKG_VERSION"));
        return Ok(SUCCESS);
    }

    println!("name: torqlink");
    println!("version: {}", env!("CARGO_PKG_VERSION"));
    println!("target_os: {}", std::env::consts::OS);
    println!("target_arch: {}", std::env::consts::ARCH);
    println!(
        "build_target: {}",
        option_env!("TORQLINK_BUILD_TARGET").unwrap_or("unknown")
    );
    println!(
        "build_profile: {}",
        option_env!("TORQLINK_BUILD_PROFILE").unwrap_or("unknown")
    );
    println!(
        "features: session={}, cli=true",
        cfg!(feature = "session")
    );
    println!(
        "defaults: baud={}, timeout={}ms",
        torqlink_transport::DEFAULT_BAUD_RATE,
        torqlink_transport::DEFAULT_TIMEOUT.as_millis()
    );

    Ok(SUCCESS)
}
