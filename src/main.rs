use anyhow::{bail, Result};
use log::{debug, error, info};
use sharectl::{elevation, Config, LoggerSink, OpError, Operation, ServiceController};
use std::env;
use std::sync::Arc;

fn print_usage(program: &str) {
    println!("sharectl - Windows file-sharing service manager");
    println!("Version: {}", env!("CARGO_PKG_VERSION"));
    println!("\nUsage: {} <command> [OPTIONS]\n", program);
    println!("Commands:");
    println!("  enable-ftp        Enable the IIS web server role and FTP server feature");
    println!("  disable-ftp       Disable the FTP server feature and IIS web server role");
    println!("  start-ftp         Start the ftpsvc service");
    println!("  stop-ftp          Stop the ftpsvc service");
    println!("  start-iis         Launch the IIS management console");
    println!("  start-smb         Enable the SMB1Protocol feature");
    println!("  stop-smb          Disable the SMB1Protocol feature");
    println!("  start-nfs         Enable the ServicesForNFS-Server feature");
    println!("  stop-nfs          Disable the ServicesForNFS-Server feature");
    println!("  status            Report enabled/disabled for FTP, SMB and NFS");
    println!("\nOptions:");
    println!("  --help, -h        Show this help message");
    println!("  --version, -v     Show version information");
    println!("  --debug           Enable debug logging");
    println!("  --json            Print `status` output as JSON");
    println!("  --no-elevate      Fail instead of relaunching when not elevated");
    println!("\nEnvironment Variables:");
    println!("  SHARECTL_LOG_LEVEL=<level>       Default log level (error|warn|info|debug)");
    println!("  SHARECTL_AUTO_ELEVATE=<bool>     Relaunch elevated automatically");
    println!("  SHARECTL_ENGLISH_OUTPUT=<bool>   Force untranslated feature listing");
    println!("  RUST_LOG=<level>                 Override log level");
}

#[tokio::main]
async fn main() -> Result<()> {
    let args: Vec<String> = env::args().collect();

    if args.contains(&"--version".to_string()) || args.contains(&"-v".to_string()) {
        println!("sharectl {}", env!("CARGO_PKG_VERSION"));
        return Ok(());
    }

    if args.len() == 1 || args.contains(&"--help".to_string()) || args.contains(&"-h".to_string())
    {
        print_usage(&args[0]);
        return Ok(());
    }

    let debug_mode = args.contains(&"--debug".to_string());
    let json_output = args.contains(&"--json".to_string());
    let no_elevate = args.contains(&"--no-elevate".to_string());

    let config = Config::load()?;

    if debug_mode {
        env::set_var("RUST_LOG", "debug");
    } else if env::var("RUST_LOG").is_err() {
        env::set_var("RUST_LOG", &config.log_level);
    }
    env_logger::init();

    info!("sharectl {} starting", env!("CARGO_PKG_VERSION"));
    if debug_mode {
        debug!("Command line args: {:?}", args);
        debug!("Configuration: {:?}", config);
    }

    let command_name = match args.iter().skip(1).find(|a| !a.starts_with("--")) {
        Some(name) => name.as_str(),
        None => {
            print_usage(&args[0]);
            bail!("no command given");
        }
    };

    let op = match Operation::from_name(command_name) {
        Some(op) => op,
        None => bail!("unknown command `{}` (see --help)", command_name),
    };

    if op.needs_elevation() && !elevation::is_elevated() {
        if no_elevate || !config.auto_elevate {
            bail!(
                "`{}` requires administrator privileges; run from an elevated prompt",
                op.name()
            );
        }
        info!("Not elevated - relaunching with an elevation request");
        elevation::relaunch_elevated(&args[1..])?;
        return Ok(());
    }

    let controller = ServiceController::new(&config, Arc::new(LoggerSink));

    let result = match op {
        Operation::CheckStatus => match controller.check_status().await {
            Ok(statuses) => {
                if json_output {
                    println!("{}", serde_json::to_string_pretty(&statuses)?);
                }
                Ok(())
            }
            Err(e) => Err(e),
        },
        _ => controller.run(op).await,
    };

    if let Err(e) = result {
        if let OpError::CommandFailed {
            exit_code, stderr, ..
        } = &e
        {
            if elevation::detect_privilege_requirements(*exit_code, stderr) {
                error!("This looks like a privilege problem; run from an elevated prompt");
            }
        }
        error!("Operation `{}` failed: {}", op.name(), e);
        return Err(e.into());
    }

    Ok(())
}
