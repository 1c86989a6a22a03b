//! pipeattach - Main entry point.
//!
//! Prints the pipe command for a launch configuration's `pipeTransport`.
//!
//! Usage: pipeattach [OPTIONS] <launch.json>
//!
//! Options:
//!   --version, -v        Show version
//!   --name <NAME>        Use the configuration with this name
//!   --os <TAG>           Resolve overrides for windows, osx or linux
//!   --no-quote           Don't quote arguments containing whitespace
//!   --list               List processes on the far side of the pipe
//!   --pick <PROCESS>     Resolve an attach request for the named process
//!   --check-dev-certs    Check for an HTTPS development certificate
//!
//! Without --name, the first configuration with a `pipeTransport` is used.

use std::env;
use std::path::PathBuf;

use pipeattach::config::{Config, Platform};
use pipeattach::devcerts::DevCerts;
use pipeattach::launch::{DebugConfigurationResolver, HostInfo, LaunchFile};
use pipeattach::logging;
use pipeattach::process::{NamePicker, ProcessError, RemoteAttachItemsProvider};

const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Parsed command-line options.
#[derive(Debug, Default, PartialEq, Eq)]
struct CliOptions {
    launch_path: Option<PathBuf>,
    name: Option<String>,
    os: Option<String>,
    no_quote: bool,
    list: bool,
    pick: Option<String>,
    check_dev_certs: bool,
}

impl CliOptions {
    fn parse(args: &[String]) -> Result<Self, String> {
        let mut options = Self::default();
        let mut iter = args.iter();

        while let Some(arg) = iter.next() {
            match arg.as_str() {
                "--name" => options.name = Some(Self::value(&mut iter, arg)?),
                "--os" => options.os = Some(Self::value(&mut iter, arg)?),
                "--pick" => options.pick = Some(Self::value(&mut iter, arg)?),
                "--no-quote" => options.no_quote = true,
                "--list" => options.list = true,
                "--check-dev-certs" => options.check_dev_certs = true,
                flag if flag.starts_with('-') => return Err(format!("Unknown option: {}", flag)),
                path => options.launch_path = Some(PathBuf::from(path)),
            }
        }

        Ok(options)
    }

    fn value<'a>(iter: &mut impl Iterator<Item = &'a String>, flag: &str) -> Result<String, String> {
        iter.next()
            .cloned()
            .ok_or_else(|| format!("{} requires a value", flag))
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args: Vec<String> = env::args().collect();

    if args.iter().any(|a| a == "--version" || a == "-v") {
        println!("pipeattach v{}", VERSION);
        return Ok(());
    }

    let options = CliOptions::parse(args.get(1..).unwrap_or_default())?;

    let config = Config::load()?;
    if let Err(e) = logging::init(&config.log_config) {
        eprintln!("Warning: file logging unavailable: {}", e);
    }

    let platform = match &options.os {
        Some(tag) => Platform::from_tag(tag),
        None => Platform::current(),
    };

    if options.check_dev_certs {
        let certs = DevCerts::new(&config.dotnet_cli_paths, platform);
        if certs.has_dev_certs_https() {
            println!("A trusted development certificate is installed.");
        } else {
            println!("No trusted development certificate was found.");
            std::process::exit(1);
        }
        return Ok(());
    }

    let path = options
        .launch_path
        .clone()
        .ok_or("Usage: pipeattach [OPTIONS] <launch.json>")?;
    let file = LaunchFile::load(&path)?;
    let launch = match &options.name {
        Some(name) => file.find(name)?,
        None => file
            .first_with_pipe_transport()
            .ok_or("No launch configuration has a pipeTransport")?,
    };
    tracing::info!("Using launch configuration '{}'", launch.name);

    if let Some(process) = &options.pick {
        let host = HostInfo {
            platform,
            ..HostInfo::current()
        };
        let resolver = DebugConfigurationResolver::new(host);
        let resolved = resolver.resolve(launch.clone(), &mut NamePicker::new(process.as_str()))?;
        println!("{}", serde_json::to_string_pretty(&resolved.configuration)?);
        if resolved.check_dev_cert {
            eprintln!("Note: this configuration asks for a development certificate check.");
        }
        return Ok(());
    }

    let transport = launch.require_pipe_transport()?;

    if options.list {
        let provider = RemoteAttachItemsProvider::new(transport.clone(), platform);
        let (os, items) = provider.list()?;
        println!("# remote OS: {:?}", os);
        for item in items {
            println!("{:>8}  {:<24} {}", item.id, item.name, item.command_line);
        }
        return Ok(());
    }

    let mut builder = config.pipe_command_builder();
    if options.no_quote {
        builder = builder.with_quote_args(false);
    }

    let cmd = builder
        .build_for(transport, platform)
        .ok_or(ProcessError::MissingPipeProgram)?;
    println!("{}", cmd);

    Ok(())
}
