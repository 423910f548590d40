//! hostkv CLI
//!
//! Drives a hostkv runtime from the command line.
//!
//! The session map only lives as long as the process, so session values
//! written by one invocation are gone by the next. Use a persistent class
//! (anything not starting with `s`) to see data survive.

use std::process;

use clap::{Parser, Subcommand};
use hostkv::{Config, ResultCode, Runtime};
use tracing_subscriber::{fmt, EnvFilter};

/// hostkv CLI
#[derive(Parser, Debug)]
#[command(name = "hostkv")]
#[command(about = "Key/value and mounted-tree storage for sandboxed database hosts")]
#[command(version)]
struct Args {
    /// Data directory
    #[arg(short, long, default_value = "./hostkv_data")]
    data_dir: String,

    /// Persistent map quota in bytes
    #[arg(long)]
    quota: Option<usize>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Print the storage key for a class/key pair
    Key { class: String, key: String },

    /// Store a value
    Put {
        class: String,
        key: String,
        value: String,

        /// Store the value through the binary-safe text codec
        #[arg(long)]
        encode: bool,
    },

    /// Read a value
    Get {
        class: String,
        key: String,

        /// Read buffer capacity, terminator included
        #[arg(short, long, default_value = "4096")]
        capacity: usize,

        /// Decode a value stored with --encode
        #[arg(long)]
        decode: bool,
    },

    /// Delete a value
    Del { class: String, key: String },

    /// Create and mount the hierarchical backend
    Mount {
        /// Mount point, e.g. /persistent
        path: Option<String>,
    },

    /// Delete a file through the default driver
    Unlink { path: String },

    /// Write, read back and delete a session value
    Smoke,
}

fn main() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,hostkv=debug"));

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .init();

    let args = Args::parse();

    let mut builder = Config::builder().data_dir(&args.data_dir);
    if let Some(quota) = args.quota {
        builder = builder.persistent_quota(quota);
    }

    let runtime = match Runtime::open(builder.build()) {
        Ok(r) => r,
        Err(e) => {
            tracing::error!("Failed to open runtime: {}", e);
            process::exit(1);
        }
    };

    let rc = run(&runtime, args.command);
    if !rc.is_success() {
        process::exit(rc.as_i32());
    }
}

fn run(runtime: &Runtime, command: Commands) -> ResultCode {
    let kv = runtime.kv();

    match command {
        Commands::Key { class, key } => {
            println!("{}", kv.codec().derive(&class, &key));
            ResultCode::Success
        }
        Commands::Put {
            class,
            key,
            value,
            encode,
        } => {
            let result = if encode {
                kv.write_encoded(&class, &key, value.as_bytes())
            } else {
                kv.write(&class, &key, value.as_bytes())
            };
            report(result.map(|()| "OK".to_string()))
        }
        Commands::Get {
            class,
            key,
            capacity,
            decode,
        } => {
            if decode {
                return report(kv.read_decoded(&class, &key).map(|value| match value {
                    Some(bytes) => String::from_utf8_lossy(&bytes).into_owned(),
                    None => "(nil)".to_string(),
                }));
            }

            let mut buf = vec![0u8; capacity];
            let n = kv.read(&class, &key, &mut buf);
            if n < 0 {
                println!("(nil)");
            } else if capacity <= 1 {
                println!("{} bytes stored", n);
            } else {
                println!("{}", String::from_utf8_lossy(&buf[..n as usize]));
            }
            ResultCode::Success
        }
        Commands::Del { class, key } => report(kv.delete(&class, &key).map(|()| "OK".to_string())),
        Commands::Mount { path } => {
            let path = path.unwrap_or_default();
            report(runtime.init_opfs(&path).map(|()| {
                format!(
                    "mounted at {}",
                    runtime.opfs().mount_point().unwrap_or_default()
                )
            }))
        }
        Commands::Unlink { path } => {
            let rc = runtime.unlink(&path);
            println!("{}", rc);
            rc
        }
        Commands::Smoke => report(runtime.smoke().map(|r| {
            format!("read={} value={:?} deleted={}", r.read, r.value, r.deleted)
        })),
    }
}

fn report(result: hostkv::Result<String>) -> ResultCode {
    match result {
        Ok(message) => {
            println!("{}", message);
            ResultCode::Success
        }
        Err(e) => {
            eprintln!("error: {}", e);
            e.code()
        }
    }
}
