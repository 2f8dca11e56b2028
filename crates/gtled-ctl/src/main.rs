//! gtled-ctl: command-line sender for gtled controllers.

mod cmd;

use std::net::{IpAddr, Ipv4Addr, SocketAddr};

use anyhow::{bail, Context, Result};

use gtled_core::wire::{DEFAULT_PORT, DEFAULT_STREAM_CHUNK_SIZE};

const DEFAULT_LEDS: usize = 300;

// ── Options ───────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq)]
struct Options {
    host: Option<IpAddr>,
    port: u16,
    leds: usize,
    chunk: usize,
    command: Vec<String>,
}

impl Options {
    /// Discovery defaults to broadcast, everything else to a local daemon.
    fn target(&self, default_host: IpAddr) -> SocketAddr {
        SocketAddr::new(self.host.unwrap_or(default_host), self.port)
    }
}

fn parse_options(args: &[String]) -> Result<Options> {
    let mut options = Options {
        host: None,
        port: DEFAULT_PORT,
        leds: DEFAULT_LEDS,
        chunk: DEFAULT_STREAM_CHUNK_SIZE,
        command: Vec::new(),
    };

    let mut i = 0;
    while i < args.len() {
        let flag = args[i].as_str();
        match flag {
            "--host" | "--port" | "--leds" | "--chunk" => {
                i += 1;
                let value = args
                    .get(i)
                    .with_context(|| format!("{flag} requires a value"))?;
                match flag {
                    "--host" => {
                        options.host =
                            Some(value.parse().context("--host must be an IP address")?)
                    }
                    "--port" => options.port = value.parse().context("--port must be a number")?,
                    "--leds" => options.leds = value.parse().context("--leds must be a number")?,
                    _ => options.chunk = value.parse().context("--chunk must be a number")?,
                }
            }
            _ => options.command.push(args[i].clone()),
        }
        i += 1;
    }
    if options.chunk == 0 {
        bail!("--chunk must be non-zero");
    }
    Ok(options)
}

fn parse_u8(value: &str, what: &str) -> Result<u8> {
    value
        .parse()
        .with_context(|| format!("{what} must be 0-255, got {value:?}"))
}

fn parse_indices(values: &[&str]) -> Result<Vec<u16>> {
    values
        .iter()
        .map(|v| {
            v.parse()
                .with_context(|| format!("LED index must be 0-65535, got {v:?}"))
        })
        .collect()
}

fn print_usage() {
    println!("Usage: gtled-ctl [options] <command>");
    println!();
    println!("Commands:");
    println!("  discover                     Find controllers on the local network");
    println!("  config get                   Show brightness and power state");
    println!("  config set <bright> <power>  Store brightness (0-255) and power (0/1)");
    println!("  leds <index>...              Light the given LEDs white, all others off");
    println!("  fill <r> <g> <b>             Stream one frame of a single colour");
    println!();
    println!("Options:");
    println!("  --host <addr>    Controller address (default: 255.255.255.255 for discover, 127.0.0.1 otherwise)");
    println!("  --port <port>    Controller port (default: {})", DEFAULT_PORT);
    println!("  --leds <n>       Strip length for fill (default: {})", DEFAULT_LEDS);
    println!("  --chunk <bytes>  Stream chunk size for fill (default: {})", DEFAULT_STREAM_CHUNK_SIZE);
}

// ── Entry point ───────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> Result<()> {
    let args: Vec<String> = std::env::args().skip(1).collect();
    let options = parse_options(&args)?;

    let broadcast = IpAddr::V4(Ipv4Addr::BROADCAST);
    let local = IpAddr::V4(Ipv4Addr::LOCALHOST);
    let command: Vec<&str> = options.command.iter().map(String::as_str).collect();

    match command.as_slice() {
        ["discover"] => cmd::discover::cmd_discover(options.target(broadcast)).await,
        ["config", "get"] => cmd::config::cmd_config_get(options.target(local)).await,
        ["config", "set", brightness, power] => {
            cmd::config::cmd_config_set(
                options.target(local),
                parse_u8(brightness, "brightness")?,
                parse_u8(power, "power")?,
            )
            .await
        }
        ["leds", indices @ ..] => {
            cmd::leds::cmd_leds(options.target(local), &parse_indices(indices)?).await
        }
        ["fill", r, g, b] => {
            let rgb = [parse_u8(r, "r")?, parse_u8(g, "g")?, parse_u8(b, "b")?];
            cmd::leds::cmd_fill(options.target(local), options.leds, options.chunk, rgb).await
        }
        ["help"] | ["--help"] | ["-h"] | [] => {
            print_usage();
            Ok(())
        }
        other => {
            eprintln!("Unknown command: {}", other.join(" "));
            eprintln!();
            print_usage();
            std::process::exit(1);
        }
    }
}
