//! Relay 二进制入口：加载配置后执行单条运维命令。

mod cli;
mod logging;

use std::sync::Arc;

use anyhow::Context;
use rt_relay::{Authorizer, FileStore, RelayConfig};

#[tokio::main]
/// 启动 relay CLI。
async fn main() -> anyhow::Result<()> {
    let args = std::env::args().skip(1).collect::<Vec<String>>();
    let command = match cli::parse(&args)? {
        cli::Parsed::Help => {
            cli::print_root_help();
            return Ok(());
        }
        cli::Parsed::Version => {
            println!("{}", env!("CARGO_PKG_VERSION"));
            return Ok(());
        }
        cli::Parsed::Run(command) => command,
    };

    let log_runtime = logging::init("relay")?;
    let config = RelayConfig::from_env().context("load relay config")?;
    let store = Arc::new(FileStore::new(config.store_path.clone()));
    let authorizer = Authorizer::new(&config, store).context("build relay authorizer")?;

    let outcome = cli::execute(command, &authorizer, &config).await?;
    drop(log_runtime);
    if outcome == cli::CliOutcome::Rejected {
        std::process::exit(1);
    }
    Ok(())
}
