// SPDX-FileCopyrightText: © 2024 Sandman contributors
// SPDX-License-Identifier: MIT

use clap::Parser;

#[derive(Debug, clap::Parser)]
#[command(long_about = None)]
struct Args {
    #[arg(short, long, default_value_t = String::from("orchestrator.toml"))]
    config_file: String,
    #[arg(short, long, default_value_t = String::from(""))]
    template: String,
    /// Path of a service description to deploy at startup.
    #[arg(short, long, default_value_t = String::from(""))]
    deploy: String,
    /// Print the version number and quit.
    #[arg(long, default_value_t = false)]
    version: bool,
}

fn main() -> anyhow::Result<()> {
    env_logger::init();

    let args = Args::parse();
    if args.version {
        println!(
            "{}.{}.{}{}{}",
            env!("CARGO_PKG_VERSION_MAJOR"),
            env!("CARGO_PKG_VERSION_MINOR"),
            env!("CARGO_PKG_VERSION_PATCH"),
            if env!("CARGO_PKG_VERSION_PRE").is_empty() { "" } else { "-" },
            env!("CARGO_PKG_VERSION_PRE")
        );
        return Ok(());
    }
    if !args.template.is_empty() {
        sandman_api::util::create_template(&args.template, sandman_orc::sandman_orc_default_conf().as_str())?;
        return Ok(());
    }
    let conf: sandman_orc::SandmanOrcSettings = toml::from_str(&std::fs::read_to_string(args.config_file)?)?;
    let deploy_path = match args.deploy.is_empty() {
        true => None,
        false => Some(args.deploy),
    };

    let async_runtime = tokio::runtime::Builder::new_multi_thread().worker_threads(8).enable_all().build()?;
    let async_tasks = vec![async_runtime.spawn(sandman_orc::sandman_orc_main(conf, deploy_path))];

    async_runtime.block_on(async { futures::future::join_all(async_tasks).await });
    Ok(())
}
