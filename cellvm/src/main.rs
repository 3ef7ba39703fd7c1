use clap::Parser as ClapParser;
use std::process;

use cellvm::{
    Address, DEFAULT_SLOTS, ExecutionContext, ImageLoader, Result, VM, VMCreateInfo,
};

#[derive(ClapParser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Number of memory cells
    #[arg(long, default_value_t = DEFAULT_SLOTS)]
    slots: usize,

    /// Print the first N cells after loading
    #[arg(long, value_name = "N", help = "Dump the first N cells before running")]
    dump: Option<usize>,

    /// Log filter used when RUST_LOG is unset
    #[arg(long, default_value = "info")]
    log_level: String,
}

fn main() {
    let cli = Cli::parse();

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(&cli.log_level))
        .init();

    if let Err(err) = run(&cli) {
        log::error!("{err}");
        process::exit(1);
    }
}

fn run(cli: &Cli) -> Result<()> {
    let mut vm = VM::new(VMCreateInfo { slots: cli.slots })?;
    // TODO: load firmware translated from an assembly definition instead of the stub
    vm.load(&ImageLoader::bootstrap())?;

    if let Some(count) = cli.dump {
        for (slot, cell) in vm.memory().cells(count) {
            println!("{:>6}  {cell}", slot.raw());
        }
    }

    let mut trace = |pc: Address, opcodes: &[u32], _: &mut ExecutionContext<'_>| -> Result<()> {
        log::info!("instruction sequence at {pc}: {opcodes:?}");
        Ok(())
    };
    let report = vm.run(&mut trace)?;
    log::info!(
        "halted: {} chains dispatched, {} opcodes",
        report.dispatched,
        report.opcodes
    );
    Ok(())
}
