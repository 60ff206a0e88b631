use clap::Parser;
use color_print::cprintln;

use emu::hooks::{dump::Dump, trace::Trace, Hook};
use emu::{Backend, Image, Interpreter, Monitor};

#[derive(Parser, Debug)]
#[clap(
    name = "slang Emulator",
    author = "kanade-k-1228",
    version = "v1.0.0",
    about = "Runs compiled slang program images"
)]
struct Args {
    #[arg(short = 't', long)]
    tmax: Option<u64>,

    #[arg(short, long)]
    dump_cfg: Option<String>,

    #[arg(short = 'a', long)]
    dump_all: bool,

    #[arg(short = 'v', long)]
    trace: bool,

    #[arg(short, long, default_value = "@main")]
    entry: String,

    #[arg(default_value = "main.slang.json")]
    input_file: String,
}

fn main() {
    env_logger::init();
    let args = Args::parse();
    println!("slang Emulator");

    println!("+-----------------------------------------------+");
    println!("| {:<45} |", args.input_file);
    println!("+-----------------------------------------------+");

    if let Err(e) = run(&args) {
        cprintln!("<red,bold>Error</>: {}", e);
        std::process::exit(1);
    }

    println!("=================================================");
}

fn run(args: &Args) -> Result<(), emu::Error> {
    let image = Image::load(&args.input_file)?;
    let mut machine = image.machine(&args.entry)?;

    println!("[INIT]");
    let hooks: Vec<Box<dyn Hook>> = vec![
        Box::new(Dump::arg(args.dump_cfg.clone(), args.dump_all)?),
        Box::new(Trace::arg(args.trace)),
    ];
    let mut backend = Monitor::new(Interpreter::new().with_max_steps(args.tmax), hooks);

    println!("[RUN]");
    backend.run(&image.code, &mut machine)?;

    println!("[EXIT]");
    if machine.kill {
        cprintln!(" * <yellow>Fragment discarded</>");
    }
    if machine.depth() > 0 {
        println!(" * Top of stack: {}", machine.top_float(0)?);
    }
    if !machine.infolog.is_empty() {
        print!("{}", machine.infolog.text());
    }
    Ok(())
}
