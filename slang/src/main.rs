use clap::Parser;
use color_print::cprintln;

use slang::{CodeObject, Config, Document, Error};

#[derive(Parser, Debug)]
#[clap(
    name = "slang Compiler",
    author = "kanade-k-1228",
    version = "v1.0.0",
    about = "Compiles slang syntax trees into stack machine images"
)]
struct Args {
    #[arg(default_value = "main.slang.yaml")]
    input_file: String,

    #[arg(short, long, default_value = "main.slang.json")]
    output_file: String,

    #[arg(short, long)]
    config: Option<String>,

    #[arg(short, long)]
    listing: bool,

    #[arg(short, long)]
    run: bool,
}

fn main() {
    env_logger::init();
    let args = Args::parse();
    println!("slang Compiler");

    println!("+-----------------------------------------------+");
    println!("| {:<45} |", args.input_file);
    println!("+-----------------------------------------------+");

    if let Err(e) = run(&args) {
        cprintln!("<red,bold>Error</>: {}", e);
        std::process::exit(1);
    }

    println!("=================================================");
}

fn run(args: &Args) -> Result<(), Error> {
    let config = match &args.config {
        Some(path) => Config::load(path)?,
        None => Config::default(),
    };

    println!("[LOAD]");
    let doc = Document::load(&args.input_file)?;
    let mut obj = CodeObject::new(config)?;
    let decls = doc.lower(&mut obj.atoms)?;

    println!("[COMPILE]");
    let compiled = obj.compile(decls);
    if !obj.machine.infolog.is_empty() {
        print!("{}", obj.machine.infolog.text());
    }
    compiled?;
    for entry in &obj.exports.data {
        cprintln!(
            " <green>{:<10}</> {:<16} @ {}",
            entry.class,
            entry.quantity.name,
            entry.address
        );
    }

    if args.listing {
        println!("[LISTING]");
        print!("{}", obj.stream.listing());
    }

    obj.image().save(&args.output_file)?;
    println!("[SAVE] {}", args.output_file);

    if args.run {
        println!("[RUN]");
        obj.machine.infolog.clear();
        let killed = obj.execute("@main")?;
        if killed {
            println!(" * Fragment discarded");
        }
        if obj.machine.depth() > 0 {
            println!(" * Top of stack: {}", obj.machine.top_float(0)?);
        }
        if !obj.machine.infolog.is_empty() {
            print!("{}", obj.machine.infolog.text());
        }
    }
    Ok(())
}
