use std::fs::File;

use color_print::cprintln;
use subleq_asm::{parser, Context, Error};

const HELP_TEMPLATE: &str = "\
{before-help}{name} {version}
  {about}

{usage-heading}
{tab}{usage}

{all-args}{after-help}";

#[derive(Debug, clap::Parser)]
#[clap(
    name = "subleq-asm",
    version,
    about = "Assembler for the SUBLEQ one-instruction architecture",
    help_template = HELP_TEMPLATE
)]
struct Args {
    /// Input assembly file
    input: String,

    /// Output object file
    output: String,

    /// Dump the symbol table and memory image
    #[clap(short, long)]
    dump: bool,
}

fn main() {
    use clap::Parser;

    // Historical tool behavior: a bad invocation prints usage and exits
    // with status 0. Kept for compatibility with existing build scripts.
    let args = match Args::try_parse() {
        Ok(args) => args,
        Err(err) => {
            eprint!("{}", err);
            std::process::exit(0);
        }
    };

    if let Err(err) = run(&args) {
        cprintln!("<red,bold>error</>: {}", err);
        std::process::exit(1);
    }
}

fn run(args: &Args) -> Result<(), Error> {
    println!("SUBLEQ Assembler");

    println!("1. Parse {}", args.input);
    let src = std::fs::read_to_string(&args.input)
        .map_err(|e| Error::FileOpen(args.input.clone(), e))?;
    let mut ctx = parser::assemble(&src)?;

    println!("2. Resolve Local Symbols");
    ctx.resolve_local();
    for name in ctx.pending().keys() {
        println!("  - `{}` left for the linker", name);
    }

    if args.dump {
        dump(&ctx);
    }

    println!("3. Write {}", args.output);
    let obj = ctx.into_object()?;
    let mut file =
        File::create(&args.output).map_err(|e| Error::FileCreate(args.output.clone(), e))?;
    obj.write_to(&mut file)
        .map_err(|e| Error::FileWrite(args.output.clone(), e))?;

    Ok(())
}

fn dump(ctx: &Context) {
    println!("---- symbols ----------------------------------------");
    for (name, addr) in ctx.symbols() {
        cprintln!("  <green>{:>12}</> = 0x{:04X}", name, addr);
    }
    println!("---- pending ----------------------------------------");
    for (name, addrs) in ctx.pending() {
        let addrs: Vec<String> = addrs.iter().map(|a| format!("0x{:04X}", a)).collect();
        cprintln!("  <yellow>{:>12}</> @ {}", name, addrs.join(" "));
    }
    println!("---- memory -----------------------------------------");
    for (addr, word) in ctx.mem().iter().enumerate() {
        let reloc = if ctx.relatives().contains(&(addr as u32)) {
            "r"
        } else {
            " "
        };
        println!("  {:04X}{} {:08X}", addr, reloc, word);
    }
}
