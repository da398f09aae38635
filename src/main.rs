use structopt::StructOpt;

use rvcc::error::SourceMetadata;
use rvcc::ir::builder::IrBuilder;
use rvcc::parser::typecheck::TypeAnnotator;
use rvcc::parser::{ActionObserver, SyntaxAnalyzer, LR_TABLE};
use rvcc::symtab::SymbolTable;

use tracing_subscriber::fmt;

fn main() {
    if let Err(ref e) = run() {
        eprintln!("{}", e);
        std::process::exit(1);
    }
}

fn run() -> Result<(), anyhow::Error> {
    use std::fs;
    use std::io::Write;

    let opt = Opt::from_args();

    if let Some((_, filter)) = std::env::vars().find(|x| x.0 == "RVCC_TRACE") {
        fmt::Subscriber::builder()
            .with_ansi(true)
            .pretty()
            .with_env_filter(filter)
            .init();
    }

    let filename = opt.file;
    let file = fs::read_to_string(&filename)?;
    let out_file = opt.output.unwrap_or_else(|| filename.with_extension("s"));
    let meta = SourceMetadata::new(&file).with_file(filename);

    let mut symbols = SymbolTable::new();
    let tokens = rvcc::lexer::tokenize(&meta, &mut symbols)?;
    if let Some(path) = &opt.dump_tokens {
        write_lines(path, tokens.iter().map(|t| t.to_string()))?;
    }

    let mut builder = IrBuilder::new();
    {
        let mut annotator = TypeAnnotator::new(&mut symbols);
        let mut observers: [&mut dyn ActionObserver; 2] = [&mut builder, &mut annotator];
        SyntaxAnalyzer::new(tokens, &LR_TABLE, &meta).run(&mut observers)?;
    }
    if let Some(path) = &opt.dump_symbols {
        write_lines(path, symbols.dump_lines())?;
    }

    let (ir, temps) = builder.into_ir();
    log::debug!("generated IR: {ir:?}");
    if let Some(path) = &opt.dump_ir {
        write_lines(path, ir.iter().map(|i| i.to_string()))?;
    }

    let output = rvcc::asmgen::codegen(ir, temps)?;

    let mut file = fs::File::create(out_file)?;
    for x in output {
        writeln!(file, "{}", x)?;
    }

    Ok(())
}

fn write_lines<S: AsRef<str>>(
    path: &std::path::Path,
    lines: impl IntoIterator<Item = S>,
) -> std::io::Result<()> {
    use std::io::Write;
    let mut file = std::fs::File::create(path)?;
    for line in lines {
        writeln!(file, "{}", line.as_ref())?;
    }
    Ok(())
}

#[derive(Debug, StructOpt)]
struct Opt {
    /// The file to compile
    #[structopt(parse(from_os_str))]
    file: std::path::PathBuf,
    /// The (optional) output file
    #[structopt(short = "o", long = "output", parse(from_os_str))]
    output: Option<std::path::PathBuf>,
    /// Write the scanned token list here
    #[structopt(long = "dump-tokens", parse(from_os_str))]
    dump_tokens: Option<std::path::PathBuf>,
    /// Write the generated IR here
    #[structopt(long = "dump-ir", parse(from_os_str))]
    dump_ir: Option<std::path::PathBuf>,
    /// Write the symbol table here
    #[structopt(long = "dump-symbols", parse(from_os_str))]
    dump_symbols: Option<std::path::PathBuf>,
}
