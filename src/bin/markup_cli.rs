use std::fs;
use std::io::{self, Write};
use std::path::PathBuf;

use scene_markup::{ElementTag, MarkupSerializer, SerializerOptions, Severity};

const USAGE: &str = r"markup_cli (scene-markup)

USAGE:
  markup_cli check <file> [--strict]
  markup_cli format <file> [options]
  markup_cli tags                 List schema elements and their attributes

OPTIONS (check):
  --strict           Exit with status 2 when any violation is reported

OPTIONS (format):
  --out <path>       Write to this file instead of stdout
  --indent <n>       Spaces per level (default 2, 0 for a single line)
  --no-decl          Omit the XML declaration
  --overwrite        Overwrite an existing output file
  -h, --help         Show this help
";

fn main() {
    scene_markup::init_logger();
    match run() {
        Ok(code) => std::process::exit(code),
        Err(err) => {
            eprintln!("markup_cli error: {err}");
            std::process::exit(1);
        }
    }
}

fn run() -> Result<i32, String> {
    let args: Vec<String> = std::env::args().skip(1).collect();
    let mut args = Args::new(args);

    let Some(command) = args.next() else {
        print_usage();
        return Ok(0);
    };

    match command.as_str() {
        "check" => cmd_check(&mut args),
        "format" => cmd_format(&mut args),
        "tags" => cmd_tags(),
        "-h" | "--help" | "help" => {
            print_usage();
            Ok(0)
        }
        other => Err(format!("unknown command `{other}`\n\n{USAGE}")),
    }
}

fn print_usage() {
    println!("{USAGE}");
}

fn cmd_tags() -> Result<i32, String> {
    let serializer = MarkupSerializer::new().map_err(|err| err.to_string())?;
    for schema in serializer.schema().elements() {
        let type_name = ElementTag::ALL
            .iter()
            .find(|tag| tag.tag_name() == schema.tag)
            .map_or("-", |tag| tag.type_name());
        let attributes: Vec<_> = schema.attributes.iter().map(|attr| attr.name.as_str()).collect();
        println!("{:<14} {:<16} {}", schema.tag, type_name, attributes.join(" "));
    }
    Ok(0)
}

fn cmd_check(args: &mut Args) -> Result<i32, String> {
    let path = PathBuf::from(args.next().ok_or("missing input file")?);
    let mut strict = false;

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--strict" => strict = true,
            "-h" | "--help" => {
                print_usage();
                return Ok(0);
            }
            other => return Err(format!("unknown option `{other}`")),
        }
    }

    let mut serializer = MarkupSerializer::new().map_err(|err| err.to_string())?;
    let markup = serializer.read_path(&path).map_err(|err| err.to_string())?;

    for violation in &markup.violations {
        println!("{violation}");
    }

    let developer = markup
        .violations
        .iter()
        .filter(|violation| violation.severity == Severity::Developer)
        .count();
    println!(
        "{}: {} elements, {} violations ({developer} developer)",
        path.display(),
        markup.tree.len(),
        markup.violations.len(),
    );

    Ok(if strict && !markup.violations.is_empty() { 2 } else { 0 })
}

fn cmd_format(args: &mut Args) -> Result<i32, String> {
    let path = PathBuf::from(args.next().ok_or("missing input file")?);
    let mut out: Option<PathBuf> = None;
    let mut options = SerializerOptions::default();
    let mut overwrite = false;

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--out" => out = Some(PathBuf::from(args.value("--out")?)),
            "--indent" => {
                let value = args.value("--indent")?;
                options.indent = value
                    .parse()
                    .map_err(|_| format!("invalid indent `{value}`"))?;
            }
            "--no-decl" => options.xml_declaration = false,
            "--overwrite" => overwrite = true,
            "-h" | "--help" => {
                print_usage();
                return Ok(0);
            }
            other => return Err(format!("unknown option `{other}`")),
        }
    }

    let mut serializer = MarkupSerializer::new()
        .map_err(|err| err.to_string())?
        .with_options(options);
    let markup = serializer.read_path(&path).map_err(|err| err.to_string())?;
    for violation in &markup.violations {
        eprintln!("{violation}");
    }

    let written = serializer
        .write(&markup.tree, markup.root)
        .map_err(|err| err.to_string())?;
    for violation in &written.violations {
        eprintln!("{violation}");
    }

    match out {
        Some(target) => {
            if target.exists() && !overwrite {
                return Err(format!(
                    "{} already exists (use --overwrite)",
                    target.display()
                ));
            }
            fs::write(&target, written.xml.as_bytes()).map_err(|err| err.to_string())?;
        }
        None => {
            let mut stdout = io::stdout().lock();
            writeln!(stdout, "{}", written.xml).map_err(|err| err.to_string())?;
        }
    }
    Ok(0)
}

struct Args {
    args: Vec<String>,
    pos: usize,
}

impl Args {
    fn new(args: Vec<String>) -> Self {
        Self { args, pos: 0 }
    }

    fn next(&mut self) -> Option<String> {
        let arg = self.args.get(self.pos)?.clone();
        self.pos += 1;
        Some(arg)
    }

    fn value(&mut self, flag: &str) -> Result<String, String> {
        self.next().ok_or_else(|| format!("missing value for {flag}"))
    }
}
