use ratatui_simple_markdown::Markdown;
use ratatui_simple_markdown::MarkdownOptions;
use std::env;
use std::fs;
use std::io::{self, Read};
use tracing_subscriber::EnvFilter;

fn main() -> io::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(io::stderr)
        .init();

    let args = env::args().skip(1).collect::<Vec<_>>();
    if args.iter().any(|a| a == "-h" || a == "--help") {
        print_help();
        return Ok(());
    }

    let mut width: u16 = 80;
    let mut whitelist: Vec<String> = Vec::new();
    let mut blacklist: Vec<String> = Vec::new();

    let mut i = 0;
    while i < args.len() {
        match args[i].as_str() {
            "--width" => {
                width = parse_u16(&args, &mut i, "--width")?;
            }
            "--only" => {
                whitelist = parse_list(&args, &mut i, "--only")?;
            }
            "--without" => {
                blacklist = parse_list(&args, &mut i, "--without")?;
            }
            _ => break,
        }
    }

    let input = if i < args.len() {
        fs::read_to_string(&args[i])?
    } else {
        let mut s = String::new();
        io::stdin().read_to_string(&mut s)?;
        s
    };

    let options = MarkdownOptions::default()
        .whitelist(whitelist)
        .blacklist(blacklist)
        .error_handler(|err, _| eprintln!("render failed: {err}"));
    let mut md = Markdown::new(input).with_options(options);
    for line in md.render().plain_lines(width) {
        println!("{}", line.trim_end());
    }

    Ok(())
}

fn print_help() {
    eprintln!(
        "Usage: dump [options] [path]\n\
\n\
Options:\n\
  --width <n>            Wrap width (default: 80)\n\
  --only <a,b,...>       Recognize only these rules (plus paragraph and text)\n\
  --without <a,b,...>    Recognize every rule except these\n\
  -h, --help             Show this help\n\
\n\
If [path] is omitted, reads Markdown from stdin.\n\
Set RUST_LOG=ratatui_simple_markdown=trace to see skipped constructs."
    );
}

fn parse_u16(args: &[String], i: &mut usize, flag: &str) -> io::Result<u16> {
    let v = parse_string(args, i, flag)?;
    v.parse::<u16>().map_err(|e| {
        io::Error::new(
            io::ErrorKind::InvalidInput,
            format!("{flag} invalid u16: {e}"),
        )
    })
}

fn parse_list(args: &[String], i: &mut usize, flag: &str) -> io::Result<Vec<String>> {
    let v = parse_string(args, i, flag)?;
    Ok(v.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect())
}

fn parse_string(args: &[String], i: &mut usize, flag: &str) -> io::Result<String> {
    let Some(v) = args.get(*i + 1) else {
        return Err(io::Error::new(
            io::ErrorKind::InvalidInput,
            format!("{flag} expects a value"),
        ));
    };
    *i += 2;
    Ok(v.to_string())
}
