use std::io::{self, Write};
use std::{env, process};

use anyhow::Context;
use lazyseek::{commands, Config, DirStore};
use tracing::{debug, error};
use tracing_subscriber::EnvFilter;

fn usage(prog: &str) -> ! {
    eprintln!(
        "Usage: {prog} <command> [args]\n\
         \n\
         Commands:\n\
         \x20 ls                   list all objects\n\
         \x20 stat <key>           print key, size and modification time\n\
         \x20 cat <key> [offset]   write the object to stdout\n\
         \x20 size <key>           probe the object length without downloading it\n\
         \x20 sha256 <key>         print the SHA-256 of the object\n\
         \x20 zip-ls <key>         list the entries of a zip object\n\
         \n\
         Configuration is read from the file named by $LAZYSEEK_CONFIG, or from\n\
         $LAZYSEEK_ROOT, $LAZYSEEK_CHUNK_SIZE and $LAZYSEEK_LOG_LEVEL."
    );
    process::exit(1);
}

fn init_tracing(default_level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

fn run(args: &[String], store: &DirStore, out: &mut impl Write) -> anyhow::Result<()> {
    let key = args.get(2).map(String::as_str);

    match (args[1].as_str(), key) {
        ("ls", None) => commands::list(store, out),
        ("stat", Some(key)) => commands::stat(store, key, out),
        ("cat", Some(key)) => {
            let offset = match args.get(3) {
                Some(o) => Some(o.parse::<u64>().context(format!("Invalid offset {o}"))?),
                None => None,
            };
            commands::cat(store, key, offset, out).map(|_| ())
        }
        ("size", Some(key)) => commands::probe_size(store, key, out).map(|_| ()),
        ("sha256", Some(key)) => commands::digest(store, key, out).map(|_| ()),
        ("zip-ls", Some(key)) => commands::zip_list(store, key, out).map(|_| ()),
        _ => usage(&args[0]),
    }
}

fn main() -> anyhow::Result<()> {
    let args: Vec<String> = env::args().collect();

    if args.len() < 2 {
        usage(args.first().map(String::as_str).unwrap_or("lazyseek"));
    }

    let conf = Config::load().context("Could not load configuration")?;
    init_tracing(conf.log_level());
    debug!("Using {:?}", conf);

    let store = DirStore::new(&conf.root, conf.chunk_size());
    let mut stdout = io::stdout().lock();

    if let Err(e) = run(&args, &store, &mut stdout) {
        error!("{:#}", e);
        return Err(e);
    }

    stdout.flush()?;
    Ok(())
}
