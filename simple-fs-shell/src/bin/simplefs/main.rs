mod cli;

use std::io;
use std::io::BufRead;
use std::io::Write;
use std::sync::Arc;

use clap::Parser;
use cli::Cli;
use simple_fs::SimpleFileSystem;
use simple_fs_shell::{execute, BlockFile, Command, Flow};

fn main() -> io::Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    let disk = Arc::new(BlockFile::open(&cli.image, cli.nblocks)?);
    println!(
        "opened emulated disk image {} with {} blocks",
        cli.image.display(),
        cli.nblocks
    );

    let fs = SimpleFileSystem::new(disk.clone()).into_shared();
    let stdin = io::stdin();
    let mut stdout = io::stdout();
    let mut line = String::new();

    loop {
        print!(" simplefs> ");
        stdout.flush()?;

        line.clear();
        if stdin.lock().read_line(&mut line)? == 0 {
            break;
        }

        let command = match Command::parse_line(&line) {
            Ok(Some(command)) => command,
            Ok(None) => continue,
            Err(err) => {
                println!("{err}");
                continue;
            }
        };

        if execute(&fs, command, &mut stdout)? == Flow::Quit {
            break;
        }
    }

    println!("closing emulated disk.");
    println!("{} disk block reads", disk.reads());
    println!("{} disk block writes", disk.writes());

    Ok(())
}
