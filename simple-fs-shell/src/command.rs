use std::fmt::Display;
use std::fs::File;
use std::io::{self, Write};
use std::path::PathBuf;

use clap::Parser;
use simple_fs::SharedFileSystem;

use crate::{copyin, copyout};

/// One line typed at the `simplefs>` prompt.
#[derive(Debug, Parser, PartialEq, Eq)]
#[command(no_binary_name = true, disable_help_subcommand = true)]
pub enum Command {
    /// Write a new filesystem onto the disk image
    Format,
    /// Check the superblock and rebuild the free block bitmap
    Mount,
    /// Print the superblock and every valid inode
    Debug,
    /// Allocate a new inode
    Create,
    /// Print the size of an inode
    Getsize { inumber: u32 },
    /// Free an inode and all of its blocks
    Delete { inumber: u32 },
    /// Print the content of an inode
    Cat { inumber: u32 },
    /// Copy a host file into an inode
    Copyin { file: PathBuf, inumber: u32 },
    /// Copy an inode into a host file
    Copyout { inumber: u32, file: PathBuf },
    /// List the commands
    Help,
    /// Leave the shell
    #[command(alias = "exit")]
    Quit,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Quit,
}

impl Command {
    /// `Ok(None)` for a blank line.
    pub fn parse_line(line: &str) -> Result<Option<Self>, clap::Error> {
        let mut args = line.split_whitespace().peekable();
        if args.peek().is_none() {
            return Ok(None);
        }

        Self::try_parse_from(args).map(Some)
    }
}

const HELP: &str = "\
Commands are:
    format
    mount
    debug
    create
    getsize <inode>
    delete  <inode>
    cat     <inode>
    copyin  <file> <inode>
    copyout <inode> <file>
    help
    quit
    exit
";

/// Runs one command against the shared engine, reporting to `out`.
///
/// Filesystem failures are reported and never end the session.
pub fn execute(fs: &SharedFileSystem, command: Command, out: &mut impl Write) -> io::Result<Flow> {
    match command {
        Command::Format => match fs.lock().format() {
            Ok(()) => writeln!(out, "disk formatted.")?,
            Err(err) => failed(out, "format", err)?,
        },
        Command::Mount => match fs.lock().mount() {
            Ok(()) => writeln!(out, "disk mounted.")?,
            Err(err) => failed(out, "mount", err)?,
        },
        Command::Debug => match fs.lock().debug() {
            Ok(report) => write!(out, "{report}")?,
            Err(err) => failed(out, "debug", err)?,
        },
        Command::Create => match fs.lock().create() {
            Ok(inumber) => writeln!(out, "created inode {inumber}")?,
            Err(err) => failed(out, "create", err)?,
        },
        Command::Getsize { inumber } => match fs.lock().getsize(inumber) {
            Ok(size) => writeln!(out, "inode {inumber} has size {size}")?,
            Err(err) => failed(out, "getsize", err)?,
        },
        Command::Delete { inumber } => match fs.lock().delete(inumber) {
            Ok(()) => writeln!(out, "inode {inumber} deleted.")?,
            Err(err) => failed(out, "delete", err)?,
        },
        Command::Cat { inumber } => {
            if let Err(err) = copyout(fs, inumber, &mut *out) {
                failed(out, "cat", err)?;
            }
        }
        Command::Copyin { file, inumber } => match copyin(fs, &file, inumber) {
            Ok(copied) => {
                writeln!(out, "{copied} bytes copied")?;
                writeln!(out, "copied file {} to inode {inumber}", file.display())?;
            }
            Err(err) => failed(out, "copy", err)?,
        },
        Command::Copyout { inumber, file } => {
            match File::create(&file).and_then(|mut host| copyout(fs, inumber, &mut host)) {
                Ok(copied) => {
                    writeln!(out, "{copied} bytes copied")?;
                    writeln!(out, "copied inode {inumber} to file {}", file.display())?;
                }
                Err(err) => failed(out, "copy", err)?,
            }
        }
        Command::Help => out.write_all(HELP.as_bytes())?,
        Command::Quit => return Ok(Flow::Quit),
    }

    Ok(Flow::Continue)
}

/// The reason goes to the log; the terminal only learns which command failed.
fn failed(out: &mut impl Write, command: &str, err: impl Display) -> io::Result<()> {
    log::warn!("{command}: {err}");
    writeln!(out, "{command} failed!")
}
