use std::fs;
use std::path::PathBuf;
use std::sync::Arc;

use block_dev::{BlockDevice, RamDisk};
use simple_fs::{SharedFileSystem, SimpleFileSystem};

use super::*;

fn temp_path(name: &str) -> PathBuf {
    std::env::temp_dir().join(format!("simplefs-{}-{name}", std::process::id()))
}

fn pattern(len: usize) -> Vec<u8> {
    (0..len).map(|i| (i % 251) as u8).collect()
}

fn shared(blocks: usize) -> SharedFileSystem {
    let disk: Arc<dyn BlockDevice> = Arc::new(RamDisk::new(blocks));
    SimpleFileSystem::new(disk).into_shared()
}

fn run(fs: &SharedFileSystem, line: &str) -> String {
    let command = Command::parse_line(line).unwrap().unwrap();
    let mut out = Vec::new();
    assert_eq!(Flow::Continue, execute(fs, command, &mut out).unwrap());
    String::from_utf8(out).unwrap()
}

#[test]
fn parse_commands() {
    assert_eq!(None, Command::parse_line("").unwrap());
    assert_eq!(None, Command::parse_line("   \n").unwrap());
    assert_eq!(Some(Command::Format), Command::parse_line("format\n").unwrap());
    assert_eq!(
        Some(Command::Getsize { inumber: 3 }),
        Command::parse_line("  getsize   3 ").unwrap()
    );
    assert_eq!(
        Some(Command::Copyin {
            file: "notes.txt".into(),
            inumber: 2
        }),
        Command::parse_line("copyin notes.txt 2").unwrap()
    );
    assert_eq!(
        Some(Command::Copyout {
            inumber: 2,
            file: "out.txt".into()
        }),
        Command::parse_line("copyout 2 out.txt").unwrap()
    );
    assert_eq!(Some(Command::Quit), Command::parse_line("exit").unwrap());
    assert_eq!(Some(Command::Quit), Command::parse_line("quit").unwrap());
}

#[test]
fn parse_rejects_bad_lines() {
    assert!(Command::parse_line("frobnicate").is_err());
    assert!(Command::parse_line("delete").is_err());
    assert!(Command::parse_line("delete x").is_err());
    assert!(Command::parse_line("getsize 1 2").is_err());
}

#[test]
fn session() {
    let fs = shared(64);

    assert_eq!("create failed!\n", run(&fs, "create"));
    assert_eq!("disk formatted.\n", run(&fs, "format"));
    assert_eq!("disk mounted.\n", run(&fs, "mount"));
    assert_eq!("format failed!\n", run(&fs, "format"));
    assert_eq!("created inode 1\n", run(&fs, "create"));
    assert_eq!("created inode 2\n", run(&fs, "create"));
    assert_eq!("inode 1 has size 0\n", run(&fs, "getsize 1"));
    assert_eq!("inode 2 deleted.\n", run(&fs, "delete 2"));
    assert_eq!("delete failed!\n", run(&fs, "delete 2"));
    assert_eq!("getsize failed!\n", run(&fs, "getsize 0"));

    fs.lock().write(1, b"hello, simplefs\n", 0).unwrap();
    assert_eq!("hello, simplefs\n", run(&fs, "cat 1"));
    assert_eq!(
        "superblock:\n    magic number is valid\n    64 blocks\n    7 inode blocks\n    896 inodes\n\
         inode 1:\n    size: 16 bytes\n    direct blocks: 8\n",
        run(&fs, "debug")
    );
    assert!(run(&fs, "help").starts_with("Commands are:\n"));

    let mut out = Vec::new();
    assert_eq!(Flow::Quit, execute(&fs, Command::Quit, &mut out).unwrap());
    assert!(out.is_empty());
}

#[test]
fn copy_round_trip() {
    let fs = shared(256);
    run(&fs, "format");
    run(&fs, "mount");
    run(&fs, "create");

    let data = pattern(40000);
    let source = temp_path("copy-source");
    let target = temp_path("copy-target");
    fs::write(&source, &data).unwrap();

    assert_eq!(data.len(), copyin(&fs, &source, 1).unwrap());
    assert_eq!(40000, fs.lock().getsize(1).unwrap());

    let mut copied = Vec::new();
    assert_eq!(data.len(), copyout(&fs, 1, &mut copied).unwrap());
    assert_eq!(data, copied);

    let report = run(&fs, &format!("copyout 1 {}", target.display()));
    assert!(report.starts_with("40000 bytes copied\n"));
    assert_eq!(data, fs::read(&target).unwrap());

    fs::remove_file(source).unwrap();
    fs::remove_file(target).unwrap();
}

#[test]
fn copyin_stops_when_disk_is_full() {
    // two inode blocks leave 17 data blocks, one of them the indirect block
    let fs = shared(20);
    run(&fs, "format");
    run(&fs, "mount");
    run(&fs, "create");

    let source = temp_path("copy-full");
    fs::write(&source, pattern(100000)).unwrap();

    assert_eq!(16 * 4096, copyin(&fs, &source, 1).unwrap());
    assert_eq!(16 * 4096, fs.lock().getsize(1).unwrap());

    fs::remove_file(source).unwrap();
}

#[test]
fn copy_failures_are_reported() {
    let fs = shared(64);
    run(&fs, "format");
    run(&fs, "mount");

    let missing = temp_path("missing");
    assert!(run(&fs, &format!("copyin {} 1", missing.display())).ends_with("copy failed!\n"));

    let source = temp_path("copy-invalid");
    fs::write(&source, b"data").unwrap();
    assert_eq!(
        "copy failed!\n",
        run(&fs, &format!("copyin {} 1", source.display()))
    );
    assert_eq!("cat failed!\n", run(&fs, "cat 1"));

    fs::remove_file(source).unwrap();
}

#[test]
fn block_file_persists_across_sessions() {
    let image = temp_path("image");
    let data = pattern(30000);

    {
        let disk = Arc::new(BlockFile::open(&image, 32).unwrap());
        let fs = SimpleFileSystem::new(disk.clone()).into_shared();
        run(&fs, "format");
        run(&fs, "mount");
        run(&fs, "create");
        assert_eq!(data.len(), fs.lock().write(1, &data, 0).unwrap());
        assert!(disk.writes() > 0);
    }

    assert_eq!(32 * 4096, fs::metadata(&image).unwrap().len());

    let disk = Arc::new(BlockFile::open(&image, 32).unwrap());
    assert_eq!(32, disk.block_count());
    let fs = SimpleFileSystem::new(disk.clone()).into_shared();
    run(&fs, "mount");

    let mut copied = Vec::new();
    copyout(&fs, 1, &mut copied).unwrap();
    assert_eq!(data, copied);
    assert!(disk.reads() > 0);
    assert_eq!(0, disk.writes());

    fs::remove_file(image).unwrap();
}
