//! Main entry point for the ziparc CLI application.
//!
//! Lists, tests and extracts archives in unzip style, and creates or
//! updates them with `-c`, `-a` and `-D`.

use anyhow::{bail, Context, Result};
use clap::Parser;
use std::fs::File;
use std::io::{self, Read, Write};
use std::path::{Component, Path, PathBuf};
use tracing_subscriber::EnvFilter;

use ziparc::zip::resolve_entry_path;
use ziparc::{Cli, ZipArchive, ZipArchiveEntry, ZipArchiveMode, ZipFile};

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(cli.log_level()));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();

    if let Some(source) = &cli.create_from {
        ZipFile::create_from_directory(source, &cli.file, cli.level, cli.include_base_directory)
            .with_context(|| format!("creating {} from {}", cli.file, source))?;
        if !cli.is_quiet() {
            println!("  created: {}", cli.file);
        }
        return Ok(());
    }

    if cli.is_update() {
        return update_archive(&cli);
    }

    let mut archive =
        ZipFile::open_read(&cli.file).with_context(|| format!("opening {}", cli.file))?;
    process_zip(&mut archive, &cli)
}

/// Process a ZIP archive based on CLI options.
///
/// - List mode (`-l` or `-v`): Display archive contents
/// - Test mode (`-t`): Check every entry's CRC-32
/// - Extract mode: Extract files matching the specified filters
fn process_zip(archive: &mut ZipArchive<File>, cli: &Cli) -> Result<()> {
    if cli.list || cli.verbose {
        return list_files(archive, cli.verbose);
    }
    if cli.test {
        return test_files(archive, cli);
    }

    // Directories are created on the way to the files inside them.
    let mut selected = Vec::new();
    for (index, entry) in archive.entries()?.iter().enumerate() {
        if is_directory_entry(entry) || !matches_filters(entry.full_name(), cli) {
            continue;
        }
        selected.push(index);
    }

    let multiple_files = cli.pipe && selected.len() > 1;
    for index in selected {
        extract_file(archive, index, cli, multiple_files)?;
    }

    Ok(())
}

fn is_directory_entry(entry: &ZipArchiveEntry) -> bool {
    entry.name().is_empty() || entry.is_directory()
}

/// Positional patterns select, `-x` patterns exclude.
fn matches_filters(name: &str, cli: &Cli) -> bool {
    if !cli.files.is_empty() {
        let selected = cli.files.iter().any(|f| {
            if has_glob_chars(f) {
                glob_match(f, name)
            } else {
                name == f || base_name(name) == f
            }
        });
        if !selected {
            return false;
        }
    }

    !cli
        .exclude
        .iter()
        .any(|x| name.contains(x.as_str()) || glob_match(x, name))
}

fn base_name(name: &str) -> &str {
    name.trim_end_matches('/').rsplit('/').next().unwrap_or(name)
}

/// List files in the ZIP archive.
///
/// - Simple format (`-l`): Just file names, one per line
/// - Verbose format (`-v`): Sizes, compression ratio, timestamp and CRC
fn list_files(archive: &ZipArchive<File>, verbose: bool) -> Result<()> {
    let entries = archive.entries()?;

    if verbose {
        println!(
            "{:>10}  {:>10}  {:>5}  {:>10}  {:>5}  {:>8}  Name",
            "Length", "Size", "Cmpr", "Date", "Time", "CRC-32"
        );
        println!("{}", "-".repeat(80));
    }

    let mut total_uncompressed = 0u64;
    let mut total_compressed = 0u64;
    let mut file_count = 0usize;

    for entry in entries {
        if !verbose {
            println!("{}", entry.full_name());
            continue;
        }

        let length = entry.length()?;
        let compressed = entry.compressed_length()?;
        println!(
            "{:>10}  {:>10}  {}  {}  {:08x}  {}",
            length,
            compressed,
            ratio(compressed, length),
            entry.last_write_time().format("%Y-%m-%d  %H:%M"),
            entry.crc32(),
            entry.full_name()
        );

        if !is_directory_entry(entry) {
            total_uncompressed += length;
            total_compressed += compressed;
            file_count += 1;
        }
    }

    if verbose {
        println!("{}", "-".repeat(80));
        println!(
            "{:>10}  {:>10}  {}  {:>31}  {} files",
            total_uncompressed,
            total_compressed,
            ratio(total_compressed, total_uncompressed),
            "",
            file_count
        );
    }

    Ok(())
}

/// Space saved as a right-aligned percentage.
fn ratio(compressed: u64, uncompressed: u64) -> String {
    if uncompressed == 0 || compressed >= uncompressed {
        return "  0%".to_string();
    }
    format!("{:>4}%", 100 - (compressed * 100 / uncompressed))
}

/// Decompress every selected entry and compare its CRC-32 with the stored
/// value.
fn test_files(archive: &ZipArchive<File>, cli: &Cli) -> Result<()> {
    let mut failures = 0usize;

    for (index, entry) in archive.entries()?.iter().enumerate() {
        if is_directory_entry(entry) || !matches_filters(entry.full_name(), cli) {
            continue;
        }

        let result = archive
            .open_read(index)
            .map_err(anyhow::Error::from)
            .and_then(|mut reader| crc_of(&mut reader));
        match result {
            Ok(crc) if crc == entry.crc32() => {
                if !cli.is_quiet() {
                    println!("    testing: {:<40} OK", entry.full_name());
                }
            }
            Ok(crc) => {
                failures += 1;
                println!(
                    "    testing: {:<40} bad CRC {:08x} (should be {:08x})",
                    entry.full_name(),
                    crc,
                    entry.crc32()
                );
            }
            Err(error) => {
                failures += 1;
                println!("    testing: {:<40} error: {error:#}", entry.full_name());
            }
        }
    }

    if failures > 0 {
        bail!("{failures} error(s) detected in {}", cli.file);
    }
    if !cli.is_very_quiet() {
        println!("No errors detected in compressed data of {}.", cli.file);
    }
    Ok(())
}

fn crc_of<R: Read>(reader: &mut R) -> Result<u32> {
    let mut hasher = crc32fast::Hasher::new();
    let mut buf = [0u8; 64 * 1024];
    loop {
        let n = reader.read(&mut buf)?;
        if n == 0 {
            return Ok(hasher.finalize());
        }
        hasher.update(&buf[..n]);
    }
}

/// Extract a single file from the archive.
///
/// - Pipe mode (`-p`): Write to stdout instead of file
/// - Custom output directory (`-d`): Extract to specified directory
/// - Junk paths (`-j`): Ignore directory structure in archive
/// - Overwrite control (`-n`, `-o`): Handle existing files
fn extract_file(
    archive: &mut ZipArchive<File>,
    index: usize,
    cli: &Cli,
    show_filename: bool,
) -> Result<()> {
    let name = archive.entry(index)?.full_name().to_string();

    if cli.pipe {
        let mut stdout = io::stdout().lock();
        if show_filename {
            writeln!(stdout, "--- {name} ---")?;
        }
        let mut reader = archive.open_read(index)?;
        io::copy(&mut reader, &mut stdout)?;
        return Ok(());
    }

    let base = PathBuf::from(cli.extract_dir.as_deref().unwrap_or("."));
    let relative = if cli.junk_paths { base_name(&name) } else { name.as_str() };
    let output_path = resolve_entry_path(&base, relative)?;

    if output_path.exists() {
        if cli.never_overwrite {
            if !cli.is_quiet() {
                eprintln!("Skipping: {name} (file exists)");
            }
            return Ok(());
        }
        if !cli.overwrite {
            if !cli.is_quiet() {
                eprintln!("Skipping: {name} (use -o to overwrite)");
            }
            return Ok(());
        }
    }

    if !cli.is_quiet() {
        println!("  extracting: {name}");
    }
    if let Some(parent) = output_path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    archive
        .extract_entry_to_file(index, &output_path, true)
        .with_context(|| format!("extracting {name}"))?;

    Ok(())
}

/// Apply `-D` deletions, then `-a` additions, in Update mode.
fn update_archive(cli: &Cli) -> Result<()> {
    let mut archive = ZipFile::open(&cli.file, ZipArchiveMode::Update)
        .with_context(|| format!("opening {} for update", cli.file))?;

    for name in &cli.delete {
        match archive.index_of(name)? {
            Some(index) => {
                archive.delete_entry(index)?;
                if !cli.is_quiet() {
                    println!("  deleting: {name}");
                }
            }
            None => eprintln!("Not found: {name}"),
        }
    }

    for path in &cli.add {
        let entry_name = entry_name_for(Path::new(path))?;
        let replaced = match archive.index_of(&entry_name)? {
            Some(index) => {
                archive.delete_entry(index)?;
                true
            }
            None => false,
        };
        archive
            .create_entry_from_file(path, &entry_name, cli.level)
            .with_context(|| format!("adding {path}"))?;
        if !cli.is_quiet() {
            let verb = if replaced { "updating" } else { "adding" };
            println!("  {verb}: {entry_name}");
        }
    }

    archive.finish()?;
    Ok(())
}

/// Archive name for a file given on the command line: its relative path
/// with `/` separators.
fn entry_name_for(path: &Path) -> Result<String> {
    let mut parts = Vec::new();
    for component in path.components() {
        match component {
            Component::Normal(part) => parts.push(part.to_string_lossy().into_owned()),
            Component::CurDir | Component::RootDir | Component::Prefix(_) => {}
            Component::ParentDir => bail!("cannot add {} with a '..' component", path.display()),
        }
    }
    if parts.is_empty() {
        bail!("cannot add {}: no file name", path.display());
    }
    Ok(parts.join("/"))
}

/// Check if a pattern contains glob wildcard characters.
fn has_glob_chars(pattern: &str) -> bool {
    pattern.contains('*') || pattern.contains('?')
}

/// Simple glob pattern matching supporting `*` and `?` wildcards.
///
/// - `*` matches zero or more characters
/// - `?` matches exactly one character
fn glob_match(pattern: &str, text: &str) -> bool {
    let pattern_chars: Vec<char> = pattern.chars().collect();
    let text_chars: Vec<char> = text.chars().collect();

    fn do_match(pattern: &[char], text: &[char]) -> bool {
        match (pattern.first(), text.first()) {
            (None, None) => true,
            (Some('*'), _) => {
                do_match(&pattern[1..], text) || (!text.is_empty() && do_match(pattern, &text[1..]))
            }
            (Some('?'), Some(_)) => do_match(&pattern[1..], &text[1..]),
            (Some(p), Some(t)) if *p == *t => do_match(&pattern[1..], &text[1..]),
            _ => false,
        }
    }

    do_match(&pattern_chars, &text_chars)
}
