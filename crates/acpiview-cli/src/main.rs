//! acpiview - Dump and validate ACPI tables captured from firmware
//!
//! Loads raw table dumps into a simulated physical address space, then
//! walks them with the acpiview-core engine starting from the root table.

use acpiview_core::header::{parse_signature, signature_str, TableHeader};
use acpiview_core::memory::parse_address;
use acpiview_core::{
    Console, MemoryMap, ParseContext, ParserConfig, RegistryConfig, StdoutConsole, TableRegistry,
};
use anyhow::{bail, Context, Result};
use clap::{Args, Parser};
use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::{debug, info, trace, warn, Level};
use tracing_subscriber::EnvFilter;
use walkdir::WalkDir;

/// Where tables without an address in their file name are placed
const SYNTHETIC_BASE: u64 = 0x1_0000_0000;

/// Alignment of synthetic table addresses
const SYNTHETIC_ALIGN: u64 = 0x1000;

/// Dump and validate ACPI tables captured from firmware
#[derive(Parser, Debug)]
#[command(name = "acpiview")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    #[command(flatten)]
    input: InputMode,

    /// Address of the table to start from (default: the XSDT, else the
    /// RSDT, else every loaded table)
    #[arg(long)]
    root: Option<String>,

    /// Only trace the table with this signature (others are still validated)
    #[arg(short, long)]
    select: Option<String>,

    /// Validate without tracing table contents
    #[arg(short, long)]
    quiet: bool,

    /// Skip checksum verification
    #[arg(long)]
    no_checksum: bool,

    /// Maximum depth of nested table processing
    #[arg(long, default_value = "8")]
    max_depth: usize,

    /// Verbosity level (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[derive(Args, Debug)]
#[group(required = true, multiple = true)]
struct InputMode {
    /// Table dump to load; name it `NAME@0xADDR.bin` to place it at ADDR
    #[arg(short, long)]
    table: Vec<PathBuf>,

    /// Directory of table dumps to load
    #[arg(short, long)]
    directory: Option<PathBuf>,
}

/// A table dump read from disk
#[derive(Debug)]
struct Dump {
    path: PathBuf,
    address: Option<u64>,
    data: Vec<u8>,
}

fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    // Initialize tracing
    let level = match cli.verbose {
        0 => Level::WARN,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive(level.into()))
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let select = cli
        .select
        .as_deref()
        .map(parse_signature)
        .transpose()
        .context("Invalid --select value")?;
    let root = cli
        .root
        .as_deref()
        .map(parse_address)
        .transpose()
        .context("Invalid --root value")?;

    let mut paths = cli.input.table.clone();
    if let Some(ref directory) = cli.input.directory {
        paths.extend(collect_directory(directory)?);
    }
    if paths.is_empty() {
        bail!("No table dumps found");
    }

    let dumps = load_dumps(&paths)?;
    let memory = build_memory_map(dumps)?;
    if memory.is_empty() {
        bail!("No table dumps could be loaded");
    }
    let roots = match root {
        Some(address) => vec![address],
        None => default_roots(&memory),
    };

    let registry = TableRegistry::new().with_config(
        RegistryConfig::new()
            .trace(!cli.quiet)
            .select(select)
            .verify_checksum(!cli.no_checksum),
    );
    let mut console = StdoutConsole::new();
    let mut ctx = ParseContext::new(&mut console, &memory, &registry)
        .with_config(ParserConfig::new().max_depth(cli.max_depth));

    for address in roots {
        ctx.dispatch(address);
    }
    drop(ctx);

    let errors = console.error_count();
    println!();
    println!("Table Statistics:");
    println!("  {} Error(s)", errors);

    if errors > 0 {
        Ok(ExitCode::FAILURE)
    } else {
        Ok(ExitCode::SUCCESS)
    }
}

/// Collect every regular, non-hidden file under `directory`
fn collect_directory(directory: &Path) -> Result<Vec<PathBuf>> {
    if !directory.is_dir() {
        bail!("Path is not a directory: {}", directory.display());
    }

    info!("Scanning directory: {}", directory.display());

    let mut paths = Vec::new();
    for entry in WalkDir::new(directory)
        .follow_links(false)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|e| e.ok())
    {
        let path = entry.path();
        if !path.is_file() {
            continue;
        }
        if path
            .file_name()
            .and_then(|n| n.to_str())
            .map(|n| n.starts_with('.'))
            .unwrap_or(false)
        {
            trace!("Skipping hidden file: {}", path.display());
            continue;
        }
        paths.push(path.to_path_buf());
    }

    debug!("Found {} file(s) in {}", paths.len(), directory.display());
    Ok(paths)
}

/// Read every dump, skipping files that cannot be read
fn load_dumps(paths: &[PathBuf]) -> Result<Vec<Dump>> {
    let mut dumps = Vec::with_capacity(paths.len());
    for path in paths {
        match read_dump(path)? {
            Ok(dump) => dumps.push(dump),
            Err(e) if e.is_recoverable() => warn!("Skipping {}: {}", path.display(), e),
            Err(e) => {
                return Err(e)
                    .with_context(|| format!("Failed to read table dump: {}", path.display()))
            }
        }
    }
    Ok(dumps)
}

/// Read a dump and the address encoded in its file name, if any.
///
/// A malformed file name is fatal; the read itself reports through the
/// inner result so the caller can decide whether to move on.
fn read_dump(path: &Path) -> Result<acpiview_core::Result<Dump>> {
    let address = address_from_file_name(path)?;
    let data = match fs::read(path) {
        Ok(data) => data,
        Err(e) => return Ok(Err(acpiview_core::Error::file_read(path, e))),
    };
    trace!("Read {} bytes from {}", data.len(), path.display());
    Ok(Ok(Dump {
        path: path.to_path_buf(),
        address,
        data,
    }))
}

/// `APIC@0x7fe10000.bin` -> `Some(0x7fe10000)`
fn address_from_file_name(path: &Path) -> Result<Option<u64>> {
    let Some(stem) = path.file_stem().and_then(|s| s.to_str()) else {
        return Ok(None);
    };
    let Some((_, address)) = stem.split_once('@') else {
        return Ok(None);
    };
    let address = parse_address(address)
        .with_context(|| format!("Bad address in file name: {}", path.display()))?;
    Ok(Some(address))
}

/// Map dumps with explicit addresses first, then place the rest above them
fn build_memory_map(dumps: Vec<Dump>) -> Result<MemoryMap> {
    let mut memory = MemoryMap::new();
    let (placed, floating): (Vec<_>, Vec<_>) = dumps
        .into_iter()
        .filter(|d| {
            if d.data.is_empty() {
                warn!("Skipping empty dump: {}", d.path.display());
            }
            !d.data.is_empty()
        })
        .partition(|d| d.address.is_some());

    for dump in placed {
        let address = dump.address.unwrap_or_default();
        map_dump(&mut memory, address, dump)?;
    }

    for dump in floating {
        let Some(address) = memory.next_free_address(SYNTHETIC_BASE, SYNTHETIC_ALIGN) else {
            bail!("Address space exhausted placing {}", dump.path.display());
        };
        info!("Placing {} at {:#x}", dump.path.display(), address);
        map_dump(&mut memory, address, dump)?;
    }

    Ok(memory)
}

/// Map one dump; dumps that collide with an earlier one are skipped
fn map_dump(memory: &mut MemoryMap, address: u64, dump: Dump) -> Result<()> {
    match memory.insert(address, dump.data) {
        Ok(()) => Ok(()),
        Err(e) if e.is_recoverable() => {
            warn!("Skipping {}: {}", dump.path.display(), e);
            Ok(())
        }
        Err(e) => Err(e).with_context(|| format!("Cannot map {}", dump.path.display())),
    }
}

/// The XSDT if one was loaded, else the RSDT, else every table
fn default_roots(memory: &MemoryMap) -> Vec<u64> {
    let signatures: Vec<(u64, [u8; 4])> = memory
        .iter()
        .filter_map(|(base, bytes)| TableHeader::read(bytes).ok().map(|h| (base, h.signature)))
        .collect();

    for root in [*b"XSDT", *b"RSDT"] {
        let found: Vec<u64> = signatures
            .iter()
            .filter(|(_, signature)| *signature == root)
            .map(|(base, _)| *base)
            .collect();
        if !found.is_empty() {
            debug!("Starting from {} at {:x?}", signature_str(&root), found);
            return found;
        }
    }

    memory.iter().map(|(base, _)| base).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use acpiview_core::AddressSpace;
    use tempfile::TempDir;

    fn table(signature: &[u8; 4], body: &[u8]) -> Vec<u8> {
        let mut t = Vec::new();
        t.extend_from_slice(signature);
        t.extend_from_slice(&((36 + body.len()) as u32).to_le_bytes());
        t.push(1);
        t.push(0);
        t.extend_from_slice(&[b' '; 26]);
        t.extend_from_slice(body);
        let sum = t.iter().fold(0u8, |s, &b| s.wrapping_add(b));
        t[9] = 0u8.wrapping_sub(sum);
        t
    }

    #[test]
    fn test_address_from_file_name() {
        assert_eq!(
            address_from_file_name(Path::new("/tmp/APIC@0x7fe10000.bin")).unwrap(),
            Some(0x7fe1_0000)
        );
        assert_eq!(address_from_file_name(Path::new("/tmp/APIC.bin")).unwrap(), None);
        assert!(address_from_file_name(Path::new("/tmp/APIC@zz.bin")).is_err());
    }

    #[test]
    fn test_build_memory_map_places_floating_dumps() {
        let dumps = vec![
            Dump {
                path: "FACP.bin".into(),
                address: None,
                data: table(b"FACP", &[]),
            },
            Dump {
                path: "XSDT@0x1000.bin".into(),
                address: Some(0x1000),
                data: table(b"XSDT", &[]),
            },
        ];
        let memory = build_memory_map(dumps).unwrap();
        let bases: Vec<u64> = memory.iter().map(|(base, _)| base).collect();
        assert_eq!(bases, vec![0x1000, SYNTHETIC_BASE]);
    }

    #[test]
    fn test_default_roots_prefers_xsdt() {
        let mut memory = MemoryMap::new();
        memory.insert(0x1000, table(b"RSDT", &[])).unwrap();
        memory.insert(0x2000, table(b"XSDT", &[])).unwrap();
        memory.insert(0x3000, table(b"APIC", &[0; 8])).unwrap();
        assert_eq!(default_roots(&memory), vec![0x2000]);

        let mut memory = MemoryMap::new();
        memory.insert(0x3000, table(b"APIC", &[0; 8])).unwrap();
        memory.insert(0x4000, table(b"FACP", &[])).unwrap();
        assert_eq!(default_roots(&memory), vec![0x3000, 0x4000]);
    }

    #[test]
    fn test_collect_directory_skips_hidden() {
        let temp_dir = TempDir::new().unwrap();
        fs::write(temp_dir.path().join("APIC.bin"), table(b"APIC", &[0; 8])).unwrap();
        fs::write(temp_dir.path().join(".hidden"), b"x").unwrap();
        fs::create_dir(temp_dir.path().join("nested")).unwrap();
        fs::write(
            temp_dir.path().join("nested").join("FACP@0x2000.bin"),
            table(b"FACP", &[]),
        )
        .unwrap();

        let paths = collect_directory(temp_dir.path()).unwrap();
        assert_eq!(paths.len(), 2);
        assert!(paths.iter().all(|p| !p.ends_with(".hidden")));

        let dumps = load_dumps(&paths).unwrap();
        let memory = build_memory_map(dumps).unwrap();
        assert_eq!(memory.len(), 2);
        assert!(memory.iter().any(|(base, _)| base == 0x2000));
    }

    #[test]
    fn test_empty_dumps_are_skipped_either_way() {
        let dumps = vec![
            Dump {
                path: "SSDT@0x1000.bin".into(),
                address: Some(0x1000),
                data: Vec::new(),
            },
            Dump {
                path: "SSDT.bin".into(),
                address: None,
                data: Vec::new(),
            },
            Dump {
                path: "FACP@0x2000.bin".into(),
                address: Some(0x2000),
                data: table(b"FACP", &[]),
            },
        ];
        let memory = build_memory_map(dumps).unwrap();
        let bases: Vec<u64> = memory.iter().map(|(base, _)| base).collect();
        assert_eq!(bases, vec![0x2000]);
    }

    #[test]
    fn test_overlapping_dump_is_skipped() {
        let dumps = vec![
            Dump {
                path: "XSDT@0x1000.bin".into(),
                address: Some(0x1000),
                data: table(b"XSDT", &[]),
            },
            Dump {
                path: "FACP@0x1010.bin".into(),
                address: Some(0x1010),
                data: table(b"FACP", &[]),
            },
        ];
        let memory = build_memory_map(dumps).unwrap();
        assert_eq!(memory.len(), 1);
        assert!(memory.region(0x1000).is_some());
    }

    #[test]
    fn test_unreadable_dump_is_skipped() {
        let temp_dir = TempDir::new().unwrap();
        let good = temp_dir.path().join("APIC@0x3000.bin");
        fs::write(&good, table(b"APIC", &[0; 8])).unwrap();
        let missing = temp_dir.path().join("FACP.bin");

        let dumps = load_dumps(&[missing, good]).unwrap();
        assert_eq!(dumps.len(), 1);
        assert_eq!(dumps[0].address, Some(0x3000));

        let bad_name = temp_dir.path().join("FACP@zz.bin");
        fs::write(&bad_name, table(b"FACP", &[])).unwrap();
        assert!(load_dumps(&[bad_name]).is_err());
    }

    #[test]
    fn verify_cli() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }
}
