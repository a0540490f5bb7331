use std::fs;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use anyhow::Context;
use clap::{ArgAction, Parser, Subcommand};
use globset::{Glob, GlobSetBuilder};
use image::{ImageReader, RgbaImage};
use serde::Deserialize;
use skypack_core::config::{PackConfig, PivotAlignment, SortOrder};
use skypack_core::{SpriteSheet, pack_sprites};
use tracing::{error, info, warn};
use walkdir::WalkDir;

mod manifest;

use manifest::Manifest;

#[derive(Parser, Debug)]
#[command(
    name = "skypack",
    about = "Trim, deduplicate and pack sprites into atlas pages",
    version,
    author
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
    /// Show progress bars (disable with --progress false or --quiet)
    #[arg(long, default_value_t = true, action=ArgAction::Set, global=true, help_heading = "Logging/UX")]
    progress: bool,
    /// Increase verbosity (-v, -vv)
    #[arg(short, long, action=ArgAction::Count, global=true, help_heading = "Logging/UX")]
    verbose: u8,
    /// Quiet mode (overrides verbose)
    #[arg(
        short,
        long,
        default_value_t = false,
        global = true,
        help_heading = "Logging/UX"
    )]
    quiet: bool,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Pack sprites into atlas pages
    Pack(PackArgs),
    /// Simple timing bench (packs once, prints time + occupancy)
    Bench(BenchArgs),
}

#[derive(Parser, Debug, Clone)]
struct PackArgs {
    // Input/Output
    /// Image file, image directory, or sprite-sheet manifest (.json)
    #[arg(help_heading = "Input/Output")]
    input: PathBuf,
    /// Output directory
    #[arg(short, long, default_value = "out", help_heading = "Input/Output")]
    out_dir: PathBuf,
    /// Atlas base name (files will be name.png, name_1.png, ..., name.json)
    #[arg(short, long, default_value = "atlas", help_heading = "Input/Output")]
    name: String,
    /// YAML config file path (values override command-line options)
    #[arg(long, help_heading = "Input/Output")]
    config: Option<PathBuf>,
    /// Include patterns (glob). If set, only files matching any pattern are considered
    #[arg(long, help_heading = "Input/Output")]
    include: Vec<String>,
    /// Exclude patterns (glob). Files matching any pattern will be ignored
    #[arg(long, help_heading = "Input/Output")]
    exclude: Vec<String>,

    // Layout
    /// Atlas page width
    #[arg(long, default_value_t = 2048, help_heading = "Layout")]
    width: u32,
    /// Atlas page height
    #[arg(long, default_value_t = 2048, help_heading = "Layout")]
    height: u32,
    /// Sort order: width_desc|area_desc|height_desc|none
    #[arg(long, default_value = "width_desc", help_heading = "Layout")]
    sort_order: String,
    /// Pixels added around every sprite while packing: N or X,Y
    #[arg(long, default_value = "1,1", value_parser = parse_pair, help_heading = "Layout")]
    spacing: (u32, u32),

    // Heuristics
    /// Max rise above the lowest skyline point before a placement loses priority (default: 3/4 of height)
    #[arg(long, help_heading = "Heuristics")]
    spread_factor: Option<u32>,
    /// Window for the adjacent-gap waste penalty (default: narrowest pending sprite)
    #[arg(long, help_heading = "Heuristics")]
    h_spread: Option<u32>,
    /// Skyline gaps narrower than this are filled (default: narrowest pending sprite)
    #[arg(long, help_heading = "Heuristics")]
    min_gap: Option<u32>,

    // Image Processing
    /// Trim background borders
    #[arg(long, default_value_t = true, action=ArgAction::Set, help_heading = "Image Processing")]
    trim: bool,
    /// Background colour for trimming: R,G,B,A or #RRGGBBAA
    #[arg(long, default_value = "0,0,0,0", value_parser = parse_color, help_heading = "Image Processing")]
    trim_color: [u8; 4],
    /// Pixels kept around trimmed content: N or X,Y
    #[arg(long, default_value = "2,2", value_parser = parse_pair, help_heading = "Image Processing")]
    margin: (u32, u32),
    /// Collapse pixel-identical sprites
    #[arg(long, default_value_t = true, action=ArgAction::Set, help_heading = "Image Processing")]
    dedup: bool,
    /// Pivot for sprites without one: center|top-left|...|bottom-right|custom:X,Y|pixel:X,Y
    #[arg(long, default_value = "center", help_heading = "Image Processing")]
    pivot: String,
    /// Draw red outlines (debug)
    #[arg(long, default_value_t = false, help_heading = "Image Processing")]
    outlines: bool,
    /// Trim/checksum/blit on multiple threads (requires core feature `parallel`)
    #[arg(long, default_value_t = false, help_heading = "Image Processing")]
    parallel: bool,

    // Export
    /// Metadata format: json-hash | json-array | json (alias of json-array)
    #[arg(long, default_value = "json-hash", help_heading = "Export")]
    metadata: String,
    /// Export packing stats (JSON) to this file
    #[arg(long, help_heading = "Export")]
    export_stats: Option<PathBuf>,
    /// Print the merged configuration (after CLI/YAML) and exit
    #[arg(long, default_value_t = false, help_heading = "Export")]
    print_config: bool,
    /// Output format for --print-config: json|yaml
    #[arg(long, default_value = "json", value_parser = ["json", "yaml"], help_heading = "Export")]
    print_config_format: String,
    /// Dry run: pack and report stats but do not write files
    #[arg(long, default_value_t = false, help_heading = "Export")]
    dry_run: bool,
}

#[derive(Parser, Debug, Clone)]
struct BenchArgs {
    /// Image directory or sprite-sheet manifest
    input: PathBuf,
    /// Atlas page width
    #[arg(long, default_value_t = 2048)]
    width: u32,
    /// Atlas page height
    #[arg(long, default_value_t = 2048)]
    height: u32,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing_with_level(cli.quiet, cli.verbose);
    match &cli.command {
        Commands::Pack(args) => run_pack(args, cli.progress && !cli.quiet),
        Commands::Bench(b) => run_bench(b),
    }
}

fn run_pack(cli: &PackArgs, show_progress: bool) -> anyhow::Result<()> {
    let mut cfg = PackConfig {
        atlas_width: cli.width,
        atlas_height: cli.height,
        trim: cli.trim,
        trim_color: cli.trim_color,
        trim_margin: cli.margin,
        spacing: cli.spacing,
        dedup: cli.dedup,
        sort_order: parse_sort_order(&cli.sort_order)?,
        spread_factor: cli.spread_factor,
        h_spread: cli.h_spread,
        min_gap_width: cli.min_gap,
        parallel: cli.parallel,
        outlines: cli.outlines,
    };
    let mut pivot = parse_pivot(&cli.pivot)?;

    // Config file values win over flags
    if let Some(path) = &cli.config {
        let file =
            fs::read_to_string(path).with_context(|| format!("read config {}", path.display()))?;
        let y: YamlConfig = serde_yaml::from_str(&file)
            .with_context(|| format!("parse config {}", path.display()))?;
        if let Some(p) = &y.pivot {
            pivot = parse_pivot(p)?;
        }
        cfg = y.into_pack_config(cfg)?;
    }
    cfg.validate().context("invalid configuration")?;
    if runs_sequential_despite_flag(&cfg) {
        warn!("parallel requested but skypack was built without the `parallel` feature; running sequentially");
    }

    if cli.print_config {
        match cli.print_config_format.as_str() {
            "yaml" => println!("{}", serde_yaml::to_string(&cfg)?),
            _ => println!("{}", serde_json::to_string_pretty(&cfg)?),
        }
        return Ok(());
    }

    let sheets = load_sheets(&cli.input, &cli.include, &cli.exclude, pivot, show_progress)?;
    info!(
        sheets = sheets.len(),
        sprites = sheets.iter().map(|s| s.sprites.len()).sum::<usize>(),
        "loaded input"
    );

    let out = pack_sprites(&sheets, &cfg)?;
    let page_names = page_file_names(&cli.name, out.pages.len());

    if !cli.dry_run {
        fs::create_dir_all(&cli.out_dir)
            .with_context(|| format!("create out_dir {}", cli.out_dir.display()))?;
        for (p, file) in out.pages.iter().zip(&page_names) {
            let png_path = cli.out_dir.join(file);
            p.rgba
                .save(&png_path)
                .with_context(|| format!("write {}", png_path.display()))?;
            info!(?png_path, id = p.page.id, "wrote page");
        }
    }

    let stats = out.stats();
    info!(
        pages = stats.num_pages,
        sprites = stats.num_sprites,
        aliases = stats.num_aliases,
        used_area = stats.used_area,
        total_area = stats.total_page_area,
        occupancy = format!("{:.2}%", stats.occupancy * 100.0),
        "stats"
    );

    let mut json_value = match cli.metadata.as_str() {
        "json-hash" => skypack_core::to_json_hash(&out.atlas),
        "json-array" | "json" => skypack_core::to_json_array(&out.atlas),
        other => anyhow::bail!("unknown metadata format: {}", other),
    };
    if let Some(meta) = json_value.get_mut("meta").and_then(|m| m.as_object_mut()) {
        meta.insert("images".into(), serde_json::json!(page_names));
    }
    if !cli.dry_run {
        let json_path = cli.out_dir.join(format!("{}.json", cli.name));
        let json = serde_json::to_string_pretty(&json_value)?;
        fs::write(&json_path, json).with_context(|| format!("write {}", json_path.display()))?;
        info!(?json_path, pages = out.pages.len(), "atlas written");
    }

    if let Some(stats_path) = &cli.export_stats {
        let value = serde_json::to_value(stats)?;
        if !cli.dry_run {
            fs::write(stats_path, serde_json::to_string_pretty(&value)?)
                .with_context(|| format!("write {}", stats_path.display()))?;
            info!(?stats_path, "stats exported");
        } else {
            println!("{}", stats.summary());
        }
    }
    Ok(())
}

/// `--parallel` only takes effect when the core was built with its `parallel` feature.
fn runs_sequential_despite_flag(cfg: &PackConfig) -> bool {
    cfg.parallel && !cfg!(feature = "parallel")
}

fn run_bench(b: &BenchArgs) -> anyhow::Result<()> {
    let sheets = load_sheets(&b.input, &[], &[], PivotAlignment::Center, false)?;
    let cfg = PackConfig::builder()
        .with_atlas_size(b.width, b.height)
        .build();
    let start = Instant::now();
    let out = pack_sprites(&sheets, &cfg)?;
    let dur = start.elapsed();
    let stats = out.stats();
    println!(
        "pages={} sprites={} occupancy={:.2}% wasted={}px² time={}",
        stats.num_pages,
        stats.num_sprites,
        stats.occupancy * 100.0,
        stats.wasted_area(),
        bench_fmt_dur(dur)
    );
    Ok(())
}

fn bench_fmt_dur(d: Duration) -> String {
    let ms = d.as_secs_f64() * 1000.0;
    if ms >= 1.0 {
        format!("{:.1}ms", ms)
    } else {
        format!("{}us", d.as_micros())
    }
}

/// First page is `name.png`, the rest `name_1.png`, `name_2.png`, ...
fn page_file_names(name: &str, pages: usize) -> Vec<String> {
    (0..pages)
        .map(|i| {
            if i == 0 {
                format!("{name}.png")
            } else {
                format!("{name}_{i}.png")
            }
        })
        .collect()
}

fn load_sheets(
    input: &Path,
    include: &[String],
    exclude: &[String],
    pivot: PivotAlignment,
    progress: bool,
) -> anyhow::Result<Vec<SpriteSheet<RgbaImage>>> {
    if is_manifest(input) {
        let manifest = Manifest::load(input)?;
        let image_path = manifest.image_path(input);
        let rgba = load_image(&image_path)
            .with_context(|| format!("load sheet image {}", image_path.display()))?;
        let sprites = manifest.sprites(pivot)?;
        return Ok(vec![SpriteSheet::new(rgba, sprites)]);
    }
    let paths = gather_paths(input, include, exclude)?;
    load_images_with_progress(input, &paths, pivot, progress)
}

fn is_manifest(p: &Path) -> bool {
    p.is_file()
        && p.extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case("json"))
}

fn gather_paths(
    path: &Path,
    include: &[String],
    exclude: &[String],
) -> anyhow::Result<Vec<PathBuf>> {
    let mut inc_set = None;
    if !include.is_empty() {
        let mut b = GlobSetBuilder::new();
        for pat in include {
            b.add(Glob::new(pat)?);
        }
        inc_set = Some(b.build()?);
    }
    let mut exc_set = None;
    if !exclude.is_empty() {
        let mut b = GlobSetBuilder::new();
        for pat in exclude {
            b.add(Glob::new(pat)?);
        }
        exc_set = Some(b.build()?);
    }
    let mut list: Vec<PathBuf> = Vec::new();
    if path.is_file() {
        if !should_skip(path, inc_set.as_ref(), exc_set.as_ref()) && is_image(path) {
            list.push(path.to_path_buf());
        }
    } else {
        // sorted so sprite order (and with it dedup and packing) is stable across platforms
        for entry in WalkDir::new(path)
            .sort_by_file_name()
            .into_iter()
            .filter_map(|e| e.ok())
        {
            let p = entry.path();
            if p.is_file() && !should_skip(p, inc_set.as_ref(), exc_set.as_ref()) && is_image(p) {
                list.push(p.to_path_buf());
            }
        }
    }
    Ok(list)
}

fn should_skip(
    p: &Path,
    include: Option<&globset::GlobSet>,
    exclude: Option<&globset::GlobSet>,
) -> bool {
    let s = p.to_string_lossy().replace('\\', "/");
    if let Some(ex) = exclude {
        if ex.is_match(&s) {
            return true;
        }
    }
    if let Some(inc) = include {
        if !inc.is_match(&s) {
            return true;
        }
    }
    false
}

fn is_image(p: &Path) -> bool {
    matches!(
        p.extension()
            .and_then(|e| e.to_str())
            .map(|s| s.to_ascii_lowercase()),
        Some(ext) if matches!(ext.as_str(), "png" | "jpg" | "jpeg" | "bmp" | "tga" | "gif")
    )
}

/// Sprite name: path relative to the input root, `/`-separated, without extension.
fn sprite_name(root: &Path, p: &Path) -> String {
    let rel = p.strip_prefix(root).ok().filter(|r| !r.as_os_str().is_empty());
    let rel = rel.unwrap_or_else(|| Path::new(p.file_name().unwrap_or(p.as_os_str())));
    rel.with_extension("")
        .to_string_lossy()
        .replace('\\', "/")
}

fn load_images_with_progress(
    root: &Path,
    paths: &[PathBuf],
    pivot: PivotAlignment,
    progress: bool,
) -> anyhow::Result<Vec<SpriteSheet<RgbaImage>>> {
    use indicatif::{ProgressBar, ProgressStyle};
    let bar = if progress {
        let b = ProgressBar::new(paths.len() as u64);
        b.set_style(ProgressStyle::with_template(
            "{spinner:.green} loading {pos}/{len} [{elapsed_precise}] {wide_msg}",
        )?);
        Some(b)
    } else {
        None
    };
    let mut list = Vec::with_capacity(paths.len());
    for p in paths {
        let msg = p.file_name().and_then(|s| s.to_str()).unwrap_or("");
        if let Some(b) = &bar {
            b.set_message(msg.to_string());
        }
        match load_image(p) {
            Ok(rgba) => {
                let align = pivot.resolve(rgba.width(), rgba.height());
                list.push(SpriteSheet::single(sprite_name(root, p), rgba, align));
            }
            Err(e) => {
                error!(?p, error = %e, "skip image");
            }
        }
        if let Some(b) = &bar {
            b.inc(1);
        }
    }
    if let Some(b) = &bar {
        b.finish_and_clear();
    }
    Ok(list)
}

fn load_image(p: &Path) -> anyhow::Result<RgbaImage> {
    let img = ImageReader::open(p)?.with_guessed_format()?.decode()?;
    Ok(img.to_rgba8())
}

fn init_tracing_with_level(quiet: bool, verbose: u8) {
    let level = if quiet {
        "error".to_string()
    } else {
        match verbose {
            0 => "info".into(),
            1 => "debug".into(),
            _ => "trace".into(),
        }
    };
    let _ = tracing_subscriber::fmt()
        .with_env_filter(level)
        .with_target(false)
        .try_init();
}

/// Accepts `N` (both axes) or `X,Y`.
fn parse_pair(s: &str) -> Result<(u32, u32), String> {
    let parse = |v: &str| v.trim().parse::<u32>().map_err(|e| format!("{v:?}: {e}"));
    match s.split_once(',') {
        Some((x, y)) => Ok((parse(x)?, parse(y)?)),
        None => {
            let n = parse(s)?;
            Ok((n, n))
        }
    }
}

/// Accepts `R,G,B,A` or `#RRGGBBAA` / `#RRGGBB` (opaque).
fn parse_color(s: &str) -> Result<[u8; 4], String> {
    let s = s.trim();
    if let Some(hex) = s.strip_prefix('#') {
        if !matches!(hex.len(), 6 | 8) || !hex.is_ascii() {
            return Err(format!("expected #RRGGBB or #RRGGBBAA, got {s:?}"));
        }
        let byte = |i: usize| {
            u8::from_str_radix(&hex[i * 2..i * 2 + 2], 16).map_err(|e| format!("{s:?}: {e}"))
        };
        let a = if hex.len() == 8 { byte(3)? } else { 255 };
        return Ok([byte(0)?, byte(1)?, byte(2)?, a]);
    }
    let parts: Vec<&str> = s.split(',').collect();
    if parts.len() != 4 {
        return Err(format!("expected R,G,B,A, got {s:?}"));
    }
    let mut out = [0u8; 4];
    for (slot, part) in out.iter_mut().zip(parts) {
        *slot = part
            .trim()
            .parse()
            .map_err(|e| format!("{part:?}: {e}"))?;
    }
    Ok(out)
}

fn parse_sort_order(s: &str) -> anyhow::Result<SortOrder> {
    s.parse()
        .map_err(|_| anyhow::anyhow!("unknown sort order: {}", s))
}

fn parse_pivot(s: &str) -> anyhow::Result<PivotAlignment> {
    s.parse()
        .map_err(|_| anyhow::anyhow!("unknown pivot: {}", s))
}

#[derive(Debug, Deserialize, Default)]
struct YamlConfig {
    width: Option<u32>,
    height: Option<u32>,
    trim: Option<bool>,
    trim_color: Option<String>,
    margin: Option<String>,
    spacing: Option<String>,
    dedup: Option<bool>,
    sort_order: Option<String>,
    spread_factor: Option<u32>,
    h_spread: Option<u32>,
    min_gap: Option<u32>,
    pivot: Option<String>,
    parallel: Option<bool>,
    outlines: Option<bool>,
}

impl YamlConfig {
    fn into_pack_config(self, mut cfg: PackConfig) -> anyhow::Result<PackConfig> {
        if let Some(v) = self.width {
            cfg.atlas_width = v;
        }
        if let Some(v) = self.height {
            cfg.atlas_height = v;
        }
        if let Some(v) = self.trim {
            cfg.trim = v;
        }
        if let Some(v) = self.trim_color {
            cfg.trim_color = parse_color(&v).map_err(anyhow::Error::msg)?;
        }
        if let Some(v) = self.margin {
            cfg.trim_margin = parse_pair(&v).map_err(anyhow::Error::msg)?;
        }
        if let Some(v) = self.spacing {
            cfg.spacing = parse_pair(&v).map_err(anyhow::Error::msg)?;
        }
        if let Some(v) = self.dedup {
            cfg.dedup = v;
        }
        if let Some(v) = self.sort_order {
            cfg.sort_order = parse_sort_order(&v)?;
        }
        if let Some(v) = self.spread_factor {
            cfg.spread_factor = Some(v);
        }
        if let Some(v) = self.h_spread {
            cfg.h_spread = Some(v);
        }
        if let Some(v) = self.min_gap {
            cfg.min_gap_width = Some(v);
        }
        if let Some(v) = self.parallel {
            cfg.parallel = v;
        }
        if let Some(v) = self.outlines {
            cfg.outlines = v;
        }
        Ok(cfg)
    }
}
