use anyhow::{Context, Result, bail};
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::info;
use tracing_subscriber::EnvFilter;

use inktrace::charset;
use inktrace::template::{TemplateFont, render_blank_page, template_coordinates};
use inktrace::{
    CharacterSet, GlyphRecord, PipelineHooks, ProcessingOptions, VectorMode,
    process_template_page,
};

// ============================================================================
// CLI
// ============================================================================

const USAGE: &str = "\
inktrace: scanned handwriting template to vector glyphs

USAGE:
    inktrace template --out PAGE.png [--options OPTS.json] [--page N]
                      [--all-pages] [--charset required|all] [--font FONT.ttf]
    inktrace process SCAN.png [--options OPTS.json] [--out GLYPHS.json]
                      [--debug-dir DIR] [--cell-debug] [--page N]
                      [--charset required|all] [--mode outline|monoline]
                      [--font FONT.ttf] [--threshold N]
";

#[derive(Default)]
struct CliArgs {
    command: Option<String>,
    scan: Option<PathBuf>,
    out: Option<PathBuf>,
    options: Option<PathBuf>,
    debug_dir: Option<PathBuf>,
    page: Option<usize>,
    charset: Option<String>,
    mode: Option<String>,
    font: Option<PathBuf>,
    threshold: Option<u8>,
    all_pages: bool,
    cell_debug: bool,
}

fn parse_args() -> CliArgs {
    let mut args = CliArgs::default();
    let mut iter = std::env::args().skip(1);

    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--out" => args.out = iter.next().map(PathBuf::from),
            "--options" => args.options = iter.next().map(PathBuf::from),
            "--debug-dir" => args.debug_dir = iter.next().map(PathBuf::from),
            "--page" => args.page = iter.next().and_then(|s| s.parse().ok()),
            "--charset" => args.charset = iter.next(),
            "--mode" => args.mode = iter.next(),
            "--font" => args.font = iter.next().map(PathBuf::from),
            "--threshold" => args.threshold = iter.next().and_then(|s| s.parse().ok()),
            "--all-pages" => args.all_pages = true,
            "--cell-debug" => args.cell_debug = true,
            other if !other.starts_with('-') => {
                if args.command.is_none() {
                    args.command = Some(other.to_string());
                } else {
                    args.scan = Some(PathBuf::from(other));
                }
            }
            _ => {}
        }
    }

    args
}

fn build_options(args: &CliArgs) -> Result<ProcessingOptions> {
    let mut opts = match &args.options {
        Some(path) => {
            let data = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read options file {}", path.display()))?;
            serde_json::from_str(&data)
                .with_context(|| format!("Failed to parse options file {}", path.display()))?
        }
        None => ProcessingOptions::default(),
    };

    if let Some(page) = args.page {
        opts.page_number = page;
    }
    if let Some(charset) = &args.charset {
        opts.character_set = match charset.as_str() {
            "required" => CharacterSet::Required,
            "all" => CharacterSet::All,
            other => bail!("Unknown character set {other:?} (use required|all)"),
        };
    }
    if let Some(mode) = &args.mode {
        opts.vector_mode = match mode.as_str() {
            "outline" => VectorMode::Outline,
            "monoline" => VectorMode::Monoline,
            other => bail!("Unknown vector mode {other:?} (use outline|monoline)"),
        };
    }
    if let Some(font) = &args.font {
        opts.template_font = Some(font.clone());
    }
    if let Some(threshold) = args.threshold {
        opts.subtract_threshold = threshold;
    }
    if args.cell_debug {
        opts.collect_cell_diagnostics = true;
    }

    Ok(opts)
}

// ============================================================================
// Commands
// ============================================================================

fn cmd_template(args: &CliArgs) -> Result<()> {
    let opts = build_options(args)?;
    opts.config.validate()?;

    let Some(out) = &args.out else {
        bail!("template requires --out PAGE.png");
    };

    let font = match &opts.template_font {
        Some(path) => Some(TemplateFont::load(path)?),
        None => None,
    };

    let coords = template_coordinates(&opts.config);
    let total_pages = charset::page_count(opts.character_set, &opts.config);
    let pages: Vec<usize> = if args.all_pages {
        (0..total_pages).collect()
    } else {
        vec![opts.page_number]
    };

    for page_number in pages {
        let chars = charset::page_characters(opts.character_set, &opts.config, page_number);
        if chars.is_empty() {
            bail!("Page {page_number} is past the end of the character set ({total_pages} pages)");
        }

        let path = if args.all_pages {
            numbered_path(out, page_number)
        } else {
            out.clone()
        };
        let page = render_blank_page(&opts.config, &coords, &chars, font.as_ref());
        page.save(&path)
            .with_context(|| format!("Failed to save template page {}", path.display()))?;
        info!(
            page = page_number,
            characters = chars.len(),
            out = %path.display(),
            "template page written"
        );
    }
    Ok(())
}

/// `template.png` -> `template-3.png` for multi-page output.
fn numbered_path(base: &Path, page: usize) -> PathBuf {
    let stem = base
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("template");
    let ext = base.extension().and_then(|s| s.to_str()).unwrap_or("png");
    base.with_file_name(format!("{stem}-{page}.{ext}"))
}

/// Boundary envelope for the external font assembler.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GlyphOutput<'a> {
    units_per_em: i32,
    ascender: i32,
    descender: i32,
    cap_height: i32,
    glyphs: &'a [GlyphRecord],
}

fn cmd_process(args: &CliArgs) -> Result<()> {
    let opts = build_options(args)?;
    let Some(scan_path) = &args.scan else {
        bail!("process requires a scan image path");
    };

    let scan = image::open(scan_path)
        .with_context(|| format!("Failed to decode scan {}", scan_path.display()))?
        .to_rgba8();
    info!(
        width = scan.width(),
        height = scan.height(),
        scan = %scan_path.display(),
        "scan loaded"
    );

    let mut progress = |stage: &str, percent: u32| {
        info!(stage, percent, "progress");
        true
    };
    let mut hooks = PipelineHooks {
        on_progress: Some(&mut progress),
    };
    let result = process_template_page(&scan, &opts, &mut hooks)?;

    if let Some(dir) = &args.debug_dir {
        write_debug_images(dir, &result)?;
    }

    if !result.success {
        if let Some(markers) = &result.markers {
            info!(found = ?markers.found(), "marker detection state");
        }
        match result.error {
            Some(error) => bail!("Page processing failed: {error}"),
            None => bail!("Page processing failed"),
        }
    }

    let out = args
        .out
        .clone()
        .unwrap_or_else(|| PathBuf::from("glyphs.json"));
    let envelope = GlyphOutput {
        units_per_em: inktrace::font::UNITS_PER_EM,
        ascender: inktrace::font::FONT_ASCENDER as i32,
        descender: inktrace::font::FONT_DESCENDER as i32,
        cap_height: inktrace::font::FONT_CAP_HEIGHT as i32,
        glyphs: &result.glyphs,
    };
    let json = serde_json::to_string_pretty(&envelope).context("Failed to serialize glyphs")?;
    std::fs::write(&out, json)
        .with_context(|| format!("Failed to write {}", out.display()))?;

    info!(glyphs = result.glyphs.len(), out = %out.display(), "glyphs written");
    Ok(())
}

fn write_debug_images(dir: &Path, result: &inktrace::ProcessingResult) -> Result<()> {
    std::fs::create_dir_all(dir)
        .with_context(|| format!("Failed to create debug dir {}", dir.display()))?;

    if let Some(markers) = &result.markers {
        markers
            .binarized
            .save(dir.join("binarized.png"))
            .context("Failed to save binarized debug image")?;
    }
    if let Some(warped) = &result.debug.warped {
        warped
            .save(dir.join("warped.png"))
            .context("Failed to save warped debug image")?;
    }
    if let Some(subtracted) = &result.debug.subtracted {
        subtracted
            .save(dir.join("subtracted.png"))
            .context("Failed to save subtracted debug image")?;
    }
    if let Some(thresholded) = &result.debug.thresholded {
        thresholded
            .save(dir.join("thresholded.png"))
            .context("Failed to save thresholded debug image")?;
    }
    if let Some(cleaned) = &result.debug.cleaned {
        cleaned
            .save(dir.join("cleaned.png"))
            .context("Failed to save cleaned debug image")?;
    }

    if !result.cells.is_empty() {
        let cell_dir = dir.join("cells");
        std::fs::create_dir_all(&cell_dir)
            .with_context(|| format!("Failed to create {}", cell_dir.display()))?;
        for cell in &result.cells {
            let tag = format!("r{}c{}-u{:04X}", cell.row, cell.col, cell.unicode);
            cell.mask
                .save(cell_dir.join(format!("{tag}-mask.png")))
                .with_context(|| format!("Failed to save cell mask {tag}"))?;
            cell.raw
                .save(cell_dir.join(format!("{tag}-raw.png")))
                .with_context(|| format!("Failed to save cell raw crop {tag}"))?;
        }
    }
    Ok(())
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = parse_args();
    match args.command.as_deref() {
        Some("template") => cmd_template(&args),
        Some("process") => cmd_process(&args),
        _ => {
            eprint!("{USAGE}");
            std::process::exit(2);
        }
    }
}
