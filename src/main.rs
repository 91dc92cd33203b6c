use anyhow::{bail, Context, Result};
use tracing::info;

use platepack_lib::{
    builder::ColorBody,
    logging::init_logs,
    save::export_package,
    settings::{overrides_from_args, SettingsProfile},
    Flavor, Layout, PackageConfig,
};

const USAGE: &str = "\
usage: platepack [options] tag:name=path.stl ...

options:
  --out <path>        output 3MF path (default: out.3mf)
  --title <title>     model title
  --flavor <name>     orca | qidi (default: orca)
  --profile <name>    petg | asagf | asagf-qidi (default: petg)
  --layout <name>     in-place | side-by-side (default: in-place for orca,
                      side-by-side for qidi)
  --spacing <mm>      gap between parts for side-by-side (default: 15)
  --set <key=value>   settings override, repeatable
";

struct Args {
    out: String,
    title: String,
    flavor: Flavor,
    profile: String,
    layout: Option<String>,
    spacing: f64,
    overrides: Vec<String>,
    bodies: Vec<(String, String, String)>,
}

fn parse_args() -> Result<Args> {
    let mut args = Args {
        out: "out.3mf".to_owned(),
        title: "platepack model".to_owned(),
        flavor: Flavor::Orca,
        profile: "petg".to_owned(),
        layout: None,
        spacing: 15.0,
        overrides: vec![],
        bodies: vec![],
    };

    let mut it = std::env::args().skip(1);
    while let Some(arg) = it.next() {
        match arg.as_str() {
            "--out" => args.out = it.next().context("--out needs a path")?,
            "--title" => args.title = it.next().context("--title needs a value")?,
            "--flavor" => {
                args.flavor = match it.next().context("--flavor needs a value")?.as_str() {
                    "orca" => Flavor::Orca,
                    "qidi" => Flavor::Qidi,
                    other => bail!("unknown flavor {other:?}"),
                }
            }
            "--profile" => args.profile = it.next().context("--profile needs a name")?,
            "--layout" => args.layout = Some(it.next().context("--layout needs a value")?),
            "--spacing" => {
                args.spacing = it
                    .next()
                    .context("--spacing needs a value")?
                    .parse()
                    .context("--spacing must be a number")?
            }
            "--set" => args.overrides.push(it.next().context("--set needs key=value")?),
            "--help" | "-h" => {
                print!("{USAGE}");
                std::process::exit(0);
            }
            body => {
                // tag:name=path.stl; name defaults to the tag
                let (label, path) = body
                    .split_once('=')
                    .with_context(|| format!("expected tag:name=path.stl, got {body:?}"))?;
                let (tag, name) = label.split_once(':').unwrap_or((label, label));
                args.bodies.push((tag.to_owned(), name.to_owned(), path.to_owned()));
            }
        }
    }

    if args.bodies.is_empty() {
        bail!("no input meshes given\n\n{USAGE}");
    }
    Ok(args)
}

fn main() -> Result<()> {
    init_logs();
    let args = parse_args()?;

    let mut config = match args.flavor {
        Flavor::Orca => PackageConfig::multi_color(&args.title),
        Flavor::Qidi => PackageConfig::qidi_project(&args.title, args.spacing),
    };
    match args.layout.as_deref() {
        Some("in-place") => config.layout = Layout::InPlace,
        Some("side-by-side") => {
            config.layout = Layout::SideBySide { spacing: args.spacing };
            // side-by-side parts stand alone; a missing tag should not kill
            // the export
            config.lookup = platepack_lib::MaterialLookup::FallbackFirst;
        }
        Some(other) => bail!("unknown layout {other:?}"),
        None => {}
    }

    let mut profile = SettingsProfile::baseline(&args.profile)?;
    if !args.overrides.is_empty() {
        let overrides = overrides_from_args(args.overrides.iter().map(String::as_str))
            .context("--set arguments must be key=value")?;
        profile.merge(&overrides);
    }

    let mut bodies = vec![];
    for (tag, name, path) in &args.bodies {
        let data = std::fs::read(path).with_context(|| format!("reading {path}"))?;
        bodies.push(ColorBody::from_stl(tag, name, data));
    }

    let summary = export_package(bodies, config, &profile, &args.out)?;

    info!(
        "done: {} ({} objects, {:.1} KB, profile {})",
        summary.path.display(),
        summary.objects.len(),
        summary.file_size as f64 / 1024.,
        summary.profile,
    );
    if !summary.fits_plate {
        info!("warning: layout exceeds the build plate; consider splitting");
    }

    Ok(())
}
