use std::path::PathBuf;

use anyhow::{bail, Context, Result};

pub const USAGE: &str = "\
usage: pointfield-viewer [--check] [--frames N] [--seed N] [VERTEX.wgsl FRAGMENT.wgsl]

  --check      run headless: compile, link and record N frames, then exit
  --frames N   frames recorded by --check (default 3)
  --seed N     seed the point generator for reproducible clouds

keys: Esc quits, R regenerates the cloud, Space freezes the animation";

/// Parsed command line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Options {
    pub check: bool,
    pub frames: u32,
    pub seed: Option<u64>,
    /// Vertex and fragment shader files replacing the bundled pair.
    pub shaders: Option<(PathBuf, PathBuf)>,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            check: false,
            frames: 3,
            seed: None,
            shaders: None,
        }
    }
}

/// `Ok(None)` means help was requested.
pub fn parse<I>(args: I) -> Result<Option<Options>>
where
    I: IntoIterator<Item = String>,
{
    let mut opts = Options::default();
    let mut paths = Vec::new();
    let mut args = args.into_iter();

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "-h" | "--help" => return Ok(None),
            "--check" => opts.check = true,
            "--frames" => {
                let value = args.next().context("--frames needs a value")?;
                opts.frames = value
                    .parse()
                    .with_context(|| format!("invalid frame count `{value}`"))?;
            }
            "--seed" => {
                let value = args.next().context("--seed needs a value")?;
                opts.seed = Some(
                    value
                        .parse()
                        .with_context(|| format!("invalid seed `{value}`"))?,
                );
            }
            flag if flag.starts_with("--") => bail!("unknown option `{flag}`"),
            _ => paths.push(PathBuf::from(arg)),
        }
    }

    opts.shaders = match paths.len() {
        0 => None,
        2 => {
            let fragment = paths.pop();
            let vertex = paths.pop();
            vertex.zip(fragment)
        }
        n => bail!("expected a vertex and a fragment shader path, got {n} path(s)"),
    };

    Ok(Some(opts))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn no_arguments_gives_defaults() {
        assert_eq!(parse(args(&[])).unwrap(), Some(Options::default()));
    }

    #[test]
    fn flags_and_paths_are_collected() {
        let opts = parse(args(&["--check", "a.wgsl", "--frames", "10", "b.wgsl", "--seed", "7"]))
            .unwrap()
            .unwrap();
        assert!(opts.check);
        assert_eq!(opts.frames, 10);
        assert_eq!(opts.seed, Some(7));
        assert_eq!(
            opts.shaders,
            Some((PathBuf::from("a.wgsl"), PathBuf::from("b.wgsl")))
        );
    }

    #[test]
    fn help_short_circuits() {
        assert_eq!(parse(args(&["--check", "--help"])).unwrap(), None);
    }

    #[test]
    fn a_single_shader_path_is_rejected() {
        let err = parse(args(&["only.wgsl"])).unwrap_err();
        assert!(err.to_string().contains("got 1 path"), "{err}");
    }

    #[test]
    fn bad_values_are_reported() {
        assert!(parse(args(&["--frames"])).is_err());
        assert!(parse(args(&["--frames", "many"])).is_err());
        assert!(parse(args(&["--fast"])).is_err());
    }
}
