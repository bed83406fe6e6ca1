/* Fragment files
 *
 * Every fragment is staged next to its final name and only renamed into place
 * once all of them are on disk. Staged files never outlive a failed run. A
 * rename that fails can leave the fragments renamed before it updated.
 * */
use crate::config::Output;
use crate::*;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Clone, Debug, PartialEq)]
pub struct Rendered {
    pub fragment: Fragment,
    pub text: String,
}

fn io_error(path: &Path) -> impl FnOnce(std::io::Error) -> Error + '_ {
    move |source| Error::Io {
        path: path.to_path_buf(),
        source,
    }
}

fn staging_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().unwrap_or_default().to_os_string();
    name.push(".tmp");
    path.with_file_name(name)
}

fn discard<'a>(tmps: impl IntoIterator<Item = &'a PathBuf>) {
    for tmp in tmps {
        let _ = fs::remove_file(tmp);
    }
}

/// (staging, final) path of every fragment. Fails if two fragments would
/// share a final or a staging file.
fn resolve(rendered: &[Rendered], output: &Output) -> Result<Vec<(PathBuf, PathBuf)>> {
    let mut owners: HashMap<PathBuf, Fragment> = HashMap::new();
    let mut paths = Vec::with_capacity(rendered.len());
    for r in rendered {
        let path = output.path(r.fragment);
        let tmp = staging_path(&path);
        for p in [&path, &tmp] {
            if let Some(&first) = owners.get(p) {
                return Err(Error::OutputCollision {
                    path: p.clone(),
                    first,
                    second: r.fragment,
                });
            }
        }
        owners.insert(path.clone(), r.fragment);
        owners.insert(tmp.clone(), r.fragment);
        paths.push((tmp, path));
    }
    Ok(paths)
}

fn stage(rendered: &[Rendered], paths: &[(PathBuf, PathBuf)]) -> Result<()> {
    for (i, (r, (tmp, _))) in rendered.iter().zip(paths).enumerate() {
        if let Err(e) = fs::write(tmp, &r.text).map_err(io_error(tmp)) {
            discard(paths[..=i].iter().map(|(tmp, _)| tmp));
            return Err(e);
        }
    }
    Ok(())
}

/// Writes every rendered fragment to its configured file, creating the
/// output directory if needed. Returns the written paths in input order.
pub fn write(rendered: &[Rendered], output: &Output) -> Result<Vec<PathBuf>> {
    let paths = resolve(rendered, output)?;
    fs::create_dir_all(&output.directory).map_err(io_error(&output.directory))?;
    stage(rendered, &paths)?;

    let mut written = Vec::with_capacity(paths.len());
    for (i, (tmp, path)) in paths.iter().enumerate() {
        if let Err(e) = fs::rename(tmp, path).map_err(io_error(path)) {
            discard(paths[i..].iter().map(|(tmp, _)| tmp));
            return Err(e);
        }
        log::info!("wrote {}", path.display());
        written.push(path.clone());
    }
    Ok(written)
}

#[cfg(test)]
fn scratch(name: &str) -> Output {
    let directory = std::env::temp_dir().join(format!("s1g-output-{}-{}", std::process::id(), name));
    let _ = fs::remove_dir_all(&directory);
    Output {
        directory,
        ..Default::default()
    }
}

#[test]
fn staging_is_a_sibling() {
    assert_eq!(
        Path::new("gen/gen_s1g_rates_modes.txt.tmp"),
        staging_path(Path::new("gen/gen_s1g_rates_modes.txt"))
    );
}

#[test]
fn writes_each_fragment_to_its_file() {
    let output = scratch("each");
    let rendered: Vec<Rendered> = Fragment::ALL
        .iter()
        .map(|&fragment| Rendered {
            fragment,
            text: format!("{}\n", fragment),
        })
        .collect();

    let written = write(&rendered, &output).unwrap();
    assert_eq!(5, written.len());
    assert_eq!(output.directory.join("gen_s1g_rates_bps_list.txt"), written[3]);
    assert_eq!("rate list\n", fs::read_to_string(&written[3]).unwrap());

    let names: Vec<_> = fs::read_dir(&output.directory)
        .unwrap()
        .map(|e| e.unwrap().file_name())
        .collect();
    assert_eq!(5, names.len());
    assert!(names.iter().all(|n| !n.to_string_lossy().ends_with(".tmp")));
    fs::remove_dir_all(&output.directory).unwrap();
}

#[test]
fn failed_stage_leaves_nothing() {
    let mut output = scratch("stage");
    output.rate_switch = "missing/gen_s1g_rates_switch.txt".into();
    let rendered: Vec<Rendered> = Fragment::ALL
        .iter()
        .map(|&fragment| Rendered {
            fragment,
            text: String::new(),
        })
        .collect();

    assert!(matches!(write(&rendered, &output), Err(Error::Io { .. })));
    assert_eq!(0, fs::read_dir(&output.directory).unwrap().count());
    fs::remove_dir_all(&output.directory).unwrap();
}

#[test]
fn shared_file_is_rejected_before_writing() {
    let mut output = scratch("shared");
    output.lookup_table = output.declarations.clone();
    let rendered: Vec<Rendered> = Fragment::ALL
        .iter()
        .map(|&fragment| Rendered {
            fragment,
            text: format!("{}\n", fragment),
        })
        .collect();

    match write(&rendered, &output) {
        Err(Error::OutputCollision { path, first, second }) => {
            assert_eq!(output.directory.join("gen_s1g_rates_fnames.txt"), path);
            assert_eq!(Fragment::Declarations, first);
            assert_eq!(Fragment::LookupTable, second);
        }
        other => panic!("unexpected {:?}", other),
    }
    assert!(!output.directory.exists());
}

#[test]
fn staging_name_of_another_file_is_rejected() {
    let mut output = scratch("staging-name");
    output.mode_macros = "gen_s1g_rates_fnames.txt.tmp".into();
    let rendered: Vec<Rendered> = Fragment::ALL
        .iter()
        .map(|&fragment| Rendered {
            fragment,
            text: String::new(),
        })
        .collect();

    assert!(matches!(
        write(&rendered, &output),
        Err(Error::OutputCollision { first: Fragment::Declarations, second: Fragment::ModeMacros, .. })
    ));
}

#[test]
fn failed_rename_discards_staged_files() {
    let output = scratch("rename");
    // a non-empty directory squats on the first fragment's name
    let squatter = output.directory.join("gen_s1g_rates_fnames.txt");
    fs::create_dir_all(squatter.join("keep")).unwrap();
    let rendered: Vec<Rendered> = Fragment::ALL
        .iter()
        .map(|&fragment| Rendered {
            fragment,
            text: format!("{}\n", fragment),
        })
        .collect();

    assert!(matches!(write(&rendered, &output), Err(Error::Io { ref path, .. }) if *path == squatter));
    let names: Vec<_> = fs::read_dir(&output.directory)
        .unwrap()
        .map(|e| e.unwrap().file_name())
        .collect();
    assert_eq!(vec![std::ffi::OsString::from("gen_s1g_rates_fnames.txt")], names);
    fs::remove_dir_all(&output.directory).unwrap();
}
