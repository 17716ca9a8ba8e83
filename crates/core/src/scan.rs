use anyhow::{bail, Context, Result};
use globset::{Glob, GlobSet, GlobSetBuilder};
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

pub trait TreeScanner {
    fn scan(&self, base: &Path, folder_patterns: &[String]) -> Result<Vec<PathBuf>>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct WalkTreeScanner;

impl TreeScanner for WalkTreeScanner {
    fn scan(&self, base: &Path, folder_patterns: &[String]) -> Result<Vec<PathBuf>> {
        if !base.is_dir() {
            bail!("対象フォルダが存在しません: {}", base.display());
        }

        if folder_patterns.is_empty() {
            return collect_files(base);
        }

        let includes = build_globset(folder_patterns)?;
        let mut out = Vec::new();
        for folder in matching_subfolders(base, &includes)? {
            out.extend(collect_files(&folder)?);
        }
        Ok(out)
    }
}

fn matching_subfolders(base: &Path, includes: &GlobSet) -> Result<Vec<PathBuf>> {
    let mut folders = Vec::new();
    for entry in
        fs::read_dir(base).with_context(|| format!("フォルダを読めませんでした: {}", base.display()))?
    {
        let entry = entry.with_context(|| format!("エントリ読み取り失敗: {}", base.display()))?;
        let path = entry.path();
        if !path.is_dir() {
            continue;
        }
        if includes.is_match(entry.file_name()) {
            folders.push(path);
        }
    }
    folders.sort();
    Ok(folders)
}

fn collect_files(root: &Path) -> Result<Vec<PathBuf>> {
    let mut out = Vec::new();
    for entry in WalkDir::new(root).sort_by_file_name() {
        let entry = entry.with_context(|| format!("フォルダ走査に失敗しました: {}", root.display()))?;
        if entry.file_type().is_file() {
            out.push(entry.into_path());
        }
    }
    Ok(out)
}

fn build_globset(patterns: &[String]) -> Result<GlobSet> {
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        let glob = Glob::new(pattern)
            .with_context(|| format!("フォルダパターンが不正です: {pattern}"))?;
        builder.add(glob);
    }
    builder.build().context("フォルダパターンを構築できませんでした")
}

#[cfg(test)]
mod tests {
    use super::{TreeScanner, WalkTreeScanner};
    use std::fs::{self, File};
    use std::path::{Path, PathBuf};
    use tempfile::tempdir;

    fn touch(path: &Path) {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).expect("parent dirs must be creatable");
        }
        File::create(path).expect("file must be creatable");
    }

    fn relative(base: &Path, files: Vec<PathBuf>) -> Vec<String> {
        files
            .into_iter()
            .map(|p| {
                p.strip_prefix(base)
                    .expect("under base")
                    .to_string_lossy()
                    .replace('\\', "/")
            })
            .collect()
    }

    #[test]
    fn only_matching_subfolders_are_walked() {
        let temp = tempdir().expect("tempdir");
        let base = temp.path();
        touch(&base.join("top.jpg"));
        touch(&base.join("1.Photos/b.jpg"));
        touch(&base.join("1.Photos/nested/a.jpg"));
        touch(&base.join("2.Videos/c.mp4"));
        touch(&base.join("Other/d.jpg"));

        let patterns = vec!["1.*".to_string(), "2.*".to_string()];
        let files = WalkTreeScanner.scan(base, &patterns).expect("scan");
        assert_eq!(
            relative(base, files),
            vec!["1.Photos/b.jpg", "1.Photos/nested/a.jpg", "2.Videos/c.mp4"]
        );
    }

    #[test]
    fn empty_patterns_walk_everything() {
        let temp = tempdir().expect("tempdir");
        let base = temp.path();
        touch(&base.join("top.jpg"));
        touch(&base.join("Other/d.jpg"));

        let files = WalkTreeScanner.scan(base, &[]).expect("scan");
        assert_eq!(relative(base, files), vec!["Other/d.jpg", "top.jpg"]);
    }

    #[test]
    fn missing_base_fails() {
        let temp = tempdir().expect("tempdir");
        let err = WalkTreeScanner
            .scan(&temp.path().join("missing"), &[])
            .expect_err("missing base");
        assert!(err.to_string().contains("対象フォルダが存在しません"));
    }

    #[test]
    fn invalid_pattern_fails() {
        let temp = tempdir().expect("tempdir");
        let err = WalkTreeScanner
            .scan(temp.path(), &["[".to_string()])
            .expect_err("bad glob");
        assert!(err.to_string().contains("フォルダパターンが不正です"));
    }
}
