use crate::convention::{
    file_stem, is_canonical, is_separator, parse_date_digits, parse_time_digits, NameDate,
    YearBounds,
};
use crate::os_date::ModifyTimes;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::{self, ErrorKind};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Signature {
    PixelCamera,
    AndroidCamera,
    WhatsApp,
    Screenshot,
    CameraSequence,
}

pub const SIGNATURE_PRIORITY: &[Signature] = &[
    Signature::PixelCamera,
    Signature::AndroidCamera,
    Signature::WhatsApp,
    Signature::Screenshot,
    Signature::CameraSequence,
];

const SEQUENCE_PREFIXES: &[(&str, usize)] = &[("DSCF", 4), ("DSC", 5), ("IMG_", 4), ("DJI_", 4)];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProprietaryName {
    pub signature: Signature,
    pub embedded_date: Option<NameDate>,
    pub rest: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RenameOutcome {
    Renamed(PathBuf),
    DuplicateSkipped(PathBuf),
    NotApplicable,
}

pub fn is_proprietary(name: &str, bounds: &YearBounds) -> bool {
    detect(name, bounds).is_some()
}

pub fn detect(name: &str, bounds: &YearBounds) -> Option<ProprietaryName> {
    if is_canonical(name, bounds) {
        return None;
    }
    let stem = file_stem(name);
    let detected = SIGNATURE_PRIORITY
        .iter()
        .find_map(|signature| match_signature(*signature, stem))?;
    match detected.embedded_date {
        Some(date) if !bounds.contains(date.year()) => None,
        _ => Some(detected),
    }
}

pub fn resolve_date(
    name: &ProprietaryName,
    path: &Path,
    times: &dyn ModifyTimes,
    bounds: &YearBounds,
) -> Result<Option<NameDate>> {
    let date = match name.embedded_date {
        Some(date) => date,
        None => NameDate::from(times.modify_time(path)?),
    };
    Ok(bounds.contains(date.year()).then_some(date))
}

pub fn convert_resolved(
    path: &Path,
    name: &ProprietaryName,
    times: &dyn ModifyTimes,
    bounds: &YearBounds,
) -> Result<RenameOutcome> {
    match resolve_date(name, path, times, bounds)? {
        Some(date) => convert(path, name, &date),
        None => Ok(RenameOutcome::NotApplicable),
    }
}

pub fn canonical_name_for(path: &Path, name: &ProprietaryName, date: &NameDate) -> Result<PathBuf> {
    let parent = path
        .parent()
        .context("親ディレクトリを取得できませんでした")?;
    let file_name = path
        .file_name()
        .and_then(|v| v.to_str())
        .with_context(|| format!("ファイル名が不正です: {}", path.display()))?;
    let extension = &file_name[file_stem(file_name).len()..];
    Ok(parent.join(format!("{}_{}{}", date.token(), name.rest, extension)))
}

pub fn convert(path: &Path, name: &ProprietaryName, date: &NameDate) -> Result<RenameOutcome> {
    convert_via(path, name, date, rename_no_replace)
}

fn convert_via(
    path: &Path,
    name: &ProprietaryName,
    date: &NameDate,
    rename: impl Fn(&Path, &Path) -> Result<bool>,
) -> Result<RenameOutcome> {
    let target = canonical_name_for(path, name, date)?;
    if exists(&target) {
        return Ok(RenameOutcome::DuplicateSkipped(target));
    }
    if rename(path, &target)? {
        Ok(RenameOutcome::Renamed(target))
    } else {
        Ok(RenameOutcome::DuplicateSkipped(target))
    }
}

fn rename_no_replace(from: &Path, to: &Path) -> Result<bool> {
    rename_no_replace_with(
        from,
        to,
        |from, to| fs::hard_link(from, to),
        |path| fs::remove_file(path),
    )
}

fn rename_no_replace_with(
    from: &Path,
    to: &Path,
    link: impl Fn(&Path, &Path) -> io::Result<()>,
    unlink: impl Fn(&Path) -> io::Result<()>,
) -> Result<bool> {
    match link(from, to) {
        Ok(()) => {
            if let Err(err) = unlink(from) {
                let _ = unlink(to);
                return Err(anyhow::Error::from(err).context(format!(
                    "リネーム元を削除できませんでした: {} -> {}",
                    from.display(),
                    to.display()
                )));
            }
            Ok(true)
        }
        Err(err) if err.kind() == ErrorKind::AlreadyExists => Ok(false),
        Err(err) if err.kind() == ErrorKind::NotFound => Err(anyhow::Error::from(err).context(
            format!(
                "リネームに失敗しました: {} -> {}",
                from.display(),
                to.display()
            ),
        )),
        Err(_) => {
            if exists(to) {
                return Ok(false);
            }
            fs::rename(from, to).with_context(|| {
                format!(
                    "リネームに失敗しました: {} -> {}",
                    from.display(),
                    to.display()
                )
            })?;
            Ok(true)
        }
    }
}

fn exists(path: &Path) -> bool {
    fs::symlink_metadata(path).is_ok()
}

fn match_signature(signature: Signature, stem: &str) -> Option<ProprietaryName> {
    match signature {
        Signature::PixelCamera => match_pixel(stem),
        Signature::AndroidCamera => match_android(stem),
        Signature::WhatsApp => match_whatsapp(stem),
        Signature::Screenshot => match_screenshot(stem),
        Signature::CameraSequence => match_sequence(stem),
    }
}

fn match_pixel(stem: &str) -> Option<ProprietaryName> {
    let body = stem.strip_prefix("PXL_")?;
    let bytes = body.as_bytes();
    let date = parse_date_digits(bytes)?;
    expect_byte(bytes, 8, b'_')?;
    let time = parse_time_digits(&bytes[9..])?;
    let millis = bytes.get(15..18)?;
    if !millis.iter().all(u8::is_ascii_digit) {
        return None;
    }
    let suffix = suffix_after(body, 18)?;
    Some(ProprietaryName {
        signature: Signature::PixelCamera,
        embedded_date: Some(NameDate::new(date, Some(time))),
        rest: format!("PXL_{}{}", &body[15..18], suffix),
    })
}

fn match_android(stem: &str) -> Option<ProprietaryName> {
    let (prefix, body) = split_prefix(stem, &["IMG_", "VID_"])?;
    let bytes = body.as_bytes();
    let date = parse_date_digits(bytes)?;
    expect_byte(bytes, 8, b'_')?;
    let time = parse_time_digits(&bytes[9..])?;
    let suffix = suffix_after(body, 15)?;
    Some(ProprietaryName {
        signature: Signature::AndroidCamera,
        embedded_date: Some(NameDate::new(date, Some(time))),
        rest: format!("{}{}", prefix.trim_end_matches('_'), suffix),
    })
}

fn match_whatsapp(stem: &str) -> Option<ProprietaryName> {
    let (prefix, body) = split_prefix(stem, &["IMG-", "VID-"])?;
    let bytes = body.as_bytes();
    let date = parse_date_digits(bytes)?;
    let counter = body.get(9..)?.strip_prefix("WA")?;
    expect_byte(bytes, 8, b'-')?;
    let digits = counter.bytes().take_while(u8::is_ascii_digit).count();
    if digits == 0 {
        return None;
    }
    let suffix = suffix_after(counter, digits)?;
    Some(ProprietaryName {
        signature: Signature::WhatsApp,
        embedded_date: Some(NameDate::new(date, None)),
        rest: format!("{}WA{}{}", prefix, &counter[..digits], suffix),
    })
}

fn match_screenshot(stem: &str) -> Option<ProprietaryName> {
    let body = stem.strip_prefix("Screenshot_")?;
    let bytes = body.as_bytes();
    let date = parse_date_digits(bytes)?;
    expect_byte(bytes, 8, b'-')?;
    let time = parse_time_digits(&bytes[9..])?;
    let suffix = suffix_after(body, 15)?;
    Some(ProprietaryName {
        signature: Signature::Screenshot,
        embedded_date: Some(NameDate::new(date, Some(time))),
        rest: format!("Screenshot{}", suffix),
    })
}

fn match_sequence(stem: &str) -> Option<ProprietaryName> {
    SEQUENCE_PREFIXES.iter().find_map(|(prefix, width)| {
        let body = stem.strip_prefix(prefix)?;
        let counter = body.get(..*width)?;
        if !counter.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        suffix_after(body, *width)?;
        Some(ProprietaryName {
            signature: Signature::CameraSequence,
            embedded_date: None,
            rest: stem.to_string(),
        })
    })
}

fn split_prefix<'a>(stem: &'a str, prefixes: &[&'static str]) -> Option<(&'static str, &'a str)> {
    prefixes
        .iter()
        .find_map(|prefix| stem.strip_prefix(prefix).map(|body| (*prefix, body)))
}

fn expect_byte(bytes: &[u8], index: usize, expected: u8) -> Option<()> {
    (bytes.get(index) == Some(&expected)).then_some(())
}

fn suffix_after(body: &str, index: usize) -> Option<&str> {
    let suffix = body.get(index..)?;
    match suffix.as_bytes().first() {
        None => Some(suffix),
        Some(first) if is_separator(*first) => Some(suffix),
        Some(_) => None,
    }
}
